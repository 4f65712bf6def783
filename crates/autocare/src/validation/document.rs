//! CPF/CNPJ classification, checksum validation, and display formatting.

use serde::{Deserialize, Serialize};

const CPF_LENGTH: usize = 11;
const CNPJ_LENGTH: usize = 14;
const CNPJ_FIRST_WEIGHTS: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_SECOND_WEIGHTS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// Tax identifier kind, decided purely by digit count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    /// Individual taxpayer (11 digits).
    Cpf,
    /// Legal entity (14 digits).
    Cnpj,
    Unknown,
}

impl DocumentType {
    pub fn label(&self) -> &'static str {
        match self {
            DocumentType::Cpf => "CPF",
            DocumentType::Cnpj => "CNPJ",
            DocumentType::Unknown => "unknown",
        }
    }
}

/// Result of validating a free-form document string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentValidation {
    pub is_valid: bool,
    #[serde(rename = "type")]
    pub document_type: DocumentType,
    pub cleaned: String,
    pub formatted: Option<String>,
    pub error: Option<String>,
}

pub fn clean_digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

pub fn classify(raw: &str) -> DocumentType {
    match clean_digits(raw).len() {
        CPF_LENGTH => DocumentType::Cpf,
        CNPJ_LENGTH => DocumentType::Cnpj,
        _ => DocumentType::Unknown,
    }
}

fn digits_of(cleaned: &str) -> Vec<u32> {
    cleaned.chars().filter_map(|c| c.to_digit(10)).collect()
}

fn all_identical(digits: &[u32]) -> bool {
    digits.windows(2).all(|pair| pair[0] == pair[1])
}

fn check_digit(weighted_sum: u32) -> u32 {
    let remainder = weighted_sum % 11;
    if remainder < 2 {
        0
    } else {
        11 - remainder
    }
}

fn weighted_sum(digits: &[u32], weights: impl IntoIterator<Item = u32>) -> u32 {
    digits.iter().zip(weights).map(|(d, w)| d * w).sum()
}

pub fn is_valid_cpf(raw: &str) -> bool {
    let digits = digits_of(&clean_digits(raw));
    if digits.len() != CPF_LENGTH || all_identical(&digits) {
        return false;
    }

    let first = check_digit(weighted_sum(&digits[..9], (2..=10).rev()));
    if first != digits[9] {
        return false;
    }

    let second = check_digit(weighted_sum(&digits[..10], (2..=11).rev()));
    second == digits[10]
}

pub fn is_valid_cnpj(raw: &str) -> bool {
    let digits = digits_of(&clean_digits(raw));
    if digits.len() != CNPJ_LENGTH || all_identical(&digits) {
        return false;
    }

    let first = check_digit(weighted_sum(&digits[..12], CNPJ_FIRST_WEIGHTS));
    if first != digits[12] {
        return false;
    }

    let second = check_digit(weighted_sum(&digits[..13], CNPJ_SECOND_WEIGHTS));
    second == digits[13]
}

/// `000.000.000-00`
pub fn format_cpf(raw: &str) -> Option<String> {
    let d = clean_digits(raw);
    if d.len() != CPF_LENGTH {
        return None;
    }
    Some(format!("{}.{}.{}-{}", &d[..3], &d[3..6], &d[6..9], &d[9..]))
}

/// `00.000.000/0000-00`
pub fn format_cnpj(raw: &str) -> Option<String> {
    let d = clean_digits(raw);
    if d.len() != CNPJ_LENGTH {
        return None;
    }
    Some(format!(
        "{}.{}.{}/{}-{}",
        &d[..2],
        &d[2..5],
        &d[5..8],
        &d[8..12],
        &d[12..]
    ))
}

pub fn validate_document(raw: &str) -> DocumentValidation {
    let cleaned = clean_digits(raw);
    let document_type = classify(&cleaned);

    let (is_valid, formatted) = match document_type {
        DocumentType::Cpf => (is_valid_cpf(&cleaned), format_cpf(&cleaned)),
        DocumentType::Cnpj => (is_valid_cnpj(&cleaned), format_cnpj(&cleaned)),
        DocumentType::Unknown => {
            let error = if cleaned.is_empty() {
                "document contains no digits".to_string()
            } else {
                format!(
                    "document must have {CPF_LENGTH} (CPF) or {CNPJ_LENGTH} (CNPJ) digits, found {}",
                    cleaned.len()
                )
            };
            return DocumentValidation {
                is_valid: false,
                document_type,
                cleaned,
                formatted: None,
                error: Some(error),
            };
        }
    };

    let error = if is_valid {
        None
    } else if all_identical(&digits_of(&cleaned)) {
        Some(format!(
            "{} cannot consist of a single repeated digit",
            document_type.label()
        ))
    } else {
        Some(format!("{} check digits do not match", document_type.label()))
    };

    DocumentValidation {
        is_valid,
        document_type,
        cleaned,
        formatted,
        error,
    }
}
