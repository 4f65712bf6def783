//! Locale-tolerant parsing of monetary (`R$ 1.234,56`) and odometer (`152.000 km`) strings.
//!
//! Both entry points share one separator heuristic (see [`normalize_separators`]) and never
//! fail loudly: every problem is reported through a failed [`ParsedValue`].

use serde::Serialize;

const MAX_KILOMETERS: f64 = 10_000_000.0;

/// Outcome of interpreting a free-form string as a decimal quantity.
///
/// `success` holds exactly when a finite `value` is present and `error` is absent; the
/// constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedValue {
    success: bool,
    value: Option<f64>,
    original_string: Option<String>,
    error: Option<String>,
}

impl ParsedValue {
    fn parsed(original: &str, value: f64) -> Self {
        if !value.is_finite() {
            return Self::failed(Some(original), "value is not a finite number");
        }
        Self {
            success: true,
            value: Some(value),
            original_string: Some(original.to_string()),
            error: None,
        }
    }

    fn failed(original: Option<&str>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            value: None,
            original_string: original.map(str::to_string),
            error: Some(error.into()),
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn original_string(&self) -> Option<&str> {
        self.original_string.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quantity {
    Monetary,
    Kilometers,
}

impl Quantity {
    fn noun(self) -> &'static str {
        match self {
            Quantity::Monetary => "monetary value",
            Quantity::Kilometers => "kilometer value",
        }
    }
}

pub fn parse_monetary_value(input: Option<&str>) -> ParsedValue {
    parse_quantity(input, Quantity::Monetary)
}

pub fn parse_kilometer_value(input: Option<&str>) -> ParsedValue {
    parse_quantity(input, Quantity::Kilometers)
}

/// Accepts an already-numeric amount (a JSON number) without the separator heuristic.
pub fn monetary_from_number(value: f64) -> ParsedValue {
    bounded(&value.to_string(), value, Quantity::Monetary)
}

pub fn kilometers_from_number(value: f64) -> ParsedValue {
    bounded(&value.to_string(), value, Quantity::Kilometers)
}

fn parse_quantity(input: Option<&str>, quantity: Quantity) -> ParsedValue {
    let Some(raw) = input else {
        return ParsedValue::failed(None, format!("{} was not provided", quantity.noun()));
    };

    if raw.trim().is_empty() {
        return ParsedValue::failed(Some(raw), format!("{} is empty", quantity.noun()));
    }

    // Currency symbols, unit suffixes, and whitespace all fall out here.
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();
    let negative = kept.starts_with('-');
    let cleaned: String = kept.chars().filter(|c| *c != '-').collect();

    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return ParsedValue::failed(
            Some(raw),
            format!("{} contains no digits", quantity.noun()),
        );
    }

    let normalized = normalize_separators(&cleaned);
    let value = match normalized.parse::<f64>() {
        Ok(value) => value,
        Err(_) => {
            return ParsedValue::failed(
                Some(raw),
                format!("'{raw}' is not a recognizable {}", quantity.noun()),
            )
        }
    };

    bounded(raw, if negative { -value } else { value }, quantity)
}

fn bounded(raw: &str, value: f64, quantity: Quantity) -> ParsedValue {
    if value < 0.0 {
        return ParsedValue::failed(
            Some(raw),
            format!("{} must not be negative", quantity.noun()),
        );
    }

    if quantity == Quantity::Kilometers && value >= MAX_KILOMETERS {
        return ParsedValue::failed(
            Some(raw),
            format!("kilometer value must be below {MAX_KILOMETERS}"),
        );
    }

    ParsedValue::parsed(raw, value)
}

/// Rewrites `.`/`,` separators into a plain `f64` literal.
///
/// - both present: the right-most one is the decimal separator, the other is dropped
/// - commas only: one comma is decimal, several are thousands groups
/// - dots only: several are thousands groups; a single dot followed by exactly three
///   trailing digits is a thousands group too, otherwise it is the decimal point
pub fn normalize_separators(cleaned: &str) -> String {
    let last_dot = cleaned.rfind('.');
    let last_comma = cleaned.rfind(',');

    match (last_dot, last_comma) {
        (Some(dot), Some(comma)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (None, Some(_)) => {
            if cleaned.matches(',').count() == 1 {
                cleaned.replace(',', ".")
            } else {
                cleaned.replace(',', "")
            }
        }
        (Some(dot), None) => {
            let grouped = cleaned.matches('.').count() > 1 || cleaned.len() - dot - 1 == 3;
            if grouped {
                cleaned.replace('.', "")
            } else {
                cleaned.to_string()
            }
        }
        (None, None) => cleaned.to_string(),
    }
}

fn group_thousands(whole: u64, separator: char) -> String {
    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(digit);
    }
    grouped
}

/// `1234.5` → `R$ 1.234,50`
pub fn format_monetary(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!(
        "{sign}R$ {},{:02}",
        group_thousands(cents / 100, '.'),
        cents % 100
    )
}

/// `152000.0` → `152.000 km`
pub fn format_kilometers(value: f64) -> String {
    format!("{} km", group_thousands(value.max(0.0).round() as u64, '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_of(parsed: &ParsedValue) -> f64 {
        assert!(parsed.success(), "expected success, got {parsed:?}");
        parsed.value().expect("value present")
    }

    #[test]
    fn parses_brazilian_currency() {
        assert_eq!(value_of(&parse_monetary_value(Some("R$ 550,00"))), 550.0);
        assert_eq!(value_of(&parse_monetary_value(Some("R$ 1.234,56"))), 1234.56);
        assert_eq!(value_of(&parse_monetary_value(Some("89,9"))), 89.9);
        assert_eq!(value_of(&parse_monetary_value(Some("1,500.75"))), 1500.75);
        assert_eq!(value_of(&parse_monetary_value(Some("320"))), 320.0);
    }

    #[test]
    fn monetary_failures_carry_messages() {
        for parsed in [
            parse_monetary_value(Some("")),
            parse_monetary_value(Some("   ")),
            parse_monetary_value(None),
            parse_monetary_value(Some("R$")),
            parse_monetary_value(Some("R$ -10,00")),
        ] {
            assert!(!parsed.success());
            assert!(parsed.value().is_none());
            assert!(!parsed.error().expect("error present").is_empty());
        }
    }

    #[test]
    fn parses_odometer_readings() {
        assert_eq!(value_of(&parse_kilometer_value(Some("152.000"))), 152000.0);
        assert_eq!(value_of(&parse_kilometer_value(Some("50.000 km"))), 50000.0);
        assert_eq!(value_of(&parse_kilometer_value(Some("1.250.300 KM"))), 1250300.0);
        assert_eq!(value_of(&parse_kilometer_value(Some("87500"))), 87500.0);
        assert_eq!(value_of(&parse_kilometer_value(Some("12.5"))), 12.5);
    }

    #[test]
    fn rejects_implausible_odometer_values() {
        let parsed = parse_kilometer_value(Some("99.999.999"));
        assert!(!parsed.success());
        assert!(parse_kilometer_value(Some("km")).error().is_some());
    }

    #[test]
    fn numeric_inputs_skip_the_separator_heuristic() {
        assert_eq!(value_of(&monetary_from_number(10.125)), 10.125);
        assert_eq!(value_of(&kilometers_from_number(12.345)), 12.345);
        assert_eq!(kilometers_from_number(12.345).original_string(), Some("12.345"));

        assert!(!monetary_from_number(-3.5).success());
        assert!(!kilometers_from_number(MAX_KILOMETERS).success());
        assert!(!monetary_from_number(f64::INFINITY).success());
        assert_eq!(value_of(&parse_monetary_value(Some("-0"))), 0.0);
    }

    #[test]
    fn keeps_original_string() {
        let parsed = parse_kilometer_value(Some(" 50.000 km "));
        assert_eq!(parsed.original_string(), Some(" 50.000 km "));
        let body = serde_json::to_value(&parsed).expect("serializes");
        assert_eq!(body["originalString"], " 50.000 km ");
        assert_eq!(body["success"], true);
    }

    #[test]
    fn formats_for_display() {
        assert_eq!(format_monetary(550.0), "R$ 550,00");
        assert_eq!(format_monetary(1234.5), "R$ 1.234,50");
        assert_eq!(format_monetary(1_000_000.0), "R$ 1.000.000,00");
        assert_eq!(format_kilometers(152000.0), "152.000 km");
        assert_eq!(format_kilometers(999.0), "999 km");
    }

    #[test]
    fn separator_heuristic_is_literal() {
        assert_eq!(normalize_separators("1.234"), "1234");
        assert_eq!(normalize_separators("1.23"), "1.23");
        assert_eq!(normalize_separators("1.2345"), "1.2345");
        assert_eq!(normalize_separators("1,234"), "1.234");
        assert_eq!(normalize_separators("1,234,567"), "1234567");
        assert_eq!(normalize_separators("1.234.567,8"), "1234567.8");
    }
}
