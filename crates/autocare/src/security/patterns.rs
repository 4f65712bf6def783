use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

/// Content patterns rejected before any handler sees the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityThreat {
    ScriptInjection,
    SqlInjection,
    PathTraversal,
}

impl SecurityThreat {
    pub fn label(&self) -> &'static str {
        match self {
            SecurityThreat::ScriptInjection => "script injection",
            SecurityThreat::SqlInjection => "sql injection",
            SecurityThreat::PathTraversal => "path traversal",
        }
    }
}

static SCRIPT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<\s*/?\s*script\b|javascript\s*:|\bon(error|load|click|mouseover|focus)\s*=|<\s*iframe\b")
        .expect("script pattern compiles")
});

static SQL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\bunion\s+(all\s+)?select\b",
        r"|\b(drop|truncate|alter)\s+(table|database)\b",
        r"|\binsert\s+into\b",
        r"|\bdelete\s+from\b",
        r"|'\s*or\s+'?\d+'?\s*=\s*'?\d+",
        r"|;\s*--",
        r"|\bexec(\s|\()+(xp_|sp_)",
    ))
    .expect("sql pattern compiles")
});

static TRAVERSAL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.\.[/\\]").expect("traversal pattern compiles"));

pub fn scan_text(text: &str) -> Option<SecurityThreat> {
    if SCRIPT_PATTERN.is_match(text) {
        Some(SecurityThreat::ScriptInjection)
    } else if SQL_PATTERN.is_match(text) {
        Some(SecurityThreat::SqlInjection)
    } else if TRAVERSAL_PATTERN.is_match(text) {
        Some(SecurityThreat::PathTraversal)
    } else {
        None
    }
}

/// Walk every string and object key in `value`.
pub fn scan_json(value: &Value) -> Option<SecurityThreat> {
    match value {
        Value::String(text) => scan_text(text),
        Value::Array(items) => items.iter().find_map(scan_json),
        Value::Object(map) => map
            .iter()
            .find_map(|(key, nested)| scan_text(key).or_else(|| scan_json(nested))),
        Value::Null | Value::Bool(_) | Value::Number(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flags_script_payloads() {
        assert_eq!(
            scan_text("<script>alert(1)</script>"),
            Some(SecurityThreat::ScriptInjection)
        );
        assert_eq!(
            scan_text("<img src=x onerror=alert(1)>"),
            Some(SecurityThreat::ScriptInjection)
        );
        assert_eq!(
            scan_text("JavaScript:void(0)"),
            Some(SecurityThreat::ScriptInjection)
        );
    }

    #[test]
    fn flags_sql_payloads() {
        for payload in [
            "1 UNION SELECT password FROM users",
            "x'; DROP TABLE vehicles; --",
            "' or 1=1",
            "admin';--",
        ] {
            assert_eq!(
                scan_text(payload),
                Some(SecurityThreat::SqlInjection),
                "{payload}"
            );
        }
    }

    #[test]
    fn ignores_ordinary_maintenance_notes() {
        for note in [
            "Oil change at 50.000 km; select synthetic oil from the shelf",
            "Replaced brake pads (front) - R$ 550,00",
            "Customer asked to update the tire pressure",
        ] {
            assert_eq!(scan_text(note), None, "{note}");
        }
    }

    #[test]
    fn scans_nested_json_values_and_keys() {
        let body = json!({
            "vehicle": { "notes": ["fine", "../../etc/passwd"] },
        });
        assert_eq!(scan_json(&body), Some(SecurityThreat::PathTraversal));

        let body = json!({ "<script>": 1 });
        assert_eq!(scan_json(&body), Some(SecurityThreat::ScriptInjection));

        assert_eq!(scan_json(&json!({ "mileage": 15000, "ok": true })), None);
    }
}
