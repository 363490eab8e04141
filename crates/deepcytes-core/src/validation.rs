//! Request-entry validation helpers.
//!
//! Pure, synchronous checks used as guards before any store call.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::defaults::PASSWORD_MIN_LEN;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// Check that `email` has the `local@domain.tld` shape.
pub fn validate_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Check that a password is present and at least [`PASSWORD_MIN_LEN`] characters.
pub fn validate_password(password: Option<&str>) -> bool {
    password.is_some_and(|p| p.chars().count() >= PASSWORD_MIN_LEN)
}

/// Lowercase form used for storing and looking up emails.
pub fn normalize_email(email: &str) -> String {
    email.to_lowercase()
}

/// Leniently parse an integer query parameter.
///
/// Reads optional leading whitespace, an optional sign and a run of digits,
/// ignoring anything after. Missing, unparsable, or zero values yield
/// `default`.
pub fn parse_int_or(raw: Option<&str>, default: i64) -> i64 {
    let Some(raw) = raw else {
        return default;
    };
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return default;
    }
    let value = digits[..end]
        .bytes()
        .fold(0i64, |acc, b| acc.saturating_mul(10).saturating_add((b - b'0') as i64));
    let value = if negative { -value } else { value };
    if value == 0 {
        default
    } else {
        value
    }
}

/// Lenient integer from a JSON value: numbers are truncated, numeric strings
/// are parsed like query parameters, anything else yields `default`.
pub fn json_int_or(value: Option<&serde_json::Value>, default: i64) -> i64 {
    match value {
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .filter(|v| *v != 0)
            .unwrap_or(default),
        Some(serde_json::Value::String(s)) => parse_int_or(Some(s), default),
        _ => default,
    }
}

/// Return the trimmed string when it is non-blank.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate_email_accepts_common_address() {
        assert!(validate_email("user@example.com"));
        assert!(validate_email("first.last+tag@sub.example.co.uk"));
    }

    #[test]
    fn test_validate_email_rejects_missing_at() {
        assert!(!validate_email("userexample.com"));
        assert!(!validate_email(""));
    }

    #[test]
    fn test_validate_email_rejects_missing_dot_after_at() {
        assert!(!validate_email("user@example"));
        assert!(!validate_email("user.name@localhost"));
    }

    #[test]
    fn test_validate_email_rejects_whitespace_and_double_at() {
        assert!(!validate_email("us er@example.com"));
        assert!(!validate_email("user@@example.com"));
        assert!(!validate_email("user@exa mple.com"));
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password(Some("secret")));
        assert!(validate_password(Some("longer password")));
        assert!(!validate_password(Some("short")));
        assert!(!validate_password(Some("")));
        assert!(!validate_password(None));
    }

    #[test]
    fn test_validate_password_counts_characters_not_bytes() {
        assert!(!validate_password(Some("ééééé")));
        assert!(validate_password(Some("éééééé")));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("User@Example.COM"), "user@example.com");
    }

    #[test]
    fn test_parse_int_or_defaults() {
        assert_eq!(parse_int_or(None, 10), 10);
        assert_eq!(parse_int_or(Some(""), 10), 10);
        assert_eq!(parse_int_or(Some("abc"), 10), 10);
        assert_eq!(parse_int_or(Some("0"), 10), 10);
    }

    #[test]
    fn test_parse_int_or_reads_leading_digits() {
        assert_eq!(parse_int_or(Some("25"), 10), 25);
        assert_eq!(parse_int_or(Some("  7"), 10), 7);
        assert_eq!(parse_int_or(Some("12abc"), 10), 12);
        assert_eq!(parse_int_or(Some("3.9"), 10), 3);
        assert_eq!(parse_int_or(Some("-2"), 10), -2);
        assert_eq!(parse_int_or(Some("+4"), 10), 4);
    }

    #[test]
    fn test_parse_int_or_saturates() {
        assert_eq!(
            parse_int_or(Some("99999999999999999999999"), 1),
            i64::MAX
        );
    }

    #[test]
    fn test_json_int_or() {
        assert_eq!(json_int_or(Some(&json!(42)), 0), 42);
        assert_eq!(json_int_or(Some(&json!(4.7)), 0), 4);
        assert_eq!(json_int_or(Some(&json!("17")), 0), 17);
        assert_eq!(json_int_or(Some(&json!("nope")), 0), 0);
        assert_eq!(json_int_or(Some(&json!(null)), 0), 0);
        assert_eq!(json_int_or(None, 0), 0);
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  alice ")), Some("alice"));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }
}
