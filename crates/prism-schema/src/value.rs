//! Data-type semantics for attribute values.
//!
//! Values arrive as loose JSON: a number may be typed in as a string, a
//! currency amount as `"$1,200"`, a boolean as `"yes"`. Validation accepts the
//! loose forms; equivalence compares the parsed forms so that `"1,200"` and
//! `1200` are the same currency amount.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use prism_core::entities::AttributeDef;
use prism_core::enums::DataType;
use serde_json::Value;

use crate::error::SchemaError;

/// Date format accepted for `date` attributes.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// String form of a JSON value: strings verbatim, `null` empty, others as JSON.
#[must_use]
pub fn plain_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Parse a currency amount:
/// - Strip `$`, `€`, `£`, commas, whitespace
/// - Handle `(123.45)` → `-123.45`
/// - Returns `None` if non-numeric characters remain after stripping
#[must_use]
pub fn parse_currency(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (is_negative, inner) = match trimmed.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    let cleaned: String = inner
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | ',') && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    for (i, c) in cleaned.chars().enumerate() {
        match c {
            '0'..='9' | '.' => {}
            '-' | '+' if i == 0 && !is_negative => {}
            _ => return None,
        }
    }

    let value: f64 = cleaned.parse().ok().filter(|n: &f64| n.is_finite())?;
    Some(if is_negative { -value } else { value })
}

/// Parse a plain number from a JSON number or numeric string (commas allowed).
/// `NaN` and infinities are not numbers here.
#[must_use]
pub fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
            cleaned.parse().ok().filter(|n: &f64| n.is_finite())
        }
        _ => None,
    }
}

fn parse_currency_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_currency(s),
        _ => None,
    }
}

/// Parse a boolean from a JSON bool, `0`/`1`, or yes/no style strings.
#[must_use]
pub fn parse_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "1" => Some(true),
            "false" | "no" | "n" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Parse a `YYYY-MM-DD` date.
#[must_use]
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    value
        .as_str()
        .and_then(|s| NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok())
}

/// Normalize a URL for comparison: lowercase scheme and host, drop a trailing
/// slash. Returns `None` unless the string has a `scheme://host` prefix.
#[must_use]
pub fn normalize_url(s: &str) -> Option<String> {
    let trimmed = s.trim();
    let (scheme, rest) = trimmed.split_once("://")?;
    if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let (host, path) = match rest.find('/') {
        Some(idx) => rest.split_at(idx),
        None => (rest, ""),
    };
    if host.is_empty() {
        return None;
    }
    let path = path.trim_end_matches('/');
    Some(format!(
        "{}://{}{path}",
        scheme.to_ascii_lowercase(),
        host.to_ascii_lowercase()
    ))
}

/// Parse tags from a JSON array of strings or a comma-separated string.
/// Tags are trimmed and lowercased; empty tags are dropped.
#[must_use]
pub fn parse_tags(value: &Value) -> Option<BTreeSet<String>> {
    let raw: Vec<&str> = match value {
        Value::Array(items) => items.iter().map(Value::as_str).collect::<Option<_>>()?,
        Value::String(s) => s.split(',').collect(),
        _ => return None,
    };
    Some(
        raw.into_iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect(),
    )
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Whether a value counts as absent for required-attribute checks.
#[must_use]
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Check a value against its attribute definition. `null` is always accepted
/// and clears the value.
///
/// # Errors
///
/// Returns `SchemaError::InvalidValue` when the value does not parse as the
/// declared data type, or is not one of the declared enum values.
pub fn validate_value(def: &AttributeDef, value: &Value) -> Result<(), SchemaError> {
    if value.is_null() {
        return Ok(());
    }

    let invalid = |reason: String| SchemaError::InvalidValue {
        attr: def.slug.clone(),
        data_type: def.data_type,
        reason,
    };

    match def.data_type {
        DataType::Text => match value {
            Value::String(_) | Value::Number(_) | Value::Bool(_) => Ok(()),
            _ => Err(invalid("expected a string".into())),
        },
        DataType::Number => parse_number(value)
            .map(|_| ())
            .ok_or_else(|| invalid(format!("'{}' is not a number", plain_string(value)))),
        DataType::Currency => parse_currency_value(value)
            .map(|_| ())
            .ok_or_else(|| invalid(format!("'{}' is not an amount", plain_string(value)))),
        DataType::Boolean => parse_bool(value)
            .map(|_| ())
            .ok_or_else(|| invalid(format!("'{}' is not yes/no", plain_string(value)))),
        DataType::Date => parse_date(value)
            .map(|_| ())
            .ok_or_else(|| invalid(format!("'{}' is not YYYY-MM-DD", plain_string(value)))),
        DataType::Url => value
            .as_str()
            .and_then(normalize_url)
            .map(|_| ())
            .ok_or_else(|| invalid(format!("'{}' has no scheme", plain_string(value)))),
        DataType::Tags => parse_tags(value)
            .map(|_| ())
            .ok_or_else(|| invalid("expected a list of strings".into())),
        DataType::Enum => {
            let s = plain_string(value);
            if def.enum_values.iter().any(|v| v == s.trim()) {
                Ok(())
            } else {
                Err(invalid(format!(
                    "'{s}' is not one of {}",
                    def.enum_values.join(", ")
                )))
            }
        }
        DataType::Json => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Equivalence
// ---------------------------------------------------------------------------

fn strings_equal(a: &Value, b: &Value) -> bool {
    plain_string(a).trim() == plain_string(b).trim()
}

fn parsed_equal<T: PartialEq>(a: Option<T>, b: Option<T>, fallback: impl FnOnce() -> bool) -> bool {
    match (a, b) {
        (Some(x), Some(y)) => x == y,
        _ => fallback(),
    }
}

fn floats_equal(a: Option<f64>, b: Option<f64>, fallback: impl FnOnce() -> bool) -> bool {
    match (a, b) {
        (Some(x), Some(y)) => (x - y).abs() < 1e-9,
        _ => fallback(),
    }
}

/// Compare two values under a declared data type. Values that fail to parse
/// as the type, and slugs with no declaration (`None`), compare as trimmed
/// strings.
#[must_use]
pub fn values_equivalent(data_type: Option<DataType>, a: &Value, b: &Value) -> bool {
    let fallback = || strings_equal(a, b);
    match data_type {
        None | Some(DataType::Text | DataType::Enum) => fallback(),
        Some(DataType::Number) => floats_equal(parse_number(a), parse_number(b), fallback),
        Some(DataType::Currency) => {
            floats_equal(parse_currency_value(a), parse_currency_value(b), fallback)
        }
        Some(DataType::Boolean) => parsed_equal(parse_bool(a), parse_bool(b), fallback),
        Some(DataType::Date) => parsed_equal(parse_date(a), parse_date(b), fallback),
        Some(DataType::Url) => parsed_equal(
            a.as_str().and_then(normalize_url),
            b.as_str().and_then(normalize_url),
            fallback,
        ),
        Some(DataType::Tags) => parsed_equal(parse_tags(a), parse_tags(b), fallback),
        Some(DataType::Json) => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("$1,200.50", Some(1200.5))]
    #[case("(45)", Some(-45.0))]
    #[case("€ 3 000", Some(3000.0))]
    #[case("-12", Some(-12.0))]
    #[case("12 USD", None)]
    #[case("", None)]
    fn currency_parsing(#[case] input: &str, #[case] expected: Option<f64>) {
        assert_eq!(parse_currency(input), expected);
    }

    #[rstest]
    #[case(json!(true), Some(true))]
    #[case(json!("Yes"), Some(true))]
    #[case(json!("0"), Some(false))]
    #[case(json!(1), Some(true))]
    #[case(json!("maybe"), None)]
    fn bool_parsing(#[case] input: Value, #[case] expected: Option<bool>) {
        assert_eq!(parse_bool(&input), expected);
    }

    #[test]
    fn url_normalization() {
        assert_eq!(
            normalize_url("HTTPS://Acme.Example/about/").as_deref(),
            Some("https://acme.example/about")
        );
        assert_eq!(normalize_url("acme.example"), None);
        assert_eq!(normalize_url("https://"), None);
    }

    #[test]
    fn tags_from_string_or_array() {
        let a = parse_tags(&json!("b2b, SaaS ,")).unwrap();
        let b = parse_tags(&json!(["saas", "B2B"])).unwrap();
        assert_eq!(a, b);
        assert!(parse_tags(&json!([1, 2])).is_none());
    }

    #[rstest]
    #[case(DataType::Currency, json!("$1,200"), json!(1200), true)]
    #[case(DataType::Number, json!("2019"), json!(2019), true)]
    #[case(DataType::Number, json!("2019"), json!(2020), false)]
    #[case(DataType::Boolean, json!("yes"), json!(true), true)]
    #[case(DataType::Url, json!("https://a.io/"), json!("https://A.io"), true)]
    #[case(DataType::Tags, json!(["x", "y"]), json!("y, x"), true)]
    #[case(DataType::Text, json!(" Austin "), json!("Austin"), true)]
    #[case(DataType::Text, json!("austin"), json!("Austin"), false)]
    #[case(DataType::Json, json!({"a": [1, 2]}), json!({"a": [1, 2]}), true)]
    #[case(DataType::Json, json!({"a": [1, 2]}), json!({"a": [2, 1]}), false)]
    fn typed_equivalence(
        #[case] data_type: DataType,
        #[case] a: Value,
        #[case] b: Value,
        #[case] expected: bool,
    ) {
        assert_eq!(values_equivalent(Some(data_type), &a, &b), expected);
        assert_eq!(values_equivalent(Some(data_type), &b, &a), expected);
    }

    #[test]
    fn non_finite_strings_are_not_numbers() {
        assert_eq!(parse_number(&json!("NaN")), None);
        assert_eq!(parse_number(&json!("infinity")), None);
        assert!(values_equivalent(
            Some(DataType::Number),
            &json!("NaN"),
            &json!("NaN")
        ));
    }

    #[test]
    fn undeclared_falls_back_to_strings() {
        assert!(values_equivalent(None, &json!("1"), &json!(1)));
        assert!(!values_equivalent(None, &json!("1.0"), &json!(1)));
    }

    #[test]
    fn unparseable_numbers_fall_back_to_strings() {
        assert!(values_equivalent(
            Some(DataType::Number),
            &json!("n/a"),
            &json!("n/a")
        ));
    }

    #[test]
    fn enum_validation_checks_membership() {
        let def = AttributeDef::new("stage", "Stage", DataType::Enum)
            .with_enum_values(["seed", "series_a"]);
        assert!(validate_value(&def, &json!("seed")).is_ok());
        let err = validate_value(&def, &json!("ipo")).unwrap_err();
        assert!(err.to_string().contains("not one of seed, series_a"));
    }

    #[rstest]
    #[case(DataType::Number, json!("12k"), false)]
    #[case(DataType::Number, json!("1,200"), true)]
    #[case(DataType::Number, json!("NaN"), false)]
    #[case(DataType::Number, json!("inf"), false)]
    #[case(DataType::Number, json!("-Infinity"), false)]
    #[case(DataType::Date, json!("2024-02-30"), false)]
    #[case(DataType::Date, json!("2024-02-29"), true)]
    #[case(DataType::Url, json!("www.acme.io"), false)]
    #[case(DataType::Text, json!({"nested": true}), false)]
    #[case(DataType::Json, json!({"nested": true}), true)]
    #[case(DataType::Boolean, json!(null), true)]
    fn data_type_validation(#[case] data_type: DataType, #[case] value: Value, #[case] ok: bool) {
        let def = AttributeDef::new("attr", "Attr", data_type);
        assert_eq!(validate_value(&def, &value).is_ok(), ok);
    }

    #[test]
    fn blank_values() {
        assert!(is_blank(&json!(null)));
        assert!(is_blank(&json!("  ")));
        assert!(is_blank(&json!([])));
        assert!(!is_blank(&json!(0)));
    }
}
