use serde::de::DeserializeOwned;
use serde_json::Value;

/// Parse a snake_case enum value using serde-deserialization.
pub fn parse_enum<T>(raw: &str, field: &str) -> anyhow::Result<T>
where
    T: DeserializeOwned,
{
    let normalized = raw.replace('-', "_");
    let json = format!("\"{normalized}\"");
    serde_json::from_str(&json).map_err(|error| anyhow::anyhow!("invalid {field} '{raw}': {error}"))
}

/// A command-line value: JSON when it parses as JSON, otherwise text.
#[must_use]
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Split a `slug=value` pair.
pub fn parse_attr(raw: &str) -> anyhow::Result<(String, Value)> {
    let (slug, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("invalid --attr '{raw}': expected slug=value"))?;
    let slug = slug.trim();
    if slug.is_empty() {
        anyhow::bail!("invalid --attr '{raw}': empty slug");
    }
    Ok((slug.to_string(), parse_value(value)))
}
