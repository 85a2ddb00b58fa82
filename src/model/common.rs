use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub type Id = String;

/// Canonical form of a property key or type tag: always uppercase.
pub fn canonical_key(value: impl std::fmt::Display) -> String {
    value.to_string().to_uppercase()
}

/// Render a loosely-typed JSON value as plain text (strings unquoted)
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Deserialize any scalar into its uppercase text form
pub(crate) fn deserialize_uppercase<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(canonical_key(value_to_text(&value)))
}

/// Default timestamp for legacy rows without audit columns
pub(crate) fn default_timestamp() -> DateTime<Utc> {
    // Use Unix epoch as default for legacy data
    DateTime::from_timestamp(0, 0).unwrap_or_else(Utc::now)
}
