use serde::{Deserialize, Serialize};

/// Closed set of value types a property can declare.
///
/// The stored type tag is free text; anything that is not one of the known
/// tags behaves like `String` (values pass through untouched).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyType {
    String,
    Json,
    Schema,
    /// `INT` and `INTEGER`
    Integer,
    /// `BOOL` and `BOOLEAN`
    Boolean,
}

impl PropertyType {
    /// Interpret a stored type tag, case-insensitively
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_uppercase().as_str() {
            "JSON" => PropertyType::Json,
            "SCHEMA" => PropertyType::Schema,
            "INT" | "INTEGER" => PropertyType::Integer,
            "BOOL" | "BOOLEAN" => PropertyType::Boolean,
            _ => PropertyType::String,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::String => "STRING",
            PropertyType::Json => "JSON",
            PropertyType::Schema => "SCHEMA",
            PropertyType::Integer => "INTEGER",
            PropertyType::Boolean => "BOOLEAN",
        }
    }

    /// Whether stored values of this type are JSON text
    pub fn is_structured(&self) -> bool {
        matches!(self, PropertyType::Json | PropertyType::Schema)
    }
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synonym_tags() {
        assert_eq!(PropertyType::from_tag("INT"), PropertyType::Integer);
        assert_eq!(PropertyType::from_tag("integer"), PropertyType::Integer);
        assert_eq!(PropertyType::from_tag("Bool"), PropertyType::Boolean);
        assert_eq!(PropertyType::from_tag("BOOLEAN"), PropertyType::Boolean);
        assert_eq!(PropertyType::from_tag("schema"), PropertyType::Schema);
        assert_eq!(PropertyType::from_tag("json"), PropertyType::Json);
    }

    #[test]
    fn test_unknown_tags_behave_as_string() {
        assert_eq!(PropertyType::from_tag(""), PropertyType::String);
        assert_eq!(PropertyType::from_tag("STRING"), PropertyType::String);
        assert_eq!(PropertyType::from_tag("DATETIME"), PropertyType::String);
    }
}
