use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::logic::TypeCoercer;
use crate::model::PropertyType;

/// One named member of a SCHEMA property's composite default.
///
/// Sub-fields are not attachable on their own, so they carry no targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubField {
    pub key: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_tag: Option<String>,
    #[serde(default)]
    pub default: Value,
}

impl SubField {
    pub fn new(key: impl Into<String>, default: Value) -> Self {
        Self {
            key: key.into(),
            type_tag: None,
            default,
        }
    }

    pub fn typed(key: impl Into<String>, type_tag: impl Into<String>, default: Value) -> Self {
        Self {
            key: key.into(),
            type_tag: Some(type_tag.into()),
            default,
        }
    }

    /// Read a sub-field out of one element of a decoded SCHEMA default.
    /// Entries that are not objects with a string `key` yield `None`.
    pub fn from_entry(entry: Value) -> Option<Self> {
        match serde_json::from_value(entry) {
            Ok(field) => Some(field),
            Err(e) => {
                log::debug!("Skipping unreadable SCHEMA sub-field entry: {}", e);
                None
            }
        }
    }

    /// The sub-field's default decoded per its own type; untyped defaults pass through
    pub fn default_value(&self) -> Value {
        let property_type = self
            .type_tag
            .as_deref()
            .map(PropertyType::from_tag)
            .unwrap_or(PropertyType::String);
        TypeCoercer::decode(property_type, &self.default)
    }
}
