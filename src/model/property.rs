use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::logic::TypeCoercer;
use crate::model::common::{default_timestamp, deserialize_uppercase};
use crate::model::{canonical_key, PropertyType, SubField};

fn default_type_tag() -> String {
    PropertyType::String.as_str().to_string()
}

/// A named, typed property with a default value and the target categories
/// it may be attached to.
///
/// `key` and `type` are always stored uppercase. The default is kept in its
/// stored (encoded) form and decoded through whatever type is set at read
/// time, so changing the type reinterprets the existing bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    #[serde(deserialize_with = "deserialize_uppercase")]
    key: String,

    #[serde(
        rename = "type",
        default = "default_type_tag",
        deserialize_with = "deserialize_uppercase"
    )]
    type_tag: String,

    /// Target categories, kept in insertion order; membership is set-like
    #[serde(default)]
    targets: Vec<String>,

    /// Encoded default exactly as persisted
    #[serde(rename = "default", default)]
    raw_default: Value,

    #[serde(default = "default_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// Definition input model for creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPropertyDefinition {
    pub key: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_tag: Option<String>,
    #[serde(default)]
    pub targets: Vec<String>,
    /// Typed default; encoded according to `type_tag` on creation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// Definition update model for PATCH operations
/// All fields are optional for partial updates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyDefinitionUpdate {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_tag: Option<String>,
    /// Replaces the entire target list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub targets: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl PropertyDefinition {
    /// Create a definition with no targets and a null default
    pub fn new(key: impl std::fmt::Display, type_tag: impl std::fmt::Display) -> Self {
        let now = Utc::now();
        Self {
            key: canonical_key(key),
            type_tag: canonical_key(type_tag),
            targets: Vec::new(),
            raw_default: Value::Null,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_targets<I, T>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.set_targets(targets);
        self
    }

    /// Set the default from a typed value, encoded through the current type
    pub fn with_default(mut self, value: Value) -> Self {
        self.set_default(&value);
        self
    }

    /// Create a definition from its input model; the type is applied before
    /// the default is encoded
    pub fn from_new(new_definition: NewPropertyDefinition) -> Self {
        let mut definition = PropertyDefinition::new(
            new_definition.key,
            new_definition.type_tag.unwrap_or_else(default_type_tag),
        )
        .with_targets(new_definition.targets);

        if let Some(default) = new_definition.default {
            definition.set_default(&default);
        }
        definition
    }

    /// Apply a partial update. `type` always lands before `default` so the
    /// new default is encoded with the new type.
    pub fn apply_update(&mut self, update: PropertyDefinitionUpdate) {
        if let Some(type_tag) = update.type_tag {
            self.set_type(type_tag);
        }
        if let Some(targets) = update.targets {
            self.set_targets(targets);
        }
        if let Some(default) = update.default {
            self.set_default(&default);
        }

        self.updated_at = Utc::now();
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn set_key(&mut self, key: impl std::fmt::Display) {
        self.key = canonical_key(key);
    }

    /// The stored (uppercase) type tag
    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    pub fn set_type(&mut self, type_tag: impl std::fmt::Display) {
        self.type_tag = canonical_key(type_tag);
    }

    pub fn property_type(&self) -> PropertyType {
        PropertyType::from_tag(&self.type_tag)
    }

    pub fn is_schema(&self) -> bool {
        self.property_type() == PropertyType::Schema
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    pub fn set_targets<I, T>(&mut self, targets: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.targets = targets.into_iter().map(Into::into).collect();
    }

    /// True when every candidate category is among this definition's targets
    /// (JSON containment). An empty candidate list always matches.
    pub fn targeting<S: AsRef<str>>(&self, candidates: &[S]) -> bool {
        candidates
            .iter()
            .all(|candidate| self.targets_category(candidate.as_ref()))
    }

    pub fn targets_category(&self, category: &str) -> bool {
        self.targets.iter().any(|target| target == category)
    }

    /// The encoded default, as persisted
    pub fn raw_default(&self) -> &Value {
        &self.raw_default
    }

    /// Replace the encoded default without re-encoding (used when loading rows)
    pub fn set_raw_default(&mut self, raw: Value) {
        self.raw_default = raw;
    }

    /// Encode a typed default through the current type and store it
    pub fn set_default(&mut self, value: &Value) {
        self.raw_default = TypeCoercer::encode(self.property_type(), value);
    }

    /// The default decoded through the current type.
    /// Malformed JSON yields `Value::Null`.
    pub fn default_value(&self) -> Value {
        TypeCoercer::decode(self.property_type(), &self.raw_default)
    }

    /// Sub-fields of a SCHEMA default, in stored order.
    ///
    /// The stored default is read as JSON regardless of the current type. An
    /// object is read as the sequence of its values; anything unreadable
    /// yields no sub-fields.
    pub fn sub_fields(&self) -> Vec<SubField> {
        let entries: Vec<Value> = match TypeCoercer::decode(PropertyType::Schema, &self.raw_default) {
            Value::Array(items) => items,
            Value::Object(map) => map.into_iter().map(|(_, entry)| entry).collect(),
            Value::Null => return Vec::new(),
            other => {
                log::debug!(
                    "SCHEMA default of {} is not a list of sub-fields: {}",
                    self.key,
                    other
                );
                return Vec::new();
            }
        };

        entries.into_iter().filter_map(SubField::from_entry).collect()
    }
}
