use serde_json::{Map, Value};

use crate::model::SubField;

/// Builds the composite default of a SCHEMA property from its sub-fields.
pub struct SchemaDefaultAssembler;

impl SchemaDefaultAssembler {
    /// Map each sub-field key to its decoded default.
    ///
    /// Always returns an object, `{}` for no sub-fields. When a key repeats,
    /// the later sub-field wins.
    pub fn assemble(sub_fields: &[SubField]) -> Value {
        let mut assembled = Map::new();

        for field in sub_fields {
            if assembled
                .insert(field.key.clone(), field.default_value())
                .is_some()
            {
                log::debug!(
                    "SCHEMA sub-field '{}' is defined more than once; keeping the last default",
                    field.key
                );
            }
        }

        Value::Object(assembled)
    }
}
