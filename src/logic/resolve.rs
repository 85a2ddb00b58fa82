use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PropertyError;
use crate::logic::{is_truthy, SchemaDefaultAssembler};
use crate::model::{canonical_key, PropertyDefinition, TargetRef};
use crate::store::traits::PropertyStore;

/// Decides whether an attached override counts as set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresencePolicy {
    /// Only truthy overrides count; `0`, `""`, `false`, `[]` and `{}` fall
    /// through to the default
    #[default]
    Truthy,
    /// Any attached non-null override counts, falsy ones included
    Explicit,
}

impl PresencePolicy {
    pub fn is_present(&self, value: &Value) -> bool {
        match self {
            PresencePolicy::Truthy => is_truthy(value),
            PresencePolicy::Explicit => !value.is_null(),
        }
    }
}

/// A definition together with the effective value it resolved to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedProperty {
    #[serde(flatten)]
    pub definition: PropertyDefinition,
    pub value: Value,
}

/// Computes the effective value of a property for a target
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueResolver {
    policy: PresencePolicy,
}

impl ValueResolver {
    pub fn new(policy: PresencePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> PresencePolicy {
        self.policy
    }

    /// The override when present, else the default.
    ///
    /// Overrides are returned exactly as attached, with no decoding. For SCHEMA
    /// properties the default is the mapping assembled from the sub-fields.
    pub fn resolve(&self, definition: &PropertyDefinition, override_value: Option<&Value>) -> Value {
        if let Some(value) = override_value.filter(|value| self.policy.is_present(value)) {
            return value.clone();
        }

        if definition.is_schema() {
            SchemaDefaultAssembler::assemble(&definition.sub_fields())
        } else {
            definition.default_value()
        }
    }

    /// Resolve one property for a target, reading the definition and its
    /// override in one consistent lookup
    pub async fn resolve_for_target<S>(
        &self,
        store: &S,
        key: &str,
        target: &TargetRef,
    ) -> Result<ResolvedProperty>
    where
        S: PropertyStore + ?Sized,
    {
        let Some((definition, override_value)) =
            store.get_definition_with_value(key, target).await?
        else {
            return Err(PropertyError::UnknownProperty {
                key: canonical_key(key),
            }
            .into());
        };

        if !definition.targets_category(&target.category) {
            return Err(PropertyError::IneligibleTarget {
                key: definition.key().to_string(),
                category: target.category.clone(),
            }
            .into());
        }

        let value = self.resolve(&definition, override_value.as_ref());
        log::debug!("Resolved {} for {}: {}", definition.key(), target, value);
        Ok(ResolvedProperty { definition, value })
    }

    /// Resolve every property that targets the target's category
    pub async fn resolve_all_for_target<S>(
        &self,
        store: &S,
        target: &TargetRef,
    ) -> Result<Vec<ResolvedProperty>>
    where
        S: PropertyStore + ?Sized,
    {
        let pairs = store.list_definitions_with_values(target).await?;

        Ok(pairs
            .into_iter()
            .map(|(definition, override_value)| {
                let value = self.resolve(&definition, override_value.as_ref());
                ResolvedProperty { definition, value }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema_definition(sub_fields: Value) -> PropertyDefinition {
        PropertyDefinition::new("notifications", "SCHEMA").with_default(sub_fields)
    }

    fn int_definition() -> PropertyDefinition {
        let mut definition = PropertyDefinition::new("max_uploads", "INT");
        definition.set_raw_default(json!("5"));
        definition
    }

    #[test]
    fn test_schema_without_override_assembles_defaults() {
        let definition = schema_definition(json!([
            {"key": "a", "default": 1},
            {"key": "b", "default": 2}
        ]));
        let resolver = ValueResolver::default();

        assert_eq!(resolver.resolve(&definition, None), json!({"a": 1, "b": 2}));
        // A falsy override is treated as missing
        assert_eq!(resolver.resolve(&definition, Some(&json!({}))), json!({"a": 1, "b": 2}));
    }

    #[test]
    fn test_schema_without_sub_fields_is_empty_object() {
        let definition = schema_definition(json!([]));
        assert_eq!(ValueResolver::default().resolve(&definition, None), json!({}));
    }

    #[test]
    fn test_schema_with_malformed_default_is_empty_object() {
        let mut definition = PropertyDefinition::new("notifications", "SCHEMA");
        definition.set_raw_default(json!("[{oops"));
        assert_eq!(ValueResolver::default().resolve(&definition, None), json!({}));
    }

    #[test]
    fn test_schema_override_bypasses_assembly() {
        let definition = schema_definition(json!([{"key": "a", "default": 1}]));
        let override_value = json!({"a": 9, "extra": "kept as-is"});

        assert_eq!(
            ValueResolver::default().resolve(&definition, Some(&override_value)),
            override_value
        );
    }

    #[test]
    fn test_schema_duplicate_sub_field_keys_keep_last() {
        let definition = schema_definition(json!([
            {"key": "a", "default": 1},
            {"key": "a", "default": 2}
        ]));
        assert_eq!(ValueResolver::default().resolve(&definition, None), json!({"a": 2}));
    }

    #[test]
    fn test_falsy_override_falls_back_to_default() {
        let definition = int_definition();
        let resolver = ValueResolver::default();

        assert_eq!(resolver.resolve(&definition, Some(&json!(0))), json!(5));
        assert_eq!(resolver.resolve(&definition, Some(&json!("0"))), json!(5));
        assert_eq!(resolver.resolve(&definition, Some(&json!(""))), json!(5));
        assert_eq!(resolver.resolve(&definition, None), json!(5));
    }

    #[test]
    fn test_truthy_override_is_returned_undecoded() {
        let definition = int_definition();
        let resolver = ValueResolver::default();

        assert_eq!(resolver.resolve(&definition, Some(&json!("7"))), json!("7"));
        assert_eq!(resolver.resolve(&definition, Some(&json!(7))), json!(7));
    }

    #[test]
    fn test_explicit_policy_keeps_falsy_overrides() {
        let definition = int_definition();
        let resolver = ValueResolver::new(PresencePolicy::Explicit);

        assert_eq!(resolver.resolve(&definition, Some(&json!(0))), json!(0));
        assert_eq!(resolver.resolve(&definition, Some(&json!(false))), json!(false));
        assert_eq!(resolver.resolve(&definition, Some(&Value::Null)), json!(5));
        assert_eq!(resolver.resolve(&definition, None), json!(5));

        let schema = schema_definition(json!([{"key": "a", "default": 1}]));
        assert_eq!(resolver.resolve(&schema, Some(&json!({}))), json!({}));
    }

    #[test]
    fn test_malformed_json_default_resolves_to_null() {
        let mut definition = PropertyDefinition::new("theme", "JSON");
        definition.set_raw_default(json!("{not valid json"));
        assert_eq!(ValueResolver::default().resolve(&definition, None), Value::Null);
    }

    #[test]
    fn test_presence_policy_deserializes_lowercase() {
        let policy: PresencePolicy = serde_json::from_value(json!("explicit")).unwrap();
        assert_eq!(policy, PresencePolicy::Explicit);
        assert_eq!(PresencePolicy::default(), PresencePolicy::Truthy);
    }

    #[test]
    fn test_resolved_property_serializes_flat() {
        let definition = PropertyDefinition::new("beta", "BOOL")
            .with_targets(["user"])
            .with_default(json!(true));
        let resolved = ResolvedProperty {
            value: ValueResolver::default().resolve(&definition, None),
            definition,
        };

        let json = serde_json::to_value(&resolved).unwrap();
        assert_eq!(json["key"], json!("BETA"));
        assert_eq!(json["type"], json!("BOOL"));
        assert_eq!(json["default"], json!("1"));
        assert_eq!(json["value"], json!(true));
    }
}
