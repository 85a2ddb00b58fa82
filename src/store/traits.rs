use std::collections::HashMap;

use anyhow::Result;
use serde_json::Value;

use crate::model::{PropertyDefinition, TargetRef};

/// Persistence of property definitions. Keys are canonicalised to uppercase
/// by implementations, so lookups are case-insensitive for callers.
#[async_trait::async_trait]
pub trait DefinitionRepository: Send + Sync {
    async fn get_definition(&self, key: &str) -> Result<Option<PropertyDefinition>>;
    /// List definitions ordered by key. With `Some(targets)`, only definitions
    /// whose targets contain every given category are returned.
    async fn list_definitions(&self, targets: Option<&[String]>) -> Result<Vec<PropertyDefinition>>;
    async fn upsert_definition(&self, definition: PropertyDefinition) -> Result<()>;
    /// Delete a definition together with every value attached through it
    async fn delete_definition(&self, key: &str) -> Result<bool>;
}

/// Persistence of per-target override values
#[async_trait::async_trait]
pub trait AttachmentStore: Send + Sync {
    async fn get_value(&self, key: &str, target: &TargetRef) -> Result<Option<Value>>;
    /// All values attached to one target, keyed by property key
    async fn list_values_for_target(&self, target: &TargetRef) -> Result<HashMap<String, Value>>;
    /// Attach a value. Fails with `PropertyError` when the property is unknown
    /// or does not target the target's category.
    async fn set_value(&self, key: &str, target: &TargetRef, value: Value) -> Result<()>;
    async fn delete_value(&self, key: &str, target: &TargetRef) -> Result<bool>;
}

/// Both collaborators behind one handle, with reads that return a definition
/// and its override from the same snapshot
#[async_trait::async_trait]
pub trait PropertyStore: DefinitionRepository + AttachmentStore {
    async fn get_definition_with_value(
        &self,
        key: &str,
        target: &TargetRef,
    ) -> Result<Option<(PropertyDefinition, Option<Value>)>>;

    /// Every definition targeting `target.category`, ordered by key, each with
    /// the value attached to `target` if any
    async fn list_definitions_with_values(
        &self,
        target: &TargetRef,
    ) -> Result<Vec<(PropertyDefinition, Option<Value>)>>;
}
