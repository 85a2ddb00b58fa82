use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use itertools::Itertools;
use parking_lot::RwLock;
use serde_json::Value;

use crate::error::PropertyError;
use crate::model::{canonical_key, PropertyDefinition, TargetRef};
use crate::store::traits::{AttachmentStore, DefinitionRepository, PropertyStore};

#[derive(Debug, Default)]
struct StoreState {
    /// Definitions keyed by canonical key
    definitions: HashMap<String, PropertyDefinition>,
    /// Attached values keyed by (canonical key, target)
    values: HashMap<(String, TargetRef), Value>,
}

/// Process-local store. A single lock guards definitions and values so every
/// read sees a consistent pair.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl DefinitionRepository for InMemoryStore {
    async fn get_definition(&self, key: &str) -> Result<Option<PropertyDefinition>> {
        let state = self.state.read();
        Ok(state.definitions.get(&canonical_key(key)).cloned())
    }

    async fn list_definitions(&self, targets: Option<&[String]>) -> Result<Vec<PropertyDefinition>> {
        let state = self.state.read();
        Ok(state
            .definitions
            .values()
            .filter(|definition| targets.map_or(true, |targets| definition.targeting(targets)))
            .sorted_by(|a, b| a.key().cmp(b.key()))
            .cloned()
            .collect())
    }

    async fn upsert_definition(&self, definition: PropertyDefinition) -> Result<()> {
        let mut state = self.state.write();
        state
            .definitions
            .insert(definition.key().to_string(), definition);
        Ok(())
    }

    async fn delete_definition(&self, key: &str) -> Result<bool> {
        let key = canonical_key(key);
        let mut state = self.state.write();
        let removed = state.definitions.remove(&key).is_some();
        state.values.retain(|(value_key, _), _| value_key != &key);
        Ok(removed)
    }
}

#[async_trait::async_trait]
impl AttachmentStore for InMemoryStore {
    async fn get_value(&self, key: &str, target: &TargetRef) -> Result<Option<Value>> {
        let state = self.state.read();
        Ok(state
            .values
            .get(&(canonical_key(key), target.clone()))
            .cloned())
    }

    async fn list_values_for_target(&self, target: &TargetRef) -> Result<HashMap<String, Value>> {
        let state = self.state.read();
        Ok(state
            .values
            .iter()
            .filter(|((_, value_target), _)| value_target == target)
            .map(|((key, _), value)| (key.clone(), value.clone()))
            .collect())
    }

    async fn set_value(&self, key: &str, target: &TargetRef, value: Value) -> Result<()> {
        let key = canonical_key(key);
        let mut state = self.state.write();

        let Some(definition) = state.definitions.get(&key) else {
            return Err(PropertyError::UnknownProperty { key }.into());
        };
        if !definition.targets_category(&target.category) {
            return Err(PropertyError::IneligibleTarget {
                key,
                category: target.category.clone(),
            }
            .into());
        }

        state.values.insert((key, target.clone()), value);
        Ok(())
    }

    async fn delete_value(&self, key: &str, target: &TargetRef) -> Result<bool> {
        let mut state = self.state.write();
        Ok(state
            .values
            .remove(&(canonical_key(key), target.clone()))
            .is_some())
    }
}

#[async_trait::async_trait]
impl PropertyStore for InMemoryStore {
    async fn get_definition_with_value(
        &self,
        key: &str,
        target: &TargetRef,
    ) -> Result<Option<(PropertyDefinition, Option<Value>)>> {
        let key = canonical_key(key);
        let state = self.state.read();

        Ok(state.definitions.get(&key).map(|definition| {
            let value = state.values.get(&(key.clone(), target.clone())).cloned();
            (definition.clone(), value)
        }))
    }

    async fn list_definitions_with_values(
        &self,
        target: &TargetRef,
    ) -> Result<Vec<(PropertyDefinition, Option<Value>)>> {
        let state = self.state.read();

        Ok(state
            .definitions
            .values()
            .filter(|definition| definition.targets_category(&target.category))
            .sorted_by(|a, b| a.key().cmp(b.key()))
            .map(|definition| {
                let value = state
                    .values
                    .get(&(definition.key().to_string(), target.clone()))
                    .cloned();
                (definition.clone(), value)
            })
            .collect())
    }
}
