use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Row};

use crate::error::PropertyError;
use crate::model::{canonical_key, PropertyDefinition, TargetRef};
use crate::store::traits::{AttachmentStore, DefinitionRepository, PropertyStore};

const CREATE_PROPERTIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS properties (
    key TEXT PRIMARY KEY,
    type TEXT NOT NULL DEFAULT 'STRING',
    targets JSONB NOT NULL DEFAULT '[]'::jsonb,
    "default" TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)"#;

const CREATE_PROPERTY_VALUES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS property_values (
    property_key TEXT NOT NULL REFERENCES properties(key) ON DELETE CASCADE ON UPDATE CASCADE,
    target_type TEXT NOT NULL,
    target_id TEXT NOT NULL,
    value JSONB NOT NULL,
    PRIMARY KEY (property_key, target_type, target_id)
)"#;

const DEFINITION_COLUMNS: &str = r#"p.key, p.type, p.targets, p."default", p.created_at, p.updated_at"#;

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Create the property tables if they do not exist yet
    pub async fn migrate(&self) -> Result<()> {
        for statement in [CREATE_PROPERTIES_TABLE, CREATE_PROPERTY_VALUES_TABLE] {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("Failed to create property tables")?;
        }
        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Stored text of an encoded default; structured raw values are kept as JSON text
fn raw_default_to_text(raw: &Value) -> Option<String> {
    match raw {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn definition_from_row(row: &PgRow) -> Result<PropertyDefinition> {
    let key: String = row.try_get("key")?;
    let type_tag: String = row.try_get("type")?;
    let targets: Json<Vec<String>> = row.try_get("targets")?;
    let raw_default: Option<String> = row.try_get("default")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

    let mut definition = PropertyDefinition::new(key, type_tag).with_targets(targets.0);
    definition.set_raw_default(raw_default.map(Value::String).unwrap_or(Value::Null));
    definition.created_at = created_at;
    definition.updated_at = updated_at;
    Ok(definition)
}

fn definition_with_value_from_row(row: &PgRow) -> Result<(PropertyDefinition, Option<Value>)> {
    let definition = definition_from_row(row)?;
    let value: Option<Value> = row.try_get("value")?;
    Ok((definition, value))
}

#[async_trait::async_trait]
impl DefinitionRepository for PostgresStore {
    async fn get_definition(&self, key: &str) -> Result<Option<PropertyDefinition>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM properties p WHERE p.key = $1",
            DEFINITION_COLUMNS
        ))
        .bind(canonical_key(key))
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch property definition")?;

        row.as_ref().map(definition_from_row).transpose()
    }

    async fn list_definitions(&self, targets: Option<&[String]>) -> Result<Vec<PropertyDefinition>> {
        let rows = match targets {
            Some(targets) => {
                sqlx::query(&format!(
                    "SELECT {} FROM properties p WHERE p.targets @> $1 ORDER BY p.key",
                    DEFINITION_COLUMNS
                ))
                .bind(Json(targets.to_vec()))
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {} FROM properties p ORDER BY p.key",
                    DEFINITION_COLUMNS
                ))
                .fetch_all(&self.pool)
                .await
            }
        }
        .context("Failed to list property definitions")?;

        rows.iter().map(definition_from_row).collect()
    }

    async fn upsert_definition(&self, definition: PropertyDefinition) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO properties (key, type, targets, "default", created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6)
               ON CONFLICT (key) DO UPDATE SET
                   type = EXCLUDED.type,
                   targets = EXCLUDED.targets,
                   "default" = EXCLUDED."default",
                   updated_at = EXCLUDED.updated_at"#,
        )
        .bind(definition.key())
        .bind(definition.type_tag())
        .bind(Json(definition.targets().to_vec()))
        .bind(raw_default_to_text(definition.raw_default()))
        .bind(definition.created_at)
        .bind(definition.updated_at)
        .execute(&self.pool)
        .await
        .context("Failed to upsert property definition")?;

        Ok(())
    }

    async fn delete_definition(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM properties WHERE key = $1")
            .bind(canonical_key(key))
            .execute(&self.pool)
            .await
            .context("Failed to delete property definition")?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl AttachmentStore for PostgresStore {
    async fn get_value(&self, key: &str, target: &TargetRef) -> Result<Option<Value>> {
        let row = sqlx::query(
            "SELECT value FROM property_values
             WHERE property_key = $1 AND target_type = $2 AND target_id = $3",
        )
        .bind(canonical_key(key))
        .bind(&target.category)
        .bind(&target.id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch property value")?;

        Ok(row.map(|row| row.get::<Value, _>("value")))
    }

    async fn list_values_for_target(&self, target: &TargetRef) -> Result<HashMap<String, Value>> {
        let rows = sqlx::query(
            "SELECT property_key, value FROM property_values
             WHERE target_type = $1 AND target_id = $2",
        )
        .bind(&target.category)
        .bind(&target.id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list property values")?;

        Ok(rows
            .into_iter()
            .map(|row| (row.get::<String, _>("property_key"), row.get::<Value, _>("value")))
            .collect())
    }

    async fn set_value(&self, key: &str, target: &TargetRef, value: Value) -> Result<()> {
        let key = canonical_key(key);
        let mut tx = self.pool.begin().await.context("Failed to start transaction")?;

        // Lock the definition row so its targets cannot change underneath us
        let row = sqlx::query("SELECT targets FROM properties WHERE key = $1 FOR SHARE")
            .bind(&key)
            .fetch_optional(&mut *tx)
            .await
            .context("Failed to fetch property definition")?;

        let Some(row) = row else {
            return Err(PropertyError::UnknownProperty { key }.into());
        };
        let targets: Json<Vec<String>> = row.try_get("targets")?;
        if !targets.0.contains(&target.category) {
            return Err(PropertyError::IneligibleTarget {
                key,
                category: target.category.clone(),
            }
            .into());
        }

        sqlx::query(
            "INSERT INTO property_values (property_key, target_type, target_id, value)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (property_key, target_type, target_id) DO UPDATE SET value = EXCLUDED.value",
        )
        .bind(&key)
        .bind(&target.category)
        .bind(&target.id)
        .bind(&value)
        .execute(&mut *tx)
        .await
        .context("Failed to upsert property value")?;

        tx.commit().await.context("Failed to commit property value")?;
        Ok(())
    }

    async fn delete_value(&self, key: &str, target: &TargetRef) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM property_values
             WHERE property_key = $1 AND target_type = $2 AND target_id = $3",
        )
        .bind(canonical_key(key))
        .bind(&target.category)
        .bind(&target.id)
        .execute(&self.pool)
        .await
        .context("Failed to delete property value")?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl PropertyStore for PostgresStore {
    async fn get_definition_with_value(
        &self,
        key: &str,
        target: &TargetRef,
    ) -> Result<Option<(PropertyDefinition, Option<Value>)>> {
        let row = sqlx::query(&format!(
            "SELECT {}, v.value FROM properties p
             LEFT JOIN property_values v
               ON v.property_key = p.key AND v.target_type = $2 AND v.target_id = $3
             WHERE p.key = $1",
            DEFINITION_COLUMNS
        ))
        .bind(canonical_key(key))
        .bind(&target.category)
        .bind(&target.id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch property definition with value")?;

        row.as_ref().map(definition_with_value_from_row).transpose()
    }

    async fn list_definitions_with_values(
        &self,
        target: &TargetRef,
    ) -> Result<Vec<(PropertyDefinition, Option<Value>)>> {
        let rows = sqlx::query(&format!(
            "SELECT {}, v.value FROM properties p
             LEFT JOIN property_values v
               ON v.property_key = p.key AND v.target_type = $2 AND v.target_id = $3
             WHERE p.targets @> $1
             ORDER BY p.key",
            DEFINITION_COLUMNS
        ))
        .bind(Json(vec![target.category.clone()]))
        .bind(&target.category)
        .bind(&target.id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list property definitions with values")?;

        rows.iter().map(definition_with_value_from_row).collect()
    }
}
