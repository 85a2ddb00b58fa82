use std::collections::HashSet;

use anyhow::{Context, Result};
use property_store::config::AppConfig;
use property_store::model::canonical_key;
use sqlx::{PgPool, Row};

/// What to do with one stored definition row
#[derive(Debug, Clone, PartialEq)]
enum Step {
    Normalize {
        key: String,
        canonical_key: String,
        canonical_type: String,
    },
    /// The canonical key already belongs to another row
    Skip { key: String, canonical_key: String },
}

/// Plan the rewrite of `(key, type)` rows. Keys that are already canonical
/// are claimed first; after that each canonical key goes to the first row
/// that needs it and later rows mapping to it are skipped.
fn plan_normalization(rows: &[(String, String)]) -> Vec<Step> {
    let mut claimed: HashSet<String> = rows
        .iter()
        .filter(|(key, _)| &canonical_key(key) == key)
        .map(|(key, _)| key.clone())
        .collect();

    let mut steps = Vec::new();
    for (key, type_tag) in rows {
        let canonical = canonical_key(key);
        let canonical_type = canonical_key(type_tag);
        if &canonical == key && &canonical_type == type_tag {
            continue;
        }

        if &canonical != key && !claimed.insert(canonical.clone()) {
            steps.push(Step::Skip {
                key: key.clone(),
                canonical_key: canonical,
            });
            continue;
        }

        steps.push(Step::Normalize {
            key: key.clone(),
            canonical_key: canonical,
            canonical_type,
        });
    }
    steps
}

/// Rewrite property keys and type tags that were stored without
/// canonicalisation. Attached values follow the key via ON UPDATE CASCADE.
#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    let database_url = config.database_url()?;
    let pool = PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    println!("Connected to database. Normalizing property definitions...");

    let mut tx = pool.begin().await.context("Failed to start transaction")?;

    let rows: Vec<(String, String)> =
        sqlx::query("SELECT key, type FROM properties ORDER BY key FOR UPDATE")
            .fetch_all(&mut *tx)
            .await?
            .into_iter()
            .map(|row| (row.get::<String, _>("key"), row.get::<String, _>("type")))
            .collect();

    println!("Found {} property definitions", rows.len());

    let mut updated = 0;
    let mut skipped = 0;
    for step in plan_normalization(&rows) {
        match step {
            Step::Skip { key, canonical_key } => {
                println!("Skipping {}: {} already exists", key, canonical_key);
                skipped += 1;
            }
            Step::Normalize {
                key,
                canonical_key,
                canonical_type,
            } => {
                sqlx::query(
                    "UPDATE properties SET key = $1, type = $2, updated_at = NOW() WHERE key = $3",
                )
                .bind(&canonical_key)
                .bind(&canonical_type)
                .bind(&key)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to normalize property {}", key))?;

                println!("Normalized {} -> {} ({})", key, canonical_key, canonical_type);
                updated += 1;
            }
        }
    }

    tx.commit().await.context("Failed to commit normalization")?;

    println!(
        "\nNormalization completed: {} updated, {} skipped",
        updated, skipped
    );

    Ok(())
}
