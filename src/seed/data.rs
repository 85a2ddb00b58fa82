use anyhow::Result;
use serde_json::{json, Value};

use crate::model::{PropertyDefinition, TargetRef};
use crate::store::traits::PropertyStore;

/// Helper to build a definition through the normal create path
fn create_definition(key: &str, type_tag: &str, targets: &[&str], default: Value) -> PropertyDefinition {
    PropertyDefinition::new(key, type_tag)
        .with_targets(targets.iter().copied())
        .with_default(default)
}

/// Sample properties covering every type, plus a few overrides for `user:demo`
pub async fn load_seed_data<S: PropertyStore + ?Sized>(store: &S) -> Result<()> {
    let definitions = vec![
        create_definition("display_name", "STRING", &["user", "team"], json!("Anonymous")),
        create_definition("max_uploads", "INT", &["user"], json!(10)),
        create_definition("beta_access", "BOOL", &["user", "team"], json!(false)),
        create_definition(
            "theme",
            "JSON",
            &["user", "project"],
            json!({"mode": "light", "accent": "#3366ff"}),
        ),
        create_definition(
            "notifications",
            "SCHEMA",
            &["user"],
            json!([
                {"key": "email", "type": "BOOL", "default": "1"},
                {"key": "digest_hour", "type": "INT", "default": "8"},
                {"key": "channels", "type": "JSON", "default": "[\"inbox\"]"}
            ]),
        ),
    ];

    for definition in definitions {
        log::info!("Seeding property {}", definition.key());
        store.upsert_definition(definition).await?;
    }

    let demo_user = TargetRef::new("user", "demo");
    store.set_value("display_name", &demo_user, json!("Demo User")).await?;
    store.set_value("beta_access", &demo_user, json!(true)).await?;
    store
        .set_value("theme", &demo_user, json!({"mode": "dark", "accent": "#ff9900"}))
        .await?;

    Ok(())
}
