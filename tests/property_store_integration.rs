use property_store::{
    AttachmentStore, DefinitionRepository, InMemoryStore, NewPropertyDefinition, PresencePolicy,
    PropertyDefinition, PropertyDefinitionUpdate, PropertyError, TargetRef, ValueResolver,
};
use serde_json::{json, Value};

async fn create(store: &InMemoryStore, new_definition: Value) -> PropertyDefinition {
    let new_definition: NewPropertyDefinition = serde_json::from_value(new_definition).unwrap();
    let definition = PropertyDefinition::from_new(new_definition);
    store.upsert_definition(definition.clone()).await.unwrap();
    definition
}

#[tokio::test]
async fn test_property_lifecycle_for_a_user() {
    let store = InMemoryStore::new();
    let resolver = ValueResolver::default();
    let alice = TargetRef::new("user", "alice");

    create(
        &store,
        json!({"key": "max_uploads", "type": "int", "targets": ["user"], "default": "5"}),
    )
    .await;
    create(
        &store,
        json!({
            "key": "notifications",
            "type": "schema",
            "targets": ["user"],
            "default": [
                {"key": "email", "default": true},
                {"key": "sms", "default": false}
            ]
        }),
    )
    .await;

    // 1. Defaults apply when nothing is attached
    let uploads = resolver
        .resolve_for_target(&store, "max_uploads", &alice)
        .await
        .unwrap();
    assert_eq!(uploads.value, json!(5));

    let notifications = resolver
        .resolve_for_target(&store, "Notifications", &alice)
        .await
        .unwrap();
    assert_eq!(notifications.value, json!({"email": true, "sms": false}));

    // 2. A truthy override wins, untouched
    store.set_value("max_uploads", &alice, json!("7")).await.unwrap();
    let uploads = resolver
        .resolve_for_target(&store, "MAX_UPLOADS", &alice)
        .await
        .unwrap();
    assert_eq!(uploads.value, json!("7"));

    // 3. A zero override is indistinguishable from no override
    store.set_value("max_uploads", &alice, json!(0)).await.unwrap();
    let uploads = resolver
        .resolve_for_target(&store, "max_uploads", &alice)
        .await
        .unwrap();
    assert_eq!(uploads.value, json!(5));

    // ...unless the explicit presence policy is used
    let explicit = ValueResolver::new(PresencePolicy::Explicit);
    let uploads = explicit
        .resolve_for_target(&store, "max_uploads", &alice)
        .await
        .unwrap();
    assert_eq!(uploads.value, json!(0));

    // 4. SCHEMA overrides replace the assembled default entirely
    store
        .set_value("notifications", &alice, json!({"email": false}))
        .await
        .unwrap();
    let notifications = resolver
        .resolve_for_target(&store, "notifications", &alice)
        .await
        .unwrap();
    assert_eq!(notifications.value, json!({"email": false}));
}

#[tokio::test]
async fn test_resolve_all_only_includes_targeting_properties() {
    let store = InMemoryStore::new();
    let project = TargetRef::new("project", "p-1");

    create(
        &store,
        json!({"key": "theme", "type": "JSON", "targets": ["user", "project"], "default": {"mode": "light"}}),
    )
    .await;
    create(
        &store,
        json!({"key": "budget", "type": "INTEGER", "targets": ["project"], "default": 1000}),
    )
    .await;
    create(
        &store,
        json!({"key": "avatar", "targets": ["user"], "default": "default.png"}),
    )
    .await;

    store.set_value("budget", &project, json!(2500)).await.unwrap();

    let resolved = ValueResolver::default()
        .resolve_all_for_target(&store, &project)
        .await
        .unwrap();

    let values: Vec<(&str, &Value)> = resolved
        .iter()
        .map(|r| (r.definition.key(), &r.value))
        .collect();
    assert_eq!(
        values,
        vec![("BUDGET", &json!(2500)), ("THEME", &json!({"mode": "light"}))]
    );
}

#[tokio::test]
async fn test_type_change_reinterprets_existing_default() {
    let store = InMemoryStore::new();
    let user = TargetRef::new("user", "u-1");

    let mut definition = create(
        &store,
        json!({"key": "retries", "type": "STRING", "targets": ["user"], "default": "3"}),
    )
    .await;

    let resolved = ValueResolver::default()
        .resolve_for_target(&store, "retries", &user)
        .await
        .unwrap();
    assert_eq!(resolved.value, json!("3"));

    definition.apply_update(PropertyDefinitionUpdate {
        type_tag: Some("integer".to_string()),
        ..Default::default()
    });
    store.upsert_definition(definition).await.unwrap();

    let resolved = ValueResolver::default()
        .resolve_for_target(&store, "retries", &user)
        .await
        .unwrap();
    assert_eq!(resolved.value, json!(3));
    assert_eq!(resolved.definition.type_tag(), "INTEGER");
}

#[tokio::test]
async fn test_resolution_errors() {
    let store = InMemoryStore::new();
    create(
        &store,
        json!({"key": "theme", "type": "JSON", "targets": ["user"], "default": {}}),
    )
    .await;
    let resolver = ValueResolver::default();

    let err = resolver
        .resolve_for_target(&store, "missing", &TargetRef::new("user", "u-1"))
        .await
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<PropertyError>(),
        Some(&PropertyError::UnknownProperty { key: "MISSING".to_string() })
    );

    let err = resolver
        .resolve_for_target(&store, "theme", &TargetRef::new("team", "t-1"))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PropertyError>(),
        Some(PropertyError::IneligibleTarget { .. })
    ));
}

#[tokio::test]
async fn test_corrupt_json_default_resolves_to_null() {
    let store = InMemoryStore::new();
    let mut definition = PropertyDefinition::new("layout", "JSON").with_targets(["user"]);
    definition.set_raw_default(json!("{\"columns\": "));
    store.upsert_definition(definition).await.unwrap();

    let resolved = ValueResolver::default()
        .resolve_for_target(&store, "layout", &TargetRef::new("user", "u-1"))
        .await
        .unwrap();
    assert_eq!(resolved.value, Value::Null);
}
