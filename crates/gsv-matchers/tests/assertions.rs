//! Integration test: the three graph object assertions against the sample
//! data model in `schemas/`, driven the way a host test suite drives them.

use gsv_core::{Entity, MappedRelationship, RelationshipDirection, RelationshipMapping, TargetEntity};
use gsv_matchers::{
    register_matchers, to_match_direct_relationship_schema, to_match_graph_object_schema,
    to_target_entities, AssertionRegistry, GraphObjectSchemaParams, GraphObjects, MatcherContext,
    MatcherSet, MatcherTable, RelationshipSchemaParams, TargetEntitiesOptions,
};
use gsv_schema::{DirectoryRegistry, SchemaOverride};
use serde_json::{json, Map, Value};
use std::path::PathBuf;

/// Find the repository root.
fn repo_root() -> PathBuf {
    let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    dir.pop(); // crates/
    dir.pop(); // repo root
    dir
}

fn registry() -> DirectoryRegistry {
    DirectoryRegistry::new(repo_root().join("schemas")).expect("Failed to load schemas")
}

fn service(key: &str) -> Value {
    json!({
        "_key": key,
        "_type": "acme_service",
        "_class": ["Service"],
        "name": "Acme Service",
        "displayName": "Acme Service",
        "category": ["software"],
        "function": ["monitoring"]
    })
}

fn relationship() -> Value {
    json!({
        "_class": "HAS",
        "_type": "acme_account_has_user",
        "_key": "account|has|user",
        "_fromEntityKey": "account",
        "_toEntityKey": "user"
    })
}

fn mapped(target_type: &str, target_key: &str) -> MappedRelationship {
    MappedRelationship {
        class: "HAS".to_string(),
        relationship_type: "acme_account_has_user".to_string(),
        key: format!("account|has|{target_key}"),
        mapping: RelationshipMapping {
            relationship_direction: RelationshipDirection::Forward,
            source_entity_key: "account".to_string(),
            target_filter_keys: vec![vec!["_type".to_string(), "_key".to_string()]],
            target_entity: TargetEntity::new(target_type, target_key),
            skip_target_creation: None,
        },
        properties: Map::new(),
    }
}

fn user(key: &str) -> Entity {
    Entity::new(["User"], "acme_user", key)
}

// ---------------------------------------------------------------------------
// toMatchGraphObjectSchema
// ---------------------------------------------------------------------------

#[test]
fn test_well_formed_service_passes() {
    let registry = registry();
    let entity = service("service-1");
    let result = to_match_graph_object_schema(
        &registry,
        GraphObjects::from(&entity),
        &GraphObjectSchemaParams::new(["Service"]),
    )
    .unwrap();
    assert!(result.pass(), "{}", result.message());
    assert_eq!(result.message(), "Success!");
}

#[test]
fn test_duplicate_keys_listed_in_input_order() {
    let registry = registry();
    let entities = vec![service("b"), service("a"), service("b")];
    let result = to_match_graph_object_schema(
        &registry,
        GraphObjects::from(&entities),
        &GraphObjectSchemaParams::new(["Service"]),
    )
    .unwrap();
    assert!(!result.pass());
    assert_eq!(
        result.message(),
        "Object `_key` properties array is not unique: [b,a,b]"
    );
}

#[test]
fn test_duplicate_keys_skip_schema_resolution() {
    let registry = registry();
    let entities = vec![service("x"), service("x")];
    let result = to_match_graph_object_schema(
        &registry,
        GraphObjects::from(&entities),
        &GraphObjectSchemaParams::new(["INVALID_DATA_MODEL_CLASS"]),
    )
    .unwrap();
    assert!(!result.pass());
    assert!(result.message().starts_with("Object `_key` properties array is not unique"));
}

#[test]
fn test_unknown_class_message() {
    let registry = registry();
    let mut entity = service("service-1");
    entity["_class"] = json!(["INVALID_DATA_MODEL_CLASS"]);
    let result = to_match_graph_object_schema(
        &registry,
        GraphObjects::from(&entity),
        &GraphObjectSchemaParams::new(["INVALID_DATA_MODEL_CLASS"]),
    )
    .unwrap();
    assert!(!result.pass());
    assert_eq!(
        result.message(),
        "Error loading schemas for class (err=Invalid _class passed in schema for \
         \"toMatchGraphObjectSchema\" (_class=#INVALID_DATA_MODEL_CLASS))\n\n\
         Find out more about JupiterOne schemas: \
         https://github.com/JupiterOne/data-model/tree/master/src/schemas\n"
    );
}

#[test]
fn test_structural_failure_reports_index_of_first_failing_object() {
    let registry = registry();
    let mut broken = service("service-2");
    broken.as_object_mut().unwrap().remove("function");
    let entities = vec![service("service-1"), broken, json!({ "_key": "service-3" })];
    let result = to_match_graph_object_schema(
        &registry,
        GraphObjects::from(&entities),
        &GraphObjectSchemaParams::new(["Service"]),
    )
    .unwrap();
    assert!(!result.pass());
    let message = result.message();
    assert!(message.starts_with("Error validating graph object against schema (data={\n"));
    assert!(message.contains("\"_key\": \"service-2\""));
    assert!(message.contains("\"message\": \"must have required property 'function'\""));
    assert!(message.contains("index=1)\n\nFind out more about JupiterOne schemas: "));
    assert!(!message.contains("service-3"));
}

#[test]
fn test_undeclared_property_rejected_unless_overridden() {
    let registry = registry();
    let mut entity = service("service-1");
    entity["customScore"] = json!(7);

    let closed = to_match_graph_object_schema(
        &registry,
        GraphObjects::from(&entity),
        &GraphObjectSchemaParams::new(["Service"]),
    )
    .unwrap();
    assert!(!closed.pass());
    assert!(closed.message().contains("\"additionalProperty\": \"customScore\""));

    let schema = SchemaOverride::from_value(&json!({
        "properties": { "customScore": { "type": "integer" } }
    }))
    .unwrap();
    let open = to_match_graph_object_schema(
        &registry,
        GraphObjects::from(&entity),
        &GraphObjectSchemaParams::new(["Service"]).with_schema(schema),
    )
    .unwrap();
    assert!(open.pass(), "{}", open.message());
}

// ---------------------------------------------------------------------------
// toMatchDirectRelationshipSchema
// ---------------------------------------------------------------------------

#[test]
fn test_well_formed_relationship_passes() {
    let rel = relationship();
    let result = to_match_direct_relationship_schema(
        GraphObjects::from(&rel),
        &RelationshipSchemaParams::default(),
    )
    .unwrap();
    assert!(result.pass(), "{}", result.message());
}

#[test]
fn test_array_property_yields_six_diagnostics() {
    let mut rel = relationship();
    rel["someAdditionalProperty"] = json!(["arrays", "are", "invalid"]);
    let result = to_match_direct_relationship_schema(
        GraphObjects::from(&rel),
        &RelationshipSchemaParams::default(),
    )
    .unwrap();
    assert!(!result.pass());
    let message = result.message();
    assert_eq!(message.matches("\"instancePath\": \"/someAdditionalProperty\"").count(), 6);
    for scalar in ["boolean", "integer", "null", "number", "string"] {
        assert!(
            message.contains(&format!("\"message\": \"must be {scalar}\"")),
            "missing {scalar} record in {message}"
        );
    }
    assert!(message.contains("\"message\": \"must match a schema in anyOf\""));
}

#[test]
fn test_missing_required_relationship_field() {
    let mut rel = relationship();
    rel.as_object_mut().unwrap().remove("_toEntityKey");
    let result = to_match_direct_relationship_schema(
        GraphObjects::from(&rel),
        &RelationshipSchemaParams::default(),
    )
    .unwrap();
    assert!(!result.pass());
    assert!(result.message().contains("\"missingProperty\": \"_toEntityKey\""));
}

#[test]
fn test_relationship_override_allows_arrays() {
    let mut rel = relationship();
    rel["tags"] = json!(["a", "b"]);
    let params = RelationshipSchemaParams {
        schema: Some(
            SchemaOverride::from_value(&json!({
                "properties": { "tags": { "type": "array", "items": { "type": "string" } } }
            }))
            .unwrap(),
        ),
    };
    let result = to_match_direct_relationship_schema(GraphObjects::from(&rel), &params).unwrap();
    assert!(result.pass(), "{}", result.message());
}

// ---------------------------------------------------------------------------
// toTargetEntities
// ---------------------------------------------------------------------------

#[test]
fn test_single_matching_target_passes() {
    let result = to_target_entities(
        &[mapped("acme_user", "u1")],
        &[user("u1"), user("u2")],
        TargetEntitiesOptions::default(),
    );
    assert!(result.pass());
}

#[test]
fn test_two_identical_targets_pass_without_enforcement() {
    let result = to_target_entities(
        &[mapped("acme_user", "u1")],
        &[user("u1"), user("u1")],
        TargetEntitiesOptions::default(),
    );
    assert!(result.pass());
}

#[test]
fn test_two_identical_targets_fail_with_enforcement() {
    let result = to_target_entities(
        &[mapped("acme_user", "u1")],
        &[user("u1"), user("u1")],
        TargetEntitiesOptions {
            enforce_single_target: true,
        },
    );
    assert!(!result.pass());
    assert!(result
        .message()
        .starts_with("Multiple target entities found for mapped relationship, expected exactly one: {"));
}

#[test]
fn test_no_matching_target_fails() {
    let result = to_target_entities(
        &[mapped("acme_user", "u1")],
        &[user("u2"), Entity::new(["Host"], "acme_host", "u1")],
        TargetEntitiesOptions::default(),
    );
    assert!(!result.pass());
    let message = result.message();
    assert!(message.starts_with("No target entity found for mapped relationship: {"));
    assert!(message.contains("\"_mapping\": {"));
    assert!(!message.contains("JupiterOne"));
}

// ---------------------------------------------------------------------------
// Registrar
// ---------------------------------------------------------------------------

#[derive(Default)]
struct CountingRegistry {
    calls: Vec<Vec<&'static str>>,
}

impl AssertionRegistry for CountingRegistry {
    fn extend(&mut self, matchers: MatcherSet) {
        self.calls.push(matchers.keys().copied().collect());
    }
}

#[test]
fn test_register_extends_once_with_all_three() {
    let mut host = CountingRegistry::default();
    register_matchers(&mut host);
    assert_eq!(host.calls.len(), 1);
    let names = &host.calls[0];
    assert_eq!(names.len(), 3);
    for name in ["toMatchGraphObjectSchema", "toMatchDirectRelationshipSchema", "toTargetEntities"] {
        assert!(names.contains(&name), "missing {name}");
    }
}

#[test]
fn test_table_runs_assertions_from_json_arguments() {
    let registry = registry();
    let table = MatcherTable::with_graph_matchers();
    let context = MatcherContext::new(&registry);

    let result = table
        .run(
            "toMatchGraphObjectSchema",
            &context,
            &json!([service("s1"), service("s2")]),
            &[json!({ "_class": "Service" })],
        )
        .unwrap();
    assert!(result.pass(), "{}", result.message());

    let rel = serde_json::to_value(mapped("acme_user", "u1")).unwrap();
    let entities = serde_json::to_value(vec![user("u1"), user("u1")]).unwrap();
    let result = table
        .run(
            "toTargetEntities",
            &context,
            &json!([rel]),
            &[entities, json!({ "enforceSingleTarget": true })],
        )
        .unwrap();
    assert!(!result.pass());
}
