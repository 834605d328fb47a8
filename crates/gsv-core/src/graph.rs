//! # Graph Object Data Model
//!
//! Typed representations of the objects an integration collects:
//!
//! - [`Entity`]: a graph node with a `_class` list, `_type`, `_key`, and
//!   arbitrary caller-declared properties.
//! - [`ExplicitRelationship`]: an edge between two materialized entities,
//!   identified by `_fromEntityKey` and `_toEntityKey`.
//! - [`MappedRelationship`]: an edge from a concrete source entity toward an
//!   abstract target descriptor, resolved against real entities later.
//!
//! Field names follow the wire format (`_class`, `_fromEntityKey`,
//! `_mapping.targetEntity`, ...) through serde renames. Properties that are
//! not part of the fixed shape are kept in a flattened map so that
//! converting a typed object to JSON loses nothing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::GsvError;
use crate::identity::ClassNames;

/// A graph node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Taxonomy class or classes.
    #[serde(rename = "_class")]
    pub class: ClassNames,
    /// Type tag. Not required to be unique.
    #[serde(rename = "_type")]
    pub entity_type: String,
    /// Identifier, unique within any collection validated together.
    #[serde(rename = "_key")]
    pub key: String,
    /// Caller-declared properties.
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl Entity {
    /// Create an entity with no additional properties.
    pub fn new(
        class: impl Into<ClassNames>,
        entity_type: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            class: class.into(),
            entity_type: entity_type.into(),
            key: key.into(),
            properties: Map::new(),
        }
    }

    /// Attach a property, replacing any previous value under the same name.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }
}

/// An edge between two materialized entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplicitRelationship {
    /// Relationship class (a single verb such as `HAS`).
    #[serde(rename = "_class")]
    pub class: String,
    /// Type tag.
    #[serde(rename = "_type")]
    pub relationship_type: String,
    /// Identifier.
    #[serde(rename = "_key")]
    pub key: String,
    /// `_key` of the source entity.
    #[serde(rename = "_fromEntityKey")]
    pub from_entity_key: String,
    /// `_key` of the target entity.
    #[serde(rename = "_toEntityKey")]
    pub to_entity_key: String,
    /// Additional properties. Scalar values only under the default schema.
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl ExplicitRelationship {
    /// Create a relationship between two entity keys.
    pub fn new(
        class: impl Into<String>,
        relationship_type: impl Into<String>,
        key: impl Into<String>,
        from_entity_key: impl Into<String>,
        to_entity_key: impl Into<String>,
    ) -> Self {
        Self {
            class: class.into(),
            relationship_type: relationship_type.into(),
            key: key.into(),
            from_entity_key: from_entity_key.into(),
            to_entity_key: to_entity_key.into(),
            properties: Map::new(),
        }
    }

    /// Attach a property, replacing any previous value under the same name.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }
}

/// Which end of a mapped relationship the source entity sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RelationshipDirection {
    /// Source entity → target entity.
    Forward,
    /// Target entity → source entity.
    Reverse,
}

/// The abstract target of a mapped relationship.
///
/// Only `_type` and `_key` take part in target resolution; any other
/// properties describe the entity the mapper would create if no target
/// exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetEntity {
    /// Expected `_type` of the target entity.
    #[serde(rename = "_type", default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    /// Expected `_key` of the target entity.
    #[serde(rename = "_key", default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Remaining target properties.
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl TargetEntity {
    /// A target descriptor identified by `_type` and `_key`.
    pub fn new(entity_type: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            entity_type: Some(entity_type.into()),
            key: Some(key.into()),
            properties: Map::new(),
        }
    }

    /// Returns true if `entity` has exactly this descriptor's `_type` and `_key`.
    pub fn matches(&self, entity: &Entity) -> bool {
        self.entity_type.as_deref() == Some(entity.entity_type.as_str())
            && self.key.as_deref() == Some(entity.key.as_str())
    }

    /// Returns true if the JSON object carries exactly this descriptor's
    /// `_type` and `_key` as strings. No other field is read.
    pub fn matches_object(&self, object: &Value) -> bool {
        let field = |name: &str| object.get(name).and_then(Value::as_str);
        self.entity_type.is_some()
            && self.key.is_some()
            && field("_type") == self.entity_type.as_deref()
            && field("_key") == self.key.as_deref()
    }
}

/// The `_mapping` block of a mapped relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipMapping {
    /// Direction of the edge relative to the source entity.
    pub relationship_direction: RelationshipDirection,
    /// `_key` of the concrete source entity.
    pub source_entity_key: String,
    /// Property sets the mapper would use to locate the target.
    #[serde(default)]
    pub target_filter_keys: Vec<Vec<String>>,
    /// Abstract target descriptor.
    pub target_entity: TargetEntity,
    /// When set, the mapper does not create a placeholder target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_target_creation: Option<bool>,
}

/// An edge from a concrete source entity toward an abstract target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedRelationship {
    /// Relationship class.
    #[serde(rename = "_class")]
    pub class: String,
    /// Type tag.
    #[serde(rename = "_type")]
    pub relationship_type: String,
    /// Identifier.
    #[serde(rename = "_key")]
    pub key: String,
    /// Source and target description.
    #[serde(rename = "_mapping")]
    pub mapping: RelationshipMapping,
    /// Additional properties.
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl MappedRelationship {
    /// The abstract target descriptor.
    pub fn target(&self) -> &TargetEntity {
        &self.mapping.target_entity
    }
}

/// Convert typed graph objects to the JSON values the validators consume.
///
/// # Errors
///
/// Returns `GsvError::Serialization` if any item fails to serialize, or
/// `GsvError::MalformedObject` if an item does not serialize to a JSON object.
pub fn to_graph_objects<T: Serialize>(items: &[T]) -> Result<Vec<Value>, GsvError> {
    items
        .iter()
        .map(|item| {
            let value = serde_json::to_value(item)?;
            if value.is_object() {
                Ok(value)
            } else {
                Err(GsvError::MalformedObject(format!(
                    "expected a JSON object, got {value}"
                )))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_serializes_wire_names() {
        let entity = Entity::new(["Service"], "acme_service", "svc-1")
            .with_property("category", json!(["software"]))
            .with_property("function", json!(["monitoring"]));
        let value = serde_json::to_value(&entity).unwrap();
        assert_eq!(value["_class"], json!(["Service"]));
        assert_eq!(value["_type"], "acme_service");
        assert_eq!(value["_key"], "svc-1");
        assert_eq!(value["category"], json!(["software"]));
    }

    #[test]
    fn test_explicit_relationship_roundtrip() {
        let raw = json!({
            "_class": "HAS",
            "_type": "acme_account_has_user",
            "_key": "a|has|u",
            "_fromEntityKey": "a",
            "_toEntityKey": "u",
            "active": true
        });
        let rel: ExplicitRelationship = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(rel.from_entity_key, "a");
        assert_eq!(rel.properties["active"], true);
        assert_eq!(serde_json::to_value(&rel).unwrap(), raw);
    }

    #[test]
    fn test_mapped_relationship_parses_mapping() {
        let raw = json!({
            "_class": "HAS",
            "_type": "acme_account_has_user",
            "_key": "a|has|u",
            "_mapping": {
                "relationshipDirection": "FORWARD",
                "sourceEntityKey": "a",
                "targetFilterKeys": [["_type", "_key"]],
                "targetEntity": { "_type": "acme_user", "_key": "u", "displayName": "U" }
            }
        });
        let rel: MappedRelationship = serde_json::from_value(raw).unwrap();
        assert_eq!(rel.mapping.relationship_direction, RelationshipDirection::Forward);
        assert_eq!(rel.target().key.as_deref(), Some("u"));
        assert_eq!(rel.target().properties["displayName"], "U");
    }

    #[test]
    fn test_target_matches_requires_type_and_key() {
        let target = TargetEntity::new("acme_user", "u");
        assert!(target.matches(&Entity::new("User", "acme_user", "u")));
        assert!(!target.matches(&Entity::new("User", "acme_user", "v")));
        assert!(!target.matches(&Entity::new("User", "other_user", "u")));
    }

    #[test]
    fn test_target_without_key_matches_nothing() {
        let target = TargetEntity {
            entity_type: Some("acme_user".to_string()),
            key: None,
            properties: Map::new(),
        };
        assert!(!target.matches(&Entity::new("User", "acme_user", "u")));
    }

    #[test]
    fn test_target_matches_object_reads_only_type_and_key() {
        let target = TargetEntity::new("acme_user", "u");
        assert!(target.matches_object(&json!({ "_type": "acme_user", "_key": "u" })));
        assert!(target.matches_object(&json!({ "_type": "acme_user", "_key": "u", "_class": 7 })));
        assert!(!target.matches_object(&json!({ "_type": "acme_user", "_key": 1 })));
        assert!(!target.matches_object(&json!({ "_type": "acme_user" })));
        assert!(!target.matches_object(&json!("acme_user")));
    }

    #[test]
    fn test_to_graph_objects_rejects_non_objects() {
        let err = to_graph_objects(&["not an object"]).unwrap_err();
        assert!(matches!(err, GsvError::MalformedObject(_)));
    }
}
