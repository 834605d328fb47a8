//! # Schema Assertions
//!
//! `toMatchGraphObjectSchema` validates entities against the merge of their
//! taxonomy class schemas. `toMatchDirectRelationshipSchema` validates
//! direct relationships against the fixed relationship schema. Both accept
//! one object or an ordered collection and report through [`MatchResult`].
//!
//! [`to_match_entities`] and [`to_match_explicit_relationships`] take the
//! typed graph objects from `gsv-core` and validate their JSON form.

use gsv_core::{to_graph_objects, ClassNames, Entity, ExplicitRelationship};
use gsv_schema::{
    validate_direct_relationships, GraphObjectValidator, SchemaOverride, SchemaRegistry,
    ValidationOutcome,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::MatcherUsageError;
use crate::messages;
use crate::result::MatchResult;

/// Name of the entity schema assertion.
pub const TO_MATCH_GRAPH_OBJECT_SCHEMA: &str = "toMatchGraphObjectSchema";

/// Name of the direct relationship schema assertion.
pub const TO_MATCH_DIRECT_RELATIONSHIP_SCHEMA: &str = "toMatchDirectRelationshipSchema";

/// One graph object or an ordered collection of them.
#[derive(Debug, Clone, Copy)]
pub enum GraphObjects<'a> {
    /// A single object.
    One(&'a Value),
    /// An ordered collection.
    Many(&'a [Value]),
}

impl<'a> GraphObjects<'a> {
    /// The objects as a slice, in input order.
    pub fn as_slice(&self) -> &'a [Value] {
        match *self {
            Self::One(object) => std::slice::from_ref(object),
            Self::Many(objects) => objects,
        }
    }
}

impl<'a> From<&'a Value> for GraphObjects<'a> {
    /// A JSON array is a collection; anything else is a single object.
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Array(items) => Self::Many(items),
            other => Self::One(other),
        }
    }
}

impl<'a> From<&'a [Value]> for GraphObjects<'a> {
    fn from(objects: &'a [Value]) -> Self {
        Self::Many(objects)
    }
}

impl<'a> From<&'a Vec<Value>> for GraphObjects<'a> {
    fn from(objects: &'a Vec<Value>) -> Self {
        Self::Many(objects)
    }
}

/// Expected schema for `toMatchGraphObjectSchema`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphObjectSchemaParams {
    /// Taxonomy class or classes whose schemas are merged.
    #[serde(rename = "_class")]
    pub class: ClassNames,
    /// Optional caller override applied on top of the merged classes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaOverride>,
}

impl GraphObjectSchemaParams {
    /// Params for the given classes, without an override.
    pub fn new(class: impl Into<ClassNames>) -> Self {
        Self {
            class: class.into(),
            schema: None,
        }
    }

    /// Attach a caller override.
    pub fn with_schema(mut self, schema: SchemaOverride) -> Self {
        self.schema = Some(schema);
        self
    }
}

/// Optional parameters for `toMatchDirectRelationshipSchema`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipSchemaParams {
    /// Optional caller override applied on top of the relationship schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaOverride>,
}

/// Assert that every object conforms to the merged schema of `params.class`.
///
/// # Errors
///
/// Returns `MatcherUsageError::InvalidSchema` if the merged schema does
/// not compile.
pub fn to_match_graph_object_schema(
    registry: &dyn SchemaRegistry,
    received: GraphObjects<'_>,
    params: &GraphObjectSchemaParams,
) -> Result<MatchResult, MatcherUsageError> {
    let outcome = GraphObjectValidator::new(registry, TO_MATCH_GRAPH_OBJECT_SCHEMA).validate(
        received.as_slice(),
        &params.class,
        params.schema.as_ref(),
    )?;
    Ok(outcome_to_result(outcome))
}

/// Assert that every object is a well-formed direct relationship.
///
/// # Errors
///
/// Returns `MatcherUsageError::InvalidSchema` if the overridden schema does
/// not compile.
pub fn to_match_direct_relationship_schema(
    received: GraphObjects<'_>,
    params: &RelationshipSchemaParams,
) -> Result<MatchResult, MatcherUsageError> {
    let outcome = validate_direct_relationships(
        received.as_slice(),
        params.schema.as_ref(),
        TO_MATCH_DIRECT_RELATIONSHIP_SCHEMA,
    )?;
    Ok(outcome_to_result(outcome))
}

/// [`to_match_graph_object_schema`] over typed entities.
///
/// # Errors
///
/// Returns `MatcherUsageError::InvalidGraphObject` if an entity does not
/// convert to a JSON object, or `InvalidSchema` as for the JSON form.
pub fn to_match_entities(
    registry: &dyn SchemaRegistry,
    entities: &[Entity],
    params: &GraphObjectSchemaParams,
) -> Result<MatchResult, MatcherUsageError> {
    let objects = to_graph_objects(entities)?;
    to_match_graph_object_schema(registry, GraphObjects::from(&objects), params)
}

/// [`to_match_direct_relationship_schema`] over typed relationships.
///
/// # Errors
///
/// Returns `MatcherUsageError::InvalidGraphObject` if a relationship does
/// not convert to a JSON object, or `InvalidSchema` as for the JSON form.
pub fn to_match_explicit_relationships(
    relationships: &[ExplicitRelationship],
    params: &RelationshipSchemaParams,
) -> Result<MatchResult, MatcherUsageError> {
    let objects = to_graph_objects(relationships)?;
    to_match_direct_relationship_schema(GraphObjects::from(&objects), params)
}

fn outcome_to_result(outcome: ValidationOutcome) -> MatchResult {
    match outcome {
        ValidationOutcome::Passed => MatchResult::passed(|| messages::SUCCESS.to_string()),
        ValidationOutcome::DuplicateKeys(keys) => {
            MatchResult::failed(move || messages::duplicate_keys(&keys))
        }
        ValidationOutcome::SchemaResolution(err) => {
            MatchResult::failed(move || messages::schema_resolution(&err))
        }
        ValidationOutcome::Structural(failure) => {
            MatchResult::failed(move || messages::structural(&failure))
        }
    }
}
