//! # gsv-matchers — Graph Object Assertions
//!
//! The assertion primitives an integration test suite uses to check freshly
//! collected graph objects:
//!
//! - `toMatchGraphObjectSchema`: entities against their merged class schemas.
//! - `toMatchDirectRelationshipSchema`: direct relationships against the
//!   fixed relationship schema.
//! - `toTargetEntities`: mapped relationships resolve to concrete entities.
//!
//! Every assertion returns a [`MatchResult`]. Recoverable failures (duplicate
//! keys, unknown classes, structural violations, unresolved targets) are
//! failing results with a message; only caller mistakes are `Err`.
//!
//! ## Hosting
//!
//! [`register_matchers`] hands all three assertions to an
//! [`AssertionRegistry`] in one batch. [`MatcherTable`] is an in-process
//! host for callers without an assertion framework of their own.

pub mod error;
pub mod graph_object;
pub mod messages;
pub mod registrar;
pub mod result;
pub mod target;

pub use error::MatcherUsageError;
pub use graph_object::{
    to_match_direct_relationship_schema, to_match_entities, to_match_explicit_relationships,
    to_match_graph_object_schema, GraphObjectSchemaParams, GraphObjects, RelationshipSchemaParams,
    TO_MATCH_DIRECT_RELATIONSHIP_SCHEMA, TO_MATCH_GRAPH_OBJECT_SCHEMA,
};
pub use registrar::{
    matchers, register_matchers, AssertionRegistry, MatcherContext, MatcherFn, MatcherSet,
    MatcherTable,
};
pub use result::MatchResult;
pub use target::{
    resolve_target, resolve_target_objects, to_target_entities, to_target_entities_json,
    TargetEntitiesOptions, TO_TARGET_ENTITIES,
};
