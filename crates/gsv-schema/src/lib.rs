//! # gsv-schema — Class Schemas, Merging & Structural Validation
//!
//! Resolves a graph object's taxonomy classes to canonical class schemas,
//! merges them into the one schema a validation call enforces, and checks
//! collections of graph objects against it.
//!
//! ## Components
//!
//! - [`registry`]: the [`SchemaRegistry`] seam plus the in-memory and
//!   directory-backed registries. Class schema documents may inherit from
//!   one another through `allOf` / `$ref`.
//! - [`merge`]: [`SchemaMerger`]: ordered lookup, `required` union,
//!   property type-set union, caller overrides, and the fixed
//!   direct-relationship schema.
//! - [`validate`]: [`GraphObjectValidator`]: `_key` uniqueness, schema
//!   resolution, then per-object structural validation stopping at the
//!   first failing object.
//! - [`diagnostics`]: the structured [`Diagnostic`] records, including the
//!   explicit scalar-only additional-property check.
//!
//! ## Crate Policy
//!
//! - Depends only on `gsv-core` internally.
//! - Every entry point is a pure function of its inputs and the registry's
//!   state at call time. Nothing is cached between calls.
//! - Validation never performs network I/O; remote `$ref`s are refused.

pub mod diagnostics;
pub mod merge;
pub mod registry;
pub mod validate;

// Re-export primary types for ergonomic imports.
pub use diagnostics::{check_scalar_additional_properties, Diagnostic};
pub use merge::{
    relationship_base_schema, AdditionalProperties, MergedSchema, SchemaMerger, SchemaOverride,
    SchemaResolutionError, JSON_SCHEMA_DRAFT_07, RELATIONSHIP_REQUIRED_FIELDS, SCALAR_TYPES,
};
pub use registry::{ClassSchema, DirectoryRegistry, InMemoryRegistry, RegistryError, SchemaRegistry};
pub use validate::{
    duplicate_keys, validate_against, validate_direct_relationships, GraphObjectValidator,
    StructuralFailure, ValidationOutcome, ValidatorError,
};
