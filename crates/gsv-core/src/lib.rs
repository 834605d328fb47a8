//! # gsv-core — Foundational Types for Graph Schema Verification
//!
//! This crate defines the data model shared by every other crate in the
//! workspace: graph objects produced by data-collection integrations
//! (entities, direct relationships, mapped relationships), taxonomy class
//! names, and the rendering rules for JSON embedded in diagnostics.
//!
//! ## Key Design Principles
//!
//! 1. **Graph objects stay JSON at the validation boundary.** Validators
//!    operate on `serde_json::Value` because integrations may attach
//!    arbitrary properties. The typed structs in [`graph`] exist for callers
//!    that build objects in Rust and convert them with [`to_graph_objects`].
//!
//! 2. **`ClassNames` is one-or-many.** An entity's `_class` is either a
//!    single taxonomy class or an ordered list of them; both shapes
//!    deserialize into the same type and preserve order.
//!
//! 3. **Deterministic rendering.** Every JSON payload embedded in a
//!    diagnostic goes through [`render::pretty`], which sorts object keys
//!    and indents with two spaces regardless of `serde_json` feature flags.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `gsv-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod graph;
pub mod identity;
pub mod render;

// Re-export primary types for ergonomic imports.
pub use error::GsvError;
pub use graph::{
    to_graph_objects, Entity, ExplicitRelationship, MappedRelationship, RelationshipDirection,
    RelationshipMapping, TargetEntity,
};
pub use identity::{ClassNames, GraphObjectKey};
