//! # Assertion Messages
//!
//! The literal text of every assertion message. Test suites and
//! documentation match these strings exactly, so field order, spacing, and
//! the documentation footer are fixed.
//!
//! Schema-related failures (resolution and structure) end with
//! [`DOC_FOOTER`]. Identity and target-resolution failures do not.

use gsv_core::{render, GraphObjectKey};
use gsv_schema::{SchemaResolutionError, StructuralFailure};
use serde_json::Value;

/// Appended to schema-related failures.
pub const DOC_FOOTER: &str =
    "Find out more about JupiterOne schemas: https://github.com/JupiterOne/data-model/tree/master/src/schemas\n";

/// Message of a passing schema assertion.
pub const SUCCESS: &str = "Success!";

/// Duplicate `_key` values in one collection.
pub fn duplicate_keys(keys: &[GraphObjectKey]) -> String {
    let joined = keys.iter().map(ToString::to_string).collect::<Vec<_>>().join(",");
    format!("Object `_key` properties array is not unique: [{joined}]")
}

/// A `_class` list the registry could not resolve.
pub fn schema_resolution(err: &SchemaResolutionError) -> String {
    format!("Error loading schemas for class (err={err})\n\n{DOC_FOOTER}")
}

/// The first object that failed structural validation.
pub fn structural(failure: &StructuralFailure) -> String {
    let errors = render::pretty_struct(&failure.diagnostics)
        .unwrap_or_else(|e| format!("<diagnostics could not be rendered: {e}>"));
    format!(
        "Error validating graph object against schema (data={}, errors={}, index={})\n\n{DOC_FOOTER}",
        render::pretty(&failure.object),
        errors,
        failure.index
    )
}

/// A mapped relationship with no matching target entity.
pub fn no_target(relationship: &Value) -> String {
    format!(
        "No target entity found for mapped relationship: {}",
        render::pretty(relationship)
    )
}

/// A mapped relationship with several matching target entities while a
/// single target is enforced.
pub fn multiple_targets(relationship: &Value) -> String {
    format!(
        "Multiple target entities found for mapped relationship, expected exactly one: {}",
        render::pretty(relationship)
    )
}
