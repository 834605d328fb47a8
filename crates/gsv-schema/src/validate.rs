//! # Graph Object Validation
//!
//! Validates an ordered collection of graph objects against one merged
//! schema. Steps run in order and stop at the first failure:
//!
//! 1. **Identity:** every object's `_key` must be distinct. On a repeat,
//!    schema resolution and structural checks are skipped.
//! 2. **Schema resolution:** the `_class` list is merged through
//!    [`SchemaMerger`]; the direct-relationship entry point uses the fixed
//!    [`relationship_base_schema`] instead.
//! 3. **Structure:** each object, in input order, is checked against the
//!    merged schema. The first failing object's index and diagnostics are
//!    reported.
//!
//! Outcomes are values ([`ValidationOutcome`]). The only error is a merged
//! schema the validator cannot compile, which is a caller mistake (for
//! example a malformed override) rather than an assertion failure.
//!
//! ## Offline Resolution
//!
//! Compiled validators use a retriever that refuses every remote `$ref`, so
//! validation never performs network I/O.

use std::collections::HashSet;

use gsv_core::{ClassNames, GraphObjectKey};
use jsonschema::{Retrieve, Uri, Validator};
use serde_json::Value;
use thiserror::Error;

use crate::diagnostics::{check_scalar_additional_properties, from_validation_error, Diagnostic};
use crate::merge::{
    relationship_base_schema, AdditionalProperties, MergedSchema, SchemaMerger,
    SchemaOverride, SchemaResolutionError,
};
use crate::registry::SchemaRegistry;

/// The merged schema could not be compiled.
#[derive(Error, Debug)]
pub enum ValidatorError {
    /// The merged schema is not a valid draft-07 schema.
    #[error("validator build error for schema of '{context}': {reason}")]
    InvalidSchema {
        /// Assertion or class list the schema was built for.
        context: String,
        /// Reason the schema was rejected.
        reason: String,
    },
}

/// The first object that failed structural validation.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuralFailure {
    /// Zero-based index of the object in the input.
    pub index: usize,
    /// The failing object as submitted.
    pub object: Value,
    /// Every violated constraint, in report order.
    pub diagnostics: Vec<Diagnostic>,
}

/// Result of validating one collection.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    /// Every object conforms.
    Passed,
    /// Some `_key` repeats. Holds every `_key` in input order.
    DuplicateKeys(Vec<GraphObjectKey>),
    /// The `_class` list could not be resolved.
    SchemaResolution(SchemaResolutionError),
    /// An object does not conform to the merged schema.
    Structural(StructuralFailure),
}

impl ValidationOutcome {
    /// Returns true for [`ValidationOutcome::Passed`].
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// Validates graph objects against class schemas from a registry.
#[derive(Clone, Copy)]
pub struct GraphObjectValidator<'a> {
    registry: &'a dyn SchemaRegistry,
    assertion: &'a str,
}

impl<'a> GraphObjectValidator<'a> {
    /// A validator reading class schemas from `registry`, reporting on
    /// behalf of `assertion`.
    pub fn new(registry: &'a dyn SchemaRegistry, assertion: &'a str) -> Self {
        Self { registry, assertion }
    }

    /// Validate `objects` against the merge of `classes` plus `schema_override`.
    ///
    /// # Errors
    ///
    /// Returns `ValidatorError::InvalidSchema` if the merged schema cannot
    /// be compiled.
    pub fn validate(
        &self,
        objects: &[Value],
        classes: &ClassNames,
        schema_override: Option<&SchemaOverride>,
    ) -> Result<ValidationOutcome, ValidatorError> {
        if let Some(keys) = duplicate_keys(objects) {
            tracing::debug!(assertion = self.assertion, count = keys.len(), "duplicate _key values");
            return Ok(ValidationOutcome::DuplicateKeys(keys));
        }

        let merged = match SchemaMerger::new(self.registry, self.assertion)
            .merge(classes.as_slice(), schema_override)
        {
            Ok(merged) => merged,
            Err(err) => {
                tracing::debug!(assertion = self.assertion, error = %err, "schema resolution failed");
                return Ok(ValidationOutcome::SchemaResolution(err));
            }
        };

        validate_against(&merged, objects, self.assertion)
    }
}

impl std::fmt::Debug for GraphObjectValidator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphObjectValidator")
            .field("assertion", &self.assertion)
            .finish_non_exhaustive()
    }
}

/// Validate direct relationships against the fixed relationship schema,
/// optionally overridden.
///
/// # Errors
///
/// Returns `ValidatorError::InvalidSchema` if the overridden schema cannot
/// be compiled.
pub fn validate_direct_relationships(
    objects: &[Value],
    schema_override: Option<&SchemaOverride>,
    assertion: &str,
) -> Result<ValidationOutcome, ValidatorError> {
    if let Some(keys) = duplicate_keys(objects) {
        tracing::debug!(assertion, count = keys.len(), "duplicate _key values");
        return Ok(ValidationOutcome::DuplicateKeys(keys));
    }

    let mut schema = relationship_base_schema();
    if let Some(schema_override) = schema_override {
        schema.apply_override(schema_override);
    }
    validate_against(&schema, objects, assertion)
}

/// Every object's `_key` in input order if any value repeats, else `None`.
pub fn duplicate_keys(objects: &[Value]) -> Option<Vec<GraphObjectKey>> {
    let keys: Vec<GraphObjectKey> = objects.iter().map(GraphObjectKey::of).collect();
    let mut seen = HashSet::with_capacity(keys.len());
    if keys.iter().all(|k| seen.insert(k)) {
        None
    } else {
        Some(keys)
    }
}

/// Structurally validate `objects` in order against `schema`, stopping at
/// the first object with diagnostics.
///
/// # Errors
///
/// Returns `ValidatorError::InvalidSchema` if `schema` cannot be compiled.
pub fn validate_against(
    schema: &MergedSchema,
    objects: &[Value],
    context: &str,
) -> Result<ValidationOutcome, ValidatorError> {
    let document = schema.structural_schema();
    let validator = compile(&document, context)?;

    for (index, object) in objects.iter().enumerate() {
        let mut diagnostics: Vec<Diagnostic> = validator
            .iter_errors(object)
            .flat_map(|e| from_validation_error(&e, &document))
            .collect();

        if schema.additional_properties == AdditionalProperties::ScalarOnly {
            if let Some(map) = object.as_object() {
                diagnostics.extend(check_scalar_additional_properties(map, &schema.properties));
            }
        }

        if !diagnostics.is_empty() {
            tracing::debug!(
                context,
                index,
                violations = diagnostics.len(),
                "graph object failed structural validation"
            );
            return Ok(ValidationOutcome::Structural(StructuralFailure {
                index,
                object: object.clone(),
                diagnostics,
            }));
        }
    }

    Ok(ValidationOutcome::Passed)
}

/// Resolves draft metaschemas to a permissive schema and refuses every
/// other remote reference.
struct OfflineRetriever;

impl Retrieve for OfflineRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        if uri_str.starts_with("http://json-schema.org/") || uri_str.starts_with("https://json-schema.org/") {
            return Ok(serde_json::json!({}));
        }
        Err(format!("remote $ref not permitted: {uri_str}").into())
    }
}

fn compile(document: &Value, context: &str) -> Result<Validator, ValidatorError> {
    let mut opts = jsonschema::options();
    opts.with_draft(jsonschema::Draft::Draft7);
    opts.with_retriever(OfflineRetriever);
    opts.build(document).map_err(|e| ValidatorError::InvalidSchema {
        context: context.to_string(),
        reason: e.to_string(),
    })
}
