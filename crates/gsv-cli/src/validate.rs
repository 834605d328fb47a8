//! # Validate Subcommands
//!
//! `gsv validate` checks entity files with `toMatchGraphObjectSchema`;
//! `gsv validate-relationships` checks direct relationship files with
//! `toMatchDirectRelationshipSchema`. An input file holds one object or an
//! array of objects.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use serde_json::{json, Value};

use gsv_core::ClassNames;
use gsv_logger::{IntegrationLogger, StepInfo};
use gsv_matchers::{
    MatchResult, MatcherContext, MatcherTable, TO_MATCH_DIRECT_RELATIONSHIP_SCHEMA,
    TO_MATCH_GRAPH_OBJECT_SCHEMA,
};
use gsv_schema::SchemaRegistry;

use crate::{load_document, run_step};

/// Arguments for the `gsv validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Taxonomy class to validate against. Repeat for multi-class entities.
    #[arg(long = "class", value_name = "CLASS", required = true)]
    pub classes: Vec<String>,

    /// Schema override document (JSON or YAML).
    #[arg(long = "override", value_name = "FILE")]
    pub schema_override: Option<PathBuf>,

    /// Entities to validate (JSON or YAML).
    #[arg(value_name = "OBJECTS")]
    pub objects: PathBuf,
}

/// Arguments for the `gsv validate-relationships` subcommand.
#[derive(Args, Debug)]
pub struct ValidateRelationshipsArgs {
    /// Schema override document (JSON or YAML).
    #[arg(long = "override", value_name = "FILE")]
    pub schema_override: Option<PathBuf>,

    /// Direct relationships to validate (JSON or YAML).
    #[arg(value_name = "OBJECTS")]
    pub objects: PathBuf,
}

/// Execute `gsv validate`.
pub fn run_validate(
    args: &ValidateArgs,
    registry: &dyn SchemaRegistry,
    logger: &IntegrationLogger,
) -> Result<u8> {
    let step = StepInfo::new("validate-entities", "Validate entities");
    run_step(logger, &step, || check_entities(args, registry))
}

/// Execute `gsv validate-relationships`.
pub fn run_validate_relationships(
    args: &ValidateRelationshipsArgs,
    registry: &dyn SchemaRegistry,
    logger: &IntegrationLogger,
) -> Result<u8> {
    let step = StepInfo::new("validate-relationships", "Validate relationships");
    run_step(logger, &step, || check_relationships(args, registry))
}

/// Run `toMatchGraphObjectSchema` over the entity file.
pub fn check_entities(args: &ValidateArgs, registry: &dyn SchemaRegistry) -> Result<MatchResult> {
    let received = load_document(&args.objects)?;
    let mut params = json!({ "_class": ClassNames::from(args.classes.clone()) });
    if let Some(schema) = load_override(args.schema_override.as_deref())? {
        params["schema"] = schema;
    }
    tracing::info!(classes = ?args.classes, objects = %args.objects.display(), "validating entities");

    let table = MatcherTable::with_graph_matchers();
    Ok(table.run(
        TO_MATCH_GRAPH_OBJECT_SCHEMA,
        &MatcherContext::new(registry),
        &received,
        &[params],
    )?)
}

/// Run `toMatchDirectRelationshipSchema` over the relationship file.
pub fn check_relationships(
    args: &ValidateRelationshipsArgs,
    registry: &dyn SchemaRegistry,
) -> Result<MatchResult> {
    let received = load_document(&args.objects)?;
    let params = match load_override(args.schema_override.as_deref())? {
        Some(schema) => json!({ "schema": schema }),
        None => json!({}),
    };
    tracing::info!(objects = %args.objects.display(), "validating direct relationships");

    let table = MatcherTable::with_graph_matchers();
    Ok(table.run(
        TO_MATCH_DIRECT_RELATIONSHIP_SCHEMA,
        &MatcherContext::new(registry),
        &received,
        &[params],
    )?)
}

fn load_override(path: Option<&Path>) -> Result<Option<Value>> {
    path.map(load_document).transpose()
}
