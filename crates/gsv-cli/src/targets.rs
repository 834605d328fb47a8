//! # Targets Subcommand
//!
//! `gsv targets` resolves every mapped relationship in one file against the
//! entities in another with `toTargetEntities`.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde_json::json;

use gsv_logger::{IntegrationLogger, StepInfo};
use gsv_matchers::{MatchResult, MatcherContext, MatcherTable, TO_TARGET_ENTITIES};
use gsv_schema::SchemaRegistry;

use crate::{load_document, run_step};

/// Arguments for the `gsv targets` subcommand.
#[derive(Args, Debug)]
pub struct TargetsArgs {
    /// Fail when a relationship matches more than one entity.
    #[arg(long)]
    pub enforce_single_target: bool,

    /// Mapped relationships (JSON or YAML).
    #[arg(value_name = "RELATIONSHIPS")]
    pub relationships: PathBuf,

    /// Candidate entities (JSON or YAML).
    #[arg(value_name = "ENTITIES")]
    pub entities: PathBuf,
}

/// Execute `gsv targets`.
pub fn run_targets(
    args: &TargetsArgs,
    registry: &dyn SchemaRegistry,
    logger: &IntegrationLogger,
) -> Result<u8> {
    let step = StepInfo::new("resolve-targets", "Resolve mapped relationship targets");
    run_step(logger, &step, || check_targets(args, registry))
}

/// Run `toTargetEntities` over the two files.
pub fn check_targets(args: &TargetsArgs, registry: &dyn SchemaRegistry) -> Result<MatchResult> {
    let relationships = load_document(&args.relationships)?;
    let entities = load_document(&args.entities)?;
    let options = json!({ "enforceSingleTarget": args.enforce_single_target });

    let table = MatcherTable::with_graph_matchers();
    Ok(table.run(
        TO_TARGET_ENTITIES,
        &MatcherContext::new(registry),
        &relationships,
        &[entities, options],
    )?)
}
