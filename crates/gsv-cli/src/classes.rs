//! `gsv classes`: list the taxonomy classes the registry knows.

use anyhow::Result;
use clap::Args;

use gsv_logger::{IntegrationLogger, StepInfo};
use gsv_schema::SchemaRegistry;

/// Arguments for the `gsv classes` subcommand.
#[derive(Args, Debug)]
pub struct ClassesArgs {
    /// Also print each class's required properties.
    #[arg(long)]
    pub required: bool,
}

/// Execute `gsv classes`.
pub fn run_classes(
    args: &ClassesArgs,
    registry: &dyn SchemaRegistry,
    logger: &IntegrationLogger,
) -> Result<u8> {
    let step = StepInfo::new("list-classes", "List classes");
    logger.step_start(&step);
    for line in class_lines(args, registry) {
        println!("{line}");
    }
    logger.step_success(&step);
    Ok(0)
}

/// One line per class, sorted by class name.
pub fn class_lines(args: &ClassesArgs, registry: &dyn SchemaRegistry) -> Vec<String> {
    let mut names = registry.class_names();
    names.sort();
    names
        .into_iter()
        .map(|name| match registry.lookup(&name) {
            Some(schema) if args.required => format!("{name}: {}", schema.required.join(", ")),
            _ => name,
        })
        .collect()
}
