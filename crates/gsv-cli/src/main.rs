//! # gsv CLI entry point
//!
//! Parses command-line arguments, installs the tracing subscriber, loads
//! the schema directory, and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use gsv_cli::classes::{run_classes, ClassesArgs};
use gsv_cli::targets::{run_targets, TargetsArgs};
use gsv_cli::validate::{
    run_validate, run_validate_relationships, ValidateArgs, ValidateRelationshipsArgs,
};
use gsv_logger::IntegrationLogger;
use gsv_schema::DirectoryRegistry;

/// Graph schema verification.
///
/// Validates entities and relationships produced by data-collection
/// integrations against class schemas, and checks that mapped relationships
/// resolve to concrete target entities.
#[derive(Parser, Debug)]
#[command(name = "gsv", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Directory holding the class schema documents.
    #[arg(long, env = "GSV_SCHEMA_DIR", default_value = "schemas", global = true)]
    schema_dir: PathBuf,

    /// Log output format.
    #[arg(long, env = "GSV_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate entities against the merged schema of their classes.
    Validate(ValidateArgs),

    /// Validate direct relationships against the relationship schema.
    ValidateRelationships(ValidateRelationshipsArgs),

    /// Check that mapped relationships resolve to target entities.
    Targets(TargetsArgs),

    /// List the classes defined in the schema directory.
    Classes(ClassesArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    match cli.log_format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Text => subscriber.init(),
    }

    tracing::debug!(schema_dir = %cli.schema_dir.display(), "gsv CLI starting");

    let registry = match DirectoryRegistry::new(&cli.schema_dir) {
        Ok(registry) => registry,
        Err(e) => {
            tracing::error!("failed to load schemas from {}: {e}", cli.schema_dir.display());
            return ExitCode::from(1);
        }
    };
    tracing::debug!(class_count = registry.len(), "loaded class schemas");

    let logger = IntegrationLogger::from_env();

    let result = match cli.command {
        Commands::Validate(args) => run_validate(&args, &registry, &logger),
        Commands::ValidateRelationships(args) => {
            run_validate_relationships(&args, &registry, &logger)
        }
        Commands::Targets(args) => run_targets(&args, &registry, &logger),
        Commands::Classes(args) => run_classes(&args, &registry, &logger),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
