//! # gsv-cli — Graph Schema Verification CLI
//!
//! Provides the `gsv` command-line interface over the graph object
//! assertions, for checking integration output files outside a test suite.
//!
//! ## Subcommands
//!
//! - `gsv validate`: entities against merged class schemas.
//! - `gsv validate-relationships`: direct relationships against the fixed
//!   relationship schema.
//! - `gsv targets`: mapped relationships resolve to entities.
//! - `gsv classes`: list the classes the schema directory defines.
//!
//! ```bash
//! gsv validate --class Host --class Device entities.json
//! gsv validate-relationships --override rel-override.yaml relationships.json
//! gsv targets --enforce-single-target mapped.json entities.json
//! ```
//!
//! Exit code is 0 when the assertion passes and 1 when it fails.

pub mod classes;
pub mod targets;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use gsv_logger::{HandledError, IntegrationLogger, StepInfo};
use gsv_matchers::MatchResult;
use serde_json::Value;

/// Read a JSON or YAML document. Files ending in `.yaml` or `.yml` are
/// parsed as YAML; everything else as JSON.
pub fn load_document(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if is_yaml {
        serde_yaml::from_str(&text).with_context(|| format!("invalid YAML in {}", path.display()))
    } else {
        serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))
    }
}

/// Run one assertion as a logged step and print its message.
///
/// Returns exit code 0 on pass and 1 on failure. Errors from `check` are
/// reported through `step_failure` and then propagated.
pub fn run_step<F>(logger: &IntegrationLogger, step: &StepInfo, check: F) -> Result<u8>
where
    F: FnOnce() -> Result<MatchResult>,
{
    logger.step_start(step);
    let result = match check() {
        Ok(result) => result,
        Err(err) => {
            logger.step_failure(step, &step_error(format!("{err:#}")));
            return Err(err);
        }
    };

    println!("{}", result.message());
    if result.pass() {
        logger.step_success(step);
        Ok(0)
    } else {
        logger.step_failure(step, &step_error("assertion failed".to_string()));
        Ok(1)
    }
}

fn step_error(reason: String) -> HandledError {
    HandledError::from(Box::<dyn std::error::Error + Send + Sync>::from(reason))
}
