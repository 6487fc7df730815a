//! Parse phase: JSON → typed workflow document + safe-output resolution.

pub mod safe_outputs;
pub mod types;

pub use safe_outputs::{SafeOutputsConfig, resolve_safe_outputs};
pub use types::*;

use crate::error::CompilerError;

/// Deserialize a workflow document JSON string into a `WorkflowSpec`.
///
/// The input is the tokenizer's output: `{"frontmatter": {...}, "markdown": "..."}`.
pub fn parse(json: &str) -> Result<WorkflowSpec, Vec<CompilerError>> {
    serde_json::from_str::<WorkflowSpec>(json).map_err(|e| {
        vec![CompilerError::parse(
            "P001",
            format!("Failed to parse workflow document JSON: {}", e),
        )]
    })
}

/// Parse JSON and resolve the safe-output directives in one step.
pub fn parse_and_resolve(json: &str) -> Result<(WorkflowSpec, SafeOutputsConfig), Vec<CompilerError>> {
    let spec = parse(json)?;
    let outputs = resolve_safe_outputs(&spec.frontmatter);
    Ok((spec, outputs))
}
