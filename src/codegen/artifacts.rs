//! Output collection & cleanup planning.
//!
//! The engine descriptor declares the paths a run may produce. The planner
//! emits one upload step covering every declared path plus the diagnostic
//! log, tolerant of files that never materialized, and a follow-up cleanup
//! step deleting exactly the workspace-scoped declared paths. Paths under
//! the scratch prefix are never deleted.

use crate::actions::ActionPins;
use crate::validate::StepOrderValidator;

use super::writer::YamlWriter;
use super::{AGENT_LOG_FILE, SCRATCH_DIR, SCRATCH_DIR_PREFIX, UPLOAD_ARTIFACT_ACTION, UPLOAD_ARTIFACT_VERSION};

pub const UPLOAD_STEP: &str = "Upload engine output files";
pub const CLEANUP_STEP: &str = "Clean up engine output files";

/// Artifact name the engine output files upload under.
const ARTIFACT_NAME: &str = "agent-outputs";

/// Steps the planner decided on, in emission order.
#[derive(Debug, Clone, Default)]
pub struct OutputPlan {
    pub steps: Vec<String>,
}

/// Whether a path lives in the scratch directory.
pub fn is_scratch_path(path: &str) -> bool {
    path == SCRATCH_DIR || path.starts_with(SCRATCH_DIR_PREFIX)
}

/// Plan the upload/cleanup steps for the declared engine output paths.
/// An empty declaration produces no steps at all.
pub fn plan_output_collection(
    declared: &[String],
    pins: &ActionPins,
    validator: &mut StepOrderValidator,
    warnings: &mut Vec<String>,
) -> OutputPlan {
    if declared.is_empty() {
        return OutputPlan::default();
    }

    let mut upload_paths: Vec<String> = declared.to_vec();
    if !upload_paths.iter().any(|p| p == AGENT_LOG_FILE) {
        upload_paths.push(AGENT_LOG_FILE.to_string());
    }

    let mut steps = Vec::new();
    steps.push(step_upload(&upload_paths, pins, warnings));
    validator.record_artifact_upload(UPLOAD_STEP, &upload_paths);

    let workspace: Vec<String> = declared
        .iter()
        .filter(|p| !is_scratch_path(p))
        .cloned()
        .collect();
    if !workspace.is_empty() {
        steps.push(step_cleanup(&workspace));
        validator.record_cleanup(CLEANUP_STEP, &workspace);
    }

    OutputPlan { steps }
}

fn step_upload(paths: &[String], pins: &ActionPins, warnings: &mut Vec<String>) -> String {
    let mut w = YamlWriter::new();
    w.item(&format!("name: {}", UPLOAD_STEP));
    w.indent();
    w.entry("if", "always()");
    w.entry(
        "uses",
        &pins.resolve(UPLOAD_ARTIFACT_ACTION, UPLOAD_ARTIFACT_VERSION, warnings),
    );
    w.mapping("with");
    w.entry("name", ARTIFACT_NAME);
    w.literal("path");
    for path in paths {
        w.line(path);
    }
    w.end();
    w.entry("if-no-files-found", "ignore");
    w.end();
    w.dedent();
    w.finish()
}

fn step_cleanup(paths: &[String]) -> String {
    let mut w = YamlWriter::new();
    w.item(&format!("name: {}", CLEANUP_STEP));
    w.indent();
    w.entry("if", "always()");
    w.literal("run");
    for path in paths {
        w.line(&format!("rm -rf {}", path));
    }
    w.end();
    w.dedent();
    w.finish()
}
