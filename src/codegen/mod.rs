//! Codegen pass: resolved workflow document → lock pipeline document.
//!
//! Public API: `emit(spec, outputs, engine, pins, version) -> Result<LockWorkflow, _>`

pub mod agent;
pub mod artifacts;
pub mod safe_jobs;
pub mod writer;

use crate::actions::ActionPins;
use crate::engine::EngineDescriptor;
use crate::error::CompilerError;
use crate::jobs::{Job, JobDescriptor, JobGraph};
use crate::parse::safe_outputs::SafeOutputsConfig;
use crate::parse::types::WorkflowSpec;
use writer::{YamlWriter, emit_value, yaml_quote};

// =============================================================================
// EMISSION CONSTANTS
// =============================================================================

/// Scratch directory the agent may write freely; its contents never reach
/// the cleanup step.
pub const SCRATCH_DIR: &str = "/tmp/markflow";
pub const SCRATCH_DIR_PREFIX: &str = "/tmp/markflow/";
/// JSON-lines file the agent appends safe-output items to.
pub const SAFE_OUTPUTS_FILE: &str = "/tmp/markflow/safe-outputs.jsonl";
/// Combined stdout/stderr of the agent step.
pub const AGENT_LOG_FILE: &str = "/tmp/markflow/agent-stdio.log";
/// Prompt file materialized from the markdown body.
pub const PROMPT_FILE: &str = "/tmp/markflow/prompt.md";

// Versions the emitted steps are written against.
pub(crate) const CHECKOUT_ACTION: &str = "actions/checkout";
pub(crate) const CHECKOUT_VERSION: &str = "v5";
pub(crate) const GITHUB_SCRIPT_ACTION: &str = "actions/github-script";
pub(crate) const GITHUB_SCRIPT_VERSION: &str = "v7";
pub(crate) const UPLOAD_ARTIFACT_ACTION: &str = "actions/upload-artifact";
pub(crate) const UPLOAD_ARTIFACT_VERSION: &str = "v4";

// =============================================================================
// OUTPUT
// =============================================================================

/// The complete output of the codegen pass: one pipeline document plus the
/// non-fatal warnings gathered while emitting it.
#[derive(Debug, Clone)]
pub struct LockWorkflow {
    pub header: String,
    pub preamble: String,
    pub jobs: Vec<JobDescriptor>,
    pub warnings: Vec<String>,
}

impl LockWorkflow {
    /// Assemble the single lock document the caller persists.
    pub fn render(&self) -> String {
        let mut w = YamlWriter::new();
        w.raw_block(&self.header);
        w.blank();
        w.raw_block(&self.preamble);
        w.blank();
        w.mapping("jobs");
        for job in &self.jobs {
            w.raw_block(&job.body);
        }
        w.end();
        w.finish()
    }
}

// =============================================================================
// EMIT
// =============================================================================

/// Emit the lock pipeline for a parsed document and its resolved safe
/// outputs. The engine descriptor and pin table are injected by the caller;
/// `compiler_version` is the cosmetic stamp for the header comment.
pub fn emit(
    spec: &WorkflowSpec,
    outputs: &SafeOutputsConfig,
    engine: &EngineDescriptor,
    pins: &ActionPins,
    compiler_version: Option<&str>,
) -> Result<LockWorkflow, Vec<CompilerError>> {
    let mut warnings = Vec::new();

    // 1. JOBS
    let mut graph = JobGraph::new();
    let agent_job = agent::emit_agent_job(spec, outputs, engine, pins, &mut warnings)?;
    graph.add(agent_job).map_err(|e| vec![e])?;
    safe_jobs::emit_safe_output_jobs(outputs, pins, &mut warnings, &mut graph)?;

    // 2. DEPENDENCY RULES
    let errors = graph.validate();
    if !errors.is_empty() {
        return Err(errors);
    }

    // 3. HEADER + PREAMBLE
    let header = gen_header(compiler_version);
    let preamble = gen_preamble(spec);

    // 4. DESCRIPTORS in emission order
    let jobs = graph.into_jobs().into_iter().map(descriptor).collect();

    Ok(LockWorkflow {
        header,
        preamble,
        jobs,
        warnings,
    })
}

fn gen_header(compiler_version: Option<&str>) -> String {
    let mut w = YamlWriter::new();
    w.line("# This file was generated by markflow from a markdown workflow.");
    w.line("# Do not edit directly; recompile the source document instead.");
    if let Some(version) = compiler_version {
        w.line(&format!("# markflow version: {}", version));
    }
    w.finish()
}

fn gen_preamble(spec: &WorkflowSpec) -> String {
    let mut w = YamlWriter::new();
    w.entry("name", &yaml_quote(spec.title()));
    match &spec.frontmatter.on {
        Some(on) => emit_value(&mut w, "on", on),
        None => {
            w.mapping("on");
            w.entry("workflow_dispatch", "{}");
            w.end();
        }
    }
    match &spec.frontmatter.permissions {
        Some(permissions) => emit_value(&mut w, "permissions", permissions),
        // Deny by default; jobs grant their own scopes.
        None => w.entry("permissions", "{}"),
    }
    if let Some(concurrency) = &spec.frontmatter.concurrency {
        emit_value(&mut w, "concurrency", concurrency);
    }
    if let Some(env) = &spec.frontmatter.env {
        emit_value(&mut w, "env", env);
    }
    w.finish()
}

// =============================================================================
// JOB RENDERING
// =============================================================================

/// Render one job as the YAML block spliced under `jobs:`.
pub fn render_job(job: &Job) -> String {
    let mut w = YamlWriter::new();
    w.mapping(&job.id);
    if let Some(name) = &job.display_name {
        w.entry("name", &yaml_quote(name));
    }
    if !job.needs.is_empty() {
        w.mapping("needs");
        for dep in &job.needs {
            w.item(dep);
        }
        w.end();
    }
    if let Some(condition) = &job.condition {
        w.entry("if", condition);
    }
    w.entry("runs-on", &job.runs_on);
    if !job.permissions.is_empty() {
        w.mapping("permissions");
        for (scope, level) in &job.permissions {
            w.entry(scope, level);
        }
        w.end();
    }
    if let Some(timeout) = job.timeout_minutes {
        w.entry("timeout-minutes", &timeout.to_string());
    }
    if !job.outputs.is_empty() {
        w.mapping("outputs");
        for (key, value) in &job.outputs {
            w.entry(key, value);
        }
        w.end();
    }
    w.mapping("steps");
    for step in &job.steps {
        w.raw_block(step);
    }
    w.end();
    w.end();
    w.finish()
}

fn descriptor(job: Job) -> JobDescriptor {
    let body = render_job(&job);
    JobDescriptor {
        id: job.id,
        needs: job.needs,
        body,
    }
}
