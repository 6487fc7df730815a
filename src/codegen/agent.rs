//! Agent job emission.
//!
//! The main job checks out the repository, materializes the prompt from the
//! markdown body, runs the engine command with stdio teed to the diagnostic
//! log, redacts secrets from the scratch directory, ingests the
//! safe-outputs file into job outputs, and uploads artifacts. Every
//! artifact-relevant step is recorded into the job's `StepOrderValidator`.

use crate::actions::ActionPins;
use crate::engine::EngineDescriptor;
use crate::error::CompilerError;
use crate::jobs::{AGENT_JOB_ID, DEFAULT_RUNNER, Job};
use crate::parse::safe_outputs::SafeOutputsConfig;
use crate::parse::types::WorkflowSpec;
use crate::validate::StepOrderValidator;

use super::writer::YamlWriter;
use super::{
    AGENT_LOG_FILE, CHECKOUT_ACTION, CHECKOUT_VERSION, GITHUB_SCRIPT_ACTION,
    GITHUB_SCRIPT_VERSION, PROMPT_FILE, SAFE_OUTPUTS_FILE, SCRATCH_DIR, UPLOAD_ARTIFACT_ACTION,
    UPLOAD_ARTIFACT_VERSION, artifacts,
};

const DEFAULT_AGENT_TIMEOUT: u64 = 15;

pub const REDACT_STEP: &str = "Redact secrets";
pub const SAFE_OUTPUTS_UPLOAD_STEP: &str = "Upload safe outputs";
const COLLECT_STEP_ID: &str = "collect_output";

const INGEST_SCRIPT: &str = r#"const fs = require("fs");
const file = process.env.MARKFLOW_SAFE_OUTPUTS;
if (!fs.existsSync(file)) {
  core.setOutput("output", "[]");
  core.setOutput("output_types", "");
  return;
}
const lines = fs.readFileSync(file, "utf8").split("\n").filter(Boolean);
const items = [];
for (const line of lines) {
  try {
    items.push(JSON.parse(line));
  } catch {
    core.warning(`invalid safe-output line: ${line}`);
  }
}
core.setOutput("output", JSON.stringify(items));
core.setOutput("output_types", items.map((item) => item.type).join(","));"#;

/// Emit the main execution job. Fails only on step-ordering violations.
pub fn emit_agent_job(
    spec: &WorkflowSpec,
    outputs: &SafeOutputsConfig,
    engine: &EngineDescriptor,
    pins: &ActionPins,
    warnings: &mut Vec<String>,
) -> Result<Job, Vec<CompilerError>> {
    let mut validator = StepOrderValidator::new(AGENT_JOB_ID, true);
    let collect = !outputs.is_empty();

    let mut job = Job::new(AGENT_JOB_ID);
    job.runs_on = spec
        .frontmatter
        .runs_on
        .clone()
        .unwrap_or_else(|| DEFAULT_RUNNER.to_string());
    job.timeout_minutes = Some(
        spec.frontmatter
            .timeout_minutes
            .unwrap_or(DEFAULT_AGENT_TIMEOUT),
    );
    job.permissions.push(("contents".into(), "read".into()));

    job.steps.push(step_checkout(pins, warnings));
    job.steps.push(step_scratch_dir());
    job.steps.push(step_write_prompt(&spec.markdown));
    job.steps.push(step_execute(engine, collect));

    job.steps.push(step_redact());
    validator.record_sanitization(REDACT_STEP);

    if collect {
        job.steps.push(step_ingest(pins, warnings));
        job.steps.push(step_upload_safe_outputs(pins, warnings));
        validator.record_artifact_upload(
            SAFE_OUTPUTS_UPLOAD_STEP,
            &[SAFE_OUTPUTS_FILE.to_string()],
        );
        job.outputs.push((
            "output".into(),
            format!("${{{{ steps.{}.outputs.output }}}}", COLLECT_STEP_ID),
        ));
        job.outputs.push((
            "output_types".into(),
            format!("${{{{ steps.{}.outputs.output_types }}}}", COLLECT_STEP_ID),
        ));
    }

    let plan =
        artifacts::plan_output_collection(&engine.output_files, pins, &mut validator, warnings);
    job.steps.extend(plan.steps);

    validator.finish()?;
    Ok(job)
}

fn step_checkout(pins: &ActionPins, warnings: &mut Vec<String>) -> String {
    let mut w = YamlWriter::new();
    w.item("name: Checkout repository");
    w.indent();
    w.entry("uses", &pins.resolve(CHECKOUT_ACTION, CHECKOUT_VERSION, warnings));
    w.mapping("with");
    w.entry("persist-credentials", "false");
    w.end();
    w.dedent();
    w.finish()
}

fn step_scratch_dir() -> String {
    let mut w = YamlWriter::new();
    w.item("name: Create scratch directory");
    w.indent();
    w.entry("run", &format!("mkdir -p {}", SCRATCH_DIR));
    w.dedent();
    w.finish()
}

fn step_write_prompt(markdown: &str) -> String {
    let mut w = YamlWriter::new();
    w.item("name: Write agent prompt");
    w.indent();
    w.literal("run");
    w.line(&format!("cat > {} << 'MARKFLOW_EOF'", PROMPT_FILE));
    for line in markdown.lines() {
        if line.is_empty() {
            w.blank();
        } else {
            w.line(line);
        }
    }
    w.line("MARKFLOW_EOF");
    w.end();
    w.dedent();
    w.finish()
}

fn step_execute(engine: &EngineDescriptor, collect: bool) -> String {
    let mut w = YamlWriter::new();
    w.item("name: Execute agent");
    w.indent();
    w.mapping("env");
    w.entry("MARKFLOW_PROMPT", PROMPT_FILE);
    if collect {
        w.entry("MARKFLOW_SAFE_OUTPUTS", SAFE_OUTPUTS_FILE);
    }
    w.end();
    w.literal("run");
    w.line("set -o pipefail");
    w.line(&format!("{} 2>&1 | tee {}", engine.command, AGENT_LOG_FILE));
    w.end();
    w.dedent();
    w.finish()
}

fn step_redact() -> String {
    let mut w = YamlWriter::new();
    w.item(&format!("name: {}", REDACT_STEP));
    w.indent();
    w.entry("if", "always()");
    w.mapping("env");
    w.entry("GITHUB_TOKEN", "${{ github.token }}");
    w.end();
    w.literal("run");
    w.line(&format!("find {} -type f -print0 2>/dev/null \\", SCRATCH_DIR));
    w.line("  | xargs -0 -r sed -i \"s|$GITHUB_TOKEN|[REDACTED]|g\" || true");
    w.end();
    w.dedent();
    w.finish()
}

fn step_ingest(pins: &ActionPins, warnings: &mut Vec<String>) -> String {
    let mut w = YamlWriter::new();
    w.item("name: Ingest agent output");
    w.indent();
    w.entry("id", COLLECT_STEP_ID);
    w.entry("if", "always()");
    w.entry(
        "uses",
        &pins.resolve(GITHUB_SCRIPT_ACTION, GITHUB_SCRIPT_VERSION, warnings),
    );
    w.mapping("env");
    w.entry("MARKFLOW_SAFE_OUTPUTS", SAFE_OUTPUTS_FILE);
    w.end();
    w.mapping("with");
    w.literal("script");
    for line in INGEST_SCRIPT.lines() {
        if line.is_empty() {
            w.blank();
        } else {
            w.line(line);
        }
    }
    w.end();
    w.end();
    w.dedent();
    w.finish()
}

fn step_upload_safe_outputs(pins: &ActionPins, warnings: &mut Vec<String>) -> String {
    let mut w = YamlWriter::new();
    w.item(&format!("name: {}", SAFE_OUTPUTS_UPLOAD_STEP));
    w.indent();
    w.entry("if", "always()");
    w.entry(
        "uses",
        &pins.resolve(UPLOAD_ARTIFACT_ACTION, UPLOAD_ARTIFACT_VERSION, warnings),
    );
    w.mapping("with");
    w.entry("name", "safe-outputs");
    w.entry("path", SAFE_OUTPUTS_FILE);
    w.entry("if-no-files-found", "ignore");
    w.end();
    w.dedent();
    w.finish()
}
