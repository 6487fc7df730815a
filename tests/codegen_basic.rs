//! Integration tests for the codegen pass.

mod helpers;

use serde_json::json;

#[test]
fn minimal_document_lock_snapshot() {
    let json = include_str!("fixtures/minimal.json");
    let text = helpers::lock_text(json);
    insta::assert_snapshot!("minimal_lock", text);
}

#[test]
fn preamble_defaults_applied() {
    let text = helpers::lock_text(&helpers::doc(json!({}), "Hello."));
    assert!(text.contains("name: \"Agentic Workflow\""));
    assert!(text.contains("on:\n  workflow_dispatch: {}"));
    assert!(text.contains("permissions: {}"));
}

#[test]
fn preamble_passes_frontmatter_through() {
    let frontmatter = json!({
        "name": "Nightly Triage",
        "on": {"schedule": [{"cron": "0 2 * * *"}]},
        "permissions": {"contents": "read"},
        "concurrency": {"group": "triage", "cancel-in-progress": true},
        "env": {"RUST_LOG": "info"}
    });
    let text = helpers::lock_text(&helpers::doc(frontmatter, "Triage."));
    assert!(text.contains("name: \"Nightly Triage\""));
    assert!(text.contains("schedule:"));
    assert!(text.contains("- cron: \"0 2 * * *\""));
    assert!(text.contains("concurrency:\n  group: \"triage\"\n  cancel-in-progress: true"));
    assert!(text.contains("env:\n  RUST_LOG: \"info\""));
    assert!(!text.contains("workflow_dispatch"));
}

#[test]
fn publication_jobs_are_gated_on_output_types() {
    let json = include_str!("fixtures/research_workflow.json");
    let text = helpers::lock_text(json);
    assert!(text.contains("if: contains(needs.agent.outputs.output_types, 'create-issue')"));
    assert!(text.contains("if: contains(needs.agent.outputs.output_types, 'add-comment')"));
    assert!(text.contains("if: contains(needs.agent.outputs.output_types, 'missing-tool')"));
    assert!(!text.contains("'create-pull-request'"));
}

#[test]
fn agent_outputs_exposed_when_directives_declared() {
    let json = include_str!("fixtures/research_workflow.json");
    let text = helpers::lock_text(json);
    assert!(text.contains("outputs:"));
    assert!(text.contains("output: ${{ steps.collect_output.outputs.output }}"));
    assert!(text.contains("output_types: ${{ steps.collect_output.outputs.output_types }}"));
    assert!(text.contains("MARKFLOW_AGENT_OUTPUT: \"${{ needs.agent.outputs.output }}\""));
}

#[test]
fn claude_engine_uploads_then_cleans_workspace_outputs() {
    let json = include_str!("fixtures/research_workflow.json");
    let text = helpers::lock_text(json);

    let upload = text.find("- name: Upload engine output files").expect("upload step");
    let cleanup = text.find("- name: Clean up engine output files").expect("cleanup step");
    assert!(upload < cleanup, "upload must precede cleanup");

    assert!(text.contains("rm -rf output.txt"));
    assert!(!text.contains("rm -rf /tmp/markflow/claude-logs/"));
    assert!(!text.contains("rm -rf /tmp/markflow/agent-stdio.log"));
}

#[test]
fn redaction_precedes_artifact_uploads() {
    let json = include_str!("fixtures/research_workflow.json");
    let text = helpers::lock_text(json);
    let redact = text.find("- name: Redact secrets").expect("redact step");
    let safe_upload = text.find("- name: Upload safe outputs").expect("safe outputs upload");
    let engine_upload = text.find("- name: Upload engine output files").expect("engine upload");
    assert!(redact < safe_upload);
    assert!(redact < engine_upload);
}

#[test]
fn per_job_permissions_stay_minimal() {
    let json = include_str!("fixtures/research_workflow.json");
    let lock = helpers::compile(json).expect("Should compile");

    let create_issue = lock
        .jobs
        .iter()
        .find(|j| j.id == "create_issue")
        .expect("create_issue job");
    assert!(create_issue.body.contains("permissions:\n    issues: write"));
    assert!(!create_issue.body.contains("contents: write"));

    let missing_tool = lock
        .jobs
        .iter()
        .find(|j| j.id == "missing_tool")
        .expect("missing_tool job");
    assert!(!missing_tool.body.contains("permissions:"));
}

#[test]
fn version_stamp_rendered_when_supplied() {
    let json = include_str!("fixtures/minimal.json");
    let (spec, outputs) = markflow::parse::parse_and_resolve(json).expect("Should resolve");
    let lock = markflow::codegen::emit(
        &spec,
        &outputs,
        &markflow::engine::EngineDescriptor::copilot(),
        &markflow::actions::ActionPins::defaults(),
        Some("0.2.0"),
    )
    .expect("Should compile");
    assert!(lock.render().contains("# markflow version: 0.2.0"));
}
