//! Safe-output job emission.
//!
//! One publication job per resolved directive, emitted in canonical key
//! order. Every job depends on the agent job by its fixed identifier, runs
//! only when the agent actually produced that output type, carries the
//! smallest permission set its API calls need, and does its work in one
//! pinned `github-script` step driven by `MARKFLOW_*` environment
//! variables.

use crate::actions::ActionPins;
use crate::error::CompilerError;
use crate::jobs::{AGENT_JOB_ID, Job, JobGraph};
use crate::parse::safe_outputs::{
    self as keys, AddCommentConfig, AddLabelsConfig, CreateDiscussionConfig, CreateIssueConfig,
    CreatePullRequestConfig, MarkReadyForReviewConfig, MissingToolConfig,
    PushToPullRequestBranchConfig, SafeOutputsConfig, TargetConfig, UpdateIssueConfig,
    UpdateReleaseConfig,
};

use super::writer::{YamlWriter, yaml_quote};
use super::{GITHUB_SCRIPT_ACTION, GITHUB_SCRIPT_VERSION};

const AGENT_OUTPUT_EXPR: &str = "${{ needs.agent.outputs.output }}";
const SAFE_JOB_TIMEOUT: u64 = 10;

// =============================================================================
// PUBLICATION SCRIPTS
// =============================================================================

const CREATE_ISSUE_SCRIPT: &str = r#"const items = JSON.parse(process.env.MARKFLOW_AGENT_OUTPUT || "[]")
  .filter((item) => item.type === "create-issue")
  .slice(0, Number(process.env.MARKFLOW_MAX || "1"));
const [owner, repo] = (process.env.MARKFLOW_TARGET_REPO || `${context.repo.owner}/${context.repo.repo}`).split("/");
const prefix = process.env.MARKFLOW_TITLE_PREFIX || "";
const extraLabels = (process.env.MARKFLOW_LABELS || "").split(",").filter(Boolean);
for (const item of items) {
  const title = `${prefix}${item.title || "Agent output"}`;
  const labels = [...new Set([...extraLabels, ...(item.labels || [])])];
  await github.rest.issues.create({ owner, repo, title, body: item.body || "", labels });
}"#;

const ADD_COMMENT_SCRIPT: &str = r#"const items = JSON.parse(process.env.MARKFLOW_AGENT_OUTPUT || "[]")
  .filter((item) => item.type === "add-comment")
  .slice(0, Number(process.env.MARKFLOW_MAX || "1"));
const [owner, repo] = (process.env.MARKFLOW_TARGET_REPO || `${context.repo.owner}/${context.repo.repo}`).split("/");
const target = Number(process.env.MARKFLOW_TARGET);
for (const item of items) {
  const issue_number = Number.isInteger(target) && target > 0 ? target : (item.issue ?? context.issue.number);
  await github.rest.issues.createComment({ owner, repo, issue_number, body: item.body || "" });
}"#;

const CREATE_PULL_REQUEST_SCRIPT: &str = r#"const items = JSON.parse(process.env.MARKFLOW_AGENT_OUTPUT || "[]")
  .filter((item) => item.type === "create-pull-request")
  .slice(0, Number(process.env.MARKFLOW_MAX || "1"));
const [owner, repo] = (process.env.MARKFLOW_TARGET_REPO || `${context.repo.owner}/${context.repo.repo}`).split("/");
const prefix = process.env.MARKFLOW_TITLE_PREFIX || "";
const draft = (process.env.MARKFLOW_DRAFT || "true") === "true";
const labels = (process.env.MARKFLOW_LABELS || "").split(",").filter(Boolean);
const { data: repository } = await github.rest.repos.get({ owner, repo });
for (const item of items) {
  const { data: pr } = await github.rest.pulls.create({
    owner,
    repo,
    title: `${prefix}${item.title || "Agent changes"}`,
    head: item.branch,
    base: item.base || repository.default_branch,
    body: item.body || "",
    draft,
  });
  if (labels.length) {
    await github.rest.issues.addLabels({ owner, repo, issue_number: pr.number, labels });
  }
}"#;

const CREATE_DISCUSSION_SCRIPT: &str = r#"const items = JSON.parse(process.env.MARKFLOW_AGENT_OUTPUT || "[]")
  .filter((item) => item.type === "create-discussion")
  .slice(0, Number(process.env.MARKFLOW_MAX || "1"));
const [owner, repo] = (process.env.MARKFLOW_TARGET_REPO || `${context.repo.owner}/${context.repo.repo}`).split("/");
const prefix = process.env.MARKFLOW_TITLE_PREFIX || "";
const categoryName = process.env.MARKFLOW_CATEGORY || "";
const lookup = await github.graphql(
  `query($owner: String!, $repo: String!) {
    repository(owner: $owner, name: $repo) {
      id
      discussionCategories(first: 25) { nodes { id name } }
    }
  }`,
  { owner, repo }
);
const categories = lookup.repository.discussionCategories.nodes;
const category = categories.find((c) => c.name === categoryName) || categories[0];
for (const item of items) {
  await github.graphql(
    `mutation($repositoryId: ID!, $categoryId: ID!, $title: String!, $body: String!) {
      createDiscussion(input: { repositoryId: $repositoryId, categoryId: $categoryId, title: $title, body: $body }) {
        discussion { number }
      }
    }`,
    {
      repositoryId: lookup.repository.id,
      categoryId: category.id,
      title: `${prefix}${item.title || "Agent discussion"}`,
      body: item.body || "",
    }
  );
}"#;

const ADD_LABELS_SCRIPT: &str = r#"const items = JSON.parse(process.env.MARKFLOW_AGENT_OUTPUT || "[]")
  .filter((item) => item.type === "add-labels")
  .slice(0, Number(process.env.MARKFLOW_MAX || "3"));
const [owner, repo] = (process.env.MARKFLOW_TARGET_REPO || `${context.repo.owner}/${context.repo.repo}`).split("/");
const allowed = (process.env.MARKFLOW_ALLOWED || "").split(",").filter(Boolean);
const target = Number(process.env.MARKFLOW_TARGET);
for (const item of items) {
  let labels = (item.labels || []).map(String);
  if (allowed.length) {
    labels = labels.filter((label) => allowed.includes(label));
  }
  if (!labels.length) continue;
  const issue_number = Number.isInteger(target) && target > 0 ? target : (item.issue ?? context.issue.number);
  await github.rest.issues.addLabels({ owner, repo, issue_number, labels });
}"#;

const UPDATE_ISSUE_SCRIPT: &str = r#"const items = JSON.parse(process.env.MARKFLOW_AGENT_OUTPUT || "[]")
  .filter((item) => item.type === "update-issue")
  .slice(0, Number(process.env.MARKFLOW_MAX || "1"));
const [owner, repo] = (process.env.MARKFLOW_TARGET_REPO || `${context.repo.owner}/${context.repo.repo}`).split("/");
const canStatus = process.env.MARKFLOW_CAN_STATUS === "true";
const canTitle = process.env.MARKFLOW_CAN_TITLE === "true";
const canBody = process.env.MARKFLOW_CAN_BODY === "true";
const target = Number(process.env.MARKFLOW_TARGET);
for (const item of items) {
  const patch = {};
  if (canStatus && item.status) patch.state = item.status;
  if (canTitle && item.title) patch.title = item.title;
  if (canBody && item.body) patch.body = item.body;
  if (!Object.keys(patch).length) continue;
  const issue_number = Number.isInteger(target) && target > 0 ? target : (item.issue ?? context.issue.number);
  await github.rest.issues.update({ owner, repo, issue_number, ...patch });
}"#;

const UPDATE_RELEASE_SCRIPT: &str = r#"const items = JSON.parse(process.env.MARKFLOW_AGENT_OUTPUT || "[]")
  .filter((item) => item.type === "update-release")
  .slice(0, Number(process.env.MARKFLOW_MAX || "1"));
const [owner, repo] = (process.env.MARKFLOW_TARGET_REPO || `${context.repo.owner}/${context.repo.repo}`).split("/");
const target = Number(process.env.MARKFLOW_TARGET);
for (const item of items) {
  const release = Number.isInteger(target) && target > 0
    ? (await github.rest.repos.getRelease({ owner, repo, release_id: target })).data
    : (await github.rest.repos.getLatestRelease({ owner, repo })).data;
  const body = item.body ? `${release.body || ""}

${item.body}` : release.body;
  await github.rest.repos.updateRelease({ owner, repo, release_id: release.id, body });
}"#;

const MARK_READY_SCRIPT: &str = r#"const items = JSON.parse(process.env.MARKFLOW_AGENT_OUTPUT || "[]")
  .filter((item) => item.type === "mark-pull-request-as-ready-for-review")
  .slice(0, Number(process.env.MARKFLOW_MAX || "1"));
const [owner, repo] = (process.env.MARKFLOW_TARGET_REPO || `${context.repo.owner}/${context.repo.repo}`).split("/");
const target = Number(process.env.MARKFLOW_TARGET);
for (const item of items) {
  const pull_number = Number.isInteger(target) && target > 0 ? target : (item.pull_request ?? context.issue.number);
  const { data: pr } = await github.rest.pulls.get({ owner, repo, pull_number });
  await github.graphql(
    `mutation($id: ID!) {
      markPullRequestReadyForReview(input: { pullRequestId: $id }) { pullRequest { number } }
    }`,
    { id: pr.node_id }
  );
}"#;

const PUSH_TO_PR_BRANCH_SCRIPT: &str = r#"const items = JSON.parse(process.env.MARKFLOW_AGENT_OUTPUT || "[]")
  .filter((item) => item.type === "push-to-pull-request-branch")
  .slice(0, Number(process.env.MARKFLOW_MAX || "1"));
const [owner, repo] = (process.env.MARKFLOW_TARGET_REPO || `${context.repo.owner}/${context.repo.repo}`).split("/");
const requiredLabels = (process.env.MARKFLOW_REQUIRED_LABELS || "").split(",").filter(Boolean);
const requiredPrefix = process.env.MARKFLOW_REQUIRED_TITLE_PREFIX || "";
const target = Number(process.env.MARKFLOW_TARGET);
for (const item of items) {
  const pull_number = Number.isInteger(target) && target > 0 ? target : (item.pull_request ?? context.issue.number);
  const { data: pr } = await github.rest.pulls.get({ owner, repo, pull_number });
  const prLabels = pr.labels.map((label) => label.name);
  if (requiredLabels.some((label) => !prLabels.includes(label))) {
    core.setFailed(`pull request #${pull_number} is missing a required label`);
    continue;
  }
  if (requiredPrefix && !pr.title.startsWith(requiredPrefix)) {
    core.setFailed(`pull request #${pull_number} title lacks required prefix`);
    continue;
  }
  for (const file of item.files || []) {
    let sha;
    try {
      const { data: existing } = await github.rest.repos.getContent({ owner, repo, path: file.path, ref: pr.head.ref });
      sha = existing.sha;
    } catch {}
    await github.rest.repos.createOrUpdateFileContents({
      owner,
      repo,
      path: file.path,
      message: file.message || `Update ${file.path}`,
      content: Buffer.from(file.content || "", "utf8").toString("base64"),
      branch: pr.head.ref,
      sha,
    });
  }
}"#;

const MISSING_TOOL_SCRIPT: &str = r#"const items = JSON.parse(process.env.MARKFLOW_AGENT_OUTPUT || "[]")
  .filter((item) => item.type === "missing-tool")
  .slice(0, Number(process.env.MARKFLOW_MAX || "20"));
if (!items.length) return;
core.summary.addHeading("Missing tools reported by the agent", 3);
for (const item of items) {
  core.summary.addRaw(`- **${item.tool || "unknown"}**: ${item.reason || "no reason given"}`, true);
}
await core.summary.write();"#;

// =============================================================================
// EMISSION
// =============================================================================

/// Emit one publication job per resolved directive into the graph, in
/// canonical key order. Fails only on duplicate job identifiers.
pub fn emit_safe_output_jobs(
    outputs: &SafeOutputsConfig,
    pins: &ActionPins,
    warnings: &mut Vec<String>,
    graph: &mut JobGraph,
) -> Result<(), Vec<CompilerError>> {
    if let Some(cfg) = &outputs.create_issue {
        graph.add(emit_create_issue(cfg, pins, warnings)).map_err(|e| vec![e])?;
    }
    if let Some(cfg) = &outputs.add_comment {
        graph.add(emit_add_comment(cfg, pins, warnings)).map_err(|e| vec![e])?;
    }
    if let Some(cfg) = &outputs.create_pull_request {
        graph.add(emit_create_pull_request(cfg, pins, warnings)).map_err(|e| vec![e])?;
    }
    if let Some(cfg) = &outputs.create_discussion {
        graph.add(emit_create_discussion(cfg, pins, warnings)).map_err(|e| vec![e])?;
    }
    if let Some(cfg) = &outputs.add_labels {
        graph.add(emit_add_labels(cfg, pins, warnings)).map_err(|e| vec![e])?;
    }
    if let Some(cfg) = &outputs.update_issue {
        graph.add(emit_update_issue(cfg, pins, warnings)).map_err(|e| vec![e])?;
    }
    if let Some(cfg) = &outputs.update_release {
        graph.add(emit_update_release(cfg, pins, warnings)).map_err(|e| vec![e])?;
    }
    if let Some(cfg) = &outputs.mark_ready_for_review {
        graph.add(emit_mark_ready(cfg, pins, warnings)).map_err(|e| vec![e])?;
    }
    if let Some(cfg) = &outputs.push_to_pull_request_branch {
        graph.add(emit_push_to_pr_branch(cfg, pins, warnings)).map_err(|e| vec![e])?;
    }
    if let Some(cfg) = &outputs.missing_tool {
        graph.add(emit_missing_tool(cfg, pins, warnings)).map_err(|e| vec![e])?;
    }
    Ok(())
}

/// Skeleton shared by every publication job: depends on the agent job and
/// runs only when the agent emitted this directive's output type.
fn output_job(id: &str, key: &str) -> Job {
    let mut job = Job::new(id);
    job.needs.push(AGENT_JOB_ID.to_string());
    job.condition = Some(format!(
        "contains(needs.agent.outputs.output_types, '{}')",
        key
    ));
    job.consumes_agent_output = true;
    job.timeout_minutes = Some(SAFE_JOB_TIMEOUT);
    job
}

fn github_script_step(
    name: &str,
    pins: &ActionPins,
    warnings: &mut Vec<String>,
    env: &[(String, String)],
    github_token: Option<&str>,
    script: &str,
) -> String {
    let mut w = YamlWriter::new();
    w.item(&format!("name: {}", name));
    w.indent();
    w.entry(
        "uses",
        &pins.resolve(GITHUB_SCRIPT_ACTION, GITHUB_SCRIPT_VERSION, warnings),
    );
    if !env.is_empty() {
        w.mapping("env");
        for (key, value) in env {
            w.entry(key, &yaml_quote(value));
        }
        w.end();
    }
    w.mapping("with");
    if let Some(token) = github_token {
        w.entry("github-token", &yaml_quote(token));
    }
    w.literal("script");
    for line in script.lines() {
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

fn base_env(max: u32) -> Vec<(String, String)> {
    vec![
        ("MARKFLOW_AGENT_OUTPUT".into(), AGENT_OUTPUT_EXPR.into()),
        ("MARKFLOW_MAX".into(), max.to_string()),
    ]
}

fn push_opt(env: &mut Vec<(String, String)>, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        env.push((key.into(), v.clone()));
    }
}

fn push_target(env: &mut Vec<(String, String)>, target: &TargetConfig) {
    env.push(("MARKFLOW_TARGET".into(), target.target_str()));
    push_opt(env, "MARKFLOW_TARGET_REPO", &target.target_repo);
}

fn emit_create_issue(cfg: &CreateIssueConfig, pins: &ActionPins, warnings: &mut Vec<String>) -> Job {
    let mut job = output_job("create_issue", keys::CREATE_ISSUE);
    job.permissions = vec![("issues".into(), "write".into())];
    let mut env = base_env(cfg.base.max_or(1));
    push_target(&mut env, &cfg.target);
    push_opt(&mut env, "MARKFLOW_TITLE_PREFIX", &cfg.fields.title_prefix);
    if !cfg.fields.labels.is_empty() {
        env.push(("MARKFLOW_LABELS".into(), cfg.fields.labels.join(",")));
    }
    job.steps.push(github_script_step(
        "Create output issue",
        pins,
        warnings,
        &env,
        cfg.base.github_token.as_deref(),
        CREATE_ISSUE_SCRIPT,
    ));
    job
}

fn emit_add_comment(cfg: &AddCommentConfig, pins: &ActionPins, warnings: &mut Vec<String>) -> Job {
    let mut job = output_job("add_comment", keys::ADD_COMMENT);
    job.permissions = vec![
        ("issues".into(), "write".into()),
        ("pull-requests".into(), "write".into()),
    ];
    let mut env = base_env(cfg.base.max_or(1));
    push_target(&mut env, &cfg.target);
    job.steps.push(github_script_step(
        "Add output comment",
        pins,
        warnings,
        &env,
        cfg.base.github_token.as_deref(),
        ADD_COMMENT_SCRIPT,
    ));
    job
}

fn emit_create_pull_request(
    cfg: &CreatePullRequestConfig,
    pins: &ActionPins,
    warnings: &mut Vec<String>,
) -> Job {
    let mut job = output_job("create_pull_request", keys::CREATE_PULL_REQUEST);
    job.permissions = vec![
        ("contents".into(), "write".into()),
        ("pull-requests".into(), "write".into()),
    ];
    let mut env = base_env(cfg.base.max_or(1));
    push_target(&mut env, &cfg.target);
    push_opt(&mut env, "MARKFLOW_TITLE_PREFIX", &cfg.fields.title_prefix);
    env.push((
        "MARKFLOW_DRAFT".into(),
        cfg.fields.draft.unwrap_or(true).to_string(),
    ));
    if !cfg.fields.labels.is_empty() {
        env.push(("MARKFLOW_LABELS".into(), cfg.fields.labels.join(",")));
    }
    job.steps.push(github_script_step(
        "Create output pull request",
        pins,
        warnings,
        &env,
        cfg.base.github_token.as_deref(),
        CREATE_PULL_REQUEST_SCRIPT,
    ));
    job
}

fn emit_create_discussion(
    cfg: &CreateDiscussionConfig,
    pins: &ActionPins,
    warnings: &mut Vec<String>,
) -> Job {
    let mut job = output_job("create_discussion", keys::CREATE_DISCUSSION);
    job.permissions = vec![("discussions".into(), "write".into())];
    let mut env = base_env(cfg.base.max_or(1));
    push_target(&mut env, &cfg.target);
    push_opt(&mut env, "MARKFLOW_TITLE_PREFIX", &cfg.fields.title_prefix);
    push_opt(&mut env, "MARKFLOW_CATEGORY", &cfg.fields.category);
    job.steps.push(github_script_step(
        "Create output discussion",
        pins,
        warnings,
        &env,
        cfg.base.github_token.as_deref(),
        CREATE_DISCUSSION_SCRIPT,
    ));
    job
}

fn emit_add_labels(cfg: &AddLabelsConfig, pins: &ActionPins, warnings: &mut Vec<String>) -> Job {
    let mut job = output_job("add_labels", keys::ADD_LABELS);
    job.permissions = vec![("issues".into(), "write".into())];
    let mut env = base_env(cfg.base.max_or(3));
    push_target(&mut env, &cfg.target);
    if !cfg.fields.allowed.is_empty() {
        env.push(("MARKFLOW_ALLOWED".into(), cfg.fields.allowed.join(",")));
    }
    job.steps.push(github_script_step(
        "Apply output labels",
        pins,
        warnings,
        &env,
        cfg.base.github_token.as_deref(),
        ADD_LABELS_SCRIPT,
    ));
    job
}

fn emit_update_issue(cfg: &UpdateIssueConfig, pins: &ActionPins, warnings: &mut Vec<String>) -> Job {
    let mut job = output_job("update_issue", keys::UPDATE_ISSUE);
    job.permissions = vec![("issues".into(), "write".into())];
    let mut env = base_env(cfg.base.max_or(1));
    push_target(&mut env, &cfg.target);
    env.push(("MARKFLOW_CAN_STATUS".into(), cfg.fields.status.to_string()));
    env.push(("MARKFLOW_CAN_TITLE".into(), cfg.fields.title.to_string()));
    env.push(("MARKFLOW_CAN_BODY".into(), cfg.fields.body.to_string()));
    job.steps.push(github_script_step(
        "Update target issue",
        pins,
        warnings,
        &env,
        cfg.base.github_token.as_deref(),
        UPDATE_ISSUE_SCRIPT,
    ));
    job
}

fn emit_update_release(
    cfg: &UpdateReleaseConfig,
    pins: &ActionPins,
    warnings: &mut Vec<String>,
) -> Job {
    let mut job = output_job("update_release", keys::UPDATE_RELEASE);
    job.permissions = vec![("contents".into(), "write".into())];
    let mut env = base_env(cfg.base.max_or(1));
    push_target(&mut env, &cfg.target);
    job.steps.push(github_script_step(
        "Update target release",
        pins,
        warnings,
        &env,
        cfg.base.github_token.as_deref(),
        UPDATE_RELEASE_SCRIPT,
    ));
    job
}

fn emit_mark_ready(
    cfg: &MarkReadyForReviewConfig,
    pins: &ActionPins,
    warnings: &mut Vec<String>,
) -> Job {
    let mut job = output_job("ready_for_review", keys::MARK_READY_FOR_REVIEW);
    job.permissions = vec![("pull-requests".into(), "write".into())];
    let mut env = base_env(cfg.base.max_or(1));
    push_target(&mut env, &cfg.target);
    job.steps.push(github_script_step(
        "Mark pull request ready for review",
        pins,
        warnings,
        &env,
        cfg.base.github_token.as_deref(),
        MARK_READY_SCRIPT,
    ));
    job
}

fn emit_push_to_pr_branch(
    cfg: &PushToPullRequestBranchConfig,
    pins: &ActionPins,
    warnings: &mut Vec<String>,
) -> Job {
    let mut job = output_job("push_to_pr_branch", keys::PUSH_TO_PR_BRANCH);
    job.permissions = vec![("contents".into(), "write".into())];
    let mut env = base_env(cfg.base.max_or(1));
    push_target(&mut env, &cfg.target);
    if !cfg.filter.required_labels.is_empty() {
        let labels: Vec<&str> = cfg.filter.required_labels.iter().map(String::as_str).collect();
        env.push(("MARKFLOW_REQUIRED_LABELS".into(), labels.join(",")));
    }
    push_opt(
        &mut env,
        "MARKFLOW_REQUIRED_TITLE_PREFIX",
        &cfg.filter.required_title_prefix,
    );
    job.steps.push(github_script_step(
        "Push changes to pull request branch",
        pins,
        warnings,
        &env,
        cfg.base.github_token.as_deref(),
        PUSH_TO_PR_BRANCH_SCRIPT,
    ));
    job
}

fn emit_missing_tool(cfg: &MissingToolConfig, pins: &ActionPins, warnings: &mut Vec<String>) -> Job {
    let mut job = output_job("missing_tool", keys::MISSING_TOOL);
    let env = base_env(cfg.base.max_or(20));
    job.steps.push(github_script_step(
        "Report missing tools",
        pins,
        warnings,
        &env,
        cfg.base.github_token.as_deref(),
        MISSING_TOOL_SCRIPT,
    ));
    job
}
