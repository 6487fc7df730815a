//! Safe-output directive resolution.
//!
//! The frontmatter's `safe-outputs` section declares which write-effect
//! directives the workflow may produce (create an issue, add a comment,
//! open a pull request, ...). Each directive key maps to a typed config
//! composed from shared field groups plus directive-specific entity fields.
//!
//! Resolution is lenient by construction: a directive key's presence in the
//! input (even with a null body) yields `Some(config)`; a malformed field
//! group degrades to that group's defaults without failing the compile; an
//! absent key yields `None`. Callers test presence via non-`None`-ness only.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::parse::types::Frontmatter;

// =============================================================================
// DIRECTIVE KEYS — canonical resolution & emission order
// =============================================================================

pub const CREATE_ISSUE: &str = "create-issue";
pub const ADD_COMMENT: &str = "add-comment";
pub const CREATE_PULL_REQUEST: &str = "create-pull-request";
pub const CREATE_DISCUSSION: &str = "create-discussion";
pub const ADD_LABELS: &str = "add-labels";
pub const UPDATE_ISSUE: &str = "update-issue";
pub const UPDATE_RELEASE: &str = "update-release";
pub const MARK_READY_FOR_REVIEW: &str = "mark-pull-request-as-ready-for-review";
pub const PUSH_TO_PR_BRANCH: &str = "push-to-pull-request-branch";
pub const MISSING_TOOL: &str = "missing-tool";

/// All directive keys in the fixed order jobs are emitted. Input-map order
/// is never observable in the output.
pub const DIRECTIVE_KEYS: [&str; 10] = [
    CREATE_ISSUE,
    ADD_COMMENT,
    CREATE_PULL_REQUEST,
    CREATE_DISCUSSION,
    ADD_LABELS,
    UPDATE_ISSUE,
    UPDATE_RELEASE,
    MARK_READY_FOR_REVIEW,
    PUSH_TO_PR_BRANCH,
    MISSING_TOOL,
];

// =============================================================================
// SHARED FIELD GROUPS
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BaseConfig {
    /// Cap on how many outputs of this kind one run may publish.
    pub max: Option<u32>,
    /// Token expression overriding the default job credential.
    pub github_token: Option<String>,
}

impl BaseConfig {
    pub fn max_or(&self, default: u32) -> u32 {
        self.max.unwrap_or(default)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TargetConfig {
    /// Entity the directive acts on: an explicit number, `"*"`, or absent
    /// for the triggering entity.
    pub target: Option<TargetRef>,
    /// `owner/repo` override; absent means the current repository.
    pub target_repo: Option<String>,
}

impl TargetConfig {
    pub fn target_str(&self) -> String {
        match &self.target {
            Some(TargetRef::Number(n)) => n.to_string(),
            Some(TargetRef::Name(name)) => name.clone(),
            None => "triggering".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetRef {
    Number(u64),
    Name(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FilterConfig {
    pub required_labels: BTreeSet<String>,
    pub required_title_prefix: Option<String>,
}

// =============================================================================
// DIRECTIVE ENTITY FIELDS
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CreateIssueFields {
    pub title_prefix: Option<String>,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CreatePullRequestFields {
    pub title_prefix: Option<String>,
    pub labels: Vec<String>,
    /// Open the pull request as a draft; defaults true at emission.
    pub draft: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CreateDiscussionFields {
    pub title_prefix: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AddLabelsFields {
    /// Whitelist of labels the agent may attach; empty means any.
    pub allowed: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct UpdateIssueFields {
    /// Which parts of the issue the agent may rewrite.
    pub status: bool,
    pub title: bool,
    pub body: bool,
}

// =============================================================================
// DIRECTIVE CONFIGS — one per key; each composes the shared groups
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreateIssueConfig {
    pub base: BaseConfig,
    pub fields: CreateIssueFields,
    pub target: TargetConfig,
    pub filter: FilterConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AddCommentConfig {
    pub base: BaseConfig,
    pub target: TargetConfig,
    pub filter: FilterConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreatePullRequestConfig {
    pub base: BaseConfig,
    pub fields: CreatePullRequestFields,
    pub target: TargetConfig,
    pub filter: FilterConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreateDiscussionConfig {
    pub base: BaseConfig,
    pub fields: CreateDiscussionFields,
    pub target: TargetConfig,
    pub filter: FilterConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AddLabelsConfig {
    pub base: BaseConfig,
    pub fields: AddLabelsFields,
    pub target: TargetConfig,
    pub filter: FilterConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateIssueConfig {
    pub base: BaseConfig,
    pub fields: UpdateIssueFields,
    pub target: TargetConfig,
    pub filter: FilterConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateReleaseConfig {
    pub base: BaseConfig,
    pub target: TargetConfig,
    pub filter: FilterConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarkReadyForReviewConfig {
    pub base: BaseConfig,
    pub target: TargetConfig,
    pub filter: FilterConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PushToPullRequestBranchConfig {
    pub base: BaseConfig,
    pub target: TargetConfig,
    pub filter: FilterConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MissingToolConfig {
    pub base: BaseConfig,
    pub target: TargetConfig,
    pub filter: FilterConfig,
}

// =============================================================================
// RESOLVED SECTION
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SafeOutputsConfig {
    pub create_issue: Option<CreateIssueConfig>,
    pub add_comment: Option<AddCommentConfig>,
    pub create_pull_request: Option<CreatePullRequestConfig>,
    pub create_discussion: Option<CreateDiscussionConfig>,
    pub add_labels: Option<AddLabelsConfig>,
    pub update_issue: Option<UpdateIssueConfig>,
    pub update_release: Option<UpdateReleaseConfig>,
    pub mark_ready_for_review: Option<MarkReadyForReviewConfig>,
    pub push_to_pull_request_branch: Option<PushToPullRequestBranchConfig>,
    pub missing_tool: Option<MissingToolConfig>,
}

impl SafeOutputsConfig {
    pub fn is_empty(&self) -> bool {
        self.resolved_keys().is_empty()
    }

    /// Directive keys present in this section, in canonical emission order.
    pub fn resolved_keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if self.create_issue.is_some() {
            keys.push(CREATE_ISSUE);
        }
        if self.add_comment.is_some() {
            keys.push(ADD_COMMENT);
        }
        if self.create_pull_request.is_some() {
            keys.push(CREATE_PULL_REQUEST);
        }
        if self.create_discussion.is_some() {
            keys.push(CREATE_DISCUSSION);
        }
        if self.add_labels.is_some() {
            keys.push(ADD_LABELS);
        }
        if self.update_issue.is_some() {
            keys.push(UPDATE_ISSUE);
        }
        if self.update_release.is_some() {
            keys.push(UPDATE_RELEASE);
        }
        if self.mark_ready_for_review.is_some() {
            keys.push(MARK_READY_FOR_REVIEW);
        }
        if self.push_to_pull_request_branch.is_some() {
            keys.push(PUSH_TO_PR_BRANCH);
        }
        if self.missing_tool.is_some() {
            keys.push(MISSING_TOOL);
        }
        keys
    }
}

// =============================================================================
// RESOLUTION
// =============================================================================

/// Resolve the raw `safe-outputs` section into typed directive configs.
///
/// Never fails: an absent or non-map section resolves to the empty config,
/// and each present directive resolves independently of every other.
pub fn resolve_safe_outputs(frontmatter: &Frontmatter) -> SafeOutputsConfig {
    let Some(section) = frontmatter.safe_outputs.as_ref() else {
        return SafeOutputsConfig::default();
    };
    let Some(map) = section.as_object() else {
        // Nothing resolvable in a non-map section body.
        return SafeOutputsConfig::default();
    };

    SafeOutputsConfig {
        create_issue: map.get(CREATE_ISSUE).map(resolve_create_issue),
        add_comment: map.get(ADD_COMMENT).map(resolve_add_comment),
        create_pull_request: map.get(CREATE_PULL_REQUEST).map(resolve_create_pull_request),
        create_discussion: map.get(CREATE_DISCUSSION).map(resolve_create_discussion),
        add_labels: map.get(ADD_LABELS).map(resolve_add_labels),
        update_issue: map.get(UPDATE_ISSUE).map(resolve_update_issue),
        update_release: map.get(UPDATE_RELEASE).map(resolve_update_release),
        mark_ready_for_review: map.get(MARK_READY_FOR_REVIEW).map(resolve_mark_ready),
        push_to_pull_request_branch: map.get(PUSH_TO_PR_BRANCH).map(resolve_push_to_branch),
        missing_tool: map.get(MISSING_TOOL).map(resolve_missing_tool),
    }
}

/// Decode one field group from a directive body. Malformed bodies (null,
/// scalar, wrong-typed fields) degrade to the group's defaults.
fn decode_group<T: DeserializeOwned + Default>(value: &Value) -> T {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

// Group decode order within a directive: base, entity fields, target, filter.

fn resolve_create_issue(value: &Value) -> CreateIssueConfig {
    CreateIssueConfig {
        base: decode_group(value),
        fields: decode_group(value),
        target: decode_group(value),
        filter: decode_group(value),
    }
}

fn resolve_add_comment(value: &Value) -> AddCommentConfig {
    AddCommentConfig {
        base: decode_group(value),
        target: decode_group(value),
        filter: decode_group(value),
    }
}

fn resolve_create_pull_request(value: &Value) -> CreatePullRequestConfig {
    CreatePullRequestConfig {
        base: decode_group(value),
        fields: decode_group(value),
        target: decode_group(value),
        filter: decode_group(value),
    }
}

fn resolve_create_discussion(value: &Value) -> CreateDiscussionConfig {
    CreateDiscussionConfig {
        base: decode_group(value),
        fields: decode_group(value),
        target: decode_group(value),
        filter: decode_group(value),
    }
}

fn resolve_add_labels(value: &Value) -> AddLabelsConfig {
    AddLabelsConfig {
        base: decode_group(value),
        fields: decode_group(value),
        target: decode_group(value),
        filter: decode_group(value),
    }
}

fn resolve_update_issue(value: &Value) -> UpdateIssueConfig {
    UpdateIssueConfig {
        base: decode_group(value),
        fields: decode_group(value),
        target: decode_group(value),
        filter: decode_group(value),
    }
}

fn resolve_update_release(value: &Value) -> UpdateReleaseConfig {
    UpdateReleaseConfig {
        base: decode_group(value),
        target: decode_group(value),
        filter: decode_group(value),
    }
}

fn resolve_mark_ready(value: &Value) -> MarkReadyForReviewConfig {
    MarkReadyForReviewConfig {
        base: decode_group(value),
        target: decode_group(value),
        filter: decode_group(value),
    }
}

fn resolve_push_to_branch(value: &Value) -> PushToPullRequestBranchConfig {
    PushToPullRequestBranchConfig {
        base: decode_group(value),
        target: decode_group(value),
        filter: decode_group(value),
    }
}

fn resolve_missing_tool(value: &Value) -> MissingToolConfig {
    MissingToolConfig {
        base: decode_group(value),
        target: decode_group(value),
        filter: decode_group(value),
    }
}

// =============================================================================
// TESTS
// =============================================================================
