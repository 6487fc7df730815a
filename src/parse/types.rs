//! Rust types mirroring the tokenizer's workflow document JSON.
//!
//! These types are the serde target for the parsed markdown document:
//! the YAML-like frontmatter (already tokenized to JSON upstream) plus the
//! prose body. Frontmatter blocks the compiler copies verbatim into the
//! lock file (`on`, `permissions`, `concurrency`, `env`) stay untyped
//! `serde_json::Value` pass-throughs.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// TOP-LEVEL DOCUMENT
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowSpec {
    #[serde(default)]
    pub frontmatter: Frontmatter,
    /// Markdown body; becomes the agent prompt.
    #[serde(default)]
    pub markdown: String,
}

impl WorkflowSpec {
    /// Workflow display title. Cosmetic only: job identity never derives
    /// from it.
    pub fn title(&self) -> &str {
        self.frontmatter.name.as_deref().unwrap_or("Agentic Workflow")
    }
}

// =============================================================================
// FRONTMATTER
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Frontmatter {
    pub name: Option<String>,
    pub description: Option<String>,
    pub on: Option<Value>,
    pub permissions: Option<Value>,
    pub concurrency: Option<Value>,
    pub env: Option<Value>,
    pub runs_on: Option<String>,
    pub timeout_minutes: Option<u64>,
    pub engine: Option<EngineSetting>,
    /// Raw `safe-outputs` section; resolved by `safe_outputs::resolve_safe_outputs`.
    pub safe_outputs: Option<Value>,
}

// =============================================================================
// ENGINE SETTING — string shorthand or detailed object
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EngineSetting {
    Id(String),
    Detailed {
        id: String,
        #[serde(default)]
        version: Option<String>,
        #[serde(default)]
        model: Option<String>,
    },
}

impl EngineSetting {
    pub fn id(&self) -> &str {
        match self {
            EngineSetting::Id(id) => id,
            EngineSetting::Detailed { id, .. } => id,
        }
    }
}
