//! Injected execution-engine descriptor.
//!
//! The compiler treats the agentic engine as data supplied by the embedder:
//! the shell command the agent step runs and the output paths the engine is
//! known to produce. Declared paths under the scratch directory stay on the
//! runner; everything else is uploaded and then cleaned from the workspace.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineDescriptor {
    pub id: String,
    /// Shell command executed by the agent step. Stdout/stderr are teed to
    /// the diagnostic log.
    pub command: String,
    /// Files or directories the engine may produce during a run.
    #[serde(default)]
    pub output_files: Vec<String>,
}

impl EngineDescriptor {
    pub fn new(id: impl Into<String>, command: impl Into<String>) -> Self {
        EngineDescriptor {
            id: id.into(),
            command: command.into(),
            output_files: Vec::new(),
        }
    }

    pub fn with_output_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_files = files.into_iter().map(Into::into).collect();
        self
    }

    /// Default descriptor for the GitHub Copilot CLI engine.
    pub fn copilot() -> Self {
        EngineDescriptor::new(
            "copilot",
            "copilot --log-level all --prompt-file /tmp/markflow/prompt.md",
        )
        .with_output_files(["/tmp/markflow/copilot-logs/"])
    }

    /// Default descriptor for the Claude Code CLI engine.
    pub fn claude() -> Self {
        EngineDescriptor::new(
            "claude",
            "claude --print --output-format stream-json \"$(cat /tmp/markflow/prompt.md)\"",
        )
        .with_output_files(["output.txt", "/tmp/markflow/claude-logs/"])
    }

    /// Descriptor for an engine id coming from frontmatter; unknown ids get
    /// the copilot defaults.
    pub fn for_id(id: &str) -> Self {
        match id {
            "claude" => EngineDescriptor::claude(),
            _ => EngineDescriptor::copilot(),
        }
    }
}
