//! Unified compiler error type used across all phases.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Parse,
    Graph,
    Order,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Parse => write!(f, "Parse"),
            Phase::Graph => write!(f, "Graph"),
            Phase::Order => write!(f, "Order"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompilerError {
    pub code: String,
    pub phase: Phase,
    pub message: String,
    pub job: Option<String>,
}

impl std::fmt::Display for CompilerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.job {
            Some(id) => write!(
                f,
                "[{}:{}] {} (job '{}')",
                self.phase, self.code, self.message, id
            ),
            None => write!(f, "[{}:{}] {}", self.phase, self.code, self.message),
        }
    }
}

impl std::error::Error for CompilerError {}

impl CompilerError {
    pub fn parse(code: &str, message: impl Into<String>) -> Self {
        CompilerError {
            code: code.into(),
            phase: Phase::Parse,
            message: message.into(),
            job: None,
        }
    }

    pub fn graph(code: &str, message: impl Into<String>, job: Option<String>) -> Self {
        CompilerError {
            code: code.into(),
            phase: Phase::Graph,
            message: message.into(),
            job,
        }
    }

    pub fn order(code: &str, message: impl Into<String>, job: Option<String>) -> Self {
        CompilerError {
            code: code.into(),
            phase: Phase::Order,
            message: message.into(),
            job,
        }
    }
}
