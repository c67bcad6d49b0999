mod compare;
mod driver;
mod harness;
mod orchestrator;
mod supervisor;

pub use compare::outputs_equivalent;
pub use orchestrator::{CaseOutcome, GradeVerdict, Judge};

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// One execution of user code. Constructed per call, consumed synchronously,
/// never persisted.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub language: String,
    pub source_code: String,
    /// Argument input: JSON values, comma-joined (array-shaped once wrapped
    /// in brackets). Ignored by grading, which uses each case's own input.
    pub argument_input: String,
    pub problem_id: u32,
}

/// Normalized outcome of one execution. Exactly one variant is populated:
/// `output` is the trimmed stdout of the child process, `message` is trimmed
/// stderr or a supervisor-level diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionResult {
    Success { output: String },
    Failure { message: String },
}

impl ExecutionResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self::Success {
            output: output.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Error taxonomy of the execution core. None of these escape the
/// orchestrator: every variant folds into an [`ExecutionResult::Failure`]
/// (or a failed per-case record) at the public boundary.
#[derive(Debug, Error)]
pub enum JudgeError {
    /// Fatal to the single request; no process is spawned, no artifact exists
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("unknown problem id: {0}")]
    UnknownProblem(u32),

    /// The compiled path can only run problems with a declared entry schema
    #[error("no compiled driver schema for problem \"{0}\"")]
    MissingSchema(String),

    /// Caller-supplied argument input is not valid JSON once wrapped; caught
    /// before any artifact or process exists
    #[error("malformed argument input: {0}")]
    MalformedInput(String),

    /// Compiler exited non-zero; carries the compiler's diagnostic text
    #[error("compilation failed: {0}")]
    Compilation(String),

    #[error("compilation timed out after {} ms", .0.as_millis())]
    CompileTimeout(Duration),

    /// A process could not be started at all
    #[error("Execution error: {0}")]
    Spawn(String),

    #[error("judge internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<JudgeError> for ExecutionResult {
    fn from(err: JudgeError) -> Self {
        ExecutionResult::failure(err.to_string())
    }
}
