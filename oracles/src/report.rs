//! Oracle verdicts and the error reports that drive correction prompts.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One type-checker diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerError {
    /// 0-based line index into the candidate source.
    pub line: usize,
    /// Diagnostic text without the `error TSxxxx:` prefix.
    pub message: String,
}

/// A failure raised while running the transform over the example input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeError {
    pub message: String,
    /// Trimmed candidate source line the stack trace points at, if any.
    pub source_location: Option<String>,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source_location: None,
        }
    }

    pub fn with_source_location(mut self, line: impl Into<String>) -> Self {
        self.source_location = Some(line.into());
        self
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source_location {
            Some(line) => write!(
                f,
                "{} at the following line of codemod:\n```\n{}\n```",
                self.message, line
            ),
            None => f.write_str(&self.message),
        }
    }
}

/// The single active failure of one attempt.
///
/// Priority when several oracles fail: runtime, then compiler, then mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ErrorReport {
    /// The transform could not run over the input.
    Runtime(RuntimeError),
    /// The transform source does not type-check. Never empty.
    Compiler { errors: Vec<CompilerError> },
    /// The transform ran and type-checked but produced different output.
    Mismatch,
}

impl ErrorReport {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Runtime(_) => ErrorKind::Runtime,
            Self::Compiler { .. } => ErrorKind::Compiler,
            Self::Mismatch => ErrorKind::Mismatch,
        }
    }
}

/// Tag of an [`ErrorReport`], ordered by repair priority (highest first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Runtime,
    Compiler,
    Mismatch,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Runtime => write!(f, "runtime"),
            Self::Compiler => write!(f, "compiler"),
            Self::Mismatch => write!(f, "mismatch"),
        }
    }
}

/// Result of running every oracle over one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail(ErrorReport),
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    pub fn report(&self) -> Option<&ErrorReport> {
        match self {
            Self::Pass => None,
            Self::Fail(report) => Some(report),
        }
    }
}

/// A verdict plus whatever output the transform produced on the way.
///
/// `produced` is `None` when execution never wrote an output artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub verdict: Verdict,
    pub produced: Option<String>,
}

impl Evaluation {
    pub fn pass(produced: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Pass,
            produced: Some(produced.into()),
        }
    }

    pub fn fail(report: ErrorReport, produced: Option<String>) -> Self {
        Self {
            verdict: Verdict::Fail(report),
            produced,
        }
    }

    pub fn is_pass(&self) -> bool {
        self.verdict.is_pass()
    }
}
