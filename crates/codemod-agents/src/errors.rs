//! Session fault taxonomy.
//!
//! Every fault raised inside a correction session is represented here.
//! The loop asks [`SessionError::fault_kind`] whether a fault costs one
//! attempt or ends the session, without string matching.
//!
//! | Kind             | Effect                                   |
//! |------------------|------------------------------------------|
//! | DraftEmpty       | attempt lost, previous candidate kept    |
//! | Runtime          | repair target (highest priority)         |
//! | Compiler         | repair target                            |
//! | Mismatch         | repair target (lowest priority)          |
//! | ToolInvocation   | attempt lost, session continues          |
//! | Inference        | attempt lost, session continues          |
//! | Timeout          | attempt lost, session continues          |
//! | Cancelled        | session ends                             |
//! | Configuration    | session never starts                     |

use std::fmt;

use codemod_oracles::{ErrorKind, ToolError};
use thiserror::Error;

/// Classification used by the correction loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    DraftEmpty,
    Runtime,
    Compiler,
    Mismatch,
    ToolInvocation,
    Inference,
    Timeout,
    Cancelled,
    Configuration,
}

impl FaultKind {
    /// `true` if the session survives this fault at the cost of one attempt.
    pub fn is_per_attempt(self) -> bool {
        !matches!(self, Self::Cancelled | Self::Configuration)
    }
}

impl From<ErrorKind> for FaultKind {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Runtime => Self::Runtime,
            ErrorKind::Compiler => Self::Compiler,
            ErrorKind::Mismatch => Self::Mismatch,
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DraftEmpty => write!(f, "draft_empty"),
            Self::Runtime => write!(f, "runtime"),
            Self::Compiler => write!(f, "compiler"),
            Self::Mismatch => write!(f, "mismatch"),
            Self::ToolInvocation => write!(f, "tool_invocation"),
            Self::Inference => write!(f, "inference"),
            Self::Timeout => write!(f, "timeout"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}

/// Unified error type for a correction session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The model answered without any usable transform code.
    #[error("model returned no usable code")]
    DraftEmpty,

    /// An external toolchain could not be spawned or did not finish.
    #[error("tool invocation failed: {0}")]
    ToolInvocation(#[from] ToolError),

    /// The completion request failed (network, backend, bad response).
    #[error("inference failure: {0}")]
    Inference(String),

    /// The completion request exceeded its time bound.
    #[error("model call timed out after {0}s")]
    Timeout(u64),

    /// The session was cancelled by its owner.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// Configuration is invalid or incomplete.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl SessionError {
    pub fn fault_kind(&self) -> FaultKind {
        match self {
            Self::DraftEmpty => FaultKind::DraftEmpty,
            Self::ToolInvocation(_) => FaultKind::ToolInvocation,
            Self::Inference(_) => FaultKind::Inference,
            Self::Timeout(_) => FaultKind::Timeout,
            Self::Cancelled(_) => FaultKind::Cancelled,
            Self::Configuration(_) => FaultKind::Configuration,
        }
    }

    /// `true` if the loop may carry on after this error.
    pub fn is_per_attempt(&self) -> bool {
        self.fault_kind().is_per_attempt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_empty_is_per_attempt() {
        let err = SessionError::DraftEmpty;
        assert!(err.is_per_attempt());
        assert_eq!(err.fault_kind(), FaultKind::DraftEmpty);
    }

    #[test]
    fn tool_failure_is_per_attempt() {
        let err = SessionError::from(ToolError::Timeout {
            tool: "tsc".into(),
            seconds: 120,
        });
        assert!(err.is_per_attempt());
        assert!(err.to_string().contains("tsc"));
    }

    #[test]
    fn timeout_is_per_attempt() {
        assert!(SessionError::Timeout(60).is_per_attempt());
    }

    #[test]
    fn cancelled_ends_session() {
        assert!(!SessionError::Cancelled("client disconnected".into()).is_per_attempt());
        assert!(!SessionError::Configuration("empty model".into()).is_per_attempt());
    }

    #[test]
    fn oracle_kinds_map_to_fault_kinds() {
        assert_eq!(FaultKind::from(ErrorKind::Runtime), FaultKind::Runtime);
        assert_eq!(FaultKind::from(ErrorKind::Mismatch), FaultKind::Mismatch);
    }
}
