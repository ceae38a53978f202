//! Session state: candidates, outcome and the final report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use codemod_oracles::Example;

/// One produced transform body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub source: String,
    /// 1-based position in the session's candidate sequence.
    pub attempt: u32,
    /// True when the model gave nothing usable and the previous body was kept.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub reused: bool,
}

impl Candidate {
    pub fn new(source: impl Into<String>, attempt: u32) -> Self {
        Self {
            source: source.into(),
            attempt,
            reused: false,
        }
    }

    /// Same body, recorded again at a later position.
    pub fn reuse(&self, attempt: u32) -> Self {
        Self {
            source: self.source.clone(),
            attempt,
            reused: true,
        }
    }
}

/// Terminal state of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Success { candidate: Candidate },
    Exhausted { candidate: Candidate },
    Aborted { reason: String },
}

impl Outcome {
    /// The transform to hand back, if any candidate was produced.
    pub fn candidate(&self) -> Option<&Candidate> {
        match self {
            Self::Success { candidate } | Self::Exhausted { candidate } => Some(candidate),
            Self::Aborted { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// One correction run over one example.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    example: Example,
    budget: u32,
    started_at: DateTime<Utc>,
}

impl Session {
    pub fn new(example: Example, budget: u32) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            example,
            budget,
            started_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn example(&self) -> &Example {
        &self.example
    }

    /// Maximum number of correction rounds.
    pub fn budget(&self) -> u32 {
        self.budget
    }

    pub(crate) fn finish(
        self,
        outcome: Outcome,
        attempts_used: u32,
        evaluations: u32,
        candidates: Vec<Candidate>,
    ) -> SessionReport {
        SessionReport {
            session_id: self.id,
            outcome,
            attempts_used,
            evaluations,
            candidates,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}

/// Summary returned when a session reaches a terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: String,
    pub outcome: Outcome,
    /// Correction rounds consumed.
    pub attempts_used: u32,
    /// Oracle pipeline runs, at most budget + 1.
    pub evaluations: u32,
    pub candidates: Vec<Candidate>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SessionReport {
    /// Final transform text, if any.
    pub fn codemod(&self) -> Option<&str> {
        self.outcome.candidate().map(|c| c.source.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reuse_keeps_source_and_flags_candidate() {
        let first = Candidate::new("export default () => {}", 1);
        let again = first.reuse(2);
        assert_eq!(again.source, first.source);
        assert_eq!(again.attempt, 2);
        assert!(again.reused);
        assert!(!first.reused);
    }

    #[test]
    fn sessions_get_distinct_ids() {
        let a = Session::new(Example::new("a", "b"), 2);
        let b = Session::new(Example::new("a", "b"), 2);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.budget(), 2);
    }

    #[test]
    fn report_serializes_outcome_with_status_tag() {
        let session = Session::new(Example::new("a", "b"), 1);
        let candidate = Candidate::new("src", 1);
        let report = session.finish(
            Outcome::Success {
                candidate: candidate.clone(),
            },
            0,
            1,
            vec![candidate],
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"]["status"], "success");
        assert_eq!(json["outcome"]["candidate"]["source"], "src");
        assert!(json["candidates"][0].get("reused").is_none());
        assert_eq!(report.codemod(), Some("src"));
        assert!(report.finished_at >= report.started_at);
    }

    #[test]
    fn aborted_outcome_has_no_codemod() {
        let outcome = Outcome::Aborted {
            reason: "cancelled".into(),
        };
        assert!(outcome.candidate().is_none());
        assert!(!outcome.is_success());
    }
}
