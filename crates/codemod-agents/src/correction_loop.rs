//! The draft → test → correct state machine.
//!
//! ```text
//! Drafting ─→ Testing ─(pass)──────────────────→ Succeeded
//!                │
//!                ├─(fail, budget left)─→ Correcting ─→ Testing
//!                │
//!                └─(fail, budget spent)─────────→ Exhausted
//! ```
//!
//! `Aborted` is reached only when no candidate exists (the draft failed)
//! or the session is cancelled. Per-attempt faults (a tool that cannot be
//! invoked, a failed model call) emit an `error` event and consume one
//! attempt; the session carries on with the last candidate.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use codemod_oracles::{ErrorReport, Evaluation, Oracle};

use crate::config::CodemodConfig;
use crate::drafting::DraftGenerator;
use crate::engine::{profile_for, EngineProfile};
use crate::errors::{FaultKind, SessionError};
use crate::progress::{ProgressEvent, ProgressSink, ProgressStatus};
use crate::prompts;
use crate::session::{Candidate, Outcome, Session, SessionReport};
use crate::thread::PromptThread;

const MSG_SENDING: &str =
    "Sending the before and after code snippets to LLM. The following steps may take a while...";
const MSG_GENERATING: &str = "Generating a draft codemod...";
const MSG_DRAFT_GENERATED: &str = "Draft codemod generated.";
const MSG_DRAFT_IN_PROGRESS: &str = "Draft codemod in progress.";
const MSG_ALREADY_CORRECT: &str = "The draft codemod is already correct.";
const MSG_FINISHED: &str = "The model finished generating the codemod.";
const MSG_DRAFT_FAILED: &str = "An error occurred while generating the draft codemod.";
const MSG_REFINE_FAILED: &str = "An error occurred while attempting to refine the codemod.";
const MSG_CANCELLED: &str = "The codemod generation was cancelled.";

/// Loop state. Terminal states are `Succeeded`, `Exhausted` and `Aborted`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopState {
    Drafting,
    Testing,
    Correcting {
        report: ErrorReport,
        produced: Option<String>,
    },
    Succeeded,
    Exhausted,
    Aborted(String),
}

impl LoopState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Exhausted | Self::Aborted(_))
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Drafting => "drafting",
            Self::Testing => "testing",
            Self::Correcting { .. } => "correcting",
            Self::Succeeded => "succeeded",
            Self::Exhausted => "exhausted",
            Self::Aborted(_) => "aborted",
        }
    }
}

/// Drives one session to a terminal state.
pub struct CorrectionLoop {
    profile: Arc<dyn EngineProfile>,
    generator: Arc<dyn DraftGenerator>,
    sink: Arc<dyn ProgressSink>,
    cancel: CancellationToken,
}

impl CorrectionLoop {
    pub fn new(
        profile: Arc<dyn EngineProfile>,
        generator: Arc<dyn DraftGenerator>,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            profile,
            generator,
            sink,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned token; cancelling it aborts the session.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run `session` against `oracle` until a terminal state.
    ///
    /// Never fails: faults surface as `error` progress events and, when
    /// no candidate can be produced, as an `Aborted` outcome.
    pub async fn run(&self, session: Session, oracle: &dyn Oracle) -> SessionReport {
        let thread = PromptThread::start(self.profile.as_ref(), session.example());
        let mut run = Run {
            session: &session,
            thread,
            candidates: Vec::new(),
            attempts_used: 0,
            evaluations: 0,
        };

        info!(
            session_id = session.id(),
            engine = self.profile.name(),
            budget = session.budget(),
            prompt_version = prompts::PROMPT_VERSION,
            "session started"
        );

        let mut state = LoopState::Drafting;
        while !state.is_terminal() {
            let next = match state {
                LoopState::Drafting => self.step_drafting(&mut run).await,
                LoopState::Testing => self.step_testing(&mut run, oracle).await,
                LoopState::Correcting { report, produced } => {
                    self.step_correcting(&mut run, report, produced).await
                }
                terminal => terminal,
            };
            debug!(
                session_id = session.id(),
                state = next.label(),
                attempt = run.attempts_used,
                "transition"
            );
            state = next;
        }

        let outcome = match state {
            LoopState::Succeeded => Outcome::Success {
                candidate: run.last_candidate_or_empty(),
            },
            LoopState::Exhausted => Outcome::Exhausted {
                candidate: run.last_candidate_or_empty(),
            },
            LoopState::Aborted(reason) => Outcome::Aborted { reason },
            other => Outcome::Aborted {
                reason: format!("loop stopped in non-terminal state {}", other.label()),
            },
        };

        let (attempts_used, evaluations) = (run.attempts_used, run.evaluations);
        let candidates = run.candidates;
        info!(
            session_id = session.id(),
            attempts = attempts_used,
            evaluations,
            success = outcome.is_success(),
            "session finished"
        );
        session.finish(outcome, attempts_used, evaluations, candidates)
    }

    async fn step_drafting(&self, run: &mut Run<'_>) -> LoopState {
        self.emit(ProgressEvent::in_progress(MSG_SENDING));
        self.emit(ProgressEvent::in_progress(MSG_GENERATING));

        let drafted = self
            .guarded(self.generator.generate(&run.thread, &run.candidates))
            .await;
        match drafted {
            Ok(source) => {
                run.candidates.push(Candidate::new(source, 1));
                let message = if run.session.budget() == 0 {
                    MSG_DRAFT_GENERATED
                } else {
                    MSG_DRAFT_IN_PROGRESS
                };
                self.emit(ProgressEvent::in_progress(message));
                LoopState::Testing
            }
            Err(SessionError::Cancelled(reason)) => self.cancelled(reason),
            Err(e) => {
                warn!(session_id = run.session.id(), error = %e, "draft failed");
                self.emit(ProgressEvent::error(MSG_DRAFT_FAILED, e.to_string()));
                LoopState::Aborted(e.to_string())
            }
        }
    }

    async fn step_testing(&self, run: &mut Run<'_>, oracle: &dyn Oracle) -> LoopState {
        let budget = run.session.budget();
        let budget_left = run.attempts_used < budget;
        if budget_left {
            self.emit(ProgressEvent::in_progress(format!(
                "Attempt #{} to refine the draft codemod...",
                run.attempts_used + 1
            )));
        }

        let Some(candidate) = run.candidates.last().cloned() else {
            return LoopState::Aborted("no candidate to test".to_string());
        };

        run.evaluations += 1;
        let example = run.session.example();
        let evaluated = self
            .guarded(async {
                oracle
                    .run_all(&candidate.source, example)
                    .await
                    .map_err(SessionError::from)
            })
            .await;

        match evaluated {
            Ok(Evaluation { verdict, produced }) => match verdict.report() {
                None => {
                    let message = if candidate.attempt <= 1 {
                        MSG_ALREADY_CORRECT.to_string()
                    } else {
                        format!("Attempt #{} corrected the codemod.", candidate.attempt - 1)
                    };
                    self.emit(ProgressEvent::finished(message, &candidate.source));
                    LoopState::Succeeded
                }
                Some(report) if budget_left => {
                    debug!(
                        session_id = run.session.id(),
                        fault = %FaultKind::from(report.kind()),
                        "candidate failed"
                    );
                    LoopState::Correcting {
                        report: report.clone(),
                        produced,
                    }
                }
                Some(_) => {
                    self.emit(ProgressEvent::finished(MSG_FINISHED, &candidate.source));
                    LoopState::Exhausted
                }
            },
            Err(SessionError::Cancelled(reason)) => self.cancelled(reason),
            Err(e) if !e.is_per_attempt() => {
                self.emit(ProgressEvent::error(MSG_REFINE_FAILED, e.to_string()));
                LoopState::Aborted(e.to_string())
            }
            Err(e) => {
                warn!(
                    session_id = run.session.id(),
                    attempt = run.attempts_used + 1,
                    error = %e,
                    "oracle pipeline failed"
                );
                self.emit(ProgressEvent::error(MSG_REFINE_FAILED, e.to_string()));
                if budget_left {
                    run.attempts_used += 1;
                    LoopState::Testing
                } else {
                    self.emit(ProgressEvent::finished(MSG_FINISHED, &candidate.source));
                    LoopState::Exhausted
                }
            }
        }
    }

    async fn step_correcting(
        &self,
        run: &mut Run<'_>,
        report: ErrorReport,
        produced: Option<String>,
    ) -> LoopState {
        let Some(previous) = run.candidates.last().cloned() else {
            return LoopState::Aborted("no candidate to correct".to_string());
        };

        let (message, prompt) = match &report {
            ErrorReport::Runtime(error) => (
                "Attempting to fix runtime errors...",
                prompts::runtime_error_prompt(error),
            ),
            ErrorReport::Compiler { errors } => (
                "Attempting to fix compiler errors...",
                prompts::compiler_error_prompt(
                    errors,
                    &previous.source,
                    self.profile.type_catalogue(),
                ),
            ),
            ErrorReport::Mismatch => (
                "Attempting to fix unexpected output...",
                prompts::mismatch_prompt(
                    run.session.example(),
                    produced.as_deref().unwrap_or_default(),
                ),
            ),
        };
        self.emit(ProgressEvent::in_progress(message));
        run.thread.append_correction(prompt);

        let next_position = previous.attempt + 1;
        let corrected = self
            .guarded(self.generator.generate(&run.thread, &run.candidates))
            .await;
        let candidate = match corrected {
            Ok(source) => Candidate::new(source, next_position),
            Err(SessionError::Cancelled(reason)) => return self.cancelled(reason),
            Err(e) if !e.is_per_attempt() => {
                self.emit(ProgressEvent::error(MSG_REFINE_FAILED, e.to_string()));
                return LoopState::Aborted(e.to_string());
            }
            Err(e @ SessionError::DraftEmpty) => {
                debug!(
                    session_id = run.session.id(),
                    "no code in reply, keeping previous candidate"
                );
                self.emit(ProgressEvent::error(MSG_REFINE_FAILED, e.to_string()));
                previous.reuse(next_position)
            }
            Err(e) => {
                warn!(
                    session_id = run.session.id(),
                    attempt = run.attempts_used + 1,
                    error = %e,
                    "correction request failed"
                );
                self.emit(ProgressEvent::error(MSG_REFINE_FAILED, e.to_string()));
                previous.reuse(next_position)
            }
        };
        run.candidates.push(candidate);
        run.attempts_used += 1;
        LoopState::Testing
    }

    /// Await `fut` unless the session is cancelled first.
    async fn guarded<T, F>(&self, fut: F) -> Result<T, SessionError>
    where
        F: Future<Output = Result<T, SessionError>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(SessionError::Cancelled("cancelled".to_string())),
            result = fut => result,
        }
    }

    fn cancelled(&self, reason: String) -> LoopState {
        info!(reason = %reason, "session cancelled");
        self.emit(ProgressEvent::error(MSG_CANCELLED, reason.clone()));
        LoopState::Aborted(reason)
    }

    fn emit(&self, event: ProgressEvent) {
        match event.status {
            ProgressStatus::Error => warn!(
                message = %event.message,
                error = event.error.as_deref().unwrap_or_default(),
                "progress"
            ),
            _ => info!(status = ?event.status, message = %event.message, "progress"),
        }
        self.sink.emit(event);
    }
}

/// Mutable state owned by one run.
struct Run<'a> {
    session: &'a Session,
    thread: PromptThread,
    candidates: Vec<Candidate>,
    attempts_used: u32,
    evaluations: u32,
}

impl Run<'_> {
    fn last_candidate_or_empty(&self) -> Candidate {
        self.candidates
            .last()
            .cloned()
            .unwrap_or_else(|| Candidate::new(String::new(), 0))
    }
}

/// Run one example end to end with the configured engine.
///
/// Creates the session, its oracle and scratch space, then drives the
/// loop. Scratch files are removed when this returns, including on
/// cancellation.
pub async fn synthesize(
    config: &CodemodConfig,
    example: codemod_oracles::Example,
    generator: Arc<dyn DraftGenerator>,
    sink: Arc<dyn ProgressSink>,
    cancel: CancellationToken,
) -> Result<SessionReport, SessionError> {
    config.validate().map_err(SessionError::Configuration)?;

    let profile: Arc<dyn EngineProfile> = Arc::from(profile_for(config.engine));
    let session = Session::new(example, config.max_correction_attempts);
    let oracle = profile.create_oracle(&config.toolchain, session.id())?;

    let correction_loop = CorrectionLoop::new(profile, generator, sink).with_cancellation(cancel);
    Ok(correction_loop.run(session, oracle.as_ref()).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(LoopState::Succeeded.is_terminal());
        assert!(LoopState::Exhausted.is_terminal());
        assert!(LoopState::Aborted("x".into()).is_terminal());
        assert!(!LoopState::Drafting.is_terminal());
        assert!(!LoopState::Testing.is_terminal());
        assert!(!LoopState::Correcting {
            report: ErrorReport::Mismatch,
            produced: None
        }
        .is_terminal());
    }
}
