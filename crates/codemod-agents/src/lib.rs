//! Codemod synthesis from a single before/after example.
//!
//! A chat model drafts a transform, the oracle pipeline from
//! `codemod_oracles` checks it, and the [`correction_loop`] feeds the
//! highest-priority failure back to the model until the transform
//! reproduces the example or the attempt budget runs out.

pub mod config;
pub mod correction_loop;
pub mod drafting;
pub mod engine;
pub mod errors;
pub mod llm;
pub mod progress;
pub mod prompts;
pub mod session;
pub mod thread;
pub mod type_catalogue;

pub use config::{check_endpoint, CodemodConfig, EngineKind, ModelConfig};
pub use correction_loop::{synthesize, CorrectionLoop, LoopState};
pub use drafting::{extract_transform, DraftGenerator, LlmDraftGenerator};
pub use engine::{profile_for, EngineProfile, JscodeshiftProfile};
pub use errors::{FaultKind, SessionError};
pub use llm::{ChatMessage, ChatRole, ModelClient, RigModelClient};
pub use progress::{ChannelSink, ProgressEvent, ProgressSink, ProgressStatus, RecordingSink};
pub use session::{Candidate, Outcome, Session, SessionReport};
pub use thread::{PromptThread, ThreadEntry, ThreadRole};
pub use type_catalogue::TypeCatalogue;
