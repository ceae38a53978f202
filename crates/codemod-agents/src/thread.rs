//! Append-only conversation history for one session.
//!
//! The thread stores only the messages *we* author: the system
//! instruction, the initial drafting request and one correction per
//! round. Assistant turns are the session's candidates, kept as a parallel
//! sequence and interleaved only when rendering:
//!
//! ```text
//! system, user(initial), [assistant(candidate_i), user(correction_i)]*
//! ```

use serde::{Deserialize, Serialize};

use crate::engine::EngineProfile;
use crate::llm::ChatMessage;
use crate::session::Candidate;
use codemod_oracles::Example;

/// Role of one entry in a [`PromptThread`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadRole {
    SystemInstruction,
    InitialRequest,
    Correction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadEntry {
    pub role: ThreadRole,
    pub content: String,
}

/// Conversation history. Never reordered, never edited in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptThread {
    system: ThreadEntry,
    initial: ThreadEntry,
    corrections: Vec<ThreadEntry>,
}

impl PromptThread {
    /// Seed a thread with the engine's system instruction and drafting request.
    pub fn start(profile: &dyn EngineProfile, example: &Example) -> Self {
        Self {
            system: ThreadEntry {
                role: ThreadRole::SystemInstruction,
                content: profile.system_instruction().to_string(),
            },
            initial: ThreadEntry {
                role: ThreadRole::InitialRequest,
                content: profile.initial_prompt(example),
            },
            corrections: Vec::new(),
        }
    }

    /// Append one correction request.
    pub fn append_correction(&mut self, prompt: impl Into<String>) {
        self.corrections.push(ThreadEntry {
            role: ThreadRole::Correction,
            content: prompt.into(),
        });
    }

    /// Length of the rendered conversation after the current rounds:
    /// system and initial request, plus one assistant/correction pair per round.
    pub fn rendered_len(&self) -> usize {
        2 + 2 * self.corrections.len()
    }

    /// The entries we authored, in order.
    pub fn entries(&self) -> impl Iterator<Item = &ThreadEntry> {
        [&self.system, &self.initial]
            .into_iter()
            .chain(self.corrections.iter())
    }

    /// Interleave the thread with `candidates` in chronological order.
    ///
    /// Candidate `i` is rendered as the assistant turn answered by
    /// correction `i`. A candidate with no correction after it yet is the
    /// one currently under test and is not rendered.
    pub fn render_for_model(&self, candidates: &[Candidate]) -> Vec<ChatMessage> {
        debug_assert!(
            candidates.len() >= self.corrections.len(),
            "every correction must follow a candidate"
        );
        let mut messages = Vec::with_capacity(self.rendered_len());
        messages.push(ChatMessage::system(&self.system.content));
        messages.push(ChatMessage::user(&self.initial.content));
        for (candidate, correction) in candidates.iter().zip(&self.corrections) {
            messages.push(ChatMessage::assistant(&candidate.source));
            messages.push(ChatMessage::user(&correction.content));
        }
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::JscodeshiftProfile;
    use crate::llm::ChatRole;

    fn candidate(n: u32) -> Candidate {
        Candidate::new(format!("codemod v{n}"), n)
    }

    #[test]
    fn starts_with_system_and_initial_request() {
        let thread = PromptThread::start(&JscodeshiftProfile, &Example::new("a", "b"));
        let roles: Vec<ThreadRole> = thread.entries().map(|e| e.role).collect();
        assert_eq!(roles, vec![ThreadRole::SystemInstruction, ThreadRole::InitialRequest]);
        assert_eq!(thread.rendered_len(), 2);
    }

    #[test]
    fn render_interleaves_candidates_and_corrections() {
        let mut thread = PromptThread::start(&JscodeshiftProfile, &Example::new("a", "b"));
        thread.append_correction("fix one");
        thread.append_correction("fix two");
        let candidates = [candidate(1), candidate(2), candidate(3)];

        let rendered = thread.render_for_model(&candidates);
        let roles: Vec<ChatRole> = rendered.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                ChatRole::System,
                ChatRole::User,
                ChatRole::Assistant,
                ChatRole::User,
                ChatRole::Assistant,
                ChatRole::User,
            ]
        );
        assert_eq!(rendered[2].content, "codemod v1");
        assert_eq!(rendered[3].content, "fix one");
        assert_eq!(rendered[4].content, "codemod v2");
        assert_eq!(rendered[5].content, "fix two");
    }

    #[test]
    fn length_grows_by_two_per_round() {
        let mut thread = PromptThread::start(&JscodeshiftProfile, &Example::new("a", "b"));
        let mut candidates = vec![candidate(1)];
        for k in 1..=4u32 {
            thread.append_correction(format!("correction {k}"));
            assert_eq!(thread.rendered_len(), 2 + 2 * k as usize);
            assert_eq!(thread.render_for_model(&candidates).len(), 2 + 2 * k as usize);
            candidates.push(candidate(k + 1));
        }
    }

    #[test]
    fn appending_never_touches_earlier_entries() {
        let mut thread = PromptThread::start(&JscodeshiftProfile, &Example::new("x", "y"));
        let before: Vec<ThreadEntry> = thread.entries().cloned().collect();
        thread.append_correction("more");
        let after: Vec<ThreadEntry> = thread.entries().cloned().collect();
        assert_eq!(&after[..before.len()], &before[..]);
    }
}
