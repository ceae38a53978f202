//! Turning model completions into candidate transform bodies.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::errors::SessionError;
use crate::llm::ModelClient;
use crate::session::Candidate;
use crate::thread::PromptThread;

const FENCE: &str = "```";

/// Produces transform source from the conversation so far.
#[async_trait]
pub trait DraftGenerator: Send + Sync {
    /// Ask for the next transform body.
    ///
    /// `candidates` are the bodies already produced, in order; they are
    /// rendered as the assistant turns between corrections.
    /// Returns [`SessionError::DraftEmpty`] when the reply carries no code.
    async fn generate(
        &self,
        thread: &PromptThread,
        candidates: &[Candidate],
    ) -> Result<String, SessionError>;
}

/// Draft generator backed by a chat model.
pub struct LlmDraftGenerator {
    client: Arc<dyn ModelClient>,
}

impl LlmDraftGenerator {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DraftGenerator for LlmDraftGenerator {
    async fn generate(
        &self,
        thread: &PromptThread,
        candidates: &[Candidate],
    ) -> Result<String, SessionError> {
        let messages = thread.render_for_model(candidates);
        let reply = self.client.complete(&messages).await?;
        debug!(reply_len = reply.len(), "model replied");
        extract_transform(&reply)
    }
}

/// Pull the transform body out of a model reply.
///
/// With a fenced block, the text between the first and last fence is
/// taken and a language tag on the opening fence line is dropped. A lone
/// trailing fence after code keeps the code before it. Without a fence,
/// the reply is accepted verbatim only if it has an import.
pub fn extract_transform(reply: &str) -> Result<String, SessionError> {
    let body = match reply.find(FENCE) {
        Some(open) => {
            let after_open = open + FENCE.len();
            match reply.rfind(FENCE).filter(|&c| c >= after_open) {
                Some(close) => strip_language_tag(&reply[after_open..close]),
                None => {
                    let before = &reply[..open];
                    let after = strip_language_tag(&reply[after_open..]);
                    if after.trim().is_empty() && has_import(before) {
                        before
                    } else {
                        after
                    }
                }
            }
        }
        None if has_import(reply) => reply,
        None => return Err(SessionError::DraftEmpty),
    };

    let body = body.trim();
    if body.is_empty() {
        return Err(SessionError::DraftEmpty);
    }
    Ok(body.to_string())
}

/// Drop the remainder of the opening fence line when it is a bare tag.
fn strip_language_tag(inner: &str) -> &str {
    let Some((first, rest)) = inner.split_once('\n') else {
        return inner;
    };
    let tag = first.trim();
    let is_tag = !tag.is_empty()
        && tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '+' | '_' | '.'));
    if is_tag {
        rest
    } else {
        inner
    }
}

fn has_import(text: &str) -> bool {
    text.lines().any(|line| {
        let line = line.trim_start();
        line.starts_with("import ") || line.contains("require(")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::JscodeshiftProfile;
    use crate::llm::{ChatMessage, ChatRole};
    use codemod_oracles::Example;
    use mockall::mock;

    mock! {
        pub Model {}

        #[async_trait]
        impl ModelClient for Model {
            async fn complete(&self, messages: &[ChatMessage]) -> Result<String, SessionError>;
        }
    }

    #[test]
    fn extracts_fenced_block_and_drops_tag() {
        let reply = "Here you go:\n```typescript\nimport x from 'y';\nexport default x;\n```\nEnjoy.";
        assert_eq!(
            extract_transform(reply).unwrap(),
            "import x from 'y';\nexport default x;"
        );
    }

    #[test]
    fn spans_first_to_last_fence() {
        let reply = "```ts\nconst a = `x`;\n```\nmore\n```\nconst b = 1;\n```";
        let body = extract_transform(reply).unwrap();
        assert!(body.starts_with("const a = `x`;"));
        assert!(body.ends_with("const b = 1;"));
    }

    #[test]
    fn keeps_first_line_when_it_is_code() {
        let reply = "```\nimport j from 'jscodeshift';\n```";
        assert_eq!(extract_transform(reply).unwrap(), "import j from 'jscodeshift';");
    }

    #[test]
    fn unterminated_fence_takes_the_rest() {
        let reply = "```js\nimport a from 'b';";
        assert_eq!(extract_transform(reply).unwrap(), "import a from 'b';");
    }

    #[test]
    fn code_before_lone_trailing_fence_is_kept() {
        let reply = "import a from 'b';\nexport default a;\n```";
        assert_eq!(
            extract_transform(reply).unwrap(),
            "import a from 'b';\nexport default a;"
        );
    }

    #[test]
    fn single_word_code_line_is_not_a_tag() {
        let reply = "```\nfoo\nbar\n```";
        assert_eq!(extract_transform(reply).unwrap(), "foo\nbar");
    }

    #[test]
    fn bare_code_with_import_is_accepted() {
        let reply = "import type { API } from 'jscodeshift';\nexport default function t() {}\n";
        assert_eq!(extract_transform(reply).unwrap(), reply.trim());
    }

    #[test]
    fn prose_without_code_is_empty() {
        let err = extract_transform("I cannot help with that.").unwrap_err();
        assert!(matches!(err, SessionError::DraftEmpty));
        assert!(matches!(
            extract_transform("```ts\n\n```").unwrap_err(),
            SessionError::DraftEmpty
        ));
    }

    #[tokio::test]
    async fn generator_sends_rendered_thread() {
        let mut model = MockModel::new();
        model
            .expect_complete()
            .withf(|messages| {
                messages.len() == 2
                    && messages[0].role == ChatRole::System
                    && messages[1].role == ChatRole::User
            })
            .times(1)
            .returning(|_| Ok("```ts\nimport a from 'b';\n```".to_string()));

        let generator = LlmDraftGenerator::new(Arc::new(model));
        let thread = PromptThread::start(&JscodeshiftProfile, &Example::new("a", "b"));
        let body = generator.generate(&thread, &[]).await.unwrap();
        assert_eq!(body, "import a from 'b';");
    }

    #[tokio::test]
    async fn generator_propagates_model_failure() {
        let mut model = MockModel::new();
        model
            .expect_complete()
            .times(1)
            .returning(|_| Err(SessionError::Timeout(60)));

        let generator = LlmDraftGenerator::new(Arc::new(model));
        let thread = PromptThread::start(&JscodeshiftProfile, &Example::new("a", "b"));
        let err = generator.generate(&thread, &[]).await.unwrap_err();
        assert!(matches!(err, SessionError::Timeout(60)));
    }
}
