//! Retry prompt derivation and flavor transforms.
//!
//! A retry re-issues the inputs that produced an assistant turn. The inputs
//! come from the turn's recorded originals when present, otherwise from the
//! nearest preceding user message. Flavors are pure text transforms applied
//! once, before the request is sent.

use super::message::{ChatMode, ImagePayload};
use super::session::ConversationSession;

/// Instruction suffix for the add-details flavor.
const ADD_DETAILS_SUFFIX: &str =
    "\n\nPlease expand on your previous answer with more detail and examples.";

/// Instruction suffix for the more-concise flavor.
const MORE_CONCISE_SUFFIX: &str = "\n\nPlease answer more concisely this time.";

/// Instruction suffix for the think-longer flavor.
const THINK_LONGER_SUFFIX: &str =
    "\n\nTake more time to reason through the problem carefully before answering.";

/// The inputs a retry will resubmit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPrompt {
    pub query: String,
    pub images: Vec<ImagePayload>,
    pub mode: ChatMode,
}

/// How the retried query should differ from the original.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryFlavor {
    /// Resubmit unchanged.
    TryAgain,
    /// Append a fixed instruction asking for more detail.
    AddDetails,
    /// Append a fixed instruction asking for brevity.
    MoreConcise,
    /// Append a fixed instruction asking for more deliberate reasoning.
    ThinkLonger,
    /// Force search mode; query unchanged.
    SearchWeb,
    /// Replace the query entirely with caller-supplied text.
    Custom(String),
}

impl RetryFlavor {
    /// Applies this flavor's transform to a derived prompt.
    pub fn apply(&self, mut prompt: RetryPrompt) -> RetryPrompt {
        match self {
            RetryFlavor::TryAgain => {}
            RetryFlavor::AddDetails => prompt.query.push_str(ADD_DETAILS_SUFFIX),
            RetryFlavor::MoreConcise => prompt.query.push_str(MORE_CONCISE_SUFFIX),
            RetryFlavor::ThinkLonger => prompt.query.push_str(THINK_LONGER_SUFFIX),
            RetryFlavor::SearchWeb => prompt.mode = ChatMode::Search,
            RetryFlavor::Custom(text) => prompt.query = text.clone(),
        }
        prompt
    }
}

/// Derives the inputs for retrying the assistant turn at `index`.
///
/// Resolution order:
/// 1. the turn's recorded `original_query`/`original_images`/`original_mode`,
///    reused verbatim; a recording is authoritative, so an empty one never
///    falls through to the scan;
/// 2. else the nearest preceding user message's content and images.
///
/// Returns `None` when neither source yields a non-empty query and there are
/// no images; such a retry is a no-op and must not issue a request.
pub fn derive_retry_prompt(session: &ConversationSession, index: usize) -> Option<RetryPrompt> {
    let target = session.get(index)?;

    if let Some(query) = target.original_query() {
        let prompt = RetryPrompt {
            query: query.to_string(),
            images: target.original_images().to_vec(),
            mode: target.original_mode().unwrap_or(ChatMode::Default),
        };
        if prompt.query.trim().is_empty() && prompt.images.is_empty() {
            return None;
        }
        return Some(prompt);
    }

    let user = session.nearest_user_before(index)?;
    let prompt = RetryPrompt {
        query: user.content().to_string(),
        images: user.images().to_vec(),
        mode: ChatMode::Default,
    };
    if prompt.query.trim().is_empty() && prompt.images.is_empty() {
        return None;
    }
    Some(prompt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::message::ConversationMessage;

    fn prompt(query: &str) -> RetryPrompt {
        RetryPrompt {
            query: query.into(),
            images: Vec::new(),
            mode: ChatMode::Default,
        }
    }

    #[test]
    fn try_again_leaves_prompt_untouched() {
        let p = RetryFlavor::TryAgain.apply(prompt("why is the sky blue"));
        assert_eq!(p.query, "why is the sky blue");
        assert_eq!(p.mode, ChatMode::Default);
    }

    #[test]
    fn suffix_flavors_append_instruction() {
        for flavor in [
            RetryFlavor::AddDetails,
            RetryFlavor::MoreConcise,
            RetryFlavor::ThinkLonger,
        ] {
            let p = flavor.apply(prompt("explain monads"));
            assert!(p.query.starts_with("explain monads"));
            assert!(p.query.len() > "explain monads".len());
            assert_eq!(p.mode, ChatMode::Default, "suffix flavors keep mode");
        }
    }

    #[test]
    fn search_web_forces_mode_only() {
        let p = RetryFlavor::SearchWeb.apply(prompt("latest rustc release"));
        assert_eq!(p.query, "latest rustc release");
        assert_eq!(p.mode, ChatMode::Search);
    }

    #[test]
    fn custom_replaces_query() {
        let p = RetryFlavor::Custom("a different question".into()).apply(prompt("original"));
        assert_eq!(p.query, "a different question");
    }

    #[test]
    fn derivation_prefers_recorded_originals() {
        let mut session = ConversationSession::new();
        session.push(ConversationMessage::user("typed question", Vec::new()).unwrap());
        let mut assistant = ConversationMessage::assistant_placeholder();
        assistant.append_delta("answer");
        assistant.finalize(
            Vec::new(),
            Some("recorded question".into()),
            Vec::new(),
            Some(ChatMode::Search),
        );
        let id = session.push(assistant);

        let idx = session.index_of(id).unwrap();
        let p = derive_retry_prompt(&session, idx).unwrap();
        assert_eq!(p.query, "recorded question");
        assert_eq!(p.mode, ChatMode::Search);
    }

    #[test]
    fn derivation_falls_back_to_preceding_user_message() {
        let mut session = ConversationSession::new();
        session.push(ConversationMessage::user("fallback question", Vec::new()).unwrap());
        let id = session.push(ConversationMessage::assistant_placeholder());

        let idx = session.index_of(id).unwrap();
        let p = derive_retry_prompt(&session, idx).unwrap();
        assert_eq!(p.query, "fallback question");
        assert_eq!(p.mode, ChatMode::Default);
    }

    #[test]
    fn derivation_is_none_without_query_or_images() {
        let mut session = ConversationSession::new();
        // Lone assistant turn: no originals, no preceding user message.
        let id = session.push(ConversationMessage::assistant_placeholder());
        let idx = session.index_of(id).unwrap();
        assert!(derive_retry_prompt(&session, idx).is_none());
    }

    #[test]
    fn derivation_is_none_for_out_of_range_index() {
        let session = ConversationSession::new();
        assert!(derive_retry_prompt(&session, 5).is_none());
    }

    #[test]
    fn empty_recorded_originals_do_not_fall_back() {
        let mut session = ConversationSession::new();
        session.push(ConversationMessage::user("earlier question", Vec::new()).unwrap());
        let mut assistant = ConversationMessage::assistant_placeholder();
        assistant.finalize(Vec::new(), Some(String::new()), Vec::new(), Some(ChatMode::Default));
        let id = session.push(assistant);

        // The recording is authoritative: an empty one means this turn has
        // nothing to resubmit, not that an unrelated earlier query should
        // be reused.
        let idx = session.index_of(id).unwrap();
        assert!(derive_retry_prompt(&session, idx).is_none());
    }

    #[test]
    fn derivation_uses_original_images_without_query() {
        let mut session = ConversationSession::new();
        let mut assistant = ConversationMessage::assistant_placeholder();
        assistant.finalize(
            Vec::new(),
            Some(String::new()),
            vec![ImagePayload::from_bytes(b"img", "image/png")],
            Some(ChatMode::Default),
        );
        let id = session.push(assistant);

        let idx = session.index_of(id).unwrap();
        let p = derive_retry_prompt(&session, idx).unwrap();
        assert!(p.query.is_empty());
        assert_eq!(p.images.len(), 1);
    }
}
