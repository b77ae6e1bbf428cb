//! Chat session state
//!
//! A [`Session`] is a cheap, cloneable handle to one conversation. All state
//! sits behind a mutex that is never held across an await, so readers and
//! `cancel` can run from other tasks while a reply is streaming.
//!
//! - LastError: the most recent failed send

mod last_error;

pub use last_error::LastError;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

use crate::error::{MentorError, SendRejection};
use crate::models::{BubbleRole, ChatBubble, ChatMessage};
use crate::view_state::RowFingerprint;

/// Greeting used when a session is opened without one.
pub const DEFAULT_GREETING: &str =
    "我是您的专属 AI 伴侣，随时为您提供温暖的心理陪伴与温和的情绪疏导";

#[derive(Debug, Default)]
struct SessionState {
    bubbles: Vec<ChatBubble>,
    sending: bool,
    /// Token of the in-flight send; `None` when idle
    cancel: Option<CancellationToken>,
    last_error: Option<LastError>,
    last_prompt: Option<String>,
    /// Bumped by every send that starts
    generation: u64,
}

/// Everything the controller needs to drive one send.
///
/// Dropping it ends the send: the placeholder is frozen and the
/// single-flight guard released, even if the driving future was dropped
/// part way through.
#[derive(Debug)]
pub(crate) struct PendingSend {
    pub text: String,
    pub placeholder_id: String,
    pub token: CancellationToken,
    /// Prior conversation, oldest first, without the new bubbles
    pub history: Vec<ChatMessage>,
    _guard: SendGuard,
}

#[derive(Debug)]
struct SendGuard {
    session: Session,
    generation: u64,
    placeholder_id: String,
}

impl Drop for SendGuard {
    fn drop(&mut self) {
        self.session.release(self.generation, &self.placeholder_id);
    }
}

/// Handle to one chat session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    inner: Arc<Mutex<SessionState>>,
}

impl Session {
    /// An empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// A session opened with a settled greeting from the assistant.
    ///
    /// The greeting is shown but never sent to the model.
    pub fn with_greeting(text: impl Into<String>) -> Self {
        let session = Self::new();
        session.state().bubbles.push(ChatBubble::greeting(text));
        session
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ============= Read accessors =============

    /// Snapshot of the ordered bubble list.
    pub fn bubbles(&self) -> Vec<ChatBubble> {
        self.state().bubbles.clone()
    }

    pub fn bubble(&self, id: &str) -> Option<ChatBubble> {
        self.state().bubbles.iter().find(|b| b.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.state().bubbles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().bubbles.is_empty()
    }

    /// Whether a send is in flight.
    pub fn is_sending(&self) -> bool {
        self.state().sending
    }

    pub fn last_bubble(&self) -> Option<ChatBubble> {
        self.state().bubbles.last().cloned()
    }

    /// The bubble currently streaming, if any.
    pub fn streaming_bubble(&self) -> Option<ChatBubble> {
        self.state().bubbles.iter().rev().find(|b| b.streaming).cloned()
    }

    pub fn last_error(&self) -> Option<LastError> {
        self.state().last_error.clone()
    }

    /// Text of the most recent send, for retrying it.
    pub fn last_prompt(&self) -> Option<String> {
        self.state().last_prompt.clone()
    }

    /// Per-row change fingerprints, without copying any content.
    pub fn row_fingerprints(&self) -> Vec<RowFingerprint> {
        self.state().bubbles.iter().map(RowFingerprint::of).collect()
    }

    // ============= Mutators =============

    /// Clear the conversation and the last error.
    pub fn reset(&self) -> Result<(), SendRejection> {
        let mut state = self.state();
        if state.sending {
            return Err(SendRejection::AlreadySending);
        }
        state.bubbles.clear();
        state.last_error = None;
        state.last_prompt = None;
        Ok(())
    }

    /// Signal the in-flight send to stop. Returns whether there was one.
    ///
    /// Safe to call any number of times, including after the reply settled.
    pub fn cancel(&self) -> bool {
        match &self.state().cancel {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Start a send: validate, mark sending, append the user bubble and the
    /// placeholder, and capture the history that precedes them.
    pub(crate) fn begin_send(&self, text: &str) -> Result<PendingSend, SendRejection> {
        let mut state = self.state();
        start_send(self, &mut state, text)
    }

    /// Drop the assistant bubble `assistant_id`, its prompting user bubble,
    /// and everything after them, then start a send of that user text.
    pub(crate) fn begin_regenerate(&self, assistant_id: &str) -> Result<PendingSend, SendRejection> {
        let mut state = self.state();
        if state.sending {
            return Err(SendRejection::AlreadySending);
        }

        let index = state
            .bubbles
            .iter()
            .position(|b| b.id == assistant_id)
            .ok_or(SendRejection::NotRegenerable)?;
        if index == 0
            || state.bubbles[index].role != BubbleRole::Assistant
            || state.bubbles[index].is_greeting()
        {
            return Err(SendRejection::NotRegenerable);
        }

        let prompt = &state.bubbles[index - 1];
        if prompt.role != BubbleRole::User {
            return Err(SendRejection::NotRegenerable);
        }
        let text = prompt.content.clone();

        state.bubbles.truncate(index - 1);
        start_send(self, &mut state, &text)
    }

    /// Append a fragment to the pending placeholder.
    pub(crate) fn append_fragment(&self, placeholder_id: &str, fragment: &str) -> bool {
        let mut state = self.state();
        find_mut(&mut state.bubbles, placeholder_id)
            .map(|bubble| bubble.append_fragment(fragment))
            .unwrap_or(false)
    }

    /// Assign the content of a pending placeholder and settle it in one step.
    pub(crate) fn settle_with(&self, placeholder_id: &str, content: &str) {
        let mut state = self.state();
        if let Some(bubble) = find_mut(&mut state.bubbles, placeholder_id) {
            bubble.replace_content(content);
            bubble.settle();
        }
    }

    /// Freeze the placeholder with whatever it holds.
    pub(crate) fn settle(&self, placeholder_id: &str) {
        let mut state = self.state();
        if let Some(bubble) = find_mut(&mut state.bubbles, placeholder_id) {
            bubble.settle();
        }
    }

    pub(crate) fn record_error(&self, error: &MentorError) {
        self.state().last_error = Some(LastError::new(error.clone()));
    }

    /// Settle the placeholder of send `generation` and release the
    /// single-flight guard, unless a later send already took it over.
    fn release(&self, generation: u64, placeholder_id: &str) {
        let mut state = self.state();
        if state.generation != generation {
            return;
        }
        if let Some(bubble) = find_mut(&mut state.bubbles, placeholder_id) {
            bubble.settle();
        }
        state.sending = false;
        state.cancel = None;
    }
}

fn start_send(
    session: &Session,
    state: &mut SessionState,
    text: &str,
) -> Result<PendingSend, SendRejection> {
    let text = text.trim();
    if text.is_empty() {
        return Err(SendRejection::EmptyText);
    }
    if state.sending {
        return Err(SendRejection::AlreadySending);
    }

    let history = state
        .bubbles
        .iter()
        .filter(|b| !b.is_greeting() && !b.content.is_empty())
        .map(ChatBubble::to_chat_message)
        .collect();

    let token = CancellationToken::new();
    state.sending = true;
    state.cancel = Some(token.clone());
    state.last_error = None;
    state.last_prompt = Some(text.to_string());
    state.generation += 1;

    let placeholder = ChatBubble::placeholder();
    let placeholder_id = placeholder.id.clone();
    state.bubbles.push(ChatBubble::user(text));
    state.bubbles.push(placeholder);

    Ok(PendingSend {
        text: text.to_string(),
        placeholder_id: placeholder_id.clone(),
        token,
        history,
        _guard: SendGuard {
            session: session.clone(),
            generation: state.generation,
            placeholder_id,
        },
    })
}

/// The placeholder is almost always the last bubble, so search from the end.
fn find_mut<'a>(bubbles: &'a mut [ChatBubble], id: &str) -> Option<&'a mut ChatBubble> {
    bubbles.iter_mut().rev().find(|b| b.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageRole;

    #[test]
    fn test_new_session_is_empty() {
        let session = Session::new();
        assert!(session.is_empty());
        assert!(!session.is_sending());
        assert!(session.last_error().is_none());
        assert!(!session.cancel());
    }

    #[test]
    fn test_greeting_session() {
        let session = Session::with_greeting(DEFAULT_GREETING);
        let bubbles = session.bubbles();
        assert_eq!(bubbles.len(), 1);
        assert!(bubbles[0].is_greeting());
        assert!(!bubbles[0].streaming);
    }

    #[test]
    fn test_begin_send_appends_user_and_placeholder() {
        let session = Session::new();
        let pending = session.begin_send("  Hi  ").unwrap();

        assert!(session.is_sending());
        assert_eq!(pending.text, "Hi");
        assert!(pending.history.is_empty());

        let bubbles = session.bubbles();
        assert_eq!(bubbles.len(), 2);
        assert_eq!(bubbles[0].role, BubbleRole::User);
        assert_eq!(bubbles[0].content, "Hi");
        assert_eq!(bubbles[1].id, pending.placeholder_id);
        assert!(bubbles[1].streaming);
        assert!(bubbles[1].content.is_empty());
        assert_eq!(session.last_prompt().as_deref(), Some("Hi"));
    }

    #[test]
    fn test_rejections_leave_log_untouched() {
        let session = Session::new();
        assert_eq!(
            session.begin_send("   ").unwrap_err(),
            SendRejection::EmptyText
        );
        assert!(session.is_empty());

        let _first = session.begin_send("first").unwrap();
        assert_eq!(
            session.begin_send("second").unwrap_err(),
            SendRejection::AlreadySending
        );
        assert_eq!(session.len(), 2);
        assert_eq!(session.reset(), Err(SendRejection::AlreadySending));
    }

    #[test]
    fn test_history_skips_greeting_and_empty_bubbles() {
        let session = Session::with_greeting("hello there");
        let first = session.begin_send("one").unwrap();
        session.append_fragment(&first.placeholder_id, "reply one");
        drop(first);

        let cancelled = session.begin_send("two").unwrap();
        drop(cancelled);

        let third = session.begin_send("three").unwrap();
        let roles: Vec<MessageRole> = third.history.iter().map(|m| m.role).collect();
        let contents: Vec<&str> = third.history.iter().map(|m| m.content.as_str()).collect();

        assert_eq!(
            roles,
            vec![MessageRole::User, MessageRole::Assistant, MessageRole::User]
        );
        assert_eq!(contents, vec!["one", "reply one", "two"]);
    }

    #[test]
    fn test_settled_placeholder_is_frozen() {
        let session = Session::new();
        let pending = session.begin_send("Hi").unwrap();
        assert!(session.append_fragment(&pending.placeholder_id, "partial"));
        session.settle(&pending.placeholder_id);

        assert!(!session.append_fragment(&pending.placeholder_id, " more"));
        session.settle_with(&pending.placeholder_id, "replaced");
        assert_eq!(
            session.bubble(&pending.placeholder_id).unwrap().content,
            "partial"
        );
    }

    #[test]
    fn test_cancel_signals_current_token_only_while_sending() {
        let session = Session::new();
        let pending = session.begin_send("Hi").unwrap();

        assert!(session.cancel());
        assert!(session.cancel());
        assert!(pending.token.is_cancelled());

        drop(pending);
        assert!(!session.cancel());

        // A new send gets a fresh token
        let next = session.begin_send("again").unwrap();
        assert!(!next.token.is_cancelled());
    }

    #[test]
    fn test_begin_regenerate_truncates() {
        let session = Session::new();
        let first = session.begin_send("one").unwrap();
        session.settle_with(&first.placeholder_id, "reply one");
        let first_id = first.placeholder_id.clone();
        drop(first);
        let second = session.begin_send("two").unwrap();
        session.settle_with(&second.placeholder_id, "reply two");
        drop(second);

        let pending = session.begin_regenerate(&first_id).unwrap();
        assert_eq!(pending.text, "one");
        assert!(pending.history.is_empty());

        let bubbles = session.bubbles();
        assert_eq!(bubbles.len(), 2);
        assert_eq!(bubbles[0].content, "one");
        assert!(bubbles[1].streaming);
    }

    #[test]
    fn test_begin_regenerate_rejections() {
        let session = Session::with_greeting("hi");
        let greeting_id = session.bubbles()[0].id.clone();
        assert_eq!(
            session.begin_regenerate(&greeting_id).unwrap_err(),
            SendRejection::NotRegenerable
        );
        assert_eq!(
            session.begin_regenerate("a-missing").unwrap_err(),
            SendRejection::NotRegenerable
        );

        let pending = session.begin_send("hello").unwrap();
        let user_id = session.bubbles()[1].id.clone();
        assert_eq!(
            session.begin_regenerate(&pending.placeholder_id).unwrap_err(),
            SendRejection::AlreadySending
        );
        drop(pending);
        assert_eq!(
            session.begin_regenerate(&user_id).unwrap_err(),
            SendRejection::NotRegenerable
        );
    }

    #[test]
    fn test_reset_clears_log_and_error() {
        let session = Session::new();
        let pending = session.begin_send("Hi").unwrap();
        session.record_error(&MentorError::Cancelled);
        drop(pending);

        assert!(session.last_error().is_some());
        session.reset().unwrap();
        assert!(session.is_empty());
        assert!(session.last_error().is_none());
    }

    #[test]
    fn test_dropping_pending_send_settles_and_releases() {
        let session = Session::new();
        let pending = session.begin_send("Hi").unwrap();
        session.append_fragment(&pending.placeholder_id, "half a th");
        let id = pending.placeholder_id.clone();
        drop(pending);

        assert!(!session.is_sending());
        assert!(!session.cancel());
        let reply = session.bubble(&id).unwrap();
        assert_eq!(reply.content, "half a th");
        assert!(!reply.streaming);
        assert!(session.begin_send("again").is_ok());
    }

    #[test]
    fn test_stale_pending_send_does_not_release_newer_one() {
        let session = Session::new();
        let first = session.begin_send("one").unwrap();
        // Hand-release so a second send can start while `first` lives on
        session.release(1, &first.placeholder_id);
        let second = session.begin_send("two").unwrap();

        drop(first);
        assert!(session.is_sending());
        assert!(session.bubble(&second.placeholder_id).unwrap().streaming);

        drop(second);
        assert!(!session.is_sending());
    }

    #[test]
    fn test_row_fingerprints() {
        let session = Session::new();
        let pending = session.begin_send("Hi").unwrap();
        session.append_fragment(&pending.placeholder_id, "abc");

        let fingerprints = session.row_fingerprints();
        assert_eq!(fingerprints.len(), 2);
        assert_eq!(fingerprints[1].id, pending.placeholder_id);
        assert!(fingerprints[1].streaming);
        assert_eq!(fingerprints[1].content_len, 3);
    }
}
