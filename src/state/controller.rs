//! Drives one send from user text to a settled assistant bubble.
//!
//! The controller owns no conversation state. Everything observable lives in
//! the [`Session`], which the controller mutates in short steps between
//! awaits, so a concurrent `cancel` or render pass never waits on the network.

use std::sync::Arc;

use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::session::{PendingSend, Session};
use crate::completion::{ChatReply, CompletionClient, FragmentStream, StreamEnd};
use crate::error::{MentorError, MentorResult, SendRejection};
use crate::models::{ChatMessage, ChatOptions};
use crate::prompt::SystemPromptBuilder;
use crate::retry::RetryPolicy;
use crate::traits::{ConfigProvider, HttpClient};

/// Shown in the placeholder when a send fails before any text arrived.
pub const FAILURE_NOTICE: &str = "抱歉，生成被中断或发生错误。";

/// How a send that did not fail came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Completed,
    Cancelled,
}

/// A reply that got far enough to be worth keeping.
enum Opened {
    Complete(String),
    Stream {
        first: Option<String>,
        rest: FragmentStream,
    },
}

pub struct SessionController<H, C> {
    client: CompletionClient<H, C>,
    retry: RetryPolicy,
    prompt: Box<dyn SystemPromptBuilder>,
}

impl<H: HttpClient, C: ConfigProvider> SessionController<H, C> {
    pub fn new(client: CompletionClient<H, C>, prompt: impl SystemPromptBuilder + 'static) -> Self {
        Self {
            client,
            retry: RetryPolicy::default(),
            prompt: Box::new(prompt),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn client(&self) -> &CompletionClient<H, C> {
        &self.client
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Send `text` as the next user message and stream the reply into the
    /// session.
    ///
    /// Rejected sends leave the session untouched. Cancellation is not an
    /// error: it resolves to [`SendOutcome::Cancelled`] with whatever text had
    /// arrived kept in the settled bubble.
    pub async fn send(
        &self,
        session: &Session,
        text: &str,
        options: ChatOptions,
    ) -> MentorResult<SendOutcome> {
        let pending = session.begin_send(text).map_err(MentorError::Rejected)?;
        self.run(session, pending, options).await
    }

    /// Resend the most recent prompt, typically after a failure.
    pub async fn retry_last(
        &self,
        session: &Session,
        options: ChatOptions,
    ) -> MentorResult<SendOutcome> {
        let text = session
            .last_prompt()
            .ok_or(MentorError::Rejected(SendRejection::NothingToRetry))?;
        self.send(session, &text, options).await
    }

    /// Replace an assistant reply: the log is cut back to before the user
    /// message that prompted it, and that message is sent again.
    pub async fn regenerate(
        &self,
        session: &Session,
        assistant_id: &str,
        options: ChatOptions,
    ) -> MentorResult<SendOutcome> {
        let pending = session
            .begin_regenerate(assistant_id)
            .map_err(MentorError::Rejected)?;
        self.run(session, pending, options).await
    }

    /// Stop the in-flight send, if any.
    pub fn cancel(&self, session: &Session) -> bool {
        session.cancel()
    }

    async fn run(
        &self,
        session: &Session,
        pending: PendingSend,
        options: ChatOptions,
    ) -> MentorResult<SendOutcome> {
        let options = options
            .with_system_prompt(self.prompt.build())
            .with_cancel(pending.token.clone());

        // Dropping `pending` releases the session, also when this future is
        // dropped mid-await
        let result = self.drive(session, &pending, &options).await;
        drop(pending);
        result
    }

    async fn drive(
        &self,
        session: &Session,
        pending: &PendingSend,
        options: &ChatOptions,
    ) -> MentorResult<SendOutcome> {
        let id = pending.placeholder_id.as_str();

        let mut messages = pending.history.clone();
        messages.push(ChatMessage::user(pending.text.as_str()));

        let opened = {
            let messages = &messages;
            self.retry
                .with_retry(Some(&pending.token), move |attempt| {
                    debug!("Opening reply {} (attempt {})", id, attempt + 1);
                    self.open(messages, options)
                })
                .await
        };

        let (first, mut rest) = match opened {
            Ok(Opened::Complete(content)) => {
                session.settle_with(id, &content);
                info!("Reply {} settled ({} bytes)", id, content.len());
                return Ok(SendOutcome::Completed);
            }
            Ok(Opened::Stream { first, rest }) => (first, rest),
            Err(MentorError::Cancelled) => {
                session.settle(id);
                info!("Reply {} cancelled before any text", id);
                return Ok(SendOutcome::Cancelled);
            }
            Err(err) => {
                warn!("Reply {} failed before any text: {}", id, err);
                session.settle_with(id, FAILURE_NOTICE);
                session.record_error(&err);
                return Err(err);
            }
        };

        if let Some(fragment) = first {
            session.append_fragment(id, &fragment);
        }

        while let Some(item) = rest.next().await {
            match item {
                Ok(fragment) => {
                    session.append_fragment(id, &fragment);
                }
                Err(err) => {
                    warn!("Reply {} broke off mid-stream: {}", id, err);
                    session.settle(id);
                    session.record_error(&err);
                    return Err(err);
                }
            }
        }

        session.settle(id);
        let outcome = match rest.end() {
            Some(StreamEnd::Cancelled) => SendOutcome::Cancelled,
            _ => SendOutcome::Completed,
        };
        info!("Reply {} settled ({:?})", id, outcome);
        Ok(outcome)
    }

    /// One attempt: open the reply and, when streaming, pull its first item
    /// so that an early body failure is retried like a failed request.
    async fn open(&self, messages: &[ChatMessage], options: &ChatOptions) -> MentorResult<Opened> {
        match self.client.send(messages, options).await? {
            ChatReply::Complete(result) => Ok(Opened::Complete(result.content)),
            ChatReply::Stream(mut rest) => match rest.next().await {
                Some(Ok(fragment)) => Ok(Opened::Stream {
                    first: Some(fragment),
                    rest,
                }),
                Some(Err(err)) => Err(err),
                None => Ok(Opened::Stream { first: None, rest }),
            },
        }
    }
}

impl<H, C> SessionController<H, C>
where
    H: HttpClient + 'static,
    C: ConfigProvider + 'static,
{
    /// Run [`send`](Self::send) on its own task.
    pub fn spawn_send(
        self: &Arc<Self>,
        session: Session,
        text: String,
        options: ChatOptions,
    ) -> JoinHandle<MentorResult<SendOutcome>> {
        let controller = Arc::clone(self);
        tokio::spawn(async move { controller.send(&session, &text, options).await })
    }
}
