//! AI summary hooks.
//!
//! Unlike the status and action hooks, these return the error to the caller
//! in addition to recording it, so callers can layer their own handling.

use tether_api::{ApiClient, ApiError};
use tether_types::{
    AiConversation, ChatSummary, ConversationId, MessageSummary, Platform, SummaryMessage,
};

use crate::{Hook, RequestTracker};

fn log_failure(operation: &'static str, result: &Result<impl Sized, ApiError>) {
    if let Err(err) = result
        && !err.is_cancelled()
    {
        tracing::warn!(operation, error = %err, "Summary request failed");
    }
}

/// Summary of a single chat. Requires a stored access token.
#[derive(Debug, Clone)]
pub struct ChatSummaryHook {
    client: ApiClient,
    tracker: RequestTracker<ChatSummary>,
}

impl ChatSummaryHook {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            tracker: RequestTracker::new(),
        }
    }

    #[must_use]
    pub fn summary(&self) -> Option<ChatSummary> {
        self.tracker.value()
    }

    /// `minutes` limits the summary to the most recent window.
    ///
    /// Fails with [`ApiError::MissingToken`] before any network IO when no
    /// token is stored.
    pub async fn generate(
        &self,
        chat_id: &ConversationId,
        messages: &[SummaryMessage],
        chat_title: Option<&str>,
        minutes: Option<u32>,
    ) -> Result<ChatSummary, ApiError> {
        tracing::debug!(chat_id = %chat_id, messages = messages.len(), "Generating chat summary");
        let result = self
            .tracker
            .run(self.client.chat_summary(chat_id, messages, chat_title, minutes))
            .await;
        log_failure("chat_summary", &result);
        result
    }
}

impl Hook for ChatSummaryHook {
    type Output = ChatSummary;

    fn tracker(&self) -> &RequestTracker<ChatSummary> {
        &self.tracker
    }
}

/// Summary of an arbitrary message batch. Sent unauthenticated when no token
/// is stored.
#[derive(Debug, Clone)]
pub struct SummarizeMessages {
    client: ApiClient,
    tracker: RequestTracker<MessageSummary>,
}

impl SummarizeMessages {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            tracker: RequestTracker::new(),
        }
    }

    #[must_use]
    pub fn summary(&self) -> Option<MessageSummary> {
        self.tracker.value()
    }

    pub async fn summarize(
        &self,
        messages: &[SummaryMessage],
        extract_tasks: bool,
        platform: Platform,
    ) -> Result<MessageSummary, ApiError> {
        let result = self
            .tracker
            .run(self.client.summarize_messages(messages, extract_tasks, platform))
            .await;
        log_failure("summarize_messages", &result);
        result
    }
}

impl Hook for SummarizeMessages {
    type Output = MessageSummary;

    fn tracker(&self) -> &RequestTracker<MessageSummary> {
        &self.tracker
    }
}

/// Loads the most recent AI conversation: list, then the first entry's detail.
#[derive(Debug, Clone)]
pub struct AiConversations {
    client: ApiClient,
    tracker: RequestTracker<Option<AiConversation>>,
}

impl AiConversations {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            tracker: RequestTracker::new(),
        }
    }

    /// `Some(None)` once a fetch found no conversations.
    #[must_use]
    pub fn conversation(&self) -> Option<Option<AiConversation>> {
        self.tracker.value()
    }

    /// `Ok(None)` when the user has no conversations; the detail request is
    /// skipped in that case.
    pub async fn fetch(&self) -> Result<Option<AiConversation>, ApiError> {
        let result = self
            .tracker
            .run(async {
                let listing = self.client.list_ai_conversations().await?;
                let Some(first) = listing.first() else {
                    tracing::debug!("No AI conversations to load");
                    return Ok(None);
                };
                self.client.ai_conversation(&first.id).await.map(Some)
            })
            .await;
        log_failure("ai_conversations", &result);
        result
    }
}

impl Hook for AiConversations {
    type Output = Option<AiConversation>;

    fn tracker(&self) -> &RequestTracker<Option<AiConversation>> {
        &self.tracker
    }
}
