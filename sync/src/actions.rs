//! Fire-and-report hooks.
//!
//! Each hook exposes one asynchronous action returning `true` on success and
//! `false` on failure; the failure text is kept in the hook's
//! [`flags`](crate::Hook::flags). Nothing from the response body is retained.
//!
//! None of these operations are idempotent on the server. Calling
//! [`AddBookmark::add`] twice may create two bookmarks.

use std::future::Future;

use serde_json::Value;

use tether_api::{ApiClient, ApiError, WaitlistEncoding};
use tether_types::{ChatSelection, ConversationId, MessageId, Platform};

use crate::{Hook, RequestTracker};

/// Run a write through `tracker`, keeping only whether it succeeded.
pub(crate) async fn perform<F>(
    tracker: &RequestTracker<()>,
    operation: &'static str,
    request: F,
) -> bool
where
    F: Future<Output = Result<Value, ApiError>>,
{
    match tracker.run(async { request.await.map(drop) }).await {
        Ok(()) => true,
        Err(err) if err.is_cancelled() => false,
        Err(err) => {
            tracing::warn!(operation, error = %err, "Request failed");
            false
        }
    }
}

macro_rules! action_hook {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            client: ApiClient,
            tracker: RequestTracker<()>,
        }

        impl $name {
            #[must_use]
            pub fn new(client: ApiClient) -> Self {
                Self {
                    client,
                    tracker: RequestTracker::new(),
                }
            }
        }

        impl Hook for $name {
            type Output = ();

            fn tracker(&self) -> &RequestTracker<()> {
                &self.tracker
            }
        }
    };
}

action_hook!(
    /// Marks one conversation read through the read-status route.
    MarkAsRead
);
action_hook!(MarkAllChatsRead);
action_hook!(
    /// Marks every message read in one or more conversations.
    MarkAllMessagesRead
);
action_hook!(AddBookmark);

impl MarkAsRead {
    pub async fn mark(&self, chat_id: &ConversationId, platform: Platform) -> bool {
        perform(
            &self.tracker,
            "mark_as_read",
            async { self.client.mark_chat_read(chat_id, platform).await.map(|_| Value::Null) },
        )
        .await
    }
}

impl MarkAllChatsRead {
    pub async fn mark_all(&self, platform: Platform) -> bool {
        perform(
            &self.tracker,
            "mark_all_chats_read",
            self.client.mark_all_chats_read(platform),
        )
        .await
    }
}

impl MarkAllMessagesRead {
    /// Accepts a single id or a list (`ChatSelection::from(vec![...])`).
    pub async fn mark_all(&self, platform: Platform, chats: impl Into<ChatSelection>) -> bool {
        let chats = chats.into();
        perform(
            &self.tracker,
            "mark_all_messages_read",
            self.client.mark_all_messages_read(platform, &chats),
        )
        .await
    }
}

impl AddBookmark {
    pub async fn add(&self, message_id: &MessageId, platform: Platform) -> bool {
        perform(
            &self.tracker,
            "add_bookmark",
            self.client.add_bookmark(message_id, platform),
        )
        .await
    }
}

/// Waitlist sign-up. Sent without credentials.
#[derive(Debug, Clone)]
pub struct JoinWaitlist {
    client: ApiClient,
    encoding: WaitlistEncoding,
    tracker: RequestTracker<()>,
}

impl JoinWaitlist {
    #[must_use]
    pub fn new(client: ApiClient, encoding: WaitlistEncoding) -> Self {
        Self {
            client,
            encoding,
            tracker: RequestTracker::new(),
        }
    }

    #[must_use]
    pub fn encoding(&self) -> WaitlistEncoding {
        self.encoding
    }

    pub async fn join(&self, email: &str) -> bool {
        let email = email.trim();
        perform(
            &self.tracker,
            "join_waitlist",
            self.client.join_waitlist(email, self.encoding),
        )
        .await
    }
}

impl Hook for JoinWaitlist {
    type Output = ();

    fn tracker(&self) -> &RequestTracker<()> {
        &self.tracker
    }
}
