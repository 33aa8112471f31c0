//! Session-scoped state for one signed-in user.

use std::sync::Arc;

use tether_api::{
    ApiClient, ApiClientConfig, ApiClientError, CredentialStore, MemoryCredentialStore,
    WaitlistEncoding,
};
use tether_types::{AccessToken, ConversationId, Platform};

use crate::{
    AddBookmark, AiConversations, ChatSummaryHook, FetchedHistory, FocusModeHandle,
    FocusModeProvider, JoinWaitlist, MarkAllChatsRead, MarkAllMessagesRead, MarkAsRead,
    MuteStatus, ReadStatus, SetReadStatus, SummarizeMessages, ToggleMute, UnreadCount,
};

/// Owns the API client, the credential store, the fetched-history flags and
/// the focus-mode flag. Hooks are created from here and share the client.
///
/// Nothing is global: two sessions never see each other's state.
#[derive(Debug)]
pub struct Session {
    client: ApiClient,
    credentials: Arc<MemoryCredentialStore>,
    fetched: Arc<FetchedHistory>,
    focus: FocusModeProvider,
    waitlist_encoding: WaitlistEncoding,
}

impl Session {
    pub fn new(config: ApiClientConfig, token: Option<AccessToken>) -> Result<Self, ApiClientError> {
        let credentials = Arc::new(MemoryCredentialStore::with_token(token));
        let client = ApiClient::new(config, credentials.clone())?;
        Ok(Self {
            client,
            credentials,
            fetched: Arc::new(FetchedHistory::new()),
            focus: FocusModeProvider::new(),
            waitlist_encoding: WaitlistEncoding::default(),
        })
    }

    #[must_use]
    pub fn with_waitlist_encoding(mut self, encoding: WaitlistEncoding) -> Self {
        self.waitlist_encoding = encoding;
        self
    }

    #[must_use]
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    #[must_use]
    pub fn fetched(&self) -> &Arc<FetchedHistory> {
        &self.fetched
    }

    #[must_use]
    pub fn focus_mode(&self) -> FocusModeHandle {
        self.focus.handle()
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.credentials.access_token().is_some()
    }

    /// Store a token delivered by the login flow.
    pub fn sign_in(&self, token: AccessToken) {
        self.credentials.set(token);
        tracing::info!("Signed in");
    }

    /// Forget the token and every fetched-history flag.
    pub fn sign_out(&self) {
        self.credentials.clear();
        self.fetched.reset_all();
        self.focus.set(false);
        tracing::info!("Signed out");
    }

    pub async fn mute_status(&self, chat_id: ConversationId) -> MuteStatus {
        MuteStatus::mount(self.client.clone(), chat_id).await
    }

    #[must_use]
    pub fn toggle_mute(&self) -> ToggleMute {
        ToggleMute::new(self.client.clone())
    }

    pub async fn read_status(&self, chat_id: ConversationId, platform: Platform) -> ReadStatus {
        ReadStatus::mount(self.client.clone(), chat_id, platform).await
    }

    #[must_use]
    pub fn set_read_status(&self) -> SetReadStatus {
        SetReadStatus::new(self.client.clone())
    }

    pub async fn unread_count(&self, platform: Platform) -> UnreadCount {
        UnreadCount::mount(self.client.clone(), platform).await
    }

    #[must_use]
    pub fn mark_as_read(&self) -> MarkAsRead {
        MarkAsRead::new(self.client.clone())
    }

    #[must_use]
    pub fn mark_all_chats_read(&self) -> MarkAllChatsRead {
        MarkAllChatsRead::new(self.client.clone())
    }

    #[must_use]
    pub fn mark_all_messages_read(&self) -> MarkAllMessagesRead {
        MarkAllMessagesRead::new(self.client.clone())
    }

    #[must_use]
    pub fn add_bookmark(&self) -> AddBookmark {
        AddBookmark::new(self.client.clone())
    }

    #[must_use]
    pub fn join_waitlist(&self) -> JoinWaitlist {
        JoinWaitlist::new(self.client.clone(), self.waitlist_encoding)
    }

    #[must_use]
    pub fn chat_summary(&self) -> ChatSummaryHook {
        ChatSummaryHook::new(self.client.clone())
    }

    #[must_use]
    pub fn summarize_messages(&self) -> SummarizeMessages {
        SummarizeMessages::new(self.client.clone())
    }

    #[must_use]
    pub fn ai_conversations(&self) -> AiConversations {
        AiConversations::new(self.client.clone())
    }
}
