//! Hooks that keep a cached value in step with the server.
//!
//! Getters ([`MuteStatus`], [`ReadStatus`], [`UnreadCount`]) fetch on
//! [`mount`](MuteStatus::mount) and on demand. A failed fetch keeps the last
//! good value; a value that was never fetched stays `None`.
//!
//! Setters ([`ToggleMute`], [`SetReadStatus`]) are separate hooks and never
//! touch a getter's cache. Callers refetch after a write when they need the
//! confirmed value.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tether_api::{ApiClient, ApiError};
use tether_types::{ConversationId, MessageId, Platform};

use crate::actions::perform;
use crate::{Hook, RequestTracker};

async fn refresh<T, F>(tracker: &RequestTracker<T>, operation: &'static str, request: F) -> Option<T>
where
    T: Clone,
    F: Future<Output = Result<T, ApiError>>,
{
    match tracker.run(request).await {
        Ok(_) => {}
        Err(err) if err.is_cancelled() => {}
        Err(err) => tracing::warn!(operation, error = %err, "Refresh failed, keeping cached value"),
    }
    tracker.value()
}

/// Key of a keyed getter. Shared between clones of the hook, so a key change
/// made through one clone is seen by all of them together with the new value.
#[derive(Debug)]
struct SharedKey<K>(Arc<Mutex<K>>);

impl<K> Clone for SharedKey<K> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<K: Clone + PartialEq> SharedKey<K> {
    fn new(key: K) -> Self {
        Self(Arc::new(Mutex::new(key)))
    }

    fn lock(&self) -> MutexGuard<'_, K> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn get(&self) -> K {
        self.lock().clone()
    }

    /// Swap in `key` and drop the cached value under the key lock. Returns
    /// `false` when the key was already current.
    fn replace<T: Clone>(&self, key: K, tracker: &RequestTracker<T>) -> bool {
        let mut current = self.lock();
        if *current == key {
            return false;
        }
        *current = key;
        tracker.clear_value();
        true
    }
}

/// Mute flag of one conversation.
#[derive(Debug, Clone)]
pub struct MuteStatus {
    client: ApiClient,
    chat_id: SharedKey<ConversationId>,
    tracker: RequestTracker<bool>,
}

impl MuteStatus {
    /// Unfetched hook. Most callers want [`MuteStatus::mount`].
    #[must_use]
    pub fn new(client: ApiClient, chat_id: ConversationId) -> Self {
        Self {
            client,
            chat_id: SharedKey::new(chat_id),
            tracker: RequestTracker::new(),
        }
    }

    pub async fn mount(client: ApiClient, chat_id: ConversationId) -> Self {
        let hook = Self::new(client, chat_id);
        hook.refetch().await;
        hook
    }

    #[must_use]
    pub fn conversation(&self) -> ConversationId {
        self.chat_id.get()
    }

    #[must_use]
    pub fn muted(&self) -> Option<bool> {
        self.tracker.value()
    }

    pub async fn refetch(&self) -> Option<bool> {
        let chat_id = self.chat_id.get();
        refresh(&self.tracker, "mute_status", async {
            self.client
                .mute_status(&chat_id)
                .await
                .map(|state| state.muted)
        })
        .await
    }

    /// Switch to another conversation and fetch its flag. The previous
    /// conversation's value is dropped, not carried over.
    pub async fn set_conversation(&self, chat_id: ConversationId) -> Option<bool> {
        if !self.chat_id.replace(chat_id, &self.tracker) {
            return self.muted();
        }
        self.refetch().await
    }
}

impl Hook for MuteStatus {
    type Output = bool;

    fn tracker(&self) -> &RequestTracker<bool> {
        &self.tracker
    }
}

/// Writes a mute flag. A failure means the write may not have taken effect.
#[derive(Debug, Clone)]
pub struct ToggleMute {
    client: ApiClient,
    tracker: RequestTracker<()>,
}

impl ToggleMute {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            tracker: RequestTracker::new(),
        }
    }

    pub async fn toggle(&self, chat_id: &ConversationId, platform: Platform, muted: bool) -> bool {
        perform(
            &self.tracker,
            "toggle_mute",
            self.client.set_mute(chat_id, platform, muted),
        )
        .await
    }
}

impl Hook for ToggleMute {
    type Output = ();

    fn tracker(&self) -> &RequestTracker<()> {
        &self.tracker
    }
}

/// Read flag of one conversation.
///
/// Fetching goes through the mark-read route, so every fetch also marks the
/// conversation read on the server. Don't mount this for conversations the
/// user has not opened.
#[derive(Debug, Clone)]
pub struct ReadStatus {
    client: ApiClient,
    key: SharedKey<(ConversationId, Platform)>,
    tracker: RequestTracker<bool>,
}

impl ReadStatus {
    #[must_use]
    pub fn new(client: ApiClient, chat_id: ConversationId, platform: Platform) -> Self {
        Self {
            client,
            key: SharedKey::new((chat_id, platform)),
            tracker: RequestTracker::new(),
        }
    }

    pub async fn mount(client: ApiClient, chat_id: ConversationId, platform: Platform) -> Self {
        let hook = Self::new(client, chat_id, platform);
        hook.refetch().await;
        hook
    }

    #[must_use]
    pub fn conversation(&self) -> (ConversationId, Platform) {
        self.key.get()
    }

    #[must_use]
    pub fn is_read(&self) -> Option<bool> {
        self.tracker.value()
    }

    pub async fn refetch(&self) -> Option<bool> {
        let (chat_id, platform) = self.key.get();
        refresh(&self.tracker, "read_status", async {
            self.client
                .mark_chat_read(&chat_id, platform)
                .await
                .map(|state| state.read)
        })
        .await
    }

    pub async fn set_conversation(
        &self,
        chat_id: ConversationId,
        platform: Platform,
    ) -> Option<bool> {
        if !self.key.replace((chat_id, platform), &self.tracker) {
            return self.is_read();
        }
        self.refetch().await
    }
}

impl Hook for ReadStatus {
    type Output = bool;

    fn tracker(&self) -> &RequestTracker<bool> {
        &self.tracker
    }
}

#[derive(Debug, Clone)]
pub struct SetReadStatus {
    client: ApiClient,
    tracker: RequestTracker<()>,
}

impl SetReadStatus {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            tracker: RequestTracker::new(),
        }
    }

    pub async fn set(&self, message_id: &MessageId, platform: Platform, read: bool) -> bool {
        perform(
            &self.tracker,
            "set_read_status",
            self.client.set_read_status(message_id, platform, read),
        )
        .await
    }
}

impl Hook for SetReadStatus {
    type Output = ();

    fn tracker(&self) -> &RequestTracker<()> {
        &self.tracker
    }
}

/// Unread total for one platform.
///
/// `None` means unknown: nothing has been fetched yet. After a failed refetch
/// the previous count is kept rather than zeroed.
#[derive(Debug, Clone)]
pub struct UnreadCount {
    client: ApiClient,
    platform: SharedKey<Platform>,
    tracker: RequestTracker<u64>,
}

impl UnreadCount {
    #[must_use]
    pub fn new(client: ApiClient, platform: Platform) -> Self {
        Self {
            client,
            platform: SharedKey::new(platform),
            tracker: RequestTracker::new(),
        }
    }

    pub async fn mount(client: ApiClient, platform: Platform) -> Self {
        let hook = Self::new(client, platform);
        hook.refetch().await;
        hook
    }

    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform.get()
    }

    #[must_use]
    pub fn count(&self) -> Option<u64> {
        self.tracker.value()
    }

    pub async fn refetch(&self) -> Option<u64> {
        let platform = self.platform.get();
        refresh(&self.tracker, "unread_count", async {
            self.client
                .unread_count(platform)
                .await
                .map(|unread| unread.count)
        })
        .await
    }

    pub async fn set_platform(&self, platform: Platform) -> Option<u64> {
        if !self.platform.replace(platform, &self.tracker) {
            return self.count();
        }
        self.refetch().await
    }
}

impl Hook for UnreadCount {
    type Output = u64;

    fn tracker(&self) -> &RequestTracker<u64> {
        &self.tracker
    }
}
