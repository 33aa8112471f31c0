//! "History already loaded" flags, one per conversation.
//!
//! Volatile: the set lives as long as the owning [`Session`](crate::Session)
//! and is cleared on sign-out. There is no expiry and no capacity bound.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tether_types::ConversationId;

#[derive(Debug, Default)]
pub struct FetchedHistory {
    fetched: Mutex<HashSet<ConversationId>>,
}

impl FetchedHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<ConversationId>> {
        self.fetched.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Idempotent.
    pub fn mark_fetched(&self, id: &ConversationId) {
        self.lock().insert(id.clone());
    }

    #[must_use]
    pub fn is_fetched(&self, id: &ConversationId) -> bool {
        self.lock().contains(id)
    }

    pub fn reset_all(&self) {
        let mut fetched = self.lock();
        let cleared = fetched.len();
        fetched.clear();
        tracing::debug!(cleared, "Reset fetched history flags");
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Run `loader` unless the conversation's history is already loaded.
    ///
    /// Returns `Ok(true)` when the loader ran. The flag is set only after the
    /// loader succeeds, so a failed load is retried on the next open.
    ///
    /// The check and the mark are not one atomic step: two overlapping calls
    /// for the same id both see "not fetched" and both run their loader.
    /// Callers serialize opens of a single conversation, which the UI does by
    /// opening one conversation at a time.
    pub async fn ensure_loaded<F, Fut, E>(&self, id: &ConversationId, loader: F) -> Result<bool, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        if self.is_fetched(id) {
            return Ok(false);
        }
        loader().await?;
        self.mark_fetched(id);
        Ok(true)
    }
}
