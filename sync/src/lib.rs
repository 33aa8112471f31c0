//! Client-side synchronization layer for Tether.
//!
//! # Architecture
//!
//! - [`RequestTracker`] - Request state machine shared by every hook:
//!   generation counter, abortable in-flight requests, dispose-on-unmount.
//! - [`status`] - Hooks that keep a cached value in sync with the server
//!   (mute flag, read flag, unread count) plus their write-side companions.
//! - [`actions`] - Fire-and-report hooks that only surface pass/fail.
//! - [`summary`] - AI summary hooks. These record error state *and* return
//!   the error to the caller.
//! - [`FetchedHistory`] - Per-conversation "history loaded" flags.
//! - [`FocusModeProvider`] - Shared focus-mode toggle.
//! - [`Session`] - Owns all of the above for one signed-in user.
//!
//! # Concurrency
//!
//! Hook methods take `&self` and may overlap. Only the most recently issued
//! invocation of a hook writes its state; see [`tracker`] for the details.

pub mod actions;
mod fetched;
mod focus;
mod session;
pub mod status;
pub mod summary;
pub mod tracker;

pub use actions::{AddBookmark, JoinWaitlist, MarkAllChatsRead, MarkAllMessagesRead, MarkAsRead};
pub use fetched::FetchedHistory;
pub use focus::{FocusModeError, FocusModeHandle, FocusModeProvider};
pub use session::Session;
pub use status::{MuteStatus, ReadStatus, SetReadStatus, ToggleMute, UnreadCount};
pub use summary::{AiConversations, ChatSummaryHook, SummarizeMessages};
pub use tracker::RequestTracker;

use tether_types::{RequestFlags, RequestState};

/// Common surface of every hook: its request state and an unmount signal.
pub trait Hook {
    type Output: Clone;

    fn tracker(&self) -> &RequestTracker<Self::Output>;

    fn state(&self) -> RequestState<Self::Output> {
        self.tracker().state()
    }

    /// `{loading, error, success}` for rendering.
    fn flags(&self) -> RequestFlags {
        self.tracker().flags()
    }

    fn is_loading(&self) -> bool {
        self.tracker().is_loading()
    }

    /// Abort in-flight requests and ignore anything that settles later.
    fn dispose(&self) {
        self.tracker().dispose();
    }
}
