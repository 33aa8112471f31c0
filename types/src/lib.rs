//! Core domain types for Tether.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

mod ids;
mod request;
mod summary;

pub use ids::{ChatSelection, ConversationId, EmptyIdError, MessageId};
pub use request::{RequestFlags, RequestState};
pub use summary::{
    AiConversation, AiConversationList, AiConversationRef, AiMessage, ChatSummary,
    ExtractedTask, MessageSummary, SummaryMessage,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Platform
// ============================================================================

/// Messaging platforms aggregated by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Discord,
    Tg,
}

#[derive(Debug, Error)]
#[error("unknown platform: {0}")]
pub struct PlatformParseError(String);

impl Platform {
    /// Tag sent to the backend in query strings and bodies.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Platform::Discord => "discord",
            Platform::Tg => "tg",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Platform::Discord => "Discord",
            Platform::Tg => "Telegram",
        }
    }

    #[must_use]
    pub const fn all() -> &'static [Platform] {
        &[Platform::Discord, Platform::Tg]
    }

    pub fn parse(s: &str) -> Result<Self, PlatformParseError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "discord" => Ok(Platform::Discord),
            "tg" | "telegram" => Ok(Platform::Tg),
            _ => Err(PlatformParseError(s.to_string())),
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = PlatformParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// Bearer credential attached to authenticated requests.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccessToken(<redacted>)")
    }
}

impl AccessToken {
    /// Returns `None` for a blank token so that an empty secret never turns
    /// into an `Authorization: Bearer ` header.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    #[must_use]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.0)
    }
}
