use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{kind} must not be empty")]
pub struct EmptyIdError {
    kind: &'static str,
}

/// Opaque key naming a chat or channel within a platform.
///
/// Identifiers are not namespaced by platform; callers pair them with a
/// [`Platform`](crate::Platform) when the distinction matters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Result<Self, EmptyIdError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(EmptyIdError {
                kind: "conversation id",
            });
        }
        Ok(Self(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ConversationId {
    type Error = EmptyIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ConversationId {
    type Error = EmptyIdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl FromStr for ConversationId {
    type Err = EmptyIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl From<ConversationId> for String {
    fn from(value: ConversationId) -> Self {
        value.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Result<Self, EmptyIdError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(EmptyIdError { kind: "message id" });
        }
        Ok(Self(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MessageId {
    type Error = EmptyIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for MessageId {
    type Error = EmptyIdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl FromStr for MessageId {
    type Err = EmptyIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl From<MessageId> for String {
    fn from(value: MessageId) -> Self {
        value.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One or more conversations addressed by a bulk operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatSelection {
    One(ConversationId),
    Many(Vec<ConversationId>),
}

impl ChatSelection {
    /// Render the selection the way the backend parses it: a single id, or a
    /// comma-separated list.
    #[must_use]
    pub fn to_wire(&self) -> String {
        match self {
            ChatSelection::One(id) => id.as_str().to_string(),
            ChatSelection::Many(ids) => ids
                .iter()
                .map(ConversationId::as_str)
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            ChatSelection::One(_) => 1,
            ChatSelection::Many(ids) => ids.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<ConversationId> for ChatSelection {
    fn from(value: ConversationId) -> Self {
        ChatSelection::One(value)
    }
}

impl From<Vec<ConversationId>> for ChatSelection {
    fn from(value: Vec<ConversationId>) -> Self {
        ChatSelection::Many(value)
    }
}
