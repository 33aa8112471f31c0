//! AI summary inputs and derived artifacts.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One chat message submitted for summarization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryMessage {
    pub text: String,
    pub timestamp: String,
    pub sender: String,
}

impl SummaryMessage {
    pub fn new(
        text: impl Into<String>,
        timestamp: impl Into<String>,
        sender: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            timestamp: timestamp.into(),
            sender: sender.into(),
        }
    }
}

/// Prose summary of a single chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSummary {
    #[serde(alias = "text")]
    pub summary: String,
}

/// Summary of an arbitrary message batch, optionally with extracted tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSummary {
    #[serde(alias = "text")]
    pub summary: String,
    #[serde(default, alias = "action_items")]
    pub tasks: Vec<ExtractedTask>,
}

/// A task pulled out of a message batch.
///
/// The backend emits either bare strings or objects; both decode here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TaskRepr")]
pub struct ExtractedTask {
    pub description: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TaskRepr {
    Text(String),
    Object {
        #[serde(alias = "task", alias = "title")]
        description: String,
    },
}

impl From<TaskRepr> for ExtractedTask {
    fn from(value: TaskRepr) -> Self {
        match value {
            TaskRepr::Text(description) | TaskRepr::Object { description } => Self { description },
        }
    }
}

/// Entry in the AI conversation listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiConversationRef {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiMessage {
    pub role: String,
    pub content: String,
}

/// Full detail of one AI conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiConversation {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub messages: Vec<AiMessage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The listing endpoint answers with either a bare array or a wrapped one.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AiConversationList {
    Bare(Vec<AiConversationRef>),
    Wrapped {
        conversations: Vec<AiConversationRef>,
    },
}

impl AiConversationList {
    #[must_use]
    pub fn into_vec(self) -> Vec<AiConversationRef> {
        match self {
            AiConversationList::Bare(items) | AiConversationList::Wrapped { conversations: items } => {
                items
            }
        }
    }
}

fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}
