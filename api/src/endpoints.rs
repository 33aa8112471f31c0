//! Typed wrappers for each backend route.
//!
//! | Operation | Method | Route | Body | Auth |
//! |---|---|---|---|---|
//! | [`add_bookmark`](ApiClient::add_bookmark) | POST | `/bookmarks` | JSON | optional |
//! | [`join_waitlist`](ApiClient::join_waitlist) | POST | `/waitlist/join` | form | none |
//! | [`chat_summary`](ApiClient::chat_summary) | POST | `/discord/chats/{id}/summary` | form | required |
//! | [`list_ai_conversations`](ApiClient::list_ai_conversations) | GET | `/v2/ai/conversations` | - | optional |
//! | [`ai_conversation`](ApiClient::ai_conversation) | GET | `/v2/ai/conversations/{id}` | - | optional |
//! | [`mute_status`](ApiClient::mute_status) | GET | `/chats/{id}/mute` | - | optional |
//! | [`set_mute`](ApiClient::set_mute) | POST | `/chats/{id}/mute` | JSON as form | optional |
//! | [`mark_chat_read`](ApiClient::mark_chat_read) | GET | `/chats/{id}/read?platform=` | - | optional |
//! | [`set_read_status`](ApiClient::set_read_status) | POST | `/chats/{message_id}/read` | JSON | optional |
//! | [`unread_count`](ApiClient::unread_count) | GET | `/unread-counts?platform=` | - | optional |
//! | [`mark_all_chats_read`](ApiClient::mark_all_chats_read) | POST | `/chats/mark-all-read` | JSON | optional |
//! | [`mark_all_messages_read`](ApiClient::mark_all_messages_read) | POST | `/messages/mark-all-read` | JSON as form | optional |
//! | [`summarize_messages`](ApiClient::summarize_messages) | POST | `/summarize-messages` | form | optional |

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use tether_types::{
    AiConversation, AiConversationList, AiConversationRef, ChatSelection, ChatSummary,
    ConversationId, MessageId, MessageSummary, Platform, SummaryMessage,
};

use crate::{ApiClient, ApiError, ApiRequest, ApiVersion, Auth, RequestBody};

/// Server-side mute flag for one conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MuteState {
    #[serde(alias = "is_muted", default)]
    pub muted: bool,
}

/// Read flag returned by the read-status route.
///
/// Fetching this marks the conversation as read, so a body without the field
/// reads as `true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadState {
    #[serde(alias = "is_read", default = "default_read")]
    pub read: bool,
}

const fn default_read() -> bool {
    true
}

/// Unread total for one platform. Unsigned, so a negative count from the
/// server is a decode error rather than a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCount {
    #[serde(alias = "unread_count", alias = "total")]
    pub count: u64,
}

/// How the waitlist email is encoded.
///
/// The backend has been called both ways; [`WaitlistEncoding::FormField`] is
/// the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitlistEncoding {
    /// `email=<address>` form field.
    #[default]
    #[serde(alias = "form")]
    FormField,
    /// `{"email": "<address>"}` sent under a form content type.
    Json,
}

fn messages_field(messages: &[SummaryMessage], operation: &'static str) -> Result<String, ApiError> {
    serde_json::to_string(messages).map_err(|e| ApiError::Decode {
        operation,
        detail: e.to_string(),
    })
}

impl ApiClient {
    pub async fn add_bookmark(
        &self,
        message_id: &MessageId,
        platform: Platform,
    ) -> Result<Value, ApiError> {
        let request = ApiRequest::post(&["bookmarks"], "Failed to add bookmark").body(
            RequestBody::Json(json!({
                "message_id": message_id.as_str(),
                "platform": platform.as_str(),
            })),
        );
        self.send(request).await
    }

    pub async fn join_waitlist(
        &self,
        email: &str,
        encoding: WaitlistEncoding,
    ) -> Result<Value, ApiError> {
        let body = match encoding {
            WaitlistEncoding::FormField => {
                RequestBody::Form(vec![("email".to_string(), email.to_string())])
            }
            WaitlistEncoding::Json => RequestBody::JsonAsForm(json!({ "email": email })),
        };
        let request = ApiRequest::post(&["waitlist", "join"], "Failed to join waitlist")
            .auth(Auth::None)
            .body(body);
        self.send(request).await
    }

    /// Messages travel as a JSON string inside a form field, next to the
    /// optional title and time window.
    pub async fn chat_summary(
        &self,
        chat_id: &ConversationId,
        messages: &[SummaryMessage],
        chat_title: Option<&str>,
        minutes: Option<u32>,
    ) -> Result<ChatSummary, ApiError> {
        const OPERATION: &str = "Failed to generate chat summary";
        let mut fields = vec![("messages".to_string(), messages_field(messages, OPERATION)?)];
        if let Some(title) = chat_title {
            fields.push(("chat_title".to_string(), title.to_string()));
        }
        if let Some(minutes) = minutes {
            fields.push(("minutes".to_string(), minutes.to_string()));
        }
        let request = ApiRequest::post(&["discord", "chats", chat_id.as_str(), "summary"], OPERATION)
            .auth(Auth::Required)
            .body(RequestBody::Form(fields));
        self.send(request).await
    }

    pub async fn list_ai_conversations(&self) -> Result<Vec<AiConversationRef>, ApiError> {
        let request = ApiRequest::get(&["ai", "conversations"], "Failed to fetch AI conversations")
            .version(ApiVersion::V2);
        let list: AiConversationList = self.send(request).await?;
        Ok(list.into_vec())
    }

    pub async fn ai_conversation(&self, id: &str) -> Result<AiConversation, ApiError> {
        let request = ApiRequest::get(
            &["ai", "conversations", id],
            "Failed to fetch AI conversation",
        )
        .version(ApiVersion::V2);
        self.send(request).await
    }

    pub async fn mute_status(&self, chat_id: &ConversationId) -> Result<MuteState, ApiError> {
        let request = ApiRequest::get(
            &["chats", chat_id.as_str(), "mute"],
            "Failed to fetch mute status",
        );
        self.send(request).await
    }

    pub async fn set_mute(
        &self,
        chat_id: &ConversationId,
        platform: Platform,
        muted: bool,
    ) -> Result<Value, ApiError> {
        let request = ApiRequest::post(
            &["chats", chat_id.as_str(), "mute"],
            "Failed to update mute status",
        )
        .body(RequestBody::JsonAsForm(json!({
            "platform": platform.as_str(),
            "muted": muted,
        })));
        self.send(request).await
    }

    /// Reading the status is itself a write: the server marks the chat read.
    pub async fn mark_chat_read(
        &self,
        chat_id: &ConversationId,
        platform: Platform,
    ) -> Result<ReadState, ApiError> {
        let request = ApiRequest::get(
            &["chats", chat_id.as_str(), "read"],
            "Failed to mark chat as read",
        )
        .query("platform", platform.as_str());
        self.send(request).await
    }

    pub async fn set_read_status(
        &self,
        message_id: &MessageId,
        platform: Platform,
        read: bool,
    ) -> Result<Value, ApiError> {
        let request = ApiRequest::post(
            &["chats", message_id.as_str(), "read"],
            "Failed to update read status",
        )
        .body(RequestBody::Json(json!({
            "platform": platform.as_str(),
            "is_read": read,
        })));
        self.send(request).await
    }

    pub async fn unread_count(&self, platform: Platform) -> Result<UnreadCount, ApiError> {
        let request = ApiRequest::get(&["unread-counts"], "Failed to fetch unread count")
            .query("platform", platform.as_str());
        self.send(request).await
    }

    pub async fn mark_all_chats_read(&self, platform: Platform) -> Result<Value, ApiError> {
        let request = ApiRequest::post(&["chats", "mark-all-read"], "Failed to mark all chats as read")
            .body(RequestBody::Json(json!({ "platform": platform.as_str() })));
        self.send(request).await
    }

    /// A list selection is sent as one comma-separated string.
    pub async fn mark_all_messages_read(
        &self,
        platform: Platform,
        chats: &ChatSelection,
    ) -> Result<Value, ApiError> {
        let request = ApiRequest::post(
            &["messages", "mark-all-read"],
            "Failed to mark messages as read",
        )
        .body(RequestBody::JsonAsForm(json!({
            "platform": platform.as_str(),
            "chat_ids": chats.to_wire(),
        })));
        self.send(request).await
    }

    pub async fn summarize_messages(
        &self,
        messages: &[SummaryMessage],
        extract_tasks: bool,
        platform: Platform,
    ) -> Result<MessageSummary, ApiError> {
        const OPERATION: &str = "Failed to summarize messages";
        let fields = vec![
            ("messages".to_string(), messages_field(messages, OPERATION)?),
            ("extract_tasks".to_string(), extract_tasks.to_string()),
            ("platform".to_string(), platform.as_str().to_string()),
        ];
        let request = ApiRequest::post(&["summarize-messages"], OPERATION)
            .body(RequestBody::Form(fields));
        self.send(request).await
    }
}
