//! Subcommand definitions and their execution against a [`Session`].

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{Value, json};

use tether_sync::{Hook, Session};
use tether_types::{ConversationId, MessageId, Platform, RequestFlags, SummaryMessage};

#[derive(Debug, Parser)]
#[command(
    name = "tether",
    author,
    version,
    about = "Read, mute and summarize chats across Discord and Telegram."
)]
pub struct Cli {
    /// Backend origin, overriding `[api] base_url`
    #[arg(long, global = true, env = "TETHER_BASE_URL")]
    pub base_url: Option<String>,

    /// Print single-line JSON
    #[arg(long, global = true)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the unread count for a platform
    Unread {
        #[arg(long, short, default_value_t = Platform::Discord)]
        platform: Platform,
    },

    /// Show whether a chat is muted
    MuteStatus { chat_id: ConversationId },

    /// Mute or unmute a chat
    Mute {
        chat_id: ConversationId,
        #[arg(long, short, default_value_t = Platform::Discord)]
        platform: Platform,
        /// Unmute instead of mute
        #[arg(long)]
        off: bool,
    },

    /// Fetch a chat's read status (this marks it read)
    Read {
        chat_id: ConversationId,
        #[arg(long, short, default_value_t = Platform::Discord)]
        platform: Platform,
    },

    /// Mark every chat on a platform read
    MarkAllRead {
        #[arg(long, short, default_value_t = Platform::Discord)]
        platform: Platform,
    },

    /// Mark all messages read in the given chats
    MarkMessagesRead {
        #[arg(required = true, num_args = 1..)]
        chat_ids: Vec<ConversationId>,
        #[arg(long, short, default_value_t = Platform::Discord)]
        platform: Platform,
    },

    /// Bookmark a message
    Bookmark {
        message_id: MessageId,
        #[arg(long, short, default_value_t = Platform::Discord)]
        platform: Platform,
    },

    /// Join the waitlist
    Waitlist { email: String },

    /// Summarize one chat (requires sign-in)
    Summary {
        chat_id: ConversationId,
        /// JSON array of `{text, timestamp, sender}`; `-` reads stdin
        #[arg(long, short)]
        messages: PathBuf,
        #[arg(long)]
        title: Option<String>,
        /// Only summarize the last N minutes
        #[arg(long)]
        minutes: Option<u32>,
    },

    /// Summarize a message batch
    Summarize {
        /// JSON array of `{text, timestamp, sender}`; `-` reads stdin
        #[arg(long, short)]
        messages: PathBuf,
        /// Also extract action items
        #[arg(long)]
        extract_tasks: bool,
        #[arg(long, short, default_value_t = Platform::Discord)]
        platform: Platform,
    },

    /// Load the most recent AI conversation
    AiConversations,
}

/// Result of one subcommand: what to print and the exit status.
#[derive(Debug)]
pub struct Outcome {
    pub output: Value,
    pub success: bool,
}

impl Outcome {
    fn from_flags(flags: &RequestFlags, extra: Value) -> Self {
        let mut output = json!({
            "success": flags.success,
            "error": flags.error,
            "loading": flags.loading,
        });
        if let (Value::Object(map), Value::Object(extra)) = (&mut output, extra) {
            map.extend(extra);
        }
        Self {
            output,
            success: flags.success,
        }
    }
}

fn read_messages(path: &Path) -> Result<Vec<SummaryMessage>> {
    let raw = if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("reading messages from stdin")?;
        buf
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("reading messages from {}", path.display()))?
    };
    serde_json::from_str(&raw).context("messages must be a JSON array of {text, timestamp, sender}")
}

pub async fn run(session: &Session, command: Command) -> Result<Outcome> {
    tracing::info!(?command, "Running command");

    let outcome = match command {
        Command::Unread { platform } => {
            let hook = session.unread_count(platform).await;
            Outcome::from_flags(
                &hook.flags(),
                json!({ "platform": platform, "count": hook.count() }),
            )
        }
        Command::MuteStatus { chat_id } => {
            let hook = session.mute_status(chat_id).await;
            Outcome::from_flags(
                &hook.flags(),
                json!({ "chat_id": hook.conversation(), "muted": hook.muted() }),
            )
        }
        Command::Mute {
            chat_id,
            platform,
            off,
        } => {
            let hook = session.toggle_mute();
            hook.toggle(&chat_id, platform, !off).await;
            Outcome::from_flags(&hook.flags(), json!({ "chat_id": chat_id, "muted": !off }))
        }
        Command::Read { chat_id, platform } => {
            let hook = session.read_status(chat_id, platform).await;
            Outcome::from_flags(&hook.flags(), json!({ "read": hook.is_read() }))
        }
        Command::MarkAllRead { platform } => {
            let hook = session.mark_all_chats_read();
            hook.mark_all(platform).await;
            Outcome::from_flags(&hook.flags(), json!({}))
        }
        Command::MarkMessagesRead { chat_ids, platform } => {
            let hook = session.mark_all_messages_read();
            hook.mark_all(platform, chat_ids).await;
            Outcome::from_flags(&hook.flags(), json!({}))
        }
        Command::Bookmark {
            message_id,
            platform,
        } => {
            let hook = session.add_bookmark();
            hook.add(&message_id, platform).await;
            Outcome::from_flags(&hook.flags(), json!({}))
        }
        Command::Waitlist { email } => {
            let hook = session.join_waitlist();
            hook.join(&email).await;
            Outcome::from_flags(&hook.flags(), json!({}))
        }
        Command::Summary {
            chat_id,
            messages,
            title,
            minutes,
        } => {
            let messages = read_messages(&messages)?;
            let hook = session.chat_summary();
            let summary = hook
                .generate(&chat_id, &messages, title.as_deref(), minutes)
                .await
                .ok();
            Outcome::from_flags(&hook.flags(), json!({ "summary": summary }))
        }
        Command::Summarize {
            messages,
            extract_tasks,
            platform,
        } => {
            let messages = read_messages(&messages)?;
            let hook = session.summarize_messages();
            let summary = hook.summarize(&messages, extract_tasks, platform).await.ok();
            Outcome::from_flags(&hook.flags(), json!({ "summary": summary }))
        }
        Command::AiConversations => {
            let hook = session.ai_conversations();
            let conversation = hook.fetch().await.ok().flatten();
            Outcome::from_flags(&hook.flags(), json!({ "conversation": conversation }))
        }
    };

    if let Some(error) = outcome.output.get("error").and_then(Value::as_str) {
        tracing::warn!(error, "Command failed");
    }
    Ok(outcome)
}
