//! Chat data models
//!
//! Defines the persisted message record and the sender tags it carries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Session shared by every participant of the human chat room
pub const HUMAN_CHAT_SESSION: &str = "global_human_chat";

/// Message type stored for plain text messages
pub const TEXT_MESSAGE_TYPE: &str = "text";

/// Who sent a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sender {
    /// A user talking to the AI
    User,
    /// The AI model
    Ai,
    /// A participant of the human chat room, labelled by client id
    Human(String),
}

impl Sender {
    /// Sender tag as stored in the database
    pub fn label(&self) -> String {
        match self {
            Sender::User => "user".to_string(),
            Sender::Ai => "ai".to_string(),
            Sender::Human(client_id) => format!("User {}", client_id),
        }
    }
}

/// A persisted chat message
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Message {
    /// Unique identifier, generated by the store
    pub id: i64,
    /// Message text
    pub content: String,
    /// Sender tag ("user", "ai" or "User {client_id}")
    pub sender: String,
    /// When the message was created
    pub timestamp: DateTime<Utc>,
    /// Session the message belongs to
    pub session_id: String,
    /// Message type, always "text" for now
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
}

/// A message that has not been stored yet
#[derive(Debug, Clone)]
pub struct NewMessage {
    /// Message text
    pub content: String,
    /// Sender tag
    pub sender: String,
    /// Session the message belongs to
    pub session_id: String,
    /// Message type
    pub kind: String,
    /// Creation time
    pub timestamp: DateTime<Utc>,
}

impl NewMessage {
    /// Create a new text message stamped with the current time
    pub fn text(
        content: impl Into<String>,
        sender: &Sender,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            sender: sender.label(),
            session_id: session_id.into(),
            kind: TEXT_MESSAGE_TYPE.to_string(),
            timestamp: Utc::now(),
        }
    }
}
