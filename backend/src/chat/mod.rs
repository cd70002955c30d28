//! Chat module
//!
//! Connection registry, conversation bridge and message storage.

pub mod bridge;
pub mod db;
pub mod models;
pub mod registry;

pub use bridge::{ChatModel, ConversationBridge, Dialogue, FAILURE_REPLY, UNCONFIGURED_REPLY};
pub use db::ChatDb;
pub use models::{Message, NewMessage, Sender, HUMAN_CHAT_SESSION};
pub use registry::{ConnectionId, ConnectionRegistry};
