//! API module
//!
//! Contains HTTP request handlers for chat history and AI chat

pub mod ai_chat;
pub mod history;

pub use ai_chat::{chat_ai, AiChatRequest, AiChatResponse};
pub use history::get_history;
