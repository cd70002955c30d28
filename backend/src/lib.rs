//! Chat App Backend Library
//!
//! Real-time human chat over WebSockets plus a request/response bridge to
//! an AI model, with every message stored in SQLite.
//! The main binary is in `src/main.rs`.

pub mod api;
pub mod app;
pub mod chat;
pub mod config;
pub mod error;
pub mod gemini;
/// Application state management
///
/// Shared handles passed to every handler.
pub mod state;
pub mod websocket;
