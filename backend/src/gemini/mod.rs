//! Gemini integration
//!
//! REST client for Google's Gemini models and the dialogue type the
//! conversation bridge uses on top of it.

pub mod client;
pub mod dialogue;
pub mod types;

pub use client::GeminiClient;
pub use dialogue::{GeminiDialogue, GeminiModel};
