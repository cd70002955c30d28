//! Gemini API request and response types
//!
//! Structs that mirror the `generateContent` JSON format.

use serde::{Deserialize, Serialize};

/// Role of the user turn in a conversation
pub const USER_ROLE: &str = "user";

/// Role of the model turn in a conversation
pub const MODEL_ROLE: &str = "model";

/// Top-level Gemini API response
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// List of candidate responses from the model
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Optional feedback about the prompt (e.g., if it was blocked)
    #[serde(default, alias = "prompt_feedback")]
    pub prompt_feedback: Option<PromptFeedback>,
}

/// A single candidate response from the model
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// The content of this candidate
    #[serde(default)]
    pub content: Option<Content>,
    /// Why the model stopped generating (if applicable)
    #[serde(default, alias = "finish_reason")]
    pub finish_reason: Option<String>,
}

/// Feedback about the prompt (e.g., if it was blocked)
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    /// Reason the prompt was blocked (if applicable)
    #[serde(default, alias = "block_reason")]
    pub block_reason: Option<String>,
}

/// One conversation turn, used both in requests and responses
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Content {
    /// Who produced this turn ("user" or "model")
    #[serde(default)]
    pub role: String,
    /// List of content parts (typically one text part)
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// A single-part text turn
    pub fn text(role: &str, text: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            parts: vec![Part { text: text.into() }],
        }
    }
}

/// A single part of content (typically text)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Part {
    /// The text content of this part
    #[serde(default)]
    pub text: String,
}

/// Request structure for `generateContent`
#[derive(Serialize, Debug)]
pub struct GenerateContentRequest<'a> {
    /// Whole conversation so far, oldest turn first
    pub contents: &'a [Content],
}
