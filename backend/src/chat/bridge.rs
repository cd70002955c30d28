//! Conversation Bridge
//!
//! Maps a session id to a stateful dialogue with an external model.
//! Dialogues are created on first use and reused for every later turn of
//! the same session, so the model sees the prior turns.
//!
//! Model failures never leave this module: they are logged and replaced by
//! a fixed fallback reply.

use crate::error::ModelError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

/// Reply returned when no model is configured
pub const UNCONFIGURED_REPLY: &str =
    "I'm sorry, but my brain (API key) is missing. Please check the server configuration.";

/// Reply returned when the model call fails
pub const FAILURE_REPLY: &str = "I'm having trouble thinking right now. Please try again later.";

/// A conversational model able to open dialogues
pub trait ChatModel: Send + Sync {
    /// Start a dialogue with empty history
    fn start_dialogue(&self) -> Arc<dyn Dialogue>;
}

/// One running dialogue: send a turn, get the reply
#[async_trait]
pub trait Dialogue: Send + Sync {
    /// Send a user turn and return the model's reply text
    async fn send(&self, message: &str) -> Result<String, ModelError>;
}

struct SessionEntry {
    dialogue: Arc<dyn Dialogue>,
    // Tick of the bridge clock at last use; updated under the read lock
    last_used: AtomicU64,
}

/// Routes user messages to per-session model dialogues
pub struct ConversationBridge {
    model: Option<Arc<dyn ChatModel>>,
    sessions: RwLock<HashMap<String, SessionEntry>>,
    max_sessions: Option<usize>,
    clock: AtomicU64,
}

impl ConversationBridge {
    /// Create a bridge backed by `model`
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            model: Some(model),
            sessions: RwLock::new(HashMap::new()),
            max_sessions: None,
            clock: AtomicU64::new(0),
        }
    }

    /// Create a bridge without a model; every reply is [`UNCONFIGURED_REPLY`]
    pub fn unconfigured() -> Self {
        Self {
            model: None,
            sessions: RwLock::new(HashMap::new()),
            max_sessions: None,
            clock: AtomicU64::new(0),
        }
    }

    /// Limit the number of cached sessions, evicting the least recently used
    pub fn with_max_sessions(mut self, max_sessions: Option<usize>) -> Self {
        self.max_sessions = max_sessions.filter(|n| *n > 0);
        self
    }

    /// Whether a model is available
    pub fn is_configured(&self) -> bool {
        self.model.is_some()
    }

    /// Get the model's reply to `user_message` within `session_id`
    ///
    /// Always returns user-facing text; failures degrade to a fallback reply.
    pub async fn get_response(&self, user_message: &str, session_id: &str) -> String {
        let Some(model) = &self.model else {
            return UNCONFIGURED_REPLY.to_string();
        };

        let dialogue = self.dialogue_for(model.as_ref(), session_id).await;

        match dialogue.send(user_message).await {
            Ok(reply) => {
                debug!(
                    session_id = %session_id,
                    response_len = reply.len(),
                    "Model reply received"
                );
                reply
            }
            Err(e) => {
                error!(
                    session_id = %session_id,
                    error = %e,
                    "Error communicating with model"
                );
                FAILURE_REPLY.to_string()
            }
        }
    }

    /// Get or create the dialogue for a session
    async fn dialogue_for(&self, model: &dyn ChatModel, session_id: &str) -> Arc<dyn Dialogue> {
        // Fast path: existing sessions only need the shared lock
        if let Some(entry) = self.sessions.read().await.get(session_id) {
            entry.last_used.store(self.tick(), Ordering::Relaxed);
            return entry.dialogue.clone();
        }

        let mut sessions = self.sessions.write().await;

        // Another task may have created it between the two locks
        if let Some(entry) = sessions.get(session_id) {
            entry.last_used.store(self.tick(), Ordering::Relaxed);
            return entry.dialogue.clone();
        }

        if let Some(max) = self.max_sessions {
            while sessions.len() >= max {
                let oldest = sessions
                    .iter()
                    .min_by_key(|(_, entry)| entry.last_used.load(Ordering::Relaxed))
                    .map(|(id, _)| id.clone());
                match oldest {
                    Some(id) => {
                        sessions.remove(&id);
                        debug!(session_id = %id, "Evicted least recently used dialogue");
                    }
                    None => break,
                }
            }
        }

        let dialogue = model.start_dialogue();
        sessions.insert(
            session_id.to_string(),
            SessionEntry {
                dialogue: dialogue.clone(),
                last_used: AtomicU64::new(self.tick()),
            },
        );

        info!(
            session_id = %session_id,
            sessions = sessions.len(),
            "Started new dialogue"
        );

        dialogue
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Drop the dialogue of a session; the next turn starts from scratch
    pub async fn forget(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    /// Number of sessions with a cached dialogue
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
