// Application state shared by all handlers
// Holds the message store, the connection registry and the conversation bridge

use crate::chat::{ChatDb, ConnectionRegistry, ConversationBridge};
use crate::config::Config;
use crate::error::AppError;
use crate::gemini::{GeminiClient, GeminiModel};
use std::sync::Arc;
use tracing::{info, warn};

/// Main application state
///
/// Cheap to clone: every component sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Persistent message log
    pub db: Arc<ChatDb>,
    /// Open WebSocket channels
    pub registry: Arc<ConnectionRegistry>,
    /// Per-session AI dialogues
    pub bridge: Arc<ConversationBridge>,
}

impl AppState {
    /// Assemble state from already constructed components
    pub fn new(db: ChatDb, bridge: ConversationBridge) -> Self {
        Self {
            db: Arc::new(db),
            registry: Arc::new(ConnectionRegistry::new()),
            bridge: Arc::new(bridge),
        }
    }

    /// Open the message store and set up the AI model from configuration
    ///
    /// A missing API key is not an error: AI replies fall back to a fixed text.
    pub async fn from_config(config: &Config) -> Result<Self, AppError> {
        let db = ChatDb::new(&config.database.url).await?;

        let client = GeminiClient::from_config(&config.ai).map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to build Gemini HTTP client: {}", e))
        })?;

        let bridge = match client {
            Some(client) => {
                info!(model = %client.model(), "Gemini model configured");
                ConversationBridge::new(Arc::new(GeminiModel::new(client)))
            }
            None => {
                warn!("GEMINI_API_KEY not found in environment, AI replies are disabled");
                ConversationBridge::unconfigured()
            }
        }
        .with_max_sessions(config.ai.max_sessions);

        Ok(Self::new(db, bridge))
    }
}
