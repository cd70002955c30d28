//! Chat database operations
//!
//! Append-only message log backed by SQLite.

use crate::chat::models::{Message, NewMessage};
use crate::error::AppError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Database connection pool for chat operations
pub struct ChatDb {
    pool: SqlitePool,
}

impl ChatDb {
    /// Initialize database connection pool and run migrations
    ///
    /// # Arguments
    /// * `db_url` - SQLite URL (`sqlite:path/to/chat.db`) or plain file path
    ///
    /// # Returns
    /// * `Ok(ChatDb)` if successful
    /// * `Err(AppError)` if connection or migration failed
    pub async fn new(db_url: &str) -> Result<Self, AppError> {
        let db_path = db_url
            .strip_prefix("sqlite://")
            .or_else(|| db_url.strip_prefix("sqlite:"))
            .unwrap_or(db_url);
        let in_memory = db_path.starts_with(":memory:");

        // Ensure parent directory exists
        if !in_memory {
            if let Some(parent) = Path::new(db_path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        AppError::Internal(anyhow::anyhow!(
                            "Failed to create db directory: {}",
                            e
                        ))
                    })?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path))
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid database path: {}", e)))?
            .create_if_missing(true);

        // Every connection to ":memory:" opens its own database, so pin the pool to one
        // connection that is never recycled
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Failed to connect to database: {}", e))
            })?;

        info!("Connected to SQLite database at: {}", db_path);

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations...");

        let migration_sql = include_str!("../../migrations/001_create_messages.sql");

        // Strip comments, then execute statement by statement
        let cleaned_sql: String = migration_sql
            .lines()
            .map(|line| match line.find("--") {
                Some(pos) => &line[..pos],
                None => line,
            })
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        for statement in cleaned_sql.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::Internal(anyhow::anyhow!(
                        "Migration failed: {} - Statement: {}",
                        e,
                        statement.chars().take(100).collect::<String>()
                    ))
                })?;
        }

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Append a message to the log
    ///
    /// Returns the stored message with its generated id.
    pub async fn add_message(&self, message: &NewMessage) -> Result<Message, AppError> {
        let result = sqlx::query(
            "INSERT INTO messages (content, sender, timestamp, session_id, type) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&message.content)
        .bind(&message.sender)
        .bind(message.timestamp)
        .bind(&message.session_id)
        .bind(&message.kind)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();

        debug!(
            message_id = id,
            session_id = %message.session_id,
            sender = %message.sender,
            "Stored message"
        );

        Ok(Message {
            id,
            content: message.content.clone(),
            sender: message.sender.clone(),
            timestamp: message.timestamp,
            session_id: message.session_id.clone(),
            kind: message.kind.clone(),
        })
    }

    /// Get all messages for a session, oldest first
    pub async fn get_messages(&self, session_id: &str) -> Result<Vec<Message>, AppError> {
        let messages = sqlx::query_as::<_, Message>(
            "SELECT id, content, sender, timestamp, session_id, type FROM messages WHERE session_id = ? ORDER BY timestamp ASC, id ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    /// Number of messages stored for a session
    pub async fn count_messages(&self, session_id: &str) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE session_id = ?")
            .bind(session_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Get the database pool (for advanced operations if needed)
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
