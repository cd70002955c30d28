//! Gemini-backed dialogues
//!
//! Gemini's REST API is stateless, so each dialogue keeps its own turn
//! history and re-sends it with every request.

use crate::chat::bridge::{ChatModel, Dialogue};
use crate::error::ModelError;
use crate::gemini::client::GeminiClient;
use crate::gemini::types::{Content, MODEL_ROLE, USER_ROLE};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

/// [`ChatModel`] that opens Gemini dialogues
pub struct GeminiModel {
    client: GeminiClient,
}

impl GeminiModel {
    /// Wrap a configured client
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }
}

impl ChatModel for GeminiModel {
    fn start_dialogue(&self) -> Arc<dyn Dialogue> {
        Arc::new(GeminiDialogue::new(self.client.clone()))
    }
}

/// One Gemini conversation with its accumulated history
pub struct GeminiDialogue {
    client: GeminiClient,
    // Held for the whole turn so concurrent turns of one session do not interleave
    history: Mutex<Vec<Content>>,
}

impl GeminiDialogue {
    /// Start a dialogue with empty history
    pub fn new(client: GeminiClient) -> Self {
        Self {
            client,
            history: Mutex::new(Vec::new()),
        }
    }

    /// Number of turns recorded so far (user and model)
    pub async fn turns(&self) -> usize {
        self.history.lock().await.len()
    }
}

#[async_trait]
impl Dialogue for GeminiDialogue {
    async fn send(&self, message: &str) -> Result<String, ModelError> {
        let mut history = self.history.lock().await;

        // Work on a copy so a cancelled or failed call leaves history untouched
        let mut contents = history.clone();
        contents.push(Content::text(USER_ROLE, message));

        let reply = self.client.generate(&contents).await?;

        history.push(Content::text(USER_ROLE, message));
        history.push(Content::text(MODEL_ROLE, reply.clone()));
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_GEMINI_MODEL;
    use mockito::{Matcher, Server};
    use serial_test::serial;

    const PATH: &str = "/models/gemini-2.0-flash:generateContent";

    fn reply_body(text: &str) -> String {
        serde_json::json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] }
            }]
        })
        .to_string()
    }

    fn dialogue_for(server: &Server) -> GeminiDialogue {
        GeminiDialogue::new(GeminiClient::with_http(
            reqwest::Client::new(),
            "test-key",
            DEFAULT_GEMINI_MODEL,
            server.url(),
        ))
    }

    #[tokio::test]
    #[serial]
    async fn test_second_turn_resends_history() {
        let mut server = Server::new_async().await;
        let first = server
            .mock("POST", PATH)
            .match_query(Matcher::Any)
            .match_body(Matcher::Regex(
                r#"^\{"contents":\[\{"role":"user","parts":\[\{"text":"hello"\}\]\}\]\}$"#
                    .to_string(),
            ))
            .with_status(200)
            .with_body(reply_body("hi there"))
            .create_async()
            .await;
        let second = server
            .mock("POST", PATH)
            .match_query(Matcher::Any)
            .match_body(Matcher::Regex(
                concat!(
                    r#""text":"hello".*"role":"model","parts":\[\{"text":"hi there"\}\]"#,
                    r#".*"text":"how are you""#
                )
                .to_string(),
            ))
            .with_status(200)
            .with_body(reply_body("fine"))
            .create_async()
            .await;

        let dialogue = dialogue_for(&server);
        assert_eq!(dialogue.send("hello").await.unwrap(), "hi there");
        assert_eq!(dialogue.send("how are you").await.unwrap(), "fine");

        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(dialogue.turns().await, 4);
    }

    #[tokio::test]
    #[serial]
    async fn test_failed_turn_is_not_recorded() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", PATH)
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;

        let dialogue = dialogue_for(&server);
        assert!(dialogue.send("hello").await.is_err());

        mock.assert_async().await;
        assert_eq!(dialogue.turns().await, 0);
    }

    #[tokio::test]
    #[serial]
    async fn test_model_opens_independent_dialogues() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(reply_body("ok"))
            .expect(2)
            .create_async()
            .await;

        let model = GeminiModel::new(GeminiClient::with_http(
            reqwest::Client::new(),
            "test-key",
            DEFAULT_GEMINI_MODEL,
            server.url(),
        ));

        let a = model.start_dialogue();
        let b = model.start_dialogue();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a.send("one").await.unwrap(), "ok");
        assert_eq!(b.send("two").await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_cancelled_turn_is_not_recorded() {
        // Accepts connections but never answers, so the request hangs
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accept_task = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let dialogue = Arc::new(GeminiDialogue::new(GeminiClient::with_http(
            reqwest::Client::new(),
            "test-key",
            DEFAULT_GEMINI_MODEL,
            format!("http://{}", addr),
        )));

        let in_flight = {
            let dialogue = dialogue.clone();
            tokio::spawn(async move { dialogue.send("hello").await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        in_flight.abort();
        assert!(in_flight.await.unwrap_err().is_cancelled());

        assert_eq!(dialogue.turns().await, 0);
        accept_task.abort();
    }
}
