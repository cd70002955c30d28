//! Connection registry
//!
//! Tracks every open WebSocket channel and fans messages out to them.
//! Each channel is represented by the sending half of an unbounded queue
//! whose receiver is drained by that connection's writer task.

use std::collections::HashMap;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

/// Identity of a registered channel
pub type ConnectionId = Uuid;

/// Outbound queue of a single channel
pub type ChannelSender = mpsc::UnboundedSender<String>;

/// Registry of currently open channels
#[derive(Default)]
pub struct ConnectionRegistry {
    channels: RwLock<HashMap<ConnectionId, ChannelSender>>,
}

impl ConnectionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a channel as active and return its identity
    pub async fn connect(&self, sender: ChannelSender) -> ConnectionId {
        let id = Uuid::new_v4();
        let mut channels = self.channels.write().await;
        channels.insert(id, sender);
        debug!(connection_id = %id, active = channels.len(), "Channel connected");
        id
    }

    /// Remove a channel from the active set
    ///
    /// Returns `false` if the channel was not registered.
    pub async fn disconnect(&self, id: ConnectionId) -> bool {
        let mut channels = self.channels.write().await;
        let removed = channels.remove(&id).is_some();
        debug!(connection_id = %id, removed, active = channels.len(), "Channel disconnected");
        removed
    }

    /// Send `message` to every active channel except `excluding`
    ///
    /// Delivery is attempted on each channel independently. Channels whose
    /// queue is closed are dropped from the registry. Returns the number of
    /// channels the message was delivered to.
    pub async fn broadcast(&self, message: &str, excluding: Option<ConnectionId>) -> usize {
        let mut delivered = 0;
        let mut failed = Vec::new();

        {
            let channels = self.channels.read().await;
            for (id, sender) in channels.iter() {
                if Some(*id) == excluding {
                    continue;
                }
                match sender.send(message.to_string()) {
                    Ok(()) => delivered += 1,
                    Err(_) => {
                        warn!(connection_id = %id, "Failed to deliver broadcast, closing channel");
                        failed.push(*id);
                    }
                }
            }
        }

        if !failed.is_empty() {
            let mut channels = self.channels.write().await;
            for id in failed {
                channels.remove(&id);
            }
        }

        delivered
    }

    /// Whether a channel is currently registered
    pub async fn contains(&self, id: ConnectionId) -> bool {
        self.channels.read().await.contains_key(&id)
    }

    /// Number of active channels
    pub async fn len(&self) -> usize {
        self.channels.read().await.len()
    }

    /// Whether no channel is active
    pub async fn is_empty(&self) -> bool {
        self.channels.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tokio::sync::mpsc::error::TryRecvError;

    fn channel() -> (ChannelSender, mpsc::UnboundedReceiver<String>) {
        mpsc::unbounded_channel()
    }

    #[tokio::test]
    async fn test_active_set_tracks_connects_and_disconnects() {
        let registry = ConnectionRegistry::new();
        let mut expected = HashSet::new();
        let mut receivers = Vec::new();

        for _ in 0..5 {
            let (tx, rx) = channel();
            receivers.push(rx);
            expected.insert(registry.connect(tx).await);
        }

        let ids: Vec<_> = expected.iter().copied().collect();
        assert!(registry.disconnect(ids[1]).await);
        assert!(registry.disconnect(ids[3]).await);
        expected.remove(&ids[1]);
        expected.remove(&ids[3]);

        let (tx, rx) = channel();
        receivers.push(rx);
        expected.insert(registry.connect(tx).await);

        assert_eq!(registry.len().await, expected.len());
        for id in &expected {
            assert!(registry.contains(*id).await);
        }
        assert!(!registry.contains(ids[1]).await);
        assert!(!registry.contains(ids[3]).await);
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = channel();
        let id = registry.connect(tx).await;

        assert!(registry.disconnect(id).await);
        assert!(!registry.disconnect(id).await);
        assert!(!registry.disconnect(Uuid::new_v4()).await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_broadcast_skips_sender() {
        let registry = ConnectionRegistry::new();
        let (tx_a, mut rx_a) = channel();
        let (tx_b, mut rx_b) = channel();
        let (tx_c, mut rx_c) = channel();
        let a = registry.connect(tx_a).await;
        registry.connect(tx_b).await;
        registry.connect(tx_c).await;

        let delivered = registry.broadcast("User a: hello", Some(a)).await;

        assert_eq!(delivered, 2);
        assert_eq!(rx_a.try_recv(), Err(TryRecvError::Empty));
        assert_eq!(rx_b.try_recv().unwrap(), "User a: hello");
        assert_eq!(rx_c.try_recv().unwrap(), "User a: hello");
    }

    #[tokio::test]
    async fn test_broadcast_without_exclusion_reaches_everyone() {
        let registry = ConnectionRegistry::new();
        let (tx_a, mut rx_a) = channel();
        let (tx_b, mut rx_b) = channel();
        registry.connect(tx_a).await;
        registry.connect(tx_b).await;

        assert_eq!(registry.broadcast("User a left the chat", None).await, 2);
        assert_eq!(rx_a.try_recv().unwrap(), "User a left the chat");
        assert_eq!(rx_b.try_recv().unwrap(), "User a left the chat");
    }

    #[tokio::test]
    async fn test_disconnected_channel_receives_nothing() {
        let registry = ConnectionRegistry::new();
        let (tx_a, mut rx_a) = channel();
        let (tx_b, mut rx_b) = channel();
        let a = registry.connect(tx_a).await;
        registry.connect(tx_b).await;
        registry.disconnect(a).await;

        assert_eq!(registry.broadcast("ping", None).await, 1);
        assert_eq!(rx_b.try_recv().unwrap(), "ping");
        assert_eq!(rx_a.try_recv(), Err(TryRecvError::Disconnected));
    }

    #[tokio::test]
    async fn test_failing_recipient_does_not_block_others() {
        let registry = ConnectionRegistry::new();
        let (tx_a, mut rx_a) = channel();
        let (tx_b, rx_b) = channel();
        let (tx_c, mut rx_c) = channel();
        registry.connect(tx_a).await;
        let broken = registry.connect(tx_b).await;
        registry.connect(tx_c).await;

        // Closing the receiving side makes every send to this channel fail
        drop(rx_b);

        let delivered = registry.broadcast("still here", None).await;

        assert_eq!(delivered, 2);
        assert_eq!(rx_a.try_recv().unwrap(), "still here");
        assert_eq!(rx_c.try_recv().unwrap(), "still here");
        assert!(!registry.contains(broken).await);
        assert_eq!(registry.len().await, 2);
    }
}
