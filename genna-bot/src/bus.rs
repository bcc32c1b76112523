//! Async message bus between channels and the dialog service.
//!
//! Channels publish inbound user messages; the dialog service consumes
//! them, runs the turn, and publishes the resulting replies back.
//! Channel-specific subscriptions route each reply to the channel that
//! owns the conversation.

use crate::error::{BusError, BusResult};
use crate::events::{InboundMessage, OutboundMessage};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast, mpsc};
use tracing::{debug, trace};

/// Default capacity for message queues.
const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Default capacity for the outbound broadcast.
const DEFAULT_BROADCAST_CAPACITY: usize = 64;

/// Async message bus decoupling channels from the dialog service.
#[derive(Clone)]
pub struct MessageBus {
    inner: Arc<MessageBusInner>,
}

impl std::fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageBus").finish_non_exhaustive()
    }
}

struct MessageBusInner {
    /// Inbound queue (channels → dialog service).
    inbound_tx: mpsc::Sender<InboundMessage>,
    inbound_rx: RwLock<Option<mpsc::Receiver<InboundMessage>>>,

    /// Outbound broadcast (dialog service → observers).
    outbound_tx: broadcast::Sender<OutboundMessage>,

    /// Channel-specific subscribers for targeted delivery.
    channel_subscribers: RwLock<HashMap<String, Vec<mpsc::Sender<OutboundMessage>>>>,

    /// Statistics.
    stats: RwLock<BusStats>,
}

/// Message bus statistics.
#[derive(Debug, Default, Clone, Copy)]
pub struct BusStats {
    /// Total inbound messages accepted.
    pub inbound_count: u64,
    /// Total outbound messages published.
    pub outbound_count: u64,
}

impl MessageBus {
    /// Create a bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Create a bus with the given inbound queue capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel(capacity);
        let (outbound_tx, _) = broadcast::channel(DEFAULT_BROADCAST_CAPACITY);

        Self {
            inner: Arc::new(MessageBusInner {
                inbound_tx,
                inbound_rx: RwLock::new(Some(inbound_rx)),
                outbound_tx,
                channel_subscribers: RwLock::new(HashMap::new()),
                stats: RwLock::new(BusStats::default()),
            }),
        }
    }

    /// Publish an inbound message from a channel.
    pub async fn publish_inbound(&self, msg: InboundMessage) -> BusResult<()> {
        trace!(
            channel = %msg.channel,
            sender = %msg.sender_id,
            "publishing inbound message"
        );

        self.inner
            .inbound_tx
            .send(msg)
            .await
            .map_err(|_| BusError::InboundClosed)?;

        self.inner.stats.write().await.inbound_count += 1;
        Ok(())
    }

    /// Consume the next inbound message.
    ///
    /// Only the dialog service should call this. Returns `None` when the
    /// bus is closed.
    pub async fn consume_inbound(&self) -> Option<InboundMessage> {
        let mut rx_guard = self.inner.inbound_rx.write().await;
        if let Some(rx) = rx_guard.as_mut() {
            rx.recv().await
        } else {
            None
        }
    }

    /// Consume the next inbound message, giving up after the timeout.
    pub async fn consume_inbound_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Option<InboundMessage> {
        let mut rx_guard = self.inner.inbound_rx.write().await;
        if let Some(rx) = rx_guard.as_mut() {
            tokio::time::timeout(timeout, rx.recv())
                .await
                .ok()
                .flatten()
        } else {
            None
        }
    }

    /// Publish an outbound message from the dialog service.
    ///
    /// Delivered to the broadcast observers and to subscribers of the
    /// message's target channel.
    pub async fn publish_outbound(&self, msg: OutboundMessage) -> BusResult<()> {
        trace!(
            channel = %msg.channel,
            chat_id = %msg.chat_id,
            "publishing outbound message"
        );

        let _ = self.inner.outbound_tx.send(msg.clone());

        let subscribers = self.inner.channel_subscribers.read().await;
        if let Some(senders) = subscribers.get(&msg.channel) {
            for sender in senders {
                if sender.send(msg.clone()).await.is_err() {
                    debug!(
                        channel = %msg.channel,
                        "channel subscriber disconnected"
                    );
                }
            }
        }

        self.inner.stats.write().await.outbound_count += 1;
        Ok(())
    }

    /// Subscribe to all outbound messages (broadcast).
    pub fn subscribe_outbound(&self) -> broadcast::Receiver<OutboundMessage> {
        self.inner.outbound_tx.subscribe()
    }

    /// Subscribe to outbound messages targeted at a specific channel.
    pub async fn subscribe_channel(&self, channel: &str) -> mpsc::Receiver<OutboundMessage> {
        let (tx, rx) = mpsc::channel(DEFAULT_QUEUE_CAPACITY);

        let mut subscribers = self.inner.channel_subscribers.write().await;
        subscribers.entry(channel.to_string()).or_default().push(tx);

        debug!(channel = %channel, "new channel subscriber registered");
        rx
    }

    /// Get current bus statistics.
    pub async fn stats(&self) -> BusStats {
        *self.inner.stats.read().await
    }

    /// Create a lightweight handle for publishing inbound messages.
    pub fn inbound_handle(&self) -> InboundHandle {
        InboundHandle {
            tx: self.inner.inbound_tx.clone(),
        }
    }

    /// Create a handle for publishing outbound messages.
    pub fn outbound_handle(&self) -> OutboundHandle {
        OutboundHandle { bus: self.clone() }
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Lightweight handle for publishing inbound messages.
#[derive(Debug, Clone)]
pub struct InboundHandle {
    tx: mpsc::Sender<InboundMessage>,
}

impl InboundHandle {
    /// Publish an inbound message.
    pub async fn publish(&self, msg: InboundMessage) -> BusResult<()> {
        self.tx.send(msg).await.map_err(|_| BusError::InboundClosed)
    }
}

/// Lightweight handle for publishing outbound messages.
#[derive(Debug, Clone)]
pub struct OutboundHandle {
    bus: MessageBus,
}

impl OutboundHandle {
    /// Publish an outbound message.
    pub async fn publish(&self, msg: OutboundMessage) -> BusResult<()> {
        self.bus.publish_outbound(msg).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_inbound_message_flow() {
        let bus = MessageBus::new();

        bus.publish_inbound(InboundMessage::cli("What is the status of my claim?"))
            .await
            .unwrap();

        let received = bus
            .consume_inbound_timeout(std::time::Duration::from_millis(100))
            .await;
        assert_eq!(
            received.unwrap().content,
            "What is the status of my claim?"
        );
    }

    #[tokio::test]
    async fn test_channel_subscription_is_targeted() {
        let bus = MessageBus::new();
        let mut rx = bus.subscribe_channel("cli").await;

        bus.publish_outbound(OutboundMessage::new("cli", "direct", "Main Menu"))
            .await
            .unwrap();
        bus.publish_outbound(OutboundMessage::new("web", "room-1", "elsewhere"))
            .await
            .unwrap();

        let received = tokio::time::timeout(std::time::Duration::from_millis(100), rx.recv())
            .await
            .unwrap();
        assert_eq!(received.unwrap().content, "Main Menu");
    }

    #[tokio::test]
    async fn test_stats() {
        let bus = MessageBus::new();

        bus.publish_inbound(InboundMessage::cli("hi")).await.unwrap();
        bus.publish_outbound(OutboundMessage::new("cli", "direct", "hello"))
            .await
            .unwrap();

        let stats = bus.stats().await;
        assert_eq!(stats.inbound_count, 1);
        assert_eq!(stats.outbound_count, 1);
    }

    #[tokio::test]
    async fn test_inbound_handle() {
        let bus = MessageBus::new();
        let handle = bus.inbound_handle();

        handle.publish(InboundMessage::cli("via handle")).await.unwrap();
        let received = bus
            .consume_inbound_timeout(std::time::Duration::from_millis(100))
            .await;
        assert_eq!(received.unwrap().content, "via handle");
    }
}
