//! Event boundary between the engine and the outside world.
//!
//! The engine hands fully-formed event records to an injected [`EventSink`]
//! and moves on — fire-and-forget, at-most-once. Reliable fan-out to the
//! clients of a document is the transport's job; durability is available to
//! a persistence layer by subscribing to the same stream
//! (`operation-applied` events carry the full sequenced record).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::document::DocumentId;
use crate::operation::Operation;
use crate::presence::Participant;

/// Document and user lifecycle events published by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SyncEvent {
    UserJoined { document: DocumentId, participant: Participant },
    UserLeft { document: DocumentId, user_id: Uuid },
    /// Carries the final transformed operation, not the client's original,
    /// so every subscriber converges on identical content.
    OperationApplied { document: DocumentId, operation: Operation },
    PresenceUpdated { document: DocumentId, participant: Participant },
    DocumentClosed { document: DocumentId },
}

impl SyncEvent {
    /// Wire tag for transports that route on event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            SyncEvent::UserJoined { .. } => "user-joined",
            SyncEvent::UserLeft { .. } => "user-left",
            SyncEvent::OperationApplied { .. } => "operation-applied",
            SyncEvent::PresenceUpdated { .. } => "presence-update",
            SyncEvent::DocumentClosed { .. } => "document-closed",
        }
    }

    /// The document this event belongs to (the transport's routing key).
    pub fn document(&self) -> &DocumentId {
        match self {
            SyncEvent::UserJoined { document, .. }
            | SyncEvent::UserLeft { document, .. }
            | SyncEvent::OperationApplied { document, .. }
            | SyncEvent::PresenceUpdated { document, .. }
            | SyncEvent::DocumentClosed { document } => document,
        }
    }

    /// Encode to binary (bincode).
    pub fn encode(&self) -> Result<Vec<u8>, String> {
        bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| e.to_string())
    }

    /// Decode from binary.
    pub fn decode(bytes: &[u8]) -> Result<Self, String> {
        let (event, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())
            .map_err(|e| e.to_string())?;
        Ok(event)
    }
}

/// Where the engine publishes events. Implementations must not block:
/// `emit` is called inside per-document critical sections.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: SyncEvent);
}

/// Sink that drops every event. For tests and hosts without a transport.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: SyncEvent) {}
}

/// Snapshot of notifier counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifierStats {
    pub events_sent: u64,
    pub events_dropped: u64,
}

/// Broadcast-channel sink: one shared channel, every subscriber gets every
/// event and filters by [`SyncEvent::document`]. Counters are atomics so
/// the emit path never takes a lock.
pub struct BroadcastSink {
    sender: broadcast::Sender<Arc<SyncEvent>>,
    capacity: usize,
    events_sent: AtomicU64,
    events_dropped: AtomicU64,
}

impl BroadcastSink {
    /// `capacity` is the per-subscriber buffer; lagging subscribers start
    /// losing the oldest events past it, which is acceptable for an
    /// at-most-once boundary.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            capacity,
            events_sent: AtomicU64::new(0),
            events_dropped: AtomicU64::new(0),
        }
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<SyncEvent>> {
        self.sender.subscribe()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> NotifierStats {
        NotifierStats {
            events_sent: self.events_sent.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
        }
    }
}

impl EventSink for BroadcastSink {
    fn emit(&self, event: SyncEvent) {
        match self.sender.send(Arc::new(event)) {
            Ok(_) => {
                self.events_sent.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                // No subscribers right now; the event is gone by design.
                self.events_dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presence::ParticipantColor;

    fn doc_id() -> DocumentId {
        DocumentId::new("proj", "main.kd")
    }

    fn joined_event() -> SyncEvent {
        SyncEvent::UserJoined {
            document: doc_id(),
            participant: Participant::new(
                Uuid::new_v4(),
                "Alice",
                ParticipantColor::default(),
            ),
        }
    }

    #[test]
    fn test_event_type_tags() {
        assert_eq!(joined_event().event_type(), "user-joined");
        assert_eq!(
            SyncEvent::DocumentClosed { document: doc_id() }.event_type(),
            "document-closed"
        );
        assert_eq!(
            SyncEvent::UserLeft { document: doc_id(), user_id: Uuid::new_v4() }
                .event_type(),
            "user-left"
        );
    }

    #[test]
    fn test_event_document_routing_key() {
        assert_eq!(*joined_event().document(), doc_id());
    }

    #[test]
    fn test_event_roundtrip() {
        let event = joined_event();
        let decoded = SyncEvent::decode(&event.encode().unwrap()).unwrap();
        assert_eq!(event, decoded);
    }

    #[test]
    fn test_event_decode_garbage_fails() {
        assert!(SyncEvent::decode(&[0xFF, 0xFE]).is_err());
    }

    #[tokio::test]
    async fn test_broadcast_sink_fans_out() {
        let sink = BroadcastSink::new(16);
        let mut rx1 = sink.subscribe();
        let mut rx2 = sink.subscribe();

        sink.emit(SyncEvent::DocumentClosed { document: doc_id() });

        assert_eq!(rx1.recv().await.unwrap().event_type(), "document-closed");
        assert_eq!(rx2.recv().await.unwrap().event_type(), "document-closed");
        assert_eq!(sink.stats().events_sent, 1);
    }

    #[tokio::test]
    async fn test_broadcast_sink_counts_drops_without_subscribers() {
        let sink = BroadcastSink::new(16);
        sink.emit(SyncEvent::DocumentClosed { document: doc_id() });
        let stats = sink.stats();
        assert_eq!(stats.events_sent, 0);
        assert_eq!(stats.events_dropped, 1);
    }

    #[test]
    fn test_null_sink_swallows_everything() {
        NullSink.emit(SyncEvent::DocumentClosed { document: doc_id() });
    }
}
