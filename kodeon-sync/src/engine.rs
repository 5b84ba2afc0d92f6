//! The synchronization engine facade.
//!
//! One `SyncEngine` per host process. All operations against a single
//! document — edit submission, roster changes, presence updates — serialize
//! on that document's mutex, so the version-check-then-append step is
//! atomic and presence updates never read offsets mid-shift. Operations on
//! different documents run in parallel. Nothing here blocks on I/O; calls
//! either complete or fail immediately with a typed error.

use std::sync::Arc;

use uuid::Uuid;

use crate::document::{DocumentId, DocumentSnapshot};
use crate::error::SyncError;
use crate::notify::{EventSink, NullSink, SyncEvent};
use crate::operation::{EditOp, Operation};
use crate::presence::{Participant, ParticipantColor, PresenceUpdate};
use crate::registry::DocumentRegistry;

pub struct SyncEngine {
    registry: DocumentRegistry,
    sink: Arc<dyn EventSink>,
}

impl SyncEngine {
    /// Create an engine publishing events to `sink`.
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { registry: DocumentRegistry::new(), sink }
    }

    /// Engine without a transport; events are dropped.
    pub fn with_null_sink() -> Self {
        Self::new(Arc::new(NullSink))
    }

    /// Open a collaborative document for a (project, file) pair.
    pub async fn create_document(
        &self,
        project_id: impl Into<String>,
        file_id: impl Into<String>,
        initial_content: impl Into<String>,
    ) -> Result<DocumentSnapshot, SyncError> {
        let id = DocumentId::new(project_id, file_id);
        let snapshot = self.registry.create(id.clone(), initial_content).await?;
        log::info!("Opened document {id}");
        Ok(snapshot)
    }

    /// Point-in-time view of an open document.
    pub async fn get_document(&self, id: &DocumentId) -> Option<DocumentSnapshot> {
        let doc = self.registry.get(id).await?;
        let doc = doc.lock().await;
        Some(doc.snapshot())
    }

    /// Add a user to a document's roster.
    ///
    /// Rejoining is routine (reconnects); the existing participant is
    /// returned and no event is emitted. `color` defaults to a stable
    /// color derived from the user id.
    pub async fn join(
        &self,
        id: &DocumentId,
        user_id: Uuid,
        name: impl Into<String>,
        color: Option<ParticipantColor>,
    ) -> Result<Participant, SyncError> {
        let doc = self.lookup(id).await?;
        let mut doc = doc.lock().await;
        let color = color.unwrap_or_else(|| ParticipantColor::from_uuid(user_id));
        let (participant, newly_joined) = doc.join(user_id, name, color);
        if newly_joined {
            log::info!("{} ({user_id}) joined {id}", participant.name);
            self.sink.emit(SyncEvent::UserJoined {
                document: id.clone(),
                participant: participant.clone(),
            });
        }
        Ok(participant)
    }

    /// Remove a user from a document's roster. No-op if absent.
    pub async fn leave(&self, id: &DocumentId, user_id: Uuid) -> Result<(), SyncError> {
        let doc = self.lookup(id).await?;
        let mut doc = doc.lock().await;
        if doc.leave(&user_id).is_some() {
            log::info!("{user_id} left {id}");
            self.sink.emit(SyncEvent::UserLeft { document: id.clone(), user_id });
        }
        Ok(())
    }

    /// Submit a client edit.
    ///
    /// The edit is reconciled against every operation accepted after its
    /// base version, applied, sequenced, and broadcast. The returned record
    /// is the final transformed operation — the one all clients must apply.
    pub async fn submit_operation(
        &self,
        id: &DocumentId,
        user_id: Uuid,
        edit: EditOp,
    ) -> Result<Operation, SyncError> {
        let doc = self.lookup(id).await?;
        let mut doc = doc.lock().await;
        let operation = doc.apply_edit(user_id, edit).inspect_err(|e| {
            log::warn!("Rejected edit on {id} from {user_id}: {e}");
        })?;
        log::debug!(
            "Applied op {} on {id} (version {})",
            operation.seq,
            doc.version()
        );
        self.sink.emit(SyncEvent::OperationApplied {
            document: id.clone(),
            operation: operation.clone(),
        });
        Ok(operation)
    }

    /// Merge a presence delta for a joined user.
    pub async fn update_presence(
        &self,
        id: &DocumentId,
        user_id: Uuid,
        update: PresenceUpdate,
    ) -> Result<Participant, SyncError> {
        let doc = self.lookup(id).await?;
        let mut doc = doc.lock().await;
        let participant = doc.update_presence(user_id, &update)?;
        log::trace!("Presence update from {user_id} on {id}");
        self.sink.emit(SyncEvent::PresenceUpdated {
            document: id.clone(),
            participant: participant.clone(),
        });
        Ok(participant)
    }

    /// The most recent `limit` accepted operations, oldest first.
    pub async fn get_history(
        &self,
        id: &DocumentId,
        limit: usize,
    ) -> Result<Vec<Operation>, SyncError> {
        let doc = self.lookup(id).await?;
        let doc = doc.lock().await;
        Ok(doc.log().recent(limit))
    }

    /// Close a document and evict it. Idempotent: closing an already-closed
    /// document does nothing and emits nothing.
    pub async fn close_document(&self, id: &DocumentId) {
        if self.registry.remove(id).await.is_some() {
            log::info!("Closed document {id}");
            self.sink.emit(SyncEvent::DocumentClosed { document: id.clone() });
        }
    }

    /// Number of open documents.
    pub async fn document_count(&self) -> usize {
        self.registry.len().await
    }

    /// Ids of all open documents.
    pub async fn open_documents(&self) -> Vec<DocumentId> {
        self.registry.document_ids().await
    }

    /// Roster size of an open document.
    pub async fn participant_count(&self, id: &DocumentId) -> Result<usize, SyncError> {
        let doc = self.lookup(id).await?;
        let doc = doc.lock().await;
        Ok(doc.participant_count())
    }

    async fn lookup(
        &self,
        id: &DocumentId,
    ) -> Result<Arc<tokio::sync::Mutex<crate::document::Document>>, SyncError> {
        self.registry
            .get(id)
            .await
            .ok_or_else(|| SyncError::DocumentNotFound(id.clone()))
    }
}

impl Default for SyncEngine {
    fn default() -> Self {
        Self::with_null_sink()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> DocumentId {
        DocumentId::new("proj", "main.kd")
    }

    #[tokio::test]
    async fn test_create_and_get_document() {
        let engine = SyncEngine::with_null_sink();
        let snap = engine.create_document("proj", "main.kd", "hello").await.unwrap();
        assert_eq!(snap.version, 0);

        let fetched = engine.get_document(&id()).await.unwrap();
        assert_eq!(fetched.content, "hello");
        assert_eq!(engine.document_count().await, 1);
    }

    #[tokio::test]
    async fn test_get_missing_document_is_none() {
        let engine = SyncEngine::with_null_sink();
        assert!(engine.get_document(&id()).await.is_none());
    }

    #[tokio::test]
    async fn test_submit_against_missing_document() {
        let engine = SyncEngine::with_null_sink();
        let err = engine
            .submit_operation(&id(), Uuid::new_v4(), EditOp::insert(0, "x", 0))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::DocumentNotFound(_)));
    }

    #[tokio::test]
    async fn test_submit_returns_sequenced_operation() {
        let engine = SyncEngine::with_null_sink();
        engine.create_document("proj", "main.kd", "hello").await.unwrap();

        let op = engine
            .submit_operation(&id(), Uuid::new_v4(), EditOp::insert(5, " world", 0))
            .await
            .unwrap();
        assert_eq!(op.seq, 1);

        let snap = engine.get_document(&id()).await.unwrap();
        assert_eq!(snap.content, "hello world");
        assert_eq!(snap.version, 1);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let engine = SyncEngine::with_null_sink();
        engine.create_document("proj", "main.kd", "").await.unwrap();

        engine.close_document(&id()).await;
        assert!(engine.get_document(&id()).await.is_none());
        engine.close_document(&id()).await; // second close: no effect
        assert_eq!(engine.document_count().await, 0);
    }

    #[tokio::test]
    async fn test_participant_count_tracks_roster() {
        let engine = SyncEngine::with_null_sink();
        engine.create_document("proj", "main.kd", "").await.unwrap();

        let user = Uuid::new_v4();
        engine.join(&id(), user, "Alice", None).await.unwrap();
        assert_eq!(engine.participant_count(&id()).await.unwrap(), 1);

        engine.leave(&id(), user).await.unwrap();
        assert_eq!(engine.participant_count(&id()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_join_default_color_is_stable() {
        let engine = SyncEngine::with_null_sink();
        engine.create_document("proj", "main.kd", "").await.unwrap();

        let user = Uuid::new_v4();
        let p = engine.join(&id(), user, "Alice", None).await.unwrap();
        assert_eq!(p.color, ParticipantColor::from_uuid(user));
    }
}
