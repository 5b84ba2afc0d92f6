//! Process-owned document registry.
//!
//! Maps document identity to live documents. Each document sits behind its
//! own `Mutex`, giving single-writer-per-document semantics: submissions,
//! roster changes, and presence updates for one document serialize on that
//! mutex, while unrelated documents proceed in parallel. The outer `RwLock`
//! only guards the map itself (create/close/lookup).

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::document::{Document, DocumentId, DocumentSnapshot};
use crate::error::SyncError;

/// Registry of open documents. An owned value, not process-global state:
/// hosts and tests instantiate their own.
#[derive(Debug, Default)]
pub struct DocumentRegistry {
    documents: RwLock<HashMap<DocumentId, Arc<Mutex<Document>>>>,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self { documents: RwLock::new(HashMap::new()) }
    }

    /// Open a new document at version 0 with an empty history and roster.
    pub async fn create(
        &self,
        id: DocumentId,
        initial_content: impl Into<String>,
    ) -> Result<DocumentSnapshot, SyncError> {
        let mut documents = self.documents.write().await;
        if documents.contains_key(&id) {
            return Err(SyncError::AlreadyExists(id));
        }
        let document = Document::new(id.clone(), initial_content);
        let snapshot = document.snapshot();
        documents.insert(id, Arc::new(Mutex::new(document)));
        Ok(snapshot)
    }

    /// Look up an open document. The returned handle stays valid even if
    /// the document is closed concurrently; callers observe a consistent
    /// final state either way.
    pub async fn get(&self, id: &DocumentId) -> Option<Arc<Mutex<Document>>> {
        self.documents.read().await.get(id).cloned()
    }

    /// Remove a document; `None` if it was not open (idempotent close).
    pub async fn remove(&self, id: &DocumentId) -> Option<Arc<Mutex<Document>>> {
        self.documents.write().await.remove(id)
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    /// Ids of all open documents.
    pub async fn document_ids(&self) -> Vec<DocumentId> {
        self.documents.read().await.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(file: &str) -> DocumentId {
        DocumentId::new("proj", file)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let registry = DocumentRegistry::new();
        let snap = registry.create(id("a.kd"), "hello").await.unwrap();
        assert_eq!(snap.version, 0);
        assert_eq!(snap.content, "hello");

        let doc = registry.get(&id("a.kd")).await.unwrap();
        assert_eq!(doc.lock().await.content(), "hello");
    }

    #[tokio::test]
    async fn test_create_duplicate_fails() {
        let registry = DocumentRegistry::new();
        registry.create(id("a.kd"), "").await.unwrap();
        let err = registry.create(id("a.kd"), "other").await.unwrap_err();
        assert_eq!(err, SyncError::AlreadyExists(id("a.kd")));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let registry = DocumentRegistry::new();
        assert!(registry.get(&id("nope.kd")).await.is_none());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let registry = DocumentRegistry::new();
        registry.create(id("a.kd"), "").await.unwrap();
        assert!(registry.remove(&id("a.kd")).await.is_some());
        assert!(registry.remove(&id("a.kd")).await.is_none());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_document_ids_lists_open_documents() {
        let registry = DocumentRegistry::new();
        registry.create(id("a.kd"), "").await.unwrap();
        registry.create(id("b.kd"), "").await.unwrap();

        let ids = registry.document_ids().await;
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&id("a.kd")));
        assert!(ids.contains(&id("b.kd")));
    }
}
