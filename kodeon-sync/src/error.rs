//! Error taxonomy for the synchronization engine.
//!
//! Every failure is synchronous and local to the caller — the engine never
//! retries internally. A transport that receives `OperationConflict` may
//! resubmit the edit with a refreshed base version.

use uuid::Uuid;

use crate::document::DocumentId;

/// Engine errors.
///
/// No error leaves a document partially mutated: the transform/apply path
/// commits content, log, and presence shifts as one unit or not at all.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncError {
    /// No open document with this id.
    DocumentNotFound(DocumentId),
    /// `create_document` for a (project, file) pair that is already open.
    AlreadyExists(DocumentId),
    /// Malformed operation, or a base version ahead of the server.
    InvalidOperation(String),
    /// The transformed operation cannot be applied deterministically.
    OperationConflict(String),
    /// Presence update from a user that never joined the document.
    NotAParticipant(Uuid),
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DocumentNotFound(id) => write!(f, "Document not found: {id}"),
            Self::AlreadyExists(id) => write!(f, "Document already open: {id}"),
            Self::InvalidOperation(msg) => write!(f, "Invalid operation: {msg}"),
            Self::OperationConflict(msg) => write!(f, "Operation conflict: {msg}"),
            Self::NotAParticipant(user) => {
                write!(f, "User {user} has not joined this document")
            }
        }
    }
}

impl std::error::Error for SyncError {}
