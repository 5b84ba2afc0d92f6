//! Append-only operation history for one document.

use uuid::Uuid;

use crate::operation::{OpKind, Operation};

/// Ordered history of accepted operations.
///
/// `append` assigns sequence ids; entries are never mutated or removed, so
/// the log doubles as the audit trail and as late-joiner catch-up material.
#[derive(Debug, Default)]
pub struct OperationLog {
    entries: Vec<Operation>,
}

impl OperationLog {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Append an accepted operation, assigning the next sequence id.
    ///
    /// The returned record's `seq` equals the new document version.
    pub fn append(
        &mut self,
        kind: OpKind,
        position: usize,
        base_version: u64,
        user_id: Uuid,
    ) -> Operation {
        let op = Operation {
            seq: self.entries.len() as u64 + 1,
            kind,
            position,
            base_version,
            user_id,
            timestamp: chrono::Utc::now(),
        };
        self.entries.push(op.clone());
        op
    }

    /// Number of accepted operations (== the document version).
    pub fn len(&self) -> u64 {
        self.entries.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The most recent `limit` operations, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<Operation> {
        let start = self.entries.len().saturating_sub(limit);
        self.entries[start..].to_vec()
    }

    /// All operations with sequence id greater than `version`, in order.
    /// This is exactly what an edit based on `version` must be transformed
    /// against.
    pub fn since(&self, version: u64) -> &[Operation] {
        let start = (version as usize).min(self.entries.len());
        &self.entries[start..]
    }
}
