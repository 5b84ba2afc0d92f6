//! Authoritative per-document state: content, history, and roster.
//!
//! A `Document` is only ever touched under its registry mutex, so every
//! method here can assume exclusive access. The transform → splice → append
//! → shift pipeline in [`Document::apply_edit`] commits all-or-nothing: the
//! splice is computed into a fresh string first, and nothing is written
//! back until it has succeeded.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SyncError;
use crate::operation::{EditOp, Operation};
use crate::oplog::OperationLog;
use crate::presence::{Participant, ParticipantColor, PresenceUpdate};
use crate::transform::{shift_offset, transform, PendingOp};

/// Document identity: the (project, file) pair, unique per session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId {
    pub project_id: String,
    pub file_id: String,
}

impl DocumentId {
    pub fn new(project_id: impl Into<String>, file_id: impl Into<String>) -> Self {
        Self { project_id: project_id.into(), file_id: file_id.into() }
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.project_id, self.file_id)
    }
}

/// One collaborative document.
#[derive(Debug)]
pub struct Document {
    id: DocumentId,
    content: String,
    log: OperationLog,
    participants: HashMap<Uuid, Participant>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(id: DocumentId, initial_content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            content: initial_content.into(),
            log: OperationLog::new(),
            participants: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Current version. Derived from the log length, so the
    /// version-equals-history-length invariant holds by construction.
    pub fn version(&self) -> u64 {
        self.log.len()
    }

    /// Content length in characters (the coordinate space of every offset).
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    pub fn log(&self) -> &OperationLog {
        &self.log
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn participant(&self, user_id: &Uuid) -> Option<&Participant> {
        self.participants.get(user_id)
    }

    /// Reconcile a client edit against concurrent history and apply it.
    ///
    /// Implements the submit contract: version check, transform catch-up,
    /// splice, sequence assignment, and presence offset shifting — atomic
    /// with respect to failure (an error mutates nothing).
    pub fn apply_edit(&mut self, user_id: Uuid, edit: EditOp) -> Result<Operation, SyncError> {
        let server_version = self.version();
        if edit.base_version > server_version {
            return Err(SyncError::InvalidOperation(format!(
                "base version {} is ahead of server version {server_version}",
                edit.base_version
            )));
        }

        let mut pending = PendingOp { kind: edit.kind, position: edit.position };
        for prior in self.log.since(edit.base_version) {
            pending = transform(pending, &prior.kind, prior.position);
        }

        let content = pending.kind.apply_to(&self.content, pending.position)?;

        // The splice succeeded; commit everything as one unit.
        self.content = content;
        let op = self.log.append(pending.kind, pending.position, edit.base_version, user_id);
        self.shift_presence(&op);
        if let Some(author) = self.participants.get_mut(&user_id) {
            author.last_active = op.timestamp;
        }
        self.updated_at = op.timestamp;
        Ok(op)
    }

    /// Move every participant's cursor/selection across an applied
    /// operation, clamped to the new content length.
    fn shift_presence(&mut self, op: &Operation) {
        let max = self.content.chars().count();
        for p in self.participants.values_mut() {
            p.cursor = shift_offset(p.cursor, &op.kind, op.position).min(max);
            p.selection = (
                shift_offset(p.selection.0, &op.kind, op.position).min(max),
                shift_offset(p.selection.1, &op.kind, op.position).min(max),
            );
        }
    }

    /// Add a user to the roster. Rejoining is not an error: the existing
    /// participant is returned and the `bool` is false.
    pub fn join(
        &mut self,
        user_id: Uuid,
        name: impl Into<String>,
        color: ParticipantColor,
    ) -> (Participant, bool) {
        if let Some(existing) = self.participants.get_mut(&user_id) {
            existing.last_active = Utc::now();
            return (existing.clone(), false);
        }
        let participant = Participant::new(user_id, name, color);
        self.participants.insert(user_id, participant.clone());
        (participant, true)
    }

    /// Remove a user from the roster; `None` if they were not present.
    pub fn leave(&mut self, user_id: &Uuid) -> Option<Participant> {
        self.participants.remove(user_id)
    }

    /// Merge a presence delta for a joined user.
    pub fn update_presence(
        &mut self,
        user_id: Uuid,
        update: &PresenceUpdate,
    ) -> Result<Participant, SyncError> {
        let content_len = self.content.chars().count();
        let participant = self
            .participants
            .get_mut(&user_id)
            .ok_or(SyncError::NotAParticipant(user_id))?;
        participant.merge(update, content_len);
        Ok(participant.clone())
    }

    /// Immutable view for callers outside the engine.
    pub fn snapshot(&self) -> DocumentSnapshot {
        let mut participants: Vec<Participant> =
            self.participants.values().cloned().collect();
        participants.sort_by(|a, b| {
            a.joined_at.cmp(&b.joined_at).then(a.user_id.cmp(&b.user_id))
        });
        DocumentSnapshot {
            id: self.id.clone(),
            content: self.content.clone(),
            version: self.version(),
            participants,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// A point-in-time view of a document, detached from the engine's locks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub id: DocumentId,
    pub content: String,
    pub version: u64,
    /// Roster ordered by join time for stable presentation.
    pub participants: Vec<Participant>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
