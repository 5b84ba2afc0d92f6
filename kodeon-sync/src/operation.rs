//! Edit operations and their textual effect.
//!
//! An edit travels through three shapes:
//!
//! ```text
//! EditOp (client intent, positions in the client's last-seen version)
//!    │  transform against concurrent history
//!    ▼
//! PendingOp (positions in the current server version)   [transform.rs]
//!    │  splice into content, assign sequence id
//!    ▼
//! Operation (immutable, sequence-stamped history record)
//! ```
//!
//! All positions are **character offsets**, never byte offsets; splicing is
//! `char`-boundary safe for any UTF-8 content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SyncError;

/// The three edit kinds, matched exhaustively everywhere they are handled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpKind {
    /// Splice `text` in at the operation position.
    Insert { text: String },
    /// Remove `len` characters starting at the operation position.
    Delete { len: usize },
    /// Remove `len` characters and splice `text` in, as one atomic effect.
    Replace { len: usize, text: String },
}

impl OpKind {
    /// Number of characters this operation removes from the document.
    pub fn removed_len(&self) -> usize {
        match self {
            OpKind::Insert { .. } => 0,
            OpKind::Delete { len } | OpKind::Replace { len, .. } => *len,
        }
    }

    /// Number of characters this operation adds to the document.
    pub fn inserted_len(&self) -> usize {
        match self {
            OpKind::Delete { .. } => 0,
            OpKind::Insert { text } | OpKind::Replace { text, .. } => {
                text.chars().count()
            }
        }
    }

    /// Net change in content length, in characters.
    pub fn len_delta(&self) -> isize {
        self.inserted_len() as isize - self.removed_len() as isize
    }

    /// Apply this operation's textual effect at `position`.
    ///
    /// Returns the new content, or `OperationConflict` when the position or
    /// span falls outside the content. The input is never modified, so a
    /// failed apply leaves no trace.
    pub fn apply_to(&self, content: &str, position: usize) -> Result<String, SyncError> {
        let start = byte_at_char(content, position).ok_or_else(|| {
            SyncError::OperationConflict(format!(
                "position {position} is past the end of the content"
            ))
        })?;
        let end = byte_at_char(content, position + self.removed_len()).ok_or_else(|| {
            SyncError::OperationConflict(format!(
                "span [{position}, {}) is past the end of the content",
                position + self.removed_len()
            ))
        })?;

        let inserted = match self {
            OpKind::Delete { .. } => "",
            OpKind::Insert { text } | OpKind::Replace { text, .. } => text.as_str(),
        };

        let mut out =
            String::with_capacity(content.len() - (end - start) + inserted.len());
        out.push_str(&content[..start]);
        out.push_str(inserted);
        out.push_str(&content[end..]);
        Ok(out)
    }
}

/// Byte index of the `pos`-th character, or `None` past the end.
/// `pos == char count` maps to the end of the string.
fn byte_at_char(s: &str, pos: usize) -> Option<usize> {
    s.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(s.len()))
        .nth(pos)
}

/// A client-submitted edit, positioned against the document version the
/// client last observed (`base_version`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditOp {
    pub kind: OpKind,
    pub position: usize,
    pub base_version: u64,
}

impl EditOp {
    pub fn insert(position: usize, text: impl Into<String>, base_version: u64) -> Self {
        Self {
            kind: OpKind::Insert { text: text.into() },
            position,
            base_version,
        }
    }

    pub fn delete(position: usize, len: usize, base_version: u64) -> Self {
        Self {
            kind: OpKind::Delete { len },
            position,
            base_version,
        }
    }

    pub fn replace(
        position: usize,
        len: usize,
        text: impl Into<String>,
        base_version: u64,
    ) -> Self {
        Self {
            kind: OpKind::Replace { len, text: text.into() },
            position,
            base_version,
        }
    }

    /// Serialize to binary (bincode).
    pub fn encode(&self) -> Result<Vec<u8>, SyncError> {
        bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| SyncError::InvalidOperation(e.to_string()))
    }

    /// Deserialize from binary. Malformed bytes are an `InvalidOperation`.
    pub fn decode(bytes: &[u8]) -> Result<Self, SyncError> {
        let (op, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())
            .map_err(|e| SyncError::InvalidOperation(e.to_string()))?;
        Ok(op)
    }
}

/// An accepted, sequence-stamped operation.
///
/// Once assigned a sequence id the record is immutable and permanently part
/// of the document history. `seq` equals the document version produced by
/// applying it. Positions are in the coordinates of version `seq - 1`, i.e.
/// already transformed against everything that came before.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub seq: u64,
    pub kind: OpKind,
    pub position: usize,
    /// The version the client generated the edit against, kept for audit.
    pub base_version: u64,
    pub user_id: Uuid,
    pub timestamp: DateTime<Utc>,
}
