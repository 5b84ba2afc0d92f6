//! Operational transformation of concurrent edits.
//!
//! When a client submits an edit against version `v` and the server is
//! already at version `w > v`, the edit's position (and, for deletes, its
//! span) is stated in coordinates that no longer exist. This module re-maps
//! the edit through every operation accepted in `(v, w]`, one at a time and
//! in sequence order, so its effect lands where the client meant it to.
//!
//! ```text
//! client edit (coords of version v)
//!       │ transform(·, op_{v+1})
//!       ▼
//!    coords of version v+1
//!       │ transform(·, op_{v+2})
//!       ▼
//!      ...
//!       ▼
//!    coords of version w   ──► splice into content
//! ```
//!
//! Pairwise rules, with the prior (already-committed) operation always
//! taking positional precedence at ties — the lower sequence id won:
//!
//! - prior insert / incoming insert: prior at or before the incoming
//!   position shifts it right by the inserted length.
//! - prior insert / incoming delete span: an insert at or before the span
//!   start shifts the whole span right (the inserted text survives); an
//!   insert strictly inside widens the span, so the insert is removed with
//!   the context it was placed in.
//! - prior delete / incoming insert: an insert strictly inside the removed
//!   range re-anchors to the range start, since its anchor text is gone.
//! - prior delete / incoming delete span: the overlap has already been
//!   removed and is subtracted from the span (union semantics); a span
//!   swallowed whole becomes a zero-length no-op that is still sequenced.
//! - a prior replace is its delete followed by its insert, at one position.
//!
//! Reference: Ellis & Gibbs, "Concurrency Control in Groupware Systems" (1989).

use crate::operation::OpKind;

/// An edit mid-flight through the transform pipeline: the kind (whose span
/// may shrink or widen) and its position in the current coordinate space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingOp {
    pub kind: OpKind,
    pub position: usize,
}

/// Transform `op` against one committed prior operation.
pub(crate) fn transform(op: PendingOp, prior: &OpKind, prior_pos: usize) -> PendingOp {
    match prior {
        OpKind::Insert { text } => {
            transform_after_insert(op, prior_pos, text.chars().count())
        }
        OpKind::Delete { len } => transform_after_delete(op, prior_pos, *len),
        OpKind::Replace { len, text } => {
            let op = transform_after_delete(op, prior_pos, *len);
            transform_after_insert(op, prior_pos, text.chars().count())
        }
    }
}

fn transform_after_insert(mut op: PendingOp, at: usize, inserted: usize) -> PendingOp {
    match &mut op.kind {
        OpKind::Insert { .. } => {
            if at <= op.position {
                op.position += inserted;
            }
        }
        OpKind::Delete { len } | OpKind::Replace { len, .. } => {
            if at <= op.position {
                op.position += inserted;
            } else if at < op.position + *len {
                *len += inserted;
            }
        }
    }
    op
}

fn transform_after_delete(mut op: PendingOp, at: usize, removed: usize) -> PendingOp {
    let removed_end = at + removed;
    match &mut op.kind {
        OpKind::Insert { .. } => {
            if op.position <= at {
                // Anchored before the removed range; nothing moved under it.
            } else if op.position < removed_end {
                op.position = at;
            } else {
                op.position -= removed;
            }
        }
        OpKind::Delete { len } | OpKind::Replace { len, .. } => {
            let start = op.position;
            let end = start + *len;
            let overlap = end.min(removed_end).saturating_sub(start.max(at));
            *len -= overlap;
            op.position = if start <= at {
                start
            } else if start >= removed_end {
                start - removed
            } else {
                at
            };
        }
    }
    op
}

/// Shift a participant offset across a committed operation.
///
/// Offsets at or after the affected position move by the net length delta;
/// an offset inside a removed span collapses to where the span started.
pub(crate) fn shift_offset(offset: usize, kind: &OpKind, at: usize) -> usize {
    match kind {
        OpKind::Insert { text } => {
            if offset >= at {
                offset + text.chars().count()
            } else {
                offset
            }
        }
        OpKind::Delete { len } => {
            if offset >= at + len {
                offset - len
            } else if offset > at {
                at
            } else {
                offset
            }
        }
        OpKind::Replace { len, text } => {
            let inserted = text.chars().count();
            if offset >= at + len {
                offset - len + inserted
            } else if offset >= at {
                at + inserted
            } else {
                offset
            }
        }
    }
}
