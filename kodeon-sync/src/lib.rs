//! # kodeon-sync — Real-time collaborative editing core for KODEON
//!
//! Operation-based synchronization of shared text documents: concurrent
//! edits from multiple users are reconciled with operational transformation
//! so every client converges on identical content.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐  EditOp (baseVersion)   ┌──────────────────┐
//! │ Transport  │ ───────────────────────►│    SyncEngine    │
//! │ (external) │                         │  per-doc mutex   │
//! └─────▲──────┘                         └────────┬─────────┘
//!       │                                         │
//!       │ SyncEvent                    ┌──────────┼──────────┐
//!       │                              ▼          ▼          ▼
//! ┌─────┴──────┐                 ┌──────────┐ ┌────────┐ ┌─────────┐
//! │ EventSink  │◄────────────────│ Document │ │ OpLog  │ │ Roster  │
//! │ (injected) │  transformed op │ content  │ │ seq'd  │ │ cursors │
//! └────────────┘                 └──────────┘ └────────┘ └─────────┘
//! ```
//!
//! ## Modules
//!
//! - [`engine`] — the facade: create/join/submit/presence/history/close
//! - `transform` — operational transformation of concurrent edits
//! - [`document`] — authoritative per-document state and snapshots
//! - [`oplog`] — append-only, sequence-stamped operation history
//! - [`presence`] — participant roster, cursors, stable user colors
//! - [`notify`] — event boundary (`EventSink`, broadcast fan-out)
//!
//! The engine is a library: it owns no sockets and no disk. A transport
//! feeds it authenticated calls and fans its events out to clients; a
//! persistence layer, if any, subscribes to the same events.

pub mod document;
pub mod engine;
pub mod error;
pub mod notify;
pub mod operation;
pub mod oplog;
pub mod presence;
pub mod registry;
mod transform;

pub use document::{DocumentId, DocumentSnapshot};
pub use engine::SyncEngine;
pub use error::SyncError;
pub use notify::{BroadcastSink, EventSink, NotifierStats, NullSink, SyncEvent};
pub use operation::{EditOp, OpKind, Operation};
pub use presence::{Participant, ParticipantColor, PresenceUpdate};
pub use registry::DocumentRegistry;
