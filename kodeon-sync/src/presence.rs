//! Per-user presence: who is in a document, and where their cursor is.
//!
//! Presence is ephemeral UI state, fully decoupled from document content —
//! losing it loses nothing but a colored caret. Offsets are character
//! offsets into the document and are kept inside `[0, content_len]` both
//! when merged from a client update and when shifted by applied operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// RGBA color used to render a participant's cursor and selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticipantColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ParticipantColor {
    /// Generate a stable, visually distinct color from a user id.
    ///
    /// Derives the hue from the UUID so the same user gets the same color
    /// on every client; saturation/lightness are fixed for vivid carets.
    pub fn from_uuid(id: Uuid) -> Self {
        let hue = ((id.as_u128() % 360) as f32) / 360.0;
        let (r, g, b) = hsl_to_rgb(hue, 0.7, 0.6);
        Self { r, g, b, a: 1.0 }
    }

    pub fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// As an [f32; 4] array for renderers.
    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for ParticipantColor {
    fn default() -> Self {
        Self { r: 0.26, g: 0.52, b: 0.96, a: 1.0 } // Default blue
    }
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (f32, f32, f32) {
    if s == 0.0 {
        return (l, l, l); // Achromatic
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    (
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
    )
}

fn hue_to_rgb(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 1.0 / 2.0 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    p
}

/// One user's live presence within a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: Uuid,
    pub name: String,
    pub color: ParticipantColor,
    /// Cursor position, a character offset into the content.
    pub cursor: usize,
    /// Selection range as (start, end) character offsets; equal when empty.
    pub selection: (usize, usize),
    pub joined_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl Participant {
    pub fn new(user_id: Uuid, name: impl Into<String>, color: ParticipantColor) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            name: name.into(),
            color,
            cursor: 0,
            selection: (0, 0),
            joined_at: now,
            last_active: now,
        }
    }

    /// Merge a presence delta, clamping offsets to `content_len`.
    /// Any update counts as activity.
    pub fn merge(&mut self, update: &PresenceUpdate, content_len: usize) {
        if let Some(cursor) = update.cursor {
            self.cursor = cursor.min(content_len);
        }
        if let Some((start, end)) = update.selection {
            self.selection = (start.min(content_len), end.min(content_len));
        }
        self.last_active = Utc::now();
    }
}

/// A partial presence update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceUpdate {
    pub cursor: Option<usize>,
    pub selection: Option<(usize, usize)>,
}

impl PresenceUpdate {
    pub fn cursor(position: usize) -> Self {
        Self { cursor: Some(position), selection: None }
    }

    pub fn selection(start: usize, end: usize) -> Self {
        Self { cursor: None, selection: Some((start, end)) }
    }

    pub fn with_cursor(mut self, position: usize) -> Self {
        self.cursor = Some(position);
        self
    }

    pub fn with_selection(mut self, start: usize, end: usize) -> Self {
        self.selection = Some((start, end));
        self
    }
}
