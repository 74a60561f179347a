//! Room types for the two-party conversation channels.
//!
//! A room always has exactly one learner side and one tutor side; "the
//! other party" is computed relative to the signed-in identity. Rooms are
//! created by the server — the client only reads and caches them.

use serde::{Deserialize, Serialize};

use crate::message::{Email, Message};

/// Server-assigned room identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct RoomId(u64);

impl RoomId {
    /// Creates a room identifier from the server-assigned integer.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw server id.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A two-party conversation channel between a learner and a tutor.
///
/// `last_message` is the server's best-effort preview embedded in the room
/// payload; once the client has fetched messages for the room, store data
/// wins over this preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Server-assigned identity of the room.
    pub id: RoomId,
    /// The learner-side participant.
    pub learner: Email,
    /// The tutor-side participant.
    pub tutor: Email,
    /// Best-effort last-message preview from the room payload, if any.
    pub last_message: Option<Message>,
}

impl Room {
    /// Returns `true` if the given identity participates in this room.
    #[must_use]
    pub fn involves(&self, email: &Email) -> bool {
        self.learner == *email || self.tutor == *email
    }

    /// Returns the other party relative to the given viewer.
    ///
    /// `None` if the viewer is not a participant of this room.
    #[must_use]
    pub fn counterpart_of(&self, viewer: &Email) -> Option<&Email> {
        if self.learner == *viewer {
            Some(&self.tutor)
        } else if self.tutor == *viewer {
            Some(&self.learner)
        } else {
            None
        }
    }
}
