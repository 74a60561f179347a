//! Derived room summaries.
//!
//! Summaries are pure projections: recomputed from the directory and the
//! store on demand, never maintained incrementally, so they cannot drift
//! from the message state they describe.

use tutorchat_types::{Email, Message, Room, RoomId};

use crate::store::MessageStore;

/// A room's list-row state: its newest message and whether that message
/// is unread by the viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSummary {
    pub room_id: RoomId,
    /// Newest known message, from the store or the directory preview.
    pub last_message: Option<Message>,
    /// True when the last message is addressed to the viewer and unread.
    ///
    /// Deliberately based on the last message only: older unread messages
    /// behind a read one do not badge the room.
    pub unread: bool,
}

/// Projects one summary per directory room, in directory order.
#[must_use]
pub fn summarize(directory: &[Room], store: &MessageStore, viewer: &Email) -> Vec<RoomSummary> {
    directory
        .iter()
        .map(|room| summarize_room(room, store, viewer))
        .collect()
}

/// Projects a single room's summary.
///
/// The store's copy of the room wins over the directory preview when both
/// exist; the preview only fills in before any history has been loaded.
#[must_use]
pub fn summarize_room(room: &Room, store: &MessageStore, viewer: &Email) -> RoomSummary {
    let last_message = store
        .last_message_in(room.id)
        .cloned()
        .or_else(|| room.last_message.clone());
    let unread = last_message
        .as_ref()
        .is_some_and(|m| m.receiver == *viewer && !m.is_read);
    RoomSummary {
        room_id: room.id,
        last_message,
        unread,
    }
}
