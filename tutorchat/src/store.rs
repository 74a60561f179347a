//! Per-room message storage.
//!
//! The store is the single owner of message state. Each room's slice is
//! kept sorted by send time on insertion, local placeholders are
//! reconciled against their server echoes in place, and confirmed ids
//! are deduplicated so a replayed push never doubles a message. An
//! in-place replacement may carry a newer server timestamp than its
//! neighbors, so newest-message queries scan instead of reading the
//! tail.

use std::collections::HashMap;

use tutorchat_types::{Email, Message, MessageId, RoomId};

/// Outcome of feeding a server-confirmed message into the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// The message replaced an optimistic placeholder; carries the id the
    /// placeholder held before it was swapped out.
    ReplacedPlaceholder(MessageId),
    /// No matching placeholder; the message was inserted as new.
    Appended,
    /// A message with this confirmed id was already present.
    DroppedDuplicate,
}

/// Messages for every known room, keyed by room id.
#[derive(Debug, Default)]
pub struct MessageStore {
    rooms: HashMap<RoomId, Vec<Message>>,
}

impl MessageStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces a room's messages wholesale with a freshly fetched history.
    ///
    /// The history is re-sorted by send time; ties keep their fetch order.
    /// Local placeholders still awaiting their echo are carried over, so a
    /// refetch that races an in-flight send never hides the pending
    /// message.
    pub fn replace_room(&mut self, room_id: RoomId, mut messages: Vec<Message>) {
        messages.sort_by_key(|m| m.sent_at);
        let slot = self.rooms.entry(room_id).or_default();
        let pending: Vec<Message> = slot.drain(..).filter(|m| m.id.is_local()).collect();
        *slot = messages;
        for placeholder in pending {
            insert_sorted(slot, placeholder);
        }
    }

    /// Inserts a message into its room in send-time order.
    ///
    /// Equal timestamps land after existing entries, so arrival order is
    /// preserved among ties. Returns `false` without inserting when the
    /// message carries a confirmed id already present in the room.
    pub fn append(&mut self, message: Message) -> bool {
        let slot = self.rooms.entry(message.room_id).or_default();
        if let MessageId::Confirmed(_) = message.id
            && slot.iter().any(|m| m.id == message.id)
        {
            return false;
        }
        insert_sorted(slot, message);
        true
    }

    /// Feeds a server-confirmed message into a room.
    ///
    /// If the message is the viewer's own echo, it replaces the oldest
    /// local placeholder with the same sender and text at that
    /// placeholder's position, keeping any read state either copy already
    /// carries. Otherwise it is inserted like [`append`](Self::append).
    pub fn reconcile_or_append(&mut self, confirmed: Message, viewer: &Email) -> Reconciliation {
        let slot = self.rooms.entry(confirmed.room_id).or_default();
        if slot.iter().any(|m| m.id == confirmed.id) {
            // A history refetch may have landed the echo already while the
            // placeholder rode along; consume the placeholder here so both
            // copies are never visible at once.
            if confirmed.sender == *viewer
                && let Some(idx) = slot.iter().position(|m| {
                    m.id.is_local() && m.sender == confirmed.sender && m.text == confirmed.text
                })
            {
                slot.remove(idx);
            }
            return Reconciliation::DroppedDuplicate;
        }

        if confirmed.sender == *viewer
            && let Some(idx) = slot.iter().position(|m| {
                m.id.is_local() && m.sender == confirmed.sender && m.text == confirmed.text
            })
        {
            let placeholder_id = slot[idx].id;
            let was_read = slot[idx].is_read;
            slot[idx] = confirmed;
            if was_read {
                slot[idx].mark_read();
            }
            return Reconciliation::ReplacedPlaceholder(placeholder_id);
        }

        insert_sorted(slot, confirmed);
        Reconciliation::Appended
    }

    /// Marks every unread message addressed to `reader` in a room as read.
    ///
    /// Returns how many messages were flipped. Messages the reader sent
    /// are untouched.
    pub fn mark_room_read(&mut self, room_id: RoomId, reader: &Email) -> usize {
        let Some(slot) = self.rooms.get_mut(&room_id) else {
            return 0;
        };
        let mut flipped = 0;
        for message in slot
            .iter_mut()
            .filter(|m| m.receiver == *reader && !m.is_read)
        {
            message.mark_read();
            flipped += 1;
        }
        flipped
    }

    /// Removes a message by id from whichever room holds it.
    pub fn remove(&mut self, id: &MessageId) -> Option<Message> {
        for slot in self.rooms.values_mut() {
            if let Some(idx) = slot.iter().position(|m| m.id == *id) {
                return Some(slot.remove(idx));
            }
        }
        None
    }

    /// The room's messages in display order. Empty for unknown rooms.
    #[must_use]
    pub fn messages_for(&self, room_id: RoomId) -> &[Message] {
        self.rooms.get(&room_id).map_or(&[], Vec::as_slice)
    }

    /// The newest message in a room, if any.
    ///
    /// Picks the maximum `sent_at`, with ties going to the later position.
    /// A full scan rather than `last()`: an echo reconciled in place keeps
    /// its placeholder's slot even when its server timestamp is newer than
    /// everything after it.
    #[must_use]
    pub fn last_message_in(&self, room_id: RoomId) -> Option<&Message> {
        self.rooms.get(&room_id).and_then(|slot| {
            slot.iter()
                .reduce(|best, m| if m.sent_at >= best.sent_at { m } else { best })
        })
    }
}

/// Inserts into a slice sorted by `sent_at`, placing ties after existing
/// entries.
fn insert_sorted(slot: &mut Vec<Message>, message: Message) {
    let idx = slot
        .iter()
        .rposition(|m| m.sent_at <= message.sent_at)
        .map_or(0, |i| i + 1);
    slot.insert(idx, message);
}
