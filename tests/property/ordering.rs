// Test-specific lint overrides: property tests use unwrap/expect freely,
// and some pedantic/nursery lints are not appropriate for test code.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_panics_doc,
    clippy::cast_possible_truncation
)]

//! Property-based tests for message ordering and reconciliation.
//!
//! Uses proptest to verify:
//! 1. Appending confirmed messages in any arrival order leaves every room
//!    sorted by send time.
//! 2. Messages with equal timestamps keep their arrival order.
//! 3. Feeding any message twice never produces a duplicate.
//! 4. Echoes for identical pending texts always consume placeholders
//!    oldest first, and every placeholder is consumed exactly once.

use proptest::prelude::*;

use tutorchat::store::{MessageStore, Reconciliation};
use tutorchat_types::{Email, Message, MessageId, RoomId, Timestamp};

// --- Strategies ---

fn learner() -> Email {
    Email::new("learner@example.com")
}

fn tutor() -> Email {
    Email::new("tutor@example.com")
}

/// Strategy for generating arbitrary timestamps from a small range, so
/// collisions are common.
fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
    (0u64..50).prop_map(Timestamp::from_millis)
}

/// Strategy for a batch of inbound messages with distinct confirmed ids
/// and colliding timestamps.
fn arb_inbound_batch() -> impl Strategy<Value = Vec<Message>> {
    prop::collection::vec(arb_timestamp(), 0..40).prop_map(|stamps| {
        stamps
            .into_iter()
            .enumerate()
            .map(|(i, sent_at)| Message {
                id: MessageId::Confirmed(i as u64 + 1),
                room_id: RoomId::new(1),
                sender: tutor(),
                receiver: learner(),
                text: format!("message {i}"),
                sent_at,
                is_read: false,
            })
            .collect()
    })
}

/// Strategy for a pile of pending send texts drawn from a tiny alphabet,
/// so duplicate texts are the norm rather than the exception.
fn arb_pending_texts() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(prop_oneof!["hi", "ok", "see you"], 1..12)
}

// --- Properties ---

proptest! {
    #[test]
    fn appends_always_leave_rooms_sorted(batch in arb_inbound_batch()) {
        let mut store = MessageStore::new();
        for message in batch {
            prop_assert!(store.append(message));
        }

        let messages = store.messages_for(RoomId::new(1));
        for pair in messages.windows(2) {
            prop_assert!(pair[0].sent_at <= pair[1].sent_at);
        }
    }

    #[test]
    fn equal_timestamps_keep_arrival_order(batch in arb_inbound_batch()) {
        let mut store = MessageStore::new();
        for message in &batch {
            store.append(message.clone());
        }

        // Confirmed ids were assigned in arrival order, so among equal
        // timestamps the ids must be ascending.
        let messages = store.messages_for(RoomId::new(1));
        for pair in messages.windows(2) {
            if pair[0].sent_at == pair[1].sent_at {
                prop_assert!(
                    pair[0].id.as_confirmed().unwrap() < pair[1].id.as_confirmed().unwrap()
                );
            }
        }
    }

    #[test]
    fn double_delivery_never_duplicates(batch in arb_inbound_batch()) {
        let mut store = MessageStore::new();
        for message in &batch {
            store.append(message.clone());
        }
        let before = store.messages_for(RoomId::new(1)).to_vec();

        for message in &batch {
            let outcome = store.reconcile_or_append(message.clone(), &learner());
            prop_assert_eq!(outcome, Reconciliation::DroppedDuplicate);
        }

        prop_assert_eq!(store.messages_for(RoomId::new(1)), before.as_slice());
    }

    #[test]
    fn echoes_consume_placeholders_fifo(texts in arb_pending_texts()) {
        let mut store = MessageStore::new();
        let room = RoomId::new(1);

        let mut pending: Vec<(MessageId, String)> = Vec::new();
        for text in &texts {
            let placeholder = Message::placeholder(room, learner(), tutor(), text.clone());
            pending.push((placeholder.id, text.clone()));
            store.append(placeholder);
        }

        // Echo each pending send in order. The server may assign any
        // timestamps; matching is by text alone.
        for (i, text) in texts.iter().enumerate() {
            let echo = Message {
                id: MessageId::Confirmed(1_000 + i as u64),
                room_id: room,
                sender: learner(),
                receiver: tutor(),
                text: text.clone(),
                sent_at: Timestamp::from_millis(u64::MAX - i as u64),
                is_read: false,
            };
            let outcome = store.reconcile_or_append(echo, &learner());

            // The consumed placeholder must be the oldest pending one
            // with this text.
            let expected = pending
                .iter()
                .position(|(_, pending_text)| pending_text == text)
                .unwrap();
            let (expected_id, _) = pending.remove(expected);
            prop_assert_eq!(outcome, Reconciliation::ReplacedPlaceholder(expected_id));
        }

        // Every placeholder was consumed and nothing was duplicated.
        prop_assert!(pending.is_empty());
        let messages = store.messages_for(room);
        prop_assert_eq!(messages.len(), texts.len());
        prop_assert!(messages.iter().all(|m| m.id.is_confirmed()));
    }
}
