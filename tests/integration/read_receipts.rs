// Test-specific lint overrides: integration tests use unwrap/expect freely,
// and some pedantic/nursery lints are not appropriate for test code.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_panics_doc,
    clippy::future_not_send,
    clippy::redundant_pub_crate,
    clippy::cast_possible_truncation
)]

//! Integration tests for read-receipt synchronization.
//!
//! Verifies:
//! 1. Opening a room refreshes its history, marks it read on the server,
//!    and only then flips the local copies.
//! 2. A refused mark-read leaves local messages unread so the badge never
//!    disagrees with the server.
//! 3. A failed history fetch keeps the stale local copy intact.
//! 4. Incoming receipts flip the viewer's own sent messages.

use tokio::sync::mpsc;

use tutorchat::backend::in_memory::InMemoryBackend;
use tutorchat::backend::PushEvent;
use tutorchat::config::SyncConfig;
use tutorchat::widget::{ChatWidget, OpenRoomError, WidgetEvent};
use tutorchat_types::{Email, RoomId, Timestamp};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

type Widget = ChatWidget<InMemoryBackend, InMemoryBackend, InMemoryBackend>;

fn learner() -> Email {
    Email::new("learner@example.com")
}

fn tutor() -> Email {
    Email::new("tutor@example.com")
}

/// One room with two unread messages for the learner.
async fn create_widget() -> (
    InMemoryBackend,
    RoomId,
    Widget,
    mpsc::Receiver<WidgetEvent>,
    mpsc::Receiver<PushEvent>,
) {
    let (backend, push_rx) = InMemoryBackend::new(64);
    let room = backend.add_room(learner(), tutor());
    backend.seed_message(room, &tutor(), "first", Timestamp::from_millis(1_000), false);
    backend.seed_message(room, &tutor(), "second", Timestamp::from_millis(2_000), false);

    let (widget, events) = ChatWidget::new(
        learner(),
        backend.clone(),
        backend.clone(),
        backend.clone(),
        SyncConfig::default(),
    );
    widget.refresh().await.unwrap();
    (backend, room, widget, events, push_rx)
}

// ===========================================================================
// Opening a room
// ===========================================================================

#[tokio::test]
async fn open_room_loads_history_and_clears_unread() {
    let (backend, room, widget, mut events, _push_rx) = create_widget().await;
    assert!(widget.room_summaries().await[0].unread);

    widget.open_room(room).await.unwrap();

    assert_eq!(widget.active_room().await, Some(room));
    let conversation = widget.conversation(room).await;
    assert_eq!(conversation.len(), 2);
    assert!(conversation.iter().all(|m| m.is_read));
    assert!(!widget.room_summaries().await[0].unread);
    assert!(backend.server_history(room).iter().all(|m| m.is_read));

    let mut marked = false;
    while let Ok(event) = events.try_recv() {
        if event == (WidgetEvent::RoomMarkedRead { room_id: room }) {
            marked = true;
        }
    }
    assert!(marked, "expected a RoomMarkedRead event");
}

#[tokio::test]
async fn open_unknown_room_is_an_error() {
    let (_backend, _room, widget, _events, _push_rx) = create_widget().await;

    let result = widget.open_room(RoomId::new(999)).await;
    assert!(matches!(result, Err(OpenRoomError::UnknownRoom(_))));
    assert_eq!(widget.active_room().await, None);
}

#[tokio::test]
async fn close_room_deactivates_but_keeps_state() {
    let (_backend, room, widget, _events, _push_rx) = create_widget().await;
    widget.open_room(room).await.unwrap();

    widget.close_room().await;

    assert_eq!(widget.active_room().await, None);
    assert_eq!(widget.conversation(room).await.len(), 2);
}

// ===========================================================================
// Fail-closed read state
// ===========================================================================

#[tokio::test]
async fn refused_mark_read_leaves_messages_unread() {
    let (backend, room, widget, _events, _push_rx) = create_widget().await;
    backend.set_fail_mark_read(true);

    let result = widget.open_room(room).await;

    assert!(matches!(result, Err(OpenRoomError::MarkRead(_))));
    let conversation = widget.conversation(room).await;
    assert_eq!(conversation.len(), 2, "history still loaded");
    assert!(conversation.iter().all(|m| !m.is_read));
    assert!(widget.room_summaries().await[0].unread);
    assert_eq!(
        widget.active_room().await,
        Some(room),
        "the room stays open; reopening retries the mark-read"
    );
}

#[tokio::test]
async fn reopening_after_recovery_clears_unread() {
    let (backend, room, widget, _events, _push_rx) = create_widget().await;
    backend.set_fail_mark_read(true);
    widget.open_room(room).await.unwrap_err();

    backend.set_fail_mark_read(false);
    widget.open_room(room).await.unwrap();

    assert!(!widget.room_summaries().await[0].unread);
}

#[tokio::test]
async fn failed_history_fetch_keeps_the_stale_copy() {
    let (backend, room, widget, _events, mut push_rx) = create_widget().await;
    widget.open_room(room).await.unwrap();
    backend.deliver(room, &tutor(), "third");
    widget.drain_push(&mut push_rx).await;
    assert_eq!(widget.conversation(room).await.len(), 3);

    backend.set_history_failing(room, true);
    let result = widget.open_room(room).await;

    assert!(matches!(result, Err(OpenRoomError::History(_))));
    assert_eq!(
        widget.conversation(room).await.len(),
        3,
        "stale copy untouched"
    );
    assert_eq!(widget.active_room().await, Some(room));
}

#[tokio::test]
async fn refetch_during_pending_send_keeps_the_placeholder_visible() {
    let (backend, room, widget, _events, mut push_rx) = create_widget().await;
    backend.set_hold_pushes(true);
    widget.set_compose(room, "still pending").await;
    widget.send_message(room).await.unwrap();

    // The server already stored the message, so the refetched history
    // contains its confirmed copy while the echo push is still en route.
    widget.open_room(room).await.unwrap();

    let conversation = widget.conversation(room).await;
    assert_eq!(conversation.len(), 4);
    assert_eq!(
        conversation.iter().filter(|m| m.id.is_local()).count(),
        1,
        "the pending send stays visible through the refetch"
    );

    // Once the echo arrives, exactly one copy remains.
    backend.release_pushes();
    widget.drain_push(&mut push_rx).await;
    let conversation = widget.conversation(room).await;
    assert_eq!(conversation.len(), 3);
    assert!(conversation.iter().all(|m| m.id.is_confirmed()));
}

// ===========================================================================
// Incoming receipts
// ===========================================================================

#[tokio::test]
async fn counterpart_receipt_flips_own_sent_messages() {
    let (backend, room, widget, mut events, mut push_rx) = create_widget().await;
    widget.open_room(room).await.unwrap();
    widget.set_compose(room, "Did you get this?").await;
    widget.send_message(room).await.unwrap();
    widget.drain_push(&mut push_rx).await;

    let sent = widget.conversation(room).await.pop().unwrap();
    assert!(!sent.is_read);
    while events.try_recv().is_ok() {}

    backend.push_read_receipt(room, tutor());
    widget.drain_push(&mut push_rx).await;

    let sent = widget.conversation(room).await.pop().unwrap();
    assert!(sent.is_read);
    let mut marked = false;
    while let Ok(event) = events.try_recv() {
        if event == (WidgetEvent::RoomMarkedRead { room_id: room }) {
            marked = true;
        }
    }
    assert!(marked);
}

#[tokio::test]
async fn receipt_for_unknown_room_is_dropped() {
    let (backend, _room, widget, mut events, mut push_rx) = create_widget().await;
    let stray = RoomId::new(999);

    backend.push_read_receipt(stray, tutor());
    widget.drain_push(&mut push_rx).await;

    let mut dropped = false;
    while let Ok(event) = events.try_recv() {
        if event == (WidgetEvent::PushDropped { room_id: stray }) {
            dropped = true;
        }
    }
    assert!(dropped);
}
