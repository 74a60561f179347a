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

//! Integration tests for directory loading through the widget.
//!
//! Verifies:
//! 1. Refresh backfills missing previews from room histories, tolerating
//!    per-room failures.
//! 2. The backfill fan-out bound still loads everything.
//! 3. A failed room list leaves the engine on its previous directory.

use tokio::sync::mpsc;

use tutorchat::backend::in_memory::InMemoryBackend;
use tutorchat::config::SyncConfig;
use tutorchat::widget::{ChatWidget, WidgetEvent};
use tutorchat_types::{Email, Timestamp};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

type Widget = ChatWidget<InMemoryBackend, InMemoryBackend, InMemoryBackend>;

fn learner() -> Email {
    Email::new("learner@example.com")
}

fn create_widget(
    backend: &InMemoryBackend,
    config: SyncConfig,
) -> (Widget, mpsc::Receiver<WidgetEvent>) {
    ChatWidget::new(
        learner(),
        backend.clone(),
        backend.clone(),
        backend.clone(),
        config,
    )
}

// ===========================================================================
// Preview backfill
// ===========================================================================

#[tokio::test]
async fn refresh_backfills_previews_for_bare_rooms() {
    let (backend, _push_rx) = InMemoryBackend::new(64);
    let tutors: Vec<Email> = (0..6)
        .map(|i| Email::new(&format!("tutor{i}@example.com")))
        .collect();
    for (i, tutor) in tutors.iter().enumerate() {
        let room = backend.add_room(learner(), tutor.clone());
        backend.seed_message(
            room,
            tutor,
            &format!("note {i}"),
            Timestamp::from_millis(1_000 + i as u64),
            true,
        );
        backend.set_omit_preview(room, true);
    }
    let config = SyncConfig {
        preview_fan_out: 2,
        ..SyncConfig::default()
    };
    let (widget, _events) = create_widget(&backend, config);

    widget.refresh().await.unwrap();

    let directory = widget.directory().await;
    assert_eq!(directory.len(), 6);
    for (i, room) in directory.iter().enumerate() {
        let preview = room.last_message.as_ref().unwrap();
        assert_eq!(preview.text, format!("note {i}"));
    }
}

#[tokio::test]
async fn one_failing_backfill_does_not_sink_the_refresh() {
    let (backend, _push_rx) = InMemoryBackend::new(64);
    let tutor_a = Email::new("a@example.com");
    let tutor_b = Email::new("b@example.com");
    let room_a = backend.add_room(learner(), tutor_a.clone());
    let room_b = backend.add_room(learner(), tutor_b.clone());
    backend.seed_message(room_a, &tutor_a, "hi", Timestamp::from_millis(1_000), true);
    backend.seed_message(room_b, &tutor_b, "yo", Timestamp::from_millis(1_000), true);
    backend.set_omit_preview(room_a, true);
    backend.set_omit_preview(room_b, true);
    backend.set_history_failing(room_a, true);
    let (widget, mut events) = create_widget(&backend, SyncConfig::default());

    widget.refresh().await.unwrap();

    let directory = widget.directory().await;
    assert!(directory[0].last_message.is_none());
    assert!(directory[1].last_message.is_some());
    assert_eq!(
        events.try_recv().unwrap(),
        WidgetEvent::RoomsRefreshed { count: 2 }
    );
}

#[tokio::test]
async fn empty_directory_refreshes_cleanly() {
    let (backend, _push_rx) = InMemoryBackend::new(64);
    let (widget, mut events) = create_widget(&backend, SyncConfig::default());

    widget.refresh().await.unwrap();

    assert!(widget.directory().await.is_empty());
    assert!(widget.room_summaries().await.is_empty());
    assert_eq!(
        events.try_recv().unwrap(),
        WidgetEvent::RoomsRefreshed { count: 0 }
    );
}

// ===========================================================================
// Room-list failure
// ===========================================================================

#[tokio::test]
async fn failed_room_list_keeps_previous_directory_and_emits_nothing() {
    let (backend, _push_rx) = InMemoryBackend::new(64);
    backend.add_room(learner(), Email::new("tutor@example.com"));
    let (widget, mut events) = create_widget(&backend, SyncConfig::default());
    widget.refresh().await.unwrap();
    while events.try_recv().is_ok() {}

    backend.set_fail_room_list(true);
    assert!(widget.refresh().await.is_err());

    assert_eq!(widget.directory().await.len(), 1);
    assert!(events.try_recv().is_err(), "no refresh event on failure");
}

#[tokio::test]
async fn refresh_picks_up_rooms_created_since_last_load() {
    let (backend, _push_rx) = InMemoryBackend::new(64);
    backend.add_room(learner(), Email::new("first@example.com"));
    let (widget, _events) = create_widget(&backend, SyncConfig::default());
    widget.refresh().await.unwrap();
    assert_eq!(widget.directory().await.len(), 1);

    backend.add_room(learner(), Email::new("second@example.com"));
    widget.refresh().await.unwrap();
    assert_eq!(widget.directory().await.len(), 2);
}
