//! Inbound push-event handling.

use tokio::sync::mpsc;

use crate::backend::{ProfileService, PushChannel, PushEvent, RoomService};
use crate::store::Reconciliation;
use crate::widget::{ChatWidget, WidgetEvent};

impl<R, P, C> ChatWidget<R, P, C>
where
    R: RoomService,
    P: ProfileService,
    C: PushChannel,
{
    /// Applies one inbound push event to local state.
    ///
    /// Events for rooms the directory does not know are dropped (the next
    /// refresh will pick the room up). Duplicate message deliveries are
    /// absorbed by the store.
    pub async fn handle_push(&self, event: PushEvent) {
        match event {
            PushEvent::Message(message) => {
                let room_id = message.room_id;
                let mut state = self.state.lock().await;
                if !state.directory.iter().any(|room| room.id == room_id) {
                    drop(state);
                    tracing::warn!(%room_id, "message for unknown room dropped");
                    self.emit(WidgetEvent::PushDropped { room_id });
                    return;
                }
                let outcome = state.store.reconcile_or_append(message, &self.viewer);
                drop(state);
                match outcome {
                    Reconciliation::ReplacedPlaceholder(_) => {
                        self.emit(WidgetEvent::MessageReconciled { room_id });
                    }
                    Reconciliation::Appended => {
                        self.emit(WidgetEvent::MessageArrived { room_id });
                    }
                    Reconciliation::DroppedDuplicate => {
                        tracing::debug!(%room_id, "duplicate message delivery ignored");
                    }
                }
            }
            PushEvent::MessagesRead { room_id, reader } => {
                let mut state = self.state.lock().await;
                if !state.directory.iter().any(|room| room.id == room_id) {
                    drop(state);
                    tracing::warn!(%room_id, "read receipt for unknown room dropped");
                    self.emit(WidgetEvent::PushDropped { room_id });
                    return;
                }
                let flipped = state.store.mark_room_read(room_id, &reader);
                drop(state);
                if flipped > 0 {
                    self.emit(WidgetEvent::RoomMarkedRead { room_id });
                }
            }
        }
    }

    /// Drains and applies every push event currently queued.
    pub async fn drain_push(&self, push_rx: &mut mpsc::Receiver<PushEvent>) {
        while let Ok(event) = push_rx.try_recv() {
            self.handle_push(event).await;
        }
    }
}
