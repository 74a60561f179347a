//! Opening a room: history fetch and read-receipt synchronization.

use tutorchat_types::RoomId;

use crate::backend::{ChannelError, ProfileService, PushChannel, RoomService, ServiceError};
use crate::widget::{ChatWidget, WidgetEvent};

/// Errors from opening a room. All leave the room active; the failed
/// step can be retried by reopening.
#[derive(Debug, thiserror::Error)]
pub enum OpenRoomError {
    /// The room is not in the directory.
    #[error("room {0} is not in the directory")]
    UnknownRoom(RoomId),

    /// The history fetch failed; the local copy is stale but intact.
    #[error("failed to fetch room history: {0}")]
    History(#[from] ServiceError),

    /// The server did not acknowledge the read; local messages stay
    /// unread so the badge cannot disagree with the server.
    #[error("failed to mark room read on server: {0}")]
    MarkRead(#[from] ChannelError),
}

impl<R, P, C> ChatWidget<R, P, C>
where
    R: RoomService,
    P: ProfileService,
    C: PushChannel,
{
    /// Opens a room: activates it, replaces its local history with a fresh
    /// fetch, and synchronizes read state.
    ///
    /// Read state flips server-first. Only after the server acknowledges
    /// the mark-read are local messages flipped; if it refuses, they stay
    /// unread.
    pub async fn open_room(&self, room_id: RoomId) -> Result<(), OpenRoomError> {
        {
            let mut state = self.state.lock().await;
            if !state.directory.iter().any(|room| room.id == room_id) {
                return Err(OpenRoomError::UnknownRoom(room_id));
            }
            state.active_room = Some(room_id);
        }

        let history = match self.rooms.room_history(room_id).await {
            Ok(history) => history,
            Err(error) => {
                tracing::warn!(%room_id, %error, "history fetch failed, keeping stale copy");
                return Err(OpenRoomError::History(error));
            }
        };
        {
            let mut state = self.state.lock().await;
            state.store.replace_room(room_id, history);
        }

        if let Err(error) = self.channel.mark_read(room_id, &self.viewer).await {
            tracing::warn!(%room_id, %error, "mark-read not acknowledged, leaving messages unread");
            return Err(OpenRoomError::MarkRead(error));
        }
        {
            let mut state = self.state.lock().await;
            state.store.mark_room_read(room_id, &self.viewer);
        }
        self.emit(WidgetEvent::RoomMarkedRead { room_id });
        Ok(())
    }

    /// Deactivates the open room, keeping its state cached.
    pub async fn close_room(&self) {
        self.state.lock().await.active_room = None;
    }
}
