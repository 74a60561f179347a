//! The chat widget engine.
//!
//! [`ChatWidget`] owns all client-side chat state behind an async mutex
//! and exposes the operations the host UI drives: refreshing the room
//! directory, composing and sending, opening rooms, and feeding inbound
//! push events. State changes the host should repaint for are announced
//! on a best-effort [`WidgetEvent`] channel.

mod receipts;
mod receive;
mod send;

pub use receipts::OpenRoomError;
pub use send::{SendError, SendOutcome, SendRejection};

use std::collections::{HashMap, HashSet};

use tokio::sync::{mpsc, Mutex};

use tutorchat_types::{Email, Message, Profile, Room, RoomId};

use crate::backend::{ProfileService, PushChannel, RoomService, ServiceError};
use crate::config::SyncConfig;
use crate::directory;
use crate::profiles::ProfileEnricher;
use crate::projection::{self, RoomSummary};
use crate::store::MessageStore;

/// Notifications for the host UI. Delivery is best-effort: a full channel
/// drops the event rather than stalling the engine, and the projections
/// remain the source of truth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetEvent {
    /// The directory was reloaded.
    RoomsRefreshed { count: usize },
    /// A counterpart's message landed in a room.
    MessageArrived { room_id: RoomId },
    /// A send echo replaced its placeholder.
    MessageReconciled { room_id: RoomId },
    /// An optimistic send failed and was rolled back.
    SendFailed { room_id: RoomId },
    /// A room's inbound messages were marked read.
    RoomMarkedRead { room_id: RoomId },
    /// A push event referenced a room the directory does not know.
    PushDropped { room_id: RoomId },
}

pub(crate) struct WidgetState {
    pub(crate) directory: Vec<Room>,
    pub(crate) store: MessageStore,
    /// Draft text per room, surviving room switches.
    pub(crate) compose: HashMap<RoomId, String>,
    /// Rooms with a send awaiting its network result.
    pub(crate) in_flight: HashSet<RoomId>,
    pub(crate) active_room: Option<RoomId>,
}

/// Client-side chat engine for one signed-in viewer.
pub struct ChatWidget<R, P, C> {
    pub(crate) viewer: Email,
    pub(crate) rooms: R,
    pub(crate) channel: C,
    pub(crate) profiles: ProfileEnricher<P>,
    pub(crate) state: Mutex<WidgetState>,
    pub(crate) event_tx: mpsc::Sender<WidgetEvent>,
    pub(crate) config: SyncConfig,
}

impl<R, P, C> ChatWidget<R, P, C>
where
    R: RoomService,
    P: ProfileService,
    C: PushChannel,
{
    /// Builds a widget and the receiver for its UI events.
    pub fn new(
        viewer: Email,
        rooms: R,
        profiles: P,
        channel: C,
        config: SyncConfig,
    ) -> (Self, mpsc::Receiver<WidgetEvent>) {
        let (event_tx, event_rx) = mpsc::channel(config.event_buffer);
        let widget = Self {
            viewer,
            rooms,
            channel,
            profiles: ProfileEnricher::new(profiles),
            state: Mutex::new(WidgetState {
                directory: Vec::new(),
                store: MessageStore::new(),
                compose: HashMap::new(),
                in_flight: HashSet::new(),
                active_room: None,
            }),
            event_tx,
            config,
        };
        (widget, event_rx)
    }

    /// Reloads the room directory and warms counterpart profiles.
    ///
    /// On failure the previous directory is kept untouched.
    pub async fn refresh(&self) -> Result<(), ServiceError> {
        let loaded =
            directory::load(&self.rooms, &self.viewer, self.config.preview_fan_out).await?;
        let count = loaded.rooms.len();
        {
            let mut state = self.state.lock().await;
            state.directory = loaded.rooms;
        }
        self.emit(WidgetEvent::RoomsRefreshed { count });
        self.profiles.warm(&loaded.counterparts).await;
        Ok(())
    }

    /// The signed-in viewer's address.
    #[must_use]
    pub fn viewer(&self) -> &Email {
        &self.viewer
    }

    /// Snapshot of the room directory.
    pub async fn directory(&self) -> Vec<Room> {
        self.state.lock().await.directory.clone()
    }

    /// One summary per directory room, in directory order.
    pub async fn room_summaries(&self) -> Vec<RoomSummary> {
        let state = self.state.lock().await;
        projection::summarize(&state.directory, &state.store, &self.viewer)
    }

    /// The room's messages in display order.
    pub async fn conversation(&self, room_id: RoomId) -> Vec<Message> {
        self.state.lock().await.store.messages_for(room_id).to_vec()
    }

    /// The currently open room, if any.
    pub async fn active_room(&self) -> Option<RoomId> {
        self.state.lock().await.active_room
    }

    /// The saved draft for a room.
    pub async fn compose_text(&self, room_id: RoomId) -> String {
        self.state
            .lock()
            .await
            .compose
            .get(&room_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Stores the draft text for a room.
    pub async fn set_compose(&self, room_id: RoomId, text: impl Into<String>) {
        self.state.lock().await.compose.insert(room_id, text.into());
    }

    /// Resolves a participant's display profile, fetching if needed.
    pub async fn profile(&self, email: &Email) -> Profile {
        self.profiles.resolve(email).await
    }

    /// Returns a participant's profile only if already cached.
    #[must_use]
    pub fn cached_profile(&self, email: &Email) -> Option<Profile> {
        self.profiles.cached(email)
    }

    pub(crate) fn emit(&self, event: WidgetEvent) {
        if let Err(err) = self.event_tx.try_send(event) {
            tracing::debug!(?err, "widget event dropped");
        }
    }
}
