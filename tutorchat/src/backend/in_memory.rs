//! In-process backend double for tests and the offline demo.
//!
//! Plays the server side of all three collaborator traits against a single
//! seedable state: rooms, messages (with server-assigned confirmed ids),
//! and profiles. Accepted sends are echoed back through the push-event
//! channel the way the production relay echoes over the WebSocket, and
//! every failure mode the engine must survive can be injected with a
//! toggle.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use tutorchat_types::{Email, Message, MessageId, Profile, Room, RoomId, Timestamp};

use super::{ChannelError, ProfileService, PushChannel, PushEvent, RoomService, ServiceError};

/// Seedable in-memory server implementing [`RoomService`],
/// [`ProfileService`], and [`PushChannel`].
///
/// Cheap to clone; all clones share the same server state, so a test can
/// keep one handle for toggles while the widget owns another.
#[derive(Clone)]
pub struct InMemoryBackend {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<ServerState>,
    push_tx: mpsc::Sender<PushEvent>,
}

#[derive(Default)]
struct ServerState {
    rooms: Vec<Room>,
    messages: HashMap<RoomId, Vec<Message>>,
    profiles: HashMap<Email, Profile>,
    next_room_id: u64,
    next_message_id: u64,
    connected: bool,
    fail_sends: bool,
    fail_mark_read: bool,
    fail_room_list: bool,
    failing_histories: HashSet<RoomId>,
    failing_profiles: HashSet<Email>,
    omitted_previews: HashSet<RoomId>,
    hold_pushes: bool,
    held: Vec<PushEvent>,
}

impl InMemoryBackend {
    /// Creates a connected backend and the receiver for its push events.
    ///
    /// `push_buffer` controls the capacity of the push-event channel.
    #[must_use]
    pub fn new(push_buffer: usize) -> (Self, mpsc::Receiver<PushEvent>) {
        let (push_tx, push_rx) = mpsc::channel(push_buffer);
        let backend = Self {
            inner: Arc::new(Inner {
                state: Mutex::new(ServerState {
                    next_room_id: 1,
                    next_message_id: 1,
                    connected: true,
                    ..ServerState::default()
                }),
                push_tx,
            }),
        };
        (backend, push_rx)
    }

    // --- Seeding ---

    /// Creates a room between a learner and a tutor, returning its id.
    pub fn add_room(&self, learner: Email, tutor: Email) -> RoomId {
        let mut state = self.inner.state.lock();
        let id = RoomId::new(state.next_room_id);
        state.next_room_id += 1;
        state.rooms.push(Room {
            id,
            learner,
            tutor,
            last_message: None,
        });
        id
    }

    /// Seeds a pre-existing message into a room's server history.
    ///
    /// The receiver is the sender's counterpart in the room. Returns the
    /// assigned confirmed id, or `None` if the room or sender is unknown.
    pub fn seed_message(
        &self,
        room_id: RoomId,
        sender: &Email,
        text: &str,
        sent_at: Timestamp,
        is_read: bool,
    ) -> Option<MessageId> {
        let mut state = self.inner.state.lock();
        let receiver = state
            .rooms
            .iter()
            .find(|r| r.id == room_id)?
            .counterpart_of(sender)?
            .clone();
        let id = state.assign_message_id();
        state.messages.entry(room_id).or_default().push(Message {
            id,
            room_id,
            sender: sender.clone(),
            receiver,
            text: text.to_string(),
            sent_at,
            is_read,
        });
        Some(id)
    }

    /// Registers a profile for an email.
    pub fn add_profile(&self, email: Email, profile: Profile) {
        self.inner.state.lock().profiles.insert(email, profile);
    }

    // --- Live traffic helpers for tests ---

    /// Delivers a message from `sender` into the room right now, as if the
    /// counterpart had sent it: stored server-side and pushed to the client.
    ///
    /// Returns the assigned id, or `None` if the room or sender is unknown.
    pub fn deliver(&self, room_id: RoomId, sender: &Email, text: &str) -> Option<MessageId> {
        let message = {
            let mut state = self.inner.state.lock();
            let receiver = state
                .rooms
                .iter()
                .find(|r| r.id == room_id)?
                .counterpart_of(sender)?
                .clone();
            let id = state.assign_message_id();
            let message = Message {
                id,
                room_id,
                sender: sender.clone(),
                receiver,
                text: text.to_string(),
                sent_at: Timestamp::now(),
                is_read: false,
            };
            state
                .messages
                .entry(room_id)
                .or_default()
                .push(message.clone());
            message
        };
        let id = message.id;
        self.emit(PushEvent::Message(message));
        Some(id)
    }

    /// Pushes a read receipt for the given reader in a room.
    pub fn push_read_receipt(&self, room_id: RoomId, reader: Email) {
        self.emit(PushEvent::MessagesRead { room_id, reader });
    }

    /// Returns a copy of the room's server-side history, oldest first.
    #[must_use]
    pub fn server_history(&self, room_id: RoomId) -> Vec<Message> {
        let state = self.inner.state.lock();
        let mut messages = state.messages.get(&room_id).cloned().unwrap_or_default();
        messages.sort_by_key(|m| m.sent_at);
        messages
    }

    // --- Failure injection ---

    /// Connects or disconnects the push channel.
    pub fn set_connected(&self, connected: bool) {
        self.inner.state.lock().connected = connected;
    }

    /// Makes every subsequent send fail.
    pub fn set_fail_sends(&self, fail: bool) {
        self.inner.state.lock().fail_sends = fail;
    }

    /// Makes every subsequent mark-read call fail.
    pub fn set_fail_mark_read(&self, fail: bool) {
        self.inner.state.lock().fail_mark_read = fail;
    }

    /// Makes the room list fetch fail.
    pub fn set_fail_room_list(&self, fail: bool) {
        self.inner.state.lock().fail_room_list = fail;
    }

    /// Makes history fetches for one room fail, leaving the others intact.
    pub fn set_history_failing(&self, room_id: RoomId, fail: bool) {
        let mut state = self.inner.state.lock();
        if fail {
            state.failing_histories.insert(room_id);
        } else {
            state.failing_histories.remove(&room_id);
        }
    }

    /// Makes profile lookups for one email fail.
    pub fn set_profile_failing(&self, email: Email, fail: bool) {
        let mut state = self.inner.state.lock();
        if fail {
            state.failing_profiles.insert(email);
        } else {
            state.failing_profiles.remove(&email);
        }
    }

    /// Strips the last-message preview from a room's list payload, forcing
    /// the directory loader down the tier-2 history-fetch path.
    pub fn set_omit_preview(&self, room_id: RoomId, omit: bool) {
        let mut state = self.inner.state.lock();
        if omit {
            state.omitted_previews.insert(room_id);
        } else {
            state.omitted_previews.remove(&room_id);
        }
    }

    /// Holds push events instead of delivering them (simulates a dropped
    /// channel where the echo never arrives).
    pub fn set_hold_pushes(&self, hold: bool) {
        self.inner.state.lock().hold_pushes = hold;
    }

    /// Delivers every held push event in arrival order.
    pub fn release_pushes(&self) {
        let held: Vec<PushEvent> = {
            let mut state = self.inner.state.lock();
            state.hold_pushes = false;
            state.held.drain(..).collect()
        };
        for event in held {
            self.send_push(event);
        }
    }

    fn emit(&self, event: PushEvent) {
        {
            let mut state = self.inner.state.lock();
            if state.hold_pushes {
                state.held.push(event);
                return;
            }
        }
        self.send_push(event);
    }

    fn send_push(&self, event: PushEvent) {
        if self.inner.push_tx.try_send(event).is_err() {
            tracing::warn!("push event dropped, receiver full or gone");
        }
    }
}

impl ServerState {
    fn assign_message_id(&mut self) -> MessageId {
        let id = MessageId::Confirmed(self.next_message_id);
        self.next_message_id += 1;
        id
    }
}

impl RoomService for InMemoryBackend {
    async fn list_rooms(&self, user: &Email) -> Result<Vec<Room>, ServiceError> {
        let state = self.inner.state.lock();
        if state.fail_room_list {
            return Err(ServiceError::RequestFailed("injected failure".into()));
        }
        let rooms = state
            .rooms
            .iter()
            .filter(|room| room.involves(user))
            .map(|room| {
                let preview = if state.omitted_previews.contains(&room.id) {
                    None
                } else {
                    state
                        .messages
                        .get(&room.id)
                        .and_then(|msgs| msgs.iter().max_by_key(|m| m.sent_at))
                        .cloned()
                };
                Room {
                    last_message: preview,
                    ..room.clone()
                }
            })
            .collect();
        Ok(rooms)
    }

    async fn room_history(&self, room_id: RoomId) -> Result<Vec<Message>, ServiceError> {
        let state = self.inner.state.lock();
        if state.failing_histories.contains(&room_id) {
            return Err(ServiceError::RequestFailed(format!(
                "injected history failure for room {room_id}"
            )));
        }
        let mut messages = state.messages.get(&room_id).cloned().unwrap_or_default();
        messages.sort_by_key(|m| m.sent_at);
        Ok(messages)
    }
}

impl ProfileService for InMemoryBackend {
    async fn fetch_profile(&self, email: &Email) -> Result<Option<Profile>, ServiceError> {
        let state = self.inner.state.lock();
        if state.failing_profiles.contains(email) {
            return Err(ServiceError::Unavailable);
        }
        Ok(state.profiles.get(email).cloned())
    }
}

impl PushChannel for InMemoryBackend {
    fn is_connected(&self) -> bool {
        self.inner.state.lock().connected
    }

    async fn send_message(
        &self,
        room_id: RoomId,
        sender: &Email,
        receiver: &Email,
        text: &str,
    ) -> Result<(), ChannelError> {
        let echo = {
            let mut state = self.inner.state.lock();
            if !state.connected {
                return Err(ChannelError::Disconnected);
            }
            if state.fail_sends {
                return Err(ChannelError::Rejected("injected send failure".into()));
            }
            if !state.rooms.iter().any(|r| r.id == room_id) {
                return Err(ChannelError::Rejected(format!("unknown room {room_id}")));
            }
            let id = state.assign_message_id();
            let message = Message {
                id,
                room_id,
                sender: sender.clone(),
                receiver: receiver.clone(),
                text: text.to_string(),
                sent_at: Timestamp::now(),
                is_read: false,
            };
            state
                .messages
                .entry(room_id)
                .or_default()
                .push(message.clone());
            message
        };
        self.emit(PushEvent::Message(echo));
        Ok(())
    }

    async fn mark_read(&self, room_id: RoomId, reader: &Email) -> Result<(), ChannelError> {
        let mut state = self.inner.state.lock();
        if !state.connected {
            return Err(ChannelError::Disconnected);
        }
        if state.fail_mark_read {
            return Err(ChannelError::Rejected("injected mark-read failure".into()));
        }
        if let Some(messages) = state.messages.get_mut(&room_id) {
            for message in messages.iter_mut().filter(|m| m.receiver == *reader) {
                message.mark_read();
            }
        }
        Ok(())
    }
}
