//! Server-facing collaborator seam.
//!
//! Defines the traits the engine consumes: [`RoomService`] and
//! [`ProfileService`] for REST fetches, and [`PushChannel`] for the live
//! channel. The engine never sees a wire format — collaborators exchange
//! typed values and deliver inbound events through an mpsc stream of
//! [`PushEvent`]s.
//!
//! Concrete implementations:
//! - [`in_memory::InMemoryBackend`] — in-process double for tests and the
//!   offline demo.
//! - The production HTTP/WebSocket adapters live in the host application.

pub mod in_memory;

use tutorchat_types::{Email, Message, Profile, Room, RoomId};

/// Errors from the REST-style services (room list, history, profiles).
///
/// All of these are transient from the engine's point of view: the
/// affected slice is left empty or stale and the caller gets a retry
/// affordance. Nothing here is fatal.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The request failed (network, server error, etc.).
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// The service is unreachable.
    #[error("service unavailable")]
    Unavailable,

    /// The response could not be interpreted.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Errors from the push channel's outbound primitives.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The channel is not connected.
    #[error("push channel disconnected")]
    Disconnected,

    /// The server rejected the operation.
    #[error("rejected by server: {0}")]
    Rejected(String),

    /// The operation timed out.
    #[error("push channel operation timed out")]
    Timeout,
}

/// Inbound events delivered by the push channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushEvent {
    /// A new server-confirmed message (a counterpart's message or the
    /// authoritative echo of the viewer's own send).
    Message(Message),
    /// The named reader has read the messages addressed to them in a room.
    MessagesRead {
        /// The room whose messages were read.
        room_id: RoomId,
        /// The participant who read them.
        reader: Email,
    },
}

/// REST service for rooms and message history.
pub trait RoomService: Send + Sync {
    /// Lists the rooms the given user participates in, in server order.
    ///
    /// Each room may carry a best-effort `last_message` preview.
    fn list_rooms(
        &self,
        user: &Email,
    ) -> impl std::future::Future<Output = Result<Vec<Room>, ServiceError>> + Send;

    /// Fetches the full message history of a room, oldest first.
    fn room_history(
        &self,
        room_id: RoomId,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, ServiceError>> + Send;
}

/// REST service for participant display profiles.
pub trait ProfileService: Send + Sync {
    /// Looks up the profile for an email.
    ///
    /// `Ok(None)` means the service definitively knows nothing about the
    /// address (as opposed to a transient failure).
    fn fetch_profile(
        &self,
        email: &Email,
    ) -> impl std::future::Future<Output = Result<Option<Profile>, ServiceError>> + Send;
}

/// Outbound side of the live push channel.
///
/// The inbound side is an `mpsc::Receiver<PushEvent>` handed to the host
/// when the channel is created; the engine consumes it through
/// [`ChatWidget::handle_push`](crate::widget::ChatWidget::handle_push).
pub trait PushChannel: Send + Sync {
    /// Whether the channel currently has a live connection.
    fn is_connected(&self) -> bool;

    /// Sends a message over the channel.
    ///
    /// Success means the server accepted the send; the authoritative copy
    /// arrives later as a [`PushEvent::Message`] echo.
    fn send_message(
        &self,
        room_id: RoomId,
        sender: &Email,
        receiver: &Email,
        text: &str,
    ) -> impl std::future::Future<Output = Result<(), ChannelError>> + Send;

    /// Tells the server the reader has read the room's messages.
    fn mark_read(
        &self,
        room_id: RoomId,
        reader: &Email,
    ) -> impl std::future::Future<Output = Result<(), ChannelError>> + Send;
}
