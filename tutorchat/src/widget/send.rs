//! Optimistic send pipeline.

use tutorchat_types::{Message, MessageId, RoomId, ValidationError};

use crate::backend::{ChannelError, ProfileService, PushChannel, RoomService};
use crate::widget::{ChatWidget, WidgetEvent};

/// Result of a send attempt that reached a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The server accepted the send; the placeholder with this id sits in
    /// the store until its echo arrives.
    Sent { placeholder: MessageId },
    /// The attempt was a no-op; nothing changed.
    Rejected(SendRejection),
}

/// Reasons a send attempt is refused before anything is mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendRejection {
    /// The draft is empty or whitespace-only.
    EmptyText,
    /// A previous send for this room is still awaiting its result.
    AlreadyInFlight,
    /// The push channel has no live connection.
    Disconnected,
    /// The room is not in the directory.
    UnknownRoom,
}

/// Errors from a send attempt that was actually dispatched.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// The channel refused or lost the message; the placeholder was
    /// rolled back and the draft restored.
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// The draft failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl<R, P, C> ChatWidget<R, P, C>
where
    R: RoomService,
    P: ProfileService,
    C: PushChannel,
{
    /// Sends the room's current draft.
    ///
    /// The message appears in the conversation immediately as a local
    /// placeholder and the draft is cleared before the network call. If
    /// the channel rejects the send, the placeholder is removed and the
    /// draft restored, returning the room to its pre-send state.
    ///
    /// Guard failures (blank draft, send already in flight, disconnected
    /// channel, unknown room) return [`SendOutcome::Rejected`] without
    /// touching any state.
    pub async fn send_message(&self, room_id: RoomId) -> Result<SendOutcome, SendError> {
        let (placeholder_id, receiver, text, draft) = {
            let mut state = self.state.lock().await;

            let draft = state.compose.get(&room_id).cloned().unwrap_or_default();
            let trimmed = draft.trim();
            if trimmed.is_empty() {
                return Ok(SendOutcome::Rejected(SendRejection::EmptyText));
            }
            if state.in_flight.contains(&room_id) {
                return Ok(SendOutcome::Rejected(SendRejection::AlreadyInFlight));
            }
            if !self.channel.is_connected() {
                return Ok(SendOutcome::Rejected(SendRejection::Disconnected));
            }
            let Some(receiver) = state
                .directory
                .iter()
                .find(|room| room.id == room_id)
                .and_then(|room| room.counterpart_of(&self.viewer))
                .cloned()
            else {
                return Ok(SendOutcome::Rejected(SendRejection::UnknownRoom));
            };
            tutorchat_types::validate_text(trimmed, self.config.max_text_len)?;

            let placeholder = Message::placeholder(
                room_id,
                self.viewer.clone(),
                receiver.clone(),
                trimmed,
            );
            let placeholder_id = placeholder.id;
            let text = placeholder.text.clone();
            state.store.append(placeholder);
            state.compose.remove(&room_id);
            state.in_flight.insert(room_id);
            (placeholder_id, receiver, text, draft)
        };

        // Network call without holding the state lock.
        let result = self
            .channel
            .send_message(room_id, &self.viewer, &receiver, &text)
            .await;

        let mut state = self.state.lock().await;
        state.in_flight.remove(&room_id);
        match result {
            Ok(()) => Ok(SendOutcome::Sent {
                placeholder: placeholder_id,
            }),
            Err(error) => {
                state.store.remove(&placeholder_id);
                state.compose.insert(room_id, draft);
                drop(state);
                tracing::warn!(%room_id, %error, "send failed, rolled back placeholder");
                self.emit(WidgetEvent::SendFailed { room_id });
                Err(SendError::Channel(error))
            }
        }
    }
}
