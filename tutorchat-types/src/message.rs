//! Chat message types and the two message-identity regimes.
//!
//! A message is either *server-confirmed* (positive integer id assigned by
//! the server, globally unique, increasing enough for tie-breaking) or an
//! *optimistic placeholder* (client-generated [`LocalId`], drawn from a
//! disjoint id space, never persisted remotely). The tagged [`MessageId`]
//! union makes the two regimes exhaustively checkable instead of
//! overloading sign bits.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::room::RoomId;

/// Maximum allowed message text length in bytes (4 KB).
pub const MAX_TEXT_LEN: usize = 4 * 1024;

/// Client-local identifier for an optimistic placeholder message.
///
/// UUID v7 for time-ordering, so two placeholders created in quick
/// succession still sort by creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalId(Uuid);

impl LocalId {
    /// Creates a fresh local identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `LocalId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID value.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for LocalId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LocalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Message identity, tagged by which side minted it.
///
/// The serde representation is untagged: a confirmed id serializes as the
/// bare server integer (the REST wire shape), a local id as its UUID
/// string. A local id never crosses the wire in practice — placeholders
/// exist only in client memory until reconciled or discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageId {
    /// Server-assigned, globally unique, positive integer.
    Confirmed(u64),
    /// Client-generated placeholder id, disjoint from the server space.
    Local(LocalId),
}

impl MessageId {
    /// Returns `true` if this id was assigned by the server.
    #[must_use]
    pub const fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed(_))
    }

    /// Returns `true` if this id identifies an optimistic placeholder.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }

    /// Returns the server id, if this is a confirmed message.
    #[must_use]
    pub const fn as_confirmed(&self) -> Option<u64> {
        match self {
            Self::Confirmed(id) => Some(*id),
            Self::Local(_) => None,
        }
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Confirmed(id) => write!(f, "{id}"),
            Self::Local(id) => write!(f, "local-{id}"),
        }
    }
}

/// A participant identity: the email address the marketplace keys users by.
///
/// Normalized to lowercase with surrounding whitespace trimmed, so
/// comparisons against server payloads never miss on casing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct Email(String);

impl Email {
    /// Creates a normalized email identity.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into().trim().to_lowercase())
    }

    /// Returns the normalized address.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the local part (everything before the `@`).
    #[must_use]
    pub fn local_part(&self) -> &str {
        self.0.split('@').next().unwrap_or(&self.0)
    }
}

impl From<String> for Email {
    fn from(address: String) -> Self {
        Self::new(address)
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Millisecond-precision UTC timestamp.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Creates a timestamp for the current instant.
    #[must_use]
    pub fn now() -> Self {
        let millis = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        Self(u64::try_from(millis).unwrap_or(u64::MAX))
    }

    /// Creates a timestamp from milliseconds since the UNIX epoch.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as milliseconds since the UNIX epoch.
    #[must_use]
    pub const fn as_millis(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// A single chat entry: sender, receiver, text, send timestamp, read flag.
///
/// Confirmed messages are never mutated after creation except for the
/// monotonic `is_read` flip (false to true, never back).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message identity (confirmed or placeholder).
    pub id: MessageId,
    /// The room this message belongs to.
    pub room_id: RoomId,
    /// Who sent this message.
    pub sender: Email,
    /// Who the message is addressed to.
    pub receiver: Email,
    /// The message body.
    pub text: String,
    /// When the message was created, per the minting side's clock.
    pub sent_at: Timestamp,
    /// Whether the receiver has read this message.
    pub is_read: bool,
}

impl Message {
    /// Synthesizes an optimistic placeholder for a user-initiated send.
    ///
    /// The placeholder carries a fresh [`LocalId`], the current instant as
    /// `sent_at`, and `is_read = false`. It becomes visible immediately and
    /// lives until reconciled with its server echo or rolled back.
    #[must_use]
    pub fn placeholder(
        room_id: RoomId,
        sender: Email,
        receiver: Email,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: MessageId::Local(LocalId::new()),
            room_id,
            sender,
            receiver,
            text: text.into(),
            sent_at: Timestamp::now(),
            is_read: false,
        }
    }

    /// Marks this message as read. The transition is monotonic: a message
    /// already read stays read.
    pub const fn mark_read(&mut self) {
        self.is_read = true;
    }
}

/// Error returned when outgoing message text fails validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Text is empty or whitespace-only.
    #[error("message text is blank")]
    Blank,
    /// Text exceeds the maximum allowed length.
    #[error("message too long ({len} bytes, max {max} bytes)")]
    TooLong {
        /// Actual text length in bytes.
        len: usize,
        /// Maximum allowed length in bytes.
        max: usize,
    },
}

/// Validates outgoing message text against a length cap.
///
/// # Errors
///
/// Returns [`ValidationError::Blank`] if the text is empty after trimming,
/// or [`ValidationError::TooLong`] if it exceeds `max_len` bytes.
pub fn validate_text(text: &str, max_len: usize) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::Blank);
    }
    if text.len() > max_len {
        return Err(ValidationError::TooLong {
            len: text.len(),
            max: max_len,
        });
    }
    Ok(())
}
