//! Domain types for the `TutorChat` synchronization engine.
//!
//! These types mirror the shapes the REST services and the push channel
//! exchange with the client: rooms, messages (with the two message-identity
//! regimes), and display profiles. They carry no synchronization logic —
//! that lives in the `tutorchat` engine crate.

pub mod message;
pub mod profile;
pub mod room;

pub use message::{
    Email, LocalId, MAX_TEXT_LEN, Message, MessageId, Timestamp, ValidationError, validate_text,
};
pub use profile::Profile;
pub use room::{Room, RoomId};
