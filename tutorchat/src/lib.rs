//! `TutorChat` — client-side chat synchronization engine.
//!
//! Keeps a local view of multiple concurrent conversation rooms consistent
//! across three independent update sources: the initial REST fetch of
//! rooms and history, a live push channel delivering messages and read
//! receipts, and locally-originated optimistic sends that are reconciled
//! with the authoritative server echo or rolled back on failure.

pub mod backend;
pub mod config;
pub mod directory;
pub mod profiles;
pub mod projection;
pub mod store;
pub mod widget;
