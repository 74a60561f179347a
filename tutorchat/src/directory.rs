//! Room directory loading.
//!
//! Fetches the viewer's room list, then backfills the last-message preview
//! for any room the list payload left bare by fetching that room's history.
//! Backfills run concurrently in bounded waves; a failed backfill leaves
//! that one room without a preview instead of failing the load.

use std::collections::HashSet;

use futures_util::future::join_all;

use tutorchat_types::{Email, Room, RoomId};

use crate::backend::{RoomService, ServiceError};

/// A loaded directory: rooms in server order plus the distinct
/// counterpart addresses, first-seen order, ready for profile warming.
#[derive(Debug, Clone)]
pub struct DirectoryLoad {
    pub rooms: Vec<Room>,
    pub counterparts: Vec<Email>,
}

/// Loads the viewer's directory.
///
/// The room list itself is load-bearing: if it fails the whole load fails.
/// Preview backfills are best-effort and run at most `fan_out` at a time.
pub async fn load<R: RoomService>(
    service: &R,
    viewer: &Email,
    fan_out: usize,
) -> Result<DirectoryLoad, ServiceError> {
    let mut rooms = service.list_rooms(viewer).await?;

    let missing: Vec<(usize, RoomId)> = rooms
        .iter()
        .enumerate()
        .filter(|(_, room)| room.last_message.is_none())
        .map(|(i, room)| (i, room.id))
        .collect();

    for wave in missing.chunks(fan_out.max(1)) {
        let fetches = wave.iter().map(|&(i, room_id)| async move {
            (i, room_id, service.room_history(room_id).await)
        });
        for (i, room_id, result) in join_all(fetches).await {
            match result {
                Ok(history) => {
                    rooms[i].last_message = history.into_iter().max_by_key(|m| m.sent_at);
                }
                Err(error) => {
                    tracing::warn!(%room_id, %error, "preview backfill failed, leaving room bare");
                }
            }
        }
    }

    let mut seen = HashSet::new();
    let mut counterparts = Vec::new();
    for room in &rooms {
        if let Some(other) = room.counterpart_of(viewer)
            && seen.insert(other.clone())
        {
            counterparts.push(other.clone());
        }
    }

    Ok(DirectoryLoad {
        rooms,
        counterparts,
    })
}
