//! Room browser listing.

use crate::store::SharedStore;
use crate::{RoomId, StoreError};
use derive_getters::Getters;
use derive_new::new;
use hasami_core::MatchStatus;
use serde::Serialize;
use tracing::{debug, instrument};

/// Occupancy of one catalog room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters, Serialize, new)]
#[serde(rename_all = "camelCase")]
pub struct RoomStatus {
    room: RoomId,
    player_count: usize,
    status: Option<MatchStatus>,
}

impl RoomStatus {
    /// Returns true if a client entering now would get a seat.
    pub fn is_joinable(&self) -> bool {
        self.player_count < 2 && !matches!(self.status, Some(MatchStatus::Finished(_)))
    }
}

/// Reads every catalog room and reports its occupancy.
///
/// Absent rooms report zero players and no status.
#[instrument(skip(store))]
pub async fn room_statuses<S>(store: &S) -> Result<Vec<RoomStatus>, StoreError>
where
    S: SharedStore + ?Sized,
{
    let mut statuses = Vec::new();
    for room in RoomId::all() {
        let status = match store.read(room).await? {
            Some(record) => RoomStatus::new(
                room,
                record.player_count(),
                Some(record.match_state().status()),
            ),
            None => RoomStatus::new(room, 0, None),
        };
        debug!(%room, players = status.player_count, "Room status");
        statuses.push(status);
    }
    Ok(statuses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStore, PlayerId, RoomRecord};
    use chrono::Utc;

    #[tokio::test]
    async fn test_lists_every_room() {
        let conn = MemoryStore::new().connect().expect("connects");
        let record = RoomRecord::open(RoomId::Kiho, PlayerId::from("a"), 300, Utc::now());
        conn.write(RoomId::Kiho, record).await.expect("writes");

        let statuses = room_statuses(&conn).await.expect("lists");
        assert_eq!(statuses.len(), 9);
        let kiho = statuses
            .iter()
            .find(|s| *s.room() == RoomId::Kiho)
            .expect("kiho listed");
        assert_eq!(*kiho.player_count(), 1);
        assert_eq!(*kiho.status(), Some(MatchStatus::Waiting));
        assert!(kiho.is_joinable());
        let empty = statuses
            .iter()
            .find(|s| *s.room() == RoomId::Special)
            .expect("special listed");
        assert_eq!(*empty.player_count(), 0);
        assert_eq!(*empty.status(), None);
    }
}
