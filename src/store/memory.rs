//! In-process shared store.
//!
//! Records are held as JSON values, the way a realtime database holds them,
//! so every read decodes a fresh snapshot and nothing is shared by reference
//! between clients.

use super::{DisconnectAction, SharedStore};
use crate::{PlayerId, RoomId, RoomPatch, RoomRecord, StoreError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// Identifies one client connection to a [`MemoryStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[display("conn-{}", _0)]
pub struct ConnectionId(u64);

#[derive(Debug)]
struct Slot {
    value: Option<serde_json::Value>,
    changes: watch::Sender<Option<RoomRecord>>,
}

impl Slot {
    fn new() -> Self {
        let (changes, _) = watch::channel(None);
        Self {
            value: None,
            changes,
        }
    }

    fn record(&self) -> Result<Option<RoomRecord>, StoreError> {
        self.value
            .clone()
            .map(serde_json::from_value)
            .transpose()
            .map_err(StoreError::from)
    }

    fn store(&mut self, record: Option<RoomRecord>) -> Result<(), StoreError> {
        self.value = record.as_ref().map(serde_json::to_value).transpose()?;
        self.changes.send_replace(record);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Inner {
    rooms: HashMap<RoomId, Slot>,
    disconnect_actions: HashMap<ConnectionId, HashMap<RoomId, DisconnectAction>>,
    next_connection: u64,
}

impl Inner {
    fn slot(&mut self, room: RoomId) -> &mut Slot {
        self.rooms.entry(room).or_insert_with(Slot::new)
    }

    fn update(&mut self, room: RoomId, patch: RoomPatch) -> Result<(), StoreError> {
        let slot = self.slot(room);
        let mut record = slot
            .record()?
            .ok_or_else(|| StoreError::new(format!("No record for room {}", room)))?;
        record.apply(patch);
        slot.store(Some(record))
    }

    fn forfeit(&mut self, room: RoomId, player: &PlayerId) -> Result<(), StoreError> {
        let slot = self.slot(room);
        let Some(mut record) = slot.record()? else {
            debug!(%room, "Forfeit on absent record");
            return Ok(());
        };
        if record.forfeit(player) {
            slot.store(Some(record))
        } else {
            Ok(())
        }
    }

    fn remove(&mut self, room: RoomId) -> Result<(), StoreError> {
        let slot = self.slot(room);
        if slot.value.is_none() {
            debug!(%room, "Remove on absent record");
            return Ok(());
        }
        slot.store(None)
    }
}

/// Shared in-memory store. Clone handles refer to the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating in-memory shared store");
        Self::default()
    }

    /// Opens a new client connection.
    #[instrument(skip(self))]
    pub fn connect(&self) -> Result<MemoryConnection, StoreError> {
        let mut inner = self.lock()?;
        let id = ConnectionId(inner.next_connection);
        inner.next_connection += 1;
        debug!(connection = %id, "Connection opened");
        Ok(MemoryConnection {
            id,
            store: self.clone(),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::new("Store lock poisoned"))
    }
}

/// One client's view of a [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct MemoryConnection {
    id: ConnectionId,
    store: MemoryStore,
}

impl MemoryConnection {
    /// Returns this connection's identifier.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Simulates an abrupt connection drop: the store applies every action
    /// this connection registered.
    #[instrument(skip(self), fields(connection = %self.id))]
    pub fn disconnect(self) -> Result<(), StoreError> {
        let mut inner = self.store.lock()?;
        let actions = inner
            .disconnect_actions
            .remove(&self.id)
            .unwrap_or_default();
        for (room, action) in actions {
            info!(%room, ?action, "Applying disconnect action");
            let result = match action {
                DisconnectAction::Remove => inner.remove(room),
                DisconnectAction::Update(patch) => inner.update(room, patch),
                DisconnectAction::Forfeit(player) => inner.forfeit(room, &player),
            };
            if let Err(e) = result {
                warn!(%room, error = %e, "Disconnect action failed");
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl SharedStore for MemoryConnection {
    #[instrument(skip(self), fields(connection = %self.id))]
    async fn read(&self, room: RoomId) -> Result<Option<RoomRecord>, StoreError> {
        let mut inner = self.store.lock()?;
        inner.slot(room).record()
    }

    #[instrument(skip(self, record), fields(connection = %self.id))]
    async fn write(&self, room: RoomId, record: RoomRecord) -> Result<(), StoreError> {
        let mut inner = self.store.lock()?;
        debug!("Writing record");
        inner.slot(room).store(Some(record))
    }

    #[instrument(skip(self, patch), fields(connection = %self.id))]
    async fn update(&self, room: RoomId, patch: RoomPatch) -> Result<(), StoreError> {
        let mut inner = self.store.lock()?;
        debug!("Updating record");
        inner.update(room, patch)
    }

    #[instrument(skip(self), fields(connection = %self.id))]
    async fn remove(&self, room: RoomId) -> Result<(), StoreError> {
        let mut inner = self.store.lock()?;
        inner.remove(room)
    }

    #[instrument(skip(self), fields(connection = %self.id))]
    async fn subscribe(
        &self,
        room: RoomId,
    ) -> Result<watch::Receiver<Option<RoomRecord>>, StoreError> {
        let mut inner = self.store.lock()?;
        Ok(inner.slot(room).changes.subscribe())
    }

    #[instrument(skip(self), fields(connection = %self.id))]
    async fn on_disconnect(
        &self,
        room: RoomId,
        action: DisconnectAction,
    ) -> Result<(), StoreError> {
        let mut inner = self.store.lock()?;
        inner
            .disconnect_actions
            .entry(self.id)
            .or_default()
            .insert(room, action);
        Ok(())
    }

    #[instrument(skip(self), fields(connection = %self.id))]
    async fn cancel_on_disconnect(&self, room: RoomId) -> Result<(), StoreError> {
        let mut inner = self.store.lock()?;
        if let Some(actions) = inner.disconnect_actions.get_mut(&self.id) {
            actions.remove(&room);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hasami_core::{EndReason, MatchStatus, Outcome, Side};

    fn record(room: RoomId) -> RoomRecord {
        RoomRecord::open(room, PlayerId::from("host"), 300, Utc::now())
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let conn = MemoryStore::new().connect().expect("connects");
        assert!(conn.read(RoomId::Koun).await.expect("reads").is_none());
        conn.write(RoomId::Koun, record(RoomId::Koun))
            .await
            .expect("writes");
        let read = conn
            .read(RoomId::Koun)
            .await
            .expect("reads")
            .expect("record present");
        assert_eq!(read.id(), &RoomId::Koun);
        assert_eq!(read.first_player_id(), &Some(PlayerId::from("host")));
    }

    #[tokio::test]
    async fn test_subscriber_sees_other_connection_write() {
        let store = MemoryStore::new();
        let a = store.connect().expect("connects");
        let b = store.connect().expect("connects");
        let mut rx = b.subscribe(RoomId::Ginsa).await.expect("subscribes");
        a.write(RoomId::Ginsa, record(RoomId::Ginsa))
            .await
            .expect("writes");
        rx.changed().await.expect("change delivered");
        assert!(rx.borrow_and_update().is_some());
        a.remove(RoomId::Ginsa).await.expect("removes");
        rx.changed().await.expect("deletion delivered");
        assert!(rx.borrow_and_update().is_none());
    }

    #[tokio::test]
    async fn test_remove_absent_is_noop() {
        let conn = MemoryStore::new().connect().expect("connects");
        conn.remove(RoomId::Hien).await.expect("no-op remove");
        conn.remove(RoomId::Hien).await.expect("still a no-op");
    }

    #[tokio::test]
    async fn test_update_absent_fails() {
        let conn = MemoryStore::new().connect().expect("connects");
        let result = conn.update(RoomId::Hien, RoomPatch::default()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_disconnect_applies_registered_action() {
        let store = MemoryStore::new();
        let host = store.connect().expect("connects");
        let observer = store.connect().expect("connects");
        host.write(RoomId::Katsura, record(RoomId::Katsura))
            .await
            .expect("writes");
        host.on_disconnect(RoomId::Katsura, DisconnectAction::Remove)
            .await
            .expect("registers");
        host.disconnect().expect("drops");
        assert!(observer.read(RoomId::Katsura).await.expect("reads").is_none());
    }

    #[tokio::test]
    async fn test_cancelled_action_not_applied() {
        let store = MemoryStore::new();
        let host = store.connect().expect("connects");
        let observer = store.connect().expect("connects");
        host.write(RoomId::Takao, record(RoomId::Takao))
            .await
            .expect("writes");
        host.on_disconnect(RoomId::Takao, DisconnectAction::Remove)
            .await
            .expect("registers");
        host.cancel_on_disconnect(RoomId::Takao)
            .await
            .expect("cancels");
        host.disconnect().expect("drops");
        assert!(observer.read(RoomId::Takao).await.expect("reads").is_some());
    }

    #[tokio::test]
    async fn test_update_action_merges_patch() {
        let store = MemoryStore::new();
        let guest = store.connect().expect("connects");
        let observer = store.connect().expect("connects");
        observer
            .write(RoomId::Ginsa, record(RoomId::Ginsa))
            .await
            .expect("writes");
        let vacate = RoomPatch::default().with_first_player_id(None);
        guest
            .on_disconnect(RoomId::Ginsa, DisconnectAction::Update(vacate))
            .await
            .expect("registers");
        guest.disconnect().expect("drops");
        let stored = observer
            .read(RoomId::Ginsa)
            .await
            .expect("reads")
            .expect("record present");
        assert_eq!(stored.first_player_id(), &None);
    }

    #[tokio::test]
    async fn test_forfeit_action_skips_finished_match() {
        let store = MemoryStore::new();
        let guest = store.connect().expect("connects");
        let observer = store.connect().expect("connects");
        let now = Utc::now();
        let mut playing = record(RoomId::Hozuki);
        let started = playing.match_state().start(300, now).expect("starts");
        playing.apply(
            RoomPatch::default()
                .with_second_player_id(Some(PlayerId::from("guest")))
                .with_match_state(started.clone()),
        );
        observer
            .write(RoomId::Hozuki, playing)
            .await
            .expect("writes");
        guest
            .on_disconnect(RoomId::Hozuki, DisconnectAction::Forfeit(PlayerId::from("guest")))
            .await
            .expect("registers");

        let resigned = started
            .resign(Side::First, Default::default())
            .expect("host resigns");
        observer
            .update(RoomId::Hozuki, RoomPatch::default().with_match_state(resigned))
            .await
            .expect("updates");
        guest.disconnect().expect("drops");

        let stored = observer
            .read(RoomId::Hozuki)
            .await
            .expect("reads")
            .expect("record present");
        assert_eq!(
            stored.match_state().status(),
            MatchStatus::Finished(Outcome {
                winner: Side::Second,
                reason: EndReason::Resignation,
            })
        );
    }

    #[tokio::test]
    async fn test_forfeit_action_on_removed_room_is_noop() {
        let store = MemoryStore::new();
        let guest = store.connect().expect("connects");
        let observer = store.connect().expect("connects");
        guest
            .on_disconnect(RoomId::Hien, DisconnectAction::Forfeit(PlayerId::from("guest")))
            .await
            .expect("registers");
        guest.disconnect().expect("drops");
        assert!(observer.read(RoomId::Hien).await.expect("reads").is_none());
    }
}
