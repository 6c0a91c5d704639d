//! Shared-record store contract.
//!
//! The store is the only state both clients touch. It guarantees that each
//! individual write is applied atomically and observed in one serial order by
//! every subscriber, and nothing more: it does not validate moves or enforce
//! turn order.

mod memory;

pub use memory::{ConnectionId, MemoryConnection, MemoryStore};

use crate::{PlayerId, RoomId, RoomPatch, RoomRecord, StoreError};
use tokio::sync::watch;

/// Action the store applies on a client's behalf if its connection drops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectAction {
    /// Delete the room record.
    Remove,
    /// Merge a patch into the room record, if it still exists.
    Update(RoomPatch),
    /// End the match as abandoned by this player, only while it is still in
    /// play and the player still holds a seat.
    Forfeit(PlayerId),
}

/// A keyed record store with change subscriptions, as seen by one client
/// connection.
#[async_trait::async_trait]
pub trait SharedStore: Send + Sync {
    /// Reads the current record, `None` if absent.
    async fn read(&self, room: RoomId) -> Result<Option<RoomRecord>, StoreError>;

    /// Replaces the whole record.
    async fn write(&self, room: RoomId, record: RoomRecord) -> Result<(), StoreError>;

    /// Atomically merges a patch into an existing record.
    async fn update(&self, room: RoomId, patch: RoomPatch) -> Result<(), StoreError>;

    /// Deletes the record. Deleting an absent record is a no-op.
    async fn remove(&self, room: RoomId) -> Result<(), StoreError>;

    /// Subscribes to snapshots of the record; `None` means deleted.
    ///
    /// The receiver always holds the latest snapshot. Intermediate snapshots
    /// may be coalesced, which is harmless because each one is complete.
    async fn subscribe(
        &self,
        room: RoomId,
    ) -> Result<watch::Receiver<Option<RoomRecord>>, StoreError>;

    /// Registers (or replaces) this connection's disconnect action for `room`.
    async fn on_disconnect(&self, room: RoomId, action: DisconnectAction)
    -> Result<(), StoreError>;

    /// Cancels this connection's disconnect action for `room`, if any.
    async fn cancel_on_disconnect(&self, room: RoomId) -> Result<(), StoreError>;
}
