//! Hasami shogi rooms - two clients, one shared record
//!
//! This library synchronizes a hasami shogi match between two independent
//! clients through a shared record store, with no move-validating server.
//!
//! # Architecture
//!
//! - **Rules**: pure game logic re-exported from `hasami_core`
//! - **Rooms**: the fixed catalog of named rooms
//! - **Store**: the shared-record contract and an in-process implementation
//! - **Session**: one participant's view of a room, reconciled from snapshots
//! - **Timers**: derived clock ticks and post-game cleanup
//!
//! # Example
//!
//! ```
//! use hasami_shogi::{GameConfig, MemoryStore, RoomId, RoomSession};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> anyhow::Result<()> {
//! let store = MemoryStore::new();
//! let host = RoomSession::enter_room(store.connect()?, RoomId::Kiho, GameConfig::default()).await?;
//! let guest = RoomSession::enter_room(store.connect()?, RoomId::Kiho, GameConfig::default()).await?;
//! assert!(guest.match_state().is_some_and(|state| state.is_playing()));
//! # drop(host);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod error;
mod lobby;
mod record;
mod rooms;
mod session;
mod store;
mod timers;

// Crate-level exports - Configuration
pub use config::{ConfigError, GameConfig};

// Crate-level exports - Errors
pub use error::{StoreError, SyncError};

// Crate-level exports - Rooms and records
pub use lobby::{RoomStatus, room_statuses};
pub use record::{PlayerId, RoomPatch, RoomRecord};
pub use rooms::RoomId;

// Crate-level exports - Store
pub use store::{ConnectionId, DisconnectAction, MemoryConnection, MemoryStore, SharedStore};

// Crate-level exports - Sessions and timers
pub use session::{ClickOutcome, RoomSession, SyncEvent};
pub use timers::{CleanupTimer, ClockTicker, TimeSource, system_time};

// Crate-level exports - Game types
pub use hasami_core::{
    BOARD_SIZE, Board, Cell, ClockReading, EndReason, MatchError, MatchState, MatchStatus, Move,
    Outcome, Position, ResignPolicy, Side, create_initial_board, format_clock,
};
