//! Error types for room synchronization.

use crate::RoomId;
use derive_more::{Display, Error};
use hasami_core::MatchError;
use tracing::instrument;

/// Shared-store failure with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Store error: {} at {}:{}", message, file, line)]
pub struct StoreError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl StoreError {
    /// Creates a new store error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("Record encoding error: {}", err))
    }
}

/// Everything a room session can report to its caller.
///
/// All variants are recoverable; presentation layers show the message and
/// keep the session alive unless the room is gone.
#[derive(Debug, Clone, Display, Error)]
pub enum SyncError {
    /// Both seats are already taken.
    #[display("Room {} is full", room)]
    RoomFull {
        /// The room that was full.
        room: RoomId,
    },

    /// Identifier is not in the room catalog.
    #[display("Unknown room: {}", name)]
    UnknownRoom {
        /// The rejected identifier.
        name: String,
    },

    /// This client holds no seat in the room.
    #[display("Not seated in this room")]
    NotSeated,

    /// The room record no longer exists.
    #[display("Room has been closed")]
    RoomClosed,

    /// A game rule rejected the action.
    #[display("{}", _0)]
    Game(MatchError),

    /// The shared store rejected a read or write.
    #[display("Action failed: {}", _0)]
    Store(StoreError),
}

impl From<MatchError> for SyncError {
    fn from(err: MatchError) -> Self {
        Self::Game(err)
    }
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}
