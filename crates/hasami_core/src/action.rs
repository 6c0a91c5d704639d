//! First-class action types for hasami shogi.

use crate::{Position, Side};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// A move: a side sliding one of its pieces from one cell to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    /// The side making the move.
    pub side: Side,
    /// Cell the piece leaves.
    pub from: Position,
    /// Cell the piece lands on.
    pub to: Position,
}

impl Move {
    /// Creates a new move.
    #[instrument]
    pub fn new(side: Side, from: Position, to: Position) -> Self {
        Self { side, from, to }
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} -> {}", self.side, self.from, self.to)
    }
}

/// Error that can occur when validating or applying a match action.
///
/// Every variant is recoverable: the match state is left unchanged and the
/// caller can show the message and carry on.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum MatchError {
    /// The acting side does not hold the turn.
    #[display("It's not {}'s turn", _0)]
    NotYourTurn(Side),

    /// The selected cell does not hold the mover's own piece.
    #[display("Select one of your own pieces (not {})", _0)]
    WrongPiece(Position),

    /// Destination breaks the straight-line, obstacle or occupancy rule.
    #[display("Cannot move from {} to {}", from, to)]
    InvalidMove {
        /// Origin cell.
        from: Position,
        /// Rejected destination.
        to: Position,
    },

    /// The side to move has run out of time.
    #[display("{} has run out of time", _0)]
    TimeUp(Side),

    /// The match is already finished.
    #[display("The match has already ended")]
    GameEnded,

    /// The match is still waiting for a second participant.
    #[display("The match has not started")]
    NotStarted,
}

impl std::error::Error for MatchError {}
