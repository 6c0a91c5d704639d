//! Pure hasami shogi game logic.
//!
//! # Architecture
//!
//! - **Board**: fixed 9x9 grid, a `Copy` value so snapshots never alias
//! - **Rules**: movement legality, flanking and surround captures, attrition
//! - **Match**: `Waiting → Playing → Finished` with derived clocks
//!
//! Nothing in this crate performs I/O or blocks. Room synchronization lives
//! in the `hasami_shogi` crate.
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use hasami_core::{MatchState, Move, Position, Side};
//!
//! let now = Utc::now();
//! let state = MatchState::new(300, now).start(300, now)?;
//! let from = Position::new(8, 0).expect("on board");
//! let to = Position::new(4, 0).expect("on board");
//! let outcome = state.apply_move(Move::new(Side::First, from, to), now)?;
//! assert_eq!(outcome.state.turn(), Side::Second);
//! # Ok::<(), hasami_core::MatchError>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod clock;
mod match_state;
mod types;

pub mod invariants;
pub mod rules;

pub use action::{MatchError, Move};
pub use clock::{ClockReading, DEFAULT_INITIAL_SECONDS, elapsed_seconds, format_clock};
pub use match_state::{EndReason, MatchState, MatchStatus, MoveOutcome, Outcome, ResignPolicy};
pub use types::{BOARD_SIZE, Board, Cell, DIRECTIONS, Position, Side};

/// Alias for the starting position.
pub fn create_initial_board() -> Board {
    Board::initial()
}
