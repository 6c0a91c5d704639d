//! Match lifecycle: `Waiting → Playing → Finished`.
//!
//! Every transition is a pure function returning the next state. The caller
//! decides when (and whether) to commit it, so a rejected action or a failed
//! remote write never leaves a half-applied move behind.

use crate::clock::{ClockReading, elapsed_seconds};
use crate::invariants::assert_invariants;
use crate::rules;
use crate::{Board, Cell, MatchError, Move, Position, Side};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Why a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EndReason {
    /// The loser was reduced to one piece or fewer.
    Attrition,
    /// The loser had no legal move on their turn.
    NoLegalMoves,
    /// The loser's clock ran out.
    Timeout,
    /// The loser resigned.
    Resignation,
    /// The loser left or disconnected mid-match.
    Abandoned,
}

/// Outcome of a finished match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Outcome {
    /// Winning side.
    pub winner: Side,
    /// How the match was decided.
    pub reason: EndReason,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} wins ({:?})", self.winner, self.reason)
    }
}

/// Lifecycle status. A finished match always carries its outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchStatus {
    /// One participant seated.
    Waiting,
    /// Both seated, clock running for the side to move.
    Playing,
    /// Terminal.
    Finished(Outcome),
}

/// Who may resign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResignPolicy {
    /// Only the side holding the turn may resign.
    #[default]
    OwnTurn,
    /// Either side may resign at any time during play.
    Anytime,
}

/// Result of an accepted move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    /// State after the move, captures and win evaluation.
    pub state: MatchState,
    /// Opposing pieces removed by the move.
    pub captured: Vec<Position>,
}

/// Complete match snapshot shared by both participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchState {
    board: Board,
    turn: Side,
    status: MatchStatus,
    first_player_time: u32,
    second_player_time: u32,
    initial_time: u32,
    last_move_time: DateTime<Utc>,
}

impl MatchState {
    /// Creates a waiting match with the initial board and full clocks.
    #[instrument]
    pub fn new(initial_seconds: u32, now: DateTime<Utc>) -> Self {
        Self {
            board: Board::initial(),
            turn: Side::First,
            status: MatchStatus::Waiting,
            first_player_time: initial_seconds,
            second_player_time: initial_seconds,
            initial_time: initial_seconds,
            last_move_time: now,
        }
    }

    /// Returns the board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns the side to move.
    pub fn turn(&self) -> Side {
        self.turn
    }

    /// Returns the lifecycle status.
    pub fn status(&self) -> MatchStatus {
        self.status
    }

    /// Returns the winner once finished.
    pub fn winner(&self) -> Option<Side> {
        match self.status {
            MatchStatus::Finished(outcome) => Some(outcome.winner),
            _ => None,
        }
    }

    /// Returns true while the clock is running.
    pub fn is_playing(&self) -> bool {
        self.status == MatchStatus::Playing
    }

    /// Returns true once an outcome is recorded.
    pub fn is_finished(&self) -> bool {
        matches!(self.status, MatchStatus::Finished(_))
    }

    /// Initial allotment per side, in seconds.
    pub fn initial_time(&self) -> u32 {
        self.initial_time
    }

    /// Time of the last clock reset (join or accepted move).
    pub fn last_move_time(&self) -> DateTime<Utc> {
        self.last_move_time
    }

    /// Banked seconds for `side` as of the last move.
    pub fn banked(&self, side: Side) -> u32 {
        match side {
            Side::First => self.first_player_time,
            Side::Second => self.second_player_time,
        }
    }

    fn bank_mut(&mut self, side: Side) -> &mut u32 {
        match side {
            Side::First => &mut self.first_player_time,
            Side::Second => &mut self.second_player_time,
        }
    }

    /// Live remaining seconds for `side`.
    ///
    /// Only the side to move loses time, and only while playing.
    pub fn remaining(&self, side: Side, now: DateTime<Utc>) -> u32 {
        let banked = self.banked(side);
        if self.is_playing() && side == self.turn {
            banked.saturating_sub(elapsed_seconds(self.last_move_time, now))
        } else {
            banked
        }
    }

    /// Live remaining seconds for both sides.
    pub fn clock_reading(&self, now: DateTime<Utc>) -> ClockReading {
        ClockReading {
            first: self.remaining(Side::First, now),
            second: self.remaining(Side::Second, now),
        }
    }

    /// Returns a copy with only the status replaced.
    ///
    /// Used when merging status-only patches from the shared store.
    pub fn with_status(&self, status: MatchStatus) -> Self {
        let mut next = self.clone();
        next.status = status;
        next
    }

    fn finish(&self, winner: Side, reason: EndReason) -> Self {
        let mut next = self.clone();
        next.status = MatchStatus::Finished(Outcome { winner, reason });
        info!(%winner, ?reason, "Match finished");
        next
    }

    fn ensure_playing(&self) -> Result<(), MatchError> {
        match self.status {
            MatchStatus::Playing => Ok(()),
            MatchStatus::Waiting => Err(MatchError::NotStarted),
            MatchStatus::Finished(_) => Err(MatchError::GameEnded),
        }
    }

    /// Second participant joined: reset board and clocks and start play.
    ///
    /// Starting a match that is already playing returns it unchanged.
    #[instrument(skip(self))]
    pub fn start(&self, initial_seconds: u32, now: DateTime<Utc>) -> Result<Self, MatchError> {
        match self.status {
            MatchStatus::Waiting => {
                let mut next = Self::new(initial_seconds, now);
                next.status = MatchStatus::Playing;
                info!(initial_seconds, "Match started");
                assert_invariants(&next);
                Ok(next)
            }
            MatchStatus::Playing => {
                warn!("Start requested for a match already in play");
                Ok(self.clone())
            }
            MatchStatus::Finished(_) => Err(MatchError::GameEnded),
        }
    }

    /// Validates and applies a move.
    ///
    /// Debits elapsed time from the mover, applies captures, passes the
    /// turn and evaluates both win conditions for the new side to move.
    #[instrument(skip(self, mv), fields(mv = %mv))]
    pub fn apply_move(&self, mv: Move, now: DateTime<Utc>) -> Result<MoveOutcome, MatchError> {
        self.ensure_playing()?;
        if mv.side != self.turn {
            debug!(turn = %self.turn, "Move attempted out of turn");
            return Err(MatchError::NotYourTurn(mv.side));
        }
        let remaining = self.remaining(mv.side, now);
        if remaining == 0 {
            return Err(MatchError::TimeUp(mv.side));
        }
        if self.board.get(mv.from) != Cell::Occupied(mv.side) {
            return Err(MatchError::WrongPiece(mv.from));
        }
        if mv.from == mv.to || !rules::is_valid_move(&self.board, mv.from, mv.to) {
            return Err(MatchError::InvalidMove {
                from: mv.from,
                to: mv.to,
            });
        }

        let (board, captured) = rules::apply_move(&self.board, mv.from, mv.to, mv.side);
        let mut next = self.clone();
        *next.bank_mut(mv.side) = remaining;
        next.board = board;
        next.turn = mv.side.opponent();
        next.last_move_time = now;

        if let Some(winner) = rules::check_winner(&next.board) {
            next = next.finish(winner, EndReason::Attrition);
        } else if !rules::has_any_move(&next.board, next.turn) {
            next = next.finish(next.turn.opponent(), EndReason::NoLegalMoves);
        }

        debug!(captured = captured.len(), remaining, "Move applied");
        assert_invariants(&next);
        Ok(MoveOutcome {
            state: next,
            captured,
        })
    }

    /// Returns the finished state if the side to move has run out of time.
    #[instrument(skip(self))]
    pub fn timed_out(&self, now: DateTime<Utc>) -> Option<Self> {
        if !self.is_playing() || self.remaining(self.turn, now) > 0 {
            return None;
        }
        let mut next = self.finish(self.turn.opponent(), EndReason::Timeout);
        *next.bank_mut(self.turn) = 0;
        Some(next)
    }

    /// `side` resigns; the opponent wins.
    #[instrument(skip(self))]
    pub fn resign(&self, side: Side, policy: ResignPolicy) -> Result<Self, MatchError> {
        self.ensure_playing()?;
        if policy == ResignPolicy::OwnTurn && side != self.turn {
            return Err(MatchError::NotYourTurn(side));
        }
        Ok(self.finish(side.opponent(), EndReason::Resignation))
    }

    /// `side` left or dropped mid-match; the opponent wins.
    #[instrument(skip(self))]
    pub fn abandon(&self, side: Side) -> Result<Self, MatchError> {
        self.ensure_playing()?;
        Ok(self.finish(side.opponent(), EndReason::Abandoned))
    }
}
