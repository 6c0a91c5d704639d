//! First-class invariants for hasami shogi matches.
//!
//! Invariants are logical properties that must hold after every transition.
//! They are checked in debug builds and can be tested independently.

use crate::{BOARD_SIZE, MatchState, Side, rules};

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A set of invariants that can be checked together.
pub trait InvariantSet<S> {
    /// Checks all invariants in the set, collecting every violation.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

impl<S, I1, I2, I3> InvariantSet<S> for (I1, I2, I3)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
    I3: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        let violations: Vec<_> = [
            (I1::holds(state), I1::description()),
            (I2::holds(state), I2::description()),
            (I3::holds(state), I3::description()),
        ]
        .into_iter()
        .filter(|(holds, _)| !holds)
        .map(|(_, description)| InvariantViolation::new(description))
        .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

/// Invariant: neither side ever holds more pieces than it started with.
pub struct PieceCountInvariant;

impl Invariant<MatchState> for PieceCountInvariant {
    fn holds(state: &MatchState) -> bool {
        Side::both().all(|side| state.board().count(side) <= BOARD_SIZE)
    }

    fn description() -> &'static str {
        "Each side holds at most nine pieces"
    }
}

/// Invariant: clocks only count down.
pub struct ClockBoundInvariant;

impl Invariant<MatchState> for ClockBoundInvariant {
    fn holds(state: &MatchState) -> bool {
        Side::both().all(|side| state.banked(side) <= state.initial_time())
    }

    fn description() -> &'static str {
        "Banked time never exceeds the initial allotment"
    }
}

/// Invariant: during play, no piece of the side to move is left boxed in.
///
/// The previous move's surround scan would have removed it.
pub struct SettledCapturesInvariant;

impl Invariant<MatchState> for SettledCapturesInvariant {
    fn holds(state: &MatchState) -> bool {
        !state.is_playing()
            || state
                .board()
                .pieces(state.turn())
                .all(|pos| !rules::is_surrounded(state.board(), pos))
    }

    fn description() -> &'static str {
        "No surrounded piece survives the opponent's move"
    }
}

/// All match invariants as a composable set.
pub type MatchInvariants = (
    PieceCountInvariant,
    ClockBoundInvariant,
    SettledCapturesInvariant,
);

/// Checks every match invariant in debug builds.
pub fn assert_invariants(state: &MatchState) {
    debug_assert!(
        MatchInvariants::check_all(state).is_ok(),
        "Match invariants violated: {:?}",
        MatchInvariants::check_all(state).err()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_fresh_match_holds() {
        let state = MatchState::new(300, Utc::now());
        assert!(MatchInvariants::check_all(&state).is_ok());
    }

    #[test]
    fn test_started_match_holds() {
        let now = Utc::now();
        let state = MatchState::new(300, now)
            .start(300, now)
            .expect("waiting match starts");
        assert!(PieceCountInvariant::holds(&state));
        assert!(ClockBoundInvariant::holds(&state));
        assert!(SettledCapturesInvariant::holds(&state));
    }
}
