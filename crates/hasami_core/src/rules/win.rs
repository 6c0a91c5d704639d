//! Win detection by attrition.

use crate::{Board, Side};
use tracing::instrument;

/// Counts pieces on the board as `(first, second)`.
#[instrument(skip(board))]
pub fn count_pieces(board: &Board) -> (usize, usize) {
    (board.count(Side::First), board.count(Side::Second))
}

/// Returns the winner once either side is down to one piece or fewer.
///
/// A lone remaining piece already loses. Running out of legal moves is a
/// separate condition checked by the match state machine.
#[instrument(skip(board))]
pub fn check_winner(board: &Board) -> Option<Side> {
    let (first, second) = count_pieces(board);
    if second <= 1 {
        Some(Side::First)
    } else if first <= 1 {
        Some(Side::Second)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cell, Position};

    fn board_with(first: usize, second: usize) -> Board {
        let mut board = Board::empty();
        for col in 0..first {
            board.set(Position::new(8, col).expect("on board"), Cell::Occupied(Side::First));
        }
        for col in 0..second {
            board.set(Position::new(0, col).expect("on board"), Cell::Occupied(Side::Second));
        }
        board
    }

    #[test]
    fn test_no_winner_initial() {
        assert_eq!(check_winner(&Board::initial()), None);
    }

    #[test]
    fn test_no_winner_with_two_each() {
        assert_eq!(check_winner(&board_with(2, 2)), None);
    }

    #[test]
    fn test_one_piece_left_loses() {
        assert_eq!(check_winner(&board_with(5, 1)), Some(Side::First));
        assert_eq!(check_winner(&board_with(1, 5)), Some(Side::Second));
    }

    #[test]
    fn test_zero_pieces_loses() {
        assert_eq!(check_winner(&board_with(0, 3)), Some(Side::Second));
    }
}
