//! Capture detection.
//!
//! Two independent rules decide which opposing pieces leave the board after
//! a move:
//!
//! - **Flanking**: a contiguous run of opposing pieces bracketed between the
//!   landed piece and another piece of the mover along a row or column.
//! - **Surround**: any opposing piece whose every on-board orthogonal
//!   neighbour belongs to the mover. Edge and corner pieces need fewer
//!   neighbours, so they can be taken without a two-ended sandwich.

use crate::{BOARD_SIZE, Board, Cell, DIRECTIONS, Position, Side};
use std::collections::BTreeSet;
use tracing::{debug, instrument};

/// Returns every opposing piece captured after `mover` lands on `landed`.
///
/// `board` must already contain the moved piece. The result is sorted
/// row-major and contains no duplicates.
#[instrument(skip(board))]
pub fn check_captures(board: &Board, landed: Position, mover: Side) -> Vec<Position> {
    let opponent = Cell::Occupied(mover.opponent());
    let mut captured = BTreeSet::new();

    for direction in DIRECTIONS {
        let run: Vec<Position> = (1..BOARD_SIZE)
            .map_while(|distance| landed.step(direction, distance))
            .take_while(|&pos| board.get(pos) == opponent)
            .collect();
        if run.is_empty() {
            continue;
        }
        let closed = landed
            .step(direction, run.len() + 1)
            .is_some_and(|pos| board.get(pos) == Cell::Occupied(mover));
        if closed {
            debug!(?direction, count = run.len(), "Flanking capture");
            captured.extend(run);
        }
    }

    captured.extend(
        board
            .pieces(mover.opponent())
            .filter(|&pos| is_surrounded(board, pos)),
    );

    captured.into_iter().collect()
}

/// Returns true if the piece at `pos` is boxed in by the opposing side on
/// every orthogonal neighbour that exists on the board.
#[instrument(skip(board))]
pub fn is_surrounded(board: &Board, pos: Position) -> bool {
    match board.get(pos) {
        Cell::Empty => false,
        Cell::Occupied(side) => {
            let enemy = Cell::Occupied(side.opponent());
            pos.neighbors().all(|n| board.get(n) == enemy)
        }
    }
}

/// Moves the piece and removes captures, returning the new board and the
/// captured positions. The input board is left untouched.
///
/// Legality is not checked here; see [`is_valid_move`](super::is_valid_move).
#[instrument(skip(board))]
pub fn apply_move(
    board: &Board,
    from: Position,
    to: Position,
    mover: Side,
) -> (Board, Vec<Position>) {
    let mut next = *board;
    next.set(from, Cell::Empty);
    next.set(to, Cell::Occupied(mover));

    let captured = check_captures(&next, to, mover);
    for &pos in &captured {
        next.set(pos, Cell::Empty);
    }
    (next, captured)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(row: usize, col: usize) -> Position {
        Position::new(row, col).expect("test position on board")
    }

    fn place(board: &mut Board, side: Side, cells: &[(usize, usize)]) {
        for &(row, col) in cells {
            board.set(pos(row, col), Cell::Occupied(side));
        }
    }

    #[test]
    fn test_flank_captures_run_of_two() {
        let mut board = Board::empty();
        place(&mut board, Side::First, &[(4, 0), (4, 3)]);
        place(&mut board, Side::Second, &[(4, 1), (4, 2)]);
        let captured = check_captures(&board, pos(4, 3), Side::First);
        assert_eq!(captured, vec![pos(4, 1), pos(4, 2)]);
    }

    #[test]
    fn test_open_ended_run_not_captured() {
        let mut board = Board::empty();
        place(&mut board, Side::First, &[(4, 3)]);
        place(&mut board, Side::Second, &[(4, 4)]);
        assert!(check_captures(&board, pos(4, 3), Side::First).is_empty());
    }

    #[test]
    fn test_run_ending_in_empty_cell_not_captured() {
        let mut board = Board::empty();
        place(&mut board, Side::First, &[(4, 0), (4, 4)]);
        place(&mut board, Side::Second, &[(4, 2), (4, 3)]);
        assert!(check_captures(&board, pos(4, 4), Side::First).is_empty());
    }

    #[test]
    fn test_vertical_flank() {
        let mut board = Board::empty();
        place(&mut board, Side::Second, &[(2, 5), (6, 5)]);
        place(&mut board, Side::First, &[(3, 5), (4, 5), (5, 5)]);
        let captured = check_captures(&board, pos(6, 5), Side::Second);
        assert_eq!(captured, vec![pos(3, 5), pos(4, 5), pos(5, 5)]);
    }

    #[test]
    fn test_flank_closed_on_last_column() {
        let mut board = Board::empty();
        place(&mut board, Side::First, &[(4, 6), (4, 8)]);
        place(&mut board, Side::Second, &[(4, 7)]);
        assert_eq!(check_captures(&board, pos(4, 6), Side::First), vec![pos(4, 7)]);
    }

    #[test]
    fn test_corner_surround_without_sandwich() {
        let mut board = Board::empty();
        place(&mut board, Side::Second, &[(0, 0)]);
        place(&mut board, Side::First, &[(0, 1), (1, 0)]);
        assert!(is_surrounded(&board, pos(0, 0)));
        assert_eq!(check_captures(&board, pos(1, 0), Side::First), vec![pos(0, 0)]);
    }

    #[test]
    fn test_edge_surround_needs_three() {
        let mut board = Board::empty();
        place(&mut board, Side::Second, &[(0, 4)]);
        place(&mut board, Side::First, &[(0, 3), (1, 4)]);
        assert!(!is_surrounded(&board, pos(0, 4)));
        place(&mut board, Side::First, &[(0, 5)]);
        assert!(is_surrounded(&board, pos(0, 4)));
    }

    #[test]
    fn test_interior_surround_anywhere_on_board() {
        let mut board = Board::empty();
        place(&mut board, Side::Second, &[(4, 4)]);
        place(&mut board, Side::First, &[(3, 4), (5, 4), (4, 3), (4, 5), (8, 8)]);
        // The landed piece is far away; the surround scan covers the whole board.
        assert_eq!(check_captures(&board, pos(8, 8), Side::First), vec![pos(4, 4)]);
    }

    #[test]
    fn test_flank_and_surround_are_deduplicated() {
        let mut board = Board::empty();
        place(&mut board, Side::Second, &[(0, 1)]);
        place(&mut board, Side::First, &[(0, 0), (1, 1), (0, 2)]);
        assert_eq!(check_captures(&board, pos(0, 2), Side::First), vec![pos(0, 1)]);
    }

    #[test]
    fn test_own_pieces_never_captured() {
        let mut board = Board::empty();
        place(&mut board, Side::First, &[(0, 0), (4, 4)]);
        place(&mut board, Side::Second, &[(0, 1), (1, 0)]);
        assert!(check_captures(&board, pos(4, 4), Side::First).is_empty());
    }

    #[test]
    fn test_apply_move_leaves_input_untouched() {
        let mut board = Board::empty();
        place(&mut board, Side::First, &[(4, 0), (6, 3)]);
        place(&mut board, Side::Second, &[(4, 1), (4, 2)]);
        let before = board;
        let (after, captured) = apply_move(&board, pos(6, 3), pos(4, 3), Side::First);
        assert_eq!(board, before);
        assert_eq!(captured.len(), 2);
        assert!(after.is_empty(pos(4, 1)));
        assert!(after.is_empty(pos(6, 3)));
        assert_eq!(after.get(pos(4, 3)), Cell::Occupied(Side::First));
    }
}
