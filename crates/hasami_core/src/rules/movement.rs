//! Movement legality.
//!
//! Pieces move like a rook: any distance along a row or column, never
//! jumping over another piece.

use crate::{BOARD_SIZE, Board, DIRECTIONS, Position, Side};
use tracing::{debug, instrument};

/// Returns true if any cell strictly between `from` and `to` is occupied.
///
/// Only meaningful when the two positions share a row or column. Diagonal
/// input is rejected upstream and reported here as "no obstacle".
#[instrument(skip(board))]
pub fn has_obstacle_in_path(board: &Board, from: Position, to: Position) -> bool {
    if from.row() == to.row() {
        let (start, end) = ordered(from.col(), to.col());
        (start + 1..end)
            .filter_map(|col| Position::new(from.row(), col))
            .any(|pos| !board.is_empty(pos))
    } else if from.col() == to.col() {
        let (start, end) = ordered(from.row(), to.row());
        (start + 1..end)
            .filter_map(|row| Position::new(row, from.col()))
            .any(|pos| !board.is_empty(pos))
    } else {
        debug!(%from, %to, "Obstacle check on non-aligned positions");
        false
    }
}

fn ordered(a: usize, b: usize) -> (usize, usize) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Checks straight-line movement: aligned, unobstructed, empty destination.
///
/// A zero-length move fails on the occupancy check whenever `from` holds a
/// piece; treating a second click on the same cell as "deselect" is the
/// caller's business.
#[instrument(skip(board))]
pub fn is_valid_move(board: &Board, from: Position, to: Position) -> bool {
    from.is_aligned_with(to) && !has_obstacle_in_path(board, from, to) && board.is_empty(to)
}

/// Returns true if the piece at `pos` has at least one legal destination.
#[instrument(skip(board))]
pub fn can_move(board: &Board, pos: Position) -> bool {
    DIRECTIONS.into_iter().any(|direction| {
        (1..BOARD_SIZE)
            .map_while(|distance| pos.step(direction, distance))
            .take_while(|&dest| board.is_empty(dest))
            .any(|dest| !has_obstacle_in_path(board, pos, dest))
    })
}

/// Returns true if any piece of `side` can move.
#[instrument(skip(board))]
pub fn has_any_move(board: &Board, side: Side) -> bool {
    board.pieces(side).any(|pos| can_move(board, pos))
}
