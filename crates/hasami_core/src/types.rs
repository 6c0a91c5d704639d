//! Core domain types for hasami shogi.

use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator};

/// Side length of the square board.
pub const BOARD_SIZE: usize = 9;

/// One of the two competing players.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIter,
)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Sente. Starts on the bottom row and moves first.
    First,
    /// Gote. Starts on the top row.
    Second,
}

impl Side {
    /// Returns the opposing side.
    pub fn opponent(self) -> Self {
        match self {
            Side::First => Side::Second,
            Side::Second => Side::First,
        }
    }

    /// Display label used by presentation layers.
    pub fn label(self) -> &'static str {
        match self {
            Side::First => "Sente",
            Side::Second => "Gote",
        }
    }

    /// Row this side's pieces occupy at the start of a match.
    pub fn home_row(self) -> usize {
        match self {
            Side::First => BOARD_SIZE - 1,
            Side::Second => 0,
        }
    }

    /// Both sides in turn order.
    pub fn both() -> impl Iterator<Item = Side> {
        Side::iter()
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A cell on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    /// No piece.
    #[default]
    Empty,
    /// Holds one piece of the given side.
    Occupied(Side),
}

impl Cell {
    /// Returns true if the cell holds no piece.
    pub fn is_empty(self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Returns the owner of the piece in this cell, if any.
    pub fn side(self) -> Option<Side> {
        match self {
            Cell::Empty => None,
            Cell::Occupied(side) => Some(side),
        }
    }
}

/// The four orthogonal step directions as (row, col) deltas.
pub const DIRECTIONS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// A (row, column) coordinate on the board, both in `0..9`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "(usize, usize)", into = "(usize, usize)")]
pub struct Position {
    row: usize,
    col: usize,
}

impl Position {
    /// Creates a position, returning `None` if either coordinate is off the board.
    pub fn new(row: usize, col: usize) -> Option<Self> {
        (row < BOARD_SIZE && col < BOARD_SIZE).then_some(Self { row, col })
    }

    /// Row index.
    pub fn row(self) -> usize {
        self.row
    }

    /// Column index.
    pub fn col(self) -> usize {
        self.col
    }

    /// Moves `distance` cells along `direction`, or `None` if that leaves the board.
    pub fn step(self, (dr, dc): (isize, isize), distance: usize) -> Option<Self> {
        let distance = isize::try_from(distance).ok()?;
        let row = self.row.checked_add_signed(dr.checked_mul(distance)?)?;
        let col = self.col.checked_add_signed(dc.checked_mul(distance)?)?;
        Self::new(row, col)
    }

    /// Orthogonal neighbours that exist on the board (2 at corners, 3 on edges, 4 inside).
    pub fn neighbors(self) -> impl Iterator<Item = Position> {
        DIRECTIONS.into_iter().filter_map(move |d| self.step(d, 1))
    }

    /// Returns true if both positions share a row or a column.
    pub fn is_aligned_with(self, other: Position) -> bool {
        self.row == other.row || self.col == other.col
    }

    /// All 81 positions in row-major order.
    pub fn all() -> impl Iterator<Item = Position> {
        (0..BOARD_SIZE).flat_map(|row| (0..BOARD_SIZE).map(move |col| Position { row, col }))
    }
}

impl TryFrom<(usize, usize)> for Position {
    type Error = String;

    fn try_from((row, col): (usize, usize)) -> Result<Self, Self::Error> {
        Self::new(row, col).ok_or_else(|| format!("position ({row}, {col}) is off the board"))
    }
}

impl From<Position> for (usize, usize) {
    fn from(pos: Position) -> Self {
        (pos.row, pos.col)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// 9x9 hasami shogi board.
///
/// The board is a plain `Copy` value, so every snapshot handed to a reader
/// is independent of later moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    cells: [[Cell; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// Creates a board with no pieces.
    pub fn empty() -> Self {
        Self {
            cells: [[Cell::Empty; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    /// Creates the starting position: Second fills row 0, First fills row 8.
    pub fn initial() -> Self {
        let mut board = Self::empty();
        for side in Side::both() {
            board.cells[side.home_row()] = [Cell::Occupied(side); BOARD_SIZE];
        }
        board
    }

    /// Gets the cell at the given position.
    pub fn get(&self, pos: Position) -> Cell {
        self.cells[pos.row][pos.col]
    }

    /// Sets the cell at the given position.
    pub fn set(&mut self, pos: Position, cell: Cell) {
        self.cells[pos.row][pos.col] = cell;
    }

    /// Checks if the cell at `pos` is empty.
    pub fn is_empty(&self, pos: Position) -> bool {
        self.get(pos).is_empty()
    }

    /// Returns the rows of the board.
    pub fn rows(&self) -> &[[Cell; BOARD_SIZE]; BOARD_SIZE] {
        &self.cells
    }

    /// Positions holding a piece of `side`, in row-major order.
    pub fn pieces(&self, side: Side) -> impl Iterator<Item = Position> + '_ {
        Position::all().filter(move |&pos| self.get(pos) == Cell::Occupied(side))
    }

    /// Number of pieces `side` has on the board.
    pub fn count(&self, side: Side) -> usize {
        self.pieces(side).count()
    }

    /// Formats the board as text: `F` for First, `S` for Second, `.` for empty.
    pub fn display(&self) -> String {
        let mut out = String::with_capacity((BOARD_SIZE * 2 + 1) * (BOARD_SIZE + 1));
        out.push_str("  0 1 2 3 4 5 6 7 8\n");
        for (row, cells) in self.cells.iter().enumerate() {
            out.push_str(&row.to_string());
            for cell in cells {
                out.push(' ');
                out.push(match cell {
                    Cell::Empty => '.',
                    Cell::Occupied(Side::First) => 'F',
                    Cell::Occupied(Side::Second) => 'S',
                });
            }
            out.push('\n');
        }
        out
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::initial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_board_layout() {
        let board = Board::initial();
        for pos in Position::all() {
            let expected = match pos.row() {
                0 => Cell::Occupied(Side::Second),
                8 => Cell::Occupied(Side::First),
                _ => Cell::Empty,
            };
            assert_eq!(board.get(pos), expected, "at {pos}");
        }
        assert_eq!(board.count(Side::First), 9);
        assert_eq!(board.count(Side::Second), 9);
    }

    #[test]
    fn test_position_bounds() {
        assert!(Position::new(8, 8).is_some());
        assert!(Position::new(9, 0).is_none());
        assert!(Position::new(0, 9).is_none());
    }

    #[test]
    fn test_neighbors_at_corner_and_edge() {
        let corner = Position::new(0, 0).expect("on board");
        assert_eq!(corner.neighbors().count(), 2);
        let edge = Position::new(0, 4).expect("on board");
        assert_eq!(edge.neighbors().count(), 3);
        let center = Position::new(4, 4).expect("on board");
        assert_eq!(center.neighbors().count(), 4);
    }

    #[test]
    fn test_step_stops_at_edge() {
        let pos = Position::new(1, 7).expect("on board");
        assert_eq!(pos.step((-1, 0), 1), Position::new(0, 7));
        assert_eq!(pos.step((-1, 0), 2), None);
        assert_eq!(pos.step((0, 1), 2), None);
    }

    #[test]
    fn test_position_serde_rejects_off_board() {
        let pos: Position = serde_json::from_str("[3,4]").expect("valid position");
        assert_eq!(pos, Position::new(3, 4).expect("on board"));
        assert!(serde_json::from_str::<Position>("[3,9]").is_err());
    }
}
