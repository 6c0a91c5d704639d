//! Game rules for hasami shogi.
//!
//! Pure functions over a [`Board`](crate::Board): movement legality,
//! capture detection and win detection. None of them mutate their input
//! or fail; callers translate a `false`/`None` into a [`MatchError`](crate::MatchError).

pub mod capture;
pub mod movement;
pub mod win;

pub use capture::{apply_move, check_captures, is_surrounded};
pub use movement::{can_move, has_any_move, has_obstacle_in_path, is_valid_move};
pub use win::{check_winner, count_pieces};
