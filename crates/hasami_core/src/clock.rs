//! Derived match clocks.
//!
//! Only the banked seconds at the last move and the time of that move are
//! stored. The live value for the side to move is always computed.

use crate::Side;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default initial allotment per side, in seconds.
pub const DEFAULT_INITIAL_SECONDS: u32 = 300;

/// Remaining seconds for both sides at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ClockReading {
    /// First player's remaining seconds.
    pub first: u32,
    /// Second player's remaining seconds.
    pub second: u32,
}

impl ClockReading {
    /// Remaining seconds for `side`.
    pub fn get(&self, side: Side) -> u32 {
        match side {
            Side::First => self.first,
            Side::Second => self.second,
        }
    }

    /// Formats both clocks as `m:ss`.
    pub fn display(&self) -> (String, String) {
        (format_clock(self.first), format_clock(self.second))
    }
}

/// Whole seconds elapsed from `since` to `now`, floored at zero.
pub fn elapsed_seconds(since: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let secs = (now - since).num_seconds().max(0);
    u32::try_from(secs).unwrap_or(u32::MAX)
}

/// Formats seconds as `m:ss`.
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
