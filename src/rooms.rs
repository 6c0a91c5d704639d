//! Catalog of named match rooms.
//!
//! Only these rooms exist. An identifier outside the catalog is rejected
//! before any shared-store access.

use crate::SyncError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::IntoEnumIterator;
use tracing::{instrument, warn};

/// Identifier of one of the nine named rooms.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::EnumIter,
    strum::EnumString,
    strum::Display,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RoomId {
    /// Special match room with a longer clock.
    Special,
    /// Takao room.
    Takao,
    /// Kiho room.
    Kiho,
    /// Unkaku room.
    Unkaku,
    /// Hien room.
    Hien,
    /// Ginsa room.
    Ginsa,
    /// Katsura room.
    Katsura,
    /// Koun room.
    Koun,
    /// Hozuki room.
    Hozuki,
}

impl RoomId {
    /// Parses a room identifier, failing with [`SyncError::UnknownRoom`].
    #[instrument]
    pub fn parse(id: &str) -> Result<Self, SyncError> {
        Self::from_str(id.trim()).map_err(|_| {
            warn!(id, "Unknown room requested");
            SyncError::UnknownRoom {
                name: id.to_string(),
            }
        })
    }

    /// Display name shown in room lists.
    pub fn name(self) -> &'static str {
        match self {
            RoomId::Special => "Special Match Room",
            RoomId::Takao => "Takao Room",
            RoomId::Kiho => "Kiho Room",
            RoomId::Unkaku => "Unkaku Room",
            RoomId::Hien => "Hien Room",
            RoomId::Ginsa => "Ginsa Room",
            RoomId::Katsura => "Katsura Room",
            RoomId::Koun => "Koun Room",
            RoomId::Hozuki => "Hozuki Room",
        }
    }

    /// Room-specific clock allotment, if it differs from the configured default.
    pub fn initial_seconds_override(self) -> Option<u32> {
        match self {
            RoomId::Special => Some(600),
            _ => None,
        }
    }

    /// Clock allotment for this room given the configured default.
    pub fn initial_seconds(self, default: u32) -> u32 {
        self.initial_seconds_override().unwrap_or(default)
    }

    /// All rooms in catalog order.
    pub fn all() -> impl Iterator<Item = RoomId> {
        RoomId::iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_has_nine_rooms() {
        assert_eq!(RoomId::all().count(), 9);
    }

    #[test]
    fn test_parse_known_room() {
        assert_eq!(RoomId::parse("takao").expect("known room"), RoomId::Takao);
        assert_eq!(RoomId::Hozuki.to_string(), "hozuki");
    }

    #[test]
    fn test_parse_unknown_room() {
        assert!(matches!(
            RoomId::parse("lobby"),
            Err(SyncError::UnknownRoom { .. })
        ));
    }

    #[test]
    fn test_special_room_clock() {
        assert_eq!(RoomId::Special.initial_seconds(300), 600);
        assert_eq!(RoomId::Kiho.initial_seconds(300), 300);
    }
}
