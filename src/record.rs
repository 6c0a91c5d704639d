//! Shared room record and partial-update patches.

use crate::RoomId;
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use derive_setters::Setters;
use hasami_core::{MatchState, MatchStatus, Side};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::RandomState;
use std::hash::BuildHasher;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, instrument};

/// Opaque identifier a client generates for itself on entering a room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Generates a fresh identifier.
    #[instrument]
    pub fn generate() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let mixed = RandomState::new().hash_one((seq, nanos));
        Self(format!("{mixed:016x}{seq:x}"))
    }

    /// Returns the identifier as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// The single source of truth for one room.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRecord {
    id: RoomId,
    first_player_id: Option<PlayerId>,
    second_player_id: Option<PlayerId>,
    match_state: MatchState,
}

impl RoomRecord {
    /// Creates a waiting room with `first` seated.
    #[instrument(skip(first))]
    pub fn open(id: RoomId, first: PlayerId, initial_seconds: u32, now: DateTime<Utc>) -> Self {
        Self {
            id,
            first_player_id: Some(first),
            second_player_id: None,
            match_state: MatchState::new(initial_seconds, now),
        }
    }

    /// Resolves which side `player` is seated as, if any.
    pub fn role_of(&self, player: &PlayerId) -> Option<Side> {
        if self.first_player_id.as_ref() == Some(player) {
            Some(Side::First)
        } else if self.second_player_id.as_ref() == Some(player) {
            Some(Side::Second)
        } else {
            None
        }
    }

    /// Number of seated participants.
    pub fn player_count(&self) -> usize {
        usize::from(self.first_player_id.is_some()) + usize::from(self.second_player_id.is_some())
    }

    /// Returns true if the Second seat is taken.
    pub fn is_full(&self) -> bool {
        self.second_player_id.is_some()
    }

    /// Returns true if both records seat the same participants.
    pub fn same_seats(&self, other: &RoomRecord) -> bool {
        self.first_player_id == other.first_player_id
            && self.second_player_id == other.second_player_id
    }

    /// Ends a match in play as abandoned by `player`.
    ///
    /// Returns false and changes nothing if `player` holds no seat or the
    /// match is not in play.
    #[instrument(skip(self, player), fields(room = %self.id))]
    pub fn forfeit(&mut self, player: &PlayerId) -> bool {
        let Some(role) = self.role_of(player) else {
            debug!(%player, "Forfeit by a player without a seat ignored");
            return false;
        };
        match self.match_state.abandon(role) {
            Ok(next) => {
                self.match_state = next;
                true
            }
            Err(e) => {
                debug!(error = %e, "Forfeit ignored");
                false
            }
        }
    }

    /// Merges a patch into this record.
    ///
    /// A finished match keeps its outcome: status-only patches are ignored
    /// once the match is over.
    #[instrument(skip(self, patch), fields(room = %self.id))]
    pub fn apply(&mut self, patch: RoomPatch) {
        if let Some(first) = patch.first_player_id {
            self.first_player_id = first;
        }
        if let Some(second) = patch.second_player_id {
            self.second_player_id = second;
        }
        if let Some(state) = patch.match_state {
            self.match_state = state;
        }
        if let Some(status) = patch.status {
            if self.match_state.is_finished() {
                debug!(?status, "Status patch on a finished match ignored");
            } else {
                self.match_state = self.match_state.with_status(status);
            }
        }
    }
}

/// Partial update applied atomically by the store.
///
/// `status` replaces only the lifecycle status, leaving board and clocks as
/// they are at apply time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Setters, Serialize, Deserialize)]
#[setters(strip_option, prefix = "with_")]
#[serde(rename_all = "camelCase")]
pub struct RoomPatch {
    /// New First seat (`Some(None)` vacates it).
    pub first_player_id: Option<Option<PlayerId>>,
    /// New Second seat (`Some(None)` vacates it).
    pub second_player_id: Option<Option<PlayerId>>,
    /// Whole match snapshot.
    pub match_state: Option<MatchState>,
    /// Status only.
    pub status: Option<MatchStatus>,
}

impl RoomPatch {
    /// Returns true if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hasami_core::{EndReason, Outcome};

    #[test]
    fn test_generated_ids_differ() {
        assert_ne!(PlayerId::generate(), PlayerId::generate());
    }

    #[test]
    fn test_role_resolution() {
        let first = PlayerId::from("a");
        let second = PlayerId::from("b");
        let mut record = RoomRecord::open(RoomId::Kiho, first.clone(), 300, Utc::now());
        record.apply(RoomPatch::default().with_second_player_id(Some(second.clone())));
        assert_eq!(record.role_of(&first), Some(Side::First));
        assert_eq!(record.role_of(&second), Some(Side::Second));
        assert_eq!(record.role_of(&PlayerId::from("c")), None);
        assert_eq!(record.player_count(), 2);
    }

    #[test]
    fn test_status_patch_keeps_board() {
        let now = Utc::now();
        let mut record = RoomRecord::open(RoomId::Kiho, PlayerId::from("a"), 300, now);
        let playing = record.match_state().start(300, now).expect("starts");
        record.apply(RoomPatch::default().with_match_state(playing.clone()));
        let outcome = Outcome {
            winner: Side::First,
            reason: EndReason::Abandoned,
        };
        record.apply(RoomPatch::default().with_status(MatchStatus::Finished(outcome)));
        assert_eq!(record.match_state().board(), playing.board());
        assert_eq!(record.match_state().winner(), Some(Side::First));
    }

    #[test]
    fn test_finished_outcome_survives_status_patch() {
        let now = Utc::now();
        let mut record = RoomRecord::open(RoomId::Kiho, PlayerId::from("a"), 300, now);
        let resigned = record
            .match_state()
            .start(300, now)
            .and_then(|s| s.resign(Side::First, Default::default()))
            .expect("resigns");
        record.apply(RoomPatch::default().with_match_state(resigned.clone()));

        let late_forfeit = Outcome {
            winner: Side::First,
            reason: EndReason::Abandoned,
        };
        record.apply(RoomPatch::default().with_status(MatchStatus::Finished(late_forfeit)));
        assert_eq!(record.match_state(), &resigned);
        assert_eq!(record.match_state().winner(), Some(Side::Second));
    }

    #[test]
    fn test_forfeit_only_while_seated_and_playing() {
        let now = Utc::now();
        let host = PlayerId::from("a");
        let guest = PlayerId::from("b");
        let mut record = RoomRecord::open(RoomId::Kiho, host.clone(), 300, now);
        assert!(!record.forfeit(&host), "waiting match has nothing to forfeit");

        let playing = record.match_state().start(300, now).expect("starts");
        record.apply(
            RoomPatch::default()
                .with_second_player_id(Some(guest.clone()))
                .with_match_state(playing),
        );
        assert!(!record.forfeit(&PlayerId::from("stranger")));
        assert!(record.match_state().is_playing());

        assert!(record.forfeit(&guest));
        assert_eq!(
            record.match_state().status(),
            MatchStatus::Finished(Outcome {
                winner: Side::First,
                reason: EndReason::Abandoned,
            })
        );
        assert!(!record.forfeit(&host), "finished match keeps its outcome");
        assert_eq!(record.match_state().winner(), Some(Side::First));
    }

    #[test]
    fn test_record_json_shape() {
        let record = RoomRecord::open(RoomId::Hien, PlayerId::from("a"), 300, Utc::now());
        let json = serde_json::to_value(&record).expect("serializes");
        assert_eq!(json["id"], "hien");
        assert_eq!(json["firstPlayerId"], "a");
        assert!(json["secondPlayerId"].is_null());
        assert!(json["matchState"].is_object());
    }
}
