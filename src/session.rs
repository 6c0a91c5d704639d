//! Client-side room session.
//!
//! A session bridges one participant's local view to the shared room record.
//! The remote snapshot is always authoritative: every change replaces the
//! cached record wholesale, and local writes are committed to the store
//! before the cache reflects them.

use crate::store::{DisconnectAction, SharedStore};
use crate::timers::{CleanupTimer, ClockTicker, TimeSource, system_time};
use crate::{GameConfig, PlayerId, RoomId, RoomPatch, RoomRecord, SyncError};
use chrono::{DateTime, Utc};
use hasami_core::{
    Cell, ClockReading, MatchError, MatchState, MatchStatus, Move, Outcome, Position,
    Side,
};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// Seat claims retried after losing a join race.
const JOIN_ATTEMPTS: usize = 2;

/// Result of clicking a board cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// An own piece is now selected.
    Selected(Position),
    /// The selected piece was clicked again.
    Deselected,
    /// Empty cell clicked with nothing selected.
    Ignored,
    /// The selected piece moved to the clicked cell.
    Moved {
        /// Opposing pieces removed by the move.
        captured: Vec<Position>,
    },
}

/// What changed in the room after a snapshot was reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    /// Board, turn or clocks changed.
    Updated,
    /// Both seats filled and play began.
    Started,
    /// The match ended.
    Finished(Outcome),
    /// The room record no longer exists.
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Intent {
    RemoveRoom,
    Forfeit,
}

/// One participant's connection to a room.
pub struct RoomSession<S> {
    store: S,
    room: RoomId,
    player_id: PlayerId,
    config: GameConfig,
    now: TimeSource,
    changes: watch::Receiver<Option<RoomRecord>>,
    record: Option<RoomRecord>,
    selection: Option<Position>,
    intent: Option<Intent>,
    ticker: Option<ClockTicker>,
    cleanup: Option<CleanupTimer>,
    left: bool,
}

impl<S> std::fmt::Debug for RoomSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomSession")
            .field("room", &self.room)
            .field("player_id", &self.player_id)
            .field("record", &self.record)
            .field("selection", &self.selection)
            .field("intent", &self.intent)
            .field("left", &self.left)
            .finish_non_exhaustive()
    }
}

impl<S> RoomSession<S>
where
    S: SharedStore + Clone + 'static,
{
    /// Enters `room` using the system clock.
    ///
    /// Creates the room as First if it does not exist, joins as Second and
    /// starts play if one seat is open, and fails with
    /// [`SyncError::RoomFull`] otherwise.
    pub async fn enter_room(store: S, room: RoomId, config: GameConfig) -> Result<Self, SyncError> {
        Self::enter_room_with_time(store, room, config, system_time()).await
    }

    /// Enters `room` with an explicit time source.
    #[instrument(skip(store, config, now))]
    pub async fn enter_room_with_time(
        store: S,
        room: RoomId,
        config: GameConfig,
        now: TimeSource,
    ) -> Result<Self, SyncError> {
        let changes = store.subscribe(room).await?;
        let player_id = PlayerId::generate();
        let initial_seconds = room.initial_seconds(*config.initial_seconds());

        let mut seated = None;
        for attempt in 0..JOIN_ATTEMPTS {
            seated = claim_seat(&store, room, &player_id, initial_seconds, now()).await?;
            if seated.is_some() {
                break;
            }
            debug!(attempt, "Seat claim lost a race");
        }
        let Some(record) = seated else {
            warn!("Could not claim a seat");
            return Err(SyncError::RoomFull { room });
        };

        info!(
            player_id = %player_id,
            role = ?record.role_of(&player_id),
            "Entered room"
        );
        let mut session = Self {
            store,
            room,
            player_id,
            config,
            now,
            changes,
            record: None,
            selection: None,
            intent: None,
            ticker: None,
            cleanup: None,
            left: false,
        };
        session.reconcile(Some(record)).await;
        Ok(session)
    }

    /// Waits for the next remote change and reconciles it.
    #[instrument(skip(self), fields(room = %self.room))]
    pub async fn next_event(&mut self) -> SyncEvent {
        if self.left {
            return SyncEvent::Closed;
        }
        if self.changes.changed().await.is_err() {
            warn!("Store subscription ended");
            return self.reconcile(None).await;
        }
        let snapshot = self.changes.borrow_and_update().clone();
        self.reconcile(snapshot).await
    }

    /// Handles a click on `position`.
    ///
    /// Selects own pieces, deselects on a second click, and moves the
    /// selected piece to a clicked empty cell. Every rejection clears the
    /// selection.
    #[instrument(skip(self), fields(room = %self.room))]
    pub async fn click(&mut self, position: Position) -> Result<ClickOutcome, SyncError> {
        let (state, role) = match self.seated() {
            Ok(seated) => seated,
            Err(e) => {
                self.selection = None;
                return Err(e);
            }
        };
        let gate = match state.status() {
            MatchStatus::Finished(_) => Err(MatchError::GameEnded),
            MatchStatus::Waiting => Err(MatchError::NotStarted),
            MatchStatus::Playing if state.turn() != role => Err(MatchError::NotYourTurn(role)),
            MatchStatus::Playing => Ok(()),
        };
        if let Err(e) = gate {
            self.selection = None;
            return Err(e.into());
        }

        if self.selection == Some(position) {
            self.selection = None;
            return Ok(ClickOutcome::Deselected);
        }
        match (state.board().get(position), self.selection) {
            (Cell::Occupied(side), _) if side == role => {
                debug!(%position, "Piece selected");
                self.selection = Some(position);
                Ok(ClickOutcome::Selected(position))
            }
            (Cell::Occupied(_), _) => {
                self.selection = None;
                Err(MatchError::WrongPiece(position).into())
            }
            (Cell::Empty, None) => Ok(ClickOutcome::Ignored),
            (Cell::Empty, Some(from)) => {
                let captured = self.apply_move(from, position).await?;
                Ok(ClickOutcome::Moved { captured })
            }
        }
    }

    /// Validates a move locally and commits the resulting state.
    ///
    /// Returns the captured positions. Nothing is cached until the store
    /// accepts the write.
    #[instrument(skip(self), fields(room = %self.room))]
    pub async fn apply_move(
        &mut self,
        from: Position,
        to: Position,
    ) -> Result<Vec<Position>, SyncError> {
        self.selection = None;
        let (state, role) = self.seated()?;
        let outcome = state
            .apply_move(Move::new(role, from, to), self.now())
            .inspect_err(|e| debug!(error = %e, "Move rejected"))?;
        self.commit(RoomPatch::default().with_match_state(outcome.state))
            .await?;
        Ok(outcome.captured)
    }

    /// Resigns; the opponent wins.
    #[instrument(skip(self), fields(room = %self.room))]
    pub async fn resign(&mut self) -> Result<(), SyncError> {
        self.selection = None;
        let (state, role) = self.seated()?;
        let next = state.resign(role, *self.config.resign_policy())?;
        self.commit(RoomPatch::default().with_status(next.status()))
            .await
    }

    /// Commits a timeout if the side to move has run out of time.
    ///
    /// Either participant may claim it. Returns the outcome if one was
    /// committed.
    #[instrument(skip(self), fields(room = %self.room))]
    pub async fn claim_timeout(&mut self) -> Result<Option<Outcome>, SyncError> {
        let (state, _) = self.seated()?;
        let Some(next) = state.timed_out(self.now()) else {
            return Ok(None);
        };
        let outcome = match next.status() {
            MatchStatus::Finished(outcome) => Some(outcome),
            _ => None,
        };
        self.commit(RoomPatch::default().with_match_state(next))
            .await?;
        Ok(outcome)
    }

    /// Leaves the room.
    ///
    /// While waiting or after the match, the room is removed. Mid-match the
    /// departing side forfeits. Leaving twice is a no-op.
    #[instrument(skip(self), fields(room = %self.room))]
    pub async fn leave_room(&mut self) -> Result<(), SyncError> {
        if self.left {
            return Ok(());
        }
        self.selection = None;
        let seat = self.record.as_ref().and_then(|record| {
            record
                .role_of(&self.player_id)
                .map(|role| (record.match_state().clone(), role))
        });
        if let Some((state, role)) = seat {
            let result = match state.status() {
                MatchStatus::Playing => {
                    let next = state.abandon(role)?;
                    self.store
                        .update(self.room, RoomPatch::default().with_status(next.status()))
                        .await
                }
                MatchStatus::Waiting | MatchStatus::Finished(_) => self.store.remove(self.room).await,
            };
            result.inspect_err(|e| warn!(error = %e, "Leave failed"))?;
        }

        self.set_intent(None).await;
        self.left = true;
        self.record = None;
        self.ticker = None;
        self.cleanup = None;
        info!("Left room");
        Ok(())
    }

    async fn commit(&mut self, patch: RoomPatch) -> Result<(), SyncError> {
        let Some(mut record) = self.record.clone() else {
            return Err(SyncError::RoomClosed);
        };
        self.store
            .update(self.room, patch.clone())
            .await
            .inspect_err(|e| warn!(error = %e, "Store rejected update"))?;
        record.apply(patch);
        self.reconcile(Some(record)).await;
        Ok(())
    }

    /// Replaces the cached record with `snapshot` and reacts to status changes.
    ///
    /// A snapshot without this player's seat belongs to a later occupant of
    /// the room and closes the session just like a deletion.
    async fn reconcile(&mut self, snapshot: Option<RoomRecord>) -> SyncEvent {
        let seated = snapshot.filter(|record| record.role_of(&self.player_id).is_some());
        let Some(record) = seated else {
            if self.record.is_some() {
                info!(room = %self.room, "Room closed");
            }
            self.record = None;
            self.selection = None;
            self.ticker = None;
            self.cleanup = None;
            self.set_intent(None).await;
            return SyncEvent::Closed;
        };

        let previous = self
            .record
            .as_ref()
            .map(|r| (r.match_state().status(), r.match_state().turn()));
        let state = record.match_state();
        let status = state.status();
        if previous.map(|(_, turn)| turn) != Some(state.turn()) || !state.is_playing() {
            self.selection = None;
        }
        self.record = Some(record);
        self.set_intent(self.desired_intent()).await;

        let status_changed = previous.map(|(status, _)| status) != Some(status);
        match status {
            MatchStatus::Playing => {
                if self.ticker.is_none() {
                    self.ticker = Some(ClockTicker::spawn(
                        self.changes.clone(),
                        self.config.clock_tick(),
                        self.now.clone(),
                    ));
                }
                if status_changed {
                    info!(room = %self.room, "Match started");
                    SyncEvent::Started
                } else {
                    SyncEvent::Updated
                }
            }
            MatchStatus::Finished(outcome) => {
                self.ticker = None;
                if self.cleanup.is_none() {
                    self.cleanup = self.record.clone().map(|finished| {
                        CleanupTimer::schedule(
                            self.store.clone(),
                            self.changes.clone(),
                            finished,
                            self.config.cleanup_grace(),
                        )
                    });
                }
                if status_changed {
                    info!(room = %self.room, %outcome, "Match finished");
                    SyncEvent::Finished(outcome)
                } else {
                    SyncEvent::Updated
                }
            }
            MatchStatus::Waiting => SyncEvent::Updated,
        }
    }

    fn desired_intent(&self) -> Option<Intent> {
        let record = self.record.as_ref()?;
        let role = record.role_of(&self.player_id)?;
        match record.match_state().status() {
            MatchStatus::Waiting if role == Side::First => Some(Intent::RemoveRoom),
            MatchStatus::Playing => Some(Intent::Forfeit),
            _ => None,
        }
    }

    /// Registers or cancels the store-side disconnect action.
    ///
    /// Failures are logged and retried on the next snapshot.
    async fn set_intent(&mut self, desired: Option<Intent>) {
        if desired == self.intent {
            return;
        }
        let result = match desired {
            Some(Intent::RemoveRoom) => {
                self.store
                    .on_disconnect(self.room, DisconnectAction::Remove)
                    .await
            }
            Some(Intent::Forfeit) => {
                self.store
                    .on_disconnect(
                        self.room,
                        DisconnectAction::Forfeit(self.player_id.clone()),
                    )
                    .await
            }
            None => self.store.cancel_on_disconnect(self.room).await,
        };
        match result {
            Ok(()) => {
                debug!(room = %self.room, ?desired, "Disconnect intent updated");
                self.intent = desired;
            }
            Err(e) => warn!(room = %self.room, error = %e, "Disconnect intent not updated"),
        }
    }
}

impl<S> RoomSession<S> {
    fn now(&self) -> DateTime<Utc> {
        (self.now)()
    }

    fn seated(&self) -> Result<(MatchState, Side), SyncError> {
        if self.left {
            return Err(SyncError::NotSeated);
        }
        let record = self.record.as_ref().ok_or(SyncError::RoomClosed)?;
        let role = record
            .role_of(&self.player_id)
            .ok_or(SyncError::NotSeated)?;
        Ok((record.match_state().clone(), role))
    }

    /// Room this session entered.
    pub fn room(&self) -> RoomId {
        self.room
    }

    /// This client's opaque identifier.
    pub fn player_id(&self) -> &PlayerId {
        &self.player_id
    }

    /// Side this client plays, derived from the latest snapshot.
    pub fn role(&self) -> Option<Side> {
        if self.left {
            return None;
        }
        self.record.as_ref()?.role_of(&self.player_id)
    }

    /// Latest reconciled snapshot.
    pub fn record(&self) -> Option<&RoomRecord> {
        self.record.as_ref()
    }

    /// Match state from the latest snapshot.
    pub fn match_state(&self) -> Option<&MatchState> {
        self.record.as_ref().map(RoomRecord::match_state)
    }

    /// Lifecycle status from the latest snapshot.
    pub fn status(&self) -> Option<MatchStatus> {
        self.match_state().map(MatchState::status)
    }

    /// Currently selected own piece.
    pub fn selection(&self) -> Option<Position> {
        self.selection
    }

    /// Returns true once [`leave_room`](Self::leave_room) succeeded.
    pub fn has_left(&self) -> bool {
        self.left
    }

    /// Live clocks derived from the latest snapshot.
    pub fn clock_reading(&self) -> Option<ClockReading> {
        self.match_state().map(|state| state.clock_reading(self.now()))
    }

    /// Subscribes to periodic clock readings while playing.
    pub fn clock_readings(&self) -> Option<watch::Receiver<ClockReading>> {
        self.ticker.as_ref().map(ClockTicker::readings)
    }

    /// Returns true while a post-game cleanup is pending or done.
    pub fn cleanup_scheduled(&self) -> bool {
        self.cleanup.is_some()
    }
}

/// Claims a seat and resolves the resulting role by re-reading the record.
///
/// Returns `None` if another client's write won the race.
#[instrument(skip(store, player_id))]
async fn claim_seat<S>(
    store: &S,
    room: RoomId,
    player_id: &PlayerId,
    initial_seconds: u32,
    now: DateTime<Utc>,
) -> Result<Option<RoomRecord>, SyncError>
where
    S: SharedStore + ?Sized,
{
    match store.read(room).await? {
        None => {
            debug!("Creating room as First");
            let record = RoomRecord::open(room, player_id.clone(), initial_seconds, now);
            store.write(room, record).await?;
        }
        Some(existing) if existing.is_full() => {
            info!("Room is full");
            return Err(SyncError::RoomFull { room });
        }
        Some(existing) => {
            debug!("Joining room as Second");
            let started = existing.match_state().start(initial_seconds, now)?;
            let patch = RoomPatch::default()
                .with_second_player_id(Some(player_id.clone()))
                .with_match_state(started);
            store.update(room, patch).await?;
        }
    }

    let record = store.read(room).await?;
    Ok(record.filter(|record| record.role_of(player_id).is_some()))
}
