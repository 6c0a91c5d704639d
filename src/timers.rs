//! Background timers owned by a room session.
//!
//! Both timers are cancelled by dropping their handle.

use crate::store::SharedStore;
use crate::{RoomId, RoomRecord};
use chrono::{DateTime, Utc};
use hasami_core::ClockReading;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Source of the current wall-clock time.
pub type TimeSource = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Time source backed by the system clock.
pub fn system_time() -> TimeSource {
    Arc::new(Utc::now)
}

/// Publishes derived clock readings while a match is in play.
///
/// The ticker follows the room's record subscription, so every tick reflects
/// the latest snapshot. It stops on its own once the record is gone or no
/// longer playing.
#[derive(Debug)]
pub struct ClockTicker {
    readings: watch::Receiver<ClockReading>,
    handle: JoinHandle<()>,
}

impl ClockTicker {
    /// Starts ticking every `tick`.
    #[instrument(skip(records, now))]
    pub fn spawn(
        records: watch::Receiver<Option<RoomRecord>>,
        tick: Duration,
        now: TimeSource,
    ) -> Self {
        let initial = current_reading(&records, &now).unwrap_or_default();
        let (tx, readings) = watch::channel(initial);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let Some(reading) = current_reading(&records, &now) else {
                    debug!("Match left play, clock ticker stopping");
                    break;
                };
                tx.send_replace(reading);
            }
        });
        Self { readings, handle }
    }

    /// Subscribes to readings.
    pub fn readings(&self) -> watch::Receiver<ClockReading> {
        self.readings.clone()
    }

    /// Most recent reading.
    pub fn latest(&self) -> ClockReading {
        *self.readings.borrow()
    }

    /// Returns true once the ticker has stopped.
    pub fn is_stopped(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ClockTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn current_reading(
    records: &watch::Receiver<Option<RoomRecord>>,
    now: &TimeSource,
) -> Option<ClockReading> {
    let snapshot = records.borrow();
    let state = snapshot.as_ref()?.match_state();
    state.is_playing().then(|| state.clock_reading(now()))
}

/// Removes a finished room after a grace period.
///
/// The room is only removed if the record still holds the finished match
/// the timer was scheduled for. A room that was deleted and taken by new
/// occupants in the meantime is left alone.
#[derive(Debug)]
pub struct CleanupTimer {
    room: RoomId,
    handle: JoinHandle<()>,
}

impl CleanupTimer {
    /// Schedules removal of `finished` after `grace`.
    #[instrument(skip(store, records, finished), fields(room = %finished.id()))]
    pub fn schedule<S>(
        store: S,
        records: watch::Receiver<Option<RoomRecord>>,
        finished: RoomRecord,
        grace: Duration,
    ) -> Self
    where
        S: SharedStore + 'static,
    {
        let room = *finished.id();
        info!(?grace, "Scheduling room cleanup");
        let handle = tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            if !still_finished(&records, &finished) {
                debug!(%room, "Room changed hands, skipping cleanup");
                return;
            }
            match store.remove(room).await {
                Ok(()) => info!(%room, "Finished room removed"),
                Err(e) => warn!(%room, error = %e, "Room cleanup failed"),
            }
        });
        Self { room, handle }
    }

    /// Room this timer will remove.
    pub fn room(&self) -> RoomId {
        self.room
    }

    /// Returns true once the removal has run.
    pub fn is_done(&self) -> bool {
        self.handle.is_finished()
    }
}

fn still_finished(records: &watch::Receiver<Option<RoomRecord>>, finished: &RoomRecord) -> bool {
    records.borrow().as_ref().is_some_and(|current| {
        current.same_seats(finished) && current.match_state().is_finished()
    })
}

impl Drop for CleanupTimer {
    fn drop(&mut self) {
        if !self.handle.is_finished() {
            debug!(room = %self.room, "Cleanup cancelled");
        }
        self.handle.abort();
    }
}
