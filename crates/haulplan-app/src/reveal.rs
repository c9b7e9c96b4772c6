use crate::schedule::RepeatingTimer;
use haulplan_core::TripId;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealState {
    Idle,
    Revealing,
    Complete,
}

/// What a single poll advanced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevealProgress {
    /// Visible counts reached by each tick, in order.
    pub steps: Vec<usize>,
    pub completed: bool,
}

impl RevealProgress {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty() && !self.completed
    }
}

/// Reveals a trip's legs one per timer tick.
///
/// `visible` only grows while the same trip is loaded and never exceeds the
/// leg count. Loading any trip, including the same id again, cancels the
/// running timer before restarting from zero.
#[derive(Debug)]
pub struct LegRevealScheduler {
    state: RevealState,
    trip: Option<TripId>,
    leg_count: usize,
    visible: usize,
    timer: RepeatingTimer,
    ticks_fired: u64,
}

impl LegRevealScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            state: RevealState::Idle,
            trip: None,
            leg_count: 0,
            visible: 0,
            timer: RepeatingTimer::new(interval),
            ticks_fired: 0,
        }
    }

    pub fn state(&self) -> RevealState {
        self.state
    }

    pub fn trip(&self) -> Option<TripId> {
        self.trip
    }

    pub fn visible(&self) -> usize {
        self.visible
    }

    pub fn leg_count(&self) -> usize {
        self.leg_count
    }

    pub fn is_timer_active(&self) -> bool {
        self.timer.is_active()
    }

    /// Total ticks applied since construction, across every trip.
    pub fn ticks_fired(&self) -> u64 {
        self.ticks_fired
    }

    pub fn start(&mut self, trip: TripId, leg_count: usize, now: Instant) {
        self.timer.cancel();
        self.trip = Some(trip);
        self.leg_count = leg_count;
        self.visible = 0;
        if leg_count == 0 {
            self.state = RevealState::Complete;
            debug!(%trip, "empty trip, reveal complete immediately");
        } else {
            self.state = RevealState::Revealing;
            self.timer.start(now);
            debug!(%trip, leg_count, "reveal started");
        }
    }

    pub fn poll(&mut self, now: Instant) -> RevealProgress {
        let mut progress = RevealProgress::default();
        if self.state != RevealState::Revealing {
            return progress;
        }
        while self.visible < self.leg_count && self.timer.poll_tick(now) {
            self.visible += 1;
            self.ticks_fired += 1;
            progress.steps.push(self.visible);
        }
        if self.visible >= self.leg_count {
            self.timer.cancel();
            self.state = RevealState::Complete;
            progress.completed = true;
            debug!(trip = ?self.trip, visible = self.visible, "reveal complete");
        }
        progress
    }

    /// Stops the reveal and forgets the trip.
    pub fn teardown(&mut self) {
        self.timer.cancel();
        self.state = RevealState::Idle;
        self.trip = None;
        self.leg_count = 0;
        self.visible = 0;
    }
}
