//! Frame-polled timing primitives.
//!
//! Nothing here owns a thread or sleeps. The UI loop calls `poll(now)` with a
//! monotonic [`Instant`] each frame, and the primitive reports what became due.
//! Tests drive them with synthetic instants instead of waiting.

use std::time::{Duration, Instant};

/// A cancellable fixed-interval timer. Starting it again replaces the previous
/// schedule, so there is never more than one pending tick stream.
#[derive(Debug, Clone)]
pub struct RepeatingTimer {
    interval: Duration,
    next_due: Option<Instant>,
}

impl RepeatingTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now + self.interval);
    }

    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    pub fn is_active(&self) -> bool {
        self.next_due.is_some()
    }

    /// Pops one due tick, if any. Call repeatedly to drain ticks that piled up
    /// behind a slow frame; each call advances the schedule by one interval.
    pub fn poll_tick(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = Some(due + self.interval);
                true
            }
            _ => false,
        }
    }
}

/// Holds back a value until calls to [`Debouncer::call`] have been quiet for
/// `delay`. Each call replaces the pending value and restarts the wait.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedules `value`, dropping whatever was pending. Returns true when a
    /// pending value was superseded.
    pub fn call(&mut self, value: T, now: Instant) -> bool {
        self.pending.replace((value, now + self.delay)).is_some()
    }

    /// Drops the pending value without firing it.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    /// Returns the pending value once its quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let due = matches!(&self.pending, Some((_, deadline)) if now >= *deadline);
        if due {
            self.pending.take().map(|(value, _)| value)
        } else {
            None
        }
    }
}
