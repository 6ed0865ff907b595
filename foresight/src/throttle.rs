// Copyright 2025 the Foresight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host-clocked timers: a single-slot trailing throttle and a fixed interval.
//!
//! Neither owns a clock. Callers pass the current time and poll for due work.

/// Trailing-edge throttle with at most one deferred run.
///
/// A request inside the delay window schedules one run at the window's end;
/// further requests before then replace it rather than queueing.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Throttle {
    delay_ms: u64,
    last_run_ms: Option<u64>,
    pending_at_ms: Option<u64>,
}

impl Throttle {
    pub(crate) fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            last_run_ms: None,
            pending_at_ms: None,
        }
    }

    pub(crate) fn set_delay(&mut self, delay_ms: u64) {
        self.delay_ms = delay_ms;
    }

    /// Ask to run at `now_ms`. Returns `true` if the caller should run now;
    /// otherwise a deferred run has been scheduled.
    pub(crate) fn request(&mut self, now_ms: u64) -> bool {
        let due = match self.last_run_ms {
            Some(last) if self.delay_ms > 0 => last.saturating_add(self.delay_ms),
            _ => now_ms,
        };
        if now_ms >= due {
            self.last_run_ms = Some(now_ms);
            self.pending_at_ms = None;
            true
        } else {
            self.pending_at_ms = Some(due);
            false
        }
    }

    /// Returns `true` once when a deferred run is due.
    pub(crate) fn poll(&mut self, now_ms: u64) -> bool {
        match self.pending_at_ms {
            Some(at) if at <= now_ms => {
                self.pending_at_ms = None;
                self.last_run_ms = Some(now_ms);
                true
            }
            _ => false,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_pending(&self) -> bool {
        self.pending_at_ms.is_some()
    }

    pub(crate) fn cancel(&mut self) {
        self.pending_at_ms = None;
    }
}

/// Fixed-period timer that only ticks while started.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Interval {
    period_ms: u64,
    next_at_ms: Option<u64>,
}

impl Interval {
    pub(crate) fn new(period_ms: u64) -> Self {
        Self {
            period_ms: period_ms.max(1),
            next_at_ms: None,
        }
    }

    /// Start ticking from `now_ms`. No effect if already running.
    pub(crate) fn start(&mut self, now_ms: u64) {
        if self.next_at_ms.is_none() {
            self.next_at_ms = Some(now_ms.saturating_add(self.period_ms));
        }
    }

    pub(crate) fn stop(&mut self) {
        self.next_at_ms = None;
    }

    #[cfg(test)]
    pub(crate) fn is_running(&self) -> bool {
        self.next_at_ms.is_some()
    }

    /// Returns `true` if a tick is due, and schedules the next one. Missed
    /// ticks collapse into one.
    pub(crate) fn poll(&mut self, now_ms: u64) -> bool {
        match self.next_at_ms {
            Some(at) if at <= now_ms => {
                self.next_at_ms = Some(now_ms.saturating_add(self.period_ms));
                true
            }
            _ => false,
        }
    }
}
