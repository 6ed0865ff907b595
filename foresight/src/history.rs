// Copyright 2025 the Foresight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounded pointer history and first-order trajectory extrapolation.

use std::collections::VecDeque;

use kurbo::Point;

/// One timestamped pointer position.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PositionSample {
    /// Pointer position.
    pub point: Point,
    /// Host timestamp in milliseconds.
    pub timestamp_ms: u64,
}

/// Fixed-capacity FIFO of [`PositionSample`]s.
///
/// Velocity is taken over the whole retained window rather than the last two
/// samples, so the capacity is the smoothing knob.
#[derive(Clone, Debug)]
pub struct PositionHistory {
    samples: VecDeque<PositionSample>,
    capacity: usize,
}

impl PositionHistory {
    /// An empty history holding at most `capacity` samples (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Maximum number of samples retained.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of samples currently retained.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` if no sample has been recorded.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Most recent sample.
    pub fn last(&self) -> Option<&PositionSample> {
        self.samples.back()
    }

    /// Change the capacity, dropping the oldest samples if it shrinks.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        self.evict();
    }

    /// Append a sample, evicting the oldest when full.
    pub fn push(&mut self, point: Point, timestamp_ms: u64) {
        self.samples.push_back(PositionSample {
            point,
            timestamp_ms,
        });
        self.evict();
    }

    /// Forget every sample.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Record `current` and extrapolate it `horizon_ms` ahead.
    ///
    /// With fewer than two samples, or when the window spans no time, the
    /// current point is returned unchanged.
    pub fn predict(&mut self, current: Point, now_ms: u64, horizon_ms: u64) -> Point {
        self.push(current, now_ms);
        self.extrapolate(current, horizon_ms)
    }

    /// Extrapolate `current` along the window's average velocity without recording it.
    pub fn extrapolate(&self, current: Point, horizon_ms: u64) -> Point {
        let (Some(first), Some(last)) = (self.samples.front(), self.samples.back()) else {
            return current;
        };
        if self.samples.len() < 2 {
            return current;
        }
        let dt = last.timestamp_ms.saturating_sub(first.timestamp_ms);
        if dt == 0 {
            return current;
        }
        let velocity = (last.point - first.point) / dt as f64;
        current + velocity * horizon_ms as f64
    }

    fn evict(&mut self) {
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }
}
