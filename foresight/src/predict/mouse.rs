// Copyright 2025 the Foresight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer hover and trajectory hits.

use std::hash::Hash;

use foresight_geometry::{point_in_rect, segment_intersects_rect};
use kurbo::Point;

use super::{Candidate, Candidates};
use crate::registry::Registry;
use crate::types::{CallbackHitType, MouseHit};

/// Hits for one pointer sample.
///
/// A pointer inside the expanded rectangle is a hover. Otherwise, when
/// `trajectory_enabled`, a path `[current, predicted]` crossing it is a
/// trajectory hit, unless one is already recorded for that element.
pub(crate) fn hits<K: Copy + Eq + Hash>(
    registry: &Registry<K>,
    current: Point,
    predicted: Point,
    trajectory_enabled: bool,
) -> Candidates<K> {
    let mut out = Candidates::new();
    for e in registry.iter().filter(|e| e.is_idle()) {
        let region = e.bounds.expanded_rect;
        let hit = if point_in_rect(current, region) {
            MouseHit::Hover
        } else if trajectory_enabled
            && !e.is_trajectory_hit()
            && segment_intersects_rect(current, predicted, region)
        {
            MouseHit::Trajectory
        } else {
            continue;
        };
        out.push(Candidate {
            handle: e.handle,
            hit: CallbackHitType::Mouse(hit),
        });
    }
    out
}
