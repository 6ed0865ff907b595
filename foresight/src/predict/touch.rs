// Copyright 2025 the Foresight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Touch-start and viewport-entry hits for touch-class devices.

use std::hash::Hash;

use foresight_geometry::point_in_rect;
use kurbo::Point;

use super::{Candidate, Candidates};
use crate::registry::Registry;
use crate::types::CallbackHitType;

/// Idle elements whose expanded rectangle contains the touch point.
pub(crate) fn touch_start_hits<K: Copy + Eq + Hash>(
    registry: &Registry<K>,
    point: Point,
) -> Candidates<K> {
    registry
        .iter()
        .filter(|e| e.is_idle() && point_in_rect(point, e.bounds.expanded_rect))
        .map(|e| Candidate {
            handle: e.handle,
            hit: CallbackHitType::Touch,
        })
        .collect()
}

/// Viewport hit for `handle` if it is idle and intersecting.
pub(crate) fn viewport_hit<K: Copy + Eq + Hash>(
    registry: &Registry<K>,
    handle: K,
) -> Option<Candidate<K>> {
    registry
        .get(&handle)
        .filter(|e| e.is_idle() && e.is_intersecting_viewport)
        .map(|e| Candidate {
            handle: e.handle,
            hit: CallbackHitType::Viewport,
        })
}

/// Viewport hits for every idle element already intersecting the viewport.
pub(crate) fn visible_hits<K: Copy + Eq + Hash>(registry: &Registry<K>) -> Candidates<K> {
    registry
        .iter()
        .filter_map(|e| viewport_hit(registry, e.handle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::test_support::registry_with;
    use kurbo::Rect;

    #[test]
    fn touch_inside_expanded_rect() {
        let r = registry_with(&[
            (1, Rect::new(0.0, 0.0, 50.0, 50.0)),
            (2, Rect::new(100.0, 0.0, 150.0, 50.0)),
        ]);
        let got = touch_start_hits(&r, Point::new(50.0, 50.0));
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].handle, 1);
        assert_eq!(got[0].hit, CallbackHitType::Touch);
    }

    #[test]
    fn only_intersecting_elements_hit_viewport() {
        let mut r = registry_with(&[(1, Rect::ZERO), (2, Rect::ZERO)]);
        if let Some(e) = r.get_mut(&2) {
            e.is_intersecting_viewport = true;
        }
        assert!(viewport_hit(&r, 1).is_none());
        assert_eq!(viewport_hit(&r, 2).map(|c| c.hit), Some(CallbackHitType::Viewport));
        assert!(viewport_hit(&r, 3).is_none());
        let all = visible_hits(&r);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].handle, 2);
    }
}
