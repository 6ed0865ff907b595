// Copyright 2025 the Foresight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scroll trajectory hits.
//!
//! A scroll moves content under a stationary pointer, which is equivalent to
//! the pointer travelling the other way through the content. The pointer is
//! projected `scroll_margin` pixels along the dominant scroll axis and the
//! resulting path is tested like a pointer trajectory.

use std::hash::Hash;

use foresight_geometry::{Axis, dominant_axis, segment_intersects_rect};
use kurbo::{Point, Vec2};

use super::{Candidate, Candidates};
use crate::registry::Registry;
use crate::types::{CallbackHitType, ScrollDirection};

/// Projected pointer path for one scroll sample.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct ScrollProjection {
    pub(crate) current: Point,
    pub(crate) predicted: Point,
    pub(crate) direction: ScrollDirection,
}

/// Project `pointer` along the dominant axis of `delta`.
///
/// Returns `None` for a zero delta.
pub(crate) fn project(pointer: Point, delta: Vec2, margin: f64) -> Option<ScrollProjection> {
    let (direction, offset) = match dominant_axis(delta)? {
        Axis::Vertical if delta.y > 0.0 => (ScrollDirection::Down, Vec2::new(0.0, margin)),
        Axis::Vertical => (ScrollDirection::Up, Vec2::new(0.0, -margin)),
        Axis::Horizontal if delta.x > 0.0 => (ScrollDirection::Right, Vec2::new(margin, 0.0)),
        Axis::Horizontal => (ScrollDirection::Left, Vec2::new(-margin, 0.0)),
    };
    Some(ScrollProjection {
        current: pointer,
        predicted: pointer + offset,
        direction,
    })
}

/// Idle elements whose expanded rectangle the projected path crosses.
pub(crate) fn hits<K: Copy + Eq + Hash>(
    registry: &Registry<K>,
    projection: &ScrollProjection,
) -> Candidates<K> {
    registry
        .iter()
        .filter(|e| e.is_idle())
        .filter(|e| {
            segment_intersects_rect(
                projection.current,
                projection.predicted,
                e.bounds.expanded_rect,
            )
        })
        .map(|e| Candidate {
            handle: e.handle,
            hit: CallbackHitType::Scroll(projection.direction),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::test_support::registry_with;
    use kurbo::Rect;

    #[test]
    fn direction_follows_dominant_axis_sign() {
        let p = Point::new(100.0, 100.0);
        let down = project(p, Vec2::new(3.0, 40.0), 150.0).unwrap();
        assert_eq!(down.direction, ScrollDirection::Down);
        assert_eq!(down.predicted, Point::new(100.0, 250.0));

        let up = project(p, Vec2::new(0.0, -1.0), 150.0).unwrap();
        assert_eq!(up.direction, ScrollDirection::Up);
        assert_eq!(up.predicted, Point::new(100.0, -50.0));

        let left = project(p, Vec2::new(-20.0, 5.0), 50.0).unwrap();
        assert_eq!(left.direction, ScrollDirection::Left);
        assert_eq!(left.predicted, Point::new(50.0, 100.0));

        let right = project(p, Vec2::new(20.0, 0.0), 50.0).unwrap();
        assert_eq!(right.direction, ScrollDirection::Right);
    }

    #[test]
    fn zero_delta_predicts_nothing() {
        assert!(project(Point::ZERO, Vec2::ZERO, 150.0).is_none());
    }

    #[test]
    fn element_below_pointer_is_hit_when_scrolling_down() {
        let r = registry_with(&[
            (1, Rect::new(0.0, 200.0, 200.0, 260.0)),
            (2, Rect::new(0.0, -200.0, 200.0, -100.0)),
        ]);
        let projection = project(Point::new(100.0, 100.0), Vec2::new(0.0, 10.0), 150.0).unwrap();
        let got = hits(&r, &projection);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].handle, 1);
        assert_eq!(got[0].hit, CallbackHitType::Scroll(ScrollDirection::Down));
    }
}
