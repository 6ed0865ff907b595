// Copyright 2025 the Foresight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Segment clipping against axis-aligned rectangles (Liang–Barsky).

use kurbo::{Point, Rect};

/// Returns `true` if the segment `p1 → p2` touches `rect` (boundary inclusive).
///
/// The segment is parameterized as `p1 + t * (p2 - p1)` for `t ∈ [0, 1]`. Each
/// of the four half-planes (left, right, top, bottom) either rejects the
/// segment outright (parallel and outside) or tightens the entry bound `t0` or
/// the exit bound `t1`. The segment intersects iff `[t0, t1]` is non-empty once
/// all four edges have been applied.
///
/// A zero-length segment degenerates to an inclusive point test.
///
/// ```rust
/// use kurbo::{Point, Rect};
/// use foresight_geometry::segment_intersects_rect;
///
/// let r = Rect::new(0.0, 0.0, 100.0, 100.0);
/// assert!(segment_intersects_rect(Point::new(150.0, 50.0), Point::new(90.0, 50.0), r));
/// assert!(!segment_intersects_rect(Point::new(150.0, 50.0), Point::new(120.0, 50.0), r));
/// ```
pub fn segment_intersects_rect(p1: Point, p2: Point, rect: Rect) -> bool {
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;

    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;

    // (p, q) per edge: left, right, top, bottom.
    let edges = [
        (-dx, p1.x - rect.x0),
        (dx, rect.x1 - p1.x),
        (-dy, p1.y - rect.y0),
        (dy, rect.y1 - p1.y),
    ];

    for (p, q) in edges {
        if p == 0.0 {
            if q < 0.0 {
                // Parallel to this edge and on the outside.
                return false;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            // Entering.
            if r > t1 {
                return false;
            }
            if r > t0 {
                t0 = r;
            }
        } else {
            // Leaving.
            if r < t0 {
                return false;
            }
            if r < t1 {
                t1 = r;
            }
        }
    }

    t0 <= t1
}
