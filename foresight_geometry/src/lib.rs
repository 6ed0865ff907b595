// Copyright 2025 the Foresight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Foresight Geometry: the pure geometry kernel behind intent prediction.
//!
//! This crate provides the small set of stateless primitives the Foresight
//! engine builds on, expressed in terms of [`kurbo`] types:
//!
//! - [`HitSlop`] – a per-edge margin that grows an element's predictive
//!   region beyond its visual bounds. The scalar shorthand is normalized on
//!   conversion, so downstream code only ever sees four edges.
//! - [`expand`] – outset a [`Rect`] by a [`HitSlop`].
//! - [`point_in_rect`] – an *inclusive* point test. Unlike
//!   [`Rect::contains`], points on the right and bottom edges count as inside.
//! - [`segment_intersects_rect`] – Liang–Barsky clipping of a segment against
//!   an axis-aligned rectangle. This is what lets a predicted pointer path be
//!   tested against a target without per-frame polygon math.
//! - [`dominant_axis`] – picks the axis a scroll delta mostly moves along.
//!
//! ## Example
//!
//! ```rust
//! use kurbo::{Point, Rect};
//! use foresight_geometry::{HitSlop, expand, point_in_rect, segment_intersects_rect};
//!
//! let button = Rect::new(0.0, 0.0, 100.0, 40.0);
//! let region = expand(button, HitSlop::from(10.0));
//! assert_eq!(region, Rect::new(-10.0, -10.0, 110.0, 50.0));
//!
//! // Boundaries are inclusive.
//! assert!(point_in_rect(Point::new(110.0, 50.0), region));
//!
//! // A pointer heading left toward the button.
//! assert!(segment_intersects_rect(
//!     Point::new(200.0, 20.0),
//!     Point::new(105.0, 20.0),
//!     region,
//! ));
//! ```
//!
//! ## Features
//!
//! - `std` (default): enables `std` support for `kurbo`.
//! - `libm`: `no_std` builds that rely on `libm` for floating-point math.
//!
//! This crate is `no_std`.

#![no_std]

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Insets, Point, Rect, Vec2};

mod clip;

pub use clip::segment_intersects_rect;

/// Per-edge margin around an element, in the element's coordinate space.
///
/// Positive values grow the region outward; negative values shrink it.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct HitSlop {
    /// Margin above the top edge.
    pub top: f64,
    /// Margin left of the left edge.
    pub left: f64,
    /// Margin right of the right edge.
    pub right: f64,
    /// Margin below the bottom edge.
    pub bottom: f64,
}

impl HitSlop {
    /// No margin on any edge.
    pub const ZERO: Self = Self::uniform(0.0);

    /// Create a slop from explicit edges.
    pub const fn new(top: f64, left: f64, right: f64, bottom: f64) -> Self {
        Self {
            top,
            left,
            right,
            bottom,
        }
    }

    /// Same margin on all four edges.
    pub const fn uniform(value: f64) -> Self {
        Self::new(value, value, value, value)
    }

    /// Returns `true` if every edge is `>= 0`.
    pub fn is_non_negative(&self) -> bool {
        self.top >= 0.0 && self.left >= 0.0 && self.right >= 0.0 && self.bottom >= 0.0
    }

    /// Returns `true` if every edge is finite.
    pub fn is_finite(&self) -> bool {
        self.top.is_finite()
            && self.left.is_finite()
            && self.right.is_finite()
            && self.bottom.is_finite()
    }

    /// Clamp each edge into `[min, max]`.
    ///
    /// `NaN` edges collapse to `min`; infinities clamp to the nearer bound.
    pub fn clamped(self, min: f64, max: f64) -> Self {
        let clamp = |v: f64| if v.is_nan() { min } else { v.clamp(min, max) };
        Self {
            top: clamp(self.top),
            left: clamp(self.left),
            right: clamp(self.right),
            bottom: clamp(self.bottom),
        }
    }

    /// Convert to [`kurbo::Insets`] (`x0` left, `y0` top, `x1` right, `y1` bottom).
    pub fn to_insets(self) -> Insets {
        Insets::new(self.left, self.top, self.right, self.bottom)
    }
}

impl From<f64> for HitSlop {
    fn from(value: f64) -> Self {
        Self::uniform(value)
    }
}

impl From<Insets> for HitSlop {
    fn from(insets: Insets) -> Self {
        Self::new(insets.y0, insets.x0, insets.x1, insets.y1)
    }
}

/// Outset `rect` by `slop`: top/left move outward by subtraction, bottom/right
/// by addition.
///
/// Negative slop shrinks the rectangle and may leave it degenerate.
pub fn expand(rect: Rect, slop: HitSlop) -> Rect {
    Rect::new(
        rect.x0 - slop.left,
        rect.y0 - slop.top,
        rect.x1 + slop.right,
        rect.y1 + slop.bottom,
    )
}

/// Inclusive point-in-rectangle test.
///
/// Every edge counts as inside, which differs from [`Rect::contains`] where the
/// right and bottom edges are exclusive.
pub fn point_in_rect(pt: Point, rect: Rect) -> bool {
    pt.x >= rect.x0 && pt.x <= rect.x1 && pt.y >= rect.y0 && pt.y <= rect.y1
}

/// Axis of a 2D motion.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Motion along x.
    Horizontal,
    /// Motion along y.
    Vertical,
}

/// The axis with the larger absolute component of `delta`.
///
/// Ties favor [`Axis::Vertical`], the common scroll axis. Returns `None` for a
/// zero (or non-finite) delta.
pub fn dominant_axis(delta: Vec2) -> Option<Axis> {
    if !delta.is_finite() {
        return None;
    }
    let ax = delta.x.abs();
    let ay = delta.y.abs();
    if ax == 0.0 && ay == 0.0 {
        None
    } else if ax > ay {
        Some(Axis::Horizontal)
    } else {
        Some(Axis::Vertical)
    }
}
