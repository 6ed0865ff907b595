// Copyright 2025 the Foresight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The host boundary: what the engine asks of the platform, and what the
//! platform feeds into the engine.

use kurbo::{Point, Rect, Vec2};

use crate::types::{ConnectionInfo, DeviceStrategy};

/// Capabilities the engine needs from its host.
///
/// Only [`element_rect`](Self::element_rect) is required. The listener and
/// observation hooks let a host attach platform subscriptions lazily: global
/// listeners exist only while at least one element is registered.
pub trait Platform<K> {
    /// Current rectangle of `handle` in viewport coordinates.
    fn element_rect(&self, handle: K) -> Option<Rect>;

    /// Focusable elements in sequential focus order.
    fn focus_order(&self) -> Vec<K> {
        Vec::new()
    }

    /// Current network conditions, if the platform can tell.
    fn connection(&self) -> Option<ConnectionInfo> {
        None
    }

    /// Start delivering global input (pointer, scroll, resize, touch, focus).
    fn connect_listeners(&mut self) {}

    /// Stop delivering global input.
    fn disconnect_listeners(&mut self) {}

    /// Start reporting geometry and viewport changes for `handle`.
    fn observe_element(&mut self, handle: K) {
        let _ = handle;
    }

    /// Stop reporting geometry and viewport changes for `handle`.
    fn unobserve_element(&mut self, handle: K) {
        let _ = handle;
    }
}

/// One input sample pushed into the engine.
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent<K> {
    /// The pointer moved.
    PointerMove {
        /// Position in viewport coordinates.
        point: Point,
        /// Device that produced the move.
        device: DeviceStrategy,
    },
    /// Content scrolled by `delta` (positive `y` is downward).
    Scroll {
        /// Change of scroll offset.
        delta: Vec2,
    },
    /// The viewport was resized.
    Resize,
    /// A touch began.
    TouchStart {
        /// Touch position in viewport coordinates.
        point: Point,
    },
    /// Focus moved to `target`.
    FocusChange {
        /// Newly focused element.
        target: K,
        /// Shift was held (reverse traversal).
        shift_key: bool,
        /// The move came from keyboard traversal.
        keyboard: bool,
    },
    /// `handle`'s rectangle may have changed.
    BoundsChanged {
        /// Observed element.
        handle: K,
    },
    /// `handle` entered or left the viewport.
    Intersection {
        /// Observed element.
        handle: K,
        /// Whether it now intersects the viewport.
        is_intersecting: bool,
    },
    /// `handle` no longer exists on the platform.
    Disconnected {
        /// Removed element.
        handle: K,
    },
}
