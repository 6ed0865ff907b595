// Copyright 2025 the Foresight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared vocabulary: hit types, counters, device classes, and small enums.

use core::fmt;
use core::str::FromStr;

pub use foresight_focus::TabDirection;

use crate::settings::ParseSettingError;

/// Engine-assigned identifier of a registered element.
///
/// Ids are never reused within one engine. Re-registering a handle that is
/// still registered keeps its id; registering it again after it was removed
/// assigns a fresh one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(pub(crate) u64);

impl ElementId {
    /// Raw numeric value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "foresight-{}", self.0)
    }
}

/// How a mouse hit was detected.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MouseHit {
    /// The pointer is literally inside the expanded rectangle.
    Hover,
    /// The predicted pointer path crosses the expanded rectangle.
    Trajectory,
}

/// Direction of a scroll hit, relative to the content.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScrollDirection {
    /// Content scrolled toward its top.
    Up,
    /// Content scrolled toward its bottom.
    Down,
    /// Content scrolled toward its left edge.
    Left,
    /// Content scrolled toward its right edge.
    Right,
}

/// Which predictor fired a callback, and how.
///
/// This is a closed set: every consumer matches it exhaustively, so adding a
/// kind is a compile error everywhere it needs handling.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CallbackHitType {
    /// Pointer hover or trajectory.
    Mouse(MouseHit),
    /// Sequential focus traversal.
    Tab(TabDirection),
    /// Scroll trajectory.
    Scroll(ScrollDirection),
    /// Touch start inside the hit region.
    Touch,
    /// The element entered the viewport on a touch-class device.
    Viewport,
}

impl CallbackHitType {
    /// The predictor family that produces this hit.
    pub const fn predictor(self) -> PredictorKind {
        match self {
            Self::Mouse(_) => PredictorKind::Mouse,
            Self::Tab(_) => PredictorKind::Tab,
            Self::Scroll(_) => PredictorKind::Scroll,
            Self::Touch | Self::Viewport => PredictorKind::TouchViewport,
        }
    }
}

impl fmt::Display for CallbackHitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Mouse(MouseHit::Hover) => "mouse:hover",
            Self::Mouse(MouseHit::Trajectory) => "mouse:trajectory",
            Self::Tab(TabDirection::Forwards) => "tab:forwards",
            Self::Tab(TabDirection::Reverse) => "tab:reverse",
            Self::Scroll(ScrollDirection::Up) => "scroll:up",
            Self::Scroll(ScrollDirection::Down) => "scroll:down",
            Self::Scroll(ScrollDirection::Left) => "scroll:left",
            Self::Scroll(ScrollDirection::Right) => "scroll:right",
            Self::Touch => "touch",
            Self::Viewport => "viewport",
        };
        f.write_str(s)
    }
}

/// Predictor families, used for tie-breaking hits within one input batch.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PredictorKind {
    /// Pointer hover and trajectory.
    Mouse,
    /// Scroll trajectory.
    Scroll,
    /// Tab order.
    Tab,
    /// Touch start and viewport entry.
    TouchViewport,
}

/// Evaluation order of predictors within one input batch.
///
/// When several predictors would fire the same element in one batch, the
/// earliest family in this list wins and is the `hit_type` reported.
pub const HIT_PRIORITY: [PredictorKind; 4] = [
    PredictorKind::Mouse,
    PredictorKind::Scroll,
    PredictorKind::Tab,
    PredictorKind::TouchViewport,
];

/// Counters for [`MouseHit`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MouseHits {
    /// Hover hits.
    pub hover: u64,
    /// Trajectory hits.
    pub trajectory: u64,
}

/// Counters for [`TabDirection`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TabHits {
    /// Forward traversal hits.
    pub forwards: u64,
    /// Reverse traversal hits.
    pub reverse: u64,
}

/// Counters for [`ScrollDirection`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ScrollHits {
    /// Upward scroll hits.
    pub up: u64,
    /// Downward scroll hits.
    pub down: u64,
    /// Leftward scroll hits.
    pub left: u64,
    /// Rightward scroll hits.
    pub right: u64,
}

/// Monotonic counters mirroring the shape of [`CallbackHitType`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CallbackHits {
    /// Sum of every counter below.
    pub total: u64,
    /// Mouse hits.
    pub mouse: MouseHits,
    /// Tab hits.
    pub tab: TabHits,
    /// Scroll hits.
    pub scroll: ScrollHits,
    /// Touch start hits.
    pub touch: u64,
    /// Viewport hits.
    pub viewport: u64,
}

impl CallbackHits {
    /// Count one invocation.
    pub fn record(&mut self, hit: CallbackHitType) {
        self.total += 1;
        match hit {
            CallbackHitType::Mouse(MouseHit::Hover) => self.mouse.hover += 1,
            CallbackHitType::Mouse(MouseHit::Trajectory) => self.mouse.trajectory += 1,
            CallbackHitType::Tab(TabDirection::Forwards) => self.tab.forwards += 1,
            CallbackHitType::Tab(TabDirection::Reverse) => self.tab.reverse += 1,
            CallbackHitType::Scroll(ScrollDirection::Up) => self.scroll.up += 1,
            CallbackHitType::Scroll(ScrollDirection::Down) => self.scroll.down += 1,
            CallbackHitType::Scroll(ScrollDirection::Left) => self.scroll.left += 1,
            CallbackHitType::Scroll(ScrollDirection::Right) => self.scroll.right += 1,
            CallbackHitType::Touch => self.touch += 1,
            CallbackHitType::Viewport => self.viewport += 1,
        }
    }
}

/// Input device class currently driving predictions.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DeviceStrategy {
    /// Hovering pointer; trajectory and scroll prediction apply.
    #[default]
    Mouse,
    /// Stylus; handled like touch because hover reports are unreliable.
    Pen,
    /// Touch screen; the touch/viewport strategy applies.
    Touch,
}

impl DeviceStrategy {
    /// Whether this class uses the touch/viewport strategy instead of trajectories.
    pub const fn is_touch_class(self) -> bool {
        match self {
            Self::Mouse => false,
            Self::Pen | Self::Touch => true,
        }
    }
}

/// Activation rule for touch-class devices.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TouchDeviceStrategy {
    /// Fire when the element first intersects the viewport.
    #[default]
    Viewport,
    /// Fire on a touch start inside the element's hit region.
    TouchStart,
}

impl FromStr for TouchDeviceStrategy {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "viewport" => Ok(Self::Viewport),
            "touchstart" => Ok(Self::TouchStart),
            other => Err(ParseSettingError::UnknownTouchStrategy(other.to_owned())),
        }
    }
}

/// Effective network connection class, slowest first.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConnectionType {
    /// `slow-2g`.
    Slow2g,
    /// `2g`.
    TwoG,
    /// `3g`.
    ThreeG,
    /// `4g` or better.
    FourG,
}

impl FromStr for ConnectionType {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "slow-2g" => Ok(Self::Slow2g),
            "2g" => Ok(Self::TwoG),
            "3g" => Ok(Self::ThreeG),
            "4g" => Ok(Self::FourG),
            other => Err(ParseSettingError::UnknownConnectionType(other.to_owned())),
        }
    }
}

/// Network conditions reported by the platform.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectionInfo {
    /// Effective connection class, if known.
    pub effective_type: Option<ConnectionType>,
    /// The user asked to reduce data usage.
    pub save_data: bool,
}

impl ConnectionInfo {
    /// Whether prefetching should be skipped given `minimum`.
    pub fn is_limited(&self, minimum: ConnectionType) -> bool {
        self.save_data || self.effective_type.is_some_and(|t| t < minimum)
    }
}

/// Why an element left the registry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnregisterReason {
    /// The caller asked for it.
    ApiCall,
    /// The platform reported the element gone.
    Disconnected,
    /// The element was registered with `unregister_on_callback` and its callback settled.
    CallbackCompleted,
    /// External tooling removed it.
    DevTools,
}

/// How a callback settled.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CallbackStatus {
    /// Completed without error.
    Success,
    /// Reported an error.
    Error,
}

bitflags::bitflags! {
    /// Which parts of an element's data changed.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct UpdatedProps: u8 {
        /// Original or expanded rectangle.
        const BOUNDS     = 0b0000_0001;
        /// Viewport intersection.
        const VISIBILITY = 0b0000_0010;
    }
}
