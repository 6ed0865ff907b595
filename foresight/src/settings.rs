// Copyright 2025 the Foresight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engine settings: defaults, clamping ranges, and diff-applied partial updates.
//!
//! Settings are changed through a [`SettingsPatch`]. Every numeric field is
//! clamped into its documented range (see [`ranges`]) before it is compared
//! against the current value, and only keys whose value actually changes are
//! applied and reported back as [`UpdatedSetting`]s.
//!
//! ```rust
//! use foresight::settings::{ForesightSettings, SettingKey, SettingsPatch};
//!
//! let mut settings = ForesightSettings::default();
//! let patch = SettingsPatch::new()
//!     .tab_offset(4)
//!     .scroll_margin(9999.0)
//!     .enable_tab_prediction(true); // unchanged, not reported
//!
//! let updated = settings.apply(&patch);
//! assert_eq!(updated.len(), 2);
//! assert_eq!(updated[0].key, SettingKey::TabOffset);
//! assert_eq!(settings.scroll_margin, 300.0); // clamped
//! ```

use core::fmt;
use core::ops::RangeInclusive;

use foresight_geometry::HitSlop;

use crate::types::{ConnectionType, TouchDeviceStrategy};

/// Inclusive ranges every numeric setting is clamped into.
pub mod ranges {
    use core::ops::RangeInclusive;

    /// Number of retained pointer samples.
    pub const POSITION_HISTORY_SIZE: RangeInclusive<usize> = 2..=30;
    /// Trajectory look-ahead in milliseconds.
    pub const TRAJECTORY_PREDICTION_TIME_MS: RangeInclusive<u64> = 10..=200;
    /// Tab steps considered an approach.
    pub const TAB_OFFSET: RangeInclusive<usize> = 0..=20;
    /// Scroll look-ahead in pixels.
    pub const SCROLL_MARGIN: RangeInclusive<f64> = 30.0..=300.0;
    /// Each edge of the default hit slop, in pixels.
    pub const HIT_SLOP: RangeInclusive<f64> = 0.0..=2000.0;
    /// Resize/scroll recomputation throttle in milliseconds.
    pub const RESIZE_SCROLL_THROTTLE_DELAY_MS: RangeInclusive<u64> = 0..=1000;
}

/// Errors from parsing enum-valued settings out of strings.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseSettingError {
    /// Not `viewport` or `touchstart`.
    #[error("unknown touch device strategy `{0}` (expected `viewport` or `touchstart`)")]
    UnknownTouchStrategy(String),
    /// Not one of `slow-2g`, `2g`, `3g`, `4g`.
    #[error("unknown connection type `{0}` (expected `slow-2g`, `2g`, `3g` or `4g`)")]
    UnknownConnectionType(String),
}

/// Engine-wide tunables.
///
/// Obtain a snapshot with [`Foresight::settings`](crate::Foresight::settings);
/// change it with [`Foresight::alter_settings`](crate::Foresight::alter_settings).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ForesightSettings {
    /// Pointer hover and trajectory prediction. Hover still fires when only
    /// trajectory prediction is turned off.
    pub enable_mouse_prediction: bool,
    /// Tab-order prediction.
    pub enable_tab_prediction: bool,
    /// Scroll trajectory prediction.
    pub enable_scroll_prediction: bool,
    /// Pointer samples retained for velocity estimation.
    pub position_history_size: usize,
    /// How far ahead the pointer trajectory is extrapolated, in milliseconds.
    pub trajectory_prediction_time_ms: u64,
    /// Tab steps within which a focus move counts as an approach.
    pub tab_offset: usize,
    /// Scroll look-ahead distance, in pixels.
    pub scroll_margin: f64,
    /// Hit slop for elements registered without one.
    pub default_hit_slop: HitSlop,
    /// Minimum spacing of resize/scroll bounds recomputation, in milliseconds.
    pub resize_scroll_throttle_delay_ms: u64,
    /// Activation rule on touch-class devices.
    pub touch_device_strategy: TouchDeviceStrategy,
    /// Registrations are refused on connections slower than this.
    pub minimum_connection_type: ConnectionType,
}

impl Default for ForesightSettings {
    fn default() -> Self {
        Self {
            enable_mouse_prediction: true,
            enable_tab_prediction: true,
            enable_scroll_prediction: true,
            position_history_size: 8,
            trajectory_prediction_time_ms: 120,
            tab_offset: 2,
            scroll_margin: 150.0,
            default_hit_slop: HitSlop::ZERO,
            resize_scroll_throttle_delay_ms: 0,
            touch_device_strategy: TouchDeviceStrategy::Viewport,
            minimum_connection_type: ConnectionType::ThreeG,
        }
    }
}

/// Names of every setting.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SettingKey {
    /// [`ForesightSettings::enable_mouse_prediction`].
    EnableMousePrediction,
    /// [`ForesightSettings::enable_tab_prediction`].
    EnableTabPrediction,
    /// [`ForesightSettings::enable_scroll_prediction`].
    EnableScrollPrediction,
    /// [`ForesightSettings::position_history_size`].
    PositionHistorySize,
    /// [`ForesightSettings::trajectory_prediction_time_ms`].
    TrajectoryPredictionTime,
    /// [`ForesightSettings::tab_offset`].
    TabOffset,
    /// [`ForesightSettings::scroll_margin`].
    ScrollMargin,
    /// [`ForesightSettings::default_hit_slop`].
    DefaultHitSlop,
    /// [`ForesightSettings::resize_scroll_throttle_delay_ms`].
    ResizeScrollThrottleDelay,
    /// [`ForesightSettings::touch_device_strategy`].
    TouchDeviceStrategy,
    /// [`ForesightSettings::minimum_connection_type`].
    MinimumConnectionType,
}

impl SettingKey {
    /// Stable, human-readable name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EnableMousePrediction => "enable_mouse_prediction",
            Self::EnableTabPrediction => "enable_tab_prediction",
            Self::EnableScrollPrediction => "enable_scroll_prediction",
            Self::PositionHistorySize => "position_history_size",
            Self::TrajectoryPredictionTime => "trajectory_prediction_time_ms",
            Self::TabOffset => "tab_offset",
            Self::ScrollMargin => "scroll_margin",
            Self::DefaultHitSlop => "default_hit_slop",
            Self::ResizeScrollThrottleDelay => "resize_scroll_throttle_delay_ms",
            Self::TouchDeviceStrategy => "touch_device_strategy",
            Self::MinimumConnectionType => "minimum_connection_type",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A setting value, tagged by shape.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SettingValue {
    /// Enable flags.
    Flag(bool),
    /// Counts (history size, tab offset).
    Count(usize),
    /// Durations in milliseconds.
    Millis(u64),
    /// Distances in pixels.
    Pixels(f64),
    /// Per-edge margins.
    HitSlop(HitSlop),
    /// Touch activation rule.
    TouchStrategy(TouchDeviceStrategy),
    /// Connection class.
    Connection(ConnectionType),
}

/// One applied change.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UpdatedSetting {
    /// Which setting changed.
    pub key: SettingKey,
    /// Value before the change.
    pub old_value: SettingValue,
    /// Value after clamping and applying.
    pub new_value: SettingValue,
}

/// A partial settings update. Unset fields are left alone.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct SettingsPatch {
    /// See [`ForesightSettings::enable_mouse_prediction`].
    pub enable_mouse_prediction: Option<bool>,
    /// See [`ForesightSettings::enable_tab_prediction`].
    pub enable_tab_prediction: Option<bool>,
    /// See [`ForesightSettings::enable_scroll_prediction`].
    pub enable_scroll_prediction: Option<bool>,
    /// See [`ForesightSettings::position_history_size`].
    pub position_history_size: Option<usize>,
    /// See [`ForesightSettings::trajectory_prediction_time_ms`].
    pub trajectory_prediction_time_ms: Option<u64>,
    /// See [`ForesightSettings::tab_offset`].
    pub tab_offset: Option<usize>,
    /// See [`ForesightSettings::scroll_margin`].
    pub scroll_margin: Option<f64>,
    /// See [`ForesightSettings::default_hit_slop`].
    pub default_hit_slop: Option<HitSlop>,
    /// See [`ForesightSettings::resize_scroll_throttle_delay_ms`].
    pub resize_scroll_throttle_delay_ms: Option<u64>,
    /// See [`ForesightSettings::touch_device_strategy`].
    pub touch_device_strategy: Option<TouchDeviceStrategy>,
    /// See [`ForesightSettings::minimum_connection_type`].
    pub minimum_connection_type: Option<ConnectionType>,
}

impl SettingsPatch {
    /// An empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set [`ForesightSettings::enable_mouse_prediction`].
    pub fn enable_mouse_prediction(mut self, value: bool) -> Self {
        self.enable_mouse_prediction = Some(value);
        self
    }

    /// Set [`ForesightSettings::enable_tab_prediction`].
    pub fn enable_tab_prediction(mut self, value: bool) -> Self {
        self.enable_tab_prediction = Some(value);
        self
    }

    /// Set [`ForesightSettings::enable_scroll_prediction`].
    pub fn enable_scroll_prediction(mut self, value: bool) -> Self {
        self.enable_scroll_prediction = Some(value);
        self
    }

    /// Set [`ForesightSettings::position_history_size`].
    pub fn position_history_size(mut self, value: usize) -> Self {
        self.position_history_size = Some(value);
        self
    }

    /// Set [`ForesightSettings::trajectory_prediction_time_ms`].
    pub fn trajectory_prediction_time_ms(mut self, value: u64) -> Self {
        self.trajectory_prediction_time_ms = Some(value);
        self
    }

    /// Set [`ForesightSettings::tab_offset`].
    pub fn tab_offset(mut self, value: usize) -> Self {
        self.tab_offset = Some(value);
        self
    }

    /// Set [`ForesightSettings::scroll_margin`].
    pub fn scroll_margin(mut self, value: f64) -> Self {
        self.scroll_margin = Some(value);
        self
    }

    /// Set [`ForesightSettings::default_hit_slop`]; accepts a scalar or a [`HitSlop`].
    pub fn default_hit_slop(mut self, value: impl Into<HitSlop>) -> Self {
        self.default_hit_slop = Some(value.into());
        self
    }

    /// Set [`ForesightSettings::resize_scroll_throttle_delay_ms`].
    pub fn resize_scroll_throttle_delay_ms(mut self, value: u64) -> Self {
        self.resize_scroll_throttle_delay_ms = Some(value);
        self
    }

    /// Set [`ForesightSettings::touch_device_strategy`].
    pub fn touch_device_strategy(mut self, value: TouchDeviceStrategy) -> Self {
        self.touch_device_strategy = Some(value);
        self
    }

    /// Set [`ForesightSettings::minimum_connection_type`].
    pub fn minimum_connection_type(mut self, value: ConnectionType) -> Self {
        self.minimum_connection_type = Some(value);
        self
    }

    /// Copy of this patch with every numeric field clamped into [`ranges`].
    pub fn clamped(&self) -> Self {
        Self {
            position_history_size: self
                .position_history_size
                .map(|v| clamp_ord(SettingKey::PositionHistorySize, v, &ranges::POSITION_HISTORY_SIZE)),
            trajectory_prediction_time_ms: self.trajectory_prediction_time_ms.map(|v| {
                clamp_ord(
                    SettingKey::TrajectoryPredictionTime,
                    v,
                    &ranges::TRAJECTORY_PREDICTION_TIME_MS,
                )
            }),
            tab_offset: self
                .tab_offset
                .map(|v| clamp_ord(SettingKey::TabOffset, v, &ranges::TAB_OFFSET)),
            scroll_margin: self
                .scroll_margin
                .map(|v| clamp_f64(SettingKey::ScrollMargin, v, &ranges::SCROLL_MARGIN)),
            default_hit_slop: self.default_hit_slop.map(|v| {
                let clamped = v.clamped(*ranges::HIT_SLOP.start(), *ranges::HIT_SLOP.end());
                if clamped != v {
                    tracing::warn!(key = %SettingKey::DefaultHitSlop, requested = ?v, applied = ?clamped, "setting clamped");
                }
                clamped
            }),
            resize_scroll_throttle_delay_ms: self.resize_scroll_throttle_delay_ms.map(|v| {
                clamp_ord(
                    SettingKey::ResizeScrollThrottleDelay,
                    v,
                    &ranges::RESIZE_SCROLL_THROTTLE_DELAY_MS,
                )
            }),
            ..*self
        }
    }

    /// Returns `true` if no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl ForesightSettings {
    /// Clamp `patch`, apply the fields that differ from the current values,
    /// and report exactly those.
    pub fn apply(&mut self, patch: &SettingsPatch) -> Vec<UpdatedSetting> {
        let patch = patch.clamped();
        let mut out = Vec::new();
        apply_field(
            &mut self.enable_mouse_prediction,
            patch.enable_mouse_prediction,
            SettingKey::EnableMousePrediction,
            SettingValue::Flag,
            &mut out,
        );
        apply_field(
            &mut self.enable_tab_prediction,
            patch.enable_tab_prediction,
            SettingKey::EnableTabPrediction,
            SettingValue::Flag,
            &mut out,
        );
        apply_field(
            &mut self.enable_scroll_prediction,
            patch.enable_scroll_prediction,
            SettingKey::EnableScrollPrediction,
            SettingValue::Flag,
            &mut out,
        );
        apply_field(
            &mut self.position_history_size,
            patch.position_history_size,
            SettingKey::PositionHistorySize,
            SettingValue::Count,
            &mut out,
        );
        apply_field(
            &mut self.trajectory_prediction_time_ms,
            patch.trajectory_prediction_time_ms,
            SettingKey::TrajectoryPredictionTime,
            SettingValue::Millis,
            &mut out,
        );
        apply_field(
            &mut self.tab_offset,
            patch.tab_offset,
            SettingKey::TabOffset,
            SettingValue::Count,
            &mut out,
        );
        apply_field(
            &mut self.scroll_margin,
            patch.scroll_margin,
            SettingKey::ScrollMargin,
            SettingValue::Pixels,
            &mut out,
        );
        apply_field(
            &mut self.default_hit_slop,
            patch.default_hit_slop,
            SettingKey::DefaultHitSlop,
            SettingValue::HitSlop,
            &mut out,
        );
        apply_field(
            &mut self.resize_scroll_throttle_delay_ms,
            patch.resize_scroll_throttle_delay_ms,
            SettingKey::ResizeScrollThrottleDelay,
            SettingValue::Millis,
            &mut out,
        );
        apply_field(
            &mut self.touch_device_strategy,
            patch.touch_device_strategy,
            SettingKey::TouchDeviceStrategy,
            SettingValue::TouchStrategy,
            &mut out,
        );
        apply_field(
            &mut self.minimum_connection_type,
            patch.minimum_connection_type,
            SettingKey::MinimumConnectionType,
            SettingValue::Connection,
            &mut out,
        );
        out
    }

    /// Settings built from defaults plus `patch` (clamped).
    pub fn with_patch(patch: &SettingsPatch) -> Self {
        let mut settings = Self::default();
        settings.apply(patch);
        settings
    }
}

fn apply_field<T: Copy + PartialEq>(
    slot: &mut T,
    requested: Option<T>,
    key: SettingKey,
    wrap: fn(T) -> SettingValue,
    out: &mut Vec<UpdatedSetting>,
) {
    let Some(new) = requested else {
        return;
    };
    if *slot == new {
        return;
    }
    out.push(UpdatedSetting {
        key,
        old_value: wrap(*slot),
        new_value: wrap(new),
    });
    *slot = new;
}

fn clamp_ord<T: Ord + Copy + fmt::Debug>(key: SettingKey, value: T, range: &RangeInclusive<T>) -> T {
    let clamped = value.clamp(*range.start(), *range.end());
    if clamped != value {
        tracing::warn!(key = %key, requested = ?value, applied = ?clamped, "setting clamped");
    }
    clamped
}

fn clamp_f64(key: SettingKey, value: f64, range: &RangeInclusive<f64>) -> f64 {
    let clamped = if value.is_nan() {
        *range.start()
    } else {
        value.clamp(*range.start(), *range.end())
    };
    if clamped != value {
        tracing::warn!(key = %key, requested = value, applied = clamped, "setting clamped");
    }
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_sit_inside_ranges() {
        let s = ForesightSettings::default();
        assert!(ranges::POSITION_HISTORY_SIZE.contains(&s.position_history_size));
        assert!(ranges::TRAJECTORY_PREDICTION_TIME_MS.contains(&s.trajectory_prediction_time_ms));
        assert!(ranges::TAB_OFFSET.contains(&s.tab_offset));
        assert!(ranges::SCROLL_MARGIN.contains(&s.scroll_margin));
        assert!(ranges::RESIZE_SCROLL_THROTTLE_DELAY_MS.contains(&s.resize_scroll_throttle_delay_ms));
    }

    #[test]
    fn only_changed_keys_are_reported() {
        let mut s = ForesightSettings::default();
        let patch = SettingsPatch::new()
            .enable_mouse_prediction(true)
            .tab_offset(2)
            .position_history_size(12);
        let updated = s.apply(&patch);
        assert_eq!(
            updated,
            vec![UpdatedSetting {
                key: SettingKey::PositionHistorySize,
                old_value: SettingValue::Count(8),
                new_value: SettingValue::Count(12),
            }]
        );
        assert_eq!(s.position_history_size, 12);
    }

    #[test]
    fn out_of_range_values_are_clamped_not_rejected() {
        let mut s = ForesightSettings::default();
        let updated = s.apply(
            &SettingsPatch::new()
                .position_history_size(1)
                .trajectory_prediction_time_ms(10_000)
                .tab_offset(99)
                .scroll_margin(f64::NAN)
                .default_hit_slop(-5.0)
                .resize_scroll_throttle_delay_ms(5000),
        );
        assert_eq!(s.position_history_size, 2);
        assert_eq!(s.trajectory_prediction_time_ms, 200);
        assert_eq!(s.tab_offset, 20);
        assert_eq!(s.scroll_margin, 30.0);
        // Clamped to zero, which equals the default, so not reported.
        assert_eq!(s.default_hit_slop, HitSlop::ZERO);
        assert_eq!(s.resize_scroll_throttle_delay_ms, 1000);
        assert_eq!(updated.len(), 5);
    }

    #[test]
    fn empty_patch_changes_nothing() {
        let mut s = ForesightSettings::default();
        assert!(SettingsPatch::new().is_empty());
        assert!(s.apply(&SettingsPatch::new()).is_empty());
        assert_eq!(s, ForesightSettings::default());
    }

    #[test]
    fn enum_settings_round_through_patch() {
        let s = ForesightSettings::with_patch(
            &SettingsPatch::new()
                .touch_device_strategy(TouchDeviceStrategy::TouchStart)
                .minimum_connection_type(ConnectionType::FourG),
        );
        assert_eq!(s.touch_device_strategy, TouchDeviceStrategy::TouchStart);
        assert_eq!(s.minimum_connection_type, ConnectionType::FourG);
    }

    #[test]
    fn key_names_are_stable() {
        assert_eq!(SettingKey::TabOffset.to_string(), "tab_offset");
        assert_eq!(
            SettingKey::TrajectoryPredictionTime.as_str(),
            "trajectory_prediction_time_ms"
        );
    }
}
