// Copyright 2025 the Foresight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The event taxonomy published on the [`EventBus`](crate::bus::EventBus).

use kurbo::Point;

use crate::registry::ElementSnapshot;
use crate::settings::{ForesightSettings, UpdatedSetting};
use crate::types::{
    CallbackHitType, CallbackStatus, DeviceStrategy, ElementId, ScrollDirection,
    UnregisterReason, UpdatedProps,
};

/// Event names, used as subscription keys.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// [`EventData::ElementRegistered`].
    ElementRegistered,
    /// [`EventData::ElementUnregistered`].
    ElementUnregistered,
    /// [`EventData::ElementDataUpdated`].
    ElementDataUpdated,
    /// [`EventData::CallbackInvoked`].
    CallbackInvoked,
    /// [`EventData::CallbackCompleted`].
    CallbackCompleted,
    /// [`EventData::ElementReactivated`].
    ElementReactivated,
    /// [`EventData::MouseTrajectoryUpdate`].
    MouseTrajectoryUpdate,
    /// [`EventData::ScrollTrajectoryUpdate`].
    ScrollTrajectoryUpdate,
    /// [`EventData::ManagerSettingsChanged`].
    ManagerSettingsChanged,
    /// [`EventData::DeviceStrategyChanged`].
    DeviceStrategyChanged,
}

/// A published event with its engine timestamp.
#[derive(Clone, Debug, PartialEq)]
pub struct ForesightEvent<K> {
    /// Engine clock when the event was published, in milliseconds.
    pub timestamp_ms: u64,
    /// Payload.
    pub data: EventData<K>,
}

impl<K> ForesightEvent<K> {
    /// Subscription key of this event.
    pub fn kind(&self) -> EventKind {
        self.data.kind()
    }
}

/// Event payloads.
#[derive(Clone, Debug, PartialEq)]
pub enum EventData<K> {
    /// An element was registered, or re-registered.
    ElementRegistered {
        /// The element after registration.
        element: ElementSnapshot<K>,
    },
    /// An element left the registry.
    ElementUnregistered {
        /// The element as it was when removed.
        element: ElementSnapshot<K>,
        /// Why it was removed.
        reason: UnregisterReason,
        /// The registry is now empty.
        was_last_element: bool,
    },
    /// An element's bounds or visibility changed.
    ElementDataUpdated {
        /// The element after the change.
        element: ElementSnapshot<K>,
        /// What changed.
        updated_props: UpdatedProps,
    },
    /// A callback was invoked.
    CallbackInvoked {
        /// The element whose callback fired.
        element: ElementSnapshot<K>,
        /// The winning hit.
        hit_type: CallbackHitType,
    },
    /// A callback settled.
    CallbackCompleted {
        /// The element whose callback settled.
        element: ElementSnapshot<K>,
        /// The hit that started it.
        hit_type: CallbackHitType,
        /// Outcome.
        status: CallbackStatus,
        /// Time from invocation to observed settlement.
        elapsed_ms: u64,
        /// Failure message, if any.
        error_message: Option<String>,
    },
    /// A completed element became eligible to fire again.
    ElementReactivated {
        /// The element after reactivation.
        element: ElementSnapshot<K>,
    },
    /// A pointer sample was processed.
    MouseTrajectoryUpdate {
        /// Pointer position.
        current: Point,
        /// Extrapolated position.
        predicted: Point,
        /// Whether trajectory prediction was applied.
        prediction_enabled: bool,
    },
    /// A scroll sample was processed.
    ScrollTrajectoryUpdate {
        /// Pointer position.
        current: Point,
        /// Projected position.
        predicted: Point,
        /// Dominant scroll direction.
        direction: ScrollDirection,
    },
    /// Settings changed.
    ManagerSettingsChanged {
        /// Settings after the change.
        settings: ForesightSettings,
        /// Exactly the keys that changed.
        updated_settings: Vec<UpdatedSetting>,
    },
    /// The input device class changed.
    DeviceStrategyChanged {
        /// Previous class.
        old_strategy: DeviceStrategy,
        /// New class.
        new_strategy: DeviceStrategy,
    },
}

impl<K> EventData<K> {
    /// Subscription key of this payload.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::ElementRegistered { .. } => EventKind::ElementRegistered,
            Self::ElementUnregistered { .. } => EventKind::ElementUnregistered,
            Self::ElementDataUpdated { .. } => EventKind::ElementDataUpdated,
            Self::CallbackInvoked { .. } => EventKind::CallbackInvoked,
            Self::CallbackCompleted { .. } => EventKind::CallbackCompleted,
            Self::ElementReactivated { .. } => EventKind::ElementReactivated,
            Self::MouseTrajectoryUpdate { .. } => EventKind::MouseTrajectoryUpdate,
            Self::ScrollTrajectoryUpdate { .. } => EventKind::ScrollTrajectoryUpdate,
            Self::ManagerSettingsChanged { .. } => EventKind::ManagerSettingsChanged,
            Self::DeviceStrategyChanged { .. } => EventKind::DeviceStrategyChanged,
        }
    }

    /// Id of the element the event is about, if any.
    pub fn element_id(&self) -> Option<ElementId> {
        match self {
            Self::ElementRegistered { element }
            | Self::ElementUnregistered { element, .. }
            | Self::ElementDataUpdated { element, .. }
            | Self::CallbackInvoked { element, .. }
            | Self::CallbackCompleted { element, .. }
            | Self::ElementReactivated { element } => Some(element.id),
            Self::MouseTrajectoryUpdate { .. }
            | Self::ScrollTrajectoryUpdate { .. }
            | Self::ManagerSettingsChanged { .. }
            | Self::DeviceStrategyChanged { .. } => None,
        }
    }
}
