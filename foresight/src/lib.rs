// Copyright 2025 the Foresight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Foresight: predict which element a user is about to interact with, and
//! start work before they do.
//!
//! Elements are registered with a rectangle (queried from the host through a
//! [`Platform`]) and a callback. As input arrives, independent predictors
//! decide whether an element is being approached:
//!
//! - **Mouse**: a pointer inside the slop-expanded rectangle is a hover; a
//!   linearly extrapolated pointer path crossing it is a trajectory hit.
//! - **Scroll**: the pointer is projected along the dominant scroll axis.
//! - **Tab**: the element is a few steps ahead in sequential focus order.
//! - **Touch**: on touch-class devices, either viewport entry or a touch start
//!   inside the element, depending on [`TouchDeviceStrategy`].
//!
//! Each element fires at most once per activation window. Hits from several
//! predictors in one input batch are coalesced by [`HIT_PRIORITY`]. Callbacks
//! are fire-and-forget and report back through a [`Completion`]; elements may
//! reactivate after a cooldown or unregister themselves.
//!
//! Everything observable is published on an [`EventBus`](bus::EventBus) of
//! typed [`ForesightEvent`]s.
//!
//! ## Example
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use foresight::{
//!     CallbackHitType, DeviceStrategy, EventData, EventKind, Foresight, InputEvent, MouseHit,
//!     Platform, RegisterOptions,
//! };
//! use kurbo::{Point, Rect};
//!
//! struct Page;
//! impl Platform<&'static str> for Page {
//!     fn element_rect(&self, handle: &'static str) -> Option<Rect> {
//!         (handle == "buy").then(|| Rect::new(0.0, 0.0, 100.0, 100.0))
//!     }
//! }
//!
//! let mut engine: Foresight<&'static str, Page> = Foresight::new(Page);
//! let fired = Rc::new(RefCell::new(Vec::new()));
//! let log = Rc::clone(&fired);
//! engine.add_listener(EventKind::CallbackInvoked, move |event| {
//!     if let EventData::CallbackInvoked { hit_type, .. } = &event.data {
//!         log.borrow_mut().push(*hit_type);
//!     }
//! });
//! engine.register("buy", |activation| activation.succeed(), RegisterOptions::new());
//!
//! // The pointer heads left toward the button.
//! let mouse = |x| InputEvent::PointerMove { point: Point::new(x, 50.0), device: DeviceStrategy::Mouse };
//! engine.handle_input(mouse(300.0), 0);
//! engine.handle_input(mouse(250.0), 16);
//!
//! assert_eq!(*fired.borrow(), vec![CallbackHitType::Mouse(MouseHit::Trajectory)]);
//! ```
//!
//! ## Logging
//!
//! The engine logs through [`tracing`]: lifecycle at `debug`, per-sample
//! prediction at `trace`, degraded inputs and clamped settings at `warn`.

pub mod bus;
pub mod callback;
pub mod events;
pub mod history;
pub mod platform;
pub mod registry;
pub mod settings;
pub mod types;

mod manager;
mod predict;
mod throttle;

pub use bus::{AbortController, AbortSignal, ListenerId};
pub use callback::{Activation, CallbackError, CallbackInfo, Completion};
pub use events::{EventData, EventKind, ForesightEvent};
pub use foresight_geometry::HitSlop;
pub use manager::{
    Foresight, ManagerData, Registration, TRAJECTORY_HIT_EXPIRY_MS, TRAJECTORY_SWEEP_INTERVAL_MS,
};
pub use platform::{InputEvent, Platform};
pub use registry::{ElementBounds, ElementSnapshot, RegisterOptions, RegisteredElement};
pub use settings::{ForesightSettings, SettingKey, SettingValue, SettingsPatch, UpdatedSetting};
pub use types::{
    CallbackHitType, CallbackHits, CallbackStatus, ConnectionInfo, ConnectionType,
    DeviceStrategy, ElementId, HIT_PRIORITY, MouseHit, PredictorKind, ScrollDirection,
    TabDirection, TouchDeviceStrategy, UnregisterReason, UpdatedProps,
};
