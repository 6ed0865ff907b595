// Copyright 2025 the Foresight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The engine facade.

use std::any::Any;
use std::fmt;
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};

use foresight_focus::TabDirection;
use kurbo::{Point, Rect, Vec2};
use smallvec::SmallVec;

use crate::bus::{AbortSignal, EventBus, ListenerId};
use crate::callback::{Activation, CallbackError, Completion, PANIC_MESSAGE, Settlement};
use crate::events::{EventData, EventKind, ForesightEvent};
use crate::history::PositionHistory;
use crate::platform::{InputEvent, Platform};
use crate::predict::{Candidate, HitBatch, mouse, scroll, tab, touch};
use crate::registry::{
    ElementBounds, ElementSnapshot, RegisterOptions, RegisteredElement, Registry,
};
use crate::settings::{ForesightSettings, SettingKey, SettingsPatch, UpdatedSetting};
use crate::throttle::{Interval, Throttle};
use crate::types::{
    CallbackHitType, CallbackHits, CallbackStatus, DeviceStrategy, ElementId, MouseHit,
    TouchDeviceStrategy, UnregisterReason, UpdatedProps,
};

/// Age at which a recorded trajectory hit is cleared by the sweep.
pub const TRAJECTORY_HIT_EXPIRY_MS: u64 = 200;

/// Period of the trajectory-hit sweep.
pub const TRAJECTORY_SWEEP_INTERVAL_MS: u64 = 250;

/// Result of [`Foresight::register`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Registration<K> {
    /// The handle passed to `register`.
    pub handle: K,
    /// Engine id, if the element was registered.
    pub id: Option<ElementId>,
    /// Whether the element is now tracked.
    pub is_registered: bool,
    /// The engine was in a touch-class device strategy at registration.
    pub is_touch_device: bool,
    /// Registration was refused because of a slow or data-saving connection.
    pub is_limited_connection: bool,
}

impl<K: Copy + Eq + Hash + fmt::Debug> Registration<K> {
    /// Unregister the element this registration refers to.
    ///
    /// Safe to call any number of times: once the element is gone (or the
    /// handle has been registered anew under a different id) this does nothing.
    pub fn unregister<P: Platform<K>>(&self, engine: &mut Foresight<K, P>) -> bool {
        match self.id {
            Some(id) if engine.element(&self.handle).is_some_and(|e| e.id == id) => {
                engine.unregister(self.handle)
            }
            _ => false,
        }
    }
}

/// Diagnostic snapshot of the whole engine.
#[derive(Clone, Debug, PartialEq)]
pub struct ManagerData<K> {
    /// Every registered element, in registration order.
    pub registered_elements: Vec<ElementSnapshot<K>>,
    /// Current settings.
    pub settings: ForesightSettings,
    /// Aggregate callback counters.
    pub callback_hits: CallbackHits,
    /// Current device class.
    pub device_strategy: DeviceStrategy,
    /// Whether global platform listeners are connected.
    pub is_listening: bool,
    /// Latest pointer position seen.
    pub last_pointer: Option<Point>,
    /// Engine clock.
    pub now_ms: u64,
}

/// The prediction engine.
///
/// Owns the registry, settings, predictors and event bus, and talks to the
/// host through a [`Platform`]. Time comes from the host: every input carries
/// a timestamp, and [`advance`](Self::advance) runs deferred work (throttled
/// bounds refresh, trajectory-hit sweep, reactivations, callback settlements).
///
/// ```rust
/// use foresight::{Foresight, InputEvent, DeviceStrategy, Platform, RegisterOptions};
/// use kurbo::{Point, Rect};
///
/// struct Page;
/// impl Platform<u32> for Page {
///     fn element_rect(&self, _handle: u32) -> Option<Rect> {
///         Some(Rect::new(0.0, 0.0, 100.0, 100.0))
///     }
/// }
///
/// let mut engine: Foresight<u32, Page> = Foresight::new(Page);
/// engine.register(1, |activation| activation.succeed(), RegisterOptions::new());
///
/// engine.handle_input(
///     InputEvent::PointerMove { point: Point::new(50.0, 50.0), device: DeviceStrategy::Mouse },
///     16,
/// );
/// assert_eq!(engine.callback_hits().mouse.hover, 1);
/// ```
pub struct Foresight<K, P> {
    platform: P,
    settings: ForesightSettings,
    registry: Registry<K>,
    bus: EventBus<K>,
    history: PositionHistory,
    last_pointer: Option<Point>,
    device: DeviceStrategy,
    hits: CallbackHits,
    bounds_throttle: Throttle,
    sweep: Interval,
    settle_tx: Sender<Settlement>,
    settle_rx: Receiver<Settlement>,
    now_ms: u64,
    listening: bool,
}

impl<K: fmt::Debug, P> fmt::Debug for Foresight<K, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Foresight")
            .field("settings", &self.settings)
            .field("registry", &self.registry)
            .field("bus", &self.bus)
            .field("device", &self.device)
            .field("hits", &self.hits)
            .field("now_ms", &self.now_ms)
            .field("listening", &self.listening)
            .finish_non_exhaustive()
    }
}

/// Inputs of one batch, split by the predictor that consumes them.
struct BatchInputs<K> {
    pointer: SmallVec<[Point; 4]>,
    scroll: SmallVec<[Vec2; 2]>,
    touch: SmallVec<[Point; 2]>,
    focus: SmallVec<[(K, TabDirection); 2]>,
}

impl<K> BatchInputs<K> {
    fn new() -> Self {
        Self {
            pointer: SmallVec::new(),
            scroll: SmallVec::new(),
            touch: SmallVec::new(),
            focus: SmallVec::new(),
        }
    }
}

impl<K, P> Foresight<K, P>
where
    K: Copy + Eq + Hash + fmt::Debug,
    P: Platform<K>,
{
    /// An engine with default settings.
    pub fn new(platform: P) -> Self {
        Self::with_settings(platform, &SettingsPatch::new())
    }

    /// An engine with defaults overridden by `patch` (clamped).
    pub fn with_settings(platform: P, patch: &SettingsPatch) -> Self {
        let settings = ForesightSettings::with_patch(patch);
        let (settle_tx, settle_rx) = mpsc::channel();
        Self {
            platform,
            history: PositionHistory::new(settings.position_history_size),
            bounds_throttle: Throttle::new(settings.resize_scroll_throttle_delay_ms),
            settings,
            registry: Registry::new(),
            bus: EventBus::new(),
            last_pointer: None,
            device: DeviceStrategy::default(),
            hits: CallbackHits::default(),
            sweep: Interval::new(TRAJECTORY_SWEEP_INTERVAL_MS),
            settle_tx,
            settle_rx,
            now_ms: 0,
            listening: false,
        }
    }

    /// The host platform.
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// The host platform, mutably.
    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    /// Latest time the engine has been driven to.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Read-only copy of the settings.
    pub fn settings(&self) -> ForesightSettings {
        self.settings
    }

    /// Current device class.
    pub fn device_strategy(&self) -> DeviceStrategy {
        self.device
    }

    /// Aggregate callback counters.
    pub fn callback_hits(&self) -> CallbackHits {
        self.hits
    }

    /// Zero the aggregate callback counters.
    pub fn reset_callback_hits(&mut self) {
        self.hits = CallbackHits::default();
    }

    /// Registered elements in registration order.
    pub fn registered_elements(&self) -> impl Iterator<Item = &RegisteredElement<K>> + '_ {
        self.registry.iter()
    }

    /// The element registered under `handle`.
    pub fn element(&self, handle: &K) -> Option<&RegisteredElement<K>> {
        self.registry.get(handle)
    }

    /// Number of registered elements.
    pub fn element_count(&self) -> usize {
        self.registry.len()
    }

    /// Whether global platform listeners are connected.
    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Diagnostic snapshot.
    pub fn snapshot(&self) -> ManagerData<K> {
        ManagerData {
            registered_elements: self.registry.iter().map(RegisteredElement::snapshot).collect(),
            settings: self.settings,
            callback_hits: self.hits,
            device_strategy: self.device,
            is_listening: self.listening,
            last_pointer: self.last_pointer,
            now_ms: self.now_ms,
        }
    }

    /// Subscribe `handler` to `kind`.
    pub fn add_listener(
        &mut self,
        kind: EventKind,
        handler: impl FnMut(&ForesightEvent<K>) + 'static,
    ) -> ListenerId {
        self.bus.add_listener(kind, handler, None)
    }

    /// Subscribe `handler` to `kind` until `signal` aborts.
    pub fn add_listener_with_signal(
        &mut self,
        kind: EventKind,
        handler: impl FnMut(&ForesightEvent<K>) + 'static,
        signal: &AbortSignal,
    ) -> ListenerId {
        self.bus.add_listener(kind, handler, Some(signal))
    }

    /// Unsubscribe. Returns `false` if `id` was not subscribed.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.bus.remove_listener(id)
    }

    /// Track `handle` and call `callback` when an interaction with it is predicted.
    ///
    /// Registering a handle that is already tracked updates it in place and
    /// bumps its `register_count`. On a limited connection nothing is
    /// registered and [`Registration::is_limited_connection`] is set.
    pub fn register(
        &mut self,
        handle: K,
        callback: impl FnMut(Activation<K>) + 'static,
        options: RegisterOptions,
    ) -> Registration<K> {
        let is_touch_device = self.device.is_touch_class();
        let minimum = self.settings.minimum_connection_type;
        if self
            .platform
            .connection()
            .is_some_and(|c| c.is_limited(minimum))
        {
            tracing::debug!(?handle, "registration skipped on limited connection");
            return Registration {
                handle,
                id: None,
                is_registered: false,
                is_touch_device,
                is_limited_connection: true,
            };
        }

        let (hit_slop, uses_default_hit_slop) = match options.hit_slop {
            Some(slop) if slop.is_finite() => (slop, false),
            Some(slop) => {
                tracing::warn!(?handle, ?slop, "non-finite hit slop replaced by the default");
                (self.settings.default_hit_slop, true)
            }
            None => (self.settings.default_hit_slop, true),
        };
        let bounds = ElementBounds::new(self.query_rect(handle), hit_slop);
        let register_count = self.registry.bump_register_count(handle);

        let snapshot = if let Some(e) = self.registry.get_mut(&handle) {
            if let Some(name) = options.name {
                e.name = name;
            }
            e.meta = options.meta;
            e.bounds = bounds;
            e.register_count = register_count;
            e.reactivate_after_ms = options.reactivate_after_ms;
            e.unregister_on_callback = options.unregister_on_callback;
            e.uses_default_hit_slop = uses_default_hit_slop;
            e.callback = Box::new(callback);
            e.machine.reschedule(options.reactivate_after_ms);
            e.snapshot()
        } else {
            if !self.listening {
                self.start_listening();
            }
            let id = self.registry.allocate_id();
            let element = RegisteredElement {
                handle,
                id,
                name: options.name.unwrap_or_else(|| id.to_string()),
                meta: options.meta,
                bounds,
                is_intersecting_viewport: false,
                register_count,
                reactivate_after_ms: options.reactivate_after_ms,
                unregister_on_callback: options.unregister_on_callback,
                uses_default_hit_slop,
                trajectory_hit_at_ms: None,
                machine: crate::callback::CallbackMachine::new(),
                callback: Box::new(callback),
            };
            let snapshot = element.snapshot();
            self.registry.insert(element);
            self.platform.observe_element(handle);
            snapshot
        };

        tracing::debug!(id = %snapshot.id, ?handle, register_count, "element registered");
        let id = snapshot.id;
        self.publish(EventData::ElementRegistered { element: snapshot });
        Registration {
            handle,
            id: Some(id),
            is_registered: true,
            is_touch_device,
            is_limited_connection: false,
        }
    }

    /// Stop tracking `handle`. Unknown handles are a no-op returning `false`.
    pub fn unregister(&mut self, handle: K) -> bool {
        self.unregister_with_reason(handle, UnregisterReason::ApiCall)
    }

    /// Stop tracking `handle`, reporting `reason` in the published event.
    pub fn unregister_with_reason(&mut self, handle: K, reason: UnregisterReason) -> bool {
        let Some(element) = self.registry.remove(&handle) else {
            return false;
        };
        self.platform.unobserve_element(handle);
        let was_last_element = self.registry.is_empty();
        if was_last_element {
            self.stop_listening();
        }
        tracing::debug!(id = %element.id, ?handle, ?reason, "element unregistered");
        self.publish(EventData::ElementUnregistered {
            element: element.snapshot(),
            reason,
            was_last_element,
        });
        true
    }

    /// Make a completed element eligible to fire again right away.
    ///
    /// Returns `false` if the element is unknown, idle, or its callback is
    /// still running.
    pub fn reactivate(&mut self, handle: K) -> bool {
        let Some(e) = self.registry.get_mut(&handle) else {
            return false;
        };
        if !e.machine.reactivate() {
            return false;
        }
        let snapshot = e.snapshot();
        let mut batch = HitBatch::new();
        self.on_reactivated(snapshot, &mut batch);
        self.fire(batch);
        self.drain_settlements();
        true
    }

    /// Apply `patch` and return exactly the settings that changed.
    ///
    /// Publishes [`EventData::ManagerSettingsChanged`] only if something changed.
    pub fn alter_settings(&mut self, patch: &SettingsPatch) -> Vec<UpdatedSetting> {
        let updated = self.settings.apply(patch);
        if updated.is_empty() {
            return updated;
        }
        let mut refresh_slop = false;
        let mut strategy_changed = false;
        for change in &updated {
            match change.key {
                SettingKey::PositionHistorySize => {
                    self.history.set_capacity(self.settings.position_history_size);
                }
                SettingKey::ResizeScrollThrottleDelay => {
                    self.bounds_throttle
                        .set_delay(self.settings.resize_scroll_throttle_delay_ms);
                }
                SettingKey::DefaultHitSlop => refresh_slop = true,
                SettingKey::TouchDeviceStrategy => strategy_changed = true,
                SettingKey::EnableMousePrediction
                | SettingKey::EnableTabPrediction
                | SettingKey::EnableScrollPrediction
                | SettingKey::TrajectoryPredictionTime
                | SettingKey::TabOffset
                | SettingKey::ScrollMargin
                | SettingKey::MinimumConnectionType => {}
            }
        }
        tracing::debug!(changed = updated.len(), "settings altered");
        self.publish(EventData::ManagerSettingsChanged {
            settings: self.settings,
            updated_settings: updated.clone(),
        });
        if refresh_slop {
            self.refresh_default_slop();
        }
        if strategy_changed && self.viewport_strategy_active() {
            let mut batch = HitBatch::new();
            batch.extend(touch::visible_hits(&self.registry));
            self.fire(batch);
            self.drain_settlements();
        }
        updated
    }

    /// Process one input sample at `now_ms`.
    pub fn handle_input(&mut self, event: InputEvent<K>, now_ms: u64) {
        self.handle_batch(core::iter::once(event), now_ms);
    }

    /// Process a logical batch of input samples observed together at `now_ms`.
    ///
    /// Registry and geometry updates are applied first, then predictors run
    /// and at most one callback fires per element, chosen by
    /// [`HIT_PRIORITY`](crate::HIT_PRIORITY).
    pub fn handle_batch(&mut self, events: impl IntoIterator<Item = InputEvent<K>>, now_ms: u64) {
        self.advance(now_ms);

        let mut batch = HitBatch::new();
        let mut inputs = BatchInputs::new();
        for event in events {
            self.apply_input(event, &mut inputs, &mut batch);
        }
        self.run_predictors(inputs, &mut batch);
        self.fire(batch);

        self.advance(now_ms);
    }

    /// Move the clock to `now_ms` and run whatever has come due.
    pub fn advance(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
        self.drain_settlements();

        let mut batch = HitBatch::new();
        self.run_reactivations(&mut batch);
        if self.bounds_throttle.poll(self.now_ms) {
            self.refresh_all_bounds();
        }
        if self.sweep.poll(self.now_ms) {
            self.sweep_trajectory_hits();
        }
        self.fire(batch);
        self.drain_settlements();
    }

    fn apply_input(
        &mut self,
        event: InputEvent<K>,
        inputs: &mut BatchInputs<K>,
        batch: &mut HitBatch<K>,
    ) {
        match event {
            InputEvent::PointerMove { point, device } => {
                self.set_device(device, batch);
                inputs.pointer.push(point);
            }
            InputEvent::Scroll { delta } => {
                self.request_bounds_refresh();
                inputs.scroll.push(delta);
            }
            InputEvent::Resize => self.request_bounds_refresh(),
            InputEvent::TouchStart { point } => {
                if !self.device.is_touch_class() {
                    self.set_device(DeviceStrategy::Touch, batch);
                }
                inputs.touch.push(point);
            }
            InputEvent::FocusChange {
                target,
                shift_key,
                keyboard,
            } => {
                if keyboard {
                    inputs
                        .focus
                        .push((target, TabDirection::from_shift(shift_key)));
                }
            }
            InputEvent::BoundsChanged { handle } => {
                self.update_bounds(handle);
            }
            InputEvent::Intersection {
                handle,
                is_intersecting,
            } => self.set_visibility(handle, is_intersecting, batch),
            InputEvent::Disconnected { handle } => {
                self.unregister_with_reason(handle, UnregisterReason::Disconnected);
            }
        }
    }

    fn run_predictors(&mut self, inputs: BatchInputs<K>, batch: &mut HitBatch<K>) {
        let touch_class = self.device.is_touch_class();

        if !touch_class {
            for point in inputs.pointer {
                self.predict_pointer(point, batch);
            }
            let scroll_enabled = self.settings.enable_scroll_prediction;
            if let Some(pointer) = self.last_pointer.filter(|_| scroll_enabled) {
                for delta in inputs.scroll {
                    self.predict_scroll(pointer, delta, batch);
                }
            }
        }

        if self.settings.enable_tab_prediction && !inputs.focus.is_empty() {
            let order = self.platform.focus_order();
            for (target, direction) in inputs.focus {
                batch.extend(tab::hits(
                    &self.registry,
                    &order,
                    target,
                    direction,
                    self.settings.tab_offset,
                ));
            }
        }

        if touch_class && self.settings.touch_device_strategy == TouchDeviceStrategy::TouchStart {
            for point in inputs.touch {
                batch.extend(touch::touch_start_hits(&self.registry, point));
            }
        }
    }

    fn predict_pointer(&mut self, point: Point, batch: &mut HitBatch<K>) {
        let enabled = self.settings.enable_mouse_prediction;
        let extrapolated =
            self.history
                .predict(point, self.now_ms, self.settings.trajectory_prediction_time_ms);
        let predicted = if enabled { extrapolated } else { point };
        self.last_pointer = Some(point);
        tracing::trace!(?point, ?predicted, "pointer sample");

        batch.extend(mouse::hits(&self.registry, point, predicted, enabled));
        if self.bus.has_listeners(EventKind::MouseTrajectoryUpdate) {
            self.publish(EventData::MouseTrajectoryUpdate {
                current: point,
                predicted,
                prediction_enabled: enabled,
            });
        }
    }

    fn predict_scroll(&mut self, pointer: Point, delta: Vec2, batch: &mut HitBatch<K>) {
        let Some(projection) = scroll::project(pointer, delta, self.settings.scroll_margin) else {
            return;
        };
        tracing::trace!(?delta, direction = ?projection.direction, "scroll sample");
        batch.extend(scroll::hits(&self.registry, &projection));
        if self.bus.has_listeners(EventKind::ScrollTrajectoryUpdate) {
            self.publish(EventData::ScrollTrajectoryUpdate {
                current: projection.current,
                predicted: projection.predicted,
                direction: projection.direction,
            });
        }
    }

    /// Invoke the winning candidate of each element.
    fn fire(&mut self, batch: HitBatch<K>) {
        if batch.is_empty() {
            return;
        }
        let now = self.now_ms;
        for Candidate { handle, hit } in batch.into_winners() {
            let Some(e) = self.registry.get_mut(&handle) else {
                continue;
            };
            let Some(serial) = e.machine.begin(hit, now) else {
                continue;
            };
            if hit == CallbackHitType::Mouse(MouseHit::Trajectory) {
                e.trajectory_hit_at_ms = Some(now);
            }
            let completion = Completion::new(self.settle_tx.clone(), e.id, serial);
            let activation = Activation::new(handle, e.id, e.name.clone(), hit, completion);
            let snapshot = e.snapshot();

            self.hits.record(hit);
            tracing::debug!(id = %snapshot.id, hit_type = %hit, "callback invoked");
            self.publish(EventData::CallbackInvoked {
                element: snapshot,
                hit_type: hit,
            });
            let Some(e) = self.registry.get_mut(&handle) else {
                continue;
            };
            let id = e.id;
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| (e.callback)(activation)));
            if let Err(payload) = outcome {
                let message = panic_message(payload.as_ref());
                tracing::warn!(%id, ?handle, %message, "callback panicked");
                // Covers a callback that stashed its completion before panicking;
                // if the completion was dropped during unwinding this is stale.
                let _ = self.settle_tx.send(Settlement {
                    element: id,
                    serial,
                    result: Err(CallbackError::new(PANIC_MESSAGE)),
                });
            }
        }
    }

    fn drain_settlements(&mut self) {
        while let Ok(settlement) = self.settle_rx.try_recv() {
            self.apply_settlement(settlement);
        }
    }

    fn apply_settlement(&mut self, settlement: Settlement) {
        let now = self.now_ms;
        let Some(e) = self.registry.find_by_id_mut(settlement.element) else {
            tracing::trace!(id = %settlement.element, "settlement for an element no longer registered");
            return;
        };
        let Some(settled) =
            e.machine
                .settle(settlement.serial, settlement.result, now, e.reactivate_after_ms)
        else {
            return;
        };
        let handle = e.handle;
        let unregister = e.unregister_on_callback;
        let snapshot = e.snapshot();

        match settled.status {
            CallbackStatus::Success => {
                tracing::debug!(id = %snapshot.id, elapsed_ms = settled.elapsed_ms, "callback completed");
            }
            CallbackStatus::Error => {
                tracing::debug!(
                    id = %snapshot.id,
                    elapsed_ms = settled.elapsed_ms,
                    error = settled.error_message.as_deref().unwrap_or_default(),
                    "callback failed"
                );
            }
        }
        self.publish(EventData::CallbackCompleted {
            element: snapshot,
            hit_type: settled.hit_type,
            status: settled.status,
            elapsed_ms: settled.elapsed_ms,
            error_message: settled.error_message,
        });
        if unregister {
            self.unregister_with_reason(handle, UnregisterReason::CallbackCompleted);
        }
    }

    fn run_reactivations(&mut self, batch: &mut HitBatch<K>) {
        let now = self.now_ms;
        let mut reactivated = Vec::new();
        for e in self.registry.iter_mut() {
            if e.machine.reactivate_due(now) && e.machine.reactivate() {
                reactivated.push(e.snapshot());
            }
        }
        for snapshot in reactivated {
            self.on_reactivated(snapshot, batch);
        }
    }

    fn on_reactivated(&mut self, snapshot: ElementSnapshot<K>, batch: &mut HitBatch<K>) {
        let handle = snapshot.handle;
        tracing::debug!(id = %snapshot.id, "element reactivated");
        self.publish(EventData::ElementReactivated { element: snapshot });
        if self.viewport_strategy_active() {
            batch.extend(touch::viewport_hit(&self.registry, handle));
        }
    }

    fn sweep_trajectory_hits(&mut self) {
        let now = self.now_ms;
        for e in self.registry.iter_mut() {
            if e
                .trajectory_hit_at_ms
                .is_some_and(|at| now.saturating_sub(at) >= TRAJECTORY_HIT_EXPIRY_MS)
            {
                e.trajectory_hit_at_ms = None;
            }
        }
    }

    fn set_device(&mut self, device: DeviceStrategy, batch: &mut HitBatch<K>) {
        if device == self.device {
            return;
        }
        let old = self.device;
        self.device = device;
        tracing::debug!(?old, new = ?device, "device strategy changed");
        self.publish(EventData::DeviceStrategyChanged {
            old_strategy: old,
            new_strategy: device,
        });
        if old.is_touch_class() != device.is_touch_class() {
            self.history.clear();
            for e in self.registry.iter_mut() {
                e.trajectory_hit_at_ms = None;
            }
        }
        if !old.is_touch_class() && self.viewport_strategy_active() {
            batch.extend(touch::visible_hits(&self.registry));
        }
    }

    fn set_visibility(&mut self, handle: K, is_intersecting: bool, batch: &mut HitBatch<K>) {
        let Some(e) = self.registry.get_mut(&handle) else {
            return;
        };
        if e.is_intersecting_viewport == is_intersecting {
            return;
        }
        e.is_intersecting_viewport = is_intersecting;
        if !is_intersecting {
            e.trajectory_hit_at_ms = None;
        }
        let snapshot = e.snapshot();
        self.publish(EventData::ElementDataUpdated {
            element: snapshot,
            updated_props: UpdatedProps::VISIBILITY,
        });
        if is_intersecting && self.viewport_strategy_active() {
            batch.extend(touch::viewport_hit(&self.registry, handle));
        }
    }

    fn viewport_strategy_active(&self) -> bool {
        self.device.is_touch_class()
            && self.settings.touch_device_strategy == TouchDeviceStrategy::Viewport
    }

    fn query_rect(&self, handle: K) -> Rect {
        self.platform.element_rect(handle).unwrap_or_else(|| {
            tracing::warn!(?handle, "platform has no rect for element; using an empty rect");
            Rect::ZERO
        })
    }

    fn update_bounds(&mut self, handle: K) -> bool {
        if !self.registry.contains(&handle) {
            return false;
        }
        let rect = self.query_rect(handle);
        let Some(e) = self.registry.get_mut(&handle) else {
            return false;
        };
        let bounds = ElementBounds::new(rect, e.bounds.hit_slop);
        self.set_bounds(handle, bounds)
    }

    fn set_bounds(&mut self, handle: K, bounds: ElementBounds) -> bool {
        let Some(e) = self.registry.get_mut(&handle) else {
            return false;
        };
        if e.bounds == bounds {
            return false;
        }
        e.bounds = bounds;
        let snapshot = e.snapshot();
        self.publish(EventData::ElementDataUpdated {
            element: snapshot,
            updated_props: UpdatedProps::BOUNDS,
        });
        true
    }

    fn request_bounds_refresh(&mut self) {
        if self.bounds_throttle.request(self.now_ms) {
            self.refresh_all_bounds();
        }
    }

    fn refresh_all_bounds(&mut self) {
        for handle in self.registry.handles() {
            self.update_bounds(handle);
        }
    }

    fn refresh_default_slop(&mut self) {
        let slop = self.settings.default_hit_slop;
        let updates: Vec<(K, ElementBounds)> = self
            .registry
            .iter()
            .filter(|e| e.uses_default_hit_slop())
            .map(|e| (e.handle, ElementBounds::new(e.bounds.original_rect, slop)))
            .collect();
        for (handle, bounds) in updates {
            self.set_bounds(handle, bounds);
        }
    }

    fn start_listening(&mut self) {
        self.platform.connect_listeners();
        self.sweep.start(self.now_ms);
        self.listening = true;
        tracing::debug!("global listeners connected");
    }

    fn stop_listening(&mut self) {
        self.platform.disconnect_listeners();
        self.sweep.stop();
        self.bounds_throttle.cancel();
        self.history.clear();
        self.last_pointer = None;
        self.listening = false;
        tracing::debug!("global listeners disconnected");
    }

    fn publish(&mut self, data: EventData<K>) {
        let event = ForesightEvent {
            timestamp_ms: self.now_ms,
            data,
        };
        self.bus.emit(&event);
    }
}

/// Best-effort text of a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
