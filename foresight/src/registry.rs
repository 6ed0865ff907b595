// Copyright 2025 the Foresight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Registered elements and the handle-indexed registry that owns them.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;

use foresight_geometry::{HitSlop, expand};
use hashbrown::HashMap;
use kurbo::Rect;

use crate::callback::{Callback, CallbackInfo, CallbackMachine};
use crate::types::ElementId;

/// An element's measured rectangle and its slop-expanded prediction region.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ElementBounds {
    /// Rectangle reported by the platform.
    pub original_rect: Rect,
    /// `original_rect` outset by `hit_slop`.
    pub expanded_rect: Rect,
    /// Normalized per-edge slop.
    pub hit_slop: HitSlop,
}

impl ElementBounds {
    /// Bounds for `rect` expanded by `hit_slop`.
    pub fn new(original_rect: Rect, hit_slop: HitSlop) -> Self {
        Self {
            original_rect,
            expanded_rect: expand(original_rect, hit_slop),
            hit_slop,
        }
    }
}

/// Per-registration options, built fluently.
///
/// ```rust
/// use foresight::RegisterOptions;
///
/// let options = RegisterOptions::new()
///     .name("checkout")
///     .hit_slop(20.0)
///     .reactivate_after_ms(5_000)
///     .meta("route", "/checkout");
/// assert_eq!(options.name.as_deref(), Some("checkout"));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegisterOptions {
    /// Element slop; the engine default applies when unset.
    pub hit_slop: Option<HitSlop>,
    /// Display name; defaults to the element id.
    pub name: Option<String>,
    /// Free-form metadata carried in snapshots and events.
    pub meta: BTreeMap<String, String>,
    /// Cooldown before the element may fire again; `None` means never.
    pub reactivate_after_ms: Option<u64>,
    /// Remove the element once its callback settles.
    pub unregister_on_callback: bool,
}

impl RegisterOptions {
    /// Defaults: engine slop, no reactivation, stays registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the element slop. Accepts a scalar or a [`HitSlop`].
    pub fn hit_slop(mut self, slop: impl Into<HitSlop>) -> Self {
        self.hit_slop = Some(slop.into());
        self
    }

    /// Set the display name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add one metadata entry.
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Allow the element to fire again `ms` after its callback settles.
    pub fn reactivate_after_ms(mut self, ms: u64) -> Self {
        self.reactivate_after_ms = Some(ms);
        self
    }

    /// Remove the element once its callback settles.
    pub fn unregister_on_callback(mut self, yes: bool) -> Self {
        self.unregister_on_callback = yes;
        self
    }
}

/// A tracked element.
pub struct RegisteredElement<K> {
    /// Platform handle.
    pub handle: K,
    /// Engine-assigned id.
    pub id: ElementId,
    /// Display name.
    pub name: String,
    /// Caller metadata.
    pub meta: BTreeMap<String, String>,
    /// Current rectangles.
    pub bounds: ElementBounds,
    /// Latest viewport intersection report.
    pub is_intersecting_viewport: bool,
    /// How many times this handle has been registered, including earlier lifetimes.
    pub register_count: u32,
    /// Cooldown after a callback settles; `None` means never.
    pub reactivate_after_ms: Option<u64>,
    /// Removed once the callback settles.
    pub unregister_on_callback: bool,
    pub(crate) uses_default_hit_slop: bool,
    pub(crate) trajectory_hit_at_ms: Option<u64>,
    pub(crate) machine: CallbackMachine,
    pub(crate) callback: Callback<K>,
}

impl<K: fmt::Debug> fmt::Debug for RegisteredElement<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredElement")
            .field("handle", &self.handle)
            .field("id", &self.id)
            .field("name", &self.name)
            .field("bounds", &self.bounds)
            .field("is_intersecting_viewport", &self.is_intersecting_viewport)
            .field("register_count", &self.register_count)
            .field("trajectory_hit_at_ms", &self.trajectory_hit_at_ms)
            .field("callback_info", self.machine.info())
            .finish_non_exhaustive()
    }
}

impl<K: Copy> RegisteredElement<K> {
    /// Callback diagnostics.
    pub fn callback_info(&self) -> &CallbackInfo {
        self.machine.info()
    }

    /// Whether the element may fire now.
    pub fn is_idle(&self) -> bool {
        self.machine.is_idle()
    }

    /// Whether a trajectory hit is currently recorded for this element.
    pub fn is_trajectory_hit(&self) -> bool {
        self.trajectory_hit_at_ms.is_some()
    }

    /// When the current trajectory hit was recorded.
    pub fn trajectory_hit_at_ms(&self) -> Option<u64> {
        self.trajectory_hit_at_ms
    }

    /// Whether the element follows the engine's default slop.
    pub fn uses_default_hit_slop(&self) -> bool {
        self.uses_default_hit_slop
    }

    /// Owned copy of everything but the callback.
    pub fn snapshot(&self) -> ElementSnapshot<K> {
        ElementSnapshot {
            handle: self.handle,
            id: self.id,
            name: self.name.clone(),
            meta: self.meta.clone(),
            bounds: self.bounds,
            is_intersecting_viewport: self.is_intersecting_viewport,
            register_count: self.register_count,
            reactivate_after_ms: self.reactivate_after_ms,
            unregister_on_callback: self.unregister_on_callback,
            is_trajectory_hit: self.is_trajectory_hit(),
            trajectory_hit_at_ms: self.trajectory_hit_at_ms,
            callback_info: self.machine.info().clone(),
        }
    }
}

/// Owned, callback-free view of a [`RegisteredElement`], used in events and diagnostics.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementSnapshot<K> {
    /// Platform handle.
    pub handle: K,
    /// Engine-assigned id.
    pub id: ElementId,
    /// Display name.
    pub name: String,
    /// Caller metadata.
    pub meta: BTreeMap<String, String>,
    /// Rectangles at snapshot time.
    pub bounds: ElementBounds,
    /// Viewport intersection at snapshot time.
    pub is_intersecting_viewport: bool,
    /// Registration count.
    pub register_count: u32,
    /// Cooldown after a callback settles.
    pub reactivate_after_ms: Option<u64>,
    /// Removed once the callback settles.
    pub unregister_on_callback: bool,
    /// A trajectory hit is recorded.
    pub is_trajectory_hit: bool,
    /// When the trajectory hit was recorded.
    pub trajectory_hit_at_ms: Option<u64>,
    /// Callback diagnostics.
    pub callback_info: CallbackInfo,
}

/// Insertion-ordered elements with a handle index.
pub(crate) struct Registry<K> {
    entries: Vec<RegisteredElement<K>>,
    index: HashMap<K, usize>,
    register_counts: HashMap<K, u32>,
    next_id: u64,
}

impl<K: fmt::Debug> fmt::Debug for Registry<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("entries", &self.entries)
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

impl<K: Copy + Eq + Hash> Registry<K> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            register_counts: HashMap::new(),
            next_id: 1,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn contains(&self, handle: &K) -> bool {
        self.index.contains_key(handle)
    }

    pub(crate) fn get(&self, handle: &K) -> Option<&RegisteredElement<K>> {
        self.index.get(handle).map(|&i| &self.entries[i])
    }

    pub(crate) fn get_mut(&mut self, handle: &K) -> Option<&mut RegisteredElement<K>> {
        self.index.get(handle).map(|&i| &mut self.entries[i])
    }

    pub(crate) fn find_by_id_mut(&mut self, id: ElementId) -> Option<&mut RegisteredElement<K>> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &RegisteredElement<K>> + '_ {
        self.entries.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut RegisteredElement<K>> + '_ {
        self.entries.iter_mut()
    }

    pub(crate) fn handles(&self) -> Vec<K> {
        self.entries.iter().map(|e| e.handle).collect()
    }

    /// Increment and return the lifetime registration count for `handle`.
    pub(crate) fn bump_register_count(&mut self, handle: K) -> u32 {
        let count = self.register_counts.entry(handle).or_insert(0);
        *count += 1;
        *count
    }

    pub(crate) fn allocate_id(&mut self) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Insert a new element. The handle must not be registered.
    pub(crate) fn insert(&mut self, element: RegisteredElement<K>) {
        debug_assert!(!self.contains(&element.handle));
        self.index.insert(element.handle, self.entries.len());
        self.entries.push(element);
    }

    /// Remove `handle`, keeping the relative order of the rest.
    pub(crate) fn remove(&mut self, handle: &K) -> Option<RegisteredElement<K>> {
        let slot = self.index.remove(handle)?;
        let element = self.entries.remove(slot);
        for i in self.index.values_mut() {
            if *i > slot {
                *i -= 1;
            }
        }
        Some(element)
    }
}
