// Copyright 2025 the Foresight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Synchronous, typed publish/subscribe with bulk cancellation.
//!
//! Listeners are keyed by [`EventKind`] and called in subscription order.
//! A listener added with an [`AbortSignal`] is dropped once its
//! [`AbortController`] aborts, so a consumer can detach every listener it
//! registered in one step.
//!
//! ```rust
//! use foresight::bus::{AbortController, EventBus};
//! use foresight::events::EventKind;
//!
//! let mut bus: EventBus<u32> = EventBus::new();
//! let controller = AbortController::new();
//! bus.add_listener(EventKind::DeviceStrategyChanged, |_| {}, Some(&controller.signal()));
//! assert_eq!(bus.listener_count(EventKind::DeviceStrategyChanged), 1);
//!
//! controller.abort();
//! assert_eq!(bus.listener_count(EventKind::DeviceStrategyChanged), 0);
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::events::{EventKind, ForesightEvent};

/// Boxed event handler.
pub type Listener<K> = Box<dyn FnMut(&ForesightEvent<K>)>;

/// Identifies one subscription for [`EventBus::remove_listener`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Owner side of a cancellation flag.
///
/// Dropping the controller does not abort; call [`abort`](Self::abort).
#[derive(Debug, Default)]
pub struct AbortController {
    flag: Arc<AtomicBool>,
}

impl AbortController {
    /// A fresh, unaborted controller.
    pub fn new() -> Self {
        Self::default()
    }

    /// A signal observing this controller.
    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            flag: Arc::clone(&self.flag),
        }
    }

    /// Abort; every observing signal reports aborted from now on.
    pub fn abort(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Whether [`abort`](Self::abort) has been called.
    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Cloneable view of an [`AbortController`].
#[derive(Clone, Debug)]
pub struct AbortSignal {
    flag: Arc<AtomicBool>,
}

impl AbortSignal {
    /// Whether the controller has aborted.
    #[inline]
    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

struct Subscription<K> {
    id: ListenerId,
    kind: EventKind,
    signal: Option<AbortSignal>,
    handler: Listener<K>,
}

impl<K> Subscription<K> {
    fn is_live(&self) -> bool {
        !self.signal.as_ref().is_some_and(AbortSignal::is_aborted)
    }
}

/// Listener registry and dispatcher.
pub struct EventBus<K> {
    subscriptions: Vec<Subscription<K>>,
    next_id: u64,
}

impl<K> fmt::Debug for EventBus<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.subscriptions.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl<K> Default for EventBus<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> EventBus<K> {
    /// A bus with no listeners.
    pub fn new() -> Self {
        Self {
            subscriptions: Vec::new(),
            next_id: 0,
        }
    }

    /// Subscribe `handler` to `kind`.
    ///
    /// A signal that is already aborted makes this a no-op; the returned id
    /// then refers to nothing.
    pub fn add_listener(
        &mut self,
        kind: EventKind,
        handler: impl FnMut(&ForesightEvent<K>) + 'static,
        signal: Option<&AbortSignal>,
    ) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        if signal.is_some_and(AbortSignal::is_aborted) {
            return id;
        }
        self.subscriptions.push(Subscription {
            id,
            kind,
            signal: signal.cloned(),
            handler: Box::new(handler),
        });
        id
    }

    /// Unsubscribe. Returns `false` if `id` was not subscribed.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    /// Live listeners for `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.subscriptions
            .iter()
            .filter(|s| s.kind == kind && s.is_live())
            .count()
    }

    /// Whether anything listens to `kind`.
    pub fn has_listeners(&self, kind: EventKind) -> bool {
        self.subscriptions
            .iter()
            .any(|s| s.kind == kind && s.is_live())
    }

    /// Deliver `event` to its listeners in subscription order, pruning aborted ones.
    pub fn emit(&mut self, event: &ForesightEvent<K>) {
        self.subscriptions.retain(Subscription::is_live);
        let kind = event.kind();
        for s in self.subscriptions.iter_mut().filter(|s| s.kind == kind) {
            (s.handler)(event);
        }
    }
}
