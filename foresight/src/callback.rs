// Copyright 2025 the Foresight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Callback activation and the per-element reactivation state machine.
//!
//! Callbacks are fire-and-forget. The engine hands each one an [`Activation`]
//! and moves on; the callback reports back through the [`Completion`] it
//! carries, either immediately or later from any thread. Settlements travel
//! over a channel and are applied the next time the engine is driven.
//!
//! ```text
//!   Idle ──hit──▶ Active ──settle──▶ Completed ──reactivate_after_ms──▶ Idle
//!                                       └── unregister_on_callback ──▶ removed
//! ```
//!
//! Dropping a [`Completion`] without settling it counts as success, so a
//! synchronous callback that simply returns needs no extra ceremony. A panic
//! counts as failure, whether it happens in the callback itself or in a
//! worker that owns the completion:
//!
//! ```rust
//! use foresight::{Activation, CallbackError};
//!
//! fn prefetch(activation: Activation<u32>) {
//!     // Work done inline; dropping `activation` reports success.
//!     let _ = activation.hit_type;
//! }
//!
//! fn prefetch_or_fail(activation: Activation<u32>) {
//!     activation.fail(CallbackError::from("offline"));
//! }
//! # let _ = (prefetch, prefetch_or_fail);
//! ```

use std::sync::mpsc::Sender;

use crate::types::{CallbackHitType, CallbackStatus, ElementId};

/// A callback failure, reported as [`CallbackStatus::Error`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct CallbackError {
    /// Human-readable failure description.
    pub message: String,
}

impl CallbackError {
    /// Create an error with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<&str> for CallbackError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for CallbackError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

/// The boxed user callback stored per element.
pub type Callback<K> = Box<dyn FnMut(Activation<K>)>;

/// Message sent back to the engine when a callback settles.
#[derive(Debug)]
pub(crate) struct Settlement {
    pub(crate) element: ElementId,
    pub(crate) serial: u64,
    pub(crate) result: Result<(), CallbackError>,
}

/// Message reported when a callback, or a worker holding its completion, panics.
pub(crate) const PANIC_MESSAGE: &str = "callback panicked";

/// Settles one callback invocation. `Send`, so it can be moved to a worker.
///
/// Settling consumes the completion. Dropping it unsettled reports success,
/// unless the drop happens while the thread is unwinding from a panic.
#[derive(Debug)]
pub struct Completion {
    tx: Sender<Settlement>,
    element: ElementId,
    serial: u64,
    settled: bool,
}

impl Completion {
    pub(crate) fn new(tx: Sender<Settlement>, element: ElementId, serial: u64) -> Self {
        Self {
            tx,
            element,
            serial,
            settled: false,
        }
    }

    /// Id of the element whose callback this settles.
    pub fn element_id(&self) -> ElementId {
        self.element
    }

    /// Report success.
    pub fn succeed(self) {
        self.complete(Ok(()));
    }

    /// Report failure.
    pub fn fail(self, error: impl Into<CallbackError>) {
        self.complete(Err(error.into()));
    }

    /// Report `result`.
    pub fn complete(mut self, result: Result<(), CallbackError>) {
        self.send(result);
    }

    fn send(&mut self, result: Result<(), CallbackError>) {
        if self.settled {
            return;
        }
        self.settled = true;
        // The engine may already be gone; nothing is left to notify then.
        let _ = self.tx.send(Settlement {
            element: self.element,
            serial: self.serial,
            result,
        });
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.send(Err(CallbackError::new(PANIC_MESSAGE)));
        } else {
            self.send(Ok(()));
        }
    }
}

/// What a callback receives when its element is predicted.
#[derive(Debug)]
pub struct Activation<K> {
    /// Handle of the predicted element.
    pub element: K,
    /// Engine id of the predicted element.
    pub id: ElementId,
    /// Element name given at registration.
    pub name: String,
    /// The winning hit for this activation.
    pub hit_type: CallbackHitType,
    completion: Completion,
}

impl<K> Activation<K> {
    pub(crate) fn new(
        element: K,
        id: ElementId,
        name: String,
        hit_type: CallbackHitType,
        completion: Completion,
    ) -> Self {
        Self {
            element,
            id,
            name,
            hit_type,
            completion,
        }
    }

    /// Report success now.
    pub fn succeed(self) {
        self.completion.succeed();
    }

    /// Report failure now.
    pub fn fail(self, error: impl Into<CallbackError>) {
        self.completion.fail(error);
    }

    /// Report `result` now.
    pub fn complete(self, result: Result<(), CallbackError>) {
        self.completion.complete(result);
    }

    /// Keep the completion to settle later, possibly from another thread.
    pub fn into_completion(self) -> Completion {
        self.completion
    }
}

/// Diagnostics for one element's callback.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallbackInfo {
    /// Number of times the callback has been invoked.
    pub callback_fired_count: u64,
    /// Hit type of the latest invocation.
    pub last_hit_type: Option<CallbackHitType>,
    /// When the latest invocation started.
    pub last_invoked_at_ms: Option<u64>,
    /// When the latest invocation settled.
    pub last_completed_at_ms: Option<u64>,
    /// Duration of the latest settled invocation.
    pub last_runtime_ms: Option<u64>,
    /// Status of the latest settled invocation.
    pub last_status: Option<CallbackStatus>,
    /// Error message of the latest settled invocation, if it failed.
    pub last_error: Option<String>,
    /// The element has fired and is not yet eligible again.
    pub is_callback_active: bool,
    /// The callback has been invoked and has not settled.
    pub is_running_callback: bool,
    /// When the element becomes eligible again, if scheduled.
    pub reactivate_at_ms: Option<u64>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum CallbackState {
    Idle,
    Active {
        hit_type: CallbackHitType,
        serial: u64,
        started_at_ms: u64,
    },
    Completed {
        reactivate_at_ms: Option<u64>,
    },
}

/// Outcome of a settlement applied to a [`CallbackMachine`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Settled {
    pub(crate) hit_type: CallbackHitType,
    pub(crate) status: CallbackStatus,
    pub(crate) elapsed_ms: u64,
    pub(crate) error_message: Option<String>,
}

/// Per-element `Idle → Active → Completed → Idle` bookkeeping.
#[derive(Clone, Debug)]
pub(crate) struct CallbackMachine {
    state: CallbackState,
    next_serial: u64,
    info: CallbackInfo,
}

impl CallbackMachine {
    pub(crate) fn new() -> Self {
        Self {
            state: CallbackState::Idle,
            next_serial: 0,
            info: CallbackInfo::default(),
        }
    }

    pub(crate) fn is_idle(&self) -> bool {
        matches!(self.state, CallbackState::Idle)
    }

    #[cfg(test)]
    pub(crate) fn is_running(&self) -> bool {
        matches!(self.state, CallbackState::Active { .. })
    }

    pub(crate) fn info(&self) -> &CallbackInfo {
        &self.info
    }

    /// `Idle → Active`. Returns the invocation serial, or `None` if not idle.
    pub(crate) fn begin(&mut self, hit_type: CallbackHitType, now_ms: u64) -> Option<u64> {
        if !self.is_idle() {
            return None;
        }
        let serial = self.next_serial;
        self.next_serial += 1;
        self.state = CallbackState::Active {
            hit_type,
            serial,
            started_at_ms: now_ms,
        };
        self.info.callback_fired_count += 1;
        self.info.last_hit_type = Some(hit_type);
        self.info.last_invoked_at_ms = Some(now_ms);
        self.info.is_callback_active = true;
        self.info.is_running_callback = true;
        self.info.reactivate_at_ms = None;
        Some(serial)
    }

    /// `Active → Completed`. Stale serials and non-running states are ignored.
    pub(crate) fn settle(
        &mut self,
        serial: u64,
        result: Result<(), CallbackError>,
        now_ms: u64,
        reactivate_after_ms: Option<u64>,
    ) -> Option<Settled> {
        let CallbackState::Active {
            hit_type,
            serial: running,
            started_at_ms,
        } = self.state
        else {
            return None;
        };
        if running != serial {
            return None;
        }
        let elapsed_ms = now_ms.saturating_sub(started_at_ms);
        let reactivate_at_ms = reactivate_after_ms.map(|ms| now_ms.saturating_add(ms));
        self.state = CallbackState::Completed { reactivate_at_ms };

        let (status, error_message) = match result {
            Ok(()) => (CallbackStatus::Success, None),
            Err(e) => (CallbackStatus::Error, Some(e.message)),
        };
        self.info.last_completed_at_ms = Some(now_ms);
        self.info.last_runtime_ms = Some(elapsed_ms);
        self.info.last_status = Some(status);
        self.info.last_error.clone_from(&error_message);
        self.info.is_running_callback = false;
        self.info.reactivate_at_ms = reactivate_at_ms;
        Some(Settled {
            hit_type,
            status,
            elapsed_ms,
            error_message,
        })
    }

    pub(crate) fn reactivate_due(&self, now_ms: u64) -> bool {
        matches!(
            self.state,
            CallbackState::Completed { reactivate_at_ms: Some(at) } if at <= now_ms
        )
    }

    /// Reschedule a completed element after its `reactivate_after_ms` changed.
    pub(crate) fn reschedule(&mut self, reactivate_after_ms: Option<u64>) {
        if let (CallbackState::Completed { reactivate_at_ms }, Some(completed)) =
            (&mut self.state, self.info.last_completed_at_ms)
        {
            *reactivate_at_ms = reactivate_after_ms.map(|ms| completed.saturating_add(ms));
            self.info.reactivate_at_ms = *reactivate_at_ms;
        }
    }

    /// `Completed → Idle`. Returns `false` if idle already or still running.
    pub(crate) fn reactivate(&mut self) -> bool {
        match self.state {
            CallbackState::Completed { .. } => {
                self.state = CallbackState::Idle;
                self.info.is_callback_active = false;
                self.info.reactivate_at_ms = None;
                true
            }
            CallbackState::Idle | CallbackState::Active { .. } => false,
        }
    }
}
