// Copyright 2025 the Foresight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tab-order hits. Purely ordinal; no geometry involved.

use std::hash::Hash;

use foresight_focus::{TabDirection, upcoming};

use super::{Candidate, Candidates};
use crate::registry::Registry;
use crate::types::CallbackHitType;

/// Idle registered elements within `1..=tab_offset` steps of `focused` in `direction`.
pub(crate) fn hits<K: Copy + Eq + Hash>(
    registry: &Registry<K>,
    order: &[K],
    focused: K,
    direction: TabDirection,
    tab_offset: usize,
) -> Candidates<K> {
    upcoming(order, focused, direction, tab_offset)
        .filter(|(handle, _)| registry.get(handle).is_some_and(|e| e.is_idle()))
        .map(|(handle, _)| Candidate {
            handle,
            hit: CallbackHitType::Tab(direction),
        })
        .collect()
}
