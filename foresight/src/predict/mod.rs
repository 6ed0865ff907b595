// Copyright 2025 the Foresight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Predictors. Each one turns an input sample into hit candidates; none of
//! them mutate the registry or fire callbacks.

use std::hash::Hash;

use hashbrown::HashSet;
use smallvec::SmallVec;

use crate::types::{CallbackHitType, HIT_PRIORITY, PredictorKind};

pub(crate) mod mouse;
pub(crate) mod scroll;
pub(crate) mod tab;
pub(crate) mod touch;

/// A predictor's claim that `handle` should fire with `hit`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Candidate<K> {
    pub(crate) handle: K,
    pub(crate) hit: CallbackHitType,
}

pub(crate) type Candidates<K> = SmallVec<[Candidate<K>; 4]>;

/// Candidates collected over one input batch, grouped by predictor family.
#[derive(Clone, Debug)]
pub(crate) struct HitBatch<K> {
    mouse: Candidates<K>,
    scroll: Candidates<K>,
    tab: Candidates<K>,
    touch_viewport: Candidates<K>,
}

impl<K: Copy + Eq + Hash> HitBatch<K> {
    pub(crate) fn new() -> Self {
        Self {
            mouse: SmallVec::new(),
            scroll: SmallVec::new(),
            tab: SmallVec::new(),
            touch_viewport: SmallVec::new(),
        }
    }

    pub(crate) fn extend(&mut self, candidates: impl IntoIterator<Item = Candidate<K>>) {
        for c in candidates {
            self.bucket(c.hit.predictor()).push(c);
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.mouse.is_empty()
            && self.scroll.is_empty()
            && self.tab.is_empty()
            && self.touch_viewport.is_empty()
    }

    fn bucket(&mut self, kind: PredictorKind) -> &mut Candidates<K> {
        match kind {
            PredictorKind::Mouse => &mut self.mouse,
            PredictorKind::Scroll => &mut self.scroll,
            PredictorKind::Tab => &mut self.tab,
            PredictorKind::TouchViewport => &mut self.touch_viewport,
        }
    }

    /// One winner per handle: families in [`HIT_PRIORITY`] order, first
    /// detection within a family.
    pub(crate) fn into_winners(mut self) -> Vec<Candidate<K>> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for kind in HIT_PRIORITY {
            for c in self.bucket(kind).drain(..) {
                if seen.insert(c.handle) {
                    out.push(c);
                }
            }
        }
        out
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::BTreeMap;

    use foresight_geometry::HitSlop;
    use kurbo::Rect;

    use crate::callback::CallbackMachine;
    use crate::registry::{ElementBounds, RegisteredElement, Registry};

    /// Idle elements with zero slop, in the given order.
    pub(crate) fn registry_with(rects: &[(u32, Rect)]) -> Registry<u32> {
        let mut r = Registry::new();
        for &(handle, rect) in rects {
            let id = r.allocate_id();
            let register_count = r.bump_register_count(handle);
            r.insert(RegisteredElement {
                handle,
                id,
                name: id.to_string(),
                meta: BTreeMap::new(),
                bounds: ElementBounds::new(rect, HitSlop::ZERO),
                is_intersecting_viewport: false,
                register_count,
                reactivate_after_ms: None,
                unregister_on_callback: false,
                uses_default_hit_slop: true,
                trajectory_hit_at_ms: None,
                machine: CallbackMachine::new(),
                callback: Box::new(|_| {}),
            });
        }
        r
    }
}
