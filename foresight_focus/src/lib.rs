// Copyright 2025 the Foresight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Foresight Focus: sequential focus order primitives.
//!
//! Keyboard users move through an interface one focusable element at a time
//! (Tab forwards, Shift+Tab in reverse). Given the host's ordered sequence of
//! focusable elements, this crate answers how many steps separate two of
//! them in the direction of travel ([`tab_distance`]) and which elements lie
//! just ahead ([`upcoming`]).
//!
//! ```rust
//! use foresight_focus::{TabDirection, tab_distance, upcoming};
//!
//! let order = [1_u32, 2, 3, 4];
//!
//! // Two Tab presses take focus from 1 to 3.
//! assert_eq!(tab_distance(&order, 1, 3, TabDirection::Forwards), Some(2));
//! // 3 is behind 1 when moving in reverse.
//! assert_eq!(tab_distance(&order, 1, 3, TabDirection::Reverse), None);
//!
//! let ahead: Vec<_> = upcoming(&order, 2, TabDirection::Forwards, 2).collect();
//! assert_eq!(ahead, vec![(3, 1), (4, 2)]);
//! ```
//!
//! Everything is generic over the element identifier `K`. The crate is
//! `no_std` and allocation-free.

#![no_std]

#[cfg(test)]
extern crate alloc;

/// Direction of sequential focus travel.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TabDirection {
    /// Toward later elements in the order (Tab).
    Forwards,
    /// Toward earlier elements in the order (Shift+Tab).
    Reverse,
}

impl TabDirection {
    /// Direction implied by the Shift modifier on a Tab key press.
    pub const fn from_shift(shift_key: bool) -> Self {
        if shift_key {
            Self::Reverse
        } else {
            Self::Forwards
        }
    }
}

/// Number of steps from `origin` to `target` when travelling in `direction`.
///
/// Returns `None` if either element is missing from `order`, or if `target`
/// lies behind `origin` for this direction. `origin == target` yields
/// `Some(0)`.
pub fn tab_distance<K: PartialEq>(
    order: &[K],
    origin: K,
    target: K,
    direction: TabDirection,
) -> Option<usize> {
    let from = order.iter().position(|k| *k == origin)?;
    let to = order.iter().position(|k| *k == target)?;
    match direction {
        TabDirection::Forwards => to.checked_sub(from),
        TabDirection::Reverse => from.checked_sub(to),
    }
}

/// Elements reachable from `origin` within `1..=max_steps` steps in `direction`,
/// nearest first, paired with their step distance.
///
/// Yields nothing if `origin` is not in `order`.
pub fn upcoming<K: Copy + PartialEq>(
    order: &[K],
    origin: K,
    direction: TabDirection,
    max_steps: usize,
) -> impl Iterator<Item = (K, usize)> + '_ {
    let from = order.iter().position(|k| *k == origin);
    (1..=max_steps).map_while(move |step| {
        let from = from?;
        let idx = match direction {
            TabDirection::Forwards => from.checked_add(step)?,
            TabDirection::Reverse => from.checked_sub(step)?,
        };
        order.get(idx).map(|k| (*k, step))
    })
}
