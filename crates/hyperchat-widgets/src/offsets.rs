#![forbid(unsafe_code)]

//! Item offset calculation with an exact-prefix frontier.
//!
//! The top offset of item `i` is the sum of the layout heights of items
//! `0..i` (measured, or the default estimate). Summing from zero on every
//! lookup would make random access O(n), so offsets are memoized and derived
//! from the closest known point:
//!
//! 1. `offset(0) = 0`.
//! 2. A memoized offset is returned as-is.
//! 3. Walking forward (the item right after the exact frontier, or any item
//!    past the first visible one) with the predecessor known:
//!    `offset(i) = offset(i - 1) + height(i - 1)`, O(1).
//! 4. Anything else is a gap: start from the nearest memoized offset below
//!    `i` and add the heights in between, O(gap).
//!
//! # The exact frontier
//!
//! `last_correct_offset_index() == Some(k)` means items `0..=k` were all
//! measured in unbroken sequence, so every offset up to and including
//! `k + 1` is exact rather than estimated. The frontier only advances when
//! item `k + 1` itself is measured, one index at a time. `None` means
//! nothing is known beyond the trivially exact `offset(0)`.
//!
//! # Invalidation
//!
//! When an item's layout height changes, every memoized offset after it is
//! dropped and recomputed lazily. Memoized offsets therefore always agree
//! with the current heights, and `offset(i + 1) >= offset(i) + height(i)`
//! holds with equality.

use std::collections::BTreeMap;

use crate::height_cache::{HeightCache, Measurement};

/// Memoized item offsets plus the exact-prefix frontier.
#[derive(Debug, Clone)]
pub struct OffsetCache {
    offsets: BTreeMap<usize, u64>,
    last_correct: Option<usize>,
}

impl Default for OffsetCache {
    fn default() -> Self {
        Self::new()
    }
}

impl OffsetCache {
    /// Create a cache knowing only `offset(0) = 0`.
    #[must_use]
    pub fn new() -> Self {
        let mut offsets = BTreeMap::new();
        offsets.insert(0, 0);
        Self {
            offsets,
            last_correct: None,
        }
    }

    /// Highest index measured in unbroken sequence from zero.
    #[must_use]
    pub fn last_correct_offset_index(&self) -> Option<usize> {
        self.last_correct
    }

    /// Whether `offset(index)` is derived purely from measured heights.
    #[must_use]
    pub fn is_exact(&self, index: usize) -> bool {
        index == 0 || self.last_correct.is_some_and(|k| index <= k + 1)
    }

    /// Memoized offset, without computing anything.
    #[must_use]
    pub fn peek(&self, index: usize) -> Option<u64> {
        self.offsets.get(&index).copied()
    }

    /// Number of memoized offsets.
    #[must_use]
    pub fn memoized_count(&self) -> usize {
        self.offsets.len()
    }

    /// Top offset of `index`.
    ///
    /// `first_visible` is the current first index of the visible range;
    /// indices past it are computed forward from their predecessor.
    pub fn offset_of(&mut self, index: usize, heights: &HeightCache, first_visible: usize) -> u64 {
        if index == 0 {
            return 0;
        }
        if let Some(offset) = self.peek(index) {
            return offset;
        }

        let frontier_next = self.last_correct.map_or(0, |k| k + 1);
        if (index == frontier_next || index > first_visible)
            && let Some(prev) = self.peek(index - 1)
        {
            let offset = prev + u64::from(heights.height_or_default(index - 1));
            self.offsets.insert(index, offset);
            return offset;
        }

        let (base_index, base) = self
            .offsets
            .range(..index)
            .next_back()
            .map(|(&i, &o)| (i, o))
            .unwrap_or((0, 0));
        let offset = base + heights.sum_range(base_index..index);
        self.offsets.insert(index, offset);
        offset
    }

    /// Memoize an offset derived elsewhere from the same heights.
    ///
    /// Used by the range tracker, which walks heights and already knows the
    /// top of the item it lands on.
    pub(crate) fn remember(&mut self, index: usize, offset: u64) {
        if index != 0 {
            self.offsets.insert(index, offset);
        }
    }

    /// Apply a measurement: invalidate stale offsets and advance the frontier.
    pub fn on_measured(&mut self, measurement: &Measurement) {
        if measurement.changed_layout() {
            self.invalidate_after(measurement.index);
        }
        let frontier_next = self.last_correct.map_or(0, |k| k + 1);
        if measurement.index == frontier_next {
            self.last_correct = Some(measurement.index);
        }
    }

    /// Drop every memoized offset after `index`.
    pub fn invalidate_after(&mut self, index: usize) {
        let _stale = self.offsets.split_off(&(index + 1));
    }

    /// Re-key for `n` items inserted at the front whose heights sum to
    /// `inserted_height`.
    ///
    /// Every memoized entry moves to `index + n` and down by
    /// `inserted_height`; `offset(0)` stays zero. The frontier restarts,
    /// since the measured prefix no longer starts at zero.
    pub fn shift(&mut self, n: usize, inserted_height: u64) {
        if n == 0 {
            return;
        }
        let old = std::mem::take(&mut self.offsets);
        self.offsets = old
            .into_iter()
            .map(|(i, o)| (i + n, o + inserted_height))
            .collect();
        self.offsets.insert(0, 0);
        self.last_correct = None;
    }

    /// Forget everything except `offset(0)`.
    pub fn clear(&mut self) {
        self.offsets.clear();
        self.offsets.insert(0, 0);
        self.last_correct = None;
    }
}
