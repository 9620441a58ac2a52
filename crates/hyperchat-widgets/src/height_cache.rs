#![forbid(unsafe_code)]

//! Measured item heights for virtualized lists.
//!
//! Heights are recorded lazily: an item only gets an entry once it has been
//! mounted and the layout host has reported its height. Every other item is
//! laid out with the configured default estimate.
//!
//! # Estimate bookkeeping
//!
//! The list sizes its scrollable region as `len * default + estimate_delta`,
//! where `estimate_delta` is the signed sum of `current - default` over every
//! measured item. Each measurement moves it by its `layout_delta`, so the
//! container always equals the sum of the layout heights the offsets use.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Unmeasured index | `height_or_default` returns the default |
//! | Index beyond any entry | Same as unmeasured; never an error |
//! | Height 0 reported | Stored; the item collapses |
//!
//! Entries are never evicted for the lifetime of the cache.

use std::collections::BTreeMap;
use std::ops::Range;

/// Result of recording one measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    /// Index that was measured.
    pub index: usize,
    /// Newly stored height.
    pub height: u32,
    /// Height stored before this measurement, if any.
    pub previous: Option<u32>,
    /// Change of the height used for layout (`height - (previous or default)`).
    pub layout_delta: i64,
}

impl Measurement {
    /// Whether this was the item's first measurement.
    #[must_use]
    pub const fn is_first(&self) -> bool {
        self.previous.is_none()
    }

    /// Whether the item's layout height changed.
    #[must_use]
    pub const fn changed_layout(&self) -> bool {
        self.layout_delta != 0
    }
}

/// Index-keyed cache of measured item heights.
#[derive(Debug, Clone)]
pub struct HeightCache {
    heights: BTreeMap<usize, u32>,
    default_height: u32,
    /// Signed sum of `current - default` over measured items.
    estimate_delta: i64,
}

impl HeightCache {
    /// Create an empty cache with the given fallback estimate.
    #[must_use]
    pub fn new(default_height: u32) -> Self {
        Self {
            heights: BTreeMap::new(),
            default_height,
            estimate_delta: 0,
        }
    }

    /// Fallback height for unmeasured items.
    #[must_use]
    pub fn default_height(&self) -> u32 {
        self.default_height
    }

    /// Measured height, if the item was ever measured.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<u32> {
        self.heights.get(&index).copied()
    }

    /// Height used for layout: measured, or the default estimate.
    #[inline]
    #[must_use]
    pub fn height_or_default(&self, index: usize) -> u32 {
        self.get(index).unwrap_or(self.default_height)
    }

    /// Whether the item has a measured height.
    #[must_use]
    pub fn is_measured(&self, index: usize) -> bool {
        self.heights.contains_key(&index)
    }

    /// Number of measured items.
    #[must_use]
    pub fn measured_count(&self) -> usize {
        self.heights.len()
    }

    /// Store a measurement, overwriting any previous one.
    pub fn record(&mut self, index: usize, height: u32) -> Measurement {
        let previous = self.heights.insert(index, height);
        let basis = previous.unwrap_or(self.default_height);
        let layout_delta = i64::from(height) - i64::from(basis);
        self.estimate_delta += layout_delta;
        Measurement {
            index,
            height,
            previous,
            layout_delta,
        }
    }

    /// Signed total of measured heights against the default.
    #[must_use]
    pub fn estimate_delta(&self) -> i64 {
        self.estimate_delta
    }

    /// Estimated total height of `len` items.
    #[must_use]
    pub fn estimated_total(&self, len: usize) -> u64 {
        let base = (len as u64).saturating_mul(u64::from(self.default_height));
        base.saturating_add_signed(self.estimate_delta)
    }

    /// Sum of layout heights over `range`, using the default for gaps.
    ///
    /// Cost is O(log n + measured entries inside the range).
    #[must_use]
    pub fn sum_range(&self, range: Range<usize>) -> u64 {
        if range.start >= range.end {
            return 0;
        }
        let span = (range.end - range.start) as u64;
        let (measured, sum) = self
            .heights
            .range(range)
            .fold((0u64, 0u64), |(n, s), (_, &h)| (n + 1, s + u64::from(h)));
        sum + (span - measured) * u64::from(self.default_height)
    }

    /// Re-key every entry by `+n` after `n` items were inserted at the front.
    pub fn shift(&mut self, n: usize) {
        if n == 0 || self.heights.is_empty() {
            return;
        }
        let old = std::mem::take(&mut self.heights);
        self.heights = old.into_iter().map(|(i, h)| (i + n, h)).collect();
    }

    /// Iterate over measured `(index, height)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.heights.iter().map(|(&i, &h)| (i, h))
    }

    /// Drop every measurement.
    pub fn clear(&mut self) {
        self.heights.clear();
        self.estimate_delta = 0;
    }
}

impl Default for HeightCache {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_ITEM_HEIGHT)
    }
}
