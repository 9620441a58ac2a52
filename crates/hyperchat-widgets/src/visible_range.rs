#![forbid(unsafe_code)]

//! Incremental visible-range tracking.
//!
//! [`VisibleRangeTracker`] keeps the inclusive index range of items that
//! intersect the viewport. Each update starts from the previous range and
//! walks item heights toward the new scroll position, so the cost is
//! proportional to the distance scrolled, not to the length of the list.
//!
//! # Walking rules
//!
//! - **First index, scrolled up**: step backward, accumulating the heights of
//!   preceding items until the accumulated height covers the shortfall
//!   between the old first item's top and the new `scroll_top`. The item
//!   that completes the cover is the new first item.
//! - **First index, scrolled down**: step forward while the current first item
//!   ends at or above `scroll_top`.
//! - **Last index**: the same walk against `scroll_top + viewport_height`; an
//!   item starting exactly at the bottom edge is not visible.
//!
//! Indices are clamped to `[0, len - 1]` and `first <= last` always holds.

use std::ops::RangeInclusive;

use hyperchat_core::Viewport;

use crate::height_cache::HeightCache;
use crate::offsets::OffsetCache;

/// Inclusive range of item indices intersecting the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisibleRange {
    /// First visible index.
    pub first: usize,
    /// Last visible index (inclusive).
    pub last: usize,
}

impl VisibleRange {
    /// Create a range; `last` is raised to `first` if needed.
    #[must_use]
    pub fn new(first: usize, last: usize) -> Self {
        Self {
            first,
            last: last.max(first),
        }
    }

    /// Number of indices in the range.
    #[must_use]
    pub fn len(&self) -> usize {
        self.last - self.first + 1
    }

    /// Always false; a range holds at least one index.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether `index` is inside the range.
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        (self.first..=self.last).contains(&index)
    }

    /// Iterate the indices in the range.
    #[must_use]
    pub fn indices(&self) -> RangeInclusive<usize> {
        self.first..=self.last
    }

    /// Range moved by `n` indices toward the end.
    #[must_use]
    pub fn shifted(&self, n: usize) -> Self {
        Self::new(self.first + n, self.last + n)
    }
}

/// Tracks the visible range across scroll updates.
#[derive(Debug, Clone, Default)]
pub struct VisibleRangeTracker {
    range: Option<VisibleRange>,
    /// Items stepped over by the last update, for diagnostics.
    last_walk: usize,
}

impl VisibleRangeTracker {
    /// Create a tracker with no range.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current range, if any.
    #[must_use]
    pub fn range(&self) -> Option<VisibleRange> {
        self.range
    }

    /// First visible index, or 0 with no range.
    #[must_use]
    pub fn first_visible(&self) -> usize {
        self.range.map_or(0, |r| r.first)
    }

    /// Items stepped over during the last update.
    #[must_use]
    pub fn last_walk(&self) -> usize {
        self.last_walk
    }

    /// Recompute the range for `viewport` over a list of `len` items.
    pub fn update_range(
        &mut self,
        viewport: Viewport,
        len: usize,
        heights: &HeightCache,
        offsets: &mut OffsetCache,
    ) -> Option<VisibleRange> {
        if len == 0 {
            self.range = None;
            self.last_walk = 0;
            return None;
        }
        let max_index = len - 1;
        let prev = self.range.unwrap_or(VisibleRange::new(0, 0));
        let mut walked = 0usize;

        // First index against the top edge.
        let mut first = prev.first.min(max_index);
        let mut top = offsets.offset_of(first, heights, first);
        let scroll_top = viewport.scroll_top;

        if scroll_top < top {
            let shortfall = top - scroll_top;
            let mut covered = 0u64;
            while first > 0 && covered < shortfall {
                first -= 1;
                covered += u64::from(heights.height_or_default(first));
                walked += 1;
            }
            top = top.saturating_sub(covered);
        } else {
            loop {
                let end = top + u64::from(heights.height_or_default(first));
                if first >= max_index || end > scroll_top {
                    break;
                }
                top = end;
                first += 1;
                walked += 1;
            }
        }
        offsets.remember(first, top);

        // Last index against the bottom edge.
        let bottom = viewport.bottom();
        let mut last = prev.last.clamp(first, max_index);
        let mut last_top = if last == first {
            top
        } else {
            offsets.offset_of(last, heights, first)
        };
        let mut last_end = last_top + u64::from(heights.height_or_default(last));

        if last_end < bottom {
            while last < max_index && last_end < bottom {
                last += 1;
                last_top = last_end;
                last_end += u64::from(heights.height_or_default(last));
                walked += 1;
            }
        } else {
            while last > first && last_top >= bottom {
                last -= 1;
                last_top = last_top.saturating_sub(u64::from(heights.height_or_default(last)));
                walked += 1;
            }
        }
        offsets.remember(last, last_top);

        let range = VisibleRange::new(first, last);
        self.range = Some(range);
        self.last_walk = walked;
        Some(range)
    }

    /// Place the range over the tail of the list for a viewport of `height`.
    ///
    /// Steps backward from the last item until the accumulated height covers
    /// the viewport.
    pub fn reset_to_tail(&mut self, len: usize, height: u32, heights: &HeightCache) {
        if len == 0 {
            self.range = None;
            return;
        }
        let last = len - 1;
        let mut first = last;
        let mut covered = u64::from(heights.height_or_default(last));
        while first > 0 && covered < u64::from(height) {
            first -= 1;
            covered += u64::from(heights.height_or_default(first));
        }
        self.range = Some(VisibleRange::new(first, last));
    }

    /// Move the range by `n` after `n` items were inserted at the front.
    pub fn shift(&mut self, n: usize) {
        self.range = self.range.map(|r| r.shifted(n));
    }

    /// Forget the range.
    pub fn clear(&mut self) {
        self.range = None;
        self.last_walk = 0;
    }
}
