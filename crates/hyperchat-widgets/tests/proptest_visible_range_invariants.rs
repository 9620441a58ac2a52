//! Property-based invariant tests for the visible range tracker.
//!
//! 1. The range is clamped: first <= last < len.
//! 2. The first item spans scroll_top (when scroll_top is inside the content).
//! 3. The last item starts above the bottom edge and reaches it, unless it is
//!    the final item.
//! 4. Repeating an update with identical inputs yields the same range and
//!    walks nothing.
//! 5. The walk is bounded by the items crossed, not by the list length.

use hyperchat_core::Viewport;
use hyperchat_widgets::{HeightCache, OffsetCache, VisibleRangeTracker};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn measured(heights: &[u32], default: u32) -> HeightCache {
    let mut cache = HeightCache::new(default);
    for (i, &h) in heights.iter().enumerate() {
        cache.record(i, h);
    }
    cache
}

fn prefix(cache: &HeightCache, i: usize) -> u64 {
    cache.sum_range(0..i)
}

fn scenario() -> impl Strategy<Value = (Vec<u32>, Vec<u64>, u32)> {
    (
        proptest::collection::vec(1u32..=300, 1..=150),
        proptest::collection::vec(0u64..=60_000, 1..=30),
        1u32..=900,
    )
}

// ═════════════════════════════════════════════════════════════════════════
// 1–3. Clamping and edge coverage
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn range_covers_viewport((hs, tops, vh) in scenario()) {
        let len = hs.len();
        let heights = measured(&hs, 100);
        let mut offsets = OffsetCache::new();
        let mut tracker = VisibleRangeTracker::new();
        let total = prefix(&heights, len);

        for top in tops {
            let vp = Viewport::new(top, vh);
            let range = tracker.update_range(vp, len, &heights, &mut offsets).unwrap();
            prop_assert!(range.first <= range.last);
            prop_assert!(range.last < len);

            let first_top = prefix(&heights, range.first);
            let first_end = first_top + u64::from(heights.height_or_default(range.first));
            if top < total {
                prop_assert!(first_top <= top && top < first_end,
                    "first {} spans {}..{} but scroll_top is {}", range.first, first_top, first_end, top);
            } else {
                prop_assert_eq!(range.first, len - 1);
            }

            let last_top = prefix(&heights, range.last);
            let last_end = last_top + u64::from(heights.height_or_default(range.last));
            if range.last > range.first {
                prop_assert!(last_top < vp.bottom());
            }
            prop_assert!(range.last == len - 1 || last_end >= vp.bottom());
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Idempotence
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn repeated_update_is_idempotent((hs, tops, vh) in scenario()) {
        let len = hs.len();
        let heights = measured(&hs, 100);
        let mut offsets = OffsetCache::new();
        let mut tracker = VisibleRangeTracker::new();

        for top in tops {
            let vp = Viewport::new(top, vh);
            let a = tracker.update_range(vp, len, &heights, &mut offsets);
            let b = tracker.update_range(vp, len, &heights, &mut offsets);
            prop_assert_eq!(a, b);
            prop_assert_eq!(tracker.last_walk(), 0);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Walk cost
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn walk_bounded_by_items_crossed(h in 1u32..=200, from in 0u64..=20_000, to in 0u64..=20_000, vh in 1u32..=800) {
        let len = 100_000;
        let heights = HeightCache::new(h);
        let mut offsets = OffsetCache::new();
        let mut tracker = VisibleRangeTracker::new();

        let a = tracker.update_range(Viewport::new(from, vh), len, &heights, &mut offsets).unwrap();
        let b = tracker.update_range(Viewport::new(to, vh), len, &heights, &mut offsets).unwrap();

        let crossed = a.first.abs_diff(b.first) + a.last.abs_diff(b.last);
        // Each edge may overshoot by one step before stopping.
        prop_assert!(tracker.last_walk() <= crossed + 2 * (b.len() + a.len()));
        prop_assert!(tracker.last_walk() < len / 2);
    }
}
