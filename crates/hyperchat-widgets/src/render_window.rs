#![forbid(unsafe_code)]

//! Materialization of the visible range into absolutely positioned items.
//!
//! Only items inside the visible range are mounted. Each gets its computed
//! top offset and current height hint. An item at index > 0 whose offset is
//! still 0 has no real position yet; it is mounted (so it can be measured)
//! but flagged [`Placement::hidden`] so the host does not flash it at the top.
//!
//! A range longer than the configured cap means the range computation went
//! wrong. The window then refuses to mount anything and reports
//! [`WindowFrame::Degraded`] instead of flooding the host.

use crate::height_cache::HeightCache;
use crate::offsets::OffsetCache;
use crate::visible_range::VisibleRange;

/// One mounted item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Index in the full list.
    pub index: usize,
    /// Absolute top offset inside the inner container.
    pub top: u64,
    /// Measured height, or the default estimate.
    pub height: u32,
    /// Whether `height` is a measurement.
    pub measured: bool,
    /// Mount but do not show.
    pub hidden: bool,
}

/// Output of one materialization pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowFrame {
    /// The list is empty.
    Empty,
    /// Items to mount, in index order.
    Mounted {
        /// Placements for the visible range.
        placements: Vec<Placement>,
        /// Height of the scrollable inner container.
        inner_height: u64,
    },
    /// The range exceeded the cap; nothing is mounted.
    Degraded {
        /// Items the range asked for.
        requested: usize,
        /// Configured cap.
        cap: usize,
    },
}

impl WindowFrame {
    /// Mounted placements, empty unless [`WindowFrame::Mounted`].
    #[must_use]
    pub fn placements(&self) -> &[Placement] {
        match self {
            Self::Mounted { placements, .. } => placements,
            _ => &[],
        }
    }

    /// Whether this frame is degraded.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

/// Builds [`WindowFrame`]s under a mount cap.
#[derive(Debug, Clone)]
pub struct RenderWindow {
    max_items: usize,
    degraded_frames: u64,
}

impl RenderWindow {
    /// Create a window mounting at most `max_items` items.
    #[must_use]
    pub fn new(max_items: usize) -> Self {
        Self {
            max_items,
            degraded_frames: 0,
        }
    }

    /// Mount cap.
    #[must_use]
    pub fn max_items(&self) -> usize {
        self.max_items
    }

    /// Frames rejected by the cap so far.
    #[must_use]
    pub fn degraded_frames(&self) -> u64 {
        self.degraded_frames
    }

    /// Position every item in `range`.
    pub fn materialize(
        &mut self,
        range: Option<VisibleRange>,
        inner_height: u64,
        heights: &HeightCache,
        offsets: &mut OffsetCache,
    ) -> WindowFrame {
        let Some(range) = range else {
            return WindowFrame::Empty;
        };

        let requested = range.len();
        if requested > self.max_items {
            self.degraded_frames += 1;
            #[cfg(feature = "tracing")]
            tracing::warn!(
                requested,
                cap = self.max_items,
                first = range.first,
                last = range.last,
                "render window exceeds item cap; degrading"
            );
            return WindowFrame::Degraded {
                requested,
                cap: self.max_items,
            };
        }

        let placements = range
            .indices()
            .map(|index| {
                let top = offsets.offset_of(index, heights, range.first);
                Placement {
                    index,
                    top,
                    height: heights.height_or_default(index),
                    measured: heights.is_measured(index),
                    hidden: index > 0 && top == 0,
                }
            })
            .collect();

        WindowFrame::Mounted {
            placements,
            inner_height,
        }
    }
}

impl Default for RenderWindow {
    fn default() -> Self {
        Self::new(5000)
    }
}
