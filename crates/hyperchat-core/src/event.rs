#![forbid(unsafe_code)]

//! Canonical layout-host events.
//!
//! The layout host (a browser, a terminal renderer, a GPU scene) reports
//! everything the list engine needs through these types. All events derive
//! `Clone`, `PartialEq` and `Eq` for use in tests and pattern matching.
//!
//! # Design Notes
//!
//! - All lengths are host pixels. Terminal hosts use rows as pixels.
//! - `Measured` must be delivered synchronously after the item is laid out,
//!   before the next scroll recomputation.
//! - Sentinel visibility is level-reported by the host; edge detection is the
//!   engine's job.

use crate::geometry::Viewport;

/// Canonical layout-host event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEvent {
    /// The scroll container moved.
    Scroll(ScrollSample),

    /// The viewport changed height (window resize, keyboard shown, ...).
    Resize {
        /// New client height.
        height: u32,
    },

    /// A mounted item finished layout and reported its height.
    Measured {
        /// Index of the item in the full list.
        index: usize,
        /// Measured client height.
        height: u32,
    },

    /// The load-more sentinel entered (`true`) or left (`false`) the
    /// configured margin.
    SentinelVisibility(bool),
}

/// One observation of the scroll container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollSample {
    /// Scroll offset from the top of the content.
    pub scroll_top: u64,
    /// Client height of the scroll container.
    pub viewport_height: u32,
}

impl ScrollSample {
    /// Create a new sample.
    #[must_use]
    pub const fn new(scroll_top: u64, viewport_height: u32) -> Self {
        Self {
            scroll_top,
            viewport_height,
        }
    }

    /// The viewport this sample describes.
    #[must_use]
    pub const fn viewport(&self) -> Viewport {
        Viewport::new(self.scroll_top, self.viewport_height)
    }
}

impl From<Viewport> for ScrollSample {
    fn from(vp: Viewport) -> Self {
        Self::new(vp.scroll_top, vp.height)
    }
}

/// Where appended items came from.
///
/// Decides whether an append may move a viewport the user scrolled away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AppendOrigin {
    /// Items arrived from elsewhere (other participants, live feed).
    #[default]
    Remote,
    /// Items the local user just sent.
    Local,
}
