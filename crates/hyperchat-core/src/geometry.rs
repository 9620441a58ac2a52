#![forbid(unsafe_code)]

//! Viewport geometry in host pixels.

/// The scrollable viewport as reported by the layout host.
///
/// `scroll_top` is the distance from the top of the scrollable content to the
/// top of the visible area; `height` is the visible area's client height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    /// Scroll offset from the top of the content.
    pub scroll_top: u64,
    /// Visible height.
    pub height: u32,
}

impl Viewport {
    /// Create a new viewport.
    #[inline]
    #[must_use]
    pub const fn new(scroll_top: u64, height: u32) -> Self {
        Self { scroll_top, height }
    }

    /// Bottom edge of the visible area (exclusive).
    #[inline]
    #[must_use]
    pub const fn bottom(&self) -> u64 {
        self.scroll_top.saturating_add(self.height as u64)
    }

    /// Largest valid scroll offset for content of `content_height`.
    #[inline]
    #[must_use]
    pub const fn max_scroll_top(&self, content_height: u64) -> u64 {
        content_height.saturating_sub(self.height as u64)
    }

    /// Pixels between the bottom of the viewport and the end of the content.
    #[inline]
    #[must_use]
    pub const fn distance_to_bottom(&self, content_height: u64) -> u64 {
        content_height.saturating_sub(self.bottom())
    }

    /// Distance from the viewport to the given content edge.
    #[must_use]
    pub const fn distance_to(&self, edge: Edge, content_height: u64) -> u64 {
        match edge {
            Edge::Top => self.scroll_top,
            Edge::Bottom => self.distance_to_bottom(content_height),
        }
    }

    /// Return a copy with `scroll_top` clamped into the valid scroll range.
    #[must_use]
    pub fn clamped(self, content_height: u64) -> Self {
        Self {
            scroll_top: self.scroll_top.min(self.max_scroll_top(content_height)),
            height: self.height,
        }
    }
}

/// An edge of the scrollable content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Edge {
    /// The start of the content (oldest messages in a chat).
    #[default]
    Top,
    /// The end of the content (newest messages in a chat).
    Bottom,
}
