#![forbid(unsafe_code)]

//! Scroll anchoring across list mutations.
//!
//! Content changes under a viewport in three ways, each with its own rule:
//!
//! | Mutation | Viewport was at the bottom | Viewport was elsewhere |
//! |----------|----------------------------|------------------------|
//! | Append (remote) | follow the tail, smooth | hold position |
//! | Append (local) | follow the tail, smooth | jump to the tail, instant |
//! | Prepend `n` items | shift down by their estimated height | same |
//! | Height correction, item starts above the viewport | stay pinned to the bottom | shift by the delta |
//! | Height correction, item starts in or below the viewport | stay pinned to the bottom | hold position |
//!
//! An item that starts above `scroll_top` (every item before the first
//! visible one, and the first visible one itself when it is cut off) grows
//! or shrinks upward on screen: shifting the viewport by the same amount
//! keeps everything after it at the same on-screen position.
//!
//! The controller only decides; the list applies the new `scroll_top` to its
//! own viewport model and hands the returned [`ScrollCommand`] to the layout
//! host.

use hyperchat_core::{AppendOrigin, Viewport};

/// How the host should move to a scroll target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrollBehavior {
    /// Jump in one frame.
    Instant,
    /// Animate.
    Smooth,
}

/// A scroll position the layout host must apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScrollCommand {
    /// Target `scroll_top`.
    pub target: u64,
    /// How to get there.
    pub behavior: ScrollBehavior,
}

impl ScrollCommand {
    /// Jump to `target`.
    #[must_use]
    pub const fn instant(target: u64) -> Self {
        Self {
            target,
            behavior: ScrollBehavior::Instant,
        }
    }

    /// Animate to `target`.
    #[must_use]
    pub const fn smooth(target: u64) -> Self {
        Self {
            target,
            behavior: ScrollBehavior::Smooth,
        }
    }
}

/// What an append should do to the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendPlan {
    /// Reset the range to the tail and scroll to the bottom.
    FollowTail(ScrollBehavior),
    /// Leave the viewport where it is.
    Hold,
}

/// Decides scroll compensation for list mutations.
#[derive(Debug, Clone, Copy)]
pub struct ScrollAnchor {
    stick_threshold: u64,
}

impl ScrollAnchor {
    /// Create an anchor treating `stick_threshold` pixels from the bottom as
    /// "at the bottom".
    #[must_use]
    pub const fn new(stick_threshold: u64) -> Self {
        Self { stick_threshold }
    }

    /// Distance from the bottom still treated as "at the bottom".
    #[must_use]
    pub const fn stick_threshold(&self) -> u64 {
        self.stick_threshold
    }

    /// Whether `viewport` is pinned to the bottom of `content_height`.
    #[must_use]
    pub fn is_near_bottom(&self, viewport: Viewport, content_height: u64) -> bool {
        viewport.distance_to_bottom(content_height) <= self.stick_threshold
    }

    /// Decide what an append does, given the viewport *before* the append.
    #[must_use]
    pub fn plan_append(
        &self,
        viewport: Viewport,
        content_before: u64,
        origin: AppendOrigin,
    ) -> AppendPlan {
        if self.is_near_bottom(viewport, content_before) {
            AppendPlan::FollowTail(ScrollBehavior::Smooth)
        } else if origin == AppendOrigin::Local {
            AppendPlan::FollowTail(ScrollBehavior::Instant)
        } else {
            AppendPlan::Hold
        }
    }

    /// Scroll to the bottom of `content_after` with `behavior`.
    pub fn follow_tail(
        &self,
        viewport: &mut Viewport,
        content_after: u64,
        behavior: ScrollBehavior,
    ) -> ScrollCommand {
        viewport.scroll_top = viewport.max_scroll_top(content_after);
        ScrollCommand {
            target: viewport.scroll_top,
            behavior,
        }
    }

    /// Compensate for `inserted_height` pixels inserted above the content.
    pub fn compensate_prepend(&self, viewport: &mut Viewport, inserted_height: u64) -> ScrollCommand {
        viewport.scroll_top = viewport.scroll_top.saturating_add(inserted_height);
        ScrollCommand::instant(viewport.scroll_top)
    }

    /// Compensate for an item starting at `item_top` changing layout height
    /// by `delta`.
    ///
    /// `was_pinned` is whether the viewport sat at the bottom before the
    /// change, and `content_after` the scrollable height after it.
    pub fn compensate_correction(
        &self,
        viewport: &mut Viewport,
        item_top: u64,
        delta: i64,
        was_pinned: bool,
        content_after: u64,
    ) -> Option<ScrollCommand> {
        let target = if was_pinned {
            viewport.max_scroll_top(content_after)
        } else if item_top < viewport.scroll_top {
            viewport.scroll_top.saturating_add_signed(delta)
        } else {
            return None;
        };
        if target == viewport.scroll_top {
            return None;
        }
        viewport.scroll_top = target;
        Some(ScrollCommand::instant(target))
    }
}

impl Default for ScrollAnchor {
    fn default() -> Self {
        Self::new(40)
    }
}
