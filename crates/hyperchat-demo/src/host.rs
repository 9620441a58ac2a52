//! A headless layout host.
//!
//! Stands in for a browser: it owns the scroll position, applies the
//! session's scroll commands, and "lays out" every mounted message by
//! reporting a height derived from its line count.

use hyperchat::{
    ChatSession, DataSource, ListEvent, Message, ScrollBehavior, ScrollCommand, ScrollSample,
    WindowFrame,
};
use web_time::Instant;

use crate::error::Result;

/// Height of one text line.
pub const LINE_HEIGHT: u32 = 22;
/// Author line, padding and margins around a bubble.
pub const BUBBLE_CHROME: u32 = 48;
/// Layout passes per render before giving up on convergence.
const MAX_LAYOUT_PASSES: usize = 8;

/// Laid-out height of a message bubble.
#[must_use]
pub fn bubble_height(message: &Message) -> u32 {
    let lines = u32::try_from(message.line_count()).unwrap_or(u32::MAX);
    BUBBLE_CHROME.saturating_add(LINE_HEIGHT.saturating_mul(lines))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostStats {
    pub frames: u64,
    pub measured: u64,
    pub degraded_frames: u64,
    pub instant_scrolls: u64,
    pub smooth_scrolls: u64,
    pub max_mounted: usize,
}

#[derive(Debug, Clone)]
pub struct SimulatedHost {
    viewport_height: u32,
    scroll_top: u64,
    stats: HostStats,
}

impl SimulatedHost {
    #[must_use]
    pub fn new(viewport_height: u32) -> Self {
        Self {
            viewport_height,
            scroll_top: 0,
            stats: HostStats::default(),
        }
    }

    #[must_use]
    pub fn scroll_top(&self) -> u64 {
        self.scroll_top
    }

    #[must_use]
    pub fn stats(&self) -> &HostStats {
        &self.stats
    }

    /// What the scroll listener would report right now.
    #[must_use]
    pub fn sample(&self) -> ScrollSample {
        ScrollSample::new(self.scroll_top, self.viewport_height)
    }

    /// User scroll to an absolute position.
    pub fn scroll_to(&mut self, scroll_top: u64) {
        self.scroll_top = scroll_top;
    }

    pub fn apply(&mut self, command: ScrollCommand) {
        match command.behavior {
            ScrollBehavior::Instant => self.stats.instant_scrolls += 1,
            ScrollBehavior::Smooth => self.stats.smooth_scrolls += 1,
        }
        self.scroll_top = command.target;
    }

    /// Render the session's current window and report heights for every
    /// mounted message that has not been measured yet.
    ///
    /// Returns the number of measurements delivered.
    pub fn render<D: DataSource<Message>>(
        &mut self,
        session: &mut ChatSession<Message, D>,
        now: Instant,
    ) -> Result<u64> {
        let mut delivered = 0;
        for _ in 0..MAX_LAYOUT_PASSES {
            let frame = session.frame()?;
            self.stats.frames += 1;
            let placements = match &frame {
                WindowFrame::Empty => return Ok(delivered),
                WindowFrame::Degraded { requested, cap } => {
                    self.stats.degraded_frames += 1;
                    tracing::warn!(requested, cap, "window degraded; nothing mounted");
                    return Ok(delivered);
                }
                WindowFrame::Mounted { placements, .. } => placements,
            };
            self.stats.max_mounted = self.stats.max_mounted.max(placements.len());
            tracing::debug!(
                first = placements.first().map(|p| p.index),
                last = placements.last().map(|p| p.index),
                mounted = placements.len(),
                scroll_top = self.scroll_top,
                "frame laid out"
            );

            let pending: Vec<(usize, u32)> = placements
                .iter()
                .filter(|p| !p.measured)
                .filter_map(|p| {
                    session
                        .list()
                        .get(p.index)
                        .map(|m| (p.index, bubble_height(m)))
                })
                .collect();
            if pending.is_empty() {
                break;
            }
            for (index, height) in pending {
                if let Some(command) = session.handle(ListEvent::Measured { index, height }, now)? {
                    self.apply(command);
                }
                delivered += 1;
            }
        }
        self.stats.measured += delivered;
        Ok(delivered)
    }
}
