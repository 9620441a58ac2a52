#![forbid(unsafe_code)]

//! The composed virtualized message list.
//!
//! [`VirtualMessageList`] owns the items and every cache, and is the only
//! writer of them. The layout host drives it with scroll samples and
//! measurements and reads back [`WindowFrame`]s and [`ScrollCommand`]s.
//!
//! # Frame flow
//!
//! ```text
//! update_range ─▶ frame ─▶ host mounts ─▶ record_measurement
//!      ▲                                          │
//!      └──── scroll compensation ◀── offsets ◀────┘
//! ```
//!
//! # Loading older items
//!
//! A load is bracketed by [`begin_load`](VirtualMessageList::begin_load) and
//! [`complete_load`](VirtualMessageList::complete_load). In between,
//! measurements are deferred rather than applied, because every index is
//! about to move. The completion prepends the batch in one step and then
//! replays the deferred measurements against the re-keyed caches.
//!
//! # Example
//!
//! ```
//! use hyperchat_widgets::{ListConfig, ListItem, VirtualMessageList};
//!
//! struct Line(u32);
//!
//! impl ListItem for Line {
//!     type Id = u32;
//!     fn id(&self) -> u32 {
//!         self.0
//!     }
//! }
//!
//! let config = ListConfig::default().with_default_item_height(100);
//! let mut list = VirtualMessageList::with_items(config, (0..20).map(Line));
//! let cmd = list.mount(400);
//! assert_eq!(cmd.target, 1600);
//! assert_eq!(list.visible_range().map(|r| r.first), Some(16));
//! ```

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::hash::Hash;

use hyperchat_core::{AppendOrigin, ScrollSample, Viewport};

use crate::anchor::{AppendPlan, ScrollAnchor, ScrollBehavior, ScrollCommand};
use crate::config::ListConfig;
use crate::height_cache::HeightCache;
use crate::load_more::{FetchError, LoadError, LoadMoreTrigger, LoadState, LoadTicket};
use crate::offsets::OffsetCache;
use crate::render_window::{RenderWindow, WindowFrame};
use crate::visible_range::{VisibleRange, VisibleRangeTracker};

/// An item that can live in a [`VirtualMessageList`].
pub trait ListItem {
    /// Stable identity, used to detect head changes during a load.
    type Id: Clone + Eq + Hash + fmt::Debug;

    /// This item's identity.
    fn id(&self) -> Self::Id;
}

/// Result of [`VirtualMessageList::record_measurement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureOutcome {
    /// Stored; `delta` is the layout height change.
    Applied {
        /// Layout height change of the item.
        delta: i64,
        /// Scroll compensation for the host, if any.
        command: Option<ScrollCommand>,
    },
    /// Held until the in-flight load settles.
    Deferred,
    /// Index outside the list.
    Ignored,
}

/// Result of a successful [`VirtualMessageList::complete_load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOutcome {
    /// Items prepended.
    pub inserted: usize,
    /// Final scroll position for the host, if it moved.
    pub command: Option<ScrollCommand>,
}

/// Virtualized, variable-height list that grows at both ends.
#[derive(Debug)]
pub struct VirtualMessageList<T: ListItem> {
    items: VecDeque<T>,
    config: ListConfig,
    heights: HeightCache,
    offsets: OffsetCache,
    tracker: VisibleRangeTracker,
    anchor: ScrollAnchor,
    trigger: LoadMoreTrigger<T::Id>,
    window: RenderWindow,
    viewport: Viewport,
    /// Measurements received while a load was in flight, latest per index.
    deferred: BTreeMap<usize, u32>,
    /// Scroll produced outside a call that could return it.
    pending_command: Option<ScrollCommand>,
}

impl<T: ListItem> VirtualMessageList<T> {
    /// Create an empty list.
    #[must_use]
    pub fn new(config: ListConfig) -> Self {
        Self::with_items(config, Vec::new())
    }

    /// Create a list holding `items`, oldest first.
    #[must_use]
    pub fn with_items(config: ListConfig, items: impl IntoIterator<Item = T>) -> Self {
        Self {
            items: items.into_iter().collect(),
            heights: HeightCache::new(config.default_item_height),
            offsets: OffsetCache::new(),
            tracker: VisibleRangeTracker::new(),
            anchor: ScrollAnchor::new(config.stick_to_bottom_threshold),
            trigger: LoadMoreTrigger::new(config.load_more_edge, config.load_more_margin),
            window: RenderWindow::new(config.max_rendered_items),
            viewport: Viewport::default(),
            deferred: BTreeMap::new(),
            pending_command: None,
            config,
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ListConfig {
        &self.config
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Items, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.items.iter()
    }

    /// Last viewport seen or produced by the list.
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Current visible range.
    #[must_use]
    pub fn visible_range(&self) -> Option<VisibleRange> {
        self.tracker.range()
    }

    /// Height of the scrollable inner container.
    #[must_use]
    pub fn inner_height(&self) -> u64 {
        self.heights.estimated_total(self.items.len())
    }

    /// Measured heights.
    #[must_use]
    pub fn heights(&self) -> &HeightCache {
        &self.heights
    }

    /// Highest index measured in unbroken sequence from zero.
    #[must_use]
    pub fn last_correct_offset_index(&self) -> Option<usize> {
        self.offsets.last_correct_offset_index()
    }

    /// Phase of the load-more cycle.
    #[must_use]
    pub fn load_state(&self) -> LoadState {
        self.trigger.state()
    }

    /// Load tickets issued so far.
    #[must_use]
    pub fn load_requests(&self) -> u64 {
        self.trigger.requests_issued()
    }

    /// Load requests refused because one was already in flight.
    #[must_use]
    pub fn suppressed_loads(&self) -> u64 {
        self.trigger.suppressed_count()
    }

    /// Measurements waiting for the in-flight load.
    #[must_use]
    pub fn deferred_count(&self) -> usize {
        self.deferred.len()
    }

    /// Frames rejected by the render cap so far.
    #[must_use]
    pub fn degraded_frames(&self) -> u64 {
        self.window.degraded_frames()
    }

    /// Whether the viewport is pinned to the bottom.
    #[must_use]
    pub fn is_near_bottom(&self) -> bool {
        self.anchor.is_near_bottom(self.viewport, self.inner_height())
    }

    /// Top offset of `index`, clamped into the list.
    pub fn offset_of(&mut self, index: usize) -> u64 {
        let index = index.min(self.items.len().saturating_sub(1));
        self.offsets
            .offset_of(index, &self.heights, self.tracker.first_visible())
    }

    fn refresh_range(&mut self) -> Option<VisibleRange> {
        self.tracker.update_range(
            self.viewport,
            self.items.len(),
            &self.heights,
            &mut self.offsets,
        )
    }

    /// Attach to a viewport of `viewport_height` and start at the bottom.
    pub fn mount(&mut self, viewport_height: u32) -> ScrollCommand {
        self.viewport.height = viewport_height;
        self.scroll_to_bottom(ScrollBehavior::Instant)
    }

    /// Reset the range to the tail and scroll to the bottom.
    pub fn scroll_to_bottom(&mut self, behavior: ScrollBehavior) -> ScrollCommand {
        self.tracker
            .reset_to_tail(self.items.len(), self.viewport.height, &self.heights);
        let content = self.inner_height();
        let command = self.anchor.follow_tail(&mut self.viewport, content, behavior);
        self.refresh_range();
        command
    }

    /// Recompute the visible range for a host scroll sample.
    pub fn update_range(&mut self, sample: ScrollSample) -> Option<VisibleRange> {
        self.viewport = sample.viewport();
        self.refresh_range()
    }

    /// Apply a new viewport height. A pinned viewport stays pinned.
    pub fn resize(&mut self, height: u32) -> Option<ScrollCommand> {
        let was_pinned = self.is_near_bottom();
        self.viewport.height = height;
        let command = if was_pinned {
            let content = self.inner_height();
            Some(
                self.anchor
                    .follow_tail(&mut self.viewport, content, ScrollBehavior::Instant),
            )
        } else {
            None
        };
        self.refresh_range();
        command
    }

    /// Check the viewport against the load-more margin.
    ///
    /// Returns `true` when the viewport just entered it.
    pub fn observe_edge(&mut self) -> bool {
        let distance = self
            .viewport
            .distance_to(self.trigger.edge(), self.inner_height());
        self.trigger.observe(distance)
    }

    /// Feed a host-reported sentinel visibility.
    pub fn sentinel_visibility(&mut self, visible: bool) -> bool {
        self.trigger.sentinel_visibility(visible)
    }

    /// Start loading older items, unless a load is already in flight.
    pub fn begin_load(&mut self) -> Option<LoadTicket<T::Id>> {
        let head = self.items.front().map(T::id);
        let ticket = self.trigger.try_begin(head);
        #[cfg(feature = "tracing")]
        match &ticket {
            Some(t) => tracing::debug!(generation = t.generation(), "load-more issued"),
            None => tracing::debug!(
                suppressed = self.trigger.suppressed_count(),
                "load-more suppressed; fetch in flight"
            ),
        }
        ticket
    }

    /// Apply the result of the fetch started with `ticket`.
    ///
    /// A batch is prepended in one step. A failure, a stale ticket or a
    /// changed head leaves every cache untouched and re-arms the trigger.
    /// Deferred measurements are replayed unless the ticket was stale; after
    /// a failure the resulting scroll, if any, is available from
    /// [`take_pending_command`](Self::take_pending_command).
    pub fn complete_load(
        &mut self,
        ticket: &LoadTicket<T::Id>,
        result: Result<Vec<T>, FetchError>,
    ) -> Result<LoadOutcome, LoadError> {
        let batch = match result {
            Ok(batch) => batch,
            Err(err) => {
                self.trigger.fail(ticket)?;
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %err, "load-more failed; trigger re-armed");
                self.pending_command = self.replay_deferred();
                return Err(LoadError::Fetch(err));
            }
        };

        let head = self.items.front().map(T::id);
        if let Err(err) = self.trigger.begin_reconcile(ticket, head.as_ref()) {
            #[cfg(feature = "tracing")]
            tracing::debug!(error = %err, "load-more completion rejected");
            if err == LoadError::HeadChanged {
                self.pending_command = self.replay_deferred();
            }
            return Err(err);
        }

        let inserted = batch.len();
        let prepended = self.prepend(batch);
        self.trigger.finish();
        let replayed = self.replay_deferred();
        #[cfg(feature = "tracing")]
        tracing::debug!(inserted, len = self.items.len(), "load-more reconciled");
        Ok(LoadOutcome {
            inserted,
            command: replayed.or(prepended),
        })
    }

    /// Scroll left behind by a rejected or failed load.
    pub fn take_pending_command(&mut self) -> Option<ScrollCommand> {
        self.pending_command.take()
    }

    fn replay_deferred(&mut self) -> Option<ScrollCommand> {
        let mut last = None;
        for (index, height) in std::mem::take(&mut self.deferred) {
            if let MeasureOutcome::Applied {
                command: Some(cmd), ..
            } = self.apply_measurement(index, height)
            {
                last = Some(cmd);
            }
        }
        last
    }

    /// Insert `batch` (oldest first) before the current head.
    ///
    /// Every cache is re-keyed by the batch length and the viewport moves
    /// down by the batch's estimated height, so the items on screen stay put.
    pub fn prepend(&mut self, batch: Vec<T>) -> Option<ScrollCommand> {
        let n = batch.len();
        if n == 0 {
            return None;
        }
        for item in batch.into_iter().rev() {
            self.items.push_front(item);
        }
        let inserted_height = (n as u64).saturating_mul(u64::from(self.heights.default_height()));
        self.heights.shift(n);
        self.offsets.shift(n, inserted_height);
        self.tracker.shift(n);
        self.deferred = std::mem::take(&mut self.deferred)
            .into_iter()
            .map(|(i, h)| (i + n, h))
            .collect();
        let command = self.anchor.compensate_prepend(&mut self.viewport, inserted_height);
        self.refresh_range();
        Some(command)
    }

    /// Add `items` after the current tail.
    pub fn append(
        &mut self,
        items: impl IntoIterator<Item = T>,
        origin: AppendOrigin,
    ) -> Option<ScrollCommand> {
        let before = self.items.len();
        let content_before = self.inner_height();
        self.items.extend(items);
        if self.items.len() == before {
            return None;
        }
        match self.anchor.plan_append(self.viewport, content_before, origin) {
            AppendPlan::FollowTail(behavior) => Some(self.scroll_to_bottom(behavior)),
            AppendPlan::Hold => {
                self.refresh_range();
                None
            }
        }
    }

    /// Record the measured height of the item at `index`.
    pub fn record_measurement(&mut self, index: usize, height: u32) -> MeasureOutcome {
        if index >= self.items.len() {
            #[cfg(feature = "tracing")]
            tracing::debug!(index, len = self.items.len(), "measurement out of range ignored");
            return MeasureOutcome::Ignored;
        }
        if self.trigger.is_busy() {
            self.deferred.insert(index, height);
            return MeasureOutcome::Deferred;
        }
        self.apply_measurement(index, height)
    }

    fn apply_measurement(&mut self, index: usize, height: u32) -> MeasureOutcome {
        if index >= self.items.len() {
            return MeasureOutcome::Ignored;
        }
        let was_pinned = self.is_near_bottom();
        let measurement = self.heights.record(index, height);
        self.offsets.on_measured(&measurement);
        if !measurement.changed_layout() {
            return MeasureOutcome::Applied {
                delta: 0,
                command: None,
            };
        }
        // Only predecessors contribute, so this is unaffected by the new height.
        let item_top = self.offset_of(index);
        let content = self.inner_height();
        let command = self.anchor.compensate_correction(
            &mut self.viewport,
            item_top,
            measurement.layout_delta,
            was_pinned,
            content,
        );
        self.refresh_range();
        MeasureOutcome::Applied {
            delta: measurement.layout_delta,
            command,
        }
    }

    /// Replace every item, discard all caches and start at the bottom.
    ///
    /// Outstanding load tickets become stale.
    pub fn reset(&mut self, items: impl IntoIterator<Item = T>) -> ScrollCommand {
        self.items = items.into_iter().collect();
        self.heights.clear();
        self.offsets.clear();
        self.tracker.clear();
        self.trigger.invalidate();
        self.deferred.clear();
        self.pending_command = None;
        self.viewport.scroll_top = 0;
        self.mount(self.viewport.height)
    }

    /// Materialize the current visible range.
    pub fn frame(&mut self) -> WindowFrame {
        let inner_height = self.inner_height();
        self.window.materialize(
            self.tracker.range(),
            inner_height,
            &self.heights,
            &mut self.offsets,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Msg(u32);

    impl ListItem for Msg {
        type Id = u32;
        fn id(&self) -> u32 {
            self.0
        }
    }

    fn msgs(range: std::ops::Range<u32>) -> Vec<Msg> {
        range.map(Msg).collect()
    }

    fn list(len: u32, default_height: u32) -> VirtualMessageList<Msg> {
        let config = ListConfig::default().with_default_item_height(default_height);
        VirtualMessageList::with_items(config, msgs(0..len))
    }

    #[test]
    fn mount_starts_at_bottom() {
        let mut l = list(20, 130);
        let cmd = l.mount(400);
        assert_eq!(cmd, ScrollCommand::instant(2200));
        assert_eq!(l.visible_range(), Some(VisibleRange::new(16, 19)));
        assert!(l.is_near_bottom());
    }

    #[test]
    fn first_measurement_moves_offsets_and_grows_container() {
        let mut l = list(3, 130);
        assert_eq!(l.offset_of(0), 0);
        assert_eq!(l.offset_of(1), 130);
        assert_eq!(l.offset_of(2), 260);
        let before = l.inner_height();

        let outcome = l.record_measurement(0, 200);
        assert_eq!(
            outcome,
            MeasureOutcome::Applied {
                delta: 70,
                command: None
            }
        );
        assert_eq!(l.offset_of(1), 200);
        assert_eq!(l.inner_height(), before + 70);
    }

    #[test]
    fn out_of_range_measurement_is_ignored() {
        let mut l = list(3, 130);
        assert_eq!(l.record_measurement(3, 50), MeasureOutcome::Ignored);
        assert_eq!(l.heights().measured_count(), 0);
    }

    #[test]
    fn offset_of_clamps_index() {
        let mut l = list(3, 100);
        assert_eq!(l.offset_of(99), 200);
    }

    #[test]
    fn single_load_in_flight() {
        let mut l = list(10, 100);
        l.mount(300);
        assert!(l.begin_load().is_some());
        assert!(l.begin_load().is_none());
        assert!(l.begin_load().is_none());
        assert_eq!(l.load_requests(), 1);
        assert_eq!(l.suppressed_loads(), 2);
    }

    #[test]
    fn deferred_measurements_replay_after_prepend() {
        let mut l = list(10, 100);
        l.mount(300);
        assert_eq!(l.viewport().scroll_top, 700);

        let ticket = l.begin_load().unwrap();
        assert_eq!(l.record_measurement(8, 150), MeasureOutcome::Deferred);
        assert_eq!(l.deferred_count(), 1);

        let outcome = l.complete_load(&ticket, Ok(msgs(100..102))).unwrap();
        assert_eq!(outcome.inserted, 2);
        assert_eq!(l.len(), 12);
        assert_eq!(l.get(0), Some(&Msg(100)));
        assert_eq!(l.heights().get(10), Some(150));
        assert_eq!(l.deferred_count(), 0);
        // Prepend moved to 900; the replayed item is at the pinned bottom.
        assert_eq!(outcome.command, Some(ScrollCommand::instant(950)));
        assert_eq!(l.load_state(), LoadState::Idle);
    }

    #[test]
    fn failed_load_rearms_without_rekeying() {
        let mut l = list(10, 100);
        l.mount(300);
        let ticket = l.begin_load().unwrap();
        let err = l
            .complete_load(&ticket, Err(FetchError::unavailable("offline")))
            .unwrap_err();
        assert!(matches!(err, LoadError::Fetch(_)));
        assert_eq!(l.len(), 10);
        assert_eq!(l.viewport().scroll_top, 700);
        assert_eq!(l.load_state(), LoadState::Idle);
        assert!(l.begin_load().is_some());
    }

    #[test]
    fn failed_load_replays_deferred_unshifted() {
        let mut l = list(10, 100);
        l.mount(300);
        let ticket = l.begin_load().unwrap();
        l.record_measurement(9, 160);
        let _ = l.complete_load(&ticket, Err(FetchError::Cancelled));
        assert_eq!(l.heights().get(9), Some(160));
        assert_eq!(l.take_pending_command(), Some(ScrollCommand::instant(760)));
        assert_eq!(l.take_pending_command(), None);
    }

    #[test]
    fn completion_after_reset_is_stale() {
        let mut l = list(10, 100);
        l.mount(300);
        let ticket = l.begin_load().unwrap();
        l.reset(msgs(50..55));
        let err = l.complete_load(&ticket, Ok(msgs(100..103))).unwrap_err();
        assert!(matches!(err, LoadError::Stale { .. }));
        assert_eq!(l.len(), 5);
        assert_eq!(l.get(0), Some(&Msg(50)));
    }

    #[test]
    fn completion_after_head_change_is_rejected() {
        let mut l = list(10, 100);
        l.mount(300);
        let ticket = l.begin_load().unwrap();
        l.prepend(vec![Msg(99)]);
        let err = l.complete_load(&ticket, Ok(msgs(100..103))).unwrap_err();
        assert_eq!(err, LoadError::HeadChanged);
        assert_eq!(l.len(), 11);
        assert_eq!(l.load_state(), LoadState::Idle);
    }

    #[test]
    fn prepend_rekeys_caches() {
        let mut l = list(10, 100);
        l.mount(300);
        l.update_range(ScrollSample::new(0, 300));
        l.record_measurement(0, 200);

        let cmd = l.prepend(msgs(100..103));
        assert_eq!(cmd, Some(ScrollCommand::instant(300)));
        assert_eq!(l.heights().get(0), None);
        assert_eq!(l.heights().get(3), Some(200));
        assert_eq!(l.offset_of(0), 0);
        assert_eq!(l.offset_of(3), 300);
        assert_eq!(l.offset_of(4), 500);
        assert_eq!(l.last_correct_offset_index(), None);
        assert_eq!(l.visible_range(), Some(VisibleRange::new(3, 4)));
    }

    #[test]
    fn empty_prepend_is_noop() {
        let mut l = list(4, 100);
        assert_eq!(l.prepend(Vec::new()), None);
        assert_eq!(l.len(), 4);
    }

    #[test]
    fn append_at_bottom_follows_smoothly() {
        let mut l = list(10, 100);
        l.mount(300);
        let cmd = l.append(msgs(10..12), AppendOrigin::Remote);
        assert_eq!(cmd, Some(ScrollCommand::smooth(900)));
        assert_eq!(l.visible_range().map(|r| r.last), Some(11));
    }

    #[test]
    fn remote_append_away_from_bottom_holds() {
        let mut l = list(10, 100);
        l.mount(300);
        l.update_range(ScrollSample::new(200, 300));
        let range = l.visible_range();
        assert_eq!(l.append(msgs(10..12), AppendOrigin::Remote), None);
        assert_eq!(l.viewport().scroll_top, 200);
        assert_eq!(l.visible_range(), range);
    }

    #[test]
    fn local_append_away_from_bottom_jumps() {
        let mut l = list(10, 100);
        l.mount(300);
        l.update_range(ScrollSample::new(200, 300));
        let cmd = l.append(msgs(10..11), AppendOrigin::Local);
        assert_eq!(cmd, Some(ScrollCommand::instant(800)));
    }

    #[test]
    fn correction_above_anchor_keeps_anchor_in_place() {
        let mut l = list(50, 100);
        l.mount(400);
        l.update_range(ScrollSample::new(1000, 400));
        assert_eq!(l.visible_range().map(|r| r.first), Some(10));

        let outcome = l.record_measurement(3, 170);
        assert_eq!(
            outcome,
            MeasureOutcome::Applied {
                delta: 70,
                command: Some(ScrollCommand::instant(1070))
            }
        );
        assert_eq!(l.visible_range().map(|r| r.first), Some(10));
        assert_eq!(l.offset_of(10), 1070);
    }

    #[test]
    fn resize_keeps_pinned_viewport_at_bottom() {
        let mut l = list(10, 100);
        l.mount(300);
        let cmd = l.resize(500);
        assert_eq!(cmd, Some(ScrollCommand::instant(500)));
        assert!(l.is_near_bottom());
    }

    #[test]
    fn frame_mounts_visible_items() {
        let mut l = list(20, 100);
        l.mount(400);
        let frame = l.frame();
        let indices: Vec<_> = frame.placements().iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![16, 17, 18, 19]);
    }

    #[test]
    fn frame_degrades_past_cap() {
        let config = ListConfig::default()
            .with_default_item_height(100)
            .with_max_rendered_items(2);
        let mut l = VirtualMessageList::with_items(config, msgs(0..20));
        l.mount(400);
        assert_eq!(
            l.frame(),
            WindowFrame::Degraded {
                requested: 4,
                cap: 2
            }
        );
        assert_eq!(l.degraded_frames(), 1);
    }

    #[test]
    fn empty_list_frame_is_empty() {
        let mut l: VirtualMessageList<Msg> = VirtualMessageList::new(ListConfig::default());
        l.mount(400);
        assert_eq!(l.frame(), WindowFrame::Empty);
    }

    #[test]
    fn observe_edge_fires_near_top() {
        let mut l = list(50, 100);
        l.mount(400);
        assert!(!l.observe_edge());
        l.update_range(ScrollSample::new(150, 400));
        assert!(l.observe_edge());
        l.update_range(ScrollSample::new(100, 400));
        assert!(!l.observe_edge());
    }
}
