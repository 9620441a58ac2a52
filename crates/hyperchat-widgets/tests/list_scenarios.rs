//! End-to-end scenarios for `VirtualMessageList`.

use hyperchat_core::{AppendOrigin, ScrollSample, Viewport};
use hyperchat_widgets::{
    FetchError, HeightCache, ListConfig, ListItem, LoadError, LoadState, MeasureOutcome,
    OffsetCache, ScrollBehavior, ScrollCommand, VirtualMessageList, VisibleRange,
    VisibleRangeTracker, WindowFrame,
};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Bubble {
    id: u64,
}

impl ListItem for Bubble {
    type Id = u64;
    fn id(&self) -> u64 {
        self.id
    }
}

fn bubbles(ids: std::ops::Range<u64>) -> Vec<Bubble> {
    ids.map(|id| Bubble { id }).collect()
}

fn chat(len: u64, default_height: u32, viewport: u32) -> VirtualMessageList<Bubble> {
    let config = ListConfig::default().with_default_item_height(default_height);
    let mut list = VirtualMessageList::with_items(config, bubbles(1000..1000 + len));
    list.mount(viewport);
    list
}

#[test]
fn three_unmeasured_items_then_first_measured_at_200() {
    let config = ListConfig::default();
    let mut list = VirtualMessageList::with_items(config, bubbles(0..3));
    assert_eq!(list.offset_of(0), 0);
    assert_eq!(list.offset_of(1), 130);
    assert_eq!(list.offset_of(2), 260);
    assert_eq!(list.inner_height(), 390);

    list.record_measurement(0, 200);

    assert_eq!(list.offset_of(1), 200);
    assert_eq!(list.offset_of(2), 330);
    assert_eq!(list.inner_height(), 460);
    assert_eq!(list.last_correct_offset_index(), Some(0));
}

#[test]
fn remeasure_moves_container_by_the_difference() {
    let mut list = VirtualMessageList::with_items(ListConfig::default(), bubbles(0..3));
    list.record_measurement(0, 200);
    list.record_measurement(0, 240);
    assert_eq!(list.inner_height(), 500);
    assert_eq!(list.inner_height(), list.heights().sum_range(0..3));
    assert_eq!(list.offset_of(1), 240);
}

#[test]
fn append_after_tail_grows_lands_inside_viewport() {
    let mut list = chat(10, 100, 300);
    list.record_measurement(9, 100);
    list.record_measurement(9, 400);
    assert_eq!(list.inner_height(), 1300);
    assert!(list.is_near_bottom());
    assert_eq!(list.viewport().scroll_top, 1000);

    let cmd = list.append(bubbles(5000..5001), AppendOrigin::Remote);

    assert_eq!(cmd, Some(ScrollCommand::smooth(1100)));
    let new_top = list.offset_of(10);
    assert_eq!(new_top, 1300);
    assert!(new_top + 100 <= list.viewport().bottom());
    assert_eq!(list.visible_range().map(|r| r.last), Some(10));
}

#[test]
fn correction_of_cut_off_first_item_keeps_following_items_still() {
    let mut list = chat(30, 100, 400);
    list.update_range(ScrollSample::new(1_050, 400));
    assert_eq!(list.visible_range().map(|r| r.first), Some(10));
    let next_on_screen = list.offset_of(11) - list.viewport().scroll_top;

    let outcome = list.record_measurement(10, 170);

    assert_eq!(
        outcome,
        MeasureOutcome::Applied {
            delta: 70,
            command: Some(ScrollCommand::instant(1_120))
        }
    );
    assert_eq!(list.offset_of(11), 1_170);
    assert_eq!(list.offset_of(11) - list.viewport().scroll_top, next_on_screen);
}

#[test]
fn correction_of_item_on_screen_holds_viewport() {
    let mut list = chat(30, 100, 400);
    list.update_range(ScrollSample::new(1_000, 400));

    let outcome = list.record_measurement(11, 170);

    assert_eq!(
        outcome,
        MeasureOutcome::Applied {
            delta: 70,
            command: None
        }
    );
    assert_eq!(list.viewport().scroll_top, 1_000);
}

#[test]
fn jump_from_top_to_1000_lands_on_index_ten() {
    let heights = HeightCache::new(100);
    let mut offsets = OffsetCache::new();
    let mut tracker = VisibleRangeTracker::new();
    let len = 1_000_000;

    tracker.update_range(Viewport::new(0, 400), len, &heights, &mut offsets);
    let range = tracker
        .update_range(Viewport::new(1000, 400), len, &heights, &mut offsets)
        .unwrap();

    assert_eq!(range.first, 10);
    assert_eq!(range.last, 13);
    assert!(tracker.last_walk() <= 20);
}

#[test]
fn update_range_twice_is_idempotent() {
    let mut list = chat(200, 100, 400);
    for i in 0..200 {
        list.record_measurement(i, 40 + (i as u32 * 37) % 150);
    }
    let sample = ScrollSample::new(3_333, 400);
    let a = list.update_range(sample);
    let b = list.update_range(sample);
    assert_eq!(a, b);
}

#[test]
fn append_while_pinned_scrolls_to_new_bottom() {
    let mut list = chat(30, 100, 500);
    assert!(list.is_near_bottom());

    let cmd = list.append(bubbles(5000..5003), AppendOrigin::Remote);

    assert_eq!(cmd, Some(ScrollCommand::smooth(2800)));
    assert_eq!(list.visible_range().map(|r| r.last), Some(32));
    assert!(list.is_near_bottom());
}

#[test]
fn append_while_reading_history_keeps_anchor() {
    let mut list = chat(30, 100, 500);
    list.update_range(ScrollSample::new(1_200, 500));
    let anchor = list.visible_range().map(|r| r.first);
    let anchor_top = list.offset_of(12);

    let cmd = list.append(bubbles(5000..5010), AppendOrigin::Remote);

    assert_eq!(cmd, None);
    assert_eq!(list.viewport().scroll_top, 1_200);
    assert_eq!(list.visible_range().map(|r| r.first), anchor);
    assert_eq!(list.offset_of(12), anchor_top);
}

#[test]
fn own_message_while_reading_history_jumps_to_it() {
    let mut list = chat(30, 100, 500);
    list.update_range(ScrollSample::new(1_200, 500));
    let cmd = list.append(bubbles(5000..5001), AppendOrigin::Local);
    assert_eq!(
        cmd,
        Some(ScrollCommand {
            target: 2_600,
            behavior: ScrollBehavior::Instant
        })
    );
}

#[test]
fn prepend_rekeys_and_preserves_anchor_position() {
    let mut list = chat(40, 100, 400);
    list.update_range(ScrollSample::new(0, 400));
    for i in 0..4 {
        list.record_measurement(i, 150);
    }
    let anchor_id = list.get(0).map(ListItem::id);
    let heights_before: Vec<_> = list.heights().iter().collect();

    let ticket = list.begin_load().unwrap();
    let outcome = list.complete_load(&ticket, Ok(bubbles(1..6))).unwrap();

    assert_eq!(outcome.inserted, 5);
    assert_eq!(list.viewport().scroll_top, 500);
    assert_eq!(list.offset_of(0), 0);
    assert_eq!(list.last_correct_offset_index(), None);
    assert_eq!(list.get(5).map(ListItem::id), anchor_id);
    let heights_after: Vec<_> = list.heights().iter().collect();
    let expected: Vec<_> = heights_before.iter().map(|&(i, h)| (i + 5, h)).collect();
    assert_eq!(heights_after, expected);
    // The old head still starts where the viewport now begins.
    assert_eq!(list.offset_of(5), list.viewport().scroll_top);
    assert_eq!(list.visible_range().map(|r| r.first), Some(5));
}

#[test]
fn repeated_sentinel_fires_issue_one_fetch() {
    let mut list = chat(40, 100, 400);
    list.update_range(ScrollSample::new(0, 400));

    let mut tickets = Vec::new();
    for visible in [true, false, true, false, true] {
        if list.sentinel_visibility(visible)
            && let Some(ticket) = list.begin_load()
        {
            tickets.push(ticket);
        }
    }

    assert_eq!(tickets.len(), 1);
    assert_eq!(list.load_requests(), 1);
    assert_eq!(list.suppressed_loads(), 2);
    assert_eq!(list.load_state(), LoadState::Loading);
}

#[test]
fn failed_fetch_rearms_trigger() {
    let mut list = chat(40, 100, 400);
    let ticket = list.begin_load().unwrap();
    let err = list
        .complete_load(&ticket, Err(FetchError::unavailable("timeout")))
        .unwrap_err();
    assert_eq!(err, LoadError::Fetch(FetchError::unavailable("timeout")));
    assert_eq!(list.len(), 40);
    assert!(list.begin_load().is_some());
}

#[test]
fn measurements_during_load_are_deferred() {
    let mut list = chat(10, 100, 300);
    let ticket = list.begin_load().unwrap();
    assert_eq!(list.record_measurement(9, 120), MeasureOutcome::Deferred);
    assert_eq!(list.heights().measured_count(), 0);
    list.complete_load(&ticket, Ok(bubbles(0..1))).unwrap();
    assert_eq!(list.heights().get(10), Some(120));
}

#[test]
fn frame_places_items_at_offsets() {
    let mut list = chat(10, 100, 300);
    list.record_measurement(8, 60);
    let frame = list.frame();
    let WindowFrame::Mounted {
        placements,
        inner_height,
    } = frame
    else {
        panic!("expected mounted frame");
    };
    assert_eq!(inner_height, list.inner_height());
    for pair in placements.windows(2) {
        assert_eq!(pair[1].index, pair[0].index + 1);
        assert_eq!(pair[1].top, pair[0].top + u64::from(pair[0].height));
    }
    assert!(placements.iter().all(|p| !p.hidden));
}

#[test]
fn runaway_range_degrades_instead_of_mounting() {
    let config = ListConfig::default()
        .with_default_item_height(1)
        .with_max_rendered_items(100);
    let mut list = VirtualMessageList::with_items(config, bubbles(0..10_000));
    list.mount(5_000);
    let frame = list.frame();
    assert!(frame.is_degraded());
    assert!(frame.placements().is_empty());
    assert_eq!(
        list.visible_range(),
        Some(VisibleRange::new(5_000, 9_999))
    );
}

#[test]
fn completion_after_reset_is_stale() {
    let mut list = chat(20, 100, 400);
    let ticket = list.begin_load().unwrap();
    list.reset(bubbles(500..510));

    let err = list
        .complete_load(&ticket, Ok(bubbles(0..5)))
        .unwrap_err();

    assert_eq!(err, LoadError::Stale { issued: 0, current: 1 });
    assert_eq!(list.len(), 10);
    assert_eq!(list.get(0).map(ListItem::id), Some(500));
    assert_eq!(list.load_state(), LoadState::Idle);
}

#[test]
fn completion_after_head_change_is_rejected() {
    let mut list = chat(20, 100, 400);
    let ticket = list.begin_load().unwrap();
    // A prepend outside the load path moves the head.
    list.prepend(bubbles(900..901));

    let err = list
        .complete_load(&ticket, Ok(bubbles(0..5)))
        .unwrap_err();

    assert_eq!(err, LoadError::HeadChanged);
    assert_eq!(list.len(), 21);
    assert_eq!(list.load_state(), LoadState::Idle);
}
