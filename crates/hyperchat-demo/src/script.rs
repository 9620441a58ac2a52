//! The scripted session: mount, scroll back through the whole history,
//! receive new messages while reading, then send one.

use hyperchat::{
    AppendOrigin, ChatConfig, ChatSession, FakeMessageSource, ListEvent, SessionError,
};
use web_time::{Duration, Instant};

use crate::error::Result;
use crate::host::{HostStats, SimulatedHost};

/// Upper bound on scroll steps, in case a history never ends.
const MAX_STEPS: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOptions {
    pub seed: u64,
    pub pages: usize,
    pub viewport_height: u32,
    pub incoming: usize,
}

impl Default for ScriptOptions {
    fn default() -> Self {
        Self {
            seed: 1,
            pages: 3,
            viewport_height: 600,
            incoming: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoSummary {
    pub items: usize,
    pub loaded: usize,
    pub fetches: u64,
    pub suppressed: u64,
    pub fetch_errors: u64,
    pub steps: usize,
    pub exhausted: bool,
    pub pinned_at_end: bool,
    pub inner_height: u64,
    pub final_scroll_top: u64,
    pub host: HostStats,
}

impl DemoSummary {
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "items": self.items,
            "loaded": self.loaded,
            "fetches": self.fetches,
            "suppressed": self.suppressed,
            "fetch_errors": self.fetch_errors,
            "steps": self.steps,
            "exhausted": self.exhausted,
            "pinned_at_end": self.pinned_at_end,
            "inner_height": self.inner_height,
            "final_scroll_top": self.final_scroll_top,
            "host": {
                "frames": self.host.frames,
                "measured": self.host.measured,
                "degraded_frames": self.host.degraded_frames,
                "instant_scrolls": self.host.instant_scrolls,
                "smooth_scrolls": self.host.smooth_scrolls,
                "max_mounted": self.host.max_mounted,
            },
        })
    }
}

pub fn run_script(config: &ChatConfig, opts: &ScriptOptions) -> Result<DemoSummary> {
    let source = FakeMessageSource::new(opts.seed).with_history_pages(opts.pages);
    let mut session = ChatSession::new(config.to_list_config(), source);
    let mut host = SimulatedHost::new(opts.viewport_height);
    let step = Duration::from_millis(config.list.scroll_throttle_ms.max(1));
    let mut now = Instant::now();
    let mut loaded = 0;
    let mut fetch_errors = 0;

    host.apply(session.mount(opts.viewport_height)?);
    host.render(&mut session, now)?;

    // Scroll toward the oldest message half a viewport at a time.
    let mut steps = 0;
    while !(session.is_exhausted() && host.scroll_top() == 0) && steps < MAX_STEPS {
        steps += 1;
        let target = host
            .scroll_top()
            .saturating_sub(u64::from(opts.viewport_height / 2).max(1));
        host.scroll_to(target);
        session.handle(ListEvent::Scroll(host.sample()), now)?;
        now += step;

        match session.tick(now) {
            Ok(report) => {
                loaded += report.loaded;
                for command in report.commands {
                    host.apply(command);
                }
            }
            Err(SessionError::Fetch(err)) => {
                fetch_errors += 1;
                tracing::warn!(error = %err, "fetch failed; will retry from the top");
            }
            Err(err) => return Err(err.into()),
        }
        host.render(&mut session, now)?;

        // Already inside the margin: the sentinel will not fire again, so
        // press the load-more button.
        if host.scroll_top() == 0 && !session.is_loading() && !session.is_exhausted() {
            session.request_older()?;
        }
    }
    tracing::info!(
        steps,
        loaded,
        len = session.list().len(),
        "reached the start of the history"
    );

    // New messages while reading history keep the viewport where it is.
    for _ in 0..opts.incoming {
        let message = session.source_mut().incoming();
        if let Some(command) = session.push_new([message], AppendOrigin::Remote)? {
            host.apply(command);
        }
        host.render(&mut session, now)?;
    }

    // Our own message jumps to the bottom.
    let mine = session.source_mut().local("hello from the demo");
    if let Some(command) = session.push_new([mine], AppendOrigin::Local)? {
        host.apply(command);
    }
    host.render(&mut session, now)?;

    let summary = DemoSummary {
        items: session.list().len(),
        loaded,
        fetches: session.list().load_requests(),
        suppressed: session.list().suppressed_loads(),
        fetch_errors,
        steps,
        exhausted: session.is_exhausted(),
        pinned_at_end: session.list().is_near_bottom(),
        inner_height: session.list().inner_height(),
        final_scroll_top: host.scroll_top(),
        host: host.stats().clone(),
    };
    session.teardown();
    Ok(summary)
}
