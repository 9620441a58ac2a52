#![forbid(unsafe_code)]

//! The chat session loop.
//!
//! [`ChatSession`] owns a [`VirtualMessageList`], its [`DataSource`] and the
//! scroll throttle, and turns host events into list operations:
//!
//! ```text
//!   host ──ListEvent──▶ handle() ──▶ list / throttle
//!   host ──────now────▶ tick()   ──▶ throttle release ─▶ update_range ─▶ edge check
//!                                └─▶ poll in-flight fetch ─▶ complete_load
//!   host ◀──ScrollCommand / WindowFrame──
//! ```
//!
//! Everything runs on the caller's thread. The only asynchronous piece is the
//! fetch future returned by [`DataSource::fetch_older`]; `tick` polls it with a
//! no-op waker, so a tick never blocks. Hosts with a real executor simply call
//! `tick` again when their waker fires.
//!
//! # Lifecycle
//!
//! 1. [`ChatSession::new`] pulls the initial page.
//! 2. [`ChatSession::mount`] attaches the viewport and pins it to the bottom.
//! 3. `handle`/`tick` run until [`ChatSession::teardown`].
//!
//! After teardown every operation returns [`SessionError::TornDown`] and the
//! [`CancellationToken`] from [`ChatSession::subscription`] reports cancelled,
//! so host listeners can detach.

use std::fmt;
use std::task::{Context, Poll};

use futures::FutureExt;
use hyperchat_core::{AppendOrigin, ListEvent, ScrollThrottle};
use hyperchat_widgets::{
    FetchError, ListConfig, ListItem, LoadError, LoadTicket, MeasureOutcome, ScrollCommand,
    VirtualMessageList, VisibleRange, WindowFrame,
};
use web_time::Instant;

use crate::cancellation::{CancellationSource, CancellationToken};
use crate::data_source::{DataSource, FetchFuture};

const TARGET: &str = "hyperchat.session";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors surfaced by a [`ChatSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The data source failed; the trigger is re-armed.
    Fetch(FetchError),
    /// A completed fetch could not be applied.
    Load(LoadError),
    /// The session was torn down.
    TornDown,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(e) => write!(f, "fetch failed: {e}"),
            Self::Load(e) => write!(f, "load rejected: {e}"),
            Self::TornDown => write!(f, "session torn down"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Fetch(e) => Some(e),
            Self::Load(e) => Some(e),
            Self::TornDown => None,
        }
    }
}

impl From<LoadError> for SessionError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::Fetch(e) => Self::Fetch(e),
            other => Self::Load(other),
        }
    }
}

// ---------------------------------------------------------------------------
// Tick report
// ---------------------------------------------------------------------------

/// What a [`ChatSession::tick`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// The recomputed range, if a throttled scroll sample was released.
    pub range: Option<VisibleRange>,
    /// Scrolls the host must apply, in order.
    pub commands: Vec<ScrollCommand>,
    /// Items prepended by a completed fetch.
    pub loaded: usize,
    /// Whether a new fetch was issued during this tick.
    pub fetch_started: bool,
}

impl TickReport {
    /// Whether the tick changed anything the host must react to.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.range.is_none() && self.commands.is_empty() && self.loaded == 0 && !self.fetch_started
    }
}

// ---------------------------------------------------------------------------
// ChatSession
// ---------------------------------------------------------------------------

struct InFlight<T: ListItem> {
    ticket: LoadTicket<T::Id>,
    future: FetchFuture<T>,
}

/// A mounted message list bound to its history source.
pub struct ChatSession<T: ListItem, D: DataSource<T>> {
    list: VirtualMessageList<T>,
    source: D,
    throttle: ScrollThrottle,
    in_flight: Option<InFlight<T>>,
    subscription: CancellationSource,
    exhausted: bool,
}

impl<T: ListItem, D: DataSource<T>> fmt::Debug for ChatSession<T, D>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatSession")
            .field("list", &self.list)
            .field("throttle", &self.throttle)
            .field("in_flight", &self.in_flight.is_some())
            .field("subscription", &self.subscription)
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}

impl<T: ListItem, D: DataSource<T>> ChatSession<T, D> {
    /// Create a session and load the source's initial page.
    pub fn new(config: ListConfig, mut source: D) -> Self {
        let throttle = ScrollThrottle::from_millis(config.scroll_throttle_ms);
        let items = source.initial_items();
        tracing::debug!(target: TARGET, initial = items.len(), "chat session created");
        Self {
            list: VirtualMessageList::with_items(config, items),
            source,
            throttle,
            in_flight: None,
            subscription: CancellationSource::new(),
            exhausted: false,
        }
    }

    /// The underlying list.
    #[must_use]
    pub fn list(&self) -> &VirtualMessageList<T> {
        &self.list
    }

    /// The history source.
    #[must_use]
    pub fn source(&self) -> &D {
        &self.source
    }

    /// Mutable access to the history source.
    pub fn source_mut(&mut self) -> &mut D {
        &mut self.source
    }

    /// Token host listeners watch to detach on teardown.
    #[must_use]
    pub fn subscription(&self) -> CancellationToken {
        self.subscription.token()
    }

    /// Whether [`teardown`](Self::teardown) has run.
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.subscription.is_cancelled()
    }

    /// Whether a fetch is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Whether the source reported the end of its history.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// When the host should call [`tick`](Self::tick) next to release a
    /// throttled scroll sample.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.throttle.next_deadline()
    }

    fn ensure_live(&self) -> Result<(), SessionError> {
        if self.is_torn_down() {
            Err(SessionError::TornDown)
        } else {
            Ok(())
        }
    }

    /// Attach a viewport of `viewport_height` and pin it to the bottom.
    pub fn mount(&mut self, viewport_height: u32) -> Result<ScrollCommand, SessionError> {
        self.ensure_live()?;
        let command = self.list.mount(viewport_height);
        tracing::info!(
            target: TARGET,
            viewport_height,
            len = self.list.len(),
            scroll_top = command.target,
            "chat session mounted"
        );
        Ok(command)
    }

    /// Apply one host event.
    ///
    /// Scroll samples are queued in the throttle and take effect on a later
    /// [`tick`](Self::tick); every other event applies immediately.
    pub fn handle(
        &mut self,
        event: ListEvent,
        now: Instant,
    ) -> Result<Option<ScrollCommand>, SessionError> {
        self.ensure_live()?;
        match event {
            ListEvent::Scroll(sample) => {
                self.throttle.push(sample, now);
                Ok(None)
            }
            ListEvent::Resize { height } => Ok(self.list.resize(height)),
            ListEvent::Measured { index, height } => {
                match self.list.record_measurement(index, height) {
                    MeasureOutcome::Applied { command, .. } => Ok(command),
                    MeasureOutcome::Deferred | MeasureOutcome::Ignored => Ok(None),
                }
            }
            ListEvent::SentinelVisibility(visible) => {
                if self.list.sentinel_visibility(visible) {
                    self.start_fetch();
                }
                Ok(None)
            }
        }
    }

    /// Advance the session to `now`.
    ///
    /// Releases a due scroll sample, checks the load-more edge, and polls the
    /// in-flight fetch. A failed fetch is returned as
    /// [`SessionError::Fetch`]; the trigger is re-armed and any scroll left
    /// behind by deferred measurements is reported on the next tick.
    pub fn tick(&mut self, now: Instant) -> Result<TickReport, SessionError> {
        self.ensure_live()?;
        let _span = tracing::debug_span!(
            target: TARGET,
            "session.tick",
            len = self.list.len(),
            loading = self.in_flight.is_some(),
        )
        .entered();

        let mut report = TickReport::default();
        if let Some(sample) = self.throttle.poll(now) {
            report.range = self.list.update_range(sample);
            if self.list.observe_edge() {
                report.fetch_started = self.start_fetch();
            }
        }

        self.poll_fetch(&mut report)?;

        if let Some(command) = self.list.take_pending_command() {
            report.commands.push(command);
        }
        Ok(report)
    }

    /// Explicitly request older history (a "load more" button).
    ///
    /// Goes through the same trigger as the sentinel, so it is a no-op while
    /// a fetch is in flight. Returns whether a fetch was started.
    pub fn request_older(&mut self) -> Result<bool, SessionError> {
        self.ensure_live()?;
        Ok(self.start_fetch())
    }

    /// Append newly arrived or locally sent messages.
    pub fn push_new(
        &mut self,
        items: impl IntoIterator<Item = T>,
        origin: AppendOrigin,
    ) -> Result<Option<ScrollCommand>, SessionError> {
        self.ensure_live()?;
        let before = self.list.len();
        let command = self.list.append(items, origin);
        tracing::debug!(
            target: TARGET,
            appended = self.list.len() - before,
            ?origin,
            follow = command.is_some(),
            "messages appended"
        );
        Ok(command)
    }

    /// Switch to another conversation.
    ///
    /// Drops the in-flight fetch and any throttled scroll, replaces every
    /// item with `source`'s initial page and pins the viewport to the bottom.
    pub fn reset(&mut self, mut source: D) -> Result<ScrollCommand, SessionError> {
        self.ensure_live()?;
        if self.in_flight.take().is_some() {
            tracing::debug!(target: TARGET, "in-flight fetch discarded by reset");
        }
        self.throttle.cancel();
        let items = source.initial_items();
        self.source = source;
        self.exhausted = false;
        let command = self.list.reset(items);
        tracing::info!(target: TARGET, len = self.list.len(), "chat session reset");
        Ok(command)
    }

    /// Detach from the host.
    ///
    /// Cancels the scroll subscription, disarms the throttle and discards the
    /// in-flight fetch. Calling it again is a no-op.
    pub fn teardown(&mut self) {
        if !self.subscription.cancel() {
            return;
        }
        self.throttle.cancel();
        let dropped_fetch = self.in_flight.take().is_some();
        tracing::info!(target: TARGET, dropped_fetch, "chat session torn down");
    }

    /// Materialize the current window for rendering.
    pub fn frame(&mut self) -> Result<WindowFrame, SessionError> {
        self.ensure_live()?;
        Ok(self.list.frame())
    }

    fn start_fetch(&mut self) -> bool {
        if self.exhausted {
            tracing::debug!(target: TARGET, "history exhausted; load-more skipped");
            return false;
        }
        let Some(ticket) = self.list.begin_load() else {
            return false;
        };
        tracing::info!(
            target: TARGET,
            generation = ticket.generation(),
            "fetching older messages"
        );
        let future = self.source.fetch_older();
        self.in_flight = Some(InFlight { ticket, future });
        true
    }

    fn poll_fetch(&mut self, report: &mut TickReport) -> Result<(), SessionError> {
        let Some(in_flight) = self.in_flight.as_mut() else {
            return Ok(());
        };
        let mut cx = Context::from_waker(futures::task::noop_waker_ref());
        let result = match in_flight.future.poll_unpin(&mut cx) {
            Poll::Pending => return Ok(()),
            Poll::Ready(result) => result,
        };
        let Some(InFlight { ticket, .. }) = self.in_flight.take() else {
            return Ok(());
        };

        match self.list.complete_load(&ticket, result) {
            Ok(outcome) => {
                report.loaded = outcome.inserted;
                report.commands.extend(outcome.command);
                if outcome.inserted == 0 {
                    self.exhausted = true;
                }
                tracing::info!(
                    target: TARGET,
                    inserted = outcome.inserted,
                    len = self.list.len(),
                    exhausted = self.exhausted,
                    "older messages loaded"
                );
                Ok(())
            }
            Err(err) => {
                tracing::warn!(target: TARGET, error = %err, "load-more did not apply");
                Err(err.into())
            }
        }
    }
}
