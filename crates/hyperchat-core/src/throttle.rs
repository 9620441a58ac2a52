#![forbid(unsafe_code)]

//! Trailing-edge throttling for scroll samples.
//!
//! Hosts fire scroll notifications far more often than it is useful to
//! recompute the visible range. [`ScrollThrottle`] coalesces a burst of
//! samples into one recomputation per interval:
//!
//! - The first sample after an idle period arms a deadline `interval` ahead.
//! - Further samples before the deadline replace the pending one (latest wins).
//! - At the deadline the most recent sample is released.
//!
//! Because the released sample is always the latest one seen, the settled
//! scroll position at the end of a burst is never lost.
//!
//! Time is passed in explicitly so the throttle stays deterministic under
//! test and can be driven by any event loop.
//!
//! # Usage
//!
//! ```
//! use hyperchat_core::throttle::ScrollThrottle;
//! use hyperchat_core::event::ScrollSample;
//! use web_time::{Duration, Instant};
//!
//! let mut throttle = ScrollThrottle::new(Duration::from_millis(16));
//! let t0 = Instant::now();
//!
//! throttle.push(ScrollSample::new(10, 400), t0);
//! throttle.push(ScrollSample::new(40, 400), t0 + Duration::from_millis(5));
//! assert!(throttle.poll(t0 + Duration::from_millis(8)).is_none());
//!
//! let released = throttle.poll(t0 + Duration::from_millis(16)).unwrap();
//! assert_eq!(released.scroll_top, 40);
//! ```

use crate::event::ScrollSample;
use web_time::{Duration, Instant};

/// Coalesces scroll samples into at most one release per interval.
///
/// # Thread Safety
///
/// `ScrollThrottle` is not thread-safe. It should be used from the single
/// event processing thread that owns the list.
///
/// # Performance
///
/// All operations are O(1); at most one sample is held.
#[derive(Debug, Clone)]
pub struct ScrollThrottle {
    interval: Duration,
    /// Latest sample not yet released.
    pending: Option<ScrollSample>,
    /// When the pending sample becomes due.
    deadline: Option<Instant>,
    /// Samples replaced before release, for diagnostics.
    coalesced: u64,
}

impl ScrollThrottle {
    /// Create a throttle with the given coalescing interval.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: None,
            deadline: None,
            coalesced: 0,
        }
    }

    /// Create a throttle from a millisecond interval.
    #[must_use]
    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// The coalescing interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Record a sample observed at `now`.
    ///
    /// Arms the deadline if the throttle was idle; otherwise the sample
    /// replaces the pending one and the deadline is left untouched.
    pub fn push(&mut self, sample: ScrollSample, now: Instant) {
        if self.pending.replace(sample).is_some() {
            self.coalesced = self.coalesced.saturating_add(1);
        }
        if self.deadline.is_none() {
            self.deadline = Some(now + self.interval);
        }
    }

    /// Release the pending sample if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<ScrollSample> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                let sample = self.pending.take();
                #[cfg(feature = "tracing")]
                if let Some(s) = &sample {
                    tracing::trace!(
                        scroll_top = s.scroll_top,
                        viewport_height = s.viewport_height,
                        coalesced = self.coalesced,
                        "scroll throttle released"
                    );
                }
                sample
            }
            _ => None,
        }
    }

    /// Release the pending sample immediately, ignoring the deadline.
    pub fn flush(&mut self) -> Option<ScrollSample> {
        self.deadline = None;
        self.pending.take()
    }

    /// When the pending sample becomes due, if any.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether a sample is waiting for its deadline.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Number of samples replaced before they were released.
    #[must_use]
    pub fn coalesced_count(&self) -> u64 {
        self.coalesced
    }

    /// Drop the pending sample and disarm the deadline.
    ///
    /// Called on teardown so no callback fires against a dead list.
    pub fn cancel(&mut self) {
        self.pending = None;
        self.deadline = None;
    }
}
