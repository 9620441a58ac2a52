#![forbid(unsafe_code)]

//! Load-more trigger with single-flight de-duplication.
//!
//! A sentinel sits `margin` pixels inside one edge of the scrollable area
//! (the top, for chat history). The trigger is edge-triggered: it reports a
//! crossing only when the viewport moves *into* the margin, never while it
//! stays there.
//!
//! A crossing is a request, not a fetch. [`LoadMoreTrigger::try_begin`]
//! issues a [`LoadTicket`] only from [`LoadState::Idle`], so at most one fetch
//! is in flight no matter how often the sentinel fires.
//!
//! # State machine
//!
//! ```text
//!            try_begin                begin_reconcile
//!   Idle ───────────────▶ Loading ─────────────────────▶ Reconciling
//!    ▲                      │                                  │
//!    │        fail / stale  │                                  │ finish
//!    └──────────────────────┴──────────────────────────────────┘
//! ```
//!
//! # Stale completions
//!
//! A ticket remembers the trigger generation and the id of the list head when
//! it was issued. [`LoadMoreTrigger::invalidate`] (list reset) bumps the
//! generation. A completion whose generation or head no longer matches is
//! rejected before any cache is re-keyed.

use std::fmt;

use hyperchat_core::Edge;

/// Phase of the load-more cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadState {
    /// No fetch outstanding.
    #[default]
    Idle,
    /// A fetch was issued and has not completed.
    Loading,
    /// The fetch completed and the list is re-keying its caches.
    Reconciling,
}

/// Proof that a fetch was issued; required to apply its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket<Id> {
    generation: u64,
    head: Option<Id>,
}

impl<Id> LoadTicket<Id> {
    /// Trigger generation at issue time.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Id of the item at index 0 at issue time.
    #[must_use]
    pub fn head(&self) -> Option<&Id> {
        self.head.as_ref()
    }
}

/// Failure reported by a data source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The source could not produce items.
    Unavailable(String),
    /// The request was dropped before it produced a result.
    Cancelled,
}

impl FetchError {
    /// Convenience constructor for [`FetchError::Unavailable`].
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(reason) => write!(f, "data source unavailable: {reason}"),
            Self::Cancelled => write!(f, "fetch cancelled"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Why a load completion was not applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// No fetch is outstanding.
    NotInFlight,
    /// The list was reset after the ticket was issued.
    Stale {
        /// Generation on the ticket.
        issued: u64,
        /// Current generation.
        current: u64,
    },
    /// The item at index 0 changed while the fetch was in flight.
    HeadChanged,
    /// The fetch itself failed.
    Fetch(FetchError),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInFlight => write!(f, "no load in flight"),
            Self::Stale { issued, current } => {
                write!(f, "stale load ticket (generation {issued}, now {current})")
            }
            Self::HeadChanged => write!(f, "list head changed during load"),
            Self::Fetch(e) => write!(f, "fetch failed: {e}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Fetch(e) => Some(e),
            _ => None,
        }
    }
}

/// Edge-triggered, single-flight load-more trigger.
#[derive(Debug, Clone)]
pub struct LoadMoreTrigger<Id> {
    margin: u64,
    edge: Edge,
    state: LoadState,
    generation: u64,
    /// Whether the viewport is currently inside the margin.
    inside: bool,
    requests: u64,
    suppressed: u64,
    _id: std::marker::PhantomData<fn() -> Id>,
}

impl<Id: Clone + PartialEq> LoadMoreTrigger<Id> {
    /// Create a trigger for `edge`, armed within `margin` pixels of it.
    #[must_use]
    pub fn new(edge: Edge, margin: u64) -> Self {
        Self {
            margin,
            edge,
            state: LoadState::Idle,
            generation: 0,
            inside: false,
            requests: 0,
            suppressed: 0,
            _id: std::marker::PhantomData,
        }
    }

    /// Watched edge.
    #[must_use]
    pub fn edge(&self) -> Edge {
        self.edge
    }

    /// Arming distance.
    #[must_use]
    pub fn margin(&self) -> u64 {
        self.margin
    }

    /// Current phase.
    #[must_use]
    pub fn state(&self) -> LoadState {
        self.state
    }

    /// Whether a fetch is outstanding or being reconciled.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.state != LoadState::Idle
    }

    /// Current generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Tickets issued over the trigger's lifetime.
    #[must_use]
    pub fn requests_issued(&self) -> u64 {
        self.requests
    }

    /// Requests refused because a fetch was already outstanding.
    #[must_use]
    pub fn suppressed_count(&self) -> u64 {
        self.suppressed
    }

    /// Feed the viewport's distance to the watched edge.
    ///
    /// Returns `true` on the transition into the margin.
    pub fn observe(&mut self, distance: u64) -> bool {
        self.sentinel_visibility(distance <= self.margin)
    }

    /// Feed a host-reported sentinel visibility.
    ///
    /// Returns `true` on the transition from hidden to visible.
    pub fn sentinel_visibility(&mut self, visible: bool) -> bool {
        let crossed = visible && !self.inside;
        self.inside = visible;
        crossed
    }

    /// Issue a ticket if no fetch is outstanding.
    pub fn try_begin(&mut self, head: Option<Id>) -> Option<LoadTicket<Id>> {
        if self.state != LoadState::Idle {
            self.suppressed += 1;
            return None;
        }
        self.state = LoadState::Loading;
        self.requests += 1;
        Some(LoadTicket {
            generation: self.generation,
            head,
        })
    }

    fn check_generation(&self, ticket: &LoadTicket<Id>) -> Result<(), LoadError> {
        if ticket.generation != self.generation {
            return Err(LoadError::Stale {
                issued: ticket.generation,
                current: self.generation,
            });
        }
        if self.state != LoadState::Loading {
            return Err(LoadError::NotInFlight);
        }
        Ok(())
    }

    /// Validate a completed fetch and enter [`LoadState::Reconciling`].
    ///
    /// On a head mismatch the trigger re-arms like [`fail`](Self::fail).
    pub fn begin_reconcile(
        &mut self,
        ticket: &LoadTicket<Id>,
        current_head: Option<&Id>,
    ) -> Result<(), LoadError> {
        self.check_generation(ticket)?;
        if ticket.head.as_ref() != current_head {
            self.rearm();
            return Err(LoadError::HeadChanged);
        }
        self.state = LoadState::Reconciling;
        Ok(())
    }

    /// Leave [`LoadState::Reconciling`].
    ///
    /// The sentinel is considered hidden again, so a viewport still inside
    /// the margin fires on its next observation.
    pub fn finish(&mut self) {
        if self.state == LoadState::Reconciling {
            self.rearm();
        }
    }

    /// Record a failed fetch and re-arm.
    ///
    /// As with [`finish`](Self::finish), a viewport still inside the margin
    /// fires again on its next observation.
    pub fn fail(&mut self, ticket: &LoadTicket<Id>) -> Result<(), LoadError> {
        self.check_generation(ticket)?;
        self.rearm();
        Ok(())
    }

    /// Orphan every outstanding ticket and re-arm.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.rearm();
    }

    fn rearm(&mut self) {
        self.state = LoadState::Idle;
        self.inside = false;
    }
}
