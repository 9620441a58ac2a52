#![forbid(unsafe_code)]

//! Virtualization engine for bidirectionally growing message lists.
//!
//! # Role in hyperchat
//! `hyperchat-widgets` holds every piece of list state: measured heights,
//! memoized offsets, the visible range, scroll anchoring, the load-more
//! trigger and the render window. [`VirtualMessageList`] composes them.
//!
//! # Primary responsibilities
//! - **HeightCache**: lazily measured heights with a default estimate.
//! - **OffsetCache**: memoized top offsets with an exact-prefix frontier.
//! - **VisibleRangeTracker**: incremental range walks proportional to scroll distance.
//! - **ScrollAnchor**: compensation for appends, prepends and height corrections.
//! - **LoadMoreTrigger**: edge-triggered, single-flight requests for older items.
//! - **RenderWindow**: absolute placements under a mount cap.
//!
//! # How it fits in the system
//! The runtime (`hyperchat-runtime`) owns a [`VirtualMessageList`], feeds it
//! throttled host events and fetch results, and forwards the resulting
//! [`WindowFrame`]s and [`ScrollCommand`]s to the layout host.

pub mod anchor;
pub mod config;
pub mod height_cache;
pub mod list;
pub mod load_more;
pub mod offsets;
pub mod render_window;
pub mod visible_range;

pub use anchor::{AppendPlan, ScrollAnchor, ScrollBehavior, ScrollCommand};
pub use config::{DEFAULT_ITEM_HEIGHT, ListConfig};
pub use height_cache::{HeightCache, Measurement};
pub use list::{ListItem, LoadOutcome, MeasureOutcome, VirtualMessageList};
pub use load_more::{FetchError, LoadError, LoadMoreTrigger, LoadState, LoadTicket};
pub use offsets::OffsetCache;
pub use render_window::{Placement, RenderWindow, WindowFrame};
pub use visible_range::{VisibleRange, VisibleRangeTracker};
