#![forbid(unsafe_code)]

//! Core: viewport geometry, list events, and scroll throttling.
//!
//! # Role in hyperchat
//! `hyperchat-core` is the input layer. It owns the vocabulary the layout host
//! uses to talk to the list engine: viewport metrics, scroll samples, item
//! measurements and sentinel visibility changes.
//!
//! # Primary responsibilities
//! - **Viewport**: scroll position plus visible height, with edge distances.
//! - **ListEvent**: canonical host events consumed by the runtime.
//! - **ScrollThrottle**: trailing-edge coalescing of scroll samples.
//!
//! # How it fits in the system
//! The runtime (`hyperchat-runtime`) feeds `ListEvent` values into a session
//! that drives the virtualization engine in `hyperchat-widgets`. Nothing in
//! this crate holds list state.

pub mod event;
pub mod geometry;
pub mod throttle;

pub use event::{AppendOrigin, ListEvent, ScrollSample};
pub use geometry::{Edge, Viewport};
pub use throttle::ScrollThrottle;
