#![forbid(unsafe_code)]

//! hyperchat Runtime
//!
//! This crate binds the virtualization engine to a message history and a
//! layout host.
//!
//! # Key Components
//!
//! - [`ChatSession`] - Owns the list, its data source and the scroll throttle
//! - [`DataSource`] - Trait for paged message history
//! - [`FakeMessageSource`] - Deterministic generated history for demos and tests
//! - [`ChatConfig`] - TOML/JSON-loadable configuration
//! - [`CancellationSource`] - Teardown signal for host scroll listeners
//!
//! # Role in hyperchat
//! `hyperchat-runtime` is the orchestrator. It consumes [`ListEvent`]s from
//! the host, throttles scroll samples, drives `VirtualMessageList`, polls
//! fetches, and hands frames and scroll commands back.
//!
//! # How it fits in the system
//! Input vocabulary lives in `hyperchat-core`, list state in
//! `hyperchat-widgets`. This crate adds the loop, I/O seam, configuration and
//! logging setup on top.
//!
//! [`ListEvent`]: hyperchat_core::ListEvent

pub mod cancellation;
pub mod config;
pub mod data_source;
pub mod fake;
pub mod logging;
pub mod message;
pub mod session;

pub use cancellation::{CancellationSource, CancellationToken};
pub use config::{CONFIG_ENV, ChatConfig, ConfigError, ListPolicyConfig, LogPolicyConfig};
pub use data_source::{DataSource, FetchFuture};
pub use fake::FakeMessageSource;
#[cfg(feature = "logging")]
pub use logging::LoggingError;
pub use logging::{LOG_ENV, LogFormat};
pub use message::{Message, MessageId};
pub use session::{ChatSession, SessionError, TickReport};
