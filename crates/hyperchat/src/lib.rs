#![forbid(unsafe_code)]

//! hyperchat public facade crate.
//!
//! This crate provides the stable surface area for users. It re-exports the
//! common types from the internal crates and offers a lightweight prelude.
//!
//! ```
//! use hyperchat::prelude::*;
//!
//! let mut session = ChatSession::new(ListConfig::default(), FakeMessageSource::new(1));
//! let cmd = session.mount(400).unwrap();
//! assert_eq!(cmd.target, 5 * 130 - 400);
//! ```

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use hyperchat_core::{AppendOrigin, Edge, ListEvent, ScrollSample, ScrollThrottle, Viewport};

// --- Widgets re-exports ----------------------------------------------------

pub use hyperchat_widgets::{
    FetchError, ListConfig, ListItem, LoadError, LoadState, MeasureOutcome, Placement,
    ScrollBehavior, ScrollCommand, VirtualMessageList, VisibleRange, WindowFrame,
};

// --- Runtime re-exports ----------------------------------------------------

#[cfg(feature = "runtime")]
pub use hyperchat_runtime::{
    ChatConfig, ChatSession, ConfigError, DataSource, FakeMessageSource, FetchFuture, LogFormat,
    Message, MessageId, SessionError, TickReport,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for hyperchat apps.
#[derive(Debug)]
pub enum Error {
    /// Loading a fetched page failed.
    Load(LoadError),
    /// A session operation failed.
    #[cfg(feature = "runtime")]
    Session(SessionError),
    /// Configuration could not be loaded.
    #[cfg(feature = "runtime")]
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load(err) => write!(f, "{err}"),
            #[cfg(feature = "runtime")]
            Self::Session(err) => write!(f, "{err}"),
            #[cfg(feature = "runtime")]
            Self::Config(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Load(err) => Some(err),
            #[cfg(feature = "runtime")]
            Self::Session(err) => Some(err),
            #[cfg(feature = "runtime")]
            Self::Config(err) => Some(err),
        }
    }
}

impl From<LoadError> for Error {
    fn from(err: LoadError) -> Self {
        Self::Load(err)
    }
}

#[cfg(feature = "runtime")]
impl From<SessionError> for Error {
    fn from(err: SessionError) -> Self {
        Self::Session(err)
    }
}

#[cfg(feature = "runtime")]
impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

/// Standard result type for hyperchat APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        AppendOrigin, Error, ListConfig, ListEvent, ListItem, Result, ScrollCommand, ScrollSample,
        VirtualMessageList, WindowFrame,
    };

    #[cfg(feature = "runtime")]
    pub use crate::{ChatSession, DataSource, FakeMessageSource, Message};

    pub use crate::{core, widgets};

    #[cfg(feature = "runtime")]
    pub use crate::runtime;
}

pub use hyperchat_core as core;
#[cfg(feature = "runtime")]
pub use hyperchat_runtime as runtime;
pub use hyperchat_widgets as widgets;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_converts_and_displays() {
        let err: Error = LoadError::HeadChanged.into();
        assert_eq!(err.to_string(), "list head changed during load");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[cfg(feature = "runtime")]
    #[test]
    fn session_error_converts() {
        let err: Error = SessionError::TornDown.into();
        assert!(matches!(err, Error::Session(SessionError::TornDown)));
        assert_eq!(err.to_string(), "session torn down");
    }
}
