#![forbid(unsafe_code)]

//! The data-source seam between a chat session and its message history.
//!
//! A source hands out the initial page synchronously and older pages as
//! futures. The session never performs I/O itself; it polls the returned
//! future on each tick and applies the batch when it resolves.

use futures::future::LocalBoxFuture;
use hyperchat_widgets::FetchError;

/// Pending result of [`DataSource::fetch_older`].
pub type FetchFuture<T> = LocalBoxFuture<'static, Result<Vec<T>, FetchError>>;

/// Supplies message history to a session.
pub trait DataSource<T> {
    /// Newest page, oldest first, shown on mount.
    fn initial_items(&mut self) -> Vec<T>;

    /// The page immediately older than everything handed out so far,
    /// oldest first. An empty batch means the history is exhausted.
    fn fetch_older(&mut self) -> FetchFuture<T>;
}

impl<T, D: DataSource<T> + ?Sized> DataSource<T> for Box<D> {
    fn initial_items(&mut self) -> Vec<T> {
        (**self).initial_items()
    }

    fn fetch_older(&mut self) -> FetchFuture<T> {
        (**self).fetch_older()
    }
}
