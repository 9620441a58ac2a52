#![forbid(unsafe_code)]

//! Deterministic fake message history.
//!
//! [`FakeMessageSource`] produces pages of plausible chat messages from a
//! seeded generator, so demos and tests see the same history on every run.
//! Older pages walk backward in time; [`FakeMessageSource::incoming`] produces
//! new messages moving forward.

use futures::FutureExt;
use futures::future;
use hyperchat_widgets::FetchError;
use web_time::{Duration, SystemTime};

use crate::data_source::{DataSource, FetchFuture};
use crate::message::{Message, MessageId};

/// Messages per page.
pub const PAGE_SIZE: usize = 5;

const FIRST_NAMES: &[&str] = &[
    "Ada", "Grace", "Linus", "Margaret", "Dennis", "Barbara", "Ken", "Frances", "Alan", "Radia",
    "Edsger", "Hedy",
];

const LAST_NAMES: &[&str] = &[
    "Lovelace", "Hopper", "Torvalds", "Hamilton", "Ritchie", "Liskov", "Thompson", "Allen",
    "Turing", "Perlman", "Dijkstra", "Lamarr",
];

const WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna", "aliqua", "enim",
    "ad", "minim", "veniam", "quis", "nostrud", "exercitation", "ullamco", "laboris", "nisi",
    "aliquip",
];

/// Seconds since the epoch of the newest initial message.
const EPOCH_OFFSET_SECS: u64 = 1_700_000_000;

/// Ids of the initial page start here and decrease toward older pages.
const FIRST_ID: u64 = 1_000_000;

/// Seeded, deterministic message generator.
#[derive(Debug, Clone)]
pub struct FakeMessageSource {
    state: u64,
    page_size: usize,
    /// Id of the next older message.
    older_id: u64,
    /// Timestamp of the oldest message handed out so far.
    older_time: SystemTime,
    newer_id: u64,
    newer_time: SystemTime,
    pages_left: Option<usize>,
    fail_next: bool,
}

impl FakeMessageSource {
    /// Create a source seeded with `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(EPOCH_OFFSET_SECS);
        Self {
            state: seed ^ 0x9E37_79B9_7F4A_7C15,
            page_size: PAGE_SIZE,
            older_id: FIRST_ID,
            older_time: now,
            newer_id: FIRST_ID + 1,
            newer_time: now,
            pages_left: None,
            fail_next: false,
        }
    }

    /// Set the page size.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Limit older history to `pages` pages after the initial one.
    #[must_use]
    pub fn with_history_pages(mut self, pages: usize) -> Self {
        self.pages_left = Some(pages);
        self
    }

    /// Make the next [`fetch_older`](DataSource::fetch_older) fail.
    pub fn fail_next_fetch(&mut self) {
        self.fail_next = true;
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.state >> 33
    }

    fn pick<'a>(&mut self, options: &'a [&'a str]) -> &'a str {
        let i = (self.next_u64() % options.len() as u64) as usize;
        options[i]
    }

    fn author(&mut self) -> String {
        let first = self.pick(FIRST_NAMES);
        let last = self.pick(LAST_NAMES);
        format!("{first} {last}")
    }

    fn content(&mut self) -> String {
        let lines = 1 + self.next_u64() % 4;
        (0..lines)
            .map(|_| {
                let words = 4 + self.next_u64() % 8;
                (0..words)
                    .map(|_| self.pick(WORDS))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn gap(&mut self) -> Duration {
        Duration::from_secs(30 + self.next_u64() % 3_600)
    }

    /// The next page of older messages, oldest first.
    pub fn older_page(&mut self) -> Vec<Message> {
        let mut page = Vec::with_capacity(self.page_size);
        for _ in 0..self.page_size {
            let gap = self.gap();
            self.older_time = self
                .older_time
                .checked_sub(gap)
                .unwrap_or(SystemTime::UNIX_EPOCH);
            let author = self.author();
            let content = self.content();
            page.push(Message::new(
                MessageId(self.older_id),
                author,
                content,
                self.older_time,
            ));
            self.older_id = self.older_id.saturating_sub(1);
        }
        page.reverse();
        page
    }

    /// One new message arriving after everything handed out so far.
    pub fn incoming(&mut self) -> Message {
        let gap = self.gap();
        self.newer_time += gap;
        let author = self.author();
        let content = self.content();
        let message = Message::new(MessageId(self.newer_id), author, content, self.newer_time);
        self.newer_id += 1;
        message
    }

    /// A message sent by the local user.
    pub fn local(&mut self, content: impl Into<String>) -> Message {
        self.newer_time += Duration::from_secs(1);
        let message = Message::new(MessageId(self.newer_id), "You", content, self.newer_time);
        self.newer_id += 1;
        message
    }
}

impl Default for FakeMessageSource {
    fn default() -> Self {
        Self::new(0)
    }
}

impl DataSource<Message> for FakeMessageSource {
    fn initial_items(&mut self) -> Vec<Message> {
        self.older_page()
    }

    fn fetch_older(&mut self) -> FetchFuture<Message> {
        if std::mem::take(&mut self.fail_next) {
            return future::ready(Err(FetchError::unavailable("fake source failure"))).boxed_local();
        }
        let page = match self.pages_left {
            Some(0) => Vec::new(),
            Some(ref mut n) => {
                *n -= 1;
                self.older_page()
            }
            None => self.older_page(),
        };
        future::ready(Ok(page)).boxed_local()
    }
}
