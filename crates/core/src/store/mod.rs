//! In-memory log and event stores.
//!
//! This module provides:
//! - A fixed-capacity ring buffer with timestamp cursors
//! - `LogStore` for sanitized child process output lines
//! - `EventStore` for high-level lifecycle events
//!
//! Both stores stamp items with the current wall-clock time in milliseconds.
//! Stamps never go backwards within a store, so a reader paging with the
//! returned `now` cursor always sees items in insertion order.

pub mod ring_buffer;
pub mod sanitize;

use ring_buffer::{RingBuffer, Stamped};
use rp_protocol::{Event, EventKind, LogLine};
use tokio::sync::Mutex;

/// Default number of log lines retained.
pub const DEFAULT_LOG_CAPACITY: usize = 2000;

/// Default number of events retained.
pub const DEFAULT_EVENT_CAPACITY: usize = 500;

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// A ring buffer behind a mutex, stamping items on append.
#[derive(Debug)]
struct StampedStore<T> {
    inner: Mutex<RingBuffer<T>>,
}

impl<T: Stamped + Clone> StampedStore<T> {
    fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(RingBuffer::new(capacity)),
        }
    }

    /// Build an item with a stamp no older than the last stored one, then append it.
    async fn append_with(&self, build: impl FnOnce(i64) -> T) -> T {
        let mut buffer = self.inner.lock().await;
        let ts = buffer.last_ts().map_or(now_millis(), |last| last.max(now_millis()));
        let item = build(ts);
        buffer.push(item.clone());
        item
    }

    async fn query(&self, since: i64) -> (Vec<T>, i64) {
        let buffer = self.inner.lock().await;
        let now = buffer.last_ts().map_or(now_millis(), |last| last.max(now_millis()));
        (buffer.since(since), now)
    }

    async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

/// Store of captured output lines.
#[derive(Debug)]
pub struct LogStore {
    store: StampedStore<LogLine>,
}

impl LogStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            store: StampedStore::new(capacity),
        }
    }

    /// Sanitize `raw` and append it as a new line.
    ///
    /// # Returns
    ///
    /// The stored line, including its timestamp.
    pub async fn append(&self, raw: &str) -> LogLine {
        let line = sanitize::strip_ansi(raw);
        self.store.append_with(|ts| LogLine { ts, line }).await
    }

    /// Lines newer than `since`, oldest first, plus the server time to use
    /// as the next cursor.
    pub async fn query(&self, since: i64) -> (Vec<LogLine>, i64) {
        self.store.query(since).await
    }

    pub async fn len(&self) -> usize {
        self.store.len().await
    }
}

impl Default for LogStore {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

/// Store of lifecycle events.
#[derive(Debug)]
pub struct EventStore {
    store: StampedStore<Event>,
}

impl EventStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            store: StampedStore::new(capacity),
        }
    }

    /// Append an event of the given kind.
    pub async fn push(&self, kind: EventKind, text: impl Into<String>, step_id: Option<usize>) -> Event {
        let text = text.into();
        self.store
            .append_with(|ts| Event {
                ts,
                kind,
                text,
                step_id,
            })
            .await
    }

    /// Events newer than `since`, oldest first, plus the next cursor.
    pub async fn query(&self, since: i64) -> (Vec<Event>, i64) {
        self.store.query(since).await
    }

    pub async fn len(&self) -> usize {
        self.store.len().await
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
