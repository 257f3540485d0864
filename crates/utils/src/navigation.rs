//! Browser-style navigation surface: the current URL, pushing history entries
//! without a reload, and back/forward notifications.

use std::sync::{Mutex, MutexGuard};

use tokio::sync::broadcast;
use tracing::debug;

const POP_STATE_CAPACITY: usize = 16;

/// Sent to subscribers whenever back/forward navigation changes the URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopState {
    pub url: String,
}

pub trait Navigator: Send + Sync {
    /// Path of the current URL, without query string or fragment.
    fn pathname(&self) -> String;

    /// Query string of the current URL including the leading `?`, or empty.
    fn search(&self) -> String;

    /// Navigate to `url` (path plus query) by appending a history entry.
    fn push_state(&self, url: &str);

    /// Listen for back/forward navigation. Dropping the receiver unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<PopState>;
}

#[derive(Debug)]
struct HistoryStack {
    entries: Vec<String>,
    cursor: usize,
}

impl HistoryStack {
    fn current(&self) -> &str {
        &self.entries[self.cursor]
    }
}

/// Session history kept in memory, for hosts without a browser.
#[derive(Debug)]
pub struct InMemoryHistory {
    stack: Mutex<HistoryStack>,
    pop_tx: broadcast::Sender<PopState>,
}

impl InMemoryHistory {
    pub fn new(initial_url: impl Into<String>) -> Self {
        let (pop_tx, _) = broadcast::channel(POP_STATE_CAPACITY);
        Self {
            stack: Mutex::new(HistoryStack {
                entries: vec![initial_url.into()],
                cursor: 0,
            }),
            pop_tx,
        }
    }

    fn stack(&self) -> MutexGuard<'_, HistoryStack> {
        self.stack.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn current_url(&self) -> String {
        self.stack().current().to_string()
    }

    /// Number of entries, including forward entries not yet discarded.
    pub fn len(&self) -> usize {
        self.stack().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack().entries.is_empty()
    }

    /// Step back one entry. Returns false at the start of history.
    pub fn back(&self) -> bool {
        self.go(-1)
    }

    /// Step forward one entry. Returns false at the end of history.
    pub fn forward(&self) -> bool {
        self.go(1)
    }

    fn go(&self, delta: isize) -> bool {
        let url = {
            let mut stack = self.stack();
            let Some(target) = stack.cursor.checked_add_signed(delta) else {
                return false;
            };
            if target >= stack.entries.len() {
                return false;
            }
            stack.cursor = target;
            stack.current().to_string()
        };
        debug!(url = %url, "History navigation");
        // no receivers is fine
        let _ = self.pop_tx.send(PopState { url });
        true
    }

    pub fn listener_count(&self) -> usize {
        self.pop_tx.receiver_count()
    }
}

/// Split `path?query#fragment` into path and `?query`.
fn split_url(url: &str) -> (&str, &str) {
    let url = url.split_once('#').map_or(url, |(before, _)| before);
    match url.find('?') {
        Some(idx) => (&url[..idx], &url[idx..]),
        None => (url, ""),
    }
}

impl Navigator for InMemoryHistory {
    fn pathname(&self) -> String {
        let stack = self.stack();
        split_url(stack.current()).0.to_string()
    }

    fn search(&self) -> String {
        let stack = self.stack();
        let search = split_url(stack.current()).1;
        // a bare "?" reads as no query at all
        if search == "?" {
            String::new()
        } else {
            search.to_string()
        }
    }

    fn push_state(&self, url: &str) {
        let mut stack = self.stack();
        let next = stack.cursor + 1;
        stack.entries.truncate(next);
        stack.entries.push(url.to_string());
        stack.cursor = next;
    }

    fn subscribe(&self) -> broadcast::Receiver<PopState> {
        self.pop_tx.subscribe()
    }
}
