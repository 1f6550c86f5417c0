use log::debug;
use std::collections::VecDeque;

/// Default number of commands remembered by a session.
pub const DEFAULT_CAPACITY: usize = 100;

/// Bounded list of submitted command lines, oldest first.
///
/// Besides the entries, the history keeps a browsing cursor for Up/Down
/// navigation. The cursor is always in `0..=len()`; `len()` means the user
/// is not browsing (the line below the newest entry).
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<String>,
    capacity: usize,
    index: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl History {
    /// Create an empty history holding at most `capacity` entries.
    ///
    /// A capacity of zero is bumped to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            index: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current browsing cursor.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    /// Entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(String::as_str)
    }

    /// Record a submitted command.
    ///
    /// A command already present is moved to the newest position instead of
    /// being stored twice. Otherwise the oldest entry is evicted when full.
    /// Returns the index the command now occupies.
    pub fn push(&mut self, command: impl Into<String>) -> usize {
        let command = command.into();
        if let Some(existing) = self.entries.iter().position(|e| *e == command) {
            let at = self.reuse(existing).unwrap_or(existing);
            self.index = self.entries.len();
            return at;
        }

        if self.is_full() {
            if let Some(evicted) = self.entries.pop_front() {
                debug!("history: evicting {:?}", evicted);
            }
        }
        self.entries.push_back(command);
        self.index = self.entries.len();
        self.entries.len() - 1
    }

    /// Move the entry at `index` to the newest position.
    ///
    /// Returns its new index, or `None` when `index` is out of range.
    pub fn reuse(&mut self, index: usize) -> Option<usize> {
        let command = self.entries.remove(index)?;
        debug!("history: promoting {:?}", command);
        self.entries.push_back(command);
        Some(self.entries.len() - 1)
    }

    /// Step towards older entries (Up arrow).
    ///
    /// Stops at the oldest entry. Returns an empty string for an empty history.
    pub fn previous(&mut self) -> String {
        self.index = self.index.saturating_sub(1);
        self.entries.get(self.index).cloned().unwrap_or_default()
    }

    /// Step towards newer entries (Down arrow).
    ///
    /// Stepping past the newest entry pins the cursor at `len()` and returns
    /// an empty string: the blank line below the history.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> String {
        let next = self.index + 1;
        if next < self.entries.len() {
            self.index = next;
            self.entries[next].clone()
        } else {
            self.index = self.entries.len();
            String::new()
        }
    }
}
