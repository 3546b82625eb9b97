use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::probe::ProbeOutcome;

/// How many probe outcomes the history keeps
pub const HISTORY_CAPACITY: usize = 50;

/// Bounded ring of recent probe outcomes, oldest first.
pub struct HistoryBuffer {
    inner: Mutex<Inner>,
    capacity: usize,
}

struct Inner {
    entries: VecDeque<ProbeOutcome>,
    // Every append ever made, evicted or not
    appended: u64,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: VecDeque::with_capacity(capacity + 1),
                appended: 0,
            }),
            capacity,
        }
    }

    /// Append, evicting from the front so exactly `capacity` remain.
    pub fn append(&self, outcome: ProbeOutcome) {
        let mut inner = self.inner.lock();
        inner.entries.push_back(outcome);
        inner.appended += 1;
        while inner.entries.len() > self.capacity {
            inner.entries.pop_front();
        }
    }

    /// The last `min(n, len)` entries, newest last.
    pub fn recent(&self, n: usize) -> Vec<ProbeOutcome> {
        let inner = self.inner.lock();
        let skip = inner.entries.len().saturating_sub(n);
        inner.entries.iter().skip(skip).cloned().collect()
    }

    pub fn all(&self) -> Vec<ProbeOutcome> {
        self.inner.lock().entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total appends since startup; unlike `len()` this is not capped.
    pub fn lifetime_count(&self) -> u64 {
        self.inner.lock().appended
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}
