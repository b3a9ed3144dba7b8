//! Linear undo/redo over board snapshots.

use crate::snapshot::Snapshot;

/// Maximum number of snapshots kept by default.
pub const MAX_UNDO_HISTORY: usize = 50;

/// Bounded linear history with a cursor.
///
/// The entry under the cursor always mirrors the current board. Recording
/// while the cursor is not at the end drops the redo branch; recording at
/// capacity evicts the oldest entry.
#[derive(Debug, Clone)]
pub struct History<S = Snapshot> {
    stack: Vec<S>,
    cursor: usize,
    capacity: usize,
}

impl<S> Default for History<S> {
    fn default() -> Self {
        Self::new(MAX_UNDO_HISTORY)
    }
}

impl<S> History<S> {
    /// Create an empty history. A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            stack: Vec::new(),
            cursor: 0,
            capacity: capacity.max(1),
        }
    }

    /// Append a snapshot and make it current.
    pub fn record(&mut self, snapshot: S) {
        if !self.stack.is_empty() {
            self.stack.truncate(self.cursor + 1);
        }
        self.stack.push(snapshot);
        if self.stack.len() > self.capacity {
            self.stack.remove(0);
        }
        self.cursor = self.stack.len() - 1;
        log::debug!("History record: {}/{}", self.cursor + 1, self.stack.len());
    }

    /// Step back. Returns the snapshot to restore.
    pub fn undo(&mut self) -> Option<&S> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.stack.get(self.cursor)
    }

    /// Step forward. Returns the snapshot to restore.
    pub fn redo(&mut self) -> Option<&S> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.stack.get(self.cursor)
    }

    /// Drop everything and start over from `initial`.
    pub fn reset(&mut self, initial: S) {
        self.stack.clear();
        self.stack.push(initial);
        self.cursor = 0;
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.stack.clear();
        self.cursor = 0;
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.stack.len()
    }

    /// Snapshot matching the current board, if any was recorded.
    pub fn current(&self) -> Option<&S> {
        self.stack.get(self.cursor)
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the capacity, evicting the oldest entries if needed.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        let excess = self.stack.len().saturating_sub(self.capacity);
        if excess > 0 {
            self.stack.drain(..excess);
            self.cursor = self.cursor.saturating_sub(excess);
        }
    }
}
