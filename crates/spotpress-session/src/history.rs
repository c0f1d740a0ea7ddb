//! Bounded snapshot history for undo/redo.
//!
//! The log holds whole state snapshots, not diffs. Pushing while
//! undone truncates the redo tail (editing after an undo branches the
//! timeline), and the log evicts its oldest snapshot once the
//! capacity is reached.

/// Default number of snapshots kept.
pub const DEFAULT_CAPACITY: usize = 20;

/// A bounded undo/redo log of state snapshots.
#[derive(Debug, Clone)]
pub struct History<T> {
    snapshots: Vec<T>,
    cursor: usize,
    capacity: usize,
}

impl<T: Clone> History<T> {
    /// A log seeded with the initial state.
    ///
    /// Capacity is clamped to at least 1 so the current state always
    /// exists.
    #[must_use]
    pub fn new(initial: T, capacity: usize) -> Self {
        Self {
            snapshots: vec![initial],
            cursor: 0,
            capacity: capacity.max(1),
        }
    }

    /// The state the cursor points at.
    #[must_use]
    pub fn current(&self) -> &T {
        &self.snapshots[self.cursor.min(self.snapshots.len() - 1)]
    }

    /// Record a new state, discarding any redo tail and evicting the
    /// oldest snapshot when full.
    pub fn push(&mut self, state: T) {
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push(state);
        if self.snapshots.len() > self.capacity {
            self.snapshots.remove(0);
        }
        self.cursor = self.snapshots.len() - 1;
    }

    /// Step back one snapshot, if possible.
    pub fn undo(&mut self) -> Option<&T> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(&self.snapshots[self.cursor])
    }

    /// Step forward one snapshot, if possible.
    pub fn redo(&mut self) -> Option<&T> {
        if self.cursor + 1 >= self.snapshots.len() {
            return None;
        }
        self.cursor += 1;
        Some(&self.snapshots[self.cursor])
    }

    /// Whether [`undo`](Self::undo) would succeed.
    #[must_use]
    pub const fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// Whether [`redo`](Self::redo) would succeed.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    /// Number of snapshots currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Always false: the log never drops its current state.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn undo_and_redo_walk_the_log() {
        let mut history = History::new(0, DEFAULT_CAPACITY);
        history.push(1);
        history.push(2);
        assert_eq!(*history.current(), 2);
        assert_eq!(history.undo(), Some(&1));
        assert_eq!(history.undo(), Some(&0));
        assert_eq!(history.undo(), None);
        assert_eq!(history.redo(), Some(&1));
        assert_eq!(history.redo(), Some(&2));
        assert_eq!(history.redo(), None);
    }

    #[test]
    fn push_after_undo_discards_redo_tail() {
        let mut history = History::new(0, DEFAULT_CAPACITY);
        history.push(1);
        history.push(2);
        history.undo();
        history.push(9);
        assert_eq!(*history.current(), 9);
        assert!(!history.can_redo());
        assert_eq!(history.undo(), Some(&1));
    }

    #[test]
    fn capacity_evicts_the_oldest_snapshot() {
        let mut history = History::new(0, 3);
        history.push(1);
        history.push(2);
        history.push(3);
        assert_eq!(history.len(), 3);
        assert_eq!(history.undo(), Some(&2));
        assert_eq!(history.undo(), Some(&1));
        assert_eq!(history.undo(), None, "snapshot 0 was evicted");
    }

    #[test]
    fn capacity_is_at_least_one() {
        let mut history = History::new(7, 0);
        history.push(8);
        assert_eq!(*history.current(), 8);
        assert_eq!(history.len(), 1);
    }
}
