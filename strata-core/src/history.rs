/// Snapshot undo/redo.
///
/// A linear list of full (elements, edges) copies plus a cursor. Pushing
/// after an undo abandons the redo branch. Undo/redo at either end of the
/// stack do nothing.
use crate::types::{CanvasEdge, CanvasElement};

pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub elements: Vec<CanvasElement>,
    pub edges: Vec<CanvasEdge>,
}

#[derive(Debug, Clone)]
pub struct HistoryStack {
    snapshots: Vec<Snapshot>,
    index: usize,
    capacity: usize,
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryStack {
    /// A capacity of zero is raised to one so the stack can always hold the
    /// current state.
    pub fn new(capacity: usize) -> Self {
        Self {
            snapshots: Vec::new(),
            index: 0,
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Cursor position. Meaningless while the stack is empty.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The snapshot under the cursor.
    pub fn current(&self) -> Option<&Snapshot> {
        self.snapshots.get(self.index)
    }

    /// Record `snapshot` as the newest state. Anything after the cursor is
    /// discarded and the oldest entry is evicted once over capacity.
    pub fn push(&mut self, snapshot: Snapshot) {
        if !self.snapshots.is_empty() {
            self.snapshots.truncate(self.index + 1);
        }
        self.snapshots.push(snapshot);
        if self.snapshots.len() > self.capacity {
            let overflow = self.snapshots.len() - self.capacity;
            self.snapshots.drain(..overflow);
            log::trace!("[strata.history.push] Evicted {} oldest snapshot(s)", overflow);
        }
        self.index = self.snapshots.len() - 1;
    }

    pub fn can_undo(&self) -> bool {
        !self.snapshots.is_empty() && self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.snapshots.is_empty() && self.index < self.snapshots.len() - 1
    }

    /// Step back and return the snapshot to apply, or None at the bottom.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        self.snapshots.get(self.index)
    }

    /// Step forward and return the snapshot to apply, or None at the top.
    pub fn redo(&mut self) -> Option<&Snapshot> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        self.snapshots.get(self.index)
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(n: usize) -> Snapshot {
        Snapshot {
            elements: (0..n)
                .map(|i| CanvasElement::card("x", i as f64, 0.0).with_id(&format!("e{}", i)))
                .collect(),
            edges: Vec::new(),
        }
    }

    #[test]
    fn test_empty_stack_is_noop() {
        let mut history = HistoryStack::default();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_undo_redo_walks_snapshots() {
        let mut history = HistoryStack::default();
        history.push(snap(0));
        history.push(snap(1));
        history.push(snap(2));
        assert_eq!(history.index(), 2);

        assert_eq!(history.undo(), Some(&snap(1)));
        assert_eq!(history.undo(), Some(&snap(0)));
        assert!(history.undo().is_none());
        assert_eq!(history.index(), 0);

        assert_eq!(history.redo(), Some(&snap(1)));
        assert_eq!(history.redo(), Some(&snap(2)));
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_push_discards_redo_branch() {
        let mut history = HistoryStack::default();
        history.push(snap(0));
        history.push(snap(1));
        history.push(snap(2));
        history.undo();
        history.undo();
        history.push(snap(5));
        assert_eq!(history.len(), 2);
        assert!(!history.can_redo());
        assert_eq!(history.current(), Some(&snap(5)));
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = HistoryStack::new(3);
        for n in 0..10 {
            history.push(snap(n));
            assert!(history.len() <= 3);
        }
        assert_eq!(history.index(), 2);
        history.undo();
        history.undo();
        assert_eq!(history.current(), Some(&snap(7)));
    }

    #[test]
    fn test_default_capacity_is_fifty() {
        let mut history = HistoryStack::default();
        for n in 0..120 {
            history.push(snap(n % 3));
        }
        assert_eq!(history.len(), 50);
        assert_eq!(history.index(), 49);
    }

    #[test]
    fn test_clear() {
        let mut history = HistoryStack::default();
        history.push(snap(0));
        history.push(snap(1));
        history.clear();
        assert!(history.is_empty());
        assert!(!history.can_undo());
    }
}
