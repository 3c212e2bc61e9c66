//! Undo/redo history over store mutations.
//!
//! Entries describe a mutation in both directions, so undo is "apply the
//! inverse" and redo is "apply the entry". A batch inverts to its
//! sub-entries' inverses in reverse order, which is how a multi-object drag
//! undoes as one step.
//!
//! Replay goes through the same mutation path as user edits. While a replay
//! is in progress the log ignores pushes, so undoing never records a new
//! undo entry.

#[cfg(test)]
#[path = "undo_test.rs"]
mod undo_test;

use std::collections::VecDeque;

use crate::doc::{ObjectId, PartialObject, SpatialObject};

/// One reversible store mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum UndoEntry {
    Create(SpatialObject),
    Delete(SpatialObject),
    Update { id: ObjectId, before: PartialObject, after: PartialObject },
    /// Applied in order; inverted in reverse order.
    Batch(Vec<UndoEntry>),
}

impl UndoEntry {
    /// The entry that reverses this one.
    #[must_use]
    pub fn inverse(&self) -> UndoEntry {
        match self {
            Self::Create(obj) => Self::Delete(obj.clone()),
            Self::Delete(obj) => Self::Create(obj.clone()),
            Self::Update { id, before, after } => Self::Update { id: *id, before: after.clone(), after: before.clone() },
            Self::Batch(entries) => Self::Batch(entries.iter().rev().map(Self::inverse).collect()),
        }
    }

    /// Number of non-batch entries, counting through nested batches.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Batch(entries) => entries.iter().map(Self::leaf_count).sum(),
            _ => 1,
        }
    }

    /// Collapse a list into the smallest equivalent entry. `None` when empty.
    #[must_use]
    pub fn batch(mut entries: Vec<UndoEntry>) -> Option<UndoEntry> {
        match entries.len() {
            0 => None,
            1 => entries.pop(),
            _ => Some(Self::Batch(entries)),
        }
    }
}

/// Bounded undo stack plus redo stack.
#[derive(Debug, Clone)]
pub struct UndoLog {
    max_depth: usize,
    undo: VecDeque<UndoEntry>,
    redo: Vec<UndoEntry>,
    replaying: bool,
}

impl UndoLog {
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth: max_depth.max(1), undo: VecDeque::new(), redo: Vec::new(), replaying: false }
    }

    /// Record a new entry and clear the redo stack. Returns false when
    /// suppressed because a replay is in progress or the batch is empty.
    pub fn push(&mut self, entry: UndoEntry) -> bool {
        if self.replaying {
            tracing::trace!("undo push suppressed during replay");
            return false;
        }
        if matches!(&entry, UndoEntry::Batch(entries) if entries.is_empty()) {
            return false;
        }
        self.undo.push_back(entry);
        while self.undo.len() > self.max_depth {
            self.undo.pop_front();
        }
        self.redo.clear();
        true
    }

    /// Pop the newest entry, move it to the redo stack, enter replay mode,
    /// and return what to apply (its inverse).
    pub fn begin_undo(&mut self) -> Option<UndoEntry> {
        let entry = self.undo.pop_back()?;
        let inverse = entry.inverse();
        self.redo.push(entry);
        self.replaying = true;
        Some(inverse)
    }

    /// Pop the newest redo entry, move it back to the undo stack, enter
    /// replay mode, and return what to apply.
    pub fn begin_redo(&mut self) -> Option<UndoEntry> {
        let entry = self.redo.pop()?;
        self.undo.push_back(entry.clone());
        self.replaying = true;
        Some(entry)
    }

    /// Leave replay mode.
    pub fn end_replay(&mut self) {
        self.replaying = false;
    }

    #[must_use]
    pub fn is_replaying(&self) -> bool {
        self.replaying
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    /// Newest undo entry, if any.
    #[must_use]
    pub fn peek(&self) -> Option<&UndoEntry> {
        self.undo.back()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
