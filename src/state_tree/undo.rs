//! Transactional undo log for state tree edits.
//!
//! Edits are grouped into transactions. A transaction stays open until `begin_new_transaction`
//! closes it, so every edit made in between (for example, the many small changes produced by
//! dragging a slider) is undone or redone as one step.

use crate::parameters::Param;

/// Oldest transactions beyond this depth are forgotten.
pub const MAX_TRANSACTIONS: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Change {
    pub param: Param,
    pub before: f32,
    pub after: f32,
}

#[derive(Debug, Default)]
struct Transaction {
    changes: Vec<Change>,
}

impl Transaction {
    /// Coalesces repeated edits of the same parameter into one change.
    fn record(&mut self, change: Change) {
        match self.changes.iter_mut().find(|c| c.param == change.param) {
            Some(existing) => existing.after = change.after,
            None => self.changes.push(change),
        }
    }

    /// Drops changes that ended up where they started.
    fn prune(&mut self) {
        self.changes.retain(|c| c.before != c.after);
    }

    fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct UndoManager {
    done: Vec<Transaction>,
    undone: Vec<Transaction>,
    open: Option<Transaction>,
}

impl UndoManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a change to the open transaction, opening one if needed. Any redo history is lost.
    pub fn record(&mut self, change: Change) {
        self.undone.clear();
        self.open.get_or_insert_with(Transaction::default).record(change);
    }

    /// Closes the open transaction, if any, and starts a new empty one.
    pub fn begin_new_transaction(&mut self) {
        self.close_open_transaction();
        self.open = Some(Transaction::default());
    }

    fn close_open_transaction(&mut self) {
        if let Some(mut transaction) = self.open.take() {
            transaction.prune();
            if !transaction.is_empty() {
                self.done.push(transaction);
                if self.done.len() > MAX_TRANSACTIONS {
                    self.done.remove(0);
                }
            }
        }
    }

    #[cfg(test)]
    pub fn is_transaction_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn can_undo(&self) -> bool {
        !self.done.is_empty()
            || self
                .open
                .as_ref()
                .map_or(false, |t| t.changes.iter().any(|c| c.before != c.after))
    }

    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    /// Steps back one transaction, returning the values to restore in the order they should be
    /// applied. Returns `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Option<Vec<(Param, f32)>> {
        self.close_open_transaction();
        let transaction = self.done.pop()?;
        let restore = transaction
            .changes
            .iter()
            .rev()
            .map(|c| (c.param, c.before))
            .collect();
        self.undone.push(transaction);
        Some(restore)
    }

    /// Steps forward one transaction. Returns `None` when there is nothing to redo.
    pub fn redo(&mut self) -> Option<Vec<(Param, f32)>> {
        self.close_open_transaction();
        let transaction = self.undone.pop()?;
        let restore = transaction
            .changes
            .iter()
            .map(|c| (c.param, c.after))
            .collect();
        self.done.push(transaction);
        Some(restore)
    }

    pub fn clear_history(&mut self) {
        self.done.clear();
        self.undone.clear();
        self.open = None;
    }
}
