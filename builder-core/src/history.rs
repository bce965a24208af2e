//! Undo/redo history.
//!
//! - Executing a command applies it and pushes it on the undo stack
//! - Undo reverts the newest command and moves it to the redo stack
//! - Redo re-applies the newest undone command
//! - Executing a new command clears the redo stack
//! - Commands whose target has vanished are dropped, and undo/redo moves on
//!   to the next command that still applies

use serde::{Deserialize, Serialize};

use crate::{Command, ElementStore};

/// Default number of undo levels kept.
pub const DEFAULT_MAX_LEVELS: usize = 50;

/// Observable history state, published whenever it changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryState {
    /// Whether [`History::undo`] would do anything.
    pub can_undo: bool,
    /// Whether [`History::redo`] would do anything.
    pub can_redo: bool,
    /// Commands on the undo stack.
    pub undo_len: usize,
    /// Commands on the redo stack.
    pub redo_len: usize,
}

/// Bounded undo/redo stacks of [`Command`]s.
#[derive(Debug, Clone)]
pub struct History {
    /// Applied commands (most recent last).
    undo_stack: Vec<Command>,
    /// Undone commands (most recent last).
    redo_stack: Vec<Command>,
    /// Maximum undo levels (0 = unlimited).
    max_levels: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    /// Create a history with [`DEFAULT_MAX_LEVELS`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_levels(DEFAULT_MAX_LEVELS)
    }

    /// Create a history keeping at most `max_levels` undo steps.
    #[must_use]
    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
        }
    }

    /// Apply `command` and record it.
    ///
    /// Returns `false` (recording nothing) if the command could not be
    /// applied because its target does not exist.
    pub fn execute(&mut self, command: Command, store: &mut ElementStore) -> bool {
        if !command.apply(store) {
            tracing::debug!("Skipping inapplicable {} command", command.name());
            return false;
        }
        tracing::debug!("Executed {} command", command.name());
        self.record(command);
        true
    }

    /// Record a command that has already been applied to the store.
    pub fn record(&mut self, command: Command) {
        self.undo_stack.push(command);
        self.redo_stack.clear();
        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }
    }

    /// Revert the most recent command that still applies.
    ///
    /// Stale commands (whose target no longer exists) on top of the stack are
    /// discarded on the way. Returns `false` if no command could be undone.
    pub fn undo(&mut self, store: &mut ElementStore) -> bool {
        while let Some(command) = self.undo_stack.pop() {
            if command.revert(store) {
                tracing::debug!("Undid {} command", command.name());
                self.redo_stack.push(command);
                return true;
            }
            tracing::debug!("Pruned stale {} command from undo stack", command.name());
        }
        false
    }

    /// Re-apply the most recently undone command that still applies.
    ///
    /// Stale commands are discarded on the way. Returns `false` if no command
    /// could be redone.
    pub fn redo(&mut self, store: &mut ElementStore) -> bool {
        while let Some(command) = self.redo_stack.pop() {
            if command.apply(store) {
                tracing::debug!("Redid {} command", command.name());
                self.undo_stack.push(command);
                return true;
            }
            tracing::debug!("Pruned stale {} command from redo stack", command.name());
        }
        false
    }

    /// Whether there is anything to undo.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Whether there is anything to redo.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Current state summary.
    #[must_use]
    pub fn state(&self) -> HistoryState {
        HistoryState {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            undo_len: self.undo_stack.len(),
            redo_len: self.redo_stack.len(),
        }
    }

    /// Forget all history.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ElementType, Position};

    fn create(store: &ElementStore) -> Command {
        Command::create(store.prepare(ElementType::Text, Position::default()))
    }

    #[test]
    fn test_undo_redo_create() {
        let mut store = ElementStore::new();
        let mut history = History::new();

        assert!(history.execute(create(&store), &mut store));
        assert_eq!(store.len(), 1);

        assert!(history.undo(&mut store));
        assert!(store.is_empty());
        assert!(history.can_redo());

        assert!(history.redo(&mut store));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_empty_stacks_are_noops() {
        let mut store = ElementStore::new();
        let mut history = History::new();
        assert!(!history.undo(&mut store));
        assert!(!history.redo(&mut store));
        assert_eq!(history.state(), HistoryState::default());
    }

    #[test]
    fn test_new_command_clears_redo() {
        let mut store = ElementStore::new();
        let mut history = History::new();

        history.execute(create(&store), &mut store);
        history.undo(&mut store);
        assert!(history.can_redo());

        history.execute(create(&store), &mut store);
        assert!(!history.can_redo());
        assert!(!history.redo(&mut store));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_bounded_levels() {
        let mut store = ElementStore::new();
        let mut history = History::with_max_levels(3);
        for _ in 0..5 {
            history.execute(create(&store), &mut store);
        }
        assert_eq!(history.state().undo_len, 3);

        while history.undo(&mut store) {}
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_stale_command_is_pruned() {
        let mut store = ElementStore::new();
        let mut history = History::new();
        let id = store.create(ElementType::Text, Position::default()).id;

        let cmd = Command::move_to(&store, id, Position::new(5.0, 5.0)).expect("exists");
        history.execute(cmd, &mut store);
        store.delete(id);

        assert!(!history.undo(&mut store));
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_undo_skips_stale_commands() {
        let mut store = ElementStore::new();
        let mut history = History::new();
        let kept = store.create(ElementType::Text, Position::default()).id;
        let doomed = store.create(ElementType::Image, Position::default()).id;

        let cmd = Command::move_to(&store, kept, Position::new(40.0, 40.0)).expect("exists");
        history.execute(cmd, &mut store);
        let cmd = Command::move_to(&store, doomed, Position::new(9.0, 9.0)).expect("exists");
        history.execute(cmd, &mut store);
        store.delete(doomed);

        assert!(history.undo(&mut store));
        assert_eq!(store.get(kept).map(|e| e.position), Some(Position::default()));
        assert_eq!(history.state().undo_len, 0);
        assert_eq!(history.state().redo_len, 1);
    }

    #[test]
    fn test_redo_skips_stale_commands() {
        let mut store = ElementStore::new();
        let mut history = History::new();
        let kept = store.create(ElementType::Text, Position::default()).id;
        let doomed = store.create(ElementType::Image, Position::default()).id;

        let cmd = Command::move_to(&store, doomed, Position::new(9.0, 9.0)).expect("exists");
        history.execute(cmd, &mut store);
        let cmd = Command::move_to(&store, kept, Position::new(40.0, 40.0)).expect("exists");
        history.execute(cmd, &mut store);
        assert!(history.undo(&mut store));
        assert!(history.undo(&mut store));
        store.delete(doomed);

        assert!(history.redo(&mut store));
        assert_eq!(
            store.get(kept).map(|e| e.position),
            Some(Position::new(40.0, 40.0))
        );
        assert!(!history.can_redo());
    }
}
