//! Undo/Redo system using command pattern
//!
//! Commands are reversible edits on a target `T`. An edit is usually applied
//! by the caller first (for example during a live drag) and then recorded
//! with [`UndoManager::push`], which only does the bookkeeping.
//! [`UndoManager::execute`] applies and records in one step.

use std::collections::VecDeque;

use cf_core::ChartResult;

/// Trait for undoable commands
pub trait Command<T>: Send {
    /// Apply the command to `target`
    fn execute(&mut self, target: &mut T) -> ChartResult<()>;

    /// Reverse the command on `target`
    fn undo(&mut self, target: &mut T) -> ChartResult<()>;

    /// Get command name for display
    fn name(&self) -> &str;
}

/// Undo/Redo manager
pub struct UndoManager<T> {
    undo_stack: VecDeque<Box<dyn Command<T>>>,
    redo_stack: Vec<Box<dyn Command<T>>>,
    max_history: usize,
}

impl<T> UndoManager<T> {
    pub fn new(max_history: usize) -> Self {
        Self {
            undo_stack: VecDeque::with_capacity(max_history.min(256)),
            redo_stack: Vec::new(),
            max_history: max_history.max(1),
        }
    }

    /// Record a command whose effect has already been applied
    pub fn push(&mut self, command: Box<dyn Command<T>>) {
        log::debug!("Push '{}'", command.name());

        // Enforce max history
        while self.undo_stack.len() >= self.max_history {
            self.undo_stack.pop_front();
        }
        self.undo_stack.push_back(command);

        // Clear redo stack on new command
        self.redo_stack.clear();
    }

    /// Apply a command to `target` and record it. A command that fails to
    /// apply is not recorded.
    pub fn execute(&mut self, target: &mut T, mut command: Box<dyn Command<T>>) -> ChartResult<()> {
        command.execute(target)?;
        self.push(command);
        Ok(())
    }

    /// Undo the last command. Returns `false` when there is nothing to undo.
    ///
    /// A command that fails to undo stays on the undo stack.
    pub fn undo(&mut self, target: &mut T) -> ChartResult<bool> {
        let Some(mut command) = self.undo_stack.pop_back() else {
            return Ok(false);
        };
        if let Err(e) = command.undo(target) {
            log::warn!("Undo '{}' failed: {}", command.name(), e);
            self.undo_stack.push_back(command);
            return Err(e);
        }
        log::debug!("Undo '{}'", command.name());
        self.redo_stack.push(command);
        Ok(true)
    }

    /// Redo the last undone command. Returns `false` when there is nothing
    /// to redo.
    ///
    /// A command that fails to redo stays on the redo stack.
    pub fn redo(&mut self, target: &mut T) -> ChartResult<bool> {
        let Some(mut command) = self.redo_stack.pop() else {
            return Ok(false);
        };
        if let Err(e) = command.execute(target) {
            log::warn!("Redo '{}' failed: {}", command.name(), e);
            self.redo_stack.push(command);
            return Err(e);
        }
        log::debug!("Redo '{}'", command.name());
        self.undo_stack.push_back(command);
        Ok(true)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get the name of the next undo command
    pub fn undo_name(&self) -> Option<&str> {
        self.undo_stack.back().map(|c| c.name())
    }

    /// Get the name of the next redo command
    pub fn redo_name(&self) -> Option<&str> {
        self.redo_stack.last().map(|c| c.name())
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Get number of undo steps
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get number of redo steps
    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }
}

/// Ordered group of commands applied and reversed as one step.
///
/// Children execute in order and undo in reverse order. If a child fails,
/// the children already applied in that pass are reversed before the error
/// is returned, so the target is never left half-edited.
pub struct CompositeCommand<T> {
    name: String,
    commands: Vec<Box<dyn Command<T>>>,
}

impl<T> CompositeCommand<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: Vec::new(),
        }
    }

    pub fn push(&mut self, command: Box<dyn Command<T>>) {
        self.commands.push(command);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl<T> Command<T> for CompositeCommand<T> {
    fn execute(&mut self, target: &mut T) -> ChartResult<()> {
        for i in 0..self.commands.len() {
            if let Err(e) = self.commands[i].execute(target) {
                for applied in self.commands[..i].iter_mut().rev() {
                    if let Err(rollback) = applied.undo(target) {
                        log::error!("Rollback of '{}' failed: {}", applied.name(), rollback);
                    }
                }
                return Err(e);
            }
        }
        Ok(())
    }

    fn undo(&mut self, target: &mut T) -> ChartResult<()> {
        let count = self.commands.len();
        for i in (0..count).rev() {
            if let Err(e) = self.commands[i].undo(target) {
                for undone in self.commands[i + 1..].iter_mut() {
                    if let Err(rollback) = undone.execute(target) {
                        log::error!("Rollback of '{}' failed: {}", undone.name(), rollback);
                    }
                }
                return Err(e);
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
