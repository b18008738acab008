//! Concrete commands for chart edits
//!
//! Provides undoable commands for:
//! - Inserting and removing notes
//! - Moving notes (tick and lane together)
//! - Changing hold durations
//!
//! Commands refer to notes by [`NoteId`] and store absolute before/after
//! values, so undo and redo reproduce exact tick, lane and duration values
//! and stay valid across a reload of the collection.

use cf_core::{ChartError, ChartResult, Note, NoteCollection, NoteId, NotePosition, Tick};

use crate::{Command, CompositeCommand};

/// Command over a chart collection
pub type NoteCommand = Box<dyn Command<NoteCollection>>;

/// Group of chart commands
pub type CompositeNoteCommand = CompositeCommand<NoteCollection>;

// ═══════════════════════════════════════════════════════════════════════════════
// MEMBERSHIP COMMANDS
// ═══════════════════════════════════════════════════════════════════════════════

/// Insert a note
#[derive(Debug, Clone)]
pub struct InsertNoteCommand {
    id: NoteId,
    note: Note,
}

impl InsertNoteCommand {
    pub fn new(id: NoteId, note: Note) -> Self {
        Self { id, note }
    }

    pub fn id(&self) -> NoteId {
        self.id
    }
}

impl Command<NoteCollection> for InsertNoteCommand {
    fn execute(&mut self, notes: &mut NoteCollection) -> ChartResult<()> {
        notes.insert(self.id, self.note)
    }

    fn undo(&mut self, notes: &mut NoteCollection) -> ChartResult<()> {
        notes.remove(self.id).ok_or(ChartError::NoteNotFound(self.id))?;
        Ok(())
    }

    fn name(&self) -> &str {
        "Insert Note"
    }
}

/// Remove a note
#[derive(Debug, Clone)]
pub struct RemoveNoteCommand {
    id: NoteId,
    note: Note,
}

impl RemoveNoteCommand {
    /// `note` is the state to restore on undo
    pub fn new(id: NoteId, note: Note) -> Self {
        Self { id, note }
    }
}

impl Command<NoteCollection> for RemoveNoteCommand {
    fn execute(&mut self, notes: &mut NoteCollection) -> ChartResult<()> {
        notes.remove(self.id).ok_or(ChartError::NoteNotFound(self.id))?;
        Ok(())
    }

    fn undo(&mut self, notes: &mut NoteCollection) -> ChartResult<()> {
        notes.insert(self.id, self.note)
    }

    fn name(&self) -> &str {
        "Remove Note"
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FIELD COMMANDS
// ═══════════════════════════════════════════════════════════════════════════════

/// Move a note to a new tick and lane
#[derive(Debug, Clone)]
pub struct MoveNoteCommand {
    id: NoteId,
    before: NotePosition,
    after: NotePosition,
}

impl MoveNoteCommand {
    pub fn new(id: NoteId, before: NotePosition, after: NotePosition) -> Self {
        Self { id, before, after }
    }
}

impl Command<NoteCollection> for MoveNoteCommand {
    fn execute(&mut self, notes: &mut NoteCollection) -> ChartResult<()> {
        notes.set_position(self.id, self.after)
    }

    fn undo(&mut self, notes: &mut NoteCollection) -> ChartResult<()> {
        notes.set_position(self.id, self.before)
    }

    fn name(&self) -> &str {
        "Move Note"
    }
}

/// Change the duration of a hold
#[derive(Debug, Clone)]
pub struct ChangeHoldDurationCommand {
    id: NoteId,
    before: Tick,
    after: Tick,
}

impl ChangeHoldDurationCommand {
    pub fn new(id: NoteId, before: Tick, after: Tick) -> Self {
        Self { id, before, after }
    }
}

impl Command<NoteCollection> for ChangeHoldDurationCommand {
    fn execute(&mut self, notes: &mut NoteCollection) -> ChartResult<()> {
        notes.set_duration(self.id, self.after)
    }

    fn undo(&mut self, notes: &mut NoteCollection) -> ChartResult<()> {
        notes.set_duration(self.id, self.before)
    }

    fn name(&self) -> &str {
        "Change Hold Duration"
    }
}
