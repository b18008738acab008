//! Clipboard snapshot of selected notes
//!
//! A snapshot carries the notes, the tick the selection started at and the
//! resolution it was taken at, so it can be pasted into a chart with a
//! different resolution.

use serde::{Deserialize, Serialize};

use cf_core::{ChartError, ChartResult, LaneIndex, Note, NoteCollection, Tick, check_ticks_per_beat};

use crate::StateResult;

/// Transferable copy of selected notes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionData {
    /// Start of the copied selection range
    pub start_tick: Tick,
    /// Resolution of the chart the notes were copied from
    pub ticks_per_beat: Tick,
    pub notes: Vec<Note>,
}

impl SelectionData {
    pub fn new(start_tick: Tick, ticks_per_beat: Tick, notes: impl IntoIterator<Item = Note>) -> Self {
        Self {
            start_tick,
            ticks_per_beat,
            notes: notes.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn to_json(&self) -> StateResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> StateResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Notes ready to insert into a chart at `ticks_per_beat`, re-origined so
    /// the earliest note lands on `cursor_tick`.
    ///
    /// Ticks are rescaled by the ratio of resolutions with truncation toward
    /// zero. Fails without producing anything if a note would end up out of
    /// range (for example a hold shrinking to zero length).
    pub fn notes_at(
        &self,
        ticks_per_beat: Tick,
        cursor_tick: Tick,
        lane_count: LaneIndex,
    ) -> ChartResult<Vec<Note>> {
        check_ticks_per_beat(self.ticks_per_beat)?;
        check_ticks_per_beat(ticks_per_beat)?;

        let mut staged = NoteCollection::new(lane_count);
        for note in &self.notes {
            staged.add(*note)?;
        }
        if self.ticks_per_beat != ticks_per_beat {
            staged.update_ticks_per_beat(ticks_per_beat as f64 / self.ticks_per_beat as f64)?;
        }

        let origin_tick = staged.iter().map(|e| e.tap_hold().tick()).min().unwrap_or(0);
        let ids: Vec<_> = staged.iter().map(|e| (e.id, e.tap_hold().tick())).collect();
        for (id, tick) in ids {
            let offset = tick - origin_tick;
            let moved = offset.checked_add(cursor_tick).ok_or(ChartError::TickOverflow {
                tick: cursor_tick,
                duration: offset,
            })?;
            staged.set_tick(id, moved)?;
        }
        Ok(staged.iter().map(|e| e.note).collect())
    }
}
