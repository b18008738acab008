//! Pointer state machine
//!
//! One gesture is active at a time. A primary press picks the drag state
//! from the edit mode and whatever lies under the pointer, each move updates
//! the live notes or the selection, and the release commits at most one
//! command to the undo history.

use cf_core::{
    ChannelKind, ChartError, ChartResult, Note, NoteEntry, NoteGeometry, NoteId, NotePosition, PointF, TapHold,
    Tick,
};
use cf_state::{ChangeHoldDurationCommand, CompositeNoteCommand, InsertNoteCommand, MoveNoteCommand, RemoveNoteCommand};

use crate::{CursorHint, EditMode, NoteView, PointerButton, SelectionRange, ViewEvent};

// ═══════════════════════════════════════════════════════════════════════════════
// DRAG STATE
// ═══════════════════════════════════════════════════════════════════════════════

/// Part of a note grabbed in Edit mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NoteGrip {
    /// Tap, or the start of a hold: moves tick and lane
    Body,
    /// Hold end: changes the duration
    End,
    /// Left edge of a hold start: moves the lane leftward
    LeftThumb,
    /// Right edge of a hold start: moves the lane rightward
    RightThumb,
}

impl NoteGrip {
    fn cursor(&self) -> CursorHint {
        match self {
            Self::Body => CursorHint::Move,
            Self::End => CursorHint::ResizeVertical,
            Self::LeftThumb | Self::RightThumb => CursorHint::ResizeHorizontal,
        }
    }
}

/// Active gesture. Origins are in score space so they stay anchored while
/// the view scrolls under the pointer.
#[derive(Debug, Clone, Default)]
pub(crate) enum DragState {
    #[default]
    Idle,
    DraggingNote {
        id: NoteId,
        grip: NoteGrip,
        origin: PointF,
        before: NotePosition,
        before_duration: Tick,
        /// Placed by this press; committed as an insertion
        is_new: bool,
    },
    DraggingSelection {
        origin: PointF,
        range: SelectionRange,
        /// Positions at press time, taps first, then holds
        notes: Vec<(NoteId, NotePosition)>,
    },
    RangeSelecting {
        origin: PointF,
        press_pixel: PointF,
        erase: bool,
    },
}

impl DragState {
    pub(crate) fn cursor(&self) -> Option<CursorHint> {
        match self {
            Self::DraggingNote { grip, .. } => Some(grip.cursor()),
            Self::DraggingSelection { .. } => Some(CursorHint::Move),
            Self::Idle | Self::RangeSelecting { .. } => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// POINTER INPUT
// ═══════════════════════════════════════════════════════════════════════════════

impl NoteView {
    /// Start a gesture. Ignored when the view is not editable, for buttons
    /// other than the primary one, and while a gesture is already running.
    pub fn pointer_pressed(&mut self, button: PointerButton, pixel: PointF) -> ChartResult<()> {
        if !self.editable || button != PointerButton::Primary || self.pointer_down {
            return Ok(());
        }
        self.pointer_down = true;

        let pos = self.geometry().to_score(pixel);
        let result = match self.edit_mode {
            EditMode::Edit => self.press_edit(pos),
            EditMode::Select => {
                self.press_select(pos, pixel);
                Ok(())
            }
            EditMode::Erase => {
                self.begin_range_selection(pos, pixel, true);
                Ok(())
            }
        };
        self.sync_revision();
        result
    }

    /// Update the active gesture. Does nothing while no button is held.
    pub fn pointer_moved(&mut self, pixel: PointF) {
        if !self.pointer_down {
            return;
        }
        self.auto_scroll(pixel);

        let pos = self.geometry().to_score(pixel);
        let drag = std::mem::take(&mut self.drag);
        match &drag {
            DragState::Idle => {}
            DragState::DraggingNote {
                id,
                grip,
                origin,
                before,
                ..
            } => self.drag_note(*id, *grip, *origin, *before, pos),
            DragState::DraggingSelection { origin, range, notes } => {
                self.drag_selection(*origin, *range, notes, pos)
            }
            DragState::RangeSelecting { origin, .. } => self.update_range_selection(*origin, pos),
        }
        self.drag = drag;
        self.sync_revision();
    }

    /// Finish the active gesture and record its command, if any. The release
    /// may happen anywhere, including outside the viewport.
    pub fn pointer_released(&mut self, button: PointerButton, pixel: PointF) -> ChartResult<()> {
        if button != PointerButton::Primary || !self.pointer_down {
            return Ok(());
        }
        self.pointer_down = false;

        let result = match std::mem::take(&mut self.drag) {
            DragState::Idle => Ok(()),
            DragState::DraggingNote {
                id,
                grip,
                before,
                before_duration,
                is_new,
                ..
            } => self.commit_note(id, grip, before, before_duration, is_new),
            DragState::DraggingSelection { range, notes, .. } => {
                self.commit_selection(range, notes);
                Ok(())
            }
            DragState::RangeSelecting {
                press_pixel,
                erase: true,
                ..
            } => self.finish_erase(press_pixel, pixel),
            DragState::RangeSelecting { erase: false, .. } => Ok(()),
        };
        self.sync_revision();
        result
    }

    /// A secondary-button double click toggles between Edit and Select
    pub fn double_clicked(&mut self, button: PointerButton) {
        if button == PointerButton::Secondary {
            self.set_edit_mode(self.edit_mode.toggled());
        }
    }

    /// A gesture is in progress
    pub fn is_dragging(&self) -> bool {
        !matches!(self.drag, DragState::Idle)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Auto-scroll
    // ─────────────────────────────────────────────────────────────────────────────

    fn auto_scroll(&mut self, pixel: PointF) {
        let height = self.viewport.height as f32;
        let rate = self.config.auto_scroll_margin_rate;

        if pixel.y <= height * rate {
            self.set_head_tick(self.head_tick + self.unit_beat_tick);
            self.emit(ViewEvent::DragScroll);
        } else if pixel.y >= height * (1.0 - rate) {
            let back = (self.head_tick + self.padding_head_tick()).min(self.unit_beat_tick);
            self.set_head_tick(self.head_tick - back);
            self.emit(ViewEvent::DragScroll);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Edit mode
    // ─────────────────────────────────────────────────────────────────────────────

    fn press_edit(&mut self, pos: PointF) -> ChartResult<()> {
        let geometry = self.geometry();
        if !geometry.score_rect().contains(pos) {
            return Ok(());
        }

        if let Some((entry, grip)) = self.hit_note(&geometry, pos) {
            let tap_hold = entry.tap_hold();
            self.drag = DragState::DraggingNote {
                id: entry.id,
                grip,
                origin: pos,
                before: tap_hold.position(),
                before_duration: tap_hold.duration(),
                is_new: false,
            };
            return Ok(());
        }

        self.place_note(&geometry, pos)
    }

    /// Top-most note under `pos`: visible taps first, then visible holds,
    /// each searched from the most recently added.
    fn hit_note(&self, geometry: &NoteGeometry, pos: PointF) -> Option<(NoteEntry, NoteGrip)> {
        let head = geometry.head_tick();
        let tail = geometry.tail_tick();

        let tap = self.notes.taps().rev().find(|e| {
            let th = e.tap_hold();
            (head..=tail).contains(&th.tick()) && geometry.clickable_rect(th.tick(), th.lane_index()).contains(pos)
        });
        if let Some(entry) = tap {
            return Some((*entry, NoteGrip::Body));
        }

        for entry in self.notes.holds().rev() {
            let th = entry.tap_hold();
            if th.tick() > tail || th.end_tick() < head {
                continue;
            }
            if geometry.clickable_rect(th.end_tick(), th.lane_index()).contains(pos) {
                return Some((*entry, NoteGrip::End));
            }
            let rect = geometry.clickable_rect(th.tick(), th.lane_index());
            if geometry.left_thumb(&rect).contains(pos) {
                return Some((*entry, NoteGrip::LeftThumb));
            }
            if geometry.right_thumb(&rect).contains(pos) {
                return Some((*entry, NoteGrip::RightThumb));
            }
            if rect.contains(pos) {
                return Some((*entry, NoteGrip::Body));
            }
        }
        None
    }

    /// Add a note of the current type under the pointer and start dragging
    /// it: taps follow the pointer, holds stretch their end.
    fn place_note(&mut self, geometry: &NoteGeometry, pos: PointF) -> ChartResult<()> {
        let lane_count = self.config.lane_count;
        let tick = self.quantize(geometry.tick_from_y(pos.y)).max(0);
        let lane = geometry.lane_from_x(pos.x);
        let note_type = self.new_note_type;

        let tap_hold = if note_type.is_hold() {
            TapHold::hold(tick, lane, self.step_ticks(), lane_count)?
        } else {
            TapHold::tap(tick, lane, lane_count)?
        };
        let id = self.notes.add(Note::new(tap_hold, self.directions.channel_for(note_type)))?;

        self.drag = DragState::DraggingNote {
            id,
            grip: if note_type.is_hold() { NoteGrip::End } else { NoteGrip::Body },
            origin: pos,
            before: tap_hold.position(),
            before_duration: tap_hold.duration(),
            is_new: true,
        };
        Ok(())
    }

    /// Quantize step as a whole tick count, at least one
    fn step_ticks(&self) -> Tick {
        (self.quantize_step as Tick).max(1)
    }

    fn drag_note(&mut self, id: NoteId, grip: NoteGrip, origin: PointF, before: NotePosition, pos: PointF) {
        let geometry = self.geometry();
        let lane_count = self.config.lane_count;
        let xdiff = geometry.lane_delta(origin.x, pos.x);

        let result = match grip {
            NoteGrip::Body => {
                let tick = self.quantize(geometry.tick_from_y(pos.y)).max(0);
                let lane = (before.lane_index + xdiff).clamp(0, lane_count - 1);
                self.notes.set_position(id, NotePosition::new(tick, lane))
            }
            NoteGrip::End => match self.notes.entry(id) {
                Some(entry) => {
                    let start = entry.tap_hold().tick();
                    let end = self.quantize(geometry.tick_from_y(pos.y));
                    self.notes.set_duration(id, (end - start).max(self.step_ticks()))
                }
                None => Err(ChartError::NoteNotFound(id)),
            },
            NoteGrip::LeftThumb => {
                let lane = before.lane_index + xdiff.clamp(-before.lane_index, 0);
                self.notes.set_lane_index(id, lane)
            }
            NoteGrip::RightThumb => {
                let lane = before.lane_index + xdiff.clamp(0, lane_count - 1 - before.lane_index);
                self.notes.set_lane_index(id, lane)
            }
        };

        if let Err(e) = result {
            log::warn!("Rejected drag of note {}: {}", id, e);
        }
    }

    fn commit_note(
        &mut self,
        id: NoteId,
        grip: NoteGrip,
        before: NotePosition,
        before_duration: Tick,
        is_new: bool,
    ) -> ChartResult<()> {
        let entry = *self.notes.entry(id).ok_or(ChartError::NoteNotFound(id))?;
        if is_new {
            self.undo.push(Box::new(InsertNoteCommand::new(id, entry.note)));
            return Ok(());
        }

        let tap_hold = entry.tap_hold();
        match grip {
            NoteGrip::End => {
                let after = tap_hold.duration();
                if after != before_duration {
                    self.undo
                        .push(Box::new(ChangeHoldDurationCommand::new(id, before_duration, after)));
                }
            }
            NoteGrip::Body | NoteGrip::LeftThumb | NoteGrip::RightThumb => {
                let after = tap_hold.position();
                if after != before {
                    self.undo.push(Box::new(MoveNoteCommand::new(id, before, after)));
                }
            }
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Select mode
    // ─────────────────────────────────────────────────────────────────────────────

    fn press_select(&mut self, pos: PointF, pixel: PointF) {
        if self.selection_rect().contains(pos.ceil()) {
            let selected = self.selected_notes();
            let notes = selected
                .taps()
                .chain(selected.holds())
                .map(|e| (e.id, e.tap_hold().position()))
                .collect();
            self.drag = DragState::DraggingSelection {
                origin: pos,
                range: self.selected_range,
                notes,
            };
            return;
        }

        let tick = self.quantize(self.geometry().tick_from_y(pos.y)).max(0);
        self.set_current_tick(tick);
        self.begin_range_selection(pos, pixel, false);
    }

    /// Translate the selection and its notes by the quantized pointer
    /// travel. The selection never crosses tick 0 or the outer lanes.
    fn drag_selection(&mut self, origin: PointF, range: SelectionRange, notes: &[(NoteId, NotePosition)], pos: PointF) {
        let geometry = self.geometry();
        let lane_count = self.config.lane_count;

        let travel = geometry.tick_from_y(pos.y) - geometry.tick_from_y(origin.y);
        let tick_delta = self.quantize(travel).max(-range.min_tick());
        let max_start_lane = (lane_count - range.selected_lanes_count).max(0);
        let start_lane =
            (range.start_lane_index + geometry.lane_delta(origin.x, pos.x)).clamp(0, max_start_lane);
        let lane_delta = start_lane - range.start_lane_index;

        for (id, before) in notes {
            let after = NotePosition::new(before.tick + tick_delta, before.lane_index + lane_delta);
            if let Err(e) = self.notes.set_position(*id, after) {
                log::warn!("Rejected move of note {}: {}", id, e);
            }
        }

        let moved = SelectionRange {
            start_tick: range.start_tick + tick_delta,
            start_lane_index: start_lane,
            ..range
        };
        if moved != self.selected_range {
            self.set_selected_range(moved);
        }
    }

    fn commit_selection(&mut self, range: SelectionRange, notes: Vec<(NoteId, NotePosition)>) {
        let moved = self.selected_range;
        if notes.is_empty()
            || (moved.start_tick == range.start_tick && moved.start_lane_index == range.start_lane_index)
        {
            return;
        }

        let mut composite = CompositeNoteCommand::new("Move Notes");
        for (id, before) in notes {
            if let Some(entry) = self.notes.entry(id) {
                let after = entry.tap_hold().position();
                composite.push(Box::new(MoveNoteCommand::new(id, before, after)));
            }
        }
        log::debug!("Moved {} selected notes", composite.len());
        self.undo.push(Box::new(composite));
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Range selection (Select and Erase)
    // ─────────────────────────────────────────────────────────────────────────────

    fn begin_range_selection(&mut self, pos: PointF, pixel: PointF, erase: bool) {
        let start_tick = self.quantize(self.geometry().tick_from_y(pos.y)).max(0);
        self.set_selected_range(SelectionRange {
            start_tick,
            ..SelectionRange::EMPTY
        });
        self.drag = DragState::RangeSelecting {
            origin: pos,
            press_pixel: pixel,
            erase,
        };
    }

    fn update_range_selection(&mut self, origin: PointF, pos: PointF) {
        let geometry = self.geometry();
        let start_lane = geometry.lane_from_x(origin.x);
        let end_lane = geometry.lane_from_x(pos.x);
        let end_tick = self.quantize(geometry.tick_from_y(pos.y));
        let start_tick = self.selected_range.start_tick;

        self.set_selected_range(SelectionRange {
            start_tick,
            duration: end_tick - start_tick,
            start_lane_index: start_lane.min(end_lane),
            selected_lanes_count: (end_lane - start_lane).abs() + 1,
        });
    }

    /// A dragged erase removes everything in the swept range. A click
    /// removes the top-most note under the pointer, searching pads, then
    /// faders, then knobs.
    fn finish_erase(&mut self, press_pixel: PointF, release_pixel: PointF) -> ChartResult<()> {
        if press_pixel != release_pixel {
            let selected = self.selected_notes();
            self.remove_notes(selected.iter(), "Erase Notes")?;
            self.set_selected_range(SelectionRange::EMPTY);
            return Ok(());
        }

        let geometry = self.geometry();
        let pos = geometry.to_score(release_pixel);
        let hit = [ChannelKind::Pad, ChannelKind::Fader, ChannelKind::Knob]
            .into_iter()
            .find_map(|kind| {
                self.notes.channel(kind).iter().rev().find(|e| {
                    let th = e.tap_hold();
                    geometry.clickable_rect(th.tick(), th.lane_index()).contains(pos)
                })
            })
            .copied();

        if let Some(entry) = hit {
            self.undo
                .execute(&mut self.notes, Box::new(RemoveNoteCommand::new(entry.id, entry.note)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_core::{EditorConfig, ViewportSize};

    fn view() -> NoteView {
        NoteView::new(EditorConfig::default(), ViewportSize::new(200, 600)).unwrap()
    }

    /// Pixel at the center of the note rectangle for `tick` and `lane`
    fn pixel(view: &NoteView, tick: Tick, lane: i32) -> PointF {
        let g = view.geometry();
        let r = g.note_rect(tick, lane);
        g.to_pixel(PointF::new(r.x + r.width / 2.0, r.y + r.height / 2.0))
    }

    #[test]
    fn test_secondary_press_is_ignored() {
        let mut v = view();
        let p = pixel(&v, 480, 2);
        v.pointer_pressed(PointerButton::Secondary, p).unwrap();
        assert!(!v.is_dragging());
        v.pointer_released(PointerButton::Secondary, p).unwrap();
        assert!(v.notes().is_empty());
    }

    #[test]
    fn test_press_outside_score_rect_does_nothing() {
        let mut v = view();
        v.pointer_pressed(PointerButton::Primary, PointF::new(2.0, 300.0)).unwrap();
        assert!(!v.is_dragging());
        v.pointer_released(PointerButton::Primary, PointF::new(2.0, 300.0)).unwrap();
        assert!(v.notes().is_empty());
        assert!(!v.can_undo());
    }

    #[test]
    fn test_drag_cursor() {
        let mut v = view();
        let p = pixel(&v, 480, 2);
        v.pointer_pressed(PointerButton::Primary, p).unwrap();
        assert_eq!(v.hover_cursor(p), CursorHint::Move);
        v.pointer_released(PointerButton::Primary, p).unwrap();
        assert!(!v.is_dragging());
    }

    #[test]
    fn test_hit_prefers_taps_over_holds() {
        let mut v = view();
        v.notes.add_pad(TapHold::hold(480, 2, 960, 8).unwrap()).unwrap();
        let tap = v.notes.add_fader(TapHold::tap(480, 2, 8).unwrap(), Default::default()).unwrap();

        let g = v.geometry();
        let pos = g.to_score(pixel(&v, 480, 2));
        let (entry, grip) = v.hit_note(&g, pos).unwrap();
        assert_eq!(entry.id, tap);
        assert_eq!(grip, NoteGrip::Body);
    }

    #[test]
    fn test_auto_scroll_clamps_at_padding() {
        let mut v = view();
        v.auto_scroll(PointF::new(50.0, 590.0));
        assert_eq!(v.head_tick(), -60);
        v.auto_scroll(PointF::new(50.0, 590.0));
        assert_eq!(v.head_tick(), -60);
        v.auto_scroll(PointF::new(50.0, 10.0));
        assert_eq!(v.head_tick(), 420);
    }
}
