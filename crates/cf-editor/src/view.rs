//! Note view
//!
//! The editing surface a renderer and an input host talk to. It owns the
//! chart collection, the undo history, the scroll position and the current
//! selection. Pointer handling lives in `interaction.rs`.

use cf_core::{
    ChartError, ChartResult, EditorConfig, GridDivision, GridLine, LaneIndex, Note, NoteCollection, NoteEntry,
    NoteGeometry, NoteId, Quantizer, RectF, TempoEvent, Tick, TimeSignatureMap, ViewportSize,
    DEFAULT_TICKS_PER_BEAT, check_ticks_per_beat,
};
use cf_state::{
    CompositeNoteCommand, InsertNoteCommand, MoveNoteCommand, NoteCommand, RemoveNoteCommand, Score, SelectionData,
    UndoManager, SCORE_VERSION,
};

use crate::interaction::DragState;
use crate::{CursorHint, EditMode, NoteDirections, NoteType, SelectionRange, ViewEvent};

/// A note inside the visible tick range with its score-space rectangles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleNote {
    pub id: NoteId,
    pub note: Note,
    /// Rectangle of the note head (the start of a hold)
    pub head_rect: RectF,
    /// Body of a hold, from start to end
    pub hold_rect: Option<RectF>,
    /// Rectangle of a hold end
    pub end_rect: Option<RectF>,
}

/// Interactive chart editing surface
pub struct NoteView {
    pub(crate) config: EditorConfig,
    pub(crate) notes: NoteCollection,
    pub(crate) undo: UndoManager<NoteCollection>,
    pub(crate) time_signatures: TimeSignatureMap,
    pub(crate) tempo_events: Vec<TempoEvent>,
    pub(crate) unit_beat_tick: Tick,
    pub(crate) quantize_step: f64,
    pub(crate) quantizer: Quantizer,
    pub(crate) viewport: ViewportSize,
    pub(crate) head_tick: Tick,
    pub(crate) current_tick: Tick,
    pub(crate) selected_range: SelectionRange,
    pub(crate) edit_mode: EditMode,
    pub(crate) new_note_type: NoteType,
    pub(crate) directions: NoteDirections,
    pub(crate) editable: bool,
    pub(crate) drag: DragState,
    pub(crate) pointer_down: bool,
    events: Vec<ViewEvent>,
    seen_revision: u64,
}

impl NoteView {
    /// Create an empty view. The configuration is validated here once.
    pub fn new(config: EditorConfig, viewport: ViewportSize) -> ChartResult<Self> {
        config.validate()?;
        let time_signatures = TimeSignatureMap::default();
        let unit_beat_tick = DEFAULT_TICKS_PER_BEAT;
        let quantize_step = GridDivision::default().step(unit_beat_tick);
        let quantizer = Quantizer::new(time_signatures.bar_layout(unit_beat_tick)?, quantize_step)?;

        Ok(Self {
            notes: NoteCollection::new(config.lane_count),
            undo: UndoManager::new(config.max_undo_history),
            config,
            time_signatures,
            tempo_events: Vec::new(),
            unit_beat_tick,
            quantize_step,
            quantizer,
            viewport,
            head_tick: 0,
            current_tick: 0,
            selected_range: SelectionRange::EMPTY,
            edit_mode: EditMode::default(),
            new_note_type: NoteType::default(),
            directions: NoteDirections::default(),
            editable: true,
            drag: DragState::Idle,
            pointer_down: false,
            events: Vec::new(),
            seen_revision: 0,
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SCORE
    // ═══════════════════════════════════════════════════════════════════════════

    /// Adopt a score: its notes, resolution and events. Clears the history,
    /// the selection and the cursor. The quantize step keeps its musical
    /// value under the new resolution.
    pub fn load_score(&mut self, score: Score) -> ChartResult<()> {
        if score.lane_count() != self.config.lane_count {
            return Err(ChartError::InvalidConfig(format!(
                "score has {} lanes, editor is configured for {}",
                score.lane_count(),
                self.config.lane_count
            )));
        }
        check_ticks_per_beat(score.ticks_per_beat)?;

        let quantize_step = self.quantize_step * score.ticks_per_beat as f64 / self.unit_beat_tick as f64;
        self.quantizer = Quantizer::new(score.time_signatures.bar_layout(score.ticks_per_beat)?, quantize_step)?;
        self.quantize_step = quantize_step;
        self.unit_beat_tick = score.ticks_per_beat;
        self.time_signatures = score.time_signatures;
        self.tempo_events = score.tempo_events;
        self.notes = score.notes;

        self.undo.clear();
        self.drag = DragState::Idle;
        self.pointer_down = false;
        self.set_selected_range(SelectionRange::EMPTY);
        self.set_current_tick(0);
        self.emit(ViewEvent::NotesChanged);
        self.seen_revision = self.notes.revision();

        log::info!(
            "Loaded chart with {} notes at {} ticks per beat",
            self.notes.len(),
            self.unit_beat_tick
        );
        Ok(())
    }

    /// Snapshot of the chart as a score document
    pub fn score(&self) -> Score {
        Score {
            version: SCORE_VERSION,
            ticks_per_beat: self.unit_beat_tick,
            notes: self.notes.clone(),
            time_signatures: self.time_signatures.clone(),
            tempo_events: self.tempo_events.clone(),
        }
    }

    /// Replace the time signatures. Quantization follows immediately.
    pub fn set_time_signatures(&mut self, time_signatures: TimeSignatureMap) -> ChartResult<()> {
        self.quantizer = Quantizer::new(time_signatures.bar_layout(self.unit_beat_tick)?, self.quantize_step)?;
        self.time_signatures = time_signatures;
        Ok(())
    }

    pub fn time_signatures(&self) -> &TimeSignatureMap {
        &self.time_signatures
    }

    pub fn tempo_events(&self) -> &[TempoEvent] {
        &self.tempo_events
    }

    pub fn set_tempo_events(&mut self, mut tempo_events: Vec<TempoEvent>) -> ChartResult<()> {
        for event in &tempo_events {
            if event.tick < 0 {
                return Err(ChartError::NegativeTick(event.tick));
            }
            if !(event.bpm > 0.0) || !event.bpm.is_finite() {
                return Err(ChartError::InvalidTempo(event.bpm));
            }
        }
        tempo_events.sort_by_key(|e| e.tick);
        self.tempo_events = tempo_events;
        Ok(())
    }

    pub fn notes(&self) -> &NoteCollection {
        &self.notes
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn unit_beat_tick(&self) -> Tick {
        self.unit_beat_tick
    }

    /// Latest tick covered by any note
    pub fn last_tick(&self) -> Tick {
        self.notes.last_tick()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // QUANTIZATION
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn quantize_step(&self) -> f64 {
        self.quantize_step
    }

    pub fn set_quantize_step(&mut self, step: f64) -> ChartResult<()> {
        self.quantizer = Quantizer::new(self.quantizer.layout().clone(), step)?;
        self.quantize_step = step;
        Ok(())
    }

    pub fn set_grid_division(&mut self, division: GridDivision) -> ChartResult<()> {
        self.set_quantize_step(division.step(self.unit_beat_tick))
    }

    pub fn quantize(&self, tick: Tick) -> Tick {
        self.quantizer.quantize(tick)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // VIEW STATE
    // ═══════════════════════════════════════════════════════════════════════════

    /// Transform and rectangles for the current scroll position
    pub fn geometry(&self) -> NoteGeometry {
        NoteGeometry::new(&self.config, self.unit_beat_tick, self.viewport, self.head_tick)
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: ViewportSize) {
        self.viewport = viewport;
    }

    pub fn head_tick(&self) -> Tick {
        self.head_tick
    }

    pub fn set_head_tick(&mut self, tick: Tick) {
        if self.head_tick == tick {
            return;
        }
        self.head_tick = tick;
        self.emit(ViewEvent::HeadTickChanged);
    }

    pub fn tail_tick(&self) -> Tick {
        self.geometry().tail_tick()
    }

    /// Blank space kept below tick 0 when scrolling back
    pub fn padding_head_tick(&self) -> Tick {
        self.unit_beat_tick / 8
    }

    pub fn current_tick(&self) -> Tick {
        self.current_tick
    }

    /// Move the cursor. Scrolls the view to the cursor when it leaves the
    /// visible range.
    pub fn set_current_tick(&mut self, tick: Tick) {
        let tick = tick.max(0);
        self.current_tick = tick;
        if tick < self.head_tick || tick > self.tail_tick() {
            self.set_head_tick(tick);
            self.emit(ViewEvent::DragScroll);
        }
    }

    pub fn selected_range(&self) -> SelectionRange {
        self.selected_range
    }

    pub fn set_selected_range(&mut self, range: SelectionRange) {
        self.selected_range = range;
        self.emit(ViewEvent::SelectedRangeChanged);
    }

    pub fn edit_mode(&self) -> EditMode {
        self.edit_mode
    }

    pub fn set_edit_mode(&mut self, mode: EditMode) {
        self.edit_mode = mode;
        self.emit(ViewEvent::EditModeChanged);
    }

    pub fn new_note_type(&self) -> NoteType {
        self.new_note_type
    }

    pub fn set_new_note_type(&mut self, note_type: NoteType) {
        self.new_note_type = note_type;
        self.emit(ViewEvent::NewNoteTypeChanged);
    }

    pub fn directions(&self) -> NoteDirections {
        self.directions
    }

    pub fn set_directions(&mut self, directions: NoteDirections) {
        self.directions = directions;
        self.emit(ViewEvent::DirectionsChanged);
    }

    pub fn editable(&self) -> bool {
        self.editable
    }

    pub fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
    }

    /// Take the pending change notifications
    pub fn drain_events(&mut self) -> Vec<ViewEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, event: ViewEvent) {
        self.events.push(event);
    }

    /// Emit `NotesChanged` once if the collection moved on since last seen
    pub(crate) fn sync_revision(&mut self) {
        let revision = self.notes.revision();
        if revision != self.seen_revision {
            self.seen_revision = revision;
            self.emit(ViewEvent::NotesChanged);
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // RENDERING QUERIES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Notes overlapping `[head_tick, tail_tick]` with their rectangles,
    /// pads first, then faders, then knobs
    pub fn visible_notes(&self) -> Vec<VisibleNote> {
        let geometry = self.geometry();
        let head = self.head_tick;
        let tail = geometry.tail_tick();

        self.notes
            .iter()
            .filter(|e| {
                let th = e.tap_hold();
                th.tick() <= tail && th.end_tick() >= head
            })
            .map(|e| {
                let th = e.tap_hold();
                let hold = th.is_hold();
                VisibleNote {
                    id: e.id,
                    note: e.note,
                    head_rect: geometry.note_rect(th.tick(), th.lane_index()),
                    hold_rect: hold.then(|| geometry.hold_rect(th.tick(), th.lane_index(), th.duration())),
                    end_rect: hold.then(|| geometry.note_rect(th.end_tick(), th.lane_index())),
                }
            })
            .collect()
    }

    /// Beat and bar lines in the visible range
    pub fn grid_lines(&self) -> Vec<GridLine> {
        self.quantizer.layout().grid_lines(self.head_tick, self.tail_tick())
    }

    /// Bar numbers starting in the visible range
    pub fn bar_numbers(&self) -> Vec<(u32, Tick)> {
        self.quantizer.layout().bar_numbers(self.head_tick.max(0), self.tail_tick())
    }

    /// Marquee of the current selection in score space
    pub fn selection_rect(&self) -> RectF {
        let range = self.selected_range;
        self.geometry().selection_rect(
            range.min_tick(),
            range.max_tick(),
            range.start_lane_index,
            range.selected_lanes_count,
        )
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // UNDO / REDO
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.undo.can_redo()
    }

    pub fn undo_name(&self) -> Option<&str> {
        self.undo.undo_name()
    }

    pub fn redo_name(&self) -> Option<&str> {
        self.undo.redo_name()
    }

    pub fn undo(&mut self) -> ChartResult<bool> {
        let result = self.undo.undo(&mut self.notes);
        self.sync_revision();
        result
    }

    pub fn redo(&mut self) -> ChartResult<bool> {
        let result = self.undo.redo(&mut self.notes);
        self.sync_revision();
        result
    }

    pub fn clear_history(&mut self) {
        self.undo.clear();
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SELECTION OPERATIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Copy of the notes contained in the current selection
    pub fn selected_notes(&self) -> NoteCollection {
        let range = self.selected_range;
        self.notes.filtered(|e| range.contains(e.tap_hold()))
    }

    /// Snapshot of the selected notes for the clipboard
    pub fn copy_selected_notes(&self) -> SelectionData {
        let selected = self.selected_notes();
        SelectionData::new(
            self.selected_range.min_tick(),
            self.unit_beat_tick,
            selected.iter().map(|e| e.note),
        )
    }

    /// Copy, then remove the selected notes
    pub fn cut_selected_notes(&mut self) -> ChartResult<SelectionData> {
        let data = self.copy_selected_notes();
        self.remove_selected_notes()?;
        Ok(data)
    }

    /// Remove every selected note as one undo step. Returns `false` when
    /// nothing was selected.
    pub fn remove_selected_notes(&mut self) -> ChartResult<bool> {
        let selected = self.selected_notes();
        let removed = self.remove_notes(selected.iter(), "Remove Selected Notes")?;
        self.sync_revision();
        Ok(removed)
    }

    pub(crate) fn remove_notes<'a>(
        &mut self,
        entries: impl Iterator<Item = &'a NoteEntry>,
        name: &str,
    ) -> ChartResult<bool> {
        let mut composite = CompositeNoteCommand::new(name);
        for entry in entries {
            composite.push(Box::new(RemoveNoteCommand::new(entry.id, entry.note)));
        }
        if composite.is_empty() {
            return Ok(false);
        }
        self.undo.execute(&mut self.notes, Box::new(composite))?;
        Ok(true)
    }

    /// Mirror the selected notes across the lanes as one undo step
    pub fn flip_selected_notes(&mut self) -> ChartResult<bool> {
        let selected = self.selected_notes();
        let command = self.flip_notes(&selected).inspect_err(|e| log::warn!("Flip rejected: {}", e))?;
        let flipped = match command {
            Some(command) => {
                self.undo.execute(&mut self.notes, command)?;
                true
            }
            None => false,
        };
        self.sync_revision();
        Ok(flipped)
    }

    /// Build the command mirroring every note of `notes` (taps first, then
    /// holds) to `lane_count - lane`. Returns `None` for an empty
    /// collection. Fails without building anything when a note would leave
    /// the lane range.
    pub(crate) fn flip_notes(&self, notes: &NoteCollection) -> ChartResult<Option<NoteCommand>> {
        let lane_count = self.config.lane_count;
        let mut composite = CompositeNoteCommand::new("Flip Notes");
        for entry in notes.taps().chain(notes.holds()) {
            let before = entry.tap_hold().position();
            let mut after = before;
            after.lane_index = flip_lane(before.lane_index, lane_count)?;
            composite.push(Box::new(MoveNoteCommand::new(entry.id, before, after)));
        }
        Ok((!composite.is_empty()).then(|| Box::new(composite) as NoteCommand))
    }

    /// Insert the snapshot at the current tick as one undo step. Returns
    /// `false` for an empty snapshot.
    pub fn paste_notes(&mut self, data: &SelectionData) -> ChartResult<bool> {
        self.paste(data, false)
    }

    /// Like [`NoteView::paste_notes`], mirroring the notes across the lanes
    pub fn paste_flipped_notes(&mut self, data: &SelectionData) -> ChartResult<bool> {
        self.paste(data, true)
    }

    fn paste(&mut self, data: &SelectionData, flip: bool) -> ChartResult<bool> {
        if data.is_empty() {
            return Ok(false);
        }
        let lane_count = self.config.lane_count;
        let mut notes = data.notes_at(self.unit_beat_tick, self.current_tick, lane_count)?;
        if flip {
            for note in &mut notes {
                let lane = flip_lane(note.tap_hold.lane_index(), lane_count)?;
                note.tap_hold.set_lane_index(lane, lane_count)?;
            }
        }

        let mut composite = CompositeNoteCommand::new(if flip { "Paste Flipped" } else { "Paste" });
        for note in notes {
            let id = self.notes.allocate_id();
            composite.push(Box::new(InsertNoteCommand::new(id, note)));
        }
        self.undo.execute(&mut self.notes, Box::new(composite))?;
        self.sync_revision();
        Ok(true)
    }

    /// Cursor shape for the pointer at `pixel`
    pub fn hover_cursor(&self, pixel: cf_core::PointF) -> CursorHint {
        if !self.editable {
            return CursorHint::NotAllowed;
        }
        if let Some(cursor) = self.drag.cursor() {
            return cursor;
        }
        let pos = self.geometry().to_score(pixel);
        match self.edit_mode {
            EditMode::Edit => self.hold_hover_cursor(pos),
            EditMode::Select if self.selection_rect().contains(pos) => CursorHint::Move,
            _ => CursorHint::Default,
        }
    }

    fn hold_hover_cursor(&self, pos: cf_core::PointF) -> CursorHint {
        let geometry = self.geometry();
        for entry in self.notes.holds().rev() {
            let th = entry.tap_hold();
            if geometry.clickable_rect(th.end_tick(), th.lane_index()).contains(pos) {
                return CursorHint::ResizeVertical;
            }
            let rect = geometry.clickable_rect(th.tick(), th.lane_index());
            if !rect.contains(pos) {
                continue;
            }
            if geometry.left_thumb(&rect).contains(pos) || geometry.right_thumb(&rect).contains(pos) {
                return CursorHint::ResizeHorizontal;
            }
            return CursorHint::Move;
        }
        CursorHint::Default
    }
}

/// Mirror a lane: `lane_count - lane`. Lane 0 has no mirror inside the
/// range and is rejected.
pub fn flip_lane(lane: LaneIndex, lane_count: LaneIndex) -> ChartResult<LaneIndex> {
    let flipped = lane_count - lane;
    if !(0..lane_count).contains(&flipped) {
        return Err(ChartError::LaneOutOfRange {
            lane: flipped,
            lane_count,
        });
    }
    Ok(flipped)
}
