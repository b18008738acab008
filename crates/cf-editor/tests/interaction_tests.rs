//! Pointer-driven editing scenarios for cf-editor
//!
//! Drives NoteView end to end with press/move/release sequences:
//! - Edit mode: placing, moving, resizing and re-laning notes
//! - Select mode: range selection, moving the selection, flip
//! - Erase mode: click and drag removal
//! - Clipboard, auto-scroll, mode toggling and the editable flag

use approx::assert_relative_eq;

use cf_core::{
    Channel, EditorConfig, LaneIndex, NoteCollection, NotePosition, PointF, TapHold, Tick, VerticalDirection,
    ViewportSize,
};
use cf_editor::{CursorHint, EditMode, NoteDirections, NoteType, NoteView, PointerButton, SelectionRange, ViewEvent};
use cf_state::{Score, SelectionData};

const LANES: LaneIndex = 8;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// 200x600 view: 8 lanes of 13px pitch centered at x = 48, 4 ticks per
/// pixel, tick 0 on the bottom row while unscrolled
fn view() -> NoteView {
    init();
    NoteView::new(EditorConfig::default(), ViewportSize::new(200, 600)).unwrap()
}

fn view_with(setup: impl FnOnce(&mut NoteCollection)) -> NoteView {
    let mut v = view();
    let mut score = Score::new(LANES);
    setup(&mut score.notes);
    v.load_score(score).unwrap();
    v.drain_events();
    v
}

/// Pixel at the center of the note rectangle for `tick` and `lane`
fn note_pixel(view: &NoteView, tick: Tick, lane: LaneIndex) -> PointF {
    let g = view.geometry();
    let r = g.note_rect(tick, lane);
    g.to_pixel(PointF::new(r.x + r.width / 2.0, r.y + r.height / 2.0))
}

fn score_pixel(view: &NoteView, x: f32, y: f32) -> PointF {
    view.geometry().to_pixel(PointF::new(x, y))
}

fn click(view: &mut NoteView, p: PointF) {
    view.pointer_pressed(PointerButton::Primary, p).unwrap();
    view.pointer_released(PointerButton::Primary, p).unwrap();
}

fn drag(view: &mut NoteView, from: PointF, to: PointF) {
    view.pointer_pressed(PointerButton::Primary, from).unwrap();
    view.pointer_moved(to);
    view.pointer_released(PointerButton::Primary, to).unwrap();
}

fn positions(view: &NoteView) -> Vec<NotePosition> {
    view.notes().iter().map(|e| e.tap_hold().position()).collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// EDIT MODE
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_click_places_quantized_pad() {
    let mut v = view();
    let p = note_pixel(&v, 710, 3);
    assert_relative_eq!(p.y, 421.0);

    click(&mut v, p);

    assert_eq!(positions(&v), vec![NotePosition::new(480, 3)]);
    assert_eq!(v.notes().pads().len(), 1);
    assert_eq!(v.undo_name(), Some("Insert Note"));
}

#[test]
fn test_insert_then_undo_redo() {
    let mut v = view();
    {
        let p = note_pixel(&v, 960, 5);
        click(&mut v, p);
    }
    assert_eq!(v.notes().len(), 1);

    assert!(v.undo().unwrap());
    assert!(v.notes().is_empty());
    assert!(v.can_redo());

    assert!(v.redo().unwrap());
    assert_eq!(positions(&v), vec![NotePosition::new(960, 5)]);
}

#[test]
fn test_drag_tap_moves_and_undoes() {
    let mut v = view();
    {
        let p = note_pixel(&v, 480, 2);
        click(&mut v, p);
    }

    let from = note_pixel(&v, 480, 2);
    let to = note_pixel(&v, 960, 4);
    drag(&mut v, from, to);

    assert_eq!(positions(&v), vec![NotePosition::new(960, 4)]);
    assert_eq!(v.undo_name(), Some("Move Note"));

    v.undo().unwrap();
    assert_eq!(positions(&v), vec![NotePosition::new(480, 2)]);
    v.undo().unwrap();
    assert!(v.notes().is_empty());
}

#[test]
fn test_drag_back_to_start_records_nothing() {
    let mut v = view_with(|notes| {
        notes.add_pad(TapHold::tap(480, 2, LANES).unwrap()).unwrap();
    });
    let start = note_pixel(&v, 480, 2);

    v.pointer_pressed(PointerButton::Primary, start).unwrap();
    v.pointer_moved(note_pixel(&v, 960, 3));
    v.pointer_moved(start);
    v.pointer_released(PointerButton::Primary, start).unwrap();

    assert_eq!(positions(&v), vec![NotePosition::new(480, 2)]);
    assert!(!v.can_undo());
}

#[test]
fn test_drag_hold_end_changes_duration() {
    let mut v = view_with(|notes| {
        notes.add_pad(TapHold::hold(480, 1, 480, LANES).unwrap()).unwrap();
    });

    let from = note_pixel(&v, 960, 1);
    let to = note_pixel(&v, 1440, 1);
    drag(&mut v, from, to);

    assert_eq!(v.notes().pads()[0].tap_hold().duration(), 960);
    assert_eq!(v.undo_name(), Some("Change Hold Duration"));

    v.undo().unwrap();
    assert_eq!(v.notes().pads()[0].tap_hold().duration(), 480);
    v.redo().unwrap();
    assert_eq!(v.notes().pads()[0].tap_hold().duration(), 960);
}

#[test]
fn test_hold_duration_never_drops_below_step() {
    let mut v = view_with(|notes| {
        notes.add_pad(TapHold::hold(960, 1, 480, LANES).unwrap()).unwrap();
    });

    let from = note_pixel(&v, 1440, 1);
    let to = note_pixel(&v, 480, 1);
    drag(&mut v, from, to);

    assert_eq!(v.notes().pads()[0].tap_hold().duration(), 480);
    assert!(!v.can_undo());
}

#[test]
fn test_new_hold_stretches_while_dragging() {
    let mut v = view();
    v.set_new_note_type(NoteType::FaderHold);
    v.set_directions(NoteDirections {
        fader_hold: VerticalDirection::Down,
        ..NoteDirections::default()
    });

    let from = note_pixel(&v, 480, 1);
    let to = note_pixel(&v, 1440, 1);
    drag(&mut v, from, to);

    let entry = v.notes().faders()[0];
    assert_eq!(entry.tap_hold().tick(), 480);
    assert_eq!(entry.tap_hold().duration(), 960);
    assert_eq!(entry.note.channel, Channel::Fader(VerticalDirection::Down));
    assert_eq!(v.undo_name(), Some("Insert Note"));

    v.undo().unwrap();
    assert!(v.notes().is_empty());
}

#[test]
fn test_left_thumb_moves_lane_leftward_only() {
    let mut v = view_with(|notes| {
        notes.add_pad(TapHold::hold(480, 4, 480, LANES).unwrap()).unwrap();
    });

    // Left edge of the clickable start rect spans x = 52..56.8
    let from = score_pixel(&v, 53.0, 120.5);
    let to = score_pixel(&v, 27.0, 120.5);
    drag(&mut v, from, to);

    let th = *v.notes().pads()[0].tap_hold();
    assert_eq!(th.position(), NotePosition::new(480, 2));
    assert_eq!(th.duration(), 480);
    assert_eq!(v.undo_name(), Some("Move Note"));

    // Rightward travel from the left thumb is clamped away
    let from = score_pixel(&v, 27.0, 120.5);
    let to = score_pixel(&v, 53.0, 120.5);
    drag(&mut v, from, to);
    assert_eq!(v.notes().pads()[0].tap_hold().lane_index(), 2);
}

#[test]
fn test_right_thumb_moves_lane_rightward_only() {
    let mut v = view_with(|notes| {
        notes.add_pad(TapHold::hold(480, 4, 480, LANES).unwrap()).unwrap();
    });

    // Right edge of the clickable start rect spans x = 61.2..66
    let from = score_pixel(&v, 65.0, 120.5);
    {
        let p = score_pixel(&v, 52.0, 120.5);
        drag(&mut v, from, p);
    }
    assert_eq!(v.notes().pads()[0].tap_hold().lane_index(), 4);
    assert!(!v.can_undo());

    let from = score_pixel(&v, 65.0, 120.5);
    {
        let p = score_pixel(&v, 78.0, 120.5);
        drag(&mut v, from, p);
    }
    assert_eq!(v.notes().pads()[0].tap_hold().lane_index(), 5);
    assert_eq!(v.undo_name(), Some("Move Note"));
}

#[test]
fn test_body_drag_clamps_into_lanes() {
    let mut v = view_with(|notes| {
        notes.add_pad(TapHold::tap(480, 6, LANES).unwrap()).unwrap();
    });

    let from = note_pixel(&v, 480, 6);
    let to = PointF::new(from.x + 60.0, from.y);
    drag(&mut v, from, to);

    assert_eq!(positions(&v), vec![NotePosition::new(480, 7)]);
}

#[test]
fn test_not_editable_ignores_presses() {
    let mut v = view();
    v.set_editable(false);
    let p = note_pixel(&v, 480, 2);
    click(&mut v, p);

    assert!(v.notes().is_empty());
    assert_eq!(v.hover_cursor(p), CursorHint::NotAllowed);
}

#[test]
fn test_notes_changed_after_placement() {
    let mut v = view();
    v.drain_events();
    {
        let p = note_pixel(&v, 480, 2);
        click(&mut v, p);
    }
    assert!(v.drain_events().contains(&ViewEvent::NotesChanged));
}

// ═══════════════════════════════════════════════════════════════════════════════
// SELECT MODE
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_range_selection_then_flip() {
    let mut v = view_with(|notes| {
        notes.add_pad(TapHold::tap(0, 2, LANES).unwrap()).unwrap();
        notes.add_pad(TapHold::tap(480, 3, LANES).unwrap()).unwrap();
        notes.add_pad(TapHold::tap(960, 4, LANES).unwrap()).unwrap();
        notes.add_pad(TapHold::tap(480, 6, LANES).unwrap()).unwrap();
    });
    v.set_edit_mode(EditMode::Select);

    let from = note_pixel(&v, 0, 2);
    let to = note_pixel(&v, 1920, 4);
    drag(&mut v, from, to);

    assert_eq!(
        v.selected_range(),
        SelectionRange {
            start_tick: 0,
            duration: 1920,
            start_lane_index: 2,
            selected_lanes_count: 3,
        }
    );
    assert_eq!(v.selected_notes().len(), 3);
    assert!(!v.can_undo());

    assert!(v.flip_selected_notes().unwrap());
    let lanes: Vec<_> = v.notes().iter().map(|e| e.tap_hold().lane_index()).collect();
    assert_eq!(lanes, vec![6, 5, 4, 6]);
    assert_eq!(v.undo_name(), Some("Flip Notes"));

    v.undo().unwrap();
    let lanes: Vec<_> = v.notes().iter().map(|e| e.tap_hold().lane_index()).collect();
    assert_eq!(lanes, vec![2, 3, 4, 6]);
}

#[test]
fn test_range_selection_sets_cursor() {
    let mut v = view();
    v.set_edit_mode(EditMode::Select);
    let from = note_pixel(&v, 960, 1);
    let to = note_pixel(&v, 480, 3);
    drag(&mut v, from, to);

    assert_eq!(v.current_tick(), 960);
    let range = v.selected_range();
    assert_eq!(range.duration, -480);
    assert_eq!(range.min_tick(), 480);
    assert_eq!(range.max_tick(), 960);
}

#[test]
fn test_move_selection() {
    let mut v = view_with(|notes| {
        notes.add_pad(TapHold::tap(480, 2, LANES).unwrap()).unwrap();
        notes.add_pad(TapHold::tap(960, 3, LANES).unwrap()).unwrap();
    });
    v.set_edit_mode(EditMode::Select);
    v.set_selected_range(SelectionRange {
        start_tick: 480,
        duration: 480,
        start_lane_index: 2,
        selected_lanes_count: 2,
    });

    // Marquee spans x = 26..52 and y = 115..245 in score space
    let from = score_pixel(&v, 39.0, 180.0);
    assert_eq!(v.hover_cursor(from), CursorHint::Move);
    let to = score_pixel(&v, 52.0, 300.0);
    drag(&mut v, from, to);

    assert_eq!(
        positions(&v),
        vec![NotePosition::new(960, 3), NotePosition::new(1440, 4)]
    );
    assert_eq!(v.selected_range().start_tick, 960);
    assert_eq!(v.selected_range().start_lane_index, 3);
    assert_eq!(v.undo_name(), Some("Move Notes"));

    v.undo().unwrap();
    assert_eq!(
        positions(&v),
        vec![NotePosition::new(480, 2), NotePosition::new(960, 3)]
    );
}

#[test]
fn test_move_selection_stays_in_lanes() {
    let mut v = view_with(|notes| {
        notes.add_pad(TapHold::tap(480, 5, LANES).unwrap()).unwrap();
    });
    v.set_edit_mode(EditMode::Select);
    v.set_selected_range(SelectionRange {
        start_tick: 480,
        duration: 0,
        start_lane_index: 5,
        selected_lanes_count: 2,
    });

    // Marquee spans x = 65..91 and y = 115..125
    let from = score_pixel(&v, 70.0, 120.0);
    let to = score_pixel(&v, 70.0 + 13.0 * 4.0, 120.0);
    drag(&mut v, from, to);

    assert_eq!(v.selected_range().start_lane_index, 6);
    assert_eq!(positions(&v), vec![NotePosition::new(480, 6)]);
}

#[test]
fn test_move_empty_selection_records_nothing() {
    let mut v = view_with(|notes| {
        notes.add_pad(TapHold::tap(3840, 2, LANES).unwrap()).unwrap();
    });
    v.set_edit_mode(EditMode::Select);
    v.set_selected_range(SelectionRange {
        start_tick: 480,
        duration: 480,
        start_lane_index: 2,
        selected_lanes_count: 2,
    });

    let from = score_pixel(&v, 39.0, 180.0);
    {
        let p = score_pixel(&v, 52.0, 300.0);
        drag(&mut v, from, p);
    }
    assert!(!v.can_undo());
}

#[test]
fn test_secondary_double_click_toggles_mode() {
    let mut v = view();
    assert_eq!(v.edit_mode(), EditMode::Edit);

    v.double_clicked(PointerButton::Secondary);
    assert_eq!(v.edit_mode(), EditMode::Select);
    v.double_clicked(PointerButton::Primary);
    assert_eq!(v.edit_mode(), EditMode::Select);
    v.double_clicked(PointerButton::Secondary);
    assert_eq!(v.edit_mode(), EditMode::Edit);

    v.set_edit_mode(EditMode::Erase);
    v.double_clicked(PointerButton::Secondary);
    assert_eq!(v.edit_mode(), EditMode::Edit);
    assert!(v.drain_events().contains(&ViewEvent::EditModeChanged));
}

// ═══════════════════════════════════════════════════════════════════════════════
// ERASE MODE
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_erase_click_removes_top_pad_first() {
    let mut v = view_with(|notes| {
        notes.add_knob(TapHold::tap(480, 3, LANES).unwrap(), Default::default()).unwrap();
        notes.add_pad(TapHold::tap(480, 3, LANES).unwrap()).unwrap();
    });
    v.set_edit_mode(EditMode::Erase);

    {
        let p = note_pixel(&v, 480, 3);
        click(&mut v, p);
    }
    assert!(v.notes().pads().is_empty());
    assert_eq!(v.notes().knobs().len(), 1);
    assert_eq!(v.undo_name(), Some("Remove Note"));

    {
        let p = note_pixel(&v, 480, 3);
        click(&mut v, p);
    }
    assert!(v.notes().is_empty());

    v.undo().unwrap();
    v.undo().unwrap();
    assert_eq!(v.notes().len(), 2);
}

#[test]
fn test_erase_click_on_empty_space() {
    let mut v = view_with(|notes| {
        notes.add_pad(TapHold::tap(480, 3, LANES).unwrap()).unwrap();
    });
    v.set_edit_mode(EditMode::Erase);

    {
        let p = note_pixel(&v, 1440, 0);
        click(&mut v, p);
    }
    assert_eq!(v.notes().len(), 1);
    assert!(!v.can_undo());
}

#[test]
fn test_erase_drag_removes_swept_range() {
    let mut v = view_with(|notes| {
        notes.add_pad(TapHold::tap(480, 0, LANES).unwrap()).unwrap();
        notes.add_pad(TapHold::tap(960, 3, LANES).unwrap()).unwrap();
        notes.add_fader(TapHold::tap(1440, 7, LANES).unwrap(), Default::default()).unwrap();
        notes.add_pad(TapHold::tap(1920, 5, LANES).unwrap()).unwrap();
    });
    v.set_edit_mode(EditMode::Erase);

    let from = note_pixel(&v, 480, 0);
    let to = note_pixel(&v, 1440, 7);
    drag(&mut v, from, to);

    assert_eq!(positions(&v), vec![NotePosition::new(1920, 5)]);
    assert_eq!(v.selected_range(), SelectionRange::EMPTY);
    assert_eq!(v.undo_name(), Some("Erase Notes"));

    v.undo().unwrap();
    assert_eq!(v.notes().len(), 4);
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLIPBOARD
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_copy_paste_at_cursor() {
    let mut v = view_with(|notes| {
        notes.add_pad(TapHold::tap(480, 2, LANES).unwrap()).unwrap();
        notes.add_pad(TapHold::hold(960, 5, 480, LANES).unwrap()).unwrap();
    });
    v.set_selected_range(SelectionRange {
        start_tick: 480,
        duration: 1440,
        start_lane_index: 0,
        selected_lanes_count: LANES,
    });

    let data = v.copy_selected_notes();
    assert_eq!(data.start_tick, 480);
    let data = SelectionData::from_json(&data.to_json().unwrap()).unwrap();

    v.set_current_tick(1920);
    assert!(v.paste_notes(&data).unwrap());

    assert_eq!(
        positions(&v),
        vec![
            NotePosition::new(480, 2),
            NotePosition::new(960, 5),
            NotePosition::new(1920, 2),
            NotePosition::new(2400, 5),
        ]
    );
    assert_eq!(v.notes().pads()[3].tap_hold().duration(), 480);

    v.undo().unwrap();
    assert_eq!(v.notes().len(), 2);
}

#[test]
fn test_paste_from_other_resolution() {
    let mut v = view();
    let data = SelectionData::new(
        960,
        960,
        [cf_core::Note::pad(TapHold::hold(1920, 1, 960, LANES).unwrap())],
    );

    v.set_current_tick(480);
    v.paste_notes(&data).unwrap();

    // 1920 at 960 ticks per beat is 960 here; the earliest note lands on the cursor
    let th = *v.notes().pads()[0].tap_hold();
    assert_eq!(th.position(), NotePosition::new(480, 1));
    assert_eq!(th.duration(), 480);
}

#[test]
fn test_paste_aligns_earliest_note_to_cursor() {
    let mut v = view();
    {
        let p = note_pixel(&v, 710, 3);
        click(&mut v, p);
    }
    assert_eq!(positions(&v), vec![NotePosition::new(480, 3)]);

    v.set_selected_range(SelectionRange {
        start_tick: 0,
        duration: 1920,
        start_lane_index: 0,
        selected_lanes_count: LANES,
    });
    let data = v.copy_selected_notes();
    assert_eq!(data.notes.len(), 1);

    v.set_current_tick(1920);
    assert!(v.paste_notes(&data).unwrap());

    assert_eq!(
        positions(&v),
        vec![NotePosition::new(480, 3), NotePosition::new(1920, 3)]
    );
    assert_eq!(v.undo_name(), Some("Paste"));
}

#[test]
fn test_paste_flipped_rejects_lane_zero() {
    let mut v = view();
    let data = SelectionData::new(0, 480, [cf_core::Note::pad(TapHold::tap(0, 0, LANES).unwrap())]);

    assert!(v.paste_flipped_notes(&data).is_err());
    assert!(v.notes().is_empty());
    assert!(!v.can_undo());
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCROLLING
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_auto_scroll_while_dragging() {
    let mut v = view();
    v.set_edit_mode(EditMode::Select);
    v.pointer_pressed(PointerButton::Primary, PointF::new(87.0, 300.0)).unwrap();
    v.drain_events();

    v.pointer_moved(PointF::new(87.0, 30.0));
    assert_eq!(v.head_tick(), 480);
    let events = v.drain_events();
    assert!(events.contains(&ViewEvent::HeadTickChanged));
    assert!(events.contains(&ViewEvent::DragScroll));

    v.pointer_moved(PointF::new(87.0, 580.0));
    assert_eq!(v.head_tick(), 0);
    v.pointer_moved(PointF::new(87.0, 580.0));
    assert_eq!(v.head_tick(), -v.padding_head_tick());

    v.pointer_moved(PointF::new(87.0, 300.0));
    assert_eq!(v.head_tick(), -60);
    v.pointer_released(PointerButton::Primary, PointF::new(87.0, 300.0)).unwrap();

    // No scrolling once the button is up
    v.pointer_moved(PointF::new(87.0, 30.0));
    assert_eq!(v.head_tick(), -60);
}

#[test]
fn test_load_score_resets_view() {
    let mut v = view();
    {
        let p = note_pixel(&v, 480, 2);
        click(&mut v, p);
    }
    v.set_current_tick(9600);

    let mut score = Score::new(LANES);
    score.notes.add_pad(TapHold::tap(1920, 4, LANES).unwrap()).unwrap();
    v.load_score(score).unwrap();

    assert_eq!(v.current_tick(), 0);
    assert_eq!(v.head_tick(), 0);
    assert!(!v.can_undo());
    assert_eq!(positions(&v), vec![NotePosition::new(1920, 4)]);
    assert_eq!(v.last_tick(), 1920);
}
