//! Score geometry
//!
//! Two coordinate systems are in play:
//! - pixel space: viewport coordinates, y grows downward
//! - score space: x grows with the lane index, y grows with the tick
//!
//! [`NoteGeometry`] holds the affine transform between them for one view
//! state (viewport size and scroll position) and derives the hit-test
//! rectangles for notes, hold thumbs and the selection marquee.

use serde::{Deserialize, Serialize};

use crate::{EditorConfig, LaneIndex, Tick};

// ═══════════════════════════════════════════════════════════════════════════════
// PRIMITIVES
// ═══════════════════════════════════════════════════════════════════════════════

/// 2D point
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointF {
    pub x: f32,
    pub y: f32,
}

impl PointF {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Round both coordinates up to whole pixels
    pub fn ceil(&self) -> Self {
        Self::new(self.x.ceil(), self.y.ceil())
    }
}

/// Axis-aligned rectangle with its origin at the minimum corner
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RectF {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl RectF {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Half-open containment: the minimum edges are inside, the maximum
    /// edges are not.
    pub fn contains(&self, point: PointF) -> bool {
        point.x >= self.left() && point.x < self.right() && point.y >= self.top() && point.y < self.bottom()
    }

    /// Grow by `margin` on every side
    pub fn expand(&self, margin: f32) -> Self {
        Self::new(
            self.x - margin,
            self.y - margin,
            self.width + margin * 2.0,
            self.height + margin * 2.0,
        )
    }

    /// Left edge strip used as a resize handle
    pub fn left_thumb(&self, rate: f32, minimum_width: f32) -> Self {
        let width = thumb_width(self.width, rate, minimum_width);
        Self::new(self.x, self.y, width, self.height)
    }

    /// Right edge strip used as a resize handle
    pub fn right_thumb(&self, rate: f32, minimum_width: f32) -> Self {
        let width = thumb_width(self.width, rate, minimum_width);
        Self::new(self.right() - width, self.y, width, self.height)
    }
}

fn thumb_width(width: f32, rate: f32, minimum_width: f32) -> f32 {
    (width * rate).max(minimum_width)
}

/// Viewport size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: i32,
    pub height: i32,
}

impl ViewportSize {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NOTE GEOMETRY
// ═══════════════════════════════════════════════════════════════════════════════

/// Transform and hit-test rectangles for one view state
#[derive(Debug, Clone, PartialEq)]
pub struct NoteGeometry {
    lane_count: LaneIndex,
    unit_lane_width: i32,
    border_thickness: i32,
    lane_area_width: i32,
    short_note_height: i32,
    unit_beat_height: f32,
    edge_hit_width_rate: f32,
    minimum_edge_hit_width: f32,
    clickable_margin: f32,
    unit_beat_tick: Tick,
    viewport: ViewportSize,
    head_tick: Tick,
}

impl NoteGeometry {
    /// `unit_beat_tick` must be positive; the editor only builds geometry
    /// for a loaded chart.
    pub fn new(config: &EditorConfig, unit_beat_tick: Tick, viewport: ViewportSize, head_tick: Tick) -> Self {
        Self {
            lane_count: config.lane_count,
            unit_lane_width: config.unit_lane_width,
            border_thickness: config.border_thickness(),
            lane_area_width: config.lane_area_width(),
            short_note_height: config.short_note_height,
            unit_beat_height: config.unit_beat_height,
            edge_hit_width_rate: config.edge_hit_width_rate,
            minimum_edge_hit_width: config.minimum_edge_hit_width(),
            clickable_margin: config.clickable_margin,
            unit_beat_tick: unit_beat_tick.max(1),
            viewport,
            head_tick,
        }
    }

    pub fn head_tick(&self) -> Tick {
        self.head_tick
    }

    /// Last tick visible at the top of the viewport
    pub fn tail_tick(&self) -> Tick {
        self.head_tick + (self.viewport.height as f32 * self.unit_beat_tick as f32 / self.unit_beat_height) as Tick
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Transform
    // ─────────────────────────────────────────────────────────────────────────────

    /// Horizontal offset centering the lane area in the viewport
    fn offset_x(&self) -> f32 {
        ((self.viewport.width - self.lane_area_width) / 2) as f32
    }

    /// Pixel y of score y = 0
    fn offset_y(&self) -> f32 {
        (self.viewport.height - 1) as f32 + self.y_from_tick(self.head_tick)
    }

    pub fn to_pixel(&self, score: PointF) -> PointF {
        PointF::new(score.x + self.offset_x(), self.offset_y() - score.y)
    }

    pub fn to_score(&self, pixel: PointF) -> PointF {
        PointF::new(pixel.x - self.offset_x(), self.offset_y() - pixel.y)
    }

    pub fn y_from_tick(&self, tick: Tick) -> f32 {
        tick as f32 * self.unit_beat_height / self.unit_beat_tick as f32
    }

    /// Tick at score y, truncated toward zero
    pub fn tick_from_y(&self, y: f32) -> Tick {
        (y * self.unit_beat_tick as f32 / self.unit_beat_height) as Tick
    }

    fn lane_pitch(&self) -> f32 {
        (self.unit_lane_width + self.border_thickness) as f32
    }

    /// Lane under score x, clamped into range
    pub fn lane_from_x(&self, x: f32) -> LaneIndex {
        ((x / self.lane_pitch()) as LaneIndex).clamp(0, self.lane_count - 1)
    }

    /// Whole lanes travelled between two score x positions (truncated)
    pub fn lane_delta(&self, from_x: f32, to_x: f32) -> LaneIndex {
        ((to_x - from_x) / self.lane_pitch()) as LaneIndex
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Rectangles (score space)
    // ─────────────────────────────────────────────────────────────────────────────

    /// Lane area between the head and tail ticks
    pub fn score_rect(&self) -> RectF {
        let head = self.y_from_tick(self.head_tick);
        let tail = self.y_from_tick(self.tail_tick());
        RectF::new(0.0, head, self.lane_area_width as f32, tail - head)
    }

    /// Drawn rectangle of a tap or hold end, centered on the tick
    pub fn note_rect(&self, tick: Tick, lane_index: LaneIndex) -> RectF {
        RectF::new(
            (self.lane_pitch() as i32 * lane_index + self.border_thickness) as f32,
            self.y_from_tick(tick) - (self.short_note_height / 2) as f32,
            self.unit_lane_width as f32,
            self.short_note_height as f32,
        )
    }

    /// Note rectangle grown by the click margin
    pub fn clickable_rect(&self, tick: Tick, lane_index: LaneIndex) -> RectF {
        self.note_rect(tick, lane_index).expand(self.clickable_margin)
    }

    /// Body of a hold from its start tick to its end tick
    pub fn hold_rect(&self, tick: Tick, lane_index: LaneIndex, duration: Tick) -> RectF {
        RectF::new(
            (self.lane_pitch() as i32 * lane_index + self.border_thickness) as f32,
            self.y_from_tick(tick),
            self.unit_lane_width as f32,
            self.y_from_tick(duration),
        )
    }

    pub fn left_thumb(&self, rect: &RectF) -> RectF {
        rect.left_thumb(self.edge_hit_width_rate, self.minimum_edge_hit_width)
    }

    pub fn right_thumb(&self, rect: &RectF) -> RectF {
        rect.right_thumb(self.edge_hit_width_rate, self.minimum_edge_hit_width)
    }

    /// Marquee of a selection over `[min_tick, max_tick]` and
    /// `lanes_count` lanes starting at `start_lane`. Padded vertically by one
    /// note height and snapped to whole pixels.
    pub fn selection_rect(
        &self,
        min_tick: Tick,
        max_tick: Tick,
        start_lane: LaneIndex,
        lanes_count: LaneIndex,
    ) -> RectF {
        let pitch = self.lane_pitch() as i32;
        let left = start_lane * pitch;
        let right = (start_lane + lanes_count) * pitch;
        let top = self.y_from_tick(min_tick) as i32 - self.short_note_height;
        let bottom = self.y_from_tick(max_tick) as i32 + self.short_note_height;
        RectF::new(left as f32, top as f32, (right - left) as f32, (bottom - top) as f32)
    }
}
