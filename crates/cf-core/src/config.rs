//! Editor configuration
//!
//! Lane count, note metrics and hit-testing tolerances. Validated once when a
//! chart is loaded and then passed explicitly to the collection and the
//! geometry engine.

use serde::{Deserialize, Serialize};

use crate::{ChartError, ChartResult, LaneIndex};

/// Default number of lanes
pub const DEFAULT_LANE_COUNT: LaneIndex = 8;

/// Default undo history depth
pub const DEFAULT_MAX_UNDO_HISTORY: usize = 1000;

/// Editor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Number of lanes on the timeline
    pub lane_count: LaneIndex,
    /// Display width of one lane (pixels)
    pub unit_lane_width: i32,
    /// Display height of a tap note (pixels)
    pub short_note_height: i32,
    /// Display height of one beat (pixels)
    pub unit_beat_height: f32,
    /// Share of a note's width treated as its resize edge
    pub edge_hit_width_rate: f32,
    /// Extra margin around notes for forgiving hit detection (pixels)
    pub clickable_margin: f32,
    /// Maximum number of undo steps kept
    pub max_undo_history: usize,
    /// Share of the viewport height at each edge that scrolls during a drag
    pub auto_scroll_margin_rate: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            lane_count: DEFAULT_LANE_COUNT,
            unit_lane_width: 12,
            short_note_height: 5,
            unit_beat_height: 120.0,
            edge_hit_width_rate: 0.2,
            clickable_margin: 1.0,
            max_undo_history: DEFAULT_MAX_UNDO_HISTORY,
            auto_scroll_margin_rate: 0.1,
        }
    }
}

impl EditorConfig {
    /// Parse a configuration document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> ChartResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ChartError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ChartResult<()> {
        if self.lane_count < 1 {
            return Err(invalid(format!("lane_count must be positive, got {}", self.lane_count)));
        }
        if self.unit_lane_width < 1 {
            return Err(invalid(format!(
                "unit_lane_width must be positive, got {}",
                self.unit_lane_width
            )));
        }
        if self.short_note_height < 1 {
            return Err(invalid(format!(
                "short_note_height must be positive, got {}",
                self.short_note_height
            )));
        }
        if !(self.unit_beat_height > 0.0) {
            return Err(invalid(format!(
                "unit_beat_height must be positive, got {}",
                self.unit_beat_height
            )));
        }
        if !(0.0..=1.0).contains(&self.edge_hit_width_rate) {
            return Err(invalid(format!(
                "edge_hit_width_rate must be within [0, 1], got {}",
                self.edge_hit_width_rate
            )));
        }
        if !(0.0..0.5).contains(&self.auto_scroll_margin_rate) {
            return Err(invalid(format!(
                "auto_scroll_margin_rate must be within [0, 0.5), got {}",
                self.auto_scroll_margin_rate
            )));
        }
        if self.max_undo_history == 0 {
            return Err(invalid("max_undo_history must be positive".to_string()));
        }
        Ok(())
    }

    /// Lane separator thickness; thin lanes are drawn without separators.
    pub fn border_thickness(&self) -> i32 {
        if self.unit_lane_width < 5 { 0 } else { 1 }
    }

    /// Horizontal pitch between two neighbouring lanes
    pub fn lane_pitch(&self) -> i32 {
        self.unit_lane_width + self.border_thickness()
    }

    /// Total width of all lanes including separators
    pub fn lane_area_width(&self) -> i32 {
        self.unit_lane_width * self.lane_count + self.border_thickness() * (self.lane_count - 1)
    }

    /// Lower bound for the edge hit width of a note
    pub fn minimum_edge_hit_width(&self) -> f32 {
        self.unit_lane_width as f32 * 0.4
    }
}

fn invalid(message: String) -> ChartError {
    ChartError::InvalidConfig(message)
}
