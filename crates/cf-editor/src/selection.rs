//! Selection range

use serde::{Deserialize, Serialize};

use cf_core::{LaneIndex, TapHold, Tick};

/// Tick interval crossed with a lane interval.
///
/// `duration` is signed: a negative value extends the range backward from
/// `start_tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectionRange {
    pub start_tick: Tick,
    pub duration: Tick,
    pub start_lane_index: LaneIndex,
    pub selected_lanes_count: LaneIndex,
}

impl SelectionRange {
    pub const EMPTY: Self = Self {
        start_tick: 0,
        duration: 0,
        start_lane_index: 0,
        selected_lanes_count: 0,
    };

    pub fn min_tick(&self) -> Tick {
        self.start_tick + self.duration.min(0)
    }

    pub fn max_tick(&self) -> Tick {
        self.start_tick + self.duration.max(0)
    }

    /// One past the last selected lane
    pub fn end_lane_index(&self) -> LaneIndex {
        self.start_lane_index + self.selected_lanes_count
    }

    /// The whole note lies within `[min_tick, max_tick]` and its lane within
    /// `[start_lane_index, end_lane_index)`.
    pub fn contains(&self, tap_hold: &TapHold) -> bool {
        tap_hold.tick() >= self.min_tick()
            && tap_hold.end_tick() <= self.max_tick()
            && (self.start_lane_index..self.end_lane_index()).contains(&tap_hold.lane_index())
    }
}
