//! Tick quantization
//!
//! Snaps ticks to a grid that restarts at every bar. When the step does not
//! divide the bar evenly the leftover at the end of the bar is split: the
//! first half snaps back to the last grid point, the second half forward to
//! the next bar line.

use serde::{Deserialize, Serialize};

use crate::{BarLayout, ChartError, ChartResult, Tick, TimeSignatureMap};

// ═══════════════════════════════════════════════════════════════════════════════
// GRID DIVISION
// ═══════════════════════════════════════════════════════════════════════════════

/// Note value used as the quantize step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GridDivision {
    /// Quarter note (beat)
    #[default]
    Quarter,
    /// Eighth note
    Eighth,
    /// Eighth triplet
    EighthTriplet,
    /// Sixteenth note
    Sixteenth,
    /// Sixteenth triplet
    SixteenthTriplet,
    /// Thirty-second note
    ThirtySecond,
    /// Thirty-second triplet
    ThirtySecondTriplet,
    /// Sixty-fourth note
    SixtyFourth,
}

impl GridDivision {
    /// Divisions per whole note
    pub fn per_whole_note(&self) -> u32 {
        match self {
            GridDivision::Quarter => 4,
            GridDivision::Eighth => 8,
            GridDivision::EighthTriplet => 12,
            GridDivision::Sixteenth => 16,
            GridDivision::SixteenthTriplet => 24,
            GridDivision::ThirtySecond => 32,
            GridDivision::ThirtySecondTriplet => 48,
            GridDivision::SixtyFourth => 64,
        }
    }

    /// Step length in ticks. May be fractional for triplets at low resolutions.
    pub fn step(&self, unit_beat_tick: Tick) -> f64 {
        unit_beat_tick as f64 * 4.0 / self.per_whole_note() as f64
    }

    pub fn label(&self) -> &'static str {
        match self {
            GridDivision::Quarter => "1/4",
            GridDivision::Eighth => "1/8",
            GridDivision::EighthTriplet => "1/8T",
            GridDivision::Sixteenth => "1/16",
            GridDivision::SixteenthTriplet => "1/16T",
            GridDivision::ThirtySecond => "1/32",
            GridDivision::ThirtySecondTriplet => "1/32T",
            GridDivision::SixtyFourth => "1/64",
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// QUANTIZER
// ═══════════════════════════════════════════════════════════════════════════════

/// Bar-aware tick quantizer
#[derive(Debug, Clone, PartialEq)]
pub struct Quantizer {
    layout: BarLayout,
    step: f64,
}

impl Quantizer {
    /// Create a quantizer with an explicit step in ticks
    pub fn new(layout: BarLayout, step: f64) -> ChartResult<Self> {
        if !(step > 0.0) || !step.is_finite() {
            return Err(ChartError::InvalidQuantizeStep(step));
        }
        Ok(Self { layout, step })
    }

    /// Create a quantizer from signatures, a resolution and a note value
    pub fn with_division(
        signatures: &TimeSignatureMap,
        unit_beat_tick: Tick,
        division: GridDivision,
    ) -> ChartResult<Self> {
        let layout = signatures.bar_layout(unit_beat_tick)?;
        Self::new(layout, division.step(unit_beat_tick))
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn layout(&self) -> &BarLayout {
        &self.layout
    }

    /// Snap `tick` to the nearest grid point of its bar. Exact halves go to
    /// the even grid index.
    pub fn quantize(&self, tick: Tick) -> Tick {
        let segment = self.layout.segment_containing(tick);
        let bar_tick = segment.bar_tick;
        let head_bar_tick = segment.head + (tick - segment.head) / bar_tick * bar_tick;
        let offset = tick - head_bar_tick;

        let offset_count = (offset as f64 / self.step).round_ties_even();
        let max_offset_count = (bar_tick as f64 / self.step) as Tick;
        let remnant = bar_tick - (max_offset_count as f64 * self.step) as Tick;

        if offset >= bar_tick - remnant / 2 {
            head_bar_tick + bar_tick
        } else {
            head_bar_tick + (offset_count * self.step) as Tick
        }
    }
}
