//! Time-related types for chart editing
//!
//! Ticks are signed so that an invalid negative value can be represented and
//! rejected at the point of mutation. Every stored tick is non-negative.

use serde::{Deserialize, Serialize};

use crate::{ChartError, ChartResult};

/// Position on the timeline, in ticks
pub type Tick = i64;

/// Lane position, valid within `[0, lane_count)`
pub type LaneIndex = i32;

/// Default chart resolution
pub const DEFAULT_TICKS_PER_BEAT: Tick = 480;

/// Finest accepted chart resolution. Keeps bar lengths well inside `Tick`
/// for any `u32` numerator.
pub const MAX_TICKS_PER_BEAT: Tick = 1 << 20;

/// Reject a resolution outside `[1, MAX_TICKS_PER_BEAT]`
pub fn check_ticks_per_beat(ticks_per_beat: Tick) -> ChartResult<()> {
    if !(1..=MAX_TICKS_PER_BEAT).contains(&ticks_per_beat) {
        return Err(ChartError::InvalidTicksPerBeat(ticks_per_beat));
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// TIME SIGNATURE
// ═══════════════════════════════════════════════════════════════════════════════

/// Time signature (e.g. 4/4, 3/4, 7/8)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    /// Beats per bar
    pub numerator: u32,
    /// Note value that gets one beat
    pub denominator: u32,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::COMMON
    }
}

impl TimeSignature {
    /// Common time (4/4)
    pub const COMMON: Self = Self {
        numerator: 4,
        denominator: 4,
    };

    pub fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Ticks per bar at the given resolution
    pub fn bar_ticks(&self, unit_beat_tick: Tick) -> Tick {
        4 * unit_beat_tick * self.numerator as Tick / self.denominator as Tick
    }

    /// Ticks per beat at the given resolution
    pub fn beat_ticks(&self, unit_beat_tick: Tick) -> Tick {
        4 * unit_beat_tick / self.denominator as Tick
    }

    fn validate(&self) -> ChartResult<()> {
        if self.numerator == 0 || self.denominator == 0 {
            return Err(ChartError::InvalidTimeSignature {
                numerator: self.numerator,
                denominator: self.denominator,
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Time signature change event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignatureEvent {
    /// Position in ticks
    pub tick: Tick,
    /// New time signature
    pub signature: TimeSignature,
}

impl TimeSignatureEvent {
    pub fn new(tick: Tick, numerator: u32, denominator: u32) -> Self {
        Self {
            tick,
            signature: TimeSignature::new(numerator, denominator),
        }
    }
}

/// Tempo change event. Carried with the score for exporters; the editor core
/// never converts ticks to seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoEvent {
    /// Position in ticks
    pub tick: Tick,
    /// Tempo in BPM
    pub bpm: f64,
}

impl TempoEvent {
    pub fn new(tick: Tick, bpm: f64) -> Self {
        Self { tick, bpm }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TIME SIGNATURE MAP
// ═══════════════════════════════════════════════════════════════════════════════

/// Ordered, non-empty list of time signature events starting at tick 0
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TimeSignatureEvent>", into = "Vec<TimeSignatureEvent>")]
pub struct TimeSignatureMap {
    events: Vec<TimeSignatureEvent>,
}

impl Default for TimeSignatureMap {
    fn default() -> Self {
        Self {
            events: vec![TimeSignatureEvent::new(0, 4, 4)],
        }
    }
}

impl TimeSignatureMap {
    /// Build a map from events in any order. The earliest event must sit at
    /// tick 0.
    pub fn new(mut events: Vec<TimeSignatureEvent>) -> ChartResult<Self> {
        events.sort_by_key(|e| e.tick);
        let first = events.first().ok_or(ChartError::MissingInitialTimeSignature)?;
        if first.tick < 0 {
            return Err(ChartError::NegativeTick(first.tick));
        }
        if first.tick != 0 {
            return Err(ChartError::MissingInitialTimeSignature);
        }
        for event in &events {
            event.signature.validate()?;
        }
        Ok(Self { events })
    }

    pub fn events(&self) -> &[TimeSignatureEvent] {
        &self.events
    }

    /// Signature in effect at `tick` (by event position, not bar alignment)
    pub fn signature_at(&self, tick: Tick) -> TimeSignature {
        self.events
            .iter()
            .take_while(|e| e.tick <= tick)
            .last()
            .unwrap_or(&self.events[0])
            .signature
    }

    /// Lay the signatures out as bar-aligned segments at a given resolution.
    ///
    /// A signature change takes effect at the last bar boundary of the
    /// previous signature that does not pass the event's tick.
    pub fn bar_layout(&self, unit_beat_tick: Tick) -> ChartResult<BarLayout> {
        check_ticks_per_beat(unit_beat_tick)?;

        let mut segments = Vec::with_capacity(self.events.len());
        let mut head: Tick = 0;
        for (i, event) in self.events.iter().enumerate() {
            let bar_tick = event.signature.bar_ticks(unit_beat_tick);
            if bar_tick < 1 {
                return Err(ChartError::InvalidTimeSignature {
                    numerator: event.signature.numerator,
                    denominator: event.signature.denominator,
                });
            }
            let end = self
                .events
                .get(i + 1)
                .map(|next| head + (next.tick - head) / bar_tick * bar_tick);
            segments.push(BarSegment {
                head,
                end,
                bar_tick,
                signature: event.signature,
            });
            if let Some(end) = end {
                head = end;
            }
        }

        Ok(BarLayout {
            unit_beat_tick,
            segments,
        })
    }
}

impl TryFrom<Vec<TimeSignatureEvent>> for TimeSignatureMap {
    type Error = ChartError;

    fn try_from(events: Vec<TimeSignatureEvent>) -> ChartResult<Self> {
        Self::new(events)
    }
}

impl From<TimeSignatureMap> for Vec<TimeSignatureEvent> {
    fn from(map: TimeSignatureMap) -> Self {
        map.events
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BAR LAYOUT
// ═══════════════════════════════════════════════════════════════════════════════

/// Span of the timeline governed by one signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarSegment {
    /// First tick of the segment (a bar boundary)
    pub head: Tick,
    /// First tick of the next segment; `None` for the last one
    pub end: Option<Tick>,
    /// Length of one bar in this segment
    pub bar_tick: Tick,
    pub signature: TimeSignature,
}

impl BarSegment {
    fn contains(&self, tick: Tick) -> bool {
        self.end.is_none_or(|end| tick < end)
    }
}

/// A grid line for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLine {
    pub tick: Tick,
    /// Line starts a bar (otherwise it is a beat line)
    pub is_bar: bool,
}

/// Bar-aligned signature segments at a fixed resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarLayout {
    unit_beat_tick: Tick,
    segments: Vec<BarSegment>,
}

impl BarLayout {
    pub fn unit_beat_tick(&self) -> Tick {
        self.unit_beat_tick
    }

    pub fn segments(&self) -> &[BarSegment] {
        &self.segments
    }

    /// Segment that governs `tick`. Ticks before 0 belong to the first one.
    pub fn segment_containing(&self, tick: Tick) -> &BarSegment {
        // The last segment is open-ended, so the search always succeeds.
        let index = self
            .segments
            .iter()
            .position(|s| s.contains(tick))
            .unwrap_or(self.segments.len() - 1);
        &self.segments[index]
    }

    /// Start of the bar containing `tick`
    pub fn bar_start(&self, tick: Tick) -> Tick {
        let segment = self.segment_containing(tick);
        segment.head + (tick - segment.head) / segment.bar_tick * segment.bar_tick
    }

    /// Beat and bar lines within `[head_tick, tail_tick]`
    pub fn grid_lines(&self, head_tick: Tick, tail_tick: Tick) -> Vec<GridLine> {
        let mut lines = Vec::new();
        for segment in &self.segments {
            if segment.head > tail_tick {
                break;
            }
            let beat_tick = segment.signature.beat_ticks(self.unit_beat_tick).max(1);
            let first = if head_tick > segment.head {
                (head_tick - segment.head) / beat_tick
            } else {
                0
            };

            let mut i = first;
            loop {
                let tick = segment.head + i * beat_tick;
                if tick > tail_tick || segment.end.is_some_and(|end| tick >= end) {
                    break;
                }
                if tick >= head_tick {
                    lines.push(GridLine {
                        tick,
                        is_bar: i % segment.signature.numerator as Tick == 0,
                    });
                }
                i += 1;
            }
        }
        lines
    }

    /// 1-based bar numbers with their start ticks, for bars starting within
    /// `[head_tick, tail_tick)`
    pub fn bar_numbers(&self, head_tick: Tick, tail_tick: Tick) -> Vec<(u32, Tick)> {
        let mut bars = Vec::new();
        let mut count: u32 = 0;
        for segment in &self.segments {
            let mut tick = segment.head;
            while tick < tail_tick && segment.end.is_none_or(|end| tick < end) {
                count += 1;
                if tick >= head_tick {
                    bars.push((count, tick));
                }
                tick += segment.bar_tick;
            }
            if tick >= tail_tick {
                break;
            }
        }
        bars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_ticks() {
        assert_eq!(TimeSignature::COMMON.bar_ticks(480), 1920);
        assert_eq!(TimeSignature::new(3, 4).bar_ticks(480), 1440);
        assert_eq!(TimeSignature::new(7, 8).bar_ticks(480), 1680);
        assert_eq!(TimeSignature::new(7, 8).beat_ticks(480), 240);
    }

    #[test]
    fn test_map_requires_tick_zero() {
        assert_eq!(
            TimeSignatureMap::new(vec![]),
            Err(ChartError::MissingInitialTimeSignature)
        );
        assert_eq!(
            TimeSignatureMap::new(vec![TimeSignatureEvent::new(480, 4, 4)]),
            Err(ChartError::MissingInitialTimeSignature)
        );
        assert!(TimeSignatureMap::new(vec![TimeSignatureEvent::new(0, 0, 4)]).is_err());
    }

    #[test]
    fn test_map_sorts_events() {
        let map = TimeSignatureMap::new(vec![
            TimeSignatureEvent::new(1920, 3, 4),
            TimeSignatureEvent::new(0, 4, 4),
        ])
        .unwrap();
        assert_eq!(map.events()[0].tick, 0);
        assert_eq!(map.signature_at(2000), TimeSignature::new(3, 4));
        assert_eq!(map.signature_at(100), TimeSignature::COMMON);
    }

    #[test]
    fn test_segments_align_to_bars() {
        // 3/4 requested mid-bar at 2500 starts at the 4/4 bar boundary 1920.
        let map = TimeSignatureMap::new(vec![
            TimeSignatureEvent::new(0, 4, 4),
            TimeSignatureEvent::new(2500, 3, 4),
        ])
        .unwrap();
        let layout = map.bar_layout(480).unwrap();
        let segments = layout.segments();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].end, Some(1920));
        assert_eq!(segments[1].head, 1920);
        assert_eq!(segments[1].bar_tick, 1440);
        assert_eq!(layout.segment_containing(1919).head, 0);
        assert_eq!(layout.segment_containing(1920).head, 1920);
        assert_eq!(layout.bar_start(3400), 1920 + 1440);
    }

    #[test]
    fn test_grid_lines() {
        let layout = TimeSignatureMap::default().bar_layout(480).unwrap();
        let lines = layout.grid_lines(0, 1920);
        assert_eq!(lines.len(), 5);
        assert!(lines[0].is_bar);
        assert!(!lines[1].is_bar);
        assert!(lines[4].is_bar);
        assert_eq!(lines[4].tick, 1920);
    }

    #[test]
    fn test_bar_numbers_across_signatures() {
        let map = TimeSignatureMap::new(vec![
            TimeSignatureEvent::new(0, 4, 4),
            TimeSignatureEvent::new(3840, 3, 4),
        ])
        .unwrap();
        let layout = map.bar_layout(480).unwrap();
        let bars = layout.bar_numbers(0, 6000);
        assert_eq!(bars[0], (1, 0));
        assert_eq!(bars[1], (2, 1920));
        assert_eq!(bars[2], (3, 3840));
        assert_eq!(bars[3], (4, 3840 + 1440));
    }

    #[test]
    fn test_map_serde_validates() {
        let json = r#"[{"tick":0,"signature":{"numerator":4,"denominator":4}}]"#;
        let map: TimeSignatureMap = serde_json::from_str(json).unwrap();
        assert_eq!(map, TimeSignatureMap::default());

        let bad = r#"[{"tick":10,"signature":{"numerator":4,"denominator":4}}]"#;
        assert!(serde_json::from_str::<TimeSignatureMap>(bad).is_err());
    }
}
