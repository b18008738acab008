//! Chart note entities
//!
//! A note is the composition of two closed variants:
//! - the time shape: a momentary tap or a hold with a positive duration
//! - the channel: pad, fader (with a vertical direction) or knob (with a
//!   horizontal direction)
//!
//! Field writes go through validating setters; a rejected write leaves the
//! note unchanged.

use serde::{Deserialize, Serialize};

use crate::{ChartError, ChartResult, LaneIndex, Tick};

/// Stable identity of a note within a chart collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NoteId(pub u64);

impl std::fmt::Display for NoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TIME SHAPE
// ═══════════════════════════════════════════════════════════════════════════════

/// Tap vs hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteShape {
    /// Zero-duration note
    Tap,
    /// Note with a duration of at least one tick
    Hold { duration: Tick },
}

/// Which end of a hold a derived instant refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldEnd {
    Start,
    End,
}

/// Read-only view of one end of a hold, computed from the owning hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldTap<'a> {
    parent: &'a TapHold,
    end: HoldEnd,
}

impl HoldTap<'_> {
    pub fn tick(&self) -> Tick {
        match self.end {
            HoldEnd::Start => self.parent.tick,
            HoldEnd::End => self.parent.tick + self.parent.duration(),
        }
    }

    pub fn lane_index(&self) -> LaneIndex {
        self.parent.lane_index
    }

    /// The start of a hold is tapped; the end is released.
    pub fn is_tap(&self) -> bool {
        self.end == HoldEnd::Start
    }
}

/// Timing and lane of a single note
///
/// Deserialization checks the tick and duration; the lane is checked by the
/// owning collection, which knows the lane count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TapHoldData", into = "TapHoldData")]
pub struct TapHold {
    tick: Tick,
    lane_index: LaneIndex,
    shape: NoteShape,
}

impl TapHold {
    /// Create a tap
    pub fn tap(tick: Tick, lane_index: LaneIndex, lane_count: LaneIndex) -> ChartResult<Self> {
        check_tick(tick)?;
        check_lane(lane_index, lane_count)?;
        Ok(Self {
            tick,
            lane_index,
            shape: NoteShape::Tap,
        })
    }

    /// Create a hold
    pub fn hold(
        tick: Tick,
        lane_index: LaneIndex,
        duration: Tick,
        lane_count: LaneIndex,
    ) -> ChartResult<Self> {
        check_tick(tick)?;
        check_lane(lane_index, lane_count)?;
        check_duration(duration)?;
        check_end(tick, duration)?;
        Ok(Self {
            tick,
            lane_index,
            shape: NoteShape::Hold { duration },
        })
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn lane_index(&self) -> LaneIndex {
        self.lane_index
    }

    pub fn shape(&self) -> NoteShape {
        self.shape
    }

    pub fn is_hold(&self) -> bool {
        matches!(self.shape, NoteShape::Hold { .. })
    }

    /// Duration in ticks; always 0 for a tap
    pub fn duration(&self) -> Tick {
        match self.shape {
            NoteShape::Tap => 0,
            NoteShape::Hold { duration } => duration,
        }
    }

    /// Last tick covered by the note
    pub fn end_tick(&self) -> Tick {
        self.tick + self.duration()
    }

    pub fn set_tick(&mut self, tick: Tick) -> ChartResult<()> {
        check_tick(tick)?;
        check_end(tick, self.duration())?;
        self.tick = tick;
        Ok(())
    }

    pub fn set_lane_index(&mut self, lane_index: LaneIndex, lane_count: LaneIndex) -> ChartResult<()> {
        check_lane(lane_index, lane_count)?;
        self.lane_index = lane_index;
        Ok(())
    }

    /// Change the duration of a hold. Taps reject any duration.
    pub fn set_duration(&mut self, duration: Tick) -> ChartResult<()> {
        match &mut self.shape {
            NoteShape::Tap => Err(ChartError::NotAHold),
            NoteShape::Hold { duration: current } => {
                check_duration(duration)?;
                check_end(self.tick, duration)?;
                *current = duration;
                Ok(())
            }
        }
    }

    /// Start instant of a hold
    pub fn start_tap(&self) -> Option<HoldTap<'_>> {
        self.is_hold().then_some(HoldTap {
            parent: self,
            end: HoldEnd::Start,
        })
    }

    /// End instant of a hold
    pub fn end_tap(&self) -> Option<HoldTap<'_>> {
        self.is_hold().then_some(HoldTap {
            parent: self,
            end: HoldEnd::End,
        })
    }

    pub fn position(&self) -> NotePosition {
        NotePosition::new(self.tick, self.lane_index)
    }

    /// Tick and lane after scaling by `factor`, truncated toward zero.
    /// Returns `None` when a hold would collapse to zero length or end past
    /// the last representable tick.
    pub(crate) fn scaled(&self, factor: f64) -> Option<Self> {
        let tick = (self.tick as f64 * factor) as Tick;
        let shape = match self.shape {
            NoteShape::Tap => NoteShape::Tap,
            NoteShape::Hold { duration } => {
                let duration = (duration as f64 * factor) as Tick;
                if duration < 1 || tick.checked_add(duration).is_none() {
                    return None;
                }
                NoteShape::Hold { duration }
            }
        };
        Some(Self {
            tick,
            lane_index: self.lane_index,
            shape,
        })
    }
}

/// Tick and lane pair captured before/after an edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotePosition {
    pub tick: Tick,
    pub lane_index: LaneIndex,
}

impl NotePosition {
    pub fn new(tick: Tick, lane_index: LaneIndex) -> Self {
        Self { tick, lane_index }
    }
}

fn check_tick(tick: Tick) -> ChartResult<()> {
    if tick < 0 {
        return Err(ChartError::NegativeTick(tick));
    }
    Ok(())
}

fn check_lane(lane: LaneIndex, lane_count: LaneIndex) -> ChartResult<()> {
    if !(0..lane_count).contains(&lane) {
        return Err(ChartError::LaneOutOfRange { lane, lane_count });
    }
    Ok(())
}

fn check_duration(duration: Tick) -> ChartResult<()> {
    if duration < 1 {
        return Err(ChartError::InvalidDuration(duration));
    }
    Ok(())
}

fn check_end(tick: Tick, duration: Tick) -> ChartResult<()> {
    if tick.checked_add(duration).is_none() {
        return Err(ChartError::TickOverflow { tick, duration });
    }
    Ok(())
}

/// Persisted form of a [`TapHold`]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TapHoldData {
    pub tick: Tick,
    pub lane_index: LaneIndex,
    pub shape: NoteShape,
}

impl TryFrom<TapHoldData> for TapHold {
    type Error = ChartError;

    fn try_from(data: TapHoldData) -> ChartResult<Self> {
        check_tick(data.tick)?;
        if let NoteShape::Hold { duration } = data.shape {
            check_duration(duration)?;
            check_end(data.tick, duration)?;
        }
        Ok(Self {
            tick: data.tick,
            lane_index: data.lane_index,
            shape: data.shape,
        })
    }
}

impl From<TapHold> for TapHoldData {
    fn from(tap_hold: TapHold) -> Self {
        Self {
            tick: tap_hold.tick,
            lane_index: tap_hold.lane_index,
            shape: tap_hold.shape,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CHANNEL
// ═══════════════════════════════════════════════════════════════════════════════

/// Fader direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VerticalDirection {
    #[default]
    Up,
    Down,
}

/// Knob direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HorizontalDirection {
    #[default]
    Left,
    Right,
}

/// Input channel of a note and its channel-specific direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channel {
    Pad,
    Fader(VerticalDirection),
    Knob(HorizontalDirection),
}

/// Channel discriminant without direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelKind {
    Pad,
    Fader,
    Knob,
}

impl Channel {
    pub fn kind(&self) -> ChannelKind {
        match self {
            Channel::Pad => ChannelKind::Pad,
            Channel::Fader(_) => ChannelKind::Fader,
            Channel::Knob(_) => ChannelKind::Knob,
        }
    }
}

impl ChannelKind {
    pub fn name(&self) -> &'static str {
        match self {
            ChannelKind::Pad => "Pad",
            ChannelKind::Fader => "Fader",
            ChannelKind::Knob => "Knob",
        }
    }
}

/// A chart note: one tap/hold on one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub tap_hold: TapHold,
    pub channel: Channel,
}

impl Note {
    pub fn new(tap_hold: TapHold, channel: Channel) -> Self {
        Self { tap_hold, channel }
    }

    pub fn pad(tap_hold: TapHold) -> Self {
        Self::new(tap_hold, Channel::Pad)
    }

    pub fn fader(tap_hold: TapHold, direction: VerticalDirection) -> Self {
        Self::new(tap_hold, Channel::Fader(direction))
    }

    pub fn knob(tap_hold: TapHold, direction: HorizontalDirection) -> Self {
        Self::new(tap_hold, Channel::Knob(direction))
    }

    pub fn kind(&self) -> ChannelKind {
        self.channel.kind()
    }
}
