//! Error types for ChartForge

use thiserror::Error;

use crate::{LaneIndex, NoteId, Tick};

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChartError {
    #[error("Tick must not be negative: {0}")]
    NegativeTick(Tick),

    #[error("Lane index {lane} out of range [0, {lane_count})")]
    LaneOutOfRange { lane: LaneIndex, lane_count: LaneIndex },

    #[error("Hold duration must be positive: {0}")]
    InvalidDuration(Tick),

    #[error("Note end tick overflows: {tick} + {duration}")]
    TickOverflow { tick: Tick, duration: Tick },

    #[error("Tap notes have no duration")]
    NotAHold,

    #[error("Invalid ticks-per-beat factor: {0}")]
    InvalidTickFactor(f64),

    #[error("Invalid ticks per beat: {0}")]
    InvalidTicksPerBeat(Tick),

    #[error("Invalid time signature {numerator}/{denominator}")]
    InvalidTimeSignature { numerator: u32, denominator: u32 },

    #[error("Time signature list must start at tick 0")]
    MissingInitialTimeSignature,

    #[error("Invalid tempo: {0} BPM")]
    InvalidTempo(f64),

    #[error("Invalid quantize step: {0}")]
    InvalidQuantizeStep(f64),

    #[error("Note not found: {0}")]
    NoteNotFound(NoteId),

    #[error("Note already present: {0}")]
    DuplicateNote(NoteId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias
pub type ChartResult<T> = Result<T, ChartError>;
