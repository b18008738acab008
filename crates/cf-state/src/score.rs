//! Score persistence model
//!
//! A score bundles the chart resolution, the notes, and the time signature
//! and tempo events. It round-trips through JSON with note identities
//! intact, so recorded commands remain valid after a reload.

use serde::{Deserialize, Serialize};

use cf_core::{
    ChartError, DEFAULT_TICKS_PER_BEAT, LaneIndex, NoteCollection, TempoEvent, Tick, TimeSignatureEvent,
    TimeSignatureMap, check_ticks_per_beat,
};

use crate::{StateError, StateResult};

/// Current score schema version
pub const SCORE_VERSION: u32 = 1;

/// Default tempo of a new score
pub const DEFAULT_BPM: f64 = 120.0;

/// Complete chart document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    /// Schema version
    pub version: u32,
    pub ticks_per_beat: Tick,
    pub notes: NoteCollection,
    pub time_signatures: TimeSignatureMap,
    #[serde(default)]
    pub tempo_events: Vec<TempoEvent>,
}

impl Score {
    /// Empty score with the default resolution, 4/4 and 120 BPM
    pub fn new(lane_count: LaneIndex) -> Self {
        Self {
            version: SCORE_VERSION,
            ticks_per_beat: DEFAULT_TICKS_PER_BEAT,
            notes: NoteCollection::new(lane_count),
            time_signatures: TimeSignatureMap::default(),
            tempo_events: vec![TempoEvent::new(0, DEFAULT_BPM)],
        }
    }

    pub fn lane_count(&self) -> LaneIndex {
        self.notes.lane_count()
    }

    /// Check the parts serde cannot validate on its own
    pub fn validate(&self) -> StateResult<()> {
        if self.version > SCORE_VERSION {
            return Err(StateError::FutureVersion(self.version));
        }
        check_ticks_per_beat(self.ticks_per_beat)?;
        for event in &self.tempo_events {
            if event.tick < 0 {
                return Err(ChartError::NegativeTick(event.tick).into());
            }
            if !(event.bpm > 0.0) || !event.bpm.is_finite() {
                return Err(ChartError::InvalidTempo(event.bpm).into());
            }
        }
        Ok(())
    }

    /// Change the chart resolution, rescaling notes and events by the ratio
    /// of resolutions. Nothing changes if any part fails to rescale.
    pub fn update_ticks_per_beat(&mut self, ticks_per_beat: Tick) -> StateResult<()> {
        check_ticks_per_beat(ticks_per_beat)?;
        if ticks_per_beat == self.ticks_per_beat {
            return Ok(());
        }
        let factor = ticks_per_beat as f64 / self.ticks_per_beat as f64;
        let scale = |tick: Tick| (tick as f64 * factor) as Tick;

        let signatures = TimeSignatureMap::new(
            self.time_signatures
                .events()
                .iter()
                .map(|e| TimeSignatureEvent {
                    tick: scale(e.tick),
                    signature: e.signature,
                })
                .collect(),
        )?;
        let mut notes = self.notes.clone();
        notes.update_ticks_per_beat(factor)?;

        self.notes = notes;
        self.time_signatures = signatures;
        for event in &mut self.tempo_events {
            event.tick = scale(event.tick);
        }
        self.ticks_per_beat = ticks_per_beat;
        Ok(())
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> StateResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON and validate
    pub fn from_json(json: &str) -> StateResult<Self> {
        let score: Self = serde_json::from_str(json)?;
        score.validate()?;
        log::info!(
            "Loaded score v{} with {} notes at {} ticks per beat",
            score.version,
            score.notes.len(),
            score.ticks_per_beat
        );
        Ok(score)
    }
}
