//! Chart note collection
//!
//! Holds every note of a chart in three per-channel sequences. Notes are
//! addressed by a stable [`NoteId`] so that commands can refer to them
//! without aliasing.

use serde::{Deserialize, Serialize};

use crate::{
    ChannelKind, ChartError, ChartResult, HorizontalDirection, LaneIndex, Note, NoteId,
    NotePosition, TapHold, Tick, VerticalDirection,
};

/// A note together with its identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEntry {
    pub id: NoteId,
    pub note: Note,
}

impl NoteEntry {
    pub fn tap_hold(&self) -> &TapHold {
        &self.note.tap_hold
    }
}

/// All notes of a chart, grouped by channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NoteCollectionData", into = "NoteCollectionData")]
pub struct NoteCollection {
    lane_count: LaneIndex,
    pads: Vec<NoteEntry>,
    faders: Vec<NoteEntry>,
    knobs: Vec<NoteEntry>,
    next_id: u64,
    revision: u64,
}

impl NoteCollection {
    /// Create an empty collection for `lane_count` lanes
    pub fn new(lane_count: LaneIndex) -> Self {
        Self {
            lane_count,
            pads: Vec::new(),
            faders: Vec::new(),
            knobs: Vec::new(),
            next_id: 1,
            revision: 0,
        }
    }

    /// Rebuild a collection from entries with known identities
    pub fn from_entries(
        lane_count: LaneIndex,
        entries: impl IntoIterator<Item = NoteEntry>,
    ) -> ChartResult<Self> {
        let mut collection = Self::new(lane_count);
        for entry in entries {
            collection.insert(entry.id, entry.note)?;
        }
        collection.revision = 0;
        Ok(collection)
    }

    pub fn lane_count(&self) -> LaneIndex {
        self.lane_count
    }

    /// Counter bumped by every structural or positional mutation
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Membership
    // ─────────────────────────────────────────────────────────────────────────────

    /// Add a note under a fresh identity
    pub fn add(&mut self, note: Note) -> ChartResult<NoteId> {
        let id = NoteId(self.next_id);
        self.insert(id, note)?;
        Ok(id)
    }

    /// Reserve a fresh identity without inserting anything
    pub fn allocate_id(&mut self) -> NoteId {
        let id = NoteId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn add_pad(&mut self, tap_hold: TapHold) -> ChartResult<NoteId> {
        self.add(Note::pad(tap_hold))
    }

    pub fn add_fader(&mut self, tap_hold: TapHold, direction: VerticalDirection) -> ChartResult<NoteId> {
        self.add(Note::fader(tap_hold, direction))
    }

    pub fn add_knob(&mut self, tap_hold: TapHold, direction: HorizontalDirection) -> ChartResult<NoteId> {
        self.add(Note::knob(tap_hold, direction))
    }

    /// Insert a note under a given identity (used to restore removed notes)
    pub fn insert(&mut self, id: NoteId, note: Note) -> ChartResult<()> {
        if self.contains(id) {
            return Err(ChartError::DuplicateNote(id));
        }
        self.check_lane(note.tap_hold.lane_index())?;

        self.channel_mut(note.kind()).push(NoteEntry { id, note });
        self.next_id = self.next_id.max(id.0 + 1);
        self.touch();
        Ok(())
    }

    /// Remove a note by identity. Removing an absent note is a no-op.
    pub fn remove(&mut self, id: NoteId) -> Option<Note> {
        for kind in [ChannelKind::Pad, ChannelKind::Fader, ChannelKind::Knob] {
            let channel = self.channel_mut(kind);
            if let Some(pos) = channel.iter().position(|e| e.id == id) {
                let entry = channel.remove(pos);
                self.touch();
                return Some(entry.note);
            }
        }
        None
    }

    pub fn contains(&self, id: NoteId) -> bool {
        self.entry(id).is_some()
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.entry(id).map(|e| &e.note)
    }

    pub fn entry(&self, id: NoteId) -> Option<&NoteEntry> {
        self.iter().find(|e| e.id == id)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Field mutation
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn set_tick(&mut self, id: NoteId, tick: Tick) -> ChartResult<()> {
        self.note_mut(id)?.tap_hold.set_tick(tick)?;
        self.touch();
        Ok(())
    }

    pub fn set_lane_index(&mut self, id: NoteId, lane_index: LaneIndex) -> ChartResult<()> {
        let lane_count = self.lane_count;
        self.note_mut(id)?.tap_hold.set_lane_index(lane_index, lane_count)?;
        self.touch();
        Ok(())
    }

    /// Move a note to `position`. Both fields change or neither does.
    pub fn set_position(&mut self, id: NoteId, position: NotePosition) -> ChartResult<()> {
        let lane_count = self.lane_count;
        let tap_hold = &mut self.note_mut(id)?.tap_hold;
        let mut moved = *tap_hold;
        moved.set_tick(position.tick)?;
        moved.set_lane_index(position.lane_index, lane_count)?;
        *tap_hold = moved;
        self.touch();
        Ok(())
    }

    pub fn set_duration(&mut self, id: NoteId, duration: Tick) -> ChartResult<()> {
        self.note_mut(id)?.tap_hold.set_duration(duration)?;
        self.touch();
        Ok(())
    }

    /// Rescale every tick and hold duration by `factor`, truncating toward
    /// zero. The whole collection is rescaled or, on error, left untouched.
    pub fn update_ticks_per_beat(&mut self, factor: f64) -> ChartResult<()> {
        if !(factor > 0.0) || !factor.is_finite() {
            return Err(ChartError::InvalidTickFactor(factor));
        }

        let mut scaled = Vec::with_capacity(self.len());
        for entry in self.iter() {
            let tap_hold = entry.note.tap_hold.scaled(factor).ok_or(ChartError::InvalidDuration(
                (entry.note.tap_hold.duration() as f64 * factor) as Tick,
            ))?;
            scaled.push(tap_hold);
        }

        for (entry, tap_hold) in self
            .pads
            .iter_mut()
            .chain(self.faders.iter_mut())
            .chain(self.knobs.iter_mut())
            .zip(scaled)
        {
            entry.note.tap_hold = tap_hold;
        }
        log::debug!("Rescaled {} notes by {}", self.len(), factor);
        self.touch();
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn pads(&self) -> &[NoteEntry] {
        &self.pads
    }

    pub fn faders(&self) -> &[NoteEntry] {
        &self.faders
    }

    pub fn knobs(&self) -> &[NoteEntry] {
        &self.knobs
    }

    pub fn channel(&self, kind: ChannelKind) -> &[NoteEntry] {
        match kind {
            ChannelKind::Pad => &self.pads,
            ChannelKind::Fader => &self.faders,
            ChannelKind::Knob => &self.knobs,
        }
    }

    /// Every note: pads, then faders, then knobs, each in insertion order
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &NoteEntry> + Clone {
        self.pads.iter().chain(self.faders.iter()).chain(self.knobs.iter())
    }

    /// Notes without duration across all channels
    pub fn taps(&self) -> impl DoubleEndedIterator<Item = &NoteEntry> + Clone {
        self.iter().filter(|e| !e.note.tap_hold.is_hold())
    }

    /// Notes with duration across all channels
    pub fn holds(&self) -> impl DoubleEndedIterator<Item = &NoteEntry> + Clone {
        self.iter().filter(|e| e.note.tap_hold.is_hold())
    }

    pub fn len(&self) -> usize {
        self.pads.len() + self.faders.len() + self.knobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Latest tick covered by any note, 0 for an empty chart
    pub fn last_tick(&self) -> Tick {
        self.iter().map(|e| e.note.tap_hold.end_tick()).max().unwrap_or(0)
    }

    /// Copy of the notes matching `predicate`, keeping their identities
    pub fn filtered(&self, predicate: impl Fn(&NoteEntry) -> bool) -> Self {
        let keep = |entries: &[NoteEntry]| -> Vec<NoteEntry> {
            entries.iter().filter(|e| predicate(*e)).copied().collect()
        };
        Self {
            lane_count: self.lane_count,
            pads: keep(&self.pads),
            faders: keep(&self.faders),
            knobs: keep(&self.knobs),
            next_id: self.next_id,
            revision: 0,
        }
    }

    fn channel_mut(&mut self, kind: ChannelKind) -> &mut Vec<NoteEntry> {
        match kind {
            ChannelKind::Pad => &mut self.pads,
            ChannelKind::Fader => &mut self.faders,
            ChannelKind::Knob => &mut self.knobs,
        }
    }

    fn note_mut(&mut self, id: NoteId) -> ChartResult<&mut Note> {
        self.pads
            .iter_mut()
            .chain(self.faders.iter_mut())
            .chain(self.knobs.iter_mut())
            .find(|e| e.id == id)
            .map(|e| &mut e.note)
            .ok_or(ChartError::NoteNotFound(id))
    }

    fn check_lane(&self, lane: LaneIndex) -> ChartResult<()> {
        if !(0..self.lane_count).contains(&lane) {
            return Err(ChartError::LaneOutOfRange {
                lane,
                lane_count: self.lane_count,
            });
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

/// Persisted form of a collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteCollectionData {
    pub lane_count: LaneIndex,
    #[serde(default)]
    pub pads: Vec<NoteEntry>,
    #[serde(default)]
    pub faders: Vec<NoteEntry>,
    #[serde(default)]
    pub knobs: Vec<NoteEntry>,
}

impl TryFrom<NoteCollectionData> for NoteCollection {
    type Error = ChartError;

    fn try_from(data: NoteCollectionData) -> ChartResult<Self> {
        let check = |entries: &[NoteEntry], kind: ChannelKind| -> ChartResult<()> {
            match entries.iter().find(|e| e.note.kind() != kind) {
                Some(e) => Err(ChartError::Serialization(format!(
                    "note {} listed under {} is a {}",
                    e.id,
                    kind.name(),
                    e.note.kind().name()
                ))),
                None => Ok(()),
            }
        };
        check(&data.pads, ChannelKind::Pad)?;
        check(&data.faders, ChannelKind::Fader)?;
        check(&data.knobs, ChannelKind::Knob)?;

        let entries = data.pads.into_iter().chain(data.faders).chain(data.knobs);
        Self::from_entries(data.lane_count, entries)
    }
}

impl From<NoteCollection> for NoteCollectionData {
    fn from(collection: NoteCollection) -> Self {
        Self {
            lane_count: collection.lane_count,
            pads: collection.pads,
            faders: collection.faders,
            knobs: collection.knobs,
        }
    }
}
