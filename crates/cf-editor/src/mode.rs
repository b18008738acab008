//! Editing modes and view-facing enums
//!
//! Three interaction paradigms share the pointer:
//! - Select: marquee selection and moving the selected notes
//! - Edit: placing, moving and resizing single notes
//! - Erase: deleting a clicked note or every note in a dragged range

use serde::{Deserialize, Serialize};

use cf_core::{Channel, ChannelKind, HorizontalDirection, VerticalDirection};

/// Pointer interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EditMode {
    Select,
    #[default]
    Edit,
    Erase,
}

impl EditMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Select => "Select",
            Self::Edit => "Edit",
            Self::Erase => "Erase",
        }
    }

    /// Mode reached by the secondary-button double click
    pub fn toggled(&self) -> Self {
        match self {
            Self::Edit => Self::Select,
            Self::Select | Self::Erase => Self::Edit,
        }
    }
}

/// Kind of note placed by a click in Edit mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NoteType {
    #[default]
    Pad,
    PadHold,
    Fader,
    FaderHold,
    Knob,
    KnobHold,
}

impl NoteType {
    pub fn is_hold(&self) -> bool {
        matches!(self, Self::PadHold | Self::FaderHold | Self::KnobHold)
    }

    pub fn channel_kind(&self) -> ChannelKind {
        match self {
            Self::Pad | Self::PadHold => ChannelKind::Pad,
            Self::Fader | Self::FaderHold => ChannelKind::Fader,
            Self::Knob | Self::KnobHold => ChannelKind::Knob,
        }
    }
}

/// Directions given to newly placed fader and knob notes. Taps and holds
/// are configured separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NoteDirections {
    pub fader: VerticalDirection,
    pub fader_hold: VerticalDirection,
    pub knob: HorizontalDirection,
    pub knob_hold: HorizontalDirection,
}

impl NoteDirections {
    /// Channel (with direction) for a new note of `note_type`
    pub fn channel_for(&self, note_type: NoteType) -> Channel {
        match note_type {
            NoteType::Pad | NoteType::PadHold => Channel::Pad,
            NoteType::Fader => Channel::Fader(self.fader),
            NoteType::FaderHold => Channel::Fader(self.fader_hold),
            NoteType::Knob => Channel::Knob(self.knob),
            NoteType::KnobHold => Channel::Knob(self.knob_hold),
        }
    }
}

/// Pointer button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Cursor shape suggested to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CursorHint {
    #[default]
    Default,
    /// Whole note or selection can be dragged
    Move,
    /// Lane can be changed from a hold edge
    ResizeHorizontal,
    /// Hold duration can be changed
    ResizeVertical,
    /// Editing is disabled
    NotAllowed,
}

/// Change notification for the rendering host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewEvent {
    /// The chart collection was mutated
    NotesChanged,
    HeadTickChanged,
    EditModeChanged,
    SelectedRangeChanged,
    NewNoteTypeChanged,
    DirectionsChanged,
    /// The view scrolled on its own (drag near an edge or cursor jump)
    DragScroll,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle() {
        assert_eq!(EditMode::Edit.toggled(), EditMode::Select);
        assert_eq!(EditMode::Select.toggled(), EditMode::Edit);
        assert_eq!(EditMode::Erase.toggled(), EditMode::Edit);
    }

    #[test]
    fn test_channel_for_uses_hold_directions() {
        let directions = NoteDirections {
            fader: VerticalDirection::Up,
            fader_hold: VerticalDirection::Down,
            knob: HorizontalDirection::Left,
            knob_hold: HorizontalDirection::Right,
        };
        assert_eq!(directions.channel_for(NoteType::Fader), Channel::Fader(VerticalDirection::Up));
        assert_eq!(
            directions.channel_for(NoteType::FaderHold),
            Channel::Fader(VerticalDirection::Down)
        );
        assert_eq!(
            directions.channel_for(NoteType::KnobHold),
            Channel::Knob(HorizontalDirection::Right)
        );
        assert_eq!(directions.channel_for(NoteType::PadHold), Channel::Pad);
    }

    #[test]
    fn test_note_type_kind() {
        assert!(NoteType::KnobHold.is_hold());
        assert!(!NoteType::Knob.is_hold());
        assert_eq!(NoteType::FaderHold.channel_kind(), ChannelKind::Fader);
    }
}
