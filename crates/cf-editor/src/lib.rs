//! cf-editor: Interactive chart editing for ChartForge
//!
//! Selection ranges, edit modes and the pointer state machine behind
//! [`NoteView`], the surface a renderer draws and an input host drives.

mod interaction;
mod mode;
mod selection;
mod view;

pub use mode::*;
pub use selection::*;
pub use view::*;
