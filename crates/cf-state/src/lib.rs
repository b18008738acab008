//! cf-state: Undo/redo, edit commands and persistence for ChartForge
//!
//! Provides the command engine that every chart mutation goes through, the
//! clipboard snapshot and the score document.

mod clipboard;
mod commands;
mod error;
mod score;
mod undo;

pub use clipboard::*;
pub use commands::*;
pub use error::*;
pub use score::*;
pub use undo::*;
