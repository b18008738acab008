//! cf-core: Chart data model for ChartForge
//!
//! Tick and lane value types, note entities, the chart collection, time
//! signatures, quantization and the score geometry used for hit-testing.

mod collection;
mod config;
mod error;
mod geometry;
mod note;
mod quantize;
mod time;

pub use collection::*;
pub use config::*;
pub use error::*;
pub use geometry::*;
pub use note::*;
pub use quantize::*;
pub use time::*;
