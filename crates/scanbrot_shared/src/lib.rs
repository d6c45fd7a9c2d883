//! # SCANBROT Shared
//!
//! Types shared between the render pipeline and its collaborators:
//! - Reference frame geometry and cadence constants
//! - `RenderConfig`, loaded once from TOML
//! - Input events from the parameter collaborator
//!
//! ## RULE
//!
//! Nothing here holds tick state.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod constants;
pub mod error;
pub mod events;

pub use config::{EngineConfig, GeometryConfig, RenderConfig, TimingConfig, ViewConfig};
pub use constants::{min_ticks_per_row, ENGINE_COUNT, FB_H, FB_W, READ_LATENCY, TICKS_PER_ROW, TOTAL_ROWS};
pub use error::{ConfigError, ConfigResult};
pub use events::{InputEvent, InputQueue, InputReceiver, InputSender};
