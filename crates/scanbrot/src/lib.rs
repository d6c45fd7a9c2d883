//! # SCANBROT
//!
//! Scanline escape-time renderer: a pool of fixed-point engines computes a
//! frame in row-major order while one storage channel, shared between
//! display read-ahead and row write-back, streams rows to a backing store.
//!
//! ## Architecture
//!
//! ```text
//!  InputSender ──> ┌───────────┐ retire ┌──────────┐ taking/done ┌────────────┐
//!                  │ Scheduler │ ─────> │ BankSet  │ <─────────> │ Storage    │
//!                  │ + engines │        │ (2 rows) │ ──────────> │ Controller │
//!                  └───────────┘        └──────────┘  write-back └─────┬──────┘
//!                                                                      │ one channel
//!  ScanoutReader <── RowCache <──────── read-ahead ─────── BackingStore <┘
//! ```
//!
//! Everything advances in lockstep from [`RenderLoop::step`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use scanbrot::{RenderConfig, RenderLoop};
//!
//! let mut render = RenderLoop::new(RenderConfig::default())?;
//! render.run_until_idle(50_000_000)?;
//! let picture = render.store().as_bytes();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod bank;
pub mod error;
pub mod frame_dump;
pub mod render_loop;
pub mod row_cache;
pub mod scanout;
pub mod scheduler;
pub mod stats;
pub mod status;
pub mod storage;
pub mod timing;

pub use bank::{BankId, BankSet, BankState, RowBank, BANK_COUNT};
pub use error::{SimError, SimResult, StorageError, StorageResult};
pub use frame_dump::{FrameHeader, FRAME_MAGIC};
pub use render_loop::{RenderLoop, TickReport};
pub use row_cache::RowCache;
pub use scanout::ScanoutReader;
pub use scheduler::{Generation, Retirement, Scheduler, SchedulerReport, SchedulerStats, WorkItem};
pub use stats::{FrameTickAccumulator, RenderStats};
pub use status::{RenderStatus, StatusBoard};
pub use storage::{
    BackingStore, ChannelOp, ControllerState, Direction, Handshake, MemoryStore, RowAddresser,
    StorageChannel, StorageController,
};
pub use timing::{ScanPulse, ScanTiming};

pub use scanbrot_core::{escape_time, Coord, EscapeResult, ViewParams};
pub use scanbrot_shared::{InputEvent, InputSender, RenderConfig};
