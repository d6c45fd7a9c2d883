//! # SCANBROT Core
//!
//! The numeric kernel of the scanline escape-time renderer:
//! - Q3.22 fixed-point coordinates with double-width products
//! - The iteration engine, one `z <- z^2 + c` step per tick
//! - A fixed pool of engines addressed by slot index
//!
//! ## Architecture Rules
//!
//! 1. **No floating point in the iteration** - `f64` only at the config edge
//! 2. **No heap allocations per tick** - the pool is sized once
//! 3. **Deterministic** - same view, same bytes, every host
//!
//! ## Example
//!
//! ```rust,ignore
//! use scanbrot_core::{escape_time, Coord};
//!
//! let result = escape_time(Coord::ZERO, Coord::ZERO, 16);
//! assert!(result.inside);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod engine;
pub mod fixed_point;
pub mod pool;
pub mod view;

pub use engine::{clamp_iters, escape_time, Engine, EngineState, EscapeResult, MAX_ITERS, MIN_ITERS};
pub use fixed_point::{Coord, Wide, COORD_BITS, FRAC_BITS};
pub use pool::{EngineId, EnginePool, EngineSlot};
pub use view::ViewParams;
