//! # Iteration Engine
//!
//! Evaluates one point's escape time, one `z <- z^2 + c` step per tick.
//!
//! ```text
//!            start(c, cap)            |z|^2 > 4 or n == cap
//!   ┌──────┐ ───────────> ┌─────────┐ ───────────────────> ┌──────┐
//!   │ Idle │              │ Running │                      │ Done │
//!   └──────┘ <─ ─ ─ ─ ─ ─ └─────────┘                      └──┬───┘
//!       ▲                  one step per tick                  │
//!       └─────────────────── next start() overwrites ─────────┘
//! ```
//!
//! The escape decision is taken on the full double-width magnitude. The
//! truncated magnitude kept in [`Engine::magnitude`] is diagnostics only.

use crate::fixed_point::{Coord, Wide};

/// Lowest accepted iteration cap.
pub const MIN_ITERS: u16 = 16;

/// Highest accepted iteration cap (12-bit).
pub const MAX_ITERS: u16 = 4095;

/// Clamps an iteration cap into `[MIN_ITERS, MAX_ITERS]`.
#[inline]
#[must_use]
pub const fn clamp_iters(max_iters: u16) -> u16 {
    if max_iters < MIN_ITERS {
        MIN_ITERS
    } else if max_iters > MAX_ITERS {
        MAX_ITERS
    } else {
        max_iters
    }
}

/// Engine lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EngineState {
    /// Never used, or reset.
    #[default]
    Idle,
    /// Mid-computation; one iteration per tick.
    Running,
    /// Finished; the result is held until the next `start`.
    Done,
}

/// Result of one escape-time evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EscapeResult {
    /// Iterations performed before escape (or the cap).
    pub iterations: u16,
    /// True when the point never escaped within the cap.
    pub inside: bool,
}

impl EscapeResult {
    /// Maps the result to the stored pixel byte.
    ///
    /// Inside maps to 0. Otherwise the low 8 bits of the count are stored,
    /// plus one unless already 255, so a genuine count never reads as inside.
    #[inline]
    #[must_use]
    pub const fn pixel(self) -> u8 {
        if self.inside {
            return 0;
        }
        let low = (self.iterations & 0xFF) as u8;
        if low == u8::MAX {
            low
        } else {
            low + 1
        }
    }
}

/// One escape-time worker.
///
/// Stateless between uses: `start` overwrites everything.
#[derive(Clone, Debug)]
pub struct Engine {
    /// Current z, real part.
    zr: Coord,
    /// Current z, imaginary part.
    zi: Coord,
    /// Constant c, real part.
    cr: Coord,
    /// Constant c, imaginary part.
    ci: Coord,
    /// Iterations performed so far.
    iteration: u16,
    /// Latched cap.
    max_iters: u16,
    /// Lifecycle.
    state: EngineState,
    /// Held result of the last completed evaluation.
    result: Option<EscapeResult>,
    /// Truncated `|z|^2` from the last step (diagnostics only).
    magnitude: Coord,
}

impl Engine {
    /// Creates an idle engine.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            zr: Coord::ZERO,
            zi: Coord::ZERO,
            cr: Coord::ZERO,
            ci: Coord::ZERO,
            iteration: 0,
            max_iters: MIN_ITERS,
            state: EngineState::Idle,
            result: None,
            magnitude: Coord::ZERO,
        }
    }

    /// Returns the lifecycle state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> EngineState {
        self.state
    }

    /// True when a new computation may be accepted.
    #[inline]
    #[must_use]
    pub const fn is_available(&self) -> bool {
        !matches!(self.state, EngineState::Running)
    }

    /// True while mid-computation.
    #[inline]
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self.state, EngineState::Running)
    }

    /// Iterations performed so far in the current (or last) evaluation.
    #[inline]
    #[must_use]
    pub const fn iteration(&self) -> u16 {
        self.iteration
    }

    /// The latched (clamped) cap.
    #[inline]
    #[must_use]
    pub const fn max_iters(&self) -> u16 {
        self.max_iters
    }

    /// Result of the last completed evaluation, held until the next `start`.
    #[inline]
    #[must_use]
    pub const fn result(&self) -> Option<EscapeResult> {
        self.result
    }

    /// Truncated Q3.22 `|z|^2` from the last step. Never gates escape.
    #[inline]
    #[must_use]
    pub const fn magnitude(&self) -> Coord {
        self.magnitude
    }

    /// Accepts a new point.
    ///
    /// Returns `false` and changes nothing when the engine is mid-computation;
    /// callers are expected to only start available engines.
    pub fn start(&mut self, c_re: Coord, c_im: Coord, max_iters: u16) -> bool {
        if self.is_running() {
            return false;
        }
        self.zr = Coord::ZERO;
        self.zi = Coord::ZERO;
        self.cr = c_re;
        self.ci = c_im;
        self.iteration = 0;
        self.max_iters = clamp_iters(max_iters);
        self.state = EngineState::Running;
        self.result = None;
        self.magnitude = Coord::ZERO;
        true
    }

    /// Performs one tick of work.
    ///
    /// Returns `Some` exactly on the tick the evaluation finishes (the
    /// one-tick done pulse); the result stays readable through [`Self::result`].
    pub fn step(&mut self) -> Option<EscapeResult> {
        if !self.is_running() {
            return None;
        }

        let zr2 = self.zr.wide_square();
        let zi2 = self.zi.wide_square();
        let mag = zr2 + zi2;
        self.magnitude = mag.truncate();

        // Strict `>`: |z|^2 == 4 keeps iterating.
        if mag > Wide::FOUR {
            return Some(self.finish(false));
        }
        if self.iteration >= self.max_iters {
            return Some(self.finish(true));
        }

        let cross = self.zr.wide_mul(self.zi).double();
        self.zr = (zr2 - zi2).truncate() + self.cr;
        self.zi = cross.truncate() + self.ci;
        self.iteration += 1;
        None
    }

    fn finish(&mut self, inside: bool) -> EscapeResult {
        let result = EscapeResult {
            iterations: self.iteration,
            inside,
        };
        self.state = EngineState::Done;
        self.result = Some(result);
        result
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs one point to completion on a scratch engine.
///
/// Reference path for tests and tools; the pipeline never calls this.
#[must_use]
pub fn escape_time(c_re: Coord, c_im: Coord, max_iters: u16) -> EscapeResult {
    let mut engine = Engine::new();
    engine.start(c_re, c_im, max_iters);
    loop {
        if let Some(result) = engine.step() {
            return result;
        }
    }
}
