//! # Storage Channel
//!
//! The single shared, non-reentrant path to the backing store.
//!
//! ```text
//!   tick t      tick t+1     tick t+2
//!   Read(a) ──> [in flight] ─> [in flight] ──> row cache (line, col)
//!   Write(a, v) lands in the store the same tick.
//! ```
//!
//! One operation per tick. The channel records the direction it was driven
//! in and counts, without performing, anything that would collide on the
//! wire: a write while read data is still in flight, or a read/write
//! direction change with no idle tick in between.

use scanbrot_shared::READ_LATENCY;
use tracing::error;

use super::store::BackingStore;
use crate::row_cache::RowCache;

/// Channel direction during one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Direction {
    /// Not driven.
    #[default]
    Idle,
    /// Read-owned (requests issuing or draining).
    Read,
    /// Write-owned.
    Write,
}

/// What the controller drives onto the channel this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelOp {
    /// Release the channel.
    Idle,
    /// Hold read direction without a new request, letting reads land.
    Drain,
    /// Request `addr`; the byte lands in the row cache at `(line, col)`.
    Read {
        /// Store address.
        addr: usize,
        /// Row cache line.
        line: usize,
        /// Column within the line.
        col: usize,
    },
    /// Store `value` at `addr`.
    Write {
        /// Store address.
        addr: usize,
        /// Byte to store.
        value: u8,
    },
}

impl ChannelOp {
    /// Direction this operation drives.
    #[must_use]
    pub const fn direction(self) -> Direction {
        match self {
            Self::Idle => Direction::Idle,
            Self::Drain | Self::Read { .. } => Direction::Read,
            Self::Write { .. } => Direction::Write,
        }
    }
}

/// Read data on its way back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct InFlight {
    line: usize,
    col: usize,
    value: u8,
}

/// Channel counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChannelStats {
    /// Read requests issued.
    pub reads: u64,
    /// Writes performed.
    pub writes: u64,
    /// Ticks not driven.
    pub idle_ticks: u64,
    /// Ticks in read direction.
    pub read_ticks: u64,
    /// Ticks in write direction.
    pub write_ticks: u64,
    /// Store addressing failures.
    pub store_errors: u64,
    /// Contention and turnaround violations (must stay zero).
    pub violations: u64,
}

/// The storage channel over a backing store.
pub struct StorageChannel<S> {
    store: S,
    in_flight: [Option<InFlight>; READ_LATENCY],
    direction: Direction,
    last_driven: Direction,
    stats: ChannelStats,
}

impl<S: BackingStore> StorageChannel<S> {
    /// Wraps `store`.
    pub fn new(store: S) -> Self {
        Self {
            store,
            in_flight: [None; READ_LATENCY],
            direction: Direction::Idle,
            last_driven: Direction::Idle,
            stats: ChannelStats::default(),
        }
    }

    /// The store.
    #[inline]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Direction driven in the last tick.
    #[inline]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// True while read data is still on its way.
    #[inline]
    pub fn reads_in_flight(&self) -> bool {
        self.in_flight.iter().any(Option::is_some)
    }

    /// Counters.
    #[inline]
    pub const fn stats(&self) -> &ChannelStats {
        &self.stats
    }

    /// Clocks the channel once: lands the oldest read into `cache`, then
    /// performs `op`.
    pub fn tick(&mut self, op: ChannelOp, cache: &mut RowCache) {
        if let Some(landed) = self.in_flight[READ_LATENCY - 1].take() {
            cache.write(landed.line, landed.col, landed.value);
        }
        self.in_flight.rotate_right(1);

        let direction = op.direction();
        self.check_turnaround(direction);

        match op {
            ChannelOp::Idle | ChannelOp::Drain => {}
            ChannelOp::Read { addr, line, col } => {
                self.stats.reads += 1;
                match self.store.read(addr) {
                    Ok(value) => self.in_flight[0] = Some(InFlight { line, col, value }),
                    Err(err) => {
                        self.stats.store_errors += 1;
                        self.stats.violations += 1;
                        error!(%err, "storage read failed");
                    }
                }
            }
            ChannelOp::Write { addr, value } => {
                if self.reads_in_flight() {
                    self.stats.violations += 1;
                    error!(addr, "write refused: read data still in flight");
                } else {
                    self.stats.writes += 1;
                    if let Err(err) = self.store.write(addr, value) {
                        self.stats.store_errors += 1;
                        self.stats.violations += 1;
                        error!(%err, "storage write failed");
                    }
                }
            }
        }

        match direction {
            Direction::Idle => self.stats.idle_ticks += 1,
            Direction::Read => self.stats.read_ticks += 1,
            Direction::Write => self.stats.write_ticks += 1,
        }
        self.direction = direction;
    }

    fn check_turnaround(&mut self, next: Direction) {
        if next == Direction::Idle {
            self.last_driven = Direction::Idle;
            return;
        }
        if self.last_driven != Direction::Idle && self.last_driven != next {
            self.stats.violations += 1;
            error!(from = ?self.last_driven, to = ?next, "direction change without turnaround");
        }
        self.last_driven = next;
    }
}
