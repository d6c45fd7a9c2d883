//! # Storage Transaction Controller
//!
//! Owns the storage channel. Each row period it runs one read-ahead burst
//! into the row cache, then at most one write-back burst from a Full bank.
//!
//! ```text
//!            row_start                   last col
//!  ┌──────┐ ─────────> ┌───────────┐ ───────────> ┌─────────────┐
//!  │ Idle │            │ ReadBurst │              │ ReadFlush×2 │
//!  └──────┘            └───────────┘              └──────┬──────┘
//!      ▲                                 Full bank?  yes │  no
//!      │    ┌────────────┐  ┌────────────┐ <─────────────┘   │
//!      │    │ WriteBurst │<─│ WritePrime │  (asserts taking) │
//!      │    └─────┬──────┘  └────────────┘                   │
//!      │          ▼                                          │
//!      │    ┌────────────┐ <─────────────────────────────────┘
//!      └────│ Turnaround │  (asserts done after a write burst)
//!           └────────────┘
//! ```
//!
//! Channel direction per state: ReadBurst and ReadFlush drive Read,
//! WriteBurst drives Write, everything else is Idle. So the direction within
//! a row period is Idle, Read..., Idle, Write..., Idle.

use tracing::{error, trace, warn};

use super::addressing::RowAddresser;
use super::channel::{ChannelOp, StorageChannel};
use super::store::BackingStore;
use crate::bank::{BankId, BankSet, BankState};
use crate::row_cache::RowCache;
use crate::timing::ScanPulse;

/// Stages in ReadFlush; matches the channel's read latency.
#[allow(clippy::cast_possible_truncation)]
pub const FLUSH_STAGES: u8 = scanbrot_shared::READ_LATENCY as u8;

/// Ownership signals from the controller to the scheduler for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Handshake {
    /// Bank the controller starts consuming (Full -> Committing).
    pub taking: Option<BankId>,
    /// Bank whose write burst ended last tick (Committing -> Free).
    pub done: Option<BankId>,
}

/// Controller state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ControllerState {
    /// Waiting for a row start.
    #[default]
    Idle,
    /// Reading `row` into the row cache.
    ReadBurst {
        /// Row being prefetched.
        row: usize,
        /// Next column to request.
        col: usize,
    },
    /// Letting in-flight reads land before releasing the channel.
    ReadFlush {
        /// Row being prefetched.
        row: usize,
        /// Flush stage, `0..FLUSH_STAGES`.
        stage: u8,
    },
    /// One idle tick before driving writes; latches the row base address.
    WritePrime {
        /// Bank being committed.
        bank: BankId,
    },
    /// Writing the bank to the store.
    WriteBurst {
        /// Bank being committed.
        bank: BankId,
        /// Next column to write.
        col: usize,
    },
    /// One idle tick releasing the channel.
    Turnaround {
        /// Bank to report done, if this period committed one.
        done: Option<BankId>,
    },
}

/// Controller counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ControllerStats {
    /// Read bursts completed.
    pub rows_prefetched: u64,
    /// Write bursts completed.
    pub rows_committed: u64,
    /// Row periods whose flush found no Full bank.
    pub idle_periods: u64,
    /// Row starts that arrived while a transaction was still running.
    pub missed_periods: u64,
    /// Write-back ticks that read a bank not marked Committing.
    pub violations: u64,
}

/// Row the display reader needs next, given the current scanout row.
///
/// Visible rows prefetch their successor; the last visible row wraps to row
/// 0. During blanking row 0 is already cached, so row 1 is kept warm.
#[must_use]
pub const fn prefetch_target(row: usize, visible_rows: usize) -> usize {
    if visible_rows == 0 {
        0
    } else if row + 1 < visible_rows {
        row + 1
    } else if row + 1 == visible_rows {
        0
    } else {
        1 % visible_rows
    }
}

/// The storage transaction controller.
pub struct StorageController {
    state: ControllerState,
    addresser: RowAddresser,
    visible_rows: usize,
    burst_base: usize,
    stats: ControllerStats,
}

impl StorageController {
    /// Creates an Idle controller for rows of `width` bytes.
    #[must_use]
    pub fn new(width: usize, visible_rows: usize) -> Self {
        Self {
            state: ControllerState::Idle,
            addresser: RowAddresser::new(width),
            visible_rows,
            burst_base: 0,
            stats: ControllerStats::default(),
        }
    }

    /// Current state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> ControllerState {
        self.state
    }

    /// Counters.
    #[inline]
    #[must_use]
    pub const fn stats(&self) -> &ControllerStats {
        &self.stats
    }

    /// True when no transaction is running.
    #[inline]
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self.state, ControllerState::Idle)
    }

    /// Runs one tick: drives exactly one channel operation and returns the
    /// handshake for the scheduler.
    pub fn tick<S: BackingStore>(
        &mut self,
        pulse: ScanPulse,
        banks: &BankSet,
        channel: &mut StorageChannel<S>,
        cache: &mut RowCache,
    ) -> Handshake {
        let width = self.addresser.width();
        let mut handshake = Handshake::default();

        if pulse.row_start && !self.is_idle() {
            self.stats.missed_periods += 1;
            warn!(row = pulse.row, state = ?self.state, "row start while storage busy");
        }

        let (op, next) = match self.state {
            ControllerState::Idle => {
                if pulse.row_start && width > 0 {
                    let row = prefetch_target(pulse.row, self.visible_rows);
                    self.burst_base = self.addresser.base(row);
                    trace!(scan_row = pulse.row, row, "prefetch latched");
                    (ChannelOp::Idle, ControllerState::ReadBurst { row, col: 0 })
                } else {
                    (ChannelOp::Idle, ControllerState::Idle)
                }
            }
            ControllerState::ReadBurst { row, col } => {
                let op = ChannelOp::Read {
                    addr: self.burst_base + col,
                    line: RowCache::line_of(row),
                    col,
                };
                let next = if col + 1 == width {
                    ControllerState::ReadFlush { row, stage: 0 }
                } else {
                    ControllerState::ReadBurst { row, col: col + 1 }
                };
                (op, next)
            }
            ControllerState::ReadFlush { row, stage } if stage + 1 < FLUSH_STAGES => {
                (ChannelOp::Drain, ControllerState::ReadFlush { row, stage: stage + 1 })
            }
            ControllerState::ReadFlush { .. } => {
                let next = match banks.first_full() {
                    Some(bank) => {
                        handshake.taking = Some(bank);
                        trace!(bank = bank.0, row = banks.get(bank).row(), "commit selected");
                        ControllerState::WritePrime { bank }
                    }
                    None => {
                        self.stats.idle_periods += 1;
                        ControllerState::Turnaround { done: None }
                    }
                };
                (ChannelOp::Drain, next)
            }
            ControllerState::WritePrime { bank } => {
                self.burst_base = self.addresser.base(banks.get(bank).row());
                (ChannelOp::Idle, ControllerState::WriteBurst { bank, col: 0 })
            }
            ControllerState::WriteBurst { bank, col } => {
                let source = banks.get(bank);
                if source.state() != BankState::Committing {
                    self.stats.violations += 1;
                    error!(bank = bank.0, state = ?source.state(), "writing a bank not marked committing");
                }
                let op = ChannelOp::Write {
                    addr: self.burst_base + col,
                    value: source.pixel(col),
                };
                let next = if col + 1 == width {
                    ControllerState::Turnaround { done: Some(bank) }
                } else {
                    ControllerState::WriteBurst { bank, col: col + 1 }
                };
                (op, next)
            }
            ControllerState::Turnaround { done } => {
                if let Some(bank) = done {
                    self.stats.rows_committed += 1;
                    handshake.done = Some(bank);
                    trace!(bank = bank.0, "commit done");
                }
                (ChannelOp::Idle, ControllerState::Idle)
            }
        };

        channel.tick(op, cache);

        // The last flush stage is the tick the final read lands.
        if let ControllerState::ReadFlush { row, stage } = self.state {
            if stage + 1 == FLUSH_STAGES {
                cache.mark_loaded(row);
                self.stats.rows_prefetched += 1;
            }
        }

        self.state = next;
        handshake
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::Generation;
    use crate::storage::{Direction, MemoryStore};

    const W: usize = 4;

    fn setup() -> (StorageController, BankSet, StorageChannel<MemoryStore>, RowCache) {
        let mut store = MemoryStore::for_frame(W, 3);
        for addr in 0..store.capacity() {
            store.write(addr, addr as u8 + 100).unwrap();
        }
        (
            StorageController::new(W, 3),
            BankSet::new(W),
            StorageChannel::new(store),
            RowCache::new(W),
        )
    }

    fn pulse(row_start: bool, row: usize) -> ScanPulse {
        ScanPulse {
            row_start,
            frame_start: row_start && row == 0,
            row,
            visible: row < 3,
            tick_in_row: 0,
        }
    }

    #[test]
    fn test_prefetch_target() {
        assert_eq!(prefetch_target(0, 544), 1);
        assert_eq!(prefetch_target(542, 544), 543);
        assert_eq!(prefetch_target(543, 544), 0);
        assert_eq!(prefetch_target(550, 544), 1);
        assert_eq!(prefetch_target(3, 1), 0);
    }

    #[test]
    fn test_read_only_period() {
        let (mut controller, banks, mut channel, mut cache) = setup();
        let mut directions = Vec::new();
        let mut handshakes = Vec::new();
        for tick in 0..12 {
            handshakes.push(controller.tick(pulse(tick == 0, 0), &banks, &mut channel, &mut cache));
            directions.push(channel.direction());
        }
        // latch, 4 reads, 2 flush, turnaround
        assert_eq!(directions[0], Direction::Idle);
        assert!(directions[1..7].iter().all(|&d| d == Direction::Read));
        assert!(directions[7..].iter().all(|&d| d == Direction::Idle));
        assert!(handshakes.iter().all(|h| *h == Handshake::default()));
        assert_eq!(cache.row(1), Some(&[104, 105, 106, 107][..]));
        assert_eq!(controller.stats().idle_periods, 1);
        assert!(controller.is_idle());
    }

    #[test]
    fn test_commit_period_timing() {
        let (mut controller, mut banks, mut channel, mut cache) = setup();
        let bank = banks.claim(2, Generation(0)).unwrap();
        for col in 0..W {
            banks.get_mut(bank).retire(2, col, col as u8 + 1);
        }

        let mut trace = Vec::new();
        for tick in 0..2 * W + 5 {
            let handshake = controller.tick(pulse(tick == 0, 0), &banks, &mut channel, &mut cache);
            if handshake.taking == Some(bank) {
                assert!(banks.get_mut(bank).take());
            }
            if handshake.done == Some(bank) {
                assert!(banks.get_mut(bank).release());
            }
            trace.push((channel.direction(), handshake));
        }

        // taking on the last flush stage
        assert_eq!(trace[W + 2].1.taking, Some(bank));
        assert_eq!(trace[W + 3].0, Direction::Idle);
        assert!(trace[W + 4..2 * W + 4].iter().all(|(d, _)| *d == Direction::Write));
        // done one tick after the last byte
        assert_eq!(trace[2 * W + 4], (Direction::Idle, Handshake { taking: None, done: Some(bank) }));
        assert!(controller.is_idle());
        assert_eq!(channel.store().row(2, W), Some(&[1, 2, 3, 4][..]));
        assert_eq!(channel.stats().violations, 0);
        assert_eq!(controller.stats().rows_committed, 1);
        assert!(banks.all_free());
    }

    #[test]
    fn test_write_from_uncommitted_bank_is_a_violation() {
        let (mut controller, mut banks, mut channel, mut cache) = setup();
        let bank = banks.claim(1, Generation(0)).unwrap();
        for col in 0..W {
            banks.get_mut(bank).retire(1, col, 9);
        }

        // taking is never applied, so the bank stays Full
        for tick in 0..2 * W + 5 {
            controller.tick(pulse(tick == 0, 0), &banks, &mut channel, &mut cache);
        }
        assert_eq!(banks.get(bank).state(), BankState::Full);
        assert_eq!(controller.stats().violations, W as u64);
        assert_eq!(controller.stats().rows_committed, 1);
    }

    #[test]
    fn test_fixed_priority_selection() {
        let (mut controller, mut banks, mut channel, mut cache) = setup();
        let a = banks.claim(0, Generation(0)).unwrap();
        let b = banks.claim(1, Generation(0)).unwrap();
        for col in 0..W {
            banks.get_mut(b).retire(1, col, 1);
            banks.get_mut(a).retire(0, col, 2);
        }
        let mut taken = None;
        for tick in 0..W + 3 {
            let handshake = controller.tick(pulse(tick == 0, 0), &banks, &mut channel, &mut cache);
            taken = taken.or(handshake.taking);
        }
        assert_eq!(taken, Some(a));
    }

    #[test]
    fn test_missed_period_counted() {
        let (mut controller, banks, mut channel, mut cache) = setup();
        controller.tick(pulse(true, 0), &banks, &mut channel, &mut cache);
        controller.tick(pulse(false, 0), &banks, &mut channel, &mut cache);
        controller.tick(pulse(true, 1), &banks, &mut channel, &mut cache);
        assert_eq!(controller.stats().missed_periods, 1);
    }
}
