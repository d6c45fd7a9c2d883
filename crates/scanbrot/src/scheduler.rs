//! # Scheduler
//!
//! Drives every pixel of the frame through the engine pool in row-major
//! order and retires completions into the two row banks.
//!
//! ## One tick
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────┐   ┌────────────────────────────┐
//! │ 1. HARVEST   │──>│ 2. RETIRE        │──>│ 3. ISSUE                   │
//! │ done engines │   │ lowest-index     │   │ bank for cursor row?       │
//! │ with current │   │ pending result   │   │   none free -> STALL       │
//! │ generation   │   │ -> bank[col]     │   │ lowest free engine <- pixel│
//! └──────────────┘   └──────────────────┘   └────────────────────────────┘
//! ```
//!
//! ## Cancellation
//!
//! A restart bumps the generation. Engines still running for the old
//! generation are left alone; their completions fail the tag check at
//! harvest and are dropped.

use scanbrot_core::{Coord, EngineId, EnginePool, ViewParams};
use tracing::{debug, error, info};

use crate::bank::{BankId, BankSet, BankState, RetireOutcome};
use crate::storage::Handshake;

/// Version tag that invalidates in-flight work after a restart.
///
/// Wraps at `u16`. A restart happens at most once per tick and an engine
/// finishes within 4096 ticks, so a tag cannot come back around while an
/// engine still carries it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(pub u16);

impl Generation {
    /// The following generation.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// One pixel of work, carried by the engine it was launched on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkItem {
    /// Pixel row.
    pub row: usize,
    /// Pixel column.
    pub col: usize,
    /// Bank the result retires into.
    pub bank: BankId,
    /// Generation at launch.
    pub generation: Generation,
}

/// A harvested result waiting for its retirement slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PendingResult {
    work: WorkItem,
    value: u8,
}

/// A pixel written into a bank this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Retirement {
    /// The pixel.
    pub work: WorkItem,
    /// Stored byte.
    pub value: u8,
    /// Engine that computed it.
    pub engine: EngineId,
}

/// What the scheduler did in one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerReport {
    /// Completions latched this tick.
    pub harvested: usize,
    /// Completions dropped this tick for a stale generation.
    pub discarded: usize,
    /// The retirement, if any (at most one per tick).
    pub retired: Option<Retirement>,
    /// The launch, if any.
    pub issued: Option<WorkItem>,
    /// True when issue was blocked for lack of a bank.
    pub stalled: bool,
}

/// Counters over the scheduler's lifetime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Restarts accepted.
    pub restarts: u64,
    /// Pixels launched.
    pub issued: u64,
    /// Pixels retired into banks.
    pub retired: u64,
    /// Completions dropped for a stale generation.
    pub stale_discarded: u64,
    /// Ticks issue was blocked for lack of a bank.
    pub stall_ticks: u64,
    /// Rows that reached Full.
    pub rows_completed: u64,
    /// Invariant violations observed (must stay zero).
    pub violations: u64,
}

/// Row-major issue position.
#[derive(Clone, Copy, Debug)]
struct Cursor {
    row: usize,
    col: usize,
    re: Coord,
    im: Coord,
    row_start_re: Coord,
    exhausted: bool,
}

impl Cursor {
    const fn idle() -> Self {
        Self {
            row: 0,
            col: 0,
            re: Coord::ZERO,
            im: Coord::ZERO,
            row_start_re: Coord::ZERO,
            exhausted: true,
        }
    }
}

/// The engine pool, the two banks and the issue cursor.
pub struct Scheduler {
    /// Pixels per row.
    width: usize,
    /// Rows per frame.
    height: usize,
    /// The engines, tagged with their work items.
    pool: EnginePool<WorkItem>,
    /// Per-engine harvested results.
    pending: Box<[Option<PendingResult>]>,
    /// The two row banks.
    banks: BankSet,
    /// Live generation.
    generation: Generation,
    /// Last accepted view.
    view: Option<ViewParams>,
    /// Issue position.
    cursor: Cursor,
    /// Pixels retired under the live generation.
    retired_in_generation: usize,
    /// Whether `frame complete` has been logged for this generation.
    completion_logged: bool,
    /// Lifetime counters.
    stats: SchedulerStats,
}

impl Scheduler {
    /// Creates an idle scheduler; nothing is issued until [`Self::start`].
    ///
    /// # Panics
    ///
    /// Panics if `engines` is zero.
    #[must_use]
    pub fn new(width: usize, height: usize, engines: usize) -> Self {
        Self {
            width,
            height,
            pool: EnginePool::new(engines),
            pending: vec![None; engines].into_boxed_slice(),
            banks: BankSet::new(width),
            generation: Generation::default(),
            view: None,
            cursor: Cursor::idle(),
            retired_in_generation: 0,
            completion_logged: false,
            stats: SchedulerStats::default(),
        }
    }

    /// Live generation.
    #[inline]
    #[must_use]
    pub const fn generation(&self) -> Generation {
        self.generation
    }

    /// Last accepted view.
    #[inline]
    #[must_use]
    pub const fn view(&self) -> Option<ViewParams> {
        self.view
    }

    /// The row banks.
    #[inline]
    #[must_use]
    pub const fn banks(&self) -> &BankSet {
        &self.banks
    }

    /// The engine pool.
    #[inline]
    #[must_use]
    pub const fn pool(&self) -> &EnginePool<WorkItem> {
        &self.pool
    }

    /// Lifetime counters.
    #[inline]
    #[must_use]
    pub const fn stats(&self) -> &SchedulerStats {
        &self.stats
    }

    /// Row currently being issued (equals the height once the cursor is done).
    #[inline]
    #[must_use]
    pub const fn issuing_row(&self) -> usize {
        self.cursor.row
    }

    /// Pixels retired under the live generation.
    #[inline]
    #[must_use]
    pub const fn retired_in_generation(&self) -> usize {
        self.retired_in_generation
    }

    /// Starts rendering `view`.
    ///
    /// Identical parameters are a no-op and return `false`; in-flight work
    /// is kept.
    pub fn start(&mut self, view: ViewParams) -> bool {
        if self.view == Some(view) {
            return false;
        }
        self.view = Some(view);
        self.restart_generation();
        true
    }

    /// Restarts the current view under a new generation.
    ///
    /// Returns `false` when no view has been accepted yet.
    pub fn restart(&mut self) -> bool {
        if self.view.is_none() {
            return false;
        }
        self.restart_generation();
        true
    }

    fn restart_generation(&mut self) {
        let Some(view) = self.view else {
            return;
        };
        self.generation = self.generation.next();
        self.banks.discard_uncommitted();
        for slot in self.pending.iter_mut() {
            *slot = None;
        }

        let (re, im) = view.origin(self.width, self.height);
        self.cursor = Cursor {
            row: 0,
            col: 0,
            re,
            im,
            row_start_re: re,
            exhausted: self.width == 0 || self.height == 0,
        };
        self.retired_in_generation = 0;
        self.completion_logged = false;
        self.stats.restarts += 1;
        debug!(
            generation = self.generation.0,
            center_re = %view.center_re,
            center_im = %view.center_im,
            scale = %view.scale,
            max_iters = view.max_iters,
            "restart"
        );
    }

    /// Advances the engines one step and runs harvest, retire and issue.
    pub fn tick(&mut self) -> SchedulerReport {
        let mut report = SchedulerReport::default();

        // 1. HARVEST
        let generation = self.generation;
        let pending = &mut self.pending;
        self.pool.step_all(|id, work, result| {
            if work.generation == generation {
                pending[id.0] = Some(PendingResult {
                    work,
                    value: result.pixel(),
                });
                report.harvested += 1;
            } else {
                report.discarded += 1;
            }
        });
        self.stats.stale_discarded += report.discarded as u64;

        // 2. RETIRE
        report.retired = self.retire_one();

        // 3. ISSUE
        match self.issue_one() {
            IssueOutcome::Issued(work) => report.issued = Some(work),
            IssueOutcome::Stalled => report.stalled = true,
            IssueOutcome::Idle => {}
        }

        if !self.completion_logged && self.frame_complete() {
            self.completion_logged = true;
            info!(
                generation = self.generation.0,
                retired = self.retired_in_generation,
                "frame complete"
            );
        }

        report
    }

    fn retire_one(&mut self) -> Option<Retirement> {
        let index = self.pending.iter().position(Option::is_some)?;
        let pending = self.pending[index].take()?;
        let work = pending.work;

        match self.banks.get_mut(work.bank).retire(work.row, work.col, pending.value) {
            RetireOutcome::Stored => {}
            RetireOutcome::Completed => {
                self.stats.rows_completed += 1;
                debug!(bank = work.bank.0, row = work.row, "bank full");
            }
            RetireOutcome::Rejected => {
                self.stats.violations += 1;
                error!(
                    bank = work.bank.0,
                    row = work.row,
                    col = work.col,
                    state = ?self.banks.get(work.bank).state(),
                    "retirement rejected by bank"
                );
                return None;
            }
        }

        self.stats.retired += 1;
        self.retired_in_generation += 1;
        Some(Retirement {
            work,
            value: pending.value,
            engine: EngineId(index),
        })
    }

    fn issue_one(&mut self) -> IssueOutcome {
        let Some(view) = self.view else {
            return IssueOutcome::Idle;
        };
        if self.cursor.exhausted {
            return IssueOutcome::Idle;
        }

        let row = self.cursor.row;
        let bank = match self.banks.find_row(row, self.generation) {
            Some(bank) => bank,
            None => match self.banks.claim(row, self.generation) {
                Some(bank) => bank,
                None => {
                    self.stats.stall_ticks += 1;
                    return IssueOutcome::Stalled;
                }
            },
        };

        let pending = &self.pending;
        let Some(engine) = self.pool.first_available_where(|id| pending[id.0].is_none()) else {
            return IssueOutcome::Idle;
        };

        let work = WorkItem {
            row,
            col: self.cursor.col,
            bank,
            generation: self.generation,
        };
        if !self
            .pool
            .launch(engine, work, self.cursor.re, self.cursor.im, view.max_iters)
        {
            self.stats.violations += 1;
            error!(engine = engine.0, "launch refused by available engine");
            return IssueOutcome::Idle;
        }
        self.stats.issued += 1;
        self.advance_cursor(view.scale);
        IssueOutcome::Issued(work)
    }

    fn advance_cursor(&mut self, scale: Coord) {
        let cursor = &mut self.cursor;
        cursor.col += 1;
        cursor.re += scale;
        if cursor.col == self.width {
            cursor.col = 0;
            cursor.row += 1;
            cursor.im += scale;
            cursor.re = cursor.row_start_re;
            if cursor.row == self.height {
                cursor.exhausted = true;
            }
        }
    }

    /// Applies the storage controller's handshake.
    ///
    /// `taking` moves a Full bank to Committing; `done` frees a Committing
    /// bank. Anything else is an invariant violation.
    pub fn apply_handshake(&mut self, handshake: Handshake) {
        if let Some(id) = handshake.taking {
            if self.banks.get_mut(id).take() {
                debug!(bank = id.0, row = self.banks.get(id).row(), "bank committing");
            } else {
                self.stats.violations += 1;
                error!(bank = id.0, state = ?self.banks.get(id).state(), "take of a bank that is not Full");
            }
            if self.banks.committing_count() > 1 {
                self.stats.violations += 1;
                error!("more than one bank committing");
            }
        }
        if let Some(id) = handshake.done {
            if self.banks.get_mut(id).release() {
                debug!(bank = id.0, "bank free");
            } else {
                self.stats.violations += 1;
                error!(bank = id.0, state = ?self.banks.get(id).state(), "done for a bank that is not Committing");
            }
        }
    }

    /// Frame-complete level: cursor past the last row, no engine running,
    /// nothing pending. Stable until the next restart.
    #[must_use]
    pub fn frame_complete(&self) -> bool {
        self.view.is_some()
            && self.cursor.exhausted
            && !self.pool.any_running()
            && self.pending.iter().all(Option::is_none)
    }

    /// Render-busy level: frame incomplete, an engine active, or a bank in
    /// use.
    #[must_use]
    pub fn render_busy(&self) -> bool {
        self.view.is_some() && (!self.frame_complete() || self.pool.any_running() || !self.banks.all_free())
    }

    /// Number of banks in `state`.
    #[must_use]
    pub fn banks_in(&self, state: BankState) -> usize {
        self.banks.iter().filter(|(_, bank)| bank.state() == state).count()
    }
}

enum IssueOutcome {
    Issued(WorkItem),
    Stalled,
    Idle,
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanbrot_core::escape_time;

    fn view(max_iters: u16) -> ViewParams {
        ViewParams::new(Coord::from_f64(-0.5), Coord::ZERO, Coord::from_f64(0.4), max_iters)
    }

    /// Ticks the scheduler, acting as a controller that commits a Full bank
    /// the tick after it fills and frees it the tick after that.
    fn drain(scheduler: &mut Scheduler, max_ticks: usize) -> Vec<Retirement> {
        let mut retired = Vec::new();
        for _ in 0..max_ticks {
            if let Some(r) = scheduler.tick().retired {
                retired.push(r);
            }
            let committing = scheduler
                .banks()
                .iter()
                .find(|(_, b)| b.state() == BankState::Committing)
                .map(|(id, _)| id);
            let handshake = match committing {
                Some(id) => Handshake { taking: None, done: Some(id) },
                None => Handshake { taking: scheduler.banks().first_full(), done: None },
            };
            scheduler.apply_handshake(handshake);
            if scheduler.frame_complete() && !scheduler.render_busy() {
                break;
            }
        }
        retired
    }

    #[test]
    fn test_idle_until_started() {
        let mut scheduler = Scheduler::new(4, 2, 2);
        let report = scheduler.tick();
        assert!(report.issued.is_none());
        assert!(!scheduler.frame_complete());
        assert!(!scheduler.render_busy());
    }

    #[test]
    fn test_issue_is_row_major() {
        let mut scheduler = Scheduler::new(3, 2, 8);
        scheduler.start(view(16));
        let mut issued = Vec::new();
        for _ in 0..6 {
            if let Some(work) = scheduler.tick().issued {
                issued.push((work.row, work.col));
            }
        }
        assert_eq!(issued, vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]);
    }

    #[test]
    fn test_whole_frame_retires_exactly_once() {
        let (w, h) = (6, 4);
        let mut scheduler = Scheduler::new(w, h, 3);
        scheduler.start(view(32));
        let retired = drain(&mut scheduler, 10_000);

        assert!(scheduler.frame_complete());
        assert_eq!(scheduler.retired_in_generation(), w * h);
        let mut seen = std::collections::HashSet::new();
        for r in &retired {
            assert!(seen.insert((r.work.row, r.work.col)));
        }
        assert_eq!(seen.len(), w * h);
        assert_eq!(scheduler.stats().violations, 0);
        assert!(!scheduler.render_busy());
    }

    #[test]
    fn test_retired_values_match_reference_engine() {
        let (w, h) = (5, 3);
        let v = view(40);
        let mut scheduler = Scheduler::new(w, h, 4);
        scheduler.start(v);
        let retired = drain(&mut scheduler, 10_000);

        let (re0, im0) = v.origin(w, h);
        for r in retired {
            let re = re0 + v.scale.mul_int(r.work.col as i32);
            let im = im0 + v.scale.mul_int(r.work.row as i32);
            assert_eq!(r.value, escape_time(re, im, 40).pixel());
        }
    }

    #[test]
    fn test_identical_start_is_noop() {
        let mut scheduler = Scheduler::new(4, 4, 2);
        assert!(scheduler.start(view(16)));
        scheduler.tick();
        scheduler.tick();
        let generation = scheduler.generation();
        let issued = scheduler.stats().issued;

        assert!(!scheduler.start(view(16)));
        assert_eq!(scheduler.generation(), generation);
        assert_eq!(scheduler.stats().issued, issued);
        assert_eq!(scheduler.pool().running_count(), 2);
    }

    #[test]
    fn test_restart_discards_stale_completions() {
        let mut scheduler = Scheduler::new(4, 4, 4);
        scheduler.start(view(200));
        for _ in 0..4 {
            scheduler.tick();
        }
        assert!(scheduler.restart());
        let new_generation = scheduler.generation();
        assert_eq!(scheduler.issuing_row(), 0);

        let retired = drain(&mut scheduler, 20_000);
        assert!(retired.iter().all(|r| r.work.generation == new_generation));
        assert!(scheduler.stats().stale_discarded > 0);
        assert_eq!(scheduler.retired_in_generation(), 16);
        assert_eq!(scheduler.stats().violations, 0);
    }

    #[test]
    fn test_generation_wraps() {
        assert_eq!(Generation(u16::MAX).next(), Generation(0));
        assert_eq!(Generation(7).next(), Generation(8));
    }

    #[test]
    fn test_stale_completions_discarded_across_wrap() {
        let mut scheduler = Scheduler::new(4, 4, 4);
        scheduler.generation = Generation(u16::MAX - 1);
        scheduler.start(view(200));
        assert_eq!(scheduler.generation(), Generation(u16::MAX));
        for _ in 0..4 {
            scheduler.tick();
        }
        let in_flight = scheduler.pool().running_count();
        assert!(in_flight > 0);

        assert!(scheduler.restart());
        assert_eq!(scheduler.generation(), Generation(0));

        let retired = drain(&mut scheduler, 20_000);
        assert!(retired.iter().all(|r| r.work.generation == Generation(0)));
        assert_eq!(scheduler.stats().stale_discarded, in_flight as u64);
        assert_eq!(scheduler.retired_in_generation(), 16);
        assert_eq!(scheduler.stats().violations, 0);
    }

    #[test]
    fn test_stalls_when_both_banks_held() {
        let mut scheduler = Scheduler::new(1, 4, 4);
        scheduler.start(view(16));
        let mut stalled = false;
        for _ in 0..200 {
            stalled |= scheduler.tick().stalled;
        }
        assert!(stalled);
        assert_eq!(scheduler.banks_in(BankState::Full), 2);
        assert_eq!(scheduler.issuing_row(), 2);
        assert!(!scheduler.frame_complete());

        scheduler.apply_handshake(Handshake { taking: Some(BankId(0)), done: None });
        scheduler.apply_handshake(Handshake { taking: None, done: Some(BankId(0)) });
        let report = scheduler.tick();
        assert_eq!(report.issued.map(|w| (w.row, w.bank)), Some((2, BankId(0))));
    }

    #[test]
    fn test_bad_handshake_counts_violation() {
        let mut scheduler = Scheduler::new(2, 2, 1);
        scheduler.start(view(16));
        scheduler.apply_handshake(Handshake { taking: Some(BankId(1)), done: None });
        scheduler.apply_handshake(Handshake { taking: None, done: Some(BankId(0)) });
        assert_eq!(scheduler.stats().violations, 2);
    }

    #[test]
    fn test_completions_retire_one_per_tick() {
        let mut scheduler = Scheduler::new(8, 1, 8);
        // Every point escapes on the second step; engines finish in launch
        // order.
        scheduler.start(ViewParams::new(Coord::from_f64(3.5), Coord::from_f64(3.5), Coord::ZERO, 16));
        let mut per_tick = Vec::new();
        for _ in 0..30 {
            let report = scheduler.tick();
            per_tick.push(u8::from(report.retired.is_some()));
        }
        assert!(per_tick.iter().all(|&n| n <= 1));
        assert_eq!(scheduler.retired_in_generation(), 8);
    }
}
