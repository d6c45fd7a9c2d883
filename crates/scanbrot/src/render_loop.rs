//! # Render Loop
//!
//! The single discrete time base. Every component transitions exactly once
//! per [`RenderLoop::step`], in this order:
//!
//! ```text
//! Tick N:
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │ 1. INPUT                                                            │
//! │    └─ Drain SetView / Restart, apply at most one restart            │
//! │                                                                     │
//! │ 2. TIMING                                                           │
//! │    └─ Row-start / frame-start pulse                                 │
//! │                                                                     │
//! │ 3. SCHEDULER                                                        │
//! │    ├─ Step engines, harvest current-generation completions          │
//! │    ├─ Retire one pending result into its bank                       │
//! │    └─ Issue the next pixel (or stall on banks)                      │
//! │                                                                     │
//! │ 4. STORAGE CONTROLLER                                               │
//! │    ├─ One channel operation (read-ahead / write-back / idle)        │
//! │    └─ Handshake: taking / done                                      │
//! │                                                                     │
//! │ 5. HANDSHAKE                                                        │
//! │    └─ Scheduler applies Full->Committing / Committing->Free         │
//! │                                                                     │
//! │ 6. SCANOUT + STATUS                                                 │
//! │    ├─ Display reader samples the row cache                          │
//! │    └─ Publish RenderStatus                                          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Handshakes are same-tick observations, so nothing here runs on another
//! thread. Other threads talk to the loop only through the input queue and
//! the status board.

use scanbrot_core::ViewParams;
use scanbrot_shared::constants::INPUT_QUEUE_CAPACITY;
use scanbrot_shared::{InputEvent, InputQueue, InputReceiver, InputSender, RenderConfig};
use tracing::{debug, info};

use crate::error::{SimError, SimResult};
use crate::row_cache::RowCache;
use crate::scanout::ScanoutReader;
use crate::scheduler::{Generation, Scheduler, SchedulerReport};
use crate::stats::{FrameTickAccumulator, RenderStats};
use crate::status::{RenderStatus, StatusBoard};
use crate::storage::{BackingStore, Direction, Handshake, MemoryStore, StorageChannel, StorageController};
use crate::timing::{ScanPulse, ScanTiming};

/// What happened in one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickReport {
    /// Tick index.
    pub tick: u64,
    /// Timing pulse of this tick.
    pub pulse: ScanPulse,
    /// True when input started a new generation this tick.
    pub restarted: bool,
    /// Scheduler activity.
    pub scheduler: SchedulerReport,
    /// Controller handshake.
    pub handshake: Handshake,
    /// Channel direction driven.
    pub direction: Direction,
}

/// The whole pipeline plus its collaborator models.
pub struct RenderLoop<S: BackingStore = MemoryStore> {
    config: RenderConfig,
    scheduler: Scheduler,
    controller: StorageController,
    channel: StorageChannel<S>,
    cache: RowCache,
    timing: ScanTiming,
    scanout: ScanoutReader,
    input: InputQueue,
    receiver: InputReceiver,
    status: StatusBoard,
    tick: u64,
    generation_started: u64,
    recorded_generation: Option<Generation>,
    frame_ticks: FrameTickAccumulator,
}

impl RenderLoop<MemoryStore> {
    /// Builds a loop over a fresh in-memory store and starts the configured
    /// view.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] if the config does not validate.
    pub fn new(config: RenderConfig) -> SimResult<Self> {
        config.validate()?;
        let store = MemoryStore::for_frame(config.geometry.width, config.geometry.height);
        Self::with_store(config, store)
    }
}

impl<S: BackingStore> RenderLoop<S> {
    /// Builds a loop over `store` and starts the configured view.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] if the config does not validate, or
    /// [`SimError::StoreTooSmall`] if `store` cannot hold one frame.
    pub fn with_store(config: RenderConfig, store: S) -> SimResult<Self> {
        config.validate()?;
        let width = config.geometry.width;
        let height = config.geometry.height;
        let required = width * height;
        if store.capacity() < required {
            return Err(SimError::StoreTooSmall {
                capacity: store.capacity(),
                required,
            });
        }

        let input = InputQueue::new(INPUT_QUEUE_CAPACITY);
        let receiver = input.receiver();
        let mut scheduler = Scheduler::new(width, height, config.engines.count);
        scheduler.start(config.view.to_params());

        info!(
            width,
            height,
            engines = config.engines.count,
            ticks_per_row = config.timing.ticks_per_row,
            total_rows = config.timing.total_rows,
            "render loop ready"
        );

        Ok(Self {
            config,
            scheduler,
            controller: StorageController::new(width, height),
            channel: StorageChannel::new(store),
            cache: RowCache::new(width),
            timing: ScanTiming::new(config.timing.ticks_per_row, height, config.timing.total_rows),
            scanout: ScanoutReader::new(width, height),
            input,
            receiver,
            status: StatusBoard::new(),
            tick: 0,
            generation_started: 0,
            recorded_generation: None,
            frame_ticks: FrameTickAccumulator::new(),
        })
    }

    /// Runs one tick.
    pub fn step(&mut self) -> TickReport {
        let restarted = self.apply_input();
        if restarted {
            self.generation_started = self.tick;
        }

        let pulse = self.timing.advance();
        let scheduler = self.scheduler.tick();
        let handshake = self
            .controller
            .tick(pulse, self.scheduler.banks(), &mut self.channel, &mut self.cache);
        self.scheduler.apply_handshake(handshake);
        self.scanout.sample(pulse, &self.cache);

        let generation = self.scheduler.generation();
        let frame_complete = self.scheduler.frame_complete();
        if frame_complete && self.recorded_generation != Some(generation) {
            self.recorded_generation = Some(generation);
            self.frame_ticks.record(self.tick + 1 - self.generation_started);
        }

        let report = TickReport {
            tick: self.tick,
            pulse,
            restarted,
            scheduler,
            handshake,
            direction: self.channel.direction(),
        };
        self.tick += 1;
        self.status.publish(RenderStatus {
            generation: generation.0,
            issuing_row: self.scheduler.issuing_row(),
            render_busy: self.scheduler.render_busy(),
            frame_complete,
            tick: self.tick,
        });
        report
    }

    /// Drains the input queue. Views collapse to the last one sent; a
    /// restart request is absorbed by a view change in the same tick.
    fn apply_input(&mut self) -> bool {
        let mut view: Option<ViewParams> = None;
        let mut restart = false;
        while let Some(event) = self.receiver.try_recv() {
            debug!(?event, tick = self.tick, "input");
            match event {
                InputEvent::SetView(params) => view = Some(params),
                InputEvent::Restart => restart = true,
            }
        }

        let mut restarted = view.is_some_and(|params| self.scheduler.start(params));
        if restart && !restarted {
            restarted = self.scheduler.restart();
        }
        restarted
    }

    /// Runs `ticks` ticks.
    pub fn run_ticks(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.step();
        }
    }

    /// Runs whole display frames.
    pub fn run_display_frames(&mut self, frames: u64) {
        self.run_ticks(self.timing.ticks_per_frame() * frames);
    }

    /// Runs until the live generation's frame is complete.
    ///
    /// Returns the ticks spent.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Timeout`] after `max_ticks`.
    pub fn run_until_frame_complete(&mut self, max_ticks: u64) -> SimResult<u64> {
        self.run_until(max_ticks, |scheduler| scheduler.frame_complete())
    }

    /// Runs until the frame is complete and both banks have been committed.
    ///
    /// Returns the ticks spent.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Timeout`] after `max_ticks`.
    pub fn run_until_idle(&mut self, max_ticks: u64) -> SimResult<u64> {
        self.run_until(max_ticks, |scheduler| {
            scheduler.frame_complete() && !scheduler.render_busy()
        })
    }

    fn run_until(&mut self, max_ticks: u64, done: impl Fn(&Scheduler) -> bool) -> SimResult<u64> {
        let start = self.tick;
        while !done(&self.scheduler) {
            if self.tick - start >= max_ticks {
                return Err(SimError::Timeout { ticks: max_ticks });
            }
            self.step();
        }
        Ok(self.tick - start)
    }

    /// Handle for the input collaborator.
    #[must_use]
    pub fn input_sender(&self) -> InputSender {
        self.input.sender()
    }

    /// Shared status board (clone it for other threads).
    #[must_use]
    pub fn status_board(&self) -> StatusBoard {
        self.status.clone()
    }

    /// The configuration the loop was built with.
    #[must_use]
    pub const fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Ticks run so far.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// The scheduler.
    #[must_use]
    pub const fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// The storage controller.
    #[must_use]
    pub const fn controller(&self) -> &StorageController {
        &self.controller
    }

    /// The backing store.
    #[must_use]
    pub const fn store(&self) -> &S {
        self.channel.store()
    }

    /// The display row cache.
    #[must_use]
    pub const fn row_cache(&self) -> &RowCache {
        &self.cache
    }

    /// The display reader.
    #[must_use]
    pub const fn scanout(&self) -> &ScanoutReader {
        &self.scanout
    }

    /// The timing generator.
    #[must_use]
    pub const fn timing(&self) -> &ScanTiming {
        &self.timing
    }

    /// Ticks per completed generation.
    #[must_use]
    pub const fn frame_ticks(&self) -> &FrameTickAccumulator {
        &self.frame_ticks
    }

    /// Counters from every component.
    #[must_use]
    pub fn stats(&self) -> RenderStats {
        let scheduler = self.scheduler.stats();
        let controller = self.controller.stats();
        let channel = self.channel.stats();
        RenderStats {
            ticks: self.tick,
            restarts: scheduler.restarts,
            pixels_issued: scheduler.issued,
            pixels_retired: scheduler.retired,
            stale_discarded: scheduler.stale_discarded,
            stall_ticks: scheduler.stall_ticks,
            rows_completed: scheduler.rows_completed,
            rows_committed: controller.rows_committed,
            rows_prefetched: controller.rows_prefetched,
            idle_periods: controller.idle_periods,
            missed_periods: controller.missed_periods,
            stale_scanout_rows: self.scanout.stale_rows(),
            channel_read_ticks: channel.read_ticks,
            channel_write_ticks: channel.write_ticks,
            channel_idle_ticks: channel.idle_ticks,
            violations: scheduler.violations + channel.violations + controller.violations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanbrot_shared::ConfigError;

    #[test]
    fn test_rejects_bad_config() {
        let mut config = RenderConfig::compact(8, 4, 2);
        config.timing.ticks_per_row = 10;
        assert!(matches!(
            RenderLoop::new(config),
            Err(SimError::Config(ConfigError::RowPeriodTooShort { .. }))
        ));
    }

    #[test]
    fn test_rejects_small_store() {
        let config = RenderConfig::compact(8, 4, 2);
        assert!(matches!(
            RenderLoop::with_store(config, MemoryStore::new(31)),
            Err(SimError::StoreTooSmall { capacity: 31, required: 32 })
        ));
    }

    #[test]
    fn test_status_tracks_loop() {
        let mut render = RenderLoop::new(RenderConfig::compact(8, 4, 4)).unwrap();
        let board = render.status_board();
        render.step();
        let status = board.snapshot();
        assert_eq!(status.tick, 1);
        assert!(status.render_busy);
        assert!(!status.frame_complete);
        assert_eq!(status.generation, render.scheduler().generation().0);

        render.run_until_idle(100_000).unwrap();
        let status = board.snapshot();
        assert!(status.frame_complete);
        assert!(!status.render_busy);
        assert_eq!(status.issuing_row, 4);
    }

    #[test]
    fn test_timeout() {
        let mut render = RenderLoop::new(RenderConfig::compact(8, 4, 1)).unwrap();
        assert!(matches!(render.run_until_idle(3), Err(SimError::Timeout { ticks: 3 })));
    }

    #[test]
    fn test_view_and_restart_in_one_tick_restart_once() {
        let mut render = RenderLoop::new(RenderConfig::compact(8, 4, 4)).unwrap();
        render.step();
        let before = render.scheduler().generation();
        let sender = render.input_sender();
        let mut view = render.config().view.to_params();
        view.max_iters = 64;
        assert!(sender.set_view(view));
        assert!(sender.restart());

        let report = render.step();
        assert!(report.restarted);
        assert_eq!(render.scheduler().generation(), before.next());
    }

    #[test]
    fn test_frame_ticks_recorded_once_per_generation() {
        let mut render = RenderLoop::new(RenderConfig::compact(8, 4, 4)).unwrap();
        render.run_until_idle(100_000).unwrap();
        render.run_ticks(100);
        assert_eq!(render.frame_ticks().frames_recorded, 1);
        assert_eq!(render.stats().violations, 0);
    }
}
