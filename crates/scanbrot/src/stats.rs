//! Render statistics and the run summary.

/// Counters gathered from every component of the render loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Ticks run.
    pub ticks: u64,
    /// Generations started (view changes and restarts).
    pub restarts: u64,
    /// Pixels launched on engines.
    pub pixels_issued: u64,
    /// Pixels retired into banks.
    pub pixels_retired: u64,
    /// Completions dropped for a stale generation.
    pub stale_discarded: u64,
    /// Ticks issue was blocked waiting for a bank.
    pub stall_ticks: u64,
    /// Rows that reached Full.
    pub rows_completed: u64,
    /// Rows written back to the store.
    pub rows_committed: u64,
    /// Rows read ahead into the row cache.
    pub rows_prefetched: u64,
    /// Row periods with nothing to commit.
    pub idle_periods: u64,
    /// Row starts that found the storage controller busy.
    pub missed_periods: u64,
    /// Visible rows the display reader found not ready.
    pub stale_scanout_rows: u64,
    /// Channel ticks in read direction.
    pub channel_read_ticks: u64,
    /// Channel ticks in write direction.
    pub channel_write_ticks: u64,
    /// Channel ticks not driven.
    pub channel_idle_ticks: u64,
    /// Invariant violations across all components (must stay zero).
    pub violations: u64,
}

impl RenderStats {
    /// Retired pixels per tick.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn retire_rate(&self) -> f64 {
        if self.ticks == 0 {
            return 0.0;
        }
        self.pixels_retired as f64 / self.ticks as f64
    }

    /// Share of ticks the channel was driven.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn channel_utilization(&self) -> f64 {
        let driven = self.channel_read_ticks + self.channel_write_ticks;
        let total = driven + self.channel_idle_ticks;
        if total == 0 {
            return 0.0;
        }
        driven as f64 / total as f64
    }
}

/// Ticks each completed generation took from restart to frame complete.
#[derive(Clone, Debug)]
pub struct FrameTickAccumulator {
    /// Frames recorded.
    pub frames_recorded: u64,
    /// Sum of ticks over recorded frames.
    pub ticks_sum: u64,
    /// Fastest frame.
    pub min_ticks: u64,
    /// Slowest frame.
    pub max_ticks: u64,
}

impl FrameTickAccumulator {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames_recorded: 0,
            ticks_sum: 0,
            min_ticks: u64::MAX,
            max_ticks: 0,
        }
    }

    /// Records one completed frame.
    pub fn record(&mut self, ticks: u64) {
        self.frames_recorded += 1;
        self.ticks_sum += ticks;
        self.min_ticks = self.min_ticks.min(ticks);
        self.max_ticks = self.max_ticks.max(ticks);
    }

    /// Average ticks per completed frame.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_ticks(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        self.ticks_sum as f64 / self.frames_recorded as f64
    }
}

impl Default for FrameTickAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Prints the run summary.
pub fn print_summary(stats: &RenderStats, frames: &FrameTickAccumulator) {
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║                      RENDER SUMMARY                              ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();
    println!("┌─ COMPUTE ──────────────────────────────────────────────────────┐");
    println!("│ Ticks:              {}", stats.ticks);
    println!("│ Generations:        {}", stats.restarts);
    println!("│ Pixels Issued:      {}", stats.pixels_issued);
    println!("│ Pixels Retired:     {} ({:.3} / tick)", stats.pixels_retired, stats.retire_rate());
    println!("│ Stale Discarded:    {}", stats.stale_discarded);
    println!("│ Stall Ticks:        {}", stats.stall_ticks);
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();
    println!("┌─ STORAGE ──────────────────────────────────────────────────────┐");
    println!("│ Rows Completed:     {}", stats.rows_completed);
    println!("│ Rows Committed:     {}", stats.rows_committed);
    println!("│ Rows Prefetched:    {}", stats.rows_prefetched);
    println!("│ Idle Periods:       {}", stats.idle_periods);
    println!("│ Missed Periods:     {}", stats.missed_periods);
    println!("│ Channel Busy:       {:.1}%", stats.channel_utilization() * 100.0);
    println!("│ Stale Scanout Rows: {}", stats.stale_scanout_rows);
    println!("└──────────────────────────────────────────────────────────────────┘");

    if frames.frames_recorded > 0 {
        println!();
        println!("┌─ FRAMES ───────────────────────────────────────────────────────┐");
        println!("│ Completed:          {}", frames.frames_recorded);
        println!("│ Average:            {:.0} ticks", frames.avg_ticks());
        println!("│ Min:                {} ticks", frames.min_ticks);
        println!("│ Max:                {} ticks", frames.max_ticks);
        println!("└──────────────────────────────────────────────────────────────────┘");
    }

    println!();
    if stats.violations == 0 {
        println!("Invariant violations: 0");
    } else {
        println!("⚠️ Invariant violations: {}", stats.violations);
    }
}
