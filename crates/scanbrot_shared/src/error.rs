//! # Configuration Error Types

use thiserror::Error;

/// Errors raised while loading or validating a `RenderConfig`.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The TOML text did not parse into a config.
    #[error("invalid config syntax: {0}")]
    Parse(#[from] toml::de::Error),

    /// Width or height is zero.
    #[error("frame geometry must be non-zero, got {width}x{height}")]
    EmptyFrame {
        /// Configured width.
        width: usize,
        /// Configured height.
        height: usize,
    },

    /// No engines configured.
    #[error("engine count must be at least 1")]
    NoEngines,

    /// The row period cannot hold one read and one write burst.
    #[error("ticks_per_row {ticks_per_row} too short for width {width}: need at least {minimum}")]
    RowPeriodTooShort {
        /// Configured row period.
        ticks_per_row: u32,
        /// Configured width.
        width: usize,
        /// Smallest acceptable row period.
        minimum: u32,
    },

    /// The width is too large for any row period to hold both bursts.
    #[error("width {width} too large: its row period does not fit in u32")]
    WidthTooLarge {
        /// Configured width.
        width: usize,
    },

    /// Fewer scanlines than visible rows.
    #[error("total_rows {total_rows} is smaller than the frame height {height}")]
    TooFewRows {
        /// Configured total scanlines.
        total_rows: usize,
        /// Configured visible rows.
        height: usize,
    },

    /// A view value is outside the Q3.22 range.
    #[error("view field `{field}` = {value} is outside [-4, 4)")]
    ViewOutOfRange {
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: f64,
    },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
