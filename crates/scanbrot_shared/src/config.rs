//! # Render Configuration
//!
//! Loaded once at startup from TOML. Every section is optional; missing
//! fields take the reference values from [`crate::constants`].
//!
//! ```toml
//! [geometry]
//! width = 960
//! height = 544
//!
//! [engines]
//! count = 16
//!
//! [timing]
//! ticks_per_row = 2048
//! total_rows = 560
//!
//! [view]
//! center_re = -0.5
//! center_im = 0.0
//! scale = 0.003125
//! max_iters = 256
//! ```

use std::path::Path;

use scanbrot_core::{Coord, ViewParams};
use serde::{Deserialize, Serialize};

use crate::constants::{min_ticks_per_row, ENGINE_COUNT, FB_H, FB_W, TICKS_PER_ROW, TOTAL_ROWS};
use crate::error::{ConfigError, ConfigResult};

/// Frame size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Pixels per row (`FB_W`).
    pub width: usize,
    /// Rows per frame (`FB_H`).
    pub height: usize,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            width: FB_W,
            height: FB_H,
        }
    }
}

/// Engine pool size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of parallel engines.
    pub count: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { count: ENGINE_COUNT }
    }
}

/// Display cadence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Ticks per scanline period.
    pub ticks_per_row: u32,
    /// Scanlines per frame, blanking included.
    pub total_rows: usize,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            ticks_per_row: TICKS_PER_ROW,
            total_rows: TOTAL_ROWS,
        }
    }
}

/// Initial viewport, in plain decimal.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Center, real part.
    pub center_re: f64,
    /// Center, imaginary part.
    pub center_im: f64,
    /// Per-pixel step.
    pub scale: f64,
    /// Iteration cap; clamped into `[16, 4095]`.
    pub max_iters: u16,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self::classic(FB_W)
    }
}

impl ViewConfig {
    /// The whole set: centered at -0.5, three units across `width` pixels.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn classic(width: usize) -> Self {
        Self {
            center_re: -0.5,
            center_im: 0.0,
            scale: 3.0 / width.max(1) as f64,
            max_iters: 256,
        }
    }

    /// Converts to fixed-point parameters.
    #[must_use]
    pub fn to_params(&self) -> ViewParams {
        ViewParams::new(
            Coord::from_f64(self.center_re),
            Coord::from_f64(self.center_im),
            Coord::from_f64(self.scale),
            self.max_iters,
        )
    }
}

/// Complete renderer configuration.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Frame size.
    pub geometry: GeometryConfig,
    /// Engine pool.
    pub engines: EngineConfig,
    /// Display cadence.
    pub timing: TimingConfig,
    /// Initial viewport.
    pub view: ViewConfig,
}

impl RenderConfig {
    /// A small self-consistent config: the tightest legal row period, two
    /// blanking rows, the classic view scaled to `width`.
    #[must_use]
    pub fn compact(width: usize, height: usize, engines: usize) -> Self {
        Self {
            geometry: GeometryConfig { width, height },
            engines: EngineConfig { count: engines },
            timing: TimingConfig {
                ticks_per_row: min_ticks_per_row(width).unwrap_or(u32::MAX),
                total_rows: height + 2,
            },
            view: ViewConfig::classic(width),
        }
    }

    /// Parses and validates a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` on bad TOML, or a validation error.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read, otherwise as
    /// [`Self::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks that the pipeline can run with this config.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> ConfigResult<()> {
        let GeometryConfig { width, height } = self.geometry;
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptyFrame { width, height });
        }
        if self.engines.count == 0 {
            return Err(ConfigError::NoEngines);
        }
        let minimum = min_ticks_per_row(width).ok_or(ConfigError::WidthTooLarge { width })?;
        if self.timing.ticks_per_row < minimum {
            return Err(ConfigError::RowPeriodTooShort {
                ticks_per_row: self.timing.ticks_per_row,
                width,
                minimum,
            });
        }
        if self.timing.total_rows < height {
            return Err(ConfigError::TooFewRows {
                total_rows: self.timing.total_rows,
                height,
            });
        }
        for (field, value) in [
            ("center_re", self.view.center_re),
            ("center_im", self.view.center_im),
            ("scale", self.view.scale),
        ] {
            if !(-4.0..4.0).contains(&value) {
                return Err(ConfigError::ViewOutOfRange { field, value });
            }
        }
        Ok(())
    }
}
