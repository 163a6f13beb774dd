// src/config.rs

//! Configuration structures for `termatrix`.
//!
//! Every section derives `Deserialize` with `#[serde(default)]`, so a JSON
//! config file only needs to mention the values it overrides. Defaults
//! reproduce the classic effect: a 1920x1080 surface, Hiragana rain in a
//! 10px font, one embed every 1.3 seconds and no fade-in.

use crate::color::Color;
use anyhow::{Context, Result};
use clap::ValueEnum;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root of the configuration tree.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub display: DisplayConfig,
    pub fonts: FontsConfig,
    pub rain: RainConfig,
    pub embed: EmbedConfig,
    pub fade: FadeConfig,
    pub performance: PerformanceConfig,
}

impl Config {
    /// Reads a JSON config file. Missing fields fall back to their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Loads `path` when given, otherwise returns the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                info!("Configuration loaded (using default).");
                Ok(Self::default())
            }
        }
    }
}

/// Which display driver presents frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    /// Off-screen presentation; frames can be dumped to a PPM file.
    #[default]
    Headless,
    /// An X11 window fed through `XPutImage`.
    X11,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub width_px: u32,
    pub height_px: u32,
    pub driver: DriverKind,
    /// Window caption.
    pub title: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            width_px: 1920,
            height_px: 1080,
            driver: DriverKind::Headless,
            title: "termatrix".to_string(),
        }
    }
}

/// Font selection for the two rasterizers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FontsConfig {
    /// Xft pattern of the rain font.
    pub rain: String,
    /// Xft pattern of the embedded-text font.
    pub text: String,
    /// Character measured to size the rain font.
    pub rain_sample: char,
    /// Character measured to size the text font.
    pub text_sample: char,
    /// Glyph cell of the headless rain rasterizer, in pixels.
    pub headless_rain_cell: (u32, u32),
    /// Glyph cell of the headless text rasterizer, in pixels.
    pub headless_text_cell: (u32, u32),
}

impl Default for FontsConfig {
    fn default() -> Self {
        FontsConfig {
            rain: "mikachan:pixelsize=10".to_string(),
            text: "inconsolata:pixelsize=10".to_string(),
            rain_sample: '\u{3041}',
            text_sample: 'D',
            headless_rain_cell: (10, 11),
            headless_text_cell: (5, 11),
        }
    }
}

/// Parameters of the per-column color model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RainConfig {
    /// Lowest green drawn for a fresh column (inclusive).
    pub initial_green_min: i32,
    /// Upper bound of a fresh column's green (exclusive).
    pub initial_green_max: i32,
    /// Green at or below this value resets on the next decay step.
    pub decay_floor: i32,
    /// Value green resets to.
    pub decay_reset: i32,
    pub background: Color,
    /// Foreground of embedded text glyphs.
    pub embed_color: Color,
    /// Seed for the glyph/color generator. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for RainConfig {
    fn default() -> Self {
        RainConfig {
            initial_green_min: 10,
            initial_green_max: 190,
            decay_floor: 10,
            decay_reset: 190,
            background: Color::BLACK,
            embed_color: Color::BRIGHT_GREEN,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbedConfig {
    /// Minimum time between two embeds.
    pub min_interval_ms: u64,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        EmbedConfig {
            min_interval_ms: 1300,
        }
    }
}

/// Startup fade-in of the whole surface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FadeConfig {
    pub enabled: bool,
    pub duration_ms: u64,
    /// Opacity at the very first frame.
    pub base_alpha: u8,
}

impl Default for FadeConfig {
    fn default() -> Self {
        FadeConfig {
            enabled: false,
            duration_ms: 3000,
            base_alpha: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PerformanceConfig {
    pub target_fps: u32,
    /// How often the measured frame rate is logged.
    pub fps_report_interval_ms: u64,
    /// Rendered glyphs kept before the cache is flushed.
    pub glyph_cache_limit: usize,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        PerformanceConfig {
            target_fps: 60,
            fps_report_interval_ms: 1000,
            glyph_cache_limit: 32 * 1024,
        }
    }
}
