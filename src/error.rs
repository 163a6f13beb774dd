// src/error.rs

//! Faults raised by the rain engine itself.
//!
//! None of these are recoverable: the frame loop stops on the first one.
//! Platform-level failures (X11, file IO, config parsing) stay in `anyhow`.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RainError {
    #[error("surface must have a non-zero size, got {width}x{height}")]
    ZeroSurface { width: u32, height: u32 },

    #[error("{font} font reports a zero glyph dimension ({width}x{height})")]
    ZeroGlyphDimension {
        font: &'static str,
        width: u32,
        height: u32,
    },

    #[error("surface of {surface_width}px cannot hold a single {glyph_width}px column")]
    NoColumns { surface_width: u32, glyph_width: u32 },

    #[error("embed fragment {fragment:?} has {chars} characters but a row only has {columns} columns")]
    EmbedTooLong {
        fragment: String,
        chars: usize,
        columns: usize,
    },

    #[error("embed fragment {fragment:?} contains control character {ch:?}")]
    EmbedControlChar { fragment: String, ch: char },

    #[error("invalid rain colors: {reason}")]
    InvalidRainConfig { reason: String },

    #[error("glyph rasterization failed for {ch:?}: {reason}")]
    Rasterization { ch: char, reason: String },
}

pub type Result<T> = std::result::Result<T, RainError>;
