// src/rain/mod.rs

//! The digital-rain engine.
//!
//! - `row`: per-column glyph/color generation and the decay model
//! - `embed`: cadence of embedded text fragments
//! - `compositor`: persistent surface, sub-row scrolling, row hand-over
//! - `fade`: optional startup fade-in

pub mod compositor;
pub mod embed;
pub mod fade;
pub mod row;

pub use compositor::ScrollCompositor;
pub use embed::TextEmbedScheduler;
pub use fade::FadeController;
pub use row::{Cell, FontRole, RowBuffer, RowGenerator, RAIN_ALPHABET};
