//! Glyph rasterization for the rain engine.
//!
//! The engine never talks to a font library directly. It consumes two
//! [`GlyphRasterizer`]s (one for the rain alphabet, one for embedded text)
//! and memoises their output through a [`GlyphCache`]:
//!
//! ```text
//! (char, fg, bg)  →  [GlyphCache]  →  hit: &GlyphBitmap
//!                         │
//!                         └─ miss →  [GlyphRasterizer]  →  GlyphBitmap
//! ```
//!
//! Rasterizers are assumed deterministic for a given `(char, fg, bg)`, which
//! is what makes the cache sound.

pub mod headless;
pub mod metrics;
#[cfg(feature = "x11")]
pub mod xft;

pub use headless::BlockRasterizer;
pub use metrics::GlyphMetrics;

use crate::color::{Color, Rgba};
use crate::error::Result;
use log::{debug, trace};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Renders single characters into fixed-height RGBA bitmaps.
pub trait GlyphRasterizer {
    /// Rasterize `ch` as `fg` on a `bg` filled box.
    ///
    /// The returned bitmap is `glyph_height()` pixels tall; its width is the
    /// advance of the character.
    fn render(&mut self, ch: char, fg: Color, bg: Color) -> Result<GlyphBitmap>;

    /// Line height of the font in pixels.
    fn glyph_height(&self) -> u32;

    /// Pixel size of `ch`, used to measure the font once at startup.
    fn glyph_size(&mut self, ch: char) -> Result<(u32, u32)> {
        let glyph = self.render(ch, Color::new(255, 255, 255), Color::BLACK)?;
        Ok((glyph.width_px as u32, glyph.height_px as u32))
    }
}

impl<R: GlyphRasterizer + ?Sized> GlyphRasterizer for Box<R> {
    fn render(&mut self, ch: char, fg: Color, bg: Color) -> Result<GlyphBitmap> {
        (**self).render(ch, fg, bg)
    }

    fn glyph_height(&self) -> u32 {
        (**self).glyph_height()
    }

    fn glyph_size(&mut self, ch: char) -> Result<(u32, u32)> {
        (**self).glyph_size(ch)
    }
}

/// A pre-rendered glyph as RGBA pixel data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphBitmap {
    pub width_px: usize,
    pub height_px: usize,
    pub rgba_data: Vec<u8>, // width * height * 4 bytes
}

impl GlyphBitmap {
    /// A bitmap of the given size filled with a single color.
    pub fn filled(width_px: usize, height_px: usize, color: Rgba) -> Self {
        let mut rgba_data = Vec::with_capacity(width_px * height_px * 4);
        for _ in 0..(width_px * height_px) {
            rgba_data.extend_from_slice(&color.to_bytes());
        }
        Self {
            width_px,
            height_px,
            rgba_data,
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> Rgba {
        let idx = (y * self.width_px + x) * 4;
        let p = &self.rgba_data[idx..idx + 4];
        Rgba::new(p[0], p[1], p[2], p[3])
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, color: Rgba) {
        let idx = (y * self.width_px + x) * 4;
        self.rgba_data[idx..idx + 4].copy_from_slice(&color.to_bytes());
    }
}

/// A key for caching rendered glyphs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct GlyphKey {
    codepoint: char,
    fg: Color,
    bg: Color,
}

/// Memoising front for a boxed rasterizer.
///
/// The rain palette is small (one alphabet, ~180 greens) so the cache
/// converges quickly; `limit` bounds it anyway by flushing when full.
pub struct GlyphCache {
    rasterizer: Box<dyn GlyphRasterizer>,
    glyphs: HashMap<GlyphKey, GlyphBitmap>,
    limit: usize,
}

impl GlyphCache {
    pub fn new(rasterizer: Box<dyn GlyphRasterizer>, limit: usize) -> Self {
        Self {
            rasterizer,
            glyphs: HashMap::new(),
            limit: limit.max(1),
        }
    }

    /// Render a single character, reusing a previous rendering when possible.
    pub fn render(&mut self, ch: char, fg: Color, bg: Color) -> Result<&GlyphBitmap> {
        let key = GlyphKey {
            codepoint: ch,
            fg,
            bg,
        };

        if self.glyphs.len() >= self.limit && !self.glyphs.contains_key(&key) {
            debug!("GlyphCache: {} entries reached, flushing", self.glyphs.len());
            self.glyphs.clear();
        }

        match self.glyphs.entry(key) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                trace!("GlyphCache: rasterizing {:?} fg={:?}", ch, fg);
                let glyph = self.rasterizer.render(ch, fg, bg)?;
                Ok(entry.insert(glyph))
            }
        }
    }

    pub fn glyph_height(&self) -> u32 {
        self.rasterizer.glyph_height()
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Clear the glyph cache (e.g., when font changes)
    pub fn clear(&mut self) {
        self.glyphs.clear();
    }
}
