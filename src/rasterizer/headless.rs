//! Headless block rasterizer.
//!
//! Draws a filled, codepoint-dependent pattern inside a fixed cell instead of
//! real outlines. Used by the headless display driver and by tests, where
//! only glyph geometry and color matter.

use crate::color::Color;
use crate::error::{RainError, Result};
use crate::rasterizer::{GlyphBitmap, GlyphRasterizer};

#[derive(Debug, Clone)]
pub struct BlockRasterizer {
    cell_width_px: u32,
    cell_height_px: u32,
}

impl BlockRasterizer {
    pub fn new(cell_width_px: u32, cell_height_px: u32) -> Self {
        Self {
            cell_width_px,
            cell_height_px,
        }
    }
}

impl GlyphRasterizer for BlockRasterizer {
    fn render(&mut self, ch: char, fg: Color, bg: Color) -> Result<GlyphBitmap> {
        if ch.is_control() {
            return Err(RainError::Rasterization {
                ch,
                reason: "control characters have no glyph".to_string(),
            });
        }

        let width = self.cell_width_px as usize;
        let height = self.cell_height_px as usize;
        let mut glyph = GlyphBitmap::filled(width, height, bg.to_rgba());
        if ch.is_whitespace() || width == 0 || height == 0 {
            return Ok(glyph);
        }

        // Block in the middle half of the cell, punched by a codepoint-keyed
        // diagonal pattern so different characters give different pixels.
        let code = ch as usize;
        let fg_px = fg.to_rgba();
        for y in height / 4..(height * 3 / 4).max(height / 4 + 1) {
            for x in width / 4..(width * 3 / 4).max(width / 4 + 1) {
                if (x + y + code) % 3 != 0 {
                    glyph.set_pixel(x, y, fg_px);
                }
            }
        }
        Ok(glyph)
    }

    fn glyph_height(&self) -> u32 {
        self.cell_height_px
    }
}
