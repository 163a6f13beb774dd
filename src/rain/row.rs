// src/rain/row.rs

//! Row generation: picks a glyph and a color for every column, rasterizes
//! them into a pixel strip and optionally overlays an embedded text fragment.

use crate::color::{Color, Point};
use crate::config::RainConfig;
use crate::error::{RainError, Result};
use crate::rasterizer::{GlyphCache, GlyphMetrics, GlyphRasterizer};
use crate::surface::PixelSurface;
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::Range;

/// Hiragana block the rain glyphs are drawn from (end exclusive).
pub const RAIN_ALPHABET: Range<char> = '\u{3041}'..'\u{308F}';

/// Which rasterizer drew a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontRole {
    Rain,
    Text,
}

/// What ended up in one column of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Color,
    pub font: FontRole,
}

/// One generated row: the per-column rain colors that seed the next decay
/// step, what was drawn in each column, and the rasterized strip.
#[derive(Debug, Clone)]
pub struct RowBuffer {
    colors: Vec<Color>,
    cells: Vec<Cell>,
    strip: PixelSurface,
}

impl RowBuffer {
    /// Rain colors, one per column. Embedded text does not show up here.
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn strip(&self) -> &PixelSurface {
        &self.strip
    }

    /// Authoritative height of this row in pixels.
    pub fn height(&self) -> u32 {
        self.strip.height()
    }

    pub fn columns(&self) -> usize {
        self.colors.len()
    }

    /// Moves the color state out so it can seed the next row.
    pub fn into_colors(self) -> Vec<Color> {
        self.colors
    }

}

/// Produces rows for a fixed row width and font pair.
pub struct RowGenerator {
    rain: GlyphCache,
    text: GlyphCache,
    metrics: GlyphMetrics,
    row_width: u32,
    columns: usize,
    rain_config: RainConfig,
    rng: StdRng,
}

impl RowGenerator {
    pub fn new(
        rain: Box<dyn GlyphRasterizer>,
        text: Box<dyn GlyphRasterizer>,
        metrics: GlyphMetrics,
        row_width: u32,
        rain_config: &RainConfig,
        glyph_cache_limit: usize,
    ) -> Result<Self> {
        if row_width == 0 {
            return Err(RainError::ZeroSurface {
                width: row_width,
                height: metrics.max_height,
            });
        }
        let columns = metrics.columns_for(row_width);
        if columns == 0 {
            return Err(RainError::NoColumns {
                surface_width: row_width,
                glyph_width: metrics.max_width,
            });
        }

        validate_colors(rain_config)?;

        let rng = match rain_config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        debug!(
            "RowGenerator: {} columns across {}px (seed {:?})",
            columns, row_width, rain_config.seed
        );

        Ok(Self {
            rain: GlyphCache::new(rain, glyph_cache_limit),
            text: GlyphCache::new(text, glyph_cache_limit),
            metrics,
            row_width,
            columns,
            rain_config: rain_config.clone(),
            rng,
        })
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn row_width(&self) -> u32 {
        self.row_width
    }

    /// Height every generated row has: the taller of the two fonts.
    pub fn row_height(&self) -> u32 {
        self.metrics.max_height
    }

    pub fn metrics(&self) -> &GlyphMetrics {
        &self.metrics
    }

    pub fn background(&self) -> Color {
        self.rain_config.background
    }

    /// Rejects fragments that cannot be placed in a single row or that hold
    /// characters no font can draw.
    pub fn check_embed(&self, fragment: &str) -> Result<()> {
        if let Some(ch) = fragment.chars().find(|c| c.is_control()) {
            return Err(RainError::EmbedControlChar {
                fragment: fragment.to_string(),
                ch,
            });
        }
        let chars = fragment.chars().count();
        if chars > self.columns {
            return Err(RainError::EmbedTooLong {
                fragment: fragment.to_string(),
                chars,
                columns: self.columns,
            });
        }
        Ok(())
    }

    /// Generate the next row.
    ///
    /// With no `previous` state every column gets a fresh random green;
    /// otherwise each column's color is the decayed previous color.
    ///
    /// # Panics
    /// If `previous` does not have exactly one color per column.
    pub fn generate(&mut self, previous: Option<Vec<Color>>, embed: Option<&str>) -> Result<RowBuffer> {
        if let Some(previous) = &previous {
            assert_eq!(
                previous.len(),
                self.columns,
                "previous row has {} columns, generator has {}",
                previous.len(),
                self.columns
            );
        }
        let embed = embed.filter(|text| !text.is_empty());
        if let Some(text) = embed {
            self.check_embed(text)?;
        }

        let cell_height = self.metrics.max_height;
        let cell_width = f64::from(self.row_width) / self.columns as f64;
        let background = self.rain_config.background;
        let mut strip = PixelSurface::new(self.row_width, cell_height, background.to_rgba());
        let mut cells = Vec::with_capacity(self.columns);

        let colors: Vec<Color> = match previous {
            Some(previous) => previous
                .into_iter()
                .map(|c| {
                    c.decayed(self.rain_config.decay_floor, self.rain_config.decay_reset)
                })
                .collect(),
            None => (0..self.columns)
                .map(|_| {
                    let g = self.rng.gen_range(
                        self.rain_config.initial_green_min..self.rain_config.initial_green_max,
                    );
                    Color::new(0, g, 0)
                })
                .collect(),
        };

        for (i, &fg) in colors.iter().enumerate() {
            let ch = self.rng.gen_range(RAIN_ALPHABET);
            let glyph = self.rain.render(ch, fg, background)?;
            let at = place(cell_width, cell_height, i, glyph.width_px, glyph.height_px);
            strip.blit_glyph(glyph, at.x, at.y);
            cells.push(Cell {
                ch,
                fg,
                font: FontRole::Rain,
            });
        }

        if let Some(text) = embed {
            let chars: Vec<char> = text.chars().collect();
            let start = self.rng.gen_range(0..=self.columns - chars.len());
            let embed_color = self.rain_config.embed_color;
            debug!("RowGenerator: embedding {:?} at column {}", text, start);

            for (offset, &ch) in chars.iter().enumerate() {
                let column = start + offset;
                let cell_x = (cell_width * column as f64) as i32;
                let next_x = (cell_width * (column + 1) as f64) as i32;
                strip.fill_rect(
                    cell_x,
                    0,
                    (next_x - cell_x).max(0) as u32,
                    cell_height,
                    background.to_rgba(),
                );
                let glyph = self.text.render(ch, embed_color, background)?;
                let at = place(cell_width, cell_height, column, glyph.width_px, glyph.height_px);
                strip.blit_glyph(glyph, at.x, at.y);
                cells[column] = Cell {
                    ch,
                    fg: embed_color,
                    font: FontRole::Text,
                };
            }
        }

        trace!("RowGenerator: generated row of {} columns", colors.len());
        Ok(RowBuffer {
            colors,
            cells,
            strip,
        })
    }
}

/// The first-row green range must be non-empty and the decay floor must sit
/// below the reset value, otherwise the per-column pulse degenerates.
fn validate_colors(config: &RainConfig) -> Result<()> {
    if config.initial_green_min >= config.initial_green_max {
        return Err(RainError::InvalidRainConfig {
            reason: format!(
                "initial_green_min ({}) must be below initial_green_max ({})",
                config.initial_green_min, config.initial_green_max
            ),
        });
    }
    if config.decay_floor >= config.decay_reset {
        return Err(RainError::InvalidRainConfig {
            reason: format!(
                "decay_floor ({}) must be below decay_reset ({})",
                config.decay_floor, config.decay_reset
            ),
        });
    }
    Ok(())
}

/// Top-left pixel of a glyph centered in column `index`.
///
/// Cell width stays fractional until here so rounding error is spread over
/// the row instead of piling up at the right edge.
fn place(cell_width: f64, cell_height: u32, index: usize, glyph_width: usize, glyph_height: usize) -> Point {
    let x = (cell_width * index as f64 + (cell_width - glyph_width as f64) / 2.0) as i32;
    let y = (cell_height as i32 - glyph_height as i32) / 2;
    Point::new(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::BlockRasterizer;
    use test_log::test;

    fn generator(width: u32, rain_cell: (u32, u32), text_cell: (u32, u32), seed: u64) -> RowGenerator {
        let mut rain = BlockRasterizer::new(rain_cell.0, rain_cell.1);
        let mut text = BlockRasterizer::new(text_cell.0, text_cell.1);
        let metrics = GlyphMetrics::measure(&mut rain, '\u{3041}', &mut text, 'D').unwrap();
        let config = RainConfig {
            seed: Some(seed),
            ..RainConfig::default()
        };
        RowGenerator::new(Box::new(rain), Box::new(text), metrics, width, &config, 1024).unwrap()
    }

    #[test]
    fn test_first_row_colors() {
        // Contract: fresh rows have r = b = 0 and g in [10, 190)
        let mut gen = generator(100, (10, 12), (6, 12), 1);
        let row = gen.generate(None, None).unwrap();
        assert_eq!(row.columns(), 10);
        for c in row.colors() {
            assert_eq!((c.r, c.b), (0, 0));
            assert!((10..190).contains(&c.g), "g = {}", c.g);
        }
    }

    #[test]
    fn test_second_row_decays_previous() {
        // Contract: each column's green drops by one (or resets), r and b carry over
        let mut gen = generator(100, (10, 12), (6, 12), 2);
        let first = gen.generate(None, None).unwrap();
        let before = first.colors().to_vec();
        let second = gen.generate(Some(first.into_colors()), None).unwrap();
        for (old, new) in before.iter().zip(second.colors()) {
            let expected = if old.g > 10 { old.g - 1 } else { 190 };
            assert_eq!(new.g, expected);
            assert_eq!((new.r, new.b), (old.r, old.b));
        }
    }

    #[test]
    fn test_decay_keeps_nonzero_red_and_blue() {
        let mut gen = generator(40, (10, 12), (6, 12), 3);
        let previous = vec![Color::new(7, 10, 9); 4];
        let row = gen.generate(Some(previous), None).unwrap();
        assert!(row.colors().iter().all(|c| *c == Color::new(7, 190, 9)));
    }

    #[test]
    #[should_panic(expected = "previous row has 3 columns")]
    fn test_mismatched_previous_row_panics() {
        let mut gen = generator(40, (10, 12), (6, 12), 4);
        let _ = gen.generate(Some(vec![Color::BLACK; 3]), None);
    }

    #[test]
    fn test_rain_glyphs_come_from_alphabet() {
        let mut gen = generator(200, (10, 12), (6, 12), 5);
        let row = gen.generate(None, None).unwrap();
        for cell in row.cells() {
            assert!(RAIN_ALPHABET.contains(&cell.ch));
            assert_eq!(cell.font, FontRole::Rain);
        }
    }

    #[test]
    fn test_strip_height_is_tallest_font() {
        let mut gen = generator(100, (10, 11), (6, 15), 6);
        let row = gen.generate(None, None).unwrap();
        assert_eq!(row.height(), 15);
        assert_eq!(row.strip().width(), 100);
        assert_eq!(gen.row_height(), 15);
    }

    #[test]
    fn test_embed_overlays_text_columns() {
        // Contract: "HI" lands on two adjacent columns in the text font and
        // embed color; the other columns stay rain
        let mut gen = generator(100, (10, 12), (6, 12), 7);
        let row = gen.generate(None, Some("HI")).unwrap();
        let text_columns: Vec<usize> = row
            .cells()
            .iter()
            .enumerate()
            .filter(|(_, c)| c.font == FontRole::Text)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(text_columns.len(), 2);
        let start = text_columns[0];
        assert_eq!(text_columns[1], start + 1);
        assert_eq!(row.cells()[start].ch, 'H');
        assert_eq!(row.cells()[start + 1].ch, 'I');
        for (i, cell) in row.cells().iter().enumerate() {
            if i == start || i == start + 1 {
                assert_eq!(cell.fg, Color::BRIGHT_GREEN);
            } else {
                assert_eq!(cell.font, FontRole::Rain);
                assert_eq!(cell.fg, row.colors()[i]);
            }
        }
    }

    #[test]
    fn test_embed_not_tracked_for_decay() {
        // Contract: the color state of embedded columns is still the rain color
        let mut gen = generator(100, (10, 12), (6, 12), 8);
        let row = gen.generate(None, Some("HELLO")).unwrap();
        assert!(row.colors().iter().all(|c| c.g < 190 && c.r == 0));
        let next = gen.generate(Some(row.into_colors()), None).unwrap();
        assert!(next.cells().iter().all(|c| c.font == FontRole::Rain));
    }

    #[test]
    fn test_embed_pixels_use_embed_color() {
        let mut gen = generator(100, (10, 12), (6, 12), 9);
        let row = gen.generate(None, Some("W")).unwrap();
        let column = row.cells().iter().position(|c| c.font == FontRole::Text).unwrap();
        let strip = row.strip();
        let green = Color::BRIGHT_GREEN.to_rgba();
        let x0 = column as u32 * 10;
        let hits = (x0..x0 + 10)
            .flat_map(|x| (0..12).map(move |y| (x, y)))
            .filter(|&(x, y)| strip.pixel(x, y) == green)
            .count();
        assert!(hits > 0);
    }

    #[test]
    fn test_embed_filling_whole_row() {
        let mut gen = generator(30, (10, 12), (6, 12), 10);
        let row = gen.generate(None, Some("ABC")).unwrap();
        assert!(row.cells().iter().all(|c| c.font == FontRole::Text));
    }

    #[test]
    fn test_embed_too_long_rejected() {
        let mut gen = generator(30, (10, 12), (6, 12), 11);
        let err = gen.generate(None, Some("ABCD")).unwrap_err();
        assert_eq!(
            err,
            RainError::EmbedTooLong {
                fragment: "ABCD".to_string(),
                chars: 4,
                columns: 3
            }
        );
    }

    #[test]
    fn test_embed_with_control_character_rejected() {
        // Contract: fragments a font cannot draw fail before any row is built
        let gen = generator(100, (10, 12), (6, 12), 13);
        assert_eq!(
            gen.check_embed("WAKE\tUP"),
            Err(RainError::EmbedControlChar {
                fragment: "WAKE\tUP".to_string(),
                ch: '\t'
            })
        );
        assert!(gen.check_embed("WAKE UP").is_ok());
    }

    fn generator_with(config: RainConfig) -> Result<RowGenerator> {
        let mut rain = BlockRasterizer::new(10, 12);
        let mut text = BlockRasterizer::new(6, 12);
        let metrics = GlyphMetrics::measure(&mut rain, 'a', &mut text, 'D').unwrap();
        RowGenerator::new(Box::new(rain), Box::new(text), metrics, 100, &config, 16)
    }

    #[test]
    fn test_empty_initial_green_range_rejected() {
        // Contract: a degenerate color config is a construction error, never
        // a panic on the first row
        let config: RainConfig =
            serde_json::from_str(r#"{"initial_green_min":190,"initial_green_max":190}"#).unwrap();
        let err = generator_with(config).err().unwrap();
        assert!(matches!(err, RainError::InvalidRainConfig { .. }));
    }

    #[test]
    fn test_decay_floor_at_or_above_reset_rejected() {
        let config = RainConfig {
            decay_floor: 190,
            decay_reset: 190,
            ..RainConfig::default()
        };
        let err = generator_with(config).err().unwrap();
        assert!(matches!(err, RainError::InvalidRainConfig { .. }));
        assert!(generator_with(RainConfig::default()).is_ok());
    }

    #[test]
    fn test_empty_embed_is_ignored() {
        let mut gen = generator(30, (10, 12), (6, 12), 12);
        let row = gen.generate(None, Some("")).unwrap();
        assert!(row.cells().iter().all(|c| c.font == FontRole::Rain));
    }

    #[test]
    fn test_zero_width_rejected() {
        let mut rain = BlockRasterizer::new(10, 12);
        let mut text = BlockRasterizer::new(6, 12);
        let metrics = GlyphMetrics::measure(&mut rain, 'a', &mut text, 'D').unwrap();
        let err = RowGenerator::new(Box::new(rain), Box::new(text), metrics, 0, &RainConfig::default(), 16)
            .err()
            .unwrap();
        assert!(matches!(err, RainError::ZeroSurface { width: 0, .. }));
    }

    #[test]
    fn test_narrower_than_glyph_rejected() {
        let mut rain = BlockRasterizer::new(10, 12);
        let mut text = BlockRasterizer::new(6, 12);
        let metrics = GlyphMetrics::measure(&mut rain, 'a', &mut text, 'D').unwrap();
        let err = RowGenerator::new(Box::new(rain), Box::new(text), metrics, 9, &RainConfig::default(), 16)
            .err()
            .unwrap();
        assert_eq!(
            err,
            RainError::NoColumns {
                surface_width: 9,
                glyph_width: 10
            }
        );
    }

    #[test]
    fn test_same_seed_same_row() {
        let mut a = generator(100, (10, 12), (6, 12), 42);
        let mut b = generator(100, (10, 12), (6, 12), 42);
        let ra = a.generate(None, Some("HI")).unwrap();
        let rb = b.generate(None, Some("HI")).unwrap();
        assert_eq!(ra.colors(), rb.colors());
        assert_eq!(ra.cells(), rb.cells());
        assert_eq!(ra.strip(), rb.strip());
    }

    #[test]
    fn test_place_centers_glyph() {
        // 100px / 7 columns: cells are ~14.29px wide
        let cell = 100.0 / 7.0;
        assert_eq!(place(cell, 12, 0, 10, 12), Point::new(2, 0));
        assert_eq!(place(cell, 12, 1, 10, 8), Point::new(16, 2));
    }
}
