//! Font metrics shared by every row.

use crate::error::{RainError, Result};
use crate::rasterizer::GlyphRasterizer;
use log::info;

/// Maximum glyph cell across the rain and text fonts.
///
/// Measured once at startup from one representative character per font and
/// never recomputed: the column grid depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphMetrics {
    pub max_width: u32,
    pub max_height: u32,
    pub rain_height: u32,
    pub text_height: u32,
}

impl GlyphMetrics {
    pub fn measure(
        rain: &mut dyn GlyphRasterizer,
        rain_sample: char,
        text: &mut dyn GlyphRasterizer,
        text_sample: char,
    ) -> Result<Self> {
        let (rain_width, rain_sample_height) = rain.glyph_size(rain_sample)?;
        let (text_width, text_sample_height) = text.glyph_size(text_sample)?;
        let rain_height = rain.glyph_height();
        let text_height = text.glyph_height();

        check("rain", rain_width, rain_height.min(rain_sample_height))?;
        check("text", text_width, text_height.min(text_sample_height))?;

        let metrics = GlyphMetrics {
            max_width: rain_width.max(text_width),
            max_height: rain_height.max(text_height),
            rain_height,
            text_height,
        };
        info!(
            "Glyph metrics: rain {}x{}, text {}x{}, cell {}x{}",
            rain_width, rain_height, text_width, text_height, metrics.max_width, metrics.max_height
        );
        Ok(metrics)
    }

    /// Number of columns that fit in `row_width_px`.
    pub fn columns_for(&self, row_width_px: u32) -> usize {
        (row_width_px / self.max_width) as usize
    }
}

fn check(font: &'static str, width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(RainError::ZeroGlyphDimension {
            font,
            width,
            height,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::BlockRasterizer;
    use test_log::test;

    #[test]
    fn test_measure_takes_max_of_both_fonts() {
        let mut rain = BlockRasterizer::new(10, 11);
        let mut text = BlockRasterizer::new(6, 14);
        let m = GlyphMetrics::measure(&mut rain, '\u{3041}', &mut text, 'D').unwrap();
        assert_eq!(m.max_width, 10);
        assert_eq!(m.max_height, 14);
        assert_eq!((m.rain_height, m.text_height), (11, 14));
    }

    #[test]
    fn test_columns_floor_division() {
        let mut rain = BlockRasterizer::new(10, 10);
        let mut text = BlockRasterizer::new(5, 10);
        let m = GlyphMetrics::measure(&mut rain, 'a', &mut text, 'D').unwrap();
        assert_eq!(m.columns_for(100), 10);
        assert_eq!(m.columns_for(109), 10);
        assert_eq!(m.columns_for(9), 0);
    }

    #[test]
    fn test_zero_width_font_rejected() {
        let mut rain = BlockRasterizer::new(0, 10);
        let mut text = BlockRasterizer::new(5, 10);
        let err = GlyphMetrics::measure(&mut rain, 'a', &mut text, 'D').unwrap_err();
        assert_eq!(
            err,
            RainError::ZeroGlyphDimension {
                font: "rain",
                width: 0,
                height: 10
            }
        );
    }

    #[test]
    fn test_zero_height_text_font_rejected() {
        let mut rain = BlockRasterizer::new(8, 10);
        let mut text = BlockRasterizer::new(5, 0);
        let err = GlyphMetrics::measure(&mut rain, 'a', &mut text, 'D').unwrap_err();
        assert!(matches!(err, RainError::ZeroGlyphDimension { font: "text", .. }));
    }
}
