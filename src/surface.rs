// src/surface.rs

//! Fixed-size RGBA pixel surface.
//!
//! The rain engine owns one persistent surface and a short strip per row.
//! A surface supports exactly what the compositor needs: scroll content
//! downward, blit another bitmap at a signed offset (clipped on every side),
//! and produce an opacity-scaled copy for presentation.

use crate::color::Rgba;
use crate::rasterizer::GlyphBitmap;
use std::io::{self, Write};

const BYTES_PER_PIXEL: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelSurface {
    width_px: usize,
    height_px: usize,
    pixels: Vec<u8>, // width * height * 4 bytes, row-major
}

impl PixelSurface {
    pub fn new(width_px: u32, height_px: u32, fill: Rgba) -> Self {
        let width_px = width_px as usize;
        let height_px = height_px as usize;
        let mut pixels = Vec::with_capacity(width_px * height_px * BYTES_PER_PIXEL);
        for _ in 0..(width_px * height_px) {
            pixels.extend_from_slice(&fill.to_bytes());
        }
        Self {
            width_px,
            height_px,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width_px as u32
    }

    pub fn height(&self) -> u32 {
        self.height_px as u32
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        let idx = (y as usize * self.width_px + x as usize) * BYTES_PER_PIXEL;
        let p = &self.pixels[idx..idx + BYTES_PER_PIXEL];
        Rgba::new(p[0], p[1], p[2], p[3])
    }

    /// Shift every pixel row down by `rows`. Rows shifted past the bottom are
    /// lost; the top `rows` rows keep stale content and must be overwritten.
    pub fn scroll_down(&mut self, rows: u32) {
        let rows = rows as usize;
        if rows == 0 || rows >= self.height_px {
            return;
        }
        let stride = self.width_px * BYTES_PER_PIXEL;
        let kept = (self.height_px - rows) * stride;
        self.pixels.copy_within(0..kept, rows * stride);
    }

    /// Fill an axis-aligned rectangle, clipped to the surface.
    pub fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: Rgba) {
        let Some((x0, x1)) = clip_span(x, width as usize, self.width_px) else {
            return;
        };
        let Some((y0, y1)) = clip_span(y, height as usize, self.height_px) else {
            return;
        };
        let bytes = color.to_bytes();
        for row in y0..y1 {
            let start = (row * self.width_px + x0) * BYTES_PER_PIXEL;
            let end = (row * self.width_px + x1) * BYTES_PER_PIXEL;
            for pixel in self.pixels[start..end].chunks_exact_mut(BYTES_PER_PIXEL) {
                pixel.copy_from_slice(&bytes);
            }
        }
    }

    pub fn blit_glyph(&mut self, glyph: &GlyphBitmap, x: i32, y: i32) {
        self.blit_pixels(&glyph.rgba_data, glyph.width_px, glyph.height_px, x, y);
    }

    pub fn blit_surface(&mut self, src: &PixelSurface, x: i32, y: i32) {
        self.blit_pixels(&src.pixels, src.width_px, src.height_px, x, y);
    }

    /// Copy a `src_width` x `src_height` RGBA block so that its top-left
    /// corner lands at `(x, y)`. Offsets may be negative or run past the
    /// far edges; only the overlapping part is copied.
    fn blit_pixels(&mut self, src: &[u8], src_width: usize, src_height: usize, x: i32, y: i32) {
        let Some((dx0, dx1)) = clip_span(x, src_width, self.width_px) else {
            return;
        };
        let Some((dy0, dy1)) = clip_span(y, src_height, self.height_px) else {
            return;
        };
        let sx0 = (dx0 as i64 - x as i64) as usize;
        let sy0 = (dy0 as i64 - y as i64) as usize;
        let copy_bytes = (dx1 - dx0) * BYTES_PER_PIXEL;

        for (i, dest_y) in (dy0..dy1).enumerate() {
            let src_start = ((sy0 + i) * src_width + sx0) * BYTES_PER_PIXEL;
            let dest_start = (dest_y * self.width_px + dx0) * BYTES_PER_PIXEL;
            self.pixels[dest_start..dest_start + copy_bytes]
                .copy_from_slice(&src[src_start..src_start + copy_bytes]);
        }
    }

    /// Write the surface into `dest` with every color channel scaled by
    /// `opacity / 255` (i.e. composited over black). Alpha is left opaque.
    pub fn write_scaled(&self, dest: &mut [u8], opacity: u8) {
        debug_assert_eq!(dest.len(), self.pixels.len());
        if opacity == u8::MAX {
            dest.copy_from_slice(&self.pixels);
            return;
        }
        let scale = u32::from(opacity);
        for (out, px) in dest
            .chunks_exact_mut(BYTES_PER_PIXEL)
            .zip(self.pixels.chunks_exact(BYTES_PER_PIXEL))
        {
            out[0] = ((u32::from(px[0]) * scale + 127) / 255) as u8;
            out[1] = ((u32::from(px[1]) * scale + 127) / 255) as u8;
            out[2] = ((u32::from(px[2]) * scale + 127) / 255) as u8;
            out[3] = u8::MAX;
        }
    }
}

/// Intersect `[start, start + len)` with `[0, limit)`.
fn clip_span(start: i32, len: usize, limit: usize) -> Option<(usize, usize)> {
    let lo = i64::from(start).max(0);
    let hi = (i64::from(start) + len as i64).min(limit as i64);
    if lo >= hi {
        None
    } else {
        Some((lo as usize, hi as usize))
    }
}

/// Encode an RGBA framebuffer as a binary PPM (P6) image.
pub fn write_ppm<W: Write>(out: &mut W, rgba: &[u8], width_px: u32, height_px: u32) -> io::Result<()> {
    write!(out, "P6\n{} {}\n255\n", width_px, height_px)?;
    let mut rgb = Vec::with_capacity(rgba.len() / BYTES_PER_PIXEL * 3);
    for px in rgba.chunks_exact(BYTES_PER_PIXEL) {
        rgb.extend_from_slice(&px[..3]);
    }
    out.write_all(&rgb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    const RED: Rgba = Rgba::opaque(255, 0, 0);
    const BLUE: Rgba = Rgba::opaque(0, 0, 255);
    const BLACK: Rgba = Rgba::opaque(0, 0, 0);

    /// A surface whose row `y` is filled with gray level `y`.
    fn striped(width: u32, height: u32) -> PixelSurface {
        let mut s = PixelSurface::new(width, height, BLACK);
        for y in 0..height {
            s.fill_rect(0, y as i32, width, 1, Rgba::opaque(y as u8, y as u8, y as u8));
        }
        s
    }

    #[test]
    fn test_scroll_down_shifts_rows() {
        // Contract: content moves down by N rows, bottom rows are discarded
        let mut s = striped(3, 6);
        s.scroll_down(2);
        for y in 2..6 {
            assert_eq!(s.pixel(1, y).r, (y - 2) as u8);
        }
        // Vacated band keeps stale pixels rather than being cleared.
        assert_eq!(s.pixel(0, 0).r, 0);
        assert_eq!(s.pixel(0, 1).r, 1);
    }

    #[test]
    fn test_scroll_by_full_height_is_noop() {
        let mut s = striped(2, 4);
        let before = s.clone();
        s.scroll_down(4);
        assert_eq!(s, before);
    }

    #[test]
    fn test_blit_negative_offset_clips_top() {
        // Contract: a strip blitted above the surface shows only its bottom rows
        let mut dest = PixelSurface::new(4, 4, BLACK);
        let src = striped(4, 3);
        dest.blit_surface(&src, 0, -2);
        assert_eq!(dest.pixel(0, 0).r, 2);
        assert_eq!(dest.pixel(0, 1), BLACK);
    }

    #[test]
    fn test_blit_clips_right_and_bottom() {
        let mut dest = PixelSurface::new(4, 4, BLACK);
        let glyph = GlyphBitmap::filled(3, 3, RED);
        dest.blit_glyph(&glyph, 2, 3);
        assert_eq!(dest.pixel(2, 3), RED);
        assert_eq!(dest.pixel(3, 3), RED);
        assert_eq!(dest.pixel(1, 3), BLACK);
        assert_eq!(dest.pixel(3, 2), BLACK);
    }

    #[test]
    fn test_blit_entirely_outside_is_ignored() {
        let mut dest = PixelSurface::new(4, 4, BLACK);
        let glyph = GlyphBitmap::filled(2, 2, RED);
        dest.blit_glyph(&glyph, -2, 0);
        dest.blit_glyph(&glyph, 0, 4);
        assert_eq!(dest, PixelSurface::new(4, 4, BLACK));
    }

    #[test]
    fn test_blit_negative_x_copies_right_part() {
        let mut dest = PixelSurface::new(4, 1, BLACK);
        let mut glyph = GlyphBitmap::filled(3, 1, RED);
        glyph.set_pixel(2, 0, BLUE);
        dest.blit_glyph(&glyph, -1, 0);
        assert_eq!(dest.pixel(0, 0), RED);
        assert_eq!(dest.pixel(1, 0), BLUE);
        assert_eq!(dest.pixel(2, 0), BLACK);
    }

    #[test]
    fn test_write_scaled() {
        let s = PixelSurface::new(2, 1, Rgba::opaque(200, 100, 0));
        let mut out = vec![0u8; 8];
        s.write_scaled(&mut out, 255);
        assert_eq!(&out[..4], &[200, 100, 0, 255]);
        s.write_scaled(&mut out, 0);
        assert_eq!(&out[..4], &[0, 0, 0, 255]);
        s.write_scaled(&mut out, 128);
        assert_eq!(&out[4..], &[100, 50, 0, 255]);
    }

    #[test]
    fn test_write_ppm_header_and_payload() {
        let s = PixelSurface::new(2, 1, Rgba::opaque(1, 2, 3));
        let mut out = Vec::new();
        write_ppm(&mut out, s.pixels(), 2, 1).unwrap();
        let header = b"P6\n2 1\n255\n";
        assert_eq!(&out[..header.len()], header);
        assert_eq!(&out[header.len()..], &[1, 2, 3, 1, 2, 3]);
    }
}
