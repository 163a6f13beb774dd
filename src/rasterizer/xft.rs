// src/rasterizer/xft.rs
#![allow(non_snake_case)] // Allow non-snake case for X11 types

//! Xft-backed glyph rasterizer.
//!
//! Each glyph is drawn with Xft into an off-screen pixmap sized to the
//! glyph's advance and the font's line height, then read back with
//! `XGetImage`. This is slow per call, which is why the engine only talks to
//! it through a `GlyphCache`.

use crate::color::{Color, Rgba};
use crate::error::{RainError, Result};
use crate::rasterizer::{GlyphBitmap, GlyphRasterizer};
use anyhow::{anyhow, Context};
use log::{debug, info, trace, warn};
use std::ffi::CString;
use std::mem;
use std::os::raw::{c_int, c_ulong};
use std::ptr;
use x11::xrender::{XGlyphInfo, XRenderColor};
use x11::{xft, xlib};

/// Alpha value for fully opaque colors in XRender.
const XRENDER_ALPHA_OPAQUE: u16 = 0xffff;

/// An Xft font together with its own connection to the X server.
pub struct XftRasterizer {
    display: *mut xlib::Display,
    screen: c_int,
    font: *mut xft::XftFont,
    name: String,
}

impl XftRasterizer {
    /// Opens `pattern` (e.g. `"inconsolata:pixelsize=10"`) on the default display.
    pub fn open(pattern: &str) -> anyhow::Result<Self> {
        let c_pattern =
            CString::new(pattern).context("Failed to create CString for font pattern")?;

        // SAFETY: Xlib/Xft FFI calls; every pointer is checked before use and
        // released on the error paths.
        unsafe {
            let display = xlib::XOpenDisplay(ptr::null());
            if display.is_null() {
                return Err(anyhow!("Failed to open X11 display. Is DISPLAY set?"));
            }
            let screen = xlib::XDefaultScreen(display);
            let font = xft::XftFontOpenName(display, screen, c_pattern.as_ptr());
            if font.is_null() {
                xlib::XCloseDisplay(display);
                return Err(anyhow!(
                    "XftFontOpenName failed for font: '{}'. Ensure font is installed and accessible.",
                    pattern
                ));
            }
            info!(
                "XftRasterizer: loaded '{}' (ascent {}, descent {})",
                pattern,
                (*font).ascent,
                (*font).descent
            );
            Ok(Self {
                display,
                screen,
                font,
                name: pattern.to_string(),
            })
        }
    }

    fn failure(ch: char, reason: impl Into<String>) -> RainError {
        RainError::Rasterization {
            ch,
            reason: reason.into(),
        }
    }

    /// Advance width of `text` in pixels.
    unsafe fn advance(&self, text: &CString) -> i32 {
        let mut extents: XGlyphInfo = mem::zeroed();
        xft::XftTextExtentsUtf8(
            self.display,
            self.font,
            text.as_ptr() as *const u8,
            text.as_bytes().len() as c_int,
            &mut extents,
        );
        extents.xOff as i32
    }

    unsafe fn alloc_color(
        &self,
        visual: *mut xlib::Visual,
        colormap: xlib::Colormap,
        color: Color,
    ) -> Option<xft::XftColor> {
        let px = color.to_rgba();
        let render_color = XRenderColor {
            red: u16::from(px.r) * 0x101,
            green: u16::from(px.g) * 0x101,
            blue: u16::from(px.b) * 0x101,
            alpha: XRENDER_ALPHA_OPAQUE,
        };
        let mut xft_color: xft::XftColor = mem::zeroed();
        if xft::XftColorAllocValue(self.display, visual, colormap, &render_color, &mut xft_color)
            == 0
        {
            return None;
        }
        Some(xft_color)
    }
}

impl GlyphRasterizer for XftRasterizer {
    fn render(&mut self, ch: char, fg: Color, bg: Color) -> Result<GlyphBitmap> {
        let mut buf = [0u8; 4];
        let text = CString::new(ch.encode_utf8(&mut buf).as_bytes())
            .map_err(|_| Self::failure(ch, "character contains NUL"))?;

        // SAFETY: all X resources created here are released before returning.
        unsafe {
            let height = self.glyph_height();
            let width = self.advance(&text).max(1) as u32;
            if height == 0 {
                return Err(Self::failure(ch, format!("font '{}' has zero height", self.name)));
            }

            let root = xlib::XRootWindow(self.display, self.screen);
            let visual = xlib::XDefaultVisual(self.display, self.screen);
            let colormap = xlib::XDefaultColormap(self.display, self.screen);
            let depth = xlib::XDefaultDepth(self.display, self.screen) as u32;

            let pixmap = xlib::XCreatePixmap(self.display, root, width, height, depth);
            let draw = xft::XftDrawCreate(self.display, pixmap, visual, colormap);
            if draw.is_null() {
                xlib::XFreePixmap(self.display, pixmap);
                return Err(Self::failure(ch, "XftDrawCreate failed"));
            }

            let (mut xft_fg, mut xft_bg) = match (
                self.alloc_color(visual, colormap, fg),
                self.alloc_color(visual, colormap, bg),
            ) {
                (Some(f), Some(b)) => (f, b),
                _ => {
                    xft::XftDrawDestroy(draw);
                    xlib::XFreePixmap(self.display, pixmap);
                    return Err(Self::failure(ch, "XftColorAllocValue failed"));
                }
            };

            xft::XftDrawRect(draw, &xft_bg, 0, 0, width, height);
            xft::XftDrawStringUtf8(
                draw,
                &xft_fg,
                self.font,
                0,
                (*self.font).ascent,
                text.as_ptr() as *const u8,
                text.as_bytes().len() as c_int,
            );
            xlib::XSync(self.display, xlib::False);

            let image = xlib::XGetImage(
                self.display,
                pixmap,
                0,
                0,
                width,
                height,
                xlib::XAllPlanes(),
                xlib::ZPixmap,
            );

            let result = if image.is_null() {
                Err(Self::failure(ch, "XGetImage failed"))
            } else {
                let masks = (
                    (*visual).red_mask,
                    (*visual).green_mask,
                    (*visual).blue_mask,
                );
                let mut glyph =
                    GlyphBitmap::filled(width as usize, height as usize, bg.to_rgba());
                for y in 0..height as usize {
                    for x in 0..width as usize {
                        let pixel = xlib::XGetPixel(image, x as c_int, y as c_int);
                        glyph.set_pixel(x, y, decode_pixel(pixel, masks));
                    }
                }
                xlib::XDestroyImage(image);
                Ok(glyph)
            };

            xft::XftColorFree(self.display, visual, colormap, &mut xft_fg);
            xft::XftColorFree(self.display, visual, colormap, &mut xft_bg);
            xft::XftDrawDestroy(draw);
            xlib::XFreePixmap(self.display, pixmap);

            trace!("XftRasterizer: rendered {:?} as {}x{}", ch, width, height);
            result
        }
    }

    fn glyph_height(&self) -> u32 {
        // SAFETY: `font` is valid for the lifetime of `self`.
        unsafe { ((*self.font).ascent + (*self.font).descent).max(0) as u32 }
    }
}

impl Drop for XftRasterizer {
    fn drop(&mut self) {
        debug!("XftRasterizer::drop() - closing '{}'", self.name);
        // SAFETY: both pointers were checked non-null at construction.
        unsafe {
            xft::XftFontClose(self.display, self.font);
            xlib::XCloseDisplay(self.display);
        }
    }
}

/// Decode a TrueColor pixel using the visual's channel masks.
fn decode_pixel(pixel: c_ulong, (r, g, b): (c_ulong, c_ulong, c_ulong)) -> Rgba {
    Rgba::opaque(
        mask_channel(pixel, r),
        mask_channel(pixel, g),
        mask_channel(pixel, b),
    )
}

fn mask_channel(pixel: c_ulong, mask: c_ulong) -> u8 {
    if mask == 0 {
        warn!("Visual has an empty channel mask");
        return 0;
    }
    let shift = mask.trailing_zeros();
    let bits = (mask >> shift).count_ones();
    let value = (pixel & mask) >> shift;
    if bits >= 8 {
        (value >> (bits - 8)) as u8
    } else {
        (value << (8 - bits)) as u8
    }
}
