// src/rain/compositor.rs

//! Sub-row scrolling composition of generated rows.
//!
//! Every tick the whole surface moves down by a fifth of a row and the
//! current row strip is redrawn into the exposed band, so a new row slides
//! in over several frames instead of appearing at once:
//!
//! ```text
//!  tick n            tick n+1
//! ┌──────────┐      ┌──────────┐
//! │▒▒ row k ▒│      │▒▒▒ k ▒▒▒▒│  ← strip drawn at row_portion - row_height
//! │ row k-1  │      │▒▒ k ▒▒▒▒▒│
//! │ row k-2  │  →   │ row k-1  │
//! └──────────┘      └──────────┘
//! ```

use crate::error::{RainError, Result};
use crate::rain::embed::TextEmbedScheduler;
use crate::rain::row::{RowBuffer, RowGenerator};
use crate::surface::PixelSurface;
use log::{debug, info, trace};

/// Owns the persistent surface and drives row generation.
///
/// Invariant: the per-tick scroll step never exceeds the row height. The
/// row wrap below subtracts a single row height, which is only a correct
/// remainder under that assumption.
pub struct ScrollCompositor {
    surface: PixelSurface,
    generator: RowGenerator,
    scheduler: TextEmbedScheduler,
    row: RowBuffer,
    row_portion: u32,
    row_height: u32,
    rows_generated: u64,
    scrolled_px: u64,
}

impl ScrollCompositor {
    /// Builds the compositor for a surface as wide as the generator's rows
    /// and `height_px` tall, and generates the first row.
    pub fn new(
        mut generator: RowGenerator,
        scheduler: TextEmbedScheduler,
        height_px: u32,
    ) -> Result<Self> {
        let width_px = generator.row_width();
        if width_px == 0 || height_px == 0 {
            return Err(RainError::ZeroSurface {
                width: width_px,
                height: height_px,
            });
        }
        for fragment in scheduler.fragments() {
            generator.check_embed(fragment)?;
        }

        let row = generator.generate(None, None)?;
        let row_height = row.height();
        let surface = PixelSurface::new(width_px, height_px, generator.background().to_rgba());

        info!(
            "ScrollCompositor: {}x{} surface, {} columns, row height {}",
            width_px,
            height_px,
            generator.columns(),
            row_height
        );

        Ok(Self {
            surface,
            generator,
            scheduler,
            row,
            row_portion: 0,
            row_height,
            rows_generated: 0,
            scrolled_px: 0,
        })
    }

    /// Pixels the surface moves per tick for the current row height.
    pub fn advance_size(&self) -> u32 {
        (self.row_height / 5).max(1)
    }

    /// Advance the animation by one frame.
    pub fn tick(&mut self) -> Result<()> {
        let advance = self.advance_size();
        debug_assert!(advance <= self.row_height);

        self.surface.scroll_down(advance);
        self.row_portion += advance;
        self.scrolled_px += u64::from(advance);

        if self.row_portion > self.row_height {
            // Finish the row that just scrolled fully into view.
            self.surface
                .blit_surface(self.row.strip(), 0, self.row_offset());
            self.row_portion = self.row_height.abs_diff(self.row_portion);

            // Keep the current row intact until its successor exists, so a
            // failed generation leaves the compositor consistent.
            let previous = self.row.colors().to_vec();
            let embed = self.scheduler.maybe_embed();
            self.row = self.generator.generate(Some(previous), embed)?;
            self.row_height = self.row.height();
            self.rows_generated += 1;
            debug!(
                "ScrollCompositor: row {} generated (portion {})",
                self.rows_generated, self.row_portion
            );
        }

        self.surface
            .blit_surface(self.row.strip(), 0, self.row_offset());
        trace!(
            "ScrollCompositor: tick advance={} portion={}",
            advance,
            self.row_portion
        );
        Ok(())
    }

    /// Vertical offset of the current strip: negative while it is still
    /// partly above the top edge.
    fn row_offset(&self) -> i32 {
        self.row_portion as i32 - self.row_height as i32
    }

    pub fn surface(&self) -> &PixelSurface {
        &self.surface
    }

    pub fn current_row(&self) -> &RowBuffer {
        &self.row
    }

    pub fn columns(&self) -> usize {
        self.generator.columns()
    }

    pub fn row_portion(&self) -> u32 {
        self.row_portion
    }

    pub fn row_height(&self) -> u32 {
        self.row_height
    }

    /// Rows generated on row boundaries; the initial row is not counted.
    pub fn rows_generated(&self) -> u64 {
        self.rows_generated
    }

    /// Total scroll distance since construction.
    pub fn scrolled_px(&self) -> u64 {
        self.scrolled_px
    }
}
