// src/app.rs

//! The frame loop: ticks the rain, applies the startup fade and hands each
//! frame to the display.

use crate::clock::Clock;
use crate::config::PerformanceConfig;
use crate::display::{DisplayError, DisplayManager, RenderSnapshot};
use crate::rain::{FadeController, ScrollCompositor};
use crate::surface::write_ppm;
use anyhow::{anyhow, Context, Result};
use log::{debug, error, info};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

/// Outcome of a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppStatus {
    Running,
    Shutdown,
}

pub struct MatrixApp {
    compositor: ScrollCompositor,
    fade: Option<FadeController>,
    display: DisplayManager,
    snapshot: Option<RenderSnapshot>,
    clock: Rc<dyn Clock>,
    /// Zero disables pacing.
    frame_duration: Duration,
    fps_report_interval_ms: u64,
    frames: u64,
    fps_window_start_ms: u64,
    fps_window_frames: u64,
}

impl MatrixApp {
    pub fn new(
        compositor: ScrollCompositor,
        fade: Option<FadeController>,
        display: DisplayManager,
        clock: Rc<dyn Clock>,
        performance: &PerformanceConfig,
    ) -> Result<Self> {
        let metrics = display.metrics();
        let surface = compositor.surface();
        if (metrics.width_px, metrics.height_px) != (surface.width(), surface.height()) {
            return Err(anyhow!(
                "Display is {}x{} but the rain surface is {}x{}",
                metrics.width_px,
                metrics.height_px,
                surface.width(),
                surface.height()
            ));
        }

        let frame_duration = if performance.target_fps == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(1.0 / f64::from(performance.target_fps))
        };
        info!(
            "MatrixApp: target {} FPS, fade {}",
            performance.target_fps,
            if fade.is_some() { "on" } else { "off" }
        );

        let snapshot = Some(display.new_snapshot());
        let fps_window_start_ms = clock.now_ms();
        Ok(Self {
            compositor,
            fade,
            display,
            snapshot,
            clock,
            frame_duration,
            fps_report_interval_ms: performance.fps_report_interval_ms,
            frames: 0,
            fps_window_start_ms,
            fps_window_frames: 0,
        })
    }

    /// Runs frames until the window is closed, `max_frames` is reached or a
    /// frame fails. Returns the number of frames presented, or the error that
    /// stopped the loop.
    pub fn run(&mut self, max_frames: Option<u64>) -> Result<u64> {
        info!("MatrixApp: starting frame loop");
        loop {
            if max_frames.is_some_and(|max| self.frames >= max) {
                info!("MatrixApp: frame limit reached");
                break;
            }
            let frame_start = Instant::now();
            match self.process_frame() {
                Ok(AppStatus::Running) => {}
                Ok(AppStatus::Shutdown) => {
                    info!("MatrixApp: shutdown requested");
                    break;
                }
                Err(e) => {
                    error!(
                        "Error in frame {}: {:#}. Root cause: {:?}. Stopping.",
                        self.frames,
                        e,
                        e.root_cause()
                    );
                    return Err(e.context(format!("Frame {} failed", self.frames)));
                }
            }
            if let Some(remaining) = self.frame_duration.checked_sub(frame_start.elapsed()) {
                thread::sleep(remaining);
            }
        }
        info!("MatrixApp: {} frames presented", self.frames);
        Ok(self.frames)
    }

    /// Poll input, advance the rain one tick and present the result.
    pub fn process_frame(&mut self) -> Result<AppStatus> {
        let events = self.display.poll_events()?;
        if events.iter().any(|e| e.is_quit()) {
            return Ok(AppStatus::Shutdown);
        }

        self.compositor
            .tick()
            .context("Failed to advance the rain")?;

        let opacity = self.fade.as_ref().map_or(u8::MAX, |f| f.opacity());
        let mut snapshot = self
            .snapshot
            .take()
            .ok_or_else(|| anyhow!("Framebuffer lost by an earlier frame"))?;
        self.compositor
            .surface()
            .write_scaled(&mut snapshot.framebuffer, opacity);

        match self.display.present(snapshot) {
            Ok(snapshot) => self.snapshot = Some(snapshot),
            Err(DisplayError::PresentationFailed(snapshot, reason)) => {
                self.snapshot = Some(snapshot);
                return Err(anyhow!("Presentation failed: {}", reason));
            }
            Err(DisplayError::Driver(e)) => return Err(e.context("Display driver failed")),
        }

        self.frames += 1;
        self.report_fps();
        Ok(AppStatus::Running)
    }

    fn report_fps(&mut self) {
        self.fps_window_frames += 1;
        let now = self.clock.now_ms();
        let elapsed = now.saturating_sub(self.fps_window_start_ms);
        if elapsed >= self.fps_report_interval_ms && elapsed > 0 {
            let fps = self.fps_window_frames as f64 * 1000.0 / elapsed as f64;
            debug!("MatrixApp: {:.1} FPS", fps);
            self.fps_window_start_ms = now;
            self.fps_window_frames = 0;
        }
    }

    /// Write the last presented frame as a binary PPM.
    pub fn dump_frame(&self, path: &Path) -> Result<()> {
        let snapshot = self
            .snapshot
            .as_ref()
            .ok_or_else(|| anyhow!("No frame to dump"))?;
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let mut out = BufWriter::new(file);
        write_ppm(
            &mut out,
            &snapshot.framebuffer,
            snapshot.width_px,
            snapshot.height_px,
        )
        .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("MatrixApp: last frame written to {}", path.display());
        Ok(())
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn compositor(&self) -> &ScrollCompositor {
        &self.compositor
    }

    /// The frame most recently presented.
    pub fn last_frame(&self) -> Option<&RenderSnapshot> {
        self.snapshot.as_ref()
    }
}
