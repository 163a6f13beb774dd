// src/display/messages.rs
//! Message types for communication between DisplayManager and DisplayDriver.
//!
//! All communication happens via ownership transfer. A presented framebuffer
//! travels to the driver inside `Present` and comes back in
//! `PresentComplete`, or inside `DisplayError::PresentationFailed` when the
//! driver could not show it.

use std::fmt;
use thiserror::Error;

/// Window parameters handed to the driver with `Init`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    pub width_px: u32,
    pub height_px: u32,
    pub title: String,
}

/// Tightly packed RGBA8 frame, row-major, `width_px * 4` bytes per row.
pub struct RenderSnapshot {
    pub framebuffer: Box<[u8]>,
    pub width_px: u32,
    pub height_px: u32,
}

impl RenderSnapshot {
    pub fn new(width_px: u32, height_px: u32) -> Self {
        let len = width_px as usize * height_px as usize * 4;
        Self {
            framebuffer: vec![0u8; len].into_boxed_slice(),
            width_px,
            height_px,
        }
    }

    /// True when the buffer length matches the stated dimensions.
    pub fn is_consistent(&self) -> bool {
        self.framebuffer.len() == self.width_px as usize * self.height_px as usize * 4
    }
}

impl fmt::Debug for RenderSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderSnapshot")
            .field("width_px", &self.width_px)
            .field("height_px", &self.height_px)
            .field("bytes", &self.framebuffer.len())
            .finish()
    }
}

/// Requests sent from DisplayManager to DisplayDriver.
#[derive(Debug)]
pub enum DriverRequest {
    /// Create the window. Driver responds with InitComplete.
    Init(DriverConfig),

    /// Request pending native events. Driver responds with Events.
    PollEvents,

    /// Display the frame. Driver responds with PresentComplete, returning
    /// the snapshot for reuse.
    Present(RenderSnapshot),

    /// Set the window title.
    SetTitle(String),
}

/// Responses sent from DisplayDriver to DisplayManager.
#[derive(Debug)]
pub enum DriverResponse {
    InitComplete { width_px: u32, height_px: u32 },
    Events(Vec<DisplayEvent>),
    PresentComplete(RenderSnapshot),
    TitleSet,
}

/// The only keys the frame loop distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySymbol {
    Escape,
    Char(char),
    Other,
}

/// Platform-agnostic display events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayEvent {
    Key { symbol: KeySymbol },
    /// User requested window close.
    CloseRequested,
}

impl DisplayEvent {
    /// Events that end the frame loop.
    pub fn is_quit(&self) -> bool {
        matches!(
            self,
            DisplayEvent::CloseRequested
                | DisplayEvent::Key {
                    symbol: KeySymbol::Escape
                }
        )
    }
}

/// Driver failure. `PresentationFailed` hands the snapshot back so the
/// caller keeps its only framebuffer.
#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("presentation failed: {1}")]
    PresentationFailed(RenderSnapshot, String),

    #[error(transparent)]
    Driver(#[from] anyhow::Error),
}
