// src/display/driver.rs
//! DisplayDriver trait - minimal interface for platform-specific display primitives.
//!
//! ## Lifecycle
//! 1. `new()` - Pure initialization (connect, no window yet)
//! 2. `handle_request(Init)` - Create window, report its size
//! 3. Request/response loop - All operations via messages
//! 4. `Drop` - Cleanup (no explicit shutdown message)

use crate::display::messages::{DisplayError, DriverRequest, DriverResponse};
use anyhow::Result;

/// Minimal platform-specific display driver interface.
pub trait DisplayDriver {
    /// Pure initialization only. Window creation happens in
    /// `handle_request(Init)`.
    fn new() -> Result<Self>
    where
        Self: Sized;

    /// Handle a request from DisplayManager, returning a response.
    ///
    /// ## Request/Response Pairs
    /// - `Init(config)` → `InitComplete`
    /// - `PollEvents` → `Events`
    /// - `Present(snapshot)` → `PresentComplete(snapshot)`
    /// - `SetTitle(s)` → `TitleSet`
    ///
    /// Returns `DisplayError` instead of `anyhow::Result` so a failed
    /// `Present` can return the framebuffer through
    /// `DisplayError::PresentationFailed`.
    fn handle_request(&mut self, request: DriverRequest) -> Result<DriverResponse, DisplayError>;
}
