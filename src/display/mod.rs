// src/display/mod.rs
//! Message-based display system.
//!
//! - DisplayDriver: platform-specific primitives (headless, X11)
//! - DisplayManager: init handshake, presentation and event polling
//! - Messages: request/response protocol between the two

pub mod driver;
pub mod drivers;
pub mod manager;
pub mod messages;

pub use driver::DisplayDriver;
pub use manager::{DisplayManager, DisplayMetrics};
pub use messages::{
    DisplayError, DisplayEvent, DriverConfig, DriverRequest, DriverResponse, KeySymbol,
    RenderSnapshot,
};
