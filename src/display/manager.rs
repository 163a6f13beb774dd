// src/display/manager.rs
//! DisplayManager - Synchronous wrapper around DisplayDriver.

use crate::display::driver::DisplayDriver;
use crate::display::messages::{
    DisplayError, DisplayEvent, DriverConfig, DriverRequest, DriverResponse, RenderSnapshot,
};
use anyhow::{anyhow, Context, Result};
use log::info;

/// Display metrics discovered during initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayMetrics {
    pub width_px: u32,
    pub height_px: u32,
}

/// Owns the driver and the window size it reported.
pub struct DisplayManager {
    driver: Box<dyn DisplayDriver>,
    metrics: DisplayMetrics,
}

impl DisplayManager {
    /// Runs the `Init` handshake on `driver`.
    pub fn new(mut driver: Box<dyn DisplayDriver>, config: DriverConfig) -> Result<Self> {
        info!("DisplayManager: Initializing driver...");
        let response = driver
            .handle_request(DriverRequest::Init(config))
            .map_err(|e| anyhow!(e))
            .context("Failed to initialize display driver")?;

        let metrics = match response {
            DriverResponse::InitComplete {
                width_px,
                height_px,
            } => {
                info!("DisplayManager: Initialized - {}x{} px", width_px, height_px);
                DisplayMetrics {
                    width_px,
                    height_px,
                }
            }
            other => {
                return Err(anyhow!("Expected InitComplete response, got {:?}", other));
            }
        };

        Ok(Self { driver, metrics })
    }

    /// Present a frame; the snapshot comes back either way.
    pub fn present(&mut self, snapshot: RenderSnapshot) -> Result<RenderSnapshot, DisplayError> {
        match self.driver.handle_request(DriverRequest::Present(snapshot))? {
            DriverResponse::PresentComplete(snapshot) => Ok(snapshot),
            other => Err(DisplayError::Driver(anyhow!(
                "Expected PresentComplete response, got {:?}",
                other
            ))),
        }
    }

    pub fn poll_events(&mut self) -> Result<Vec<DisplayEvent>> {
        match self
            .driver
            .handle_request(DriverRequest::PollEvents)
            .map_err(|e| anyhow!(e))?
        {
            DriverResponse::Events(events) => Ok(events),
            other => Err(anyhow!("Expected Events response, got {:?}", other)),
        }
    }

    pub fn set_title(&mut self, title: &str) -> Result<()> {
        match self
            .driver
            .handle_request(DriverRequest::SetTitle(title.to_string()))
            .map_err(|e| anyhow!(e))?
        {
            DriverResponse::TitleSet => Ok(()),
            other => Err(anyhow!("Expected TitleSet response, got {:?}", other)),
        }
    }

    pub fn metrics(&self) -> DisplayMetrics {
        self.metrics
    }

    /// A snapshot sized for the window.
    pub fn new_snapshot(&self) -> RenderSnapshot {
        RenderSnapshot::new(self.metrics.width_px, self.metrics.height_px)
    }
}
