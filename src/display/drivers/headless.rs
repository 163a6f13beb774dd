//! Headless display driver: accepts frames without showing them.

use crate::display::driver::DisplayDriver;
use crate::display::messages::{
    DisplayError, DisplayEvent, DriverConfig, DriverRequest, DriverResponse, RenderSnapshot,
};
use anyhow::Result;
use log::{info, trace};
use std::collections::VecDeque;

#[derive(Default)]
pub struct HeadlessDisplayDriver {
    config: Option<DriverConfig>,
    pending: VecDeque<DisplayEvent>,
    frames_presented: u64,
}

impl HeadlessDisplayDriver {
    /// Queue an event to be returned by the next `PollEvents`.
    pub fn push_event(&mut self, event: DisplayEvent) {
        self.pending.push_back(event);
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    fn present(&mut self, snapshot: RenderSnapshot) -> Result<DriverResponse, DisplayError> {
        let Some(config) = &self.config else {
            return Err(DisplayError::PresentationFailed(
                snapshot,
                "driver not initialized".to_string(),
            ));
        };
        if !snapshot.is_consistent()
            || snapshot.width_px != config.width_px
            || snapshot.height_px != config.height_px
        {
            let reason = format!(
                "frame {}x{} ({} bytes) does not fit {}x{} window",
                snapshot.width_px,
                snapshot.height_px,
                snapshot.framebuffer.len(),
                config.width_px,
                config.height_px
            );
            return Err(DisplayError::PresentationFailed(snapshot, reason));
        }
        self.frames_presented += 1;
        trace!("HeadlessDisplayDriver: Present #{}", self.frames_presented);
        Ok(DriverResponse::PresentComplete(snapshot))
    }
}

impl DisplayDriver for HeadlessDisplayDriver {
    fn new() -> Result<Self> {
        info!("HeadlessDisplayDriver::new()");
        Ok(Self::default())
    }

    fn handle_request(&mut self, request: DriverRequest) -> Result<DriverResponse, DisplayError> {
        match request {
            DriverRequest::Init(config) => {
                info!(
                    "HeadlessDisplayDriver: Init {}x{} '{}'",
                    config.width_px, config.height_px, config.title
                );
                let response = DriverResponse::InitComplete {
                    width_px: config.width_px,
                    height_px: config.height_px,
                };
                self.config = Some(config);
                Ok(response)
            }
            DriverRequest::PollEvents => Ok(DriverResponse::Events(self.pending.drain(..).collect())),
            DriverRequest::Present(snapshot) => self.present(snapshot),
            DriverRequest::SetTitle(title) => {
                info!("HeadlessDisplayDriver: SetTitle '{}'", title);
                Ok(DriverResponse::TitleSet)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn init(driver: &mut HeadlessDisplayDriver, w: u32, h: u32) {
        let response = driver
            .handle_request(DriverRequest::Init(DriverConfig {
                width_px: w,
                height_px: h,
                title: "t".into(),
            }))
            .unwrap();
        assert!(matches!(
            response,
            DriverResponse::InitComplete { width_px, height_px } if width_px == w && height_px == h
        ));
    }

    #[test]
    fn test_present_returns_snapshot() {
        let mut d = HeadlessDisplayDriver::new().unwrap();
        init(&mut d, 4, 3);
        let response = d
            .handle_request(DriverRequest::Present(RenderSnapshot::new(4, 3)))
            .unwrap();
        match response {
            DriverResponse::PresentComplete(s) => assert_eq!(s.framebuffer.len(), 48),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(d.frames_presented(), 1);
    }

    #[test]
    fn test_wrong_size_frame_is_handed_back() {
        // Contract: a failed present never loses the framebuffer
        let mut d = HeadlessDisplayDriver::new().unwrap();
        init(&mut d, 4, 3);
        let err = d
            .handle_request(DriverRequest::Present(RenderSnapshot::new(2, 2)))
            .unwrap_err();
        match err {
            DisplayError::PresentationFailed(s, _) => assert_eq!(s.framebuffer.len(), 16),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(d.frames_presented(), 0);
    }

    #[test]
    fn test_present_before_init_fails() {
        let mut d = HeadlessDisplayDriver::new().unwrap();
        assert!(matches!(
            d.handle_request(DriverRequest::Present(RenderSnapshot::new(1, 1))),
            Err(DisplayError::PresentationFailed(..))
        ));
    }

    #[test]
    fn test_queued_events_drain_once() {
        let mut d = HeadlessDisplayDriver::new().unwrap();
        d.push_event(DisplayEvent::CloseRequested);
        match d.handle_request(DriverRequest::PollEvents).unwrap() {
            DriverResponse::Events(events) => assert_eq!(events, vec![DisplayEvent::CloseRequested]),
            other => panic!("unexpected {:?}", other),
        }
        match d.handle_request(DriverRequest::PollEvents).unwrap() {
            DriverResponse::Events(events) => assert!(events.is_empty()),
            other => panic!("unexpected {:?}", other),
        }
    }
}
