//! X11 DisplayDriver using Xlib.
//!
//! One fixed-size window; frames are presented with `XPutImage` from a
//! BGRX staging buffer. Only Escape and window close are reported as
//! distinct events.

use crate::display::driver::DisplayDriver;
use crate::display::messages::{
    DisplayError, DisplayEvent, DriverConfig, DriverRequest, DriverResponse, KeySymbol,
    RenderSnapshot,
};
use anyhow::{anyhow, Context, Result};
use log::{debug, info, trace};
use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;
use x11::keysym::XK_Escape;
use x11::xlib::*;

pub struct X11DisplayDriver {
    display: *mut Display,
    screen: i32,
    window: Window,
    gc: GC,
    wm_delete_window: Atom,
    width_px: u32,
    height_px: u32,
    staging: Vec<u8>,
}

impl DisplayDriver for X11DisplayDriver {
    fn new() -> Result<Self> {
        info!("X11DisplayDriver::new() - Connecting to X server");
        unsafe {
            let display = XOpenDisplay(ptr::null());
            if display.is_null() {
                return Err(anyhow!("Failed to open X11 display. Is DISPLAY set?"));
            }
            Ok(Self {
                display,
                screen: XDefaultScreen(display),
                window: 0,
                gc: ptr::null_mut(),
                wm_delete_window: 0,
                width_px: 0,
                height_px: 0,
                staging: Vec::new(),
            })
        }
    }

    fn handle_request(&mut self, request: DriverRequest) -> Result<DriverResponse, DisplayError> {
        match request {
            DriverRequest::Init(config) => Ok(self.handle_init(config)?),
            DriverRequest::PollEvents => Ok(self.handle_poll_events()),
            DriverRequest::Present(snapshot) => self.handle_present(snapshot),
            DriverRequest::SetTitle(title) => Ok(self.handle_set_title(&title)?),
        }
    }
}

impl X11DisplayDriver {
    fn handle_init(&mut self, config: DriverConfig) -> Result<DriverResponse> {
        if self.window != 0 {
            return Err(anyhow!("X11DisplayDriver: already initialized"));
        }
        unsafe {
            let root = XRootWindow(self.display, self.screen);
            let window = XCreateSimpleWindow(
                self.display,
                root,
                0,
                0,
                config.width_px,
                config.height_px,
                0,
                XBlackPixel(self.display, self.screen),
                XBlackPixel(self.display, self.screen),
            );
            if window == 0 {
                return Err(anyhow!("Failed to create X11 window"));
            }
            self.window = window;

            XSelectInput(
                self.display,
                window,
                ExposureMask | KeyPressMask | StructureNotifyMask,
            );
            self.gc = XCreateGC(self.display, window, 0, ptr::null_mut());

            let name = CString::new("WM_DELETE_WINDOW")?;
            self.wm_delete_window = XInternAtom(self.display, name.as_ptr(), False);
            let mut protocols = [self.wm_delete_window];
            XSetWMProtocols(self.display, window, protocols.as_mut_ptr(), 1);

            self.width_px = config.width_px;
            self.height_px = config.height_px;
            self.set_title(&config.title)?;

            XMapWindow(self.display, window);
            XFlush(self.display);
        }

        self.staging = vec![0u8; self.width_px as usize * self.height_px as usize * 4];
        info!(
            "X11DisplayDriver: Initialized {}x{} px",
            self.width_px, self.height_px
        );
        Ok(DriverResponse::InitComplete {
            width_px: self.width_px,
            height_px: self.height_px,
        })
    }

    fn handle_poll_events(&mut self) -> DriverResponse {
        let mut events = Vec::new();
        unsafe {
            while XPending(self.display) > 0 {
                let mut event: XEvent = std::mem::zeroed();
                XNextEvent(self.display, &mut event);
                if let Some(display_event) = self.convert_event(&mut event) {
                    events.push(display_event);
                }
            }
        }
        DriverResponse::Events(events)
    }

    unsafe fn convert_event(&self, event: &mut XEvent) -> Option<DisplayEvent> {
        match event.get_type() {
            KeyPress => {
                let keysym = XLookupKeysym(&mut event.key, 0);
                let symbol = map_keysym(keysym);
                trace!("X11DisplayDriver: key {:#x} -> {:?}", keysym, symbol);
                Some(DisplayEvent::Key { symbol })
            }
            ClientMessage => {
                let atom = event.client_message.data.get_long(0) as Atom;
                if atom == self.wm_delete_window {
                    debug!("X11DisplayDriver: WM_DELETE_WINDOW");
                    Some(DisplayEvent::CloseRequested)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    fn handle_present(
        &mut self,
        snapshot: RenderSnapshot,
    ) -> std::result::Result<DriverResponse, DisplayError> {
        if self.window == 0 {
            return Err(DisplayError::PresentationFailed(
                snapshot,
                "driver not initialized".to_string(),
            ));
        }
        if !snapshot.is_consistent()
            || snapshot.width_px != self.width_px
            || snapshot.height_px != self.height_px
        {
            let reason = format!(
                "frame {}x{} does not fit {}x{} window",
                snapshot.width_px, snapshot.height_px, self.width_px, self.height_px
            );
            return Err(DisplayError::PresentationFailed(snapshot, reason));
        }

        rgba_to_bgrx(&snapshot.framebuffer, &mut self.staging);

        unsafe {
            let visual = XDefaultVisual(self.display, self.screen);
            let depth = XDefaultDepth(self.display, self.screen) as u32;
            let image = XCreateImage(
                self.display,
                visual,
                depth,
                ZPixmap,
                0,
                self.staging.as_mut_ptr() as *mut c_char,
                self.width_px,
                self.height_px,
                32,
                0,
            );
            if image.is_null() {
                return Err(DisplayError::PresentationFailed(
                    snapshot,
                    "Failed to create XImage".to_string(),
                ));
            }

            XPutImage(
                self.display,
                self.window,
                self.gc,
                image,
                0,
                0,
                0,
                0,
                self.width_px,
                self.height_px,
            );

            // The staging buffer is ours; keep XDestroyImage from freeing it.
            (*image).data = ptr::null_mut();
            XDestroyImage(image);
            XFlush(self.display);
        }

        Ok(DriverResponse::PresentComplete(snapshot))
    }

    fn handle_set_title(&mut self, title: &str) -> Result<DriverResponse> {
        self.set_title(title)?;
        Ok(DriverResponse::TitleSet)
    }

    fn set_title(&mut self, title: &str) -> Result<()> {
        let c_title = CString::new(title).context("Window title contains NUL")?;
        unsafe {
            XStoreName(self.display, self.window, c_title.as_ptr());
            XFlush(self.display);
        }
        Ok(())
    }
}

fn map_keysym(keysym: KeySym) -> KeySymbol {
    if keysym == KeySym::from(XK_Escape) {
        KeySymbol::Escape
    } else if (0x20..0x7f).contains(&keysym) {
        KeySymbol::Char(keysym as u8 as char)
    } else {
        KeySymbol::Other
    }
}

/// ZPixmap on little-endian TrueColor servers stores B, G, R, pad.
fn rgba_to_bgrx(src: &[u8], dest: &mut [u8]) {
    for (d, s) in dest.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        d[0] = s[2];
        d[1] = s[1];
        d[2] = s[0];
        d[3] = 0;
    }
}

impl Drop for X11DisplayDriver {
    fn drop(&mut self) {
        info!("X11DisplayDriver::drop() - Cleaning up");
        unsafe {
            if !self.gc.is_null() {
                XFreeGC(self.display, self.gc);
            }
            if self.window != 0 {
                XDestroyWindow(self.display, self.window);
            }
            if !self.display.is_null() {
                XCloseDisplay(self.display);
            }
        }
    }
}
