//! X11 display adapters via Xlib, RandR and XInput2.
//!
//! Two connections are opened:
//!
//! - [`X11EventSource`] owns one on a dedicated reader thread.  It subscribes
//!   to XInput2 `RawMotion` on all master devices and to RandR
//!   `RRScreenChangeNotify` on the root window, then blocks in `XNextEvent`
//!   and forwards each relevant event as a [`PumpEvent`].
//! - [`X11Display`] owns the other and serves the pump's synchronous calls:
//!   output enumeration, `XQueryPointer`, `XWarpPointer` and `XFlush`.
//!
//! Each connection is used by one thread at a time, but libXrandr and libXi
//! keep process-wide per-display state shared by both.  `XInitThreads` is
//! therefore called once, before the first connection is opened, so that
//! Xlib's internal locks are real.
//!
//! # Raw motion deltas
//!
//! An `XIRawEvent` carries a bit mask of the valuators (axes) it reports and a
//! *packed* array holding one value per set bit.  Valuator 0 is X and
//! valuator 1 is Y; when only Y moved, its value sits at index 0.

use std::os::raw::{c_char, c_int, c_uint};
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc as std_mpsc, Arc, Mutex, OnceLock};
use std::thread::{self, JoinHandle};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, trace, warn};
use warp_core::OutputInfo;
use x11::{xinput2, xlib, xrandr};

use super::{DisplayError, EventSource, PumpEvent};
use crate::application::route_motion::PointerController;
use crate::application::update_layout::{OutputEnumerator, UpdateLayoutError};

/// Bytes needed for an XI2 event mask covering `XI_RawMotion` (event 17).
const XI_RAW_MOTION_MASK_LEN: usize = (xinput2::XI_RawMotion as usize >> 3) + 1;

/// Xlib's `None` window.
const NO_WINDOW: xlib::Window = 0;

/// Enables Xlib's thread support.  Runs `XInitThreads` at most once per
/// process and returns whether it succeeded.
fn init_xlib_threads() -> bool {
    static INITIALISED: OnceLock<bool> = OnceLock::new();
    // SAFETY: called before any connection is opened.
    *INITIALISED.get_or_init(|| unsafe { xlib::XInitThreads() } != 0)
}

/// An owned Xlib connection.
struct DisplayPtr(NonNull<xlib::Display>);

// SAFETY: the connection is only ever used by one thread at a time: the
// reader thread owns its connection outright and `X11Display` guards its
// connection with a mutex.
unsafe impl Send for DisplayPtr {}

impl DisplayPtr {
    /// Opens the display named by `$DISPLAY`.
    fn open() -> Result<Self, DisplayError> {
        if !init_xlib_threads() {
            warn!("XInitThreads failed; Xlib calls are not thread-safe");
        }
        // SAFETY: a null name selects `$DISPLAY`; the result is checked for null.
        let raw = unsafe { xlib::XOpenDisplay(ptr::null()) };
        NonNull::new(raw).map(Self).ok_or_else(|| {
            let env = std::env::var("DISPLAY").unwrap_or_else(|_| "<unset>".to_string());
            DisplayError::OpenDisplay(env)
        })
    }

    fn as_ptr(&self) -> *mut xlib::Display {
        self.0.as_ptr()
    }

    fn root(&self) -> xlib::Window {
        // SAFETY: the pointer is a live connection.
        unsafe { xlib::XDefaultRootWindow(self.as_ptr()) }
    }
}

impl Drop for DisplayPtr {
    fn drop(&mut self) {
        // SAFETY: opened by XOpenDisplay and not used after this point.
        unsafe { xlib::XCloseDisplay(self.as_ptr()) };
    }
}

// ── Query / warp connection ──────────────────────────────────────────────────

/// X11 implementation of [`OutputEnumerator`] and [`PointerController`].
pub struct X11Display {
    display: Mutex<DisplayPtr>,
    root: xlib::Window,
}

impl X11Display {
    /// Connects to the X display.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError::OpenDisplay`] if `$DISPLAY` is unset or the
    /// server is unreachable.
    pub fn open() -> Result<Self, DisplayError> {
        let display = DisplayPtr::open()?;
        let root = display.root();
        Ok(Self {
            display: Mutex::new(display),
            root,
        })
    }

    fn with_display<R>(&self, f: impl FnOnce(*mut xlib::Display) -> R) -> R {
        let guard = self.display.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(guard.as_ptr())
    }
}

impl OutputEnumerator for X11Display {
    fn enumerate_outputs(&self) -> Result<Vec<OutputInfo>, UpdateLayoutError> {
        // SAFETY: the connection is live and exclusively borrowed for the call.
        self.with_display(|dpy| unsafe { query_outputs(dpy, self.root) })
    }
}

impl PointerController for X11Display {
    fn query_pointer(&self) -> Option<(i32, i32)> {
        self.with_display(|dpy| {
            let mut root_return: xlib::Window = 0;
            let mut child_return: xlib::Window = 0;
            let (mut root_x, mut root_y, mut win_x, mut win_y): (c_int, c_int, c_int, c_int) =
                (0, 0, 0, 0);
            let mut mask: c_uint = 0;
            // SAFETY: all out-pointers reference live locals.
            let same_screen = unsafe {
                xlib::XQueryPointer(
                    dpy,
                    self.root,
                    &mut root_return,
                    &mut child_return,
                    &mut root_x,
                    &mut root_y,
                    &mut win_x,
                    &mut win_y,
                    &mut mask,
                )
            };
            (same_screen != xlib::False).then_some((root_x, root_y))
        })
    }

    fn warp_pointer(&self, x: i32, y: i32) {
        // SAFETY: a `None` source window makes the warp unconditional; the
        // destination is our root window.
        self.with_display(|dpy| unsafe {
            xlib::XWarpPointer(dpy, NO_WINDOW, self.root, 0, 0, 0, 0, x, y);
        });
    }

    fn flush(&self) {
        // SAFETY: the connection is live.
        self.with_display(|dpy| unsafe {
            xlib::XFlush(dpy);
        });
    }
}

/// Lists every RandR output with the geometry of the CRTC driving it.
///
/// # Safety
///
/// `dpy` must be a live connection not used concurrently, and `root` its root
/// window.
unsafe fn query_outputs(
    dpy: *mut xlib::Display,
    root: xlib::Window,
) -> Result<Vec<OutputInfo>, UpdateLayoutError> {
    let res = xrandr::XRRGetScreenResourcesCurrent(dpy, root);
    if res.is_null() {
        return Err(UpdateLayoutError::EnumerationFailed(
            "XRRGetScreenResourcesCurrent returned no resources".to_string(),
        ));
    }

    let count = (*res).noutput.max(0) as usize;
    let outputs = if count == 0 || (*res).outputs.is_null() {
        &[][..]
    } else {
        std::slice::from_raw_parts((*res).outputs, count)
    };

    let mut infos = Vec::with_capacity(count);
    for &output in outputs {
        let info = xrandr::XRRGetOutputInfo(dpy, res, output);
        if info.is_null() {
            warn!(output, "XRRGetOutputInfo returned nothing; skipping output");
            continue;
        }

        let connected = (*info).connection == xrandr::RR_Connected as xrandr::Connection;
        let crtc = (*info).crtc;
        let mut record = OutputInfo {
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            connected,
            has_active_controller: crtc != 0,
        };

        if connected && crtc != 0 {
            let crtc_info = xrandr::XRRGetCrtcInfo(dpy, res, crtc);
            if crtc_info.is_null() {
                record.has_active_controller = false;
            } else {
                record.x = (*crtc_info).x;
                record.y = (*crtc_info).y;
                record.width = i32::try_from((*crtc_info).width).unwrap_or(0);
                record.height = i32::try_from((*crtc_info).height).unwrap_or(0);
                xrandr::XRRFreeCrtcInfo(crtc_info);
            }
        }

        xrandr::XRRFreeOutputInfo(info);
        infos.push(record);
    }

    xrandr::XRRFreeScreenResources(res);
    Ok(infos)
}

// ── Event reader ──────────────────────────────────────────────────────────────

/// X11 implementation of [`EventSource`].
///
/// `stop()` clears the running flag; the reader thread, blocked in
/// `XNextEvent`, exits after the next event arrives or as soon as the receiver
/// is dropped and a send fails.
pub struct X11EventSource {
    running: Arc<AtomicBool>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl X11EventSource {
    /// Creates an event source; no connection is made until `start()`.
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            reader: Mutex::new(None),
        }
    }
}

impl Default for X11EventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for X11EventSource {
    fn start(&self) -> Result<UnboundedReceiver<PumpEvent>, DisplayError> {
        let mut reader = self.reader.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if reader.is_some() {
            return Err(DisplayError::AlreadyStarted);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = std_mpsc::channel();
        self.running.store(true, Ordering::Relaxed);
        let running = Arc::clone(&self.running);

        let handle = thread::Builder::new()
            .name("x11-events".to_string())
            .spawn(move || match EventSession::open() {
                Ok(session) => {
                    let _ = ready_tx.send(Ok(()));
                    session.run(&tx, &running);
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            })
            .map_err(|_| DisplayError::ReaderExited)?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                *reader = Some(handle);
                Ok(rx)
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                self.running.store(false, Ordering::Relaxed);
                Err(e)
            }
            Err(_) => {
                self.running.store(false, Ordering::Relaxed);
                Err(DisplayError::ReaderExited)
            }
        }
    }

    fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
        // The thread may be parked in XNextEvent; detach rather than join.
        let mut reader = self.reader.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        reader.take();
    }
}

/// The reader thread's connection and extension bookkeeping.
struct EventSession {
    display: DisplayPtr,
    xi_opcode: c_int,
    rr_event_base: c_int,
}

impl EventSession {
    /// Opens a connection, checks for XInput2 and RandR, and selects events.
    fn open() -> Result<Self, DisplayError> {
        let display = DisplayPtr::open()?;
        let dpy = display.as_ptr();
        let root = display.root();

        let mut xi_opcode: c_int = 0;
        let (mut first_event, mut first_error): (c_int, c_int) = (0, 0);
        // SAFETY: the name is NUL-terminated and all out-pointers are live locals.
        let has_xi = unsafe {
            xlib::XQueryExtension(
                dpy,
                b"XInputExtension\0".as_ptr() as *const c_char,
                &mut xi_opcode,
                &mut first_event,
                &mut first_error,
            )
        };
        if has_xi == xlib::False {
            return Err(DisplayError::MissingExtension("XInputExtension"));
        }

        let (mut major, mut minor): (c_int, c_int) = (2, 0);
        // SAFETY: out-pointers are live locals.
        if unsafe { xinput2::XIQueryVersion(dpy, &mut major, &mut minor) } != 0 {
            return Err(DisplayError::MissingExtension("XInput 2.0"));
        }

        let (mut rr_event_base, mut rr_error_base): (c_int, c_int) = (0, 0);
        // SAFETY: out-pointers are live locals.
        if unsafe { xrandr::XRRQueryExtension(dpy, &mut rr_event_base, &mut rr_error_base) }
            == xlib::False
        {
            return Err(DisplayError::MissingExtension("RandR"));
        }

        let mut mask_bits = [0u8; XI_RAW_MOTION_MASK_LEN];
        set_mask_bit(&mut mask_bits, xinput2::XI_RawMotion as usize);
        let mut mask = xinput2::XIEventMask {
            deviceid: xinput2::XIAllMasterDevices,
            mask_len: mask_bits.len() as c_int,
            mask: mask_bits.as_mut_ptr(),
        };
        // SAFETY: `mask` points at `mask_bits`, which outlives the call.
        if unsafe { xinput2::XISelectEvents(dpy, root, &mut mask, 1) } != 0 {
            return Err(DisplayError::SelectEvents("XInput2 raw motion"));
        }

        // SAFETY: plain request on a live connection.
        unsafe {
            xrandr::XRRSelectInput(dpy, root, xrandr::RRScreenChangeNotifyMask);
            xlib::XFlush(dpy);
        }

        info!(xi_opcode, rr_event_base, "subscribed to raw motion and screen changes");
        Ok(Self {
            display,
            xi_opcode,
            rr_event_base,
        })
    }

    /// Blocks reading events until stopped or the receiver goes away.
    fn run(self, tx: &UnboundedSender<PumpEvent>, running: &AtomicBool) {
        // SAFETY: XEvent is a plain C union; all-zero is a valid bit pattern.
        let mut event: xlib::XEvent = unsafe { std::mem::zeroed() };

        while running.load(Ordering::Relaxed) {
            // SAFETY: the connection is owned by this thread.
            unsafe { xlib::XNextEvent(self.display.as_ptr(), &mut event) };

            if let Some(pump_event) = self.translate(&mut event) {
                if tx.send(pump_event).is_err() {
                    debug!("event receiver dropped; stopping reader");
                    break;
                }
            }
        }
        debug!("x11 event reader exiting");
    }

    /// Converts an X event into a [`PumpEvent`], or `None` if irrelevant.
    fn translate(&self, event: &mut xlib::XEvent) -> Option<PumpEvent> {
        let dpy = self.display.as_ptr();
        let event_type = event.get_type();

        if event_type == self.rr_event_base + xrandr::RRScreenChangeNotify {
            // SAFETY: the event is a RandR screen-change notification.
            unsafe { xrandr::XRRUpdateConfiguration(event) };
            return Some(PumpEvent::TopologyChanged);
        }

        if event_type != xlib::GenericEvent {
            return None;
        }

        // SAFETY: GenericEvent events are cookies.
        let cookie = unsafe { &mut event.generic_event_cookie };
        if cookie.extension != self.xi_opcode {
            return None;
        }
        // SAFETY: the cookie came from XNextEvent on this connection.
        if unsafe { xlib::XGetEventData(dpy, cookie) } == xlib::False {
            return None;
        }

        let translated = if cookie.evtype == xinput2::XI_RawMotion && !cookie.data.is_null() {
            // SAFETY: XI_RawMotion cookie data is an XIRawEvent, valid until freed.
            let (dx, dy) = unsafe { raw_deltas(&*(cookie.data as *const xinput2::XIRawEvent)) };
            trace!(dx, dy, "raw motion");
            (dx != 0.0 || dy != 0.0).then_some(PumpEvent::RawMotion { dx, dy })
        } else {
            None
        };

        // SAFETY: paired with the successful XGetEventData above.
        unsafe { xlib::XFreeEventData(dpy, cookie) };
        translated
    }
}

/// Extracts the X and Y deltas from a raw event.
///
/// # Safety
///
/// `raw` must come from a live `XGetEventData` cookie.
unsafe fn raw_deltas(raw: &xinput2::XIRawEvent) -> (f64, f64) {
    let mask_len = raw.valuators.mask_len.max(0) as usize;
    if raw.valuators.mask.is_null() || raw.raw_values.is_null() || mask_len == 0 {
        return (0.0, 0.0);
    }
    let mask = std::slice::from_raw_parts(raw.valuators.mask, mask_len);
    let set = (0..mask_len * 8).filter(|&bit| mask_bit_is_set(mask, bit)).count();
    let values = std::slice::from_raw_parts(raw.raw_values, set);
    valuator_deltas(mask, values)
}

/// Picks valuators 0 (X) and 1 (Y) out of a packed value array.
///
/// Axes that are absent from `mask` contribute 0.
fn valuator_deltas(mask: &[u8], packed: &[f64]) -> (f64, f64) {
    let mut next = 0;
    let mut deltas = [0.0f64; 2];
    for (axis, delta) in deltas.iter_mut().enumerate() {
        if mask_bit_is_set(mask, axis) {
            *delta = packed.get(next).copied().unwrap_or(0.0);
            next += 1;
        }
    }
    (deltas[0], deltas[1])
}

fn mask_bit_is_set(mask: &[u8], bit: usize) -> bool {
    mask.get(bit >> 3).is_some_and(|byte| byte & (1 << (bit & 7)) != 0)
}

fn set_mask_bit(mask: &mut [u8], bit: usize) {
    if let Some(byte) = mask.get_mut(bit >> 3) {
        *byte |= 1 << (bit & 7);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
