//! In-memory display adapters for tests.
//!
//! - [`MockEventSource`] lets a test inject [`PumpEvent`]s as if the display
//!   server had delivered them.
//! - [`MockOutputEnumerator`] returns a configurable output list, which a test
//!   can swap out to simulate a hotplug, or make fail.
//! - [`RecordingPointer`] reports a settable pointer position and records every
//!   warp and flush.

use std::sync::Mutex;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use warp_core::OutputInfo;

use super::{DisplayError, EventSource, PumpEvent};
use crate::application::route_motion::PointerController;
use crate::application::update_layout::{OutputEnumerator, UpdateLayoutError};

/// A mock implementation of [`EventSource`] that allows tests to inject events.
#[derive(Default)]
pub struct MockEventSource {
    sender: Mutex<Option<UnboundedSender<PumpEvent>>>,
}

impl MockEventSource {
    /// Creates a new mock event source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Injects a synthetic event.
    ///
    /// Panics if `start()` has not been called or `stop()` has been called.
    pub fn inject(&self, event: PumpEvent) {
        let guard = self.sender.lock().expect("lock poisoned");
        match guard.as_ref() {
            Some(sender) => sender
                .send(event)
                .expect("receiver has been dropped; keep it alive while injecting"),
            None => panic!("MockEventSource::inject called before start()"),
        }
    }
}

impl EventSource for MockEventSource {
    fn start(&self) -> Result<UnboundedReceiver<PumpEvent>, DisplayError> {
        let mut guard = self.sender.lock().expect("lock poisoned");
        if guard.is_some() {
            return Err(DisplayError::AlreadyStarted);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        *guard = Some(tx);
        Ok(rx)
    }

    fn stop(&self) {
        // Dropping the sender closes the channel.
        *self.sender.lock().expect("lock poisoned") = None;
    }
}

/// A mock [`OutputEnumerator`] returning a replaceable output list.
#[derive(Default)]
pub struct MockOutputEnumerator {
    outputs: Mutex<Vec<OutputInfo>>,
    failure: Mutex<Option<String>>,
    calls: Mutex<u32>,
}

impl MockOutputEnumerator {
    /// Creates an enumerator reporting the given active rectangles `(x, y, w, h)`.
    pub fn with_rects(rects: &[(i32, i32, i32, i32)]) -> Self {
        let enumerator = Self::default();
        enumerator.set_rects(rects);
        enumerator
    }

    /// Replaces the reported outputs with connected, active rectangles.
    pub fn set_rects(&self, rects: &[(i32, i32, i32, i32)]) {
        let outputs = rects
            .iter()
            .map(|&(x, y, width, height)| OutputInfo {
                x,
                y,
                width,
                height,
                connected: true,
                has_active_controller: true,
            })
            .collect();
        self.set_outputs(outputs);
    }

    /// Replaces the reported outputs verbatim.
    pub fn set_outputs(&self, outputs: Vec<OutputInfo>) {
        *self.outputs.lock().expect("lock poisoned") = outputs;
    }

    /// Makes every following query fail with `reason` (or succeed again with `None`).
    pub fn set_failure(&self, reason: Option<&str>) {
        *self.failure.lock().expect("lock poisoned") = reason.map(str::to_string);
    }

    /// Returns how many times the outputs were queried.
    pub fn calls(&self) -> u32 {
        *self.calls.lock().expect("lock poisoned")
    }
}

impl OutputEnumerator for MockOutputEnumerator {
    fn enumerate_outputs(&self) -> Result<Vec<OutputInfo>, UpdateLayoutError> {
        *self.calls.lock().expect("lock poisoned") += 1;
        if let Some(reason) = self.failure.lock().expect("lock poisoned").clone() {
            return Err(UpdateLayoutError::EnumerationFailed(reason));
        }
        Ok(self.outputs.lock().expect("lock poisoned").clone())
    }
}

/// A [`PointerController`] that records calls instead of moving the pointer.
///
/// A warp also moves the reported position, like the real pointer would.
#[derive(Default)]
pub struct RecordingPointer {
    position: Mutex<Option<(i32, i32)>>,
    /// Every `(x, y)` passed to `warp_pointer`, in order.
    pub warps: Mutex<Vec<(i32, i32)>>,
    /// Number of `flush` calls.
    pub flushes: Mutex<u32>,
    /// Number of `query_pointer` calls.
    pub queries: Mutex<u32>,
}

impl RecordingPointer {
    /// Creates a pointer reporting `(x, y)`.
    pub fn at(x: i32, y: i32) -> Self {
        let pointer = Self::default();
        pointer.move_to(x, y);
        pointer
    }

    /// Sets the position reported by `query_pointer`.
    pub fn move_to(&self, x: i32, y: i32) {
        *self.position.lock().expect("lock poisoned") = Some((x, y));
    }

    /// Makes `query_pointer` fail (the pointer is on another screen).
    pub fn lose(&self) {
        *self.position.lock().expect("lock poisoned") = None;
    }

    /// Returns the recorded warps.
    pub fn warps(&self) -> Vec<(i32, i32)> {
        self.warps.lock().expect("lock poisoned").clone()
    }
}

impl PointerController for RecordingPointer {
    fn query_pointer(&self) -> Option<(i32, i32)> {
        *self.queries.lock().expect("lock poisoned") += 1;
        *self.position.lock().expect("lock poisoned")
    }

    fn warp_pointer(&self, x: i32, y: i32) {
        self.warps.lock().expect("lock poisoned").push((x, y));
        self.move_to(x, y);
    }

    fn flush(&self) {
        *self.flushes.lock().expect("lock poisoned") += 1;
    }
}
