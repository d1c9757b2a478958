//! Display-server infrastructure.
//!
//! The daemon needs three things from the display server:
//!
//! - a stream of events: raw pointer motion and "outputs changed"
//!   notifications ([`EventSource`]),
//! - a way to list the outputs
//!   ([`OutputEnumerator`](crate::application::update_layout::OutputEnumerator)),
//! - a way to read and move the pointer
//!   ([`PointerController`](crate::application::route_motion::PointerController)).
//!
//! # X11 implementation
//!
//! On Linux the [`linux`] module uses RandR for output enumeration and change
//! notifications, XInput2 `RawMotion` for unaccelerated deltas, and core
//! `XQueryPointer` / `XWarpPointer` for the pointer.  The event reader blocks
//! in `XNextEvent` on a dedicated thread with its own connection; everything
//! else uses a second connection owned by the event pump.
//!
//! # Testability
//!
//! [`mock`] provides in-memory doubles for all three seams so the pump can be
//! driven in tests without an X server.

use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;

pub mod mock;

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "linux")]
pub use linux::{X11Display, X11EventSource};

/// An event delivered by the display server, in delivery order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PumpEvent {
    /// The output configuration changed; the layout must be rebuilt.
    TopologyChanged,
    /// The pointer device moved by a raw (unaccelerated) delta.
    RawMotion {
        /// Horizontal delta in device units.
        dx: f64,
        /// Vertical delta in device units.
        dy: f64,
    },
}

/// Error type for display-server adapters.
#[derive(Debug, Error)]
pub enum DisplayError {
    /// The X display could not be opened.
    #[error("cannot open X display (DISPLAY={0})")]
    OpenDisplay(String),

    /// A required protocol extension is missing from the server.
    #[error("{0} not available")]
    MissingExtension(&'static str),

    /// The event subscription request was rejected.
    #[error("failed to select {0} events")]
    SelectEvents(&'static str),

    /// `start()` was called on a source that is already running.
    #[error("event source already started")]
    AlreadyStarted,

    /// The reader thread exited before it finished setting up.
    #[error("event reader thread exited during startup")]
    ReaderExited,

    /// The current platform has no display adapter.
    #[error("platform not supported: {0}")]
    UnsupportedPlatform(String),
}

/// Trait abstracting the display-server event stream.
///
/// The production implementation reads X11 events on a background thread;
/// tests use [`mock::MockEventSource`].
pub trait EventSource: Send {
    /// Subscribes to raw motion and topology-change events and returns a
    /// receiver that yields them in delivery order.
    ///
    /// # Errors
    ///
    /// Returns a [`DisplayError`] if the subscriptions cannot be established.
    /// This is the daemon's only fatal error.
    fn start(&self) -> Result<UnboundedReceiver<PumpEvent>, DisplayError>;

    /// Stops delivering events and releases the subscription.
    fn stop(&self);
}
