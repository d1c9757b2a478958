//! warp-daemon library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does the daemon do?
//!
//! 1. Enumerates the active outputs and publishes them as the current layout.
//! 2. Subscribes to raw pointer motion and to output topology changes.
//! 3. For every motion event, queries the absolute pointer position, asks the
//!    edge-transition engine whether the pointer is crossing a seam, and warps
//!    it to the mapped position on the neighbouring output when it is.
//! 4. Rebuilds the layout whenever the topology changes.

/// Application layer: the event pump and layout refresh.
pub mod application;

/// Infrastructure layer: display-server adapters and configuration.
pub mod infrastructure;
