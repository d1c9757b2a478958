//! Infrastructure layer for the daemon.
//!
//! Contains the OS-facing adapters and the configuration file reader.
//!
//! # Sub-modules
//!
//! - **`display`** – Display-server adapters: the event source that delivers
//!   raw motion and topology-change events, the output enumerator, and the
//!   pointer controller.  The X11 implementation is compiled on Linux only;
//!   in-memory doubles are always compiled for tests.
//!
//! - **`storage`** – Read-only TOML configuration.

pub mod display;
pub mod storage;
