//! Application layer use cases for the daemon.
//!
//! Use cases orchestrate the domain types from `warp-core` and talk to the
//! outside world only through the traits declared here, so every decision path
//! can be exercised in unit tests with recording doubles.
//!
//! # Sub-modules
//!
//! - **`update_layout`** – Queries the outputs through an [`OutputEnumerator`]
//!   and publishes the resulting layout to the monitor registry.
//!
//! - **`route_motion`** – The event pump: dispatches topology changes and raw
//!   motion events, in delivery order, to the registry and the edge-transition
//!   engine, and performs the warp through a [`PointerController`].
//!
//! [`OutputEnumerator`]: update_layout::OutputEnumerator
//! [`PointerController`]: route_motion::PointerController

pub mod route_motion;
pub mod update_layout;
