//! Domain entities for EdgeWarp.
//!
//! Everything in here is pure computation over integer rectangles and
//! floating-point motion deltas.  Nothing touches the display server, so the
//! whole module compiles and tests on any platform without a running X session.
//!
//! Outer layers (the daemon's application and infrastructure modules) depend on
//! these types; the domain never depends on them.

/// Output rectangles, the layout snapshot, and push directions.
pub mod layout;

/// The atomically replaceable holder of the current layout.
pub mod registry;

/// The edge-transition decision engine.
pub mod transition;
