//! RouteMotionUseCase: turns display events into layout refreshes and warps.
//!
//! This use case is the heart of the daemon.  It consumes [`PumpEvent`]s in
//! delivery order:
//!
//! - `TopologyChanged` rebuilds the monitor registry before the next event is
//!   looked at, so a motion queued behind a hotplug always sees the new layout.
//! - `RawMotion` samples the pointer position, asks the
//!   [`EdgeTransitionEngine`] for a decision against the current layout
//!   snapshot, and performs the warp (followed by a flush) when one is due.
//!
//! # Architecture
//!
//! The use case depends only on traits ([`OutputEnumerator`],
//! [`PointerController`]) and domain types.  The X11 implementations are
//! injected at construction time, making the use case fully unit-testable.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, trace};
use warp_core::{EdgeTransitionEngine, MonitorRegistry, PointerSample, WarpTarget};

use super::update_layout::{refresh_registry, OutputEnumerator};
use crate::infrastructure::display::PumpEvent;

/// Trait for reading and moving the pointer.
///
/// Infrastructure implementation calls `XQueryPointer` / `XWarpPointer`; the
/// test implementation records calls.
pub trait PointerController: Send + Sync {
    /// Returns the pointer's absolute root coordinates, or `None` if they
    /// cannot be read (e.g. the pointer is on another screen).
    fn query_pointer(&self) -> Option<(i32, i32)>;

    /// Moves the pointer to absolute root coordinates.
    fn warp_pointer(&self, x: i32, y: i32);

    /// Pushes pending requests to the server.
    fn flush(&self);
}

/// What handling a single event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// The layout was rebuilt from a fresh output query.
    LayoutRebuilt {
        /// Outputs in the new layout.
        active: usize,
    },
    /// The output query failed and the previous layout was kept.
    LayoutRetained,
    /// The pointer was warped.
    Warped(WarpTarget),
    /// The event produced no action.
    Ignored,
}

/// Counters reported when the pump stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpStats {
    /// Events taken off the channel.
    pub events: u64,
    /// Warps performed.
    pub warps: u64,
    /// Successful layout rebuilds.
    pub rebuilds: u64,
}

/// The Route Motion use case.
pub struct RouteMotionUseCase {
    registry: Arc<MonitorRegistry>,
    engine: EdgeTransitionEngine,
    enumerator: Arc<dyn OutputEnumerator>,
    pointer: Arc<dyn PointerController>,
}

impl RouteMotionUseCase {
    /// Creates a new use case instance.
    pub fn new(
        registry: Arc<MonitorRegistry>,
        engine: EdgeTransitionEngine,
        enumerator: Arc<dyn OutputEnumerator>,
        pointer: Arc<dyn PointerController>,
    ) -> Self {
        Self {
            registry,
            engine,
            enumerator,
            pointer,
        }
    }

    /// Returns the registry this use case reads and refreshes.
    pub fn registry(&self) -> &Arc<MonitorRegistry> {
        &self.registry
    }

    /// Rebuilds the registry from the current output configuration.
    pub fn refresh_layout(&self) -> EventOutcome {
        match refresh_registry(self.enumerator.as_ref(), &self.registry) {
            Ok(report) => EventOutcome::LayoutRebuilt {
                active: report.active,
            },
            Err(_) => EventOutcome::LayoutRetained,
        }
    }

    /// Processes one event to completion.
    pub fn handle_event(&mut self, event: PumpEvent) -> EventOutcome {
        match event {
            PumpEvent::TopologyChanged => self.refresh_layout(),
            PumpEvent::RawMotion { dx, dy } => self.handle_motion(dx, dy),
        }
    }

    fn handle_motion(&mut self, dx: f64, dy: f64) -> EventOutcome {
        if dx == 0.0 && dy == 0.0 {
            return EventOutcome::Ignored;
        }

        let layout = self.registry.snapshot();
        if layout.len() < 2 {
            return EventOutcome::Ignored;
        }

        let Some((x, y)) = self.pointer.query_pointer() else {
            trace!("pointer position unavailable; dropping motion");
            return EventOutcome::Ignored;
        };

        let sample = PointerSample::new(x, y, dx, dy);
        let Some(target) = self.engine.evaluate(&layout, &sample) else {
            return EventOutcome::Ignored;
        };

        self.pointer.warp_pointer(target.x, target.y);
        self.pointer.flush();

        debug!(
            direction = ?target.direction,
            from = target.from.id,
            to = target.to.id,
            "warped ({x}, {y}) -> ({}, {})",
            target.x,
            target.y
        );
        EventOutcome::Warped(target)
    }
}

/// Drains `events` through `use_case` until the channel closes or `shutdown`
/// resolves.
///
/// Each event is handled to completion before the next is received.
pub async fn pump_events<F>(
    mut events: UnboundedReceiver<PumpEvent>,
    use_case: &mut RouteMotionUseCase,
    shutdown: F,
) -> PumpStats
where
    F: Future<Output = ()>,
{
    let mut stats = PumpStats::default();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("shutdown requested; stopping event pump");
                break;
            }
            event = events.recv() => {
                let Some(event) = event else {
                    info!("event stream closed; stopping event pump");
                    break;
                };
                stats.events += 1;
                match use_case.handle_event(event) {
                    EventOutcome::Warped(_) => stats.warps += 1,
                    EventOutcome::LayoutRebuilt { .. } => stats.rebuilds += 1,
                    EventOutcome::LayoutRetained | EventOutcome::Ignored => {}
                }
            }
        }
    }

    stats
}

// ── Tests ─────────────────────────────────────────────────────────────────────
