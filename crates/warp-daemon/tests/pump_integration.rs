//! Integration tests for the event pump.
//!
//! These tests exercise the daemon's application layer end-to-end:
//! `MockEventSource` → `pump_events` → `RouteMotionUseCase` → `MonitorRegistry`
//! and the recording pointer.

use std::sync::Arc;

use warp_core::{EdgeThresholds, EdgeTransitionEngine, MonitorRegistry};
use warp_daemon::application::route_motion::{pump_events, PumpStats, RouteMotionUseCase};
use warp_daemon::infrastructure::display::mock::{
    MockEventSource, MockOutputEnumerator, RecordingPointer,
};
use warp_daemon::infrastructure::display::{EventSource, PumpEvent};

struct Harness {
    source: MockEventSource,
    enumerator: Arc<MockOutputEnumerator>,
    pointer: Arc<RecordingPointer>,
    use_case: RouteMotionUseCase,
}

fn harness(rects: &[(i32, i32, i32, i32)], pointer_at: (i32, i32)) -> Harness {
    let enumerator = Arc::new(MockOutputEnumerator::with_rects(rects));
    let pointer = Arc::new(RecordingPointer::at(pointer_at.0, pointer_at.1));
    let use_case = RouteMotionUseCase::new(
        Arc::new(MonitorRegistry::new()),
        EdgeTransitionEngine::new(EdgeThresholds::default()),
        enumerator.clone(),
        pointer.clone(),
    );
    use_case.refresh_layout();
    Harness {
        source: MockEventSource::new(),
        enumerator,
        pointer,
        use_case,
    }
}

fn motion(dx: f64, dy: f64) -> PumpEvent {
    PumpEvent::RawMotion { dx, dy }
}

/// Injects `events`, closes the stream, and pumps to completion.
async fn run(h: &mut Harness, events: &[PumpEvent]) -> PumpStats {
    let rx = h.source.start().expect("mock source starts");
    for &event in events {
        h.source.inject(event);
    }
    h.source.stop();
    pump_events(rx, &mut h.use_case, std::future::pending()).await
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_topology_change_between_motions_applies_to_later_motion() {
    // Arrange: start with one output; a second appears while events are queued.
    let mut h = harness(&[(0, 0, 1000, 1000)], (998, 500));
    h.enumerator
        .set_rects(&[(0, 0, 1000, 1000), (1000, 0, 1000, 1000)]);

    // Act
    let stats = run(
        &mut h,
        &[motion(5.0, 0.0), PumpEvent::TopologyChanged, motion(5.0, 0.0)],
    )
    .await;

    // Assert: only the motion after the rebuild warps
    assert_eq!(h.pointer.warps(), vec![(1001, 500)]);
    assert_eq!(stats.warps, 1);
    assert_eq!(stats.rebuilds, 1);
    assert_eq!(stats.events, 3);
}

#[tokio::test]
async fn test_single_monitor_never_warps() {
    let mut h = harness(&[(0, 0, 1920, 1080)], (1919, 540));

    let stats = run(
        &mut h,
        &[motion(50.0, 0.0), motion(-50.0, 0.0), motion(0.0, 50.0), motion(0.0, -50.0)],
    )
    .await;

    assert_eq!(stats.warps, 0);
    assert!(h.pointer.warps().is_empty());
}

#[tokio::test]
async fn test_failed_rebuild_keeps_warping_with_previous_layout() {
    // Arrange
    let mut h = harness(&[(0, 0, 1000, 1000), (1000, 0, 2000, 1300)], (998, 900));
    h.enumerator.set_failure(Some("screen resources unavailable"));

    // Act
    let stats = run(&mut h, &[PumpEvent::TopologyChanged, motion(5.0, 0.0)]).await;

    // Assert
    assert_eq!(stats.rebuilds, 0);
    assert_eq!(h.pointer.warps(), vec![(1001, 1170)]);
    assert_eq!(h.use_case.registry().output_count(), 2);
}

#[tokio::test]
async fn test_zero_delta_motion_does_not_query_pointer() {
    let mut h = harness(&[(0, 0, 1000, 1000), (1000, 0, 1000, 1000)], (998, 500));

    let stats = run(&mut h, &[motion(0.0, 0.0), motion(0.0, 0.0)]).await;

    assert_eq!(stats.events, 2);
    assert_eq!(*h.pointer.queries.lock().unwrap(), 0);
    assert!(h.pointer.warps().is_empty());
}

#[tokio::test]
async fn test_warp_then_reverse_motion_returns_to_source_output() {
    // Arrange: equal-size outputs side by side
    let mut h = harness(&[(0, 0, 1000, 1000), (1000, 0, 1000, 1000)], (998, 300));

    // Act: push right, then immediately push left from the inset entry point
    let stats = run(&mut h, &[motion(5.0, 0.0), motion(-5.0, 0.0)]).await;

    // Assert: (998,300) -> (1001,300) -> (998,300)
    assert_eq!(stats.warps, 2);
    assert_eq!(h.pointer.warps(), vec![(1001, 300), (998, 300)]);
}

#[tokio::test]
async fn test_layout_removed_to_zero_outputs_suppresses_warping() {
    let mut h = harness(&[(0, 0, 1000, 1000), (1000, 0, 1000, 1000)], (998, 500));
    h.enumerator.set_rects(&[]);

    let stats = run(&mut h, &[PumpEvent::TopologyChanged, motion(5.0, 0.0)]).await;

    assert_eq!(stats.rebuilds, 1);
    assert_eq!(stats.warps, 0);
    assert!(h.use_case.registry().is_degenerate());
}
