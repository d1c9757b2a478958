//! Edge-transition engine.
//!
//! Runs once per raw motion sample.  Given the current layout snapshot, the
//! absolute pointer position and the raw motion delta, it decides whether the
//! pointer is being pushed across an edge and, if so, where on the
//! neighbouring output it should land.
//!
//! The engine keeps no state between samples; its only inputs are the
//! arguments to [`EdgeTransitionEngine::evaluate`] and the configured
//! [`EdgeThresholds`].
//!
//! # Proportional remapping
//!
//! The coordinate perpendicular to the crossed edge is carried over as a
//! fraction of the source output's extent and re-applied to the destination's
//! extent.  Leaving a 1440-tall output at 90% of its height lands at 90% of the
//! height of a 1080-tall neighbour, instead of being clipped against its bottom.
//!
//! The coordinate along the crossing axis is pinned just inside the entered
//! edge (1px in from the near side, 2px in from the far side).  Continued
//! motion in the same direction points inward relative to that edge, so the
//! next sample cannot bounce the pointer straight back across the seam.

use tracing::trace;

use super::layout::{Direction, Layout, OutputRect};

/// Default distance in pixels from an edge within which a push triggers a warp.
pub const EDGE_THRESHOLD: i32 = 2;

/// Default minimum raw delta magnitude that counts as outward motion.
pub const MIN_MOTION: f64 = 0.1;

/// Tunable trigger thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeThresholds {
    /// Pixels from an edge that count as "at the edge".
    pub edge_px: i32,
    /// Raw delta a component must exceed (outward) to count as a push.
    pub min_motion: f64,
}

impl Default for EdgeThresholds {
    fn default() -> Self {
        Self {
            edge_px: EDGE_THRESHOLD,
            min_motion: MIN_MOTION,
        }
    }
}

/// One raw motion event paired with the pointer's absolute position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    /// Absolute X in root coordinates.
    pub x: i32,
    /// Absolute Y in root coordinates.
    pub y: i32,
    /// Raw horizontal delta (unaccelerated device units).
    pub dx: f64,
    /// Raw vertical delta.
    pub dy: f64,
}

impl PointerSample {
    pub fn new(x: i32, y: i32, dx: f64, dy: f64) -> Self {
        Self { x, y, dx, dy }
    }
}

/// A decided warp: where the pointer came from and where it should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarpTarget {
    /// The edge that was crossed.
    pub direction: Direction,
    /// The output the pointer is leaving.
    pub from: OutputRect,
    /// The output the pointer is entering.
    pub to: OutputRect,
    /// Destination X in root coordinates, inside `to`.
    pub x: i32,
    /// Destination Y in root coordinates, inside `to`.
    pub y: i32,
}

/// The per-sample decision core.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeTransitionEngine {
    thresholds: EdgeThresholds,
}

impl EdgeTransitionEngine {
    /// Creates an engine with the given thresholds.
    pub fn new(thresholds: EdgeThresholds) -> Self {
        Self { thresholds }
    }

    /// Returns the configured thresholds.
    pub fn thresholds(&self) -> EdgeThresholds {
        self.thresholds
    }

    /// Returns the first direction, in [`Direction::PRIORITY`] order, for which
    /// the sample both pushes outward and sits within the edge threshold of
    /// `rect`.
    pub fn triggered_direction(&self, rect: &OutputRect, sample: &PointerSample) -> Option<Direction> {
        Direction::PRIORITY.into_iter().find(|d| {
            d.is_pushing(sample.dx, sample.dy, self.thresholds.min_motion)
                && d.is_near_edge(rect, sample.x, sample.y, self.thresholds.edge_px)
        })
    }

    /// Decides whether `sample` crosses into a neighbouring output of `layout`.
    ///
    /// Returns `None` when the pointer is in a dead zone, is not pushing
    /// against an edge, or has no output beyond the edge it is pushing.
    pub fn evaluate(&self, layout: &Layout, sample: &PointerSample) -> Option<WarpTarget> {
        let Some(current) = layout.locate(sample.x, sample.y) else {
            trace!(x = sample.x, y = sample.y, "pointer outside every output");
            return None;
        };

        let direction = self.triggered_direction(current, sample)?;

        let Some(target) = layout.select_neighbor(current, direction) else {
            trace!(output = current.id, ?direction, "no output beyond edge");
            return None;
        };

        let x_ratio = (sample.x - current.x) as f64 / current.width as f64;
        let y_ratio = (sample.y - current.y) as f64 / current.height as f64;
        let (x, y) = entry_point(direction, target, x_ratio, y_ratio);

        Some(WarpTarget {
            direction,
            from: *current,
            to: *target,
            x,
            y,
        })
    }
}

/// Computes where a pointer crossing in `direction` lands on `to`, given its
/// fractional position on the output it left.
///
/// The result is clamped to lie inside `to` on both axes.
pub fn entry_point(direction: Direction, to: &OutputRect, x_ratio: f64, y_ratio: f64) -> (i32, i32) {
    let (x, y) = match direction {
        Direction::Left => (to.right() - 2, to.y + scale(y_ratio, to.height)),
        Direction::Right => (to.x + 1, to.y + scale(y_ratio, to.height)),
        Direction::Up => (to.x + scale(x_ratio, to.width), to.bottom() - 2),
        Direction::Down => (to.x + scale(x_ratio, to.width), to.y + 1),
    };
    (x.clamp(to.x, to.right() - 1), y.clamp(to.y, to.bottom() - 1))
}

/// Applies a fractional offset to an extent, rounding to the nearest pixel.
pub fn scale(ratio: f64, extent: u32) -> i32 {
    (ratio * extent as f64).round() as i32
}

// ── Tests ─────────────────────────────────────────────────────────────────────
