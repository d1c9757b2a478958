//! Monitor layout domain entity.
//!
//! A [`Layout`] is an immutable, ordered snapshot of the active outputs in the
//! root (global) coordinate space.  It is built in one go from the display
//! configuration and never edited afterwards; a topology change produces a
//! brand-new layout that replaces the old one wholesale (see
//! [`crate::domain::registry::MonitorRegistry`]).
//!
//! Two lookups run against a layout on every motion sample:
//!
//! - [`Layout::locate`] finds the output under the pointer.
//! - [`Layout::select_neighbor`] finds the closest output beyond one edge of a
//!   given output.
//!
//! # Overlapping outputs
//!
//! Mirrored or partially overlapping outputs are kept as-is.  Both lookups
//! resolve ambiguity by enumeration order: the first containing rectangle wins
//! in `locate`, and the first candidate at the minimal distance wins in
//! `select_neighbor`.  This is deterministic but not a statement about which
//! output is "correct" for an overlapping setup.

/// One output record exactly as the display configuration reports it, before
/// any filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputInfo {
    /// X origin in root coordinates.
    pub x: i32,
    /// Y origin in root coordinates.
    pub y: i32,
    /// Width in pixels as reported (may be zero for a misbehaving driver).
    pub width: i32,
    /// Height in pixels as reported.
    pub height: i32,
    /// `true` if a sink is plugged into the output.
    pub connected: bool,
    /// `true` if the output is currently driven by a display controller (CRTC).
    pub has_active_controller: bool,
}

impl OutputInfo {
    /// Returns `true` if the output is connected and scanning out.
    pub fn is_active(&self) -> bool {
        self.connected && self.has_active_controller
    }
}

/// An active output rectangle in root coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputRect {
    /// 0-based position among the retained outputs, in enumeration order.
    pub id: u32,
    /// X coordinate of the top-left corner (may be negative).
    pub x: i32,
    /// Y coordinate of the top-left corner (may be negative).
    pub y: i32,
    /// Width in pixels, always positive.
    pub width: u32,
    /// Height in pixels, always positive.
    pub height: u32,
}

impl OutputRect {
    /// Returns the rightmost X coordinate (exclusive).
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width as i32)
    }

    /// Returns the bottommost Y coordinate (exclusive).
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height as i32)
    }

    /// Returns `true` if `(x, y)` lies in the half-open box
    /// `[x, right) × [y, bottom)`.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Integer centre point, rounded towards the origin corner.
    pub fn center(&self) -> (i64, i64) {
        (
            self.x as i64 + (self.width / 2) as i64,
            self.y as i64 + (self.height / 2) as i64,
        )
    }

    /// Squared Euclidean distance between the centres of `self` and `other`.
    pub fn center_distance_sq(&self, other: &OutputRect) -> i64 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        (ax - bx).pow(2) + (ay - by).pow(2)
    }
}

/// The direction the pointer is being pushed across an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Evaluation order for edge tests.  When a sample satisfies more than one
    /// direction (a corner push), the earliest entry wins.
    pub const PRIORITY: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    /// Returns `true` if the raw delta moves outward in this direction by more
    /// than `min_motion` raw units.
    pub fn is_pushing(self, dx: f64, dy: f64, min_motion: f64) -> bool {
        match self {
            Direction::Left => dx < -min_motion,
            Direction::Right => dx > min_motion,
            Direction::Up => dy < -min_motion,
            Direction::Down => dy > min_motion,
        }
    }

    /// Returns `true` if `(x, y)` is within `threshold` pixels of this edge of
    /// `rect`.  The far edges are measured from the last pixel row/column
    /// (`right - 1`, `bottom - 1`).
    pub fn is_near_edge(self, rect: &OutputRect, x: i32, y: i32, threshold: i32) -> bool {
        match self {
            Direction::Left => x <= rect.x.saturating_add(threshold),
            Direction::Right => x >= rect.right().saturating_sub(1).saturating_sub(threshold),
            Direction::Up => y <= rect.y.saturating_add(threshold),
            Direction::Down => y >= rect.bottom().saturating_sub(1).saturating_sub(threshold),
        }
    }

    /// Returns `true` if `candidate` lies entirely on this side of `current`
    /// along the relevant axis.
    pub fn admits(self, current: &OutputRect, candidate: &OutputRect) -> bool {
        match self {
            Direction::Left => candidate.right() <= current.x,
            Direction::Right => candidate.x >= current.right(),
            Direction::Up => candidate.bottom() <= current.y,
            Direction::Down => candidate.y >= current.bottom(),
        }
    }
}

/// An output record that was excluded because its extents are not positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RejectedOutput {
    /// Position of the record in the raw enumeration.
    pub position: usize,
    /// The offending record.
    pub info: OutputInfo,
}

/// Result of building a layout from raw output records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutBuild {
    /// The layout containing every active, well-formed output.
    pub layout: Layout,
    /// Active outputs excluded for non-positive width or height.
    pub rejected: Vec<RejectedOutput>,
}

/// An immutable ordered set of active output rectangles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    outputs: Vec<OutputRect>,
}

impl Layout {
    /// Creates a layout with no outputs.  Nothing can be located in it, so no
    /// warp is ever produced against it.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a layout from raw enumeration records.
    ///
    /// Keeps only records that are both connected and driven by a controller,
    /// drops those with a non-positive width or height (reported in
    /// [`LayoutBuild::rejected`]), and numbers the survivors from 0 in
    /// enumeration order.
    pub fn from_outputs(infos: &[OutputInfo]) -> LayoutBuild {
        let mut outputs = Vec::with_capacity(infos.len());
        let mut rejected = Vec::new();

        for (position, info) in infos.iter().enumerate() {
            if !info.is_active() {
                continue;
            }
            if info.width <= 0 || info.height <= 0 {
                rejected.push(RejectedOutput {
                    position,
                    info: *info,
                });
                continue;
            }
            outputs.push(OutputRect {
                id: outputs.len() as u32,
                x: info.x,
                y: info.y,
                width: info.width as u32,
                height: info.height as u32,
            });
        }

        LayoutBuild {
            layout: Layout { outputs },
            rejected,
        }
    }

    /// Builds a layout directly from rectangles, renumbering ids in order.
    ///
    /// Rectangles with a zero extent, or an extent that does not fit in an
    /// `i32`, are skipped.
    pub fn from_rects<I>(rects: I) -> Self
    where
        I: IntoIterator<Item = (i32, i32, u32, u32)>,
    {
        let fits = |extent: u32| extent > 0 && i32::try_from(extent).is_ok();
        let outputs = rects
            .into_iter()
            .filter(|&(_, _, w, h)| fits(w) && fits(h))
            .enumerate()
            .map(|(i, (x, y, width, height))| OutputRect {
                id: i as u32,
                x,
                y,
                width,
                height,
            })
            .collect();
        Self { outputs }
    }

    /// Returns the outputs in enumeration order.
    pub fn outputs(&self) -> &[OutputRect] {
        &self.outputs
    }

    /// Returns the number of outputs.
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// Returns `true` if the layout has no outputs.
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Finds the first output containing `(x, y)`.
    ///
    /// Returns `None` for points in dead zones between outputs.
    pub fn locate(&self, x: i32, y: i32) -> Option<&OutputRect> {
        self.outputs.iter().find(|o| o.contains(x, y))
    }

    /// Finds the output nearest to `current` that lies entirely beyond its
    /// `direction` edge.
    ///
    /// "Nearest" is the smallest squared distance between centres; ties go to
    /// the candidate enumerated first.  Returns `None` at the outer edge of the
    /// desktop.
    pub fn select_neighbor(&self, current: &OutputRect, direction: Direction) -> Option<&OutputRect> {
        let mut best: Option<(&OutputRect, i64)> = None;

        for candidate in &self.outputs {
            if candidate.id == current.id || !direction.admits(current, candidate) {
                continue;
            }
            let dist = current.center_distance_sq(candidate);
            match best {
                Some((_, best_dist)) if dist >= best_dist => {}
                _ => best = Some((candidate, dist)),
            }
        }

        best.map(|(rect, _)| rect)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn active(x: i32, y: i32, w: i32, h: i32) -> OutputInfo {
        OutputInfo {
            x,
            y,
            width: w,
            height: h,
            connected: true,
            has_active_controller: true,
        }
    }

    fn rect(id: u32, x: i32, y: i32, w: u32, h: u32) -> OutputRect {
        OutputRect {
            id,
            x,
            y,
            width: w,
            height: h,
        }
    }

    // ── OutputRect helpers ────────────────────────────────────────────────────

    #[test]
    fn test_output_rect_right_and_bottom_are_exclusive() {
        let r = rect(0, 100, 50, 1920, 1080);
        assert_eq!(r.right(), 2020);
        assert_eq!(r.bottom(), 1130);
    }

    #[test]
    fn test_output_rect_contains_is_half_open() {
        let r = rect(0, 0, 0, 100, 100);
        assert!(r.contains(0, 0));
        assert!(r.contains(99, 99));
        assert!(!r.contains(100, 50));
        assert!(!r.contains(50, 100));
        assert!(!r.contains(-1, 0));
    }

    #[test]
    fn test_output_rect_center_uses_integer_halves() {
        let r = rect(0, 10, 20, 5, 7);
        assert_eq!(r.center(), (12, 23));
    }

    // ── from_outputs ──────────────────────────────────────────────────────────

    #[test]
    fn test_from_outputs_keeps_only_connected_outputs_with_controller() {
        let infos = [
            active(0, 0, 1920, 1080),
            OutputInfo {
                connected: false,
                ..active(1920, 0, 1920, 1080)
            },
            OutputInfo {
                has_active_controller: false,
                ..active(3840, 0, 1920, 1080)
            },
            active(1920, 0, 2560, 1440),
        ];

        let build = Layout::from_outputs(&infos);

        assert_eq!(build.layout.len(), 2);
        assert!(build.rejected.is_empty());
        assert_eq!(build.layout.outputs()[1].x, 1920);
        assert_eq!(build.layout.outputs()[1].width, 2560);
    }

    #[test]
    fn test_from_outputs_assigns_sequential_ids_in_enumeration_order() {
        let infos = [
            active(0, 0, 100, 100),
            OutputInfo {
                connected: false,
                ..active(100, 0, 100, 100)
            },
            active(200, 0, 100, 100),
            active(300, 0, 100, 100),
        ];

        let build = Layout::from_outputs(&infos);

        let ids: Vec<u32> = build.layout.outputs().iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(build.layout.outputs()[1].x, 200);
    }

    #[test]
    fn test_from_outputs_rejects_non_positive_extents() {
        let infos = [
            active(0, 0, 0, 1080),
            active(0, 0, 1920, -5),
            active(0, 0, 1920, 1080),
        ];

        let build = Layout::from_outputs(&infos);

        assert_eq!(build.layout.len(), 1);
        assert_eq!(build.layout.outputs()[0].id, 0);
        assert_eq!(build.rejected.len(), 2);
        assert_eq!(build.rejected[0].position, 0);
        assert_eq!(build.rejected[1].position, 1);
    }

    #[test]
    fn test_from_outputs_ignores_malformed_inactive_outputs_silently() {
        let infos = [OutputInfo {
            connected: false,
            ..active(0, 0, 0, 0)
        }];

        let build = Layout::from_outputs(&infos);

        assert!(build.layout.is_empty());
        assert!(build.rejected.is_empty());
    }

    #[test]
    fn test_from_rects_skips_zero_extents_and_renumbers() {
        let layout = Layout::from_rects([(0, 0, 100, 100), (100, 0, 0, 100), (100, 0, 50, 50)]);
        assert_eq!(layout.len(), 2);
        assert_eq!(layout.outputs()[1], rect(1, 100, 0, 50, 50));
    }

    #[test]
    fn test_from_rects_skips_extents_beyond_i32_range() {
        // Arrange
        let huge = i32::MAX as u32 + 1;

        // Act
        let layout =
            Layout::from_rects([(0, 0, huge, 1080), (0, 0, 1920, u32::MAX), (0, 0, 1920, 1080)]);

        // Assert
        assert_eq!(layout.len(), 1);
        assert_eq!(layout.outputs()[0].id, 0);
        assert!(layout.outputs()[0].right() > 0);
    }

    // ── locate ────────────────────────────────────────────────────────────────

    #[test]
    fn test_locate_returns_output_containing_point() {
        let layout = Layout::from_rects([(0, 0, 1920, 1080), (1920, 0, 2560, 1440)]);
        assert_eq!(layout.locate(960, 540).map(|o| o.id), Some(0));
        assert_eq!(layout.locate(2000, 1200).map(|o| o.id), Some(1));
    }

    #[test]
    fn test_locate_returns_none_in_dead_zone() {
        // The 1080p output is shorter, so (100, 1200) is below it with nothing there.
        let layout = Layout::from_rects([(0, 0, 1920, 1080), (1920, 0, 2560, 1440)]);
        assert!(layout.locate(100, 1200).is_none());
    }

    #[test]
    fn test_locate_returns_none_for_empty_layout() {
        assert!(Layout::empty().locate(0, 0).is_none());
    }

    #[test]
    fn test_locate_resolves_overlap_to_first_enumerated_output() {
        let layout = Layout::from_rects([(0, 0, 1920, 1080), (0, 0, 1920, 1080)]);
        assert_eq!(layout.locate(10, 10).map(|o| o.id), Some(0));
    }

    #[test]
    fn test_locate_handles_negative_origins() {
        let layout = Layout::from_rects([(-1920, 0, 1920, 1080), (0, 0, 1920, 1080)]);
        assert_eq!(layout.locate(-1, 0).map(|o| o.id), Some(0));
        assert_eq!(layout.locate(0, 0).map(|o| o.id), Some(1));
    }

    // ── Direction ─────────────────────────────────────────────────────────────

    #[test]
    fn test_direction_priority_order_is_left_right_up_down() {
        assert_eq!(
            Direction::PRIORITY,
            [Direction::Left, Direction::Right, Direction::Up, Direction::Down]
        );
    }

    #[test]
    fn test_direction_is_pushing_requires_outward_motion_above_threshold() {
        assert!(Direction::Left.is_pushing(-0.5, 0.0, 0.1));
        assert!(!Direction::Left.is_pushing(-0.1, 0.0, 0.1));
        assert!(!Direction::Left.is_pushing(5.0, 0.0, 0.1));
        assert!(Direction::Right.is_pushing(0.2, 0.0, 0.1));
        assert!(Direction::Up.is_pushing(0.0, -3.0, 0.1));
        assert!(Direction::Down.is_pushing(0.0, 3.0, 0.1));
        assert!(!Direction::Down.is_pushing(3.0, 0.0, 0.1));
    }

    #[test]
    fn test_direction_is_near_edge_measures_from_last_pixel() {
        let r = rect(0, 0, 0, 1000, 800);
        assert!(Direction::Left.is_near_edge(&r, 2, 400, 2));
        assert!(!Direction::Left.is_near_edge(&r, 3, 400, 2));
        assert!(Direction::Right.is_near_edge(&r, 997, 400, 2));
        assert!(!Direction::Right.is_near_edge(&r, 996, 400, 2));
        assert!(Direction::Up.is_near_edge(&r, 500, 0, 2));
        assert!(Direction::Down.is_near_edge(&r, 500, 797, 2));
        assert!(!Direction::Down.is_near_edge(&r, 500, 796, 2));
    }

    #[test]
    fn test_direction_admits_only_rectangles_fully_beyond_edge() {
        let current = rect(0, 1000, 1000, 1000, 1000);
        assert!(Direction::Left.admits(&current, &rect(1, 0, 0, 1000, 1000)));
        assert!(!Direction::Left.admits(&current, &rect(1, 1, 0, 1000, 1000)));
        assert!(Direction::Right.admits(&current, &rect(1, 2000, 5000, 10, 10)));
        assert!(Direction::Up.admits(&current, &rect(1, 1000, 0, 1000, 1000)));
        assert!(Direction::Down.admits(&current, &rect(1, 1000, 2000, 1000, 1000)));
        assert!(!Direction::Down.admits(&current, &rect(1, 1000, 1999, 1000, 1000)));
    }

    #[test]
    fn test_direction_is_near_edge_saturates_with_huge_threshold() {
        // Right and bottom edges are negative; a huge threshold must not overflow.
        let r = rect(0, -3840, -2160, 1920, 1080);

        assert!(Direction::Right.is_near_edge(&r, -2880, -1620, i32::MAX));
        assert!(Direction::Down.is_near_edge(&r, -2880, -1620, i32::MAX));
        assert!(Direction::Left.is_near_edge(&r, -2880, -1620, i32::MAX));
        assert!(Direction::Up.is_near_edge(&r, -2880, -1620, i32::MAX));
    }

    // ── select_neighbor ───────────────────────────────────────────────────────

    #[test]
    fn test_select_neighbor_returns_output_to_the_right() {
        let layout = Layout::from_rects([(0, 0, 1000, 1000), (1000, 200, 500, 500)]);
        let current = layout.outputs()[0];
        let neighbor = layout.select_neighbor(&current, Direction::Right);
        assert_eq!(neighbor.map(|o| o.id), Some(1));
    }

    #[test]
    fn test_select_neighbor_returns_none_at_desktop_boundary() {
        let layout = Layout::from_rects([(0, 0, 1000, 1000), (1000, 200, 500, 500)]);
        let current = layout.outputs()[0];
        assert!(layout.select_neighbor(&current, Direction::Left).is_none());
        assert!(layout.select_neighbor(&current, Direction::Up).is_none());
        assert!(layout.select_neighbor(&current, Direction::Down).is_none());
    }

    #[test]
    fn test_select_neighbor_returns_none_for_single_output() {
        let layout = Layout::from_rects([(0, 0, 1920, 1080)]);
        let current = layout.outputs()[0];
        for direction in Direction::PRIORITY {
            assert!(layout.select_neighbor(&current, direction).is_none());
        }
    }

    #[test]
    fn test_select_neighbor_prefers_nearest_center() {
        // Two outputs to the right; the one level with the current output is nearer.
        let layout = Layout::from_rects([
            (0, 0, 1000, 1000),
            (1000, 2000, 1000, 1000),
            (1000, 0, 1000, 1000),
        ]);
        let current = layout.outputs()[0];
        let neighbor = layout.select_neighbor(&current, Direction::Right);
        assert_eq!(neighbor.map(|o| o.id), Some(2));
    }

    #[test]
    fn test_select_neighbor_breaks_ties_by_enumeration_order() {
        // Both candidates are exactly the same distance above and below the centre line.
        let layout = Layout::from_rects([
            (0, 500, 1000, 1000),
            (1000, 0, 1000, 1000),
            (1000, 1000, 1000, 1000),
        ]);
        let current = layout.outputs()[0];
        let neighbor = layout.select_neighbor(&current, Direction::Right);
        assert_eq!(neighbor.map(|o| o.id), Some(1));
    }

    #[test]
    fn test_select_neighbor_skips_overlapping_outputs() {
        // Output 1 overlaps output 0 horizontally, so it is not "to the right".
        let layout = Layout::from_rects([(0, 0, 1000, 1000), (500, 0, 1000, 1000)]);
        let current = layout.outputs()[0];
        assert!(layout.select_neighbor(&current, Direction::Right).is_none());
    }

    #[test]
    fn test_select_neighbor_finds_output_below() {
        let layout = Layout::from_rects([(0, 0, 1920, 1080), (480, 1080, 1280, 720)]);
        let current = layout.outputs()[0];
        assert_eq!(
            layout.select_neighbor(&current, Direction::Down).map(|o| o.id),
            Some(1)
        );
        let below = layout.outputs()[1];
        assert_eq!(
            layout.select_neighbor(&below, Direction::Up).map(|o| o.id),
            Some(0)
        );
    }
}
