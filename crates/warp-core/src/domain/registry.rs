//! The monitor registry: the process-wide current layout.
//!
//! The registry stores one [`Layout`] behind an [`ArcSwap`].  Publishing a new
//! layout is a single atomic pointer swap, and readers take an `Arc` snapshot
//! that stays valid (and unchanged) for as long as they hold it.  A lookup can
//! therefore never observe a half-built layout, even if a rebuild were moved
//! onto another thread.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::debug;

use super::layout::Layout;

/// Holder of the current layout snapshot.
pub struct MonitorRegistry {
    current: ArcSwap<Layout>,
}

impl MonitorRegistry {
    /// Creates a registry holding an empty layout.
    ///
    /// Until the first successful rebuild every lookup misses, so no warp can
    /// happen.
    pub fn new() -> Self {
        Self::with_layout(Layout::empty())
    }

    /// Creates a registry pre-populated with `layout`.
    pub fn with_layout(layout: Layout) -> Self {
        Self {
            current: ArcSwap::from_pointee(layout),
        }
    }

    /// Returns the current layout snapshot.
    pub fn snapshot(&self) -> Arc<Layout> {
        self.current.load_full()
    }

    /// Atomically replaces the current layout and returns the previous one.
    pub fn publish(&self, layout: Layout) -> Arc<Layout> {
        debug!(outputs = layout.len(), "publishing layout snapshot");
        self.current.swap(Arc::new(layout))
    }

    /// Returns the number of outputs in the current layout.
    pub fn output_count(&self) -> usize {
        self.current.load().len()
    }

    /// Returns `true` if the current layout has no outputs, in which case
    /// warping is suppressed.
    pub fn is_degenerate(&self) -> bool {
        self.current.load().is_empty()
    }
}

impl Default for MonitorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
