//! Layout refresh: rebuilds the monitor registry from the display configuration.
//!
//! [`refresh_registry`] runs at startup and again on every topology-change
//! notification.  It asks an [`OutputEnumerator`] for the raw output records,
//! turns them into a [`Layout`] (dropping disconnected, controller-less and
//! malformed outputs), and publishes the result as one atomic swap.
//!
//! A failed query never touches the registry: the previous layout stays in
//! place and the next notification retries.

use thiserror::Error;
use tracing::{debug, info, warn};
use warp_core::{Layout, MonitorRegistry, OutputInfo, RejectedOutput};

/// Error type for layout refresh operations.
#[derive(Debug, Error, PartialEq)]
pub enum UpdateLayoutError {
    /// The display configuration could not be queried.
    #[error("output enumeration failed: {0}")]
    EnumerationFailed(String),
}

/// Trait for querying the current outputs from the display server.
///
/// Implementations return every output they know about, in the server's
/// enumeration order, including disconnected ones; filtering happens in
/// [`Layout::from_outputs`].
pub trait OutputEnumerator: Send + Sync {
    /// Returns a point-in-time snapshot of the output configuration.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateLayoutError::EnumerationFailed`] if the query fails.
    fn enumerate_outputs(&self) -> Result<Vec<OutputInfo>, UpdateLayoutError>;
}

/// Summary of a successful refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    /// Number of outputs in the published layout.
    pub active: usize,
    /// Active outputs excluded for non-positive extents.
    pub rejected: Vec<RejectedOutput>,
    /// `true` if the published layout differs from the one it replaced.
    pub changed: bool,
}

/// Queries the outputs and publishes the resulting layout to `registry`.
///
/// An empty result is still published, which suppresses warping until a later
/// refresh finds outputs again.
///
/// # Errors
///
/// Returns [`UpdateLayoutError::EnumerationFailed`] if the query fails; the
/// registry is left untouched in that case.
pub fn refresh_registry(
    enumerator: &dyn OutputEnumerator,
    registry: &MonitorRegistry,
) -> Result<RefreshReport, UpdateLayoutError> {
    let infos = match enumerator.enumerate_outputs() {
        Ok(infos) => infos,
        Err(e) => {
            warn!(
                "{e}; keeping previous layout of {} outputs",
                registry.output_count()
            );
            return Err(e);
        }
    };

    let build = Layout::from_outputs(&infos);

    for rejected in &build.rejected {
        warn!(
            position = rejected.position,
            width = rejected.info.width,
            height = rejected.info.height,
            "ignoring output with non-positive extent"
        );
    }

    let active = build.layout.len();
    if active == 0 {
        warn!("no active outputs; pointer warping suspended until the next topology change");
    }

    let previous = registry.publish(build.layout);
    let changed = layout_changed(&previous, &registry.snapshot());
    if changed {
        info!("layout updated: {active} monitors active");
    } else {
        debug!("layout unchanged: {active} monitors active");
    }

    Ok(RefreshReport {
        active,
        rejected: build.rejected,
        changed,
    })
}

/// Detects whether two layouts describe a different set of output rectangles.
pub fn layout_changed(old: &Layout, new: &Layout) -> bool {
    old != new
}
