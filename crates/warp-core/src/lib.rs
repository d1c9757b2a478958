//! # warp-core
//!
//! Pure domain logic for EdgeWarp: the monitor layout model, the locator and
//! neighbour selector, and the edge-transition engine that decides when and
//! where the pointer is warped across a seam between outputs.
//!
//! This crate has zero dependencies on OS APIs or display-server bindings.
//! The daemon crate feeds it output records and pointer samples and performs
//! the actual warp.
//!
//! # Architecture overview
//!
//! Monitors of different resolutions rarely line up edge to edge.  When a
//! small screen sits next to a large one, part of the large screen's edge has
//! no neighbour directly beside it and the pointer gets stuck against a "dead
//! wall".  EdgeWarp watches raw pointer motion; whenever the pointer pushes
//! against an edge it finds the nearest output in that direction and moves the
//! pointer to the proportionally equivalent spot there.
//!
//! - **`domain::layout`** – output rectangles, the immutable [`Layout`]
//!   snapshot with `locate` / `select_neighbor`, and [`Direction`].
//! - **`domain::registry`** – [`MonitorRegistry`], the atomically swapped
//!   holder of the current layout.
//! - **`domain::transition`** – [`EdgeTransitionEngine`], the per-sample
//!   decision core.

pub mod domain;

pub use domain::layout::{Direction, Layout, LayoutBuild, OutputInfo, OutputRect, RejectedOutput};
pub use domain::registry::MonitorRegistry;
pub use domain::transition::{EdgeThresholds, EdgeTransitionEngine, PointerSample, WarpTarget};
