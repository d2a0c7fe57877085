#![forbid(unsafe_code)]

//! View tree for weft: named nodes, the nearest-template ancestor walk,
//! per-view augmentation slots, and the explicitly threaded render context.
//!
//! The tree here is deliberately minimal: a [`View`] knows its name, its
//! parent, and whatever state other components hang off its slot table.
//! Rendering, layout, and child management belong to the host.

pub mod context;
pub mod view;

pub use context::{RenderContext, ViewGuard};
pub use view::{TEMPLATE_PREFIX, View, ViewName};
