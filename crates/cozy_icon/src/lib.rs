//! Raster badges for map markers.
//!
//! Two kinds of badges are drawn:
//! 1. count badges: a fixed size circle with the label centered on it. used for clusters.
//! 2. price bubbles: a rounded rectangle sized around the label, with a small pointer tail at the bottom.
//!
//! Both are drawn in the same order: blurred shadow stroke, opaque fill, pointer, label.
//! Rendering is a pure function of the label, the kind and the [IconConfig].

mod cache;
mod canvas;
pub mod config;
mod error;
pub mod face;
mod icon;
mod render;

pub use cache::IconCache;
pub use config::{IconConfig, Rgba, ShadowConfig};
pub use error::IconError;
pub use icon::RenderedIcon;
pub use render::{BadgeBody, BadgeKind, IconLayout, IconRenderer, IconSpec};
