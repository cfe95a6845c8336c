//! View: distance compression and render state for far-field entities.
//!
//! # Invariants
//! - Scale is exactly 1 up to the inner radius; beyond the outer real radius
//!   entities are hidden.
//! - The view pass writes render state only. Authoritative positions and the
//!   physics local frame are never touched.

mod compressor;
mod error;
mod pass;
mod renderer;
mod viewpoint;

pub use compressor::{ViewCompressor, ViewSample, ViewSettings};
pub use error::ViewError;
pub use pass::{FrameStats, apply_view};
pub use renderer::{DebugTextRenderer, RenderView, Renderer};
pub use viewpoint::{Anchor, Viewpoint};

pub fn crate_info() -> &'static str {
    "deepfield-view v0.1.0"
}
