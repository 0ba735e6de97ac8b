//! Rendering adapter: renderer-agnostic interface, tone mapping and CPU
//! renderers.
//!
//! # Invariants
//! - Renderers never mutate the scene.
//! - CPU and GPU output share one tone mapping curve.

mod preview;
mod renderer;
pub mod tonemap;

pub use preview::{Projection, SkyPreviewRenderer};
pub use renderer::{DebugTextRenderer, RenderView, Renderer};

pub fn crate_info() -> &'static str {
    "seascape-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
