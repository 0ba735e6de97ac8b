//! Seascape kernel: the scene container, the environment updater and the
//! application context that ties them to user controls and the frame clock.
//!
//! # Invariants
//! - The sky's sun, the water's sun and the installed lighting map always
//!   describe the same sun direction.
//! - Every replaced lighting map is released exactly once.
//! - A failed island load never changes the scene.

pub mod clock;
pub mod config;
pub mod context;
pub mod scene;
pub mod updater;

pub use clock::FrameClock;
pub use config::{ConfigError, SeascapeConfig};
pub use context::{IslandSlot, SeascapeContext};
pub use scene::{Node, NodeKind, Scene, SceneEvent};
pub use updater::{EnvironmentError, EnvironmentUpdater};

pub fn crate_info() -> &'static str {
    "seascape-kernel v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("kernel"));
    }
}
