//! User-facing controls: environment actions and camera input.
//!
//! # Invariants
//! - Control values reaching the scene are clamped to their slider ranges.
//! - Camera input is buffered and applied once per frame.

pub mod action;
mod pointer;

pub use action::{Action, CameraAction, ControlRange};
pub use pointer::PointerInput;

pub fn crate_info() -> &'static str {
    "seascape-input v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("input"));
    }
}
