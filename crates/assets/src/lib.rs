//! Asset pipeline: glTF/GLB model import and background loading.
//!
//! Models are imported into a [`ModelAsset`] hierarchy that owns its vertex
//! data. The renderer consumes models through the scene, never by path.
//!
//! # Invariants
//! - A [`PendingLoad`] yields exactly one result.
//! - Import never panics on malformed input; every failure is an [`AssetError`].

mod loader;
mod model;

pub use loader::{AssetLoader, PendingLoad};
pub use model::{Material, Mesh, ModelAsset, ModelNode, PlacedPrimitive, Primitive};

use std::path::PathBuf;

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("glTF import failed: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("invalid glTF document: {0}")]
    Invalid(String),
    #[error("loader for {} stopped without a result", .0.display())]
    LoaderDisconnected(PathBuf),
}

pub fn crate_info() -> &'static str {
    "seascape-assets v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("assets"));
    }

    #[test]
    fn io_error_mentions_path() {
        let err = AssetError::Io {
            path: PathBuf::from("models/island.glb"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.to_string().contains("models/island.glb"));
    }
}
