//! wgpu render backend for the seascape.
//!
//! Draws the sky dome as a fullscreen triangle, the water plane with
//! scrolling normals and an environment reflection, and island meshes lit
//! by the prefiltered lighting map.
//!
//! # Invariants
//! - The renderer never mutates the scene. It mirrors the scene's lighting
//!   map by generation and destroys the previous GPU copy when it changes.
//! - Camera motion is view state and never reaches the environment updater.

mod camera;
mod environment;
mod gpu;
mod shaders;
mod texture;

pub use camera::OrbitCamera;
pub use gpu::WgpuRenderer;
pub use texture::NormalImage;
