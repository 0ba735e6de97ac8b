//! Environment lighting: sun direction, analytic sky, water surface state and
//! prefiltered lighting maps.
//!
//! # Invariants
//! - Lighting maps have a single owner and are returned to their prefilter
//!   on replacement.
//! - Sky radiance is evaluated by one function on the CPU; the GPU sky pass
//!   mirrors it.

pub mod cubemap;
mod lighting;
mod sh;
mod sky;
mod sun;
mod water;

pub use cubemap::{CubeFace, CubeLevel};
pub use lighting::{
    CpuPrefilter, EnvironmentPrefilter, LightingMap, PrefilterError, PrefilterStats,
    RadianceSource,
};
pub use sh::ShIrradiance;
pub use sky::{Sky, SkyParameters, SkyScattering};
pub use sun::SunDirection;
pub use water::{WaterParameters, WaterSurface};

pub fn crate_info() -> &'static str {
    "seascape-environment v0.1.0"
}
