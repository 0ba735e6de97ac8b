use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Water appearance defaults, loaded from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterParameters {
    pub distortion_scale: f32,
    pub size: f32,
    pub alpha: f32,
    /// Side length of the water plane in world units.
    pub extent: f32,
    pub sun_color: Vec3,
    pub water_color: Vec3,
    pub fog: bool,
}

impl Default for WaterParameters {
    fn default() -> Self {
        Self {
            distortion_scale: 3.7,
            size: 1.0,
            alpha: 1.0,
            extent: 10_000.0,
            sun_color: Vec3::ONE,
            // #001e0f, linearized
            water_color: Vec3::new(0.0, 0.0130, 0.0048),
            fog: true,
        }
    }
}

/// Per-frame water state consumed by the water shader.
#[derive(Debug, Clone, PartialEq)]
pub struct WaterSurface {
    pub params: WaterParameters,
    time: f32,
    sun_direction: Vec3,
}

impl WaterSurface {
    pub fn new(params: WaterParameters) -> Self {
        Self {
            params,
            time: 0.0,
            sun_direction: Vec3::Y,
        }
    }

    /// Animation time in seconds.
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn set_time(&mut self, seconds: f32) {
        self.time = seconds;
    }

    pub fn sun_direction(&self) -> Vec3 {
        self.sun_direction
    }

    /// Stores the normalized direction.
    pub fn set_sun_direction(&mut self, direction: Vec3) {
        self.sun_direction = direction.normalize_or_zero();
    }

    pub fn set_distortion_scale(&mut self, scale: f32) {
        self.params.distortion_scale = scale;
    }

    pub fn set_size(&mut self, size: f32) {
        self.params.size = size;
    }
}
