use glam::Vec3;
use seascape_environment::{SkyParameters, WaterParameters};
use seascape_input::action::{AZIMUTH, ELEVATION};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::path::{Path, PathBuf};

const DEFAULT_SUN_ELEVATION_DEG: f32 = 2.0;
const DEFAULT_SUN_AZIMUTH_DEG: f32 = 180.0;
const DEFAULT_EXPOSURE: f32 = 0.5;
const DEFAULT_CUBE_SIZE: u32 = 32;
const DEFAULT_FOV_Y_DEG: f32 = 55.0;
const DEFAULT_NEAR: f32 = 1.0;
const DEFAULT_FAR: f32 = 20_000.0;
const DEFAULT_MIN_DISTANCE: f32 = 40.0;
const DEFAULT_MAX_DISTANCE: f32 = 200.0;
const DEFAULT_MAX_POLAR: f32 = PI * 0.495;
const MAX_CUBE_SIZE: u32 = 512;

/// Errors from loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Startup configuration. Every key is optional in the YAML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeascapeConfig {
    pub window: WindowConfig,
    pub renderer: RendererConfig,
    pub camera: CameraConfig,
    pub sun: SunConfig,
    pub sky: SkyParameters,
    pub water: WaterParameters,
    pub lighting: LightingConfig,
    pub assets: AssetPaths,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Seascape".into(),
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Tone mapping exposure.
    pub exposure: f32,
    pub vsync: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            exposure: DEFAULT_EXPOSURE,
            vsync: true,
        }
    }
}

/// Orbit camera placement and limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub target: Vec3,
    pub position: Vec3,
    pub fov_y_deg: f32,
    pub near: f32,
    pub far: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Largest angle from +Y the camera may reach, radians.
    pub max_polar_angle: f32,
    /// Radians per pixel of drag.
    pub rotate_speed: f32,
    /// Distance factor per wheel line.
    pub zoom_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            target: Vec3::new(0.0, 10.0, 0.0),
            position: Vec3::new(30.0, 30.0, 100.0),
            fov_y_deg: DEFAULT_FOV_Y_DEG,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
            min_distance: DEFAULT_MIN_DISTANCE,
            max_distance: DEFAULT_MAX_DISTANCE,
            max_polar_angle: DEFAULT_MAX_POLAR,
            rotate_speed: 0.005,
            zoom_speed: 0.95,
        }
    }
}

/// Sun angles applied at startup, degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SunConfig {
    pub elevation: f32,
    pub azimuth: f32,
}

impl Default for SunConfig {
    fn default() -> Self {
        Self {
            elevation: DEFAULT_SUN_ELEVATION_DEG,
            azimuth: DEFAULT_SUN_AZIMUTH_DEG,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    /// Texels per side of the radiance cube's finest level.
    pub cube_size: u32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            cube_size: DEFAULT_CUBE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetPaths {
    pub water_normals: PathBuf,
    /// Island model; `None` starts without one.
    pub island: Option<PathBuf>,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            water_normals: PathBuf::from("textures/waternormals.jpg"),
            island: Some(PathBuf::from("models/island.glb")),
        }
    }
}

impl SeascapeConfig {
    /// Read a YAML file. Missing keys keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        tracing::info!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Defaults, or the file at `path` when given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let cam = &self.camera;
        if !(cam.min_distance > 0.0 && cam.min_distance <= cam.max_distance) {
            return Err(ConfigError::Invalid(format!(
                "camera distance range [{}, {}] is empty",
                cam.min_distance, cam.max_distance
            )));
        }
        if !(cam.near > 0.0 && cam.near < cam.far) {
            return Err(ConfigError::Invalid(format!(
                "camera clip range [{}, {}] is empty",
                cam.near, cam.far
            )));
        }
        let exposure = self.renderer.exposure;
        if !(exposure > 0.0 && exposure.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "exposure must be positive and finite, got {exposure}"
            )));
        }
        if !ELEVATION.contains(self.sun.elevation) {
            return Err(ConfigError::Invalid(format!(
                "sun elevation {} is outside {}..={}",
                self.sun.elevation, ELEVATION.min, ELEVATION.max
            )));
        }
        if !AZIMUTH.contains(self.sun.azimuth) {
            return Err(ConfigError::Invalid(format!(
                "sun azimuth {} is outside {}..={}",
                self.sun.azimuth, AZIMUTH.min, AZIMUTH.max
            )));
        }
        let size = self.lighting.cube_size;
        if !size.is_power_of_two() || size > MAX_CUBE_SIZE {
            return Err(ConfigError::Invalid(format!(
                "lighting cube size must be a power of two up to {MAX_CUBE_SIZE}, got {size}"
            )));
        }
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_demo() {
        let c = SeascapeConfig::default();
        assert_eq!(c.sun.elevation, 2.0);
        assert_eq!(c.sun.azimuth, 180.0);
        assert_eq!(c.renderer.exposure, 0.5);
        assert_eq!(c.camera.target, Vec3::new(0.0, 10.0, 0.0));
        assert_eq!(c.lighting.cube_size, 32);
        assert_eq!(c.sky.turbidity, 10.0);
        assert_eq!(c.water.distortion_scale, 3.7);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seascape.yaml");
        std::fs::write(
            &path,
            "sun:\n  elevation: 30\nsky:\n  turbidity: 4\nassets:\n  island: null\n",
        )
        .unwrap();
        let c = SeascapeConfig::load(&path).unwrap();
        assert_eq!(c.sun.elevation, 30.0);
        assert_eq!(c.sun.azimuth, 180.0);
        assert_eq!(c.sky.turbidity, 4.0);
        assert_eq!(c.sky.rayleigh, 2.0);
        assert_eq!(c.assets.island, None);
        assert_eq!(c.assets.water_normals, PathBuf::from("textures/waternormals.jpg"));
    }

    #[test]
    fn yaml_round_trips() {
        let c = SeascapeConfig::default();
        let back: SeascapeConfig = serde_yaml::from_str(&c.to_yaml().unwrap()).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = SeascapeConfig::load("no/such/seascape.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "sun: [1, 2").unwrap();
        assert!(matches!(
            SeascapeConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn empty_distance_range_is_rejected() {
        let mut c = SeascapeConfig::default();
        c.camera.min_distance = 300.0;
        assert!(matches!(c.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn sun_outside_control_ranges_is_rejected() {
        let mut c = SeascapeConfig::default();
        c.sun.elevation = 150.0;
        assert!(matches!(c.validate(), Err(ConfigError::Invalid(_))));

        let mut c = SeascapeConfig::default();
        c.sun.azimuth = -181.0;
        assert!(matches!(c.validate(), Err(ConfigError::Invalid(_))));

        let mut c = SeascapeConfig::default();
        c.sun.elevation = f32::NAN;
        assert!(c.validate().is_err());

        let mut c = SeascapeConfig::default();
        c.sun.elevation = 90.0;
        c.sun.azimuth = -180.0;
        assert!(c.validate().is_ok());
    }

    #[test]
    fn cube_size_must_be_a_power_of_two() {
        for bad in [0, 24, 1024] {
            let mut c = SeascapeConfig::default();
            c.lighting.cube_size = bad;
            assert!(c.validate().is_err(), "cube_size {bad} accepted");
        }
        let mut c = SeascapeConfig::default();
        c.lighting.cube_size = 512;
        assert!(c.validate().is_ok());
    }

    #[test]
    fn non_finite_exposure_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nan.yaml");
        std::fs::write(&path, "renderer:\n  exposure: .nan\n").unwrap();
        assert!(matches!(
            SeascapeConfig::load(&path),
            Err(ConfigError::Invalid(_))
        ));

        let mut c = SeascapeConfig::default();
        c.renderer.exposure = f32::INFINITY;
        assert!(c.validate().is_err());
    }

    #[test]
    fn out_of_range_yaml_sun_is_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sun.yaml");
        std::fs::write(&path, "sun:\n  elevation: 150\n").unwrap();
        assert!(matches!(
            SeascapeConfig::load(&path),
            Err(ConfigError::Invalid(_))
        ));
    }
}
