use glam::{Mat4, Vec3};
use seascape_input::CameraAction;
use seascape_kernel::config::CameraConfig;

/// Orbit camera around a target with distance and polar-angle limits.
/// Camera motion is view state; it never touches the scene.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub target: Vec3,
    /// Angle around +Y, radians, measured from +Z towards +X.
    pub azimuth: f32,
    /// Angle from +Y, radians.
    pub polar: f32,
    pub distance: f32,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub max_polar: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}

impl OrbitCamera {
    pub fn from_config(config: &CameraConfig) -> Self {
        let offset = config.position - config.target;
        let distance = offset.length().max(f32::EPSILON);
        let mut cam = Self {
            target: config.target,
            azimuth: offset.x.atan2(offset.z),
            polar: (offset.y / distance).clamp(-1.0, 1.0).acos(),
            distance,
            fov: config.fov_y_deg.to_radians(),
            aspect: 16.0 / 9.0,
            near: config.near,
            far: config.far,
            min_distance: config.min_distance,
            max_distance: config.max_distance,
            max_polar: config.max_polar_angle,
            rotate_speed: config.rotate_speed,
            zoom_speed: config.zoom_speed,
        };
        cam.enforce_limits();
        cam
    }

    pub fn position(&self) -> Vec3 {
        let s = self.polar.sin();
        self.target
            + self.distance * Vec3::new(s * self.azimuth.sin(), self.polar.cos(), s * self.azimuth.cos())
    }

    /// Drag by `dx, dy` pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.azimuth -= dx * self.rotate_speed;
        self.polar -= dy * self.rotate_speed;
        self.enforce_limits();
    }

    /// Wheel by `lines`; positive moves closer.
    pub fn zoom(&mut self, lines: f32) {
        self.distance *= self.zoom_speed.powf(lines);
        self.enforce_limits();
    }

    pub fn apply(&mut self, action: CameraAction) {
        match action {
            CameraAction::Rotate { dx, dy } => self.rotate(dx, dy),
            CameraAction::Zoom(lines) => self.zoom(lines),
        }
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    fn enforce_limits(&mut self) {
        self.polar = self.polar.clamp(1.0e-3, self.max_polar);
        self.distance = self.distance.clamp(self.min_distance, self.max_distance);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn starts_at_configured_position() {
        let cam = OrbitCamera::default();
        let p = cam.position();
        assert!((p - Vec3::new(30.0, 30.0, 100.0)).length() < 1e-3, "{p:?}");
        assert!(!cam.view_projection().col(0).x.is_nan());
    }

    #[test]
    fn never_dips_below_the_limit() {
        let mut cam = OrbitCamera::default();
        cam.rotate(0.0, -1.0e6);
        assert!((cam.polar - 0.495 * PI).abs() < 1e-6);
        assert!(cam.position().y > cam.target.y);
        cam.rotate(0.0, 1.0e6);
        assert!(cam.polar > 0.0);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut cam = OrbitCamera::default();
        cam.zoom(1000.0);
        assert_eq!(cam.distance, 40.0);
        cam.zoom(-1000.0);
        assert_eq!(cam.distance, 200.0);
    }

    #[test]
    fn applies_input_actions() {
        let mut cam = OrbitCamera::default();
        let start = cam.azimuth;
        cam.apply(CameraAction::Rotate { dx: 10.0, dy: 0.0 });
        assert!(cam.azimuth < start);
        let d = cam.distance;
        cam.apply(CameraAction::Zoom(1.0));
        assert!(cam.distance < d);
    }
}
