use glam::Vec3;

/// Sun direction derived from elevation/azimuth angles in degrees.
///
/// The polar angle is measured from +Y as `90 - elevation`, the azimuth
/// around +Y starting at +Z towards +X. Angles are not validated here; the
/// controls clamp them before they arrive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunDirection {
    elevation_deg: f32,
    azimuth_deg: f32,
    vector: Vec3,
}

impl SunDirection {
    pub fn from_angles(elevation_deg: f32, azimuth_deg: f32) -> Self {
        let phi = (90.0 - elevation_deg).to_radians();
        let theta = azimuth_deg.to_radians();
        let sin_phi = phi.sin();
        let vector = Vec3::new(sin_phi * theta.sin(), phi.cos(), sin_phi * theta.cos());
        Self {
            elevation_deg,
            azimuth_deg,
            vector,
        }
    }

    pub fn elevation_deg(&self) -> f32 {
        self.elevation_deg
    }

    pub fn azimuth_deg(&self) -> f32 {
        self.azimuth_deg
    }

    /// Unit vector pointing from the scene towards the sun.
    pub fn vector(&self) -> Vec3 {
        self.vector
    }

    /// Height of the sun above the horizon plane, in [-1, 1].
    pub fn height(&self) -> f32 {
        self.vector.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_length_over_control_range() {
        let mut elevation = 0.0;
        while elevation <= 90.0 {
            let mut azimuth = -180.0;
            while azimuth <= 180.0 {
                let sun = SunDirection::from_angles(elevation, azimuth);
                assert!(
                    (sun.vector().length() - 1.0).abs() < 1e-5,
                    "elevation={elevation} azimuth={azimuth}"
                );
                azimuth += 7.5;
            }
            elevation += 2.5;
        }
    }

    #[test]
    fn zenith_has_no_horizontal_component() {
        for azimuth in [-180.0, -45.0, 0.0, 90.0, 180.0] {
            let v = SunDirection::from_angles(90.0, azimuth).vector();
            assert!(v.x.abs() < 1e-6 && v.z.abs() < 1e-6);
            assert!((v.y - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn startup_default_sits_on_the_horizon_facing_negative_z() {
        let sun = SunDirection::from_angles(2.0, 180.0);
        let v = sun.vector();
        assert!(v.y.abs() < 0.05);
        assert!(v.z < -0.99);
        assert!(v.x.abs() < 1e-5);
        assert_eq!(sun.elevation_deg(), 2.0);
        assert_eq!(sun.azimuth_deg(), 180.0);
    }

    #[test]
    fn horizon_elevation_is_flat() {
        let v = SunDirection::from_angles(0.0, 90.0).vector();
        assert!(v.y.abs() < 1e-6);
        assert!((v.x - 1.0).abs() < 1e-6);
    }
}
