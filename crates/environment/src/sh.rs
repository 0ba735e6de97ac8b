use crate::cubemap::{CubeFace, CubeLevel, texel_center, texel_solid_angle};
use glam::Vec3;
use std::f32::consts::PI;

/// Lambert convolution factors per band (l = 0, 1, 2).
const LAMBERT_BANDS: [f32; 3] = [PI, 2.0 * PI / 3.0, PI / 4.0];

/// Order-2 spherical harmonic irradiance (9 RGB coefficients).
///
/// Coefficients are already convolved with the clamped cosine lobe, so
/// [`ShIrradiance::evaluate`] returns irradiance directly.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShIrradiance {
    pub coefficients: [Vec3; 9],
}

impl ShIrradiance {
    /// Project a radiance cube level onto the basis, weighting by texel solid angle.
    pub fn project(level: &CubeLevel) -> Self {
        let size = level.size();
        let mut coefficients = [Vec3::ZERO; 9];
        for face in CubeFace::ALL {
            let texels = level.face(face);
            for y in 0..size {
                for x in 0..size {
                    let dir = face.direction(texel_center(x, size), texel_center(y, size));
                    let weight = texel_solid_angle(x, y, size);
                    let radiance = texels[(y * size + x) as usize];
                    for (c, b) in coefficients.iter_mut().zip(basis(dir)) {
                        *c += radiance * b * weight;
                    }
                }
            }
        }
        for (i, c) in coefficients.iter_mut().enumerate() {
            *c *= LAMBERT_BANDS[band(i)];
        }
        Self { coefficients }
    }

    /// Irradiance arriving at a surface with the given normal.
    pub fn evaluate(&self, normal: Vec3) -> Vec3 {
        self.coefficients
            .iter()
            .zip(basis(normal.normalize_or_zero()))
            .map(|(c, b)| *c * b)
            .sum::<Vec3>()
            .max(Vec3::ZERO)
    }
}

fn band(index: usize) -> usize {
    match index {
        0 => 0,
        1..=3 => 1,
        _ => 2,
    }
}

/// Real SH basis up to l = 2. The order matches the WGSL evaluation.
pub fn basis(d: Vec3) -> [f32; 9] {
    let (x, y, z) = (d.x, d.y, d.z);
    [
        0.282_095,
        0.488_603 * y,
        0.488_603 * z,
        0.488_603 * x,
        1.092_548 * x * y,
        1.092_548 * y * z,
        0.315_392 * (3.0 * z * z - 1.0),
        1.092_548 * x * z,
        0.546_274 * (x * x - y * y),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_radiance_gives_pi_irradiance() {
        let level = CubeLevel::from_fn(16, |_, _, _, _| Vec3::ONE);
        let sh = ShIrradiance::project(&level);
        for n in [Vec3::X, Vec3::Y, -Vec3::Z, Vec3::new(1.0, 1.0, 1.0)] {
            let e = sh.evaluate(n);
            assert!((e.x - PI).abs() < 0.02, "n={n:?} e={e:?}");
        }
    }

    #[test]
    fn upper_hemisphere_light_favours_upward_normals() {
        let level = CubeLevel::from_fn(16, |_, _, _, dir| {
            if dir.y > 0.0 { Vec3::ONE } else { Vec3::ZERO }
        });
        let sh = ShIrradiance::project(&level);
        let up = sh.evaluate(Vec3::Y);
        let down = sh.evaluate(-Vec3::Y);
        assert!(up.x > 2.5, "up={up:?}");
        assert!(down.x < 0.5, "down={down:?}");
    }
}
