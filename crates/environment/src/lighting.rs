use crate::cubemap::{CubeFace, CubeLevel};
use crate::sh::ShIrradiance;
use glam::Vec3;

/// Anything that can be captured into a lighting map.
pub trait RadianceSource {
    /// Incoming radiance from `direction` (unit vector, world space).
    fn radiance(&self, direction: Vec3) -> Vec3;
}

/// Errors from building a lighting map.
#[derive(Debug, thiserror::Error)]
pub enum PrefilterError {
    #[error("cube face size must be a power of two in 1..=512, got {0}")]
    InvalidFaceSize(u32),
    #[error("non-finite radiance on face {face:?} at texel ({x}, {y})")]
    NonFiniteRadiance { face: CubeFace, x: u32, y: u32 },
}

/// Prefiltered omnidirectional lighting: a radiance cube with a mip chain
/// plus SH irradiance for diffuse ambient.
///
/// A map is not `Clone`: it has exactly one holder, and it goes back to the
/// prefilter that built it through [`EnvironmentPrefilter::release`].
#[derive(Debug, PartialEq)]
pub struct LightingMap {
    generation: u64,
    levels: Vec<CubeLevel>,
    irradiance: ShIrradiance,
}

impl LightingMap {
    /// Identity of this map. Every prefilter run yields a new generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn face_size(&self) -> u32 {
        self.levels.first().map_or(0, CubeLevel::size)
    }

    /// Mip levels, finest first, ending at 1x1.
    pub fn levels(&self) -> &[CubeLevel] {
        &self.levels
    }

    pub fn irradiance(&self) -> &ShIrradiance {
        &self.irradiance
    }

    /// Diffuse irradiance for a surface normal.
    pub fn sample_irradiance(&self, normal: Vec3) -> Vec3 {
        self.irradiance.evaluate(normal)
    }

    /// Radiance along `direction` at a roughness in [0, 1].
    pub fn sample_radiance(&self, direction: Vec3, roughness: f32) -> Vec3 {
        let max_level = self.levels.len().saturating_sub(1);
        let level = (roughness.clamp(0.0, 1.0) * max_level as f32).round() as usize;
        self.levels
            .get(level)
            .map_or(Vec3::ZERO, |l| l.sample(direction))
    }
}

/// Turns a radiance source into lighting maps and takes them back when
/// they are replaced.
pub trait EnvironmentPrefilter {
    fn prefilter(&mut self, source: &dyn RadianceSource) -> Result<LightingMap, PrefilterError>;

    /// Release a map that is no longer installed anywhere.
    fn release(&mut self, map: LightingMap);
}

/// Counters for maps built and released by a prefilter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrefilterStats {
    pub generated: u64,
    pub released: u64,
}

impl PrefilterStats {
    /// Maps built but not yet released.
    pub fn live(&self) -> u64 {
        self.generated - self.released
    }
}

/// CPU prefilter: samples the source on every cube texel, box-filters a mip
/// chain and projects SH irradiance.
#[derive(Debug)]
pub struct CpuPrefilter {
    face_size: u32,
    next_generation: u64,
    stats: PrefilterStats,
}

impl Default for CpuPrefilter {
    fn default() -> Self {
        Self::new(32)
    }
}

impl CpuPrefilter {
    pub fn new(face_size: u32) -> Self {
        Self {
            face_size,
            next_generation: 1,
            stats: PrefilterStats::default(),
        }
    }

    pub fn face_size(&self) -> u32 {
        self.face_size
    }

    pub fn stats(&self) -> PrefilterStats {
        self.stats
    }
}

impl EnvironmentPrefilter for CpuPrefilter {
    fn prefilter(&mut self, source: &dyn RadianceSource) -> Result<LightingMap, PrefilterError> {
        let size = self.face_size;
        if !size.is_power_of_two() || size > 512 {
            return Err(PrefilterError::InvalidFaceSize(size));
        }
        let _span = tracing::info_span!("prefilter", face_size = size).entered();

        let mut bad_texel = None;
        let base = CubeLevel::from_fn(size, |face, x, y, dir| {
            let l = source.radiance(dir);
            if !l.is_finite() && bad_texel.is_none() {
                bad_texel = Some((face, x, y));
            }
            l
        });
        if let Some((face, x, y)) = bad_texel {
            return Err(PrefilterError::NonFiniteRadiance { face, x, y });
        }

        let irradiance = ShIrradiance::project(&base);
        let mut levels = vec![base];
        while let Some(last) = levels.last() {
            if last.size() <= 1 {
                break;
            }
            let next = last.downsample();
            levels.push(next);
        }

        let generation = self.next_generation;
        self.next_generation += 1;
        self.stats.generated += 1;
        tracing::debug!(generation, levels = levels.len(), "lighting map built");

        Ok(LightingMap {
            generation,
            levels,
            irradiance,
        })
    }

    fn release(&mut self, map: LightingMap) {
        self.stats.released += 1;
        tracing::debug!(generation = map.generation(), "lighting map released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    struct Uniform(Vec3);

    impl RadianceSource for Uniform {
        fn radiance(&self, _direction: Vec3) -> Vec3 {
            self.0
        }
    }

    struct Broken;

    impl RadianceSource for Broken {
        fn radiance(&self, direction: Vec3) -> Vec3 {
            if direction.y > 0.9 { Vec3::NAN } else { Vec3::ONE }
        }
    }

    #[test]
    fn mip_chain_ends_at_one_texel() {
        let mut prefilter = CpuPrefilter::new(16);
        let map = prefilter.prefilter(&Uniform(Vec3::ONE)).unwrap();
        let sizes: Vec<u32> = map.levels().iter().map(CubeLevel::size).collect();
        assert_eq!(sizes, vec![16, 8, 4, 2, 1]);
        assert_eq!(map.face_size(), 16);
    }

    #[test]
    fn uniform_source_gives_pi_irradiance() {
        let mut prefilter = CpuPrefilter::new(16);
        let map = prefilter.prefilter(&Uniform(Vec3::splat(2.0))).unwrap();
        let e = map.sample_irradiance(Vec3::new(0.3, -0.2, 0.9));
        assert!((e.y - 2.0 * PI).abs() < 0.05, "e={e:?}");
        assert_eq!(map.sample_radiance(Vec3::X, 0.0), Vec3::splat(2.0));
        assert_eq!(map.sample_radiance(Vec3::X, 1.0), Vec3::splat(2.0));
    }

    #[test]
    fn generations_increase_and_stats_track_releases() {
        let mut prefilter = CpuPrefilter::new(4);
        let a = prefilter.prefilter(&Uniform(Vec3::ONE)).unwrap();
        let b = prefilter.prefilter(&Uniform(Vec3::ONE)).unwrap();
        assert!(b.generation() > a.generation());
        assert_eq!(prefilter.stats().live(), 2);
        prefilter.release(a);
        assert_eq!(
            prefilter.stats(),
            PrefilterStats {
                generated: 2,
                released: 1
            }
        );
        prefilter.release(b);
        assert_eq!(prefilter.stats().live(), 0);
    }

    #[test]
    fn rejects_bad_face_size() {
        let mut prefilter = CpuPrefilter::new(12);
        let err = prefilter.prefilter(&Uniform(Vec3::ONE)).unwrap_err();
        assert!(matches!(err, PrefilterError::InvalidFaceSize(12)));
        assert_eq!(prefilter.stats().generated, 0);
    }

    #[test]
    fn rejects_non_finite_radiance() {
        let mut prefilter = CpuPrefilter::new(8);
        let err = prefilter.prefilter(&Broken).unwrap_err();
        assert!(matches!(
            err,
            PrefilterError::NonFiniteRadiance {
                face: CubeFace::PositiveY,
                ..
            }
        ));
    }
}
