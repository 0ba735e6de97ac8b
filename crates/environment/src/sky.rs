//! Analytic daylight sky (Preetham-style single scattering).
//!
//! The per-sun terms live in [`SkyScattering`] so the CPU prefilter, the CLI
//! preview and the GPU sky pass all evaluate the same numbers. The WGSL
//! version of [`SkyScattering::radiance`] must stay in sync with this file.

use crate::lighting::RadianceSource;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Total Rayleigh scattering coefficients for the 680/550/450 nm primaries.
const TOTAL_RAYLEIGH: Vec3 = Vec3::new(5.804_543e-6, 1.356_291_1e-5, 3.026_590_2e-5);
const MIE_CONST: Vec3 = Vec3::new(1.839_991_9e14, 2.779_802_4e14, 4.079_048e14);

/// Earth shadow: intensity falls off past pi/1.95 from the zenith.
const CUTOFF_ANGLE: f32 = PI / 1.95;
const STEEPNESS: f32 = 1.5;
const EE: f32 = 1000.0;

const RAYLEIGH_ZENITH_LENGTH: f32 = 8.4e3;
const MIE_ZENITH_LENGTH: f32 = 1.25e3;
const SUN_ANGULAR_DIAMETER_COS: f32 = 0.999_956_7;

const THREE_OVER_SIXTEEN_PI: f32 = 3.0 / (16.0 * PI);
const ONE_OVER_FOUR_PI: f32 = 1.0 / (4.0 * PI);

/// Scalar sky appearance coefficients, configured once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyParameters {
    /// Haze. 1 is a perfectly clear sky, 10 a hazy one.
    pub turbidity: f32,
    /// Rayleigh scattering strength.
    pub rayleigh: f32,
    /// Mie (particle) scattering coefficient.
    pub mie_coefficient: f32,
    /// Henyey-Greenstein asymmetry of the Mie lobe.
    pub mie_directional_g: f32,
}

impl Default for SkyParameters {
    fn default() -> Self {
        Self {
            turbidity: 10.0,
            rayleigh: 2.0,
            mie_coefficient: 0.005,
            mie_directional_g: 0.8,
        }
    }
}

/// The sky dome: appearance parameters plus the current sun position input.
#[derive(Debug, Clone, PartialEq)]
pub struct Sky {
    pub params: SkyParameters,
    sun_position: Vec3,
    pub up: Vec3,
    /// Dome radius in world units.
    pub scale: f32,
}

impl Sky {
    pub fn new(params: SkyParameters) -> Self {
        Self {
            params,
            sun_position: Vec3::Y,
            up: Vec3::Y,
            scale: 10_000.0,
        }
    }

    pub fn sun_position(&self) -> Vec3 {
        self.sun_position
    }

    pub fn set_sun_position(&mut self, sun_position: Vec3) {
        self.sun_position = sun_position;
    }

    /// Copy of this dome usable as a lighting source in a capture scene.
    pub fn lighting_copy(&self) -> Sky {
        self.clone()
    }

    /// Per-sun scattering terms.
    pub fn scattering(&self) -> SkyScattering {
        SkyScattering::new(self)
    }
}

impl RadianceSource for Sky {
    fn radiance(&self, direction: Vec3) -> Vec3 {
        self.scattering().radiance(direction)
    }
}

/// Sun-dependent terms of the sky model, computed once per sun change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyScattering {
    pub sun_direction: Vec3,
    pub up: Vec3,
    /// Sun intensity after the earth-shadow cut-off.
    pub sun_e: f32,
    pub sun_fade: f32,
    pub beta_r: Vec3,
    pub beta_m: Vec3,
    pub mie_directional_g: f32,
}

impl SkyScattering {
    pub fn new(sky: &Sky) -> Self {
        let sun_direction = sky.sun_position.normalize_or_zero();
        let up = sky.up.normalize_or_zero();
        let sun_e = sun_intensity(sun_direction.dot(up));
        let sun_fade = 1.0 - (1.0 - (sky.sun_position.y / 450_000.0).exp()).clamp(0.0, 1.0);
        let rayleigh_coefficient = sky.params.rayleigh - (1.0 - sun_fade);
        Self {
            sun_direction,
            up,
            sun_e,
            sun_fade,
            beta_r: TOTAL_RAYLEIGH * rayleigh_coefficient,
            beta_m: total_mie(sky.params.turbidity) * sky.params.mie_coefficient,
            mie_directional_g: sky.params.mie_directional_g,
        }
    }

    /// Radiance seen looking along `direction` from the dome centre.
    pub fn radiance(&self, direction: Vec3) -> Vec3 {
        let direction = direction.normalize_or_zero();

        // optical length along the view ray
        let zenith_angle = self.up.dot(direction).max(0.0).acos();
        let inverse = 1.0
            / (zenith_angle.cos()
                + 0.15 * (93.885 - zenith_angle.to_degrees()).powf(-1.253));
        let s_r = RAYLEIGH_ZENITH_LENGTH * inverse;
        let s_m = MIE_ZENITH_LENGTH * inverse;

        let extinction = exp3(-(self.beta_r * s_r + self.beta_m * s_m));

        // in-scattering
        let cos_theta = direction.dot(self.sun_direction);
        let r_phase = rayleigh_phase(cos_theta * 0.5 + 0.5);
        let m_phase = hg_phase(cos_theta, self.mie_directional_g);
        let beta_theta = self.beta_r * r_phase + self.beta_m * m_phase;
        let ratio = beta_theta / (self.beta_r + self.beta_m);

        let mut lin = (self.sun_e * ratio * (Vec3::ONE - extinction)).max(Vec3::ZERO).powf(1.5);
        let horizon_blend = (1.0 - self.up.dot(self.sun_direction)).powf(5.0).clamp(0.0, 1.0);
        let low_sun = (self.sun_e * ratio * extinction).max(Vec3::ZERO).powf(0.5);
        lin *= Vec3::ONE.lerp(low_sun, horizon_blend);

        // night floor plus the solar disc
        let mut l0 = Vec3::splat(0.1) * extinction;
        let sundisk = smoothstep(
            SUN_ANGULAR_DIAMETER_COS,
            SUN_ANGULAR_DIAMETER_COS + 0.00002,
            cos_theta,
        );
        l0 += self.sun_e * 19_000.0 * extinction * sundisk;

        let color = (lin + l0) * 0.04 + Vec3::new(0.0, 0.0003, 0.00075);
        color.powf(1.0 / (1.2 + 1.2 * self.sun_fade))
    }
}

fn sun_intensity(zenith_angle_cos: f32) -> f32 {
    let zenith_angle_cos = zenith_angle_cos.clamp(-1.0, 1.0);
    EE * (1.0 - (-((CUTOFF_ANGLE - zenith_angle_cos.acos()) / STEEPNESS)).exp()).max(0.0)
}

fn total_mie(turbidity: f32) -> Vec3 {
    let c = 0.2 * turbidity * 10e-18;
    0.434 * c * MIE_CONST
}

fn rayleigh_phase(cos_theta: f32) -> f32 {
    THREE_OVER_SIXTEEN_PI * (1.0 + cos_theta * cos_theta)
}

fn hg_phase(cos_theta: f32, g: f32) -> f32 {
    let g2 = g * g;
    let inverse = 1.0 / (1.0 - 2.0 * g * cos_theta + g2).powf(1.5);
    ONE_OVER_FOUR_PI * ((1.0 - g2) * inverse)
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn exp3(v: Vec3) -> Vec3 {
    Vec3::new(v.x.exp(), v.y.exp(), v.z.exp())
}
