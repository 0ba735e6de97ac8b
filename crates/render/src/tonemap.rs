//! ACES filmic tone mapping (Narkowicz/Hill fit) and sRGB encoding.
//!
//! `TONEMAP_WGSL` in the wgpu backend implements the same curve.

use glam::{Mat3, Vec3};

const ACES_INPUT: Mat3 = Mat3::from_cols(
    Vec3::new(0.597_19, 0.076_00, 0.028_40),
    Vec3::new(0.354_58, 0.908_34, 0.133_83),
    Vec3::new(0.048_23, 0.015_66, 0.837_77),
);

const ACES_OUTPUT: Mat3 = Mat3::from_cols(
    Vec3::new(1.604_75, -0.102_08, -0.003_27),
    Vec3::new(-0.531_08, 1.108_13, -0.072_76),
    Vec3::new(-0.073_67, -0.006_05, 1.076_02),
);

fn rrt_and_odt_fit(v: Vec3) -> Vec3 {
    let a = v * (v + 0.024_578_6) - 0.000_090_537;
    let b = v * (0.983_729 * v + 0.432_951) + 0.238_081;
    a / b
}

/// Map linear HDR radiance to display-referred linear colour in [0, 1].
pub fn aces_filmic(color: Vec3, exposure: f32) -> Vec3 {
    let c = color * (exposure / 0.6);
    let c = ACES_INPUT * c;
    let c = rrt_and_odt_fit(c);
    (ACES_OUTPUT * c).clamp(Vec3::ZERO, Vec3::ONE)
}

pub fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// Tone map and encode to 8-bit sRGB.
pub fn to_srgb8(color: Vec3, exposure: f32) -> [u8; 3] {
    let c = aces_filmic(color, exposure);
    let q = |x: f32| (linear_to_srgb(x) * 255.0 + 0.5).clamp(0.0, 255.0) as u8;
    [q(c.x), q(c.y), q(c.z)]
}
