use glam::Vec3;

/// Cube face in the wgpu/D3D layer order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    /// Layer index of this face in a cube texture.
    pub fn layer(self) -> usize {
        self as usize
    }

    /// Direction through face coordinates `u, v` in [-1, 1], `v` pointing down.
    pub fn direction(self, u: f32, v: f32) -> Vec3 {
        let d = match self {
            CubeFace::PositiveX => Vec3::new(1.0, -v, -u),
            CubeFace::NegativeX => Vec3::new(-1.0, -v, u),
            CubeFace::PositiveY => Vec3::new(u, 1.0, v),
            CubeFace::NegativeY => Vec3::new(u, -1.0, -v),
            CubeFace::PositiveZ => Vec3::new(u, -v, 1.0),
            CubeFace::NegativeZ => Vec3::new(-u, -v, -1.0),
        };
        d.normalize()
    }

    /// Face and face coordinates hit by `direction`.
    pub fn locate(direction: Vec3) -> (CubeFace, f32, f32) {
        let a = direction.abs();
        if a.x >= a.y && a.x >= a.z {
            if direction.x > 0.0 {
                (CubeFace::PositiveX, -direction.z / a.x, -direction.y / a.x)
            } else {
                (CubeFace::NegativeX, direction.z / a.x, -direction.y / a.x)
            }
        } else if a.y >= a.z {
            if direction.y > 0.0 {
                (CubeFace::PositiveY, direction.x / a.y, direction.z / a.y)
            } else {
                (CubeFace::NegativeY, direction.x / a.y, -direction.z / a.y)
            }
        } else if direction.z > 0.0 {
            (CubeFace::PositiveZ, direction.x / a.z, -direction.y / a.z)
        } else {
            (CubeFace::NegativeZ, -direction.x / a.z, -direction.y / a.z)
        }
    }
}

/// Face coordinate of the centre of texel `i` on a face of `size` texels.
pub fn texel_center(i: u32, size: u32) -> f32 {
    2.0 * (i as f32 + 0.5) / size as f32 - 1.0
}

/// Solid angle subtended by texel (x, y) on a face of `size` texels.
pub fn texel_solid_angle(x: u32, y: u32, size: u32) -> f32 {
    let inv = 1.0 / size as f32;
    let x0 = 2.0 * x as f32 * inv - 1.0;
    let y0 = 2.0 * y as f32 * inv - 1.0;
    let x1 = x0 + 2.0 * inv;
    let y1 = y0 + 2.0 * inv;
    area_element(x0, y0) - area_element(x0, y1) - area_element(x1, y0) + area_element(x1, y1)
}

fn area_element(x: f32, y: f32) -> f32 {
    (x * y).atan2((x * x + y * y + 1.0).sqrt())
}

/// One mip level of a cube map: six square faces of RGB texels, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct CubeLevel {
    size: u32,
    faces: [Vec<Vec3>; 6],
}

impl CubeLevel {
    /// Fill a level by evaluating `f` at the centre of every texel.
    pub fn from_fn(size: u32, mut f: impl FnMut(CubeFace, u32, u32, Vec3) -> Vec3) -> Self {
        let faces = CubeFace::ALL.map(|face| {
            let mut texels = Vec::with_capacity((size * size) as usize);
            for y in 0..size {
                for x in 0..size {
                    let dir = face.direction(texel_center(x, size), texel_center(y, size));
                    texels.push(f(face, x, y, dir));
                }
            }
            texels
        });
        Self { size, faces }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn face(&self, face: CubeFace) -> &[Vec3] {
        &self.faces[face.layer()]
    }

    pub fn texel(&self, face: CubeFace, x: u32, y: u32) -> Vec3 {
        self.faces[face.layer()][(y * self.size + x) as usize]
    }

    /// Nearest-texel lookup along `direction`.
    pub fn sample(&self, direction: Vec3) -> Vec3 {
        let (face, u, v) = CubeFace::locate(direction);
        let to_texel = |c: f32| (((c + 1.0) * 0.5 * self.size as f32) as u32).min(self.size - 1);
        self.texel(face, to_texel(u), to_texel(v))
    }

    /// Next coarser level by 2x2 box filtering. A 1x1 level is returned as-is.
    pub fn downsample(&self) -> CubeLevel {
        if self.size <= 1 {
            return self.clone();
        }
        let half = self.size / 2;
        let faces = CubeFace::ALL.map(|face| {
            let mut texels = Vec::with_capacity((half * half) as usize);
            for y in 0..half {
                for x in 0..half {
                    let sum = self.texel(face, 2 * x, 2 * y)
                        + self.texel(face, 2 * x + 1, 2 * y)
                        + self.texel(face, 2 * x, 2 * y + 1)
                        + self.texel(face, 2 * x + 1, 2 * y + 1);
                    texels.push(sum * 0.25);
                }
            }
            texels
        });
        CubeLevel { size: half, faces }
    }

    /// Texel data as RGBA f32, faces in layer order.
    pub fn to_rgba_f32(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.faces.iter().map(Vec::len).sum::<usize>() * 4);
        for face in &self.faces {
            for t in face {
                out.extend_from_slice(&[t.x, t.y, t.z, 1.0]);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn solid_angles_cover_the_sphere() {
        for size in [1, 4, 16] {
            let mut total = 0.0;
            for _ in CubeFace::ALL {
                for y in 0..size {
                    for x in 0..size {
                        total += texel_solid_angle(x, y, size);
                    }
                }
            }
            assert!((total - 4.0 * PI).abs() < 1e-3, "size={size} total={total}");
        }
    }

    #[test]
    fn face_centres_point_along_axes() {
        assert_eq!(CubeFace::PositiveX.direction(0.0, 0.0), Vec3::X);
        assert_eq!(CubeFace::NegativeX.direction(0.0, 0.0), -Vec3::X);
        assert_eq!(CubeFace::PositiveY.direction(0.0, 0.0), Vec3::Y);
        assert_eq!(CubeFace::NegativeY.direction(0.0, 0.0), -Vec3::Y);
        assert_eq!(CubeFace::PositiveZ.direction(0.0, 0.0), Vec3::Z);
        assert_eq!(CubeFace::NegativeZ.direction(0.0, 0.0), -Vec3::Z);
    }

    #[test]
    fn locate_inverts_direction() {
        for face in CubeFace::ALL {
            for (u, v) in [(-0.5, 0.25), (0.7, -0.9), (0.0, 0.0)] {
                let (f, lu, lv) = CubeFace::locate(face.direction(u, v));
                assert_eq!(f, face);
                assert!((lu - u).abs() < 1e-5 && (lv - v).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn downsample_halves_and_averages() {
        let level = CubeLevel::from_fn(4, |_, x, _, _| Vec3::splat(x as f32));
        let half = level.downsample();
        assert_eq!(half.size(), 2);
        assert_eq!(half.texel(CubeFace::PositiveZ, 0, 0), Vec3::splat(0.5));
        assert_eq!(half.texel(CubeFace::PositiveZ, 1, 1), Vec3::splat(2.5));
        assert_eq!(half.downsample().downsample().size(), 1);
    }

    #[test]
    fn sample_reads_the_hit_face() {
        let level = CubeLevel::from_fn(2, |face, _, _, _| Vec3::splat(face.layer() as f32));
        assert_eq!(level.sample(Vec3::new(0.1, 0.9, 0.2)), Vec3::splat(2.0));
        assert_eq!(level.sample(Vec3::new(0.0, 0.0, -1.0)), Vec3::splat(5.0));
    }
}
