use crate::renderer::{RenderView, Renderer};
use crate::tonemap;
use glam::{Mat4, Vec3};
use image::RgbImage;
use seascape_environment::{LightingMap, RadianceSource, WaterSurface};
use seascape_kernel::{NodeKind, Scene};

/// How the preview maps pixels to view rays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Projection {
    /// Pinhole camera from the render view.
    #[default]
    Perspective,
    /// Full equirectangular panorama around the eye.
    Panorama,
}

/// CPU renderer of the sky dome and a flat water plane, tone mapped the way
/// the GPU passes are. Models are not drawn.
#[derive(Debug, Clone)]
pub struct SkyPreviewRenderer {
    pub width: u32,
    pub height: u32,
    pub projection: Projection,
}

impl SkyPreviewRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            projection: Projection::default(),
        }
    }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    fn ray(&self, view: &RenderView, inv_view: Mat4, x: u32, y: u32) -> Vec3 {
        let u = (x as f32 + 0.5) / self.width as f32;
        let v = (y as f32 + 0.5) / self.height as f32;
        match self.projection {
            Projection::Perspective => {
                let aspect = self.width as f32 / self.height as f32;
                let t = (view.fov_degrees.to_radians() * 0.5).tan();
                let cam = Vec3::new((2.0 * u - 1.0) * t * aspect, (1.0 - 2.0 * v) * t, -1.0);
                inv_view.transform_vector3(cam).normalize()
            }
            Projection::Panorama => {
                let theta = (u * 2.0 - 1.0) * std::f32::consts::PI;
                let phi = (0.5 - v) * std::f32::consts::PI;
                Vec3::new(phi.cos() * theta.sin(), phi.sin(), phi.cos() * theta.cos())
            }
        }
    }
}

impl Renderer for SkyPreviewRenderer {
    type Output = RgbImage;

    fn render(&self, scene: &Scene, view: &RenderView) -> RgbImage {
        let _span = tracing::debug_span!(
            "sky_preview",
            width = self.width,
            height = self.height,
            projection = ?self.projection
        )
        .entered();
        let inv_view = Mat4::look_at_rh(view.eye, view.target, Vec3::Y).inverse();
        let water = scene.nodes().values().find_map(|n| match &n.kind {
            NodeKind::Water(w) => Some(w),
            _ => None,
        });
        let environment = scene.environment();

        RgbImage::from_fn(self.width, self.height, |x, y| {
            let dir = self.ray(view, inv_view, x, y);
            let radiance = match water {
                Some(w) if dir.y < 0.0 && view.eye.y > 0.0 => {
                    let t = -view.eye.y / dir.y;
                    let hit = view.eye + dir * t;
                    if hit.x.abs() <= w.params.extent * 0.5 && hit.z.abs() <= w.params.extent * 0.5 {
                        shade_water(w, environment, scene, -dir, t)
                    } else {
                        scene.radiance(dir)
                    }
                }
                _ => scene.radiance(dir),
            };
            image::Rgb(tonemap::to_srgb8(radiance, view.exposure))
        })
    }
}

/// Water response for a flat surface: sun specular and diffuse, scatter and
/// a Schlick-weighted reflection from the lighting map.
fn shade_water(
    water: &WaterSurface,
    environment: Option<&LightingMap>,
    scene: &Scene,
    eye_dir: Vec3,
    distance: f32,
) -> Vec3 {
    let normal = Vec3::Y;
    let p = &water.params;
    let sun = water.sun_direction();

    let sun_reflect = reflect(-sun, normal).normalize_or_zero();
    let specular = eye_dir.dot(sun_reflect).max(0.0).powf(100.0) * p.sun_color * 2.0;
    let diffuse = sun.dot(normal).max(0.0) * p.sun_color * 0.5;

    let reflect_dir = reflect(-eye_dir, normal);
    let reflection = match environment {
        Some(map) => map.sample_radiance(reflect_dir, 0.0),
        None => scene.radiance(reflect_dir),
    };

    let theta = eye_dir.dot(normal).max(0.0);
    let r0 = 0.3;
    let reflectance = r0 + (1.0 - r0) * (1.0 - theta).powi(5);
    let scatter = theta * p.water_color;

    let base = p.sun_color * diffuse * 0.3 + scatter;
    let mirror = Vec3::splat(0.1) + reflection * 0.9 + reflection * specular;
    let albedo = base.lerp(mirror, reflectance);
    let along = Vec3::new(-eye_dir.x, 0.0, -eye_dir.z).normalize_or_zero();
    if p.fog && along != Vec3::ZERO {
        // Distance haze towards the horizon colour.
        let f = 1.0 - (-distance * 1.0e-4).exp();
        albedo.lerp(scene.radiance(along), f)
    } else {
        albedo
    }
}

fn reflect(d: Vec3, n: Vec3) -> Vec3 {
    d - 2.0 * d.dot(n) * n
}
