use glam::Vec3;
use seascape_kernel::{NodeKind, Scene, SeascapeConfig};
use std::fmt::Write;

/// Camera/view configuration for rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderView {
    /// Camera position in world space.
    pub eye: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Tone mapping exposure.
    pub exposure: f32,
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            eye: Vec3::new(30.0, 30.0, 100.0),
            target: Vec3::new(0.0, 10.0, 0.0),
            fov_degrees: 55.0,
            exposure: 0.5,
        }
    }
}

impl RenderView {
    /// The configured starting camera and exposure.
    pub fn from_config(config: &SeascapeConfig) -> Self {
        Self {
            eye: config.camera.position,
            target: config.camera.target,
            fov_degrees: config.camera.fov_y_deg,
            exposure: config.renderer.exposure,
        }
    }
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads the scene and a view, then produces output. It never
/// mutates the scene; the kernel owns it.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given scene and view.
    fn render(&self, scene: &Scene, view: &RenderView) -> Self::Output;
}

/// Human-readable dump of what a frame would draw. Used by the CLI and tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &Scene, view: &RenderView) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Seascape (nodes={}) ===", scene.node_count());
        let _ = writeln!(
            out,
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0} exposure={:.2}",
            view.eye.x,
            view.eye.y,
            view.eye.z,
            view.target.x,
            view.target.y,
            view.target.z,
            view.fov_degrees,
            view.exposure
        );
        match scene.environment() {
            Some(map) => {
                let _ = writeln!(
                    out,
                    "Environment: generation={} face={} levels={}",
                    map.generation(),
                    map.face_size(),
                    map.levels().len()
                );
            }
            None => out.push_str("Environment: none\n"),
        }

        for (id, node) in scene.nodes() {
            let _ = write!(out, "  [{id}] {} ({})", node.name, node.kind.label());
            match &node.kind {
                NodeKind::Sky(sky) => {
                    let s = sky.sun_position();
                    let _ = write!(
                        out,
                        " sun=({:.3}, {:.3}, {:.3}) turbidity={:.1}",
                        s.x, s.y, s.z, sky.params.turbidity
                    );
                }
                NodeKind::Water(water) => {
                    let s = water.sun_direction();
                    let _ = write!(
                        out,
                        " sun=({:.3}, {:.3}, {:.3}) time={:.2} distortion={:.1} size={:.1}",
                        s.x,
                        s.y,
                        s.z,
                        water.time(),
                        water.params.distortion_scale,
                        water.params.size
                    );
                }
                NodeKind::Model(model) => {
                    let _ = write!(
                        out,
                        " nodes={} triangles={}",
                        model.node_count(),
                        model.triangle_count()
                    );
                }
            }
            out.push('\n');
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seascape_environment::{Sky, SkyParameters, WaterParameters, WaterSurface};
    use seascape_kernel::Node;

    #[test]
    fn debug_renderer_empty_scene() {
        let scene = Scene::new();
        let output = DebugTextRenderer::new().render(&scene, &RenderView::default());
        assert!(output.contains("nodes=0"));
        assert!(output.contains("Environment: none"));
    }

    #[test]
    fn debug_renderer_lists_nodes() {
        let mut scene = Scene::new();
        let mut sky = Sky::new(SkyParameters::default());
        sky.set_sun_position(Vec3::new(0.0, 0.0, -1.0));
        scene.add(Node::new("sky", NodeKind::Sky(sky)));
        scene.add(Node::new(
            "water",
            NodeKind::Water(WaterSurface::new(WaterParameters::default())),
        ));

        let output = DebugTextRenderer::new().render(&scene, &RenderView::default());
        assert!(output.contains("nodes=2"));
        assert!(output.contains("[#1] sky (sky) sun=(0.000, 0.000, -1.000)"));
        assert!(output.contains("distortion=3.7"));
    }

    #[test]
    fn render_view_default_matches_camera_start() {
        let view = RenderView::default();
        assert_eq!(view.fov_degrees, 55.0);
        assert_eq!(view.target, Vec3::new(0.0, 10.0, 0.0));
        assert_eq!(RenderView::from_config(&SeascapeConfig::default()), view);
    }
}
