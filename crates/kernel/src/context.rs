use crate::config::SeascapeConfig;
use crate::scene::{Node, NodeKind, Scene};
use crate::updater::{EnvironmentError, EnvironmentUpdater};
use seascape_assets::{AssetError, AssetLoader, ModelAsset, PendingLoad};
use seascape_common::NodeId;
use seascape_environment::{
    CpuPrefilter, EnvironmentPrefilter, Sky, SunDirection, WaterSurface,
};
use seascape_input::Action;
use std::path::PathBuf;

/// Where the island model is in its one-shot load.
#[derive(Debug, Default)]
pub enum IslandSlot {
    #[default]
    Absent,
    Loading(PendingLoad),
    Attached(NodeId),
    Failed(String),
}

impl IslandSlot {
    pub fn label(&self) -> &'static str {
        match self {
            IslandSlot::Absent => "absent",
            IslandSlot::Loading(_) => "loading",
            IslandSlot::Attached(_) => "attached",
            IslandSlot::Failed(_) => "failed",
        }
    }
}

/// Application state shared by the desktop app and the CLI: the scene, the
/// environment updater and the current control values.
///
/// Dropping the context releases the installed lighting map.
#[derive(Debug)]
pub struct SeascapeContext<P: EnvironmentPrefilter = CpuPrefilter> {
    scene: Scene,
    updater: EnvironmentUpdater<P>,
    config: SeascapeConfig,
    sky: NodeId,
    water: NodeId,
    island: IslandSlot,
    elevation: f32,
    azimuth: f32,
}

impl SeascapeContext<CpuPrefilter> {
    /// Context with a CPU prefilter sized from the config.
    pub fn from_config(config: SeascapeConfig) -> Result<Self, EnvironmentError> {
        let prefilter = CpuPrefilter::new(config.lighting.cube_size);
        Self::new(config, prefilter)
    }
}

impl<P: EnvironmentPrefilter> SeascapeContext<P> {
    /// Build the sky and water nodes and run the first environment update
    /// with the configured sun angles.
    pub fn new(config: SeascapeConfig, prefilter: P) -> Result<Self, EnvironmentError> {
        let mut scene = Scene::new();
        let sky = scene.add(Node::new("sky", NodeKind::Sky(Sky::new(config.sky))));
        let water = scene.add(Node::new(
            "water",
            NodeKind::Water(WaterSurface::new(config.water)),
        ));
        let mut updater = EnvironmentUpdater::new(prefilter, sky, water);
        let (elevation, azimuth) = (config.sun.elevation, config.sun.azimuth);
        updater.update_sun_direction(&mut scene, elevation, azimuth)?;
        tracing::info!(elevation, azimuth, "seascape context ready");

        Ok(Self {
            scene,
            updater,
            config,
            sky,
            water,
            island: IslandSlot::Absent,
            elevation,
            azimuth,
        })
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn config(&self) -> &SeascapeConfig {
        &self.config
    }

    pub fn updater(&self) -> &EnvironmentUpdater<P> {
        &self.updater
    }

    pub fn sky_id(&self) -> NodeId {
        self.sky
    }

    pub fn water_id(&self) -> NodeId {
        self.water
    }

    pub fn island(&self) -> &IslandSlot {
        &self.island
    }

    /// Current slider values: elevation and azimuth in degrees.
    pub fn sun_angles(&self) -> (f32, f32) {
        (self.elevation, self.azimuth)
    }

    pub fn sun(&self) -> Option<SunDirection> {
        self.updater.sun()
    }

    pub fn water(&self) -> Option<&WaterSurface> {
        self.scene.water(self.water)
    }

    /// Start loading the configured island model, if any.
    pub fn load_configured_assets(&mut self) {
        if let Some(path) = self.config.assets.island.clone() {
            self.load_island(path);
        }
    }

    /// Start loading an island model in the background. A model that is
    /// already attached or loading is kept.
    pub fn load_island(&mut self, path: impl Into<PathBuf>) {
        match self.island {
            IslandSlot::Absent | IslandSlot::Failed(_) => {
                self.island = IslandSlot::Loading(AssetLoader::spawn(path));
            }
            IslandSlot::Loading(_) | IslandSlot::Attached(_) => {
                tracing::debug!(state = self.island.label(), "island load ignored");
            }
        }
    }

    /// Apply a control change. Sun angle failures keep the previous angles.
    pub fn apply(&mut self, action: Action) -> Result<(), EnvironmentError> {
        match action.clamped() {
            Action::SetElevation(v) => self.set_sun(v, self.azimuth),
            Action::SetAzimuth(v) => self.set_sun(self.elevation, v),
            Action::SetDistortionScale(v) => {
                let water = self
                    .scene
                    .water_mut(self.water)
                    .ok_or(EnvironmentError::MissingWater(self.water))?;
                water.set_distortion_scale(v);
                Ok(())
            }
            Action::SetWaterSize(v) => {
                let water = self
                    .scene
                    .water_mut(self.water)
                    .ok_or(EnvironmentError::MissingWater(self.water))?;
                water.set_size(v);
                Ok(())
            }
        }
    }

    fn set_sun(&mut self, elevation: f32, azimuth: f32) -> Result<(), EnvironmentError> {
        self.updater
            .update_sun_direction(&mut self.scene, elevation, azimuth)?;
        self.elevation = elevation;
        self.azimuth = azimuth;
        Ok(())
    }

    /// Per-frame state: water time from the frame clock, then the pending
    /// asset load. Scene events recorded since the previous tick are logged
    /// and cleared.
    pub fn frame_tick(&mut self, elapsed_secs: f32) {
        if let Some(water) = self.scene.water_mut(self.water) {
            water.set_time(elapsed_secs);
        }
        self.poll_assets();
        for event in self.scene.drain_events() {
            tracing::debug!(?event, "scene event");
        }
    }

    /// Attach the island if its load finished. Returns true when the slot
    /// changed.
    pub fn poll_assets(&mut self) -> bool {
        let result = match &self.island {
            IslandSlot::Loading(pending) => match pending.poll() {
                Some(result) => result,
                None => return false,
            },
            _ => return false,
        };
        self.settle_island(result);
        true
    }

    /// Block until a pending island load finishes.
    pub fn finish_loading(&mut self) {
        let IslandSlot::Loading(_) = self.island else {
            return;
        };
        if let IslandSlot::Loading(pending) = std::mem::take(&mut self.island) {
            let result = pending.wait();
            self.settle_island(result);
        }
    }

    fn settle_island(&mut self, result: Result<ModelAsset, AssetError>) {
        self.island = match result {
            Ok(model) => {
                tracing::info!(
                    name = %model.name,
                    nodes = model.node_count(),
                    triangles = model.triangle_count(),
                    "island attached"
                );
                let name = model.name.clone();
                IslandSlot::Attached(self.scene.add(Node::new(name, NodeKind::Model(model))))
            }
            Err(e) => {
                tracing::error!("island load failed, continuing without it: {e}");
                IslandSlot::Failed(e.to_string())
            }
        };
    }
}

impl<P: EnvironmentPrefilter> Drop for SeascapeContext<P> {
    fn drop(&mut self) {
        self.updater.release_environment(&mut self.scene);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seascape_environment::{LightingMap, PrefilterStats};

    fn small_config() -> SeascapeConfig {
        let mut config = SeascapeConfig::default();
        config.lighting.cube_size = 8;
        config.assets.island = None;
        config
    }

    fn context() -> SeascapeContext {
        SeascapeContext::from_config(small_config()).unwrap()
    }

    /// Write `island.gltf` with an external triangle buffer into `dir`.
    fn write_island(dir: &std::path::Path) -> PathBuf {
        let bin: Vec<u8> = [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, -1.0]
            .iter()
            .flat_map(|c| c.to_le_bytes())
            .collect();
        std::fs::write(dir.join("island.bin"), bin).unwrap();
        let path = dir.join("island.gltf");
        std::fs::write(
            &path,
            r#"{
                "asset": {"version": "2.0"},
                "scenes": [{"nodes": [0]}],
                "nodes": [{"name": "Island", "mesh": 0}],
                "meshes": [{"primitives": [{"attributes": {"POSITION": 0}}]}],
                "accessors": [{"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                               "min": [0, 0, -1], "max": [1, 0, 0]}],
                "bufferViews": [{"buffer": 0, "byteLength": 36}],
                "buffers": [{"uri": "island.bin", "byteLength": 36}]
            }"#,
        )
        .unwrap();
        path
    }

    #[test]
    fn startup_default_faces_minus_z_near_horizon() {
        let ctx = context();
        let sun = ctx.sun().unwrap();
        assert!(sun.vector().y.abs() < 0.05);
        assert!(sun.vector().z < -0.99);
        assert!(ctx.scene().environment().is_some());
        assert_eq!(ctx.scene().node_count(), 2);
        assert_eq!(ctx.sun_angles(), (2.0, 180.0));
    }

    #[test]
    fn sun_actions_keep_sky_and_water_in_step() {
        let mut ctx = context();
        ctx.apply(Action::SetElevation(45.0)).unwrap();
        ctx.apply(Action::SetAzimuth(-90.0)).unwrap();
        let expected = SunDirection::from_angles(45.0, -90.0).vector();
        let sky = ctx.scene().sky(ctx.sky_id()).unwrap().sun_position();
        assert_eq!(sky, expected);
        assert!((ctx.water().unwrap().sun_direction() - expected.normalize()).length() < 1e-6);
        assert_eq!(
            ctx.updater().stats(),
            PrefilterStats {
                generated: 3,
                released: 2
            }
        );
    }

    #[test]
    fn out_of_range_actions_are_clamped() {
        let mut ctx = context();
        ctx.apply(Action::SetElevation(150.0)).unwrap();
        assert_eq!(ctx.sun_angles().0, 90.0);
        ctx.apply(Action::SetDistortionScale(20.0)).unwrap();
        assert_eq!(ctx.water().unwrap().params.distortion_scale, 8.0);
        ctx.apply(Action::SetWaterSize(2.5)).unwrap();
        assert_eq!(ctx.water().unwrap().params.size, 2.5);
    }

    #[test]
    fn water_actions_leave_lighting_alone() {
        let mut ctx = context();
        let generation = ctx.scene().environment().map(LightingMap::generation);
        ctx.apply(Action::SetWaterSize(3.0)).unwrap();
        assert_eq!(
            ctx.scene().environment().map(LightingMap::generation),
            generation
        );
    }

    #[test]
    fn frame_tick_drives_water_time() {
        let mut ctx = context();
        ctx.frame_tick(1.25);
        assert_eq!(ctx.water().unwrap().time(), 1.25);
    }

    #[test]
    fn invalid_island_path_leaves_scene_unchanged() {
        let mut ctx = context();
        ctx.load_island("no/such/island.glb");
        assert_eq!(ctx.island().label(), "loading");
        ctx.finish_loading();
        assert!(matches!(ctx.island(), IslandSlot::Failed(_)));
        assert_eq!(ctx.scene().node_count(), 2);
        assert!(ctx.scene().models().next().is_none());
        ctx.frame_tick(0.5);
        assert_eq!(ctx.scene().node_count(), 2);
    }

    #[test]
    fn island_is_attached_when_polled() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_island(dir.path());

        let mut ctx = context();
        ctx.load_island(&path);
        while !ctx.poll_assets() {
            std::thread::yield_now();
        }
        let IslandSlot::Attached(id) = *ctx.island() else {
            panic!("island not attached: {:?}", ctx.island());
        };
        assert_eq!(ctx.scene().node_count(), 3);
        assert!(matches!(
            ctx.scene().get(id).map(|n| &n.kind),
            Some(NodeKind::Model(_))
        ));
        // A second request keeps the attached model.
        ctx.load_island(&path);
        assert!(matches!(ctx.island(), IslandSlot::Attached(_)));
    }

    #[test]
    fn repeated_finish_keeps_a_single_island() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_island(dir.path());

        let mut ctx = context();
        ctx.load_island(&path);
        ctx.finish_loading();
        assert_eq!(ctx.island().label(), "attached");
        ctx.finish_loading();
        assert_eq!(ctx.island().label(), "attached");

        ctx.load_island(&path);
        ctx.finish_loading();
        assert_eq!(ctx.island().label(), "attached");
        assert_eq!(ctx.scene().node_count(), 3);
        assert_eq!(ctx.scene().models().count(), 1);
    }

    #[test]
    fn finish_without_a_load_is_a_no_op() {
        let mut ctx = context();
        ctx.load_island("no/such/island.glb");
        ctx.finish_loading();
        ctx.finish_loading();
        assert!(matches!(ctx.island(), IslandSlot::Failed(_)));
    }

    #[test]
    fn frame_tick_clears_recorded_scene_events() {
        let mut ctx = context();
        for i in 0..1000 {
            ctx.apply(Action::SetAzimuth((i % 360) as f32 - 180.0)).unwrap();
        }
        assert!(ctx.scene().events().len() > 1000);
        ctx.frame_tick(0.1);
        assert!(ctx.scene().events().is_empty());
        ctx.apply(Action::SetElevation(30.0)).unwrap();
        assert_eq!(ctx.scene().events().len(), 1);
    }
}
