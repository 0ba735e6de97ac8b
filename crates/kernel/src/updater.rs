use crate::scene::{Node, NodeKind, Scene};
use seascape_common::NodeId;
use seascape_environment::{
    CpuPrefilter, EnvironmentPrefilter, PrefilterError, PrefilterStats, SunDirection,
};

/// Errors from environment updates.
#[derive(Debug, thiserror::Error)]
pub enum EnvironmentError {
    #[error("sky node {0} is missing")]
    MissingSky(NodeId),
    #[error("water node {0} is missing")]
    MissingWater(NodeId),
    #[error("lighting map prefilter failed: {0}")]
    Prefilter(#[from] PrefilterError),
}

/// Keeps the sky, the water and the ambient lighting map in step with one
/// sun direction.
///
/// The new lighting map is built from a capture scene before anything is
/// written, so a failed prefilter leaves the previous consistent state in
/// place.
#[derive(Debug)]
pub struct EnvironmentUpdater<P: EnvironmentPrefilter = CpuPrefilter> {
    prefilter: P,
    sky: NodeId,
    water: NodeId,
    current: Option<SunDirection>,
}

impl<P: EnvironmentPrefilter> EnvironmentUpdater<P> {
    pub fn new(prefilter: P, sky: NodeId, water: NodeId) -> Self {
        Self {
            prefilter,
            sky,
            water,
            current: None,
        }
    }

    /// The last committed sun direction.
    pub fn sun(&self) -> Option<SunDirection> {
        self.current
    }

    pub fn prefilter(&self) -> &P {
        &self.prefilter
    }

    /// Recompute the sun direction from angles in degrees and update the sky,
    /// the water and the lighting map together.
    pub fn update_sun_direction(
        &mut self,
        scene: &mut Scene,
        elevation_deg: f32,
        azimuth_deg: f32,
    ) -> Result<SunDirection, EnvironmentError> {
        let sun = SunDirection::from_angles(elevation_deg, azimuth_deg);
        let sun_vector = sun.vector();

        if scene.water(self.water).is_none() {
            return Err(EnvironmentError::MissingWater(self.water));
        }
        let mut dome = scene
            .sky(self.sky)
            .ok_or(EnvironmentError::MissingSky(self.sky))?
            .lighting_copy();
        dome.set_sun_position(sun_vector);

        let mut capture = Scene::new();
        capture.add(Node::new("sky-capture", NodeKind::Sky(dome)));
        let map = match self.prefilter.prefilter(&capture) {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(
                    elevation_deg,
                    azimuth_deg,
                    "keeping previous environment: {e}"
                );
                return Err(e.into());
            }
        };
        let generation = map.generation();

        // Both lookups succeeded above and nothing has touched the scene since.
        if let Some(sky) = scene.sky_mut(self.sky) {
            sky.set_sun_position(sun_vector);
        }
        if let Some(water) = scene.water_mut(self.water) {
            water.set_sun_direction(sun_vector);
        }
        if let Some(old) = scene.replace_environment(map) {
            self.prefilter.release(old);
        }
        self.current = Some(sun);

        tracing::debug!(
            elevation_deg,
            azimuth_deg,
            sun = ?sun_vector,
            generation,
            "environment updated"
        );
        Ok(sun)
    }

    /// Detach the installed lighting map from `scene` and release it.
    pub fn release_environment(&mut self, scene: &mut Scene) {
        if let Some(map) = scene.take_environment() {
            self.prefilter.release(map);
        }
    }
}

impl EnvironmentUpdater<CpuPrefilter> {
    pub fn stats(&self) -> PrefilterStats {
        self.prefilter.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seascape_environment::cubemap::texel_center;
    use seascape_environment::{
        CubeFace, LightingMap, RadianceSource, Sky, SkyParameters, WaterParameters, WaterSurface,
    };

    fn scene_with_sky_and_water() -> (Scene, NodeId, NodeId) {
        let mut scene = Scene::new();
        let sky = scene.add(Node::new(
            "sky",
            NodeKind::Sky(Sky::new(SkyParameters::default())),
        ));
        let water = scene.add(Node::new(
            "water",
            NodeKind::Water(WaterSurface::new(WaterParameters::default())),
        ));
        (scene, sky, water)
    }

    fn updater(sky: NodeId, water: NodeId) -> EnvironmentUpdater {
        EnvironmentUpdater::new(CpuPrefilter::new(8), sky, water)
    }

    #[test]
    fn sky_water_and_map_agree_after_update() {
        let (mut scene, sky, water) = scene_with_sky_and_water();
        let mut up = updater(sky, water);
        for (el, az) in [(2.0, 180.0), (45.0, -90.0), (90.0, 0.0), (0.0, 33.3)] {
            let sun = up.update_sun_direction(&mut scene, el, az).unwrap();
            let sky_sun = scene.sky(sky).unwrap().sun_position();
            let water_sun = scene.water(water).unwrap().sun_direction();
            assert_eq!(sky_sun, sun.vector());
            assert!((water_sun - sky_sun.normalize()).length() < 1e-6);

            // The installed map was captured from a sky with this sun.
            let map = scene.environment().unwrap();
            let base = &map.levels()[0];
            let c = texel_center(1, base.size());
            let dir = CubeFace::PositiveZ.direction(c, c);
            let expected = scene.sky(sky).unwrap().radiance(dir);
            assert_eq!(base.texel(CubeFace::PositiveZ, 1, 1), expected);
        }
    }

    #[test]
    fn each_update_releases_exactly_one_old_map() {
        let (mut scene, sky, water) = scene_with_sky_and_water();
        let mut up = updater(sky, water);
        up.update_sun_direction(&mut scene, 2.0, 180.0).unwrap();
        assert_eq!(up.stats().generated, 1);
        assert_eq!(up.stats().released, 0);
        for i in 1..=5 {
            up.update_sun_direction(&mut scene, 10.0 * i as f32, 0.0)
                .unwrap();
            assert_eq!(up.stats().generated, 1 + i);
            assert_eq!(up.stats().released, i);
            assert_eq!(up.stats().live(), 1);
        }
        up.release_environment(&mut scene);
        assert_eq!(up.stats().live(), 0);
        assert!(scene.environment().is_none());
    }

    #[test]
    fn identical_calls_give_identical_state_and_a_new_map() {
        let (mut scene, sky, water) = scene_with_sky_and_water();
        let mut up = updater(sky, water);
        let a = up.update_sun_direction(&mut scene, 30.0, 60.0).unwrap();
        let first_gen = scene.environment().map(LightingMap::generation);
        let sky_a = scene.sky(sky).unwrap().clone();
        let water_a = scene.water(water).unwrap().sun_direction();

        let b = up.update_sun_direction(&mut scene, 30.0, 60.0).unwrap();
        assert_eq!(a, b);
        assert_eq!(scene.sky(sky).unwrap(), &sky_a);
        assert_eq!(scene.water(water).unwrap().sun_direction(), water_a);
        let second_gen = scene.environment().map(LightingMap::generation);
        assert!(second_gen > first_gen);
    }

    #[test]
    fn failed_prefilter_keeps_previous_state() {
        let (mut scene, sky, water) = scene_with_sky_and_water();
        let mut good = updater(sky, water);
        good.update_sun_direction(&mut scene, 20.0, 10.0).unwrap();
        let generation = scene.environment().map(LightingMap::generation);
        let sky_sun = scene.sky(sky).unwrap().sun_position();

        let mut broken = EnvironmentUpdater::new(CpuPrefilter::new(3), sky, water);
        let err = broken
            .update_sun_direction(&mut scene, 70.0, 120.0)
            .unwrap_err();
        assert!(matches!(err, EnvironmentError::Prefilter(_)));
        assert_eq!(scene.sky(sky).unwrap().sun_position(), sky_sun);
        assert_eq!(scene.water(water).unwrap().sun_direction(), sky_sun.normalize());
        assert_eq!(scene.environment().map(LightingMap::generation), generation);
        assert!(broken.sun().is_none());
    }

    #[test]
    fn missing_nodes_are_reported() {
        let (mut scene, sky, water) = scene_with_sky_and_water();
        scene.remove(sky);
        let mut up = updater(sky, water);
        assert!(matches!(
            up.update_sun_direction(&mut scene, 10.0, 0.0),
            Err(EnvironmentError::MissingSky(_))
        ));
        scene.remove(water);
        assert!(matches!(
            up.update_sun_direction(&mut scene, 10.0, 0.0),
            Err(EnvironmentError::MissingWater(_))
        ));
        assert_eq!(up.stats().generated, 0);
    }
}
