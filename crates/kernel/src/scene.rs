use glam::Vec3;
use seascape_assets::ModelAsset;
use seascape_common::{NodeId, Transform};
use seascape_environment::{LightingMap, RadianceSource, Sky, WaterSurface};
use std::collections::BTreeMap;

/// A record produced by every structural change to the scene.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    Added { id: NodeId, name: String },
    Removed { id: NodeId, name: String },
    /// A new lighting map was installed, replacing `previous` if any.
    EnvironmentReplaced { generation: u64, previous: Option<u64> },
}

/// What a node draws.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Sky(Sky),
    Water(WaterSurface),
    Model(ModelAsset),
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Sky(_) => "sky",
            NodeKind::Water(_) => "water",
            NodeKind::Model(_) => "model",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub transform: Transform,
    pub kind: NodeKind,
}

impl Node {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            transform: Transform::default(),
            kind,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

/// The scene graph container: top-level nodes plus the ambient lighting map.
///
/// BTreeMap keeps iteration (and so draw order) stable: nodes are drawn in
/// the order they were added.
#[derive(Debug, Default)]
pub struct Scene {
    nodes: BTreeMap<NodeId, Node>,
    next_id: u64,
    environment: Option<LightingMap>,
    event_log: Vec<SceneEvent>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Add a node. Returns its id.
    pub fn add(&mut self, node: Node) -> NodeId {
        self.next_id += 1;
        let id = NodeId(self.next_id);
        self.event_log.push(SceneEvent::Added {
            id,
            name: node.name.clone(),
        });
        self.nodes.insert(id, node);
        id
    }

    /// Remove a node. Returns it if it existed.
    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        let node = self.nodes.remove(&id);
        if let Some(ref n) = node {
            self.event_log.push(SceneEvent::Removed {
                id,
                name: n.name.clone(),
            });
        }
        node
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn nodes(&self) -> &BTreeMap<NodeId, Node> {
        &self.nodes
    }

    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, n)| n.name == name)
            .map(|(id, _)| *id)
    }

    pub fn sky(&self, id: NodeId) -> Option<&Sky> {
        match self.nodes.get(&id).map(|n| &n.kind) {
            Some(NodeKind::Sky(sky)) => Some(sky),
            _ => None,
        }
    }

    pub fn sky_mut(&mut self, id: NodeId) -> Option<&mut Sky> {
        match self.nodes.get_mut(&id).map(|n| &mut n.kind) {
            Some(NodeKind::Sky(sky)) => Some(sky),
            _ => None,
        }
    }

    pub fn water(&self, id: NodeId) -> Option<&WaterSurface> {
        match self.nodes.get(&id).map(|n| &n.kind) {
            Some(NodeKind::Water(water)) => Some(water),
            _ => None,
        }
    }

    pub fn water_mut(&mut self, id: NodeId) -> Option<&mut WaterSurface> {
        match self.nodes.get_mut(&id).map(|n| &mut n.kind) {
            Some(NodeKind::Water(water)) => Some(water),
            _ => None,
        }
    }

    /// Model nodes in draw order.
    pub fn models(&self) -> impl Iterator<Item = (NodeId, &Node, &ModelAsset)> {
        self.nodes.iter().filter_map(|(id, n)| match &n.kind {
            NodeKind::Model(m) => Some((*id, n, m)),
            _ => None,
        })
    }

    /// The installed ambient lighting map.
    pub fn environment(&self) -> Option<&LightingMap> {
        self.environment.as_ref()
    }

    /// Install `map` as the ambient environment and hand back the previous
    /// one. The caller owns the returned map and must release it.
    #[must_use = "the previous lighting map must be released"]
    pub fn replace_environment(&mut self, map: LightingMap) -> Option<LightingMap> {
        let generation = map.generation();
        let previous = self.environment.replace(map);
        self.event_log.push(SceneEvent::EnvironmentReplaced {
            generation,
            previous: previous.as_ref().map(LightingMap::generation),
        });
        previous
    }

    /// Detach the lighting map, e.g. on shutdown.
    pub fn take_environment(&mut self) -> Option<LightingMap> {
        self.environment.take()
    }

    pub fn events(&self) -> &[SceneEvent] {
        &self.event_log
    }

    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.event_log)
    }
}

/// A scene lights itself with the sum of its sky domes. Water and models
/// neither emit nor occlude in a capture.
impl RadianceSource for Scene {
    fn radiance(&self, direction: Vec3) -> Vec3 {
        self.nodes
            .values()
            .filter_map(|n| match &n.kind {
                NodeKind::Sky(sky) => Some(sky.radiance(direction)),
                _ => None,
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seascape_environment::{
        CpuPrefilter, EnvironmentPrefilter, SkyParameters, WaterParameters,
    };

    fn sky_node() -> Node {
        Node::new("sky", NodeKind::Sky(Sky::new(SkyParameters::default())))
    }

    fn water_node() -> Node {
        Node::new(
            "water",
            NodeKind::Water(WaterSurface::new(WaterParameters::default())),
        )
    }

    #[test]
    fn scene_starts_empty() {
        let scene = Scene::new();
        assert_eq!(scene.node_count(), 0);
        assert!(scene.environment().is_none());
    }

    #[test]
    fn add_and_remove() {
        let mut scene = Scene::new();
        let sky = scene.add(sky_node());
        let water = scene.add(water_node());
        assert_ne!(sky, water);
        assert_eq!(scene.node_count(), 2);
        assert!(scene.sky(sky).is_some());
        assert!(scene.sky(water).is_none());
        assert!(scene.water(water).is_some());
        assert_eq!(scene.find_by_name("water"), Some(water));

        let removed = scene.remove(sky).unwrap();
        assert_eq!(removed.name, "sky");
        assert!(scene.remove(sky).is_none());
        assert_eq!(scene.node_count(), 1);
        assert_eq!(scene.events().len(), 3);
    }

    #[test]
    fn nodes_iterate_in_insertion_order() {
        let mut scene = Scene::new();
        let ids: Vec<NodeId> = (0..10).map(|_| scene.add(water_node())).collect();
        let keys: Vec<NodeId> = scene.nodes().keys().copied().collect();
        assert_eq!(keys, ids);
    }

    #[test]
    fn replace_environment_hands_back_previous() {
        let mut scene = Scene::new();
        scene.add(sky_node());
        let mut prefilter = CpuPrefilter::new(4);
        let first = prefilter.prefilter(&scene).unwrap();
        let second = prefilter.prefilter(&scene).unwrap();
        let (g1, g2) = (first.generation(), second.generation());

        assert!(scene.replace_environment(first).is_none());
        let old = scene.replace_environment(second).unwrap();
        assert_eq!(old.generation(), g1);
        assert_eq!(scene.environment().map(LightingMap::generation), Some(g2));
        assert_eq!(
            scene.events().last(),
            Some(&SceneEvent::EnvironmentReplaced {
                generation: g2,
                previous: Some(g1)
            })
        );
    }

    #[test]
    fn radiance_sums_sky_nodes_only() {
        let mut scene = Scene::new();
        assert_eq!(scene.radiance(Vec3::Y), Vec3::ZERO);
        scene.add(water_node());
        assert_eq!(scene.radiance(Vec3::Y), Vec3::ZERO);
        let sky = Sky::new(SkyParameters::default());
        scene.add(sky_node());
        assert_eq!(scene.radiance(Vec3::Y), sky.radiance(Vec3::Y));
    }
}
