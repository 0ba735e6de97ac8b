use seascape_common::NodeId;
use seascape_environment::{EnvironmentPrefilter, PrefilterStats};
use seascape_kernel::{IslandSlot, NodeKind, Scene, SeascapeContext};

/// Scene inspector for developer tooling.
///
/// Read-only queries against the scene and the application context, used by
/// the CLI and the desktop status panel.
pub struct SceneInspector;

impl SceneInspector {
    /// Produce a summary of the scene graph.
    pub fn summary(scene: &Scene) -> SceneSummary {
        let mut summary = SceneSummary {
            node_count: scene.node_count(),
            skies: 0,
            waters: 0,
            models: 0,
            environment_generation: scene.environment().map(|m| m.generation()),
            environment_face_size: scene.environment().map(|m| m.face_size()),
            pending_events: scene.events().len(),
        };
        for node in scene.nodes().values() {
            match node.kind {
                NodeKind::Sky(_) => summary.skies += 1,
                NodeKind::Water(_) => summary.waters += 1,
                NodeKind::Model(_) => summary.models += 1,
            }
        }
        summary
    }

    /// Sun, lighting and island state of a running context.
    pub fn status<P: EnvironmentPrefilter>(ctx: &SeascapeContext<P>) -> ContextStatus {
        let (elevation, azimuth) = ctx.sun_angles();
        let island = match ctx.island() {
            IslandSlot::Failed(reason) => format!("failed ({reason})"),
            IslandSlot::Attached(id) => format!("attached {id}"),
            other => other.label().to_string(),
        };
        ContextStatus {
            elevation,
            azimuth,
            sun: ctx.sun().map(|s| s.vector().to_array()),
            water_sun: ctx.water().map(|w| w.sun_direction().to_array()),
            environment_generation: ctx.scene().environment().map(|m| m.generation()),
            island,
            prefilter: None,
        }
    }

    /// [`SceneInspector::status`] plus the CPU prefilter's counters.
    pub fn status_with_stats(ctx: &SeascapeContext) -> ContextStatus {
        ContextStatus {
            prefilter: Some(ctx.updater().stats()),
            ..Self::status(ctx)
        }
    }

    /// Name, kind and transform of a single node.
    pub fn inspect_node(scene: &Scene, id: NodeId) -> Option<NodeInfo> {
        scene.get(id).map(|node| {
            let p = node.transform.position;
            let s = node.transform.scale;
            NodeInfo {
                id,
                name: node.name.clone(),
                kind: node.kind.label(),
                position: [p.x, p.y, p.z],
                scale: [s.x, s.y, s.z],
            }
        })
    }

    /// List all node ids in insertion order.
    pub fn list_nodes(scene: &Scene) -> Vec<NodeId> {
        scene.nodes().keys().copied().collect()
    }
}

/// Summary of scene state for the inspector.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSummary {
    pub node_count: usize,
    pub skies: usize,
    pub waters: usize,
    pub models: usize,
    pub environment_generation: Option<u64>,
    pub environment_face_size: Option<u32>,
    pub pending_events: usize,
}

impl std::fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scene: nodes={} (sky={} water={} model={}) pending_events={}",
            self.node_count, self.skies, self.waters, self.models, self.pending_events
        )?;
        match (self.environment_generation, self.environment_face_size) {
            (Some(g), Some(size)) => write!(f, " environment=gen {g} ({size}px)"),
            _ => write!(f, " environment=none"),
        }
    }
}

/// Context status shown in the debug panel and by `seascape-cli info`.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextStatus {
    pub elevation: f32,
    pub azimuth: f32,
    pub sun: Option<[f32; 3]>,
    pub water_sun: Option<[f32; 3]>,
    pub environment_generation: Option<u64>,
    pub island: String,
    pub prefilter: Option<PrefilterStats>,
}

impl ContextStatus {
    /// One entry per line, for panels that lay out their own rows.
    pub fn lines(&self) -> Vec<String> {
        let vec3 = |v: Option<[f32; 3]>| match v {
            Some([x, y, z]) => format!("({x:.3}, {y:.3}, {z:.3})"),
            None => "unset".to_string(),
        };
        let mut lines = vec![
            format!("sun angles: elevation={:.1} azimuth={:.1}", self.elevation, self.azimuth),
            format!("sun vector: {}", vec3(self.sun)),
            format!("water sun: {}", vec3(self.water_sun)),
            match self.environment_generation {
                Some(g) => format!("lighting map: generation {g}"),
                None => "lighting map: none".to_string(),
            },
            format!("island: {}", self.island),
        ];
        if let Some(stats) = self.prefilter {
            lines.push(format!(
                "prefilter: generated={} released={} live={}",
                stats.generated,
                stats.released,
                stats.live()
            ));
        }
        lines
    }
}

impl std::fmt::Display for ContextStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.lines().join("\n"))
    }
}

/// Detailed info about a single node.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub id: NodeId,
    pub name: String,
    pub kind: &'static str,
    pub position: [f32; 3],
    pub scale: [f32; 3],
}

impl std::fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Node [{}] {} ({}) pos=({:.2}, {:.2}, {:.2}) scale=({:.2}, {:.2}, {:.2})",
            self.id,
            self.name,
            self.kind,
            self.position[0],
            self.position[1],
            self.position[2],
            self.scale[0],
            self.scale[1],
            self.scale[2],
        )
    }
}
