use glam::Vec3;
use seascape_assets::{ModelAsset, ModelNode};
use std::fmt::Write;

/// Totals and bounds for an imported model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelReport {
    pub name: String,
    pub nodes: usize,
    pub primitives: usize,
    pub vertices: usize,
    pub triangles: usize,
    /// Model-space bounds of all placed vertices, `None` for an empty model.
    pub bounds: Option<(Vec3, Vec3)>,
    pub materials: Vec<String>,
}

impl ModelReport {
    pub fn new(model: &ModelAsset) -> Self {
        let placed = model.placed_primitives();
        let mut bounds: Option<(Vec3, Vec3)> = None;
        let mut materials: Vec<String> = Vec::new();
        let mut vertices = 0;
        for p in &placed {
            vertices += p.primitive.positions.len();
            for &v in &p.primitive.positions {
                let w = p.world.transform_point3(v);
                bounds = Some(match bounds {
                    Some((lo, hi)) => (lo.min(w), hi.max(w)),
                    None => (w, w),
                });
            }
            let name = &p.primitive.material.name;
            if !materials.contains(name) {
                materials.push(name.clone());
            }
        }
        Self {
            name: model.name.clone(),
            nodes: model.node_count(),
            primitives: placed.len(),
            vertices,
            triangles: model.triangle_count(),
            bounds,
            materials,
        }
    }
}

impl std::fmt::Display for ModelReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Model '{}': nodes={} primitives={} vertices={} triangles={}",
            self.name, self.nodes, self.primitives, self.vertices, self.triangles
        )?;
        if let Some((lo, hi)) = self.bounds {
            writeln!(
                f,
                "  bounds: ({:.2}, {:.2}, {:.2}) .. ({:.2}, {:.2}, {:.2})",
                lo.x, lo.y, lo.z, hi.x, hi.y, hi.z
            )?;
        }
        write!(f, "  materials: {}", self.materials.join(", "))
    }
}

/// Indented tree of the model's nodes with their meshes.
pub fn dump_hierarchy(model: &ModelAsset) -> String {
    fn walk(node: &ModelNode, depth: usize, out: &mut String) {
        let p = node.transform.position;
        let _ = write!(
            out,
            "{:indent$}- {} pos=({:.2}, {:.2}, {:.2})",
            "",
            if node.name.is_empty() { "<unnamed>" } else { node.name.as_str() },
            p.x,
            p.y,
            p.z,
            indent = depth * 2
        );
        if let Some(mesh) = &node.mesh {
            let triangles: usize = mesh.primitives.iter().map(|p| p.indices.len() / 3).sum();
            let _ = write!(
                out,
                " mesh={} primitives={} triangles={}",
                mesh.name,
                mesh.primitives.len(),
                triangles
            );
        }
        out.push('\n');
        for child in &node.children {
            walk(child, depth + 1, out);
        }
    }

    let mut out = String::new();
    let _ = writeln!(out, "{}", model.name);
    for root in &model.roots {
        walk(root, 1, &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use seascape_assets::{Material, Mesh, Primitive};
    use seascape_common::Transform;

    fn triangle(material: &str) -> Primitive {
        Primitive {
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::Z],
            normals: vec![Vec3::Y; 3],
            indices: vec![0, 1, 2],
            material: Material {
                name: material.into(),
                ..Material::default()
            },
        }
    }

    fn model() -> ModelAsset {
        let child = ModelNode {
            name: "Rock".into(),
            transform: Transform::from_position(Vec3::new(0.0, 5.0, 0.0)),
            mesh: Some(Mesh {
                name: "rock".into(),
                primitives: vec![triangle("stone")],
            }),
            children: vec![],
        };
        let root = ModelNode {
            name: "Island".into(),
            transform: Transform::from_position(Vec3::new(10.0, 0.0, 0.0)),
            mesh: Some(Mesh {
                name: "ground".into(),
                primitives: vec![triangle("sand"), triangle("stone")],
            }),
            children: vec![child],
        };
        ModelAsset {
            name: "island".into(),
            roots: vec![root],
        }
    }

    #[test]
    fn report_counts_and_bounds() {
        let report = ModelReport::new(&model());
        assert_eq!(report.nodes, 2);
        assert_eq!(report.primitives, 3);
        assert_eq!(report.vertices, 9);
        assert_eq!(report.triangles, 3);
        assert_eq!(report.materials, vec!["sand".to_string(), "stone".to_string()]);
        let (lo, hi) = report.bounds.unwrap();
        assert_eq!(lo, Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(hi, Vec3::new(11.0, 5.0, 1.0));
    }

    #[test]
    fn empty_model_has_no_bounds() {
        let empty = ModelAsset {
            name: "empty".into(),
            roots: vec![],
        };
        let report = ModelReport::new(&empty);
        assert_eq!(report.bounds, None);
        assert!(report.to_string().contains("triangles=0"));
    }

    #[test]
    fn hierarchy_is_indented_by_depth() {
        let dump = dump_hierarchy(&model());
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines[0], "island");
        assert!(lines[1].starts_with("  - Island"));
        assert!(lines[1].contains("mesh=ground primitives=2 triangles=2"));
        assert!(lines[2].starts_with("    - Rock"));
    }
}
