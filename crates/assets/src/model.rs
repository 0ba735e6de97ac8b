use crate::AssetError;
use glam::{Mat4, Quat, Vec3};
use gltf::accessor::{DataType, Dimensions};
use gltf::buffer::Data;
use gltf::mesh::Mode;
use gltf::{Accessor, Document, Gltf, Semantic};
use seascape_common::Transform;
use std::path::Path;

/// Hierarchical mesh asset imported from glTF/GLB.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelAsset {
    pub name: String,
    pub roots: Vec<ModelNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelNode {
    pub name: String,
    /// Transform relative to the parent node.
    pub transform: Transform,
    pub mesh: Option<Mesh>,
    pub children: Vec<ModelNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub name: String,
    pub primitives: Vec<Primitive>,
}

/// Indexed triangle list with per-vertex normals.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
    pub material: Material,
}

/// Metallic-roughness material factors.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "default".into(),
            base_color: [1.0, 1.0, 1.0, 1.0],
            metallic: 1.0,
            roughness: 1.0,
        }
    }
}

/// A primitive together with its accumulated world matrix.
#[derive(Debug, Clone, Copy)]
pub struct PlacedPrimitive<'a> {
    pub world: Mat4,
    pub node: &'a str,
    pub primitive: &'a Primitive,
}

impl ModelAsset {
    /// Read a `.glb` or `.gltf` file. External `.gltf` buffers are resolved
    /// relative to the file; embedded data URIs are decoded in place.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("model")
            .to_string();
        Self::import(name, &bytes, path.parent())
    }

    /// Parse GLB (or self-contained glTF JSON) bytes already in memory.
    pub fn from_glb(name: impl Into<String>, bytes: &[u8]) -> Result<Self, AssetError> {
        Self::import(name.into(), bytes, None)
    }

    fn import(name: String, bytes: &[u8], base: Option<&Path>) -> Result<Self, AssetError> {
        let Gltf { document, blob } = Gltf::from_slice(bytes)?;
        let buffers = gltf::import_buffers(&document, base, blob)?;
        Self::from_document(name, &document, &buffers)
    }

    fn from_document(name: String, doc: &Document, buffers: &[Data]) -> Result<Self, AssetError> {
        let roots: Vec<gltf::Node<'_>> = match doc.default_scene().or_else(|| doc.scenes().next()) {
            Some(scene) => scene.nodes().collect(),
            // No scenes: every node that is nobody's child is a root.
            None => {
                let mut is_child = vec![false; doc.nodes().count()];
                for node in doc.nodes() {
                    for child in node.children() {
                        if let Some(flag) = is_child.get_mut(child.index()) {
                            *flag = true;
                        }
                    }
                }
                doc.nodes().filter(|n| !is_child[n.index()]).collect()
            }
        };

        let mut visiting = vec![false; doc.nodes().count()];
        let roots = roots
            .into_iter()
            .map(|node| build_node(node, buffers, &mut visiting))
            .collect::<Result<Vec<_>, _>>()?;

        let model = Self { name, roots };
        tracing::debug!(
            name = %model.name,
            nodes = model.node_count(),
            triangles = model.triangle_count(),
            "model imported"
        );
        Ok(model)
    }

    pub fn node_count(&self) -> usize {
        fn count(n: &ModelNode) -> usize {
            1 + n.children.iter().map(count).sum::<usize>()
        }
        self.roots.iter().map(count).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.placed_primitives()
            .iter()
            .map(|p| p.primitive.indices.len() / 3)
            .sum()
    }

    /// Every primitive in the hierarchy with its model-space matrix.
    pub fn placed_primitives(&self) -> Vec<PlacedPrimitive<'_>> {
        fn walk<'a>(node: &'a ModelNode, parent: Mat4, out: &mut Vec<PlacedPrimitive<'a>>) {
            let world = parent * node.transform.matrix();
            if let Some(mesh) = &node.mesh {
                for primitive in &mesh.primitives {
                    out.push(PlacedPrimitive {
                        world,
                        node: &node.name,
                        primitive,
                    });
                }
            }
            for child in &node.children {
                walk(child, world, out);
            }
        }
        let mut out = Vec::new();
        for root in &self.roots {
            walk(root, Mat4::IDENTITY, &mut out);
        }
        out
    }
}

fn build_node(
    node: gltf::Node<'_>,
    buffers: &[Data],
    visiting: &mut [bool],
) -> Result<ModelNode, AssetError> {
    let index = node.index();
    if visiting[index] {
        return Err(invalid(format!("node {index} is its own ancestor")));
    }
    visiting[index] = true;

    let transform = match node.transform() {
        gltf::scene::Transform::Matrix { matrix } => {
            Transform::from_matrix(Mat4::from_cols_array_2d(&matrix))
        }
        gltf::scene::Transform::Decomposed {
            translation,
            rotation,
            scale,
        } => Transform {
            position: Vec3::from(translation),
            rotation: Quat::from_array(rotation),
            scale: Vec3::from(scale),
        },
    };

    let mesh = node.mesh().map(|m| build_mesh(m, buffers)).transpose()?;

    let children = node
        .children()
        .map(|c| build_node(c, buffers, visiting))
        .collect::<Result<Vec<_>, _>>()?;

    visiting[index] = false;
    Ok(ModelNode {
        name: node.name().map_or_else(|| format!("node_{index}"), str::to_string),
        transform,
        mesh,
        children,
    })
}

fn build_mesh(mesh: gltf::Mesh<'_>, buffers: &[Data]) -> Result<Mesh, AssetError> {
    let index = mesh.index();
    let mut primitives = Vec::new();
    for p in mesh.primitives() {
        if p.mode() != Mode::Triangles {
            tracing::warn!(mesh = index, mode = ?p.mode(), "skipping non-triangle primitive");
            continue;
        }
        let position_accessor = p
            .get(&Semantic::Positions)
            .ok_or_else(|| invalid(format!("mesh {index} primitive has no POSITION")))?;
        check_accessor(&position_accessor, AccessorRole::Vec3, buffers)?;
        if let Some(a) = p.get(&Semantic::Normals) {
            check_accessor(&a, AccessorRole::Vec3, buffers)?;
        }
        if let Some(a) = p.indices() {
            check_accessor(&a, AccessorRole::Indices, buffers)?;
        }

        let reader = p.reader(|b| buffers.get(b.index()).map(|d| d.0.as_slice()));
        let positions: Vec<Vec3> = reader
            .read_positions()
            .ok_or_else(|| invalid(format!("mesh {index} POSITION data is unreadable")))?
            .map(Vec3::from)
            .collect();
        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(invalid(format!(
                "index {bad} out of range for {} vertices",
                positions.len()
            )));
        }
        let normals = match reader.read_normals() {
            Some(normals) => normals.map(Vec3::from).collect(),
            None => generate_normals(&positions, &indices),
        };
        if normals.len() != positions.len() {
            return Err(invalid("NORMAL and POSITION counts differ".to_string()));
        }

        let material = p.material();
        let material = match material.index() {
            Some(m) => {
                let pbr = material.pbr_metallic_roughness();
                Material {
                    name: material
                        .name()
                        .map_or_else(|| format!("material_{m}"), str::to_string),
                    base_color: pbr.base_color_factor(),
                    metallic: pbr.metallic_factor(),
                    roughness: pbr.roughness_factor(),
                }
            }
            None => Material::default(),
        };
        primitives.push(Primitive {
            positions,
            normals,
            indices,
            material,
        });
    }
    Ok(Mesh {
        name: mesh.name().map_or_else(|| format!("mesh_{index}"), str::to_string),
        primitives,
    })
}

/// What a primitive reads an accessor as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AccessorRole {
    /// Float VEC3 (positions, normals).
    Vec3,
    /// Unsigned SCALAR triangle indices.
    Indices,
}

/// Reject accessors whose layout the readers cannot decode, or whose byte
/// ranges fall outside their view or buffer. File-supplied counts and
/// offsets only go through checked arithmetic.
fn check_accessor(
    accessor: &Accessor<'_>,
    role: AccessorRole,
    buffers: &[Data],
) -> Result<(), AssetError> {
    let index = accessor.index();
    let layout_ok = match role {
        AccessorRole::Vec3 => {
            accessor.data_type() == DataType::F32 && accessor.dimensions() == Dimensions::Vec3
        }
        AccessorRole::Indices => {
            matches!(accessor.data_type(), DataType::U8 | DataType::U16 | DataType::U32)
                && accessor.dimensions() == Dimensions::Scalar
        }
    };
    if !layout_ok {
        return Err(invalid(format!(
            "accessor {index} is {:?} {:?}, expected {role:?}",
            accessor.data_type(),
            accessor.dimensions()
        )));
    }
    if accessor.count() == 0 {
        return Err(invalid(format!("accessor {index} has no elements")));
    }

    let element = accessor.size();
    if let Some(view) = accessor.view() {
        let stride = view.stride().unwrap_or(element);
        if stride < element {
            return Err(invalid(format!(
                "accessor {index} stride {stride} is shorter than its {element}-byte element"
            )));
        }
        let offset = accessor.offset();
        check_range(index, &view, offset, stride, accessor.count(), element, buffers)?;
    }
    if let Some(sparse) = accessor.sparse() {
        if sparse.count() == 0 {
            return Err(invalid(format!("accessor {index} has an empty sparse block")));
        }
        let indices = sparse.indices();
        let index_size = indices.index_type().size();
        check_range(
            index,
            &indices.view(),
            indices.offset(),
            index_size,
            sparse.count(),
            index_size,
            buffers,
        )?;
        let values = sparse.values();
        check_range(
            index,
            &values.view(),
            values.offset(),
            element,
            sparse.count(),
            element,
            buffers,
        )?;
    }
    Ok(())
}

fn check_range(
    accessor: usize,
    view: &gltf::buffer::View<'_>,
    offset: usize,
    stride: usize,
    count: usize,
    element: usize,
    buffers: &[Data],
) -> Result<(), AssetError> {
    let out_of_bounds = || invalid(format!("accessor {accessor} reads past its buffer"));
    let needed = count
        .checked_sub(1)
        .and_then(|n| n.checked_mul(stride))
        .and_then(|n| n.checked_add(element))
        .ok_or_else(out_of_bounds)?;
    let end = view
        .offset()
        .checked_add(offset)
        .and_then(|start| start.checked_add(needed))
        .ok_or_else(out_of_bounds)?;
    let view_end = view
        .offset()
        .checked_add(view.length())
        .ok_or_else(out_of_bounds)?;
    let buffer_len = buffers
        .get(view.buffer().index())
        .map_or(0, |d| d.0.len());
    if end > view_end || view_end > buffer_len {
        return Err(out_of_bounds());
    }
    Ok(())
}

/// Area-weighted vertex normals for meshes that ship without them.
fn generate_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let n = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += n;
        normals[b] += n;
        normals[c] += n;
    }
    normals
        .into_iter()
        .map(|n| {
            let n = n.normalize_or_zero();
            if n == Vec3::ZERO { Vec3::Y } else { n }
        })
        .collect()
}

fn invalid(msg: String) -> AssetError {
    AssetError::Invalid(msg)
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// Wrap a JSON document and binary chunk in a GLB container.
    pub fn glb(json: &str, bin: &[u8]) -> Vec<u8> {
        fn chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8], pad: u8) {
            let padded = data.len().next_multiple_of(4);
            out.extend_from_slice(&(padded as u32).to_le_bytes());
            out.extend_from_slice(kind);
            out.extend_from_slice(data);
            out.resize(out.len() + padded - data.len(), pad);
        }
        let mut body = Vec::new();
        chunk(&mut body, b"JSON", json.as_bytes(), b' ');
        if !bin.is_empty() {
            chunk(&mut body, b"BIN\0", bin, 0);
        }
        let mut out = Vec::new();
        out.extend_from_slice(b"glTF");
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&(12 + body.len() as u32).to_le_bytes());
        out.extend(body);
        out
    }

    pub fn f32_bytes(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    /// A two-node GLB: "Island" at y=1 with a child "Rock" (scale 2) holding
    /// one triangle without normals.
    pub fn island_glb() -> Vec<u8> {
        let json = r#"{
            "asset": {"version": "2.0"},
            "scene": 0,
            "scenes": [{"nodes": [0]}],
            "nodes": [
                {"name": "Island", "translation": [0, 1, 0], "children": [1]},
                {"name": "Rock", "mesh": 0, "scale": [2, 2, 2]}
            ],
            "meshes": [{"name": "rock", "primitives": [
                {"attributes": {"POSITION": 0}, "indices": 1, "material": 0}
            ]}],
            "materials": [{"name": "sand", "pbrMetallicRoughness": {
                "baseColorFactor": [0.8, 0.7, 0.5, 1.0], "metallicFactor": 0.0, "roughnessFactor": 0.9
            }}],
            "accessors": [
                {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                 "min": [0, 0, -1], "max": [1, 0, 0]},
                {"bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR"}
            ],
            "bufferViews": [
                {"buffer": 0, "byteOffset": 0, "byteLength": 36},
                {"buffer": 0, "byteOffset": 36, "byteLength": 6}
            ],
            "buffers": [{"byteLength": 42}]
        }"#;
        let mut bin = f32_bytes(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, -1.0]);
        for i in [0u16, 1, 2] {
            bin.extend_from_slice(&i.to_le_bytes());
        }
        glb(json, &bin)
    }
}
