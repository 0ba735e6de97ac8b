use crate::camera::OrbitCamera;
use crate::environment::EnvironmentMirror;
use crate::shaders;
use crate::texture::{self, NormalImage};
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use seascape_assets::ModelAsset;
use seascape_common::NodeId;
use seascape_environment::{Sky, SkyParameters, WaterParameters, WaterSurface};
use seascape_kernel::{NodeKind, Scene};
use std::collections::BTreeMap;
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct FrameUniforms {
    view_proj: [[f32; 4]; 4],
    inv_view_proj: [[f32; 4]; 4],
    eye_exposure: [f32; 4],
    sun_dir_e: [f32; 4],
    up_fade: [f32; 4],
    beta_r_g: [f32; 4],
    beta_m: [f32; 4],
    water_sun_time: [f32; 4],
    sun_color_size: [f32; 4],
    water_color_alpha: [f32; 4],
    water_misc: [f32; 4],
}

impl FrameUniforms {
    /// Per-frame shader inputs from the camera and the scene's first sky and
    /// water nodes.
    pub(crate) fn build(camera: &OrbitCamera, scene: &Scene, exposure: f32, max_mip: f32) -> Self {
        let default_sky;
        let sky = match first_sky(scene) {
            Some(s) => s,
            None => {
                default_sky = Sky::new(SkyParameters::default());
                &default_sky
            }
        };
        let default_water;
        let water = match first_water(scene) {
            Some(w) => w,
            None => {
                default_water = WaterSurface::new(WaterParameters::default());
                &default_water
            }
        };

        let s = sky.scattering();
        let p = &water.params;
        let vp = camera.view_projection();
        let eye = camera.position();
        let ws = water.sun_direction();
        Self {
            view_proj: vp.to_cols_array_2d(),
            inv_view_proj: vp.inverse().to_cols_array_2d(),
            eye_exposure: [eye.x, eye.y, eye.z, exposure],
            sun_dir_e: [s.sun_direction.x, s.sun_direction.y, s.sun_direction.z, s.sun_e],
            up_fade: [s.up.x, s.up.y, s.up.z, s.sun_fade],
            beta_r_g: [s.beta_r.x, s.beta_r.y, s.beta_r.z, s.mie_directional_g],
            beta_m: [s.beta_m.x, s.beta_m.y, s.beta_m.z, 0.0],
            water_sun_time: [ws.x, ws.y, ws.z, water.time()],
            sun_color_size: [p.sun_color.x, p.sun_color.y, p.sun_color.z, p.size],
            water_color_alpha: [p.water_color.x, p.water_color.y, p.water_color.z, p.alpha],
            water_misc: [
                p.distortion_scale,
                p.extent,
                if p.fog { 1.0 } else { 0.0 },
                max_mip,
            ],
        }
    }
}

fn first_sky(scene: &Scene) -> Option<&Sky> {
    scene.nodes().values().find_map(|n| match &n.kind {
        NodeKind::Sky(s) => Some(s),
        _ => None,
    })
}

fn first_water(scene: &Scene) -> Option<&WaterSurface> {
    scene.nodes().values().find_map(|n| match &n.kind {
        NodeKind::Water(w) => Some(w),
        _ => None,
    })
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct InstanceData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
    base_color: [f32; 4],
    material: [f32; 4],
}

impl InstanceData {
    fn new(model: Mat4, base_color: [f32; 4], metallic: f32, roughness: f32) -> Self {
        let cols = model.to_cols_array_2d();
        Self {
            model_0: cols[0],
            model_1: cols[1],
            model_2: cols[2],
            model_3: cols[3],
            base_color,
            material: [metallic, roughness, 0.0, 0.0],
        }
    }
}

/// Unit water quad in xz; the shader scales it to the plane extent.
fn water_quad() -> ([[f32; 3]; 4], [u16; 6]) {
    #[rustfmt::skip]
    let vertices = [
        [-0.5, 0.0, -0.5],
        [-0.5, 0.0,  0.5],
        [ 0.5, 0.0,  0.5],
        [ 0.5, 0.0, -0.5],
    ];
    (vertices, [0, 1, 2, 2, 3, 0])
}

struct GpuPrimitive {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    instance_buffer: wgpu::Buffer,
    /// Model-space matrix of the primitive inside its asset.
    local: Mat4,
    base_color: [f32; 4],
    metallic: f32,
    roughness: f32,
}

struct GpuModel {
    primitives: Vec<GpuPrimitive>,
}

impl GpuModel {
    fn upload(device: &wgpu::Device, model: &ModelAsset) -> Self {
        let primitives = model
            .placed_primitives()
            .into_iter()
            .filter(|p| !p.primitive.indices.is_empty())
            .map(|placed| {
                let prim = placed.primitive;
                let vertices: Vec<Vertex> = prim
                    .positions
                    .iter()
                    .zip(&prim.normals)
                    .map(|(p, n)| Vertex {
                        position: p.to_array(),
                        normal: n.to_array(),
                    })
                    .collect();
                let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("mesh_vertex_buffer"),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("mesh_index_buffer"),
                    contents: bytemuck::cast_slice(&prim.indices),
                    usage: wgpu::BufferUsages::INDEX,
                });
                let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("mesh_instance_buffer"),
                    size: std::mem::size_of::<InstanceData>() as u64,
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                GpuPrimitive {
                    vertex_buffer,
                    index_buffer,
                    index_count: prim.indices.len() as u32,
                    instance_buffer,
                    local: placed.world,
                    base_color: prim.material.base_color,
                    metallic: prim.material.metallic,
                    roughness: prim.material.roughness,
                }
            })
            .collect();
        Self { primitives }
    }

    fn destroy(self) {
        for p in self.primitives {
            p.vertex_buffer.destroy();
            p.index_buffer.destroy();
            p.instance_buffer.destroy();
        }
    }
}

struct PipelineDesc<'a> {
    label: &'a str,
    source: &'a str,
    vs: &'a str,
    fs: &'a str,
    buffers: &'a [wgpu::VertexBufferLayout<'a>],
    bind_group_layouts: &'a [&'a wgpu::BindGroupLayout],
    cull_mode: Option<wgpu::Face>,
    blend: wgpu::BlendState,
    depth_write_enabled: bool,
    depth_compare: wgpu::CompareFunction,
}

fn create_pipeline(
    device: &wgpu::Device,
    surface_format: wgpu::TextureFormat,
    desc: PipelineDesc<'_>,
) -> wgpu::RenderPipeline {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(desc.label),
        source: wgpu::ShaderSource::Wgsl(shaders::compose(desc.source).into()),
    });
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(desc.label),
        bind_group_layouts: desc.bind_group_layouts,
        push_constant_ranges: &[],
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(desc.label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: Some(desc.vs),
            compilation_options: Default::default(),
            buffers: desc.buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: Some(desc.fs),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(desc.blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: desc.cull_mode,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: desc.depth_write_enabled,
            depth_compare: desc.depth_compare,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

/// wgpu renderer for the sky dome, the water plane and loaded models.
pub struct WgpuRenderer {
    sky_pipeline: wgpu::RenderPipeline,
    water_pipeline: wgpu::RenderPipeline,
    mesh_pipeline: wgpu::RenderPipeline,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    water_bind_group: wgpu::BindGroup,
    water_vertex_buffer: wgpu::Buffer,
    water_index_buffer: wgpu::Buffer,
    environment: EnvironmentMirror,
    models: BTreeMap<NodeId, GpuModel>,
    _normal_texture: wgpu::Texture,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
    exposure: f32,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        normals: &NormalImage,
    ) -> Self {
        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame_uniforms"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let environment = EnvironmentMirror::new(device, queue);

        let (normal_texture, normal_view, normal_sampler) =
            texture::upload_normals(device, queue, normals);
        let water_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("water_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let water_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("water_bind_group"),
            layout: &water_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&normal_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&normal_sampler),
                },
            ],
        });

        let sky_pipeline = create_pipeline(
            device,
            surface_format,
            PipelineDesc {
                label: "sky_pipeline",
                source: shaders::SKY,
                vs: "vs_sky",
                fs: "fs_sky",
                buffers: &[],
                bind_group_layouts: &[&frame_layout],
                cull_mode: None,
                blend: wgpu::BlendState::REPLACE,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
            },
        );

        let water_pipeline = create_pipeline(
            device,
            surface_format,
            PipelineDesc {
                label: "water_pipeline",
                source: shaders::WATER,
                vs: "vs_water",
                fs: "fs_water",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<[f32; 3]>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                }],
                bind_group_layouts: &[&frame_layout, environment.layout(), &water_layout],
                cull_mode: None,
                blend: wgpu::BlendState::ALPHA_BLENDING,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
            },
        );

        let mesh_pipeline = create_pipeline(
            device,
            surface_format,
            PipelineDesc {
                label: "mesh_pipeline",
                source: shaders::MESH,
                vs: "vs_mesh",
                fs: "fs_mesh",
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![
                            0 => Float32x3,
                            1 => Float32x3,
                        ],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<InstanceData>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![
                            2 => Float32x4,
                            3 => Float32x4,
                            4 => Float32x4,
                            5 => Float32x4,
                            6 => Float32x4,
                            7 => Float32x4,
                        ],
                    },
                ],
                bind_group_layouts: &[&frame_layout, environment.layout()],
                cull_mode: Some(wgpu::Face::Back),
                blend: wgpu::BlendState::REPLACE,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
            },
        );

        let (quad_vertices, quad_indices) = water_quad();
        let water_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("water_vertex_buffer"),
            contents: bytemuck::cast_slice(&quad_vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let water_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("water_index_buffer"),
            contents: bytemuck::cast_slice(&quad_indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let depth_texture = Self::create_depth_texture(device, width, height);

        Self {
            sky_pipeline,
            water_pipeline,
            mesh_pipeline,
            frame_buffer,
            frame_bind_group,
            water_bind_group,
            water_vertex_buffer,
            water_index_buffer,
            environment,
            models: BTreeMap::new(),
            _normal_texture: normal_texture,
            depth_texture,
            surface_format,
            exposure: 0.5,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    pub fn set_exposure(&mut self, exposure: f32) {
        self.exposure = exposure;
    }

    /// Upload models that appeared in the scene and drop those that left it.
    fn sync_models(&mut self, device: &wgpu::Device, scene: &Scene) {
        let live: Vec<NodeId> = scene.models().map(|(id, _, _)| id).collect();
        let stale: Vec<NodeId> = self
            .models
            .keys()
            .filter(|id| !live.contains(*id))
            .copied()
            .collect();
        for id in stale {
            if let Some(model) = self.models.remove(&id) {
                model.destroy();
            }
        }
        for (id, node, model) in scene.models() {
            if !self.models.contains_key(&id) {
                let gpu = GpuModel::upload(device, model);
                tracing::info!(node = %id, name = %node.name, primitives = gpu.primitives.len(), "model uploaded");
                self.models.insert(id, gpu);
            }
        }
    }

    /// Render one frame: sky, water, then models.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        camera: &OrbitCamera,
        scene: &Scene,
    ) {
        self.environment.sync(device, queue, scene.environment());
        self.sync_models(device, scene);

        let uniforms = FrameUniforms::build(
            camera,
            scene,
            self.exposure,
            self.environment.current().max_mip(),
        );
        queue.write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&uniforms));

        for (id, node, _) in scene.models() {
            let Some(gpu) = self.models.get(&id) else {
                continue;
            };
            let node_matrix = node.transform.matrix();
            for p in &gpu.primitives {
                let instance =
                    InstanceData::new(node_matrix * p.local, p.base_color, p.metallic, p.roughness);
                queue.write_buffer(&p.instance_buffer, 0, bytemuck::bytes_of(&instance));
            }
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            let env = self.environment.current().bind_group();

            pass.set_pipeline(&self.sky_pipeline);
            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            pass.draw(0..3, 0..1);

            if first_water(scene).is_some() {
                pass.set_pipeline(&self.water_pipeline);
                pass.set_bind_group(0, &self.frame_bind_group, &[]);
                pass.set_bind_group(1, env, &[]);
                pass.set_bind_group(2, &self.water_bind_group, &[]);
                pass.set_vertex_buffer(0, self.water_vertex_buffer.slice(..));
                pass.set_index_buffer(self.water_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                pass.draw_indexed(0..6, 0, 0..1);
            }

            pass.set_pipeline(&self.mesh_pipeline);
            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            pass.set_bind_group(1, env, &[]);
            for gpu in self.models.values() {
                for p in &gpu.primitives {
                    pass.set_vertex_buffer(0, p.vertex_buffer.slice(..));
                    pass.set_vertex_buffer(1, p.instance_buffer.slice(..));
                    pass.set_index_buffer(p.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..p.index_count, 0, 0..1);
                }
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use seascape_environment::SunDirection;
    use seascape_kernel::{SeascapeConfig, SeascapeContext};

    #[test]
    fn uniform_sizes_match_shader_layout() {
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 2 * 64 + 9 * 16);
        assert_eq!(std::mem::size_of::<InstanceData>(), 6 * 16);
        assert_eq!(std::mem::size_of::<Vertex>(), 24);
    }

    #[test]
    fn frame_uniforms_follow_the_scene() {
        let mut config = SeascapeConfig::default();
        config.lighting.cube_size = 4;
        config.assets.island = None;
        let mut ctx = SeascapeContext::from_config(config).unwrap();
        ctx.frame_tick(3.5);

        let camera = OrbitCamera::default();
        let u = FrameUniforms::build(&camera, ctx.scene(), 0.5, 2.0);
        let sun = SunDirection::from_angles(2.0, 180.0).vector();
        let sky_sun = Vec3::from_slice(&u.sun_dir_e[..3]);
        let water_sun = Vec3::from_slice(&u.water_sun_time[..3]);
        assert!((sky_sun - sun).length() < 1e-5);
        assert!((water_sun - sun).length() < 1e-5);
        assert_eq!(u.water_sun_time[3], 3.5);
        assert_eq!(u.eye_exposure[3], 0.5);
        assert_eq!(u.water_misc, [3.7, 10_000.0, 1.0, 2.0]);
    }

    #[test]
    fn empty_scene_uses_defaults() {
        let u = FrameUniforms::build(&OrbitCamera::default(), &Scene::new(), 0.5, 0.0);
        assert_eq!(u.up_fade[..3], [0.0, 1.0, 0.0]);
        assert_eq!(u.sun_color_size[3], 1.0);
    }

    #[test]
    fn water_quad_is_two_triangles() {
        let (v, i) = water_quad();
        assert_eq!(v.len(), 4);
        assert!(i.iter().all(|&k| (k as usize) < v.len()));
    }
}
