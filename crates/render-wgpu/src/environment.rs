use bytemuck::{Pod, Zeroable};
use seascape_environment::{CubeLevel, LightingMap, ShIrradiance};

/// SH irradiance as nine padded vec4s, matching `Sh` in the shaders.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct ShUniform {
    pub c: [[f32; 4]; 9],
}

impl From<&ShIrradiance> for ShUniform {
    fn from(sh: &ShIrradiance) -> Self {
        Self {
            c: sh.coefficients.map(|v| [v.x, v.y, v.z, 0.0]),
        }
    }
}

/// GPU copy of one lighting map. Destroyed explicitly when replaced.
pub(crate) struct GpuLightingMap {
    generation: Option<u64>,
    mip_count: u32,
    texture: wgpu::Texture,
    sh_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl GpuLightingMap {
    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    /// Highest mip index, used by the shaders to pick a level from roughness.
    pub fn max_mip(&self) -> f32 {
        self.mip_count.saturating_sub(1) as f32
    }

    fn destroy(self) {
        self.texture.destroy();
        self.sh_buffer.destroy();
    }
}

/// Layout and sampler shared by every uploaded map.
pub(crate) struct EnvironmentBindings {
    pub layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
}

impl EnvironmentBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("environment_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        // Rgba32Float is not filterable without an extra feature.
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::Cube,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("environment_sampler"),
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        Self { layout, sampler }
    }

    fn create(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        generation: Option<u64>,
        levels: &[CubeLevel],
        sh: ShUniform,
    ) -> GpuLightingMap {
        let size = levels.first().map_or(1, CubeLevel::size);
        let mip_count = levels.len().max(1) as u32;
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("environment_cube"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 6,
            },
            mip_level_count: mip_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba32Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        for (mip, level) in levels.iter().enumerate() {
            let s = level.size();
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: mip as u32,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                bytemuck::cast_slice(&level.to_rgba_f32()),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(s * 16),
                    rows_per_image: Some(s),
                },
                wgpu::Extent3d {
                    width: s,
                    height: s,
                    depth_or_array_layers: 6,
                },
            );
        }
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("environment_cube_view"),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });

        let sh_buffer = wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some("environment_sh"),
                contents: bytemuck::bytes_of(&sh),
                usage: wgpu::BufferUsages::UNIFORM,
            },
        );
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("environment_bind_group"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: sh_buffer.as_entire_binding(),
                },
            ],
        });

        GpuLightingMap {
            generation,
            mip_count,
            texture,
            sh_buffer,
            bind_group,
        }
    }

    /// A black 1x1 cube used until the scene has a lighting map.
    fn placeholder(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> GpuLightingMap {
        let black = CubeLevel::from_fn(1, |_, _, _, _| glam::Vec3::ZERO);
        self.create(device, queue, None, &[black], ShUniform::zeroed())
    }
}

/// Keeps the GPU lighting map in step with the scene's, keyed by generation.
pub(crate) struct EnvironmentMirror {
    bindings: EnvironmentBindings,
    current: GpuLightingMap,
}

impl EnvironmentMirror {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let bindings = EnvironmentBindings::new(device);
        let current = bindings.placeholder(device, queue);
        Self { bindings, current }
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.bindings.layout
    }

    pub fn current(&self) -> &GpuLightingMap {
        &self.current
    }

    /// Upload `map` if its generation differs from the mirrored one. The old
    /// GPU texture and buffer are destroyed first.
    pub fn sync(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, map: Option<&LightingMap>) {
        let incoming = map.map(LightingMap::generation);
        if !needs_upload(self.current.generation, incoming) {
            return;
        }
        let next = match map {
            Some(m) => self.bindings.create(
                device,
                queue,
                incoming,
                m.levels(),
                ShUniform::from(m.irradiance()),
            ),
            None => self.bindings.placeholder(device, queue),
        };
        let old = std::mem::replace(&mut self.current, next);
        tracing::debug!(
            old = ?old.generation,
            new = ?incoming,
            "environment mirrored to gpu"
        );
        old.destroy();
    }
}

pub(crate) fn needs_upload(current: Option<u64>, incoming: Option<u64>) -> bool {
    current != incoming
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn upload_only_on_generation_change() {
        assert!(!needs_upload(None, None));
        assert!(needs_upload(None, Some(1)));
        assert!(!needs_upload(Some(1), Some(1)));
        assert!(needs_upload(Some(1), Some(2)));
        assert!(needs_upload(Some(2), None));
    }

    #[test]
    fn sh_uniform_pads_coefficients() {
        let mut sh = ShIrradiance::default();
        sh.coefficients[0] = Vec3::new(1.0, 2.0, 3.0);
        sh.coefficients[8] = Vec3::splat(-0.5);
        let u = ShUniform::from(&sh);
        assert_eq!(u.c[0], [1.0, 2.0, 3.0, 0.0]);
        assert_eq!(u.c[8], [-0.5, -0.5, -0.5, 0.0]);
        assert_eq!(std::mem::size_of::<ShUniform>(), 9 * 16);
    }
}
