use std::path::Path;

/// RGBA8 pixels of the water normal map.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
    /// True when the file could not be read and a flat map stands in.
    pub fallback: bool,
}

impl NormalImage {
    /// A tangent-space normal map pointing straight up.
    pub fn flat() -> Self {
        let size = 4u32;
        Self {
            width: size,
            height: size,
            rgba: [128u8, 128, 255, 255].repeat((size * size) as usize),
            fallback: true,
        }
    }

    /// Decode `path`, or warn and use [`NormalImage::flat`].
    pub fn load_or_flat(path: &Path) -> Self {
        match image::open(path) {
            Ok(img) => {
                let rgba = img.to_rgba8();
                let (width, height) = rgba.dimensions();
                tracing::info!(path = %path.display(), width, height, "water normals loaded");
                Self {
                    width,
                    height,
                    rgba: rgba.into_raw(),
                    fallback: false,
                }
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "using flat water normals: {e}");
                Self::flat()
            }
        }
    }
}

/// Repeating, filtered texture and sampler for the water pass.
pub(crate) fn upload_normals(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    image: &NormalImage,
) -> (wgpu::Texture, wgpu::TextureView, wgpu::Sampler) {
    let size = wgpu::Extent3d {
        width: image.width,
        height: image.height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("water_normals"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        // Normal data, not colour: no sRGB decode.
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &image.rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(image.width * 4),
            rows_per_image: Some(image.height),
        },
        size,
    );
    let view = texture.create_view(&Default::default());
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("water_normals_sampler"),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    });
    (texture, view, sampler)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_flat() {
        let img = NormalImage::load_or_flat(Path::new("no/such/waternormals.jpg"));
        assert!(img.fallback);
        assert_eq!(img.rgba.len(), (img.width * img.height * 4) as usize);
        assert_eq!(&img.rgba[..4], &[128, 128, 255, 255]);
    }

    #[test]
    fn decodes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("normals.png");
        let src = image::RgbImage::from_pixel(8, 4, image::Rgb([10, 20, 30]));
        src.save(&path).unwrap();

        let img = NormalImage::load_or_flat(&path);
        assert!(!img.fallback);
        assert_eq!((img.width, img.height), (8, 4));
        assert_eq!(&img.rgba[..4], &[10, 20, 30, 255]);
    }
}
