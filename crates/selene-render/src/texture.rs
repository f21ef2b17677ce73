//! Surface texture: validation, downsampling, GPU upload and mipmap generation.
//!
//! The CPU half ([`DecodedImage`], [`TexturePolicy`], [`prepare_image`]) has no
//! GPU dependency and is shared by every graphics context. [`SurfaceTexture`]
//! performs the actual upload on a wgpu device.

/// Pixel layout of a decoded image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// Four 8-bit sRGB-encoded channels, row-major, no row padding.
    Rgba8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8 => 4,
        }
    }

    pub fn wgpu_format(self) -> wgpu::TextureFormat {
        match self {
            Self::Rgba8 => wgpu::TextureFormat::Rgba8UnormSrgb,
        }
    }
}

/// An image already decoded by the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            format: PixelFormat::Rgba8,
            pixels,
        }
    }

    /// Byte length the pixel buffer must have for the stated dimensions.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }
}

/// Errors that can occur while preparing or uploading the surface texture.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextureError {
    #[error("texture upload failed: {reason}")]
    UploadFailed { reason: String },
}

/// How the decoded image is reduced and filtered before use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TexturePolicy {
    /// Box-filter reduction factor applied before upload. Must be a power of two;
    /// `1` uploads the image unchanged.
    pub sample_size: u32,
    /// Build the full mip chain after upload.
    pub generate_mipmaps: bool,
}

impl Default for TexturePolicy {
    fn default() -> Self {
        Self {
            sample_size: 8,
            generate_mipmaps: true,
        }
    }
}

/// Calculates the number of mip levels for the given dimensions.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Validate an image and apply the policy's downsampling.
///
/// The reduction factor is capped so neither side drops below one texel.
pub fn prepare_image(
    image: &DecodedImage,
    policy: &TexturePolicy,
) -> Result<DecodedImage, TextureError> {
    validate_image(image)?;

    if !policy.sample_size.is_power_of_two() {
        return Err(TextureError::UploadFailed {
            reason: format!("sample size must be a power of two, got {}", policy.sample_size),
        });
    }

    let mut factor = policy.sample_size;
    while factor > 1 && (image.width < factor || image.height < factor) {
        factor /= 2;
    }
    if factor == 1 {
        return Ok(image.clone());
    }

    Ok(downsample(image, factor))
}

fn validate_image(image: &DecodedImage) -> Result<(), TextureError> {
    if image.width == 0 || image.height == 0 {
        return Err(TextureError::UploadFailed {
            reason: format!(
                "texture dimensions must be non-zero, got {}x{}",
                image.width, image.height
            ),
        });
    }

    let expected = image.expected_len();
    if image.pixels.len() != expected {
        return Err(TextureError::UploadFailed {
            reason: format!(
                "pixel data is {} bytes, expected {expected} for {}x{} {:?}",
                image.pixels.len(),
                image.width,
                image.height,
                image.format
            ),
        });
    }
    Ok(())
}

/// Average `factor`×`factor` blocks. Edge blocks that fall short are averaged
/// over the texels they do cover.
fn downsample(image: &DecodedImage, factor: u32) -> DecodedImage {
    let bpp = image.format.bytes_per_pixel();
    let width = image.width.div_ceil(factor);
    let height = image.height.div_ceil(factor);
    let src_stride = image.width as usize * bpp;
    let mut pixels = Vec::with_capacity(width as usize * height as usize * bpp);

    for by in 0..height {
        let y0 = by * factor;
        let y1 = (y0 + factor).min(image.height);
        for bx in 0..width {
            let x0 = bx * factor;
            let x1 = (x0 + factor).min(image.width);

            let mut sum = [0u64; 4];
            for y in y0..y1 {
                let row = y as usize * src_stride;
                for x in x0..x1 {
                    let at = row + x as usize * bpp;
                    for (c, total) in sum.iter_mut().enumerate().take(bpp) {
                        *total += u64::from(image.pixels[at + c]);
                    }
                }
            }

            let count = u64::from(y1 - y0) * u64::from(x1 - x0);
            for total in sum.iter().take(bpp) {
                pixels.push(((total + count / 2) / count) as u8);
            }
        }
    }

    DecodedImage {
        width,
        height,
        format: image.format,
        pixels,
    }
}

/// WGSL shader for mipmap generation via fullscreen blit.
const BLIT_SHADER_SOURCE: &str = r#"
@group(0) @binding(0) var src_texture: texture_2d<f32>;
@group(0) @binding(1) var src_sampler: sampler;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) idx: u32) -> VertexOutput {
    let uv = vec2<f32>(f32((idx << 1u) & 2u), f32(idx & 2u));
    var out: VertexOutput;
    out.position = vec4<f32>(uv * 2.0 - 1.0, 0.0, 1.0);
    out.uv = vec2<f32>(uv.x, 1.0 - uv.y);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(src_texture, src_sampler, in.uv);
}
"#;

/// The sphere's texture on the GPU with its view and sampler.
pub struct SurfaceTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    /// Width and height of mip level 0.
    pub dimensions: (u32, u32),
    pub mip_level_count: u32,
}

impl SurfaceTexture {
    /// Validate, downsample and upload `image`, then build its mip chain.
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &DecodedImage,
        policy: &TexturePolicy,
    ) -> Result<Self, TextureError> {
        let prepared = prepare_image(image, policy)?;
        let (width, height) = (prepared.width, prepared.height);
        let format = prepared.format.wgpu_format();

        let limit = device.limits().max_texture_dimension_2d;
        if width > limit || height > limit {
            return Err(TextureError::UploadFailed {
                reason: format!("{width}x{height} exceeds the device limit of {limit}"),
            });
        }

        let mip_levels = if policy.generate_mipmaps {
            mip_level_count(width, height)
        } else {
            1
        };

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("sphere-surface-texture"),
            size,
            mip_level_count: mip_levels,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &prepared.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * prepared.format.bytes_per_pixel() as u32),
                rows_per_image: None,
            },
            size,
        );

        if mip_levels > 1 {
            generate_mipmaps(device, queue, &texture, format, mip_levels);
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Longitude wraps at the seam; latitude stops at the poles.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("sphere-surface-sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Linear,
            ..Default::default()
        });

        log::info!(
            "Uploaded surface texture {}x{} -> {width}x{height} ({mip_levels} mips)",
            image.width,
            image.height
        );

        Ok(Self {
            texture,
            view,
            sampler,
            dimensions: (width, height),
            mip_level_count: mip_levels,
        })
    }
}

/// Fill mip levels `1..mip_count` by repeatedly blitting the level above.
fn generate_mipmaps(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    format: wgpu::TextureFormat,
    mip_count: u32,
) {
    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("mipmap-bind-group-layout"),
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

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("mipmap-blit-shader"),
        source: wgpu::ShaderSource::Wgsl(BLIT_SHADER_SOURCE.into()),
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("mipmap-pipeline-layout"),
        bind_group_layouts: &[&bind_group_layout],
        immediate_size: 0,
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("mipmap-pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview_mask: None,
        cache: None,
    });

    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("mipmap-sampler"),
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("mipmap-encoder"),
    });

    for level in 1..mip_count {
        let src_view = texture.create_view(&wgpu::TextureViewDescriptor {
            base_mip_level: level - 1,
            mip_level_count: Some(1),
            ..Default::default()
        });
        let dst_view = texture.create_view(&wgpu::TextureViewDescriptor {
            base_mip_level: level,
            mip_level_count: Some(1),
            ..Default::default()
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("mipmap-bind-group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&src_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("mipmap-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &dst_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            ..Default::default()
        });

        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.draw(0..3, 0..1);
    }

    queue.submit(std::iter::once(encoder.finish()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::create_test_device_queue;

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> DecodedImage {
        DecodedImage::rgba8(width, height, rgba.repeat((width * height) as usize))
    }

    #[test]
    fn test_mipmap_level_count_calculation() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(2, 2), 2);
        assert_eq!(mip_level_count(4, 4), 3);
        assert_eq!(mip_level_count(256, 256), 9);
        assert_eq!(mip_level_count(512, 256), 10);
        assert_eq!(mip_level_count(1024, 1024), 11);
        assert_eq!(mip_level_count(300, 7), 9);
    }

    #[test]
    fn test_short_pixel_buffer_is_rejected() {
        let image = DecodedImage::rgba8(4, 4, vec![0; 63]);
        let err = prepare_image(&image, &TexturePolicy::default()).unwrap_err();
        let TextureError::UploadFailed { reason } = err;
        assert!(reason.contains("expected 64"), "{reason}");
    }

    #[test]
    fn test_zero_dimension_is_rejected() {
        let image = DecodedImage::rgba8(0, 16, Vec::new());
        assert!(prepare_image(&image, &TexturePolicy::default()).is_err());
    }

    #[test]
    fn test_non_power_of_two_sample_size_is_rejected() {
        let policy = TexturePolicy {
            sample_size: 3,
            ..Default::default()
        };
        assert!(prepare_image(&solid(8, 8, [0; 4]), &policy).is_err());
    }

    #[test]
    fn test_default_policy_reduces_by_eight() {
        let prepared = prepare_image(&solid(64, 32, [10, 20, 30, 255]), &TexturePolicy::default())
            .unwrap();
        assert_eq!((prepared.width, prepared.height), (8, 4));
        assert_eq!(prepared.pixels.len(), 8 * 4 * 4);
        assert!(prepared.pixels.chunks(4).all(|p| p == [10, 20, 30, 255]));
    }

    #[test]
    fn test_sample_size_one_keeps_image() {
        let image = solid(5, 3, [1, 2, 3, 4]);
        let policy = TexturePolicy {
            sample_size: 1,
            generate_mipmaps: false,
        };
        assert_eq!(prepare_image(&image, &policy).unwrap(), image);
    }

    #[test]
    fn test_small_image_caps_reduction() {
        // 4x4 cannot be reduced by 8; it is reduced by 4 instead.
        let prepared = prepare_image(&solid(4, 6, [0; 4]), &TexturePolicy::default()).unwrap();
        assert_eq!((prepared.width, prepared.height), (1, 2));
    }

    #[test]
    fn test_downsample_averages_blocks() {
        // 2x2 image: black, white / white, black -> mid grey.
        let pixels = [
            [0, 0, 0, 255],
            [255, 255, 255, 255],
            [255, 255, 255, 255],
            [0, 0, 0, 255],
        ]
        .concat();
        let policy = TexturePolicy {
            sample_size: 2,
            generate_mipmaps: false,
        };
        let prepared = prepare_image(&DecodedImage::rgba8(2, 2, pixels), &policy).unwrap();
        assert_eq!(prepared.pixels, vec![128, 128, 128, 255]);
    }

    #[test]
    fn test_downsample_large_white_block_stays_white() {
        let image = solid(4096, 2048, [255, 255, 255, 255]);
        let policy = TexturePolicy {
            sample_size: 2048,
            generate_mipmaps: false,
        };
        let prepared = prepare_image(&image, &policy).unwrap();
        assert_eq!((prepared.width, prepared.height), (2, 1));
        assert!(prepared.pixels.iter().all(|&c| c == 255));
    }

    #[test]
    fn test_downsample_handles_ragged_edges() {
        let mut pixels = Vec::new();
        for x in 0..3u8 {
            pixels.extend_from_slice(&[x * 100, 0, 0, 255]);
        }
        let policy = TexturePolicy {
            sample_size: 2,
            generate_mipmaps: false,
        };
        let prepared = prepare_image(&DecodedImage::rgba8(3, 1, pixels), &policy);
        // Height 1 caps the factor to 1.
        assert_eq!(prepared.unwrap().width, 3);

        let image = solid(3, 2, [90, 0, 0, 255]);
        let prepared = prepare_image(&image, &policy).unwrap();
        assert_eq!((prepared.width, prepared.height), (2, 1));
        assert_eq!(&prepared.pixels[4..8], &[90, 0, 0, 255]);
    }

    #[test]
    fn test_upload_builds_full_mip_chain() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let image = solid(256, 128, [200, 180, 160, 255]);
        let texture = SurfaceTexture::upload(&device, &queue, &image, &TexturePolicy::default())
            .unwrap();
        assert_eq!(texture.dimensions, (32, 16));
        assert_eq!(texture.mip_level_count, 6);
        assert_eq!(texture.texture.format(), wgpu::TextureFormat::Rgba8UnormSrgb);
    }

    #[test]
    fn test_upload_without_mipmaps() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let policy = TexturePolicy {
            sample_size: 1,
            generate_mipmaps: false,
        };
        let texture =
            SurfaceTexture::upload(&device, &queue, &solid(16, 16, [0; 4]), &policy).unwrap();
        assert_eq!(texture.mip_level_count, 1);
    }

    #[test]
    fn test_upload_rejects_bad_buffer_before_touching_gpu() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let image = DecodedImage::rgba8(16, 16, vec![0; 10]);
        assert!(SurfaceTexture::upload(&device, &queue, &image, &TexturePolicy::default()).is_err());
    }
}
