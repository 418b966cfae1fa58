use carousel::{TextureId, TextureSink, TextureWrap, UploadError};
use image::RgbaImage;
use wgpu::util::{DeviceExt, TextureDataOrder};

pub(crate) struct StoredTexture {
    pub _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

/// Append-only store of every texture the carousel loaded.
///
/// Ids are indices into the store and stay valid until it is dropped.
pub(crate) struct TextureStore {
    device: wgpu::Device,
    queue: wgpu::Queue,
    max_dimension: u32,
    entries: Vec<StoredTexture>,
}

impl TextureStore {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, max_dimension: u32) -> Self {
        Self {
            device,
            queue,
            max_dimension,
            entries: Vec::new(),
        }
    }

    pub fn get(&self, id: TextureId) -> Option<&StoredTexture> {
        self.entries.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl TextureSink for TextureStore {
    fn upload(
        &mut self,
        label: &str,
        image: &RgbaImage,
        wrap: TextureWrap,
    ) -> Result<TextureId, UploadError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(UploadError::new(format!("{label} has no pixels")));
        }
        if width > self.max_dimension || height > self.max_dimension {
            return Err(UploadError::new(format!(
                "{label} is {width}x{height}; GPU max texture dimension is {}",
                self.max_dimension
            )));
        }
        let id = u32::try_from(self.entries.len())
            .map(TextureId)
            .map_err(|_| UploadError::new("texture store is full"))?;

        let texture = self.device.create_texture_with_data(
            &self.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            TextureDataOrder::LayerMajor,
            image.as_raw(),
        );

        let address_mode = match wrap {
            TextureWrap::Clamp => wgpu::AddressMode::ClampToEdge,
            TextureWrap::Repeat => wgpu::AddressMode::Repeat,
        };
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: address_mode,
            address_mode_v: address_mode,
            address_mode_w: address_mode,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        tracing::debug!(label, width, height, ?wrap, id = id.0, "uploaded texture");
        self.entries.push(StoredTexture {
            _texture: texture,
            view,
            sampler,
        });
        Ok(id)
    }
}
