use image::RgbaImage;
use serde::Serialize;

use crate::palette::{ColorPair, Rgb};

/// Opaque reference to a texture owned by whichever [`TextureSink`] created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TextureId(pub u32);

/// GPU-resident image reference plus its size in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TextureHandle {
    pub id: TextureId,
    pub width: u32,
    pub height: u32,
}

impl TextureHandle {
    pub fn size(&self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }
}

/// Sampler addressing requested for an uploaded texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureWrap {
    /// Slide images: sample the edge texel outside `[0, 1]`.
    Clamp,
    /// Noise texture: tile across the surface.
    Repeat,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct UploadError {
    message: String,
}

impl UploadError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Destination for decoded images; implemented by the GPU texture store.
pub trait TextureSink {
    fn upload(
        &mut self,
        label: &str,
        image: &RgbaImage,
        wrap: TextureWrap,
    ) -> Result<TextureId, UploadError>;
}

/// One loaded carousel entry. Immutable once the loader returns it.
#[derive(Debug, Clone, PartialEq)]
pub struct Slide {
    pub index: usize,
    pub texture: TextureHandle,
    pub primary: Rgb,
    pub secondary: Rgb,
    pub title: Option<String>,
    pub body: Option<String>,
}

impl Slide {
    pub fn background(&self) -> ColorPair {
        ColorPair {
            primary: self.primary,
            secondary: self.secondary,
        }
    }
}
