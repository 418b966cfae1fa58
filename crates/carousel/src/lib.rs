//! Image carousel core: asset loading, palette extraction and the transition
//! state machine that feeds the grid-warp shader.
//!
//! Nothing in this crate touches the GPU. Textures are created through the
//! [`TextureSink`] trait, and the per-frame shader inputs come out as a plain
//! [`UniformSnapshot`].

pub mod decode;
pub mod frame;
pub mod loader;
pub mod palette;
pub mod slide;
pub mod state;
pub mod timeline;
pub mod uniforms;

pub use decode::{AssetError, AssetLocation, DecodedImage, ImageDecoder};
pub use frame::{RenderLoop, DEFAULT_TIME_STEP};
pub use loader::{LoadError, LoadedAssets, PreparedSlide, ResourceLoader, SlideFailure, SlideSource};
pub use palette::{extract_colors, extract_palette, ColorPair, PaletteError, Rgb};
pub use slide::{Slide, TextureHandle, TextureId, TextureSink, TextureWrap, UploadError};
pub use state::{
    next_index, Caption, Carousel, CarouselError, CarouselState, Direction, Phase, SlotBinding,
    TransitionOutcome,
};
pub use timeline::{AnimationDriver, TransitionHooks};
pub use uniforms::{FrameParams, UniformSnapshot, UniformValue, UNIFORM_NAMES};
