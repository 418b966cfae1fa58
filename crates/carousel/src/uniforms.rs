use crate::slide::{TextureHandle, TextureId};
use crate::state::Carousel;

/// Uniform names, in the order [`UniformSnapshot::named`] lists them.
pub const UNIFORM_NAMES: [&str; 12] = [
    "uProgress",
    "uResolution",
    "uGridSize",
    "uTexture0",
    "uTexture0Size",
    "uTexture1",
    "uTexture1Size",
    "uNoiseTexture",
    "uBackground0",
    "uBackground1",
    "uTime",
    "uAnimationDirection",
];

/// Per-frame inputs that do not live in the carousel state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameParams {
    pub time: f32,
    pub resolution: [f32; 2],
    pub grid_size: [f32; 2],
    pub noise: TextureHandle,
    pub resized: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Texture(TextureId),
    Colors([[f32; 4]; 2]),
}

/// Everything the shader reads for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformSnapshot {
    pub progress: f32,
    pub resolution: [f32; 2],
    pub grid_size: [f32; 2],
    pub texture0: TextureHandle,
    pub texture1: TextureHandle,
    pub noise: TextureHandle,
    pub background0: [[f32; 4]; 2],
    pub background1: [[f32; 4]; 2],
    pub time: f32,
    pub animation_direction: f32,
}

impl UniformSnapshot {
    pub fn capture(carousel: &Carousel, frame: &FrameParams) -> Self {
        let state = carousel.state();
        let [slot0, slot1] = *state.slots();
        Self {
            progress: carousel.progress(),
            resolution: frame.resolution,
            grid_size: frame.grid_size,
            texture0: slot0.texture,
            texture1: slot1.texture,
            noise: frame.noise,
            background0: slot0.background.to_uniform(),
            background1: slot1.background.to_uniform(),
            time: frame.time,
            animation_direction: state.direction().sign(),
        }
    }

    pub fn named(&self) -> Vec<(&'static str, UniformValue)> {
        use UniformValue::*;
        let values = [
            Float(self.progress),
            Vec2(self.resolution),
            Vec2(self.grid_size),
            Texture(self.texture0.id),
            Vec2(self.texture0.size()),
            Texture(self.texture1.id),
            Vec2(self.texture1.size()),
            Texture(self.noise.id),
            Colors(self.background0),
            Colors(self.background1),
            Float(self.time),
            Float(self.animation_direction),
        ];
        UNIFORM_NAMES.into_iter().zip(values).collect()
    }
}
