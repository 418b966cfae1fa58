//! GPU side of the carousel.
//!
//! - `context` owns wgpu instance/device/surface wiring and reconfigures the
//!   swapchain when the window resizes.
//! - `textures` is the append-only [`carousel::TextureSink`] the loader
//!   uploads slides and noise into.
//! - `pipeline` compiles the wrapped GLSL and builds the two bind group layouts
//!   (uniform block, texture/sampler pairs).
//! - `uniforms` packs a [`carousel::UniformSnapshot`] into the std140 block.
//! - `state` glues everything together behind `GpuState`.

mod context;
mod pipeline;
mod state;
mod textures;
mod uniforms;

pub(crate) use state::GpuState;
