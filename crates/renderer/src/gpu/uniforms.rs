use bytemuck::{Pod, Zeroable};
use carousel::UniformSnapshot;

/// std140 mirror of the `CarouselParams` block declared in the shader prelude.
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct CarouselUniforms {
    pub resolution: [f32; 2],
    pub grid_size: [f32; 2],
    pub texture0_size: [f32; 2],
    pub texture1_size: [f32; 2],
    pub background0: [[f32; 4]; 2],
    pub background1: [[f32; 4]; 2],
    pub progress: f32,
    pub time: f32,
    pub animation_direction: f32,
    pub padding0: f32,
}

unsafe impl Zeroable for CarouselUniforms {}
unsafe impl Pod for CarouselUniforms {}

impl CarouselUniforms {
    pub fn from_snapshot(snapshot: &UniformSnapshot) -> Self {
        Self {
            resolution: snapshot.resolution,
            grid_size: snapshot.grid_size,
            texture0_size: snapshot.texture0.size(),
            texture1_size: snapshot.texture1.size(),
            background0: snapshot.background0,
            background1: snapshot.background1,
            progress: snapshot.progress,
            time: snapshot.time,
            animation_direction: snapshot.animation_direction,
            padding0: 0.0,
        }
    }
}
