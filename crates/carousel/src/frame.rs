use crate::slide::TextureHandle;
use crate::uniforms::FrameParams;

/// Default `uTime` increment per rendered frame.
pub const DEFAULT_TIME_STEP: f32 = 0.01;

/// Frame clock: advances `uTime` by a fixed step and tracks canvas resizes.
#[derive(Debug, Clone)]
pub struct RenderLoop {
    time: f32,
    time_step: f32,
    grid_size: [f32; 2],
    resolution: [f32; 2],
    noise: TextureHandle,
    resized: bool,
    frames: u64,
}

impl RenderLoop {
    pub fn new(
        time_step: f32,
        grid_size: [u32; 2],
        resolution: (u32, u32),
        noise: TextureHandle,
    ) -> Self {
        Self {
            time: 0.0,
            time_step,
            grid_size: [grid_size[0] as f32, grid_size[1] as f32],
            resolution: [resolution.0 as f32, resolution.1 as f32],
            noise,
            resized: true,
            frames: 0,
        }
    }

    /// Zero-sized surfaces (minimised windows) keep the previous resolution.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        let next = [width as f32, height as f32];
        if next != self.resolution {
            self.resolution = next;
            self.resized = true;
        }
    }

    pub fn advance(&mut self) -> FrameParams {
        self.time += self.time_step;
        self.frames += 1;
        let params = FrameParams {
            time: self.time,
            resolution: self.resolution,
            grid_size: self.grid_size,
            noise: self.noise,
            resized: self.resized,
        };
        self.resized = false;
        params
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}
