use carousel::SlideSource;

/// Immutable configuration passed to the renderer at start-up.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Window size in physical pixels.
    pub surface_size: (u32, u32),
    pub title: String,
    /// Color the surface is cleared to before the carousel is drawn.
    pub clear_color: [f32; 4],
    /// `uTime` increment per rendered frame.
    pub time_step: f32,
    /// Cells per axis of the warp grid (`uGridSize`).
    pub grid_size: [u32; 2],
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: (1280, 720),
            title: "gridwarp".into(),
            clear_color: [1.0, 1.0, 1.0, 1.0],
            time_step: carousel::DEFAULT_TIME_STEP,
            grid_size: [12, 8],
        }
    }
}

impl RendererConfig {
    pub(crate) fn clear_color(&self) -> wgpu::Color {
        let [r, g, b, a] = self.clear_color;
        wgpu::Color {
            r: f64::from(r),
            g: f64::from(g),
            b: f64::from(b),
            a: f64::from(a),
        }
    }
}

/// Assets the window loads before it starts presenting.
#[derive(Debug, Clone)]
pub struct CarouselPlan {
    pub slides: Vec<SlideSource>,
    pub noise: String,
    /// Index of the slide shown first.
    pub start: usize,
}
