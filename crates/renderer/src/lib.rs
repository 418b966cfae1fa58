//! Windowed renderer for the gridwarp carousel.
//!
//! The flow from configuration to pixels:
//!
//! ```text
//!   gridwarp CLI
//!          │ RendererConfig + CarouselPlan
//!          ▼
//!   Renderer::run ──▶ WindowState ──▶ winit event loop ──▶ render_frame()
//!                         │                                   │
//!                         └─▶ ResourceLoader (TextureStore)   └─▶ UniformSnapshot ─▶ GPU UBO
//! ```
//!
//! `WindowState` owns the GPU resources and the [`carousel::Carousel`]; input
//! events turn into transition requests and every redraw ticks the timeline
//! and issues one full-screen draw of the grid-warp shader.

mod compile;
mod gpu;
mod types;
mod window;

use anyhow::Result;

pub use types::{CarouselPlan, RendererConfig};

/// High-level entry point that owns the chosen configuration.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Opens the window, loads every asset in `plan` and runs until the
    /// window closes.
    ///
    /// Fails before anything is shown if an asset cannot be loaded.
    pub fn run(&self, plan: CarouselPlan) -> Result<()> {
        window::run_window(&self.config, plan)
    }
}
