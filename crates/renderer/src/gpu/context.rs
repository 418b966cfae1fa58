use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use tracing::{debug, warn};
use winit::dpi::PhysicalSize;
use winit::window::Window;

/// Device, queue and the configured window surface.
pub(crate) struct GpuContext {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface_format: wgpu::TextureFormat,
    pub max_texture_dimension: u32,
    pub size: PhysicalSize<u32>,
    config: wgpu::SurfaceConfiguration,
}

impl GpuContext {
    pub(crate) fn new(window: Arc<Window>, size: PhysicalSize<u32>) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });
        let surface = instance
            .create_surface(window)
            .context("failed to create carousel surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no GPU adapter can present to the carousel window")?;
        let info = adapter.get_info();
        debug!(adapter = %info.name, backend = ?info.backend, "selected GPU adapter");

        let limits = adapter.limits();
        let max_texture_dimension = limits.max_texture_dimension_2d;
        let size = PhysicalSize::new(size.width.max(1), size.height.max(1));
        if size.width.max(size.height) > max_texture_dimension {
            bail!(
                "window is {}x{} but the GPU caps surfaces at {max_texture_dimension} pixels",
                size.width,
                size.height
            );
        }

        let caps = surface.get_capabilities(&adapter);
        let surface_format = pick_surface_format(&caps.formats)
            .context("surface reports no supported formats")?;
        if surface_format.is_srgb() {
            warn!(?surface_format, "only sRGB surface formats available; slide colors will shift");
        }

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("gridwarp device"),
            required_features: wgpu::Features::empty(),
            required_limits: limits,
            memory_hints: wgpu::MemoryHints::MemoryUsage,
            trace: wgpu::Trace::default(),
        }))
        .context("failed to create GPU device")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: pick_present_mode(&caps.present_modes),
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: Vec::new(),
            desired_maximum_frame_latency: 2,
        };
        debug!(present_mode = ?config.present_mode, ?surface_format, "configuring surface");
        surface.configure(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            surface_format,
            max_texture_dimension,
            size,
            config,
        })
    }

    /// Reconfigures the swapchain. Minimised (zero-sized) windows are skipped.
    pub(crate) fn resize(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        self.size = size;
        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(&self.device, &self.config);
    }
}

/// Slides are uploaded as `Rgba8Unorm`; a linear swapchain presents their
/// bytes unchanged.
fn pick_surface_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .copied()
        .find(|format| !format.is_srgb())
        .or_else(|| formats.first().copied())
}

fn pick_present_mode(modes: &[wgpu::PresentMode]) -> wgpu::PresentMode {
    if modes.contains(&wgpu::PresentMode::Fifo) {
        wgpu::PresentMode::Fifo
    } else {
        modes.first().copied().unwrap_or(wgpu::PresentMode::Fifo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::{PresentMode, TextureFormat};

    #[test]
    fn prefers_linear_surface_formats() {
        let formats = [TextureFormat::Bgra8UnormSrgb, TextureFormat::Bgra8Unorm];
        assert_eq!(pick_surface_format(&formats), Some(TextureFormat::Bgra8Unorm));
        assert_eq!(
            pick_surface_format(&[TextureFormat::Rgba8UnormSrgb]),
            Some(TextureFormat::Rgba8UnormSrgb)
        );
        assert_eq!(pick_surface_format(&[]), None);
    }

    #[test]
    fn present_mode_falls_back_to_first_reported() {
        assert_eq!(
            pick_present_mode(&[PresentMode::Mailbox, PresentMode::Fifo]),
            PresentMode::Fifo
        );
        assert_eq!(pick_present_mode(&[PresentMode::Immediate]), PresentMode::Immediate);
        assert_eq!(pick_present_mode(&[]), PresentMode::Fifo);
    }
}
