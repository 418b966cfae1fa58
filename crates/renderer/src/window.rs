use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use carousel::{Carousel, Direction, RenderLoop, ResourceLoader, TransitionOutcome, UniformSnapshot};
use tracing::{debug, error, info, warn};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use crate::gpu::GpuState;
use crate::types::{CarouselPlan, RendererConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InputAction {
    /// Signed slide step; normalised through [`Direction::from_step`].
    Step(i32),
    Close,
}

pub(crate) fn action_for_key(key: &Key) -> Option<InputAction> {
    match key {
        Key::Named(NamedKey::ArrowRight | NamedKey::Space) => Some(InputAction::Step(1)),
        Key::Named(NamedKey::ArrowLeft) => Some(InputAction::Step(-1)),
        Key::Named(NamedKey::Escape) => Some(InputAction::Close),
        Key::Character(value) => match value.as_str() {
            "l" | "L" | " " => Some(InputAction::Step(1)),
            "h" | "H" => Some(InputAction::Step(-1)),
            _ => None,
        },
        _ => None,
    }
}

/// Everything the event loop mutates: GPU resources, the carousel and its
/// frame clock.
struct WindowState {
    window: Arc<Window>,
    gpu: GpuState,
    carousel: Carousel,
    frames: RenderLoop,
    base_title: String,
    focused: Option<usize>,
}

impl WindowState {
    /// Creates the GPU state, then loads every asset through it. Nothing is
    /// drawn until this returns.
    fn new(window: Arc<Window>, config: &RendererConfig, plan: CarouselPlan) -> Result<Self> {
        let mut gpu = GpuState::new(window.clone(), window.inner_size(), config.clear_color())?;

        let loader = ResourceLoader::new().context("failed to prepare asset loader")?;
        let assets = loader
            .load(&plan.slides, &plan.noise, gpu.textures_mut())
            .context("failed to load carousel assets")?;
        info!(
            slides = assets.slides.len(),
            textures = gpu.texture_count(),
            "carousel textures uploaded"
        );

        let carousel =
            Carousel::new(assets.slides, plan.start).context("failed to build carousel")?;
        let size = gpu.size();
        let frames = RenderLoop::new(
            config.time_step,
            config.grid_size,
            (size.width, size.height),
            assets.noise,
        );

        let mut state = Self {
            window,
            gpu,
            carousel,
            frames,
            base_title: config.title.clone(),
            focused: None,
        };
        state.sync_title();
        Ok(state)
    }

    fn window(&self) -> &Window {
        self.window.as_ref()
    }

    fn size(&self) -> PhysicalSize<u32> {
        self.gpu.size()
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.gpu.resize(new_size);
        self.frames.resize(new_size.width, new_size.height);
    }

    /// Returns `true` when the window should close.
    fn handle_action(&mut self, action: InputAction) -> bool {
        match action {
            InputAction::Close => true,
            InputAction::Step(step) => {
                match Direction::from_step(step) {
                    Ok(direction) => {
                        if let TransitionOutcome::Started { from, to } =
                            self.carousel.request_transition(direction, Instant::now())
                        {
                            debug!(from, to, "input started transition");
                        }
                    }
                    Err(err) => warn!(step, error = %err, "ignoring input"),
                }
                false
            }
        }
    }

    fn handle_key(&mut self, event: &KeyEvent) -> bool {
        if event.state != ElementState::Pressed || event.repeat {
            return false;
        }
        action_for_key(&event.logical_key).is_some_and(|action| self.handle_action(action))
    }

    fn render_frame(&mut self) -> Result<(), wgpu::SurfaceError> {
        if let Some(current) = self.carousel.tick(Instant::now()) {
            debug!(current, "carousel settled");
        }
        self.sync_title();

        let params = self.frames.advance();
        if params.resized {
            debug!(
                width = params.resolution[0],
                height = params.resolution[1],
                "canvas resized"
            );
        }
        let snapshot = UniformSnapshot::capture(&self.carousel, &params);
        self.gpu.render(&snapshot)
    }

    /// Mirrors the caption closest to rest into the window title.
    fn sync_title(&mut self) {
        let focused = self.carousel.focused_caption();
        if self.focused == Some(focused) {
            return;
        }
        self.focused = Some(focused);
        let caption = self
            .carousel
            .state()
            .slides()
            .get(focused)
            .and_then(|slide| slide.title.as_deref());
        let title = match caption {
            Some(caption) => format!("{caption} · {}", self.base_title),
            None => self.base_title.clone(),
        };
        self.window.set_title(&title);
    }
}

pub(crate) fn run_window(config: &RendererConfig, plan: CarouselPlan) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to initialize event loop")?;
    let window_size = PhysicalSize::new(config.surface_size.0, config.surface_size.1);
    let window = WindowBuilder::new()
        .with_title(&config.title)
        .with_inner_size(window_size)
        .with_visible(false)
        .build(&event_loop)
        .context("failed to create carousel window")?;
    let window = Arc::new(window);

    let mut state = WindowState::new(window.clone(), config, plan)?;
    state.window().set_visible(true);
    state.window().request_redraw();

    event_loop
        .run(move |event, elwt| {
            elwt.set_control_flow(ControlFlow::Wait);

            match event {
                Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
                    match event {
                        WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                            elwt.exit();
                        }
                        WindowEvent::KeyboardInput { event, .. } => {
                            if state.handle_key(&event) {
                                elwt.exit();
                            }
                        }
                        WindowEvent::MouseInput {
                            state: ElementState::Pressed,
                            button: MouseButton::Left,
                            ..
                        } => {
                            state.handle_action(InputAction::Step(1));
                        }
                        WindowEvent::Resized(new_size) => {
                            state.resize(new_size);
                        }
                        WindowEvent::ScaleFactorChanged {
                            mut inner_size_writer,
                            ..
                        } => {
                            let _ = inner_size_writer.request_inner_size(state.size());
                        }
                        WindowEvent::RedrawRequested => match state.render_frame() {
                            Ok(()) => {}
                            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                                state.resize(state.size());
                            }
                            Err(wgpu::SurfaceError::OutOfMemory) => {
                                error!("surface out of memory; exiting");
                                elwt.exit();
                            }
                            Err(wgpu::SurfaceError::Timeout) => {
                                warn!("surface timeout; retrying next frame");
                            }
                            Err(other) => {
                                warn!("surface error: {other:?}; retrying next frame");
                            }
                        },
                        _ => {}
                    }
                }
                Event::AboutToWait => {
                    state.window().request_redraw();
                }
                _ => {}
            }
        })
        .map_err(|err| anyhow!("event loop error: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrows_and_vim_keys_step_the_carousel() {
        assert_eq!(
            action_for_key(&Key::Named(NamedKey::ArrowRight)),
            Some(InputAction::Step(1))
        );
        assert_eq!(
            action_for_key(&Key::Named(NamedKey::ArrowLeft)),
            Some(InputAction::Step(-1))
        );
        assert_eq!(
            action_for_key(&Key::Character("l".into())),
            Some(InputAction::Step(1))
        );
        assert_eq!(
            action_for_key(&Key::Character("h".into())),
            Some(InputAction::Step(-1))
        );
    }

    #[test]
    fn space_advances_and_escape_closes() {
        assert_eq!(
            action_for_key(&Key::Named(NamedKey::Space)),
            Some(InputAction::Step(1))
        );
        assert_eq!(
            action_for_key(&Key::Character(" ".into())),
            Some(InputAction::Step(1))
        );
        assert_eq!(
            action_for_key(&Key::Named(NamedKey::Escape)),
            Some(InputAction::Close)
        );
        assert_eq!(action_for_key(&Key::Character("x".into())), None);
    }
}
