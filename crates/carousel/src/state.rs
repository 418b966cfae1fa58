//! The transition core.
//!
//! [`Carousel`] is the only writer of [`CarouselState`]. It owns which two
//! slides are bound to the shader slots, refuses re-entrant transitions and
//! drives the timeline through [`TransitionHooks`].

use std::time::Instant;

use tracing::{debug, info};

use crate::palette::ColorPair;
use crate::slide::{Slide, TextureHandle};
use crate::timeline::{AnimationDriver, Layer, Property, TransitionHooks, CAPTION_TRAVEL};

/// Minimum number of slides a carousel can rotate through.
pub const MIN_SLIDES: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CarouselError {
    #[error("a carousel needs at least {min} slides, got {0}", min = MIN_SLIDES)]
    TooFewSlides(usize),
    #[error("start slide {index} is out of range for {len} slides")]
    StartOutOfRange { index: usize, len: usize },
    #[error("transition direction must be nonzero")]
    ZeroDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    /// Normalises any nonzero step by its sign.
    pub fn from_step(step: i32) -> Result<Self, CarouselError> {
        match step.signum() {
            1 => Ok(Direction::Forward),
            -1 => Ok(Direction::Backward),
            _ => Err(CarouselError::ZeroDirection),
        }
    }

    pub fn step(self) -> i32 {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }

    pub fn sign(self) -> f32 {
        self.step() as f32
    }
}

/// `(current + direction + len) mod len`.
pub fn next_index(current: usize, len: usize, direction: Direction) -> usize {
    match direction {
        Direction::Forward => (current + 1) % len,
        Direction::Backward => (current + len - 1) % len,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Animating,
}

/// Everything one shader slot needs from a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotBinding {
    pub texture: TextureHandle,
    pub background: ColorPair,
}

impl SlotBinding {
    fn of(slide: &Slide) -> Self {
        Self {
            texture: slide.texture,
            background: slide.background(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CarouselState {
    slides: Vec<Slide>,
    current: usize,
    incoming: Option<usize>,
    direction: Direction,
    slots: [SlotBinding; 2],
}

impl CarouselState {
    fn new(slides: Vec<Slide>, start: usize) -> Result<Self, CarouselError> {
        if slides.len() < MIN_SLIDES {
            return Err(CarouselError::TooFewSlides(slides.len()));
        }
        let slot = match slides.get(start) {
            Some(slide) => SlotBinding::of(slide),
            None => {
                return Err(CarouselError::StartOutOfRange {
                    index: start,
                    len: slides.len(),
                })
            }
        };
        Ok(Self {
            slides,
            current: start,
            incoming: None,
            direction: Direction::default(),
            slots: [slot, slot],
        })
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn incoming(&self) -> Option<usize> {
        self.incoming
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn slots(&self) -> &[SlotBinding; 2] {
        &self.slots
    }

    pub fn is_animating(&self) -> bool {
        self.incoming.is_some()
    }

    pub fn phase(&self) -> Phase {
        if self.is_animating() {
            Phase::Animating
        } else {
            Phase::Idle
        }
    }

    fn begin(&mut self, incoming: usize, direction: Direction) {
        self.incoming = Some(incoming);
        self.direction = direction;
        self.slots[1] = SlotBinding::of(&self.slides[incoming]);
    }

    fn finish(&mut self) {
        if let Some(incoming) = self.incoming.take() {
            self.current = incoming;
            self.slots[0] = self.slots[1];
        }
    }
}

/// Title offset and body opacity of one slide's caption.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Caption {
    pub title_offset: f32,
    pub body_opacity: f32,
}

impl Caption {
    const AT_REST: Caption = Caption {
        title_offset: 0.0,
        body_opacity: 1.0,
    };
    const HIDDEN: Caption = Caption {
        title_offset: CAPTION_TRAVEL,
        body_opacity: 0.0,
    };
}

#[derive(Debug, Clone, PartialEq)]
struct Motion {
    progress: f32,
    captions: Vec<Caption>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Started { from: usize, to: usize },
    Ignored,
}

pub struct Carousel {
    state: CarouselState,
    motion: Motion,
    driver: AnimationDriver,
}

impl Carousel {
    pub fn new(slides: Vec<Slide>, start: usize) -> Result<Self, CarouselError> {
        let state = CarouselState::new(slides, start)?;
        let captions = (0..state.slides.len())
            .map(|index| {
                if index == start {
                    Caption::AT_REST
                } else {
                    Caption::HIDDEN
                }
            })
            .collect();
        Ok(Self {
            state,
            motion: Motion {
                progress: 0.0,
                captions,
            },
            driver: AnimationDriver::new(),
        })
    }

    pub fn state(&self) -> &CarouselState {
        &self.state
    }

    pub fn is_animating(&self) -> bool {
        self.state.is_animating()
    }

    pub fn progress(&self) -> f32 {
        self.motion.progress
    }

    pub fn captions(&self) -> &[Caption] {
        &self.motion.captions
    }

    /// Slide whose caption title sits closest to rest.
    pub fn focused_caption(&self) -> usize {
        self.motion
            .captions
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.title_offset.abs().total_cmp(&b.title_offset.abs()))
            .map(|(index, _)| index)
            .unwrap_or(self.state.current)
    }

    /// Starts a transition unless one is already running.
    pub fn request_transition(&mut self, direction: Direction, now: Instant) -> TransitionOutcome {
        if self.state.is_animating() {
            debug!(?direction, "transition already running; request ignored");
            return TransitionOutcome::Ignored;
        }

        let from = self.state.current;
        let to = next_index(from, self.state.slides.len(), direction);
        let mut hooks = Binding {
            state: &mut self.state,
            motion: &mut self.motion,
            outgoing: from,
            incoming: to,
            direction,
        };
        if !self.driver.run(direction, now, &mut hooks) {
            return TransitionOutcome::Ignored;
        }
        info!(from, to, ?direction, "transition started");
        TransitionOutcome::Started { from, to }
    }

    /// Advances the running transition. Returns the new current slide on the
    /// tick that finished it.
    pub fn tick(&mut self, now: Instant) -> Option<usize> {
        let incoming = self.state.incoming?;
        let mut hooks = Binding {
            outgoing: self.state.current,
            incoming,
            direction: self.state.direction,
            state: &mut self.state,
            motion: &mut self.motion,
        };
        if self.driver.tick(now, &mut hooks) {
            info!(current = self.state.current, "transition finished");
            Some(self.state.current)
        } else {
            None
        }
    }
}

struct Binding<'a> {
    state: &'a mut CarouselState,
    motion: &'a mut Motion,
    outgoing: usize,
    incoming: usize,
    direction: Direction,
}

impl Binding<'_> {
    fn caption(&mut self, layer: Layer) -> &mut Caption {
        let index = match layer {
            Layer::Outgoing => self.outgoing,
            Layer::Incoming => self.incoming,
        };
        &mut self.motion.captions[index]
    }
}

impl TransitionHooks for Binding<'_> {
    fn on_start(&mut self) {
        self.state.begin(self.incoming, self.direction);
        self.motion.progress = 0.0;
    }

    fn apply(&mut self, property: Property, value: f32) {
        match property {
            Property::Progress => self.motion.progress = value,
            Property::TitleOffset(layer) => self.caption(layer).title_offset = value,
            Property::BodyOpacity(layer) => self.caption(layer).body_opacity = value,
        }
    }

    fn on_complete(&mut self) {
        self.state.finish();
        self.motion.progress = 0.0;
    }
}
