//! Multi-stage transition timeline.
//!
//! A transition is a fixed set of [`Track`]s laid out on one clock that starts
//! when [`AnimationDriver::run`] is called. Track starts are staggered with
//! explicit offsets and waited on through a min-heap, so ordering never depends
//! on the order in which tracks were declared.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::state::Direction;

/// Total length of a transition; `on_complete` fires at this offset.
pub const TRANSITION_DURATION: Duration = Duration::from_millis(1500);

pub const OUTGOING_TITLE_DURATION: Duration = Duration::from_millis(500);
pub const INCOMING_TITLE_DELAY: Duration = Duration::from_millis(100);
pub const INCOMING_TITLE_DURATION: Duration = Duration::from_millis(1000);
pub const OUTGOING_BODY_DELAY: Duration = Duration::from_millis(100);
pub const OUTGOING_BODY_DURATION: Duration = Duration::from_millis(350);
pub const INCOMING_BODY_DELAY: Duration = Duration::from_millis(450);
pub const INCOMING_BODY_DURATION: Duration = Duration::from_millis(500);

/// Distance a caption title travels between rest and off-screen.
pub const CAPTION_TRAVEL: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    Linear,
    EaseOut,
    EaseInOut,
}

impl Curve {
    pub fn sample(self, t: f32) -> f32 {
        let clamped = t.clamp(0.0, 1.0);
        match self {
            Curve::Linear => clamped,
            Curve::EaseOut => {
                let inverse = 1.0 - clamped;
                1.0 - inverse * inverse * inverse
            }
            Curve::EaseInOut => {
                if clamped < 0.5 {
                    2.0 * clamped * clamped
                } else {
                    -1.0 + (4.0 - 2.0 * clamped) * clamped
                }
            }
        }
    }
}

/// Which caption a track moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Outgoing,
    Incoming,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    /// Shader `uProgress`.
    Progress,
    TitleOffset(Layer),
    BodyOpacity(Layer),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Track {
    pub property: Property,
    pub offset: Duration,
    pub duration: Duration,
    pub from: f32,
    pub to: f32,
    pub curve: Curve,
}

impl Track {
    pub fn end(&self) -> Duration {
        self.offset + self.duration
    }

    /// Value at `elapsed` since the timeline started.
    pub fn value_at(&self, elapsed: Duration) -> f32 {
        let local = elapsed.saturating_sub(self.offset);
        let t = local.as_secs_f32() / self.duration.as_secs_f32().max(f32::EPSILON);
        self.from + (self.to - self.from) * self.curve.sample(t)
    }
}

/// The tracks of one transition. Titles leave against the travel direction
/// and arrive from the side the carousel is moving toward.
pub fn transition_tracks(direction: Direction) -> Vec<Track> {
    let travel = CAPTION_TRAVEL * direction.sign();
    vec![
        Track {
            property: Property::TitleOffset(Layer::Outgoing),
            offset: Duration::ZERO,
            duration: OUTGOING_TITLE_DURATION,
            from: 0.0,
            to: -travel,
            curve: Curve::EaseInOut,
        },
        Track {
            property: Property::TitleOffset(Layer::Incoming),
            offset: INCOMING_TITLE_DELAY,
            duration: INCOMING_TITLE_DURATION,
            from: travel,
            to: 0.0,
            curve: Curve::EaseOut,
        },
        Track {
            property: Property::BodyOpacity(Layer::Outgoing),
            offset: OUTGOING_BODY_DELAY,
            duration: OUTGOING_BODY_DURATION,
            from: 1.0,
            to: 0.0,
            curve: Curve::EaseOut,
        },
        Track {
            property: Property::BodyOpacity(Layer::Incoming),
            offset: INCOMING_BODY_DELAY,
            duration: INCOMING_BODY_DURATION,
            from: 0.0,
            to: 1.0,
            curve: Curve::EaseOut,
        },
        Track {
            property: Property::Progress,
            offset: Duration::ZERO,
            duration: TRANSITION_DURATION,
            from: 0.0,
            to: 1.0,
            curve: Curve::Linear,
        },
    ]
}

/// Callbacks the driver fires into whoever owns the animated state.
pub trait TransitionHooks {
    fn on_start(&mut self);
    fn apply(&mut self, property: Property, value: f32);
    fn on_complete(&mut self);
}

struct ActiveTimeline {
    start: Instant,
    tracks: Vec<Track>,
    pending: BinaryHeap<Reverse<(Duration, usize)>>,
    running: Vec<usize>,
}

/// Runs at most one transition timeline at a time.
#[derive(Default)]
pub struct AnimationDriver {
    active: Option<ActiveTimeline>,
}

impl AnimationDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Starts a transition timeline. Returns `false` without touching `hooks`
    /// when one is already running.
    pub fn run(&mut self, direction: Direction, now: Instant, hooks: &mut impl TransitionHooks) -> bool {
        if self.active.is_some() {
            return false;
        }

        let tracks = transition_tracks(direction);
        hooks.on_start();
        let mut pending = BinaryHeap::with_capacity(tracks.len());
        for (index, track) in tracks.iter().enumerate() {
            hooks.apply(track.property, track.from);
            pending.push(Reverse((track.offset, index)));
        }
        debug!(?direction, tracks = tracks.len(), "timeline started");

        self.active = Some(ActiveTimeline {
            start: now,
            tracks,
            pending,
            running: Vec::new(),
        });
        true
    }

    /// Advances the running timeline to `now`. Returns `true` on the tick that
    /// completed it.
    pub fn tick(&mut self, now: Instant, hooks: &mut impl TransitionHooks) -> bool {
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        let elapsed = now.saturating_duration_since(active.start);

        while let Some(Reverse((offset, index))) = active.pending.peek().copied() {
            if offset > elapsed {
                break;
            }
            active.pending.pop();
            active.running.push(index);
        }

        let tracks = &active.tracks;
        active.running.retain(|&index| {
            let track = &tracks[index];
            hooks.apply(track.property, track.value_at(elapsed));
            elapsed < track.end()
        });

        if elapsed < TRANSITION_DURATION {
            return false;
        }

        for Reverse((_, index)) in active.pending.drain() {
            let track = &active.tracks[index];
            hooks.apply(track.property, track.to);
        }
        self.active = None;
        hooks.on_complete();
        true
    }
}
