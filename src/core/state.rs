//! Companion state and core types
//!
//! Exactly one subsystem governs the body's position at any instant: the
//! wanderer, the drag handler, or the falling physics. Which one is encoded
//! by the active [`BehaviorState`] variant.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Horizontal facing / movement direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    /// Signed unit direction (-1 left, +1 right).
    pub fn dir(&self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    pub fn flipped(&self) -> Self {
        match self {
            Facing::Left => Facing::Right,
            Facing::Right => Facing::Left,
        }
    }
}

/// Usable surface extents, derived from the viewport and body size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Maximum horizontal position (viewport width - body width)
    pub max_x: f32,
    /// Maximum vertical offset above the floor (viewport height - body height)
    pub max_y: f32,
}

impl Bounds {
    pub fn from_viewport(width: f32, height: f32) -> Self {
        Self {
            max_x: (width - BODY_WIDTH).max(0.0),
            max_y: (height - BODY_HEIGHT).max(0.0),
        }
    }
}

/// The single mutable entity representing the companion.
///
/// `x` is the left edge in px; `y` is the offset above the floor (positive =
/// up). `vy` is the falling velocity with positive = downward, so the physics
/// step subtracts it from `y`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanionBody {
    pub x: f32,
    pub y: f32,
    pub facing: Facing,
    pub vx: f32,
    pub vy: f32,
    /// Consecutive floor bounces in the current fall
    pub bounce_count: u32,
}

impl CompanionBody {
    /// Create the body centered on the floor of the given bounds.
    pub fn centered(bounds: Bounds) -> Self {
        Self {
            x: bounds.max_x / 2.0,
            y: 0.0,
            facing: Facing::Right,
            vx: 0.0,
            vy: 0.0,
            bounce_count: 0,
        }
    }

    /// Horizontal center of the sprite in viewport px.
    pub fn center_x(&self) -> f32 {
        self.x + BODY_WIDTH / 2.0
    }

    /// Defensive clamp after any movement step. Bounds violations are never
    /// fatal regardless of how they were reached.
    pub fn clamp_to(&mut self, bounds: Bounds) {
        self.x = crate::clamp_axis(self.x, bounds.max_x);
        self.y = crate::clamp_axis(self.y, bounds.max_y);
    }
}

/// Which locomotion state a jump returns to when it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeState {
    Wandering,
    Resting,
}

/// Current behavioral state. Exactly one is active; duration-driven states
/// carry their entry time and dwell deadline (ms on the tick clock).
/// BeingDragged and Falling are event-driven and carry no deadline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BehaviorState {
    Greeting { since: f64, until: f64 },
    Wandering { since: f64, until: f64 },
    Resting { since: f64, until: f64 },
    Jumping { since: f64, until: f64, resume: ResumeState },
    Speaking { since: f64, until: f64 },
    BeingDragged,
    Falling,
}

impl BehaviorState {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            BehaviorState::Greeting { .. } => "greeting",
            BehaviorState::Wandering { .. } => "wandering",
            BehaviorState::Resting { .. } => "resting",
            BehaviorState::Jumping { .. } => "jumping",
            BehaviorState::Speaking { .. } => "speaking",
            BehaviorState::BeingDragged => "dragged",
            BehaviorState::Falling => "falling",
        }
    }

    /// States where a press may start a drag or a click may trigger a jump.
    pub fn accepts_pointer(&self) -> bool {
        matches!(
            self,
            BehaviorState::Resting { .. }
                | BehaviorState::Wandering { .. }
                | BehaviorState::Speaking { .. }
        )
    }
}

/// Transient record of an in-progress pointer press.
///
/// Velocity estimation keeps the displacement between the two most recent
/// move samples; [`physics::throw_velocity`](super::physics::throw_velocity)
/// scales and clamps it on release.
#[derive(Debug, Clone)]
pub struct PointerSession {
    pub origin: Vec2,
    pub origin_t: f64,
    /// Sticky: once the press has crossed the drag threshold it can never
    /// count as a click again, even if the pointer snaps back.
    pub moved: bool,
    pub last: Vec2,
    pub last_t: f64,
    /// Displacement of the most recent move sample
    pub frame_delta: Vec2,
}

impl PointerSession {
    pub fn new(x: f32, y: f32, t: f64) -> Self {
        let p = Vec2::new(x, y);
        Self {
            origin: p,
            origin_t: t,
            moved: false,
            last: p,
            last_t: t,
            frame_delta: Vec2::ZERO,
        }
    }

    /// Record a move sample, updating the per-frame displacement and the
    /// sticky moved flag.
    pub fn sample(&mut self, x: f32, y: f32, t: f64) {
        let p = Vec2::new(x, y);
        self.frame_delta = p - self.last;
        self.last = p;
        self.last_t = t;
        if (p - self.origin).length() >= DRAG_THRESHOLD_PX {
            self.moved = true;
        }
    }
}
