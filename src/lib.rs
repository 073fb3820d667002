//! Pixel Pal - an on-screen animated desk companion
//!
//! Core modules:
//! - `core`: Deterministic companion logic (state machine, physics, messages)
//! - `render`: Render adapter boundary (the only thing allowed to touch pixels)
//! - `settings`: User-tunable behavior preferences

pub mod core;
pub mod render;
pub mod settings;

pub use render::{RenderAdapter, VisualState};
pub use settings::Settings;

/// Behavior tuning constants
pub mod consts {
    /// Conceptual tick rate the per-frame units below are calibrated for
    pub const TICK_HZ: f32 = 60.0;

    /// Companion sprite dimensions (px)
    pub const BODY_WIDTH: f32 = 64.0;
    pub const BODY_HEIGHT: f32 = 64.0;

    /// Wandering walk speed (px per frame)
    pub const WALK_SPEED: f32 = 1.4;
    /// Frames the collision predictor projects ahead
    pub const LOOKAHEAD_FRAMES: f32 = 10.0;

    /// Dwell durations (milliseconds)
    pub const GREETING_MS: f64 = 2_500.0;
    pub const WANDER_MIN_MS: f64 = 3_000.0;
    pub const WANDER_MAX_MS: f64 = 8_000.0;
    pub const REST_MIN_MS: f64 = 2_000.0;
    pub const REST_MAX_MS: f64 = 6_000.0;
    /// Fixed rest dwell after a speech bubble hides
    pub const SPEAK_RESUME_MS: f64 = 1_200.0;
    pub const JUMP_MS: f64 = 600.0;
    /// Peak height of the jump hop (px)
    pub const JUMP_HEIGHT: f32 = 28.0;
    /// Cooldown after landing that blocks jumps and messages
    pub const LANDING_COOLDOWN_MS: f64 = 1_500.0;
    /// How often the autonomous-jump probability is rolled while resting
    pub const JUMP_ROLL_INTERVAL_MS: f64 = 1_000.0;

    /// Falling physics (px per frame, positive = downward)
    pub const GRAVITY: f32 = 0.98;
    pub const TERMINAL_VELOCITY: f32 = 18.0;
    /// Horizontal velocity multiplier applied each falling frame
    pub const FRICTION: f32 = 0.92;
    /// Below this magnitude horizontal velocity snaps to zero
    pub const MIN_VELOCITY: f32 = 0.3;
    /// Restitution when a thrown body hits a side wall or the ceiling
    pub const WALL_RESTITUTION: f32 = 0.45;
    /// Floor bounce: progressive damping parameters
    pub const BOUNCE_BASE_DAMPING: f32 = 0.45;
    pub const BOUNCE_DAMPING_INCREMENT: f32 = 0.12;
    pub const BOUNCE_MAX_DAMPING: f32 = 0.85;
    /// Landing slower than this ends the fall instead of bouncing
    pub const MIN_BOUNCE_VELOCITY: f32 = 2.0;

    /// Throw: pointer per-frame displacement scale and per-axis clamp
    pub const THROW_SCALE: f32 = 1.6;
    pub const THROW_MAX: f32 = 24.0;

    /// Pointer movement beyond this many px turns a press into a drag
    pub const DRAG_THRESHOLD_PX: f32 = 4.0;

    /// Speech bubble display duration
    pub const MESSAGE_SHOW_MS: f64 = 4_000.0;
    /// Gap between the sprite's head and the speech bubble (px)
    pub const OVERLAY_GAP: f32 = 8.0;

    /// Cosmetic landing shake
    pub const SHAKE_MS: f64 = 450.0;
    pub const SHAKE_AMPLITUDE: f32 = 3.0;
}

/// Clamp a position component to `[0, max]`, tolerating a negative `max`
/// (degenerate viewport) by collapsing to zero.
#[inline]
pub fn clamp_axis(value: f32, max: f32) -> f32 {
    value.clamp(0.0, max.max(0.0))
}
