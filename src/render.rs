//! Render adapter boundary
//!
//! The core never touches the visible surface. Everything pixel-shaped goes
//! through this trait; the wasm front end implements it with DOM elements and
//! tests implement it with a recording stub.

use crate::core::messages::Message;

/// Named visual state the surface should display for the companion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualState {
    Greet,
    Idle,
    WalkLeft,
    WalkRight,
    Jump,
    Drag,
    Fall,
    Land,
}

impl VisualState {
    /// Stable identifier, used as a CSS class by the DOM adapter.
    pub fn as_str(&self) -> &'static str {
        match self {
            VisualState::Greet => "greet",
            VisualState::Idle => "idle",
            VisualState::WalkLeft => "walk-left",
            VisualState::WalkRight => "walk-right",
            VisualState::Jump => "jump",
            VisualState::Drag => "drag",
            VisualState::Fall => "fall",
            VisualState::Land => "land",
        }
    }
}

/// The surface the companion lives on.
///
/// `x` is the body's left edge in viewport px; `y` is the body's offset above
/// the floor (positive = up). The adapter owns the mapping to whatever
/// coordinate system the surface uses.
pub trait RenderAdapter {
    /// Current viewport dimensions (width, height) in px.
    fn viewport(&self) -> (f32, f32);

    /// Move the companion sprite.
    fn set_position(&mut self, x: f32, y: f32);

    /// Switch the displayed visual state. A missing asset must degrade to
    /// keeping the previous visual, never to an error.
    fn set_visual(&mut self, visual: VisualState);

    /// Show the speech overlay and return its measured width in px.
    fn show_overlay(&mut self, message: &Message) -> f32;

    /// Reposition the overlay (x = overlay left edge, y = offset above floor).
    fn move_overlay(&mut self, x: f32, y: f32);

    /// Remove the overlay if present. Safe to call when none is shown.
    fn hide_overlay(&mut self);
}
