//! Deterministic companion core
//!
//! All behavior logic lives here. This module must stay pure and testable:
//! - Deadlines compared against a caller-supplied monotonic clock, no timers
//! - Seeded RNG only
//! - No rendering or platform dependencies (the render adapter is a trait)

pub mod collide;
pub mod controller;
pub mod messages;
pub mod physics;
pub mod state;

pub use collide::predict;
pub use controller::Controller;
pub use messages::{Message, MessageCatalog, MessageKind};
pub use state::{BehaviorState, Bounds, CompanionBody, Facing};
