//! Behavior state machine
//!
//! Top-level controller: owns the body and the active state, consumes pointer
//! and key events, and drives per-frame updates by delegating to the
//! collision predictor, the physics engine, and the message scheduler.
//!
//! Per-frame ordering is fixed: physics/locomotion first, then overlay
//! repositioning, then dwell-expiry transitions - the overlay never lags a
//! position change by more than one frame. All delays are deadlines compared
//! against the monotonic time passed to [`Controller::tick`]; a deadline can
//! only fire while its owning state is still active, so stale timers are
//! structurally impossible.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::collide;
use super::messages::{LocalClock, Message, MessageCatalog, MessageScheduler};
use super::physics;
use super::state::{
    BehaviorState, Bounds, CompanionBody, PointerSession, ResumeState,
};
use crate::consts::*;
use crate::render::{RenderAdapter, VisualState};
use crate::settings::Settings;

/// Active speech overlay, owned only while speaking.
#[derive(Debug, Clone, Copy)]
struct Overlay {
    width: f32,
}

/// The companion controller. Exclusive owner of the body and behavior state;
/// subsystems receive them by reference and report results, they never decide
/// what is written.
pub struct Controller<R: RenderAdapter> {
    render: R,
    settings: Settings,
    catalog: MessageCatalog,
    rng: Pcg32,
    viewport: (f32, f32),
    bounds: Bounds,
    body: CompanionBody,
    state: BehaviorState,
    pointer: Option<PointerSession>,
    overlay: Option<Overlay>,
    scheduler: MessageScheduler,
    /// Next autonomous-jump probability roll (resting only)
    next_jump_roll: f64,
    /// Landing/jump cooldown blocking jumps and scheduled messages
    cooldown_until: f64,
    /// Cosmetic landing shake window
    shake_until: f64,
    /// Guard against re-entrant transitions inside one frame
    transition_in_progress: bool,
    /// Most recent tick time, used by event entry points
    last_now: f64,
    /// Greeting deadlines are armed on the first tick after initialize
    pending_start: bool,
    initialized: bool,
    shut_down: bool,
}

impl<R: RenderAdapter> Controller<R> {
    pub fn new(render: R, settings: Settings, catalog: MessageCatalog, seed: u64) -> Self {
        let bounds = Bounds::from_viewport(0.0, 0.0);
        Self {
            render,
            settings,
            catalog,
            rng: Pcg32::seed_from_u64(seed),
            viewport: (0.0, 0.0),
            bounds,
            body: CompanionBody::centered(bounds),
            state: BehaviorState::Greeting {
                since: 0.0,
                until: f64::MAX,
            },
            pointer: None,
            overlay: None,
            scheduler: MessageScheduler::new(),
            next_jump_roll: f64::MAX,
            cooldown_until: 0.0,
            shake_until: 0.0,
            transition_in_progress: false,
            last_now: 0.0,
            pending_start: false,
            initialized: false,
            shut_down: false,
        }
    }

    /// Set up the body centered on the floor and enter Greeting.
    pub fn initialize(&mut self, viewport_width: f32, viewport_height: f32) {
        self.viewport = (viewport_width, viewport_height);
        self.bounds = Bounds::from_viewport(viewport_width, viewport_height);
        self.body = CompanionBody::centered(self.bounds);
        self.pending_start = true;
        self.initialized = true;
        self.shut_down = false;
        log::info!(
            "companion initialized ({viewport_width}x{viewport_height}), greeting"
        );
    }

    pub fn state(&self) -> &BehaviorState {
        &self.state
    }

    pub fn body(&self) -> &CompanionBody {
        &self.body
    }

    pub fn overlay_visible(&self) -> bool {
        self.overlay.is_some()
    }

    /// Mutable access to the render adapter, for host-side bookkeeping such
    /// as viewport size updates.
    pub fn render_mut(&mut self) -> &mut R {
        &mut self.render
    }

    /// Advance one frame. Safe to call at any fixed cadence; a no-op before
    /// `initialize` or after `shutdown`.
    pub fn tick(&mut self, now: f64) {
        if !self.initialized || self.shut_down {
            return;
        }
        self.last_now = now;

        if self.pending_start {
            self.pending_start = false;
            self.state = BehaviorState::Greeting {
                since: now,
                until: now + GREETING_MS,
            };
            self.render.set_visual(VisualState::Greet);
            self.scheduler.schedule(now, &self.settings, &mut self.rng);
            self.next_jump_roll = now + JUMP_ROLL_INTERVAL_MS;
        }

        // 1. Physics / locomotion for the subsystem owning this state
        match self.state {
            BehaviorState::Falling => {
                let landed = physics::step(&mut self.body, self.bounds);
                self.body.clamp_to(self.bounds);
                if landed {
                    self.on_landed(now);
                }
            }
            BehaviorState::BeingDragged => {
                // Position is written directly by pointer-move events
            }
            BehaviorState::Jumping { since, .. } => {
                let t = (((now - since) / JUMP_MS).clamp(0.0, 1.0)) as f32;
                self.body.y = JUMP_HEIGHT * (std::f32::consts::PI * t).sin();
                self.body.clamp_to(self.bounds);
            }
            BehaviorState::Wandering { .. } => {
                let dir = self.body.facing.dir();
                if collide::predict(
                    self.body.x,
                    dir,
                    WALK_SPEED,
                    LOOKAHEAD_FRAMES,
                    self.bounds.max_x,
                    None,
                ) {
                    self.body.facing = self.body.facing.flipped();
                    self.set_walk_visual();
                }
                self.body.x += WALK_SPEED * self.body.facing.dir();
                self.body.clamp_to(self.bounds);
            }
            BehaviorState::Greeting { .. }
            | BehaviorState::Resting { .. }
            | BehaviorState::Speaking { .. } => {}
        }

        self.push_position(now);

        // 2. Overlay follows the body
        if self.overlay.is_some() {
            self.position_overlay();
        }

        // 3. Dwell-expiry transitions
        self.check_dwell(now);

        // 4. Autonomous jump roll
        self.maybe_roll_jump(now);

        // 5. Scheduled message emission
        self.maybe_emit_message(now);
    }

    // === Event entry points ===

    pub fn on_pointer_down(&mut self, x: f32, y: f32, t: f64) {
        if !self.initialized || self.shut_down {
            return;
        }
        if self.state.accepts_pointer() {
            self.pointer = Some(PointerSession::new(x, y, t));
        }
    }

    pub fn on_pointer_move(&mut self, x: f32, y: f32, t: f64) {
        let Some(session) = self.pointer.as_mut() else {
            return;
        };
        session.sample(x, y, t);
        let moved = session.moved;

        if matches!(self.state, BehaviorState::BeingDragged) {
            self.drag_to(x, y);
        } else if moved && self.state.accepts_pointer() {
            // A session can outlive its accepting state (an autonomous jump
            // can fire under a held press); the drag may only start once the
            // state accepts the pointer again.
            self.begin_drag(x, y);
        }
    }

    pub fn on_pointer_up(&mut self, x: f32, y: f32, t: f64) {
        let _ = (x, y, t);
        let Some(session) = self.pointer.take() else {
            return;
        };
        if matches!(self.state, BehaviorState::BeingDragged) {
            self.release_drag(&session);
        } else if !session.moved && self.state.accepts_pointer() {
            // In-place click: one-off jump, same effect as the autonomous one
            self.click_jump(self.last_now);
        }
        // A press that crossed the threshold and snapped back lands here
        // with moved still set: no jump fires.
    }

    /// The pointer leaving the surface ends a drag like a release; a pending
    /// click is simply abandoned.
    pub fn on_pointer_leave(&mut self) {
        let Some(session) = self.pointer.take() else {
            return;
        };
        if matches!(self.state, BehaviorState::BeingDragged) {
            self.release_drag(&session);
        }
    }

    /// The cancel key drops the companion mid-drag.
    pub fn on_key_down(&mut self, key: &str) {
        if key == "Escape" && matches!(self.state, BehaviorState::BeingDragged) {
            if let Some(session) = self.pointer.take() {
                self.release_drag(&session);
            }
        }
    }

    pub fn on_resize(&mut self, width: f32, height: f32) {
        if !self.initialized {
            return;
        }
        self.viewport = (width, height);
        self.bounds = Bounds::from_viewport(width, height);
        self.body.clamp_to(self.bounds);
        self.push_position(self.last_now);
        if self.overlay.is_some() {
            self.position_overlay();
        }
    }

    /// Immediate display bypassing the scheduler. Cancels the pending timer
    /// and any visible message. Rejected (not queued) while the companion is
    /// airborne or held, or before the first tick has run.
    pub fn force_message(&mut self, message: Message) -> bool {
        if !self.initialized || self.shut_down || self.pending_start {
            // Before the first tick there is no clock to hang the display
            // window on
            return false;
        }
        match self.state {
            BehaviorState::Jumping { .. }
            | BehaviorState::BeingDragged
            | BehaviorState::Falling => {
                log::debug!("forced message rejected while {}", self.state.name());
                false
            }
            _ => {
                let now = self.last_now;
                self.scheduler.cancel();
                self.scheduler.schedule(now, &self.settings, &mut self.rng);
                if self.overlay.is_some() {
                    self.hide_overlay();
                }
                self.show_message(now, message);
                true
            }
        }
    }

    /// Cancel all pending deadlines and release the overlay. Subsequent
    /// ticks are no-ops until `initialize` runs again.
    pub fn shutdown(&mut self) {
        self.hide_overlay();
        self.scheduler.cancel();
        self.pointer = None;
        self.next_jump_roll = f64::MAX;
        self.shut_down = true;
        log::info!("companion shut down");
    }

    // === Internals ===

    /// Single guarded mutation point for the behavior state. A re-entrant
    /// attempt (e.g. from a host callback fired inside a transition) is
    /// silently dropped, never queued.
    fn transition(&mut self, next: BehaviorState, visual: Option<VisualState>) -> bool {
        if self.transition_in_progress {
            log::debug!("dropped re-entrant transition to {}", next.name());
            return false;
        }
        self.transition_in_progress = true;
        log::debug!("state {} -> {}", self.state.name(), next.name());
        self.state = next;
        if let Some(v) = visual {
            self.render.set_visual(v);
        }
        self.transition_in_progress = false;
        true
    }

    fn check_dwell(&mut self, now: f64) {
        match self.state {
            BehaviorState::Greeting { until, .. } if now >= until => {
                self.enter_wandering(now);
            }
            BehaviorState::Wandering { until, .. } if now >= until => {
                let dwell = self.rest_dwell();
                self.enter_resting(now, dwell);
            }
            BehaviorState::Resting { until, .. } if now >= until => {
                if self.rng.random_bool(0.5) {
                    self.body.facing = self.body.facing.flipped();
                }
                self.enter_wandering(now);
            }
            BehaviorState::Speaking { until, .. } if now >= until => {
                self.hide_overlay();
                self.enter_resting(now, SPEAK_RESUME_MS);
            }
            BehaviorState::Jumping { until, resume, .. } if now >= until => {
                self.body.y = 0.0;
                self.cooldown_until = now + LANDING_COOLDOWN_MS;
                match resume {
                    ResumeState::Wandering => self.enter_wandering(now),
                    ResumeState::Resting => {
                        let dwell = self.rest_dwell();
                        self.enter_resting(now, dwell);
                    }
                }
            }
            _ => {}
        }
    }

    fn enter_wandering(&mut self, now: f64) {
        let dwell = self.rng.random_range(WANDER_MIN_MS..=WANDER_MAX_MS);
        self.transition(
            BehaviorState::Wandering {
                since: now,
                until: now + dwell,
            },
            None,
        );
        self.set_walk_visual();
    }

    fn enter_resting(&mut self, now: f64, dwell: f64) {
        self.transition(
            BehaviorState::Resting {
                since: now,
                until: now + dwell,
            },
            Some(VisualState::Idle),
        );
    }

    fn rest_dwell(&mut self) -> f64 {
        self.rng.random_range(REST_MIN_MS..=REST_MAX_MS)
    }

    fn set_walk_visual(&mut self) {
        let visual = match self.body.facing {
            super::state::Facing::Left => VisualState::WalkLeft,
            super::state::Facing::Right => VisualState::WalkRight,
        };
        self.render.set_visual(visual);
    }

    fn on_landed(&mut self, now: f64) {
        self.cooldown_until = now + LANDING_COOLDOWN_MS;
        if !self.settings.reduced_motion {
            self.shake_until = now + SHAKE_MS;
        }
        let dwell = self.rest_dwell();
        self.transition(
            BehaviorState::Resting {
                since: now,
                until: now + dwell,
            },
            Some(VisualState::Land),
        );
    }

    fn push_position(&mut self, now: f64) {
        let mut x = self.body.x;
        if now < self.shake_until {
            let remaining = ((self.shake_until - now) / SHAKE_MS) as f32;
            x += physics::shake_jitter(&mut self.rng, remaining);
            x = crate::clamp_axis(x, self.bounds.max_x);
        }
        self.render.set_position(x, self.body.y);
    }

    fn position_overlay(&mut self) {
        let Some(overlay) = self.overlay else {
            return;
        };
        let (vw, _) = self.viewport;
        let x = crate::clamp_axis(
            self.body.center_x() - overlay.width / 2.0,
            (vw - overlay.width).max(0.0),
        );
        let y = self.body.y + BODY_HEIGHT + OVERLAY_GAP;
        self.render.move_overlay(x, y);
    }

    fn hide_overlay(&mut self) {
        if self.overlay.take().is_some() {
            self.render.hide_overlay();
        }
    }

    fn show_message(&mut self, now: f64, message: Message) {
        let width = self.render.show_overlay(&message);
        // One predictor pass with the measured width; flip away from the
        // side the bubble would overflow before positioning it.
        if collide::predict(
            self.body.x,
            self.body.facing.dir(),
            WALK_SPEED,
            LOOKAHEAD_FRAMES,
            self.bounds.max_x,
            Some(width),
        ) {
            self.body.facing = self.body.facing.flipped();
        }
        self.overlay = Some(Overlay { width });
        self.position_overlay();
        self.transition(
            BehaviorState::Speaking {
                since: now,
                until: now + MESSAGE_SHOW_MS,
            },
            Some(VisualState::Idle),
        );
    }

    fn maybe_roll_jump(&mut self, now: f64) {
        if !matches!(self.state, BehaviorState::Resting { .. }) {
            return;
        }
        if now < self.next_jump_roll {
            return;
        }
        self.next_jump_roll = now + JUMP_ROLL_INTERVAL_MS;
        if now < self.cooldown_until || self.overlay.is_some() {
            return;
        }
        let p = self.settings.effective_jump_probability() as f64;
        if p > 0.0 && self.rng.random_bool(p) {
            self.start_jump(now, ResumeState::Resting);
        }
    }

    fn maybe_emit_message(&mut self, now: f64) {
        if !self.scheduler.due(now) {
            return;
        }
        // Re-arm regardless of whether this slot produces a message
        self.scheduler.schedule(now, &self.settings, &mut self.rng);

        if !matches!(self.state, BehaviorState::Resting { .. }) {
            return;
        }
        if now < self.cooldown_until {
            return;
        }
        if !self.in_safe_zone() {
            return;
        }
        let clock = LocalClock::now();
        let contextual = self.settings.contextual_messages;
        if let Some(message) = self.catalog.pick(&clock, contextual, &mut self.rng) {
            self.show_message(now, message);
        }
    }

    fn in_safe_zone(&self) -> bool {
        let (vw, _) = self.viewport;
        if vw <= 0.0 {
            return false;
        }
        let margin = self.settings.effective_safe_zone() * vw;
        let center = self.body.center_x();
        center >= margin && center <= vw - margin
    }

    fn click_jump(&mut self, now: f64) {
        if matches!(self.state, BehaviorState::Jumping { .. }) {
            return;
        }
        let resume = match self.state {
            BehaviorState::Wandering { .. } => ResumeState::Wandering,
            _ => ResumeState::Resting,
        };
        if matches!(self.state, BehaviorState::Speaking { .. }) {
            // The bubble cannot anchor to a hopping body
            self.hide_overlay();
        }
        self.start_jump(now, resume);
    }

    fn start_jump(&mut self, now: f64, resume: ResumeState) {
        self.transition(
            BehaviorState::Jumping {
                since: now,
                until: now + JUMP_MS,
                resume,
            },
            Some(VisualState::Jump),
        );
    }

    fn begin_drag(&mut self, x: f32, y: f32) {
        // Starting a drag pre-empts any pending or visible message
        self.hide_overlay();
        self.transition(BehaviorState::BeingDragged, Some(VisualState::Drag));
        self.drag_to(x, y);
    }

    fn drag_to(&mut self, x: f32, y: f32) {
        let (_, vh) = self.viewport;
        self.body.x = x - BODY_WIDTH / 2.0;
        self.body.y = (vh - y) - BODY_HEIGHT / 2.0;
        self.body.clamp_to(self.bounds);
        self.push_position(self.last_now);
    }

    fn release_drag(&mut self, session: &PointerSession) {
        let (vx, vy) = physics::throw_velocity(session.frame_delta);
        self.body.vx = vx;
        self.body.vy = vy;
        self.body.bounce_count = 0;
        log::debug!("released with throw velocity ({vx:.1}, {vy:.1})");
        self.transition(BehaviorState::Falling, Some(VisualState::Fall));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::messages::MessageKind;

    /// Recording render adapter for tests.
    struct StubAdapter {
        size: (f32, f32),
        positions: Vec<(f32, f32)>,
        visuals: Vec<VisualState>,
        overlay: Option<Message>,
        overlay_width: f32,
        overlay_moves: Vec<(f32, f32)>,
    }

    impl StubAdapter {
        fn new(w: f32, h: f32) -> Self {
            Self {
                size: (w, h),
                positions: Vec::new(),
                visuals: Vec::new(),
                overlay: None,
                overlay_width: 120.0,
                overlay_moves: Vec::new(),
            }
        }
    }

    impl RenderAdapter for StubAdapter {
        fn viewport(&self) -> (f32, f32) {
            self.size
        }
        fn set_position(&mut self, x: f32, y: f32) {
            self.positions.push((x, y));
        }
        fn set_visual(&mut self, visual: VisualState) {
            self.visuals.push(visual);
        }
        fn show_overlay(&mut self, message: &Message) -> f32 {
            self.overlay = Some(message.clone());
            self.overlay_width
        }
        fn move_overlay(&mut self, x: f32, y: f32) {
            self.overlay_moves.push((x, y));
        }
        fn hide_overlay(&mut self) {
            self.overlay = None;
        }
    }

    fn controller() -> Controller<StubAdapter> {
        let mut c = Controller::new(
            StubAdapter::new(800.0, 600.0),
            Settings::default(),
            MessageCatalog::default(),
            12345,
        );
        c.initialize(800.0, 600.0);
        c
    }

    /// Drive the controller to a resting state (greeting, then wander out).
    fn settle_to_resting(c: &mut Controller<StubAdapter>) -> f64 {
        let mut now = 0.0;
        c.tick(now);
        assert!(matches!(c.state, BehaviorState::Greeting { .. }));
        // Walk the clock forward until the machine rests
        for _ in 0..100_000 {
            now += 16.0;
            c.tick(now);
            if matches!(c.state, BehaviorState::Resting { .. }) {
                return now;
            }
        }
        panic!("never reached resting");
    }

    #[test]
    fn greeting_transitions_to_wandering_once() {
        let mut c = controller();
        c.tick(0.0);
        assert!(matches!(c.state, BehaviorState::Greeting { .. }));
        c.tick(GREETING_MS + 1.0);
        assert!(matches!(c.state, BehaviorState::Wandering { .. }));
    }

    #[test]
    fn wandering_stays_in_bounds_and_flips_at_edges() {
        let mut c = controller();
        let mut now = 0.0;
        c.tick(now);
        // Run long enough to cross the surface several times
        for _ in 0..60_000 {
            now += 16.0;
            c.tick(now);
            assert!(c.body.x >= 0.0 && c.body.x <= c.bounds.max_x);
            assert!(c.body.y >= 0.0 && c.body.y <= c.bounds.max_y);
        }
    }

    #[test]
    fn click_triggers_jump_not_drag() {
        let mut c = controller();
        let now = settle_to_resting(&mut c);
        c.on_pointer_down(400.0, 560.0, now);
        // Tiny wiggle below the threshold still counts as a click
        c.on_pointer_move(401.0, 560.0, now + 8.0);
        c.on_pointer_up(401.0, 560.0, now + 16.0);
        assert!(matches!(c.state, BehaviorState::Jumping { .. }));
    }

    #[test]
    fn movement_past_threshold_starts_drag_never_jump() {
        let mut c = controller();
        let now = settle_to_resting(&mut c);
        c.on_pointer_down(400.0, 560.0, now);
        c.on_pointer_move(400.0 + DRAG_THRESHOLD_PX + 2.0, 560.0, now + 8.0);
        assert!(matches!(c.state, BehaviorState::BeingDragged));
        c.on_pointer_up(400.0 + DRAG_THRESHOLD_PX + 2.0, 560.0, now + 16.0);
        assert!(matches!(c.state, BehaviorState::Falling));
    }

    #[test]
    fn threshold_crossing_snap_back_swallows_the_click() {
        let mut c = controller();
        let now = settle_to_resting(&mut c);
        c.on_pointer_down(400.0, 560.0, now);
        c.on_pointer_move(420.0, 560.0, now + 8.0);
        assert!(matches!(c.state, BehaviorState::BeingDragged));
        // Snap back to the origin before release: no jump fires
        c.on_pointer_move(400.0, 560.0, now + 16.0);
        c.on_pointer_up(400.0, 560.0, now + 24.0);
        assert!(matches!(c.state, BehaviorState::Falling));
    }

    #[test]
    fn release_derives_clamped_throw_velocity() {
        let mut c = controller();
        let now = settle_to_resting(&mut c);
        c.on_pointer_down(400.0, 300.0, now);
        c.on_pointer_move(410.0, 300.0, now + 8.0);
        // Rightward displacement of 10px on the last sample
        c.on_pointer_up(410.0, 300.0, now + 16.0);
        assert!(matches!(c.state, BehaviorState::Falling));
        assert!((c.body.vx - 10.0 * THROW_SCALE).abs() < 1e-4);
        assert!(c.body.vx > 0.0, "rightward drag throws rightward");
    }

    #[test]
    fn falling_lands_into_resting_with_cooldown() {
        let mut c = controller();
        let mut now = settle_to_resting(&mut c);
        c.on_pointer_down(400.0, 300.0, now);
        c.on_pointer_move(400.0, 280.0, now + 8.0); // drag upward
        c.on_pointer_up(400.0, 280.0, now + 16.0);
        assert!(matches!(c.state, BehaviorState::Falling));

        for _ in 0..10_000 {
            now += 16.0;
            c.tick(now);
            if matches!(c.state, BehaviorState::Resting { .. }) {
                break;
            }
        }
        assert!(matches!(c.state, BehaviorState::Resting { .. }));
        assert!(c.cooldown_until >= now, "landing must arm the cooldown");
        assert_eq!(c.body.y, 0.0);
        assert_eq!(c.body.bounce_count, 0);
    }

    #[test]
    fn escape_cancels_a_drag_into_falling() {
        let mut c = controller();
        let now = settle_to_resting(&mut c);
        c.on_pointer_down(400.0, 300.0, now);
        c.on_pointer_move(420.0, 300.0, now + 8.0);
        assert!(matches!(c.state, BehaviorState::BeingDragged));
        c.on_key_down("Escape");
        assert!(matches!(c.state, BehaviorState::Falling));
        assert!(c.pointer.is_none());
    }

    #[test]
    fn forced_message_rejected_while_jumping() {
        let mut c = controller();
        let now = settle_to_resting(&mut c);
        c.on_pointer_down(400.0, 560.0, now);
        c.on_pointer_up(400.0, 560.0, now + 8.0);
        assert!(matches!(c.state, BehaviorState::Jumping { .. }));

        let accepted = c.force_message(Message::phrase("saved!"));
        assert!(!accepted);
        assert!(c.render.overlay.is_none(), "no overlay may appear");
        // Not silently queued: completing the jump shows nothing
        let mut t = now;
        for _ in 0..200 {
            t += 16.0;
            c.tick(t);
        }
        assert!(c.render.overlay.is_none());
    }

    #[test]
    fn forced_message_replaces_a_visible_one() {
        let mut c = controller();
        let _ = settle_to_resting(&mut c);
        assert!(c.force_message(Message::phrase("first")));
        assert!(matches!(c.state, BehaviorState::Speaking { .. }));
        assert!(c.force_message(Message::phrase("second")));
        assert_eq!(c.render.overlay.as_ref().unwrap().text, "second");
        assert!(matches!(c.state, BehaviorState::Speaking { .. }));
    }

    #[test]
    fn speaking_hides_and_returns_to_resting() {
        let mut c = controller();
        let now = settle_to_resting(&mut c);
        assert!(c.force_message(Message::phrase("hi")));
        assert!(c.overlay_visible());

        let mut t = now;
        while matches!(c.state, BehaviorState::Speaking { .. }) {
            t += 16.0;
            c.tick(t);
            assert!(t < now + MESSAGE_SHOW_MS + 1_000.0, "speaking never ended");
        }
        assert!(matches!(c.state, BehaviorState::Resting { .. }));
        assert!(!c.overlay_visible());
    }

    #[test]
    fn drag_preempts_a_visible_message() {
        let mut c = controller();
        let now = settle_to_resting(&mut c);
        assert!(c.force_message(Message::phrase("hello")));
        c.on_pointer_down(400.0, 560.0, now);
        c.on_pointer_move(420.0, 560.0, now + 8.0);
        assert!(matches!(c.state, BehaviorState::BeingDragged));
        assert!(!c.overlay_visible());
        assert!(c.render.overlay.is_none());
    }

    #[test]
    fn overlay_tracks_the_body_and_stays_on_screen() {
        let mut c = controller();
        let now = settle_to_resting(&mut c);
        // Park the body near the left edge, then speak
        c.body.x = 0.0;
        assert!(c.force_message(Message::phrase("edge case")));
        c.tick(now + 16.0);
        let &(x, _) = c.render.overlay_moves.last().unwrap();
        assert!(x >= 0.0);
        assert!(x + c.render.overlay_width <= 800.0 + 1e-3);
    }

    #[test]
    fn landing_cooldown_blocks_scheduled_messages() {
        let mut c = controller();
        let mut now = settle_to_resting(&mut c);
        // Throw and land to arm the cooldown
        c.on_pointer_down(400.0, 300.0, now);
        c.on_pointer_move(420.0, 300.0, now + 8.0);
        c.on_pointer_up(420.0, 300.0, now + 16.0);
        while !matches!(c.state, BehaviorState::Resting { .. }) {
            now += 16.0;
            c.tick(now);
        }
        // Force the scheduler due immediately, inside the cooldown window
        c.scheduler.schedule(-1e9, &c.settings.clone(), &mut Pcg32::seed_from_u64(1));
        now += 16.0;
        c.tick(now);
        assert!(!c.overlay_visible(), "cooldown must suppress messages");
    }

    #[test]
    fn messages_respect_the_safe_zone() {
        let mut c = controller();
        let mut now = settle_to_resting(&mut c);
        // Pin a long rest so the dwell cannot expire under the test
        c.state = BehaviorState::Resting {
            since: now,
            until: now + 1e9,
        };
        c.cooldown_until = 0.0;

        // Park at the far left, outside the safe zone
        c.body.x = 0.0;
        c.scheduler
            .schedule(-1e9, &c.settings.clone(), &mut Pcg32::seed_from_u64(1));
        now += 16.0;
        c.tick(now);
        assert!(!c.overlay_visible(), "edge-adjacent messages are suppressed");

        // Centered body, next due slot emits
        c.body.x = c.bounds.max_x / 2.0;
        c.scheduler
            .schedule(-1e9, &c.settings.clone(), &mut Pcg32::seed_from_u64(2));
        now += 16.0;
        c.tick(now);
        assert!(c.overlay_visible());
    }

    #[test]
    fn resize_clamps_the_body() {
        let mut c = controller();
        let _ = settle_to_resting(&mut c);
        c.body.x = 700.0;
        c.on_resize(300.0, 600.0);
        assert!(c.body.x <= c.bounds.max_x);
    }

    #[test]
    fn shutdown_releases_everything() {
        let mut c = controller();
        let now = settle_to_resting(&mut c);
        assert!(c.force_message(Message::phrase("bye")));
        c.shutdown();
        assert!(!c.overlay_visible());
        assert!(c.render.overlay.is_none());

        // Ticks become no-ops
        let positions_before = c.render.positions.len();
        c.tick(now + 10_000.0);
        assert_eq!(c.render.positions.len(), positions_before);

        // And forced messages are refused
        assert!(!c.force_message(Message::phrase("zombie")));
    }

    #[test]
    fn jump_returns_to_prior_locomotion_state() {
        let mut c = controller();
        let mut now = 0.0;
        c.tick(now);
        now = GREETING_MS + 1.0;
        c.tick(now);
        assert!(matches!(c.state, BehaviorState::Wandering { .. }));

        c.on_pointer_down(c.body.center_x(), 560.0, now);
        c.on_pointer_up(c.body.center_x(), 560.0, now + 8.0);
        assert!(matches!(
            c.state,
            BehaviorState::Jumping {
                resume: ResumeState::Wandering,
                ..
            }
        ));
        now += JUMP_MS + 1.0;
        c.tick(now);
        assert!(matches!(c.state, BehaviorState::Wandering { .. }));
        assert_eq!(c.body.y, 0.0);
    }

    #[test]
    fn held_press_cannot_start_a_drag_mid_jump() {
        let mut c = Controller::new(
            StubAdapter::new(800.0, 600.0),
            Settings {
                jump_probability: 1.0,
                ..Settings::default()
            },
            MessageCatalog::default(),
            12345,
        );
        c.initialize(800.0, 600.0);
        let mut now = settle_to_resting(&mut c);
        // Pin a long rest and make the next roll due so the autonomous jump
        // fires deterministically under the held press
        c.state = BehaviorState::Resting {
            since: now,
            until: now + 1e9,
        };
        c.cooldown_until = 0.0;
        c.next_jump_roll = 0.0;

        c.on_pointer_down(400.0, 560.0, now);
        now += 16.0;
        c.tick(now);
        assert!(matches!(c.state, BehaviorState::Jumping { .. }));
        assert!(c.pointer.is_some(), "the press survives the jump");

        // Crossing the drag threshold mid-air must not start a drag
        c.on_pointer_move(420.0, 560.0, now + 8.0);
        assert!(
            matches!(c.state, BehaviorState::Jumping { .. }),
            "a held press must not pull the companion out of a jump"
        );
    }

    #[test]
    fn forced_message_before_first_tick_is_refused() {
        let mut c = controller();
        // initialize() ran, but no tick has armed the clock yet
        assert!(!c.force_message(Message::phrase("too early")));
        assert!(c.render.overlay.is_none());

        c.tick(0.0);
        assert!(matches!(c.state, BehaviorState::Greeting { .. }));
        assert!(!c.overlay_visible());
    }

    #[test]
    fn overlay_never_outlives_its_display_window() {
        let mut c = controller();
        c.tick(0.0);
        let now = GREETING_MS + 1.0;
        c.tick(now);
        assert!(matches!(c.state, BehaviorState::Wandering { .. }));

        assert!(c.force_message(Message::phrase("mid-walk")));
        let mut t = now;
        while c.overlay_visible() {
            t += 16.0;
            c.tick(t);
            assert!(t <= now + MESSAGE_SHOW_MS + 100.0, "bubble overstayed");
        }
        assert!(matches!(c.state, BehaviorState::Resting { .. }));
    }

    #[test]
    fn forced_message_kind_is_preserved() {
        let mut c = controller();
        let _ = settle_to_resting(&mut c);
        let badge = Message {
            kind: MessageKind::Badge,
            text: "LGTM".into(),
            label: None,
        };
        assert!(c.force_message(badge));
        assert_eq!(c.render.overlay.as_ref().unwrap().kind, MessageKind::Badge);
    }
}
