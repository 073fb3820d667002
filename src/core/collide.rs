//! Boundary-crossing prediction
//!
//! Pure lookahead check used by the wandering step (no overlay) and by
//! message display (with the measured bubble width, evaluated once per
//! message).

use crate::consts::BODY_WIDTH;

/// Predict whether moving at `speed * direction` for `lookahead_frames`
/// would leave `[0, max_position]`.
///
/// `direction` is a signed unit (-1 left, +1 right). When `overlay_width`
/// is supplied, the check is asymmetric: it only reports a collision when
/// the movement direction points toward the side a centered bubble of that
/// width would overflow, so a bubble that safely fits on the trailing side
/// never forces a direction flip.
pub fn predict(
    position: f32,
    direction: f32,
    speed: f32,
    lookahead_frames: f32,
    max_position: f32,
    overlay_width: Option<f32>,
) -> bool {
    let projected = position + speed * direction * lookahead_frames;

    match overlay_width {
        None => projected < 0.0 || projected > max_position,
        Some(width) => {
            // Overlay is centered over the body; half of any excess width
            // hangs past each side of the sprite.
            let overhang = ((width - BODY_WIDTH) / 2.0).max(0.0);
            if direction < 0.0 {
                projected - overhang < 0.0
            } else {
                projected + overhang > max_position
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: f32 = 736.0; // 800px viewport minus the body

    #[test]
    fn predicts_right_edge_for_any_positive_speed() {
        for speed in [0.1, 1.0, 5.0, 100.0] {
            assert!(
                predict(MAX - 1.0, 1.0, speed, 10.0, MAX, None),
                "speed {speed} should collide"
            );
        }
    }

    #[test]
    fn predicts_left_edge() {
        assert!(predict(3.0, -1.0, 1.4, 10.0, MAX, None));
    }

    #[test]
    fn clear_of_both_edges() {
        assert!(!predict(MAX / 2.0, 1.0, 1.4, 10.0, MAX, None));
        assert!(!predict(MAX / 2.0, -1.0, 1.4, 10.0, MAX, None));
    }

    #[test]
    fn overlay_check_is_asymmetric() {
        // Near the right edge with a wide bubble: rightward movement
        // collides, leftward movement does not even though the bubble
        // overhangs the trailing side.
        let pos = MAX - 20.0;
        let width = Some(200.0);
        assert!(predict(pos, 1.0, 1.4, 10.0, MAX, width));
        assert!(!predict(pos, -1.0, 1.4, 10.0, MAX, width));
    }

    #[test]
    fn narrow_overlay_adds_no_overhang() {
        // A bubble narrower than the sprite behaves like the plain check
        let pos = MAX / 2.0;
        assert!(!predict(pos, 1.0, 1.4, 10.0, MAX, Some(10.0)));
    }
}
