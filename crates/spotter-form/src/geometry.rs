//! Joint-angle math over keypoint positions.

use spotter_base::Vec2;

/// Returned by [`angle_at`] when either ray has zero length.
pub const DEGENERATE_ANGLE: f32 = 0.0;

/// Angle in degrees at vertex `b` between rays `b→a` and `b→c`, in `[0, 180]`.
///
/// The cosine is clamped to `[-1, 1]` before `acos`, so rounding overshoot
/// never yields NaN. Coincident points yield [`DEGENERATE_ANGLE`].
pub fn angle_at(a: Vec2<f32>, b: Vec2<f32>, c: Vec2<f32>) -> f32 {
    let ab = a - b;
    let cb = c - b;
    let magnitude = ab.length() * cb.length();
    if magnitude == 0.0 || !magnitude.is_finite() {
        return DEGENERATE_ANGLE;
    }
    let cosine = (ab.dot(cb) / magnitude).clamp(-1.0, 1.0);
    let angle = cosine.acos().to_degrees();
    if angle.is_nan() { DEGENERATE_ANGLE } else { angle }
}

/// Tilt of the line `a→b` relative to horizontal, in `[0, 90]` degrees.
///
/// Direction does not matter: a line pointing left reads the same as one
/// pointing right.
pub fn rotation_angle(a: Vec2<f32>, b: Vec2<f32>) -> f32 {
    let d = b - a;
    if d.x == 0.0 && d.y == 0.0 {
        return DEGENERATE_ANGLE;
    }
    let angle = d.y.atan2(d.x).to_degrees().abs();
    if angle > 90.0 { 180.0 - angle } else { angle }
}

/// Signed horizontal offset of `joint` from `anchor`.
pub fn horizontal_offset(joint: Vec2<f32>, anchor: Vec2<f32>) -> f32 {
    joint.x - anchor.x
}

/// Absolute horizontal distance between two points.
pub fn horizontal_width(a: Vec2<f32>, b: Vec2<f32>) -> f32 {
    (a.x - b.x).abs()
}
