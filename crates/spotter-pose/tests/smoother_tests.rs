use spotter_pose::{Keypoint, KeypointSmoother, Landmark, Pose, LANDMARK_COUNT};

fn uniform(x: f32, y: f32, confidence: f32) -> Pose {
    Pose::new([Keypoint::new(x, y, confidence); LANDMARK_COUNT])
}

#[test]
fn test_first_sighting_passes_through() {
    let mut smoother = KeypointSmoother::new(0.3);
    assert!(!smoother.has_history());
    let out = smoother.apply(&uniform(10.0, 20.0, 0.9));
    assert_eq!(out.position(Landmark::Nose).x, 10.0);
    assert!(smoother.has_history());
}

#[test]
fn test_blends_with_prior() {
    let mut smoother = KeypointSmoother::new(0.5);
    smoother.apply(&uniform(0.0, 0.0, 0.9));
    let out = smoother.apply(&uniform(10.0, 10.0, 0.9));
    let p = out.position(Landmark::LeftWrist);
    assert!((p.x - 5.0).abs() < 1e-5);
    assert!((p.y - 5.0).abs() < 1e-5);
}

#[test]
fn test_constant_input_converges() {
    for alpha in [0.05f32, 0.2, 0.5, 1.0] {
        let mut smoother = KeypointSmoother::new(alpha);
        smoother.apply(&uniform(0.0, 0.0, 0.9));
        let mut last = uniform(0.0, 0.0, 0.9);
        for _ in 0..400 {
            last = smoother.apply(&uniform(100.0, -40.0, 0.9));
        }
        let p = last.position(Landmark::RightHip);
        assert!((p.x - 100.0).abs() < 1e-3, "alpha {alpha} x {}", p.x);
        assert!((p.y + 40.0).abs() < 1e-3, "alpha {alpha} y {}", p.y);
    }
}

#[test]
fn test_low_confidence_passes_raw_without_history() {
    let mut smoother = KeypointSmoother::new(0.5);
    smoother.apply(&uniform(0.0, 0.0, 0.9));

    // at the gate: raw value used, history untouched
    let out = smoother.apply(&uniform(50.0, 50.0, 0.2));
    assert_eq!(out.position(Landmark::Nose).x, 50.0);

    let out = smoother.apply(&uniform(10.0, 10.0, 0.9));
    assert!((out.position(Landmark::Nose).x - 5.0).abs() < 1e-5);
}

#[test]
fn test_reset_clears_history() {
    let mut smoother = KeypointSmoother::new(0.5);
    smoother.apply(&uniform(0.0, 0.0, 0.9));
    smoother.reset();
    assert!(!smoother.has_history());
    let out = smoother.apply(&uniform(30.0, 30.0, 0.9));
    assert_eq!(out.position(Landmark::Nose).x, 30.0);
}

#[test]
fn test_confidence_is_not_smoothed() {
    let mut smoother = KeypointSmoother::new(0.5);
    smoother.apply(&uniform(0.0, 0.0, 0.9));
    let out = smoother.apply(&uniform(0.0, 0.0, 0.4));
    assert_eq!(out.keypoint(Landmark::Nose).confidence, 0.4);
}
