use spotter_pose::{Joint, Keypoint, Landmark, Pose, PoseError, Side, LANDMARK_COUNT};

fn pose_with(confidence: f32) -> Pose {
    Pose::new([Keypoint::new(0.0, 0.0, confidence); LANDMARK_COUNT])
}

#[test]
fn test_landmark_indices_follow_coco_order() {
    assert_eq!(Landmark::Nose.index(), 0);
    assert_eq!(Landmark::LeftShoulder.index(), 5);
    assert_eq!(Landmark::RightElbow.index(), 8);
    assert_eq!(Landmark::RightAnkle.index(), 16);
    for (i, landmark) in Landmark::ALL.iter().enumerate() {
        assert_eq!(usize::from(*landmark), i);
    }
}

#[test]
fn test_landmark_try_from_out_of_range() {
    assert_eq!(Landmark::try_from(13).unwrap(), Landmark::LeftKnee);
    let err = Landmark::try_from(17).unwrap_err();
    assert!(matches!(err, PoseError::InvalidLandmark(17)));
}

#[test]
fn test_joint_on_side() {
    assert_eq!(Joint::Wrist.on(Side::Left), Landmark::LeftWrist);
    assert_eq!(Joint::Knee.on(Side::Right), Landmark::RightKnee);
    assert_eq!(Side::Left.opposite(), Side::Right);
}

#[test]
fn test_visibility_is_strict() {
    let keypoint = Keypoint::new(1.0, 2.0, 0.2);
    assert!(!keypoint.is_visible(0.2));
    assert!(keypoint.is_visible(0.19));
}

#[test]
fn test_pose_from_slice_requires_17() {
    let short = vec![Keypoint::new(0.0, 0.0, 1.0); 16];
    let err = Pose::from_slice(&short).unwrap_err();
    assert!(matches!(err, PoseError::KeypointCount { expected: 17, got: 16 }));

    let full = vec![Keypoint::new(0.0, 0.0, 1.0); 17];
    assert!(Pose::from_slice(&full).is_ok());
}

#[test]
fn test_side_confidence_sums_joints() {
    let mut pose = pose_with(0.1);
    pose.keypoint_mut(Landmark::LeftShoulder).confidence = 0.9;
    pose.keypoint_mut(Landmark::LeftElbow).confidence = 0.8;
    let joints = [Joint::Shoulder, Joint::Elbow];
    assert!((pose.side_confidence(Side::Left, &joints) - 1.7).abs() < 1e-6);
    assert!((pose.side_confidence(Side::Right, &joints) - 0.2).abs() < 1e-6);
}
