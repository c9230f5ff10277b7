use serde::{Deserialize, Serialize};
use spotter_base::Vec2;

use crate::PoseError;

/// Number of landmarks produced by the pose detector (COCO order).
pub const LANDMARK_COUNT: usize = 17;

/// A single detected landmark with 2D position and confidence score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub position: Vec2<f32>,
    /// Confidence score in [0.0, 1.0].
    pub confidence: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            confidence,
        }
    }

    /// Strictly above the gate; a keypoint exactly at the gate is not visible.
    pub fn is_visible(&self, min_confidence: f32) -> bool {
        self.confidence > min_confidence
    }
}

/// COCO body landmarks in detector output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Landmark {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl Landmark {
    pub const ALL: [Landmark; LANDMARK_COUNT] = [
        Landmark::Nose,
        Landmark::LeftEye,
        Landmark::RightEye,
        Landmark::LeftEar,
        Landmark::RightEar,
        Landmark::LeftShoulder,
        Landmark::RightShoulder,
        Landmark::LeftElbow,
        Landmark::RightElbow,
        Landmark::LeftWrist,
        Landmark::RightWrist,
        Landmark::LeftHip,
        Landmark::RightHip,
        Landmark::LeftKnee,
        Landmark::RightKnee,
        Landmark::LeftAnkle,
        Landmark::RightAnkle,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl From<Landmark> for usize {
    fn from(landmark: Landmark) -> usize {
        landmark as usize
    }
}

impl TryFrom<usize> for Landmark {
    type Error = PoseError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Landmark::ALL
            .get(value)
            .copied()
            .ok_or(PoseError::InvalidLandmark(value))
    }
}

/// Body side, as seen from the subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// A limb joint that exists on both sides of the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    Shoulder,
    Elbow,
    Wrist,
    Hip,
    Knee,
    Ankle,
}

impl Joint {
    /// The landmark for this joint on `side`.
    pub fn on(self, side: Side) -> Landmark {
        match (self, side) {
            (Joint::Shoulder, Side::Left) => Landmark::LeftShoulder,
            (Joint::Shoulder, Side::Right) => Landmark::RightShoulder,
            (Joint::Elbow, Side::Left) => Landmark::LeftElbow,
            (Joint::Elbow, Side::Right) => Landmark::RightElbow,
            (Joint::Wrist, Side::Left) => Landmark::LeftWrist,
            (Joint::Wrist, Side::Right) => Landmark::RightWrist,
            (Joint::Hip, Side::Left) => Landmark::LeftHip,
            (Joint::Hip, Side::Right) => Landmark::RightHip,
            (Joint::Knee, Side::Left) => Landmark::LeftKnee,
            (Joint::Knee, Side::Right) => Landmark::RightKnee,
            (Joint::Ankle, Side::Left) => Landmark::LeftAnkle,
            (Joint::Ankle, Side::Right) => Landmark::RightAnkle,
        }
    }
}

/// One detected person: all 17 landmarks in COCO order.
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    pub keypoints: [Keypoint; LANDMARK_COUNT],
}

impl Pose {
    pub fn new(keypoints: [Keypoint; LANDMARK_COUNT]) -> Self {
        Self { keypoints }
    }

    /// Build a pose from detector output; the slice must hold exactly 17 keypoints.
    pub fn from_slice(keypoints: &[Keypoint]) -> Result<Self, PoseError> {
        let keypoints: [Keypoint; LANDMARK_COUNT] =
            keypoints.try_into().map_err(|_| PoseError::KeypointCount {
                expected: LANDMARK_COUNT,
                got: keypoints.len(),
            })?;
        Ok(Self { keypoints })
    }

    pub fn keypoint(&self, landmark: Landmark) -> &Keypoint {
        &self.keypoints[landmark.index()]
    }

    pub fn keypoint_mut(&mut self, landmark: Landmark) -> &mut Keypoint {
        &mut self.keypoints[landmark.index()]
    }

    pub fn position(&self, landmark: Landmark) -> Vec2<f32> {
        self.keypoint(landmark).position
    }

    pub fn joint(&self, joint: Joint, side: Side) -> &Keypoint {
        self.keypoint(joint.on(side))
    }

    /// Sum of confidences of `joints` on `side`.
    pub fn side_confidence(&self, side: Side, joints: &[Joint]) -> f32 {
        joints
            .iter()
            .map(|joint| self.joint(*joint, side).confidence)
            .sum()
    }
}
