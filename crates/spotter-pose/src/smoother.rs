use spotter_base::Vec2;

use crate::{Pose, LANDMARK_COUNT};

/// Landmarks at or below this confidence are neither smoothed nor remembered.
pub const SMOOTHING_CONFIDENCE_GATE: f32 = 0.2;

/// Per-landmark exponential smoothing of keypoint positions.
///
/// For a confident landmark with history, the output is
/// `alpha * raw + (1 - alpha) * previous`; the first confident sighting
/// seeds the history and passes through unchanged. Low-confidence
/// landmarks pass through raw and leave their history untouched.
#[derive(Debug, Clone)]
pub struct KeypointSmoother {
    alpha: f32,
    min_confidence: f32,
    history: [Option<Vec2<f32>>; LANDMARK_COUNT],
}

impl KeypointSmoother {
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha,
            min_confidence: SMOOTHING_CONFIDENCE_GATE,
            history: [None; LANDMARK_COUNT],
        }
    }

    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn apply(&mut self, raw: &Pose) -> Pose {
        let mut smoothed = raw.clone();

        for (keypoint, prior) in smoothed.keypoints.iter_mut().zip(self.history.iter_mut()) {
            if !keypoint.is_visible(self.min_confidence) {
                continue;
            }
            match prior {
                Some(previous) => {
                    let position = previous.lerp(keypoint.position, self.alpha);
                    keypoint.position = position;
                    *previous = position;
                }
                None => *prior = Some(keypoint.position),
            }
        }

        smoothed
    }

    pub fn has_history(&self) -> bool {
        self.history.iter().any(Option::is_some)
    }

    pub fn reset(&mut self) {
        self.history = [None; LANDMARK_COUNT];
    }
}
