//! Form faults and the per-frame rules that detect them.

use serde::{Deserialize, Serialize};
use spotter_pose::{Joint, Landmark, Pose, Side};
use std::collections::BTreeSet;

use crate::feedback::CueColor;
use crate::geometry::{angle_at, horizontal_width};
use crate::window::RollingWindow;

/// Recorded for a rep with no faults.
pub const GOOD_FORM: &str = "Good form";

/// A named form error. Declaration order is the order faults are listed in
/// rep feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    ElbowSwinging,
    BackTooStraight,
    BackTooTilted,
    KneeCaving,
    TooDeep,
    NotDeepEnough,
    TShapeElbows,
}

impl FaultKind {
    pub const ALL: [FaultKind; 7] = [
        FaultKind::ElbowSwinging,
        FaultKind::BackTooStraight,
        FaultKind::BackTooTilted,
        FaultKind::KneeCaving,
        FaultKind::TooDeep,
        FaultKind::NotDeepEnough,
        FaultKind::TShapeElbows,
    ];

    /// Key used in the summary's `formIssues` map.
    pub fn key(self) -> &'static str {
        match self {
            FaultKind::ElbowSwinging => "elbowSwinging",
            FaultKind::BackTooStraight => "backTooStraight",
            FaultKind::BackTooTilted => "backTooTilted",
            FaultKind::KneeCaving => "kneesCaving",
            FaultKind::TooDeep => "tooDeep",
            FaultKind::NotDeepEnough => "notDeepEnough",
            FaultKind::TShapeElbows => "improperElbowAngle",
        }
    }

    /// Text recorded in per-rep feedback.
    pub fn label(self) -> &'static str {
        match self {
            FaultKind::ElbowSwinging => "Elbow swinging detected",
            FaultKind::BackTooStraight => "Back too straight",
            FaultKind::BackTooTilted => "Back too tilted",
            FaultKind::KneeCaving => "Knees caving inward",
            FaultKind::TooDeep => "Too deep",
            FaultKind::NotDeepEnough => "Not deep enough",
            FaultKind::TShapeElbows => "Elbows out (T-shape)",
        }
    }

    /// Corrective cue shown while the fault is active.
    pub fn cue(self) -> &'static str {
        match self {
            FaultKind::ElbowSwinging => "Keep your elbow steady! Avoid swinging.",
            FaultKind::BackTooStraight => "Bend your back slightly forward",
            FaultKind::BackTooTilted => "Straighten your back a bit",
            FaultKind::KneeCaving => "Push knees outward!",
            FaultKind::TooDeep => "Squat too deep!",
            FaultKind::NotDeepEnough => "Squat deeper!",
            FaultKind::TShapeElbows => "Keep elbows in! Avoid T-shape",
        }
    }

    pub fn color(self) -> CueColor {
        match self {
            FaultKind::NotDeepEnough => CueColor::Warning,
            _ => CueColor::Error,
        }
    }
}

/// Labels of `faults` joined with ", ", or [`GOOD_FORM`] when empty.
pub fn feedback_text(faults: &BTreeSet<FaultKind>) -> String {
    if faults.is_empty() {
        return GOOD_FORM.to_string();
    }
    faults
        .iter()
        .map(|f| f.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Shoulder–hip–ankle angle band on the tracked side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackAngleRule {
    pub min: f32,
    pub max: f32,
}

impl BackAngleRule {
    pub fn measure(pose: &Pose, side: Side) -> f32 {
        angle_at(
            pose.joint(Joint::Shoulder, side).position,
            pose.joint(Joint::Hip, side).position,
            pose.joint(Joint::Ankle, side).position,
        )
    }

    pub fn check(&self, back_angle: f32) -> Option<FaultKind> {
        if back_angle > self.max {
            Some(FaultKind::BackTooStraight)
        } else if back_angle < self.min {
            Some(FaultKind::BackTooTilted)
        } else {
            None
        }
    }
}

/// Elbows flaring wider than the shoulders near the bottom of a push-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TShapeRule {
    /// Elbow width over shoulder width above this is a T-shape.
    pub max_width_ratio: f32,
    /// Only checked while the primary angle is at or below this.
    pub engaged_below: f32,
    /// Narrower shoulders give no usable ratio.
    pub min_shoulder_width: f32,
    pub min_confidence: f32,
}

impl TShapeRule {
    pub fn check(&self, pose: &Pose, angle: f32) -> bool {
        let points = [
            Landmark::LeftShoulder,
            Landmark::RightShoulder,
            Landmark::LeftElbow,
            Landmark::RightElbow,
        ];
        if !points
            .iter()
            .all(|l| pose.keypoint(*l).is_visible(self.min_confidence))
        {
            return false;
        }

        let shoulder_width = horizontal_width(
            pose.position(Landmark::LeftShoulder),
            pose.position(Landmark::RightShoulder),
        );
        if shoulder_width <= self.min_shoulder_width {
            return false;
        }
        let elbow_width = horizontal_width(
            pose.position(Landmark::LeftElbow),
            pose.position(Landmark::RightElbow),
        );
        elbow_width / shoulder_width > self.max_width_ratio && angle <= self.engaged_below
    }
}

/// Knees drifting inside the line of the ankles during a squat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KneeCavingRule {
    /// Smoothed knee/ankle width ratio below this is caving.
    pub min_ratio: f32,
    /// Frames in the ratio moving average.
    pub history: usize,
    /// Consecutive caving frames needed to flag the fault.
    pub confirm_frames: u32,
    /// Checked only while `band_low < angle <= band_high`.
    pub band_low: f32,
    pub band_high: f32,
}

#[derive(Debug, Clone)]
pub struct KneeCavingDetector {
    rule: KneeCavingRule,
    ratios: RollingWindow,
    consecutive: u32,
}

impl KneeCavingDetector {
    pub fn new(rule: KneeCavingRule) -> Self {
        Self {
            ratios: RollingWindow::new(rule.history),
            rule,
            consecutive: 0,
        }
    }

    /// Feed one frame; true once caving has been seen on enough consecutive frames.
    pub fn update(&mut self, pose: &Pose, angle: f32) -> bool {
        let knee_width = horizontal_width(
            pose.position(Landmark::LeftKnee),
            pose.position(Landmark::RightKnee),
        );
        let ankle_width = horizontal_width(
            pose.position(Landmark::LeftAnkle),
            pose.position(Landmark::RightAnkle),
        );
        if ankle_width <= 0.0 {
            return false;
        }
        self.ratios.push(knee_width / ankle_width);

        let in_band = angle > self.rule.band_low && angle <= self.rule.band_high;
        if !in_band {
            self.consecutive = 0;
            return false;
        }

        let smoothed = self.ratios.mean().unwrap_or(f32::INFINITY);
        if smoothed < self.rule.min_ratio || knee_width < ankle_width {
            self.consecutive = self.consecutive.saturating_add(1);
        } else {
            self.consecutive = 0;
        }
        self.consecutive >= self.rule.confirm_frames
    }

    pub fn reset(&mut self) {
        self.ratios.clear();
        self.consecutive = 0;
    }
}

/// Acceptable depth, judged on the smallest angle reached in a rep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthBand {
    pub too_deep_below: f32,
    pub not_deep_above: f32,
}

impl DepthBand {
    pub fn classify(&self, min_angle: f32) -> Option<FaultKind> {
        if min_angle < self.too_deep_below {
            Some(FaultKind::TooDeep)
        } else if min_angle > self.not_deep_above {
            Some(FaultKind::NotDeepEnough)
        } else {
            None
        }
    }
}
