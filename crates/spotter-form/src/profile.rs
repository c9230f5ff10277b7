//! Exercise profiles: every per-exercise number and rule the trainer uses.

use serde::{Deserialize, Serialize};
use spotter_pose::{Joint, Landmark, Pose, Side};
use std::fmt;
use std::str::FromStr;

use crate::aggregator::{FaultWeight, ScoreRule};
use crate::calibration::{AngleTarget, CalibrationParams, StartPosture};
use crate::error::ProfileError;
use crate::faults::{BackAngleRule, DepthBand, FaultKind, KneeCavingRule, TShapeRule};
use crate::feedback::FeedbackParams;
use crate::geometry::angle_at;
use crate::repetition::{RepState, Topology};
use crate::stability::{StabilityParams, MIN_STABILITY_SAMPLES};

/// Confidence a required landmark must exceed to count as visible.
pub const VISIBILITY_GATE: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exercise {
    BicepCurl,
    TricepPushdown,
    PushUp,
    Squat,
}

impl Exercise {
    pub const ALL: [Exercise; 4] = [
        Exercise::BicepCurl,
        Exercise::TricepPushdown,
        Exercise::PushUp,
        Exercise::Squat,
    ];

    pub fn profile(self) -> ExerciseProfile {
        match self {
            Exercise::BicepCurl => ExerciseProfile::bicep_curl(),
            Exercise::TricepPushdown => ExerciseProfile::tricep_pushdown(),
            Exercise::PushUp => ExerciseProfile::push_up(),
            Exercise::Squat => ExerciseProfile::squat(),
        }
    }

    fn slug(self) -> &'static str {
        match self {
            Exercise::BicepCurl => "bicep_curl",
            Exercise::TricepPushdown => "tricep_pushdown",
            Exercise::PushUp => "push_up",
            Exercise::Squat => "squat",
        }
    }
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Exercise {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Exercise::ALL
            .into_iter()
            .find(|e| e.slug() == normalized)
            .ok_or_else(|| ProfileError::Invalid(format!("unknown exercise: {s}")))
    }
}

/// Which body side the side-dependent measurements use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SideSelection {
    /// The side whose `joints` have the higher confidence sum; ties go right.
    MostVisible { joints: Vec<Joint> },
    Fixed { side: Side },
    /// Primary angle averaged over both sides.
    Both,
}

impl SideSelection {
    pub fn select(&self, pose: &Pose) -> Side {
        match self {
            SideSelection::MostVisible { joints } => {
                let left = pose.side_confidence(Side::Left, joints);
                let right = pose.side_confidence(Side::Right, joints);
                if right >= left { Side::Right } else { Side::Left }
            }
            SideSelection::Fixed { side } => *side,
            SideSelection::Both => Side::Right,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilitySides {
    /// Only the selected side.
    Selected,
    Both,
}

/// Whether a frame is good enough to analyze.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilityRule {
    pub joints: Vec<Joint>,
    pub sides: VisibilitySides,
    /// Required landmarks allowed at or below [`VISIBILITY_GATE`].
    #[serde(default)]
    pub max_missing: usize,
    /// Mean confidence over the required landmarks must exceed this.
    #[serde(default)]
    pub min_mean_confidence: Option<f32>,
}

impl VisibilityRule {
    pub fn landmarks(&self, side: Side) -> Vec<Landmark> {
        let sides: &[Side] = match self.sides {
            VisibilitySides::Selected => &[side],
            VisibilitySides::Both => &[Side::Left, Side::Right],
        };
        sides
            .iter()
            .flat_map(|s| self.joints.iter().map(move |j| j.on(*s)))
            .collect()
    }

    pub fn check(&self, pose: &Pose, side: Side) -> bool {
        let landmarks = self.landmarks(side);
        if landmarks.is_empty() {
            return true;
        }
        let missing = landmarks
            .iter()
            .filter(|l| !pose.keypoint(**l).is_visible(VISIBILITY_GATE))
            .count();
        if missing > self.max_missing {
            return false;
        }
        match self.min_mean_confidence {
            Some(min) => {
                let sum: f32 = landmarks.iter().map(|l| pose.keypoint(*l).confidence).sum();
                sum / landmarks.len() as f32 > min
            }
            None => true,
        }
    }
}

/// Three joints whose angle at `vertex` is the primary signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AngleSpec {
    pub proximal: Joint,
    pub vertex: Joint,
    pub distal: Joint,
}

impl AngleSpec {
    pub fn measure_side(&self, pose: &Pose, side: Side) -> f32 {
        angle_at(
            pose.joint(self.proximal, side).position,
            pose.joint(self.vertex, side).position,
            pose.joint(self.distal, side).position,
        )
    }

    pub fn measure(&self, pose: &Pose, selection: &SideSelection, side: Side) -> f32 {
        match selection {
            SideSelection::Both => {
                (self.measure_side(pose, Side::Left) + self.measure_side(pose, Side::Right)) / 2.0
            }
            _ => self.measure_side(pose, side),
        }
    }
}

/// Lateral drift of `tracked` relative to `anchor`, scored for instability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityRule {
    pub tracked: Joint,
    pub anchor: Joint,
    #[serde(flatten)]
    pub params: StabilityParams,
}

/// Optional per-frame and per-rep fault checks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FaultRules {
    #[serde(default)]
    pub stability: Option<StabilityRule>,
    #[serde(default)]
    pub back_angle: Option<BackAngleRule>,
    #[serde(default)]
    pub t_shape: Option<TShapeRule>,
    #[serde(default)]
    pub knee_caving: Option<KneeCavingRule>,
    #[serde(default)]
    pub depth: Option<DepthBand>,
}

impl FaultRules {
    /// Every fault these rules can report, in declaration order.
    pub fn faults(&self) -> Vec<FaultKind> {
        FaultKind::ALL
            .into_iter()
            .filter(|f| match f {
                FaultKind::ElbowSwinging => self.stability.is_some(),
                FaultKind::BackTooStraight | FaultKind::BackTooTilted => self.back_angle.is_some(),
                FaultKind::KneeCaving => self.knee_caving.is_some(),
                FaultKind::TooDeep | FaultKind::NotDeepEnough => self.depth.is_some(),
                FaultKind::TShapeElbows => self.t_shape.is_some(),
            })
            .collect()
    }
}

fn default_angle_window() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseProfile {
    pub name: String,
    /// Keypoint smoothing factor in `(0, 1]`.
    pub smoothing_alpha: f32,
    pub side: SideSelection,
    pub visibility: VisibilityRule,
    pub angle: AngleSpec,
    /// Frames in the primary-angle moving average; 1 disables it.
    #[serde(default = "default_angle_window")]
    pub angle_window: usize,
    pub topology: Topology,
    pub calibration: CalibrationParams,
    #[serde(default)]
    pub faults: FaultRules,
    pub score: ScoreRule,
    pub feedback: FeedbackParams,
    pub rep_cap: u32,
    /// Consecutive unusable frames before the session resets.
    pub detection_loss_frames: u32,
}

impl ExerciseProfile {
    pub fn bicep_curl() -> Self {
        Self {
            name: "Bicep Curl".to_string(),
            smoothing_alpha: 0.5,
            side: SideSelection::MostVisible {
                joints: vec![Joint::Shoulder, Joint::Elbow, Joint::Wrist, Joint::Hip],
            },
            visibility: VisibilityRule {
                joints: vec![Joint::Shoulder, Joint::Elbow, Joint::Wrist, Joint::Hip],
                sides: VisibilitySides::Selected,
                max_missing: 0,
                min_mean_confidence: Some(0.3),
            },
            angle: arm_angle(),
            angle_window: 1,
            topology: Topology::TwoPhase {
                start: RepState::Down,
                up_below: 80.0,
                down_above: 140.0,
                min_rep_interval_ms: 500,
            },
            calibration: CalibrationParams {
                posture: StartPosture {
                    angle_above: Some(140.0),
                    min_shoulder_rotation: Some(20.0),
                    ..StartPosture::default()
                },
                position_frames: 30,
                countdown_ms: 3000,
                instruction: "Turn sideways and extend arm down".to_string(),
            },
            faults: FaultRules {
                stability: Some(StabilityRule {
                    tracked: Joint::Elbow,
                    anchor: Joint::Shoulder,
                    params: StabilityParams {
                        window: 15,
                        movement_window: 10,
                        power: 1.5,
                        variance_floor: 35.0,
                        range_floor: 30.0,
                        damping: 0.5,
                        bad_threshold: 45.0,
                    },
                }),
                ..FaultRules::default()
            },
            score: ScoreRule::correct_ratio(),
            feedback: FeedbackParams {
                ttl_frames: 60,
                activation_frames: 1,
            },
            rep_cap: 10,
            detection_loss_frames: 30,
        }
    }

    pub fn tricep_pushdown() -> Self {
        Self {
            name: "Tricep".to_string(),
            smoothing_alpha: 0.3,
            side: SideSelection::MostVisible {
                joints: vec![Joint::Shoulder, Joint::Elbow, Joint::Wrist],
            },
            visibility: VisibilityRule {
                joints: vec![
                    Joint::Shoulder,
                    Joint::Elbow,
                    Joint::Wrist,
                    Joint::Hip,
                    Joint::Knee,
                    Joint::Ankle,
                ],
                sides: VisibilitySides::Both,
                max_missing: 1,
                min_mean_confidence: None,
            },
            angle: arm_angle(),
            angle_window: 1,
            topology: Topology::TwoPhase {
                start: RepState::Up,
                up_below: 100.0,
                down_above: 130.0,
                min_rep_interval_ms: 500,
            },
            calibration: CalibrationParams {
                posture: StartPosture {
                    angle_below: Some(120.0),
                    ..StartPosture::default()
                },
                position_frames: 30,
                countdown_ms: 3000,
                instruction: "Get in position (arms bent)".to_string(),
            },
            faults: FaultRules {
                stability: Some(StabilityRule {
                    tracked: Joint::Elbow,
                    anchor: Joint::Shoulder,
                    params: StabilityParams {
                        window: 30,
                        movement_window: 6,
                        power: 2.0,
                        variance_floor: 25.0,
                        range_floor: 25.0,
                        damping: 0.6,
                        bad_threshold: 65.0,
                    },
                }),
                back_angle: Some(BackAngleRule {
                    min: 143.6,
                    max: 170.0,
                }),
                ..FaultRules::default()
            },
            score: ScoreRule::correct_ratio(),
            feedback: FeedbackParams {
                ttl_frames: 10,
                activation_frames: 1,
            },
            rep_cap: 12,
            detection_loss_frames: 30,
        }
    }

    pub fn push_up() -> Self {
        Self {
            name: "Push-up".to_string(),
            smoothing_alpha: 0.4,
            side: SideSelection::Both,
            visibility: VisibilityRule {
                joints: vec![Joint::Shoulder, Joint::Elbow, Joint::Wrist],
                sides: VisibilitySides::Both,
                max_missing: 1,
                min_mean_confidence: None,
            },
            angle: arm_angle(),
            angle_window: 3,
            topology: Topology::FourPhase {
                top: 140.0,
                bottom: 110.0,
                min_dwell_ms: 30,
                min_excursion: 30.0,
            },
            calibration: CalibrationParams {
                posture: StartPosture {
                    angle_above: Some(140.0),
                    ..StartPosture::default()
                },
                position_frames: 15,
                countdown_ms: 3000,
                instruction: "Get in top pushup position (arms extended)".to_string(),
            },
            faults: FaultRules {
                t_shape: Some(TShapeRule {
                    max_width_ratio: 2.0,
                    engaged_below: 110.0,
                    min_shoulder_width: 10.0,
                    min_confidence: 0.3,
                }),
                ..FaultRules::default()
            },
            score: ScoreRule {
                rep_weight: 100.0,
                form_weight: 0.0,
                fault_penalty: 5.0,
                fault_weights: Vec::new(),
            },
            feedback: FeedbackParams {
                ttl_frames: 5,
                activation_frames: 3,
            },
            rep_cap: 12,
            detection_loss_frames: 30,
        }
    }

    pub fn squat() -> Self {
        Self {
            name: "Squat".to_string(),
            smoothing_alpha: 0.2,
            side: SideSelection::Fixed { side: Side::Right },
            visibility: VisibilityRule {
                joints: vec![Joint::Hip, Joint::Knee, Joint::Ankle],
                sides: VisibilitySides::Both,
                max_missing: 1,
                min_mean_confidence: None,
            },
            angle: AngleSpec {
                proximal: Joint::Hip,
                vertex: Joint::Knee,
                distal: Joint::Ankle,
            },
            angle_window: 10,
            topology: Topology::FourPhase {
                top: 150.0,
                bottom: 140.0,
                min_dwell_ms: 10,
                min_excursion: 30.0,
            },
            calibration: CalibrationParams {
                posture: StartPosture {
                    angle_near: Some(AngleTarget {
                        target: 170.0,
                        tolerance: 5.0,
                    }),
                    confident: vec![Landmark::LeftAnkle, Landmark::RightAnkle],
                    min_confidence: 0.3,
                    ..StartPosture::default()
                },
                position_frames: 15,
                countdown_ms: 3000,
                instruction: "Stand straight with feet visible".to_string(),
            },
            faults: FaultRules {
                knee_caving: Some(KneeCavingRule {
                    min_ratio: 1.1,
                    history: 10,
                    confirm_frames: 3,
                    band_low: 35.0,
                    band_high: 140.0,
                }),
                depth: Some(DepthBand {
                    too_deep_below: 35.0,
                    not_deep_above: 95.0,
                }),
                ..FaultRules::default()
            },
            score: ScoreRule {
                rep_weight: 70.0,
                form_weight: 30.0,
                fault_penalty: 0.0,
                fault_weights: vec![FaultWeight {
                    fault: FaultKind::KneeCaving,
                    weight: 1.5,
                }],
            },
            feedback: FeedbackParams {
                ttl_frames: 5,
                activation_frames: 3,
            },
            rep_cap: 12,
            detection_loss_frames: 90,
        }
    }

    pub fn validate(&self) -> Result<(), ProfileError> {
        let invalid = |msg: String| Err(ProfileError::Invalid(format!("{}: {msg}", self.name)));

        if !(self.smoothing_alpha > 0.0 && self.smoothing_alpha <= 1.0) {
            return invalid(format!("smoothing_alpha {} not in (0, 1]", self.smoothing_alpha));
        }
        if self.angle_window == 0 {
            return invalid("angle_window must be at least 1".to_string());
        }
        match self.topology {
            Topology::TwoPhase {
                up_below,
                down_above,
                ..
            } if up_below >= down_above => {
                return invalid(format!(
                    "up threshold {up_below} must be below down threshold {down_above}"
                ));
            }
            Topology::FourPhase { top, bottom, .. } if bottom >= top => {
                return invalid(format!(
                    "bottom threshold {bottom} must be below top threshold {top}"
                ));
            }
            Topology::FourPhase { min_excursion, .. } if min_excursion < 0.0 => {
                return invalid("min_excursion must not be negative".to_string());
            }
            _ => {}
        }
        if let Some(rule) = &self.faults.stability {
            let p = &rule.params;
            if p.window < MIN_STABILITY_SAMPLES {
                return invalid(format!(
                    "stability window must hold at least {MIN_STABILITY_SAMPLES} samples"
                ));
            }
            if p.movement_window == 0 {
                return invalid("movement window must not be empty".to_string());
            }
            if p.damping <= 0.0 {
                return invalid("stability damping must be positive".to_string());
            }
        }
        if let Some(back) = &self.faults.back_angle {
            if back.min >= back.max {
                return invalid("back angle band is empty".to_string());
            }
        }
        if let Some(depth) = &self.faults.depth {
            if depth.too_deep_below >= depth.not_deep_above {
                return invalid("depth band is empty".to_string());
            }
        }
        if let Some(knee) = &self.faults.knee_caving {
            if knee.history == 0 || knee.confirm_frames == 0 {
                return invalid(
                    "knee caving history and confirm_frames must be positive".to_string(),
                );
            }
        }
        if self.visibility.joints.is_empty() {
            return invalid("visibility rule needs at least one joint".to_string());
        }
        let required = self.visibility.landmarks(Side::Right).len();
        if self.visibility.max_missing >= required {
            return invalid(format!(
                "max_missing {} allows every landmark to be missing",
                self.visibility.max_missing
            ));
        }
        if let SideSelection::MostVisible { joints } = &self.side {
            if joints.is_empty() {
                return invalid("side selection needs at least one joint".to_string());
            }
        }
        if self.calibration.position_frames == 0 {
            return invalid("calibration position_frames must be positive".to_string());
        }
        if self.feedback.ttl_frames == 0 || self.feedback.activation_frames == 0 {
            return invalid("feedback ttl and activation frames must be positive".to_string());
        }
        if self.score.rep_weight < 0.0
            || self.score.form_weight < 0.0
            || self.score.fault_penalty < 0.0
        {
            return invalid("score weights must not be negative".to_string());
        }
        if self.rep_cap == 0 {
            return invalid("rep_cap must be positive".to_string());
        }
        if self.detection_loss_frames == 0 {
            return invalid("detection_loss_frames must be positive".to_string());
        }
        Ok(())
    }
}

fn arm_angle() -> AngleSpec {
    AngleSpec {
        proximal: Joint::Shoulder,
        vertex: Joint::Elbow,
        distal: Joint::Wrist,
    }
}
