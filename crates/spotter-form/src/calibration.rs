use serde::{Deserialize, Serialize};
use spotter_pose::{Landmark, Pose};

use crate::geometry::rotation_angle;

/// An angle with an allowed deviation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AngleTarget {
    pub target: f32,
    pub tolerance: f32,
}

/// Starting-position predicate: every condition that is set must hold.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StartPosture {
    #[serde(default)]
    pub angle_above: Option<f32>,
    #[serde(default)]
    pub angle_below: Option<f32>,
    #[serde(default)]
    pub angle_near: Option<AngleTarget>,
    /// Minimum tilt of the shoulder line, in degrees.
    #[serde(default)]
    pub min_shoulder_rotation: Option<f32>,
    /// Landmarks that must be seen with more than `min_confidence`.
    #[serde(default)]
    pub confident: Vec<Landmark>,
    #[serde(default)]
    pub min_confidence: f32,
}

impl StartPosture {
    pub fn matches(&self, pose: &Pose, angle: f32) -> bool {
        if self.angle_above.is_some_and(|min| angle <= min) {
            return false;
        }
        if self.angle_below.is_some_and(|max| angle >= max) {
            return false;
        }
        if let Some(near) = &self.angle_near {
            if (angle - near.target).abs() > near.tolerance {
                return false;
            }
        }
        if let Some(min_rotation) = self.min_shoulder_rotation {
            let rotation = rotation_angle(
                pose.position(Landmark::LeftShoulder),
                pose.position(Landmark::RightShoulder),
            );
            if rotation <= min_rotation {
                return false;
            }
        }
        self.confident
            .iter()
            .all(|l| pose.keypoint(*l).is_visible(self.min_confidence))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationParams {
    pub posture: StartPosture,
    /// In-position frames needed before the countdown starts.
    pub position_frames: u32,
    pub countdown_ms: u64,
    /// Shown while the user is out of position.
    pub instruction: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Waiting,
    Countdown { started_ms: u64 },
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateEvent {
    CountdownStarted,
    Opened,
}

/// Holds counting back until the user has held the start position long
/// enough and a countdown has run out.
#[derive(Debug, Clone)]
pub struct CalibrationGate {
    position_frames: u32,
    countdown_ms: u64,
    held_frames: u32,
    state: GateState,
}

impl CalibrationGate {
    pub fn new(position_frames: u32, countdown_ms: u64) -> Self {
        Self {
            position_frames: position_frames.max(1),
            countdown_ms,
            held_frames: 0,
            state: GateState::Waiting,
        }
    }

    pub fn from_params(params: &CalibrationParams) -> Self {
        Self::new(params.position_frames, params.countdown_ms)
    }

    pub fn update(&mut self, in_position: bool, now_ms: u64) -> Option<GateEvent> {
        if self.state == GateState::Open {
            return None;
        }

        if !in_position {
            self.held_frames = self.held_frames.saturating_sub(2);
            self.state = GateState::Waiting;
            return None;
        }

        self.held_frames = (self.held_frames + 1).min(self.position_frames);
        let mut event = None;
        if self.state == GateState::Waiting && self.held_frames >= self.position_frames {
            self.state = GateState::Countdown { started_ms: now_ms };
            event = Some(GateEvent::CountdownStarted);
        }

        if let GateState::Countdown { started_ms } = self.state {
            if now_ms.saturating_sub(started_ms) >= self.countdown_ms {
                self.state = GateState::Open;
                event = Some(GateEvent::Opened);
            }
        }
        event
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == GateState::Open
    }

    pub fn held_frames(&self) -> u32 {
        self.held_frames
    }

    /// Fraction of the required in-position frames seen so far.
    pub fn progress(&self) -> f32 {
        self.held_frames as f32 / self.position_frames as f32
    }

    /// Whole seconds left on a running countdown.
    pub fn seconds_left(&self, now_ms: u64) -> Option<u64> {
        match self.state {
            GateState::Countdown { started_ms } => {
                let remaining = self
                    .countdown_ms
                    .saturating_sub(now_ms.saturating_sub(started_ms));
                Some(remaining.div_ceil(1000))
            }
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        self.held_frames = 0;
        self.state = GateState::Waiting;
    }
}
