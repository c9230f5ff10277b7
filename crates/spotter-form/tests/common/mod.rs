#![allow(dead_code)]

use spotter_form::{Trainer, TrainerEvent, TrainerPhase};
use spotter_pose::{Joint, Keypoint, Landmark, Pose, Side, LANDMARK_COUNT};
use spotter_store::SessionSummary;

/// Milliseconds between simulated frames.
pub const STEP_MS: u64 = 34;

pub fn place(pose: &mut Pose, landmark: Landmark, x: f32, y: f32) {
    pose.keypoint_mut(landmark).position.x = x;
    pose.keypoint_mut(landmark).position.y = y;
}

fn blank_pose() -> Pose {
    Pose::new([Keypoint::new(50.0, 50.0, 0.9); LANDMARK_COUNT])
}

/// A side-on arm whose right elbow angle is `angle_deg`. `swing` shifts the
/// elbow and wrist sideways relative to the shoulder.
pub fn arm_pose(angle_deg: f32, swing: f32) -> Pose {
    let mut pose = blank_pose();
    let elbow = (100.0 + swing, 200.0);
    let rad = angle_deg.to_radians();
    place(&mut pose, Landmark::LeftShoulder, 60.0, 60.0);
    place(&mut pose, Landmark::RightShoulder, 100.0, 100.0);
    place(&mut pose, Landmark::RightElbow, elbow.0, elbow.1);
    place(
        &mut pose,
        Landmark::RightWrist,
        elbow.0 + 100.0 * rad.sin(),
        elbow.1 - 100.0 * rad.cos(),
    );
    place(&mut pose, Landmark::RightHip, 100.0, 300.0);
    pose
}

/// Front-on legs with the right knee at `knee_angle`. Ankles sit 60 apart
/// and the knees `knee_width` apart, so anything under 66 reads as caving.
pub fn leg_pose(knee_angle: f32, knee_width: f32) -> Pose {
    let mut pose = blank_pose();
    let rad = knee_angle.to_radians();
    place(&mut pose, Landmark::RightAnkle, 150.0, 400.0);
    place(&mut pose, Landmark::RightKnee, 150.0, 300.0);
    place(
        &mut pose,
        Landmark::RightHip,
        150.0 + 100.0 * rad.sin(),
        300.0 + 100.0 * rad.cos(),
    );
    place(&mut pose, Landmark::LeftAnkle, 90.0, 400.0);
    place(&mut pose, Landmark::LeftKnee, 150.0 - knee_width, 300.0);
    place(&mut pose, Landmark::LeftHip, 150.0 - knee_width, 200.0);
    pose
}

/// Both arms in a push-up seen from the front. Shoulders sit 40 apart and
/// each elbow is pushed `flare` further out.
pub fn push_up_arms(right_angle: f32, left_angle: f32, flare: f32) -> Pose {
    let mut pose = blank_pose();
    place_arm(&mut pose, Side::Right, (120.0, 100.0), (120.0 + flare, 200.0), right_angle);
    place_arm(&mut pose, Side::Left, (80.0, 100.0), (80.0 - flare, 200.0), -left_angle);
    pose
}

pub fn push_up_pose(elbow_angle: f32, flare: f32) -> Pose {
    push_up_arms(elbow_angle, elbow_angle, flare)
}

/// The wrist goes 100 from the elbow, `angle_deg` round from the shoulder.
fn place_arm(pose: &mut Pose, side: Side, shoulder: (f32, f32), elbow: (f32, f32), angle_deg: f32) {
    let (dx, dy) = (shoulder.0 - elbow.0, shoulder.1 - elbow.1);
    let length = (dx * dx + dy * dy).sqrt();
    let (ux, uy) = (dx / length, dy / length);
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let wrist = (
        elbow.0 + 100.0 * (ux * cos - uy * sin),
        elbow.1 + 100.0 * (ux * sin + uy * cos),
    );
    place(pose, Joint::Shoulder.on(side), shoulder.0, shoulder.1);
    place(pose, Joint::Elbow.on(side), elbow.0, elbow.1);
    place(pose, Joint::Wrist.on(side), wrist.0, wrist.1);
}

/// Simulated time and a sink shared by a test's frames.
pub struct Session {
    pub now_ms: u64,
    pub saved: Vec<SessionSummary>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            saved: Vec::new(),
        }
    }

    pub fn frame(&mut self, trainer: &mut Trainer, pose: Option<&Pose>) -> Vec<TrainerEvent> {
        self.now_ms += STEP_MS;
        trainer.process(pose, self.now_ms, &mut self.saved).events
    }

    /// Feed `frames` copies of an arm pose and collect the events.
    pub fn arm(
        &mut self,
        trainer: &mut Trainer,
        angle: f32,
        swing: f32,
        frames: usize,
    ) -> Vec<TrainerEvent> {
        self.hold(trainer, &arm_pose(angle, swing), frames)
    }

    /// Feed `frames` copies of `pose` and collect the events.
    pub fn hold(&mut self, trainer: &mut Trainer, pose: &Pose, frames: usize) -> Vec<TrainerEvent> {
        (0..frames).flat_map(|_| self.frame(trainer, Some(pose))).collect()
    }

    pub fn calibrate(&mut self, trainer: &mut Trainer) {
        self.calibrate_with(trainer, &arm_pose(170.0, 0.0));
    }

    /// Hold `pose` until counting starts.
    pub fn calibrate_with(&mut self, trainer: &mut Trainer, pose: &Pose) {
        for _ in 0..400 {
            self.frame(trainer, Some(pose));
            if trainer.phase() == TrainerPhase::Counting {
                return;
            }
        }
        panic!("calibration did not complete");
    }

    /// Curl up and back down.
    pub fn curl(&mut self, trainer: &mut Trainer) -> Vec<TrainerEvent> {
        let mut events = self.arm(trainer, 60.0, 0.0, 8);
        events.extend(self.arm(trainer, 170.0, 0.0, 8));
        events
    }

    /// Squat down to `depth` and stand back up.
    pub fn squat(
        &mut self,
        trainer: &mut Trainer,
        depth: f32,
        knee_width: f32,
    ) -> Vec<TrainerEvent> {
        let mut events = self.hold(trainer, &leg_pose(depth, knee_width), 40);
        events.extend(self.hold(trainer, &leg_pose(170.0, knee_width), 40));
        events
    }

    /// Lower to `bottom` and press back up.
    pub fn push_up(&mut self, trainer: &mut Trainer, bottom: f32, flare: f32) -> Vec<TrainerEvent> {
        let mut events = self.hold(trainer, &push_up_pose(bottom, flare), 20);
        events.extend(self.hold(trainer, &push_up_pose(170.0, flare), 20));
        events
    }
}

pub fn counted(events: &[TrainerEvent]) -> Vec<(u32, bool, String)> {
    events
        .iter()
        .filter_map(|e| match e {
            TrainerEvent::RepCounted {
                number,
                correct,
                feedback,
            } => Some((*number, *correct, feedback.clone())),
            _ => None,
        })
        .collect()
}
