use chrono::Utc;
use spotter_pose::{KeypointSmoother, Pose, Side};
use spotter_store::SummarySink;
use std::collections::{BTreeMap, BTreeSet};

use crate::aggregator::{SessionAggregator, SessionStats};
use crate::calibration::{CalibrationGate, GateEvent};
use crate::error::ProfileError;
use crate::faults::{BackAngleRule, FaultKind, KneeCavingDetector};
use crate::feedback::{
    Cue, CueColor, FeedbackBoard, HysteresisSignal, SignalChange, GOOD_FORM_CUE, LOW_VISIBILITY_CUE,
};
use crate::geometry::horizontal_offset;
use crate::profile::{ExerciseProfile, StabilityRule};
use crate::repetition::{RepMachine, RepOutcome, RepSample, RepState};
use crate::stability::StabilityEstimator;
use crate::window::RollingWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainerPhase {
    Calibrating,
    Counting,
    /// Rep cap reached or session finished; frames are ignored until reset.
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// Angle range over the cycle below the profile's minimum excursion.
    Shallow,
    /// Back at rest before the minimum rep interval.
    TooSoon,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrainerEvent {
    CountdownStarted,
    CountingStarted,
    RepCounted {
        number: u32,
        correct: bool,
        feedback: String,
    },
    RepDiscarded(DiscardReason),
    /// Input was unusable for too long; calibration starts over.
    DetectionReset,
    SessionComplete(SessionStats),
}

/// What happened on one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub phase: TrainerPhase,
    /// Whether the frame passed the visibility rule.
    pub usable: bool,
    /// Primary joint angle after the moving average.
    pub angle: Option<f32>,
    pub instability: f32,
    pub rep_state: RepState,
    pub events: Vec<TrainerEvent>,
}

struct Tracker {
    rule: StabilityRule,
    estimator: StabilityEstimator,
}

/// One exercise session: every frame goes through smoothing, geometry,
/// calibration, fault checks, the rep machine and the aggregator, in that
/// order and synchronously.
pub struct Trainer {
    profile: ExerciseProfile,
    smoother: KeypointSmoother,
    angles: RollingWindow,
    tracker: Option<Tracker>,
    knees: Option<KneeCavingDetector>,
    gate: CalibrationGate,
    machine: RepMachine,
    aggregator: SessionAggregator,
    board: FeedbackBoard,
    signals: BTreeMap<FaultKind, HysteresisSignal>,
    phase: TrainerPhase,
    lost_frames: u32,
}

impl Trainer {
    pub fn new(profile: ExerciseProfile) -> Result<Self, ProfileError> {
        profile.validate()?;
        let tracker = profile.faults.stability.clone().map(|rule| Tracker {
            estimator: StabilityEstimator::new(rule.params.clone()),
            rule,
        });
        let signals = profile
            .faults
            .faults()
            .into_iter()
            .map(|f| (f, HysteresisSignal::new(profile.feedback.activation_frames)))
            .collect();

        Ok(Self {
            smoother: KeypointSmoother::new(profile.smoothing_alpha),
            angles: RollingWindow::new(profile.angle_window),
            tracker,
            knees: profile.faults.knee_caving.clone().map(KneeCavingDetector::new),
            gate: CalibrationGate::from_params(&profile.calibration),
            machine: RepMachine::new(profile.topology.clone()),
            aggregator: SessionAggregator::new(
                profile.name.clone(),
                profile.score.clone(),
                profile.faults.faults(),
            ),
            board: FeedbackBoard::new(),
            signals,
            phase: TrainerPhase::Calibrating,
            lost_frames: 0,
            profile,
        })
    }

    pub fn profile(&self) -> &ExerciseProfile {
        &self.profile
    }

    pub fn phase(&self) -> TrainerPhase {
        self.phase
    }

    pub fn stats(&self) -> &SessionStats {
        self.aggregator.stats()
    }

    pub fn score(&self) -> u8 {
        self.aggregator.compute_score()
    }

    pub fn rep_state(&self) -> RepState {
        self.machine.state()
    }

    pub fn gate(&self) -> &CalibrationGate {
        &self.gate
    }

    pub fn cues(&self) -> &[Cue] {
        self.board.cues()
    }

    pub fn is_saved(&self) -> bool {
        self.aggregator.is_saved()
    }

    /// Analyze one frame. `pose` is `None` when the detector found nobody.
    pub fn process(
        &mut self,
        pose: Option<&Pose>,
        now_ms: u64,
        sink: &mut impl SummarySink,
    ) -> FrameReport {
        self.board.tick();
        let mut events = Vec::new();

        if self.phase == TrainerPhase::Completed {
            return self.report(false, None, 0.0, events);
        }

        let Some(raw) = pose else {
            self.on_unusable_frame(&mut events);
            return self.report(false, None, 0.0, events);
        };

        let pose = self.smoother.apply(raw);
        let side = self.profile.side.select(&pose);
        if !self.profile.visibility.check(&pose, side) {
            if self.board.is_empty() {
                self.board
                    .show(LOW_VISIBILITY_CUE, CueColor::Error, self.profile.feedback.ttl_frames);
            }
            self.on_unusable_frame(&mut events);
            return self.report(false, None, 0.0, events);
        }
        self.lost_frames = 0;

        self.angles
            .push(self.profile.angle.measure(&pose, &self.profile.side, side));
        let angle = self.angles.mean().unwrap_or_default();

        let instability = match &mut self.tracker {
            Some(tracker) => tracker.estimator.update(horizontal_offset(
                pose.joint(tracker.rule.tracked, side).position,
                pose.joint(tracker.rule.anchor, side).position,
            )),
            None => 0.0,
        };

        match self.phase {
            TrainerPhase::Calibrating => self.calibrate(&pose, angle, now_ms, &mut events),
            TrainerPhase::Counting => {
                self.count(&pose, side, angle, instability, now_ms, sink, &mut events)
            }
            TrainerPhase::Completed => {}
        }

        self.report(true, Some(angle), instability, events)
    }

    /// Abandon path: submit the session if at least one rep was counted.
    /// Returns whether this call submitted it.
    pub fn finish(&mut self, sink: &mut impl SummarySink) -> bool {
        self.phase = TrainerPhase::Completed;
        self.submit_started(sink)
    }

    /// Start a fresh session with the same profile. The running session is
    /// submitted first, under the same rules as `finish`.
    pub fn reset(&mut self, sink: &mut impl SummarySink) -> bool {
        let submitted = self.submit_started(sink);
        self.reset_tracking();
        self.aggregator = SessionAggregator::new(
            self.profile.name.clone(),
            self.profile.score.clone(),
            self.profile.faults.faults(),
        );
        self.board.clear();
        self.phase = TrainerPhase::Calibrating;
        self.lost_frames = 0;
        submitted
    }

    fn submit_started(&mut self, sink: &mut impl SummarySink) -> bool {
        if self.aggregator.stats().total_reps == 0 {
            return false;
        }
        self.aggregator.finalize(sink, Utc::now())
    }

    fn calibrate(&mut self, pose: &Pose, angle: f32, now_ms: u64, events: &mut Vec<TrainerEvent>) {
        let in_position = self.profile.calibration.posture.matches(pose, angle);
        if !in_position {
            self.board.show(
                &self.profile.calibration.instruction,
                CueColor::Warning,
                self.profile.feedback.ttl_frames,
            );
        }

        match self.gate.update(in_position, now_ms) {
            Some(GateEvent::CountdownStarted) => {
                log::info!("{}: in position, countdown started", self.profile.name);
                events.push(TrainerEvent::CountdownStarted);
            }
            Some(GateEvent::Opened) => {
                log::info!("{}: counting reps", self.profile.name);
                self.board.remove(&self.profile.calibration.instruction);
                self.phase = TrainerPhase::Counting;
                events.push(TrainerEvent::CountingStarted);
            }
            None => {}
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn count(
        &mut self,
        pose: &Pose,
        side: Side,
        angle: f32,
        instability: f32,
        now_ms: u64,
        sink: &mut impl SummarySink,
        events: &mut Vec<TrainerEvent>,
    ) {
        let faults = self.frame_faults(pose, side, angle, instability);
        self.update_fault_cues(&faults);

        let sample = RepSample {
            angle,
            instability,
            faults: &faults,
        };
        match self.machine.step(sample, now_ms) {
            Some(RepOutcome::Counted(rep)) => {
                let mut faults = rep.faults.clone();
                if let Some(depth) = &self.profile.faults.depth {
                    faults.extend(depth.classify(rep.min_angle));
                }
                if !self
                    .aggregator
                    .record_rep(rep.sequence, rep.min_angle, rep.peak_instability, &faults)
                {
                    return;
                }

                let stats = self.aggregator.stats();
                let number = stats.total_reps;
                let feedback = stats.reps.last().map(|r| r.feedback.clone()).unwrap_or_default();
                log::info!("{} rep {}: {}", self.profile.name, number, feedback);
                self.show_rep_feedback(&faults);
                events.push(TrainerEvent::RepCounted {
                    number,
                    correct: faults.is_empty(),
                    feedback,
                });

                if number >= self.profile.rep_cap {
                    self.aggregator.finalize(sink, Utc::now());
                    self.phase = TrainerPhase::Completed;
                    events.push(TrainerEvent::SessionComplete(self.aggregator.stats().clone()));
                }
            }
            Some(RepOutcome::TooShallow(rep)) => {
                log::debug!("discarding shallow rep ({:.1} deg range)", rep.excursion());
                events.push(TrainerEvent::RepDiscarded(DiscardReason::Shallow));
            }
            Some(RepOutcome::TooSoon) => {
                log::debug!("discarding rep inside the minimum interval");
                events.push(TrainerEvent::RepDiscarded(DiscardReason::TooSoon));
            }
            None => {}
        }
    }

    fn frame_faults(
        &mut self,
        pose: &Pose,
        side: Side,
        angle: f32,
        instability: f32,
    ) -> BTreeSet<FaultKind> {
        let mut faults = BTreeSet::new();
        if let Some(tracker) = &self.tracker {
            if tracker.estimator.is_bad(instability) {
                faults.insert(FaultKind::ElbowSwinging);
            }
        }
        if let Some(back) = &self.profile.faults.back_angle {
            faults.extend(back.check(BackAngleRule::measure(pose, side)));
        }
        if let Some(t_shape) = &self.profile.faults.t_shape {
            if t_shape.check(pose, angle) {
                faults.insert(FaultKind::TShapeElbows);
            }
        }
        if let Some(knees) = &mut self.knees {
            if knees.update(pose, angle) {
                faults.insert(FaultKind::KneeCaving);
            }
        }
        faults
    }

    fn update_fault_cues(&mut self, faults: &BTreeSet<FaultKind>) {
        let ttl = self.profile.feedback.ttl_frames;
        for (fault, signal) in &mut self.signals {
            // depth is judged per rep, not per frame
            if matches!(fault, FaultKind::TooDeep | FaultKind::NotDeepEnough) {
                continue;
            }
            let change = signal.update(faults.contains(fault));
            if change == Some(SignalChange::Deactivated) {
                self.board.remove(fault.cue());
            } else if signal.is_active() {
                self.board.show(fault.cue(), fault.color(), ttl);
            }
        }
    }

    fn show_rep_feedback(&mut self, faults: &BTreeSet<FaultKind>) {
        let ttl = self.profile.feedback.ttl_frames;
        self.board.clear();
        if faults.is_empty() {
            self.board.show(GOOD_FORM_CUE, CueColor::Good, ttl);
        }
        for fault in faults {
            self.board.show(fault.cue(), fault.color(), ttl);
        }
    }

    fn on_unusable_frame(&mut self, events: &mut Vec<TrainerEvent>) {
        self.lost_frames = self.lost_frames.saturating_add(1);
        if self.lost_frames == self.profile.detection_loss_frames {
            log::warn!(
                "{}: no usable pose for {} frames, recalibrating",
                self.profile.name,
                self.lost_frames
            );
            self.reset_tracking();
            self.phase = TrainerPhase::Calibrating;
            events.push(TrainerEvent::DetectionReset);
        }
    }

    /// Clears everything about the rep in progress; completed reps stay.
    fn reset_tracking(&mut self) {
        self.smoother.reset();
        self.angles.clear();
        if let Some(tracker) = &mut self.tracker {
            tracker.estimator.reset();
        }
        if let Some(knees) = &mut self.knees {
            knees.reset();
        }
        for signal in self.signals.values_mut() {
            signal.reset();
        }
        self.gate.reset();
        self.machine.reset();
    }

    fn report(
        &self,
        usable: bool,
        angle: Option<f32>,
        instability: f32,
        events: Vec<TrainerEvent>,
    ) -> FrameReport {
        FrameReport {
            phase: self.phase,
            usable,
            angle,
            instability,
            rep_state: self.machine.state(),
            events,
        }
    }
}
