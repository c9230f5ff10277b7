//! Exercise-form analysis: joint geometry, stability scoring, calibration,
//! repetition counting and session scoring, driven one pose frame at a time.

pub mod aggregator;
pub mod calibration;
pub mod config;
pub mod error;
pub mod faults;
pub mod feedback;
pub mod geometry;
pub mod profile;
pub mod repetition;
pub mod runner;
pub mod stability;
pub mod trainer;
pub mod window;

pub use aggregator::{FaultWeight, RepRecord, ScoreRule, SessionAggregator, SessionStats};
pub use calibration::{
    AngleTarget, CalibrationGate, CalibrationParams, GateEvent, GateState, StartPosture,
};
pub use config::TrainerConfig;
pub use error::ProfileError;
pub use faults::{feedback_text, FaultKind, GOOD_FORM};
pub use feedback::{Cue, CueColor, FeedbackBoard, FeedbackSink, HysteresisSignal, LogFeedback};
pub use geometry::{angle_at, rotation_angle, DEGENERATE_ANGLE};
pub use profile::{Exercise, ExerciseProfile, SideSelection};
pub use repetition::{RepMachine, RepOutcome, RepSample, RepState, Topology};
pub use runner::{run_session, FrameLimiter, RunOutcome, RunnerConfig};
pub use stability::{StabilityEstimator, StabilityParams};
pub use trainer::{DiscardReason, FrameReport, Trainer, TrainerEvent, TrainerPhase};
pub use window::RollingWindow;
