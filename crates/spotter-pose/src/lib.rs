//! Pose input for the spotter trainer: detector landmark types, the async
//! pose-source contract and per-landmark temporal smoothing.

pub mod error;
pub mod smoother;
pub mod source;
pub mod types;

pub use error::PoseError;
pub use smoother::{KeypointSmoother, SMOOTHING_CONFIDENCE_GATE};
pub use source::{parse_frame, PoseSource, ReplaySource};
pub use types::{Joint, Keypoint, Landmark, Pose, Side, LANDMARK_COUNT};
