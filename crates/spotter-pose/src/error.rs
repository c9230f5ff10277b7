use std::fmt;

#[derive(Debug)]
pub enum PoseError {
    InvalidLandmark(usize),
    KeypointCount { expected: usize, got: usize },
    Parse { line: usize, message: String },
    Io(String),
    /// The source has no more frames.
    Exhausted,
}

impl fmt::Display for PoseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoseError::InvalidLandmark(index) => {
                write!(f, "invalid landmark index: {index}, must be in range 0-16")
            }
            PoseError::KeypointCount { expected, got } => {
                write!(f, "expected {expected} keypoints, got {got}")
            }
            PoseError::Parse { line, message } => {
                write!(f, "parse error on line {line}: {message}")
            }
            PoseError::Io(msg) => write!(f, "io error: {msg}"),
            PoseError::Exhausted => write!(f, "pose source exhausted"),
        }
    }
}

impl std::error::Error for PoseError {}

impl From<std::io::Error> for PoseError {
    fn from(err: std::io::Error) -> Self {
        PoseError::Io(err.to_string())
    }
}
