use serde::Deserialize;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Duration;

use crate::{Keypoint, Pose, PoseError};

/// Async pose source trait.
///
/// Each call yields the detector result for one video frame: `Some` for a
/// detected person, `None` when the frame held no pose. A source that has
/// no more frames returns `PoseError::Exhausted`.
#[allow(async_fn_in_trait)]
pub trait PoseSource {
    async fn recv(&mut self) -> Result<Option<Pose>, PoseError>;
}

#[derive(Deserialize)]
struct RawKeypoint {
    x: f32,
    y: f32,
    #[serde(alias = "confidence")]
    score: f32,
}

/// Parse one JSON-lines frame: `null` or an array of 17 `{x, y, score}` objects.
pub fn parse_frame(line: &str, line_number: usize) -> Result<Option<Pose>, PoseError> {
    let raw: Option<Vec<RawKeypoint>> =
        serde_json::from_str(line).map_err(|e| PoseError::Parse {
            line: line_number,
            message: e.to_string(),
        })?;

    let Some(raw) = raw else {
        return Ok(None);
    };
    let keypoints: Vec<Keypoint> = raw
        .into_iter()
        .map(|k| Keypoint::new(k.x, k.y, k.score))
        .collect();
    Pose::from_slice(&keypoints).map(Some)
}

/// Replays recorded detector output.
pub struct ReplaySource {
    frames: VecDeque<Option<Pose>>,
    frame_interval: Option<Duration>,
}

impl ReplaySource {
    pub fn from_frames(frames: impl IntoIterator<Item = Option<Pose>>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            frame_interval: None,
        }
    }

    /// Read JSON-lines frames; blank lines are skipped.
    pub fn from_reader(reader: impl BufRead) -> Result<Self, PoseError> {
        let mut frames = VecDeque::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            frames.push_back(parse_frame(&line, index + 1)?);
        }
        log::debug!("loaded {} replay frames", frames.len());
        Ok(Self {
            frames,
            frame_interval: None,
        })
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, PoseError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Wait this long before yielding each frame, emulating a live camera.
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = Some(interval);
        self
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl PoseSource for ReplaySource {
    async fn recv(&mut self) -> Result<Option<Pose>, PoseError> {
        if let Some(interval) = self.frame_interval {
            tokio::time::sleep(interval).await;
        }
        self.frames.pop_front().ok_or(PoseError::Exhausted)
    }
}
