//! Which cues are on screen and for how long. Rendering is up to the
//! [`FeedbackSink`].

use serde::{Deserialize, Serialize};

pub const LOW_VISIBILITY_CUE: &str = "Move closer to camera or adjust position";
pub const GOOD_FORM_CUE: &str = "Good form!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CueColor {
    Good,
    Warning,
    Error,
}

impl CueColor {
    pub fn hex(self) -> &'static str {
        match self {
            CueColor::Good => "#4CAF50",
            CueColor::Warning => "#FFA500",
            CueColor::Error => "#FF0000",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    pub message: String,
    pub color: CueColor,
    /// Frames left before the cue expires.
    pub ttl_frames: u32,
}

/// Cue lifetime and activation tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackParams {
    pub ttl_frames: u32,
    /// Frames a fault must be seen before its cue activates.
    pub activation_frames: u32,
}

/// Active cues in insertion order, one per message.
#[derive(Debug, Clone, Default)]
pub struct FeedbackBoard {
    cues: Vec<Cue>,
}

impl FeedbackBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a cue or refresh the TTL and color of an existing one.
    pub fn show(&mut self, message: &str, color: CueColor, ttl_frames: u32) {
        if ttl_frames == 0 {
            return;
        }
        match self.cues.iter_mut().find(|c| c.message == message) {
            Some(cue) => {
                cue.color = color;
                cue.ttl_frames = ttl_frames;
            }
            None => self.cues.push(Cue {
                message: message.to_string(),
                color,
                ttl_frames,
            }),
        }
    }

    pub fn remove(&mut self, message: &str) {
        self.cues.retain(|c| c.message != message);
    }

    pub fn clear(&mut self) {
        self.cues.clear();
    }

    /// Age every cue by one frame and drop the expired ones.
    pub fn tick(&mut self) {
        for cue in &mut self.cues {
            cue.ttl_frames = cue.ttl_frames.saturating_sub(1);
        }
        self.cues.retain(|c| c.ttl_frames > 0);
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalChange {
    Activated,
    Deactivated,
}

/// Debounced on/off state for one fault cue.
///
/// Each observed frame adds one to a counter capped at `threshold + 5`,
/// each clear frame subtracts one. The signal turns on when the counter
/// reaches `threshold` and off when it drains to zero.
#[derive(Debug, Clone)]
pub struct HysteresisSignal {
    threshold: u32,
    count: u32,
    active: bool,
}

impl HysteresisSignal {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            count: 0,
            active: false,
        }
    }

    pub fn update(&mut self, observed: bool) -> Option<SignalChange> {
        if observed {
            self.count = (self.count + 1).min(self.threshold + 5);
            if self.count >= self.threshold && !self.active {
                self.active = true;
                return Some(SignalChange::Activated);
            }
        } else {
            self.count = self.count.saturating_sub(1);
            if self.count == 0 && self.active {
                self.active = false;
                return Some(SignalChange::Deactivated);
            }
        }
        None
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.active = false;
    }
}

/// Receives the active cues once per processed frame.
pub trait FeedbackSink {
    fn present(&mut self, cues: &[Cue]);
}

/// Keeps the latest set of cues.
impl FeedbackSink for Vec<Cue> {
    fn present(&mut self, cues: &[Cue]) {
        self.clear();
        self.extend_from_slice(cues);
    }
}

/// Logs cue messages whenever the visible set changes.
#[derive(Debug, Default)]
pub struct LogFeedback {
    last: Vec<String>,
}

impl FeedbackSink for LogFeedback {
    fn present(&mut self, cues: &[Cue]) {
        let messages: Vec<String> = cues.iter().map(|c| c.message.clone()).collect();
        if messages != self.last {
            if !messages.is_empty() {
                log::info!("feedback: {}", messages.join(" | "));
            }
            self.last = messages;
        }
    }
}
