use spotter_base::Clock;
use spotter_pose::{PoseError, PoseSource};
use spotter_store::SummarySink;
use tokio::sync::watch;

use crate::aggregator::SessionStats;
use crate::feedback::FeedbackSink;
use crate::trainer::{Trainer, TrainerPhase};

pub const DEFAULT_TARGET_FPS: u32 = 30;

/// Frame loop settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    pub target_fps: u32,
}

impl RunnerConfig {
    pub fn new() -> Self {
        Self {
            target_fps: DEFAULT_TARGET_FPS,
        }
    }

    /// 0 disables the cap.
    pub fn with_target_fps(mut self, fps: u32) -> Self {
        self.target_fps = fps;
        self
    }

    pub fn min_frame_interval_ms(&self) -> u64 {
        if self.target_fps == 0 {
            0
        } else {
            1000 / self.target_fps as u64
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Admits a frame only when enough time has passed since the last admitted one.
#[derive(Debug, Clone)]
pub struct FrameLimiter {
    interval_ms: u64,
    last_ms: Option<u64>,
}

impl FrameLimiter {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_ms: None,
        }
    }

    pub fn admit(&mut self, now_ms: u64) -> bool {
        match self.last_ms {
            Some(last) if now_ms.saturating_sub(last) < self.interval_ms => false,
            _ => {
                self.last_ms = Some(now_ms);
                true
            }
        }
    }
}

#[derive(Debug)]
pub enum RunOutcome {
    /// Rep cap reached; the summary was submitted.
    Completed(SessionStats),
    Cancelled(SessionStats),
    /// The source ran out of frames before the cap.
    SourceFinished(SessionStats),
    SourceError { error: PoseError, stats: SessionStats },
}

impl RunOutcome {
    pub fn stats(&self) -> &SessionStats {
        match self {
            RunOutcome::Completed(stats)
            | RunOutcome::Cancelled(stats)
            | RunOutcome::SourceFinished(stats)
            | RunOutcome::SourceError { stats, .. } => stats,
        }
    }
}

/// Resolves once `cancel` reads true; never resolves if the sender is gone.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    if cancel.wait_for(|&c| c).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Drive `trainer` from `source` until the session completes, the source
/// ends or `cancel` is set.
///
/// Awaiting the next frame is the only suspension point; each admitted
/// frame is processed to completion before the next is requested. Ending
/// without completion does not submit anything; call [`Trainer::finish`]
/// for that.
pub async fn run_session<S, C, F, K>(
    source: &mut S,
    trainer: &mut Trainer,
    clock: &C,
    feedback: &mut F,
    sink: &mut K,
    cancel: &mut watch::Receiver<bool>,
    config: &RunnerConfig,
) -> RunOutcome
where
    S: PoseSource,
    C: Clock,
    F: FeedbackSink,
    K: SummarySink,
{
    let mut limiter = FrameLimiter::new(config.min_frame_interval_ms());

    loop {
        if *cancel.borrow() {
            return RunOutcome::Cancelled(trainer.stats().clone());
        }

        let frame = tokio::select! {
            biased;
            _ = cancelled(cancel) => {
                log::info!("session cancelled");
                return RunOutcome::Cancelled(trainer.stats().clone());
            }
            frame = source.recv() => frame,
        };

        let pose = match frame {
            Ok(pose) => pose,
            Err(PoseError::Exhausted) => {
                log::info!("pose source finished");
                return RunOutcome::SourceFinished(trainer.stats().clone());
            }
            Err(error) => {
                log::error!("pose source failed: {}", error);
                return RunOutcome::SourceError {
                    error,
                    stats: trainer.stats().clone(),
                };
            }
        };

        let now_ms = clock.now_ms();
        if !limiter.admit(now_ms) {
            continue;
        }

        let report = trainer.process(pose.as_ref(), now_ms, sink);
        feedback.present(trainer.cues());

        if report.phase == TrainerPhase::Completed {
            return RunOutcome::Completed(trainer.stats().clone());
        }
    }
}
