//! Repetition state machines.
//!
//! Two topologies share one engine. The two-phase machine flips between
//! `Up` and `Down` on angle thresholds and counts a rep on `Up → Down`,
//! provided the minimum interval since the previous rep has passed. The
//! four-phase machine walks `Up → GoingDown → Down → GoingUp → Up`, each
//! step gated on a threshold and a minimum dwell in the current state, and
//! counts a rep on returning to `Up` if the angle covered enough range.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::faults::FaultKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepState {
    Up,
    GoingDown,
    Down,
    GoingUp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Topology {
    TwoPhase {
        start: RepState,
        /// Enter `Up` when the angle falls below this.
        up_below: f32,
        /// Enter `Down` when the angle rises above this.
        down_above: f32,
        min_rep_interval_ms: u64,
    },
    FourPhase {
        /// Descent starts below this; the rep ends back above it.
        top: f32,
        /// Bottom is reached below this; ascent starts back above it.
        bottom: f32,
        min_dwell_ms: u64,
        /// Minimum `max - min` angle over the rep.
        min_excursion: f32,
    },
}

impl Topology {
    pub fn initial_state(&self) -> RepState {
        match self {
            Topology::TwoPhase { start, .. } => *start,
            Topology::FourPhase { .. } => RepState::Up,
        }
    }
}

/// What a transition does to the current rep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    BeginCycle,
    CompleteCycle,
    /// Threshold crossed again before the minimum rep interval.
    Bounce,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signal {
    pub angle: f32,
    /// Time spent in the current state.
    pub in_state_ms: u64,
    /// Time since the last counted rep, if any.
    pub since_last_rep_ms: Option<u64>,
}

/// The transition function: the next state and its effect, or `None` to stay.
pub fn transition(
    topology: &Topology,
    state: RepState,
    signal: &Signal,
) -> Option<(RepState, Effect)> {
    match *topology {
        Topology::TwoPhase {
            up_below,
            down_above,
            min_rep_interval_ms,
            ..
        } => match state {
            RepState::Up if signal.angle > down_above => {
                let rested = signal
                    .since_last_rep_ms
                    .is_none_or(|elapsed| elapsed >= min_rep_interval_ms);
                let effect = if rested { Effect::CompleteCycle } else { Effect::Bounce };
                Some((RepState::Down, effect))
            }
            RepState::Up => None,
            _ if signal.angle < up_below => Some((RepState::Up, Effect::None)),
            _ => None,
        },
        Topology::FourPhase {
            top,
            bottom,
            min_dwell_ms,
            ..
        } => {
            if signal.in_state_ms < min_dwell_ms {
                return None;
            }
            match state {
                RepState::Up if signal.angle < top => {
                    Some((RepState::GoingDown, Effect::BeginCycle))
                }
                RepState::GoingDown if signal.angle < bottom => {
                    Some((RepState::Down, Effect::None))
                }
                RepState::Down if signal.angle > bottom => {
                    Some((RepState::GoingUp, Effect::None))
                }
                RepState::GoingUp if signal.angle > top => {
                    Some((RepState::Up, Effect::CompleteCycle))
                }
                _ => None,
            }
        }
    }
}

/// What the machine has seen during the rep in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct RepAccumulator {
    pub min_angle: f32,
    pub max_angle: f32,
    pub peak_instability: f32,
    pub faults: BTreeSet<FaultKind>,
    pub started_ms: u64,
}

impl RepAccumulator {
    fn start(sample: &RepSample<'_>, now_ms: u64) -> Self {
        Self {
            min_angle: sample.angle,
            max_angle: sample.angle,
            peak_instability: sample.instability,
            faults: sample.faults.clone(),
            started_ms: now_ms,
        }
    }

    fn observe(&mut self, sample: &RepSample<'_>) {
        self.min_angle = self.min_angle.min(sample.angle);
        self.max_angle = self.max_angle.max(sample.angle);
        self.peak_instability = self.peak_instability.max(sample.instability);
        self.faults.extend(sample.faults.iter().copied());
    }
}

/// One frame's input to the machine.
#[derive(Debug, Clone, Copy)]
pub struct RepSample<'a> {
    pub angle: f32,
    pub instability: f32,
    pub faults: &'a BTreeSet<FaultKind>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletedRep {
    /// Increases by one for every completed cycle, across resets.
    pub sequence: u64,
    pub min_angle: f32,
    pub max_angle: f32,
    pub peak_instability: f32,
    pub faults: BTreeSet<FaultKind>,
    pub started_ms: u64,
    pub finished_ms: u64,
}

impl CompletedRep {
    pub fn excursion(&self) -> f32 {
        self.max_angle - self.min_angle
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RepOutcome {
    Counted(CompletedRep),
    /// The cycle finished without enough angle range.
    TooShallow(CompletedRep),
    /// Returned to rest before the minimum rep interval.
    TooSoon,
}

#[derive(Debug, Clone)]
pub struct RepMachine {
    topology: Topology,
    state: RepState,
    state_since_ms: Option<u64>,
    last_rep_ms: Option<u64>,
    accumulator: Option<RepAccumulator>,
    sequence: u64,
}

impl RepMachine {
    pub fn new(topology: Topology) -> Self {
        Self {
            state: topology.initial_state(),
            topology,
            state_since_ms: None,
            last_rep_ms: None,
            accumulator: None,
            sequence: 0,
        }
    }

    pub fn state(&self) -> RepState {
        self.state
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn accumulator(&self) -> Option<&RepAccumulator> {
        self.accumulator.as_ref()
    }

    pub fn step(&mut self, sample: RepSample<'_>, now_ms: u64) -> Option<RepOutcome> {
        let since = *self.state_since_ms.get_or_insert(now_ms);

        match (&self.topology, self.accumulator.as_mut()) {
            (_, Some(acc)) => acc.observe(&sample),
            // two-phase reps run from one count to the next
            (Topology::TwoPhase { .. }, None) => {
                self.accumulator = Some(RepAccumulator::start(&sample, now_ms));
            }
            (Topology::FourPhase { .. }, None) => {}
        }

        let signal = Signal {
            angle: sample.angle,
            in_state_ms: now_ms.saturating_sub(since),
            since_last_rep_ms: self.last_rep_ms.map(|t| now_ms.saturating_sub(t)),
        };
        let (next, effect) = transition(&self.topology, self.state, &signal)?;
        log::debug!("rep state {:?} -> {:?} at {:.1} deg", self.state, next, sample.angle);
        self.state = next;
        self.state_since_ms = Some(now_ms);

        match effect {
            Effect::None => None,
            Effect::BeginCycle => {
                self.accumulator = Some(RepAccumulator::start(&sample, now_ms));
                None
            }
            Effect::Bounce => Some(RepOutcome::TooSoon),
            Effect::CompleteCycle => {
                let acc = self
                    .accumulator
                    .take()
                    .unwrap_or_else(|| RepAccumulator::start(&sample, now_ms));
                self.sequence += 1;
                let rep = CompletedRep {
                    sequence: self.sequence,
                    min_angle: acc.min_angle,
                    max_angle: acc.max_angle,
                    peak_instability: acc.peak_instability,
                    faults: acc.faults,
                    started_ms: acc.started_ms,
                    finished_ms: now_ms,
                };
                match self.topology {
                    Topology::FourPhase { min_excursion, .. }
                        if rep.excursion() < min_excursion =>
                    {
                        Some(RepOutcome::TooShallow(rep))
                    }
                    _ => {
                        self.last_rep_ms = Some(now_ms);
                        Some(RepOutcome::Counted(rep))
                    }
                }
            }
        }
    }

    /// Back to the initial state, dropping any rep in progress.
    pub fn reset(&mut self) {
        self.state = self.topology.initial_state();
        self.state_since_ms = None;
        self.last_rep_ms = None;
        self.accumulator = None;
    }
}
