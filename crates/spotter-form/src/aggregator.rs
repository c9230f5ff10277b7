use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spotter_store::{RepCounts, SessionSummary, SummarySink};
use std::collections::{BTreeMap, BTreeSet};

use crate::faults::{feedback_text, FaultKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultWeight {
    pub fault: FaultKind,
    pub weight: f32,
}

/// Session score: `rep_weight * ratio + form_weight * max(0, 1 - issues / total)`
/// minus `fault_penalty * issues / total`, where `ratio` is correct over total reps and `issues` is the weighted
/// fault count. Rounded and clamped to `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRule {
    pub rep_weight: f32,
    #[serde(default)]
    pub form_weight: f32,
    #[serde(default)]
    pub fault_penalty: f32,
    /// Faults not listed weigh 1.
    #[serde(default)]
    pub fault_weights: Vec<FaultWeight>,
}

impl ScoreRule {
    pub fn correct_ratio() -> Self {
        Self {
            rep_weight: 100.0,
            form_weight: 0.0,
            fault_penalty: 0.0,
            fault_weights: Vec::new(),
        }
    }

    pub fn weight_of(&self, fault: FaultKind) -> f32 {
        self.fault_weights
            .iter()
            .find(|w| w.fault == fault)
            .map_or(1.0, |w| w.weight)
    }

    pub fn score(&self, stats: &SessionStats) -> u8 {
        if stats.total_reps == 0 {
            return 0;
        }
        let total = stats.total_reps as f32;
        let ratio = stats.correct_reps as f32 / total;
        let issues: f32 = stats
            .fault_counts
            .iter()
            .map(|(fault, count)| self.weight_of(*fault) * *count as f32)
            .sum();

        let score = self.rep_weight * ratio + self.form_weight * (1.0 - issues / total).max(0.0)
            - self.fault_penalty * issues / total;
        score.round().clamp(0.0, 100.0) as u8
    }
}

/// One counted repetition.
#[derive(Debug, Clone, PartialEq)]
pub struct RepRecord {
    /// Smallest primary angle reached.
    pub angle: f32,
    /// Peak instability during the rep.
    pub stability: f32,
    pub faults: BTreeSet<FaultKind>,
    /// Fault labels joined, or "Good form".
    pub feedback: String,
}

impl RepRecord {
    pub fn is_correct(&self) -> bool {
        self.faults.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionStats {
    pub total_reps: u32,
    pub correct_reps: u32,
    pub incorrect_reps: u32,
    pub fault_counts: BTreeMap<FaultKind, u32>,
    pub reps: Vec<RepRecord>,
}

/// Tallies counted reps and hands the session off exactly once.
#[derive(Debug, Clone)]
pub struct SessionAggregator {
    exercise_name: String,
    rule: ScoreRule,
    tracked: Vec<FaultKind>,
    stats: SessionStats,
    last_sequence: Option<u64>,
    saved: bool,
}

impl SessionAggregator {
    /// `tracked` faults appear in the summary even when never seen.
    pub fn new(exercise_name: impl Into<String>, rule: ScoreRule, tracked: Vec<FaultKind>) -> Self {
        Self {
            exercise_name: exercise_name.into(),
            rule,
            tracked,
            stats: SessionStats::default(),
            last_sequence: None,
            saved: false,
        }
    }

    /// Record the rep with cycle number `sequence`. A sequence at or below
    /// the last recorded one is ignored; returns whether the rep was added.
    pub fn record_rep(
        &mut self,
        sequence: u64,
        angle: f32,
        stability: f32,
        faults: &BTreeSet<FaultKind>,
    ) -> bool {
        if self.last_sequence.is_some_and(|last| sequence <= last) {
            log::warn!("rep {} already recorded, ignoring", sequence);
            return false;
        }
        self.last_sequence = Some(sequence);

        self.stats.total_reps += 1;
        if faults.is_empty() {
            self.stats.correct_reps += 1;
        } else {
            self.stats.incorrect_reps += 1;
            for fault in faults {
                *self.stats.fault_counts.entry(*fault).or_insert(0) += 1;
            }
        }
        self.stats.reps.push(RepRecord {
            angle,
            stability,
            faults: faults.clone(),
            feedback: feedback_text(faults),
        });
        true
    }

    pub fn compute_score(&self) -> u8 {
        self.rule.score(&self.stats)
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn is_saved(&self) -> bool {
        self.saved
    }

    pub fn summary(&self, at: DateTime<Utc>) -> SessionSummary {
        let mut form_issues: BTreeMap<String, u32> = self
            .tracked
            .iter()
            .map(|f| (f.key().to_string(), 0))
            .collect();
        for (fault, count) in &self.stats.fault_counts {
            form_issues.insert(fault.key().to_string(), *count);
        }

        SessionSummary::new(
            self.exercise_name.clone(),
            at,
            RepCounts {
                total: self.stats.total_reps,
                correct: self.stats.correct_reps,
                incorrect: self.stats.incorrect_reps,
            },
            form_issues,
            self.compute_score(),
            self.stats.reps.iter().map(|r| r.feedback.clone()).collect(),
        )
    }

    /// Submit the summary unless it was already submitted. Returns whether
    /// this call submitted it.
    pub fn finalize(&mut self, sink: &mut impl SummarySink, at: DateTime<Utc>) -> bool {
        if self.saved {
            log::debug!("session already saved");
            return false;
        }
        self.saved = true;
        let summary = self.summary(at);
        log::info!(
            "{} session finished: {}/{} correct, score {}",
            summary.exercise_name,
            summary.reps.correct,
            summary.reps.total,
            summary.performance_score
        );
        sink.submit(summary);
        true
    }
}
