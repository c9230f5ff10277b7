use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Repetition totals of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RepCounts {
    pub total: u32,
    pub correct: u32,
    pub incorrect: u32,
}

/// The record handed to persistence once per session.
///
/// Serialized field names are the interchange format shared with the
/// history server and remote endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub exercise_name: String,
    /// RFC 3339, UTC.
    pub timestamp: String,
    pub sets: u32,
    pub reps: RepCounts,
    pub form_issues: BTreeMap<String, u32>,
    pub performance_score: u8,
    pub session_id: String,
    pub per_rep_feedback: Vec<String>,
}

impl SessionSummary {
    /// A single-set summary stamped with `at` and a fresh session id.
    pub fn new(
        exercise_name: impl Into<String>,
        at: DateTime<Utc>,
        reps: RepCounts,
        form_issues: BTreeMap<String, u32>,
        performance_score: u8,
        per_rep_feedback: Vec<String>,
    ) -> Self {
        Self {
            exercise_name: exercise_name.into(),
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            sets: 1,
            reps,
            form_issues,
            performance_score: performance_score.min(100),
            session_id: session_id(at),
            per_rep_feedback,
        }
    }
}

/// Base-36 millisecond timestamp followed by a random base-36 suffix.
pub fn session_id(at: DateTime<Utc>) -> String {
    let millis = at.timestamp_millis().max(0) as u64;
    let suffix: u64 = rand::thread_rng().gen_range(0..36u64.pow(9));
    format!("{}{}", to_base36(millis), to_base36(suffix))
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    out.into_iter().map(char::from).collect()
}
