use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ProfileError;
use crate::profile::{Exercise, ExerciseProfile};
use crate::runner::{RunnerConfig, DEFAULT_TARGET_FPS};

/// Trainer settings, read from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    #[serde(default = "default_exercise")]
    pub exercise: Exercise,

    #[serde(default = "default_target_fps")]
    pub target_fps: u32,

    /// Log to date-named files here instead of stdout.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    #[serde(default = "default_history_path")]
    pub history_path: PathBuf,

    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Remote endpoint tried before the history file.
    #[serde(default)]
    pub remote_url: Option<String>,

    /// Replaces the built-in profile for `exercise`.
    #[serde(default)]
    pub profile: Option<ExerciseProfile>,
}

fn default_exercise() -> Exercise {
    Exercise::BicepCurl
}

fn default_target_fps() -> u32 {
    DEFAULT_TARGET_FPS
}

fn default_history_path() -> PathBuf {
    PathBuf::from("workout-history.json")
}

fn default_history_limit() -> usize {
    spotter_store::DEFAULT_HISTORY_LIMIT
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            exercise: default_exercise(),
            target_fps: default_target_fps(),
            log_dir: None,
            history_path: default_history_path(),
            history_limit: default_history_limit(),
            remote_url: None,
            profile: None,
        }
    }
}

impl TrainerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ProfileError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ProfileError> {
        Ok(toml::from_str(content)?)
    }

    /// The profile to train with, validated.
    pub fn resolve_profile(&self) -> Result<ExerciseProfile, ProfileError> {
        let profile = self
            .profile
            .clone()
            .unwrap_or_else(|| self.exercise.profile());
        profile.validate()?;
        Ok(profile)
    }

    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig::new().with_target_fps(self.target_fps)
    }
}
