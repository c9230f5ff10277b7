use serde::{Deserialize, Serialize};

use crate::window::RollingWindow;

/// Tuning of the instability estimate for one exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityParams {
    /// Capacity of the offset window.
    pub window: usize,
    /// Capacity of the movement-range window.
    pub movement_window: usize,
    /// Exponent of the recency weights.
    pub power: f32,
    /// Weighted variance below this is noise.
    pub variance_floor: f32,
    /// Offset range below this is not movement.
    pub range_floor: f32,
    pub damping: f32,
    /// Instability above this flags the rep.
    pub bad_threshold: f32,
}

/// Fewer samples than this always read as stable.
pub const MIN_STABILITY_SAMPLES: usize = 3;

/// Turns a tracked joint's lateral offset into a damped instability score.
///
/// A frame only produces a non-zero score when the recency-weighted
/// variance clears the noise floor and the window's range clears the
/// movement floor; the score is then the weighted mean of recent ranges
/// times the damping factor.
#[derive(Debug, Clone)]
pub struct StabilityEstimator {
    params: StabilityParams,
    positions: RollingWindow,
    movements: RollingWindow,
}

impl StabilityEstimator {
    pub fn new(params: StabilityParams) -> Self {
        Self {
            positions: RollingWindow::new(params.window),
            movements: RollingWindow::new(params.movement_window),
            params,
        }
    }

    pub fn params(&self) -> &StabilityParams {
        &self.params
    }

    pub fn update(&mut self, offset: f32) -> f32 {
        self.positions.push(offset);
        if self.positions.len() < MIN_STABILITY_SAMPLES {
            return 0.0;
        }

        let variance = self
            .positions
            .weighted_variance(self.params.power)
            .unwrap_or(0.0);
        if variance < self.params.variance_floor {
            return 0.0;
        }

        let range = self.positions.range();
        if range < self.params.range_floor {
            return 0.0;
        }

        self.movements.push(range);
        let movement = self
            .movements
            .weighted_mean(self.params.power)
            .unwrap_or(0.0);
        movement * self.params.damping
    }

    pub fn is_bad(&self, instability: f32) -> bool {
        instability > self.params.bad_threshold
    }

    pub fn reset(&mut self) {
        self.positions.clear();
        self.movements.clear();
    }
}
