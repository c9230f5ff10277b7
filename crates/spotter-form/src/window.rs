use std::collections::VecDeque;

/// Fixed-capacity sequence of recent samples; pushing past capacity evicts
/// the oldest.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    values: VecDeque<f32>,
    capacity: usize,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, value: f32) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Samples oldest first.
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.values.iter().copied()
    }

    pub fn mean(&self) -> Option<f32> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.values.iter().sum::<f32>() / self.values.len() as f32)
    }

    pub fn min(&self) -> Option<f32> {
        self.values.iter().copied().reduce(f32::min)
    }

    pub fn max(&self) -> Option<f32> {
        self.values.iter().copied().reduce(f32::max)
    }

    /// `max - min`, or 0 when empty.
    pub fn range(&self) -> f32 {
        match (self.min(), self.max()) {
            (Some(min), Some(max)) => max - min,
            _ => 0.0,
        }
    }

    /// Mean with weight `(i + 1)^power` on sample `i`, 0 being the oldest.
    pub fn weighted_mean(&self, power: f32) -> Option<f32> {
        let (sum, weights) = self
            .values
            .iter()
            .enumerate()
            .fold((0.0f32, 0.0f32), |(sum, weights), (i, v)| {
                let w = recency_weight(i, power);
                (sum + v * w, weights + w)
            });
        (weights > 0.0).then(|| sum / weights)
    }

    /// Spread around the plain mean, with the same recency weights as
    /// [`RollingWindow::weighted_mean`].
    pub fn weighted_variance(&self, power: f32) -> Option<f32> {
        let mean = self.mean()?;
        let (sum, weights) = self
            .values
            .iter()
            .enumerate()
            .fold((0.0f32, 0.0f32), |(sum, weights), (i, v)| {
                let w = recency_weight(i, power);
                let diff = v - mean;
                (sum + diff * diff * w, weights + w)
            });
        (weights > 0.0).then(|| sum / weights)
    }
}

fn recency_weight(index: usize, power: f32) -> f32 {
    ((index + 1) as f32).powf(power)
}
