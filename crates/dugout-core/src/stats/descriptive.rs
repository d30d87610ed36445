// Weighted descriptive statistics over a numeric sample.

use serde::Serialize;

use crate::stats::math::{ratio, EPSILON};

/// Summary of a sample. All moments are population moments (N denominator),
/// since the sample is the full set of qualifying players, not a draw from one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DescriptiveStatistics {
    pub count: usize,
    pub total_weight: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub variance: f64,
    pub std_dev: f64,
}

impl DescriptiveStatistics {
    /// The summary of an empty sample: every field zero.
    pub fn empty() -> Self {
        Self {
            count: 0,
            total_weight: 0.0,
            min: 0.0,
            max: 0.0,
            mean: 0.0,
            median: 0.0,
            variance: 0.0,
            std_dev: 0.0,
        }
    }

    /// Unweighted statistics: every value carries weight 1.
    pub fn from_values(values: &[f64]) -> Self {
        let pairs: Vec<(f64, f64)> = values.iter().map(|v| (*v, 1.0)).collect();
        Self::weighted(&pairs)
    }

    /// Weighted statistics over `(value, weight)` pairs.
    ///
    /// `mean = Σ(v·w) / Σw` and `variance = Σ(v²·w) / Σw − mean²`. Pairs with
    /// a non-finite value or a non-positive weight are ignored. With all
    /// weights equal to 1 this is exactly the unweighted computation.
    pub fn weighted(pairs: &[(f64, f64)]) -> Self {
        let mut sample: Vec<(f64, f64)> = pairs
            .iter()
            .copied()
            .filter(|(v, w)| v.is_finite() && w.is_finite() && *w > 0.0)
            .collect();
        if sample.is_empty() {
            return Self::empty();
        }
        sample.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let total_weight: f64 = sample.iter().map(|(_, w)| w).sum();
        let weighted_sum: f64 = sample.iter().map(|(v, w)| v * w).sum();
        let weighted_sq_sum: f64 = sample.iter().map(|(v, w)| v * v * w).sum();

        let mean = ratio(weighted_sum, total_weight);
        // Clamp: the subtraction can dip just below zero for constant samples.
        let variance = (ratio(weighted_sq_sum, total_weight) - mean * mean).max(0.0);

        Self {
            count: sample.len(),
            total_weight,
            min: sample[0].0,
            max: sample[sample.len() - 1].0,
            mean,
            median: weighted_median(&sample, total_weight),
            variance,
            std_dev: variance.sqrt(),
        }
    }

    /// `(value − mean) / std_dev`, or 0.0 when the spread is zero.
    pub fn z_score(&self, value: f64) -> f64 {
        if self.std_dev < EPSILON {
            return 0.0;
        }
        (value - self.mean) / self.std_dev
    }
}

/// Median of a value-sorted sample: the first value whose cumulative weight
/// reaches half the total. When the cumulative weight lands exactly on the
/// half, the next value is averaged in, which reduces to the usual
/// even-count median for uniform weights.
fn weighted_median(sorted: &[(f64, f64)], total_weight: f64) -> f64 {
    let half = total_weight / 2.0;
    let mut cumulative = 0.0;
    for (i, (value, weight)) in sorted.iter().enumerate() {
        cumulative += weight;
        if (cumulative - half).abs() < EPSILON {
            return match sorted.get(i + 1) {
                Some((next, _)) => (value + next) / 2.0,
                None => *value,
            };
        }
        if cumulative > half {
            return *value;
        }
    }
    sorted.last().map(|(v, _)| *v).unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
