// Rank and percentile assignment over an ascending-sorted sample.

use serde::Serialize;

/// Position of one value within a ranked sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Placement {
    /// 1 = best (highest value); n = lowest.
    pub rank: usize,
    /// 0..=100. The lowest value is percentile 0.
    pub percentile: u32,
}

/// Placement of the element at ascending `index` in a sample of `n`.
///
/// `rank = n − index` and `percentile = round(index / n × 100)`.
pub fn placement(index: usize, n: usize) -> Placement {
    if n == 0 {
        return Placement {
            rank: 0,
            percentile: 0,
        };
    }
    let percentile = if index == 0 {
        0
    } else {
        ((index as f64 / n as f64) * 100.0).round() as u32
    };
    Placement {
        rank: n - index,
        percentile,
    }
}

/// Sort indices of `values` ascending and return each original index with its
/// placement. Ties keep their input order.
pub fn rank_ascending(values: &[f64]) -> Vec<(usize, Placement)> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|a, b| {
        values[*a]
            .partial_cmp(&values[*b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let n = order.len();
    order
        .into_iter()
        .enumerate()
        .map(|(position, original)| (original, placement(position, n)))
        .collect()
}

/// Display a percentile as an ordinal. Percentile 0 is shown as "1st".
pub fn ordinal(percentile: u32) -> String {
    let p = percentile.max(1);
    let suffix = match (p % 10, p % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{p}{suffix}")
}
