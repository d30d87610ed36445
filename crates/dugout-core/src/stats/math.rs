// Numeric primitives shared by every derived statistic.

/// Threshold below which a denominator or standard deviation is treated as zero.
pub const EPSILON: f64 = 1e-9;

/// Round to 3 decimal places, the precision every rate stat is reported at.
pub fn round3(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 1000.0).round() / 1000.0
}

/// `numerator / denominator`, or 0.0 when the denominator is zero.
///
/// Aggregates sum and average these values across whole leagues, so a single
/// NaN or infinity would poison every downstream number.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator.abs() < EPSILON {
        return 0.0;
    }
    let value = numerator / denominator;
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Integer-count convenience over [`ratio`], rounded to 3 places.
pub fn rate(numerator: u32, denominator: u32) -> f64 {
    round3(ratio(numerator as f64, denominator as f64))
}
