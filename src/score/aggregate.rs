//! Score aggregation
//!
//! Sums signal weights and clamps into [0,100]. When an external model
//! score is present it is blended as the arithmetic mean of the rule-based
//! sum and the model score, so neither scorer is a single point of failure.

use crate::signal::Signal;

/// Combine rule signals and an optional external score into a final score.
///
/// Defined for every input: an empty signal set scores 0, or the external
/// score alone if one was supplied. Pathological weight sums clamp rather
/// than error.
pub fn aggregate(signals: &[Signal], external: Option<i32>) -> u8 {
    let rule_sum: i64 = signals.iter().map(|s| s.weight as i64).sum();

    let combined = match external {
        Some(ext) if signals.is_empty() => ext as i64,
        Some(ext) => (rule_sum + ext as i64) / 2,
        None => rule_sum,
    };

    combined.clamp(0, 100) as u8
}
