//! Estimated one-rep-max.

/// Highest rep count the Epley estimate is trusted for
pub const MAX_ESTIMATE_REPS: i32 = 10;

/// Epley estimate: `weight × (1 + reps / 30)`
///
/// Returns `None` when `reps` is outside `1..=10`, where the curve stops
/// tracking real maximal strength.
pub fn estimate_one_rep_max(weight: f64, reps: i32) -> Option<f64> {
    if !(1..=MAX_ESTIMATE_REPS).contains(&reps) {
        return None;
    }
    Some(weight * (1.0 + reps as f64 / 30.0))
}
