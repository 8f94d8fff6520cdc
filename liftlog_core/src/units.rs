//! Weight unit conversion.
//!
//! Kilograms are the canonical unit for all cross-record arithmetic.

use crate::WeightUnit;

/// Pounds to kilograms
pub const LBS_TO_KG: f64 = 0.453592;

/// The unit every volume and weight comparison is carried out in
pub const CANONICAL_UNIT: WeightUnit = WeightUnit::Kg;

/// Convert a weight logged in `unit` to kilograms
pub fn to_canonical(weight: f64, unit: WeightUnit) -> f64 {
    match unit {
        WeightUnit::Kg => weight,
        WeightUnit::Lbs => weight * LBS_TO_KG,
    }
}

/// Convert a weight in kilograms back to `unit`
pub fn from_canonical(weight: f64, unit: WeightUnit) -> f64 {
    match unit {
        WeightUnit::Kg => weight,
        WeightUnit::Lbs => weight / LBS_TO_KG,
    }
}

/// Weight × reps expressed in kilograms
pub fn volume_in_canonical_unit(weight: f64, reps: i32, unit: WeightUnit) -> f64 {
    to_canonical(weight, unit) * reps as f64
}
