//! Default catalog of exercises.
//!
//! New libraries are seeded from this list; users adjust targets and units
//! afterwards through the exercise library.

use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Vec<Exercise>> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static [Exercise] {
    &DEFAULT_CATALOG
}

fn exercise(
    id: &str,
    name: &str,
    primary: MuscleCategory,
    secondary: &[MuscleCategory],
    equipment: Equipment,
    target: Option<(i32, i32)>,
) -> Exercise {
    Exercise {
        id: id.into(),
        name: name.into(),
        primary_category: primary,
        secondary_categories: secondary.to_vec(),
        equipment,
        unit: WeightUnit::Kg,
        target_reps: target.map(|(min, max)| RepRange { min, max }),
        effort_mode: EffortMode::None,
        rest_seconds: Some(120),
    }
}

/// Builds the default catalog of common barbell, dumbbell and bodyweight lifts
pub fn build_default_catalog() -> Vec<Exercise> {
    use Equipment::*;
    use MuscleCategory::*;

    vec![
        // ====================================================================
        // Upper body
        // ====================================================================
        exercise("bench_press", "Barbell Bench Press", Chest, &[Triceps, Shoulders], Barbell, Some((5, 8))),
        exercise("incline_db_press", "Incline Dumbbell Press", Chest, &[Shoulders, Triceps], Dumbbell, Some((8, 12))),
        exercise("overhead_press", "Overhead Press", Shoulders, &[Triceps], Barbell, Some((5, 8))),
        exercise("lateral_raise", "Dumbbell Lateral Raise", Shoulders, &[], Dumbbell, Some((12, 15))),
        exercise("barbell_row", "Barbell Row", Back, &[Biceps], Barbell, Some((6, 10))),
        exercise("lat_pulldown", "Lat Pulldown", Back, &[Biceps], Cable, Some((8, 12))),
        exercise("pullup", "Pull-up", Back, &[Biceps], Bodyweight, None),
        exercise("barbell_curl", "Barbell Curl", Biceps, &[], Barbell, Some((8, 12))),
        exercise("triceps_pushdown", "Triceps Pushdown", Triceps, &[], Cable, Some((10, 15))),
        // ====================================================================
        // Lower body
        // ====================================================================
        exercise("back_squat", "Back Squat", Quads, &[Glutes, Hamstrings], Barbell, Some((5, 8))),
        exercise("leg_press", "Leg Press", Quads, &[Glutes], Machine, Some((10, 15))),
        exercise("deadlift", "Deadlift", Hamstrings, &[Glutes, Back], Barbell, Some((3, 5))),
        exercise("romanian_deadlift", "Romanian Deadlift", Hamstrings, &[Glutes], Barbell, Some((8, 10))),
        exercise("hip_thrust", "Barbell Hip Thrust", Glutes, &[Hamstrings], Barbell, Some((8, 12))),
        exercise("calf_raise", "Standing Calf Raise", Calves, &[], Machine, Some((10, 15))),
        // ====================================================================
        // Other
        // ====================================================================
        exercise("plank", "Plank", Core, &[], Bodyweight, None),
        exercise("kb_swing", "Kettlebell Swing", FullBody, &[Hamstrings, Glutes], Kettlebell, Some((15, 20))),
    ]
}

/// Check a list of exercises for problems; returns one message per problem
pub fn validate_exercises(exercises: &[Exercise]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for exercise in exercises {
        if exercise.id.is_empty() {
            errors.push("Exercise has empty ID".to_string());
        }
        if !seen.insert(exercise.id.as_str()) {
            errors.push(format!("Duplicate exercise id '{}'", exercise.id));
        }
        if exercise.name.is_empty() {
            errors.push(format!("Exercise '{}' has empty name", exercise.id));
        }
        if let Some(range) = exercise.target_reps {
            if RepRange::new(range.min, range.max).is_err() {
                errors.push(format!(
                    "Exercise '{}' has invalid target range [{}, {}]",
                    exercise.id, range.min, range.max
                ));
            }
        }
    }

    errors
}
