//! Personal record detection.
//!
//! Two distinct notions live here and they may disagree:
//! - **Lifetime records** ([`detect_records`], [`detect_recent_prs`]): a day
//!   whose volume beats every earlier day for that exercise, ever.
//! - **Period PR count** ([`pr_count_in_window`]): exercises whose best day
//!   inside a window beats their best day before the window started.
//!
//! Only completed sets with both weight and reps contribute volume.

use crate::one_rep_max::estimate_one_rep_max;
use crate::units::to_canonical;
use crate::{types, AnalyticsContext, CalendarPolicy, Exercise, LoggedSet, Result, WeightUnit};
use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// A day that set a new lifetime volume best for an exercise
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PersonalRecord {
    pub exercise_id: String,
    pub exercise_name: String,
    pub date: NaiveDate,
    /// Best set of the day, in the unit it was logged in
    pub weight: f64,
    pub reps: i32,
    pub unit: WeightUnit,
    /// Total day volume in kg
    pub volume: f64,
    pub estimated_one_rep_max: Option<f64>,
}

type DayBuckets<'a> = BTreeMap<NaiveDate, Vec<&'a LoggedSet>>;

/// Completed, volume-bearing sets bucketed per exercise and local day
fn bucket_by_exercise_day<'a>(
    sets: &'a [LoggedSet],
    calendar: &CalendarPolicy,
) -> HashMap<&'a str, DayBuckets<'a>> {
    let mut buckets: HashMap<&str, DayBuckets> = HashMap::new();
    for set in sets
        .iter()
        .filter(|s| s.is_completed && s.canonical_volume().is_some_and(|v| v > 0.0))
    {
        buckets
            .entry(set.exercise_id.as_str())
            .or_default()
            .entry(calendar.day_of(set.date))
            .or_default()
            .push(set);
    }
    buckets
}

fn day_volume(sets: &[&LoggedSet]) -> f64 {
    sets.iter().filter_map(|s| s.canonical_volume()).sum()
}

/// Heavier weight wins; equal weights fall back to more reps
fn compare_best_set(a: &LoggedSet, b: &LoggedSet) -> Ordering {
    let weight_a = a.weight.map(|w| to_canonical(w, a.unit)).unwrap_or(0.0);
    let weight_b = b.weight.map(|w| to_canonical(w, b.unit)).unwrap_or(0.0);
    weight_a
        .total_cmp(&weight_b)
        .then_with(|| a.reps.unwrap_or(0).cmp(&b.reps.unwrap_or(0)))
}

/// Every lifetime record event, per exercise in ascending date order
pub fn detect_records(
    sets: &[LoggedSet],
    exercises: &[Exercise],
    calendar: &CalendarPolicy,
) -> Result<Vec<PersonalRecord>> {
    types::validate_sets(sets)?;

    let names: HashMap<&str, &str> = exercises
        .iter()
        .map(|e| (e.id.as_str(), e.name.as_str()))
        .collect();

    let mut by_exercise: Vec<_> = bucket_by_exercise_day(sets, calendar).into_iter().collect();
    by_exercise.sort_by(|a, b| a.0.cmp(b.0));

    let mut records = Vec::new();
    for (exercise_id, days) in by_exercise {
        let mut best = 0.0;
        for (date, day_sets) in days {
            let volume = day_volume(&day_sets);
            if volume <= best {
                continue;
            }
            best = volume;

            let Some(top) = day_sets.iter().copied().max_by(|a, b| compare_best_set(a, b)) else {
                continue;
            };
            let (Some(weight), Some(reps)) = (top.weight, top.reps) else {
                continue;
            };

            records.push(PersonalRecord {
                exercise_id: exercise_id.to_string(),
                exercise_name: names.get(exercise_id).unwrap_or(&exercise_id).to_string(),
                date,
                weight,
                reps,
                unit: top.unit,
                volume,
                estimated_one_rep_max: estimate_one_rep_max(weight, reps),
            });
        }
    }

    tracing::debug!("Detected {} lifetime records", records.len());
    Ok(records)
}

/// The `limit` most recent lifetime records across all exercises
pub fn detect_recent_prs(
    sets: &[LoggedSet],
    exercises: &[Exercise],
    limit: usize,
    calendar: &CalendarPolicy,
) -> Result<Vec<PersonalRecord>> {
    let mut records = detect_records(sets, exercises, calendar)?;
    records.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.volume.total_cmp(&a.volume))
            .then_with(|| a.exercise_id.cmp(&b.exercise_id))
    });
    records.truncate(limit);
    Ok(records)
}

/// Number of exercises that beat their pre-window best inside the last
/// `days` days
///
/// Only exercises present in `exercises` are counted.
pub fn pr_count_in_window(
    ctx: &AnalyticsContext,
    days: u32,
    sets: &[LoggedSet],
    exercises: &[Exercise],
) -> Result<usize> {
    types::validate_sets(sets)?;
    let window = ctx.day_window(days)?;
    let buckets = bucket_by_exercise_day(sets, &ctx.calendar);

    let count = exercises
        .iter()
        .filter_map(|exercise| buckets.get(exercise.id.as_str()))
        .filter(|history| {
            let mut inside: Option<f64> = None;
            let mut before: Option<f64> = None;
            for (date, day_sets) in history.iter() {
                let volume = day_volume(day_sets);
                let slot = if window.contains(*date) {
                    &mut inside
                } else if *date < window.start {
                    &mut before
                } else {
                    continue;
                };
                *slot = Some(slot.map_or(volume, |v: f64| v.max(volume)));
            }
            match (inside, before) {
                (Some(inside), Some(before)) => inside > before,
                (Some(_), None) => true,
                (None, _) => false,
            }
        })
        .count();

    Ok(count)
}
