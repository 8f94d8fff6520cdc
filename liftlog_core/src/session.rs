//! Session aggregation.
//!
//! A session is every set logged for one exercise on one local calendar day.
//! Session volume counts every set that has both weight and reps, completed
//! or not; it reflects what was logged. The insights volume only counts
//! completed sets. The two are different metrics and stay separate.

use crate::one_rep_max::estimate_one_rep_max;
use crate::{types, CalendarPolicy, LoggedSet, RepRange, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Summary of one exercise on one day
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Session {
    pub exercise_id: String,
    pub date: NaiveDate,
    /// Ordered by `order` ascending
    pub sets: Vec<LoggedSet>,
    /// Heaviest kg weight among sets with both weight and reps, 0 if none
    pub top_weight: f64,
    /// Sum of kg weight × reps among sets with both fields
    pub total_volume: f64,
    /// From the first completed set only
    pub estimated_one_rep_max: Option<f64>,
    pub hit_target_reps: bool,
}

/// Sort direction for [`build_sessions`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionOrder {
    MostRecentFirst,
    Chronological,
}

/// Group sets into per-exercise, per-day sessions and summarize each one
///
/// Ties on date (different exercises, same day) are broken by exercise id
/// so output is deterministic. Fails on the first malformed set.
pub fn build_sessions(
    sets: &[LoggedSet],
    target: Option<RepRange>,
    calendar: &CalendarPolicy,
    order: SessionOrder,
) -> Result<Vec<Session>> {
    types::validate_sets(sets)?;

    let mut groups: BTreeMap<(NaiveDate, &str), Vec<LoggedSet>> = BTreeMap::new();
    for set in sets {
        groups
            .entry((calendar.day_of(set.date), set.exercise_id.as_str()))
            .or_default()
            .push(set.clone());
    }

    let mut sessions: Vec<Session> = groups
        .into_iter()
        .map(|((date, exercise_id), mut day_sets)| {
            day_sets.sort_by_key(|s| s.order);
            summarize(exercise_id.to_string(), date, day_sets, target)
        })
        .collect();

    if order == SessionOrder::MostRecentFirst {
        sessions.reverse();
    }

    Ok(sessions)
}

fn summarize(
    exercise_id: String,
    date: NaiveDate,
    sets: Vec<LoggedSet>,
    target: Option<RepRange>,
) -> Session {
    let top_weight = sets
        .iter()
        .filter_map(LoggedSet::canonical_working_weight)
        .fold(0.0, f64::max);

    let total_volume = sets.iter().filter_map(LoggedSet::canonical_volume).sum();

    let estimated_one_rep_max = sets
        .iter()
        .find(|s| s.is_completed)
        .and_then(|first| match (first.canonical_working_weight(), first.reps) {
            (Some(weight), Some(reps)) => estimate_one_rep_max(weight, reps),
            _ => None,
        });

    let hit_target_reps = match target {
        Some(range) => sets
            .iter()
            .all(|s| s.is_completed && s.reps.is_some_and(|r| range.contains(r))),
        None => false,
    };

    Session {
        exercise_id,
        date,
        sets,
        top_weight,
        total_volume,
        estimated_one_rep_max,
        hit_target_reps,
    }
}
