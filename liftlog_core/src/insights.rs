//! Time-windowed statistics across the whole exercise library.
//!
//! Every figure here uses completed sets only. Volume additionally needs both
//! weight and reps, converted to kg. A window with no data is a valid result
//! (zeros or an empty list), never an error.

use crate::records::pr_count_in_window;
use crate::{types, AnalyticsContext, DateRange, Error, Exercise, LoggedSet, MuscleCategory, Result};
use chrono::{Duration, NaiveDate};
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// Categories listed on their own before the rest merge into "Other"
pub const DEFAULT_BREAKDOWN_TOP_N: usize = 6;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DailyVolume {
    pub date: NaiveDate,
    pub volume: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WeeklyVolume {
    pub week_start: NaiveDate,
    pub volume: f64,
}

/// A breakdown row: one category, or everything past the top N
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BreakdownBucket {
    Category(MuscleCategory),
    Other,
}

/// Serialized flat: the category's own name, or `"other"`
impl Serialize for BreakdownBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            BreakdownBucket::Category(category) => category.serialize(serializer),
            BreakdownBucket::Other => serializer.serialize_str("other"),
        }
    }
}

impl fmt::Display for BreakdownBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BreakdownBucket::Category(category) => write!(f, "{}", category),
            BreakdownBucket::Other => f.write_str("Other"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MuscleGroupShare {
    pub category: BreakdownBucket,
    pub volume: f64,
    pub percentage: f64,
}

/// Headline numbers for a window
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub workouts: usize,
    pub sets: usize,
    pub total_volume: f64,
    pub personal_records: usize,
}

fn completed_in<'a>(
    ctx: &'a AnalyticsContext,
    window: DateRange,
    sets: &'a [LoggedSet],
) -> impl Iterator<Item = (NaiveDate, &'a LoggedSet)> + 'a {
    sets.iter()
        .filter(|s| s.is_completed)
        .map(move |s| (ctx.calendar.day_of(s.date), s))
        .filter(move |(day, _)| window.contains(*day))
}

/// Volume for each of the last `days` days, oldest first, zero-filled.
/// Always exactly `days` entries.
pub fn volume_trend(ctx: &AnalyticsContext, days: u32, sets: &[LoggedSet]) -> Result<Vec<DailyVolume>> {
    types::validate_sets(sets)?;
    let window = ctx.day_window(days)?;

    let mut per_day: HashMap<NaiveDate, f64> = HashMap::new();
    for (day, set) in completed_in(ctx, window, sets) {
        if let Some(volume) = set.canonical_volume() {
            *per_day.entry(day).or_default() += volume;
        }
    }

    Ok((0..i64::from(days))
        .map(|offset| {
            let date = window.start + Duration::days(offset);
            DailyVolume {
                date,
                volume: per_day.get(&date).copied().unwrap_or(0.0),
            }
        })
        .collect())
}

/// Volume per calendar week for the last `weeks` weeks, oldest first,
/// zero-filled. Week boundaries follow the calendar policy.
pub fn weekly_volume_trend(
    ctx: &AnalyticsContext,
    weeks: u32,
    sets: &[LoggedSet],
) -> Result<Vec<WeeklyVolume>> {
    types::validate_sets(sets)?;
    let window = ctx.week_window(weeks)?;

    let mut per_week: HashMap<NaiveDate, f64> = HashMap::new();
    for (day, set) in completed_in(ctx, window, sets) {
        if let Some(volume) = set.canonical_volume() {
            *per_week.entry(ctx.calendar.week_start_of(day)).or_default() += volume;
        }
    }

    Ok((0..i64::from(weeks))
        .map(|offset| {
            let week_start = window.start + Duration::weeks(offset);
            WeeklyVolume {
                week_start,
                volume: per_week.get(&week_start).copied().unwrap_or(0.0),
            }
        })
        .collect())
}

/// Distinct days in the window with at least one completed set
pub fn workout_count(ctx: &AnalyticsContext, days: u32, sets: &[LoggedSet]) -> Result<usize> {
    types::validate_sets(sets)?;
    let window = ctx.day_window(days)?;
    let active: HashSet<NaiveDate> = completed_in(ctx, window, sets).map(|(day, _)| day).collect();
    Ok(active.len())
}

/// Completed sets in the window
pub fn set_count(ctx: &AnalyticsContext, days: u32, sets: &[LoggedSet]) -> Result<usize> {
    types::validate_sets(sets)?;
    let window = ctx.day_window(days)?;
    Ok(completed_in(ctx, window, sets).count())
}

/// Completed volume in the window, in kg
pub fn total_volume(ctx: &AnalyticsContext, days: u32, sets: &[LoggedSet]) -> Result<f64> {
    types::validate_sets(sets)?;
    let window = ctx.day_window(days)?;
    Ok(completed_in(ctx, window, sets)
        .filter_map(|(_, s)| s.canonical_volume())
        .sum())
}

/// Volume share per primary muscle category, top six plus "Other"
pub fn muscle_group_breakdown(
    ctx: &AnalyticsContext,
    days: u32,
    sets: &[LoggedSet],
    exercises: &[Exercise],
) -> Result<Vec<MuscleGroupShare>> {
    muscle_group_breakdown_top(ctx, days, sets, exercises, DEFAULT_BREAKDOWN_TOP_N)
}

/// Volume share per primary muscle category, keeping `top_n` rows and
/// merging the remainder into a single "Other" row
///
/// Sets referencing an exercise missing from `exercises` are rejected.
pub fn muscle_group_breakdown_top(
    ctx: &AnalyticsContext,
    days: u32,
    sets: &[LoggedSet],
    exercises: &[Exercise],
    top_n: usize,
) -> Result<Vec<MuscleGroupShare>> {
    types::validate_sets(sets)?;
    let window = ctx.day_window(days)?;

    let categories: HashMap<&str, MuscleCategory> = exercises
        .iter()
        .map(|e| (e.id.as_str(), e.primary_category))
        .collect();

    let mut per_category: BTreeMap<MuscleCategory, f64> = BTreeMap::new();
    for (_, set) in completed_in(ctx, window, sets) {
        let Some(volume) = set.canonical_volume() else {
            continue;
        };
        let category = categories
            .get(set.exercise_id.as_str())
            .copied()
            .ok_or_else(|| Error::UnknownExercise(set.exercise_id.clone()))?;
        *per_category.entry(category).or_default() += volume;
    }

    let total: f64 = per_category.values().sum();
    if total <= 0.0 {
        return Ok(Vec::new());
    }

    // The "other" category never ranks; it always lands in the merged row
    let mut other_volume = per_category
        .remove(&MuscleCategory::Other)
        .unwrap_or_default();

    let mut shares: Vec<MuscleGroupShare> = per_category
        .into_iter()
        .filter(|(_, volume)| *volume > 0.0)
        .map(|(category, volume)| MuscleGroupShare {
            category: BreakdownBucket::Category(category),
            volume,
            percentage: volume / total * 100.0,
        })
        .collect();
    // Stable sort keeps category order for equal volumes
    shares.sort_by(|a, b| b.volume.total_cmp(&a.volume));

    if shares.len() > top_n {
        other_volume += shares.split_off(top_n).iter().map(|s| s.volume).sum::<f64>();
    }
    if other_volume > 0.0 {
        shares.push(MuscleGroupShare {
            category: BreakdownBucket::Other,
            volume: other_volume,
            percentage: other_volume / total * 100.0,
        });
    }

    Ok(shares)
}

/// Workouts, sets, volume and period PR count for the last `days` days
pub fn period_summary(
    ctx: &AnalyticsContext,
    days: u32,
    sets: &[LoggedSet],
    exercises: &[Exercise],
) -> Result<PeriodSummary> {
    let window = ctx.day_window(days)?;
    Ok(PeriodSummary {
        start: window.start,
        end: window.end,
        workouts: workout_count(ctx, days, sets)?,
        sets: set_count(ctx, days, sets)?,
        total_volume: total_volume(ctx, days, sets)?,
        personal_records: pr_count_in_window(ctx, days, sets, exercises)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CalendarPolicy, WeightUnit};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, day, 10, 0, 0).unwrap()
    }

    // 2024-04-14 is a Sunday
    fn ctx() -> AnalyticsContext {
        AnalyticsContext::new(at(14), CalendarPolicy::utc())
    }

    fn set(exercise: &str, day: u32, weight: Option<f64>, reps: Option<i32>) -> LoggedSet {
        LoggedSet::new(exercise, 1, weight, reps, WeightUnit::Kg, at(day))
    }

    #[test]
    fn test_empty_trend_has_exact_length() {
        let trend = volume_trend(&ctx(), 7, &[]).unwrap();
        assert_eq!(trend.len(), 7);
        assert!(trend.iter().all(|d| d.volume == 0.0));
        assert!(trend
            .windows(2)
            .all(|w| w[1].date == w[0].date + Duration::days(1)));
        assert_eq!(trend[6].date, NaiveDate::from_ymd_opt(2024, 4, 14).unwrap());
    }

    #[test]
    fn test_trend_sums_completed_volume() {
        let sets = vec![
            set("bench", 14, Some(100.0), Some(5)),
            set("squat", 14, Some(100.0), Some(5)),
            set("bench", 13, Some(50.0), Some(10)).incomplete(),
            set("bench", 12, None, Some(10)),
            set("bench", 1, Some(100.0), Some(5)), // outside window
        ];
        let trend = volume_trend(&ctx(), 7, &sets).unwrap();
        assert_eq!(trend[6].volume, 1000.0);
        assert_eq!(trend[5].volume, 0.0);
        assert_eq!(trend[4].volume, 0.0);
        assert_eq!(trend.iter().map(|d| d.volume).sum::<f64>(), 1000.0);
    }

    #[test]
    fn test_trend_converts_units() {
        let mut lbs = set("bench", 14, Some(100.0), Some(10));
        lbs.unit = WeightUnit::Lbs;
        let trend = volume_trend(&ctx(), 1, &[lbs]).unwrap();
        assert!((trend[0].volume - 453.592).abs() < 1e-9);
    }

    #[test]
    fn test_weekly_trend() {
        let sets = vec![
            set("bench", 8, Some(100.0), Some(5)),  // Monday, current week
            set("bench", 14, Some(100.0), Some(5)), // Sunday, current week
            set("bench", 3, Some(100.0), Some(3)),  // previous week
        ];
        let weekly = weekly_volume_trend(&ctx(), 3, &sets).unwrap();
        assert_eq!(weekly.len(), 3);
        assert_eq!(weekly[0].week_start, NaiveDate::from_ymd_opt(2024, 3, 25).unwrap());
        assert_eq!(weekly[0].volume, 0.0);
        assert_eq!(weekly[1].volume, 300.0);
        assert_eq!(weekly[2].week_start, NaiveDate::from_ymd_opt(2024, 4, 8).unwrap());
        assert_eq!(weekly[2].volume, 1000.0);
    }

    #[test]
    fn test_weekly_trend_sunday_weeks() {
        let calendar =
            CalendarPolicy::with_offset_minutes(0, crate::calendar::WeekStart::Sunday).unwrap();
        let ctx = AnalyticsContext::new(at(14), calendar);
        let sets = vec![
            set("bench", 13, Some(100.0), Some(5)), // Saturday, previous Sunday-week
            set("bench", 14, Some(100.0), Some(5)),
        ];
        let weekly = weekly_volume_trend(&ctx, 2, &sets).unwrap();
        assert_eq!(weekly[1].week_start, NaiveDate::from_ymd_opt(2024, 4, 14).unwrap());
        assert_eq!(weekly[1].volume, 500.0);
        assert_eq!(weekly[0].volume, 500.0);
    }

    #[test]
    fn test_counts() {
        let sets = vec![
            set("bench", 14, Some(100.0), Some(5)),
            set("bench", 14, Some(100.0), Some(5)),
            set("pullup", 12, None, Some(8)),
            set("bench", 11, Some(100.0), Some(5)).incomplete(),
            set("bench", 2, Some(100.0), Some(5)),
        ];
        assert_eq!(workout_count(&ctx(), 7, &sets).unwrap(), 2);
        assert_eq!(set_count(&ctx(), 7, &sets).unwrap(), 3);
        assert_eq!(total_volume(&ctx(), 7, &sets).unwrap(), 1000.0);
    }

    #[test]
    fn test_empty_window_counts_are_zero() {
        assert_eq!(workout_count(&ctx(), 30, &[]).unwrap(), 0);
        assert_eq!(set_count(&ctx(), 30, &[]).unwrap(), 0);
        assert_eq!(total_volume(&ctx(), 30, &[]).unwrap(), 0.0);
    }

    fn catalog(categories: &[MuscleCategory]) -> Vec<Exercise> {
        categories
            .iter()
            .enumerate()
            .map(|(i, c)| Exercise::new(format!("ex{}", i), format!("Exercise {}", i), *c))
            .collect()
    }

    #[test]
    fn test_breakdown_merges_tail_into_other() {
        let categories = [
            MuscleCategory::Chest,
            MuscleCategory::Back,
            MuscleCategory::Shoulders,
            MuscleCategory::Biceps,
            MuscleCategory::Triceps,
            MuscleCategory::Quads,
            MuscleCategory::Hamstrings,
            MuscleCategory::Calves,
        ];
        let exercises = catalog(&categories);
        // ex0 gets the most volume, ex7 the least
        let sets: Vec<LoggedSet> = (0..8)
            .map(|i| set(&format!("ex{}", i), 14, Some(10.0 * (8 - i) as f64), Some(10)))
            .collect();

        let breakdown = muscle_group_breakdown(&ctx(), 7, &sets, &exercises).unwrap();
        assert_eq!(breakdown.len(), 7);
        assert_eq!(breakdown[0].category, BreakdownBucket::Category(MuscleCategory::Chest));
        assert_eq!(breakdown[6].category, BreakdownBucket::Other);
        // Hamstrings (200) + Calves (100)
        assert_eq!(breakdown[6].volume, 300.0);

        let total: f64 = breakdown.iter().map(|s| s.percentage).sum();
        assert!((total - 100.0).abs() < 1e-9);
        assert!(breakdown[..6].windows(2).all(|w| w[0].volume >= w[1].volume));
    }

    #[test]
    fn test_breakdown_without_tail() {
        let exercises = catalog(&[MuscleCategory::Chest, MuscleCategory::Quads]);
        let sets = vec![
            set("ex0", 14, Some(25.0), Some(10)),
            set("ex1", 14, Some(75.0), Some(10)),
        ];
        let breakdown = muscle_group_breakdown(&ctx(), 7, &sets, &exercises).unwrap();
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].category, BreakdownBucket::Category(MuscleCategory::Quads));
        assert_eq!(breakdown[0].percentage, 75.0);
        assert_eq!(breakdown[1].percentage, 25.0);
    }

    #[test]
    fn test_breakdown_other_category_merged_into_single_row() {
        let categories = [
            MuscleCategory::Other,
            MuscleCategory::Chest,
            MuscleCategory::Back,
            MuscleCategory::Shoulders,
            MuscleCategory::Biceps,
            MuscleCategory::Triceps,
            MuscleCategory::Quads,
            MuscleCategory::Calves,
        ];
        let exercises = catalog(&categories);
        // "other" exercises carry the most volume (800), calves the least (100)
        let sets: Vec<LoggedSet> = (0..8)
            .map(|i| set(&format!("ex{}", i), 14, Some(10.0 * (8 - i) as f64), Some(10)))
            .collect();

        let breakdown = muscle_group_breakdown(&ctx(), 7, &sets, &exercises).unwrap();
        assert_eq!(breakdown.len(), 7);
        let others: Vec<_> = breakdown
            .iter()
            .filter(|s| s.category == BreakdownBucket::Other)
            .collect();
        assert_eq!(others.len(), 1);
        assert_eq!(breakdown[6].category, BreakdownBucket::Other);
        assert_eq!(breakdown[6].volume, 900.0);
        assert_eq!(breakdown[0].category, BreakdownBucket::Category(MuscleCategory::Chest));
        assert!(!breakdown
            .iter()
            .any(|s| s.category == BreakdownBucket::Category(MuscleCategory::Other)));

        let total: f64 = breakdown.iter().map(|s| s.percentage).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_breakdown_other_category_without_tail_sorts_last() {
        let exercises = catalog(&[MuscleCategory::Other, MuscleCategory::Back]);
        let sets = vec![
            set("ex0", 14, Some(75.0), Some(10)),
            set("ex1", 14, Some(25.0), Some(10)),
        ];
        let breakdown = muscle_group_breakdown(&ctx(), 7, &sets, &exercises).unwrap();
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].category, BreakdownBucket::Category(MuscleCategory::Back));
        assert_eq!(breakdown[1].category, BreakdownBucket::Other);
        assert_eq!(breakdown[1].percentage, 75.0);
    }

    #[test]
    fn test_breakdown_groups_by_primary_category() {
        let mut exercises = catalog(&[MuscleCategory::Chest, MuscleCategory::Chest]);
        exercises[1].secondary_categories = vec![MuscleCategory::Triceps];
        let sets = vec![
            set("ex0", 14, Some(50.0), Some(10)),
            set("ex1", 14, Some(50.0), Some(10)),
        ];
        let breakdown = muscle_group_breakdown(&ctx(), 7, &sets, &exercises).unwrap();
        assert_eq!(breakdown.len(), 1);
        assert_eq!(breakdown[0].volume, 1000.0);
        assert_eq!(breakdown[0].percentage, 100.0);
    }

    #[test]
    fn test_breakdown_zero_volume_is_empty() {
        let exercises = catalog(&[MuscleCategory::Back]);
        let sets = vec![set("ex0", 14, None, Some(10))];
        assert!(muscle_group_breakdown(&ctx(), 7, &sets, &exercises)
            .unwrap()
            .is_empty());
        assert!(muscle_group_breakdown(&ctx(), 7, &[], &exercises)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_breakdown_unknown_exercise_rejected() {
        let sets = vec![set("ghost", 14, Some(50.0), Some(10))];
        let result = muscle_group_breakdown(&ctx(), 7, &sets, &[]);
        assert!(matches!(result, Err(Error::UnknownExercise(_))));
    }

    #[test]
    fn test_period_summary() {
        let exercises = catalog(&[MuscleCategory::Chest]);
        let sets = vec![
            set("ex0", 1, Some(50.0), Some(10)),
            set("ex0", 13, Some(60.0), Some(10)),
            set("ex0", 14, Some(40.0), Some(10)),
        ];
        let summary = period_summary(&ctx(), 7, &sets, &exercises).unwrap();
        assert_eq!(summary.workouts, 2);
        assert_eq!(summary.sets, 2);
        assert_eq!(summary.total_volume, 1000.0);
        assert_eq!(summary.personal_records, 1);
        assert_eq!(summary.start, NaiveDate::from_ymd_opt(2024, 4, 8).unwrap());
    }

    #[test]
    fn test_zero_day_window_rejected() {
        assert!(volume_trend(&ctx(), 0, &[]).is_err());
        assert!(weekly_volume_trend(&ctx(), 0, &[]).is_err());
    }

    #[test]
    fn test_bucket_serializes_flat() {
        let quads = serde_json::to_value(BreakdownBucket::Category(MuscleCategory::Quads)).unwrap();
        assert_eq!(quads, serde_json::json!("quads"));
        let other = serde_json::to_value(BreakdownBucket::Other).unwrap();
        assert_eq!(other, serde_json::json!("other"));
    }
}
