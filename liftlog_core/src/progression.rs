//! Progression classification.
//!
//! Looks at the most recent sessions of one exercise and decides where the
//! lifter stands. Rules are evaluated in a fixed priority order and the first
//! match wins:
//!
//! 1. Declining performance (volume dropped past tolerance)
//! 2. Recently regressed (heavier work in the older part of the window)
//! 3. Ready to progress (consecutive flat sessions that hit the rep target)
//! 4. Progressing toward target (volume clearly rising)
//! 5. Maintaining below target (fallback)
//!
//! Decline and regression outrank "ready to progress", so no weight increase
//! is ever suggested during or right after a drop.

use crate::config::ProgressionConfig;
use crate::session::{build_sessions, Session, SessionOrder};
use crate::units::from_canonical;
use crate::{CalendarPolicy, Exercise, LoggedSet, Result, WeightUnit};
use serde::Serialize;
use std::fmt;

/// Where an exercise's recent history puts the lifter
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProgressionStatus {
    /// Fewer than two sessions, or no target rep range configured
    InsufficientData,
    /// Latest volume fell by more than the tolerance. Negative percentage.
    DecliningPerformance { percent_drop: f64 },
    /// Heavier top sets earlier in the window than today
    RecentlyRegressed,
    /// Recommended next working weight, in kg
    ReadyToProgress { recommended_weight: f64 },
    ProgressingTowardTarget,
    MaintainingBelowTarget,
}

impl ProgressionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ProgressionStatus::InsufficientData => "Insufficient data",
            ProgressionStatus::DecliningPerformance { .. } => "Declining performance",
            ProgressionStatus::RecentlyRegressed => "Recently regressed",
            ProgressionStatus::ReadyToProgress { .. } => "Ready to progress",
            ProgressionStatus::ProgressingTowardTarget => "Progressing toward target",
            ProgressionStatus::MaintainingBelowTarget => "Maintaining below target",
        }
    }

    /// Recommended weight converted to a display unit
    pub fn recommended_weight_in(&self, unit: WeightUnit) -> Option<f64> {
        match self {
            ProgressionStatus::ReadyToProgress { recommended_weight } => {
                Some(from_canonical(*recommended_weight, unit))
            }
            _ => None,
        }
    }
}

impl fmt::Display for ProgressionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressionStatus::DecliningPerformance { percent_drop } => {
                write!(f, "{} ({:.1}%)", self.label(), percent_drop)
            }
            ProgressionStatus::ReadyToProgress { recommended_weight } => {
                write!(f, "{} (next: {:.2} kg)", self.label(), recommended_weight)
            }
            _ => f.write_str(self.label()),
        }
    }
}

/// Sessions under evaluation, most recent first
struct Window<'a> {
    sessions: Vec<&'a Session>,
    exercise: &'a Exercise,
    config: &'a ProgressionConfig,
}

impl<'a> Window<'a> {
    fn latest(&self) -> &Session {
        self.sessions[0]
    }

    fn previous(&self) -> &Session {
        self.sessions[1]
    }

    /// Relative change of latest volume against the previous session.
    /// `None` when the previous volume is zero.
    fn volume_change(&self) -> Option<f64> {
        relative_change(self.latest().total_volume, self.previous().total_volume)
    }
}

struct Rule {
    name: &'static str,
    evaluate: fn(&Window) -> Option<ProgressionStatus>,
}

/// Priority order; the first rule returning `Some` decides the status
const RULES: [Rule; 5] = [
    Rule {
        name: "declining_performance",
        evaluate: declining_performance,
    },
    Rule {
        name: "recently_regressed",
        evaluate: recently_regressed,
    },
    Rule {
        name: "ready_to_progress",
        evaluate: ready_to_progress,
    },
    Rule {
        name: "progressing_toward_target",
        evaluate: progressing_toward_target,
    },
    Rule {
        name: "maintaining_below_target",
        evaluate: maintaining_below_target,
    },
];

fn relative_change(latest: f64, previous: f64) -> Option<f64> {
    if previous <= 0.0 {
        return None;
    }
    Some((latest - previous) / previous)
}

fn within_tolerance(latest: f64, previous: f64, tolerance: f64) -> bool {
    relative_change(latest, previous).is_some_and(|change| change.abs() <= tolerance)
}

fn declining_performance(w: &Window) -> Option<ProgressionStatus> {
    let change = w.volume_change()?;
    (change < -w.config.volume_tolerance).then(|| ProgressionStatus::DecliningPerformance {
        percent_drop: change * 100.0,
    })
}

fn recently_regressed(w: &Window) -> Option<ProgressionStatus> {
    if w.sessions.len() < 3 {
        return None;
    }
    let ceiling = w.latest().top_weight + w.config.weight_tolerance;
    w.sessions[2..]
        .iter()
        .any(|s| s.top_weight > ceiling)
        .then_some(ProgressionStatus::RecentlyRegressed)
}

fn ready_to_progress(w: &Window) -> Option<ProgressionStatus> {
    let needed = w.config.consecutive_hits.max(2);
    if w.sessions.len() < needed {
        return None;
    }
    let streak = &w.sessions[..needed];
    if !streak.iter().all(|s| s.hit_target_reps) {
        return None;
    }

    let flat = streak.windows(2).all(|pair| {
        let (newer, older) = (pair[0], pair[1]);
        let volume_flat = within_tolerance(
            newer.total_volume,
            older.total_volume,
            w.config.volume_tolerance,
        );
        let strength_flat = match (newer.estimated_one_rep_max, older.estimated_one_rep_max) {
            (Some(a), Some(b)) => within_tolerance(a, b, w.config.one_rep_max_tolerance),
            _ => false,
        };
        let weight_flat = (newer.top_weight - older.top_weight).abs() <= w.config.weight_tolerance;
        volume_flat && strength_flat && weight_flat
    });
    if !flat {
        return None;
    }

    let increment = if w.exercise.primary_category.is_upper_body() {
        w.config.upper_body_increment
    } else {
        w.config.lower_body_increment
    };
    Some(ProgressionStatus::ReadyToProgress {
        recommended_weight: w.latest().top_weight + increment,
    })
}

fn progressing_toward_target(w: &Window) -> Option<ProgressionStatus> {
    let change = w.volume_change()?;
    (change > w.config.volume_tolerance).then_some(ProgressionStatus::ProgressingTowardTarget)
}

fn maintaining_below_target(_: &Window) -> Option<ProgressionStatus> {
    Some(ProgressionStatus::MaintainingBelowTarget)
}

/// Classify with the default thresholds
pub fn classify_progression(exercise: &Exercise, sessions: &[Session]) -> ProgressionStatus {
    classify_progression_with(exercise, sessions, &ProgressionConfig::default())
}

/// Classify an exercise from its sessions, in any order
///
/// Sessions belonging to other exercises are ignored.
pub fn classify_progression_with(
    exercise: &Exercise,
    sessions: &[Session],
    config: &ProgressionConfig,
) -> ProgressionStatus {
    if exercise.target_reps.is_none() {
        tracing::debug!("{}: no target rep range configured", exercise.id);
        return ProgressionStatus::InsufficientData;
    }

    let mut recent: Vec<&Session> = sessions
        .iter()
        .filter(|s| s.exercise_id == exercise.id)
        .collect();
    recent.sort_by(|a, b| b.date.cmp(&a.date));
    recent.truncate(config.window_sessions.max(2));

    if recent.len() < 2 {
        tracing::debug!("{}: {} session(s), need 2", exercise.id, recent.len());
        return ProgressionStatus::InsufficientData;
    }

    let window = Window {
        sessions: recent,
        exercise,
        config,
    };

    for rule in &RULES {
        if let Some(status) = (rule.evaluate)(&window) {
            tracing::debug!("{}: rule {} matched -> {:?}", exercise.id, rule.name, status);
            return status;
        }
    }

    ProgressionStatus::MaintainingBelowTarget
}

/// Build sessions from raw sets with the exercise's target and classify them
pub fn classify_exercise(
    exercise: &Exercise,
    sets: &[LoggedSet],
    calendar: &CalendarPolicy,
    config: &ProgressionConfig,
) -> Result<ProgressionStatus> {
    let own: Vec<LoggedSet> = sets
        .iter()
        .filter(|s| s.exercise_id == exercise.id)
        .cloned()
        .collect();
    let sessions = build_sessions(&own, exercise.target_reps, calendar, SessionOrder::MostRecentFirst)?;
    Ok(classify_progression_with(exercise, &sessions, config))
}
