//! Core domain types for liftlog.
//!
//! This module defines the fundamental types used throughout the system:
//! - Weight units and muscle categories
//! - Exercises and their progression targets
//! - Logged sets, the atomic unit of truth
//! - Query filters used by the persistence layer

use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Units and Categories
// ============================================================================

/// Linear weight unit a set was logged in
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    Kg,
    Lbs,
}

impl WeightUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeightUnit::Kg => "kg",
            WeightUnit::Lbs => "lbs",
        }
    }
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lenient parse: anything that isn't a pound spelling is treated as kg.
impl From<&str> for WeightUnit {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "lb" | "lbs" | "pound" | "pounds" => WeightUnit::Lbs,
            _ => WeightUnit::Kg,
        }
    }
}

/// Primary or secondary muscle group an exercise trains
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum MuscleCategory {
    Chest,
    Back,
    Shoulders,
    Arms,
    Biceps,
    Triceps,
    Legs,
    Quads,
    Hamstrings,
    Glutes,
    Calves,
    Core,
    FullBody,
    Cardio,
    Other,
}

impl MuscleCategory {
    /// Upper-body categories progress in smaller jumps
    pub fn is_upper_body(&self) -> bool {
        matches!(
            self,
            MuscleCategory::Chest
                | MuscleCategory::Back
                | MuscleCategory::Shoulders
                | MuscleCategory::Arms
                | MuscleCategory::Biceps
                | MuscleCategory::Triceps
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            MuscleCategory::Chest => "Chest",
            MuscleCategory::Back => "Back",
            MuscleCategory::Shoulders => "Shoulders",
            MuscleCategory::Arms => "Arms",
            MuscleCategory::Biceps => "Biceps",
            MuscleCategory::Triceps => "Triceps",
            MuscleCategory::Legs => "Legs",
            MuscleCategory::Quads => "Quads",
            MuscleCategory::Hamstrings => "Hamstrings",
            MuscleCategory::Glutes => "Glutes",
            MuscleCategory::Calves => "Calves",
            MuscleCategory::Core => "Core",
            MuscleCategory::FullBody => "Full Body",
            MuscleCategory::Cardio => "Cardio",
            MuscleCategory::Other => "Other",
        }
    }
}

impl fmt::Display for MuscleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Equipment an exercise is performed with
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Equipment {
    Barbell,
    Dumbbell,
    Machine,
    Cable,
    Kettlebell,
    Bodyweight,
    Band,
    #[default]
    Other,
}

// ============================================================================
// Exercise Types
// ============================================================================

/// Inclusive target rep range. Both bounds are always present.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepRange {
    pub min: i32,
    pub max: i32,
}

impl RepRange {
    pub fn new(min: i32, max: i32) -> Result<Self> {
        if min < 1 || max < min {
            return Err(Error::Validation(format!(
                "Invalid target rep range [{}, {}]",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    pub fn contains(&self, reps: i32) -> bool {
        reps >= self.min && reps <= self.max
    }
}

/// Which subjective effort scale an exercise records
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EffortMode {
    #[default]
    None,
    Rpe,
    Rir,
}

impl EffortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EffortMode::None => "none",
            EffortMode::Rpe => "rpe",
            EffortMode::Rir => "rir",
        }
    }

    /// Whether a set logged under this mode may carry `effort`
    pub fn accepts(&self, effort: Option<Effort>) -> bool {
        match (self, effort) {
            (_, None) => true,
            (EffortMode::Rpe, Some(Effort::Rpe(_))) => true,
            (EffortMode::Rir, Some(Effort::Rir(_))) => true,
            _ => false,
        }
    }
}

impl fmt::Display for EffortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EffortMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" | "off" => Ok(EffortMode::None),
            "rpe" => Ok(EffortMode::Rpe),
            "rir" => Ok(EffortMode::Rir),
            other => Err(Error::Validation(format!(
                "Unknown effort mode '{}' (expected none, rpe or rir)",
                other
            ))),
        }
    }
}

/// An exercise definition (e.g., "Barbell Bench Press")
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub primary_category: MuscleCategory,
    #[serde(default)]
    pub secondary_categories: Vec<MuscleCategory>,
    #[serde(default)]
    pub equipment: Equipment,
    #[serde(default)]
    pub unit: WeightUnit,
    #[serde(default)]
    pub target_reps: Option<RepRange>,
    #[serde(default)]
    pub effort_mode: EffortMode,
    #[serde(default)]
    pub rest_seconds: Option<u32>,
}

impl Exercise {
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: MuscleCategory) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            primary_category: category,
            secondary_categories: Vec::new(),
            equipment: Equipment::Other,
            unit: WeightUnit::Kg,
            target_reps: None,
            effort_mode: EffortMode::None,
            rest_seconds: None,
        }
    }

    pub fn with_target(mut self, target: RepRange) -> Self {
        self.target_reps = Some(target);
        self
    }
}

// ============================================================================
// Logged Sets
// ============================================================================

/// Subjective effort for one set. RPE and RIR can't both be present.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "scale", content = "value", rename_all = "snake_case")]
pub enum Effort {
    Rpe(u8),
    Rir(u8),
}

impl Effort {
    pub fn value(&self) -> u8 {
        match self {
            Effort::Rpe(v) | Effort::Rir(v) => *v,
        }
    }

    pub fn scale(&self) -> &'static str {
        match self {
            Effort::Rpe(_) => "rpe",
            Effort::Rir(_) => "rir",
        }
    }
}

/// A single logged set
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LoggedSet {
    pub id: Uuid,
    pub exercise_id: String,
    /// 1-based position within the exercise's entry for that day
    pub order: u32,
    pub weight: Option<f64>,
    pub reps: Option<i32>,
    pub unit: WeightUnit,
    /// The day this set belongs to, resolved through the calendar policy
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub is_completed: bool,
    #[serde(default)]
    pub effort: Option<Effort>,
}

impl LoggedSet {
    /// Create a completed set with a fresh id
    pub fn new(
        exercise_id: impl Into<String>,
        order: u32,
        weight: Option<f64>,
        reps: Option<i32>,
        unit: WeightUnit,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            exercise_id: exercise_id.into(),
            order,
            weight,
            reps,
            unit,
            date,
            created_at: Utc::now(),
            is_completed: true,
            effort: None,
        }
    }

    pub fn incomplete(mut self) -> Self {
        self.is_completed = false;
        self
    }

    pub fn with_effort(mut self, effort: Effort) -> Self {
        self.effort = Some(effort);
        self
    }

    /// Reject sets that would make the analytics compute nonsense
    pub fn validate(&self) -> Result<()> {
        if self.exercise_id.is_empty() {
            return Err(Error::Validation(format!("Set {} has empty exercise id", self.id)));
        }
        if self.order == 0 {
            return Err(Error::Validation(format!(
                "Set {} has order 0 (orders are 1-based)",
                self.id
            )));
        }
        if let Some(weight) = self.weight {
            if !weight.is_finite() || weight < 0.0 {
                return Err(Error::Validation(format!(
                    "Set {} has invalid weight {}",
                    self.id, weight
                )));
            }
        }
        if let Some(reps) = self.reps {
            if reps < 0 {
                return Err(Error::Validation(format!(
                    "Set {} has negative reps {}",
                    self.id, reps
                )));
            }
        }
        if let Some(effort) = self.effort {
            if effort.value() > 10 {
                return Err(Error::Validation(format!(
                    "Set {} has effort {} outside 0-10",
                    self.id,
                    effort.value()
                )));
            }
        }
        Ok(())
    }

    /// [`validate`](Self::validate), then check the set against the
    /// exercise it is logged for: matching id and an effort scale the
    /// exercise's [`EffortMode`] records
    pub fn validate_for(&self, exercise: &Exercise) -> Result<()> {
        self.validate()?;
        if self.exercise_id != exercise.id {
            return Err(Error::Validation(format!(
                "Set {} belongs to '{}', not '{}'",
                self.id, self.exercise_id, exercise.id
            )));
        }
        if let Some(effort) = self.effort {
            if !exercise.effort_mode.accepts(Some(effort)) {
                return Err(Error::Validation(format!(
                    "{} records effort as '{}', got {} {}",
                    exercise.name,
                    exercise.effort_mode,
                    effort.scale(),
                    effort.value()
                )));
            }
        }
        Ok(())
    }

    /// Weight × reps in kg, only when both fields are present
    pub fn canonical_volume(&self) -> Option<f64> {
        match (self.weight, self.reps) {
            (Some(weight), Some(reps)) => {
                Some(crate::units::volume_in_canonical_unit(weight, reps, self.unit))
            }
            _ => None,
        }
    }

    /// Weight in kg, only when both weight and reps are present
    pub fn canonical_working_weight(&self) -> Option<f64> {
        match (self.weight, self.reps) {
            (Some(weight), Some(_)) => Some(crate::units::to_canonical(weight, self.unit)),
            _ => None,
        }
    }
}

/// Validate a whole batch, failing fast on the first malformed set
pub fn validate_sets(sets: &[LoggedSet]) -> Result<()> {
    sets.iter().try_for_each(LoggedSet::validate)
}

// ============================================================================
// Query Types
// ============================================================================

/// Inclusive range of local calendar days
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, day: NaiveDate) -> bool {
        day >= self.start && day <= self.end
    }
}

/// Filter passed to a [`crate::store::SetSource`]
#[derive(Clone, Debug, Default)]
pub struct SetFilter {
    pub exercise_id: Option<String>,
    pub date_range: Option<DateRange>,
    pub completed_only: bool,
}

impl SetFilter {
    pub fn for_exercise(exercise_id: impl Into<String>) -> Self {
        Self {
            exercise_id: Some(exercise_id.into()),
            ..Self::default()
        }
    }

    pub fn completed() -> Self {
        Self {
            completed_only: true,
            ..Self::default()
        }
    }
}
