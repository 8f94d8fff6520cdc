#![forbid(unsafe_code)]

//! Core domain model and analytics for the LiftLog strength journal.
//!
//! This crate provides:
//! - Domain types (exercises, logged sets, rep ranges, effort)
//! - Unit conversion and one-rep-max estimation
//! - Session aggregation and progression classification
//! - Personal record detection and time-windowed insights
//! - Persistence (JSONL set log, exercise library, CSV export)

pub mod types;
pub mod error;
pub mod units;
pub mod one_rep_max;
pub mod calendar;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod library;
pub mod session;
pub mod progression;
pub mod records;
pub mod insights;
pub mod store;
pub mod csv_export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use calendar::{AnalyticsContext, CalendarPolicy, WeekStart};
pub use config::Config;
pub use library::ExerciseLibrary;
pub use one_rep_max::estimate_one_rep_max;
pub use session::{build_sessions, Session, SessionOrder};
pub use progression::{classify_exercise, classify_progression, ProgressionStatus};
pub use records::{detect_recent_prs, detect_records, pr_count_in_window, PersonalRecord};
pub use insights::{muscle_group_breakdown, volume_trend, weekly_volume_trend};
pub use store::{FileStore, JsonlSetLog, SetSink, SetSource};
