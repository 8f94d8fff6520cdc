//! CSV export of logged sets.
//!
//! Produces one row per set for spreadsheets, ordered by local day,
//! exercise and set order.

use crate::{CalendarPolicy, Effort, Exercise, LoggedSet, Result};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    date: String,
    exercise_id: String,
    exercise_name: String,
    order: u32,
    weight: Option<f64>,
    reps: Option<i32>,
    unit: &'static str,
    completed: bool,
    rpe: Option<u8>,
    rir: Option<u8>,
    logged_at: String,
}

impl CsvRow {
    fn new(set: &LoggedSet, name: &str, calendar: &CalendarPolicy) -> Self {
        let (rpe, rir) = match set.effort {
            Some(Effort::Rpe(v)) => (Some(v), None),
            Some(Effort::Rir(v)) => (None, Some(v)),
            None => (None, None),
        };
        CsvRow {
            id: set.id.to_string(),
            date: calendar.day_of(set.date).to_string(),
            exercise_id: set.exercise_id.clone(),
            exercise_name: name.to_string(),
            order: set.order,
            weight: set.weight,
            reps: set.reps,
            unit: set.unit.as_str(),
            completed: set.is_completed,
            rpe,
            rir,
            logged_at: set.created_at.to_rfc3339(),
        }
    }
}

/// Write `sets` to a fresh CSV file at `path`, replacing any existing file
///
/// Returns the number of rows written. Sets of exercises missing from
/// `exercises` are exported under their id.
pub fn export_sets(
    sets: &[LoggedSet],
    exercises: &[Exercise],
    calendar: &CalendarPolicy,
    path: &Path,
) -> Result<usize> {
    let names: HashMap<&str, &str> = exercises
        .iter()
        .map(|e| (e.id.as_str(), e.name.as_str()))
        .collect();

    let mut ordered: Vec<&LoggedSet> = sets.iter().collect();
    ordered.sort_by(|a, b| {
        calendar
            .day_of(a.date)
            .cmp(&calendar.day_of(b.date))
            .then_with(|| a.exercise_id.cmp(&b.exercise_id))
            .then_with(|| a.order.cmp(&b.order))
    });

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(file);

    for set in &ordered {
        let name = names
            .get(set.exercise_id.as_str())
            .copied()
            .unwrap_or(set.exercise_id.as_str());
        writer.serialize(CsvRow::new(set, name, calendar))?;
    }

    // Flush and sync to disk
    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Exported {} sets to {:?}", ordered.len(), path);
    Ok(ordered.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::get_default_catalog;
    use crate::WeightUnit;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_export_rows_and_headers() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("out").join("sets.csv");
        let calendar = CalendarPolicy::utc();

        let day2 = Utc.with_ymd_and_hms(2024, 3, 2, 10, 0, 0).unwrap();
        let day1 = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let sets = vec![
            LoggedSet::new("bench_press", 2, Some(60.0), Some(8), WeightUnit::Kg, day1)
                .with_effort(Effort::Rpe(8)),
            LoggedSet::new("back_squat", 1, Some(225.0), Some(5), WeightUnit::Lbs, day2),
            LoggedSet::new("bench_press", 1, Some(60.0), Some(8), WeightUnit::Kg, day1),
            LoggedSet::new("mystery_lift", 1, None, Some(10), WeightUnit::Kg, day2).incomplete(),
        ];

        let written = export_sets(&sets, get_default_catalog(), &calendar, &path).unwrap();
        assert_eq!(written, 4);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "id");
        assert_eq!(&headers[1], "date");
        assert_eq!(&headers[3], "exercise_name");

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 4);

        // Day, then exercise id, then order
        assert_eq!(&rows[0][1], "2024-03-01");
        assert_eq!(&rows[0][4], "1");
        assert_eq!(&rows[1][4], "2");
        assert_eq!(&rows[1][9], "8");
        assert_eq!(&rows[2][3], "Back Squat");
        assert_eq!(&rows[2][7], "lbs");

        // Unknown exercise exported under its id, blank weight
        assert_eq!(&rows[3][3], "mystery_lift");
        assert_eq!(&rows[3][5], "");
        assert_eq!(&rows[3][8], "false");
    }

    #[test]
    fn test_export_empty_writes_nothing_but_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("sets.csv");

        let written = export_sets(&[], &[], &CalendarPolicy::utc(), &path).unwrap();
        assert_eq!(written, 0);
        assert!(path.exists());
    }
}
