//! Set log persistence.
//!
//! Sets are appended to a JSONL (JSON Lines) file. Re-saving an exercise's
//! day replaces its sets wholesale; the log is rewritten atomically in that
//! case. Every access locks a sidecar `<log>.lock` file rather than the log
//! itself, as rewrites swap the log file out from under open handles.

use crate::library::ExerciseLibrary;
use crate::{CalendarPolicy, Error, Exercise, LoggedSet, Result, SetFilter};
use chrono::NaiveDate;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Sink for newly logged sets
pub trait SetSink {
    fn append(&mut self, set: &LoggedSet) -> Result<()>;
}

/// Read side the analytics are fed from
pub trait SetSource {
    /// Sets matching `filter`, in no particular order
    fn fetch_sets(&self, filter: &SetFilter) -> Result<Vec<LoggedSet>>;

    fn fetch_exercises(&self) -> Result<Vec<Exercise>>;
}

impl SetFilter {
    /// Whether a set passes this filter, using `calendar` for day bounds
    pub fn matches(&self, set: &LoggedSet, calendar: &CalendarPolicy) -> bool {
        if self.completed_only && !set.is_completed {
            return false;
        }
        if let Some(ref id) = self.exercise_id {
            if &set.exercise_id != id {
                return false;
            }
        }
        if let Some(range) = self.date_range {
            if !range.contains(calendar.day_of(set.date)) {
                return false;
            }
        }
        true
    }
}

fn lock_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

fn open_lock(path: &Path) -> Result<File> {
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(lock_path(path))?;
    Ok(file)
}

/// JSONL-based set log with file locking
pub struct JsonlSetLog {
    path: PathBuf,
}

impl JsonlSetLog {
    /// Create a new set log for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure the parent directory exists
    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Replace every set of `exercise_id` on local `day` with `sets`
    ///
    /// Returns how many old sets were removed. The new sets are validated
    /// before anything is written.
    pub fn replace_day(
        &self,
        exercise_id: &str,
        day: NaiveDate,
        sets: &[LoggedSet],
        calendar: &CalendarPolicy,
    ) -> Result<usize> {
        crate::types::validate_sets(sets)?;
        if let Some(stray) = sets
            .iter()
            .find(|s| s.exercise_id != exercise_id || calendar.day_of(s.date) != day)
        {
            return Err(Error::Validation(format!(
                "Set {} does not belong to {} on {}",
                stray.id, exercise_id, day
            )));
        }

        self.ensure_parent_dir()?;
        let parent = self
            .path
            .parent()
            .ok_or_else(|| Error::Store(format!("Set log path {:?} has no parent", self.path)))?;

        // Hold the log lock for the whole read-rewrite cycle
        let lock = open_lock(&self.path)?;
        lock.lock_exclusive()?;

        let existing = if self.path.exists() {
            parse_lines(BufReader::new(File::open(&self.path)?))?
        } else {
            Vec::new()
        };
        let (superseded, kept): (Vec<_>, Vec<_>) = existing
            .into_iter()
            .partition(|s| s.exercise_id == exercise_id && calendar.day_of(s.date) == day);

        let temp = NamedTempFile::new_in(parent)?;
        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            for set in kept.iter().chain(sets.iter()) {
                writer.write_all(serde_json::to_string(set)?.as_bytes())?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        lock.unlock()?;

        tracing::info!(
            "Replaced {} set(s) of {} on {} with {}",
            superseded.len(),
            exercise_id,
            day,
            sets.len()
        );
        Ok(superseded.len())
    }

    /// Next 1-based order for a set of `exercise_id` on local `day`
    pub fn next_order(
        &self,
        exercise_id: &str,
        day: NaiveDate,
        calendar: &CalendarPolicy,
    ) -> Result<u32> {
        let highest = read_sets(&self.path)?
            .iter()
            .filter(|s| s.exercise_id == exercise_id && calendar.day_of(s.date) == day)
            .map(|s| s.order)
            .max()
            .unwrap_or(0);
        Ok(highest + 1)
    }
}

impl SetSink for JsonlSetLog {
    fn append(&mut self, set: &LoggedSet) -> Result<()> {
        set.validate()?;
        self.ensure_parent_dir()?;

        // Acquire exclusive lock
        let lock = open_lock(&self.path)?;
        lock.lock_exclusive()?;

        // Open file for appending
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;
        let torn = ends_mid_line(&mut file)?;

        // Write set as JSON line
        let mut writer = std::io::BufWriter::new(&file);
        if torn {
            tracing::warn!("Set log {:?} ends with a partial line", self.path);
            writer.write_all(b"\n")?;
        }
        let line = serde_json::to_string(set)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        lock.unlock()?;

        tracing::debug!("Appended set {} to log", set.id);
        Ok(())
    }
}

/// Whether the last write to `file` stopped before its newline
fn ends_mid_line(file: &mut File) -> Result<bool> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::Start(len - 1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

fn parse_lines<R: BufRead>(reader: R) -> Result<Vec<LoggedSet>> {
    let mut sets = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<LoggedSet>(&line) {
            Ok(set) => sets.push(set),
            Err(e) => {
                tracing::warn!("Failed to parse set at line {}: {}", line_num + 1, e);
                // Continue reading, don't fail completely
            }
        }
    }

    Ok(sets)
}

/// Read all sets from a set log
pub fn read_sets(path: &Path) -> Result<Vec<LoggedSet>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    // Acquire shared lock for reading
    let lock = open_lock(path)?;
    lock.lock_shared()?;
    let sets = File::open(path)
        .map_err(Error::from)
        .and_then(|file| parse_lines(BufReader::new(file)));
    lock.unlock()?;

    let sets = sets?;
    tracing::debug!("Read {} sets from log", sets.len());
    Ok(sets)
}

/// The set log and exercise library under one data directory
pub struct FileStore {
    log: JsonlSetLog,
    library_path: PathBuf,
    calendar: CalendarPolicy,
}

impl FileStore {
    pub const SET_LOG_FILE: &'static str = "sets.jsonl";
    pub const LIBRARY_FILE: &'static str = "exercises.json";

    pub fn open(data_dir: &Path, calendar: CalendarPolicy) -> Self {
        Self {
            log: JsonlSetLog::new(data_dir.join(Self::SET_LOG_FILE)),
            library_path: data_dir.join(Self::LIBRARY_FILE),
            calendar,
        }
    }

    pub fn log(&self) -> &JsonlSetLog {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut JsonlSetLog {
        &mut self.log
    }

    pub fn library_path(&self) -> &Path {
        &self.library_path
    }

    pub fn calendar(&self) -> &CalendarPolicy {
        &self.calendar
    }

    pub fn library(&self) -> Result<ExerciseLibrary> {
        ExerciseLibrary::load(&self.library_path)
    }
}

impl SetSource for FileStore {
    fn fetch_sets(&self, filter: &SetFilter) -> Result<Vec<LoggedSet>> {
        let sets: Vec<LoggedSet> = read_sets(self.log.path())?
            .into_iter()
            .filter(|s| filter.matches(s, &self.calendar))
            .collect();
        tracing::debug!("Fetched {} sets for {:?}", sets.len(), filter);
        Ok(sets)
    }

    fn fetch_exercises(&self) -> Result<Vec<Exercise>> {
        Ok(self.library()?.list())
    }
}
