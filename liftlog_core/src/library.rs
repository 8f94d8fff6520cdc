//! Exercise library persistence with file locking.
//!
//! The library is the user's exercise list: the default catalog plus any
//! edits (target rep ranges, units, custom exercises). It is stored as one
//! JSON document and always rewritten atomically.

use crate::catalog::{get_default_catalog, validate_exercises};
use crate::{EffortMode, Error, Exercise, RepRange, Result, WeightUnit};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// The user's exercises, keyed by id
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseLibrary {
    pub exercises: BTreeMap<String, Exercise>,
}

impl Default for ExerciseLibrary {
    /// A library seeded from the default catalog
    fn default() -> Self {
        Self::from_exercises(get_default_catalog().iter().cloned())
    }
}

impl ExerciseLibrary {
    pub fn from_exercises(exercises: impl IntoIterator<Item = Exercise>) -> Self {
        Self {
            exercises: exercises.into_iter().map(|e| (e.id.clone(), e)).collect(),
        }
    }

    pub fn get(&self, id: &str) -> Result<&Exercise> {
        self.exercises
            .get(id)
            .ok_or_else(|| Error::UnknownExercise(id.to_string()))
    }

    pub fn list(&self) -> Vec<Exercise> {
        self.exercises.values().cloned().collect()
    }

    /// Add or replace an exercise
    pub fn upsert(&mut self, exercise: Exercise) -> Result<()> {
        let errors = validate_exercises(std::slice::from_ref(&exercise));
        if !errors.is_empty() {
            return Err(Error::Validation(errors.join("; ")));
        }
        self.exercises.insert(exercise.id.clone(), exercise);
        Ok(())
    }

    /// Set or clear an exercise's target rep range
    pub fn set_target(&mut self, id: &str, target: Option<RepRange>) -> Result<()> {
        let exercise = self
            .exercises
            .get_mut(id)
            .ok_or_else(|| Error::UnknownExercise(id.to_string()))?;
        exercise.target_reps = target;
        Ok(())
    }

    /// Change the default unit new sets are logged in. Existing sets keep the
    /// unit they were logged with.
    pub fn set_unit(&mut self, id: &str, unit: WeightUnit) -> Result<()> {
        let exercise = self
            .exercises
            .get_mut(id)
            .ok_or_else(|| Error::UnknownExercise(id.to_string()))?;
        exercise.unit = unit;
        Ok(())
    }

    /// Choose which effort scale, if any, sets of this exercise record.
    /// Already-logged sets are left as they are.
    pub fn set_effort_mode(&mut self, id: &str, mode: EffortMode) -> Result<()> {
        let exercise = self
            .exercises
            .get_mut(id)
            .ok_or_else(|| Error::UnknownExercise(id.to_string()))?;
        exercise.effort_mode = mode;
        Ok(())
    }

    /// Load the library from a file with shared locking
    ///
    /// Returns the default catalog if the file doesn't exist.
    /// If the file is corrupted, logs a warning and returns the default catalog.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No exercise library found, using default catalog");
            return Ok(Self::default());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(
                    "Unable to open exercise library {:?}: {}. Using defaults.",
                    path,
                    e
                );
                return Ok(Self::default());
            }
        };

        // Acquire shared lock for reading
        if let Err(e) = file.lock_shared() {
            tracing::warn!(
                "Unable to lock exercise library {:?}: {}. Using defaults.",
                path,
                e
            );
            return Ok(Self::default());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!(
                "Failed to read exercise library {:?}: {}. Using defaults.",
                path,
                e
            );
            return Ok(Self::default());
        }

        file.unlock()?;

        match serde_json::from_str::<ExerciseLibrary>(&contents) {
            Ok(library) => {
                tracing::debug!(
                    "Loaded {} exercises from {:?}",
                    library.exercises.len(),
                    path
                );
                Ok(library)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse exercise library {:?}: {}. Using defaults.",
                    path,
                    e
                );
                Ok(Self::default())
            }
        }
    }

    /// Save the library with exclusive locking
    ///
    /// Atomically writes by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| Error::Store(format!("Library path {:?} has no parent", path)))?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string_pretty(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved exercise library to {:?}", path);
        Ok(())
    }

    /// Load the library, modify it, and save it back atomically
    pub fn update<F>(path: &Path, f: F) -> Result<Self>
    where
        F: FnOnce(&mut ExerciseLibrary) -> Result<()>,
    {
        let mut library = Self::load(path)?;
        f(&mut library)?;
        library.save(path)?;
        Ok(library)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MuscleCategory;

    #[test]
    fn test_missing_file_gives_catalog() {
        let temp_dir = tempfile::tempdir().unwrap();
        let library = ExerciseLibrary::load(&temp_dir.path().join("exercises.json")).unwrap();
        assert_eq!(library.exercises.len(), get_default_catalog().len());
        assert!(library.get("bench_press").is_ok());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("exercises.json");

        let mut library = ExerciseLibrary::default();
        library
            .upsert(Exercise::new("zercher_squat", "Zercher Squat", MuscleCategory::Quads))
            .unwrap();
        library
            .set_target("zercher_squat", Some(RepRange::new(6, 8).unwrap()))
            .unwrap();
        library.save(&path).unwrap();

        let loaded = ExerciseLibrary::load(&path).unwrap();
        assert_eq!(loaded, library);
        assert_eq!(
            loaded.get("zercher_squat").unwrap().target_reps,
            Some(RepRange { min: 6, max: 8 })
        );
    }

    #[test]
    fn test_update_pattern() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("exercises.json");

        ExerciseLibrary::update(&path, |library| library.set_unit("deadlift", WeightUnit::Lbs))
            .unwrap();

        let loaded = ExerciseLibrary::load(&path).unwrap();
        assert_eq!(loaded.get("deadlift").unwrap().unit, WeightUnit::Lbs);
    }

    #[test]
    fn test_set_effort_mode_persists() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("exercises.json");

        assert_eq!(
            ExerciseLibrary::load(&path).unwrap().get("deadlift").unwrap().effort_mode,
            EffortMode::None
        );

        ExerciseLibrary::update(&path, |library| {
            library.set_effort_mode("deadlift", EffortMode::Rir)
        })
        .unwrap();

        let loaded = ExerciseLibrary::load(&path).unwrap();
        assert_eq!(loaded.get("deadlift").unwrap().effort_mode, EffortMode::Rir);
        assert_eq!(loaded.get("bench_press").unwrap().effort_mode, EffortMode::None);

        let mut library = loaded;
        assert!(matches!(
            library.set_effort_mode("nope", EffortMode::Rpe),
            Err(Error::UnknownExercise(_))
        ));
    }

    #[test]
    fn test_unknown_exercise() {
        let mut library = ExerciseLibrary::default();
        assert!(matches!(
            library.get("nope"),
            Err(Error::UnknownExercise(_))
        ));
        assert!(library.set_target("nope", None).is_err());
    }

    #[test]
    fn test_upsert_rejects_invalid_exercise() {
        let mut library = ExerciseLibrary::default();
        let bad = Exercise::new("", "Nameless", MuscleCategory::Chest);
        assert!(matches!(library.upsert(bad), Err(Error::Validation(_))));
    }

    #[test]
    fn test_corrupted_library_falls_back_to_catalog() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("exercises.json");
        std::fs::write(&path, "{ not json").unwrap();

        let library = ExerciseLibrary::load(&path).unwrap();
        assert_eq!(library.exercises.len(), get_default_catalog().len());
    }

    #[test]
    fn test_atomic_save_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("exercises.json");

        ExerciseLibrary::default().save(&path).unwrap();

        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "exercises.json")
            .collect();
        assert!(extras.is_empty(), "Unexpected files: {:?}", extras);
    }
}
