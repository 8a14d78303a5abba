//! The unfinished session, kept as a JSON file between CLI invocations.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::session::SessionState;

pub fn save_session(path: &Path, state: &SessionState) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(state)?;

    // The rename replaces the old file atomically.
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content).with_context(|| format!("failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("failed to save session to {}", path.display()))
}

pub fn load_session(path: &Path) -> Result<Option<SessionState>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read session file {}", path.display()))?;
    let state = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse session file {}", path.display()))?;
    Ok(Some(state))
}

/// Returns `false` if there was nothing to remove.
pub fn clear_session(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(path).with_context(|| format!("failed to remove {}", path.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExerciseDefinition, ExerciseResult};
    use crate::session::SessionStatus;
    use chrono::Local;

    fn state() -> SessionState {
        SessionState {
            id: uuid::Uuid::new_v4(),
            weekday: Some("monday".to_string()),
            category: Some("Chest & Triceps".to_string()),
            exercises: vec![ExerciseDefinition {
                name: "Push-ups".to_string(),
                sets: 4,
                reps: 12,
                bodyweight: true,
            }],
            completed: vec![ExerciseResult {
                name: "Push-ups".to_string(),
                weights: vec![],
                weight: 0.0,
                sets: 4,
                reps: 12,
                elapsed_ms: 42_000,
            }],
            total_elapsed_ms: 42_000,
            current: None,
            started_at: Local::now(),
            status: SessionStatus::Active,
        }
    }

    #[test]
    fn test_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("active-session.json");

        assert!(load_session(&path).unwrap().is_none());

        let s = state();
        save_session(&path, &s).unwrap();
        assert_eq!(load_session(&path).unwrap(), Some(s));

        assert!(clear_session(&path).unwrap());
        assert!(!clear_session(&path).unwrap());
        assert!(load_session(&path).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("active-session.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(load_session(&path).is_err());
    }
}
