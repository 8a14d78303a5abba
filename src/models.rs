use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Identity of the person training. Every store operation is scoped by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One exercise as defined in a workout plan. Never mutated after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseDefinition {
    pub name: String,
    pub sets: u32,
    pub reps: u32,
    #[serde(default)]
    pub bodyweight: bool,
}

/// Result of one exercise, produced when the exercise is marked done.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseResult {
    pub name: String,
    /// Per-set weights by set position, up to the last set with an entry.
    /// Skipped sets in between are 0. Empty for bodyweight work.
    pub weights: Vec<f64>,
    /// Heaviest set, used as the working weight.
    pub weight: f64,
    pub sets: u32,
    pub reps: u32,
    pub elapsed_ms: u64,
}

/// Exercise sub-record as stored inside a training record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseRecord {
    pub name: String,
    pub weight: f64,
    pub sets: u32,
    pub reps: u32,
    pub time_spent_ms: u64,
}

impl From<&ExerciseResult> for ExerciseRecord {
    fn from(r: &ExerciseResult) -> Self {
        Self {
            name: r.name.clone(),
            weight: r.weight,
            sets: r.sets,
            reps: r.reps,
            time_spent_ms: r.elapsed_ms,
        }
    }
}

/// Shape submitted to the store once a session is completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRecord {
    pub date: DateTime<Local>,
    /// `None` for a rest-day session.
    pub category: Option<String>,
    pub exercises: Vec<ExerciseRecord>,
    pub total_time_ms: u64,
}

/// A training record read back from the store, with its document id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTrainingRecord {
    pub id: String,
    #[serde(flatten)]
    pub record: TrainingRecord,
}

/// Best known weight for one exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaxWeightRecord {
    pub exercise: String,
    pub weight: f64,
    pub updated_at: DateTime<Local>,
}

/// What a conditional max-weight write did.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MaxWeightUpdate {
    pub previous: Option<f64>,
    pub updated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyWeight {
    pub weight: f64,
    pub updated_at: DateTime<Local>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exercise_record_from_result() {
        let result = ExerciseResult {
            name: "Bench press".to_string(),
            weights: vec![10.0, 20.0, 15.0],
            weight: 20.0,
            sets: 4,
            reps: 12,
            elapsed_ms: 61_230,
        };

        let record = ExerciseRecord::from(&result);
        assert_eq!(record.name, "Bench press");
        assert_eq!(record.weight, 20.0);
        assert_eq!(record.sets, 4);
        assert_eq!(record.time_spent_ms, 61_230);
    }

    #[test]
    fn test_stored_record_json_is_flat() {
        let stored = StoredTrainingRecord {
            id: "abc".to_string(),
            record: TrainingRecord {
                date: Local::now(),
                category: Some("Legs".to_string()),
                exercises: vec![],
                total_time_ms: 0,
            },
        };

        let value = serde_json::to_value(&stored).unwrap();
        assert_eq!(value["id"], "abc");
        assert_eq!(value["category"], "Legs");
        assert!(value.get("record").is_none());
    }
}
