use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a [`crate::store::TrainingStore`] backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached or failed mid-query.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The backend refused the write.
    #[error("write rejected: {0}")]
    Rejected(String),

    /// A stored document could not be decoded.
    #[error("corrupt document `{id}`: {reason}")]
    Corrupt { id: String, reason: String },
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(db_err) => StoreError::Rejected(db_err.to_string()),
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

/// Errors surfaced by the session controller.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The training record could not be written. Session state is untouched.
    #[error("training record was not saved: {0}")]
    Store(#[from] StoreError),

    #[error("session {0} was already completed")]
    AlreadyCompleted(uuid::Uuid),
}

#[derive(Debug, Error, PartialEq)]
pub enum TimerError {
    #[error("set {index} is out of range for `{exercise}` ({sets} sets)")]
    SetOutOfRange {
        exercise: String,
        index: usize,
        sets: u32,
    },

    #[error("`{0}` is a bodyweight exercise and takes no load")]
    Bodyweight(String),
}

/// Plan validation failures, raised when a plan is loaded.
#[derive(Debug, Error, PartialEq)]
pub enum PlanError {
    #[error("weekday `{day}` points to unknown category `{category}`")]
    UnknownCategory { day: String, category: String },

    #[error("asset mapped for unknown exercise `{0}`")]
    UnknownAssetExercise(String),

    #[error("asset table has no `default` entry")]
    MissingDefaultAsset,

    #[error("category name must not be empty")]
    EmptyCategory,

    #[error("exercise `{0}` has zero target sets")]
    ZeroSets(String),

    #[error("`{0}` is not a weekday")]
    UnknownWeekday(String),

    #[error("category `{0}` is defined more than once")]
    DuplicateCategory(String),

    #[error("weekday `{0}` is scheduled more than once")]
    DuplicateWeekday(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TimerError::SetOutOfRange {
            exercise: "Push-ups".to_string(),
            index: 4,
            sets: 4,
        };
        assert_eq!(err.to_string(), "set 4 is out of range for `Push-ups` (4 sets)");

        let err = SessionError::from(StoreError::Unavailable("offline".to_string()));
        assert_eq!(
            err.to_string(),
            "training record was not saved: store unavailable: offline"
        );
    }
}
