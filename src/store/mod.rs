//! Persistence boundary for training data.
//!
//! Every operation is scoped by [`UserId`]. Backends: [`SqliteStore`] for real
//! use and [`MemoryStore`] for tests and throwaway runs.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::StoreResult;
use crate::models::{
    BodyWeight, MaxWeightRecord, MaxWeightUpdate, StoredTrainingRecord, TrainingRecord, UserId,
};

#[async_trait]
pub trait TrainingStore: Send + Sync {
    /// Appends `record` as a new document and returns its id. Never merges.
    async fn submit_training_record(
        &self,
        user: &UserId,
        record: &TrainingRecord,
    ) -> StoreResult<String>;

    /// All records of `user`, oldest first.
    async fn list_training_records(&self, user: &UserId) -> StoreResult<Vec<StoredTrainingRecord>>;

    async fn get_max_weight(&self, user: &UserId, exercise: &str) -> StoreResult<Option<f64>>;

    /// Overwrites the stored max only when `value` is strictly greater.
    /// The compare and the write happen atomically.
    async fn set_max_weight_if_greater(
        &self,
        user: &UserId,
        exercise: &str,
        value: f64,
    ) -> StoreResult<MaxWeightUpdate>;

    async fn list_max_weights(&self, user: &UserId) -> StoreResult<Vec<MaxWeightRecord>>;

    /// Adds `date` to the trained days. Returns `false` if it was already there.
    async fn mark_day_trained(&self, user: &UserId, date: NaiveDate) -> StoreResult<bool>;

    /// Trained days, sorted ascending.
    async fn list_trained_days(&self, user: &UserId) -> StoreResult<Vec<NaiveDate>>;

    async fn get_body_weight(&self, user: &UserId) -> StoreResult<Option<BodyWeight>>;

    async fn set_body_weight(&self, user: &UserId, value: f64) -> StoreResult<()>;
}
