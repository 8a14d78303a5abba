use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::TrainingStore;
use crate::error::{StoreError, StoreResult};
use crate::models::{
    BodyWeight, MaxWeightRecord, MaxWeightUpdate, StoredTrainingRecord, TrainingRecord, UserId,
};

#[derive(Default)]
struct UserData {
    records: Vec<StoredTrainingRecord>,
    max_weights: HashMap<String, MaxWeightRecord>,
    trained_days: BTreeSet<NaiveDate>,
    body_weight: Option<BodyWeight>,
}

/// In-process store. Failures can be switched on per write kind to exercise
/// retry paths.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<UserId, UserData>>,
    fail_records: AtomicBool,
    fail_trained_days: AtomicBool,
    fail_max_weights: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_record_writes(&self, fail: bool) {
        self.fail_records.store(fail, Ordering::SeqCst);
    }

    pub fn fail_trained_day_writes(&self, fail: bool) {
        self.fail_trained_days.store(fail, Ordering::SeqCst);
    }

    pub fn fail_max_weight_writes(&self, fail: bool) {
        self.fail_max_weights.store(fail, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool, what: &str) -> StoreResult<()> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable(format!("{what} writes are failing")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TrainingStore for MemoryStore {
    async fn submit_training_record(
        &self,
        user: &UserId,
        record: &TrainingRecord,
    ) -> StoreResult<String> {
        Self::check(&self.fail_records, "training record")?;
        let id = Uuid::new_v4().to_string();
        let mut users = self.users.lock().await;
        users
            .entry(user.clone())
            .or_default()
            .records
            .push(StoredTrainingRecord {
                id: id.clone(),
                record: record.clone(),
            });
        Ok(id)
    }

    async fn list_training_records(&self, user: &UserId) -> StoreResult<Vec<StoredTrainingRecord>> {
        let users = self.users.lock().await;
        let mut records = users.get(user).map(|d| d.records.clone()).unwrap_or_default();
        records.sort_by_key(|r| r.record.date);
        Ok(records)
    }

    async fn get_max_weight(&self, user: &UserId, exercise: &str) -> StoreResult<Option<f64>> {
        let users = self.users.lock().await;
        Ok(users
            .get(user)
            .and_then(|d| d.max_weights.get(exercise))
            .map(|m| m.weight))
    }

    async fn set_max_weight_if_greater(
        &self,
        user: &UserId,
        exercise: &str,
        value: f64,
    ) -> StoreResult<MaxWeightUpdate> {
        Self::check(&self.fail_max_weights, "max weight")?;
        let mut users = self.users.lock().await;
        let data = users.entry(user.clone()).or_default();
        let previous = data.max_weights.get(exercise).map(|m| m.weight);
        let updated = previous.is_none_or(|p| value > p);
        if updated {
            data.max_weights.insert(
                exercise.to_string(),
                MaxWeightRecord {
                    exercise: exercise.to_string(),
                    weight: value,
                    updated_at: Local::now(),
                },
            );
        }
        Ok(MaxWeightUpdate { previous, updated })
    }

    async fn list_max_weights(&self, user: &UserId) -> StoreResult<Vec<MaxWeightRecord>> {
        let users = self.users.lock().await;
        let mut list: Vec<_> = users
            .get(user)
            .map(|d| d.max_weights.values().cloned().collect())
            .unwrap_or_default();
        list.sort_by(|a, b| a.exercise.cmp(&b.exercise));
        Ok(list)
    }

    async fn mark_day_trained(&self, user: &UserId, date: NaiveDate) -> StoreResult<bool> {
        Self::check(&self.fail_trained_days, "trained day")?;
        let mut users = self.users.lock().await;
        Ok(users.entry(user.clone()).or_default().trained_days.insert(date))
    }

    async fn list_trained_days(&self, user: &UserId) -> StoreResult<Vec<NaiveDate>> {
        let users = self.users.lock().await;
        Ok(users
            .get(user)
            .map(|d| d.trained_days.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn get_body_weight(&self, user: &UserId) -> StoreResult<Option<BodyWeight>> {
        let users = self.users.lock().await;
        Ok(users.get(user).and_then(|d| d.body_weight.clone()))
    }

    async fn set_body_weight(&self, user: &UserId, value: f64) -> StoreResult<()> {
        let mut users = self.users.lock().await;
        users.entry(user.clone()).or_default().body_weight = Some(BodyWeight {
            weight: value,
            updated_at: Local::now(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_max_weight_is_monotonic() {
        let store = MemoryStore::new();
        let user = UserId::new("u1");

        let first = store.set_max_weight_if_greater(&user, "Row", 50.0).await.unwrap();
        assert_eq!(first, MaxWeightUpdate { previous: None, updated: true });

        let second = store.set_max_weight_if_greater(&user, "Row", 40.0).await.unwrap();
        assert_eq!(second, MaxWeightUpdate { previous: Some(50.0), updated: false });
        assert_eq!(store.get_max_weight(&user, "Row").await.unwrap(), Some(50.0));
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let store = MemoryStore::new();
        let a = UserId::new("a");
        let b = UserId::new("b");
        let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();

        store.mark_day_trained(&a, day).await.unwrap();
        store.set_body_weight(&a, 80.0).await.unwrap();

        assert!(store.list_trained_days(&b).await.unwrap().is_empty());
        assert!(store.get_body_weight(&b).await.unwrap().is_none());
        assert_eq!(store.get_body_weight(&a).await.unwrap().unwrap().weight, 80.0);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = MemoryStore::new();
        let user = UserId::new("u1");
        let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();

        store.fail_trained_day_writes(true);
        assert!(store.mark_day_trained(&user, day).await.is_err());

        store.fail_trained_day_writes(false);
        assert!(store.mark_day_trained(&user, day).await.unwrap());
        assert!(!store.mark_day_trained(&user, day).await.unwrap());
    }
}
