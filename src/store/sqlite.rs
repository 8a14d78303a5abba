use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use uuid::Uuid;

use super::TrainingStore;
use crate::error::{StoreError, StoreResult};
use crate::models::{
    BodyWeight, MaxWeightRecord, MaxWeightUpdate, StoredTrainingRecord, TrainingRecord, UserId,
};

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS training_records (
        id          TEXT PRIMARY KEY,
        user_id     TEXT NOT NULL,
        recorded_at TEXT NOT NULL,
        body        TEXT NOT NULL
    )"#,
    "CREATE INDEX IF NOT EXISTS training_records_user ON training_records (user_id, recorded_at)",
    r#"CREATE TABLE IF NOT EXISTS max_weights (
        user_id    TEXT NOT NULL,
        exercise   TEXT NOT NULL,
        weight     REAL NOT NULL,
        updated_at TEXT NOT NULL,
        PRIMARY KEY (user_id, exercise)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS trained_days (
        user_id TEXT NOT NULL,
        day     TEXT NOT NULL,
        PRIMARY KEY (user_id, day)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS body_weights (
        user_id    TEXT PRIMARY KEY,
        weight     REAL NOT NULL,
        updated_at TEXT NOT NULL
    )"#,
];

const DAY_FMT: &str = "%Y-%m-%d";

/// How long a writer waits for another connection's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Document store on SQLite. Training records are kept as JSON bodies; the
/// per-user scalars live in small keyed tables.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn open(path: &Path) -> StoreResult<Self> {
        let opts = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?;

        tracing::debug!("opened store at {}", path.display());
        Self::with_pool(pool).await
    }

    /// Private database that lives as long as the store. One connection, so
    /// every query sees the same data.
    pub async fn open_in_memory() -> StoreResult<Self> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> StoreResult<Self> {
        for stmt in SCHEMA {
            sqlx::query(stmt).execute(&pool).await?;
        }
        Ok(Self { pool })
    }
}

fn parse_timestamp(id: &str, raw: &str) -> StoreResult<DateTime<Local>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Local))
        .map_err(|e| StoreError::Corrupt {
            id: id.to_string(),
            reason: e.to_string(),
        })
}

#[async_trait]
impl TrainingStore for SqliteStore {
    async fn submit_training_record(
        &self,
        user: &UserId,
        record: &TrainingRecord,
    ) -> StoreResult<String> {
        let id = Uuid::new_v4().to_string();
        let body = serde_json::to_string(record).map_err(|e| StoreError::Rejected(e.to_string()))?;

        sqlx::query(
            "INSERT INTO training_records (id, user_id, recorded_at, body) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&id)
        .bind(user.as_str())
        .bind(record.date.naive_utc().format("%Y-%m-%d %H:%M:%S%.3f").to_string())
        .bind(body)
        .execute(&self.pool)
        .await?;

        tracing::debug!(user = %user, id = %id, "stored training record");
        Ok(id)
    }

    async fn list_training_records(&self, user: &UserId) -> StoreResult<Vec<StoredTrainingRecord>> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT id, body FROM training_records WHERE user_id = ? ORDER BY recorded_at, rowid",
        )
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(id, body)| match serde_json::from_str::<TrainingRecord>(&body) {
                Ok(record) => Ok(StoredTrainingRecord { id, record }),
                Err(e) => Err(StoreError::Corrupt {
                    id,
                    reason: e.to_string(),
                }),
            })
            .collect()
    }

    async fn get_max_weight(&self, user: &UserId, exercise: &str) -> StoreResult<Option<f64>> {
        Ok(sqlx::query_scalar::<_, f64>(
            "SELECT weight FROM max_weights WHERE user_id = ? AND exercise = ?",
        )
        .bind(user.as_str())
        .bind(exercise)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn set_max_weight_if_greater(
        &self,
        user: &UserId,
        exercise: &str,
        value: f64,
    ) -> StoreResult<MaxWeightUpdate> {
        // Read outside any transaction: a deferred transaction that reads
        // first cannot take the write lock once another connection wrote.
        let previous = self.get_max_weight(user, exercise).await?;

        // One autocommit statement; the WHERE keeps the value monotonic.
        let res = sqlx::query(
            r#"
            INSERT INTO max_weights (user_id, exercise, weight, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (user_id, exercise) DO UPDATE
                SET weight = excluded.weight,
                    updated_at = excluded.updated_at
                WHERE excluded.weight > max_weights.weight
            "#,
        )
        .bind(user.as_str())
        .bind(exercise)
        .bind(value)
        .bind(Local::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(MaxWeightUpdate {
            previous,
            updated: res.rows_affected() > 0,
        })
    }

    async fn list_max_weights(&self, user: &UserId) -> StoreResult<Vec<MaxWeightRecord>> {
        let rows = sqlx::query_as::<_, (String, f64, String)>(
            "SELECT exercise, weight, updated_at FROM max_weights WHERE user_id = ? ORDER BY exercise",
        )
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(exercise, weight, updated_at)| -> StoreResult<MaxWeightRecord> {
                let updated_at = parse_timestamp(&exercise, &updated_at)?;
                Ok(MaxWeightRecord {
                    exercise,
                    weight,
                    updated_at,
                })
            })
            .collect()
    }

    async fn mark_day_trained(&self, user: &UserId, date: NaiveDate) -> StoreResult<bool> {
        let res = sqlx::query("INSERT OR IGNORE INTO trained_days (user_id, day) VALUES (?1, ?2)")
            .bind(user.as_str())
            .bind(date.format(DAY_FMT).to_string())
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() == 1)
    }

    async fn list_trained_days(&self, user: &UserId) -> StoreResult<Vec<NaiveDate>> {
        let days = sqlx::query_scalar::<_, String>(
            "SELECT day FROM trained_days WHERE user_id = ? ORDER BY day",
        )
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await?;

        days.into_iter()
            .map(|d| {
                NaiveDate::parse_from_str(&d, DAY_FMT).map_err(|e| StoreError::Corrupt {
                    id: d.clone(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    async fn get_body_weight(&self, user: &UserId) -> StoreResult<Option<BodyWeight>> {
        let row = sqlx::query_as::<_, (f64, String)>(
            "SELECT weight, updated_at FROM body_weights WHERE user_id = ?",
        )
        .bind(user.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(weight, updated_at)| -> StoreResult<BodyWeight> {
            Ok(BodyWeight {
                weight,
                updated_at: parse_timestamp(user.as_str(), &updated_at)?,
            })
        })
        .transpose()
    }

    async fn set_body_weight(&self, user: &UserId, value: f64) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO body_weights (user_id, weight, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT (user_id) DO UPDATE
                SET weight = excluded.weight, updated_at = excluded.updated_at
            "#,
        )
        .bind(user.as_str())
        .bind(value)
        .bind(Local::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExerciseRecord;

    fn record(category: &str, total_time_ms: u64) -> TrainingRecord {
        TrainingRecord {
            date: Local::now(),
            category: Some(category.to_string()),
            exercises: vec![ExerciseRecord {
                name: "Row".to_string(),
                weight: 30.0,
                sets: 4,
                reps: 12,
                time_spent_ms: total_time_ms,
            }],
            total_time_ms,
        }
    }

    #[tokio::test]
    async fn test_records_round_trip() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let user = UserId::new("u1");

        let first = store.submit_training_record(&user, &record("Back", 1_000)).await.unwrap();
        let second = store.submit_training_record(&user, &record("Legs", 2_000)).await.unwrap();
        assert_ne!(first, second);

        let records = store.list_training_records(&user).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, first);
        assert_eq!(records[1].record.category.as_deref(), Some("Legs"));
        assert_eq!(records[1].record.exercises[0].time_spent_ms, 2_000);

        let other = store.list_training_records(&UserId::new("u2")).await.unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn test_max_weight_never_decreases() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let user = UserId::new("u1");

        let up = store.set_max_weight_if_greater(&user, "Squat", 50.0).await.unwrap();
        assert_eq!(up, MaxWeightUpdate { previous: None, updated: true });

        let down = store.set_max_weight_if_greater(&user, "Squat", 40.0).await.unwrap();
        assert_eq!(down, MaxWeightUpdate { previous: Some(50.0), updated: false });

        let equal = store.set_max_weight_if_greater(&user, "Squat", 50.0).await.unwrap();
        assert!(!equal.updated);

        assert_eq!(store.get_max_weight(&user, "Squat").await.unwrap(), Some(50.0));

        let list = store.list_max_weights(&user).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].exercise, "Squat");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_max_weight_writes_keep_the_highest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trainday.db");
        let a = SqliteStore::open(&path).await.unwrap();
        let b = SqliteStore::open(&path).await.unwrap();
        let user = UserId::new("u1");

        let mut handles = Vec::new();
        for i in 0..100u32 {
            let store = if i % 2 == 0 { a.clone() } else { b.clone() };
            let user = user.clone();
            let weight = if i == 37 { 1000.0 } else { 10.0 + f64::from(i) };
            handles.push(tokio::spawn(async move {
                store.set_max_weight_if_greater(&user, "Deadlift", weight).await
            }));
        }

        let mut updates = 0;
        for h in handles {
            let up = h.await.unwrap().unwrap();
            if up.updated {
                updates += 1;
            }
        }
        assert!(updates >= 1);

        assert_eq!(a.get_max_weight(&user, "Deadlift").await.unwrap(), Some(1000.0));
        assert_eq!(b.get_max_weight(&user, "Deadlift").await.unwrap(), Some(1000.0));
        assert_eq!(a.list_max_weights(&user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_mark_day_trained_is_idempotent() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let user = UserId::new("u1");
        let day = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();

        assert!(store.mark_day_trained(&user, day).await.unwrap());
        assert!(!store.mark_day_trained(&user, day).await.unwrap());
        assert_eq!(store.list_trained_days(&user).await.unwrap(), vec![day]);
    }

    #[tokio::test]
    async fn test_body_weight_overwrites() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let user = UserId::new("u1");

        assert!(store.get_body_weight(&user).await.unwrap().is_none());
        store.set_body_weight(&user, 81.5).await.unwrap();
        store.set_body_weight(&user, 80.9).await.unwrap();
        assert_eq!(store.get_body_weight(&user).await.unwrap().unwrap().weight, 80.9);
    }

    #[tokio::test]
    async fn test_open_file_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trainday.db");
        let user = UserId::new("u1");
        let day = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();

        {
            let store = SqliteStore::open(&path).await.unwrap();
            store.mark_day_trained(&user, day).await.unwrap();
        }

        let store = SqliteStore::open(&path).await.unwrap();
        assert_eq!(store.list_trained_days(&user).await.unwrap(), vec![day]);
    }
}
