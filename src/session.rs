//! Workout session state machine.
//!
//! A session is created for one weekday, collects one [`ExerciseResult`] per
//! completed exercise and is finally persisted with [`SessionController::complete_session`].
//! The controller never touches globals: the user and the store travel in a
//! [`SessionContext`].

use std::str::FromStr;
use std::sync::Arc;

use anyhow::anyhow;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SessionError;
use crate::models::{ExerciseDefinition, ExerciseRecord, ExerciseResult, TrainingRecord, UserId};
use crate::plan::WorkoutPlan;
use crate::store::TrainingStore;
use crate::timer::ExerciseTimer;
use crate::types::canonical_weekday;

/// Who is training and where their data goes.
#[derive(Clone)]
pub struct SessionContext {
    pub user: UserId,
    pub store: Arc<dyn TrainingStore>,
}

impl SessionContext {
    pub fn new(user: UserId, store: Arc<dyn TrainingStore>) -> Self {
        Self { user, store }
    }
}

/// What happens when an exercise is completed a second time in one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Keep both results.
    #[default]
    Append,
    /// The newer result overwrites the earlier one.
    Replace,
}

impl FromStr for DuplicatePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "append" => Ok(Self::Append),
            "replace" => Ok(Self::Replace),
            other => Err(anyhow!(
                "unknown duplicate policy `{other}` (expected `append` or `replace`)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
}

/// Live state of one session. Serializable so an unfinished session can be
/// picked up again later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub id: Uuid,
    /// Canonical weekday key, `None` until a workout is selected.
    pub weekday: Option<String>,
    /// `None` on a rest day.
    pub category: Option<String>,
    /// Exercises scheduled for the selected workout, in plan order.
    pub exercises: Vec<ExerciseDefinition>,
    /// Completed results in completion order.
    pub completed: Vec<ExerciseResult>,
    /// Always the sum of `completed[..].elapsed_ms`.
    pub total_elapsed_ms: u64,
    /// Exercise currently being timed.
    pub current: Option<String>,
    pub started_at: DateTime<Local>,
    pub status: SessionStatus,
}

impl SessionState {
    fn new(started_at: DateTime<Local>) -> Self {
        Self {
            id: Uuid::new_v4(),
            weekday: None,
            category: None,
            exercises: Vec::new(),
            completed: Vec::new(),
            total_elapsed_ms: 0,
            current: None,
            started_at,
            status: SessionStatus::Active,
        }
    }
}

/// Everything needed to run one exercise.
#[derive(Debug)]
pub struct OpenedExercise {
    pub timer: ExerciseTimer,
    /// Personal record to show next to the stopwatch.
    pub max_weight: Option<f64>,
    pub asset: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaisedMax {
    pub exercise: String,
    pub previous: Option<f64>,
    pub weight: f64,
}

/// Result of a successful `complete_session`. The training record is stored;
/// `warnings` lists the side effects that did not go through.
#[derive(Debug, Clone, Serialize)]
pub struct SessionOutcome {
    pub record_id: String,
    pub record: TrainingRecord,
    pub day_added: bool,
    pub raised: Vec<RaisedMax>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub weekday: Option<String>,
    pub category: Option<String>,
    pub completed: Vec<ExerciseResult>,
    /// Planned exercises with no result yet.
    pub pending: Vec<String>,
    pub current: Option<String>,
    pub total_elapsed_ms: u64,
    pub status: SessionStatus,
}

pub struct SessionController {
    ctx: SessionContext,
    plan: Arc<WorkoutPlan>,
    policy: DuplicatePolicy,
    state: SessionState,
}

impl SessionController {
    pub fn new(ctx: SessionContext, plan: Arc<WorkoutPlan>, policy: DuplicatePolicy) -> Self {
        Self::from_state(ctx, plan, policy, SessionState::new(Local::now()))
    }

    /// Resumes a session saved earlier.
    pub fn from_state(
        ctx: SessionContext,
        plan: Arc<WorkoutPlan>,
        policy: DuplicatePolicy,
        state: SessionState,
    ) -> Self {
        Self {
            ctx,
            plan,
            policy,
            state,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_completed(&self) -> bool {
        self.state.status == SessionStatus::Completed
    }

    /// Loads the workout scheduled on `day`. An unknown or unmapped day is a
    /// rest day: no category and no exercises.
    pub fn select_workout(&mut self, day: &str) -> &[ExerciseDefinition] {
        let key = canonical_weekday(day);
        let category = self.plan.category_for(day).map(str::to_string);
        let exercises = category
            .as_deref()
            .map(|c| self.plan.exercises_for(c).to_vec())
            .unwrap_or_default();

        if category.is_none() {
            tracing::info!("no workout scheduled on `{day}`, rest day");
        }

        self.state.weekday = key.map(str::to_string);
        self.state.category = category;
        self.state.exercises = exercises;
        &self.state.exercises
    }

    /// Finds an exercise by 1-based position in the selected workout, by name
    /// in the workout, or by name anywhere in the plan.
    pub fn resolve_exercise(&self, query: &str) -> Option<ExerciseDefinition> {
        let query = query.trim();
        if let Ok(idx) = query.parse::<usize>() {
            return idx
                .checked_sub(1)
                .and_then(|i| self.state.exercises.get(i))
                .cloned();
        }

        self.state
            .exercises
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(query))
            .or_else(|| self.plan.find_exercise(query))
            .cloned()
    }

    /// Marks `exercise` as current and reads its personal record from the
    /// store. The read is never cached across exercises.
    pub async fn open_exercise(&mut self, exercise: &ExerciseDefinition) -> OpenedExercise {
        self.state.current = Some(exercise.name.clone());

        let max_weight = match self
            .ctx
            .store
            .get_max_weight(&self.ctx.user, &exercise.name)
            .await
        {
            Ok(w) => w,
            Err(e) => {
                tracing::warn!(exercise = %exercise.name, "could not read max weight: {e}");
                None
            }
        };

        OpenedExercise {
            timer: ExerciseTimer::new(exercise.clone()),
            max_weight,
            asset: self.plan.asset_for(&exercise.name).to_string(),
        }
    }

    /// Leaves the current exercise without a result.
    pub fn close_exercise(&mut self) {
        self.state.current = None;
    }

    pub fn complete_exercise(&mut self, result: ExerciseResult) {
        self.state.current = None;

        let existing = match self.policy {
            DuplicatePolicy::Append => None,
            DuplicatePolicy::Replace => self
                .state
                .completed
                .iter()
                .position(|r| r.name == result.name),
        };

        tracing::debug!(exercise = %result.name, elapsed_ms = result.elapsed_ms, "exercise completed");
        match existing {
            Some(idx) => self.state.completed[idx] = result,
            None => self.state.completed.push(result),
        }

        self.state.total_elapsed_ms = self.state.completed.iter().map(|r| r.elapsed_ms).sum();
    }

    fn build_record(&self, now: DateTime<Local>) -> TrainingRecord {
        TrainingRecord {
            date: now,
            category: self.state.category.clone(),
            exercises: self.state.completed.iter().map(ExerciseRecord::from).collect(),
            total_time_ms: self.state.total_elapsed_ms,
        }
    }

    /// Heaviest weight per exercise name, first-completion order. Zero weights
    /// are skipped.
    fn best_weights(&self) -> Vec<(String, f64)> {
        let mut best: Vec<(String, f64)> = Vec::new();
        for r in self.state.completed.iter().filter(|r| r.weight > 0.0) {
            match best.iter_mut().find(|(name, _)| *name == r.name) {
                Some((_, w)) => *w = w.max(r.weight),
                None => best.push((r.name.clone(), r.weight)),
            }
        }
        best
    }

    /// Persists the session.
    ///
    /// The training record is written first. If that fails the error is
    /// returned and the state is left as it was, so calling again retries.
    /// Once the record is stored, the trained day and the max weights are
    /// updated one after another; their failures end up in
    /// [`SessionOutcome::warnings`] and do not undo the record.
    pub async fn complete_session(
        &mut self,
        now: DateTime<Local>,
    ) -> Result<SessionOutcome, SessionError> {
        if self.is_completed() {
            return Err(SessionError::AlreadyCompleted(self.state.id));
        }

        let user = &self.ctx.user;
        let store = &self.ctx.store;
        let record = self.build_record(now);

        let record_id = match store.submit_training_record(user, &record).await {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(session = %self.state.id, "training record write failed: {e}");
                return Err(e.into());
            }
        };

        let mut warnings = Vec::new();

        let day = now.date_naive();
        let day_added = match store.mark_day_trained(user, day).await {
            Ok(added) => added,
            Err(e) => {
                tracing::warn!("could not mark {day} as trained: {e}");
                warnings.push(format!("{day} was not marked as trained: {e}"));
                false
            }
        };

        let mut raised = Vec::new();
        for (exercise, weight) in self.best_weights() {
            match store.set_max_weight_if_greater(user, &exercise, weight).await {
                Ok(update) if update.updated => raised.push(RaisedMax {
                    exercise,
                    previous: update.previous,
                    weight,
                }),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(exercise = %exercise, "could not update max weight: {e}");
                    warnings.push(format!("max weight for `{exercise}` was not updated: {e}"));
                }
            }
        }

        self.state.status = SessionStatus::Completed;
        self.state.current = None;
        tracing::info!(session = %self.state.id, record = %record_id, "session completed");

        Ok(SessionOutcome {
            record_id,
            record,
            day_added,
            raised,
            warnings,
        })
    }

    pub fn summary(&self) -> SessionSummary {
        let pending = self
            .state
            .exercises
            .iter()
            .filter(|e| !self.state.completed.iter().any(|r| r.name == e.name))
            .map(|e| e.name.clone())
            .collect();

        SessionSummary {
            id: self.state.id,
            weekday: self.state.weekday.clone(),
            category: self.state.category.clone(),
            completed: self.state.completed.clone(),
            pending,
            current: self.state.current.clone(),
            total_elapsed_ms: self.state.total_elapsed_ms,
            status: self.state.status,
        }
    }
}
