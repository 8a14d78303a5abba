//! Per-exercise stopwatch.
//!
//! Elapsed time is accumulated one tick at a time. Nothing reads the wall
//! clock, so pausing and resuming never drifts and a suspended process does
//! not jump forward when it wakes up.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::TimerError;
use crate::models::{ExerciseDefinition, ExerciseResult};
use crate::utils::coerce_weight;

/// Tick granularity in milliseconds.
pub const TICK_MS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimerState {
    Idle,
    Running,
    Paused,
}

#[derive(Debug, Clone)]
pub struct ExerciseTimer {
    exercise: ExerciseDefinition,
    state: TimerState,
    elapsed_ms: u64,
    /// Raw entries, one slot per target set. Parsed only by `finalize`.
    weights: Vec<Option<String>>,
}

impl ExerciseTimer {
    pub fn new(exercise: ExerciseDefinition) -> Self {
        let slots = exercise.sets as usize;
        Self {
            exercise,
            state: TimerState::Idle,
            elapsed_ms: 0,
            weights: vec![None; slots],
        }
    }

    pub fn exercise(&self) -> &ExerciseDefinition {
        &self.exercise
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn start(&mut self) {
        if self.state != TimerState::Running {
            self.state = TimerState::Running;
        }
    }

    pub fn pause(&mut self) {
        if self.state == TimerState::Running {
            self.state = TimerState::Paused;
        }
    }

    /// Stops and zeroes the clock. Weight entries are kept.
    pub fn reset(&mut self) {
        self.state = TimerState::Idle;
        self.elapsed_ms = 0;
    }

    pub fn tick(&mut self) {
        if self.state == TimerState::Running {
            self.elapsed_ms += TICK_MS;
        }
    }

    pub fn advance(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    /// Stores the raw entry for `set_index` (0-based). The text is not parsed here.
    pub fn record_set_weight(
        &mut self,
        set_index: usize,
        value: impl Into<String>,
    ) -> Result<(), TimerError> {
        if self.exercise.bodyweight {
            return Err(TimerError::Bodyweight(self.exercise.name.clone()));
        }
        let slot = self
            .weights
            .get_mut(set_index)
            .ok_or_else(|| TimerError::SetOutOfRange {
                exercise: self.exercise.name.clone(),
                index: set_index,
                sets: self.exercise.sets,
            })?;
        *slot = Some(value.into());
        Ok(())
    }

    pub fn set_weight_entry(&self, set_index: usize) -> Option<&str> {
        self.weights.get(set_index).and_then(|w| w.as_deref())
    }

    pub fn finalize(&self) -> ExerciseResult {
        // Slots up to the last entered set keep their position; gaps count as 0.
        let entered = self
            .weights
            .iter()
            .rposition(Option::is_some)
            .map_or(0, |last| last + 1);
        let weights: Vec<f64> = self.weights[..entered]
            .iter()
            .map(|raw| raw.as_deref().map_or(0.0, coerce_weight))
            .collect();
        let weight = weights.iter().copied().fold(0.0, f64::max);

        ExerciseResult {
            name: self.exercise.name.clone(),
            weights,
            weight,
            sets: self.exercise.sets,
            reps: self.exercise.reps,
            elapsed_ms: self.elapsed_ms,
        }
    }
}

/// Drives `timer` from a tokio interval until the returned handle is aborted.
/// Missed ticks are skipped rather than replayed.
pub fn spawn_ticker(timer: Arc<Mutex<ExerciseTimer>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(TICK_MS));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            match timer.lock() {
                Ok(mut t) => t.tick(),
                Err(_) => {
                    tracing::error!("timer lock poisoned, stopping ticker");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bench() -> ExerciseDefinition {
        ExerciseDefinition {
            name: "Bench press".to_string(),
            sets: 4,
            reps: 12,
            bodyweight: false,
        }
    }

    #[test]
    fn test_idle_timer_does_not_advance() {
        let mut timer = ExerciseTimer::new(bench());
        timer.advance(50);
        assert_eq!(timer.elapsed_ms(), 0);
        assert_eq!(timer.state(), TimerState::Idle);
    }

    #[test]
    fn test_pause_resume_sums_intervals() {
        let mut timer = ExerciseTimer::new(bench());

        timer.start();
        timer.advance(100);
        timer.pause();
        timer.advance(30);
        timer.start();
        timer.advance(25);
        timer.pause();
        timer.start();
        timer.advance(5);

        assert_eq!(timer.elapsed_ms(), (100 + 25 + 5) * TICK_MS);
        assert_eq!(timer.finalize().elapsed_ms, 1_300);
    }

    #[test]
    fn test_start_and_pause_are_idempotent() {
        let mut timer = ExerciseTimer::new(bench());
        timer.pause();
        assert_eq!(timer.state(), TimerState::Idle);

        timer.start();
        timer.start();
        timer.advance(3);
        timer.pause();
        timer.pause();
        assert_eq!(timer.state(), TimerState::Paused);
        assert_eq!(timer.elapsed_ms(), 30);
    }

    #[test]
    fn test_reset_zeroes_from_any_state() {
        let mut timer = ExerciseTimer::new(bench());
        timer.reset();
        assert_eq!(timer.elapsed_ms(), 0);

        timer.start();
        timer.advance(10);
        timer.reset();
        assert_eq!(timer.elapsed_ms(), 0);
        assert_eq!(timer.state(), TimerState::Idle);

        timer.start();
        timer.advance(10);
        timer.pause();
        timer.reset();
        assert_eq!(timer.elapsed_ms(), 0);
    }

    #[test]
    fn test_reset_keeps_weights() {
        let mut timer = ExerciseTimer::new(bench());
        timer.record_set_weight(0, "40").unwrap();
        timer.reset();
        assert_eq!(timer.set_weight_entry(0), Some("40"));
        assert_eq!(timer.finalize().weight, 40.0);
    }

    #[test]
    fn test_finalize_uses_heaviest_set() {
        let mut timer = ExerciseTimer::new(bench());
        timer.record_set_weight(0, "10").unwrap();
        timer.record_set_weight(1, "20").unwrap();
        timer.record_set_weight(2, "15").unwrap();

        let result = timer.finalize();
        assert_eq!(result.weight, 20.0);
        assert_eq!(result.weights, vec![10.0, 20.0, 15.0]);
        assert_eq!(result.sets, 4);
        assert_eq!(result.reps, 12);
    }

    #[test]
    fn test_finalize_without_weights() {
        let timer = ExerciseTimer::new(bench());
        let result = timer.finalize();
        assert_eq!(result.weight, 0.0);
        assert!(result.weights.is_empty());
    }

    #[test]
    fn test_non_numeric_weight_is_zero_at_finalize() {
        let mut timer = ExerciseTimer::new(bench());
        timer.record_set_weight(0, "abc").unwrap();
        timer.record_set_weight(1, "12.5").unwrap();

        let result = timer.finalize();
        assert_eq!(result.weights, vec![0.0, 12.5]);
        assert_eq!(result.weight, 12.5);
    }

    #[test]
    fn test_set_index_out_of_range() {
        let mut timer = ExerciseTimer::new(bench());
        let err = timer.record_set_weight(4, "10").unwrap_err();
        assert_eq!(
            err,
            TimerError::SetOutOfRange {
                exercise: "Bench press".to_string(),
                index: 4,
                sets: 4
            }
        );
        assert!(timer.finalize().weights.len() <= 4);
    }

    #[test]
    fn test_skipped_sets_keep_their_position() {
        let mut timer = ExerciseTimer::new(bench());
        timer.record_set_weight(0, "30").unwrap();
        timer.record_set_weight(2, "35").unwrap();

        let result = timer.finalize();
        assert_eq!(result.weights, vec![30.0, 0.0, 35.0]);
        assert_eq!(result.weight, 35.0);
    }

    #[test]
    fn test_bodyweight_exercise_takes_no_load() {
        let push_ups = ExerciseDefinition {
            name: "Push-ups".to_string(),
            sets: 4,
            reps: 12,
            bodyweight: true,
        };
        let mut timer = ExerciseTimer::new(push_ups);

        let err = timer.record_set_weight(0, "30").unwrap_err();
        assert_eq!(err, TimerError::Bodyweight("Push-ups".to_string()));
        assert_eq!(timer.set_weight_entry(0), None);

        let result = timer.finalize();
        assert!(result.weights.is_empty());
        assert_eq!(result.weight, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_advances_running_timer() {
        let timer = Arc::new(Mutex::new(ExerciseTimer::new(bench())));
        timer.lock().unwrap().start();

        let handle = spawn_ticker(timer.clone());
        tokio::time::sleep(Duration::from_millis(105)).await;
        handle.abort();

        let elapsed = timer.lock().unwrap().elapsed_ms();
        assert!(elapsed >= 100 && elapsed <= 110, "elapsed = {elapsed}");
    }
}
