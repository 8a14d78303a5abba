use std::sync::Arc;

use anyhow::{Context, Result};
use trainday::config::{Config, default_path};
use trainday::plan::WorkoutPlan;
use trainday::session::{DuplicatePolicy, SessionContext, SessionController, SessionState};
use trainday::store::SqliteStore;

pub mod body;
pub mod calendar;
pub mod config;
pub mod history;
pub mod plan;
pub mod session;
pub mod status;

/// Everything a command needs once config, plan and store are loaded.
pub struct App {
    pub config: Config,
    pub plan: Arc<WorkoutPlan>,
    pub ctx: SessionContext,
    pub policy: DuplicatePolicy,
}

impl App {
    pub async fn load() -> Result<Self> {
        let config = Config::load(&default_path()?)?;
        let policy = config.duplicate_policy()?;

        let plan = match config.plan_path() {
            Some(path) => WorkoutPlan::load(&path)?,
            None => WorkoutPlan::builtin()?,
        };

        let db_path = config.database_path()?;
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating `{}`", parent.display()))?;
        }
        let store = SqliteStore::open(&db_path)
            .await
            .with_context(|| format!("opening database `{}`", db_path.display()))?;

        tracing::debug!(user = %config.user(), db = %db_path.display(), "app loaded");

        Ok(Self {
            ctx: SessionContext::new(config.user(), Arc::new(store)),
            plan: Arc::new(plan),
            config,
            policy,
        })
    }

    pub fn controller(&self, state: Option<SessionState>) -> SessionController {
        match state {
            Some(state) => SessionController::from_state(
                self.ctx.clone(),
                self.plan.clone(),
                self.policy,
                state,
            ),
            None => SessionController::new(self.ctx.clone(), self.plan.clone(), self.policy),
        }
    }
}
