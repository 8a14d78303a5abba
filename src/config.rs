//! Key/value configuration stored as TOML.
//!
//! Known keys are `user`, `database`, `plan` and `session.duplicates`; any
//! other key is kept as-is so `config set` never loses data.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::UserId;
use crate::session::DuplicatePolicy;

pub const KEY_USER: &str = "user";
pub const KEY_DATABASE: &str = "database";
pub const KEY_PLAN: &str = "plan";
pub const KEY_DUPLICATES: &str = "session.duplicates";

pub const ENV_CONFIG: &str = "TRAINDAY_CONFIG";
pub const ENV_DB: &str = "TRAINDAY_DB";

const APP_DIR: &str = "trainday";
const DEFAULT_USER: &str = "default";

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Config {
    pub map: BTreeMap<String, String>,
}

/// `$TRAINDAY_CONFIG`, else `<config dir>/trainday/config.toml`.
pub fn default_path() -> Result<PathBuf> {
    if let Ok(p) = std::env::var(ENV_CONFIG) {
        return Ok(PathBuf::from(p));
    }
    dirs::config_dir()
        .map(|d| d.join(APP_DIR).join("config.toml"))
        .context("could not determine config directory")
}

/// Application data directory, `<data dir>/trainday`.
pub fn data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|d| d.join(APP_DIR))
        .context("could not determine data directory")
}

impl Config {
    /// A missing file is an empty config.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config `{}`", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing config `{}`", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating `{}`", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("encoding config")?;
        std::fs::write(path, content).with_context(|| format!("writing config `{}`", path.display()))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(String::as_str)
    }

    pub fn user(&self) -> UserId {
        UserId::new(self.get(KEY_USER).unwrap_or(DEFAULT_USER))
    }

    /// `$TRAINDAY_DB`, then the `database` key, then `<data dir>/trainday/trainday.db`.
    pub fn database_path(&self) -> Result<PathBuf> {
        if let Ok(p) = std::env::var(ENV_DB) {
            return Ok(PathBuf::from(p));
        }
        match self.get(KEY_DATABASE) {
            Some(p) => Ok(PathBuf::from(p)),
            None => Ok(data_dir()?.join("trainday.db")),
        }
    }

    /// Custom plan file. `None` means the built-in plan.
    pub fn plan_path(&self) -> Option<PathBuf> {
        self.get(KEY_PLAN).map(PathBuf::from)
    }

    pub fn duplicate_policy(&self) -> Result<DuplicatePolicy> {
        match self.get(KEY_DUPLICATES) {
            Some(v) => v
                .parse::<DuplicatePolicy>()
                .with_context(|| format!("invalid `{KEY_DUPLICATES}` in config")),
            None => Ok(DuplicatePolicy::default()),
        }
    }

    /// Path of the file holding the unfinished session.
    pub fn active_session_path(&self) -> Result<PathBuf> {
        Ok(data_dir()?.join("active-session.json"))
    }
}
