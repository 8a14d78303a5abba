//! Workout session core: the daily plan lookup, a per-exercise stopwatch, the
//! session state machine and the training store it persists to.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod plan;
pub mod session;
pub mod storage;
pub mod store;
pub mod timer;
pub mod types;
pub mod utils;
