use anyhow::Result;
use colored::Colorize;
use trainday::config::{Config, KEY_DUPLICATES, KEY_PLAN, default_path};
use trainday::plan::WorkoutPlan;
use trainday::session::DuplicatePolicy;
use trainday::types::{OutputFmt, emit};

use crate::cli::ConfigCmd;

/// Rejects values the app could not start with.
fn check_value(key: &str, val: &str) -> Result<()> {
    match key {
        KEY_DUPLICATES => {
            val.parse::<DuplicatePolicy>()?;
        }
        KEY_PLAN => {
            WorkoutPlan::load(std::path::Path::new(val))?;
        }
        _ => {}
    }
    Ok(())
}

pub fn handle(cmd: ConfigCmd, fmt: OutputFmt) -> Result<()> {
    let config_path = default_path()?;
    let mut cfg = Config::load(&config_path)?;

    match cmd {
        ConfigCmd::List => emit(fmt, &cfg, || {
            if cfg.map.is_empty() {
                println!("{}", "(no config set)".dimmed());
            } else {
                println!("{}", "Config:".cyan().bold());
                for (k, v) in &cfg.map {
                    println!("  {} = {}", k.green(), v);
                }
            }
        }),

        ConfigCmd::Get { key } => match cfg.get(&key) {
            Some(val) => emit(fmt, &val, || println!("{}", val)),
            None => println!("{} key `{}` not found", "warning:".yellow().bold(), key),
        },

        ConfigCmd::Set { key, val } => {
            if let Err(e) = check_value(&key, &val) {
                println!("{} {:#}", "error:".red().bold(), e);
                return Ok(());
            }
            cfg.map.insert(key.clone(), val.clone());
            cfg.save(&config_path)?;
            println!("{} set `{}` = `{}`", "info:".blue().bold(), key.green(), val);
        }

        ConfigCmd::Unset { key } => {
            if cfg.map.remove(&key).is_some() {
                cfg.save(&config_path)?;
                println!("{} removed `{}`", "info:".blue().bold(), key.green());
            } else {
                println!("{} key `{}` not found", "warning:".yellow().bold(), key);
            }
        }
    }

    Ok(())
}
