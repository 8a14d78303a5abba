use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use trainday::models::{MaxWeightRecord, StoredTrainingRecord};
use trainday::types::{OutputFmt, emit};
use trainday::utils::{format_minutes, format_stopwatch};

use super::App;

#[derive(Serialize)]
struct History {
    records: Vec<StoredTrainingRecord>,
    trained_days: usize,
}

pub async fn handle_history(app: &App, limit: Option<usize>, fmt: OutputFmt) -> Result<()> {
    let ctx = &app.ctx;
    let mut records = ctx.store.list_training_records(&ctx.user).await?;
    let trained_days = ctx.store.list_trained_days(&ctx.user).await?.len();

    if let Some(n) = limit {
        let skip = records.len().saturating_sub(n);
        records = records.split_off(skip);
    }

    let history = History {
        records,
        trained_days,
    };

    emit(fmt, &history, || {
        if history.records.is_empty() {
            println!("{}", "(no training recorded yet)".dimmed());
            return;
        }

        for stored in &history.records {
            let r = &stored.record;
            println!(
                "{}  {} ({})",
                r.date.format("%a %Y-%m-%d %H:%M").to_string().green(),
                r.category.as_deref().unwrap_or("rest day").bold(),
                format_minutes(r.total_time_ms)
            );
            for e in &r.exercises {
                let load = if e.weight > 0.0 {
                    format!(" @ {} kg", e.weight)
                } else {
                    String::new()
                };
                println!(
                    "    {} — {} x {}{}  {}",
                    e.name,
                    e.sets,
                    e.reps,
                    load,
                    format_stopwatch(e.time_spent_ms).dimmed()
                );
            }
        }

        println!(
            "\n{}: {} days",
            "Trained".cyan().bold(),
            history.trained_days
        );
    });
    Ok(())
}

pub async fn handle_records(app: &App, fmt: OutputFmt) -> Result<()> {
    let ctx = &app.ctx;
    let maxes: Vec<MaxWeightRecord> = ctx.store.list_max_weights(&ctx.user).await?;

    emit(fmt, &maxes, || {
        if maxes.is_empty() {
            println!("{}", "(no max weights yet)".dimmed());
            return;
        }

        println!("{}", "Max weights:".cyan().bold());
        let width = maxes.iter().map(|m| m.exercise.len()).max().unwrap_or(0);
        for m in &maxes {
            println!(
                "  {:<width$}  {:>6} kg  {}",
                m.exercise,
                m.weight,
                m.updated_at.format("%Y-%m-%d").to_string().dimmed(),
                width = width
            );
        }
    });
    Ok(())
}
