use std::collections::HashSet;

use anyhow::Result;
use chrono::{Datelike, Local, NaiveDate};
use colored::Colorize;
use serde::Serialize;
use trainday::models::StoredTrainingRecord;
use trainday::types::{OutputFmt, emit};
use trainday::utils::format_minutes;

use super::App;

/// First and last day of a month, `None` for an invalid month.
fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next.pred_opt()?))
}

#[derive(Serialize)]
struct MonthView<'a> {
    year: i32,
    month: u32,
    trained_days: Vec<NaiveDate>,
    sessions: Vec<&'a StoredTrainingRecord>,
}

pub async fn handle(app: &App, year: Option<i32>, month: Option<u32>, fmt: OutputFmt) -> Result<()> {
    let now = Local::now();
    let year = year.unwrap_or(now.year());
    let month = month.unwrap_or(now.month());

    let Some((first_day, last_day)) = month_bounds(year, month) else {
        println!("{} month must be between 1 and 12", "error:".red().bold());
        return Ok(());
    };

    let ctx = &app.ctx;
    let trained_days: Vec<NaiveDate> = ctx
        .store
        .list_trained_days(&ctx.user)
        .await?
        .into_iter()
        .filter(|d| *d >= first_day && *d <= last_day)
        .collect();
    let records = ctx.store.list_training_records(&ctx.user).await?;
    let sessions: Vec<&StoredTrainingRecord> = records
        .iter()
        .filter(|r| {
            let d = r.record.date.date_naive();
            d >= first_day && d <= last_day
        })
        .collect();

    let view = MonthView {
        year,
        month,
        trained_days,
        sessions,
    };

    emit(fmt, &view, || {
        println!("\n{}", first_day.format("%B %Y").to_string().bold().cyan());
        println!("{}", "Su Mo Tu We Th Fr Sa".dimmed());

        let first_weekday = first_day.weekday().num_days_from_sunday() as usize;
        print!("{}", "   ".repeat(first_weekday));

        let trained: HashSet<u32> = view.trained_days.iter().map(|d| d.day()).collect();

        for day in 1..=last_day.day() {
            if trained.contains(&day) {
                print!("{} ", format!("{:2}", day).green().bold());
            } else {
                print!("{:2} ", day);
            }

            if (first_weekday + day as usize) % 7 == 0 {
                println!();
            }
        }
        println!("\n");

        if !view.sessions.is_empty() {
            println!("{}", "Sessions:".bold().cyan());
            for s in &view.sessions {
                println!(
                    "  {} | {} ({})",
                    s.record.date.format("%a %b %d %H:%M").to_string().green(),
                    s.record.category.as_deref().unwrap_or("rest day").bold(),
                    format_minutes(s.record.total_time_ms)
                );
            }
        }
    });
    Ok(())
}
