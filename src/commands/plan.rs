use std::path::Path;

use anyhow::Result;
use chrono::{Datelike, Local};
use colored::Colorize;
use serde::Serialize;
use trainday::models::ExerciseDefinition;
use trainday::plan::WorkoutPlan;
use trainday::types::{OutputFmt, emit, weekday_key};

use super::App;

#[derive(Serialize)]
struct PlannedExercise<'a> {
    #[serde(flatten)]
    exercise: &'a ExerciseDefinition,
    asset: &'a str,
}

#[derive(Serialize)]
struct DayView<'a> {
    weekday: &'static str,
    category: Option<&'a str>,
    exercises: Vec<PlannedExercise<'a>>,
}

fn day_view<'a>(plan: &'a WorkoutPlan, weekday: &'static str) -> DayView<'a> {
    let category = plan.category_for(weekday);
    let exercises = category
        .map(|c| plan.exercises_for(c))
        .unwrap_or(&[])
        .iter()
        .map(|e| PlannedExercise {
            exercise: e,
            asset: plan.asset_for(&e.name),
        })
        .collect();

    DayView {
        weekday,
        category,
        exercises,
    }
}

pub fn print_exercise_line(idx: usize, e: &ExerciseDefinition) {
    let load = if e.bodyweight {
        format!(" {}", "(bodyweight)".dimmed())
    } else {
        String::new()
    };
    println!(
        "{} • {} — {} x {}{}",
        format!("{}", idx + 1).yellow(),
        e.name.bold(),
        e.sets,
        e.reps,
        load
    );
}

pub fn handle_today(app: &App, fmt: OutputFmt) -> Result<()> {
    let weekday = weekday_key(Local::now().weekday());
    let view = day_view(&app.plan, weekday);

    emit(fmt, &view, || match view.category {
        Some(category) => {
            println!("{} {}", "Today:".cyan().bold(), category.bold());
            for (i, p) in view.exercises.iter().enumerate() {
                print_exercise_line(i, p.exercise);
            }
            println!(
                "\n{} run `trainday session start` to begin",
                "info:".blue().bold()
            );
        }
        None => println!(
            "{} nothing scheduled on {}, rest day",
            "info:".blue().bold(),
            weekday
        ),
    });
    Ok(())
}

pub fn handle_show(app: &App, fmt: OutputFmt) -> Result<()> {
    let plan = app.plan.as_ref();
    emit(fmt, plan, || {
        println!("{}", "Schedule:".cyan().bold());
        for (day, category) in plan.schedule() {
            match category {
                Some(c) => println!("  {:<10} {}", day, c.bold()),
                None => println!("  {:<10} {}", day, "rest".dimmed()),
            }
        }

        for c in plan.categories() {
            println!("\n{}", c.name.cyan().bold());
            for (i, e) in c.exercises.iter().enumerate() {
                print_exercise_line(i, e);
            }
        }
    });
    Ok(())
}

#[derive(Serialize)]
struct PlanCheck {
    valid: bool,
    error: Option<String>,
}

/// Validates a plan file without touching config or the database.
pub fn handle_check(file: &Path, fmt: OutputFmt) -> Result<()> {
    let check = match WorkoutPlan::load(file) {
        Ok(_) => PlanCheck {
            valid: true,
            error: None,
        },
        Err(e) => PlanCheck {
            valid: false,
            error: Some(format!("{:#}", e)),
        },
    };

    emit(fmt, &check, || match &check.error {
        None => println!("{} `{}` is a valid plan", "ok:".green().bold(), file.display()),
        Some(e) => println!("{} {}", "error:".red().bold(), e),
    });
    Ok(())
}
