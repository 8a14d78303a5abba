use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use chrono::{Datelike, Local};
use colored::Colorize;
use itertools::Itertools;
use tokio::io::{AsyncBufReadExt, BufReader};
use trainday::models::ExerciseResult;
use trainday::session::SessionStatus;
use trainday::storage::{clear_session, load_session, save_session};
use trainday::timer::{ExerciseTimer, TimerState, spawn_ticker};
use trainday::types::{OutputFmt, WEEKDAYS, best_suggestion, canonical_weekday, emit, weekday_key};
use trainday::utils::{format_duration, format_stopwatch};

use super::App;
use super::plan::print_exercise_line;
use crate::cli::SessionCmd;

/// One line typed while an exercise is open.
#[derive(Debug, PartialEq)]
enum Input {
    Start,
    Pause,
    /// Bare enter.
    Toggle,
    Reset,
    Weight { set: usize, value: String },
    Status,
    Done,
    Quit,
    Help,
    Invalid(String),
}

fn parse_input(line: &str) -> Input {
    let mut parts = line.split_whitespace();
    let Some(cmd) = parts.next() else {
        return Input::Toggle;
    };

    match cmd.to_ascii_lowercase().as_str() {
        "s" | "start" => Input::Start,
        "p" | "pause" => Input::Pause,
        "r" | "reset" => Input::Reset,
        "d" | "done" => Input::Done,
        "q" | "quit" => Input::Quit,
        "i" | "info" => Input::Status,
        "h" | "help" | "?" => Input::Help,
        "w" | "weight" => {
            let set = parts.next().and_then(|s| s.parse::<usize>().ok());
            let value = parts.next();
            match (set, value) {
                (Some(set), Some(value)) if set >= 1 => Input::Weight {
                    set,
                    value: value.to_string(),
                },
                _ => Input::Invalid("usage: w <SET> <KG>".to_string()),
            }
        }
        other => Input::Invalid(format!("unknown command `{other}` (h for help)")),
    }
}

fn print_help() {
    println!(
        "{}",
        "  s start · p pause · enter toggle · r reset · w <set> <kg> weight · i info · d done · q quit"
            .dimmed()
    );
}

fn with_timer<R>(timer: &Mutex<ExerciseTimer>, f: impl FnOnce(&mut ExerciseTimer) -> R) -> Result<R> {
    let mut guard = timer.lock().map_err(|_| anyhow!("timer state is poisoned"))?;
    Ok(f(&mut guard))
}

fn print_timer(timer: &ExerciseTimer) {
    let state = match timer.state() {
        TimerState::Idle => "idle".dimmed(),
        TimerState::Running => "running".green(),
        TimerState::Paused => "paused".yellow(),
    };
    let weights = (0..timer.exercise().sets as usize)
        .map(|i| timer.set_weight_entry(i).unwrap_or("-"))
        .join(" / ");
    println!(
        "  {} {} — sets: {}",
        format_stopwatch(timer.elapsed_ms()).bold(),
        state,
        weights
    );
}

fn no_session() {
    println!("{} no active session (start one with `trainday session start`)", "error:".red().bold());
}

/// Runs the stopwatch until the user marks the exercise done or quits.
/// `None` means the exercise was left without a result.
async fn run_timer(timer: ExerciseTimer) -> Result<Option<ExerciseResult>> {
    let timer = Arc::new(Mutex::new(timer));
    let ticker = spawn_ticker(timer.clone());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print_help();
    let outcome = loop {
        let elapsed = with_timer(&timer, |t| t.elapsed_ms())?;
        print!("{} ", format!("[{}] >", format_stopwatch(elapsed)).cyan());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break None;
        };

        match parse_input(&line) {
            Input::Start => with_timer(&timer, |t| t.start())?,
            Input::Pause => with_timer(&timer, |t| t.pause())?,
            Input::Toggle => with_timer(&timer, |t| match t.state() {
                TimerState::Running => t.pause(),
                _ => t.start(),
            })?,
            Input::Reset => with_timer(&timer, |t| t.reset())?,
            Input::Weight { set, value } => {
                if let Err(e) = with_timer(&timer, |t| t.record_set_weight(set - 1, value))? {
                    println!("{} {}", "error:".red().bold(), e);
                }
            }
            Input::Status => with_timer(&timer, |t| print_timer(t))?,
            Input::Help => print_help(),
            Input::Done => break Some(with_timer(&timer, |t| t.finalize())?),
            Input::Quit => break None,
            Input::Invalid(msg) => println!("{} {}", "warning:".yellow().bold(), msg),
        }
    };

    ticker.abort();
    Ok(outcome)
}

async fn start(app: &App, path: &Path, day: Option<String>, fmt: OutputFmt) -> Result<()> {
    if let Some(state) = load_session(path)? {
        if state.status == SessionStatus::Active {
            println!(
                "{} there is already an active session (id: {})",
                "error:".red().bold(),
                state.id
            );
            return Ok(());
        }
    }

    let day = match day {
        Some(d) => match canonical_weekday(&d) {
            Some(key) => key,
            None => {
                print!("{} `{}` is not a weekday", "error:".red().bold(), d);
                match best_suggestion(&d, WEEKDAYS.keys().copied()) {
                    Some(s) => println!(", did you mean `{}`?", s),
                    None => println!(),
                }
                return Ok(());
            }
        },
        None => weekday_key(Local::now().weekday()),
    };

    let mut controller = app.controller(None);
    controller.select_workout(day);
    save_session(path, controller.state())?;

    let state = controller.state();
    emit(fmt, state, || {
        match &state.category {
            Some(category) => {
                println!("{} {} ({})", "Session:".cyan().bold(), category.bold(), day);
                println!("{}", "Exercises:".cyan().bold());
                for (i, e) in state.exercises.iter().enumerate() {
                    print_exercise_line(i, e);
                }
            }
            None => println!(
                "{} nothing scheduled on {}, rest day; exercises can still be picked by name",
                "info:".blue().bold(),
                day
            ),
        }
        println!("\n{} session started (id: {})", "ok:".green().bold(), state.id);
    });
    Ok(())
}

fn show(app: &App, path: &Path, fmt: OutputFmt) -> Result<()> {
    let Some(state) = load_session(path)? else {
        no_session();
        return Ok(());
    };
    let controller = app.controller(Some(state));
    let summary = controller.summary();
    let state = controller.state();

    emit(fmt, &summary, || {
        println!(
            "{} {} ({}, started {}, total {})",
            "Session:".cyan().bold(),
            state.category.as_deref().unwrap_or("rest day").bold(),
            state.weekday.as_deref().unwrap_or("-"),
            state.started_at.format("%Y-%m-%d %H:%M"),
            format_duration(state.total_elapsed_ms)
        );

        println!("\n{}", "Exercises:".cyan().bold());
        for (i, e) in state.exercises.iter().enumerate() {
            print_exercise_line(i, e);
            for r in state.completed.iter().filter(|r| r.name == e.name) {
                println!(
                    "    {} {} @ {} kg",
                    "✓".green(),
                    format_stopwatch(r.elapsed_ms),
                    r.weight
                );
            }
        }

        let extra = state
            .completed
            .iter()
            .filter(|r| !state.exercises.iter().any(|e| e.name == r.name))
            .collect::<Vec<_>>();
        if !extra.is_empty() {
            println!("\n{}", "Also done:".cyan().bold());
            for r in extra {
                println!(
                    "  {} {} — {} @ {} kg",
                    "✓".green(),
                    r.name.bold(),
                    format_stopwatch(r.elapsed_ms),
                    r.weight
                );
            }
        }

        if !summary.pending.is_empty() {
            println!("\n{} {}", "Pending:".cyan().bold(), summary.pending.join(", ").dimmed());
        }
    });
    Ok(())
}

async fn exercise(app: &App, path: &Path, query: &str, fmt: OutputFmt) -> Result<()> {
    let Some(state) = load_session(path)? else {
        no_session();
        return Ok(());
    };
    let mut controller = app.controller(Some(state));

    let Some(definition) = controller.resolve_exercise(query) else {
        print!("{} no exercise `{}` in this session or plan", "error:".red().bold(), query);
        let names = controller
            .state()
            .exercises
            .iter()
            .map(|e| e.name.as_str())
            .chain(app.plan.exercise_names())
            .unique()
            .collect::<Vec<_>>();
        match best_suggestion(query, names) {
            Some(s) => println!(", did you mean `{}`?", s),
            None => println!(),
        }
        return Ok(());
    };

    let opened = controller.open_exercise(&definition).await;
    save_session(path, controller.state())?;

    if fmt == OutputFmt::Pretty {
        println!(
            "{} {} — {} x {}",
            "Exercise:".cyan().bold(),
            definition.name.bold(),
            definition.sets,
            definition.reps
        );
        match opened.max_weight {
            Some(w) => println!("  {} {} kg", "PR:".cyan(), w),
            None => println!("  {} {}", "PR:".cyan(), "none yet".dimmed()),
        }
        println!("  {} {}", "Image:".cyan(), opened.asset.dimmed());
    }

    match run_timer(opened.timer).await? {
        Some(result) => {
            controller.complete_exercise(result.clone());
            save_session(path, controller.state())?;
            emit(fmt, &result, || {
                println!(
                    "{} {} done in {} @ {} kg (session total {})",
                    "ok:".green().bold(),
                    result.name,
                    format_stopwatch(result.elapsed_ms),
                    result.weight,
                    format_duration(controller.state().total_elapsed_ms)
                )
            });
        }
        None => {
            controller.close_exercise();
            save_session(path, controller.state())?;
            if fmt == OutputFmt::Pretty {
                println!("{} left {} without saving it", "info:".blue().bold(), definition.name);
            }
        }
    }
    Ok(())
}

async fn end(app: &App, path: &Path, fmt: OutputFmt) -> Result<()> {
    let Some(state) = load_session(path)? else {
        no_session();
        return Ok(());
    };
    let mut controller = app.controller(Some(state));

    if let Some(open) = &controller.state().current {
        println!(
            "{} `{}` was still open and is not part of this session",
            "warning:".yellow().bold(),
            open
        );
    }

    let outcome = match controller.complete_session(Local::now()).await {
        Ok(outcome) => outcome,
        Err(e) => {
            println!(
                "{} {}; the session is kept, run `trainday session end` again to retry",
                "error:".red().bold(),
                e
            );
            return Ok(());
        }
    };

    if let Err(e) = clear_session(path) {
        tracing::warn!("could not remove the session file: {e:#}");
        save_session(path, controller.state())?;
    }

    emit(fmt, &outcome, || {
        println!(
            "{} session saved in {} ({} exercises, id: {})",
            "ok:".green().bold(),
            format_duration(outcome.record.total_time_ms),
            outcome.record.exercises.len(),
            outcome.record_id
        );
        for r in &outcome.raised {
            match r.previous {
                Some(prev) => println!(
                    "  {} {} {} kg (was {} kg)",
                    "new record:".magenta().bold(),
                    r.exercise.bold(),
                    r.weight,
                    prev
                ),
                None => println!("  {} {} {} kg", "new record:".magenta().bold(), r.exercise.bold(), r.weight),
            }
        }
        for w in &outcome.warnings {
            println!("{} {}", "warning:".yellow().bold(), w);
        }
    });
    Ok(())
}

fn cancel(path: &Path) -> Result<()> {
    match load_session(path)? {
        Some(state) => {
            clear_session(path)?;
            println!("{} session cancelled (id: {})", "ok:".green().bold(), state.id);
        }
        None => println!("{} no active session to cancel", "error:".red().bold()),
    }
    Ok(())
}

pub async fn handle(cmd: SessionCmd, app: &App, fmt: OutputFmt) -> Result<()> {
    let path = app.config.active_session_path()?;

    match cmd {
        SessionCmd::Start(args) => start(app, &path, args.day, fmt).await,
        SessionCmd::Show => show(app, &path, fmt),
        SessionCmd::Exercise { exercise: words } => {
            exercise(app, &path, &words.join(" "), fmt).await
        }
        SessionCmd::End => end(app, &path, fmt).await,
        SessionCmd::Cancel => cancel(&path),
    }
}
