use anyhow::Result;
use chrono::{Local, NaiveDate};
use colored::Colorize;
use serde::Serialize;
use trainday::aggregate::{Bucket, Summary, WeekBucket, WeekLogEntry, summarize, week_log, weekly_breakdown};
use trainday::types::{OutputFmt, emit};
use trainday::utils::format_minutes;

use super::App;

fn create_ascii_graph(data: &[(NaiveDate, f64)], width: usize, height: usize, title: &str) -> Vec<String> {
    if data.len() < 2 {
        return vec!["Not enough data for a graph".to_string()];
    }

    let max_value = data.iter().map(|(_, v)| *v).fold(0.0, f64::max);
    if max_value == 0.0 {
        return vec!["No training in this period".to_string()];
    }

    let width = width.max(data.len());
    let mut grid = vec![vec![' '; width]; height];

    let point = |i: usize, value: f64| {
        let x = i * (width - 1) / (data.len() - 1);
        let y = (value / max_value * (height - 1) as f64).round() as usize;
        (x, height - 1 - y)
    };

    for (i, (_, value)) in data.iter().enumerate() {
        let (x, y) = point(i, *value);

        // Line from the previous point.
        if i > 0 {
            let (prev_x, prev_y) = point(i - 1, data[i - 1].1);
            let dx = x as isize - prev_x as isize;
            let dy = y as isize - prev_y as isize;
            let steps = dx.abs().max(dy.abs());
            for step in 1..steps {
                let px = (prev_x as isize + dx * step / steps) as usize;
                let py = (prev_y as isize + dy * step / steps) as usize;
                if grid[py][px] == ' ' {
                    grid[py][px] = '·';
                }
            }
        }

        grid[y][x] = '●';
    }

    let mut result = Vec::new();
    result.push(format!("\n{}", title.bold()));
    result.push("─".repeat(width + 7));

    let step = max_value / (height - 1) as f64;
    for (i, row) in grid.iter().enumerate() {
        let value = step * (height - 1 - i) as f64;
        result.push(format!("{:4.0} │{}", value, row.iter().collect::<String>()));
    }
    result.push(format!("     └{}", "─".repeat(width)));

    if let (Some((first, _)), Some((last, _))) = (data.first(), data.last()) {
        let first = first.format("%Y-%m-%d").to_string();
        let last = last.format("%Y-%m-%d").to_string();
        let gap = (width + 1).saturating_sub(first.len() + last.len());
        result.push(format!("      {}{}{}", first, " ".repeat(gap), last));
    }

    result
}

#[derive(Serialize)]
struct Status {
    summary: Summary,
    weeks: Vec<WeekBucket>,
    this_week: Vec<WeekLogEntry>,
}

fn print_bucket(label: &str, b: &Bucket) {
    println!(
        "{:<11} {:>3} sessions  {:>4} exercises  {}",
        format!("{}:", label).cyan().bold(),
        b.sessions,
        b.exercises,
        format_minutes(b.time_ms)
    );
}

pub async fn handle_status(app: &App, weeks: u32, graph: bool, fmt: OutputFmt) -> Result<()> {
    let ctx = &app.ctx;
    let records = ctx.store.list_training_records(&ctx.user).await?;
    let today = Local::now().date_naive();

    let status = Status {
        summary: summarize(&records, today),
        weeks: weekly_breakdown(&records, weeks, today),
        this_week: week_log(&records, today),
    };

    emit(fmt, &status, || {
        println!("{}", "Training Status".cyan().bold());
        println!();
        print_bucket("This week", &status.summary.week);
        print_bucket("This month", &status.summary.month);
        print_bucket("All time", &status.summary.total);

        if !status.this_week.is_empty() {
            println!();
            println!("{}", "This week:".cyan().bold());
            for e in &status.this_week {
                println!(
                    "  {} {} - {} ({})",
                    e.date.format("%a %d").to_string().green(),
                    e.category.as_deref().unwrap_or("rest day"),
                    "completed".dimmed(),
                    format_minutes(e.time_ms)
                );
            }
        }

        println!();
        println!("{} ({} weeks)", "Weekly minutes:".cyan().bold(), weeks);
        if graph {
            let data: Vec<(NaiveDate, f64)> = status
                .weeks
                .iter()
                .map(|w| (w.week_start, w.bucket.time_ms as f64 / 60_000.0))
                .collect();

            let (term_width, term_height) = term_size::dimensions().unwrap_or((80, 24));
            let width = (term_width / 2).min(60);
            let height = (term_height / 2).clamp(3, 15);

            for line in create_ascii_graph(&data, width, height, "Minutes per week") {
                println!("{}", line);
            }
        } else {
            for w in &status.weeks {
                println!(
                    "  {}  {:>2} sessions  {}",
                    w.week_start.format("%Y-%m-%d"),
                    w.bucket.sessions,
                    format_minutes(w.bucket.time_ms)
                );
            }
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn test_graph_needs_two_points() {
        let graph = create_ascii_graph(&[(day(6), 30.0)], 20, 5, "t");
        assert_eq!(graph, vec!["Not enough data for a graph".to_string()]);
    }

    #[test]
    fn test_graph_all_zero() {
        let graph = create_ascii_graph(&[(day(6), 0.0), (day(13), 0.0)], 20, 5, "t");
        assert_eq!(graph, vec!["No training in this period".to_string()]);
    }

    #[test]
    fn test_graph_plots_each_point() {
        let data = [(day(6), 10.0), (day(13), 40.0), (day(20), 20.0)];
        let graph = create_ascii_graph(&data, 20, 5, "t");

        // title, rule, 5 rows, axis, dates
        assert_eq!(graph.len(), 9);
        let points: usize = graph[2..7].iter().map(|l| l.matches('●').count()).sum();
        assert_eq!(points, 3);
        assert!(graph[2].contains('●'));
        assert!(graph[8].contains("2024-05-06") && graph[8].contains("2024-05-20"));
    }
}
