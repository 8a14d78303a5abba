/// `HH:MM:SS` for a millisecond count. Hours are not wrapped at 24.
pub fn format_duration(ms: u64) -> String {
    let secs = ms / 1000;
    let hours = secs / 3600;
    let minutes = (secs / 60) % 60;
    let seconds = secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Stopwatch display with hundredths, e.g. `01:02.35`.
pub fn format_stopwatch(ms: u64) -> String {
    let minutes = ms / 60_000;
    let seconds = (ms / 1000) % 60;
    let hundredths = (ms % 1000) / 10;
    format!("{:02}:{:02}.{:02}", minutes, seconds, hundredths)
}

/// Short human form used in tables: `1h 05m` or `12m`.
pub fn format_minutes(ms: u64) -> String {
    let minutes = ms / 60_000;
    let hours = minutes / 60;
    if hours > 0 {
        format!("{}h {:02}m", hours, minutes % 60)
    } else {
        format!("{}m", minutes)
    }
}

/// Parses a weight entry. Anything that is not a finite number counts as zero.
pub fn coerce_weight(raw: &str) -> f64 {
    match raw.trim().replace(',', ".").parse::<f64>() {
        Ok(w) if w.is_finite() => w,
        _ => 0.0,
    }
}
