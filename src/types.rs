use chrono::Weekday;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use strsim::jaro_winkler;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFmt {
    Pretty,
    Json,
}

impl OutputFmt {
    pub fn from_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Pretty }
    }
}

/// Prints `value` as JSON, or runs `pretty` for the colored rendering.
pub fn emit<T: Serialize>(fmt: OutputFmt, value: &T, pretty: impl FnOnce()) {
    match fmt {
        OutputFmt::Json => match serde_json::to_string_pretty(value) {
            Ok(s) => println!("{}", s),
            Err(e) => tracing::error!("failed to encode JSON output: {e}"),
        },
        OutputFmt::Pretty => pretty(),
    }
}

pub static WEEKDAYS: Lazy<HashMap<&'static str, Weekday>> = Lazy::new(|| {
    HashMap::from([
        ("monday", Weekday::Mon),
        ("tuesday", Weekday::Tue),
        ("wednesday", Weekday::Wed),
        ("thursday", Weekday::Thu),
        ("friday", Weekday::Fri),
        ("saturday", Weekday::Sat),
        ("sunday", Weekday::Sun),
    ])
});

/// Lowercase English name used as the plan key for `day`.
pub fn weekday_key(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// Returns the canonical weekday key or `None` if `raw` is not a weekday.
pub fn canonical_weekday<S: AsRef<str>>(raw: S) -> Option<&'static str> {
    let d = raw.as_ref().trim().to_ascii_lowercase();
    WEEKDAYS.get(d.as_str()).map(|w| weekday_key(*w))
}

/// Return the closest candidate for `input`
/// if similarity ≥ 0.80 *and* clearly better than the runner-up.
pub fn best_suggestion<'a, I>(input: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let inp = input.trim().to_ascii_lowercase();
    if inp.is_empty() {
        return None;
    }

    let mut scores: Vec<(&'a str, f64)> = candidates
        .into_iter()
        .map(|c| (c, jaro_winkler(&inp, &c.to_ascii_lowercase())))
        .collect();
    if scores.is_empty() {
        return None;
    }

    scores.sort_by(|a, b| b.1.total_cmp(&a.1));

    let (best, best_score) = scores[0];
    let second_score = scores.get(1).map(|(_, s)| *s).unwrap_or(0.0);

    const MIN_SCORE: f64 = 0.80;
    const GAP: f64 = 0.02;

    if best_score >= MIN_SCORE && best_score - second_score >= GAP {
        Some(best)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_weekday() {
        assert_eq!(canonical_weekday("Monday"), Some("monday"));
        assert_eq!(canonical_weekday(" SUNDAY "), Some("sunday"));
        assert_eq!(canonical_weekday("someday"), None);
    }

    #[test]
    fn test_best_suggestion() {
        let days = WEEKDAYS.keys().copied().collect::<Vec<_>>();
        assert_eq!(best_suggestion("wednsday", days.iter().copied()), Some("wednesday"));
        assert_eq!(best_suggestion("xyz", days.iter().copied()), None);
        assert_eq!(best_suggestion("", days.iter().copied()), None);
    }
}
