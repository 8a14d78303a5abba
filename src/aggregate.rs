//! Date-bucketed sums over stored training records.

use chrono::{Datelike, Days, NaiveDate};
use itertools::Itertools;
use serde::Serialize;

use crate::models::StoredTrainingRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub sessions: u32,
    pub exercises: u32,
    pub time_ms: u64,
}

impl Bucket {
    fn add(&mut self, r: &StoredTrainingRecord) {
        self.sessions += 1;
        self.exercises += r.record.exercises.len() as u32;
        self.time_ms += r.record.total_time_ms;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// ISO week containing `today`.
    pub week: Bucket,
    /// Calendar month containing `today`.
    pub month: Bucket,
    pub total: Bucket,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekBucket {
    /// Monday of the week.
    pub week_start: NaiveDate,
    #[serde(flatten)]
    pub bucket: Bucket,
}

/// One entry per completed session in the current week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekLogEntry {
    pub date: NaiveDate,
    pub category: Option<String>,
    pub time_ms: u64,
}

pub fn week_start(day: NaiveDate) -> NaiveDate {
    day - Days::new(day.weekday().num_days_from_monday() as u64)
}

pub fn summarize(records: &[StoredTrainingRecord], today: NaiveDate) -> Summary {
    let this_week = today.iso_week();
    let mut summary = Summary::default();

    for r in records {
        let day = r.record.date.date_naive();
        if day.iso_week() == this_week {
            summary.week.add(r);
        }
        if day.year() == today.year() && day.month() == today.month() {
            summary.month.add(r);
        }
        summary.total.add(r);
    }
    summary
}

/// The last `weeks` weeks up to and including the one containing `today`,
/// oldest first. Weeks without sessions are present with zero counts.
pub fn weekly_breakdown(
    records: &[StoredTrainingRecord],
    weeks: u32,
    today: NaiveDate,
) -> Vec<WeekBucket> {
    let current = week_start(today);
    let grouped = records
        .iter()
        .into_group_map_by(|r| week_start(r.record.date.date_naive()));

    (0..weeks as u64)
        .rev()
        .filter_map(|back| current.checked_sub_days(Days::new(back * 7)))
        .map(|start| {
            let mut bucket = Bucket::default();
            for r in grouped.get(&start).into_iter().flatten() {
                bucket.add(r);
            }
            WeekBucket {
                week_start: start,
                bucket,
            }
        })
        .collect()
}

/// Sessions of the week containing `today`, in date order.
pub fn week_log(records: &[StoredTrainingRecord], today: NaiveDate) -> Vec<WeekLogEntry> {
    let this_week = today.iso_week();
    records
        .iter()
        .filter(|r| r.record.date.date_naive().iso_week() == this_week)
        .sorted_by_key(|r| r.record.date)
        .map(|r| WeekLogEntry {
            date: r.record.date.date_naive(),
            category: r.record.category.clone(),
            time_ms: r.record.total_time_ms,
        })
        .collect()
}
