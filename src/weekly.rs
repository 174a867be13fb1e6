//! Monday-start calendar week bucketing.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate};

use crate::error::ValidationError;
use crate::models::{validate_samples, Measurement, WeekBucket};
use crate::units::round1;

/// Monday on or before `date`. Sunday belongs to the week started six days earlier.
///
/// `None` when that Monday falls before the first representable date.
pub fn week_start(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_sub_days(Days::new(u64::from(
        date.weekday().num_days_from_monday(),
    )))
}

/// Sunday closing the week that contains `date`.
pub fn week_end(date: NaiveDate) -> Option<NaiveDate> {
    week_start(date)?.checked_add_days(Days::new(6))
}

/// Monday of the week before the one containing `date`.
pub fn previous_week_start(date: NaiveDate) -> Option<NaiveDate> {
    week_start(date)?.checked_sub_days(Days::new(7))
}

/// Group samples into calendar weeks, most recent week first.
///
/// Members of each bucket are copies of the input sorted newest first; the
/// input slice itself is left untouched.
pub fn weekly_buckets<T>(samples: &[T]) -> Result<Vec<WeekBucket<T>>, ValidationError>
where
    T: Measurement + Clone,
{
    validate_samples(samples)?;

    let mut weeks: BTreeMap<NaiveDate, Vec<T>> = BTreeMap::new();
    for sample in samples {
        let start = week_start(sample.date())
            .ok_or(ValidationError::DateOutOfRange(sample.date()))?;
        weeks.entry(start).or_default().push(sample.clone());
    }

    let mut buckets = Vec::with_capacity(weeks.len());
    for (start, mut members) in weeks.into_iter().rev() {
        let end = week_end(start).ok_or(ValidationError::DateOutOfRange(start))?;
        members.sort_by(|a, b| b.date().cmp(&a.date()));
        let total: f64 = members.iter().map(Measurement::value).sum();
        let count = members.len();
        buckets.push(WeekBucket {
            week_start: start,
            week_end: end,
            average: round1(total / count as f64),
            count,
            members,
        });
    }
    Ok(buckets)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekKind {
    Current,
    Previous,
    Past,
}

/// Classify a bucket's `week_start` relative to `today`.
///
/// Weeks after the current one (future-dated samples) count as `Past`; they
/// are labelled by their date range like any other week.
pub fn classify_week(bucket_start: NaiveDate, today: NaiveDate) -> WeekKind {
    if week_start(today) == Some(bucket_start) {
        WeekKind::Current
    } else if previous_week_start(today) == Some(bucket_start) {
        WeekKind::Previous
    } else {
        WeekKind::Past
    }
}

pub fn is_current_week(bucket_start: NaiveDate, today: NaiveDate) -> bool {
    classify_week(bucket_start, today) == WeekKind::Current
}

pub fn is_previous_week(bucket_start: NaiveDate, today: NaiveDate) -> bool {
    classify_week(bucket_start, today) == WeekKind::Previous
}

/// `"12 Jan - 18 Jan"`, or `"28 Jan - 3 Feb"` across a month boundary.
pub fn format_week_range(start: NaiveDate, end: NaiveDate) -> String {
    format!("{} - {}", start.format("%-d %b"), end.format("%-d %b"))
}

/// Header text for a week: `"This week"`, `"Last week"` or its date range.
pub fn week_label(bucket_start: NaiveDate, today: NaiveDate) -> String {
    match classify_week(bucket_start, today) {
        WeekKind::Current => "This week".to_string(),
        WeekKind::Previous => "Last week".to_string(),
        WeekKind::Past => {
            let end = bucket_start
                .checked_add_days(Days::new(6))
                .unwrap_or(NaiveDate::MAX);
            format_week_range(bucket_start, end)
        }
    }
}
