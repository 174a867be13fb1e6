//! Dashboard figures derived from a user's weight history.

use chrono::{Local, NaiveDate};

use crate::error::ValidationError;
use crate::models::{validate_samples, ChartPoint, DashboardStats, Measurement};
use crate::units::round1;
use crate::weekly::{previous_week_start, week_start, weekly_buckets};

/// Compute the four dashboard figures as of `today`.
///
/// `goal` does not feed any of the figures; it is accepted so callers can pass
/// the profile straight through. When `start_date` is set but no sample exists
/// on that day, `total_change` is `None` rather than measured from the
/// earliest sample. `total_change` and `weight_change_week` are rounded to
/// one decimal; `weekly_average` is left exact.
pub fn dashboard_stats<T>(
    samples: &[T],
    _goal: Option<f64>,
    start_date: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<DashboardStats, ValidationError>
where
    T: Measurement + Clone,
{
    validate_samples(samples)?;

    let Some(latest) = samples.iter().max_by_key(|s| s.date()) else {
        return Ok(DashboardStats::default());
    };
    let current_weight = latest.value();

    let baseline = match start_date {
        Some(date) => samples.iter().find(|s| s.date() == date),
        None => samples.iter().min_by_key(|s| s.date()),
    };
    let total_change = baseline.map(|b| round1(current_weight - b.value()));

    let (Some(this_week), Some(last_week)) = (week_start(today), previous_week_start(today))
    else {
        return Err(ValidationError::DateOutOfRange(today));
    };
    let buckets = weekly_buckets(samples)?;
    let average_of = |start: NaiveDate| {
        buckets
            .iter()
            .find(|b| b.week_start == start)
            .map(|b| b.average)
    };
    let weight_change_week = match (average_of(this_week), average_of(last_week)) {
        (Some(current), Some(previous)) => Some(round1(current - previous)),
        _ => None,
    };

    let current_values: Vec<f64> = samples
        .iter()
        .filter(|s| week_start(s.date()) == Some(this_week))
        .map(Measurement::value)
        .collect();
    let weekly_average = if current_values.is_empty() {
        None
    } else {
        Some(current_values.iter().sum::<f64>() / current_values.len() as f64)
    };

    Ok(DashboardStats {
        current_weight: Some(current_weight),
        weight_change_week,
        total_change,
        weekly_average,
    })
}

/// [`dashboard_stats`] evaluated against the local calendar day.
pub fn dashboard_stats_now<T>(
    samples: &[T],
    goal: Option<f64>,
    start_date: Option<NaiveDate>,
) -> Result<DashboardStats, ValidationError>
where
    T: Measurement + Clone,
{
    dashboard_stats(samples, goal, start_date, Local::now().date_naive())
}

/// How close the current weight sits to the goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalProximity {
    NoGoal,
    /// Within 2% of the goal
    OnTarget,
    /// Within 5% of the goal
    Close,
    Far,
}

pub fn goal_proximity(current: f64, goal: Option<f64>) -> GoalProximity {
    let Some(goal) = goal.filter(|g| *g > 0.0) else {
        return GoalProximity::NoGoal;
    };
    let percentage = (current - goal).abs() / goal * 100.0;
    if percentage < 2.0 {
        GoalProximity::OnTarget
    } else if percentage < 5.0 {
        GoalProximity::Close
    } else {
        GoalProximity::Far
    }
}

/// Kilograms still to lose (positive) or gain (negative) to reach the goal.
pub fn remaining_to_goal(current: Option<f64>, goal: Option<f64>) -> Option<f64> {
    Some(round1(current? - goal?))
}

/// Points for the progress chart, oldest first.
pub fn chart_series<T: Measurement>(samples: &[T], goal: Option<f64>) -> Vec<ChartPoint> {
    let mut points: Vec<ChartPoint> = samples
        .iter()
        .map(|s| ChartPoint {
            date: s.date(),
            weight: s.value(),
            goal,
        })
        .collect();
    points.sort_by_key(|p| p.date);
    points
}

/// Distinct sample dates, newest first, offered as total-change baselines.
pub fn start_date_options<T: Measurement>(samples: &[T]) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = samples.iter().map(Measurement::date).collect();
    dates.sort_unstable_by(|a, b| b.cmp(a));
    dates.dedup();
    dates
}

/// The sample recorded on `date`, if any.
pub fn find_by_date<T: Measurement>(samples: &[T], date: NaiveDate) -> Option<&T> {
    samples.iter().find(|s| s.date() == date)
}
