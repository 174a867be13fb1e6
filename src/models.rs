use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::weekly::week_end;

/// Lowest weight the write boundary accepts, in kg.
pub const MIN_WEIGHT_KG: f64 = 20.0;
/// Highest weight the write boundary accepts, in kg.
pub const MAX_WEIGHT_KG: f64 = 500.0;

/// A row of the `weights` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightSample {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    /// Weight in kg
    pub value: f64,
    pub created_at: String,
}

/// A row of the `user_profiles` table. `id` is the auth user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    /// Goal weight in kg
    pub goal_weight: Option<f64>,
    /// Baseline date for the total change figure
    #[serde(default)]
    pub total_change_start_date: Option<NaiveDate>,
    pub created_at: String,
}

/// A weight the user wants to record. Value is in kg.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NewWeight {
    pub date: NaiveDate,
    pub value: f64,
}

impl NewWeight {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_weight_range("weight", self.value)
    }
}

/// Range check shared by weight entries and the goal weight.
pub fn check_weight_range(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || !(MIN_WEIGHT_KG..=MAX_WEIGHT_KG).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            min: MIN_WEIGHT_KG,
            max: MAX_WEIGHT_KG,
        });
    }
    Ok(())
}

/// Anything carrying a calendar day and a weight in kg.
pub trait Measurement {
    fn date(&self) -> NaiveDate;
    fn value(&self) -> f64;
}

impl Measurement for WeightSample {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn value(&self) -> f64 {
        self.value
    }
}

impl Measurement for NewWeight {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn value(&self) -> f64 {
        self.value
    }
}

impl Measurement for (NaiveDate, f64) {
    fn date(&self) -> NaiveDate {
        self.0
    }

    fn value(&self) -> f64 {
        self.1
    }
}

/// Reject the first sample whose value is not a finite positive number, or
/// whose calendar week runs past the representable dates.
pub fn validate_samples<T: Measurement>(samples: &[T]) -> Result<(), ValidationError> {
    for sample in samples {
        let (date, value) = (sample.date(), sample.value());
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteValue { date, value });
        }
        if value <= 0.0 {
            return Err(ValidationError::NonPositiveValue { date, value });
        }
        if week_end(date).is_none() {
            return Err(ValidationError::DateOutOfRange(date));
        }
    }
    Ok(())
}

/// Samples of one Monday-to-Sunday calendar week.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekBucket<T> {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    /// Mean of member values in kg, rounded to one decimal
    pub average: f64,
    pub count: usize,
    /// Newest first
    pub members: Vec<T>,
}

/// Summary figures for the dashboard. `None` means "no data", never zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub current_weight: Option<f64>,
    pub weight_change_week: Option<f64>,
    pub total_change: Option<f64>,
    pub weekly_average: Option<f64>,
}

/// One point of the progress chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub weight: f64,
    pub goal: Option<f64>,
}
