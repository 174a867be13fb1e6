use chrono::NaiveDate;
use thiserror::Error;

/// Rejection raised by the pure core and the write boundary.
///
/// The engines never skip or coerce a bad sample; the first offending one
/// is reported back to the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("weight on {date} is not a finite number: {value}")]
    NonFiniteValue { date: NaiveDate, value: f64 },
    #[error("weight on {date} must be positive, got {value}")]
    NonPositiveValue { date: NaiveDate, value: f64 },
    #[error("date {0} is too close to the calendar limits to place in a week")]
    DateOutOfRange(NaiveDate),
    #[error("invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("{field} must be between {min} and {max} kg, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("a weight is already recorded for {0}")]
    DuplicateDate(NaiveDate),
    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },
}

/// Parse an ISO calendar date (`YYYY-MM-DD`).
pub fn parse_date(input: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_accepts_iso_days() {
        assert_eq!(
            parse_date("2024-01-07").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 7).unwrap()
        );
        assert_eq!(
            parse_date(" 2024-02-29 ").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert_eq!(
            parse_date("2023-02-29"),
            Err(ValidationError::InvalidDate("2023-02-29".into()))
        );
        assert!(parse_date("07/01/2024").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn messages_name_the_offending_sample() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let err = ValidationError::NonFiniteValue {
            date,
            value: f64::NAN,
        };
        assert_eq!(err.to_string(), "weight on 2024-01-01 is not a finite number: NaN");
    }
}
