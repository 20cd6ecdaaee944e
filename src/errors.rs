use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::decimal::Money;

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("invalid principal amount: {amount} (must be greater than zero)")]
    InvalidPrincipal {
        amount: Money,
    },

    #[error("invalid term: {months} months (must be greater than zero)")]
    InvalidTerm {
        months: i64,
    },

    #[error("invalid interest rate: {rate}% (must not be negative)")]
    InvalidInterestRate {
        rate: Decimal,
    },

    #[error("invalid payment day of month: {day} (must be between 1 and 31)")]
    InvalidPaymentDay {
        day: i64,
    },

    #[error("invalid monthly budget: {amount} (must not be negative)")]
    InvalidMonthlyBudget {
        amount: Money,
    },

    #[error("unknown repayment goal: {value:?} (expected MANDATORY_PAYMENT or PERIOD)")]
    UnknownRepaymentGoal {
        value: String,
    },

    #[error("invalid date: {message}")]
    InvalidDate {
        message: String,
    },

    #[error("date out of range: {date} plus {months} months")]
    DateOutOfRange {
        date: NaiveDate,
        months: u32,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("failed to parse config {path}: {message}")]
    ConfigParse {
        path: String,
        message: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("render error: {message}")]
    Render {
        message: String,
    },
}

impl From<csv::Error> for ScheduleError {
    fn from(err: csv::Error) -> Self {
        ScheduleError::Render {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ScheduleError {
    fn from(err: serde_json::Error) -> Self {
        ScheduleError::Render {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
