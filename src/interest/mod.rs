pub mod accrual;

use crate::decimal::Money;

pub use accrual::{days_in_year, is_leap_year, AccrualEngine, DayCountConvention};

/// interest calculation result
#[derive(Debug, Clone, PartialEq)]
pub struct InterestCalculation {
    pub interest_amount: Money,
    pub days: u32,
    pub year_basis: u32,
}
