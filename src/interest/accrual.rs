use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::decimal::{Money, Rate};
use crate::interest::InterestCalculation;

/// day count convention for interest calculations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayCountConvention {
    /// actual days / 365
    Actual365,
    /// actual days / 360
    Actual360,
    /// 30 days per month / 360 days per year
    Thirty360,
    /// actual days / actual days in year (handles leap years)
    #[default]
    ActualActual,
}

/// engine for accruing interest over a billing period
#[derive(Debug, Clone, Copy)]
pub struct AccrualEngine {
    pub convention: DayCountConvention,
}

impl AccrualEngine {
    pub fn new(convention: DayCountConvention) -> Self {
        Self { convention }
    }

    /// calculate days between dates based on convention, end exclusive
    pub fn calculate_days(&self, start: NaiveDate, end: NaiveDate) -> u32 {
        match self.convention {
            DayCountConvention::Actual365
            | DayCountConvention::Actual360
            | DayCountConvention::ActualActual => (end - start).num_days().max(0) as u32,
            DayCountConvention::Thirty360 => self.days_30_360(start, end),
        }
    }

    /// calculate 30/360 days between dates
    fn days_30_360(&self, start: NaiveDate, end: NaiveDate) -> u32 {
        let y1 = start.year();
        let y2 = end.year();
        let m1 = start.month() as i32;
        let m2 = end.month() as i32;
        let d1 = start.day().min(30) as i32;
        let d2 = if d1 == 30 { end.day().min(30) as i32 } else { end.day() as i32 };

        let days = 360 * (y2 - y1) + 30 * (m2 - m1) + (d2 - d1);
        days.max(0) as u32
    }

    /// get year basis for the convention
    pub fn year_basis(&self, year: i32) -> u32 {
        match self.convention {
            DayCountConvention::Actual365 => 365,
            DayCountConvention::Actual360 | DayCountConvention::Thirty360 => 360,
            DayCountConvention::ActualActual => days_in_year(year),
        }
    }

    /// calculate simple interest (no compounding)
    pub fn calculate_simple_interest(
        &self,
        principal: Money,
        annual_rate: Rate,
        days: u32,
        year_basis: u32,
    ) -> Money {
        // multiply before dividing so 30/360 periods land exactly on rate / 12
        let interest = principal.as_decimal() * annual_rate.as_decimal() * Decimal::from(days)
            / Decimal::from(year_basis);
        Money::from_decimal(interest)
    }

    /// interest accrued on `principal` over [start, end), year basis taken from the start year
    pub fn accrue(
        &self,
        principal: Money,
        annual_rate: Rate,
        start: NaiveDate,
        end: NaiveDate,
    ) -> InterestCalculation {
        let days = self.calculate_days(start, end);
        let year_basis = self.year_basis(start.year());

        InterestCalculation {
            interest_amount: self.calculate_simple_interest(principal, annual_rate, days, year_basis),
            days,
            year_basis,
        }
    }
}

/// 366 for leap years, otherwise 365
pub fn days_in_year(year: i32) -> u32 {
    if is_leap_year(year) {
        366
    } else {
        365
    }
}

/// check if year is a leap year
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}
