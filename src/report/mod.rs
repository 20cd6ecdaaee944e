pub mod csv_out;
pub mod format;
pub mod json;
pub mod table;

use std::io::Write;

use chrono::NaiveDate;
use clap::ValueEnum;
use log::debug;
use serde::Serialize;

use crate::config::LoanSpec;
use crate::decimal::Money;
use crate::errors::Result;
use crate::payments::{AmortizationEngine, Period, RepaymentIndex, RunningTotal};

pub use format::format_money;

/// how a finished schedule is written out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

/// column names shared by every output format
pub const COLUMNS: [&str; 8] = [
    "start_date",
    "end_date",
    "scheduled_payment_amount",
    "interest_amount",
    "principal_amount",
    "extra_repayment_amount",
    "remaining_balance",
    "total_paid_amount",
];

/// a fully materialized schedule plus its final running totals
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleReport {
    periods: Vec<Period>,
    total: RunningTotal,
}

impl ScheduleReport {
    /// drain a period stream, keeping the totals of the last record
    pub fn collect<I>(stream: I) -> Self
    where
        I: IntoIterator<Item = (Period, RunningTotal)>,
    {
        let mut periods = Vec::new();
        let mut total = RunningTotal::default();
        for (period, running) in stream {
            periods.push(period);
            total = running;
        }
        debug!("collected {} schedule records", periods.len());
        Self { periods, total }
    }

    /// run the engine for a loan and collect the result
    pub fn generate(loan: &LoanSpec, repayments: RepaymentIndex) -> Result<Self> {
        let engine = AmortizationEngine::new(loan, repayments)?;
        Ok(Self::collect(engine))
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    pub fn total(&self) -> &RunningTotal {
        &self.total
    }

    pub fn total_interest(&self) -> Money {
        self.total.cumulative_interest_amount
    }

    /// serializable projection of the periods, money as plain numbers
    pub fn rows(&self) -> Vec<PeriodRow> {
        self.periods.iter().map(PeriodRow::from).collect()
    }

    pub fn render<W: Write>(&self, format: OutputFormat, out: W) -> Result<()> {
        match format {
            OutputFormat::Table => table::write_table(self, out),
            OutputFormat::Json => json::write_json(self, out),
            OutputFormat::Csv => csv_out::write_csv(self, out),
        }
    }
}

/// one output row; field order matches [`COLUMNS`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodRow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(serialize_with = "format::money_as_number")]
    pub scheduled_payment_amount: Money,
    #[serde(serialize_with = "format::money_as_number")]
    pub interest_amount: Money,
    #[serde(serialize_with = "format::money_as_number")]
    pub principal_amount: Money,
    #[serde(serialize_with = "format::money_as_number")]
    pub extra_repayment_amount: Money,
    #[serde(serialize_with = "format::money_as_number")]
    pub remaining_balance: Money,
    #[serde(serialize_with = "format::money_as_number")]
    pub total_paid_amount: Money,
}

impl From<&Period> for PeriodRow {
    fn from(period: &Period) -> Self {
        Self {
            start_date: period.start_date,
            end_date: period.end_date,
            scheduled_payment_amount: period.scheduled_payment_amount,
            interest_amount: period.interest_amount,
            principal_amount: period.principal_amount,
            extra_repayment_amount: period.extra_repayment_amount,
            remaining_balance: period.remaining_balance,
            total_paid_amount: period.total_paid_amount,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use crate::interest::DayCountConvention;

    /// 1200 over 3 months at 12%, aligned 30/360 dates
    pub(crate) fn small_report() -> ScheduleReport {
        let loan = LoanSpec::builder()
            .start_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
            .amount(Money::from_major(1_200))
            .term_months(3)
            .rate_percent(dec!(12))
            .payment_day(1)
            .day_count_convention(DayCountConvention::Thirty360)
            .build()
            .unwrap();
        ScheduleReport::generate(&loan, RepaymentIndex::default()).unwrap()
    }

    #[test]
    fn test_collect_keeps_last_total() {
        let report = small_report();

        assert_eq!(report.periods().len(), 4);
        assert!(report.periods()[0].is_baseline());
        assert_eq!(report.periods().last().unwrap().remaining_balance, Money::ZERO);

        let interest: Money = report.periods().iter().map(|p| p.interest_amount).sum();
        assert_eq!(report.total_interest(), interest);
        assert_eq!(
            report.total().cumulative_principal_amount,
            Money::from_major(1_200)
        );
    }

    #[test]
    fn test_collect_empty_stream() {
        let report = ScheduleReport::collect(Vec::new());
        assert!(report.periods().is_empty());
        assert_eq!(report.total(), &RunningTotal::default());
    }

    #[test]
    fn test_rows_follow_periods() {
        let report = small_report();
        let rows = report.rows();

        assert_eq!(rows.len(), report.periods().len());
        assert_eq!(rows[1].start_date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(rows[1].end_date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(rows[1].interest_amount, Money::from_major(12));
    }
}
