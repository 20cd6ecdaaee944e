/// quick start - minimal example to get started
use loan_schedule_rs::chrono::NaiveDate;
use loan_schedule_rs::{LoanSpec, Money, OutputFormat, RepaymentIndex, ScheduleReport};
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // a $10,000 personal loan at 8% over a year, paid on the 1st
    let loan = LoanSpec::builder()
        .start_date(NaiveDate::from_ymd_opt(2024, 1, 15).ok_or("bad date")?)
        .amount(Money::from_major(10_000))
        .rate_percent(dec!(8))
        .term_months(12)
        .payment_day(1)
        .build()?;

    // no extra repayments
    let report = ScheduleReport::generate(&loan, RepaymentIndex::default())?;

    report.render(OutputFormat::Table, std::io::stdout().lock())?;

    Ok(())
}
