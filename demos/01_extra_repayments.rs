/// extra repayments - lump sums, budgets and streaming the schedule
use loan_schedule_rs::chrono::NaiveDate;
use loan_schedule_rs::{
    AmortizationEngine, LoanSpec, Money, ReamortizationPolicy, Repayment, RepaymentIndex,
};
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    Ok(NaiveDate::from_ymd_opt(y, m, d).ok_or("bad date")?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 250k mortgage slice over ten years, 4.5%, paid on the 5th
    let loan = LoanSpec::builder()
        .start_date(date(2024, 1, 20)?)
        .amount(Money::from_major(250_000))
        .rate_percent(dec!(4.5))
        .term_months(120)
        .payment_day(5)
        .reamortization(ReamortizationPolicy::SamePeriod)
        .build()?;

    let repayments = RepaymentIndex::build(vec![
        // a bonus lowers every later installment
        Repayment::mandatory(date(2024, 6, 1)?, Money::from_major(20_000)),
        // a period repayment shortens the loan instead
        Repayment::period(date(2025, 1, 5)?, "10000.50".parse()?),
        // from here on, 4000 a month goes to the loan, whatever the installment
        Repayment::period(date(2025, 6, 5)?, Money::from_major(4_000))
            .regular_payment_included(true)
            .override_monthly_budget(true),
    ]);

    let engine = AmortizationEngine::new(&loan, repayments)?;
    println!(
        "scheduled periods: {}, maturity {}",
        engine.scheduled_periods(),
        engine.maturity_date()
    );

    // the engine is an iterator, so periods can be streamed without collecting
    let mut last_total = None;
    for (period, total) in engine {
        if period.is_baseline() {
            continue;
        }
        if period.extra_repayment_amount.is_positive() {
            println!(
                "{}: installment {}, extra {}, balance {}",
                period.end_date,
                period.scheduled_payment_amount.round_dp(2),
                period.extra_repayment_amount.round_dp(2),
                period.remaining_balance.round_dp(2)
            );
        }
        last_total = Some((period.end_date, total));
    }

    if let Some((paid_off, total)) = last_total {
        println!(
            "paid off on {}, total interest {}",
            paid_off,
            total.cumulative_interest_amount.round_dp(2)
        );
    }

    Ok(())
}
