use std::iter::FusedIterator;

use chrono::{Datelike, Months, NaiveDate};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::LoanSpec;
use crate::decimal::{Money, Rate};
use crate::errors::{Result, ScheduleError};
use crate::interest::{is_leap_year, AccrualEngine};
use crate::types::{ReamortizationPolicy, RepaymentGoal};

use super::repayment::{Repayment, RepaymentIndex};

/// One billing period of the schedule.
///
/// A period covers `[start_date, end_date)`. Every money field is clamped at
/// zero; on the period that pays the loan off `scheduled_payment_amount` is the
/// interest plus whatever principal was still owed, and `remaining_balance` is
/// zero. The first record of every schedule is a baseline with equal dates and
/// no payments, see [`Period::baseline`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Period {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub scheduled_payment_amount: Money,
    pub interest_amount: Money,
    pub principal_amount: Money,
    pub extra_repayment_amount: Money,
    pub remaining_balance: Money,
    pub total_paid_amount: Money,
}

impl Period {
    /// zero-amount record anchoring the schedule at the loan start
    pub fn baseline(start_date: NaiveDate, principal: Money) -> Self {
        Self {
            start_date,
            end_date: start_date,
            scheduled_payment_amount: Money::ZERO,
            interest_amount: Money::ZERO,
            principal_amount: Money::ZERO,
            extra_repayment_amount: Money::ZERO,
            remaining_balance: principal,
            total_paid_amount: Money::ZERO,
        }
    }

    pub fn is_baseline(&self) -> bool {
        self.start_date == self.end_date
    }
}

/// Cumulative totals after a period.
///
/// `cumulative_interest_amount` never decreases. A copy is emitted with each
/// period, so the last one seen is the total for the whole schedule.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RunningTotal {
    pub cumulative_interest_amount: Money,
    pub cumulative_principal_amount: Money,
    pub cumulative_paid_amount: Money,
}

/// running sum of one repayment category
///
/// Repayments flagged `regular_payment_included` carry the installment inside
/// their amount, so the installment is counted here and only taken off once
/// the installment of the period is final.
#[derive(Debug, Clone, Copy, Default)]
struct CategorySum {
    gross: Money,
    installments_included: u32,
}

impl CategorySum {
    fn add(&mut self, repayment: &Repayment) {
        self.gross += repayment.amount;
        if repayment.regular_payment_included {
            self.installments_included += 1;
        }
    }

    fn net_of(&self, scheduled_payment: Money) -> Money {
        self.gross - scheduled_payment * Decimal::from(self.installments_included)
    }
}

/// per-category sums of the repayments applied in one period
#[derive(Debug, Clone, Copy, Default)]
struct RepaymentSums {
    mandatory: CategorySum,
    period: CategorySum,
    /// sums come from the monthly budget, never below zero
    from_budget: bool,
}

impl RepaymentSums {
    fn add(&mut self, repayment: &Repayment) {
        match repayment.goal {
            RepaymentGoal::MandatoryPayment => self.mandatory.add(repayment),
            RepaymentGoal::Period => self.period.add(repayment),
        }
    }

    /// (mandatory, period) sums against the final installment of the period
    fn resolve(&self, scheduled_payment: Money) -> (Money, Money) {
        let mandatory = self.mandatory.net_of(scheduled_payment);
        let period = self.period.net_of(scheduled_payment);
        if self.from_budget {
            (mandatory.non_negative(), period.non_negative())
        } else {
            (mandatory, period)
        }
    }

    /// Installment sized on the balance left after this period's mandatory
    /// repayments.
    ///
    /// Solves `p = k * (balance - gross + n * p)` for `p`, where `k` is the
    /// annuity factor and `n` the number of mandatory repayments that include
    /// the installment. `None` when no finite installment satisfies it, which
    /// only happens in a final period.
    fn same_period_payment(&self, balance: Money, monthly_rate: Rate, periods: u32) -> Option<Money> {
        let remaining = balance - self.mandatory.gross;
        if !remaining.is_positive() {
            return Some(Money::ZERO);
        }

        let factor = annuity_factor(monthly_rate, periods);
        let denominator = Decimal::ONE - factor * Decimal::from(self.mandatory.installments_included);
        if denominator <= Decimal::ZERO {
            return None;
        }
        Some(Money::from_decimal(remaining.as_decimal() * factor / denominator))
    }
}

/// mutable step context, owned by the engine
#[derive(Debug, Clone)]
struct ScheduleState {
    remaining_balance: Money,
    period_start: NaiveDate,
    period_end: NaiveDate,
    monthly_budget: Money,
    totals: RunningTotal,
    periods_emitted: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Baseline,
    Running,
    Finished,
}

/// lazy producer of schedule periods
///
/// Yields a baseline record followed by one record per billing period until the
/// balance reaches zero or the loan matures. The engine is consumed as it is
/// iterated and cannot be restarted; dropping it early is always fine.
#[derive(Debug, Clone)]
pub struct AmortizationEngine {
    loan: LoanSpec,
    repayments: RepaymentIndex,
    accrual: AccrualEngine,
    maturity_date: NaiveDate,
    total_periods: u32,
    state: ScheduleState,
    phase: Phase,
}

impl AmortizationEngine {
    pub fn new(loan: &LoanSpec, repayments: RepaymentIndex) -> Result<Self> {
        loan.validate()?;

        let maturity_date = loan
            .start_date
            .checked_add_months(Months::new(loan.term_months))
            .ok_or(ScheduleError::DateOutOfRange {
                date: loan.start_date,
                months: loan.term_months,
            })?;

        let first_payment = next_payment_date(loan.start_date, loan.payment_day_of_month)
            .ok_or_else(|| ScheduleError::InvalidDate {
                message: format!("no payment date after {}", loan.start_date),
            })?;

        let total_periods = count_payment_dates(first_payment, maturity_date, loan.payment_day_of_month);

        info!(
            "amortization engine ready: principal {}, rate {}%, {} periods from {} to {}, {} repayments",
            loan.principal_amount,
            loan.annual_rate_percent,
            total_periods,
            loan.start_date,
            maturity_date,
            repayments.len()
        );

        Ok(Self {
            accrual: AccrualEngine::new(loan.day_count_convention),
            maturity_date,
            total_periods,
            state: ScheduleState {
                remaining_balance: loan.principal_amount,
                period_start: loan.start_date,
                period_end: first_payment,
                monthly_budget: loan.monthly_budget,
                totals: RunningTotal::default(),
                periods_emitted: 0,
            },
            phase: Phase::Baseline,
            loan: loan.clone(),
            repayments,
        })
    }

    pub fn maturity_date(&self) -> NaiveDate {
        self.maturity_date
    }

    /// number of billing periods if nothing pays the loan off early
    pub fn scheduled_periods(&self) -> u32 {
        self.total_periods
    }

    fn step(&mut self) -> (Period, RunningTotal) {
        let annual_rate = self.loan.annual_rate();
        let monthly_rate = annual_rate.monthly_rate();
        let remaining_periods = self.total_periods - self.state.periods_emitted;
        let opening_balance = self.state.remaining_balance;
        let (period_start, period_end) = (self.state.period_start, self.state.period_end);

        let accrued = self
            .accrual
            .accrue(opening_balance, annual_rate, period_start, period_end);
        let interest = accrued.interest_amount;

        let sums = collect_repayments(&self.repayments, &self.loan, &mut self.state);

        let mut scheduled_payment = annuity_payment(opening_balance, monthly_rate, remaining_periods);
        if self.loan.reamortization == ReamortizationPolicy::SamePeriod
            && sums.resolve(scheduled_payment).0.is_positive()
        {
            match sums.same_period_payment(opening_balance, monthly_rate, remaining_periods) {
                Some(resized) => scheduled_payment = resized,
                None => debug!("installment of period starting {period_start} left unresized"),
            }
        }
        let (mandatory, period_sum) = sums.resolve(scheduled_payment);

        let mut principal = scheduled_payment - interest;
        let mut balance = opening_balance;
        for (goal, amount) in [
            (RepaymentGoal::MandatoryPayment, mandatory),
            (RepaymentGoal::Period, period_sum),
        ] {
            if amount.is_positive() {
                balance -= amount;
            } else if amount.is_negative() {
                warn!("ignoring negative {goal} repayments of {amount} in period starting {period_start}");
            }
        }
        balance -= principal;

        // payoff, or settlement of any residual at maturity
        let terminal = !balance.is_positive() || remaining_periods <= 1;
        if terminal {
            principal += balance;
            scheduled_payment = interest + principal;
            balance = Money::ZERO;
        }

        let extra_repayment = mandatory.non_negative() + period_sum.non_negative();
        let total_paid = scheduled_payment + extra_repayment;

        let period = Period {
            start_date: period_start,
            end_date: period_end,
            scheduled_payment_amount: scheduled_payment.non_negative(),
            interest_amount: interest.non_negative(),
            principal_amount: principal.non_negative(),
            extra_repayment_amount: extra_repayment,
            remaining_balance: balance,
            total_paid_amount: total_paid.non_negative(),
        };

        let state = &mut self.state;
        state.totals.cumulative_interest_amount += period.interest_amount;
        state.totals.cumulative_principal_amount += period.principal_amount;
        state.totals.cumulative_paid_amount += period.total_paid_amount;
        state.remaining_balance = balance;
        state.periods_emitted += 1;

        debug!(
            "period {} [{} .. {}): payment {}, interest {} ({} days / {}), principal {}, extra {}, balance {}",
            state.periods_emitted,
            period_start,
            period_end,
            period.scheduled_payment_amount,
            period.interest_amount,
            accrued.days,
            accrued.year_basis,
            period.principal_amount,
            period.extra_repayment_amount,
            period.remaining_balance
        );

        // advance to the next billing period
        let next_end = next_payment_date(period_end, self.loan.payment_day_of_month);
        state.period_start = period_end;
        match next_end {
            Some(end) if !terminal && end <= self.maturity_date => state.period_end = end,
            _ => {
                self.phase = Phase::Finished;
                info!(
                    "schedule complete after {} periods, total interest {}",
                    state.periods_emitted, state.totals.cumulative_interest_amount
                );
            }
        }

        (period, state.totals)
    }
}

impl Iterator for AmortizationEngine {
    type Item = (Period, RunningTotal);

    fn next(&mut self) -> Option<Self::Item> {
        match self.phase {
            Phase::Baseline => {
                self.phase = if self.total_periods == 0 {
                    Phase::Finished
                } else {
                    Phase::Running
                };
                let baseline = Period::baseline(self.loan.start_date, self.loan.principal_amount);
                Some((baseline, self.state.totals))
            }
            Phase::Running => Some(self.step()),
            Phase::Finished => None,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self.phase {
            Phase::Baseline => self.total_periods as usize + 1,
            Phase::Running => (self.total_periods - self.state.periods_emitted) as usize,
            Phase::Finished => 0,
        };
        let lower = usize::from(remaining > 0);
        (lower, Some(remaining))
    }
}

impl FusedIterator for AmortizationEngine {}

/// apply the repayments of the current period and return their category sums
fn collect_repayments(index: &RepaymentIndex, loan: &LoanSpec, state: &mut ScheduleState) -> RepaymentSums {
    let dated = index.lookup(state.period_start, state.period_end);
    let mut sums = RepaymentSums::default();

    if dated.is_empty() {
        if let Some(default) = default_repayment(loan, state.monthly_budget) {
            sums.from_budget = true;
            sums.add(&default);
        }
        return sums;
    }

    for repayment in dated {
        if repayment.override_monthly_budget {
            info!(
                "monthly budget changed from {} to {} on {}",
                state.monthly_budget, repayment.amount, repayment.date
            );
            state.monthly_budget = repayment.amount;
        }
        sums.add(repayment);
    }
    sums
}

/// implicit repayment spending whatever the budget leaves after the installment
fn default_repayment(loan: &LoanSpec, monthly_budget: Money) -> Option<Repayment> {
    if !monthly_budget.is_positive() {
        return None;
    }

    Some(
        Repayment::new(loan.start_date, monthly_budget, loan.default_repayment_goal)
            .regular_payment_included(true),
    )
}

/// installment per unit of balance over `periods` at `monthly_rate`
///
/// `k = r * (1 + r)^n / ((1 + r)^n - 1)`, or `1 / n` when the rate is zero.
pub fn annuity_factor(monthly_rate: Rate, periods: u32) -> Decimal {
    if periods == 0 {
        return Decimal::ONE;
    }

    let r = monthly_rate.as_decimal();
    if r.is_zero() {
        return Decimal::ONE / Decimal::from(periods);
    }

    let base = Decimal::ONE + r;
    let mut compound = Decimal::ONE;
    for _ in 0..periods {
        match compound.checked_mul(base) {
            Some(next) => compound = next,
            // (1 + r)^n has outgrown the decimal range, the factor has converged to r
            None => return r,
        }
    }

    // c / (c - 1) is bounded by the term, so the product stays in range
    r * (compound / (compound - Decimal::ONE))
}

/// fixed installment amortizing `balance` over `periods` at `monthly_rate`
pub fn annuity_payment(balance: Money, monthly_rate: Rate, periods: u32) -> Money {
    if periods == 0 {
        return balance;
    }
    if monthly_rate.is_zero() {
        return balance / Decimal::from(periods);
    }
    Money::from_decimal(balance.as_decimal() * annuity_factor(monthly_rate, periods))
}

/// first date strictly after `after` that falls on `payment_day`, clamped to month end
pub fn next_payment_date(after: NaiveDate, payment_day: u32) -> Option<NaiveDate> {
    let candidate = clamped_date(after.year(), after.month(), payment_day)?;
    if candidate > after {
        return Some(candidate);
    }

    let (year, month) = if after.month() == 12 {
        (after.year() + 1, 1)
    } else {
        (after.year(), after.month() + 1)
    };
    clamped_date(year, month, payment_day)
}

fn count_payment_dates(first: NaiveDate, maturity: NaiveDate, payment_day: u32) -> u32 {
    let mut count = 0;
    let mut current = Some(first);
    while let Some(date) = current.filter(|d| *d <= maturity) {
        count += 1;
        current = next_payment_date(date, payment_day);
    }
    count
}

fn clamped_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day.min(days_in_month(year, month)))
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 30,
    }
}
