use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::RepaymentGoal;

/// extra payment made on top of (or including) the scheduled installment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repayment {
    pub date: NaiveDate,
    pub amount: Money,
    pub goal: RepaymentGoal,
    /// amount already contains the scheduled installment of its period
    pub regular_payment_included: bool,
    /// amount becomes the new monthly budget from this period on
    pub override_monthly_budget: bool,
}

impl Repayment {
    pub fn new(date: NaiveDate, amount: Money, goal: RepaymentGoal) -> Self {
        Self {
            date,
            amount,
            goal,
            regular_payment_included: false,
            override_monthly_budget: false,
        }
    }

    pub fn mandatory(date: NaiveDate, amount: Money) -> Self {
        Self::new(date, amount, RepaymentGoal::MandatoryPayment)
    }

    pub fn period(date: NaiveDate, amount: Money) -> Self {
        Self::new(date, amount, RepaymentGoal::Period)
    }

    pub fn regular_payment_included(mut self, included: bool) -> Self {
        self.regular_payment_included = included;
        self
    }

    pub fn override_monthly_budget(mut self, override_budget: bool) -> Self {
        self.override_monthly_budget = override_budget;
        self
    }
}

/// repayments grouped by date for period range lookups
#[derive(Debug, Clone, Default)]
pub struct RepaymentIndex {
    by_date: BTreeMap<NaiveDate, Vec<Repayment>>,
}

impl RepaymentIndex {
    /// group repayments by exact date, keeping insertion order within a date
    pub fn build<I>(repayments: I) -> Self
    where
        I: IntoIterator<Item = Repayment>,
    {
        let mut by_date: BTreeMap<NaiveDate, Vec<Repayment>> = BTreeMap::new();
        for repayment in repayments {
            by_date.entry(repayment.date).or_default().push(repayment);
        }
        Self { by_date }
    }

    /// repayments dated in [period_start, period_end), ascending by day
    pub fn lookup(&self, period_start: NaiveDate, period_end: NaiveDate) -> Vec<&Repayment> {
        if period_start >= period_end {
            return Vec::new();
        }

        self.by_date
            .range(period_start..period_end)
            .flat_map(|(_, repayments)| repayments.iter())
            .collect()
    }

    /// total number of indexed repayments
    pub fn len(&self) -> usize {
        self.by_date.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }
}

impl FromIterator<Repayment> for RepaymentIndex {
    fn from_iter<T: IntoIterator<Item = Repayment>>(iter: T) -> Self {
        RepaymentIndex::build(iter)
    }
}
