pub mod amortization;
pub mod repayment;

pub use amortization::{
    annuity_factor, annuity_payment, next_payment_date, AmortizationEngine, Period, RunningTotal,
};
pub use repayment::{Repayment, RepaymentIndex};
