pub mod config;
pub mod decimal;
pub mod errors;
pub mod interest;
pub mod payments;
pub mod report;
pub mod types;

// re-export key types
pub use config::{LoanSpec, LoanSpecBuilder, ScheduleConfig};
pub use decimal::{Money, Rate};
pub use errors::{Result, ScheduleError};
pub use interest::{AccrualEngine, DayCountConvention, InterestCalculation};
pub use payments::{AmortizationEngine, Period, Repayment, RepaymentIndex, RunningTotal};
pub use report::{OutputFormat, ScheduleReport};
pub use types::{ReamortizationPolicy, RepaymentGoal};

// re-export external dependencies that users will need
pub use chrono;
pub use rust_decimal::Decimal;
