use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ScheduleError;

/// category of an extra repayment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepaymentGoal {
    /// reduce principal and shrink future scheduled payments
    #[default]
    MandatoryPayment,
    /// extra payment applied within the period
    Period,
}

impl RepaymentGoal {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepaymentGoal::MandatoryPayment => "MANDATORY_PAYMENT",
            RepaymentGoal::Period => "PERIOD",
        }
    }
}

impl fmt::Display for RepaymentGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RepaymentGoal {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MANDATORY_PAYMENT" => Ok(RepaymentGoal::MandatoryPayment),
            "PERIOD" => Ok(RepaymentGoal::Period),
            other => Err(ScheduleError::UnknownRepaymentGoal {
                value: other.to_string(),
            }),
        }
    }
}

/// when a mandatory repayment starts to shrink the annuity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReamortizationPolicy {
    /// annuity is resized from the period after the repayment
    #[default]
    NextPeriod,
    /// annuity of the receiving period is already sized on the reduced balance
    SamePeriod,
}
