use std::fmt;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;

use crate::decimal::{Money, Rate};
use crate::errors::{Result, ScheduleError};
use crate::interest::DayCountConvention;
use crate::payments::{Repayment, RepaymentIndex};
use crate::types::{ReamortizationPolicy, RepaymentGoal};

/// validated loan terms
#[derive(Debug, Clone, PartialEq)]
pub struct LoanSpec {
    pub start_date: NaiveDate,
    pub principal_amount: Money,
    pub term_months: u32,
    pub annual_rate_percent: Decimal,
    pub payment_day_of_month: u32,
    /// zero disables the implicit default repayment
    pub monthly_budget: Money,
    pub default_repayment_goal: RepaymentGoal,
    pub day_count_convention: DayCountConvention,
    pub reamortization: ReamortizationPolicy,
}

impl LoanSpec {
    pub fn builder() -> LoanSpecBuilder {
        LoanSpecBuilder::new()
    }

    /// annual rate as a fraction
    pub fn annual_rate(&self) -> Rate {
        Rate::from_percent_decimal(self.annual_rate_percent)
    }

    /// check loan parameters, first failure wins
    pub fn validate(&self) -> Result<()> {
        check_terms(
            self.principal_amount,
            self.term_months as i64,
            self.annual_rate_percent,
            self.payment_day_of_month as i64,
            self.monthly_budget,
        )
    }
}

fn check_terms(
    principal_amount: Money,
    term_months: i64,
    annual_rate_percent: Decimal,
    payment_day_of_month: i64,
    monthly_budget: Money,
) -> Result<()> {
    if !principal_amount.is_positive() {
        return Err(ScheduleError::InvalidPrincipal {
            amount: principal_amount,
        });
    }
    if term_months <= 0 {
        return Err(ScheduleError::InvalidTerm { months: term_months });
    }
    if annual_rate_percent < Decimal::ZERO {
        return Err(ScheduleError::InvalidInterestRate {
            rate: annual_rate_percent,
        });
    }
    if !(1..=31).contains(&payment_day_of_month) {
        return Err(ScheduleError::InvalidPaymentDay {
            day: payment_day_of_month,
        });
    }
    if monthly_budget.is_negative() {
        return Err(ScheduleError::InvalidMonthlyBudget {
            amount: monthly_budget,
        });
    }
    Ok(())
}

/// builder for loan terms
#[derive(Debug, Default)]
pub struct LoanSpecBuilder {
    start_date: Option<NaiveDate>,
    principal_amount: Option<Money>,
    term_months: Option<u32>,
    annual_rate_percent: Option<Decimal>,
    payment_day_of_month: Option<u32>,
    monthly_budget: Option<Money>,
    default_repayment_goal: Option<RepaymentGoal>,
    day_count_convention: Option<DayCountConvention>,
    reamortization: Option<ReamortizationPolicy>,
}

impl LoanSpecBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn amount(mut self, amount: Money) -> Self {
        self.principal_amount = Some(amount);
        self
    }

    pub fn term_months(mut self, months: u32) -> Self {
        self.term_months = Some(months);
        self
    }

    pub fn rate_percent(mut self, percent: Decimal) -> Self {
        self.annual_rate_percent = Some(percent);
        self
    }

    pub fn payment_day(mut self, day: u32) -> Self {
        self.payment_day_of_month = Some(day);
        self
    }

    pub fn monthly_budget(mut self, budget: Money) -> Self {
        self.monthly_budget = Some(budget);
        self
    }

    pub fn default_repayment_goal(mut self, goal: RepaymentGoal) -> Self {
        self.default_repayment_goal = Some(goal);
        self
    }

    pub fn day_count_convention(mut self, convention: DayCountConvention) -> Self {
        self.day_count_convention = Some(convention);
        self
    }

    pub fn reamortization(mut self, policy: ReamortizationPolicy) -> Self {
        self.reamortization = Some(policy);
        self
    }

    pub fn build(self) -> Result<LoanSpec> {
        let start_date = self.start_date.ok_or(ScheduleError::InvalidConfiguration {
            message: "Start date required".to_string(),
        })?;

        let principal_amount = self.principal_amount.ok_or(ScheduleError::InvalidConfiguration {
            message: "Amount required".to_string(),
        })?;

        let term_months = self.term_months.ok_or(ScheduleError::InvalidConfiguration {
            message: "Term required".to_string(),
        })?;

        let annual_rate_percent = self.annual_rate_percent.ok_or(ScheduleError::InvalidConfiguration {
            message: "Rate required".to_string(),
        })?;

        let spec = LoanSpec {
            start_date,
            principal_amount,
            term_months,
            annual_rate_percent,
            payment_day_of_month: self.payment_day_of_month.unwrap_or(1),
            monthly_budget: self.monthly_budget.unwrap_or(Money::ZERO),
            default_repayment_goal: self.default_repayment_goal.unwrap_or_default(),
            day_count_convention: self.day_count_convention.unwrap_or_default(),
            reamortization: self.reamortization.unwrap_or_default(),
        };
        spec.validate()?;
        Ok(spec)
    }
}

/// `[loan]` section of a config document
#[derive(Debug, Clone, Deserialize)]
pub struct LoanSection {
    #[serde(deserialize_with = "deserialize_date")]
    pub start_date: NaiveDate,
    pub principal_amount: Money,
    pub term_months: i64,
    pub annual_rate_percent: Decimal,
    pub payment_day_of_month: i64,
    #[serde(default)]
    pub monthly_budget: Money,
    #[serde(default)]
    pub default_repayment_goal: Option<String>,
    #[serde(default)]
    pub day_count_convention: DayCountConvention,
    #[serde(default)]
    pub reamortization: ReamortizationPolicy,
}

impl TryFrom<LoanSection> for LoanSpec {
    type Error = ScheduleError;

    fn try_from(section: LoanSection) -> Result<Self> {
        check_terms(
            section.principal_amount,
            section.term_months,
            section.annual_rate_percent,
            section.payment_day_of_month,
            section.monthly_budget,
        )?;

        let default_repayment_goal = match section.default_repayment_goal.as_deref() {
            Some(goal) => goal.parse()?,
            None => RepaymentGoal::default(),
        };

        let term_months = u32::try_from(section.term_months).map_err(|_| ScheduleError::InvalidTerm {
            months: section.term_months,
        })?;

        // range checked above
        let payment_day_of_month = section.payment_day_of_month as u32;

        Ok(LoanSpec {
            start_date: section.start_date,
            principal_amount: section.principal_amount,
            term_months,
            annual_rate_percent: section.annual_rate_percent,
            payment_day_of_month,
            monthly_budget: section.monthly_budget,
            default_repayment_goal,
            day_count_convention: section.day_count_convention,
            reamortization: section.reamortization,
        })
    }
}

/// one `[[repayment]]` entry of a config document
#[derive(Debug, Clone, Deserialize)]
pub struct RepaymentEntry {
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    pub amount: Money,
    pub goal: String,
    #[serde(default)]
    pub regular_payment_included: bool,
    #[serde(default)]
    pub override_monthly_budget: bool,
}

impl TryFrom<RepaymentEntry> for Repayment {
    type Error = ScheduleError;

    fn try_from(entry: RepaymentEntry) -> Result<Self> {
        let goal: RepaymentGoal = entry.goal.parse()?;
        Ok(Repayment::new(entry.date, entry.amount, goal)
            .regular_payment_included(entry.regular_payment_included)
            .override_monthly_budget(entry.override_monthly_budget))
    }
}

/// config document: loan terms plus optional repayments
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    pub loan: LoanSection,
    #[serde(default, alias = "repayments")]
    pub repayment: Vec<RepaymentEntry>,
}

impl ScheduleConfig {
    /// read a config file, `.json` files are parsed as JSON and everything else as TOML
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let parsed = if is_json {
            Self::from_json_str(&contents)
        } else {
            Self::from_toml_str(&contents)
        };

        parsed.map_err(|err| match err {
            ScheduleError::ConfigParse { message, .. } => ScheduleError::ConfigParse {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|err| ScheduleError::ConfigParse {
            path: "<toml>".to_string(),
            message: err.to_string(),
        })
    }

    pub fn from_json_str(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).map_err(|err| ScheduleError::ConfigParse {
            path: "<json>".to_string(),
            message: err.to_string(),
        })
    }

    /// validate the document and split it into loan terms and an index
    pub fn into_parts(self) -> Result<(LoanSpec, RepaymentIndex)> {
        let loan = LoanSpec::try_from(self.loan)?;
        let repayments = self
            .repayment
            .into_iter()
            .map(Repayment::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok((loan, RepaymentIndex::build(repayments)))
    }
}

/// accepts "YYYY-MM-DD" strings as well as native TOML dates
fn deserialize_date<'de, D>(deserializer: D) -> std::result::Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    struct DateVisitor;

    impl<'de> Visitor<'de> for DateVisitor {
        type Value = NaiveDate;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an ISO-8601 calendar date")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<NaiveDate, E> {
            value
                .parse::<NaiveDate>()
                .map_err(|err| E::custom(format!("invalid date {value:?}: {err}")))
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<NaiveDate, A::Error> {
            // toml hands datetimes over as a single-entry map
            let (_, value): (String, String) = map
                .next_entry()?
                .ok_or_else(|| de::Error::custom("empty date value"))?;
            self.visit_str(&value)
        }
    }

    deserializer.deserialize_any(DateVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SAMPLE: &str = r#"
[loan]
start_date = 2024-01-15
principal_amount = 120000
term_months = 12
annual_rate_percent = 6
payment_day_of_month = 1

[[repayment]]
date = "2024-03-01"
amount = 50000
goal = "MANDATORY_PAYMENT"

[[repayment]]
date = 2024-05-01
amount = "1500.50"
goal = "PERIOD"
regular_payment_included = true
override_monthly_budget = true
"#;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_toml_document() {
        let config = ScheduleConfig::from_toml_str(SAMPLE).unwrap();
        let (loan, index) = config.into_parts().unwrap();

        assert_eq!(loan.start_date, date(2024, 1, 15));
        assert_eq!(loan.principal_amount, Money::from_major(120_000));
        assert_eq!(loan.term_months, 12);
        assert_eq!(loan.annual_rate_percent, dec!(6));
        assert_eq!(loan.payment_day_of_month, 1);
        assert_eq!(loan.monthly_budget, Money::ZERO);
        assert_eq!(loan.default_repayment_goal, RepaymentGoal::MandatoryPayment);
        assert_eq!(loan.day_count_convention, DayCountConvention::ActualActual);
        assert_eq!(loan.reamortization, ReamortizationPolicy::NextPeriod);

        assert_eq!(index.len(), 2);
        let may = index.lookup(date(2024, 5, 1), date(2024, 5, 2));
        assert_eq!(may.len(), 1);
        assert_eq!(may[0].amount, Money::from_str_exact("1500.50").unwrap());
        assert_eq!(may[0].goal, RepaymentGoal::Period);
        assert!(may[0].regular_payment_included);
        assert!(may[0].override_monthly_budget);
    }

    #[test]
    fn test_parse_json_document() {
        let json = r#"{
            "loan": {
                "start_date": "2024-01-01",
                "principal_amount": 10000,
                "term_months": 24,
                "annual_rate_percent": 4.5,
                "payment_day_of_month": 15,
                "monthly_budget": 600,
                "default_repayment_goal": "PERIOD",
                "day_count_convention": "thirty360",
                "reamortization": "same_period"
            },
            "repayments": []
        }"#;

        let (loan, index) = ScheduleConfig::from_json_str(json).unwrap().into_parts().unwrap();
        assert_eq!(loan.annual_rate_percent, dec!(4.5));
        assert_eq!(loan.monthly_budget, Money::from_major(600));
        assert_eq!(loan.default_repayment_goal, RepaymentGoal::Period);
        assert_eq!(loan.day_count_convention, DayCountConvention::Thirty360);
        assert_eq!(loan.reamortization, ReamortizationPolicy::SamePeriod);
        assert!(index.is_empty());
    }

    #[test]
    fn test_unknown_goal_aborts() {
        let doc = SAMPLE.replace("\"PERIOD\"", "\"HOLIDAY\"");
        let err = ScheduleConfig::from_toml_str(&doc)
            .unwrap()
            .into_parts()
            .unwrap_err();
        assert!(matches!(err, ScheduleError::UnknownRepaymentGoal { ref value } if value == "HOLIDAY"));
    }

    #[test]
    fn test_invalid_loan_terms() {
        let doc = SAMPLE.replace("term_months = 12", "term_months = -3");
        let err = ScheduleConfig::from_toml_str(&doc).unwrap().into_parts().unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidTerm { months: -3 }));

        let doc = SAMPLE.replace("term_months = 12", "term_months = 4294967308");
        let err = ScheduleConfig::from_toml_str(&doc).unwrap().into_parts().unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidTerm { months: 4_294_967_308 }));

        let doc = SAMPLE.replace("payment_day_of_month = 1", "payment_day_of_month = 32");
        let err = ScheduleConfig::from_toml_str(&doc).unwrap().into_parts().unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidPaymentDay { day: 32 }));

        let doc = SAMPLE.replace("principal_amount = 120000", "principal_amount = 0");
        let err = ScheduleConfig::from_toml_str(&doc).unwrap().into_parts().unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidPrincipal { .. }));

        let doc = SAMPLE.replace("annual_rate_percent = 6", "annual_rate_percent = -1");
        let err = ScheduleConfig::from_toml_str(&doc).unwrap().into_parts().unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidInterestRate { .. }));
    }

    #[test]
    fn test_malformed_document() {
        let err = ScheduleConfig::from_toml_str("[loan]\nstart_date = \"not a date\"").unwrap_err();
        assert!(matches!(err, ScheduleError::ConfigParse { .. }));
    }

    #[test]
    fn test_builder_defaults_and_validation() {
        let loan = LoanSpec::builder()
            .start_date(date(2024, 1, 1))
            .amount(Money::from_major(5_000))
            .term_months(6)
            .rate_percent(dec!(3))
            .build()
            .unwrap();
        assert_eq!(loan.payment_day_of_month, 1);
        assert_eq!(loan.annual_rate().as_decimal(), dec!(0.03));

        let err = LoanSpec::builder()
            .start_date(date(2024, 1, 1))
            .amount(Money::from_major(5_000))
            .rate_percent(dec!(3))
            .build()
            .unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidConfiguration { .. }));

        let err = LoanSpec::builder()
            .start_date(date(2024, 1, 1))
            .amount(Money::from_major(5_000))
            .term_months(6)
            .rate_percent(dec!(3))
            .monthly_budget(Money::from_major(-1))
            .build()
            .unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidMonthlyBudget { .. }));
    }
}
