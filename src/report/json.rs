use std::io::Write;

use serde::Serialize;

use super::format::money_as_number;
use super::{PeriodRow, ScheduleReport};
use crate::decimal::Money;
use crate::errors::Result;

#[derive(Serialize)]
struct ScheduleDocument {
    payments: Vec<PeriodRow>,
    total: TotalSection,
}

#[derive(Serialize)]
struct TotalSection {
    #[serde(serialize_with = "money_as_number")]
    interest_amount: Money,
}

/// Write `{"payments": [...], "total": {"interest_amount": ...}}`, pretty printed.
pub fn write_json<W: Write>(report: &ScheduleReport, mut out: W) -> Result<()> {
    let document = ScheduleDocument {
        payments: report.rows(),
        total: TotalSection {
            interest_amount: report.total_interest(),
        },
    };
    serde_json::to_writer_pretty(&mut out, &document)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
