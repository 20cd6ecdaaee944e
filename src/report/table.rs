use std::io::Write;

use tabled::builder::Builder;
use tabled::settings::{Alignment, Style};

use super::format::format_money;
use super::{ScheduleReport, COLUMNS};
use crate::errors::Result;
use crate::payments::Period;

fn cells(period: &Period) -> [String; 8] {
    [
        period.start_date.to_string(),
        period.end_date.to_string(),
        format_money(period.scheduled_payment_amount),
        format_money(period.interest_amount),
        format_money(period.principal_amount),
        format_money(period.extra_repayment_amount),
        format_money(period.remaining_balance),
        format_money(period.total_paid_amount),
    ]
}

/// Write the schedule as a borderless, centered text table followed by the
/// total interest footer.
pub fn write_table<W: Write>(report: &ScheduleReport, mut out: W) -> Result<()> {
    let mut builder = Builder::default();
    builder.push_record(COLUMNS);
    for period in report.periods() {
        builder.push_record(cells(period));
    }

    let mut table = builder.build();
    table.with(Style::blank()).with(Alignment::center());
    let rendered = table.to_string();
    let width = rendered.lines().map(|line| line.chars().count()).max().unwrap_or(0);

    writeln!(out, "{rendered}")?;
    writeln!(out, "{}", "-".repeat(width))?;
    writeln!(out, "Total interest amount: {}", format_money(report.total_interest()))?;
    out.flush()?;
    Ok(())
}
