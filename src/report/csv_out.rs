use std::io::Write;

use super::ScheduleReport;
use crate::errors::Result;

/// Write one CSV record per period, header row first.
pub fn write_csv<W: Write>(report: &ScheduleReport, out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for row in report.rows() {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
