use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use loan_schedule_rs::{AmortizationEngine, OutputFormat, ScheduleConfig, ScheduleReport};

/// Amortization schedules for installment loans with extra repayments
#[derive(Parser)]
#[command(
    name = "amortize",
    version,
    about = "Amortization schedules for installment loans with extra repayments",
    long_about = "Reads a loan and its extra repayments from a TOML (or JSON) file and prints \
                  the resulting month-by-month schedule. Set RUST_LOG=debug to trace \
                  every period."
)]
struct Cli {
    /// Loan configuration file (.toml, or .json)
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Write to this file instead of stdout ("-" for stdout)
    #[arg(short, long, default_value = "-")]
    output: String,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = ScheduleConfig::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    let (loan, repayments) = config
        .into_parts()
        .context("invalid loan configuration")?;

    let engine = AmortizationEngine::new(&loan, repayments).context("cannot build schedule")?;
    let report = ScheduleReport::collect(engine);
    info!(
        "{} periods, total interest {}",
        report.periods().len().saturating_sub(1),
        report.total_interest()
    );

    if cli.output == "-" {
        let stdout = io::stdout();
        report.render(cli.format, stdout.lock())?;
    } else {
        let file = File::create(&cli.output)
            .with_context(|| format!("failed to create {}", cli.output))?;
        let mut writer = BufWriter::new(file);
        report.render(cli.format, &mut writer)?;
        writer.flush()?;
        info!("schedule written to {}", cli.output);
    }

    Ok(())
}
