use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;

use tracing::info;
use valora::config::AppConfig;
use valora::error::AppError;
use valora::telemetry;
use valora::valuation::{valuate_csv, valuate_json, BatchReport, ValuationService};

#[derive(Debug)]
pub(crate) enum ValuateArgs {
    Csv(PathBuf),
    Json(PathBuf),
}

pub(crate) fn run_valuate(args: ValuateArgs) -> Result<(), AppError> {
    let service = batch_service()?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match args {
        ValuateArgs::Csv(path) => {
            let file = BufReader::new(File::open(&path)?);
            let report = valuate_csv(&service, file)?;
            info!(path = %path.display(), rows = report.rows.len(), "csv batch valued");
            write_report(&mut out, &report)?;
        }
        ValuateArgs::Json(path) => {
            let file = BufReader::new(File::open(&path)?);
            let response = valuate_json(&service, file)?;
            info!(path = %path.display(), method = %response.method, "json request valued");
            writeln!(out, "{}", serde_json::to_string_pretty(&response)?)?;
        }
    }
    Ok(())
}

/// Loads configuration and installs the log subscriber before any row is valued.
fn batch_service() -> Result<ValuationService, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    Ok(ValuationService::new(config.valuation.cache_ttl))
}

pub(crate) fn write_report(out: &mut impl Write, report: &BatchReport) -> io::Result<()> {
    for row in &report.rows {
        match &row.result {
            Ok(response) => writeln!(
                out,
                "row {:>4}  {:<16} {:>12.2} {}  [{:.2} - {:.2}]",
                row.row,
                response.method,
                response.estimate,
                response.currency,
                response.interval_low,
                response.interval_high,
            )?,
            Err(err) => writeln!(out, "row {:>4}  failed: {err}", row.row)?,
        }
    }

    let summary = report.summary();
    writeln!(
        out,
        "processed {} rows: {} succeeded, {} failed",
        summary.processed, summary.succeeded, summary.failed
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::Duration;

    #[test]
    fn report_lists_each_row_and_a_summary() {
        let service = ValuationService::new(Duration::from_secs(60));
        let csv = "class,address,living_area_sqft\nreal_estate,9 Pine Rd,2000\nyacht,,\n";
        let report = valuate_csv(&service, Cursor::new(csv)).expect("csv parses");

        let mut out = Vec::new();
        write_report(&mut out, &report).expect("writes");
        let text = String::from_utf8(out).expect("utf8");

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("baseline_gbr_v0"));
        assert!(lines[0].contains("450000.00"));
        assert!(lines[1].contains("Unsupported asset class: yacht"));
        assert_eq!(lines[2], "processed 2 rows: 1 succeeded, 1 failed");
    }

    #[test]
    fn batch_runs_install_the_log_subscriber() {
        batch_service().expect("batch service builds");
        assert!(tracing::dispatcher::has_been_set());
    }
}
