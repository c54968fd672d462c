//! Offline valuation of CSV or JSON files, bypassing the job queue.

use std::collections::HashMap;
use std::io::Read;

use serde_json::{Map, Value};

use super::schema::{
    AssetClass, JobProgress, UnsupportedAssetClass, ValuationAttributes, ValuationRequest,
    ValuationResponse,
};
use super::service::ValuationService;

const CLASS_COLUMN: &str = "class";

#[derive(Debug, thiserror::Error)]
pub enum BatchRowError {
    #[error("missing 'class' column")]
    MissingClass,
    #[error(transparent)]
    UnsupportedAssetClass(#[from] UnsupportedAssetClass),
    #[error("invalid attributes: {0}")]
    InvalidAttributes(#[from] serde_json::Error),
}

/// Result for one input row. `row` is 1-based and excludes the header.
#[derive(Debug)]
pub struct BatchRowOutcome {
    pub row: usize,
    pub result: Result<ValuationResponse, BatchRowError>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub rows: Vec<BatchRowOutcome>,
}

impl BatchReport {
    pub fn summary(&self) -> JobProgress {
        let succeeded = self.rows.iter().filter(|row| row.result.is_ok()).count() as u64;
        let total = self.rows.len() as u64;
        JobProgress {
            processed: total,
            total,
            succeeded,
            failed: total - succeeded,
        }
    }
}

/// Values every CSV row. Row level problems are recorded, malformed CSV aborts.
pub fn valuate_csv<R: Read>(
    service: &ValuationService,
    reader: R,
) -> Result<BatchReport, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut report = BatchReport::default();

    for (index, record) in csv_reader.deserialize::<HashMap<String, String>>().enumerate() {
        let row = record?;
        report.rows.push(BatchRowOutcome {
            row: index + 1,
            result: row_request(row).map(|request| service.valuate(&request)),
        });
    }

    Ok(report)
}

/// Values a single JSON encoded request.
pub fn valuate_json<R: Read>(
    service: &ValuationService,
    reader: R,
) -> Result<ValuationResponse, serde_json::Error> {
    let request: ValuationRequest = serde_json::from_reader(reader)?;
    Ok(service.valuate(&request))
}

fn row_request(mut row: HashMap<String, String>) -> Result<ValuationRequest, BatchRowError> {
    let class: AssetClass = row
        .remove(CLASS_COLUMN)
        .filter(|value| !value.is_empty())
        .ok_or(BatchRowError::MissingClass)?
        .parse()?;

    let attributes: Map<String, Value> = row
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| (key, Value::String(value)))
        .collect();
    let attributes: ValuationAttributes = serde_json::from_value(Value::Object(attributes))?;

    Ok(ValuationRequest::new(class, attributes))
}
