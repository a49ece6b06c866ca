use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::app::ports::HttpClientPort;
use crate::constants::{ECDC_SOURCE, WORLD_AGGREGATE};
use crate::decoder::{ColumnMap, CsvDecoder, DecodedRow, FromDecodedRow, RawCsvProfile};
use crate::error::Result;

/// One row of the epidemiological feed.
///
/// Counts are `f64` so a malformed field can carry the `NaN` sentinel.
/// `total_cases`/`total_deaths` are cumulative per location; that is
/// assumed of the source, not checked.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesRecord {
    pub date: Option<NaiveDate>,
    pub location: String,
    pub new_cases: f64,
    pub new_deaths: f64,
    pub total_cases: f64,
    pub total_deaths: f64,
}

impl FromDecodedRow for TimeSeriesRecord {
    fn from_row(row: DecodedRow) -> Self {
        Self {
            date: row.date("date"),
            location: row.text("location").unwrap_or_default().to_string(),
            new_cases: row.number_or_nan("newCases"),
            new_deaths: row.number_or_nan("newDeaths"),
            total_cases: row.number_or_nan("totalCases"),
            total_deaths: row.number_or_nan("totalDeaths"),
        }
    }
}

/// Which feed rows are kept.
///
/// Rows with an absent or empty location are always dropped. Rows whose
/// location matches one of `excluded` (case-insensitive) are dropped too;
/// the default excludes the `"World"` aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationFilter {
    excluded: Vec<String>,
}

impl Default for LocationFilter {
    fn default() -> Self {
        Self::excluding([WORLD_AGGREGATE])
    }
}

impl LocationFilter {
    /// Keep every row that has a location
    pub fn none() -> Self {
        Self {
            excluded: Vec::new(),
        }
    }

    pub fn excluding<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            excluded: names
                .into_iter()
                .map(|s| s.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn keeps(&self, location: &str) -> bool {
        if location.is_empty() {
            return false;
        }
        let lowered = location.to_lowercase();
        !self.excluded.iter().any(|e| *e == lowered)
    }
}

/// Adapter for the ECDC daily cases/deaths CSV
pub struct EcdcSource {
    http: Arc<dyn HttpClientPort>,
    url: String,
    filter: LocationFilter,
}

impl EcdcSource {
    pub fn new(http: Arc<dyn HttpClientPort>, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            filter: LocationFilter::default(),
        }
    }

    pub fn with_filter(mut self, filter: LocationFilter) -> Self {
        self.filter = filter;
        self
    }

    /// `date, location, newCases, newDeaths, totalCases, totalDeaths` with a header line
    pub fn profile() -> RawCsvProfile {
        RawCsvProfile::new(true)
            .with_column(ColumnMap::date(0, "date"))
            .with_column(ColumnMap::text(1, "location"))
            .with_column(ColumnMap::number(2, "newCases"))
            .with_column(ColumnMap::number(3, "newDeaths"))
            .with_column(ColumnMap::number(4, "totalCases"))
            .with_column(ColumnMap::number(5, "totalDeaths"))
    }

    #[instrument(skip(self), fields(source = ECDC_SOURCE, url = %self.url))]
    pub async fn fetch(&self) -> Result<Vec<TimeSeriesRecord>> {
        let resp = self.http.get(&self.url).await?;
        debug!(
            status = resp.status,
            content_type = %resp.content_type,
            "EcdcSource: fetched {} bytes",
            resp.bytes.len()
        );
        self.decode(&resp.bytes)
    }

    /// Decode a fetched payload and apply the location filter
    pub fn decode(&self, bytes: &[u8]) -> Result<Vec<TimeSeriesRecord>> {
        decode_feed(bytes, &self.filter)
    }
}

/// Decode feed bytes with the fixed profile, keeping rows `filter` accepts
pub fn decode_feed(bytes: &[u8], filter: &LocationFilter) -> Result<Vec<TimeSeriesRecord>> {
    let decoder = CsvDecoder::<TimeSeriesRecord>::new(EcdcSource::profile())?;
    let decoded = decoder.decode_bytes(ECDC_SOURCE, bytes)?;
    let total = decoded.len();

    let records: Vec<TimeSeriesRecord> = decoded
        .into_iter()
        .filter(|r| filter.keeps(&r.location))
        .collect();

    info!(
        "EcdcSource: decoded={} kept={} dropped={}",
        total,
        records.len(),
        total - records.len()
    );
    Ok(records)
}
