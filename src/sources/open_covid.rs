use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::app::ports::HttpClientPort;
use crate::constants::{OPEN_COVID_CATEGORIES_SOURCE, OPEN_COVID_SOURCE};
use crate::decoder::{ColumnMap, CsvDecoder, DecodedRow, FromDecodedRow, RawCsvProfile};
use crate::error::Result;

/// Daily cumulative counts per country (and optionally region), as served
/// by `data.json` and `data_latest.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OpenCovidRecord {
    pub date: NaiveDate,
    #[serde(default)]
    pub country_code: String,
    #[serde(default)]
    pub country_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_name: Option<String>,
    #[serde(default)]
    pub confirmed: Option<f64>,
    #[serde(default)]
    pub deaths: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub population: Option<f64>,
}

/// A projected [`OpenCovidRecord`]; `forecast_date` is the day the
/// projection was made
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OpenCovidForecastRecord {
    pub forecast_date: NaiveDate,
    #[serde(flatten)]
    pub record: OpenCovidRecord,
}

/// Daily severity breakdown per country (and optionally region)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoriesRecord {
    pub date: Option<NaiveDate>,
    pub country_code: String,
    pub country_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_name: Option<String>,
    pub new_cases: f64,
    pub new_deaths: f64,
    pub new_mild: f64,
    pub new_severe: f64,
    pub new_critical: f64,
    pub currently_mild: f64,
    pub currently_severe: f64,
    pub currently_critical: f64,
}

impl FromDecodedRow for CategoriesRecord {
    fn from_row(row: DecodedRow) -> Self {
        Self {
            date: row.date("Date"),
            country_code: row.text("CountryCode").unwrap_or_default().to_string(),
            country_name: row.text("CountryName").unwrap_or_default().to_string(),
            region_code: row.non_empty_text("RegionCode"),
            region_name: row.non_empty_text("RegionName"),
            new_cases: row.number_or_nan("NewCases"),
            new_deaths: row.number_or_nan("NewDeaths"),
            new_mild: row.number_or_nan("NewMild"),
            new_severe: row.number_or_nan("NewSevere"),
            new_critical: row.number_or_nan("NewCritical"),
            currently_mild: row.number_or_nan("CurrentlyMild"),
            currently_severe: row.number_or_nan("CurrentlySevere"),
            currently_critical: row.number_or_nan("CurrentlyCritical"),
        }
    }
}

/// Adapter for the Open COVID-19 data files under one base URL
pub struct OpenCovidSource {
    http: Arc<dyn HttpClientPort>,
    base_url: String,
}

impl OpenCovidSource {
    pub fn new(http: Arc<dyn HttpClientPort>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn file_url(&self, file: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), file)
    }

    async fn fetch_json<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>> {
        let resp = self.http.get(&self.file_url(file)).await?;
        debug!(
            file,
            status = resp.status,
            content_type = %resp.content_type,
            "OpenCovidSource: fetched {} bytes",
            resp.bytes.len()
        );
        let records: Vec<T> = serde_json::from_slice(&resp.bytes)?;
        info!("OpenCovidSource: {} records={}", file, records.len());
        Ok(records)
    }

    /// Full history (`data.json`)
    #[instrument(skip(self), fields(source = OPEN_COVID_SOURCE))]
    pub async fn fetch_all(&self) -> Result<Vec<OpenCovidRecord>> {
        self.fetch_json("data.json").await
    }

    /// Most recent day per country and region (`data_latest.json`)
    #[instrument(skip(self), fields(source = OPEN_COVID_SOURCE))]
    pub async fn fetch_latest(&self) -> Result<Vec<OpenCovidRecord>> {
        self.fetch_json("data_latest.json").await
    }

    #[instrument(skip(self), fields(source = OPEN_COVID_SOURCE))]
    pub async fn fetch_forecast(&self) -> Result<Vec<OpenCovidForecastRecord>> {
        self.fetch_json("data_forecast.json").await
    }

    pub fn categories_profile() -> RawCsvProfile {
        let numbers = [
            "NewCases",
            "NewDeaths",
            "NewMild",
            "NewSevere",
            "NewCritical",
            "CurrentlyMild",
            "CurrentlySevere",
            "CurrentlyCritical",
        ];

        let profile = RawCsvProfile::new(true)
            .with_column(ColumnMap::date(0, "Date"))
            .with_column(ColumnMap::text(1, "CountryCode"))
            .with_column(ColumnMap::text(2, "CountryName"))
            .with_column(ColumnMap::text(3, "RegionCode"))
            .with_column(ColumnMap::text(4, "RegionName"));

        numbers
            .iter()
            .enumerate()
            .fold(profile, |p, (i, name)| p.with_column(ColumnMap::number(5 + i, *name)))
    }

    /// Severity categories (`data_categories.csv`)
    #[instrument(skip(self), fields(source = OPEN_COVID_CATEGORIES_SOURCE))]
    pub async fn fetch_categories(&self) -> Result<Vec<CategoriesRecord>> {
        let resp = self.http.get(&self.file_url("data_categories.csv")).await?;
        debug!(
            status = resp.status,
            content_type = %resp.content_type,
            "OpenCovidSource: fetched {} bytes",
            resp.bytes.len()
        );
        Self::decode_categories(&resp.bytes)
    }

    /// Rows without a country name are dropped
    pub fn decode_categories(bytes: &[u8]) -> Result<Vec<CategoriesRecord>> {
        let decoder = CsvDecoder::<CategoriesRecord>::new(Self::categories_profile())?;
        let records: Vec<CategoriesRecord> = decoder
            .decode_bytes(OPEN_COVID_CATEGORIES_SOURCE, bytes)?
            .into_iter()
            .filter(|r| !r.country_name.is_empty())
            .collect();
        info!("OpenCovidSource: categories records={}", records.len());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::sources::test_support::StaticHttp;

    const BASE: &str = "http://opencovid.test/data/";

    const CATEGORIES: &str = "Date,CountryCode,CountryName,RegionCode,RegionName,NewCases,NewDeaths,NewMild,NewSevere,NewCritical,CurrentlyMild,CurrentlySevere,CurrentlyCritical\r\n\
        2020-04-01,ES,Spain,,,8000,800,6000,1500,500,60000,15000,5000\r\n\
        2020-04-01,US,United States of America,NY,New York,7000,400,5000,1500,500,50000,15000,5000\r\n";

    const DATA: &str = r#"[
        {"Date": "2020-04-01", "CountryCode": "ES", "CountryName": "Spain", "RegionCode": null,
         "RegionName": null, "Confirmed": 104118, "Deaths": 9387, "Latitude": 40.46,
         "Longitude": -3.75, "Population": 46754778},
        {"Date": "2020-04-01", "CountryCode": "US", "CountryName": "United States of America",
         "RegionCode": "NY", "RegionName": "New York", "Confirmed": 83712, "Deaths": null,
         "Latitude": 42.17, "Longitude": -74.95, "Population": 19453561}
    ]"#;

    const FORECAST: &str = r#"[
        {"ForecastDate": "2020-04-01", "Date": "2020-04-05", "CountryCode": "ES",
         "CountryName": "Spain", "Confirmed": 140000.5, "Deaths": 13000,
         "Latitude": 40.46, "Longitude": -3.75, "Population": 46754778}
    ]"#;

    #[test]
    fn test_profile_covers_thirteen_columns() {
        let profile = OpenCovidSource::categories_profile();
        assert_eq!(profile.maps.len(), 13);
        assert_eq!(profile.max_index(), Some(12));
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_decode_categories() {
        let records = OpenCovidSource::decode_categories(CATEGORIES.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);

        let es = &records[0];
        assert_eq!(es.country_code, "ES");
        assert_eq!(es.region_code, None);
        assert_eq!(es.region_name, None);
        assert_eq!(es.new_cases, 8000.0);
        assert_eq!(es.currently_critical, 5000.0);

        let ny = &records[1];
        assert_eq!(ny.region_name.as_deref(), Some("New York"));
        assert_eq!(ny.new_severe, 1500.0);
    }

    #[tokio::test]
    async fn test_fetch_categories() {
        let http = Arc::new(StaticHttp::ok(CATEGORIES));
        let source = OpenCovidSource::new(http.clone(), BASE);
        let records = source.fetch_categories().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            http.requested(),
            vec!["http://opencovid.test/data/data_categories.csv".to_string()]
        );
    }

    #[tokio::test]
    async fn test_fetch_all() {
        let http = Arc::new(StaticHttp::ok(DATA));
        let records = OpenCovidSource::new(http.clone(), BASE).fetch_all().await.unwrap();

        assert_eq!(http.requested(), vec!["http://opencovid.test/data/data.json".to_string()]);
        assert_eq!(records.len(), 2);
        let es = &records[0];
        assert_eq!(es.date, NaiveDate::from_ymd_opt(2020, 4, 1).unwrap());
        assert_eq!(es.region_code, None);
        assert_eq!(es.confirmed, Some(104118.0));
        assert_eq!(es.population, Some(46754778.0));
        assert_eq!(records[1].region_name.as_deref(), Some("New York"));
        assert_eq!(records[1].deaths, None);
    }

    #[tokio::test]
    async fn test_fetch_latest_uses_latest_file() {
        let http = Arc::new(StaticHttp::ok(DATA));
        let records = OpenCovidSource::new(http.clone(), "http://opencovid.test/data")
            .fetch_latest()
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            http.requested(),
            vec!["http://opencovid.test/data/data_latest.json".to_string()]
        );
    }

    #[tokio::test]
    async fn test_fetch_forecast() {
        let http = Arc::new(StaticHttp::ok(FORECAST));
        let records = OpenCovidSource::new(http.clone(), BASE).fetch_forecast().await.unwrap();

        assert_eq!(records.len(), 1);
        let es = &records[0];
        assert_eq!(es.forecast_date, NaiveDate::from_ymd_opt(2020, 4, 1).unwrap());
        assert_eq!(es.record.date, NaiveDate::from_ymd_opt(2020, 4, 5).unwrap());
        assert_eq!(es.record.confirmed, Some(140000.5));
        assert_eq!(
            http.requested(),
            vec!["http://opencovid.test/data/data_forecast.json".to_string()]
        );
    }

    #[tokio::test]
    async fn test_fetch_all_failure_surfaces() {
        let source = OpenCovidSource::new(Arc::new(StaticHttp::status(502)), BASE);
        assert!(source.fetch_all().await.unwrap_err().is_fetch_failure());

        let source = OpenCovidSource::new(Arc::new(StaticHttp::ok("<html>")), BASE);
        assert!(matches!(source.fetch_latest().await.unwrap_err(), PipelineError::Json(_)));
    }
}
