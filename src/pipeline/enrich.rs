use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

use crate::countries::{CountryMetadata, CountryResolver};
use crate::observability::metrics;
use crate::sources::TimeSeriesRecord;

/// A time-series row joined with its country and the derived ratios.
///
/// Country fields and ratios are `None` when the location did not resolve;
/// they are omitted from the serialized form rather than written as zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedRecord {
    pub date: Option<NaiveDate>,
    pub location: String,
    pub new_cases: f64,
    pub new_deaths: f64,
    pub total_cases: f64,
    pub total_deaths: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub population: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cases_by_population: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_deaths_by_population: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cases_by_area: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_deaths_by_area: Option<f64>,
}

impl EnrichedRecord {
    pub fn has_country(&self) -> bool {
        self.country_code.is_some()
    }
}

/// Join every record with its country. Output order and length match the
/// input; unresolved locations keep base fields only.
pub fn enrich(series: &[TimeSeriesRecord], countries: &[CountryMetadata]) -> Vec<EnrichedRecord> {
    let mut resolver = CountryResolver::new(countries);
    let records: Vec<EnrichedRecord> = series
        .iter()
        .map(|r| enrich_record(r, resolver.resolve(&r.location)))
        .collect();

    let without_country = records.iter().filter(|r| !r.has_country()).count();
    debug!(
        "enrich: records={} without_country={} distinct_locations={}",
        records.len(),
        without_country,
        resolver.distinct_locations()
    );
    metrics::enrich::batch_processed(records.len(), without_country);
    records
}

/// Enrich one record against an already-resolved country
pub fn enrich_record(record: &TimeSeriesRecord, country: Option<&CountryMetadata>) -> EnrichedRecord {
    let mut enriched = EnrichedRecord {
        date: record.date,
        location: record.location.clone(),
        new_cases: record.new_cases,
        new_deaths: record.new_deaths,
        total_cases: record.total_cases,
        total_deaths: record.total_deaths,
        country_code: None,
        flag: None,
        region: None,
        population: None,
        area: None,
        latitude: None,
        longitude: None,
        total_cases_by_population: None,
        total_deaths_by_population: None,
        total_cases_by_area: None,
        total_deaths_by_area: None,
    };

    let Some(country) = country else {
        return enriched;
    };

    enriched.country_code = Some(country.alpha2_code.clone());
    enriched.flag = Some(country.flag.clone());
    enriched.region = Some(country.region.clone());
    enriched.population = country.population;
    enriched.area = country.area;
    enriched.latitude = country.latitude;
    enriched.longitude = country.longitude;

    let population = country.population.map(|p| p as f64);
    enriched.total_cases_by_population = ratio(record.total_cases, population);
    enriched.total_deaths_by_population = ratio(record.total_deaths, population);
    enriched.total_cases_by_area = ratio(record.total_cases, country.area);
    enriched.total_deaths_by_area = ratio(record.total_deaths, country.area);

    enriched
}

/// `numerator * 100 / denominator`; absent for a missing or non-positive
/// denominator and for non-finite results.
fn ratio(numerator: f64, denominator: Option<f64>) -> Option<f64> {
    let denominator = denominator.filter(|d| *d > 0.0)?;
    let value = numerator * 100.0 / denominator;
    value.is_finite().then_some(value)
}

/// Summary of one enrichment batch
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnrichStats {
    pub total: usize,
    pub with_country: usize,
    pub without_country: usize,
    pub distinct_locations: usize,
    pub unresolved_locations: Vec<String>,
}

impl EnrichStats {
    pub fn from_records(records: &[EnrichedRecord]) -> Self {
        let mut locations = BTreeSet::new();
        let mut unresolved = BTreeSet::new();
        let mut with_country = 0;

        for record in records {
            locations.insert(record.location.as_str());
            if record.has_country() {
                with_country += 1;
            } else {
                unresolved.insert(record.location.as_str());
            }
        }

        Self {
            total: records.len(),
            with_country,
            without_country: records.len() - with_country,
            distinct_locations: locations.len(),
            unresolved_locations: unresolved.into_iter().map(String::from).collect(),
        }
    }
}
