//! COVID-19 feed ingestion: profile-driven CSV decoding, country resolution
//! and per-capita / per-area enrichment.

pub mod app;
pub mod config;
pub mod constants;
pub mod countries;
pub mod decoder;
pub mod error;
pub mod infra;
pub mod observability;
pub mod pipeline;
pub mod sources;

pub use countries::{resolve_country, CountryMetadata};
pub use decoder::{ColumnMap, CsvDecoder, RawCsvProfile, ValueType};
pub use error::{PipelineError, Result};
pub use pipeline::{enrich, DashboardPipeline, EnrichedRecord};
pub use sources::TimeSeriesRecord;
