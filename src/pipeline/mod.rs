//! Join & enrichment pipeline

pub mod enrich;

pub use enrich::{enrich, enrich_record, EnrichStats, EnrichedRecord};

use std::sync::Arc;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use crate::app::ports::{EnrichOutputPort, HttpClientPort};
use crate::config::Config;
use crate::error::Result;
use crate::sources::{EcdcSource, LocationFilter, RestCountriesClient};

/// Result of one full pipeline run
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub run_id: Uuid,
    pub records: Vec<EnrichedRecord>,
    pub stats: EnrichStats,
}

/// Fetches the feed and the reference set, then enriches.
///
/// Both fetches must succeed before any record is produced.
pub struct DashboardPipeline {
    feed: EcdcSource,
    countries: RestCountriesClient,
}

impl DashboardPipeline {
    pub fn new(feed: EcdcSource, countries: RestCountriesClient) -> Self {
        Self { feed, countries }
    }

    pub fn from_config(config: &Config, http: Arc<dyn HttpClientPort>) -> Self {
        let filter = LocationFilter::excluding(&config.pipeline.excluded_locations);
        let feed = EcdcSource::new(http.clone(), config.sources.feed_url.clone()).with_filter(filter);
        let countries = RestCountriesClient::new(http, config.sources.countries_url.clone());
        Self::new(feed, countries)
    }

    pub async fn run(&self) -> Result<PipelineRun> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("pipeline_run", run_id = %run_id);

        async move {
            info!("Starting pipeline run");
            let (series, countries) =
                tokio::try_join!(self.feed.fetch(), self.countries.fetch_all())?;

            let records = enrich(&series, &countries);
            let stats = EnrichStats::from_records(&records);
            info!(
                "Pipeline finished: records={} with_country={} without_country={}",
                stats.total, stats.with_country, stats.without_country
            );
            if !stats.unresolved_locations.is_empty() {
                warn!(
                    "{} locations had no reference country: {}",
                    stats.unresolved_locations.len(),
                    stats.unresolved_locations.join(", ")
                );
            }

            Ok(PipelineRun {
                run_id,
                records,
                stats,
            })
        }
        .instrument(span)
        .await
    }

    /// Run and stream the records to an output port
    pub async fn run_to(&self, output: &dyn EnrichOutputPort) -> Result<PipelineRun> {
        let run = self.run().await?;
        for record in &run.records {
            output.write_enriched_record(record).await?;
        }
        output.flush().await?;
        Ok(run)
    }
}
