use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use covid_pipeline::app::ports::{EnrichOutputPort, HttpClientPort};
use covid_pipeline::config::Config;
use covid_pipeline::countries::{resolve_country, CountryMetadata};
use covid_pipeline::infra::{FileEnrichOutputAdapter, ReqwestHttp, StdoutEnrichOutputAdapter};
use covid_pipeline::observability::{init_logging, metrics};
use covid_pipeline::pipeline::DashboardPipeline;
use covid_pipeline::sources::{decode_feed, LocationFilter, OpenCovidSource, RestCountriesClient};

#[derive(Parser)]
#[command(name = "covid_pipeline")]
#[command(about = "COVID-19 time series ingestion and country enrichment")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the feed and the reference set, enrich, write NDJSON
    Run {
        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Output file (stdout when omitted)
        #[arg(long)]
        output: Option<String>,
    },
    /// Decode a local feed file and print the time series as NDJSON
    Decode {
        #[arg(long)]
        input: PathBuf,
        /// Keep the "World" aggregate rows
        #[arg(long)]
        keep_world: bool,
    },
    /// Resolve a feed location name to its reference country
    Resolve {
        name: String,
        /// Local reference set JSON (fetched when omitted)
        #[arg(long)]
        countries: Option<PathBuf>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Fetch one Open COVID-19 dataset and summarise it
    OpenCovid {
        #[arg(long, value_enum, default_value_t = OpenCovidDataset::Categories)]
        dataset: OpenCovidDataset,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OpenCovidDataset {
    All,
    Latest,
    Forecast,
    Categories,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_logging();
    metrics::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { config, output } => {
            let config = Config::resolve(config.as_deref())?;
            let http: Arc<dyn HttpClientPort> = Arc::new(ReqwestHttp::new(&config.http)?);
            let pipeline = DashboardPipeline::from_config(&config, http);

            let sink: Box<dyn EnrichOutputPort> = match &output {
                Some(path) => Box::new(FileEnrichOutputAdapter::new(path)?),
                None => Box::new(StdoutEnrichOutputAdapter),
            };
            let run = pipeline
                .run_to(sink.as_ref())
                .await
                .context("pipeline run failed")?;
            info!(run_id = %run.run_id, "wrote {} enriched records", run.stats.total);
        }
        Commands::Decode { input, keep_world } => {
            let bytes = std::fs::read(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            let filter = if keep_world {
                LocationFilter::none()
            } else {
                LocationFilter::default()
            };
            for record in decode_feed(&bytes, &filter)? {
                println!("{}", serde_json::to_string(&record)?);
            }
        }
        Commands::Resolve {
            name,
            countries,
            config,
        } => {
            let reference: Vec<CountryMetadata> = match countries {
                Some(path) => {
                    let bytes = std::fs::read(&path)
                        .with_context(|| format!("reading {}", path.display()))?;
                    serde_json::from_slice(&bytes)?
                }
                None => {
                    let config = Config::resolve(config.as_deref())?;
                    let http = Arc::new(ReqwestHttp::new(&config.http)?);
                    RestCountriesClient::new(http, config.sources.countries_url)
                        .fetch_all()
                        .await?
                }
            };
            match resolve_country(&name, &reference) {
                Some(country) => println!("{}", serde_json::to_string_pretty(country)?),
                None => warn!("no reference country matches '{}'", name),
            }
        }
        Commands::OpenCovid { dataset, config } => {
            let config = Config::resolve(config.as_deref())?;
            let http = Arc::new(ReqwestHttp::new(&config.http)?);
            let source = OpenCovidSource::new(http, config.sources.open_covid_url);
            let (records, countries) = match dataset {
                OpenCovidDataset::All => {
                    let records = source.fetch_all().await?;
                    (records.len(), country_names(records.iter().map(|r| &r.country_name)))
                }
                OpenCovidDataset::Latest => {
                    let records = source.fetch_latest().await?;
                    (records.len(), country_names(records.iter().map(|r| &r.country_name)))
                }
                OpenCovidDataset::Forecast => {
                    let records = source.fetch_forecast().await?;
                    let names = country_names(records.iter().map(|r| &r.record.country_name));
                    (records.len(), names)
                }
                OpenCovidDataset::Categories => {
                    let records = source.fetch_categories().await?;
                    (records.len(), country_names(records.iter().map(|r| &r.country_name)))
                }
            };
            info!(
                "{:?} dataset: {} records across {} countries",
                dataset,
                records,
                countries.len()
            );
        }
    }

    if let Some(snapshot) = metrics::render() {
        tracing::debug!("metrics snapshot:\n{}", snapshot);
    }
    Ok(())
}

/// Distinct, sorted country names
fn country_names<'a>(names: impl Iterator<Item = &'a String>) -> Vec<String> {
    let unique: std::collections::BTreeSet<&String> = names.collect();
    unique.into_iter().cloned().collect()
}
