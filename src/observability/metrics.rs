//! Metrics for the ingestion pipeline
//!
//! Recording goes through the `metrics` facade, so every call is a no-op
//! until a recorder is installed with [`init`].

use std::fmt;
use std::sync::OnceLock;
use tracing::{info, warn};

/// All metric names used in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Sources metrics
    SourcesRequestsSuccess,
    SourcesRequestsError,
    SourcesRequestDuration,
    SourcesPayloadBytes,

    // Decode metrics
    DecodeLines,
    DecodeFieldsDegraded,

    // Resolve metrics
    ResolveLocationsResolved,
    ResolveLocationsUnresolved,

    // Enrich metrics
    EnrichRecordsEmitted,
    EnrichRecordsWithoutCountry,
    EnrichBatchSize,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::SourcesRequestsSuccess => "covid_sources_requests_success_total",
            MetricName::SourcesRequestsError => "covid_sources_requests_error_total",
            MetricName::SourcesRequestDuration => "covid_sources_request_duration_seconds",
            MetricName::SourcesPayloadBytes => "covid_sources_payload_bytes",
            MetricName::DecodeLines => "covid_decode_lines_total",
            MetricName::DecodeFieldsDegraded => "covid_decode_fields_degraded_total",
            MetricName::ResolveLocationsResolved => "covid_resolve_locations_resolved_total",
            MetricName::ResolveLocationsUnresolved => "covid_resolve_locations_unresolved_total",
            MetricName::EnrichRecordsEmitted => "covid_enrich_records_emitted_total",
            MetricName::EnrichRecordsWithoutCountry => "covid_enrich_records_without_country_total",
            MetricName::EnrichBatchSize => "covid_enrich_batch_size",
        }
    }

    pub fn all_metrics() -> impl Iterator<Item = MetricName> {
        use MetricName::*;
        [
            SourcesRequestsSuccess,
            SourcesRequestsError,
            SourcesRequestDuration,
            SourcesPayloadBytes,
            DecodeLines,
            DecodeFieldsDegraded,
            ResolveLocationsResolved,
            ResolveLocationsUnresolved,
            EnrichRecordsEmitted,
            EnrichRecordsWithoutCountry,
            EnrichBatchSize,
        ]
        .into_iter()
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

static HANDLE: OnceLock<metrics_exporter_prometheus::PrometheusHandle> = OnceLock::new();

/// Install a Prometheus recorder when `COVID_METRICS_ADDR` is set.
///
/// Idempotent; without the variable nothing is installed.
pub fn init() {
    if HANDLE.get().is_some() {
        return;
    }
    let Ok(addr_str) = std::env::var("COVID_METRICS_ADDR") else {
        info!("Metrics exporter disabled (COVID_METRICS_ADDR not set)");
        return;
    };
    let addr = match addr_str.parse::<std::net::SocketAddr>() {
        Ok(addr) => addr,
        Err(_) => {
            warn!("Invalid metrics addr '{}', metrics exporter disabled", addr_str);
            return;
        }
    };

    // Must be called from inside the tokio runtime; the exporter is spawned on it
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
    let (recorder, exporter) = match builder.build() {
        Ok(parts) => parts,
        Err(e) => {
            warn!("Failed to build Prometheus recorder: {}", e);
            return;
        }
    };
    let handle = recorder.handle();
    if let Err(e) = ::metrics::set_global_recorder(recorder) {
        warn!("Failed to install Prometheus recorder: {}", e);
        return;
    }
    tokio::spawn(async move {
        if exporter.await.is_err() {
            warn!("Prometheus exporter stopped");
        }
    });
    let _ = HANDLE.set(handle);
    info!("Prometheus exporter listening at http://{}/metrics", addr);
}

/// Text snapshot of all metrics, if a recorder was installed
pub fn render() -> Option<String> {
    HANDLE.get().map(|h| h.render())
}

pub mod sources {
    use super::MetricName;

    pub fn request_success(duration_secs: f64, payload_bytes: usize) {
        ::metrics::counter!(MetricName::SourcesRequestsSuccess.as_str()).increment(1);
        ::metrics::histogram!(MetricName::SourcesRequestDuration.as_str()).record(duration_secs);
        ::metrics::histogram!(MetricName::SourcesPayloadBytes.as_str())
            .record(payload_bytes as f64);
    }

    pub fn request_error() {
        ::metrics::counter!(MetricName::SourcesRequestsError.as_str()).increment(1);
    }
}

pub mod decode {
    use super::MetricName;

    pub fn lines_decoded(count: usize) {
        ::metrics::counter!(MetricName::DecodeLines.as_str()).increment(count as u64);
    }

    pub fn fields_degraded(count: usize) {
        if count > 0 {
            ::metrics::counter!(MetricName::DecodeFieldsDegraded.as_str())
                .increment(count as u64);
        }
    }
}

pub mod resolve {
    use super::MetricName;

    pub fn location_resolved() {
        ::metrics::counter!(MetricName::ResolveLocationsResolved.as_str()).increment(1);
    }

    pub fn location_unresolved() {
        ::metrics::counter!(MetricName::ResolveLocationsUnresolved.as_str()).increment(1);
    }
}

pub mod enrich {
    use super::MetricName;

    pub fn batch_processed(emitted: usize, without_country: usize) {
        ::metrics::counter!(MetricName::EnrichRecordsEmitted.as_str()).increment(emitted as u64);
        ::metrics::counter!(MetricName::EnrichRecordsWithoutCountry.as_str())
            .increment(without_country as u64);
        ::metrics::histogram!(MetricName::EnrichBatchSize.as_str()).record(emitted as f64);
    }
}
