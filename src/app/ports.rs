use async_trait::async_trait;

use crate::error::Result;
use crate::pipeline::enrich::EnrichedRecord;

// Ingest-side ports
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    /// GET `url`. Transport failures and non-2xx statuses are errors.
    async fn get(&self, url: &str) -> Result<HttpGetResult>;
}

#[derive(Clone, Debug)]
pub struct HttpGetResult {
    pub status: u16,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

// Output-side ports
#[async_trait]
pub trait EnrichOutputPort: Send + Sync {
    async fn write_enriched_record(&self, record: &EnrichedRecord) -> Result<()>;

    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}
