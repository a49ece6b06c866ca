use crate::app::ports::{HttpClientPort, HttpGetResult};
use crate::config::HttpConfig;
use crate::error::{PipelineError, Result};
use crate::observability::metrics;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// reqwest-backed HTTP port with a shared client
pub struct ReqwestHttp {
    client: reqwest::Client,
}

impl ReqwestHttp {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClientPort for ReqwestHttp {
    async fn get(&self, url: &str) -> Result<HttpGetResult> {
        let started = Instant::now();
        let resp = match self.client.get(url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("GET {} failed: {}", url, e);
                metrics::sources::request_error();
                return Err(e.into());
            }
        };

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            warn!("GET {} returned status {}", url, status);
            metrics::sources::request_error();
            return Err(PipelineError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = resp.bytes().await.map_err(|e| {
            metrics::sources::request_error();
            PipelineError::from(e)
        })?;

        let elapsed = started.elapsed().as_secs_f64();
        debug!("GET {} -> {} ({} bytes in {:.2}s)", url, status, bytes.len(), elapsed);
        metrics::sources::request_success(elapsed, bytes.len());

        Ok(HttpGetResult {
            status,
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}
