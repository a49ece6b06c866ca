use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::app::ports::HttpClientPort;
use crate::constants::REST_COUNTRIES_SOURCE;
use crate::countries::CountryMetadata;
use crate::error::{PipelineError, Result};

/// Client for the country reference set API
pub struct RestCountriesClient {
    http: Arc<dyn HttpClientPort>,
    base_url: String,
}

impl RestCountriesClient {
    pub fn new(http: Arc<dyn HttpClientPort>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// The whole reference set in one request
    #[instrument(skip(self), fields(source = REST_COUNTRIES_SOURCE))]
    pub async fn fetch_all(&self) -> Result<Vec<CountryMetadata>> {
        let url = self.endpoint(&["all"])?;
        let resp = self.http.get(&url).await?;
        debug!(
            status = resp.status,
            content_type = %resp.content_type,
            "RestCountriesClient: fetched {} bytes",
            resp.bytes.len()
        );
        let countries: Vec<CountryMetadata> = serde_json::from_slice(&resp.bytes)?;
        info!("RestCountriesClient: loaded {} countries", countries.len());
        Ok(countries)
    }

    /// Look up by ISO 3166-1 alpha-2 or alpha-3 code. Unknown codes are `None`.
    pub async fn fetch_by_code(&self, code: &str) -> Result<Option<CountryMetadata>> {
        let url = self.endpoint(&["alpha", code])?;
        match self.http.get(&url).await {
            Ok(resp) => Ok(Some(serde_json::from_slice(&resp.bytes)?)),
            Err(PipelineError::HttpStatus { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Look up by (partial) name; the first returned entry is used.
    pub async fn fetch_by_name(&self, name: &str) -> Result<Option<CountryMetadata>> {
        let url = self.endpoint(&["name", name])?;
        match self.http.get(&url).await {
            Ok(resp) => {
                let matches: Vec<CountryMetadata> = serde_json::from_slice(&resp.bytes)?;
                Ok(matches.into_iter().next())
            }
            Err(PipelineError::HttpStatus { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<String> {
        let invalid = |reason: String| {
            PipelineError::Config(format!("invalid countries url '{}': {}", self.base_url, reason))
        };
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::test_support::StaticHttp;

    const ALL: &str = r#"[
        {"name": "Portugal", "nativeName": "Portugal", "alpha2Code": "PT", "population": 10374822,
         "area": 92090.0, "flag": "pt.svg", "region": "Europe", "subregion": "Southern Europe",
         "latlng": [39.5, -8.0]},
        {"name": "Holy See", "nativeName": "Sancta Sedes", "alpha2Code": "VA", "population": 451,
         "area": 0.44, "flag": "va.svg", "region": "Europe", "subregion": "Southern Europe",
         "latlng": [41.9, 12.45]}
    ]"#;

    #[tokio::test]
    async fn test_fetch_all() {
        let http = Arc::new(StaticHttp::ok(ALL));
        let client = RestCountriesClient::new(http.clone(), "https://countries.test/rest/v2");

        let countries = client.fetch_all().await.unwrap();
        assert_eq!(countries.len(), 2);
        assert_eq!(countries[1].alpha2_code, "VA");
        assert_eq!(http.requested(), vec!["https://countries.test/rest/v2/all".to_string()]);
    }

    #[tokio::test]
    async fn test_fetch_all_rejects_malformed_json() {
        let client =
            RestCountriesClient::new(Arc::new(StaticHttp::ok("not json")), "https://countries.test");
        let err = client.fetch_all().await.unwrap_err();
        assert!(matches!(err, PipelineError::Json(_)));
    }

    #[tokio::test]
    async fn test_fetch_by_name_encodes_segment() {
        let http = Arc::new(StaticHttp::ok(ALL));
        let client = RestCountriesClient::new(http.clone(), "https://countries.test/rest/v2/");

        let found = client.fetch_by_name("Holy See").await.unwrap().unwrap();
        assert_eq!(found.name, "Portugal");
        assert_eq!(
            http.requested(),
            vec!["https://countries.test/rest/v2/name/Holy%20See".to_string()]
        );
    }

    #[tokio::test]
    async fn test_fetch_by_code_not_found() {
        let client =
            RestCountriesClient::new(Arc::new(StaticHttp::status(404)), "https://countries.test");
        assert!(client.fetch_by_code("ZZ").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fetch_by_code() {
        let one = r#"{"name": "Portugal", "alpha2Code": "PT", "population": 10374822, "latlng": [39.5, -8.0]}"#;
        let client = RestCountriesClient::new(Arc::new(StaticHttp::ok(one)), "https://countries.test");
        let found = client.fetch_by_code("PT").await.unwrap().unwrap();
        assert_eq!(found.population, Some(10374822));
    }
}
