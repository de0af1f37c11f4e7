use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use nd_core::config::MediastackConfig;
use nd_core::{Category, Error, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use super::NewsSource;

#[derive(Debug, Default, Deserialize)]
struct MediastackResponse {
    #[serde(default)]
    data: Vec<Value>,
    #[serde(default)]
    error: Option<MediastackError>,
}

#[derive(Debug, Default, Deserialize)]
struct MediastackError {
    #[serde(default)]
    message: String,
}

/// Client for the Mediastack `/v1/news` endpoint.
#[derive(Clone)]
pub struct MediastackClient {
    client: Client,
    base_url: Url,
    access_key: String,
    language: String,
    limit: u32,
    sort: String,
}

impl fmt::Debug for MediastackClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediastackClient")
            .field("base_url", &self.base_url.as_str())
            .field("access_key", &"<redacted>")
            .field("language", &self.language)
            .field("limit", &self.limit)
            .field("sort", &self.sort)
            .finish()
    }
}

impl MediastackClient {
    pub fn new(config: &MediastackConfig) -> Result<Self> {
        if !config.is_configured() {
            return Err(Error::Config(
                "Mediastack access key is not set (MEDIASTACK_API_KEY or NEWSDESK_MEDIASTACK__ACCESS_KEY)"
                    .to_string(),
            ));
        }
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url,
            access_key: config.access_key.trim().to_string(),
            language: config.language.clone(),
            limit: config.limit,
            sort: config.sort.clone(),
        })
    }
}

#[async_trait]
impl NewsSource for MediastackClient {
    fn name(&self) -> &str {
        "mediastack"
    }

    async fn fetch_category(&self, category: Category) -> Result<Vec<Value>> {
        let limit = self.limit.to_string();
        tracing::debug!(category = %category, "requesting mediastack news");

        let response = self
            .client
            .get(self.base_url.clone())
            .query(&[
                ("access_key", self.access_key.as_str()),
                ("categories", category.as_str()),
                ("languages", self.language.as_str()),
                ("limit", limit.as_str()),
                ("sort", self.sort.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upstream(format!(
                "API returned status code {}",
                status.as_u16()
            )));
        }

        let body: MediastackResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("malformed API response: {}", e)))?;
        if let Some(error) = body.error {
            return Err(Error::Upstream(format!("API error: {}", error.message)));
        }
        Ok(body.data)
    }
}
