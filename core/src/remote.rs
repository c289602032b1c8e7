//! Remote collaborators: the sprite host (variant pages + images) and the
//! generation listing API used to rebuild the catalog.
//!
//! Both are traits so the engine can be driven by fakes in tests. The HTTP
//! implementation does one plain GET per call with a timeout; there is no
//! retry, failures surface as [`RemoteError`] and callers degrade.

use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use shinycount_types::RemoteConfig;

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },
}

/// Per-entry sprite pages and the images they link to
pub trait SpriteSource: Send + Sync {
    /// HTML of the sprite page for `entry`
    fn sprite_page(&self, entry: &str) -> impl Future<Output = Result<String, RemoteError>> + Send;

    /// Raw bytes of one image
    fn image(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, RemoteError>> + Send;
}

/// JSON listing API, addressed by endpoint relative to its base URL
pub trait CatalogApi: Send + Sync {
    fn get_json<T: DeserializeOwned + Send>(
        &self,
        endpoint: &str,
    ) -> impl Future<Output = Result<T, RemoteError>> + Send;
}

/// reqwest-backed implementation of both remote traits
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    sprite_base: String,
    api_base: String,
}

impl HttpSource {
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(RemoteError::Client)?;

        Ok(Self {
            client,
            sprite_base: config.sprite_base.trim_end_matches('/').to_string(),
            api_base: if config.api_base.ends_with('/') {
                config.api_base.clone()
            } else {
                format!("{}/", config.api_base)
            },
        })
    }

    pub fn sprite_page_url(&self, entry: &str) -> String {
        format!("{}/{}", self.sprite_base, entry)
    }

    pub fn api_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.api_base, endpoint.trim_start_matches('/'))
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, RemoteError> {
        tracing::debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| RemoteError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

impl SpriteSource for HttpSource {
    async fn sprite_page(&self, entry: &str) -> Result<String, RemoteError> {
        let url = self.sprite_page_url(entry);
        self.get(&url)
            .await?
            .text()
            .await
            .map_err(|source| RemoteError::Request { url, source })
    }

    async fn image(&self, url: &str) -> Result<Vec<u8>, RemoteError> {
        let bytes = self
            .get(url)
            .await?
            .bytes()
            .await
            .map_err(|source| RemoteError::Request {
                url: url.to_string(),
                source,
            })?;
        Ok(bytes.to_vec())
    }
}

impl CatalogApi for HttpSource {
    async fn get_json<T: DeserializeOwned + Send>(&self, endpoint: &str) -> Result<T, RemoteError> {
        let url = self.api_url(endpoint);
        let body = self
            .get(&url)
            .await?
            .text()
            .await
            .map_err(|source| RemoteError::Request {
                url: url.clone(),
                source,
            })?;
        serde_json::from_str(&body).map_err(|e| RemoteError::Decode {
            url,
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_building() {
        let source = HttpSource::new(&RemoteConfig {
            sprite_base: "https://example.test/sprites/".to_string(),
            api_base: "https://api.example.test/v2".to_string(),
            ..RemoteConfig::default()
        })
        .unwrap();

        assert_eq!(
            source.sprite_page_url("pikachu"),
            "https://example.test/sprites/pikachu"
        );
        assert_eq!(
            source.api_url("generation?limit=10000"),
            "https://api.example.test/v2/generation?limit=10000"
        );
        assert_eq!(
            source.api_url("/generation/1"),
            "https://api.example.test/v2/generation/1"
        );
    }
}
