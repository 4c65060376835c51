//! Main Encore backend client.

use crate::error::{RemoteError, Result};
use crate::history::HistoryClient;
use crate::settings::SettingsClient;
use crate::types::{ErrorBody, ServerConfig};
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use tracing::debug;

/// Client for the Encore backend.
///
/// Hands out the settings store and history log used by the playback sync
/// worker. Both share one HTTP connection pool.
///
/// # Example
///
/// ```ignore
/// use encore_remote::{RemoteClient, ServerConfig};
///
/// let client = RemoteClient::new(ServerConfig::new("http://localhost:8001"))?;
/// let settings = client.settings().fetch_settings().await?;
/// println!("Volume is {}", settings.volume);
/// ```
#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: Client,
    config: ServerConfig,
}

impl RemoteClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ServerConfig) -> Result<Self> {
        // Validate URL
        if config.url.is_empty() {
            return Err(RemoteError::InvalidUrl("URL cannot be empty".into()));
        }

        // Parse and normalize URL
        let url = config.url.trim_end_matches('/').to_string();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(RemoteError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .user_agent(format!("Encore/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            config: ServerConfig {
                url,
                access_token: config.access_token,
            },
        })
    }

    /// Get the normalized server URL.
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Settings store backed by `/api/settings`.
    pub fn settings(&self) -> SettingsClient {
        SettingsClient::new(self.http.clone(), self.config.clone())
    }

    /// History log backed by `/api/history`.
    pub fn history(&self) -> HistoryClient {
        HistoryClient::new(self.http.clone(), self.config.clone())
    }
}

/// Attach the bearer token, if configured.
pub(crate) fn authorize(request: RequestBuilder, config: &ServerConfig) -> RequestBuilder {
    match &config.access_token {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}

/// Send a request, classifying connection failures.
pub(crate) async fn send(request: RequestBuilder) -> Result<Response> {
    request.send().await.map_err(|e| {
        if e.is_connect() || e.is_timeout() {
            RemoteError::ServerUnreachable(e.to_string())
        } else {
            RemoteError::Request(e)
        }
    })
}

/// Turn a non-success response into `ServerError`.
pub(crate) async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.error)
        .unwrap_or(body);

    debug!(status = status.as_u16(), message = %message, "Server returned error");
    Err(RemoteError::ServerError {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_validation() {
        // Valid URLs
        assert!(RemoteClient::new(ServerConfig::new("https://example.com")).is_ok());
        assert!(RemoteClient::new(ServerConfig::new("http://localhost:8001")).is_ok());

        // Invalid URLs
        assert!(RemoteClient::new(ServerConfig::new("")).is_err());
        assert!(RemoteClient::new(ServerConfig::new("not-a-url")).is_err());
        assert!(RemoteClient::new(ServerConfig::new("ftp://example.com")).is_err());
    }

    #[test]
    fn test_url_normalization() {
        let client = RemoteClient::new(ServerConfig::new("https://example.com/")).expect("valid url");

        // URL should have trailing slash removed
        assert_eq!(client.url(), "https://example.com");
    }
}
