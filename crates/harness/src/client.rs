//! REST client for the Opsdesk dashboard cleanup endpoints

use std::time::Duration;

use tracing::debug;

use crate::error::HarnessResult;

/// Configuration for the dashboard client.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Base URL of the dashboard under test.
    pub base_url: String,

    /// Optional bearer token for the dashboard API.
    pub api_token: Option<String>,

    /// Per-request timeout; cleanup calls are sequential, so this bounds
    /// how long a hung remote can stall teardown.
    pub request_timeout: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            api_token: None,
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl DashboardConfig {
    /// Defaults overridden by `OPSDESK_E2E_BASE_URL` and
    /// `OPSDESK_E2E_API_TOKEN` when set and non-empty.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(url) = non_empty_env("OPSDESK_E2E_BASE_URL") {
            config.base_url = url;
        }
        config.api_token = non_empty_env("OPSDESK_E2E_API_TOKEN");

        config
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .and_then(|v| if v.trim().is_empty() { None } else { Some(v) })
}

/// Client for the dashboard REST API, scoped to the calls the harness needs.
#[derive(Debug, Clone)]
pub struct DashboardClient {
    http: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

impl DashboardClient {
    pub fn new(config: DashboardConfig) -> HarnessResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Close a chat session. The response body is not inspected beyond the
    /// status code.
    pub async fn close_session(&self, id: &str) -> HarnessResult<()> {
        let url = format!("{}/api/sessions/{}/close", self.base_url, id);
        debug!("POST {}", url);

        let mut request = self.http.post(&url);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        request.send().await?.error_for_status()?;
        Ok(())
    }

    /// Delete an issue. The response body is not inspected beyond the
    /// status code.
    pub async fn delete_issue(&self, id: &str) -> HarnessResult<()> {
        let url = format!("{}/api/issues/{}", self.base_url, id);
        debug!("DELETE {}", url);

        let mut request = self.http.delete(&url);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        request.send().await?.error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_stripped_from_base_url() {
        let client = DashboardClient::new(DashboardConfig {
            base_url: "http://127.0.0.1:9999/".to_string(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(client.base_url(), "http://127.0.0.1:9999");
    }
}
