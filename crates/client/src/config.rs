//! Client configuration.

use std::time::Duration;

use crate::error::{ClientError, Result};

/// Default pause between execution status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);
/// Default overall wait for a hosted execution.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(30);
/// Default per-request timeout for direct calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(500);
const MAX_POLL_INTERVAL: Duration = Duration::from_millis(1000);
const MIN_POLL_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_POLL_TIMEOUT: Duration = Duration::from_secs(45);

/// Fixed-interval polling with an overall deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
}

impl PollPolicy {
    fn validate(&self) -> Result<()> {
        if !(MIN_POLL_INTERVAL..=MAX_POLL_INTERVAL).contains(&self.interval) {
            return Err(ClientError::Config(format!(
                "poll interval must be between {:?} and {:?}",
                MIN_POLL_INTERVAL, MAX_POLL_INTERVAL
            )));
        }
        if !(MIN_POLL_TIMEOUT..=MAX_POLL_TIMEOUT).contains(&self.timeout) {
            return Err(ClientError::Config(format!(
                "poll timeout must be between {:?} and {:?}",
                MIN_POLL_TIMEOUT, MAX_POLL_TIMEOUT
            )));
        }
        Ok(())
    }
}

/// Where the client finds the API and, optionally, the hosted function.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    api_base_url: String,
    appwrite_endpoint: Option<String>,
    project_id: Option<String>,
    function_id: Option<String>,
    request_timeout: Duration,
    poll: PollPolicy,
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Base URL of the coffee tab API, without a trailing slash.
    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn appwrite_endpoint(&self) -> Option<&str> {
        self.appwrite_endpoint.as_deref()
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    /// Hosted function running the exchange, when one is configured.
    pub fn function_id(&self) -> Option<&str> {
        self.function_id.as_deref()
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn poll(&self) -> PollPolicy {
        self.poll
    }
}

#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    api_base_url: Option<String>,
    appwrite_endpoint: Option<String>,
    project_id: Option<String>,
    function_id: Option<String>,
    request_timeout: Option<Duration>,
    poll: Option<PollPolicy>,
}

impl ClientConfigBuilder {
    pub fn with_api_base_url<S: Into<String>>(mut self, url: S) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    /// Appwrite endpoint including the version prefix, e.g. `https://cloud.appwrite.io/v1`.
    pub fn with_appwrite_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.appwrite_endpoint = Some(endpoint.into());
        self
    }

    pub fn with_project_id<S: Into<String>>(mut self, project_id: S) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn with_function_id<S: Into<String>>(mut self, function_id: S) -> Self {
        self.function_id = Some(function_id.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = Some(poll);
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` if the API base URL is missing, the
    /// function settings are incomplete, or the poll policy is out of range.
    pub fn build(self) -> Result<ClientConfig> {
        let api_base_url = self
            .api_base_url
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ClientError::Config("api_base_url is required".into()))?;

        if self.function_id.is_some()
            && (self.appwrite_endpoint.is_none() || self.project_id.is_none())
        {
            return Err(ClientError::Config(
                "function execution needs appwrite_endpoint and project_id".into(),
            ));
        }

        let poll = self.poll.unwrap_or_default();
        poll.validate()?;

        let request_timeout = self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        if request_timeout.is_zero() {
            return Err(ClientError::Config("request_timeout must be positive".into()));
        }

        Ok(ClientConfig {
            api_base_url,
            appwrite_endpoint: self
                .appwrite_endpoint
                .map(|e| e.trim_end_matches('/').to_string()),
            project_id: self.project_id,
            function_id: self.function_id,
            request_timeout,
            poll,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::builder()
            .with_api_base_url("https://coffee.example.com/")
            .build()
            .unwrap();
        assert_eq!(config.api_base_url(), "https://coffee.example.com");
        assert_eq!(config.poll(), PollPolicy::default());
        assert_eq!(config.request_timeout(), DEFAULT_REQUEST_TIMEOUT);
        assert!(config.function_id().is_none());
    }

    #[test]
    fn test_missing_base_url() {
        let result = ClientConfig::builder().build();
        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[test]
    fn test_function_requires_appwrite_settings() {
        let result = ClientConfig::builder()
            .with_api_base_url("https://coffee.example.com")
            .with_function_id("claim-exchange")
            .build();
        assert!(matches!(result, Err(ClientError::Config(_))));

        let config = ClientConfig::builder()
            .with_api_base_url("https://coffee.example.com")
            .with_appwrite_endpoint("https://cloud.appwrite.io/v1/")
            .with_project_id("coffee")
            .with_function_id("claim-exchange")
            .build()
            .unwrap();
        assert_eq!(config.appwrite_endpoint(), Some("https://cloud.appwrite.io/v1"));
    }

    #[test]
    fn test_poll_policy_bounds() {
        let too_fast = PollPolicy {
            interval: Duration::from_millis(100),
            timeout: DEFAULT_POLL_TIMEOUT,
        };
        let too_long = PollPolicy {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: Duration::from_secs(120),
        };
        for poll in [too_fast, too_long] {
            let result = ClientConfig::builder()
                .with_api_base_url("https://coffee.example.com")
                .with_poll_policy(poll)
                .build();
            assert!(matches!(result, Err(ClientError::Config(_))));
        }
    }
}
