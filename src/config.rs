use std::time::Duration;

use reqwest::Client;

/// Configuration for the session client and token verifier
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// The identity project this client verifies tokens for
    pub(crate) project_id: String,
    /// Base URL of the remote identity service
    pub(crate) base_url: String,
    /// Tolerance applied to expiration checks (default: 5 seconds)
    pub(crate) clock_skew: Duration,
    /// Optional custom HTTP client for the key fetch and session endpoints
    /// If not provided, a default client will be created
    pub(crate) http_client: Option<Client>,
}

const DEFAULT_CLOCK_SKEW_SECS: u64 = 5;

impl ClientConfig {
    /// Create a new configuration for the given project and service base URL
    pub fn new(project_id: impl Into<String>, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();

        Self {
            project_id: project_id.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            clock_skew: Duration::from_secs(DEFAULT_CLOCK_SKEW_SECS),
            http_client: None,
        }
    }

    /// Set the clock-skew tolerance used when checking token expiration
    pub fn with_clock_skew(mut self, clock_skew: Duration) -> Self {
        self.clock_skew = clock_skew;
        self
    }

    /// Set a custom HTTP client
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }
}
