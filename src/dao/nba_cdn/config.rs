use std::time::Duration;

/// Public host serving the NBA live data documents.
pub const DEFAULT_BASE_URL: &str = "https://cdn.nba.com";

/// Runtime configuration describing how to reach the NBA live data CDN.
#[derive(Debug, Clone)]
pub struct NbaCdnConfig {
    pub base_url: String,
    pub request_timeout: Duration,
}

impl NbaCdnConfig {
    /// Construct a configuration for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout: Duration::from_secs(90),
        }
    }

    /// Bound every HTTP request by `timeout`.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl Default for NbaCdnConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
