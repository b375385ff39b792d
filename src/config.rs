use std::env;

use eyre::{Result, WrapErr};
use tracing::debug;
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://researchpaperragbackend.onrender.com";

/// Environment variable overriding [`DEFAULT_API_BASE`].
pub const API_BASE_ENV: &str = "PAPER_CHAT_API_BASE";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
}

impl ClientConfig {
    /// Resolves the service base URL: command line flag, then environment, then default.
    pub fn resolve(cli_base_url: Option<&str>) -> Result<Self> {
        let raw = match cli_base_url {
            Some(url) => url.to_string(),
            None => env::var(API_BASE_ENV).unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
        };

        debug!("Using service base URL: {}", raw);
        Self::from_url(&raw)
    }

    pub fn from_url(raw: &str) -> Result<Self> {
        let base_url = Url::parse(raw.trim())
            .wrap_err_with(|| format!("Invalid service base URL: {}", raw))?;
        Ok(Self { base_url })
    }

    /// Absolute URL of an endpoint below the base URL, e.g. `upload`.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_doubling_slashes() {
        let config = ClientConfig::from_url("http://localhost:8000/").unwrap();
        assert_eq!(config.endpoint("/upload"), "http://localhost:8000/upload");

        let config = ClientConfig::from_url("http://localhost:8000/api").unwrap();
        assert_eq!(config.endpoint("ask"), "http://localhost:8000/api/ask");
    }

    #[test]
    fn cli_flag_wins_over_default() {
        let config = ClientConfig::resolve(Some("http://example.test")).unwrap();
        assert_eq!(config.endpoint("clear"), "http://example.test/clear");
    }

    #[test]
    fn rejects_invalid_url() {
        assert!(ClientConfig::from_url("not a url").is_err());
    }
}
