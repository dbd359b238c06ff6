// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::Result;
use crate::models::SourceConfig;

/// Create a configured asynchronous HTTP client for the content source.
pub fn create_async_client(config: &SourceConfig) -> Result<reqwest::Client> {
    build_client(&config.user_agent, config.timeout_secs)
}

/// Create an asynchronous HTTP client with an explicit user agent and timeout.
pub fn build_client(user_agent: &str, timeout_secs: u64) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(timeout_secs))
        .build()?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builds_from_defaults() {
        assert!(create_async_client(&SourceConfig::default()).is_ok());
    }
}
