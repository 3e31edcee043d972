//! Shared HTTP client construction
//!
//! Every feed client wraps `reqwest` in the retry middleware so transient
//! upstream failures (the government feature services in particular) get an
//! exponential backoff before the panel falls back to its empty default.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};

/// User agent sent to every upstream service
pub const USER_AGENT: &str = concat!("hazardwatch/", env!("CARGO_PKG_VERSION"));

/// Build a feed client with the given timeout and retry limit
pub fn build_client(timeout_seconds: u32, max_retries: u32) -> Result<ClientWithMiddleware> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(u64::from(timeout_seconds)))
        .user_agent(USER_AGENT)
        .build()
        .with_context(|| "Failed to create HTTP client")?;

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client() {
        assert!(build_client(10, 3).is_ok());
        assert!(build_client(1, 0).is_ok());
    }

    #[test]
    fn test_user_agent_carries_version() {
        assert!(USER_AGENT.starts_with("hazardwatch/"));
    }
}
