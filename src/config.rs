//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;

/// Default data.gov.sg datastore search endpoint
pub const DEFAULT_UPSTREAM_URL: &str = "https://data.gov.sg/api/action/datastore_search";

/// Dataset identifier of the HDB resale flat prices table
pub const DEFAULT_RESOURCE_ID: &str = "f1765b54-a209-4718-8d38-a39237f502b3";

/// Default cap on the upstream requests one query may plan
pub const DEFAULT_MAX_PLAN_REQUESTS: usize = 10_000;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of upstream requests issued concurrently per batch
    pub fetch_batch_size: usize,
    /// Largest months × lease years product a query may expand to
    pub max_plan_requests: usize,
    /// HTTP server port
    pub server_port: u16,
    /// Lifetime of a cached aggregate in seconds
    pub cache_ttl: u64,
    /// Upstream datastore search endpoint
    pub upstream_url: String,
    /// Upstream dataset identifier
    pub resource_id: String,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `FETCH_BATCH_SIZE` - Upstream fan-out batch size (default: 5)
    /// - `MAX_PLAN_REQUESTS` - Upstream requests allowed per query (default: 10000)
    /// - `SERVER_PORT` - HTTP server port (default: 6000)
    /// - `CACHE_TTL_SECS` - Cache entry lifetime in seconds (default: 86400)
    /// - `UPSTREAM_URL` - Datastore search endpoint
    /// - `RESOURCE_ID` - Dataset identifier
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            fetch_batch_size: parse_var("FETCH_BATCH_SIZE")
                .unwrap_or(defaults.fetch_batch_size)
                .max(1),
            max_plan_requests: parse_var("MAX_PLAN_REQUESTS")
                .unwrap_or(defaults.max_plan_requests)
                .max(1),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            cache_ttl: parse_var("CACHE_TTL_SECS").unwrap_or(defaults.cache_ttl),
            upstream_url: env::var("UPSTREAM_URL").unwrap_or(defaults.upstream_url),
            resource_id: env::var("RESOURCE_ID").unwrap_or(defaults.resource_id),
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetch_batch_size: 5,
            max_plan_requests: DEFAULT_MAX_PLAN_REQUESTS,
            server_port: 6000,
            cache_ttl: 24 * 60 * 60,
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            resource_id: DEFAULT_RESOURCE_ID.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.fetch_batch_size, 5);
        assert_eq!(config.max_plan_requests, 10_000);
        assert_eq!(config.server_port, 6000);
        assert_eq!(config.cache_ttl, 86_400);
        assert_eq!(config.upstream_url, DEFAULT_UPSTREAM_URL);
        assert_eq!(config.resource_id, DEFAULT_RESOURCE_ID);
    }

    // Both env cases live in one test so they never race each other.
    #[test]
    fn test_config_from_env() {
        env::remove_var("FETCH_BATCH_SIZE");
        env::remove_var("SERVER_PORT");
        env::remove_var("CACHE_TTL_SECS");
        env::remove_var("UPSTREAM_URL");
        env::remove_var("RESOURCE_ID");
        env::remove_var("MAX_PLAN_REQUESTS");

        let config = Config::from_env();
        assert_eq!(config.fetch_batch_size, 5);
        assert_eq!(config.server_port, 6000);
        assert_eq!(config.cache_ttl, 86_400);

        env::set_var("FETCH_BATCH_SIZE", "0");
        env::set_var("SERVER_PORT", "not-a-port");
        let config = Config::from_env();
        assert_eq!(config.fetch_batch_size, 1);
        assert_eq!(config.server_port, 6000);

        env::set_var("FETCH_BATCH_SIZE", "12");
        env::set_var("MAX_PLAN_REQUESTS", "250");
        let config = Config::from_env();
        assert_eq!(config.fetch_batch_size, 12);
        assert_eq!(config.max_plan_requests, 250);

        env::remove_var("FETCH_BATCH_SIZE");
        env::remove_var("SERVER_PORT");
        env::remove_var("MAX_PLAN_REQUESTS");
    }
}
