//! Server configuration.
//!
//! Resolved with two levels of precedence (highest wins), narrowed from the
//! core engine's five-level precedence since `serve` has no project/user
//! TOML layer to overlay (see `DESIGN.md`):
//!
//! 1. CLI flags
//! 2. Environment variables (`BEINGDB_*`)
//! 3. Compiled-in defaults

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Runtime configuration for the `serve` process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// TCP port to bind.
    #[serde(default = "ServerConfig::default_port")]
    pub port: u16,

    /// Server-wide ceiling on returned results per request.
    #[serde(default = "ServerConfig::default_max_results")]
    pub max_results: usize,

    /// Admission gate size: maximum concurrently executing query handlers.
    #[serde(default = "ServerConfig::default_max_concurrent")]
    pub max_concurrent: usize,

    /// Per-query wall-clock deadline, in seconds.
    #[serde(default = "ServerConfig::default_query_timeout_secs")]
    pub query_timeout_secs: u64,

    /// Cap on candidate bindings produced during one query's join.
    #[serde(default = "ServerConfig::default_max_intermediate_results")]
    pub max_intermediate_results: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: Self::default_port(),
            max_results: Self::default_max_results(),
            max_concurrent: Self::default_max_concurrent(),
            query_timeout_secs: Self::default_query_timeout_secs(),
            max_intermediate_results: Self::default_max_intermediate_results(),
        }
    }
}

impl ServerConfig {
    fn default_port() -> u16 {
        8080
    }
    fn default_max_results() -> usize {
        1000
    }
    fn default_max_concurrent() -> usize {
        20
    }
    fn default_query_timeout_secs() -> u64 {
        5
    }
    fn default_max_intermediate_results() -> usize {
        10_000
    }

    /// Start from compiled-in defaults, then overlay `BEINGDB_*` environment
    /// variables. CLI flags are applied on top of this by the caller
    /// (`beingdb-cli`'s `serve` subcommand), since `clap` already gives CLI
    /// flags the highest precedence by construction.
    pub fn load() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("BEINGDB_PORT") {
            if let Ok(port) = v.parse() {
                self.port = port;
            }
        }
        if let Ok(v) = std::env::var("BEINGDB_MAX_RESULTS") {
            if let Ok(n) = v.parse() {
                self.max_results = n;
            }
        }
        if let Ok(v) = std::env::var("BEINGDB_MAX_CONCURRENT") {
            if let Ok(n) = v.parse() {
                self.max_concurrent = n;
            }
        }
        if let Ok(v) = std::env::var("BEINGDB_QUERY_TIMEOUT_SECS") {
            if let Ok(n) = v.parse() {
                self.query_timeout_secs = n;
            }
        }
        if let Ok(v) = std::env::var("BEINGDB_MAX_INTERMEDIATE_RESULTS") {
            if let Ok(n) = v.parse() {
                self.max_intermediate_results = n;
            }
        }
    }

    /// The query timeout as a [`Duration`], for handing to [`beingdb_core::ExecutionConfig`].
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let config = ServerConfig::default();
        assert_eq!(config.max_concurrent, 20);
        assert_eq!(config.query_timeout_secs, 5);
    }
}
