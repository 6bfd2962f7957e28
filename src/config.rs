//! Environment-sourced configuration.
//!
//! Backends are described by the `API_PROVIDERS` variable, a semicolon-separated
//! list of `endpoint,api_key` pairs. When that variable is absent or yields no
//! valid entry, the single-backend `API_BASE_URL`/`API_KEY` pair is used instead,
//! so a one-provider deployment needs no multi-backend configuration at all.

use tracing::warn;

/// One upstream backend: where to reach it and how to authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub endpoint: String,
    pub api_key: String,
}

impl BackendConfig {
    /// The single-backend escape hatch: `API_BASE_URL` + `API_KEY`.
    pub fn legacy_from_env() -> Self {
        Self {
            endpoint: env_or_default("API_BASE_URL", ""),
            api_key: env_or_default("API_KEY", ""),
        }
    }
}

/// Parse a `endpoint,key;endpoint,key` descriptor string into backend configs.
///
/// Entries that are not exactly two comma-separated parts are dropped with a
/// warning; they never abort parsing.
pub fn parse_backends(raw: &str) -> Vec<BackendConfig> {
    let mut backends = Vec::new();

    for entry in raw.split(';') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }

        let parts: Vec<&str> = entry.split(',').map(str::trim).collect();
        if parts.len() != 2 {
            warn!(entry, "dropping malformed backend entry");
            continue;
        }

        backends.push(BackendConfig {
            endpoint: parts[0].to_string(),
            api_key: parts[1].to_string(),
        });
    }

    backends
}

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    pub backends: Vec<BackendConfig>,
}

impl ProxyConfig {
    pub fn from_env() -> Self {
        let raw = std::env::var("API_PROVIDERS").unwrap_or_default();
        let mut backends = parse_backends(&raw);
        if backends.is_empty() {
            backends.push(BackendConfig::legacy_from_env());
        }

        let port = std::env::var("PORT_SERVE")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(11434);

        Self {
            host: env_or_default("HOST_SERVE", "0.0.0.0"),
            port,
            backends,
        }
    }
}

fn env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
