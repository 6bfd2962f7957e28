//! Registry of which backend serves which model.
//!
//! The registry owns an immutable [`Snapshot`] behind a reader/writer lock.
//! Reads clone an `Arc` and never block a refresh; a refresh does all of its
//! network I/O lockless, builds the replacement snapshot, then swaps the
//! pointer in one write. Concurrent refreshes are not coalesced; the last one
//! to publish wins.

use crate::config::BackendConfig;
use crate::error::{ProxyError, Result};
use crate::filter::ModelFilter;
use crate::translate::ollama_types::ModelEntry;
use crate::upstream::UpstreamClient;

use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

/// One backend together with the model IDs it reported on the last scan.
/// Owned by the snapshot that contains it; never mutated after publish.
#[derive(Debug, Clone)]
pub struct Backend {
    pub endpoint: String,
    pub api_key: String,
    pub served: HashSet<String>,
}

impl Backend {
    pub fn config(&self) -> BackendConfig {
        BackendConfig {
            endpoint: self.endpoint.clone(),
            api_key: self.api_key.clone(),
        }
    }
}

/// An atomically-published view of the registry. `models` is the deduplicated
/// exposed list, sorted ascending by name; `backends` keeps configuration
/// order (backends that failed the scan are absent for that cycle).
#[derive(Debug, Default)]
pub struct Snapshot {
    pub models: Vec<ModelEntry>,
    pub backends: Vec<Backend>,
}

pub struct ModelRegistry {
    configured: Vec<BackendConfig>,
    filter: ModelFilter,
    client: reqwest::Client,
    snapshot: RwLock<Arc<Snapshot>>,
}

impl ModelRegistry {
    pub fn new(configured: Vec<BackendConfig>, client: reqwest::Client) -> Self {
        Self {
            configured,
            filter: ModelFilter::standard(),
            client,
            snapshot: RwLock::new(Arc::new(Snapshot::default())),
        }
    }

    /// Non-blocking read of the current snapshot.
    pub fn current_snapshot(&self) -> Arc<Snapshot> {
        self.snapshot
            .read()
            .map(|guard| Arc::clone(&guard))
            .unwrap_or_default()
    }

    /// Scan every configured backend and publish a fresh snapshot.
    ///
    /// A backend that fails to answer is skipped for this cycle with a
    /// warning. Only when every backend fails is the whole refresh an error,
    /// and in that case the prior snapshot is left untouched.
    pub async fn refresh(&self) -> Result<()> {
        let mut backends = Vec::new();
        let mut names: HashSet<String> = HashSet::new();

        for config in &self.configured {
            let upstream = UpstreamClient::new(self.client.clone(), config);
            let ids = match upstream.list_models().await {
                Ok(ids) => ids,
                Err(e) => {
                    warn!(endpoint = %config.endpoint, error = %e, "model scan failed, skipping backend");
                    continue;
                }
            };

            let served: HashSet<String> = ids
                .into_iter()
                .filter(|id| !self.filter.blocked(id))
                .collect();

            names.extend(served.iter().cloned());
            backends.push(Backend {
                endpoint: config.endpoint.clone(),
                api_key: config.api_key.clone(),
                served,
            });
        }

        if backends.is_empty() {
            return Err(ProxyError::provider(
                "model scan failed for every configured backend",
            ));
        }

        let mut models: Vec<ModelEntry> = names
            .into_iter()
            .map(|name| ModelEntry {
                model: name.clone(),
                name,
            })
            .collect();
        models.sort_by(|a, b| a.name.cmp(&b.name));

        info!(
            models = models.len(),
            backends = backends.len(),
            "model list updated"
        );

        let snapshot = Arc::new(Snapshot { models, backends });
        if let Ok(mut slot) = self.snapshot.write() {
            *slot = snapshot;
        }

        Ok(())
    }

    /// Pick the backend that should handle `model`.
    ///
    /// The registry is advisory, not a gate: an empty registry triggers one
    /// synchronous refresh, an empty result after that falls back to the
    /// legacy single-backend environment settings, and an unknown model is
    /// routed to the first backend and allowed to fail upstream.
    pub async fn resolve(&self, model: &str) -> BackendConfig {
        let mut snapshot = self.current_snapshot();

        if snapshot.backends.is_empty() {
            if let Err(e) = self.refresh().await {
                warn!(error = %e, "refresh during resolve failed");
            }
            snapshot = self.current_snapshot();
        }

        if snapshot.backends.is_empty() {
            return BackendConfig::legacy_from_env();
        }

        if let Some(backend) = snapshot.backends.iter().find(|b| b.served.contains(model)) {
            return backend.config();
        }

        snapshot.backends[0].config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(endpoint: &str, served: &[&str]) -> Backend {
        Backend {
            endpoint: endpoint.to_string(),
            api_key: format!("key-{endpoint}"),
            served: served.iter().map(ToString::to_string).collect(),
        }
    }

    fn registry_with_snapshot(backends: Vec<Backend>) -> ModelRegistry {
        let registry = ModelRegistry::new(Vec::new(), reqwest::Client::new());
        let snapshot = Arc::new(Snapshot {
            models: Vec::new(),
            backends,
        });
        *registry.snapshot.write().unwrap() = snapshot;
        registry
    }

    #[tokio::test]
    async fn test_resolve_returns_first_serving_backend() {
        let registry = registry_with_snapshot(vec![
            backend("a.example", &["alpha"]),
            backend("b.example", &["beta", "shared"]),
            backend("c.example", &["shared"]),
        ]);

        assert_eq!(registry.resolve("beta").await.endpoint, "b.example");
        // Two backends serve "shared"; configuration order breaks the tie.
        assert_eq!(registry.resolve("shared").await.endpoint, "b.example");
    }

    #[tokio::test]
    async fn test_resolve_falls_back_to_first_backend() {
        let registry = registry_with_snapshot(vec![
            backend("a.example", &["alpha"]),
            backend("b.example", &["beta"]),
        ]);

        let picked = registry.resolve("nonexistent").await;
        assert_eq!(picked.endpoint, "a.example");
        assert_eq!(picked.api_key, "key-a.example");
    }

    #[test]
    fn test_snapshot_reads_share_one_allocation() {
        let registry = registry_with_snapshot(vec![backend("a.example", &["alpha"])]);
        let first = registry.current_snapshot();
        let second = registry.current_snapshot();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
