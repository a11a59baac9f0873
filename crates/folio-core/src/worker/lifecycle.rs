//! The worker lifecycle: install, activate, fetch.
//!
//! Each lifecycle event is an async method. The caller awaiting it plays the
//! host: the worker does not move to the next phase until the future settles.
//! Install and activate take `&mut self`, so fetch handling (`&self`) can never
//! overlap with a phase that writes to or prunes cache storage.

use std::fmt;

use futures::future::join_all;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::fetcher::Fetcher;
use super::manifest::{AssetManifest, Registration};
use super::storage::CacheStorage;
use super::{Request, Response, WorkerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// Install failed; the worker will never control a page.
    Redundant,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        };
        f.write_str(name)
    }
}

/// One asset that could not be pre-cached.
#[derive(Debug)]
pub struct AssetFailure {
    pub path: String,
    pub error: WorkerError,
}

#[derive(Debug, Default)]
pub struct InstallReport {
    /// URLs stored in the bucket, in manifest order.
    pub cached: Vec<Url>,
    pub failed: Vec<AssetFailure>,
}

impl InstallReport {
    pub fn attempted(&self) -> usize {
        self.cached.len() + self.failed.len()
    }
}

/// A bucket that activate tried and failed to delete.
#[derive(Debug)]
pub struct DeleteFailure {
    pub bucket: String,
    pub error: WorkerError,
}

#[derive(Debug, Default)]
pub struct ActivateReport {
    pub kept: Option<String>,
    pub deleted: Vec<String>,
    pub failures: Vec<DeleteFailure>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Cache,
    Network,
}

impl fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseSource::Cache => f.write_str("cache"),
            ResponseSource::Network => f.write_str("network"),
        }
    }
}

#[derive(Debug)]
pub struct FetchOutcome {
    pub response: Response,
    pub source: ResponseSource,
    /// False when the request was outside the registration scope and went
    /// straight to the network.
    pub intercepted: bool,
}

pub struct OfflineWorker<S, F> {
    cache_name: String,
    manifest: AssetManifest,
    registration: Registration,
    storage: S,
    fetcher: F,
    state: WorkerState,
}

impl<S: CacheStorage, F: Fetcher> OfflineWorker<S, F> {
    pub fn new(
        cache_name: impl Into<String>,
        manifest: AssetManifest,
        registration: Registration,
        storage: S,
        fetcher: F,
    ) -> Self {
        Self {
            cache_name: cache_name.into(),
            manifest,
            registration,
            storage,
            fetcher,
            state: WorkerState::Parsed,
        }
    }

    /// Resume a worker at a previously recorded lifecycle position.
    /// Transitional states are not resumable and fall back to the phase
    /// that was in progress.
    pub fn resume(mut self, state: WorkerState) -> Self {
        self.state = match state {
            WorkerState::Installing => WorkerState::Parsed,
            WorkerState::Activating => WorkerState::Installed,
            other => other,
        };
        self
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    pub fn manifest(&self) -> &AssetManifest {
        &self.manifest
    }

    pub fn registration(&self) -> &Registration {
        &self.registration
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn expect_state(&self, expected: WorkerState, operation: &'static str) -> Result<(), WorkerError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(WorkerError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    /// Fetch a request and store the response, like `Cache.add`.
    async fn add(&self, request: Request) -> Result<Url, WorkerError> {
        let response = self.fetcher.fetch(&request).await?;
        if !response.ok() {
            return Err(WorkerError::from_status(request.url.as_str(), response.status));
        }
        self.storage.put(&self.cache_name, &request, &response)?;
        Ok(request.url)
    }

    /// Install: open the bucket and attempt to add every manifest asset.
    ///
    /// Every asset is attempted exactly once, concurrently, and the method
    /// waits for all attempts to settle. Individual failures are logged and
    /// reported but never fail the install. Only a bucket that cannot be
    /// opened does, and that leaves the worker redundant.
    pub async fn install(&mut self) -> Result<InstallReport, WorkerError> {
        self.expect_state(WorkerState::Parsed, "install")?;
        self.state = WorkerState::Installing;

        if let Err(e) = self.storage.open(&self.cache_name) {
            warn!(cache = %self.cache_name, error = %e, "Failed to open cache bucket");
            self.state = WorkerState::Redundant;
            return Err(e);
        }
        if self.manifest.is_empty() {
            warn!(cache = %self.cache_name, "Asset manifest is empty, nothing to pre-cache");
        }
        debug!(cache = %self.cache_name, assets = self.manifest.len(), "Installing");

        let this = &*self;
        let script_url = this.registration.script_url();
        let attempts = this.manifest.resolve_each(script_url).map(|(path, request)| async move {
            let result = match request {
                Ok(request) => this.add(request).await,
                Err(e) => Err(e),
            };
            (path.to_string(), result)
        });

        let mut report = InstallReport::default();
        for (path, result) in join_all(attempts).await {
            match result {
                Ok(url) => {
                    debug!(asset = %path, url = %url, "Cached asset");
                    report.cached.push(url);
                }
                Err(error) => {
                    warn!(asset = %path, error = %error, "Asset failed to cache");
                    report.failed.push(AssetFailure { path, error });
                }
            }
        }

        if !report.failed.is_empty() {
            warn!(
                cache = %self.cache_name,
                failed = report.failed.len(),
                total = report.attempted(),
                "Some assets failed to cache"
            );
        }
        info!(cache = %self.cache_name, cached = report.cached.len(), "Install complete");
        self.state = WorkerState::Installed;
        Ok(report)
    }

    /// Install again whatever the current state, the way a browser installs an
    /// updated worker script under the same cache name. Existing entries in
    /// the bucket are replaced as assets are re-added.
    pub async fn reinstall(&mut self) -> Result<InstallReport, WorkerError> {
        info!(cache = %self.cache_name, from = %self.state, "Reinstalling");
        self.state = WorkerState::Parsed;
        self.install().await
    }

    /// Activate: delete every bucket whose name is not the current one.
    ///
    /// Failing to enumerate buckets is fatal and leaves the worker installed so
    /// activation can be retried. Failing to delete a single bucket is logged
    /// and reported; the remaining buckets are still pruned.
    pub async fn activate(&mut self) -> Result<ActivateReport, WorkerError> {
        self.expect_state(WorkerState::Installed, "activate")?;
        self.state = WorkerState::Activating;

        let keys = match self.storage.keys() {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "Failed to enumerate cache buckets");
                self.state = WorkerState::Installed;
                return Err(e);
            }
        };

        let mut report = ActivateReport::default();
        for key in keys {
            if key == self.cache_name {
                report.kept = Some(key);
                continue;
            }
            match self.storage.delete(&key) {
                Ok(_) => {
                    info!(bucket = %key, "Deleted stale cache bucket");
                    report.deleted.push(key);
                }
                Err(error) => {
                    warn!(bucket = %key, error = %error, "Failed to delete stale cache bucket");
                    report.failures.push(DeleteFailure { bucket: key, error });
                }
            }
        }

        self.state = WorkerState::Activated;
        info!(cache = %self.cache_name, deleted = report.deleted.len(), "Activate complete");
        Ok(report)
    }

    /// Fetch: serve from the current bucket, falling back to the network.
    ///
    /// A miss is not written back; the bucket is only populated at install.
    /// Network errors on the fallback are returned to the caller as-is.
    pub async fn handle_fetch(&self, request: &Request) -> Result<FetchOutcome, WorkerError> {
        self.expect_state(WorkerState::Activated, "handle fetch")?;

        if !self.registration.in_scope(&request.url) {
            debug!(url = %request.url, "Out of scope, not intercepted");
            let response = self.fetcher.fetch(request).await?;
            return Ok(FetchOutcome {
                response,
                source: ResponseSource::Network,
                intercepted: false,
            });
        }

        match self.storage.match_request(&self.cache_name, request) {
            Ok(Some(response)) => {
                debug!(url = %request.url, "Cache hit");
                return Ok(FetchOutcome {
                    response,
                    source: ResponseSource::Cache,
                    intercepted: true,
                });
            }
            Ok(None) => debug!(url = %request.url, "Cache miss"),
            Err(e) => warn!(url = %request.url, error = %e, "Cache lookup failed, using network"),
        }

        let response = self.fetcher.fetch(request).await?;
        Ok(FetchOutcome {
            response,
            source: ResponseSource::Network,
            intercepted: true,
        })
    }
}
