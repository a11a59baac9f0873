//! Asset manifest and worker registration.

use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::{Request, WorkerError};

/// Name of the cache bucket. Changing it is how a deploy invalidates old caches.
pub const DEFAULT_CACHE_NAME: &str = "andrewnixdorf-website";

/// Path of the worker script relative to the site root.
pub const DEFAULT_SCRIPT_PATH: &str = "js/sw.js";

/// Assets needed for the offline shell, relative to the worker script.
pub const DEFAULT_ASSETS: &[&str] = &[
    "../",
    "../index.html",
    "../css/style.css",
    "./app.js",
    "../assets/data/site.config.json",
    "../assets/images/stoked-logo.png",
    "../assets/images/devreno.jpg",
    "../assets/images/reno-gear.jpg",
];

/// Ordered list of asset paths to pre-cache on install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetManifest {
    paths: Vec<String>,
}

impl Default for AssetManifest {
    fn default() -> Self {
        Self::new(DEFAULT_ASSETS.iter().map(|s| s.to_string()))
    }
}

impl AssetManifest {
    pub fn new(paths: impl IntoIterator<Item = String>) -> Self {
        Self {
            paths: paths.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Resolve each path against the worker script URL, in manifest order.
    /// Duplicates are kept: each entry gets its own add attempt.
    pub fn resolve_each<'a>(
        &'a self,
        script_url: &'a Url,
    ) -> impl Iterator<Item = (&'a str, Result<Request, WorkerError>)> + 'a {
        self.paths.iter().map(move |path| {
            let resolved = script_url
                .join(path)
                .map(Request::get)
                .map_err(|e| WorkerError::InvalidUrl(format!("{path}: {e}")));
            (path.as_str(), resolved)
        })
    }

    /// Resolve every path, failing on the first one that is not a valid URL.
    pub fn resolve(&self, script_url: &Url) -> Result<Vec<Request>, WorkerError> {
        self.resolve_each(script_url).map(|(_, r)| r).collect()
    }
}

/// Where the worker script lives and which URLs it may intercept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    script_url: Url,
    scope: Url,
}

impl Registration {
    /// Register with the default scope: the directory containing the script.
    pub fn new(script_url: Url) -> Result<Self, WorkerError> {
        let scope = script_url
            .join("./")
            .map_err(|e| WorkerError::InvalidUrl(format!("{script_url}: {e}")))?;
        Ok(Self { script_url, scope })
    }

    /// Register with an explicit scope, resolved against the script URL.
    pub fn with_scope(script_url: Url, scope: &str) -> Result<Self, WorkerError> {
        let scope = script_url
            .join(scope)
            .map_err(|e| WorkerError::InvalidUrl(format!("{scope}: {e}")))?;
        if scope.origin() != script_url.origin() {
            return Err(WorkerError::InvalidUrl(format!(
                "scope {scope} is not on the script origin"
            )));
        }
        Ok(Self { script_url, scope })
    }

    pub fn script_url(&self) -> &Url {
        &self.script_url
    }

    pub fn scope(&self) -> &Url {
        &self.scope
    }

    /// Whether a request URL falls under this registration's scope.
    pub fn in_scope(&self, url: &Url) -> bool {
        url.origin() == self.scope.origin() && url.path().starts_with(self.scope.path())
    }
}
