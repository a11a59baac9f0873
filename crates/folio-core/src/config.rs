//! Application settings.
//!
//! Settings cover where the site lives, which cache bucket and asset
//! manifest the worker uses, and where cached data and logs go.
//!
//! Settings are stored at `~/.config/folio/config.json`. A missing file means
//! defaults. `FOLIO_BASE_URL` and `FOLIO_CACHE_NAME` override the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::worker::{AssetManifest, Registration, DEFAULT_CACHE_NAME, DEFAULT_SCRIPT_PATH};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "folio";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Site origin used when none is configured (the local dev server).
const DEFAULT_BASE_URL: &str = "http://localhost:8000/";

/// Registration scope used when none is configured: the whole site, so the
/// shell assets outside the script's directory are intercepted too.
const DEFAULT_SCOPE: &str = "/";

pub const ENV_BASE_URL: &str = "FOLIO_BASE_URL";
pub const ENV_CACHE_NAME: &str = "FOLIO_CACHE_NAME";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root URL of the site.
    pub base_url: String,
    /// Worker script location, relative to `base_url`.
    pub script_path: String,
    /// Registration scope, relative to the script. Defaults to the site root;
    /// an explicit null uses the script's directory.
    pub scope: Option<String>,
    pub cache_name: String,
    pub assets: AssetManifest,
    /// Local copy of the site, used instead of HTTP when set.
    pub site_dir: Option<PathBuf>,
    /// Overrides the platform cache directory.
    pub cache_dir: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            script_path: DEFAULT_SCRIPT_PATH.to_string(),
            scope: Some(DEFAULT_SCOPE.to_string()),
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            assets: AssetManifest::default(),
            site_dir: None,
            cache_dir: None,
            log_file: None,
        }
    }
}

impl Settings {
    /// Load from the default location, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut settings = Self::load_from(&Self::config_path()?)?;
        settings.apply_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read settings: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse settings: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// practice). Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            self.base_url = base_url;
        }
        if let Some(cache_name) = lookup(ENV_CACHE_NAME) {
            self.cache_name = cache_name;
        }
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn base_url(&self) -> Result<Url> {
        let mut base = self.base_url.clone();
        // a base without trailing slash would make joins drop its last segment
        if !base.ends_with('/') {
            base.push('/');
        }
        Url::parse(&base).with_context(|| format!("Invalid base URL: {}", self.base_url))
    }

    pub fn script_url(&self) -> Result<Url> {
        self.base_url()?
            .join(&self.script_path)
            .with_context(|| format!("Invalid script path: {}", self.script_path))
    }

    pub fn registration(&self) -> Result<Registration> {
        let script_url = self.script_url()?;
        let registration = match self.scope {
            Some(ref scope) => Registration::with_scope(script_url, scope)?,
            None => Registration::new(script_url)?,
        };
        Ok(registration)
    }

    /// Resolve a path from the command line against the site root.
    pub fn resolve_url(&self, path: &str) -> Result<Url> {
        self.base_url()?
            .join(path)
            .with_context(|| format!("Invalid path: {path}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.cache_name, DEFAULT_CACHE_NAME);
        assert_eq!(
            settings.script_url().unwrap().as_str(),
            "http://localhost:8000/js/sw.js"
        );
        assert_eq!(
            settings.registration().unwrap().scope().as_str(),
            "http://localhost:8000/"
        );
    }

    #[test]
    fn test_null_scope_uses_script_directory() {
        let settings: Settings = serde_json::from_str(r#"{"scope": null}"#).unwrap();
        assert_eq!(
            settings.registration().unwrap().scope().as_str(),
            "http://localhost:8000/js/"
        );
    }

    #[tokio::test]
    async fn test_default_settings_serve_shell_from_cache() {
        use crate::worker::{DirFetcher, MemoryStorage, OfflineWorker, Request, ResponseSource};

        let site = tempfile::tempdir().unwrap();
        for file in [
            "index.html",
            "css/style.css",
            "js/app.js",
            "assets/data/site.config.json",
            "assets/images/stoked-logo.png",
            "assets/images/devreno.jpg",
            "assets/images/reno-gear.jpg",
        ] {
            let path = site.path().join(file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, file).unwrap();
        }

        let settings = Settings::default();
        let mut worker = OfflineWorker::new(
            settings.cache_name.clone(),
            settings.assets.clone(),
            settings.registration().unwrap(),
            MemoryStorage::new(),
            DirFetcher::new(settings.base_url().unwrap(), site.path().to_path_buf()),
        );
        let report = worker.install().await.unwrap();
        assert_eq!(report.cached.len(), 8);
        worker.activate().await.unwrap();

        // the site is gone: every shell asset must come from the cache
        drop(site);
        for path in ["/", "/index.html", "/css/style.css", "/assets/images/devreno.jpg"] {
            let request = Request::get(settings.resolve_url(path).unwrap());
            let outcome = worker.handle_fetch(&request).await.unwrap();
            assert!(outcome.intercepted, "{path} not intercepted");
            assert_eq!(outcome.source, ResponseSource::Cache, "{path} not cached");
        }
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"cache_name": "site-v2", "scope": "./"}"#).unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.cache_name, "site-v2");
        assert_eq!(settings.assets, AssetManifest::default());
        assert_eq!(
            settings.registration().unwrap().scope().as_str(),
            "http://localhost:8000/js/"
        );
    }

    #[test]
    fn test_missing_file_is_default() {
        let settings = Settings::load_from(Path::new("/no/such/folio.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let settings = Settings {
            site_dir: Some(PathBuf::from("/srv/site")),
            ..Settings::default()
        };
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_BASE_URL, "https://andrewnixdorf.com"),
            (ENV_CACHE_NAME, ""),
        ]
        .into_iter()
        .collect();
        let mut settings = Settings::default();
        settings.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(settings.base_url, "https://andrewnixdorf.com");
        // empty values are ignored
        assert_eq!(settings.cache_name, DEFAULT_CACHE_NAME);
        assert_eq!(
            settings.resolve_url("/index.html").unwrap().as_str(),
            "https://andrewnixdorf.com/index.html"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let settings = Settings {
            base_url: "not a url".to_string(),
            ..Settings::default()
        };
        assert!(settings.script_url().is_err());
    }
}
