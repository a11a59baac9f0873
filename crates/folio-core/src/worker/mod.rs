//! Offline cache worker.
//!
//! This module provides `OfflineWorker`, which keeps an offline-capable copy
//! of the site shell in a named cache bucket:
//!
//! - install: pre-cache every asset in the manifest, tolerating failures
//! - activate: delete every bucket except the current one
//! - fetch: serve from the bucket, falling back to the network on a miss
//!
//! Storage and network access sit behind the `CacheStorage` and `Fetcher`
//! traits so the lifecycle can run against memory, disk, HTTP, or a local
//! site directory.

pub mod error;
pub mod fetcher;
pub mod lifecycle;
pub mod manifest;
pub mod record;
pub mod request;
pub mod storage;

pub use error::WorkerError;
pub use fetcher::{DirFetcher, Fetcher, HttpFetcher};
pub use lifecycle::{
    ActivateReport, FetchOutcome, InstallReport, OfflineWorker, ResponseSource, WorkerState,
};
pub use manifest::{
    AssetManifest, Registration, DEFAULT_ASSETS, DEFAULT_CACHE_NAME, DEFAULT_SCRIPT_PATH,
};
pub use record::{RecordStore, WorkerRecord};
pub use request::{Request, Response};
pub use storage::{CacheStorage, CachedData, DiskStorage, EntryInfo, MemoryStorage};
