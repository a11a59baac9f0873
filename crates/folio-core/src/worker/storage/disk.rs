use std::path::{Path, PathBuf};

use reqwest::Url;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::{CacheStorage, CachedData, EntryInfo};
use crate::worker::request::StoredRequest;
use crate::worker::{Request, Response, WorkerError};

/// Marker file that identifies a bucket directory and records its name.
const BUCKET_FILE: &str = "bucket.json";

#[derive(Debug, Serialize, Deserialize)]
struct BucketMeta {
    name: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    request: StoredRequest,
    response_url: String,
    status: u16,
    headers: Vec<(String, String)>,
}

/// Cache storage persisted under a root directory.
///
/// Each bucket is a directory named after the SHA-256 of the bucket name.
/// Each entry is a JSON metadata file plus a raw body file, both named after
/// the SHA-256 of the request's cache key. The body is written first so a
/// metadata file always points at a complete body.
pub struct DiskStorage {
    root: PathBuf,
}

fn digest(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

fn is_digest(name: &str) -> bool {
    name.len() == 64 && name.bytes().all(|b| b.is_ascii_hexdigit())
}

impl DiskStorage {
    pub fn new(root: PathBuf) -> Result<Self, WorkerError> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_dir(&self, name: &str) -> PathBuf {
        self.root.join(digest(name))
    }

    fn entry_paths(&self, name: &str, request: &Request) -> (PathBuf, PathBuf) {
        let dir = self.bucket_dir(name);
        let key = digest(&request.cache_key());
        (dir.join(format!("{key}.json")), dir.join(format!("{key}.body")))
    }

    fn load<T: DeserializeOwned>(path: &Path) -> Result<Option<CachedData<T>>, WorkerError> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn save<T: Serialize>(path: &Path, data: &T) -> Result<(), WorkerError> {
        let cached = CachedData::new(data);
        std::fs::write(path, serde_json::to_string_pretty(&cached)?)?;
        Ok(())
    }

    /// True when `dir` is a bucket directory without a readable marker.
    fn is_orphan(dir: &Path) -> bool {
        dir.is_dir()
            && !matches!(Self::load::<BucketMeta>(&dir.join(BUCKET_FILE)), Ok(Some(_)))
    }

    fn require_bucket(&self, name: &str) -> Result<PathBuf, WorkerError> {
        let dir = self.bucket_dir(name);
        if dir.join(BUCKET_FILE).exists() {
            Ok(dir)
        } else {
            Err(WorkerError::Storage(format!("bucket not open: {name}")))
        }
    }
}

impl CacheStorage for DiskStorage {
    fn open(&self, name: &str) -> Result<(), WorkerError> {
        let dir = self.bucket_dir(name);
        let marker = dir.join(BUCKET_FILE);
        if marker.exists() {
            return Ok(());
        }
        std::fs::create_dir_all(&dir)?;
        Self::save(
            &marker,
            &BucketMeta {
                name: name.to_string(),
            },
        )?;
        debug!(bucket = name, dir = %dir.display(), "Created cache bucket");
        Ok(())
    }

    /// Buckets in creation order. A bucket directory whose marker is missing
    /// or unreadable has lost its name, so it is listed by its directory name
    /// after the named buckets. `delete` accepts that name.
    fn keys(&self) -> Result<Vec<String>, WorkerError> {
        let mut buckets = Vec::new();
        let mut orphans = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }
            match Self::load::<BucketMeta>(&path.join(BUCKET_FILE)) {
                Ok(Some(meta)) => buckets.push((meta.cached_at, meta.data.name)),
                result => {
                    let Some(dir_name) = path.file_name().and_then(|n| n.to_str()) else {
                        continue;
                    };
                    if let Err(e) = result {
                        warn!(dir = %path.display(), error = %e, "Unreadable cache bucket");
                    }
                    orphans.push(dir_name.to_string());
                }
            }
        }
        buckets.sort();
        orphans.sort();
        Ok(buckets
            .into_iter()
            .map(|(_, name)| name)
            .chain(orphans)
            .collect())
    }

    fn delete(&self, name: &str) -> Result<bool, WorkerError> {
        let dir = self.bucket_dir(name);
        if dir.exists() {
            std::fs::remove_dir_all(&dir)?;
            return Ok(true);
        }
        let orphan = self.root.join(name);
        if is_digest(name) && Self::is_orphan(&orphan) {
            debug!(dir = %orphan.display(), "Removing unnamed cache bucket");
            std::fs::remove_dir_all(&orphan)?;
            return Ok(true);
        }
        Ok(false)
    }

    fn match_request(&self, name: &str, request: &Request) -> Result<Option<Response>, WorkerError> {
        let (meta_path, body_path) = self.entry_paths(name, request);
        let Some(cached) = Self::load::<StoredEntry>(&meta_path)? else {
            return Ok(None);
        };
        let entry = cached.data;
        let url = Url::parse(&entry.response_url)
            .map_err(|e| WorkerError::Storage(format!("corrupt entry url: {e}")))?;
        let body = std::fs::read(&body_path)?;
        Ok(Some(Response {
            url,
            status: entry.status,
            headers: entry.headers,
            body,
        }))
    }

    fn put(&self, name: &str, request: &Request, response: &Response) -> Result<(), WorkerError> {
        self.require_bucket(name)?;
        let (meta_path, body_path) = self.entry_paths(name, request);
        std::fs::write(&body_path, &response.body)?;
        Self::save(
            &meta_path,
            &StoredEntry {
                request: request.into(),
                response_url: response.url.to_string(),
                status: response.status,
                headers: response.headers.clone(),
            },
        )
    }

    fn entries(&self, name: &str) -> Result<Vec<EntryInfo>, WorkerError> {
        let dir = self.bucket_dir(name);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for item in std::fs::read_dir(&dir)? {
            let path = item?.path();
            let is_entry = path.extension().is_some_and(|ext| ext == "json")
                && path.file_name().is_some_and(|f| f != BUCKET_FILE);
            if !is_entry {
                continue;
            }
            let Some(cached) = Self::load::<StoredEntry>(&path)? else {
                continue;
            };
            let size = std::fs::metadata(path.with_extension("body"))
                .map(|m| m.len() as usize)
                .unwrap_or(0);
            entries.push(EntryInfo {
                method: cached.data.request.method,
                url: cached.data.request.url,
                status: cached.data.status,
                size,
                cached: CachedData {
                    data: (),
                    cached_at: cached.cached_at,
                },
            });
        }
        entries.sort_by(|a, b| a.url.cmp(&b.url));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> (tempfile::TempDir, DiskStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = DiskStorage::new(dir.path().join("caches")).unwrap();
        (dir, storage)
    }

    #[test]
    fn test_put_match_round_trip() {
        let (_dir, storage) = storage();
        storage.open("site-v1").unwrap();

        let req = Request::parse("https://example.com/css/style.css").unwrap();
        let resp = Response::new(req.url.clone(), 200, b"body { }".to_vec())
            .with_header("content-type", "text/css");
        storage.put("site-v1", &req, &resp).unwrap();

        let found = storage.match_request("site-v1", &req).unwrap();
        assert_eq!(found, Some(resp));
    }

    #[test]
    fn test_miss_returns_none() {
        let (_dir, storage) = storage();
        storage.open("site-v1").unwrap();
        let req = Request::parse("https://example.com/nope").unwrap();
        assert_eq!(storage.match_request("site-v1", &req).unwrap(), None);
        assert_eq!(storage.match_request("other", &req).unwrap(), None);
    }

    #[test]
    fn test_keys_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let storage = DiskStorage::new(dir.path().to_path_buf()).unwrap();
            storage.open("site-v1").unwrap();
            storage.open("site-v2").unwrap();
        }
        let storage = DiskStorage::new(dir.path().to_path_buf()).unwrap();
        let mut keys = storage.keys().unwrap();
        keys.sort();
        assert_eq!(keys, vec!["site-v1", "site-v2"]);
    }

    #[test]
    fn test_delete_removes_entries() {
        let (_dir, storage) = storage();
        storage.open("site-v1").unwrap();
        let req = Request::parse("https://example.com/a.html").unwrap();
        storage
            .put("site-v1", &req, &Response::new(req.url.clone(), 200, "a"))
            .unwrap();

        assert!(storage.delete("site-v1").unwrap());
        assert!(!storage.delete("site-v1").unwrap());
        assert!(storage.keys().unwrap().is_empty());
        assert_eq!(storage.match_request("site-v1", &req).unwrap(), None);
    }

    #[test]
    fn test_put_without_open_fails() {
        let (_dir, storage) = storage();
        let req = Request::parse("https://example.com/a.html").unwrap();
        let resp = Response::new(req.url.clone(), 200, "a");
        assert!(matches!(
            storage.put("site-v1", &req, &resp),
            Err(WorkerError::Storage(_))
        ));
    }

    #[test]
    fn test_entries_report_size() {
        let (_dir, storage) = storage();
        storage.open("site-v1").unwrap();
        let req = Request::parse("https://example.com/a.html").unwrap();
        storage
            .put("site-v1", &req, &Response::new(req.url.clone(), 200, "hello"))
            .unwrap();

        let entries = storage.entries("site-v1").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].url, "https://example.com/a.html");
        assert_eq!(entries[0].size, 5);
        assert_eq!(entries[0].status, 200);
    }

    fn corrupt_marker(storage: &DiskStorage, name: &str) {
        let marker = storage.bucket_dir(name).join(BUCKET_FILE);
        std::fs::write(marker, "{ not json").unwrap();
    }

    fn bucket_dirs(storage: &DiskStorage) -> usize {
        std::fs::read_dir(storage.root())
            .unwrap()
            .filter(|e| e.as_ref().unwrap().path().is_dir())
            .count()
    }

    #[test]
    fn test_unreadable_bucket_listed_and_deletable() {
        let (_dir, storage) = storage();
        storage.open("site-v1").unwrap();
        storage.open("site-v2").unwrap();
        corrupt_marker(&storage, "site-v1");

        let keys = storage.keys().unwrap();
        assert_eq!(keys, vec!["site-v2".to_string(), digest("site-v1")]);

        assert!(storage.delete(&keys[1]).unwrap());
        assert_eq!(storage.keys().unwrap(), vec!["site-v2"]);
        assert_eq!(bucket_dirs(&storage), 1);
    }

    #[test]
    fn test_delete_by_directory_name_spares_named_buckets() {
        let (_dir, storage) = storage();
        storage.open("site-v1").unwrap();
        // a healthy bucket is only deleted by its real name
        assert!(!storage.delete(&digest("site-v1")).unwrap());
        assert!(!storage.delete("../caches").unwrap());
        assert_eq!(storage.keys().unwrap(), vec!["site-v1"]);
    }

    #[tokio::test]
    async fn test_activate_prunes_unreadable_bucket() {
        use crate::worker::{AssetManifest, DirFetcher, OfflineWorker, Registration, WorkerState};

        let (dir, storage) = storage();
        storage.open("site-v1").unwrap();
        corrupt_marker(&storage, "site-v1");

        let base = Url::parse("http://localhost:8000/").unwrap();
        let mut worker = OfflineWorker::new(
            "site-v2",
            AssetManifest::new(Vec::new()),
            Registration::with_scope(base.join("js/sw.js").unwrap(), "/").unwrap(),
            storage,
            DirFetcher::new(base, dir.path().to_path_buf()),
        );
        worker.install().await.unwrap();
        let report = worker.activate().await.unwrap();

        assert_eq!(worker.state(), WorkerState::Activated);
        assert_eq!(report.deleted, vec![digest("site-v1")]);
        assert_eq!(worker.storage().keys().unwrap(), vec!["site-v2"]);
        assert_eq!(bucket_dirs(worker.storage()), 1);
    }
}
