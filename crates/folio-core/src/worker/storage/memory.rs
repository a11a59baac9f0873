use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::{CacheStorage, CachedData, EntryInfo};
use crate::worker::{Request, Response, WorkerError};

struct Bucket {
    name: String,
    entries: BTreeMap<String, CachedData<(Request, Response)>>,
}

/// In-process cache storage. Nothing survives the process.
#[derive(Default)]
pub struct MemoryStorage {
    buckets: Mutex<Vec<Bucket>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Bucket>>, WorkerError> {
        self.buckets
            .lock()
            .map_err(|_| WorkerError::Storage("memory storage lock poisoned".to_string()))
    }

    /// Number of entries in a bucket, or None if the bucket does not exist.
    #[cfg(test)]
    pub(crate) fn len(&self, name: &str) -> Option<usize> {
        let buckets = self.lock().ok()?;
        buckets
            .iter()
            .find(|b| b.name == name)
            .map(|b| b.entries.len())
    }
}

impl CacheStorage for MemoryStorage {
    fn open(&self, name: &str) -> Result<(), WorkerError> {
        let mut buckets = self.lock()?;
        if !buckets.iter().any(|b| b.name == name) {
            buckets.push(Bucket {
                name: name.to_string(),
                entries: BTreeMap::new(),
            });
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, WorkerError> {
        Ok(self.lock()?.iter().map(|b| b.name.clone()).collect())
    }

    fn delete(&self, name: &str) -> Result<bool, WorkerError> {
        let mut buckets = self.lock()?;
        let before = buckets.len();
        buckets.retain(|b| b.name != name);
        Ok(buckets.len() != before)
    }

    fn match_request(&self, name: &str, request: &Request) -> Result<Option<Response>, WorkerError> {
        let buckets = self.lock()?;
        Ok(buckets
            .iter()
            .find(|b| b.name == name)
            .and_then(|b| b.entries.get(&request.cache_key()))
            .map(|cached| cached.data.1.clone()))
    }

    fn put(&self, name: &str, request: &Request, response: &Response) -> Result<(), WorkerError> {
        let mut buckets = self.lock()?;
        let bucket = buckets
            .iter_mut()
            .find(|b| b.name == name)
            .ok_or_else(|| WorkerError::Storage(format!("bucket not open: {name}")))?;
        bucket.entries.insert(
            request.cache_key(),
            CachedData::new((request.clone(), response.clone())),
        );
        Ok(())
    }

    fn entries(&self, name: &str) -> Result<Vec<EntryInfo>, WorkerError> {
        let buckets = self.lock()?;
        let Some(bucket) = buckets.iter().find(|b| b.name == name) else {
            return Ok(Vec::new());
        };
        let mut entries: Vec<EntryInfo> = bucket
            .entries
            .values()
            .map(|cached| {
                let (request, response) = &cached.data;
                EntryInfo {
                    method: request.method.to_string(),
                    url: request.url.to_string(),
                    status: response.status,
                    size: response.body.len(),
                    cached: CachedData {
                        data: (),
                        cached_at: cached.cached_at,
                    },
                }
            })
            .collect();
        entries.sort_by(|a, b| a.url.cmp(&b.url));
        Ok(entries)
    }
}
