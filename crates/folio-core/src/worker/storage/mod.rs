//! Cache storage backends.
//!
//! `CacheStorage` is the set of platform primitives the worker relies on:
//! open a named bucket, enumerate and delete buckets, and match or put
//! request/response pairs inside a bucket.

pub mod disk;
pub mod memory;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Request, Response, WorkerError};

pub use disk::DiskStorage;
pub use memory::MemoryStorage;

/// A value stamped with the time it was written to the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}

/// Summary of one cached entry, for status reporting.
#[derive(Debug, Clone)]
pub struct EntryInfo {
    pub method: String,
    pub url: String,
    pub status: u16,
    pub size: usize,
    pub cached: CachedData<()>,
}

pub trait CacheStorage: Send + Sync {
    /// Open the named bucket, creating it if it does not exist.
    fn open(&self, name: &str) -> Result<(), WorkerError>;

    /// Bucket names in creation order.
    fn keys(&self) -> Result<Vec<String>, WorkerError>;

    /// Delete a bucket. Returns false if it did not exist.
    fn delete(&self, name: &str) -> Result<bool, WorkerError>;

    /// Look up a request in a bucket. A missing bucket is a miss.
    fn match_request(&self, name: &str, request: &Request) -> Result<Option<Response>, WorkerError>;

    /// Store a pair in an opened bucket, replacing any previous entry.
    fn put(&self, name: &str, request: &Request, response: &Response) -> Result<(), WorkerError>;

    /// Entries of a bucket, ordered by URL.
    fn entries(&self, name: &str) -> Result<Vec<EntryInfo>, WorkerError>;
}

impl<T: CacheStorage + ?Sized> CacheStorage for Arc<T> {
    fn open(&self, name: &str) -> Result<(), WorkerError> {
        (**self).open(name)
    }

    fn keys(&self) -> Result<Vec<String>, WorkerError> {
        (**self).keys()
    }

    fn delete(&self, name: &str) -> Result<bool, WorkerError> {
        (**self).delete(name)
    }

    fn match_request(&self, name: &str, request: &Request) -> Result<Option<Response>, WorkerError> {
        (**self).match_request(name, request)
    }

    fn put(&self, name: &str, request: &Request, response: &Response) -> Result<(), WorkerError> {
        (**self).put(name, request, response)
    }

    fn entries(&self, name: &str) -> Result<Vec<EntryInfo>, WorkerError> {
        (**self).entries(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_cached_data_age_display_just_now() {
        let cached = CachedData::new(());
        assert_eq!(cached.age_display(), "just now");
    }

    #[test]
    fn test_cached_data_age_display_rounding() {
        let mut cached = CachedData::new(());
        cached.cached_at = Utc::now() - Duration::minutes(95);
        assert_eq!(cached.age_display(), "2h ago");

        cached.cached_at = Utc::now() - Duration::minutes(15);
        assert_eq!(cached.age_display(), "15m ago");

        cached.cached_at = Utc::now() - Duration::days(3);
        assert_eq!(cached.age_display(), "3d ago");
    }

    #[test]
    fn test_cached_data_future_timestamp() {
        let mut cached = CachedData::new(());
        cached.cached_at = Utc::now() + Duration::minutes(10);
        assert_eq!(cached.age_display(), "just now");
    }
}
