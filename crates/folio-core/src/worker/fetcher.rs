//! Network access for the worker.
//!
//! `HttpFetcher` goes to the real network. `DirFetcher` answers requests under
//! a base URL from a site directory on disk, so a worker can pre-cache a built
//! site without a server running.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::{Client, Url};
use tracing::debug;

use super::{Request, Response, WorkerError};

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// File served for directory URLs such as `/` or `/blog/`.
const INDEX_FILE: &str = "index.html";

pub trait Fetcher: Send + Sync {
    /// Perform one network fetch. Non-2xx responses are returned as responses,
    /// not errors, the way the Fetch API resolves them.
    fn fetch<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, Result<Response, WorkerError>>;
}

impl<T: Fetcher + ?Sized> Fetcher for Arc<T> {
    fn fetch<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, Result<Response, WorkerError>> {
        (**self).fetch(request)
    }
}

impl<T: Fetcher + ?Sized> Fetcher for Box<T> {
    fn fetch<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, Result<Response, WorkerError>> {
        (**self).fetch(request)
    }
}

/// Fetcher backed by reqwest.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, WorkerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, Result<Response, WorkerError>> {
        Box::pin(async move {
            debug!(method = %request.method, url = %request.url, "Network fetch");
            let response = self
                .client
                .request(request.method.clone(), request.url.clone())
                .send()
                .await?;
            Response::from_reqwest(response).await
        })
    }
}

/// Fetcher that maps URLs under `base` onto files under `root`.
pub struct DirFetcher {
    base: Url,
    root: PathBuf,
}

impl DirFetcher {
    pub fn new(base: Url, root: PathBuf) -> Self {
        Self { base, root }
    }

    /// Map a URL onto a file path. Returns None for URLs outside `base` or
    /// paths that try to climb out of `root`.
    fn resolve(&self, url: &Url) -> Option<PathBuf> {
        if url.origin() != self.base.origin() {
            return None;
        }
        let relative = url.path().strip_prefix(self.base.path())?;
        let mut path = self.root.clone();
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                _ => return None,
            }
        }
        if relative.is_empty() || relative.ends_with('/') || path.is_dir() {
            path.push(INDEX_FILE);
        }
        Some(path)
    }
}

/// Content type for a file, by extension.
fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "application/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

impl Fetcher for DirFetcher {
    fn fetch<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, Result<Response, WorkerError>> {
        Box::pin(async move {
            let Some(path) = self.resolve(&request.url) else {
                return Ok(Response::new(request.url.clone(), 404, Vec::new()));
            };
            debug!(url = %request.url, path = %path.display(), "Directory fetch");
            match tokio::fs::read(&path).await {
                Ok(body) => Ok(Response::new(request.url.clone(), 200, body)
                    .with_header("content-type", content_type(&path))),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    Ok(Response::new(request.url.clone(), 404, Vec::new()))
                }
                Err(e) => Err(e.into()),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> (tempfile::TempDir, DirFetcher) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("css")).unwrap();
        std::fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        std::fs::write(dir.path().join("css/style.css"), "body{}").unwrap();
        let fetcher = DirFetcher::new(
            Url::parse("http://localhost:8000/").unwrap(),
            dir.path().to_path_buf(),
        );
        (dir, fetcher)
    }

    #[tokio::test]
    async fn test_dir_fetch_file() {
        let (_dir, fetcher) = site();
        let req = Request::parse("http://localhost:8000/css/style.css").unwrap();
        let resp = fetcher.fetch(&req).await.unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, b"body{}");
        assert_eq!(resp.header("content-type"), Some("text/css; charset=utf-8"));
    }

    #[tokio::test]
    async fn test_dir_fetch_index_for_directory() {
        let (_dir, fetcher) = site();
        let req = Request::parse("http://localhost:8000/").unwrap();
        let resp = fetcher.fetch(&req).await.unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, b"<html></html>");
    }

    #[tokio::test]
    async fn test_dir_fetch_missing_is_404() {
        let (_dir, fetcher) = site();
        let req = Request::parse("http://localhost:8000/assets/missing.png").unwrap();
        assert_eq!(fetcher.fetch(&req).await.unwrap().status, 404);
    }

    #[tokio::test]
    async fn test_dir_fetch_other_origin_is_404() {
        let (_dir, fetcher) = site();
        let req = Request::parse("https://example.com/index.html").unwrap();
        assert_eq!(fetcher.fetch(&req).await.unwrap().status, 404);
    }

    #[test]
    fn test_resolve_rejects_parent_dirs() {
        let (_dir, fetcher) = site();
        // Url normalizes `..` itself, so encoded dots are the only way through
        let url = Url::parse("http://localhost:8000/%2e%2e/secret").unwrap();
        let resolved = fetcher.resolve(&url);
        assert!(resolved.map_or(true, |p| p.starts_with(&fetcher.root)));
    }
}
