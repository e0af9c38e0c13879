use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::fetcher::{FetchError, PageFetcher};

pub const CACHE_FILE_NAME: &str = ".pepscrape-cache.json";

/// URL-keyed page cache in front of another fetcher, persisted as one JSON
/// object of `url -> body`. Only successful text fetches are stored; binary
/// downloads always go to the inner fetcher.
#[derive(Debug)]
pub struct CachedFetcher<F> {
    inner: F,
    path: PathBuf,
    pages: Mutex<HashMap<String, String>>,
}

impl<F: PageFetcher> CachedFetcher<F> {
    pub fn open(inner: F, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let pages = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                log::warn!("Ignoring unreadable cache {}: {}", path.display(), e);
                HashMap::new()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                log::warn!("Ignoring unreadable cache {}: {}", path.display(), e);
                HashMap::new()
            }
        };
        log::debug!("Loaded {} cached page(s) from {}", pages.len(), path.display());

        Self {
            inner,
            path,
            pages: Mutex::new(pages),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.pages().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) -> io::Result<()> {
        self.pages().clear();
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => {
                log::info!("Page cache cleared");
                Ok(())
            }
        }
    }

    pub fn persist(&self) -> Result<(), crate::ScraperError> {
        let raw = serde_json::to_string(&*self.pages())?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, raw)?;
        log::debug!("Page cache written to {}", self.path.display());
        Ok(())
    }

    // A poisoned lock only means another task panicked mid-insert; the map is
    // still a valid cache.
    fn pages(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.pages.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lookup(&self, url: &str) -> Option<String> {
        self.pages().get(url).cloned()
    }
}

impl<F: PageFetcher + Sync> PageFetcher for CachedFetcher<F> {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        if let Some(html) = self.lookup(url) {
            log::debug!("Cache hit: {}", url);
            return Ok(html);
        }
        let html = self.inner.fetch(url).await?;
        self.pages().insert(url.to_string(), html.clone());
        Ok(html)
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.inner.fetch_bytes(url).await
    }
}
