use std::future::Future;
use std::time::Duration;

use reqwest::Client;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("No page for {0}")]
    NotFound(String),
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// The only I/O boundary of the scrapers. One call is one attempt: no retry,
/// no backoff. Implementations log failures before returning them, so callers
/// are free to just skip the unit of work.
pub trait PageFetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send;

    fn fetch_bytes(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}

impl<T: PageFetcher> PageFetcher for &T {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send {
        (**self).fetch(url)
    }

    fn fetch_bytes(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send {
        (**self).fetch_bytes(url)
    }
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, reqwest::Error> {
        self.client
            .get(url)
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error for {url}: {e:?}"))?
            .error_for_status()
            .inspect_err(|e| log::error!("Bad status for {url}: {e}"))
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        log::debug!("GET {}", url);
        let wrap = |source| FetchError::Http {
            url: url.to_string(),
            source,
        };
        self.get(url)
            .await
            .map_err(wrap)?
            .text()
            .await
            .inspect_err(|e| log::error!("Decode error for {url}: {e:?}"))
            .map_err(wrap)
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        log::debug!("GET (bytes) {}", url);
        let wrap = |source| FetchError::Http {
            url: url.to_string(),
            source,
        };
        let bytes = self
            .get(url)
            .await
            .map_err(wrap)?
            .bytes()
            .await
            .inspect_err(|e| log::error!("Body error for {url}: {e:?}"))
            .map_err(wrap)?;
        Ok(bytes.to_vec())
    }
}
