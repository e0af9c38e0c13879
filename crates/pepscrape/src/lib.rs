pub mod cache;
pub mod docs;
pub mod fetcher;
pub mod locate;
pub mod output;
pub mod pep;
mod progress;

pub use cache::CachedFetcher;
pub use fetcher::{FetchError, HttpFetcher, PageFetcher};
pub use output::Report;

use thiserror::Error;

pub const MAIN_DOC_URL: &str = "https://docs.python.org/3/";
pub const MAIN_PEP_URL: &str = "https://peps.python.org/";

/// Failure of a whole scraping mode. Anything surfacing here means the mode
/// produced no output.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error(transparent)]
    Locate(#[from] locate::LocateError),
    #[error("Page structure not found: {0}")]
    StructureNotFound(String),
    #[error("Missing attribute: {0}")]
    MissingAttribute(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Resolves `href` against `base` the way a browser would.
pub(crate) fn join_url(base: &str, href: &str) -> Result<String, ParseError> {
    url::Url::parse(base)
        .and_then(|b| b.join(href))
        .map(String::from)
        .map_err(|e| ParseError::InvalidUrl(format!("{href} against {base}: {e}")))
}
