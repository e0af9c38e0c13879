use std::fs;
use std::path::{Path, PathBuf};

use indicatif::ProgressBar;

use super::parser::{
    parse_latest_versions, parse_pdf_a4_link, parse_whats_new_article, parse_whats_new_index,
};
use super::types::{VersionEntry, WhatsNewArticle};
use super::{DOWNLOAD_PATH, WHATS_NEW_PATH};
use crate::fetcher::PageFetcher;
use crate::{ParseError, ScraperError, join_url, progress};

#[derive(Debug)]
pub struct DocsScraper<F> {
    fetcher: F,
    base_url: String,
    show_progress: bool,
}

impl<F: PageFetcher> DocsScraper<F> {
    pub fn new(fetcher: F) -> Self {
        Self::with_base_url(fetcher, crate::MAIN_DOC_URL)
    }

    pub fn with_base_url(fetcher: F, base_url: &str) -> Self {
        Self {
            fetcher,
            base_url: base_url.to_string(),
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Every "What's New" article with its title and editors. Articles that
    /// cannot be fetched are left out.
    pub async fn fetch_whats_new(&self) -> Result<Vec<WhatsNewArticle>, ScraperError> {
        let index_url = join_url(&self.base_url, WHATS_NEW_PATH)?;
        log::info!("Fetching what's new index from {}...", index_url);
        let html = self.fetcher.fetch(&index_url).await?;
        let links = parse_whats_new_index(&html)?;

        log::info!("Fetching {} what's new article(s)...", links.len());
        let bar = progress::bar(links.len(), "Fetching articles", self.show_progress);
        let articles = self.fetch_articles(&index_url, &links, &bar).await;
        bar.finish_and_clear();
        articles
    }

    async fn fetch_articles(
        &self,
        index_url: &str,
        links: &[String],
        bar: &ProgressBar,
    ) -> Result<Vec<WhatsNewArticle>, ScraperError> {
        let mut articles = Vec::with_capacity(links.len());
        for href in links {
            let url = join_url(index_url, href)?;
            match self.fetcher.fetch(&url).await {
                Ok(html) => articles.push(parse_whats_new_article(&html, &url)?),
                Err(e) => log::warn!("Skipping article {}: {}", url, e),
            }
            bar.inc(1);
        }
        Ok(articles)
    }

    pub async fn fetch_latest_versions(&self) -> Result<Vec<VersionEntry>, ScraperError> {
        log::info!("Fetching documentation versions from {}...", self.base_url);
        let html = self.fetcher.fetch(&self.base_url).await?;
        Ok(parse_latest_versions(&html)?)
    }

    /// Saves the A4 PDF documentation archive into `dir`, returning its path.
    pub async fn download_pdf_a4(&self, dir: &Path) -> Result<PathBuf, ScraperError> {
        let downloads_url = join_url(&self.base_url, DOWNLOAD_PATH)?;
        log::info!("Fetching downloads page {}...", downloads_url);
        let html = self.fetcher.fetch(&downloads_url).await?;
        let archive_url = join_url(&downloads_url, &parse_pdf_a4_link(&html)?)?;

        let file_name = archive_url
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ParseError::InvalidUrl(archive_url.clone()))?;

        log::info!("Downloading {}...", archive_url);
        let bytes = self.fetcher.fetch_bytes(&archive_url).await?;

        fs::create_dir_all(dir)?;
        let path = dir.join(file_name);
        fs::write(&path, bytes)?;
        log::info!("Archive saved to {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::testing::StaticFetcher;
    use std::fs;

    const BASE: &str = "https://docs.python.org/3/";

    fn fixture(name: &str) -> String {
        fs::read_to_string(format!("fixtures/{name}")).expect("Failed to read fixture")
    }

    fn article(version: &str) -> String {
        format!(
            "<h1>What’s New In Python {version}</h1><dl><dt>Editor:</dt>\n<dd>Someone</dd></dl>"
        )
    }

    #[tokio::test]
    async fn test_fetch_whats_new_skips_unreachable_articles() {
        let fetcher = StaticFetcher::new()
            .page("https://docs.python.org/3/whatsnew/", &fixture("whatsnew_index.html"))
            .page("https://docs.python.org/3/whatsnew/3.13.html", &article("3.13"))
            .page("https://docs.python.org/3/whatsnew/3.11.html", &article("3.11"));
        let scraper = DocsScraper::with_base_url(fetcher, BASE);

        let articles = scraper.fetch_whats_new().await.expect("Failed to fetch articles");

        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].link, "https://docs.python.org/3/whatsnew/3.13.html");
        assert_eq!(articles[0].title, "What’s New In Python 3.13");
        assert_eq!(articles[0].editors, "Editor: Someone");
        assert_eq!(articles[1].title, "What’s New In Python 3.11");
    }

    #[tokio::test]
    async fn test_article_progress_counts_skipped_articles() {
        let fetcher = StaticFetcher::new()
            .page("https://docs.python.org/3/whatsnew/3.13.html", &article("3.13"));
        let scraper = DocsScraper::with_base_url(fetcher, BASE).with_progress(true);
        let links = vec!["3.13.html".to_string(), "3.12.html".to_string()];
        let bar = progress::bar(links.len(), "Fetching articles", false);

        let articles = scraper
            .fetch_articles("https://docs.python.org/3/whatsnew/", &links, &bar)
            .await
            .unwrap();

        assert_eq!(articles.len(), 1);
        assert_eq!(bar.position(), 2);
    }

    #[tokio::test]
    async fn test_fetch_latest_versions() {
        let fetcher = StaticFetcher::new().page(BASE, &fixture("docs_index.html"));
        let scraper = DocsScraper::with_base_url(fetcher, BASE);

        let versions = scraper.fetch_latest_versions().await.unwrap();
        assert_eq!(versions.len(), 4);
        assert_eq!(versions[2].version, "3.12");
        assert_eq!(versions[2].status, "security-fixes");
    }

    #[tokio::test]
    async fn test_download_pdf_a4() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let fetcher = StaticFetcher::new()
            .page("https://docs.python.org/3/download.html", &fixture("download.html"))
            .page(
                "https://docs.python.org/3/archives/python-3.13-docs-pdf-a4.zip",
                "PK-archive",
            );
        let scraper = DocsScraper::with_base_url(fetcher, BASE);

        let path = scraper
            .download_pdf_a4(&dir.path().join("downloads"))
            .await
            .expect("Failed to download archive");

        assert_eq!(
            path,
            dir.path().join("downloads").join("python-3.13-docs-pdf-a4.zip")
        );
        assert_eq!(fs::read_to_string(path).unwrap(), "PK-archive");
    }

    #[tokio::test]
    async fn test_download_fetch_failure_writes_nothing() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let fetcher =
            StaticFetcher::new().page("https://docs.python.org/3/download.html", &fixture("download.html"));
        let scraper = DocsScraper::with_base_url(fetcher, BASE);

        let err = scraper.download_pdf_a4(dir.path()).await.unwrap_err();
        assert!(matches!(err, ScraperError::Fetch(_)));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
