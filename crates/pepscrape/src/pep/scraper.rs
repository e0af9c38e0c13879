use futures::StreamExt;
use futures::stream::FuturesUnordered;
use indicatif::ProgressBar;

use super::parser::{parse_pep_index, parse_pep_status};
use super::types::{PepReference, StatusTable, StatusTally, TallyBuilder, Verification};
use crate::fetcher::PageFetcher;
use crate::{ScraperError, join_url, progress};

/// How detail pages are visited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Execution {
    /// One page at a time, in index order.
    Sequential,
    /// Every page requested at once on the current task, joined at the end.
    #[default]
    Concurrent,
}

#[derive(Debug)]
pub struct PepScraper<F> {
    fetcher: F,
    base_url: String,
    table: StatusTable,
    show_progress: bool,
}

impl<F: PageFetcher> PepScraper<F> {
    pub fn new(fetcher: F) -> Self {
        Self::with_table(fetcher, crate::MAIN_PEP_URL, StatusTable::default())
    }

    pub fn with_table(fetcher: F, base_url: &str, table: StatusTable) -> Self {
        Self {
            fetcher,
            base_url: base_url.to_string(),
            table,
            show_progress: false,
        }
    }

    /// Draw a progress bar while detail pages are verified.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub async fn fetch_index(&self) -> Result<Vec<PepReference>, ScraperError> {
        log::info!("Fetching PEP index from {}...", self.base_url);
        let html = self.fetcher.fetch(&self.base_url).await?;
        Ok(parse_pep_index(&html, &self.table)?)
    }

    /// Reads the status from the PEP's own page. Nothing here aborts the run:
    /// fetch failures become [`Verification::Skipped`] and pages without a
    /// readable status become [`Verification::Failed`].
    pub async fn verify(&self, reference: &PepReference) -> Verification {
        let url = match join_url(&self.base_url, &reference.path) {
            Ok(url) => url,
            Err(e) => {
                log::error!("Cannot build URL for {}: {}", reference.path, e);
                return Verification::Failed;
            }
        };

        let html = match self.fetcher.fetch(&url).await {
            Ok(html) => html,
            Err(e) => {
                log::error!("Skipping {}: {}", url, e);
                return Verification::Skipped;
            }
        };

        let status = match parse_pep_status(&html) {
            Ok(status) => status,
            Err(e) => {
                log::error!("No status on {}: {}", url, e);
                return Verification::Failed;
            }
        };

        let matched = reference.expects(&status);
        if !matched {
            log::info!(
                "Mismatched status: {} reports '{}', index expected {:?}",
                url,
                status,
                reference.expected
            );
        }
        Verification::Tallied { status, matched }
    }

    pub async fn count_statuses(
        &self,
        references: &[PepReference],
        execution: Execution,
    ) -> StatusTally {
        log::info!(
            "Verifying {} PEP page(s) ({:?})...",
            references.len(),
            execution
        );
        let bar = progress::bar(references.len(), "Verifying PEPs", self.show_progress);
        let tally = self.fold_verifications(references, execution, &bar).await;
        bar.finish_and_clear();
        tally.finish()
    }

    async fn fold_verifications(
        &self,
        references: &[PepReference],
        execution: Execution,
        bar: &ProgressBar,
    ) -> TallyBuilder {
        let mut tally = TallyBuilder::new();
        match execution {
            Execution::Sequential => {
                for reference in references {
                    tally.record(self.verify(reference).await);
                    bar.inc(1);
                }
            }
            Execution::Concurrent => {
                let mut futs: FuturesUnordered<_> =
                    references.iter().map(|r| self.verify(r)).collect();
                while let Some(verification) = futs.next().await {
                    tally.record(verification);
                    bar.inc(1);
                }
            }
        }
        tally
    }

    /// Index, verification and tally in one go.
    pub async fn run(&self, execution: Execution) -> Result<StatusTally, ScraperError> {
        let references = self.fetch_index().await?;
        Ok(self.count_statuses(&references, execution).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::testing::{StaticFetcher, capture_logs, logged};
    use crate::pep::types::TOTAL_KEY;
    use log::Level;

    const BASE: &str = "https://peps.python.org/";

    fn detail(status: &str) -> String {
        format!(
            r#"<html><body><section id="pep-content"><dl>
                <dt>Status:</dt><dd><abbr title="...">{status}</abbr></dd>
                <dt>Type:</dt><dd><abbr title="...">Standards Track</abbr></dd>
            </dl></section></body></html>"#
        )
    }

    fn index(rows: &[(&str, &str)]) -> String {
        let rows: String = rows
            .iter()
            .map(|(cell, number)| {
                format!("<tr><td>{cell}</td><td><a href=\"pep-{number}/\">{number}</a></td></tr>")
            })
            .collect();
        format!(r#"<section id="numerical-index"><table><tbody>{rows}</tbody></table></section>"#)
    }

    fn reference(path: &str, expected: &[&str]) -> PepReference {
        PepReference {
            path: path.to_string(),
            expected: expected.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn scraper(fetcher: StaticFetcher) -> PepScraper<StaticFetcher> {
        PepScraper::with_table(fetcher, BASE, StatusTable::default())
    }

    #[tokio::test]
    async fn test_index_to_tally() {
        for execution in [Execution::Sequential, Execution::Concurrent] {
            let fetcher = StaticFetcher::new()
                .page(BASE, &index(&[("PA", "0001"), ("IF", "0020")]))
                .page("https://peps.python.org/pep-0001", &detail("Active"))
                .page("https://peps.python.org/pep-0020", &detail("Final"));

            let tally = scraper(fetcher).run(execution).await.unwrap();
            assert_eq!(tally.get("Active"), Some(1));
            assert_eq!(tally.get("Final"), Some(1));
            assert_eq!(tally.get(TOTAL_KEY), Some(2));
            assert_eq!(tally.len(), 2);
        }
    }

    #[tokio::test]
    async fn test_no_references_gives_zero_total() {
        let tally = scraper(StaticFetcher::new())
            .count_statuses(&[], Execution::Concurrent)
            .await;
        assert!(tally.is_empty());
        assert_eq!(tally.total(), 0);
    }

    #[tokio::test]
    async fn test_mismatch_counts_actual_status() {
        capture_logs();
        let fetcher = StaticFetcher::new()
            .page(BASE, &index(&[("PA", "0001"), ("IF", "0020")]))
            .page("https://peps.python.org/pep-0001", &detail("Active"))
            .page("https://peps.python.org/pep-0020", &detail("Draft"));
        let scraper = scraper(fetcher);

        let verification = scraper.verify(&reference("pep-0020", &["Final"])).await;
        assert_eq!(
            verification,
            Verification::Tallied {
                status: "Draft".to_string(),
                matched: false
            }
        );
        assert!(logged(Level::Info, &["Mismatched", "pep-0020", "Draft", "Final"]));

        let tally = scraper.run(Execution::Concurrent).await.unwrap();
        assert_eq!(tally.get("Active"), Some(1));
        assert_eq!(tally.get("Draft"), Some(1));
        assert_eq!(tally.get("Final"), None);
        assert_eq!(tally.total(), 2);
    }

    #[tokio::test]
    async fn test_ground_truth_over_index_claim() {
        let fetcher = StaticFetcher::new().page("https://peps.python.org/pep-0042", &detail("Rejected"));
        let scraper = scraper(fetcher);
        let refs = [reference("pep-0042", &["Active", "Accepted"])];

        let tally = scraper.count_statuses(&refs, Execution::Sequential).await;
        assert_eq!(tally.get("Rejected"), Some(1));
        assert_eq!(tally.get("Active"), None);
        assert_eq!(tally.get("Accepted"), None);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_skipped() {
        let fetcher = StaticFetcher::new().page("https://peps.python.org/pep-0001", &detail("Active"));
        let scraper = scraper(fetcher);
        let refs = [
            reference("pep-0001", &["Active", "Accepted"]),
            reference("pep-0404", &["Final"]),
        ];

        assert_eq!(scraper.verify(&refs[1]).await, Verification::Skipped);
        for execution in [Execution::Sequential, Execution::Concurrent] {
            let tally = scraper.count_statuses(&refs, execution).await;
            assert_eq!(tally.rows().collect::<Vec<_>>(), vec![("Active", 1), ("Total", 1)]);
        }
    }

    #[tokio::test]
    async fn test_missing_status_fails_only_that_pep() {
        let fetcher = StaticFetcher::new()
            .page("https://peps.python.org/pep-0001", &detail("Active"))
            .page("https://peps.python.org/pep-0002", "<html><body><p>moved</p></body></html>");
        let scraper = scraper(fetcher);
        let refs = [
            reference("pep-0001", &["Active"]),
            reference("pep-0002", &["Final"]),
        ];

        assert_eq!(scraper.verify(&refs[1]).await, Verification::Failed);
        for execution in [Execution::Sequential, Execution::Concurrent] {
            let tally = scraper.count_statuses(&refs, execution).await;
            assert_eq!(tally.total(), 1);
            assert_eq!(tally.get("Active"), Some(1));
        }
    }

    #[tokio::test]
    async fn test_unknown_code_never_fetched() {
        let fetcher = StaticFetcher::new()
            .page(BASE, &index(&[("SZ", "0003"), ("IF", "0020")]))
            .page("https://peps.python.org/pep-0003", &detail("Final"))
            .page("https://peps.python.org/pep-0020", &detail("Final"));
        let scraper = scraper(fetcher);

        let tally = scraper.run(Execution::Sequential).await.unwrap();
        assert_eq!(tally.get("Final"), Some(1));
        assert_eq!(tally.total(), 1);

        let requested = scraper.fetcher().requests.lock().unwrap().clone();
        assert!(!requested.iter().any(|u| u.ends_with("pep-0003")));
    }

    #[tokio::test]
    async fn test_execution_models_agree() {
        let statuses = ["Final", "Active", "Draft", "Final", "Withdrawn", "Rejected", "Final"];
        let mut fetcher = StaticFetcher::new();
        let mut refs = Vec::new();
        for (i, status) in statuses.iter().enumerate() {
            let path = format!("pep-{:04}", i + 1);
            fetcher = fetcher.page(&format!("{BASE}{path}"), &detail(status));
            refs.push(reference(&path, &["Final"]));
        }
        refs.push(reference("pep-9999", &["Final"]));
        let scraper = scraper(fetcher);

        let sequential = scraper.count_statuses(&refs, Execution::Sequential).await;
        let concurrent = scraper.count_statuses(&refs, Execution::Concurrent).await;

        assert_eq!(sequential, concurrent);
        assert_eq!(sequential.get("Final"), Some(3));
        assert_eq!(sequential.total(), statuses.len());
    }

    #[tokio::test]
    async fn test_progress_advances_once_per_reference() {
        let fetcher = StaticFetcher::new()
            .page("https://peps.python.org/pep-0001", &detail("Active"))
            .page("https://peps.python.org/pep-0002", "<p>moved</p>");
        let scraper = scraper(fetcher).with_progress(true);
        let refs = [
            reference("pep-0001", &["Active"]),
            reference("pep-0002", &["Final"]),
            reference("pep-0404", &["Final"]),
        ];

        for execution in [Execution::Sequential, Execution::Concurrent] {
            let bar = progress::bar(refs.len(), "Verifying PEPs", false);
            let tally = scraper
                .fold_verifications(&refs, execution, &bar)
                .await
                .finish();
            assert_eq!(bar.position(), 3);
            assert_eq!(tally.total(), 1);
        }

        let tally = scraper.count_statuses(&refs, Execution::Concurrent).await;
        assert_eq!(tally.get("Active"), Some(1));
    }

    #[tokio::test]
    async fn test_index_fetch_failure_is_fatal() {
        let scraper = scraper(StaticFetcher::new());
        let err = scraper.run(Execution::Concurrent).await.unwrap_err();
        assert!(matches!(err, ScraperError::Fetch(_)));
    }
}
