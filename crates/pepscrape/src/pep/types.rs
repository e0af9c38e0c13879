use std::collections::{BTreeMap, HashMap};

pub const TOTAL_KEY: &str = "Total";

/// Closed mapping from an index status code to the status names a PEP with
/// that code may legitimately carry on its own page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTable(HashMap<String, Vec<String>>);

impl StatusTable {
    pub fn new<I, C, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (C, Vec<S>)>,
        C: Into<String>,
        S: Into<String>,
    {
        Self(
            entries
                .into_iter()
                .map(|(code, names)| (code.into(), names.into_iter().map(Into::into).collect()))
                .collect(),
        )
    }

    pub fn expected(&self, code: &str) -> Option<&[String]> {
        self.0.get(code).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for StatusTable {
    /// The status key used on peps.python.org. An empty code means the PEP is
    /// still a draft or an active informational PEP.
    fn default() -> Self {
        StatusTable::new([
            ("A", vec!["Active", "Accepted"]),
            ("D", vec!["Deferred"]),
            ("F", vec!["Final"]),
            ("P", vec!["Provisional"]),
            ("R", vec!["Rejected"]),
            ("S", vec!["Superseded"]),
            ("W", vec!["Withdrawn"]),
            ("", vec!["Draft", "Active"]),
        ])
    }
}

/// One index row that survived status-code lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PepReference {
    pub path: String,
    pub expected: Vec<String>,
}

impl PepReference {
    pub fn expects(&self, status: &str) -> bool {
        self.expected.iter().any(|s| s == status)
    }
}

/// Terminal state of one reference after verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// Status read from the PEP's own page. `matched` is false when the index
    /// claimed something else.
    Tallied { status: String, matched: bool },
    /// The detail page could not be fetched.
    Skipped,
    /// The detail page had no status to read.
    Failed,
}

/// Accumulates per-PEP outcomes. The only way to read counts is to
/// [`finish`](TallyBuilder::finish) it.
#[derive(Debug, Default, Clone)]
pub struct TallyBuilder {
    counts: BTreeMap<String, usize>,
    mismatched: usize,
    skipped: usize,
    failed: usize,
}

impl TallyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A page reporting the name of the synthetic total row cannot be told
    /// apart from it, so it is counted as failed.
    pub fn record(&mut self, verification: Verification) {
        match verification {
            Verification::Tallied { status, .. } if status == TOTAL_KEY => {
                log::error!("Status '{}' clashes with the total row, not tallied", status);
                self.failed += 1;
            }
            Verification::Tallied { status, matched } => {
                *self.counts.entry(status).or_default() += 1;
                if !matched {
                    self.mismatched += 1;
                }
            }
            Verification::Skipped => self.skipped += 1,
            Verification::Failed => self.failed += 1,
        }
    }

    /// Pointwise sum, for partial tallies built independently.
    pub fn merge(mut self, other: TallyBuilder) -> Self {
        for (status, count) in other.counts {
            *self.counts.entry(status).or_default() += count;
        }
        self.mismatched += other.mismatched;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self
    }

    pub fn finish(self) -> StatusTally {
        let total = self.counts.values().sum();
        log::info!(
            "Tallied {} PEP(s): {} mismatched, {} skipped, {} failed",
            total,
            self.mismatched,
            self.skipped,
            self.failed
        );
        StatusTally {
            counts: self.counts,
            total,
        }
    }
}

impl FromIterator<Verification> for TallyBuilder {
    fn from_iter<T: IntoIterator<Item = Verification>>(iter: T) -> Self {
        let mut builder = TallyBuilder::new();
        for v in iter {
            builder.record(v);
        }
        builder
    }
}

/// Final status counts. `total` always equals the sum of `counts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTally {
    counts: BTreeMap<String, usize>,
    total: usize,
}

impl StatusTally {
    pub fn get(&self, status: &str) -> Option<usize> {
        if status == TOTAL_KEY {
            return Some(self.total);
        }
        self.counts.get(status).copied()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of distinct statuses, not counting the total.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Every status in name order, then the synthetic total.
    pub fn rows(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts
            .iter()
            .map(|(status, count)| (status.as_str(), *count))
            .chain(std::iter::once((TOTAL_KEY, self.total)))
    }
}
