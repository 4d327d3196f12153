pub mod details;

pub use details::{PrState, PullRequestDetails, PullRequestQuery};

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::github::{GitHubError, PullRequest};

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("failed to load reviews for pull request {number}: {source}")]
    Reviews {
        number: u64,
        #[source]
        source: GitHubError,
    },

    #[error("pull request {number} has unrecognised state {state:?}")]
    UnknownState { number: u64, state: String },
}

/// Predicate deciding whether a pull request belongs in a bucket.
/// Must be pure and must not fail.
pub type Rule = Box<dyn Fn(&PullRequestDetails) -> bool + Send + Sync>;

/// A named rule plus the pull requests that matched it, in arrival order.
pub struct Bucket {
    name: String,
    rule: Rule,
    requests: Vec<Arc<PullRequestDetails>>,
}

impl Bucket {
    pub fn new<F>(name: impl Into<String>, rule: F) -> Self
    where
        F: Fn(&PullRequestDetails) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            rule: Box::new(rule),
            requests: Vec::new(),
        }
    }

    /// Bucket that captures every pull request it is offered.
    pub fn all(name: impl Into<String>) -> Self {
        Self::new(name, |_| true)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn requests(&self) -> &[Arc<PullRequestDetails>] {
        &self.requests
    }

    fn offer(&mut self, details: &Arc<PullRequestDetails>) -> bool {
        let matched = (self.rule)(details);
        if matched {
            self.requests.push(Arc::clone(details));
        }
        matched
    }
}

impl std::fmt::Debug for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bucket")
            .field("name", &self.name)
            .field("requests", &self.requests.len())
            .finish()
    }
}

/// Sorts pull requests into buckets. Records are processed strictly in
/// sequence, so every bucket's order matches input order.
pub struct Stats<'q> {
    query: &'q PullRequestQuery,
    buckets: Vec<Bucket>,
}

impl<'q> Stats<'q> {
    pub fn new(query: &'q PullRequestQuery, buckets: Vec<Bucket>) -> Self {
        Self { query, buckets }
    }

    /// Extract details for one record and append them to every matching
    /// bucket. Returns how many buckets matched. When extraction fails no
    /// bucket is touched.
    #[instrument(skip(self, pr), fields(pr = pr.number))]
    pub async fn process_one(&mut self, pr: &PullRequest) -> Result<usize, StatsError> {
        let details = Arc::new(self.query.extract(pr).await?);

        let mut matched = 0;
        for bucket in &mut self.buckets {
            if bucket.offer(&details) {
                debug!(bucket = %bucket.name, "matched");
                matched += 1;
            }
        }
        Ok(matched)
    }

    /// Process records in order, stopping at the first failure. Buckets keep
    /// whatever the records before the failure contributed.
    pub async fn process_many(&mut self, prs: &[PullRequest]) -> Result<usize, StatsError> {
        let mut appended = 0;
        for pr in prs {
            appended += self.process_one(pr).await?;
        }
        Ok(appended)
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn bucket(&self, name: &str) -> Option<&Bucket> {
        self.buckets.iter().find(|b| b.name == name)
    }

    pub fn into_buckets(self) -> Vec<Bucket> {
        self.buckets
    }
}
