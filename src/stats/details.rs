use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::StatsError;
use crate::github::{PullRequest, PullRequestSource};

pub const LGTM_LABEL: &str = "lgtm";
pub const STALE_LABELS: &[&str] = &["lifecycle/stale", "lifecycle/rotten"];

/// Lifecycle state of a pull request, as reported by the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrState {
    Open,
    Closed,
    Merged,
}

impl PrState {
    /// A merge timestamp wins over the raw state string, which GitHub
    /// reports as "closed" for merged pull requests.
    pub fn from_source(state: &str, merged: bool) -> Option<PrState> {
        if merged {
            return Some(PrState::Merged);
        }
        match state {
            "open" => Some(PrState::Open),
            "closed" => Some(PrState::Closed),
            "merged" => Some(PrState::Merged),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrState::Open => "open",
            PrState::Closed => "closed",
            PrState::Merged => "merged",
        }
    }
}

impl fmt::Display for PrState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized view of one pull request. Built once per fetch and shared
/// read-only between every bucket that captures it.
#[derive(Debug, Clone, PartialEq)]
pub struct PullRequestDetails {
    pub number: u64,
    pub title: String,
    pub author: String,
    pub url: String,
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub state: PrState,
    pub approvals: usize,
    pub lgtm: bool,
    pub prioritized: bool,
    pub stale: bool,
}

/// Everything the extraction step needs besides the raw record.
pub struct PullRequestQuery {
    pub org: String,
    pub repo: String,
    pub client: Arc<dyn PullRequestSource>,
    /// Skips the review sub-fetch; LGTM then comes from labels alone.
    pub dev_mode: bool,
    pub stale_after: Duration,
    pub priority_labels: Vec<String>,
    /// Reference time for the staleness threshold.
    pub as_of: DateTime<Utc>,
}

impl PullRequestQuery {
    pub fn new(
        org: impl Into<String>,
        repo: impl Into<String>,
        client: Arc<dyn PullRequestSource>,
    ) -> Self {
        Self {
            org: org.into(),
            repo: repo.into(),
            client,
            dev_mode: false,
            stale_after: Duration::days(i64::from(crate::config::DEFAULT_STALE_AFTER_DAYS)),
            priority_labels: crate::config::Config::default().priority_labels(),
            as_of: Utc::now(),
        }
    }

    /// Derive the details for one raw record. The only remote call made here
    /// is the review listing, and only outside dev mode.
    #[instrument(skip(self, pr), fields(pr = pr.number))]
    pub async fn extract(&self, pr: &PullRequest) -> Result<PullRequestDetails, StatsError> {
        let state = PrState::from_source(&pr.state, pr.merged_at.is_some()).ok_or_else(|| {
            StatsError::UnknownState {
                number: pr.number,
                state: pr.state.clone(),
            }
        })?;

        let approvals = if self.dev_mode {
            0
        } else {
            self.client
                .reviews(&self.org, &self.repo, pr.number)
                .await
                .map_err(|source| StatsError::Reviews {
                    number: pr.number,
                    source,
                })?
                .iter()
                .filter(|r| r.is_approval())
                .count()
        };

        let lgtm = pr.has_label(LGTM_LABEL) || approvals > 0;
        let prioritized = self.priority_labels.iter().any(|l| pr.has_label(l));
        let inactive = state == PrState::Open && self.as_of - pr.updated_at > self.stale_after;
        let stale = inactive || STALE_LABELS.iter().any(|l| pr.has_label(l));

        debug!(%state, approvals, lgtm, prioritized, stale, "extracted details");

        Ok(PullRequestDetails {
            number: pr.number,
            title: pr.title.clone(),
            author: pr.author().to_string(),
            url: pr.html_url.clone(),
            description: pr.body.clone(),
            updated_at: pr.updated_at,
            state,
            approvals,
            lgtm,
            prioritized,
            stale,
        })
    }
}
