pub mod types;

pub use types::{PullRequest, PullRequestFile, Review};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};

const USER_AGENT: &str = "enhancements-report";

/// Single page only; the governance repository's pull requests stay well
/// under this many reviews and files.
const PAGE_SIZE: u32 = 100;

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("GitHub rejected the credentials ({status}): {message}")]
    Authentication { status: u16, message: String },

    #[error("GitHub API returned {status} for {resource}: {message}")]
    Api {
        status: u16,
        resource: String,
        message: String,
    },

    #[error("GitHub token not found in config or environment")]
    MissingToken,
}

/// Read-only access to pull-request data for one hosting platform.
#[async_trait]
pub trait PullRequestSource: Send + Sync {
    async fn pull_request(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<PullRequest, GitHubError>;

    async fn reviews(&self, org: &str, repo: &str, number: u64)
        -> Result<Vec<Review>, GitHubError>;

    async fn files(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<PullRequestFile>, GitHubError>;
}

/// reqwest-backed client for the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl GitHubClient {
    pub fn new(api_url: &str, token: String) -> Result<Self, GitHubError> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Build a client from the loaded configuration, failing early when no
    /// token is available.
    pub fn from_config(config: &crate::config::Config) -> Result<Self, GitHubError> {
        Self::with_token(config.api_url(), config.github_token())
    }

    pub fn with_token(api_url: &str, token: Option<String>) -> Result<Self, GitHubError> {
        let token = token.ok_or(GitHubError::MissingToken)?;
        Self::new(api_url, token)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GitHubError> {
        let url = format!("{}{}", self.api_url, path);
        debug!(%url, "GET");
        let response = self
            .http
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let message = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::NOT_FOUND => GitHubError::NotFound {
                resource: path.to_string(),
            },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GitHubError::Authentication {
                status: status.as_u16(),
                message,
            },
            _ => GitHubError::Api {
                status: status.as_u16(),
                resource: path.to_string(),
                message,
            },
        })
    }
}

#[async_trait]
impl PullRequestSource for GitHubClient {
    #[instrument(skip(self))]
    async fn pull_request(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<PullRequest, GitHubError> {
        let pr: PullRequest = self
            .get_json(&format!("/repos/{org}/{repo}/pulls/{number}"))
            .await?;
        debug!(title = %pr.title, state = %pr.state, labels = pr.labels.len(), "received pull request");
        Ok(pr)
    }

    #[instrument(skip(self))]
    async fn reviews(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<Review>, GitHubError> {
        let reviews: Vec<Review> = self
            .get_json(&format!(
                "/repos/{org}/{repo}/pulls/{number}/reviews?per_page={PAGE_SIZE}"
            ))
            .await?;
        debug!(reviews = reviews.len(), "received reviews");
        Ok(reviews)
    }

    #[instrument(skip(self))]
    async fn files(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<PullRequestFile>, GitHubError> {
        let files: Vec<PullRequestFile> = self
            .get_json(&format!(
                "/repos/{org}/{repo}/pulls/{number}/files?per_page={PAGE_SIZE}"
            ))
            .await?;
        debug!(files = files.len(), "received changed files");
        Ok(files)
    }
}
