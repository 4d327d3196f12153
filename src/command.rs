//! The `show-pr` command: classify, fetch, bucket and print one pull request.

use std::io::Write;
use std::num::ParseIntError;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::config::ConfigError;
use crate::enhancements::{ClassifyError, GroupClassifier};
use crate::github::GitHubError;
use crate::report::{self, Report, ReportError};
use crate::stats::{Bucket, PullRequestQuery, Stats, StatsError};

const ALL_BUCKET: &str = "all";

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("please specify one valid pull request ID (got {count} arguments)")]
    ArgumentCount { count: usize },

    #[error("pull request ID {input:?} must be an integer: {source}")]
    Validation {
        input: String,
        #[source]
        source: ParseIntError,
    },

    #[error("failed to load configuration: {0}")]
    Configuration(#[from] ConfigError),

    #[error("failed to set up GitHub client: {0}")]
    Client(#[source] GitHubError),

    #[error("failed to determine group for PR {number}: {source}")]
    Classification {
        number: u64,
        #[source]
        source: ClassifyError,
    },

    #[error("failed to fetch pull request {number}: {source}")]
    Fetch {
        number: u64,
        #[source]
        source: GitHubError,
    },

    #[error("failed to fetch details for PR {number}: {source}")]
    Extraction {
        number: u64,
        #[source]
        source: StatsError,
    },

    #[error("no details were recorded for PR {number}")]
    EmptyReport { number: u64 },

    #[error("failed to write report: {0}")]
    Report(#[from] ReportError),

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// Check the positional arguments: exactly one base-10 integer.
pub fn parse_pr_id(args: &[String]) -> Result<u64, CommandError> {
    let [input] = args else {
        return Err(CommandError::ArgumentCount { count: args.len() });
    };
    input
        .parse::<u64>()
        .map_err(|source| CommandError::Validation {
            input: input.clone(),
            source,
        })
}

/// Classify, fetch and print one pull request. `number` has already been
/// through [`parse_pr_id`].
#[instrument(
    skip(out, query, classifier, markdown),
    fields(org = %query.org, repo = %query.repo)
)]
pub async fn show_pr<W: Write>(
    out: &mut W,
    number: u64,
    query: &PullRequestQuery,
    classifier: &GroupClassifier,
    markdown: Option<&Path>,
) -> Result<(), CommandError> {
    info!("classifying pull request");
    let group = classifier
        .classify(query, number)
        .await
        .map_err(|source| CommandError::Classification { number, source })?;

    writeln!(out, "Group: {}", group.name)?;
    writeln!(out, "Enhancement: {}", group.is_enhancement)?;

    info!("fetching pull request from GitHub");
    let pr = query
        .client
        .pull_request(&query.org, &query.repo, number)
        .await
        .map_err(|source| CommandError::Fetch { number, source })?;

    let mut stats = Stats::new(query, vec![Bucket::all(ALL_BUCKET)]);
    stats
        .process_one(&pr)
        .await
        .map_err(|source| CommandError::Extraction { number, source })?;

    let requests = stats
        .bucket(ALL_BUCKET)
        .map(Bucket::requests)
        .unwrap_or_default();
    let details = requests
        .first()
        .ok_or(CommandError::EmptyReport { number })?;
    debug!(state = %details.state, "bucket populated");

    let title = format!("Pull Request {number}");
    report::show_prs(out, &title, requests, true)?;
    if let Some(path) = markdown {
        report::write_markdown_report(&Report::new(title.as_str(), requests, true), path)?;
    }

    writeln!(out, "State:       \"{}\"", details.state)?;
    writeln!(out, "LGTM:        {}", details.lgtm)?;
    writeln!(out, "Prioritized: {}", details.prioritized)?;
    writeln!(out, "Stale:       {}", details.stale)?;

    Ok(())
}
