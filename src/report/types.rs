use std::sync::Arc;

use crate::stats::PullRequestDetails;

/// A titled list of pull requests ready for rendering.
#[derive(Debug, Clone)]
pub struct Report {
    pub title: String,
    pub requests: Vec<Arc<PullRequestDetails>>,
    /// Include an excerpt of each pull request's description.
    pub with_description: bool,
}

impl Report {
    pub fn new(
        title: impl Into<String>,
        requests: &[Arc<PullRequestDetails>],
        with_description: bool,
    ) -> Self {
        Self {
            title: title.into(),
            requests: requests.to_vec(),
            with_description,
        }
    }

    /// "1 pull request", "3 pull requests".
    pub fn summary(&self) -> String {
        match self.requests.len() {
            1 => "1 pull request".to_string(),
            n => format!("{n} pull requests"),
        }
    }
}

/// Render a boolean flag the way the report tables show it.
pub fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
