//! Classification of pull requests into the organisational groups that own
//! enhancement proposals.

use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::github::{GitHubError, PullRequestFile};
use crate::stats::PullRequestQuery;

const ENHANCEMENTS_DIR: &str = "enhancements";
const GENERAL_GROUP: &str = "general";

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("failed to list files changed by pull request {number}: {source}")]
    Files {
        number: u64,
        #[source]
        source: GitHubError,
    },

    #[error("pull request {number} does not change any files")]
    NoFiles { number: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    /// True when the pull request touches an enhancement proposal document.
    pub is_enhancement: bool,
}

/// Resolves groups from a static table first, then from the paths a pull
/// request changes.
#[derive(Debug, Clone, Default)]
pub struct GroupClassifier {
    overrides: BTreeMap<u64, String>,
}

impl GroupClassifier {
    pub fn new(overrides: BTreeMap<u64, String>) -> Self {
        Self { overrides }
    }

    #[instrument(skip(self, query), fields(org = %query.org, repo = %query.repo))]
    pub async fn classify(
        &self,
        query: &PullRequestQuery,
        number: u64,
    ) -> Result<Group, ClassifyError> {
        if let Some(name) = self.overrides.get(&number) {
            debug!(group = %name, "using static group assignment");
            return Ok(Group {
                name: name.clone(),
                is_enhancement: true,
            });
        }

        let files = query
            .client
            .files(&query.org, &query.repo, number)
            .await
            .map_err(|source| ClassifyError::Files { number, source })?;
        debug!(files = files.len(), "classifying by changed paths");

        group_for_files(&files).ok_or(ClassifyError::NoFiles { number })
    }
}

/// Derive the group from changed paths. The first proposal document under
/// `enhancements/` decides; without one, the first file's top-level
/// directory names the group.
pub fn group_for_files(files: &[PullRequestFile]) -> Option<Group> {
    let proposal = files.iter().find_map(|f| {
        let mut parts = f.filename.split('/');
        if parts.next() != Some(ENHANCEMENTS_DIR) {
            return None;
        }
        let rest: Vec<&str> = parts.collect();
        let name = match rest.as_slice() {
            [] => return None,
            [_file] => GENERAL_GROUP,
            [dir, ..] => *dir,
        };
        Some(name.to_string())
    });

    if let Some(name) = proposal {
        return Some(Group {
            name,
            is_enhancement: true,
        });
    }

    let first = files.first()?;
    let name = match first.filename.split_once('/') {
        Some((dir, _)) => dir.to_string(),
        None => GENERAL_GROUP.to_string(),
    };
    Some(Group {
        name,
        is_enhancement: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::tests::FakeSource;
    use rstest::rstest;
    use std::sync::Arc;

    fn files(names: &[&str]) -> Vec<PullRequestFile> {
        names
            .iter()
            .map(|n| PullRequestFile {
                filename: n.to_string(),
            })
            .collect()
    }

    #[rstest]
    #[case(&["enhancements/sig-x/widget.md"], "sig-x", true)]
    #[case(&["enhancements/widget.md"], "general", true)]
    #[case(&["README.md", "enhancements/network/ovn/plan.md"], "network", true)]
    #[case(&["guidelines/template.md"], "guidelines", false)]
    #[case(&["OWNERS"], "general", false)]
    fn test_group_for_files(#[case] names: &[&str], #[case] group: &str, #[case] enhancement: bool) {
        let result = group_for_files(&files(names)).unwrap();
        assert_eq!(result.name, group);
        assert_eq!(result.is_enhancement, enhancement);
    }

    #[test]
    fn test_no_files_has_no_group() {
        assert!(group_for_files(&[]).is_none());
    }

    #[tokio::test]
    async fn test_static_override_skips_remote_lookup() {
        let source = Arc::new(FakeSource::default());
        let query = PullRequestQuery::new("o", "r", source.clone());
        let classifier = GroupClassifier::new(BTreeMap::from([(1234, "sig-x".to_string())]));

        let group = classifier.classify(&query, 1234).await.unwrap();
        assert_eq!(group.name, "sig-x");
        assert!(group.is_enhancement);
        assert_eq!(source.file_calls(), 0);
    }

    #[tokio::test]
    async fn test_classify_from_changed_files() {
        let source = FakeSource::default().with_files(42, &["enhancements/storage/csi.md"]);
        let query = PullRequestQuery::new("o", "r", Arc::new(source));

        let group = GroupClassifier::default().classify(&query, 42).await.unwrap();
        assert_eq!(group.name, "storage");
    }

    #[tokio::test]
    async fn test_classify_errors() {
        let source = FakeSource::default().with_files(1, &[]);
        let query = PullRequestQuery::new("o", "r", Arc::new(source));
        let classifier = GroupClassifier::default();

        assert!(matches!(
            classifier.classify(&query, 1).await,
            Err(ClassifyError::NoFiles { number: 1 })
        ));
        assert!(matches!(
            classifier.classify(&query, 2).await,
            Err(ClassifyError::Files { number: 2, .. })
        ));
    }
}
