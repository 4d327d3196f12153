pub mod types;

pub use types::Report;

use crate::stats::{PrState, PullRequestDetails};
use colored::Colorize;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};
use types::yes_no;

const DESCRIPTION_LINES: usize = 3;
const DESCRIPTION_WIDTH: usize = 100;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report: {0}")]
    Write(#[from] std::io::Error),
}

/// Print a titled table of pull requests to `out`. Reading the requests
/// never modifies them, so the same bucket can be shown any number of times.
#[instrument(skip(out, requests), fields(requests = requests.len()))]
pub fn show_prs<W: Write>(
    out: &mut W,
    title: &str,
    requests: &[Arc<PullRequestDetails>],
    with_description: bool,
) -> Result<(), ReportError> {
    let report = Report::new(title, requests, with_description);
    debug!("writing report to terminal");
    out.write_all(render_terminal(&report).as_bytes())?;
    Ok(())
}

/// Terminal table layout:
///
/// ═══ Pull Request 1234 ═══
/// PR       STATE   LGTM  PRIO  STALE  AUTHOR        TITLE
/// #1234    open    yes   no    no     alice         Add widget enhancement
///          https://github.com/openshift/enhancements/pull/1234
///
/// ═══ 1 pull request ═══
pub fn render_terminal(report: &Report) -> String {
    let author_width = report
        .requests
        .iter()
        .map(|d| d.author.chars().count())
        .max()
        .unwrap_or(0)
        .max("AUTHOR".len());

    let mut text = String::new();
    text.push_str(&format!("═══ {} ═══\n", report.title.bold()));
    text.push_str(&format!(
        "{:<8} {:<7} {:<5} {:<5} {:<6} {:<width$} TITLE\n",
        "PR",
        "STATE",
        "LGTM",
        "PRIO",
        "STALE",
        "AUTHOR",
        width = author_width
    ));

    for details in &report.requests {
        text.push_str(&format!(
            "{:<8} {} {:<5} {:<5} {} {:<width$} {}\n",
            format!("#{}", details.number),
            colorize_state(details.state),
            yes_no(details.lgtm),
            yes_no(details.prioritized),
            colorize_stale(details.stale),
            details.author,
            details.title,
            width = author_width
        ));
        if !details.url.is_empty() {
            text.push_str(&format!("{:<8} {}\n", "", details.url.dimmed()));
        }
        if report.with_description {
            for line in description_excerpt(details) {
                text.push_str(&format!("{:<8} {}\n", "", line));
            }
        }
    }

    text.push('\n');
    text.push_str(&format!("═══ {} ═══\n", report.summary()));
    text
}

/// Write the report as a markdown file.
///
/// # Pull Request 1234
///
/// | PR | State | LGTM | Prioritized | Stale | Author | Title |
/// |---|---|---|---|---|---|---|
/// | [#1234](url) | open | yes | no | no | alice | Add widget enhancement |
#[instrument(skip(report), fields(title = %report.title))]
pub fn write_markdown_report(report: &Report, path: &Path) -> Result<(), ReportError> {
    let mut md = String::new();
    md.push_str(&format!("# {}\n\n", report.title));
    md.push_str("| PR | State | LGTM | Prioritized | Stale | Author | Title |\n");
    md.push_str("|---|---|---|---|---|---|---|\n");
    for details in &report.requests {
        let pr = if details.url.is_empty() {
            format!("#{}", details.number)
        } else {
            format!("[#{}]({})", details.number, details.url)
        };
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} |\n",
            pr,
            details.state,
            yes_no(details.lgtm),
            yes_no(details.prioritized),
            yes_no(details.stale),
            details.author,
            details.title.replace('|', "\\|"),
        ));
    }
    if report.with_description {
        for details in &report.requests {
            let excerpt = description_excerpt(details);
            if excerpt.is_empty() {
                continue;
            }
            md.push_str(&format!("\n## #{}\n\n", details.number));
            for line in excerpt {
                md.push_str(&format!("> {line}\n"));
            }
        }
    }
    md.push_str(&format!("\n_{}_\n", report.summary()));

    debug!(path = %path.display(), "writing report to file");
    std::fs::write(path, md)?;
    Ok(())
}

/// The first few non-empty lines of the description, each cut to a fixed width.
fn description_excerpt(details: &PullRequestDetails) -> Vec<String> {
    let Some(body) = details.description.as_deref() else {
        return Vec::new();
    };
    body.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(DESCRIPTION_LINES)
        .map(|l| {
            if l.chars().count() > DESCRIPTION_WIDTH {
                let cut: String = l.chars().take(DESCRIPTION_WIDTH - 1).collect();
                format!("{cut}…")
            } else {
                l.to_string()
            }
        })
        .collect()
}

/// Colour is applied after padding so escape codes don't skew the columns.
fn colorize_state(state: PrState) -> colored::ColoredString {
    let cell = format!("{:<7}", state.as_str());
    match state {
        PrState::Open => cell.green(),
        PrState::Merged => cell.magenta(),
        PrState::Closed => cell.red(),
    }
}

fn colorize_stale(stale: bool) -> colored::ColoredString {
    let cell = format!("{:<6}", yes_no(stale));
    if stale {
        cell.yellow().bold()
    } else {
        cell.normal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_details() -> Arc<PullRequestDetails> {
        Arc::new(PullRequestDetails {
            number: 1234,
            title: "Add widget enhancement".to_string(),
            author: "alice".to_string(),
            url: "https://github.com/openshift/enhancements/pull/1234".to_string(),
            description: Some("\nFirst line\n\nSecond line\nThird\nFourth".to_string()),
            updated_at: "2024-05-30T00:00:00Z".parse().unwrap(),
            state: PrState::Open,
            approvals: 1,
            lgtm: true,
            prioritized: false,
            stale: false,
        })
    }

    #[test]
    fn test_render_terminal_contains_row() {
        let report = Report::new("Pull Request 1234", &[sample_details()], false);
        let text = render_terminal(&report);
        assert!(text.contains("Pull Request 1234"));
        assert!(text.contains("#1234"));
        assert!(text.contains("open"));
        assert!(text.contains("alice"));
        assert!(text.contains("Add widget enhancement"));
        assert!(text.contains("1 pull request"));
        assert!(!text.contains("First line"));
    }

    #[test]
    fn test_render_terminal_with_description() {
        let report = Report::new("Pull Request 1234", &[sample_details()], true);
        let text = render_terminal(&report);
        assert!(text.contains("First line"));
        assert!(text.contains("Third"));
        assert!(!text.contains("Fourth"));
    }

    #[test]
    fn test_empty_report() {
        let report = Report::new("Nothing", &[], true);
        let text = render_terminal(&report);
        assert!(text.contains("0 pull requests"));
    }

    #[test]
    fn test_show_prs_does_not_mutate_requests() {
        let requests = vec![sample_details()];
        let mut first = Vec::new();
        let mut second = Vec::new();
        show_prs(&mut first, "Pull Request 1234", &requests, true).unwrap();
        show_prs(&mut second, "Pull Request 1234", &requests, true).unwrap();
        assert_eq!(first, second);
        assert_eq!(requests.len(), 1);
        assert_eq!(*requests[0], *sample_details());
    }

    #[test]
    fn test_long_description_lines_are_cut() {
        let mut details = (*sample_details()).clone();
        details.description = Some("x".repeat(250));
        let excerpt = description_excerpt(&details);
        assert_eq!(excerpt.len(), 1);
        assert_eq!(excerpt[0].chars().count(), DESCRIPTION_WIDTH);
    }

    #[test]
    fn test_write_markdown_report() {
        let report = Report::new("Pull Request 1234", &[sample_details()], true);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");
        write_markdown_report(&report, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("# Pull Request 1234"));
        assert!(content.contains("[#1234](https://github.com/openshift/enhancements/pull/1234)"));
        assert!(content.contains("| open | yes | no | no | alice |"));
        assert!(content.contains("> First line"));
        assert!(content.contains("_1 pull request_"));
    }

    #[test]
    fn test_write_markdown_to_missing_dir_fails() {
        let report = Report::new("x", &[], false);
        let dir = tempfile::tempdir().unwrap();
        let err = write_markdown_report(&report, &dir.path().join("no/such/report.md")).unwrap_err();
        assert!(matches!(err, ReportError::Write(_)));
    }
}
