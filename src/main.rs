use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use enhancements_report::command::{self, CommandError};
use enhancements_report::config;
use enhancements_report::enhancements::GroupClassifier;
use enhancements_report::github::GitHubClient;
use enhancements_report::stats::PullRequestQuery;

/// Enhancements report: reports group, review, label and staleness state
/// for pull requests against an enhancement-proposal repository.
#[derive(Parser, Debug)]
#[command(name = "enhancements-report", version, about)]
struct Cli {
    /// Config file (defaults to .enhancements-report.toml in the current directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// GitHub organization owning the repository
    #[arg(long, global = true)]
    org: Option<String>,

    /// Repository holding the enhancement proposals
    #[arg(long, global = true)]
    repo: Option<String>,

    /// Skip review lookups; LGTM is then taken from labels only
    #[arg(long, global = true)]
    dev: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Dump details for a pull request
    ShowPr {
        /// Pull request number
        #[arg(value_name = "PULL_REQUEST_ID", num_args = 0..)]
        args: Vec<String>,

        /// Also write the report as markdown to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "command failed");
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CommandError> {
    let Command::ShowPr { args, output } = cli.command;
    let number = command::parse_pr_id(&args)?;
    debug!(pr = number, "validated pull request ID");

    info!("loading configuration");
    let config = match cli.config.as_deref() {
        Some(path) => config::Config::load_from(path)?,
        None => config::Config::load()?,
    };

    let client = GitHubClient::from_config(&config).map_err(CommandError::Client)?;

    let mut query = PullRequestQuery::new(
        cli.org.as_deref().unwrap_or(config.org()),
        cli.repo.as_deref().unwrap_or(config.repo()),
        Arc::new(client),
    );
    query.dev_mode = cli.dev || config.stats.dev_mode;
    query.stale_after = chrono::Duration::days(i64::from(config.stale_after_days()));
    query.priority_labels = config.priority_labels();
    debug!(org = %query.org, repo = %query.repo, dev_mode = query.dev_mode, "query context ready");

    let classifier = GroupClassifier::new(config.group_overrides());

    let mut stdout = std::io::stdout().lock();
    command::show_pr(&mut stdout, number, &query, &classifier, output.as_deref()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_show_pr() {
        let cli = Cli::try_parse_from(["enhancements-report", "show-pr", "1234"]).unwrap();
        let Command::ShowPr { args, output } = cli.command;
        assert_eq!(args, vec!["1234".to_string()]);
        assert!(output.is_none());
        assert!(!cli.dev);
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "enhancements-report",
            "show-pr",
            "7",
            "--org",
            "example",
            "--dev",
            "-o",
            "out.md",
        ])
        .unwrap();
        assert_eq!(cli.org.as_deref(), Some("example"));
        assert!(cli.dev);
        let Command::ShowPr { output, .. } = cli.command;
        assert_eq!(output, Some(PathBuf::from("out.md")));
    }

    #[test]
    fn test_cli_leaves_argument_count_to_command() {
        let cli = Cli::try_parse_from(["enhancements-report", "show-pr", "1", "2"]).unwrap();
        let Command::ShowPr { args, .. } = cli.command;
        assert!(matches!(
            command::parse_pr_id(&args),
            Err(CommandError::ArgumentCount { count: 2 })
        ));
    }

    #[tokio::test]
    async fn test_run_validates_id_before_config_and_client() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let missing = missing.to_str().unwrap();
        let cli = Cli::try_parse_from([
            "enhancements-report",
            "show-pr",
            "abc",
            "--config",
            missing,
        ])
        .unwrap();

        let err = run(cli).await.unwrap_err();
        assert!(matches!(&err, CommandError::Validation { input, .. } if input == "abc"));
        assert!(err.to_string().contains("\"abc\""));
    }

    #[tokio::test]
    async fn test_run_rejects_argument_count_before_config() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let missing = missing.to_str().unwrap();
        let cli = Cli::try_parse_from([
            "enhancements-report",
            "show-pr",
            "--config",
            missing,
        ])
        .unwrap();

        assert!(matches!(
            run(cli).await,
            Err(CommandError::ArgumentCount { count: 0 })
        ));
    }

    #[tokio::test]
    async fn test_run_loads_config_after_valid_id() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let missing = missing.to_str().unwrap();
        let cli = Cli::try_parse_from([
            "enhancements-report",
            "show-pr",
            "1234",
            "--config",
            missing,
        ])
        .unwrap();

        assert!(matches!(
            run(cli).await,
            Err(CommandError::Configuration(_))
        ));
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["enhancements-report"]).is_err());
    }
}
