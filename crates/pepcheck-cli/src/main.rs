//! pepcheck - compliance screening for peptide reference content
//!
//! ## Commands
//!
//! - `check`: Review a record and print the compliance result
//! - `summarize`: Attach plain-language summaries to every section
//! - `publish-check`: Summarize, review and record an auditable artifact
//! - `rules`: List the built-in pattern rules

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};

use completion_client::{
    CompletionConfig, CompletionService, HttpCompletionClient, DEFAULT_BASE_URL, DEFAULT_MODEL,
    DEFAULT_TIMEOUT_SECS,
};
use pepcheck_core::{
    publication_block_reason, summarize_record, validate_summaries_with, write_review_artifact,
    BatchReport, ClaimScanMode, ComplianceOrchestrator, Record, ReviewArtifact, ReviewConfig,
    ReviewPolicy, RuleEngine, SummarizerConfig,
};

#[derive(Parser)]
#[command(name = "pepcheck")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compliance screening for peptide reference content", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Completion service settings shared by every command
#[derive(Args, Debug)]
struct ConnectionArgs {
    /// API key for the completion service
    #[arg(long, global = true, env = "PEPCHECK_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model identifier
    #[arg(long, global = true, env = "PEPCHECK_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// OpenAI-compatible base URL
    #[arg(long, global = true, env = "PEPCHECK_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Per-call timeout in seconds (0 disables it)
    #[arg(long, global = true, env = "PEPCHECK_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,
}

impl ConnectionArgs {
    fn completion_config(&self) -> CompletionConfig {
        let api_key = self
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .unwrap_or_default();
        let timeout = (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs));
        CompletionConfig::new(&api_key, &self.model)
            .with_base_url(&self.base_url)
            .with_timeout(timeout)
    }
}

/// Review tuning shared by `check` and `publish-check`
#[derive(Args, Debug, Clone, Copy)]
struct ReviewArgs {
    /// Turn unreadable semantic verdicts into a conservative failure instead of an error
    #[arg(long)]
    best_effort: bool,

    /// Report every uncited claim instead of only the first
    #[arg(long)]
    report_all_claims: bool,
}

impl ReviewArgs {
    fn review_config(self, completion: CompletionConfig) -> ReviewConfig {
        let claim_scan = if self.report_all_claims {
            ClaimScanMode::ReportAll
        } else {
            ClaimScanMode::StopAtFirst
        };
        ReviewConfig::new(completion)
            .best_effort(self.best_effort)
            .with_claim_scan(claim_scan)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Review a record and print the compliance result
    Check {
        /// Path to the record (JSON)
        record: PathBuf,

        /// Run only the pattern rules
        #[arg(long, conflicts_with = "deep_only")]
        fast_only: bool,

        /// Skip the pattern rules and ask the semantic reviewer only
        #[arg(long)]
        deep_only: bool,

        #[command(flatten)]
        review: ReviewArgs,
    },

    /// Attach plain-language summaries to every section
    Summarize {
        /// Path to the record (JSON)
        record: PathBuf,

        /// Output path for the summarized record (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Sections summarized at once
        #[arg(long, default_value = "1")]
        concurrency: usize,
    },

    /// Summarize, review and write an auditable review artifact
    PublishCheck {
        /// Path to the record (JSON)
        record: PathBuf,

        /// Root directory for review artifacts (default: .pepcheck/reviews)
        #[arg(long)]
        artifacts_dir: Option<PathBuf>,

        /// Output path for the summarized record
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Sections summarized at once
        #[arg(long, default_value = "1")]
        concurrency: usize,

        #[command(flatten)]
        review: ReviewArgs,
    },

    /// List the built-in pattern rules
    Rules,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    pepcheck_core::init_tracing(cli.json, level);

    let completion = cli.connection.completion_config();
    let service: Arc<dyn CompletionService> = Arc::new(
        HttpCompletionClient::new().context("Failed to build completion client")?,
    );

    match cli.command {
        Commands::Check {
            record,
            fast_only,
            deep_only,
            review,
        } => {
            let policy = if fast_only {
                ReviewPolicy::FastOnly
            } else if deep_only {
                ReviewPolicy::DeepOnly
            } else {
                ReviewPolicy::FastThenDeep
            };
            cmd_check(service, &record, policy, &review.review_config(completion)).await
        }
        Commands::Summarize {
            record,
            output,
            concurrency,
        } => {
            let config = SummarizerConfig::new(completion).with_concurrency(concurrency);
            cmd_summarize(service.as_ref(), &record, output.as_deref(), &config).await
        }
        Commands::PublishCheck {
            record,
            artifacts_dir,
            output,
            concurrency,
            review,
        } => {
            let summarizer = SummarizerConfig::new(completion.clone()).with_concurrency(concurrency);
            cmd_publish_check(
                service,
                &record,
                artifacts_dir.as_deref(),
                output.as_deref(),
                &summarizer,
                &review.review_config(completion),
            )
            .await
        }
        Commands::Rules => cmd_rules(),
    }
}

fn load_record(path: &Path) -> Result<Record> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read record: {:?}", path))?;
    Record::from_json(&raw).with_context(|| format!("Failed to parse record: {:?}", path))
}

fn write_record(record: &Record, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(record)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write record to {:?}", path))?;
            println!("Wrote {:?}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn report_failures(report: &BatchReport) {
    for (title, reason) in report.failures() {
        warn!(section = title, reason, "section left without summary");
        println!("  ! {}: {}", title, reason);
    }
    if report.skipped_count() > 0 {
        println!("  {} section(s) skipped", report.skipped_count());
    }
}

/// Review a record and print the result; fail when it is rejected.
async fn cmd_check(
    service: Arc<dyn CompletionService>,
    path: &Path,
    policy: ReviewPolicy,
    config: &ReviewConfig,
) -> Result<()> {
    let record = load_record(path)?;
    let outcome = ComplianceOrchestrator::new(service)
        .with_policy(policy)
        .review_detailed(&record, config)
        .await
        .with_context(|| format!("Review of '{}' did not complete", record.name))?;

    println!("{}", serde_json::to_string_pretty(&outcome.result)?);
    info!(
        record = %record.name,
        stage = outcome.stage.as_str(),
        passed = outcome.result.passed,
        "review complete"
    );

    if !outcome.result.passed {
        anyhow::bail!(
            "Record '{}' rejected at {} stage (score {})",
            record.name,
            outcome.stage.as_str(),
            outcome.result.score
        );
    }
    Ok(())
}

/// Summarize every section and write the updated record.
async fn cmd_summarize(
    service: &dyn CompletionService,
    path: &Path,
    output: Option<&Path>,
    config: &SummarizerConfig,
) -> Result<()> {
    let record = load_record(path)?;
    let (updated, report) = summarize_record(service, &record, config).await?;

    write_record(&updated, output)?;
    println!(
        "Summarized {}/{} section(s)",
        report.summarized_count(),
        report.outcomes.len()
    );
    report_failures(&report);
    Ok(())
}

/// Summarize, review and persist a review artifact.
///
/// Artifact layout:
/// - `<artifacts_dir>/<review_id>/review.json`
/// - `<artifacts_dir>/<review_id>/review.digest`
async fn cmd_publish_check(
    service: Arc<dyn CompletionService>,
    path: &Path,
    artifacts_dir: Option<&Path>,
    output: Option<&Path>,
    summarizer: &SummarizerConfig,
    review: &ReviewConfig,
) -> Result<()> {
    let record = load_record(path)?;
    let (updated, report) = summarize_record(service.as_ref(), &record, summarizer).await?;
    report_failures(&report);

    let outcome = ComplianceOrchestrator::new(service)
        .review_detailed(&updated, review)
        .await
        .with_context(|| format!("Review of '{}' did not complete", updated.name))?;

    let root = artifacts_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(".pepcheck/reviews"));
    let artifact = ReviewArtifact::new(&updated, &outcome)?;
    let artifact_path = write_review_artifact(&artifact, &root)
        .with_context(|| format!("Failed to write review artifact under {:?}", root))?;
    println!("Review {} recorded at {:?}", artifact.review_id, artifact_path);

    if let Some(path) = output {
        write_record(&updated, Some(path))?;
    }

    if let Some(reason) = publication_block_reason(&outcome.result) {
        anyhow::bail!("Publication of '{}' blocked: {}", updated.name, reason);
    }
    let summary_check =
        validate_summaries_with(RuleEngine::standard(), &updated, review.claim_scan);
    if let Some(reason) = publication_block_reason(&summary_check) {
        anyhow::bail!(
            "Publication of '{}' blocked by generated summaries: {}",
            updated.name,
            reason
        );
    }
    println!(
        "'{}' cleared for publication (score {})",
        updated.name, outcome.result.score
    );
    Ok(())
}

/// Print the built-in rule table.
fn cmd_rules() -> Result<()> {
    for rule in RuleEngine::standard().rules() {
        println!(
            "{:<20} {:<8} {:<15} {}",
            rule.id,
            rule.severity.as_str(),
            rule.issue_type.as_str(),
            rule.pattern
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use completion_client::fakes::{FailingCompletionService, ScriptedCompletionService};
    use completion_client::CompletionError;

    fn write_fixture(dir: &Path, record: &Record) -> PathBuf {
        let path = dir.join("record.json");
        std::fs::write(&path, serde_json::to_string(record).unwrap()).unwrap();
        path
    }

    fn clean_record() -> Record {
        Record::new("Epitalon", "<p>A synthetic tetrapeptide.</p>")
            .with_section(pepcheck_core::Section::new(
                "History",
                "<p>First synthesized in the 1980s.</p>",
            ))
    }

    fn completion() -> CompletionConfig {
        CompletionConfig::new("sk-test", "test-model")
    }

    #[test]
    fn test_parse_check_flags() {
        let cli = Cli::try_parse_from([
            "pepcheck",
            "check",
            "record.json",
            "--fast-only",
            "--report-all-claims",
        ])
        .unwrap();
        match cli.command {
            Commands::Check {
                record,
                fast_only,
                deep_only,
                review,
            } => {
                assert_eq!(record, PathBuf::from("record.json"));
                assert!(fast_only);
                assert!(!deep_only);
                assert!(review.report_all_claims);
                assert!(!review.best_effort);
            }
            _ => panic!("expected check"),
        }
    }

    #[test]
    fn test_fast_only_conflicts_with_deep_only() {
        let result = Cli::try_parse_from([
            "pepcheck",
            "check",
            "record.json",
            "--fast-only",
            "--deep-only",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_connection_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "pepcheck",
            "summarize",
            "record.json",
            "--model",
            "local-model",
            "--base-url",
            "http://localhost:8080/v1",
            "--timeout-secs",
            "0",
            "--api-key",
            "sk-cli",
        ])
        .unwrap();
        let config = cli.connection.completion_config();
        assert_eq!(config.model, "local-model");
        assert_eq!(config.api_key, "sk-cli");
        assert_eq!(
            config.completions_url(),
            "http://localhost:8080/v1/chat/completions"
        );
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn test_load_record_rejects_non_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.json");
        std::fs::write(&path, "not json").unwrap();

        let msg = format!("{:#}", load_record(&path).unwrap_err());
        assert!(msg.contains("Failed to parse record"), "unexpected error: {msg}");
    }

    #[tokio::test]
    async fn test_check_fast_only_passes_clean_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), &clean_record());
        let service = Arc::new(FailingCompletionService::new(CompletionError::Transport(
            "offline".into(),
        )));

        let config = ReviewConfig::new(completion());
        cmd_check(service.clone(), &path, ReviewPolicy::FastOnly, &config)
            .await
            .unwrap();
        assert_eq!(service.call_count(), 0);
    }

    #[tokio::test]
    async fn test_check_rejects_vendor_content() {
        let dir = tempfile::tempdir().unwrap();
        let record = clean_record().with_section(pepcheck_core::Section::new(
            "Sourcing",
            "<p>Buy Epitalon from our store.</p>",
        ));
        let path = write_fixture(dir.path(), &record);
        let service = Arc::new(ScriptedCompletionService::new());

        let config = ReviewConfig::new(completion());
        let err = cmd_check(service, &path, ReviewPolicy::FastThenDeep, &config)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("rejected at fast stage"));
    }

    #[tokio::test]
    async fn test_summarize_writes_partial_results() {
        let dir = tempfile::tempdir().unwrap();
        let record = clean_record().with_section(pepcheck_core::Section::new(
            "Structure",
            "<p>Four amino acids: Ala-Glu-Asp-Gly.</p>",
        ));
        let path = write_fixture(dir.path(), &record);
        let out = dir.path().join("out.json");
        let service = ScriptedCompletionService::new()
            .respond("It was first made in the 1980s.")
            .fail(CompletionError::Transport("connection reset".into()));

        cmd_summarize(
            &service,
            &path,
            Some(&out),
            &SummarizerConfig::new(completion()),
        )
        .await
        .unwrap();

        let written = load_record(&out).unwrap();
        assert_eq!(
            written.sections[0].plain_language_summary.as_deref(),
            Some("It was first made in the 1980s.")
        );
        assert_eq!(written.sections[1], record.sections[1]);
    }

    #[tokio::test]
    async fn test_publish_check_writes_verifiable_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), &clean_record());
        let artifacts = dir.path().join("reviews");
        let out = dir.path().join("out.json");
        let service = Arc::new(
            ScriptedCompletionService::new()
                .respond("Scientists first made this peptide in the 1980s.")
                .respond(r#"{"passed": true, "score": 95, "issues": []}"#),
        );

        cmd_publish_check(
            service,
            &path,
            Some(&artifacts),
            Some(&out),
            &SummarizerConfig::new(completion()),
            &ReviewConfig::new(completion()),
        )
        .await
        .unwrap();

        let written = load_record(&out).unwrap();
        assert_eq!(
            written.sections[0].plain_language_summary.as_deref(),
            Some("Scientists first made this peptide in the 1980s.")
        );

        let review_ids: Vec<_> = std::fs::read_dir(&artifacts)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(review_ids.len(), 1);
        let artifact = pepcheck_core::read_review_artifact(&review_ids[0], &artifacts).unwrap();
        assert!(artifact.result.passed);
        assert!(artifact.matches_record(&written).unwrap());
    }

    #[tokio::test]
    async fn test_publish_check_blocks_on_unsafe_generated_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), &clean_record());
        let service = Arc::new(
            ScriptedCompletionService::new()
                .respond("Most people take 500 mcg daily.")
                .respond(r#"{"passed": true, "score": 96, "issues": []}"#),
        );

        let err = cmd_publish_check(
            service,
            &path,
            Some(&dir.path().join("reviews")),
            None,
            &SummarizerConfig::new(completion()),
            &ReviewConfig::new(completion()),
        )
        .await
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("generated summaries"), "unexpected error: {msg}");
        assert!(msg.contains("dosing"), "unexpected error: {msg}");
    }

    #[tokio::test]
    async fn test_publish_check_blocks_on_critical_issue() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), &clean_record());
        let service = Arc::new(
            ScriptedCompletionService::new()
                .respond("Made in the 1980s.")
                .respond(
                    r#"{"passed": false, "score": 10, "issues": [
                        {"type": "dosing", "severity": "critical", "description": "Implied protocol"}
                    ]}"#,
                ),
        );

        let err = cmd_publish_check(
            service,
            &path,
            Some(&dir.path().join("reviews")),
            None,
            &SummarizerConfig::new(completion()),
            &ReviewConfig::new(completion()),
        )
        .await
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("blocked"), "unexpected error: {msg}");
        assert!(msg.contains("dosing"), "unexpected error: {msg}");
    }
}
