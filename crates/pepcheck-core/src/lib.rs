//! pepcheck Core Library
//!
//! Certifies machine-authored peptide reference content before publication:
//!
//! - a compliance pipeline (deterministic rule pre-filter + semantic review)
//!   producing a [`ComplianceResult`] with a score and issue list;
//! - a plain-language pass that summarizes each section independently and
//!   tolerates per-section failure.
//!
//! The completion service is reached only through the
//! [`completion_client::CompletionService`] trait, with a
//! [`completion_client::CompletionConfig`] passed into every call.

pub mod artifact;
pub mod batch;
pub mod config;
pub mod deep;
pub mod domain;
pub mod fast;
pub mod obs;
pub mod orchestrator;
pub mod rules;
pub mod summarizer;
pub mod telemetry;

pub use artifact::{read_review_artifact, write_review_artifact, ReviewArtifact};
pub use batch::{summarize_all, summarize_record, BatchReport, BatchRunner, SectionOutcome};
pub use config::{ReviewConfig, SummarizerConfig};
pub use deep::{parse_verdict, render_review_prompt, validate_deep, REVIEW_RUBRIC};
pub use domain::{
    publication_block_reason, ComplianceError, ComplianceResult, Issue, IssueType, Record,
    Result, Section, Severity, SummarizeError,
};
pub use fast::{validate_fast, validate_fast_with, validate_summaries, validate_summaries_with};
pub use orchestrator::{ComplianceOrchestrator, ReviewOutcome, ReviewPolicy, ReviewStage};
pub use rules::{ClaimScanMode, PatternRule, RuleEngine, ScanMode};
pub use summarizer::{strip_markup, summarize_section, SUMMARY_RUBRIC};
pub use telemetry::init_tracing;

pub use completion_client::{CompletionConfig, CompletionError, CompletionService};
