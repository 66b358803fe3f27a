//! Pattern rule engine.
//!
//! Rules are plain data ([`PatternRule`]) so each one can be tested on its own
//! and new ones added without touching evaluation control flow. The
//! [`RuleEngine`] compiles a table once and evaluates it in table order.
//!
//! # Module layout
//!
//! - [`table`] — the built-in rule battery
//! - [`engine`] — compilation, evaluation and the citation window check

pub mod engine;
pub mod table;

use serde::{Deserialize, Serialize};

use crate::domain::{IssueType, Severity};

pub use engine::{has_citation_near, RuleEngine, CITATION_MARKERS, CITATION_WINDOW_CHARS};
pub use table::standard_rules;

/// Placeholder replaced with the matched excerpt when rendering descriptions.
pub const EXCERPT_PLACEHOLDER: &str = "{excerpt}";

/// How a rule consumes matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// Report the first match only.
    FirstMatch,
    /// Inspect every match; report those with no citation marker nearby.
    ClaimCitation,
}

/// How many uncited claims a [`ScanMode::ClaimCitation`] rule reports per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimScanMode {
    /// Stop after the first uncited occurrence.
    #[default]
    StopAtFirst,
    /// Report every uncited occurrence once.
    ReportAll,
}

/// One declarative rule: pattern, taxonomy and message template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRule {
    pub id: String,
    pub pattern: String,
    pub issue_type: IssueType,
    pub severity: Severity,
    /// May contain `{excerpt}`.
    pub description: String,
    pub scan: ScanMode,
}

impl PatternRule {
    pub fn first_match(
        id: &str,
        issue_type: IssueType,
        severity: Severity,
        pattern: &str,
        description: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            pattern: pattern.to_string(),
            issue_type,
            severity,
            description: description.to_string(),
            scan: ScanMode::FirstMatch,
        }
    }

    pub fn claim_citation(
        id: &str,
        issue_type: IssueType,
        severity: Severity,
        pattern: &str,
        description: &str,
    ) -> Self {
        Self {
            scan: ScanMode::ClaimCitation,
            ..Self::first_match(id, issue_type, severity, pattern, description)
        }
    }

    /// Render the description for a matched excerpt.
    pub fn describe(&self, excerpt: &str) -> String {
        self.description.replace(EXCERPT_PLACEHOLDER, excerpt)
    }
}
