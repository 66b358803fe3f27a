//! Compliance issue taxonomy and results.

use serde::{Deserialize, Serialize};

/// Category of a compliance violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    MedicalAdvice,
    Dosing,
    Vendor,
    Claims,
    Other,
}

impl IssueType {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueType::MedicalAdvice => "medical_advice",
            IssueType::Dosing => "dosing",
            IssueType::Vendor => "vendor",
            IssueType::Claims => "claims",
            IssueType::Other => "other",
        }
    }

    /// Lenient parse for model output. Unknown labels map to `Other`.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "medical_advice" | "medical" | "advice" => IssueType::MedicalAdvice,
            "dosing" | "dose" | "dosage" => IssueType::Dosing,
            "vendor" | "vendors" | "vendor_mention" => IssueType::Vendor,
            "claims" | "claim" | "unsupported_claim" | "unsupported_claims" => IssueType::Claims,
            _ => IssueType::Other,
        }
    }
}

impl std::fmt::Display for IssueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Issue severity. Any `Critical` issue fails the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }

    /// Lenient parse for model output. Unknown labels map to `Warning`.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "critical" | "high" | "error" => Severity::Critical,
            "info" | "low" | "note" => Severity::Info,
            _ => Severity::Warning,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single detected compliance violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub severity: Severity,
    pub description: String,
    /// Verbatim excerpt the issue refers to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Issue {
    pub fn new(issue_type: IssueType, severity: Severity, description: impl Into<String>) -> Self {
        Self {
            issue_type,
            severity,
            description: description.into(),
            location: None,
        }
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn is_critical(&self) -> bool {
        self.severity == Severity::Critical
    }
}

/// Outcome of a validation run.
///
/// Invariant: `passed` is true exactly when no issue is critical. Build values
/// through the constructors to keep it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceResult {
    pub passed: bool,
    pub score: u8,
    pub issues: Vec<Issue>,
}

impl ComplianceResult {
    /// Score floor for a passing deterministic run.
    pub const FAST_PASS_FLOOR: usize = 70;
    /// Points deducted per issue in a passing deterministic run.
    pub const FAST_ISSUE_PENALTY: usize = 10;

    /// Deterministic scoring: passing runs score `max(70, 100 - 10n)`, failing runs 0.
    pub fn from_fast_issues(issues: Vec<Issue>) -> Self {
        let passed = !issues.iter().any(Issue::is_critical);
        let score = if passed {
            100usize
                .saturating_sub(Self::FAST_ISSUE_PENALTY.saturating_mul(issues.len()))
                .max(Self::FAST_PASS_FLOOR)
        } else {
            0
        };
        Self {
            passed,
            score: score as u8,
            issues,
        }
    }

    /// Fuse a reviewer's claimed verdict with its itemized issues.
    ///
    /// A claimed pass with a critical issue fails. A claimed failure without a
    /// critical issue gains one so the invariant holds.
    pub fn from_verdict(claimed_pass: bool, score: i64, mut issues: Vec<Issue>) -> Self {
        let has_critical = issues.iter().any(Issue::is_critical);
        if !claimed_pass && !has_critical {
            issues.push(Issue::new(
                IssueType::Other,
                Severity::Critical,
                "semantic reviewer rejected the content without itemizing a critical issue",
            ));
        }
        let passed = claimed_pass && !has_critical;
        Self {
            passed,
            score: score.clamp(0, 100) as u8,
            issues,
        }
    }

    /// Most conservative result: failed, score 0, one critical `other` issue.
    pub fn conservative_failure(description: impl Into<String>) -> Self {
        Self {
            passed: false,
            score: 0,
            issues: vec![Issue::new(
                IssueType::Other,
                Severity::Critical,
                description,
            )],
        }
    }

    pub fn critical_issues(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.is_critical())
    }

    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    pub fn has_issue_of(&self, issue_type: IssueType) -> bool {
        self.issues.iter().any(|i| i.issue_type == issue_type)
    }
}

/// Human-readable publication block reason, if blocked.
pub fn publication_block_reason(result: &ComplianceResult) -> Option<String> {
    if result.passed {
        return None;
    }
    let mut types: Vec<&'static str> = Vec::new();
    for issue in result.critical_issues() {
        let label = issue.issue_type.as_str();
        if !types.contains(&label) {
            types.push(label);
        }
    }
    if types.is_empty() {
        return Some("compliance review failed".to_string());
    }
    Some(format!(
        "{} critical issue(s): {}",
        result.count_by_severity(Severity::Critical),
        types.join(", ")
    ))
}
