//! Deterministic pre-validation.
//!
//! A cheap, conservative filter over the concatenated record text. It
//! tolerates false positives so obviously non-compliant drafts are rejected
//! before paying for a semantic review.

use crate::domain::{ComplianceResult, Record};
use crate::rules::{ClaimScanMode, RuleEngine};

/// Run the standard rule battery once over `record`.
pub fn validate_fast(record: &Record) -> ComplianceResult {
    validate_fast_with(RuleEngine::standard(), record, ClaimScanMode::default())
}

/// Run a specific engine with an explicit claim scan mode.
pub fn validate_fast_with(
    engine: &RuleEngine,
    record: &Record,
    claim_scan: ClaimScanMode,
) -> ComplianceResult {
    let issues = engine.evaluate(&record.full_text(), claim_scan);
    ComplianceResult::from_fast_issues(issues)
}

/// Screen generated plain-language summaries with the standard rules.
///
/// Record validation never sees these, so they are checked separately before
/// a summarized record is published.
pub fn validate_summaries(record: &Record) -> ComplianceResult {
    validate_summaries_with(RuleEngine::standard(), record, ClaimScanMode::default())
}

pub fn validate_summaries_with(
    engine: &RuleEngine,
    record: &Record,
    claim_scan: ClaimScanMode,
) -> ComplianceResult {
    let text = record
        .sections
        .iter()
        .filter_map(|s| s.plain_language_summary.as_deref())
        .collect::<Vec<_>>()
        .join("\n\n");
    ComplianceResult::from_fast_issues(engine.evaluate(&text, claim_scan))
}
