//! Built-in rule battery, in evaluation order.

use super::PatternRule;
use crate::domain::{IssueType, Severity};

/// The standard battery: medical advice, dosing, vendor, unsupported claims.
pub fn standard_rules() -> Vec<PatternRule> {
    vec![
        PatternRule::first_match(
            "advice-phrase",
            IssueType::MedicalAdvice,
            Severity::Critical,
            r"(?i)\b(?:you should|we recommend|recommended dose|consult your doctor about)\b",
            "Contains medical advice language: \"{excerpt}\"",
        ),
        PatternRule::first_match(
            "advice-imperative",
            IssueType::MedicalAdvice,
            Severity::Critical,
            r"(?i)\b(?:take|use|administer)\s+\d+(?:\.\d+)?\s*(?:mcg|mg|ml|iu)\b",
            "Instructs the reader to take a specific amount: \"{excerpt}\"",
        ),
        PatternRule::first_match(
            "dosing-label",
            IssueType::Dosing,
            Severity::Critical,
            r"(?i)\b(?:dose|dosage|dosing):?\s*\d+",
            "States a specific dose: \"{excerpt}\"",
        ),
        PatternRule::first_match(
            "dosing-schedule",
            IssueType::Dosing,
            Severity::Critical,
            r"(?i)\b\d+(?:\.\d+)?\s*(?:mcg|mg|ml|iu)\s+(?:twice daily|daily|per day|weekly)\b",
            "States a dosing schedule: \"{excerpt}\"",
        ),
        PatternRule::first_match(
            "vendor-purchase",
            IssueType::Vendor,
            Severity::Critical,
            r"(?i)\b(?:buy|purchase|order|available at|sold by)\b",
            "Contains purchasing language: \"{excerpt}\"",
        ),
        PatternRule::first_match(
            "vendor-supplier",
            IssueType::Vendor,
            Severity::Critical,
            r"(?i)\b(?:vendor|supplier|source)s?\b",
            "Mentions a supplier: \"{excerpt}\"",
        ),
        PatternRule::claim_citation(
            "unsupported-claim",
            IssueType::Claims,
            Severity::Warning,
            r"(?i)\b(?:increase|decrease|improve|reduce|enhance)[sd]?\s+\w+",
            "Effect claim without a nearby citation: \"{excerpt}\"",
        ),
    ]
}
