//! Rule compilation and evaluation.

use std::sync::OnceLock;

use regex::Regex;
use tracing::trace;

use super::{standard_rules, ClaimScanMode, PatternRule, ScanMode};
use crate::domain::Issue;

/// Characters inspected on each side of a claim for a citation marker.
pub const CITATION_WINDOW_CHARS: usize = 50;

/// Markers that count as a citation.
pub const CITATION_MARKERS: [&str; 2] = ["[PMID:", "[NCT:"];

#[derive(Debug)]
struct CompiledRule {
    rule: PatternRule,
    regex: Regex,
}

/// A compiled, ordered rule battery.
#[derive(Debug)]
pub struct RuleEngine {
    rules: Vec<CompiledRule>,
}

impl RuleEngine {
    /// Compile a rule table. Fails on the first invalid pattern.
    pub fn new(rules: Vec<PatternRule>) -> Result<Self, regex::Error> {
        let rules = rules
            .into_iter()
            .map(|rule| {
                let regex = Regex::new(&rule.pattern)?;
                Ok(CompiledRule { rule, regex })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { rules })
    }

    /// The built-in battery, compiled once per process.
    pub fn standard() -> &'static RuleEngine {
        static STANDARD: OnceLock<RuleEngine> = OnceLock::new();
        STANDARD.get_or_init(|| {
            RuleEngine::new(standard_rules()).expect("built-in rule patterns are valid")
        })
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> impl Iterator<Item = &PatternRule> {
        self.rules.iter().map(|c| &c.rule)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluate every rule against `text`. Issues come back in rule order.
    pub fn evaluate(&self, text: &str, claim_scan: ClaimScanMode) -> Vec<Issue> {
        let mut issues = Vec::new();

        for compiled in &self.rules {
            let rule = &compiled.rule;
            match rule.scan {
                ScanMode::FirstMatch => {
                    if let Some(m) = compiled.regex.find(text) {
                        trace!(rule = %rule.id, excerpt = m.as_str(), "rule matched");
                        issues.push(issue_for(rule, m.as_str()));
                    }
                }
                ScanMode::ClaimCitation => {
                    for m in compiled.regex.find_iter(text) {
                        if has_citation_near(text, m.start(), m.end(), CITATION_WINDOW_CHARS) {
                            continue;
                        }
                        trace!(rule = %rule.id, excerpt = m.as_str(), "uncited claim");
                        issues.push(issue_for(rule, m.as_str()));
                        if claim_scan == ClaimScanMode::StopAtFirst {
                            break;
                        }
                    }
                }
            }
        }

        issues
    }
}

fn issue_for(rule: &PatternRule, excerpt: &str) -> Issue {
    Issue::new(rule.issue_type, rule.severity, rule.describe(excerpt)).at(excerpt)
}

/// Whether a citation marker sits within `window` characters of `[start, end)`.
///
/// `start` and `end` must be char boundaries of `text`. The window is clamped
/// to the text bounds.
pub fn has_citation_near(text: &str, start: usize, end: usize, window: usize) -> bool {
    let from = if window == 0 {
        start
    } else {
        text[..start]
            .char_indices()
            .rev()
            .nth(window - 1)
            .map(|(i, _)| i)
            .unwrap_or(0)
    };
    let to = text[end..]
        .char_indices()
        .nth(window)
        .map(|(i, _)| end + i)
        .unwrap_or(text.len());

    let slice = &text[from..to];
    CITATION_MARKERS.iter().any(|marker| slice.contains(marker))
}
