//! Semantic review through the completion service.
//!
//! The model's JSON verdict is treated as an untrusted payload: every field is
//! checked for presence and type, with a conservative default when absent.
//! Failures of the service itself propagate as [`ComplianceError::Completion`]
//! so callers can tell "content failed review" from "review could not run".

use completion_client::{CompletionError, CompletionRequest, CompletionService};
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::config::ReviewConfig;
use crate::domain::{ComplianceError, ComplianceResult, Issue, IssueType, Record, Result, Severity};

/// System prompt for the semantic reviewer.
pub const REVIEW_RUBRIC: &str = "You are a compliance reviewer for educational content about research peptides. \
The content must be purely educational and must never read as medical guidance or promotion.

Flag as CRITICAL:
- Medical advice (telling the reader what they should do for their health)
- Dosing recommendations or dosing schedules
- Vendor, supplier or purchasing mentions
- Unsubstantiated claims presented as established fact

Flag as WARNING:
- Promotional or hype language
- Absolute claims without qualification (\"cures\", \"always\", \"guaranteed\")
- Statements of effect that lack a citation

Respond with a single JSON object and nothing else:
{\"passed\": boolean, \"score\": integer 0-100, \"issues\": [{\"type\": \"medical_advice\" | \"dosing\" | \"vendor\" | \"claims\" | \"other\", \"severity\": \"critical\" | \"warning\" | \"info\", \"description\": string, \"location\": string (verbatim excerpt, optional)}]}
\"passed\" must be false when any critical issue is present.";

const MISSING_DESCRIPTION: &str = "no description provided by reviewer";

/// Serialize a record into the reviewer's user prompt.
pub fn render_review_prompt(record: &Record) -> String {
    let mut lines = Vec::with_capacity(record.sections.len() + 2);
    lines.push(format!("PEPTIDE: {}", record.name));
    lines.push(format!("SUMMARY: {}", record.summary_html));
    for section in &record.sections {
        lines.push(format!(
            "SECTION \"{}\": {}",
            section.title, section.content_html
        ));
    }
    lines.join("\n")
}

/// Parse a verdict payload.
///
/// Returns `Err` with a reason only when the payload is not a JSON object at
/// all; missing or ill-typed fields fall back to defaults.
pub fn parse_verdict(content: &str) -> std::result::Result<ComplianceResult, String> {
    let value: Value = serde_json::from_str(strip_code_fence(content))
        .map_err(|e| format!("not valid JSON: {e}"))?;
    let obj = value
        .as_object()
        .ok_or_else(|| "verdict is not a JSON object".to_string())?;

    let passed = obj.get("passed").and_then(Value::as_bool).unwrap_or(false);
    let score = obj.get("score").and_then(read_score).unwrap_or(0);
    let issues = obj
        .get("issues")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(parse_issue).collect())
        .unwrap_or_default();

    Ok(ComplianceResult::from_verdict(passed, score, issues))
}

fn read_score(v: &Value) -> Option<i64> {
    v.as_i64()
        .or_else(|| v.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64))
        .or_else(|| v.as_str().and_then(|s| s.trim().parse::<i64>().ok()))
}

fn parse_issue(v: &Value) -> Option<Issue> {
    let obj: &Map<String, Value> = v.as_object()?;
    let issue_type = obj
        .get("type")
        .and_then(Value::as_str)
        .map(IssueType::parse_lenient)
        .unwrap_or(IssueType::Other);
    let severity = obj
        .get("severity")
        .and_then(Value::as_str)
        .map(Severity::parse_lenient)
        .unwrap_or(Severity::Warning);
    let description = obj
        .get("description")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(MISSING_DESCRIPTION);
    let location = obj
        .get("location")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty());

    let issue = Issue::new(issue_type, severity, description);
    Some(match location {
        Some(loc) => issue.at(loc),
        None => issue,
    })
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => {
            let rest = match rest.get(..4) {
                Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
                _ => rest,
            };
            rest.strip_suffix("```").unwrap_or(rest).trim()
        }
        None => trimmed,
    }
}

/// Review `record` with the completion service.
#[instrument(skip_all, fields(record = %record.name))]
pub async fn validate_deep(
    service: &dyn CompletionService,
    record: &Record,
    config: &ReviewConfig,
) -> Result<ComplianceResult> {
    record.validate()?;

    let request = CompletionRequest::new(
        REVIEW_RUBRIC,
        render_review_prompt(record),
        config.max_tokens,
        config.temperature,
    )
    .json();

    let response = match service.complete(&config.completion, &request).await {
        Ok(response) => response,
        Err(CompletionError::MalformedResponse(reason)) if config.best_effort => {
            warn!(reason = %reason, "malformed completion response; failing conservatively");
            return Ok(unreadable_verdict(&reason));
        }
        Err(e) => return Err(e.into()),
    };

    match parse_verdict(&response.content) {
        Ok(result) => {
            debug!(
                passed = result.passed,
                score = result.score,
                issues = result.issues.len(),
                "semantic verdict parsed"
            );
            Ok(result)
        }
        Err(reason) if config.best_effort => {
            warn!(reason = %reason, "unreadable verdict; failing conservatively");
            Ok(unreadable_verdict(&reason))
        }
        Err(reason) => Err(ComplianceError::MalformedVerdict(reason)),
    }
}

fn unreadable_verdict(reason: &str) -> ComplianceResult {
    ComplianceResult::conservative_failure(format!(
        "semantic review verdict could not be read: {reason}"
    ))
}
