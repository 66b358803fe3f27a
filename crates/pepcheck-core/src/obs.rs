//! Structured observability hooks for review and summarization.
//!
//! Events are emitted at `info!` level except section failures (`warn!`).
//! Filter with `RUST_LOG`; see [`crate::telemetry::init_tracing`].

use tracing::{info, warn};

use crate::domain::ComplianceResult;

/// Emit event: review started under a policy.
pub fn emit_review_started(record_name: &str, policy: &str, sections: usize) {
    info!(
        event = "review.started",
        record = %record_name,
        policy = %policy,
        sections = sections,
    );
}

/// Emit event: one validation stage produced a result.
pub fn emit_stage_completed(record_name: &str, stage: &str, result: &ComplianceResult) {
    info!(
        event = "review.stage_completed",
        record = %record_name,
        stage = %stage,
        passed = result.passed,
        score = result.score,
        issues = result.issues.len(),
    );
}

/// Emit event: the deterministic stage failed, so the semantic stage was skipped.
pub fn emit_short_circuited(record_name: &str, critical_issues: usize) {
    info!(
        event = "review.short_circuited",
        record = %record_name,
        critical_issues = critical_issues,
    );
}

/// Emit event: a section could not be summarized (warning level).
pub fn emit_section_failed(title: &str, index: usize, error: &dyn std::fmt::Display) {
    warn!(
        event = "summarize.section_failed",
        section = %title,
        index = index,
        error = %error,
    );
}

/// Emit event: a summarization batch finished.
pub fn emit_batch_finished(subject: &str, summarized: usize, failed: usize, skipped: usize) {
    info!(
        event = "summarize.batch_finished",
        subject = %subject,
        summarized = summarized,
        failed = failed,
        skipped = skipped,
    );
}
