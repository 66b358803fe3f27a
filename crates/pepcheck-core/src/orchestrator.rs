//! Compliance orchestrator.
//!
//! Single validation entry point. Under the default policy the deterministic
//! stage runs first; a failure there is returned immediately without paying
//! for a semantic call. A pass hands the record to the semantic reviewer,
//! whose result is returned as-is.

use std::sync::Arc;

use completion_client::CompletionService;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::config::ReviewConfig;
use crate::deep::validate_deep;
use crate::domain::{ComplianceResult, Record, Result};
use crate::fast::validate_fast_with;
use crate::obs;
use crate::rules::RuleEngine;

/// How the two validators are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewPolicy {
    /// Deterministic first; semantic only when it passes.
    #[default]
    FastThenDeep,
    FastOnly,
    DeepOnly,
}

impl ReviewPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewPolicy::FastThenDeep => "fast_then_deep",
            ReviewPolicy::FastOnly => "fast_only",
            ReviewPolicy::DeepOnly => "deep_only",
        }
    }
}

/// Which validator produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStage {
    Fast,
    Deep,
}

impl ReviewStage {
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewStage::Fast => "fast",
            ReviewStage::Deep => "deep",
        }
    }
}

/// A result tagged with its producing stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewOutcome {
    pub stage: ReviewStage,
    pub result: ComplianceResult,
}

/// Combines the deterministic and semantic validators.
pub struct ComplianceOrchestrator {
    service: Arc<dyn CompletionService>,
    engine: Option<Arc<RuleEngine>>,
    policy: ReviewPolicy,
}

impl ComplianceOrchestrator {
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        Self {
            service,
            engine: None,
            policy: ReviewPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ReviewPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Use a custom rule engine for the deterministic stage.
    pub fn with_engine(mut self, engine: Arc<RuleEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    fn engine(&self) -> &RuleEngine {
        self.engine.as_deref().unwrap_or_else(|| RuleEngine::standard())
    }

    pub fn policy(&self) -> ReviewPolicy {
        self.policy
    }

    /// Review `record` and return the deciding result.
    pub async fn review(&self, record: &Record, config: &ReviewConfig) -> Result<ComplianceResult> {
        Ok(self.review_detailed(record, config).await?.result)
    }

    /// Review `record`, reporting which stage decided.
    #[instrument(skip_all, fields(record = %record.name, policy = self.policy.as_str()))]
    pub async fn review_detailed(
        &self,
        record: &Record,
        config: &ReviewConfig,
    ) -> Result<ReviewOutcome> {
        record.validate()?;
        obs::emit_review_started(&record.name, self.policy.as_str(), record.sections.len());

        if self.policy != ReviewPolicy::DeepOnly {
            let fast = validate_fast_with(self.engine(), record, config.claim_scan);
            obs::emit_stage_completed(&record.name, ReviewStage::Fast.as_str(), &fast);

            if !fast.passed && self.policy == ReviewPolicy::FastThenDeep {
                obs::emit_short_circuited(&record.name, fast.critical_issues().count());
            }
            if self.policy == ReviewPolicy::FastOnly || !fast.passed {
                return Ok(ReviewOutcome {
                    stage: ReviewStage::Fast,
                    result: fast,
                });
            }
        }

        let deep = validate_deep(self.service.as_ref(), record, config).await?;
        obs::emit_stage_completed(&record.name, ReviewStage::Deep.as_str(), &deep);
        Ok(ReviewOutcome {
            stage: ReviewStage::Deep,
            result: deep,
        })
    }
}
