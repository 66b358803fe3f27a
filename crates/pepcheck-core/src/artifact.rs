//! Auditable review artifacts.
//!
//! Each review can be written to `<dir>/<review_id>/review.json` alongside a
//! `review.digest` file so a later reader can detect tampering.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::domain::{ComplianceError, ComplianceResult, Record, Result};
use crate::orchestrator::{ReviewOutcome, ReviewStage};

/// Persisted record of one review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewArtifact {
    pub review_id: String,
    pub record_name: String,
    /// Digest of the record exactly as reviewed.
    pub record_digest: String,
    pub stage: ReviewStage,
    pub result: ComplianceResult,
    pub reviewed_at: DateTime<Utc>,
}

impl ReviewArtifact {
    /// Build an artifact for `record` with a fresh review id.
    pub fn new(record: &Record, outcome: &ReviewOutcome) -> Result<Self> {
        Ok(Self {
            review_id: Uuid::new_v4().to_string(),
            record_name: record.name.clone(),
            record_digest: record.digest()?,
            stage: outcome.stage,
            result: outcome.result.clone(),
            reviewed_at: Utc::now(),
        })
    }

    /// Whether this artifact describes `record` byte-for-byte.
    pub fn matches_record(&self, record: &Record) -> Result<bool> {
        Ok(record.digest()? == self.record_digest)
    }
}

fn digest_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Persist `<dir>/<review_id>/review.json` and `<dir>/<review_id>/review.digest`.
pub fn write_review_artifact(artifact: &ReviewArtifact, dir: &Path) -> Result<PathBuf> {
    let review_dir = dir.join(&artifact.review_id);
    std::fs::create_dir_all(&review_dir)?;

    let path = review_dir.join("review.json");
    let digest_path = review_dir.join("review.digest");
    let json = serde_json::to_vec_pretty(artifact)?;

    std::fs::write(&path, &json)?;
    std::fs::write(&digest_path, digest_hex(&json).as_bytes())?;

    Ok(path)
}

/// Read and verify `<dir>/<review_id>/review.json` integrity.
pub fn read_review_artifact(review_id: &str, dir: &Path) -> Result<ReviewArtifact> {
    let review_dir = dir.join(review_id);
    let json = std::fs::read(review_dir.join("review.json"))?;
    let digest = std::fs::read_to_string(review_dir.join("review.digest"))?;

    let actual = digest_hex(&json);
    if digest.trim() != actual {
        return Err(ComplianceError::DigestMismatch {
            expected: digest.trim().to_string(),
            actual,
        });
    }
    Ok(serde_json::from_slice(&json)?)
}
