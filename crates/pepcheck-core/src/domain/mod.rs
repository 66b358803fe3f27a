//! Core domain types: records, issues, results and errors.

pub mod error;
pub mod issue;
pub mod record;

pub use error::{ComplianceError, Result, SummarizeError};
pub use issue::{publication_block_reason, ComplianceResult, Issue, IssueType, Severity};
pub use record::{Record, Section};
