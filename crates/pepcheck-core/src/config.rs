//! Per-call configuration for review and summarization.

use completion_client::CompletionConfig;

use crate::rules::ClaimScanMode;

/// Settings for the compliance pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewConfig {
    pub completion: CompletionConfig,
    /// Turn an unreadable verdict into a conservative failing result instead
    /// of an error.
    pub best_effort: bool,
    pub claim_scan: ClaimScanMode,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ReviewConfig {
    pub const DEFAULT_TEMPERATURE: f32 = 0.1;
    pub const DEFAULT_MAX_TOKENS: u32 = 2000;

    pub fn new(completion: CompletionConfig) -> Self {
        Self {
            completion,
            best_effort: false,
            claim_scan: ClaimScanMode::default(),
            temperature: Self::DEFAULT_TEMPERATURE,
            max_tokens: Self::DEFAULT_MAX_TOKENS,
        }
    }

    pub fn best_effort(mut self, enabled: bool) -> Self {
        self.best_effort = enabled;
        self
    }

    pub fn with_claim_scan(mut self, mode: ClaimScanMode) -> Self {
        self.claim_scan = mode;
        self
    }
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self::new(CompletionConfig::from_env())
    }
}

/// Settings for plain-language rewriting.
#[derive(Debug, Clone, PartialEq)]
pub struct SummarizerConfig {
    pub completion: CompletionConfig,
    /// Prose is cut to this many characters (after markup removal).
    pub max_chars: usize,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Sections in flight at once; 1 means strictly sequential.
    pub concurrency: usize,
}

impl SummarizerConfig {
    pub const DEFAULT_MAX_CHARS: usize = 3000;
    pub const DEFAULT_TEMPERATURE: f32 = 0.5;
    pub const DEFAULT_MAX_TOKENS: u32 = 300;

    pub fn new(completion: CompletionConfig) -> Self {
        Self {
            completion,
            max_chars: Self::DEFAULT_MAX_CHARS,
            temperature: Self::DEFAULT_TEMPERATURE,
            max_tokens: Self::DEFAULT_MAX_TOKENS,
            concurrency: 1,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self::new(CompletionConfig::from_env())
    }
}
