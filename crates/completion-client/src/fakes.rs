//! In-memory completion services (testing only)
//!
//! Provides `ScriptedCompletionService`, `FnCompletionService` and
//! `FailingCompletionService` that satisfy the [`CompletionService`] contract
//! without any network access.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::config::CompletionConfig;
use crate::error::CompletionError;
use crate::{CompletionRequest, CompletionResponse, CompletionService, Result};

// ---------------------------------------------------------------------------
// ScriptedCompletionService
// ---------------------------------------------------------------------------

/// Replays a queue of canned outcomes in order and records every request.
///
/// Once the script is exhausted each call fails with `MalformedResponse`.
#[derive(Debug, Default)]
pub struct ScriptedCompletionService {
    script: Mutex<VecDeque<Result<CompletionResponse>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletionService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response with `content`.
    pub fn respond(self, content: impl Into<String>) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Ok(CompletionResponse::new(content)));
        self
    }

    /// Queue a failure.
    pub fn fail(self, err: CompletionError) -> Self {
        self.script.lock().unwrap().push_back(Err(err));
        self
    }

    /// Requests received so far, in call order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletionService {
    async fn complete(
        &self,
        _config: &CompletionConfig,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.script.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(CompletionError::MalformedResponse(
                "scripted service has no more responses".to_string(),
            ))
        })
    }
}

// ---------------------------------------------------------------------------
// FnCompletionService
// ---------------------------------------------------------------------------

/// Answers each request with a synchronous closure.
pub struct FnCompletionService<F> {
    responder: F,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl<F> FnCompletionService<F>
where
    F: Fn(&CompletionRequest) -> Result<CompletionResponse> + Send + Sync,
{
    pub fn new(responder: F) -> Self {
        Self {
            responder,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl<F> CompletionService for FnCompletionService<F>
where
    F: Fn(&CompletionRequest) -> Result<CompletionResponse> + Send + Sync,
{
    async fn complete(
        &self,
        _config: &CompletionConfig,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse> {
        self.requests.lock().unwrap().push(request.clone());
        (self.responder)(request)
    }
}

// ---------------------------------------------------------------------------
// FailingCompletionService
// ---------------------------------------------------------------------------

/// Fails every call with the same error.
#[derive(Debug)]
pub struct FailingCompletionService {
    error: CompletionError,
    calls: Mutex<usize>,
}

impl FailingCompletionService {
    pub fn new(error: CompletionError) -> Self {
        Self {
            error,
            calls: Mutex::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl CompletionService for FailingCompletionService {
    async fn complete(
        &self,
        _config: &CompletionConfig,
        _request: &CompletionRequest,
    ) -> Result<CompletionResponse> {
        *self.calls.lock().unwrap() += 1;
        Err(self.error.clone())
    }
}
