//! Contract checks for the in-memory completion services.

use completion_client::fakes::{
    FailingCompletionService, FnCompletionService, ScriptedCompletionService,
};
use completion_client::{
    CompletionConfig, CompletionError, CompletionRequest, CompletionResponse, CompletionService,
};

fn config() -> CompletionConfig {
    CompletionConfig::new("sk-test", "test-model")
}

#[tokio::test]
async fn scripted_service_replays_in_order_then_fails() {
    let service = ScriptedCompletionService::new()
        .respond("first")
        .fail(CompletionError::RateLimited {
            retry_after_secs: None,
        })
        .respond("third");

    let req = CompletionRequest::new("sys", "user", 16, 0.2);
    assert_eq!(
        service.complete(&config(), &req).await.unwrap().content,
        "first"
    );
    assert!(matches!(
        service.complete(&config(), &req).await,
        Err(CompletionError::RateLimited { .. })
    ));
    assert_eq!(
        service.complete(&config(), &req).await.unwrap().content,
        "third"
    );
    assert!(matches!(
        service.complete(&config(), &req).await,
        Err(CompletionError::MalformedResponse(_))
    ));
    assert_eq!(service.call_count(), 4);
    assert_eq!(service.requests()[0].user_prompt, "user");
}

#[tokio::test]
async fn fn_service_sees_each_request() {
    let service = FnCompletionService::new(|req: &CompletionRequest| {
        Ok(CompletionResponse::new(req.user_prompt.to_uppercase()))
    });
    let out = service
        .complete(&config(), &CompletionRequest::new("s", "abc", 8, 0.0))
        .await
        .unwrap();
    assert_eq!(out.content, "ABC");
    assert_eq!(service.requests().len(), 1);
}

#[tokio::test]
async fn failing_service_counts_calls() {
    let service =
        FailingCompletionService::new(CompletionError::Transport("connection reset".into()));
    let req = CompletionRequest::new("s", "u", 8, 0.0);
    for _ in 0..3 {
        assert!(service.complete(&config(), &req).await.is_err());
    }
    assert_eq!(service.call_count(), 3);
}
