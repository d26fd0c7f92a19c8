mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use common::{league_detail, FakeRiot, RecordingChat, LOL_CHANNEL};
use gamewatch::domain::{Ecosystem, MatchGame, TrackedEntity};
use gamewatch::services::{router, MatchPipeline, PollScheduler};
use gamewatch::tracker::{FirstSightPolicy, MatchNovelty};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tower::ServiceExt;

fn scheduler_with_league(riot: &Arc<FakeRiot>, chat: &Arc<RecordingChat>) -> Arc<PollScheduler> {
    let pipeline = MatchPipeline::new(
        MatchGame::League,
        vec![TrackedEntity::new("Faker#KR1", "p1", Ecosystem::MatchGame)],
        riot.clone(),
        MatchNovelty::new(FirstSightPolicy::Notify),
        chat.clone(),
        Some(LOL_CHANNEL),
    );
    Arc::new(
        PollScheduler::new(Duration::from_millis(5))
            .with_category(Arc::new(pipeline), Duration::from_secs(30)),
    )
}

async fn mark_ready(scheduler: &PollScheduler, chat: &RecordingChat) {
    let (_tx, mut rx) = watch::channel(false);
    assert!(scheduler.wait_until_ready(chat, &mut rx).await);
}

async fn call(scheduler: &Arc<PollScheduler>, method: &str, uri: &str) -> (StatusCode, Value) {
    let response = router(Arc::clone(scheduler))
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn not_ready_until_chat_is_ready() {
    let riot = Arc::new(FakeRiot::new());
    let chat = Arc::new(RecordingChat::not_ready());
    let scheduler = scheduler_with_league(&riot, &chat);

    let (status, _) = call(&scheduler, "GET", "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, body) = call(&scheduler, "POST", "/forcecheck").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("not ready"));

    let (status, _) = call(&scheduler, "GET", "/healthz").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn forcecheck_runs_the_pipeline_once() {
    let riot = Arc::new(FakeRiot::new());
    let chat = Arc::new(RecordingChat::ready());
    let scheduler = scheduler_with_league(&riot, &chat);
    mark_ready(&scheduler, &chat).await;

    riot.play("p1", MatchGame::League, "m1", league_detail("p1", "Ahri"));

    let (status, body) = call(&scheduler, "POST", "/forcecheck?game=lol").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["categories"], 1);
    assert_eq!(body["notifications_sent"], 1);
    assert_eq!(body["reports"][0]["category"], "lol");
    assert_eq!(body["reports"][0]["trigger"], "manual");

    // a second manual check sees the same match and stays quiet
    let (_, body) = call(&scheduler, "POST", "/forcecheck").await;
    assert_eq!(body["notifications_sent"], 0);
    assert_eq!(chat.sent().len(), 1);

    let (status, body) = call(&scheduler, "POST", "/forcecheck?game=steam").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["categories"], 0);
}

#[tokio::test]
async fn forcecheck_rejects_unknown_game() {
    let riot = Arc::new(FakeRiot::new());
    let chat = Arc::new(RecordingChat::ready());
    let scheduler = scheduler_with_league(&riot, &chat);
    mark_ready(&scheduler, &chat).await;

    let (status, body) = call(&scheduler, "POST", "/forcecheck?game=chess").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("chess"));
}

#[tokio::test]
async fn health_reports_per_category_stats() {
    let riot = Arc::new(FakeRiot::new());
    let chat = Arc::new(RecordingChat::ready());
    let scheduler = scheduler_with_league(&riot, &chat);
    mark_ready(&scheduler, &chat).await;

    riot.play("p1", MatchGame::League, "m1", league_detail("p1", "Ahri"));
    call(&scheduler, "POST", "/forcecheck").await;

    let (status, body) = call(&scheduler, "GET", "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);

    let league = &body["categories"][0];
    assert_eq!(league["category"], "lol");
    assert_eq!(league["cadence_secs"], 30);
    assert_eq!(league["phase"], "idle");
    assert_eq!(league["busy"], false);
    assert_eq!(league["stats"]["manual_ticks"], 1);
    assert_eq!(league["stats"]["notifications_sent"], 1);
}
