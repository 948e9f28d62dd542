//! End-to-end scrape through ApifyActorService against a wiremock Apify.

use std::sync::Arc;
use std::time::Duration;

use harvest_common::{HarvestError, PollPolicy, ScrapeRequest};
use harvest_scout::{ApifyActorService, ScrapeOrchestrator};
use harvest_store::MemoryCommentStore;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ACTOR: &str = "easyapi~facebook-post-comments-scraper";

fn run_body(status: &str, dataset: Option<&str>) -> Value {
    json!({
        "data": {
            "id": "run-7",
            "actId": ACTOR,
            "status": status,
            "defaultDatasetId": dataset,
        }
    })
}

fn fast_policy(max_attempts: u32) -> PollPolicy {
    PollPolicy {
        interval: Duration::from_millis(10),
        max_attempts,
        max_wait: Duration::from_secs(30),
    }
}

fn orchestrator(
    server: &MockServer,
    store: Arc<MemoryCommentStore>,
    poll: PollPolicy,
) -> ScrapeOrchestrator {
    let actors = Arc::new(ApifyActorService::new(server.uri(), ACTOR));
    ScrapeOrchestrator::new(actors, store, poll)
}

fn request() -> ScrapeRequest {
    ScrapeRequest {
        urls: vec!["https://www.facebook.com/page/posts/1".into()],
        limit: None,
        credential: Some("caller-token".into()),
    }
}

async fn mount_start(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(format!("/acts/{ACTOR}/runs")))
        .and(header("authorization", "Bearer caller-token"))
        .respond_with(ResponseTemplate::new(201).set_body_json(run_body("READY", None)))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn scrape_polls_until_succeeded_and_stores_items() {
    let server = MockServer::start().await;
    mount_start(&server).await;

    Mock::given(method("GET"))
        .and(path("/actor-runs/run-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body("RUNNING", None)))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/actor-runs/run-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body("SUCCEEDED", Some("ds-7"))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/datasets/ds-7/items"))
        .and(query_param("clean", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"commentId": "a", "userName": "Ada", "commentText": "one"},
            {"commentId": "b", "userName": "Bob", "commentText": "two"},
            {"commentId": "c", "userName": "Cy", "commentText": "three"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCommentStore::new());
    let summary = orchestrator(&server, store.clone(), fast_policy(10))
        .run_scrape(request())
        .await
        .unwrap();

    assert_eq!(summary.run_id, "run-7");
    assert_eq!(summary.dataset_id, "ds-7");
    assert_eq!(summary.imported, 3);
    assert_eq!(store.snapshot().len(), 3);
}

#[tokio::test]
async fn aborted_run_fetches_nothing() {
    let server = MockServer::start().await;
    mount_start(&server).await;

    Mock::given(method("GET"))
        .and(path("/actor-runs/run-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body("ABORTED", Some("ds-7"))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/datasets/ds-7/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCommentStore::new());
    let err = orchestrator(&server, store.clone(), fast_policy(10))
        .run_scrape(request())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        HarvestError::UpstreamRunFailed { ref status, .. } if status == "ABORTED"
    ));
    assert_eq!(store.insert_calls(), 0);
}

#[tokio::test]
async fn stuck_run_is_polled_exactly_max_attempts_times() {
    let server = MockServer::start().await;
    mount_start(&server).await;

    Mock::given(method("GET"))
        .and(path("/actor-runs/run-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body("RUNNING", None)))
        .expect(5)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCommentStore::new());
    let err = orchestrator(&server, store, fast_policy(5))
        .run_scrape(request())
        .await
        .unwrap_err();

    assert!(matches!(err, HarvestError::UpstreamTimeout { attempts: 5, .. }), "{err:?}");
}

#[tokio::test]
async fn invalid_token_surfaces_apify_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/acts/{ACTOR}/runs")))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"type": "token-not-valid", "message": "Authentication token is not valid."}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCommentStore::new());
    let err = orchestrator(&server, store, fast_policy(5))
        .run_scrape(request())
        .await
        .unwrap_err();

    assert_eq!(err.upstream_status(), Some(401));
    assert_eq!(
        err.to_string(),
        "Failed to start Apify run (status 401): Authentication token is not valid."
    );
}
