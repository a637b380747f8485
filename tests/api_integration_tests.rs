//! Integration Tests for API Endpoints
//!
//! Tests the full request/response cycle: router, service, cache, and the
//! reqwest datastore client talking to an in-process fake datastore.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{Duration, TimeZone, Utc};
use resale_cache::{
    api::create_router, clock::ManualClock, upstream::DatastoreClient, AppState, ResaleService,
};
use serde_json::{json, Value};
use tower::ServiceExt;

// == Fake Datastore ==

#[derive(Default)]
struct FakeDatastore {
    calls: AtomicUsize,
    failing: AtomicBool,
    last_params: Mutex<HashMap<String, String>>,
}

async fn datastore_search(
    State(store): State<Arc<FakeDatastore>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    store.calls.fetch_add(1, Ordering::SeqCst);
    *store.last_params.lock().unwrap() = params.clone();

    // Slow enough that concurrent queries overlap
    tokio::time::sleep(StdDuration::from_millis(20)).await;

    if store.failing.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "datastore down").into_response();
    }

    let filter: Value = serde_json::from_str(&params["q"]).unwrap();
    let lease: f64 = filter["lease_commence_date"].as_str().unwrap().parse().unwrap();
    Json(json!({
        "result": {
            "records": [
                {"month": filter["month"], "resale_price": (lease * 100.0).to_string()}
            ]
        }
    }))
    .into_response()
}

async fn spawn_datastore() -> (Arc<FakeDatastore>, SocketAddr) {
    let store = Arc::new(FakeDatastore::default());
    let app = Router::new()
        .route("/api/action/datastore_search", get(datastore_search))
        .with_state(store.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (store, addr)
}

// == Helper Functions ==

async fn create_test_app() -> (Router, Arc<FakeDatastore>, Arc<ManualClock>) {
    let (store, addr) = spawn_datastore().await;
    let client = DatastoreClient::new(
        format!("http://{}/api/action/datastore_search", addr),
        "test-resource",
    )
    .unwrap();
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2023, 4, 15, 3, 0, 0).unwrap(),
    ));
    let service = ResaleService::new(Arc::new(client), clock.clone(), 5, Duration::hours(24));

    (create_router(AppState::new(service)), store, clock)
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

const QUERY: &str = "/query?street_name=ANG%20MO%20KIO%20AVE%2010&flat_type=3%20ROOM&start_result_month=2023-01&start_lease=2015&end_lease=2017";

// == Health Endpoint ==

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _, _) = create_test_app().await;
    let (status, json) = get_json(app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"status": "ok"}));
}

// == Query Endpoint ==

#[tokio::test]
async fn test_query_returns_aggregated_records() {
    let (app, store, _) = create_test_app().await;
    let (status, json) = get_json(app, QUERY).await;

    assert_eq!(status, StatusCode::OK);
    let records = json.as_array().unwrap();
    assert_eq!(records.len(), 9);
    assert_eq!(store.calls.load(Ordering::SeqCst), 9);

    assert_eq!(records[0], json!({"time": "2023-01-01T00:00:00+08:00", "price": 201500.0}));
    assert_eq!(records[4], json!({"time": "2023-02-01T00:00:00+08:00", "price": 201600.0}));
    assert_eq!(records[8], json!({"time": "2023-03-01T00:00:00+08:00", "price": 201700.0}));
}

#[tokio::test]
async fn test_upstream_receives_filter_resource_and_sort() {
    let (app, store, _) = create_test_app().await;
    let (status, _) = get_json(
        app,
        "/query?street_name=BEDOK%20NTH%20ST%203&flat_type=4%20ROOM&start_result_month=2023-03&start_lease=1999&end_lease=1999",
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let params = store.last_params.lock().unwrap().clone();
    assert_eq!(params["resource_id"], "test-resource");
    assert_eq!(params["sort"], "month desc");

    let filter: Value = serde_json::from_str(&params["q"]).unwrap();
    assert_eq!(
        filter,
        json!({
            "street_name": "BEDOK NTH ST 3",
            "month": "2023-03",
            "lease_commence_date": "1999",
            "flat_type": "4 ROOM",
        })
    );
}

#[tokio::test]
async fn test_repeated_query_served_from_cache() {
    let (app, store, clock) = create_test_app().await;

    let (_, first) = get_json(app.clone(), QUERY).await;
    let (_, second) = get_json(app.clone(), QUERY).await;
    assert_eq!(first, second);
    assert_eq!(store.calls.load(Ordering::SeqCst), 9);

    clock.advance(Duration::hours(24));
    let (status, _) = get_json(app, QUERY).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(store.calls.load(Ordering::SeqCst), 18);
}

#[tokio::test]
async fn test_concurrent_identical_queries_fetch_once() {
    let (app, store, _) = create_test_app().await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let app = app.clone();
        handles.push(tokio::spawn(async move { get_json(app, QUERY).await }));
    }

    let mut bodies = Vec::new();
    for handle in handles {
        let (status, body) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        bodies.push(body);
    }

    assert_eq!(store.calls.load(Ordering::SeqCst), 9);
    assert!(bodies.windows(2).all(|w| w[0] == w[1]));

    let (_, stats) = get_json(app, "/stats").await;
    assert_eq!(stats["misses"], 1);
    assert_eq!(stats["fetches"], 1);
}

#[tokio::test]
async fn test_differently_formatted_queries_are_separate() {
    let (app, store, _) = create_test_app().await;

    get_json(app.clone(), QUERY).await;
    let padded = QUERY.replace("start_lease=2015", "start_lease=02015");
    let (status, _) = get_json(app, &padded).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(store.calls.load(Ordering::SeqCst), 18);
}

#[tokio::test]
async fn test_upstream_failure_returns_bad_gateway_and_is_not_cached() {
    let (app, store, _) = create_test_app().await;
    store.failing.store(true, Ordering::SeqCst);

    let (status, json) = get_json(app.clone(), QUERY).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(json["error"].as_str().unwrap().contains("500"));

    store.failing.store(false, Ordering::SeqCst);
    let (status, json) = get_json(app, QUERY).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 9);
}

#[tokio::test]
async fn test_missing_argument_is_bad_request() {
    let (app, store, _) = create_test_app().await;
    let (status, json) = get_json(app, "/query?street_name=X&flat_type=3%20ROOM").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json.get("error").is_some());
    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_malformed_month_is_bad_request() {
    let (app, _, _) = create_test_app().await;
    let uri = QUERY.replace("start_result_month=2023-01", "start_result_month=2023-1");
    let (status, json) = get_json(app, &uri).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("yyyy-mm"));
}

#[tokio::test]
async fn test_oversized_query_is_bad_request_without_upstream_calls() {
    let (app, store, _) = create_test_app().await;
    let uri = "/query?street_name=X&flat_type=3%20ROOM&start_result_month=1960-01&start_lease=1960&end_lease=9999";
    let (status, json) = get_json(app.clone(), uri).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("upstream requests"));
    assert_eq!(store.calls.load(Ordering::SeqCst), 0);

    let (_, stats) = get_json(app, "/stats").await;
    assert_eq!(stats["misses"], 0);
    assert_eq!(stats["in_flight"], 0);
}

#[tokio::test]
async fn test_year_before_floor_is_bad_request() {
    let (app, store, _) = create_test_app().await;
    let uri = QUERY.replace("start_result_month=2023-01", "start_result_month=0000-01");
    let (status, _) = get_json(app, &uri).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_start_month_in_future_gives_empty_array() {
    let (app, store, _) = create_test_app().await;
    let uri = QUERY.replace("start_result_month=2023-01", "start_result_month=2023-06");
    let (status, json) = get_json(app, &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!([]));
    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unreachable_upstream_is_bad_gateway() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = DatastoreClient::new(format!("http://127.0.0.1:{}/search", port), "r").unwrap();
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2023, 4, 15, 3, 0, 0).unwrap()));
    let service = ResaleService::new(Arc::new(client), clock, 5, Duration::hours(24));
    let app = create_router(AppState::new(service));

    let (status, json) = get_json(app, QUERY).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(json["error"].as_str().unwrap().contains("Upstream request failed"));
}
