//! Integration tests for `TrackingClient` against an in-process mock
//! backend. The mock records every network call, so these tests can assert
//! both behaviour and traffic -- including that invalid rejections produce
//! zero calls.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use assert_matches::assert_matches;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use pecha_client::{ClientError, TrackingClient};

use common::{auth_response, enveloped, snapshot_json, spawn, CallLog};

/// Router with just a login route; tests merge their own behaviour on top.
fn base_router() -> Router {
    Router::new().route(
        "/api/v1/auth/login",
        post(|| async { Json(auth_response("access-1", "refresh-1")) }),
    )
}

async fn logged_in_client(base_url: &str) -> TrackingClient {
    let client = TrackingClient::new(base_url.to_string());
    client
        .login("tester", "correct-horse-battery-staple")
        .await
        .expect("login should succeed");
    client
}

// ---------------------------------------------------------------------------
// Client-side validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reject_with_blank_notes_makes_no_network_call() {
    let log = CallLog::new();
    let (base_url, _server) = spawn(base_router(), log.clone()).await;
    let client = logged_in_client(&base_url).await;

    for notes in ["", "   ", "\n\t"] {
        let err = client.reject(1, 42, notes).await.unwrap_err();
        assert_matches!(err, ClientError::Validation(_));
    }

    // Only the login call reached the wire; zero tracking calls.
    assert_eq!(log.count_containing("/tracking/"), 0);
    assert_eq!(log.calls().len(), 1);
}

// ---------------------------------------------------------------------------
// Approve / reject flow
// ---------------------------------------------------------------------------

#[tokio::test]
async fn approve_updates_status_and_reviewed_by() {
    let log = CallLog::new();
    let router = base_router()
        .route(
            "/api/v1/projects/1/tracking/42/status",
            get(|| async {
                Json(enveloped(snapshot_json(42, "submitted", Some("dolma"), None)))
            }),
        )
        .route(
            "/api/v1/projects/1/tracking/42/approve",
            post(|| async {
                Json(enveloped(snapshot_json(
                    42,
                    "approved",
                    Some("dolma"),
                    Some("tenzin"),
                )))
            }),
        );
    let (base_url, _server) = spawn(router, log.clone()).await;
    let client = logged_in_client(&base_url).await;

    client.status(1, 42).await.expect("status should succeed");

    let snapshot = client
        .approve(1, 42, None)
        .await
        .expect("approve should succeed");
    assert_eq!(snapshot.status, "approved");
    assert_eq!(snapshot.reviewed_by.as_deref(), Some("tenzin"));

    // The cache holds the authoritative response.
    let cached = client.cached_status(42).expect("cached snapshot");
    assert_eq!(cached.status, "approved");
    assert_eq!(cached.reviewed_by.as_deref(), Some("tenzin"));
}

#[tokio::test]
async fn rejection_cycle_stores_notes_and_reassign_returns_to_assigned() {
    // Stateful mock: one example, submitted by dolma, reviewed by tenzin.
    #[derive(Default)]
    struct Backend {
        notes: std::sync::Mutex<Option<String>>,
    }
    let backend = Arc::new(Backend::default());

    let router = Router::new()
        .route(
            "/api/v1/auth/login",
            post(|| async { Json(auth_response("access-1", "refresh-1")) }),
        )
        .route(
            "/api/v1/projects/7/tracking/42/reject",
            post(
                |State(backend): State<Arc<Backend>>, Json(body): Json<Value>| async move {
                    let notes = body["notes"].as_str().unwrap_or_default().to_string();
                    *backend.notes.lock().unwrap() = Some(notes);
                    Json(enveloped(snapshot_json(
                        42,
                        "rejected",
                        Some("dolma"),
                        Some("tenzin"),
                    )))
                },
            ),
        )
        .route(
            "/api/v1/projects/7/tracking/42/reassign",
            post(|| async {
                Json(enveloped(snapshot_json(42, "assigned", Some("dolma"), None)))
            }),
        )
        .with_state(backend.clone());

    let log = CallLog::new();
    let (base_url, _server) = spawn(router, log).await;
    let client = logged_in_client(&base_url).await;

    let snapshot = client
        .reject(7, 42, "audio unclear")
        .await
        .expect("reject should succeed");
    assert_eq!(snapshot.status, "rejected");
    assert_eq!(snapshot.reviewed_by.as_deref(), Some("tenzin"));
    assert_eq!(
        backend.notes.lock().unwrap().as_deref(),
        Some("audio unclear")
    );

    let snapshot = client
        .reassign(7, 42, None)
        .await
        .expect("reassign should succeed");
    assert_eq!(snapshot.status, "assigned");
    assert_eq!(snapshot.reviewed_by, None);
}

// ---------------------------------------------------------------------------
// Locks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lock_conflict_reports_the_holder() {
    let router = base_router().route(
        "/api/v1/projects/1/tracking/42/lock",
        post(|| async {
            (
                StatusCode::CONFLICT,
                Json(json!({
                    "error": "Example is locked by dolma",
                    "code": "CONFLICT",
                    "locked_by": "dolma"
                })),
            )
        }),
    );
    let log = CallLog::new();
    let (base_url, _server) = spawn(router, log).await;
    let client = logged_in_client(&base_url).await;

    let err = client.acquire_lock(1, 42).await.unwrap_err();
    assert_matches!(
        err,
        ClientError::Conflict { locked_by: Some(ref holder), .. } if holder == "dolma"
    );
    assert!(!client.has_lock(42));
}

#[tokio::test]
async fn lock_acquire_is_idempotent_for_the_holder() {
    let router = base_router().route(
        "/api/v1/projects/1/tracking/42/lock",
        post(|| async {
            Json(enveloped(json!({
                "example_id": 42,
                "locked_by": 1,
                "expires_at": "2026-08-05T12:00:00Z"
            })))
        }),
    );
    let log = CallLog::new();
    let (base_url, _server) = spawn(router, log.clone()).await;
    let client = logged_in_client(&base_url).await;

    client.acquire_lock(1, 42).await.expect("first acquire");
    client.acquire_lock(1, 42).await.expect("second acquire");

    assert!(client.has_lock(42));
    // Both acquisitions really hit the server (the server extends).
    assert_eq!(log.count_containing("/lock"), 2);
}

#[tokio::test]
async fn release_drops_the_local_token() {
    let router = base_router()
        .route(
            "/api/v1/projects/1/tracking/42/lock",
            post(|| async {
                Json(enveloped(json!({
                    "example_id": 42,
                    "locked_by": 1,
                    "expires_at": "2026-08-05T12:00:00Z"
                })))
            }),
        )
        .route(
            "/api/v1/projects/1/tracking/42/unlock",
            post(|| async { Json(enveloped(json!({ "released": true }))) }),
        );
    let log = CallLog::new();
    let (base_url, _server) = spawn(router, log).await;
    let client = logged_in_client(&base_url).await;

    client.acquire_lock(1, 42).await.expect("acquire");
    assert!(client.has_lock(42));

    client.release_lock(1, 42).await.expect("release");
    assert!(!client.has_lock(42));
}

// ---------------------------------------------------------------------------
// Auth: silent refresh
// ---------------------------------------------------------------------------

#[tokio::test]
async fn expired_access_token_triggers_one_silent_refresh_and_replay() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let attempts_for_route = attempts.clone();

    let router = base_router()
        .route(
            "/api/v1/auth/refresh",
            post(|| async { Json(auth_response("access-2", "refresh-2")) }),
        )
        .route(
            "/api/v1/projects/1/tracking/summary",
            get(move || {
                let attempts = attempts_for_route.clone();
                async move {
                    if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                        // First attempt: token "expired".
                        (
                            StatusCode::UNAUTHORIZED,
                            Json(json!({ "error": "Invalid or expired token", "code": "UNAUTHORIZED" })),
                        )
                    } else {
                        (
                            StatusCode::OK,
                            Json(enveloped(json!({
                                "total_examples": 3,
                                "assigned_examples": 2,
                                "completed_examples": 1,
                                "approved_examples": 1,
                                "rejected_examples": 0,
                                "completion_rate": 1.0 / 3.0,
                                "approval_rate": 1.0
                            }))),
                        )
                    }
                }
            }),
        );

    let log = CallLog::new();
    let (base_url, _server) = spawn(router, log.clone()).await;
    let client = logged_in_client(&base_url).await;

    let summary = client.summary(1).await.expect("summary after refresh");
    assert_eq!(summary.total_examples, 3);

    assert_eq!(attempts.load(Ordering::SeqCst), 2, "original + replay");
    assert_eq!(log.count_containing("/auth/refresh"), 1);
    assert!(client.auth().is_authenticated());
}

#[tokio::test]
async fn failed_refresh_forces_logout() {
    let router = base_router()
        .route(
            "/api/v1/auth/refresh",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "error": "Invalid or expired refresh token", "code": "UNAUTHORIZED" })),
                )
            }),
        )
        .route(
            "/api/v1/projects/1/tracking/summary",
            get(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "error": "Invalid or expired token", "code": "UNAUTHORIZED" })),
                )
            }),
        );

    let log = CallLog::new();
    let (base_url, _server) = spawn(router, log).await;
    let client = logged_in_client(&base_url).await;
    assert!(client.auth().is_authenticated());

    let err = client.summary(1).await.unwrap_err();
    assert_matches!(err, ClientError::Unauthorized(_));
    assert!(
        !client.auth().is_authenticated(),
        "failed refresh must clear the session"
    );
}

// ---------------------------------------------------------------------------
// Optimistic cache rollback
// ---------------------------------------------------------------------------

#[tokio::test]
async fn server_failure_rolls_back_optimistic_update() {
    let router = base_router()
        .route(
            "/api/v1/projects/1/tracking/42/status",
            get(|| async {
                Json(enveloped(snapshot_json(42, "submitted", Some("dolma"), None)))
            }),
        )
        .route(
            "/api/v1/projects/1/tracking/42/approve",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "An internal error occurred", "code": "INTERNAL_ERROR" })),
                )
            }),
        );
    let log = CallLog::new();
    let (base_url, _server) = spawn(router, log).await;
    let client = logged_in_client(&base_url).await;

    client.status(1, 42).await.expect("prime the cache");

    let err = client.approve(1, 42, None).await.unwrap_err();
    assert_matches!(err, ClientError::Api { status: 500, .. });

    // The optimistic "approved" state is gone; last known-good remains.
    let cached = client.cached_status(42).expect("cached snapshot");
    assert_eq!(cached.status, "submitted");
}

#[tokio::test]
async fn transport_failure_rolls_back_optimistic_update() {
    let router = base_router().route(
        "/api/v1/projects/1/tracking/42/status",
        get(|| async {
            Json(enveloped(snapshot_json(42, "submitted", Some("dolma"), None)))
        }),
    );
    let log = CallLog::new();
    let (base_url, server) = spawn(router, log).await;
    let client = logged_in_client(&base_url).await;

    client.status(1, 42).await.expect("prime the cache");

    // The backend goes away mid-session.
    server.abort();
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let err = client.approve(1, 42, None).await.unwrap_err();
    assert_matches!(err, ClientError::Network(_));

    let cached = client.cached_status(42).expect("cached snapshot");
    assert_eq!(cached.status, "submitted", "rolled back to last known-good");
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_project_yields_zero_rates_and_no_data_dashboard() {
    let router = base_router()
        .route(
            "/api/v1/projects/9/tracking/summary",
            get(|| async {
                Json(enveloped(json!({
                    "total_examples": 0,
                    "assigned_examples": 0,
                    "completed_examples": 0,
                    "approved_examples": 0,
                    "rejected_examples": 0,
                    "completion_rate": 0.0,
                    "approval_rate": 0.0
                })))
            }),
        )
        .route(
            "/api/v1/projects/9/tracking/annotators",
            get(|| async { Json(enveloped(json!([]))) }),
        )
        .route(
            "/api/v1/projects/9/tracking/approvers",
            get(|| async { Json(enveloped(json!([]))) }),
        );
    let log = CallLog::new();
    let (base_url, _server) = spawn(router, log).await;
    let client = logged_in_client(&base_url).await;

    let summary = client.summary(9).await.expect("summary");
    assert_eq!(summary.total_examples, 0);
    assert_eq!(summary.completion_rate, 0.0);
    assert_eq!(summary.approval_rate, 0.0);

    let dashboard = client.dashboard(9).await.expect("dashboard");
    assert!(dashboard.annotators.is_no_data());
    assert!(dashboard.approvers.is_no_data());
}

// ---------------------------------------------------------------------------
// Error surfacing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn server_error_strings_are_surfaced_verbatim() {
    let router = base_router().route(
        "/api/v1/projects/1/tracking/42/approve",
        post(|| async {
            (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": "Approver role required", "code": "FORBIDDEN" })),
            )
        }),
    );
    let log = CallLog::new();
    let (base_url, _server) = spawn(router, log).await;
    let client = logged_in_client(&base_url).await;

    let err = client.approve(1, 42, None).await.unwrap_err();
    assert_matches!(err, ClientError::PermissionDenied(ref msg) if msg == "Approver role required");
}

#[tokio::test]
async fn missing_example_is_terminal_not_found() {
    let router = base_router().route(
        "/api/v1/projects/1/tracking/404/status",
        get(|| async {
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Example with id 404 not found", "code": "NOT_FOUND" })),
            )
        }),
    );
    let log = CallLog::new();
    let (base_url, _server) = spawn(router, log).await;
    let client = logged_in_client(&base_url).await;

    let err = client.status(1, 404).await.unwrap_err();
    assert_matches!(err, ClientError::NotFound(_));
}
