//! Shared test harness: an in-process axum backend that doubles as a
//! network-call spy.
//!
//! Each test assembles a `Router` describing the backend behaviour it needs,
//! layered with a [`CallLog`] recorder so assertions can check exactly which
//! requests went over the wire (including the zero-calls case).

use std::sync::{Arc, Mutex};

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tokio::task::JoinHandle;

/// Records the method + path of every request that reaches the mock backend.
#[derive(Debug, Default)]
pub struct CallLog {
    calls: Mutex<Vec<String>>,
}

impl CallLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn record(&self, entry: String) {
        self.calls.lock().unwrap().push(entry);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded calls whose path contains `needle`.
    pub fn count_containing(&self, needle: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.contains(needle))
            .count()
    }
}

/// Spawn the mock backend on an ephemeral port, wrapped with call recording.
///
/// Returns the base URL and the server task handle (abort it to simulate the
/// backend going away).
pub async fn spawn(router: Router, log: Arc<CallLog>) -> (String, JoinHandle<()>) {
    let router = router.layer(middleware::from_fn(move |req: Request, next: Next| {
        let log = log.clone();
        async move {
            log.record(format!("{} {}", req.method(), req.uri().path()));
            let response: Response = next.run(req).await;
            response
        }
    }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock listener");
    let addr = listener.local_addr().expect("mock listener addr");

    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("mock server");
    });

    (format!("http://{addr}"), handle)
}

/// A login response issuing the given token pair.
pub fn auth_response(access: &str, refresh: &str) -> Value {
    json!({
        "access_token": access,
        "refresh_token": refresh,
        "expires_in": 900,
        "user": { "id": 1, "username": "tester", "email": "tester@example.com" }
    })
}

/// A tracking snapshot body in the server's wire shape.
pub fn snapshot_json(
    example_id: i64,
    status: &str,
    annotated_by: Option<&str>,
    reviewed_by: Option<&str>,
) -> Value {
    json!({
        "example_id": example_id,
        "status": status,
        "status_display": status,
        "annotated_by": annotated_by,
        "reviewed_by": reviewed_by,
        "is_locked": false,
        "locked_by": null
    })
}

/// Wrap a payload in the `{ "data": ... }` envelope.
pub fn enveloped(data: Value) -> Value {
    json!({ "data": data })
}
