//! The tracking client: typed operations over the REST contract.

use std::collections::HashSet;
use std::sync::Mutex;

use pecha_core::dashboard::{build_dashboard, DashboardView};
use pecha_core::stats::{AnnotatorStat, ApproverStat, Summary};
use pecha_core::status::TrackingStatus;
use pecha_core::types::DbId;
use pecha_core::view::TrackingSnapshot;
use pecha_core::workflow::validate_review_notes;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::auth::AuthSession;
use crate::cache::StatusCache;
use crate::error::ClientError;

/// Wire envelope for successful responses: `{ "data": ... }`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Wire shape of a granted lock.
#[derive(Debug, Clone, Deserialize)]
pub struct LockGrant {
    pub example_id: DbId,
    pub locked_by: DbId,
    pub expires_at: String,
}

/// Typed client for the tracking API.
///
/// One instance per user session. All operations are async and return
/// `Result`; nothing is retried automatically. Mutations for the same
/// example are expected to be serialized by the caller holding the editing
/// lock -- [`TrackingClient::has_lock`] says whether this session holds it,
/// so a UI can warn before mutating without one (the request is still sent;
/// the backend is the final arbiter).
pub struct TrackingClient {
    http: reqwest::Client,
    base_url: String,
    auth: AuthSession,
    cache: Mutex<StatusCache>,
    /// Example ids this session holds an editing lock for.
    held_locks: Mutex<HashSet<DbId>>,
}

impl TrackingClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let http = reqwest::Client::new();
        Self {
            auth: AuthSession::new(base_url.clone(), http.clone()),
            http,
            base_url,
            cache: Mutex::new(StatusCache::new()),
            held_locks: Mutex::new(HashSet::new()),
        }
    }

    /// The underlying auth session (login/logout/current user).
    pub fn auth(&self) -> &AuthSession {
        &self.auth
    }

    /// Log in and start a session.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<crate::auth::UserInfo, ClientError> {
        self.auth.login(username, password).await
    }

    /// Log out, clearing cache and lock bookkeeping as well.
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.cache.lock().expect("cache mutex poisoned").clear();
        self.held_locks
            .lock()
            .expect("locks mutex poisoned")
            .clear();
        self.auth.logout().await
    }

    // -----------------------------------------------------------------------
    // Status
    // -----------------------------------------------------------------------

    /// Fetch the authoritative tracking snapshot for an example.
    pub async fn status(
        &self,
        project_id: DbId,
        example_id: DbId,
    ) -> Result<TrackingSnapshot, ClientError> {
        let url = self.tracking_url(project_id, example_id, "status");
        let snapshot: TrackingSnapshot = self.get_json(&url).await?;
        self.cache
            .lock()
            .expect("cache mutex poisoned")
            .confirm(snapshot.clone());
        Ok(snapshot)
    }

    /// The locally cached snapshot, if any. Reflects optimistic updates.
    pub fn cached_status(&self, example_id: DbId) -> Option<TrackingSnapshot> {
        self.cache
            .lock()
            .expect("cache mutex poisoned")
            .get(example_id)
            .cloned()
    }

    /// Drop an example's cached state (navigation away). Any in-flight
    /// mutation completes or fails on its own; the next [`status`] call
    /// re-fetches authoritative state.
    ///
    /// [`status`]: TrackingClient::status
    pub fn invalidate(&self, example_id: DbId) {
        self.cache
            .lock()
            .expect("cache mutex poisoned")
            .invalidate(example_id);
    }

    // -----------------------------------------------------------------------
    // Locks
    // -----------------------------------------------------------------------

    /// Acquire the editing lock on an example.
    ///
    /// Idempotent for the holder (the server extends the lock). On conflict
    /// the error carries the current holder's username.
    pub async fn acquire_lock(
        &self,
        project_id: DbId,
        example_id: DbId,
    ) -> Result<LockGrant, ClientError> {
        let url = self.tracking_url(project_id, example_id, "lock");
        let grant: LockGrant = self.post_json(&url, None).await?;
        self.held_locks
            .lock()
            .expect("locks mutex poisoned")
            .insert(example_id);
        Ok(grant)
    }

    /// Release the editing lock. The local token is dropped regardless of
    /// the server outcome: a lock we failed to release will expire.
    pub async fn release_lock(
        &self,
        project_id: DbId,
        example_id: DbId,
    ) -> Result<(), ClientError> {
        self.held_locks
            .lock()
            .expect("locks mutex poisoned")
            .remove(&example_id);
        let url = self.tracking_url(project_id, example_id, "unlock");
        let _: Value = self.post_json(&url, None).await?;
        Ok(())
    }

    /// Whether this session believes it holds the editing lock. The server
    /// may have expired it; a subsequent mutating call surfaces that.
    pub fn has_lock(&self, example_id: DbId) -> bool {
        self.held_locks
            .lock()
            .expect("locks mutex poisoned")
            .contains(&example_id)
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Start editing (requires a held lock server-side).
    pub async fn start(
        &self,
        project_id: DbId,
        example_id: DbId,
    ) -> Result<TrackingSnapshot, ClientError> {
        if !self.has_lock(example_id) {
            tracing::warn!(example_id, "Starting to edit without a local lock token");
        }
        self.transition(
            project_id,
            example_id,
            "start",
            None,
            TrackingStatus::InProgress,
        )
        .await
    }

    /// Submit the example for review.
    pub async fn submit(
        &self,
        project_id: DbId,
        example_id: DbId,
    ) -> Result<TrackingSnapshot, ClientError> {
        if !self.has_lock(example_id) {
            tracing::warn!(example_id, "Submitting without a local lock token");
        }
        let snapshot = self
            .transition(
                project_id,
                example_id,
                "submit",
                None,
                TrackingStatus::Submitted,
            )
            .await?;
        // The server releases the lock on submit.
        self.held_locks
            .lock()
            .expect("locks mutex poisoned")
            .remove(&example_id);
        Ok(snapshot)
    }

    /// Approve a submission. Notes are optional.
    pub async fn approve(
        &self,
        project_id: DbId,
        example_id: DbId,
        notes: Option<&str>,
    ) -> Result<TrackingSnapshot, ClientError> {
        let body = serde_json::json!({ "notes": notes });
        self.transition(
            project_id,
            example_id,
            "approve",
            Some(body),
            TrackingStatus::Approved,
        )
        .await
    }

    /// Reject a submission. Notes are mandatory review feedback: empty or
    /// whitespace-only notes fail with [`ClientError::Validation`] before
    /// any network call.
    pub async fn reject(
        &self,
        project_id: DbId,
        example_id: DbId,
        notes: &str,
    ) -> Result<TrackingSnapshot, ClientError> {
        let notes = validate_review_notes(notes)
            .map_err(|e| ClientError::Validation(e.to_string()))?;

        let body = serde_json::json!({ "notes": notes });
        self.transition(
            project_id,
            example_id,
            "reject",
            Some(body),
            TrackingStatus::Rejected,
        )
        .await
    }

    /// Reassign a rejected example (manager operation). `assigned_to` of
    /// `None` keeps the current annotator.
    pub async fn reassign(
        &self,
        project_id: DbId,
        example_id: DbId,
        assigned_to: Option<DbId>,
    ) -> Result<TrackingSnapshot, ClientError> {
        let body = serde_json::json!({ "assigned_to": assigned_to });
        self.transition(
            project_id,
            example_id,
            "reassign",
            Some(body),
            TrackingStatus::Assigned,
        )
        .await
    }

    // -----------------------------------------------------------------------
    // Aggregates
    // -----------------------------------------------------------------------

    /// Project-wide completion summary. A project with zero examples yields
    /// zeroed counts and rates.
    pub async fn summary(&self, project_id: DbId) -> Result<Summary, ClientError> {
        let url = format!(
            "{}/api/v1/projects/{project_id}/tracking/summary",
            self.base_url
        );
        self.get_json(&url).await
    }

    /// Per-annotator statistics (manager operation).
    pub async fn annotator_stats(
        &self,
        project_id: DbId,
    ) -> Result<Vec<AnnotatorStat>, ClientError> {
        let url = format!(
            "{}/api/v1/projects/{project_id}/tracking/annotators",
            self.base_url
        );
        self.get_json(&url).await
    }

    /// Per-approver statistics (manager operation).
    pub async fn approver_stats(
        &self,
        project_id: DbId,
    ) -> Result<Vec<ApproverStat>, ClientError> {
        let url = format!(
            "{}/api/v1/projects/{project_id}/tracking/approvers",
            self.base_url
        );
        self.get_json(&url).await
    }

    /// Fetch all three aggregates and build the dashboard read model. Empty
    /// stat tables render as explicit no-data sections, distinct from a
    /// failed load (which is this `Err`).
    pub async fn dashboard(&self, project_id: DbId) -> Result<DashboardView, ClientError> {
        let summary = self.summary(project_id).await?;
        let annotators = self.annotator_stats(project_id).await?;
        let approvers = self.approver_stats(project_id).await?;
        Ok(build_dashboard(&summary, annotators, approvers))
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn tracking_url(&self, project_id: DbId, example_id: DbId, action: &str) -> String {
        format!(
            "{}/api/v1/projects/{project_id}/tracking/{example_id}/{action}",
            self.base_url
        )
    }

    /// Run one mutating call with an optimistic cache update.
    ///
    /// The cached snapshot (if any) flips to `optimistic_status` immediately;
    /// the server's response then replaces it wholesale. On ANY failure the
    /// cache rolls back to the last confirmed snapshot -- the backend state
    /// did not change (guard failures) or is unknown (transport failures),
    /// and a re-fetch restores truth either way.
    async fn transition(
        &self,
        project_id: DbId,
        example_id: DbId,
        action: &str,
        body: Option<Value>,
        optimistic_status: TrackingStatus,
    ) -> Result<TrackingSnapshot, ClientError> {
        {
            let mut cache = self.cache.lock().expect("cache mutex poisoned");
            if let Some(current) = cache.get(example_id).cloned() {
                let optimistic = TrackingSnapshot {
                    status: optimistic_status.as_str().to_string(),
                    status_display: optimistic_status.label().to_string(),
                    ..current
                };
                cache.begin_optimistic(optimistic);
            }
        }

        let url = self.tracking_url(project_id, example_id, action);
        match self.post_json::<TrackingSnapshot>(&url, body).await {
            Ok(snapshot) => {
                self.cache
                    .lock()
                    .expect("cache mutex poisoned")
                    .confirm(snapshot.clone());
                Ok(snapshot)
            }
            Err(err) => {
                self.cache
                    .lock()
                    .expect("cache mutex poisoned")
                    .rollback(example_id);
                Err(err)
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ClientError> {
        let response = self.send_authed(reqwest::Method::GET, url, None).await?;
        let envelope: Envelope<T> = response.json().await?;
        Ok(envelope.data)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        body: Option<Value>,
    ) -> Result<T, ClientError> {
        let response = self
            .send_authed(reqwest::Method::POST, url, body)
            .await?;
        let envelope: Envelope<T> = response.json().await?;
        Ok(envelope.data)
    }

    /// Send a request with the bearer token. On a 401, refresh once and
    /// replay; a failed refresh has already cleared the session.
    async fn send_authed(
        &self,
        method: reqwest::Method,
        url: &str,
        body: Option<Value>,
    ) -> Result<reqwest::Response, ClientError> {
        let token = self
            .auth
            .access_token()
            .ok_or_else(|| ClientError::Unauthorized("Not logged in".into()))?;

        let response = self.build(method.clone(), url, &body, &token).send().await?;

        let response = if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            self.auth.refresh().await?;
            let token = self
                .auth
                .access_token()
                .ok_or_else(|| ClientError::Unauthorized("Not logged in".into()))?;
            self.build(method, url, &body, &token).send().await?
        } else {
            response
        };

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(error_from_response(response).await)
        }
    }

    fn build(
        &self,
        method: reqwest::Method,
        url: &str,
        body: &Option<Value>,
        token: &str,
    ) -> reqwest::RequestBuilder {
        let mut request = self.http.request(method, url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }
        request
    }
}

/// Map a failed HTTP response into the client error taxonomy.
///
/// The server's `error` string, when present, travels verbatim; otherwise a
/// generic message carries the status code.
pub(crate) async fn error_from_response(response: reqwest::Response) -> ClientError {
    let status = response.status();
    let body: Option<Value> = response.json().await.ok();

    let message = body
        .as_ref()
        .and_then(|b| b.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Request failed with status {status}"));

    match status {
        reqwest::StatusCode::BAD_REQUEST => ClientError::Validation(message),
        reqwest::StatusCode::UNAUTHORIZED => ClientError::Unauthorized(message),
        reqwest::StatusCode::FORBIDDEN => ClientError::PermissionDenied(message),
        reqwest::StatusCode::NOT_FOUND => ClientError::NotFound(message),
        reqwest::StatusCode::CONFLICT => {
            let locked_by = body
                .as_ref()
                .and_then(|b| b.get("locked_by"))
                .and_then(Value::as_str)
                .map(str::to_string);
            ClientError::Conflict { message, locked_by }
        }
        _ => ClientError::Api {
            status: status.as_u16(),
            message,
        },
    }
}
