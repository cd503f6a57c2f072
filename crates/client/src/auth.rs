//! Bearer-token auth session with silent refresh.
//!
//! Holds the access/refresh token pair behind a mutex so one session can be
//! shared by concurrent calls. Expiry handling is reactive: when a request
//! comes back 401 the caller invokes [`AuthSession::refresh`] once and
//! replays; if the refresh itself fails the session is cleared -- the forced
//! logout the backend contract requires.

use std::sync::Mutex;

use pecha_core::types::DbId;
use serde::Deserialize;

use crate::error::ClientError;

/// Token pair issued by login/refresh.
#[derive(Debug, Clone)]
struct Tokens {
    access_token: String,
    refresh_token: String,
}

/// Public user info returned by the auth endpoints.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct UserInfo {
    pub id: DbId,
    pub username: String,
    pub email: String,
}

/// Wire shape of login/refresh responses.
#[derive(Debug, Deserialize)]
struct AuthResponse {
    access_token: String,
    refresh_token: String,
    #[allow(dead_code)]
    expires_in: i64,
    user: UserInfo,
}

/// An authenticated session against the tracking API.
pub struct AuthSession {
    http: reqwest::Client,
    base_url: String,
    tokens: Mutex<Option<Tokens>>,
    user: Mutex<Option<UserInfo>>,
}

impl AuthSession {
    pub fn new(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            tokens: Mutex::new(None),
            user: Mutex::new(None),
        }
    }

    /// Whether the session currently holds tokens.
    pub fn is_authenticated(&self) -> bool {
        self.tokens.lock().expect("tokens mutex poisoned").is_some()
    }

    /// The logged-in user, if any.
    pub fn current_user(&self) -> Option<UserInfo> {
        self.user.lock().expect("user mutex poisoned").clone()
    }

    /// The current access token, for the `Authorization` header.
    pub(crate) fn access_token(&self) -> Option<String> {
        self.tokens
            .lock()
            .expect("tokens mutex poisoned")
            .as_ref()
            .map(|t| t.access_token.clone())
    }

    /// Authenticate with username + password.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserInfo, ClientError> {
        let url = format!("{}/api/v1/auth/login", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(crate::tracking::error_from_response(response).await);
        }

        let auth: AuthResponse = response.json().await?;
        self.store(auth.access_token, auth.refresh_token);
        *self.user.lock().expect("user mutex poisoned") = Some(auth.user.clone());

        tracing::debug!(username = %auth.user.username, "Logged in");
        Ok(auth.user)
    }

    /// Exchange the refresh token for a fresh pair.
    ///
    /// On any failure the session is cleared: the caller is logged out and
    /// must authenticate again.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        let refresh_token = {
            let tokens = self.tokens.lock().expect("tokens mutex poisoned");
            match tokens.as_ref() {
                Some(t) => t.refresh_token.clone(),
                None => {
                    return Err(ClientError::Unauthorized("Not logged in".into()));
                }
            }
        };

        let url = format!("{}/api/v1/auth/refresh", self.base_url);
        let result = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await;

        let response = match result {
            Ok(r) => r,
            Err(e) => {
                self.clear();
                return Err(ClientError::Network(e));
            }
        };

        if !response.status().is_success() {
            self.clear();
            tracing::debug!("Refresh failed, session cleared");
            return Err(ClientError::Unauthorized(
                "Session expired, please log in again".into(),
            ));
        }

        let auth: AuthResponse = match response.json().await {
            Ok(a) => a,
            Err(e) => {
                self.clear();
                return Err(ClientError::Network(e));
            }
        };
        self.store(auth.access_token, auth.refresh_token);
        Ok(())
    }

    /// Revoke the session server-side and clear local state. Local state is
    /// cleared even when the server call fails.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let token = self.access_token();
        self.clear();

        if let Some(token) = token {
            let url = format!("{}/api/v1/auth/logout", self.base_url);
            let result = self.http.post(&url).bearer_auth(token).send().await;
            if let Err(e) = result {
                tracing::debug!(error = %e, "Server-side logout failed, local session cleared anyway");
            }
        }
        Ok(())
    }

    fn store(&self, access_token: String, refresh_token: String) {
        *self.tokens.lock().expect("tokens mutex poisoned") = Some(Tokens {
            access_token,
            refresh_token,
        });
    }

    pub(crate) fn clear(&self) {
        *self.tokens.lock().expect("tokens mutex poisoned") = None;
        *self.user.lock().expect("user mutex poisoned") = None;
    }
}
