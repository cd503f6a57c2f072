//! Client-side error taxonomy.

/// Errors surfaced by [`crate::TrackingClient`] operations.
///
/// No operation panics and none is retried automatically; the caller decides
/// whether a retry makes sense (it does for [`ClientError::Network`], it
/// does not for [`ClientError::PermissionDenied`] or
/// [`ClientError::NotFound`]).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Detected locally before any network call (e.g. empty rejection notes).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Role guard failed, client-side or server-side. Never retried.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Lock or state conflict. Carries the lock holder's identity when the
    /// server reported one, so the UI can say who is editing.
    #[error("Conflict: {message}")]
    Conflict {
        message: String,
        locked_by: Option<String>,
    },

    /// The example or project no longer exists. Terminal, never retried.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The session is not (or no longer) authenticated; raised after a
    /// failed silent refresh has already cleared the session.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Transport failure. Safe to retry manually; any optimistic cache
    /// update has been rolled back.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Any other server-reported failure, with the server's `error` string
    /// verbatim when present.
    #[error("Request failed ({status}): {message}")]
    Api { status: u16, message: String },
}
