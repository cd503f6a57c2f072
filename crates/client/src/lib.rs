//! Typed client for the pecha tracking API.
//!
//! [`TrackingClient`] is a pure consumer of the REST contract: it validates
//! what it can before touching the network (rejection notes), applies
//! optimistic cache updates that roll back on failure, tracks which editing
//! locks this session holds, and surfaces server `error` messages verbatim.
//! Authentication is bearer-token based with a single silent refresh on
//! expiry; a failed refresh clears the session (forced logout).

pub mod auth;
pub mod cache;
pub mod error;
pub mod tracking;

pub use auth::AuthSession;
pub use error::ClientError;
pub use tracking::TrackingClient;
