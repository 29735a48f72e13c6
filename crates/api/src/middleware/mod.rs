//! Request extractors for authentication, authorization and request metadata.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//! - [`rbac::RequireAdmin`] -- Requires the `admin` role.
//! - [`internal::InternalCaller`] -- Requires the shared `X-Internal-Secret`.
//! - [`client::ClientMeta`] -- Caller IP and user agent for the auth log.

pub mod auth;
pub mod client;
pub mod internal;
pub mod rbac;
