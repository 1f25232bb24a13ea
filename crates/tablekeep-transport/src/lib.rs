//! Transport abstraction layer for Tablekeep.
//!
//! Provides the [`Transport`] trait: the four authentication endpoints of
//! the REST API plus a generic JSON read used by identity-scoped resource
//! queries. Everything above this crate talks to the server only through
//! it, which keeps the session layer testable with a scripted transport.
//!
//! Implementations must normalize every failure into an
//! [`ApiError`] before returning — callers never see raw HTTP errors.
//!
//! # Feature Flags
//!
//! - `http` (default) — [`HttpTransport`] via `reqwest`, with a cookie
//!   store so the session cookie is carried implicitly.

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "http")]
mod http;

use std::future::Future;

pub use error::TransportError;
#[cfg(feature = "http")]
pub use http::HttpTransport;

use tablekeep_protocol::{ApiError, AuthResponse, Credentials, SignupPayload};

/// Endpoint paths, relative to the API base URL.
pub mod endpoints {
    pub const LOGIN: &str = "/auth/login";
    pub const SIGNUP: &str = "/auth/signup";
    pub const ME: &str = "/auth/me";
    pub const LOGOUT: &str = "/auth/logout";
}

/// Performs the authentication calls against the API server.
///
/// # Trait bounds
///
/// - `Send + Sync` → one transport is shared by the session controller
///   and the cache's fetch closures, which may run on any Tokio worker.
/// - `'static` → it lives as long as the client.
///
/// Every method returns a `Send` future so fetches can be stored in the
/// cache as shared, boxed futures.
///
/// Authentication is implicit (a session cookie), so no method takes a
/// token.
pub trait Transport: Send + Sync + 'static {
    /// `POST /auth/login`. The server sets the session cookie on success.
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<AuthResponse, ApiError>> + Send;

    /// `POST /auth/signup`. Implicitly authenticates, like login.
    fn signup(
        &self,
        payload: &SignupPayload,
    ) -> impl Future<Output = Result<AuthResponse, ApiError>> + Send;

    /// `GET /auth/me`. Fails with a 401 [`ApiError`] when unauthenticated.
    fn me(&self) -> impl Future<Output = Result<AuthResponse, ApiError>> + Send;

    /// `POST /auth/logout`. The server invalidates the session cookie.
    fn logout(&self) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `GET {path}` returning the raw JSON body (`null` for an empty body).
    fn get_json(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<serde_json::Value, ApiError>> + Send;
}
