//
//  codeship
//  error.rs
//

//! Error Types for CodeShip API Operations
//!
//! This module defines the single error type used throughout the crate.
//! Every fallible operation returns [`Error`], so callers can branch on the
//! failure kind programmatically instead of parsing message strings.
//!
//! # Overview
//!
//! Errors fall into three groups:
//!
//! - **Configuration**: [`Error::Config`], [`Error::ClientNotBound`],
//!   [`Error::OrganizationNotFound`] — the client or handle was set up
//!   incorrectly; no network activity took place.
//! - **Pipeline**: [`Error::Encoding`], [`Error::Authentication`],
//!   [`Error::Transport`], [`Error::BodyRead`], [`Error::Decoding`] —
//!   a step of the request pipeline failed; the underlying cause is
//!   preserved as a `source`.
//! - **Status**: [`Error::InvalidCredentials`],
//!   [`Error::InsufficientPermissions`], [`Error::ServerError`],
//!   [`Error::UnexpectedStatus`] — the server answered with a non-success
//!   status code; the literal code is part of the message.
//!
//! # Example
//!
//! ```rust
//! use codeship::Error;
//!
//! fn describe(err: &Error) -> &'static str {
//!     match err {
//!         Error::InvalidCredentials(_) => "re-authenticate and try again",
//!         Error::InsufficientPermissions(_) => "ask an admin for access",
//!         Error::ServerError(_) => "the service is having a bad day",
//!         Error::Transport(_) => "check your network connection",
//!         _ => "see the error chain for details",
//!     }
//! }
//! ```
//!
//! # Notes
//!
//! - Nothing in this crate panics on failure; every error is an ordinary
//!   `Err` return.
//! - For unmapped status codes the response body is included verbatim in
//!   the message so unanticipated server behavior can be diagnosed. Bodies
//!   of 5xx responses are deliberately not echoed.

use thiserror::Error;

/// Convenience alias used by every fallible operation in the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for all CodeShip API operations.
///
/// Implements the standard `Error` trait via `thiserror`; variants that
/// wrap a lower-level failure expose it through `source()`.
///
/// # Variants
///
/// | Variant | Meaning | HTTP status |
/// |---------|---------|-------------|
/// | `Config` | Client was misconfigured at build time | N/A |
/// | `ClientNotBound` | Organization handle outlived its client | N/A |
/// | `OrganizationNotFound` | Name not present in the authenticated scopes | N/A |
/// | `Encoding` | Request payload could not be serialized | N/A |
/// | `Authentication` | Credential refresh failed | N/A |
/// | `Transport` | Network-level send failure | N/A |
/// | `BodyRead` | Response body could not be read | N/A |
/// | `Decoding` | Response JSON did not match the expected shape | N/A |
/// | `InvalidCredentials` | Token rejected | 401 |
/// | `InsufficientPermissions` | Token lacks the required scope | 403 |
/// | `ServerError` | Service-side failure | 5xx |
/// | `UnexpectedStatus` | Any other non-success status | other |
#[derive(Error, Debug)]
pub enum Error {
    /// The client was configured with invalid settings.
    ///
    /// Returned by [`ClientBuilder::build`](crate::ClientBuilder::build) for
    /// missing credentials, an unparseable base URL, or a transport that
    /// could not be constructed.
    #[error("invalid client configuration: {0}")]
    Config(String),

    /// The organization handle has no live client behind it.
    ///
    /// An [`Organization`](crate::Organization) keeps a non-owning
    /// reference to its [`Client`](crate::Client); once the client is
    /// dropped every operation on the handle fails with this error before
    /// any network activity.
    #[error("client not instantiated")]
    ClientNotBound,

    /// No organization with the given name is visible to the
    /// authenticated user.
    #[error("organization '{0}' not authorized")]
    OrganizationNotFound(String),

    /// The request payload could not be serialized to JSON.
    ///
    /// The request is aborted before anything is sent.
    #[error("failed to encode request parameters")]
    Encoding(#[source] serde_json::Error),

    /// Obtaining a fresh access token failed.
    ///
    /// Wraps the error produced by the authentication round trip. The
    /// previously cached authentication state, if any, is left untouched.
    #[error("authentication failed")]
    Authentication(#[source] Box<Error>),

    /// The request could not be delivered.
    ///
    /// Connection refused, DNS failure, TLS failure, timeout — anything
    /// the transport reports before a status line is available.
    #[error("HTTP request failed")]
    Transport(#[source] reqwest::Error),

    /// The response body could not be read to completion.
    #[error("could not read response body")]
    BodyRead(#[source] reqwest::Error),

    /// The response body did not deserialize into the expected type.
    ///
    /// Only produced by the typed endpoint helpers; the core pipeline
    /// hands bytes back uninterpreted.
    #[error("failed to decode response body")]
    Decoding(#[source] serde_json::Error),

    /// The server rejected the access token (HTTP 401).
    #[error("HTTP status {0}: invalid credentials")]
    InvalidCredentials(u16),

    /// The token is valid but lacks permission (HTTP 403).
    #[error("HTTP status {0}: insufficient permissions")]
    InsufficientPermissions(u16),

    /// The service failed internally (HTTP 5xx).
    ///
    /// The response body is intentionally not echoed for server errors.
    #[error("HTTP status {0}: server error")]
    ServerError(u16),

    /// Any status code outside the explicit success and error mappings.
    ///
    /// Covers unmapped 4xx, redirects and surprising 2xx codes. The body
    /// is carried verbatim so the caller can see what the server actually
    /// said.
    #[error("HTTP status {status}: content {body:?}")]
    UnexpectedStatus {
        /// The numeric HTTP status code.
        status: u16,
        /// The full response body as text.
        body: String,
    },
}
