//
//  codeship
//  lib.rs
//

//! # CodeShip API Client Library
//!
//! A Rust client for the CodeShip continuous-integration REST API (v2).
//! It handles authentication, request serialization, and the mapping of
//! HTTP responses and status codes to typed results or errors.
//!
//! ## Overview
//!
//! Every call flows through one pipeline: obtain (or refresh) a bearer
//! token, build the request, dispatch it, and classify the response.
//! Callers work with an [`Organization`] handle derived from a shared
//! [`Client`]; typed endpoint helpers for projects and builds live in
//! [`api`], and anything they do not cover can go through
//! [`Organization::request`] directly.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use codeship::Client;
//!
//! #[tokio::main]
//! async fn main() -> codeship::Result<()> {
//!     // Credentials fall back to CODESHIP_USERNAME / CODESHIP_PASSWORD.
//!     let client = Arc::new(Client::builder().build()?);
//!     let org = client.organization("acme").await?;
//!
//!     for project in org.list_projects().await? {
//!         println!("{}  {}", project.uuid, project.name);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Structure
//!
//! - [`client`]: the shared [`Client`] handle, builder, and token exchange
//! - [`organization`]: the [`Organization`] handle and request pipeline
//! - [`api`]: typed endpoint helpers (projects, builds)
//! - [`error`]: the [`Error`] taxonomy every operation returns
//! - [`logging`]: the verbose request/response dump sink
//!
//! ## Concurrency
//!
//! Calls are sequential within themselves and safe to make from multiple
//! tasks, but the cached token is shared: concurrent calls that both find
//! it stale will both re-authenticate, and the last writer wins. The
//! library never retries, rate-limits, or paginates on your behalf.

/// The shared client handle: configuration, transport, and the cached
/// authentication state, plus the `POST /auth` token exchange.
pub mod client;

/// The error taxonomy returned by every fallible operation.
pub mod error;

/// Verbose request/response logging sink.
pub mod logging;

/// The organization-scoped handle and the request execution pipeline.
pub mod organization;

/// Typed endpoint helpers layered over the pipeline.
pub mod api;

pub use client::{AuthOrganization, Authentication, Client, ClientBuilder};
pub use error::{Error, Result};
pub use logging::{RequestLogger, TracingLogger};
pub use organization::Organization;

/// Crate version, derived from Cargo.toml at compile time. Sent as part
/// of the default `User-Agent` header.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
