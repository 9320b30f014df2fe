//
//  codeship
//  organization.rs
//

//! # Organization-Scoped Request Execution
//!
//! This module provides [`Organization`], the handle every API call goes
//! through, and the request pipeline at its center. The pipeline is the
//! single chokepoint for the whole crate: endpoint helpers in
//! [`crate::api`] only decide verb, path and payload, then delegate here.
//!
//! ## Pipeline
//!
//! For each call, strictly in order:
//!
//! 1. Upgrade the non-owning client reference (fail fast with
//!    [`Error::ClientNotBound`] if the client is gone)
//! 2. Encode the payload, if any, as JSON
//! 3. Re-authenticate if the cached token is missing or stale
//! 4. Assemble headers: client defaults, then `Authorization` (always
//!    overwritten), then `Content-Type: application/json` (only if unset)
//! 5. Dump the request to the log sink when verbose
//! 6. Dispatch and read the full response body
//! 7. Dump the response when verbose
//! 8. Classify the status code into bytes-or-error
//!
//! There are no retries; every failure aborts the call and is returned as
//! a typed [`Error`].

use std::sync::Weak;

use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use uuid::Uuid;

use crate::client::Client;
use crate::error::{Error, Result};
use crate::logging::{dump_request, dump_response};

/// Maps a response status code to the crate's error taxonomy.
///
/// Success is exactly {200, 201, 202}; nothing else is ever treated as
/// success, however plausible the body looks. Bodies of 5xx responses are
/// deliberately not echoed into the error; for unmapped codes the body is
/// included verbatim to aid diagnosis.
pub(crate) fn classify_status(status: StatusCode, body: &[u8]) -> Result<()> {
    match status {
        StatusCode::OK | StatusCode::CREATED | StatusCode::ACCEPTED => Ok(()),
        StatusCode::UNAUTHORIZED => Err(Error::InvalidCredentials(status.as_u16())),
        StatusCode::FORBIDDEN => Err(Error::InsufficientPermissions(status.as_u16())),
        _ if status.as_u16() >= 500 => Err(Error::ServerError(status.as_u16())),
        _ => Err(Error::UnexpectedStatus {
            status: status.as_u16(),
            body: String::from_utf8_lossy(body).into_owned(),
        }),
    }
}

/// A handle scoped to one CodeShip organization.
///
/// Obtained from [`Client::organization`]. Identifies the organization and
/// the permission scopes granted to the authenticated user, and keeps a
/// **non-owning** reference to the backing [`Client`]: if the last
/// `Arc<Client>` is dropped, every operation on this handle fails with
/// [`Error::ClientNotBound`].
///
/// The handle itself is immutable after construction; the only shared
/// mutable state is the client's cached authentication, which the pipeline
/// refreshes as needed. Handles may be cloned freely, but concurrent use
/// of handles backed by the same client can race on that token refresh
/// (last writer wins) — see the crate-level concurrency notes.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use codeship::Client;
///
/// # async fn example() -> codeship::Result<()> {
/// let client = Arc::new(Client::builder().build()?);
/// let org = client.organization("acme").await?;
/// for project in org.list_projects().await? {
///     println!("{}", project.name);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Organization {
    /// Unique identifier of the organization.
    pub uuid: Uuid,

    /// Organization name, as registered with the service.
    pub name: String,

    /// Permission scopes granted to the authenticated user.
    pub scopes: Vec<String>,

    /// Non-owning reference to the backing client.
    client: Weak<Client>,
}

impl Organization {
    pub(crate) fn new(uuid: Uuid, name: &str, scopes: &[String], client: Weak<Client>) -> Self {
        Self {
            uuid,
            name: name.to_string(),
            scopes: scopes.to_vec(),
            client,
        }
    }

    /// Executes one API call and returns the raw response body.
    ///
    /// This is the escape hatch for endpoints the typed helpers do not
    /// cover, and the chokepoint those helpers themselves go through.
    /// `path` is resolved against the client's base URL; `params`, when
    /// present, is JSON-encoded into the request body. A `None` payload
    /// produces a genuinely empty body, not an encoded `{}` — some
    /// endpoints treat the two differently.
    ///
    /// The response body is handed back uninterpreted; decoding it is the
    /// caller's concern.
    ///
    /// # Errors
    ///
    /// - [`Error::ClientNotBound`] — the backing client was dropped;
    ///   checked before anything else, no network activity occurs
    /// - [`Error::Encoding`] — the payload failed to serialize; nothing
    ///   was sent
    /// - [`Error::Authentication`] — the token refresh failed; the
    ///   request was never dispatched
    /// - [`Error::Transport`] — the request could not be delivered
    /// - [`Error::BodyRead`] — the response body could not be read
    /// - [`Error::InvalidCredentials`] / [`Error::InsufficientPermissions`]
    ///   / [`Error::ServerError`] / [`Error::UnexpectedStatus`] — the
    ///   status-code mapping described in [`crate::error`]
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use reqwest::Method;
    /// # async fn example(org: codeship::Organization) -> codeship::Result<()> {
    /// let raw = org
    ///     .request::<()>(Method::GET, &format!("/organizations/{}/projects", org.uuid), None)
    ///     .await?;
    /// println!("{}", String::from_utf8_lossy(&raw));
    /// # Ok(())
    /// # }
    /// ```
    pub async fn request<P>(&self, method: Method, path: &str, params: Option<&P>) -> Result<Vec<u8>>
    where
        P: Serialize + ?Sized,
    {
        let client = self.client.upgrade().ok_or(Error::ClientNotBound)?;

        let body = match params {
            Some(params) => Some(serde_json::to_vec(params).map_err(Error::Encoding)?),
            None => None,
        };

        if client.authentication_required().await {
            client
                .authenticate()
                .await
                .map_err(|err| Error::Authentication(Box::new(err)))?;
        }

        let url = format!("{}{}", client.base_url(), path);

        // Defaults are cloned, never mutated in place; the outgoing header
        // set is independent of the one stored on the client.
        let mut headers = client.default_headers().clone();
        let token = client.access_token().await.unwrap_or_default();
        let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| Error::Config("access token is not a valid header value".to_string()))?;
        headers.insert(AUTHORIZATION, bearer);
        if !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        if client.verbose() {
            client
                .logger()
                .log(&dump_request(&method, &url, &headers, body.as_deref()));
        }

        let mut request = client.http().request(method, &url).headers(headers);
        if let Some(body) = body {
            request = request.body(body);
        }

        // The response is fully consumed (or dropped on the error paths
        // below); either way reqwest returns the connection to its pool.
        let response = request.send().await.map_err(Error::Transport)?;
        let status = response.status();
        let response_headers = response.headers().clone();
        let bytes = response.bytes().await.map_err(Error::BodyRead)?;

        if client.verbose() {
            client
                .logger()
                .log(&dump_response(status, &response_headers, &bytes));
        }

        classify_status(status, &bytes)?;

        Ok(bytes.to_vec())
    }
}
