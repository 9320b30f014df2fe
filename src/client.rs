//
//  codeship
//  client.rs
//

//! # CodeShip API Client
//!
//! This module provides [`Client`], the process-wide handle holding
//! everything shared between organization-scoped handles: the base URL,
//! default headers, the HTTP transport, the verbose-logging sink, and the
//! cached authentication state.
//!
//! ## Creating a client
//!
//! Use the builder to configure a client. Credentials may be passed
//! explicitly or picked up from the `CODESHIP_USERNAME` and
//! `CODESHIP_PASSWORD` environment variables:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use codeship::Client;
//!
//! # fn example() -> codeship::Result<()> {
//! let client = Arc::new(
//!     Client::builder()
//!         .username("shipper")
//!         .password("hunter2")
//!         .build()?,
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Authentication
//!
//! The client lazily exchanges its Basic credentials for a bearer token at
//! `POST /auth` the first time a request needs one, and again whenever the
//! cached token expires. Callers never drive this directly; the request
//! pipeline consults [`Client::authentication_required`] before every call.
//!
//! ## Concurrency
//!
//! The authentication state lives behind a `tokio::sync::RwLock`, so reads
//! and the token overwrite are individually safe. Two tasks that both find
//! the token stale will both re-authenticate and the last writer wins; the
//! client does not serialize whole calls.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use tokio::sync::RwLock;
use url::Url;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::logging::{RequestLogger, TracingLogger};
use crate::organization::{classify_status, Organization};

/// Default base URL for the CodeShip API.
const DEFAULT_BASE_URL: &str = "https://api.codeship.com/v2";

/// Environment variable consulted when no username is configured.
const ENV_USERNAME: &str = "CODESHIP_USERNAME";

/// Environment variable consulted when no password is configured.
const ENV_PASSWORD: &str = "CODESHIP_PASSWORD";

/// The result of a successful `POST /auth` exchange.
///
/// Holds the bearer token, its expiry, and the organizations the
/// authenticated user can act on. Lives only in process memory and is
/// replaced wholesale on every successful re-authentication.
#[derive(Debug, Clone, Deserialize)]
pub struct Authentication {
    /// The bearer token sent with every API request.
    pub access_token: String,

    /// Unix timestamp (seconds) after which the token is stale.
    pub expires_at: i64,

    /// Organizations visible to the authenticated user.
    #[serde(default)]
    pub organizations: Vec<AuthOrganization>,
}

impl Authentication {
    /// Returns `true` when the token is unusable: empty or past expiry.
    pub fn is_expired(&self) -> bool {
        self.access_token.is_empty() || self.expires_at <= Utc::now().timestamp()
    }
}

/// An organization entry from the authentication response.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthOrganization {
    /// Unique identifier of the organization.
    pub uuid: Uuid,

    /// Organization name, as registered with the service.
    pub name: String,

    /// Permission scopes granted to the authenticated user
    /// (e.g. `project.read`, `build.write`).
    #[serde(default)]
    pub scopes: Vec<String>,
}

/// Process-wide configuration and shared state for the CodeShip API.
///
/// A `Client` owns the transport, the default header set, the Basic
/// credentials used to mint bearer tokens, and the cached
/// [`Authentication`] state. Organization handles derived via
/// [`Client::organization`] hold a non-owning reference back to it, so the
/// client must be kept alive (inside an [`Arc`]) for as long as any handle
/// is in use.
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
/// let projects = org.list_projects().await?;
/// # Ok(())
/// # }
/// ```
pub struct Client {
    /// The underlying HTTP transport.
    http: reqwest::Client,
    /// Base URL without a trailing slash, e.g. `https://api.codeship.com/v2`.
    base_url: String,
    /// Default headers copied onto every outgoing request.
    headers: HeaderMap,
    /// Username for the Basic-auth token exchange.
    username: String,
    /// Password for the Basic-auth token exchange.
    password: String,
    /// Whether to dump full requests and responses to the logger.
    verbose: bool,
    /// Sink for verbose dumps.
    logger: Arc<dyn RequestLogger>,
    /// Cached authentication state; `None` until the first successful
    /// token exchange.
    authentication: RwLock<Option<Authentication>>,
}

impl Client {
    /// Returns a builder with default settings.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Creates a client with explicit credentials and default settings.
    ///
    /// Shorthand for `Client::builder().username(..).password(..).build()`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if either credential is empty or the
    /// transport cannot be constructed.
    pub fn new(username: &str, password: &str) -> Result<Self> {
        Self::builder().username(username).password(password).build()
    }

    /// Checks whether a (re-)authentication step is needed.
    ///
    /// Pure read: `true` when no token has been obtained yet or the cached
    /// token is expired. Never triggers network activity.
    pub async fn authentication_required(&self) -> bool {
        match self.authentication.read().await.as_ref() {
            Some(auth) => auth.is_expired(),
            None => true,
        }
    }

    /// Exchanges the Basic credentials for a fresh bearer token.
    ///
    /// Performs `POST /auth` with an empty body and, on success, replaces
    /// the cached [`Authentication`] state. On failure the previous state
    /// is left untouched.
    ///
    /// Most callers never invoke this directly; the request pipeline calls
    /// it whenever [`Client::authentication_required`] reports a stale
    /// token.
    ///
    /// # Errors
    ///
    /// - [`Error::Transport`] if the exchange could not be delivered
    /// - [`Error::InvalidCredentials`] on HTTP 401
    /// - [`Error::InsufficientPermissions`] on HTTP 403
    /// - [`Error::ServerError`] on HTTP 5xx
    /// - [`Error::UnexpectedStatus`] on any other non-success status
    /// - [`Error::Decoding`] if the response JSON is malformed
    pub async fn authenticate(&self) -> Result<()> {
        let url = format!("{}/auth", self.base_url);
        tracing::debug!(target: "codeship::auth", %url, "exchanging credentials for access token");

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = response.status();
        let body = response.bytes().await.map_err(Error::BodyRead)?;
        classify_status(status, &body)?;

        let auth: Authentication = serde_json::from_slice(&body).map_err(Error::Decoding)?;
        tracing::debug!(
            target: "codeship::auth",
            organizations = auth.organizations.len(),
            expires_at = auth.expires_at,
            "access token refreshed"
        );

        *self.authentication.write().await = Some(auth);
        Ok(())
    }

    /// Returns a handle scoped to the named organization.
    ///
    /// Authenticates first if required, then looks the name up
    /// (case-insensitively) in the organizations attached to the token.
    /// The returned handle borrows this client weakly: dropping the last
    /// `Arc<Client>` invalidates it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authentication`] if the token exchange fails, or
    /// [`Error::OrganizationNotFound`] if the authenticated user cannot
    /// see an organization with this name.
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
    /// println!("{} ({})", org.name, org.uuid);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn organization(self: &Arc<Self>, name: &str) -> Result<Organization> {
        if self.authentication_required().await {
            self.authenticate()
                .await
                .map_err(|err| Error::Authentication(Box::new(err)))?;
        }

        let authentication = self.authentication.read().await;
        let orgs = authentication
            .as_ref()
            .map(|auth| auth.organizations.as_slice())
            .unwrap_or_default();

        orgs.iter()
            .find(|org| org.name.eq_ignore_ascii_case(name))
            .map(|org| Organization::new(org.uuid, &org.name, &org.scopes, Arc::downgrade(self)))
            .ok_or_else(|| Error::OrganizationNotFound(name.to_string()))
    }

    /// Replaces the default header set shared with every request.
    ///
    /// Only affects requests issued after the call, and requires exclusive
    /// access — set headers up before wrapping the client in an `Arc`. The
    /// `Authorization` header cannot be pinned this way; the pipeline
    /// always overwrites it with the current bearer token.
    pub fn set_default_headers(&mut self, headers: HeaderMap) {
        self.headers = headers;
    }

    /// Returns the currently cached access token, if any.
    ///
    /// Expired tokens are returned as-is; use
    /// [`Client::authentication_required`] to check staleness.
    pub async fn access_token(&self) -> Option<String> {
        self.authentication
            .read()
            .await
            .as_ref()
            .map(|auth| auth.access_token.clone())
    }

    /// The base URL requests are resolved against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn default_headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub(crate) fn verbose(&self) -> bool {
        self.verbose
    }

    pub(crate) fn logger(&self) -> &dyn RequestLogger {
        self.logger.as_ref()
    }

    #[cfg(test)]
    pub(crate) async fn set_authentication(&self, auth: Option<Authentication>) {
        *self.authentication.write().await = auth;
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Credentials and token stay out of debug output.
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Client`].
///
/// All settings are optional; an entirely default build targets the public
/// CodeShip API and reads credentials from the environment.
///
/// # Example
///
/// ```rust,no_run
/// use codeship::Client;
/// use reqwest::header::{HeaderName, HeaderValue};
///
/// # fn example() -> codeship::Result<()> {
/// let client = Client::builder()
///     .username("shipper")
///     .password("hunter2")
///     .header(
///         HeaderName::from_static("x-request-source"),
///         HeaderValue::from_static("nightly-sync"),
///     )
///     .verbose(true)
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    username: Option<String>,
    password: Option<String>,
    base_url: String,
    headers: HeaderMap,
    verbose: bool,
    logger: Arc<dyn RequestLogger>,
    http: Option<reqwest::Client>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            headers: HeaderMap::new(),
            verbose: false,
            logger: Arc::new(TracingLogger),
            http: None,
        }
    }
}

impl ClientBuilder {
    /// Sets the username for the token exchange.
    ///
    /// Falls back to `CODESHIP_USERNAME` when unset.
    pub fn username(mut self, username: &str) -> Self {
        self.username = Some(username.to_string());
        self
    }

    /// Sets the password for the token exchange.
    ///
    /// Falls back to `CODESHIP_PASSWORD` when unset.
    pub fn password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    /// Overrides the API base URL.
    ///
    /// Useful for testing against a mock server or a proxy. A trailing
    /// slash is stripped.
    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Adds a default header sent with every request.
    ///
    /// `Authorization` set here is overwritten by the pipeline on every
    /// request; a `Content-Type` set here takes precedence over the
    /// default `application/json`.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Replaces the entire default header set.
    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Enables full request/response dumps to the logging sink.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Replaces the logging sink used for verbose dumps.
    pub fn logger(mut self, logger: Arc<dyn RequestLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Supplies a pre-configured transport.
    ///
    /// Timeouts, proxies and pooling are transport concerns; configure
    /// them on the `reqwest::Client` passed here.
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Validates the configuration and constructs the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when no username or password is available
    /// (neither set explicitly nor via the environment), when the base URL
    /// does not parse, or when the default transport cannot be built.
    pub fn build(self) -> Result<Client> {
        let username = self
            .username
            .or_else(|| std::env::var(ENV_USERNAME).ok())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| Error::Config("missing username".to_string()))?;
        let password = self
            .password
            .or_else(|| std::env::var(ENV_PASSWORD).ok())
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Error::Config("missing password".to_string()))?;

        Url::parse(&self.base_url)
            .map_err(|err| Error::Config(format!("invalid base URL '{}': {err}", self.base_url)))?;

        let http = match self.http {
            Some(http) => http,
            None => reqwest::Client::builder()
                .user_agent(format!("codeship-rs/{}", crate::VERSION))
                .build()
                .map_err(|err| Error::Config(format!("could not build HTTP client: {err}")))?,
        };

        Ok(Client {
            http,
            base_url: self.base_url,
            headers: self.headers,
            username,
            password,
            verbose: self.verbose,
            logger: self.logger,
            authentication: RwLock::new(None),
        })
    }
}
