//! Authenticated request execution against the Lacework API v2.
//!
//! [`LaceworkClient`] owns two HTTP handles: a plain [`reqwest::Client`] for
//! POSTs and a middleware-wrapped client for GETs. GETs are idempotent, so
//! transient connection failures are retried with exponential backoff; a
//! request that reached the server is never replayed, which keeps 4xx/5xx
//! application errors visible to the caller exactly once. POSTs are never
//! retried.
//!
//! Timeouts are fixed per call: 30 seconds for auth and simple listings,
//! 60 seconds for query execution and compliance search.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error};
use reqwest::header;
use reqwest_middleware::ClientWithMiddleware;
use reqwest_retry::{
    Retryable, RetryableStrategy, RetryTransientMiddleware, default_on_request_failure,
    policies::ExponentialBackoff,
};
use serde::Serialize;
use serde_json::Value;

use lacework_common::Credentials;

use crate::error::ClientError;
use crate::token::AccessToken;

/// Timeout for token fetches and simple listings.
pub(crate) const SIMPLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for query execution and compliance search requests.
pub(crate) const SEARCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Transport-level retries for idempotent requests.
const TRANSPORT_RETRIES: u32 = 2;

/// Pre-auth header carrying the long-lived API secret.
pub(crate) const SECRET_HEADER: &str = "X-LW-UAKS";

/// Tenant-scoping header for multi-tenant accounts.
pub(crate) const SUBACCOUNT_HEADER: &str = "X-LW-Sub-Account";

/// Retries connection-level failures only.
///
/// The default strategy also replays 429/5xx responses; here a response that
/// made it to the server must surface to the caller unchanged.
struct RetryTransportOnly;

impl RetryableStrategy for RetryTransportOnly {
    fn handle(
        &self,
        res: &Result<reqwest::Response, reqwest_middleware::Error>,
    ) -> Option<Retryable> {
        match res {
            Ok(_) => None,
            Err(err) => default_on_request_failure(err),
        }
    }
}

/// Client for the Lacework API v2.
///
/// Holds read-only credentials and the HTTP handles; cheap to clone. All
/// operations fetch a fresh short-lived token (see
/// [`fetch_token`](Self::fetch_token)); tokens are never cached across tool
/// invocations.
#[derive(Clone)]
pub struct LaceworkClient {
    /// GET requests go through the retry middleware stack.
    pub(crate) get_client: ClientWithMiddleware,
    /// POSTs are issued directly; the upstream treats them as non-idempotent.
    pub(crate) post_client: reqwest::Client,
    pub(crate) base_url: String,
    pub(crate) credentials: Arc<Credentials>,
}

// Keep credential material out of debug output.
impl std::fmt::Debug for LaceworkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaceworkClient")
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl LaceworkClient {
    /// Creates a client for the account named in `credentials`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] if the CA bundle cannot be
    /// read or the HTTP client cannot be built.
    pub fn new(credentials: Credentials) -> Result<Self, ClientError> {
        let base_url = format!("https://{}.lacework.net/api/v2", credentials.account);
        Self::with_base_url(credentials, base_url)
    }

    /// Creates a client against an explicit base URL.
    ///
    /// Useful for tests and for routing through an API gateway; `new` is the
    /// normal entry point.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] for an unparseable base URL,
    /// an unreadable CA bundle, or an HTTP client build failure.
    pub fn with_base_url(
        credentials: Credentials,
        base_url: impl Into<String>,
    ) -> Result<Self, ClientError> {
        let base_url = base_url.into();
        url::Url::parse(&base_url).map_err(|e| {
            ClientError::Configuration(format!("invalid base URL '{base_url}': {e}"))
        })?;

        let mut builder = reqwest::Client::builder();
        if let Some(path) = &credentials.ca_bundle {
            let pem = std::fs::read(path).map_err(|e| {
                ClientError::Configuration(format!(
                    "cannot read CA bundle {}: {e}",
                    path.display()
                ))
            })?;
            let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                ClientError::Configuration(format!(
                    "invalid CA bundle {}: {e}",
                    path.display()
                ))
            })?;
            builder = builder.add_root_certificate(cert);
        }
        if !credentials.trust_env {
            builder = builder.no_proxy();
        }
        let post_client = builder
            .build()
            .map_err(|e| ClientError::Configuration(format!("cannot build HTTP client: {e}")))?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(TRANSPORT_RETRIES);
        let get_client = reqwest_middleware::ClientBuilder::new(post_client.clone())
            .with(RetryTransientMiddleware::new_with_policy_and_strategy(
                retry_policy,
                RetryTransportOnly,
            ))
            .build();

        Ok(Self {
            get_client,
            post_client,
            base_url,
            credentials: Arc::new(credentials),
        })
    }

    /// The base URL requests are issued against.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issues an authenticated POST and returns the parsed response body.
    pub(crate) async fn post_json<B: Serialize + Sync>(
        &self,
        token: &AccessToken,
        path: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<Value, ClientError> {
        let url = format!("{}{path}", self.base_url);
        debug!("POST {url}");

        let mut request = self
            .post_client
            .post(&url)
            .timeout(timeout)
            .header(header::AUTHORIZATION, token.authorization_value())
            .header(header::CONTENT_TYPE, "application/json")
            .json(body);
        if let Some(subaccount) = &self.credentials.subaccount {
            request = request.header(SUBACCOUNT_HEADER, subaccount.as_str());
        }

        let response = request.send().await?;
        Self::into_json(response).await
    }

    /// Issues an authenticated GET (with transport retry) and returns the
    /// parsed response body.
    pub(crate) async fn get_json(
        &self,
        token: &AccessToken,
        path: &str,
        query: &[(&str, String)],
        timeout: Duration,
    ) -> Result<Value, ClientError> {
        let url = format!("{}{path}", self.base_url);
        debug!("GET {url}");

        let mut request = self
            .get_client
            .get(&url)
            .timeout(timeout)
            .header(header::AUTHORIZATION, token.authorization_value())
            .header(header::CONTENT_TYPE, "application/json")
            .query(query);
        if let Some(subaccount) = &self.credentials.subaccount {
            request = request.header(SUBACCOUNT_HEADER, subaccount.as_str());
        }

        let response = request.send().await?;
        Self::into_json(response).await
    }

    /// Classifies the response: status ≥ 400 becomes [`ClientError::Http`]
    /// carrying the raw body, anything else is parsed as JSON.
    async fn into_json(response: reqwest::Response) -> Result<Value, ClientError> {
        let status = response.status();
        if status.as_u16() >= 400 {
            let body = response.text().await.unwrap_or_default();
            error!("request failed with HTTP {}: {body}", status.as_u16());
            return Err(ClientError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}
