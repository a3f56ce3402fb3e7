//! Short-lived API token acquisition.
//!
//! Every tool invocation fetches a fresh token: one extra round trip per
//! call, in exchange for having no shared mutable token state and no expiry
//! bookkeeping. A future cache would need explicit expiry tracking to be
//! safe under concurrent invocations.

use log::debug;
use reqwest::header;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;

use crate::client::{LaceworkClient, SECRET_HEADER, SIMPLE_TIMEOUT, SUBACCOUNT_HEADER};
use crate::error::ClientError;

/// How many characters of the token the ping preview reveals.
const PREVIEW_CHARS: usize = 10;

/// A short-lived bearer token, valid for the configured expiry window.
///
/// Not persisted and not shared across tool invocations.
pub struct AccessToken {
    value: SecretString,
}

impl AccessToken {
    pub(crate) fn new(value: String) -> Self {
        Self {
            value: SecretString::from(value),
        }
    }

    /// A truncated preview safe to echo back to the caller.
    #[must_use]
    pub fn preview(&self) -> String {
        let token = self.value.expose_secret();
        let head: String = token.chars().take(PREVIEW_CHARS).collect();
        format!("{head}...")
    }

    /// The `Authorization` header value for authenticated requests.
    pub(crate) fn authorization_value(&self) -> String {
        format!("Bearer {}", self.value.expose_secret())
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenRequest<'a> {
    key_id: &'a str,
    expiry_time: u64,
}

/// Ordered candidate locations for the token in the response body. The
/// nested form is the documented one; some deployments answer flat.
fn extract_token(body: &Value) -> Option<&str> {
    body.pointer("/data/token")
        .and_then(Value::as_str)
        .or_else(|| body.get("token").and_then(Value::as_str))
}

impl LaceworkClient {
    /// Exchanges the long-lived credentials for a short-lived bearer token.
    ///
    /// The secret travels in the pre-auth `X-LW-UAKS` header, never as a
    /// bearer token. The endpoint answers 200 or 201 on success depending
    /// on deployment; both are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Auth`] for any non-200/201 status or a
    /// response carrying no token, [`ClientError::Transport`] for network
    /// failures.
    pub async fn fetch_token(&self) -> Result<AccessToken, ClientError> {
        let url = format!("{}/access/tokens", self.base_url);
        debug!("POST {url}");

        let body = TokenRequest {
            key_id: &self.credentials.key_id,
            expiry_time: self.credentials.token_expiry_secs,
        };

        let mut request = self
            .post_client
            .post(&url)
            .timeout(SIMPLE_TIMEOUT)
            .header(SECRET_HEADER, self.credentials.expose_secret())
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body);
        if let Some(subaccount) = &self.credentials.subaccount {
            request = request.header(SUBACCOUNT_HEADER, subaccount.as_str());
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        if status != 200 && status != 201 {
            let text = response.text().await.unwrap_or_default();
            return Err(ClientError::Auth(format!(
                "token endpoint returned HTTP {status}: {text}"
            )));
        }

        let payload: Value = response.json().await?;
        extract_token(&payload)
            .map(|token| AccessToken::new(token.to_owned()))
            .ok_or_else(|| {
                ClientError::Auth("token response did not contain a token".to_owned())
            })
    }
}
