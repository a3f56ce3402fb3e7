//! Credential configuration loaded from the environment.
//!
//! Configuration is read once at process start from `LW_*` environment
//! variables (a `.env` file, if present, is loaded by the binary before this
//! runs):
//!
//! | Variable        | Required | Meaning                                     |
//! |-----------------|----------|---------------------------------------------|
//! | `LW_ACCOUNT`    | yes      | Account identifier, e.g. `partner-demo`     |
//! | `LW_KEY_ID`     | yes      | API key id                                  |
//! | `LW_SECRET`     | yes      | API secret (pre-auth header value)          |
//! | `LW_SUBACCOUNT` | no       | Tenant-scoping sub-account                  |
//! | `LW_EXPIRY`     | no       | Requested token lifetime in seconds (3600)  |
//! | `LW_CA_BUNDLE`  | no       | Path to a PEM CA bundle for TLS             |
//! | `LW_TRUST_ENV`  | no       | `0` ignores system proxy settings (else on) |
//!
//! A missing or blank required variable is a fatal [`ConfigError`]; the
//! binary reports it on stderr and exits nonzero before any tool is servable.

use std::env;
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Requested token lifetime when `LW_EXPIRY` is not set.
pub const DEFAULT_TOKEN_EXPIRY_SECS: u64 = 3600;

/// Fatal configuration error raised at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is missing or blank.
    #[error("missing required environment variable {0}")]
    MissingVariable(&'static str),

    /// An environment variable is present but unparseable.
    #[error("invalid value for {name}: {message}")]
    InvalidVariable {
        /// The offending variable name.
        name: &'static str,
        /// What was wrong with it.
        message: String,
    },
}

/// Long-lived API credentials, immutable for the process lifetime.
#[derive(Clone)]
pub struct Credentials {
    /// Account identifier; forms the API host `{account}.lacework.net`.
    pub account: String,
    /// API key id, sent in the token request body.
    pub key_id: String,
    /// API secret, sent as a pre-auth header value. Never a bearer token.
    secret: SecretString,
    /// Optional tenant-scoping sub-account header value.
    pub subaccount: Option<String>,
    /// Requested lifetime for fetched tokens, in seconds.
    pub token_expiry_secs: u64,
    /// Optional PEM CA bundle for TLS verification behind intercepting proxies.
    pub ca_bundle: Option<PathBuf>,
    /// Whether to honor system proxy settings.
    pub trust_env: bool,
}

// Keep the secret out of debug output.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("account", &self.account)
            .field("key_id", &self.key_id)
            .field("secret", &"[REDACTED]")
            .field("subaccount", &self.subaccount)
            .field("token_expiry_secs", &self.token_expiry_secs)
            .field("ca_bundle", &self.ca_bundle)
            .field("trust_env", &self.trust_env)
            .finish()
    }
}

impl Credentials {
    /// Creates credentials with default optional settings.
    pub fn new(
        account: impl Into<String>,
        key_id: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            account: account.into(),
            key_id: key_id.into(),
            secret: SecretString::from(secret.into()),
            subaccount: None,
            token_expiry_secs: DEFAULT_TOKEN_EXPIRY_SECS,
            ca_bundle: None,
            trust_env: true,
        }
    }

    /// Sets the tenant-scoping sub-account.
    #[must_use]
    pub fn with_subaccount(mut self, subaccount: impl Into<String>) -> Self {
        self.subaccount = Some(subaccount.into());
        self
    }

    /// Sets the requested token lifetime in seconds.
    #[must_use]
    pub const fn with_token_expiry_secs(mut self, secs: u64) -> Self {
        self.token_expiry_secs = secs;
        self
    }

    /// The API secret. Exposed only to build the pre-auth header.
    #[must_use]
    pub fn expose_secret(&self) -> &str {
        self.secret.expose_secret()
    }

    /// Loads credentials from the process environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a required variable is missing or blank,
    /// or `LW_EXPIRY` is not a number.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Loads credentials through a variable lookup.
    ///
    /// Factored out of [`Self::from_env`] so tests can supply variables
    /// without touching the process environment. Values are trimmed; a
    /// blank value counts as absent.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::from_env`].
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let account = get("LW_ACCOUNT").ok_or(ConfigError::MissingVariable("LW_ACCOUNT"))?;
        let key_id = get("LW_KEY_ID").ok_or(ConfigError::MissingVariable("LW_KEY_ID"))?;
        let secret = get("LW_SECRET").ok_or(ConfigError::MissingVariable("LW_SECRET"))?;

        let token_expiry_secs = match get("LW_EXPIRY") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|e| ConfigError::InvalidVariable {
                    name: "LW_EXPIRY",
                    message: format!("{e}: {raw:?}"),
                })?,
            None => DEFAULT_TOKEN_EXPIRY_SECS,
        };

        Ok(Self {
            account,
            key_id,
            secret: SecretString::from(secret),
            subaccount: get("LW_SUBACCOUNT"),
            token_expiry_secs,
            ca_bundle: get("LW_CA_BUNDLE").map(PathBuf::from),
            // "0" opts out of system proxy settings; anything else honors them.
            trust_env: get("LW_TRUST_ENV").is_none_or(|value| value != "0"),
        })
    }
}
