//! # lacework-client
//!
//! Token-authenticated, paginated HTTP client for the Lacework API v2.
//!
//! Every operation exchanges the long-lived credentials for a fresh
//! short-lived bearer token, issues its requests sequentially, and returns
//! the upstream JSON verbatim. The compliance search additionally chunks
//! long time ranges into ≤7-day slices and follows pagination cursors
//! within each chunk, accumulating rows up to a caller-specified limit.
//!
//! # Features
//!
//! - **Fresh token per invocation**: no shared token state, no expiry
//!   bookkeeping; see [`LaceworkClient::fetch_token`]
//! - **Transport retry for GETs only**: bounded reconnect retries for
//!   idempotent requests, never for POSTs, never for 4xx/5xx responses
//! - **Inspectable failures**: upstream error bodies ride along on
//!   [`ClientError::Http`]
//! - **Secure credentials**: the API secret and fetched tokens live in
//!   `secrecy` wrappers and never appear in debug output
//!
//! # Example
//!
//! ```no_run
//! use lacework_client::{ComplianceSearch, LaceworkClient};
//! use lacework_common::Credentials;
//!
//! # async fn example() -> Result<(), lacework_client::ClientError> {
//! let credentials = Credentials::from_env().map_err(|e| {
//!     lacework_client::ClientError::Configuration(e.to_string())
//! })?;
//! let client = LaceworkClient::new(credentials)?;
//!
//! let search = ComplianceSearch::builder()
//!     .statuses(vec!["NonCompliant".to_string()])
//!     .limit(500)
//!     .build();
//! let evaluations = client.search_compliance(&search).await?;
//! println!("{evaluations}");
//! # Ok(())
//! # }
//! ```

/// Time-windowed alert listing.
pub mod alerts;
/// Client construction and authenticated request execution.
pub mod client;
/// Chunked, cursor-paginated compliance evaluation search.
pub mod compliance;
/// Error taxonomy.
pub mod error;
/// Saved LQL query execution.
pub mod query;
/// Short-lived token acquisition.
pub mod token;

pub use alerts::{AlertsRequest, DEFAULT_ALERT_LIMIT};
pub use client::LaceworkClient;
pub use compliance::{ComplianceSearch, DEFAULT_COMPLIANCE_LIMIT, MAX_PAGE_SIZE};
pub use error::ClientError;
pub use query::QueryRequest;
pub use token::AccessToken;
