//! # lacework-common
//!
//! Shared types for the Lacework MCP workspace: credentials loaded from the
//! environment, UTC time-window handling, and the wire types used by the
//! Lacework API v2 request bodies.
//!
//! This crate performs no network I/O. The HTTP client lives in
//! `lacework-client`; the MCP tool surface lives in `lacework-mcp`.
//!
//! ## Example
//!
//! ```
//! use lacework_common::{Credentials, FieldFilter, normalize_utc_timestamp};
//!
//! // Credentials are normally read from LW_* environment variables via
//! // `Credentials::from_env()`; tests construct them directly.
//! let creds = Credentials::new("partner-demo", "PARTNER_123", "secret")
//!     .with_subaccount("tenant-a");
//! assert_eq!(creds.account, "partner-demo");
//!
//! // Bare calendar dates are coerced to midnight UTC.
//! assert_eq!(normalize_utc_timestamp("2024-01-01"), "2024-01-01T00:00:00Z");
//!
//! // A single candidate filters with `eq`, several with `in`.
//! let filter = FieldFilter::for_field("status", &["NonCompliant".to_string()]);
//! assert!(filter.is_some());
//! ```

/// Credential configuration read once at process start.
pub mod config;
/// UTC timestamp normalization, strict parsing, and time-window chunking.
pub mod time;
/// Wire types for Lacework API v2 request bodies.
pub mod types;

pub use config::{ConfigError, Credentials, DEFAULT_TOKEN_EXPIRY_SECS};
pub use time::{
    DEFAULT_WINDOW_DAYS, TimeWindow, UTC_INSTANT_FORMAT, format_utc_instant,
    normalize_utc_timestamp, parse_utc_instant,
};
pub use types::{FieldFilter, FilterExpression, QueryArgument};
