//! Time-windowed alert listing.

use chrono::{Duration, Utc};
use serde_json::Value;
use typed_builder::TypedBuilder;

use lacework_common::{DEFAULT_WINDOW_DAYS, format_utc_instant};

use crate::client::{LaceworkClient, SIMPLE_TIMEOUT};
use crate::error::ClientError;

/// Default page size for alert listings.
pub const DEFAULT_ALERT_LIMIT: u32 = 50;

/// An alert listing request.
///
/// Missing bounds default independently, both anchored to the invocation
/// instant: `end_time` to now, `start_time` to now minus seven days, even
/// when the other bound is supplied. The window floats with "now" unless
/// both ends are explicit. Supplied bounds pass through unvalidated; a bad
/// value surfaces as an upstream HTTP error.
#[derive(Debug, Clone, TypedBuilder)]
pub struct AlertsRequest {
    /// Optional window start, full UTC instant form.
    #[builder(default, setter(strip_option, into))]
    pub start_time: Option<String>,
    /// Optional window end, full UTC instant form.
    #[builder(default, setter(strip_option, into))]
    pub end_time: Option<String>,
    /// Maximum number of alerts to return.
    #[builder(default = DEFAULT_ALERT_LIMIT)]
    pub limit: u32,
}

impl LaceworkClient {
    /// Lists alerts in the requested window.
    ///
    /// A single GET against `/Alerts`; the response body is returned
    /// verbatim.
    ///
    /// # Errors
    ///
    /// Token, HTTP, and transport errors propagate.
    pub async fn list_alerts(&self, request: &AlertsRequest) -> Result<Value, ClientError> {
        let now = Utc::now();
        let end_time = request
            .end_time
            .clone()
            .unwrap_or_else(|| format_utc_instant(now));
        let start_time = request
            .start_time
            .clone()
            .unwrap_or_else(|| format_utc_instant(now - Duration::days(DEFAULT_WINDOW_DAYS)));

        let token = self.fetch_token().await?;
        self.get_json(
            &token,
            "/Alerts",
            &[
                ("startTime", start_time),
                ("endTime", end_time),
                ("limit", request.limit.to_string()),
            ],
            SIMPLE_TIMEOUT,
        )
        .await
    }
}
