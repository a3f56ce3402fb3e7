//! UTC timestamp handling for the Lacework API.
//!
//! The API speaks exactly one instant form, `YYYY-MM-DDTHH:MM:SSZ`. This
//! module pins parsing and formatting to that form, coerces bare calendar
//! dates to midnight UTC where the API surface allows it, and partitions
//! long time ranges into the ≤7-day chunks the compliance search endpoint
//! requires.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, ParseError, Utc};

/// The one instant form the API accepts.
pub const UTC_INSTANT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Bare calendar date form accepted by [`normalize_utc_timestamp`].
const CALENDAR_DATE_FORMAT: &str = "%Y-%m-%d";

/// Default lookback window when a caller omits time bounds.
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Formats an instant as `YYYY-MM-DDTHH:MM:SSZ`.
#[must_use]
pub fn format_utc_instant(instant: DateTime<Utc>) -> String {
    instant.format(UTC_INSTANT_FORMAT).to_string()
}

/// Parses an instant strictly from `YYYY-MM-DDTHH:MM:SSZ`.
///
/// Unlike [`normalize_utc_timestamp`], bare dates are rejected here.
///
/// # Errors
///
/// Returns the chrono parse error for any other shape.
pub fn parse_utc_instant(value: &str) -> Result<DateTime<Utc>, ParseError> {
    NaiveDateTime::parse_from_str(value, UTC_INSTANT_FORMAT).map(|naive| naive.and_utc())
}

/// Canonicalizes a user-supplied timestamp.
///
/// A value already in the full instant form is returned unchanged. A bare
/// calendar date gets a midnight-UTC time of day appended. Anything else is
/// passed through untouched: malformed input is not rejected here, it
/// surfaces as an upstream HTTP error.
#[must_use]
pub fn normalize_utc_timestamp(value: &str) -> String {
    if value.contains('T') && value.ends_with('Z') {
        return value.to_owned();
    }
    if NaiveDate::parse_from_str(value, CALENDAR_DATE_FORMAT).is_ok() {
        return format!("{value}T00:00:00Z");
    }
    value.to_owned()
}

/// A half-open UTC time range `[start, end)`.
///
/// A window whose start is not before its end yields no chunks; callers that
/// iterate such a window simply collect nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    /// Inclusive lower bound.
    pub start: DateTime<Utc>,
    /// Exclusive upper bound.
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a window from explicit bounds.
    #[must_use]
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Resolves optional string bounds into a window.
    ///
    /// `end` defaults to now; `start` defaults to `end` minus
    /// [`DEFAULT_WINDOW_DAYS`]. Supplied bounds must already be in the full
    /// instant form: this is the strict entry point used by the compliance
    /// search, which does not coerce bare dates.
    ///
    /// # Errors
    ///
    /// Returns the parse error of the first unparseable bound.
    pub fn resolve(start: Option<&str>, end: Option<&str>) -> Result<Self, ParseError> {
        let end = match end {
            Some(raw) => parse_utc_instant(raw)?,
            None => Utc::now(),
        };
        let start = match start {
            Some(raw) => parse_utc_instant(raw)?,
            None => end - Duration::days(DEFAULT_WINDOW_DAYS),
        };
        Ok(Self { start, end })
    }

    /// Partitions the window into consecutive chunks of at most `max_len`,
    /// in chronological order. The final chunk may be shorter.
    #[must_use]
    pub const fn chunks(self, max_len: Duration) -> Chunks {
        Chunks {
            cursor: self.start,
            end: self.end,
            max_len,
        }
    }
}

/// Iterator over the ≤`max_len` slices of a [`TimeWindow`].
#[derive(Debug, Clone)]
pub struct Chunks {
    cursor: DateTime<Utc>,
    end: DateTime<Utc>,
    max_len: Duration,
}

impl Iterator for Chunks {
    type Item = TimeWindow;

    fn next(&mut self) -> Option<TimeWindow> {
        if self.cursor >= self.end {
            return None;
        }
        let chunk_end = (self.cursor + self.max_len).min(self.end);
        let chunk = TimeWindow::new(self.cursor, chunk_end);
        self.cursor = chunk_end;
        Some(chunk)
    }
}
