//! Compliance evaluation search: chunked, cursor-paginated, limit-bounded.
//!
//! The search endpoint caps the usable time span per request at seven days,
//! so a long window is partitioned into chronological ≤7-day chunks. Within
//! a chunk, results page through an opaque cursor; cursors are meaningless
//! across chunk boundaries, so pagination state never leaks between chunks.
//! Rows accumulate across chunks up to the caller's limit and the final
//! list is truncated to exactly that limit.

use chrono::Duration;
use log::debug;
use serde::Serialize;
use serde_json::Value;
use typed_builder::TypedBuilder;

use lacework_common::{FieldFilter, TimeWindow, UTC_INSTANT_FORMAT, format_utc_instant};

use crate::client::{LaceworkClient, SEARCH_TIMEOUT};
use crate::error::ClientError;
use crate::token::AccessToken;

/// Default overall row limit.
pub const DEFAULT_COMPLIANCE_LIMIT: usize = 1000;

/// Upstream cap on rows per page.
pub const MAX_PAGE_SIZE: usize = 5000;

/// Upstream cap on the time span of one search request, in days.
const MAX_CHUNK_DAYS: i64 = 7;

const SEARCH_PATH: &str = "/Configs/ComplianceEvaluations/search";

const DATASET: &str = "AwsCompliance";

/// Projection used when the caller does not ask for specific fields.
const DEFAULT_RETURNS: [&str; 5] = ["account", "id", "recommendation", "severity", "status"];

/// Cursor field names probed in order; the first present wins. Inferred
/// from observed responses; the upstream docs do not pin the name.
const CURSOR_FIELDS: [&str; 3] = ["nextPage", "nextToken", "cursor"];

/// An AWS compliance evaluation search.
///
/// Time bounds, when supplied, must already be in the full UTC instant form
/// (`YYYY-MM-DDTHH:MM:SSZ`); bare dates are rejected here, unlike the
/// saved-query executor, which coerces them. That asymmetry matches the
/// upstream surface and is kept deliberately.
#[derive(Debug, Clone, TypedBuilder)]
pub struct ComplianceSearch {
    /// Optional window start; defaults to `end_time` minus seven days.
    #[builder(default, setter(strip_option, into))]
    pub start_time: Option<String>,
    /// Optional window end; defaults to now.
    #[builder(default, setter(strip_option, into))]
    pub end_time: Option<String>,
    /// Status values to filter on, e.g. `NonCompliant`.
    #[builder(default)]
    pub statuses: Vec<String>,
    /// AWS account ids to filter on.
    #[builder(default)]
    pub account_ids: Vec<String>,
    /// Fields to return; defaults to a fixed five-field projection.
    #[builder(default, setter(strip_option))]
    pub returns: Option<Vec<String>>,
    /// Overall row limit across all chunks and pages.
    #[builder(default = DEFAULT_COMPLIANCE_LIMIT)]
    pub limit: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchBody<'a> {
    time_filter: TimeFilter,
    dataset: &'static str,
    filters: &'a [FieldFilter],
    returns: &'a [String],
    paging: Paging<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TimeFilter {
    start_time: String,
    end_time: String,
}

#[derive(Serialize)]
struct Paging<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    cursor: Option<&'a str>,
    limit: usize,
}

/// Rows of one page; a missing or non-array `data` field reads as empty.
fn page_data(response: &Value) -> Vec<Value> {
    response
        .get("data")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// The next-page cursor, if the response names one.
fn next_cursor(response: &Value) -> Option<String> {
    let paging = response.get("paging")?;
    CURSOR_FIELDS
        .iter()
        .find_map(|field| paging.get(field).and_then(Value::as_str))
        .map(str::to_owned)
}

impl LaceworkClient {
    /// Searches AWS compliance evaluations over the requested window.
    ///
    /// Returns `{"data": [...]}` with at most `limit` rows, earliest chunk
    /// first. The first token, HTTP, or transport error aborts the whole
    /// search; rows from already-completed chunks are discarded, so callers
    /// retry the search as a whole.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] for time bounds not in the full
    /// instant form; otherwise token and HTTP errors propagate.
    pub async fn search_compliance(
        &self,
        request: &ComplianceSearch,
    ) -> Result<Value, ClientError> {
        let window = TimeWindow::resolve(
            request.start_time.as_deref(),
            request.end_time.as_deref(),
        )
        .map_err(|e| {
            ClientError::Validation(format!(
                "invalid time bound: {e} (expected {UTC_INSTANT_FORMAT})"
            ))
        })?;

        let mut filters = Vec::new();
        if let Some(filter) = FieldFilter::for_field("status", &request.statuses) {
            filters.push(filter);
        }
        if let Some(filter) = FieldFilter::for_field("account.AccountId", &request.account_ids) {
            filters.push(filter);
        }
        let returns = request.returns.clone().unwrap_or_else(|| {
            DEFAULT_RETURNS.iter().map(|&field| field.to_owned()).collect()
        });

        let token = self.fetch_token().await?;

        let mut rows: Vec<Value> = Vec::new();
        for chunk in window.chunks(Duration::days(MAX_CHUNK_DAYS)) {
            if rows.len() >= request.limit {
                break;
            }
            let budget = (request.limit - rows.len()).min(MAX_PAGE_SIZE);
            let chunk_rows = self
                .fetch_chunk(&token, chunk, &filters, &returns, budget)
                .await?;
            debug!(
                "chunk {} .. {} yielded {} rows",
                format_utc_instant(chunk.start),
                format_utc_instant(chunk.end),
                chunk_rows.len()
            );
            rows.extend(chunk_rows);
        }
        rows.truncate(request.limit);

        Ok(serde_json::json!({ "data": rows }))
    }

    /// Fetches one ≤7-day chunk, following its pagination cursor until the
    /// cursor disappears or `budget` rows have been collected.
    async fn fetch_chunk(
        &self,
        token: &AccessToken,
        chunk: TimeWindow,
        filters: &[FieldFilter],
        returns: &[String],
        budget: usize,
    ) -> Result<Vec<Value>, ClientError> {
        let time_filter = || TimeFilter {
            start_time: format_utc_instant(chunk.start),
            end_time: format_utc_instant(chunk.end),
        };

        let first = self
            .post_json(
                token,
                SEARCH_PATH,
                &SearchBody {
                    time_filter: time_filter(),
                    dataset: DATASET,
                    filters,
                    returns,
                    paging: Paging {
                        cursor: None,
                        limit: budget,
                    },
                },
                SEARCH_TIMEOUT,
            )
            .await?;

        let mut rows = page_data(&first);
        let mut cursor = next_cursor(&first);

        while let Some(current) = cursor {
            if rows.len() >= budget {
                break;
            }
            let next = self
                .post_json(
                    token,
                    SEARCH_PATH,
                    &SearchBody {
                        time_filter: time_filter(),
                        dataset: DATASET,
                        filters,
                        returns,
                        paging: Paging {
                            cursor: Some(&current),
                            limit: (budget - rows.len()).min(MAX_PAGE_SIZE),
                        },
                    },
                    SEARCH_TIMEOUT,
                )
                .await?;
            rows.extend(page_data(&next));
            cursor = next_cursor(&next);
        }

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::panic)]

    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    use lacework_common::Credentials;

    use super::*;

    fn client_for(mock_server: &MockServer) -> LaceworkClient {
        let credentials = Credentials::new("partner-demo", "PARTNER_123", "_abc123");
        LaceworkClient::with_base_url(credentials, mock_server.uri()).unwrap()
    }

    async fn mount_token(mock_server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/access/tokens"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "tok"})))
            .mount(mock_server)
            .await;
    }

    fn request_body(request: &Request) -> Value {
        serde_json::from_slice(&request.body).unwrap()
    }

    /// The search request bodies the server saw, in order.
    async fn search_bodies(mock_server: &MockServer) -> Vec<Value> {
        mock_server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.url.path() == SEARCH_PATH)
            .map(request_body)
            .collect()
    }

    #[test]
    fn test_cursor_probe_order() {
        let both = json!({"paging": {"cursor": "low", "nextPage": "high"}});
        assert_eq!(next_cursor(&both).as_deref(), Some("high"));

        let middle = json!({"paging": {"nextToken": "mid", "cursor": "low"}});
        assert_eq!(next_cursor(&middle).as_deref(), Some("mid"));

        let none = json!({"paging": {"totalRows": 12}});
        assert_eq!(next_cursor(&none), None);

        let no_paging = json!({"data": []});
        assert_eq!(next_cursor(&no_paging), None);
    }

    #[test]
    fn test_page_data_tolerates_missing_field() {
        assert!(page_data(&json!({})).is_empty());
        assert!(page_data(&json!({"data": null})).is_empty());
        assert_eq!(page_data(&json!({"data": [1, 2]})).len(), 2);
    }

    #[tokio::test]
    async fn test_bare_date_bound_is_rejected_before_any_network_call() {
        let mock_server = MockServer::start().await;
        let client = client_for(&mock_server);

        let request = ComplianceSearch::builder().start_time("2024-01-01").build();
        let err = client.search_compliance(&request).await.unwrap_err();

        assert!(matches!(err, ClientError::Validation(_)));
        assert!(mock_server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_single_chunk_body_shape() {
        let mock_server = MockServer::start().await;
        mount_token(&mock_server).await;

        Mock::given(method("POST"))
            .and(path(SEARCH_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .mount(&mock_server)
            .await;

        let request = ComplianceSearch::builder()
            .start_time("2024-05-01T00:00:00Z")
            .end_time("2024-05-03T00:00:00Z")
            .statuses(vec!["NonCompliant".to_owned()])
            .account_ids(vec!["111111111111".to_owned(), "222222222222".to_owned()])
            .build();
        let body = client_for(&mock_server)
            .search_compliance(&request)
            .await
            .unwrap();

        assert_eq!(body, json!({"data": []}));

        let bodies = search_bodies(&mock_server).await;
        assert_eq!(bodies.len(), 1);
        assert_eq!(
            bodies[0],
            json!({
                "timeFilter": {
                    "startTime": "2024-05-01T00:00:00Z",
                    "endTime": "2024-05-03T00:00:00Z"
                },
                "dataset": "AwsCompliance",
                "filters": [
                    {"field": "status", "expression": "eq", "value": "NonCompliant"},
                    {
                        "field": "account.AccountId",
                        "expression": "in",
                        "values": ["111111111111", "222222222222"]
                    }
                ],
                "returns": ["account", "id", "recommendation", "severity", "status"],
                "paging": {"limit": 1000}
            })
        );
    }

    /// Answers every search with 3000 rows tagged by the chunk's start
    /// instant and no cursor.
    struct ThreeThousandPerChunk;

    impl Respond for ThreeThousandPerChunk {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            let body = request_body(request);
            let chunk = body["timeFilter"]["startTime"].as_str().unwrap().to_owned();
            let rows: Vec<Value> = (0..3000).map(|i| json!({"chunk": chunk, "row": i})).collect();
            ResponseTemplate::new(200).set_body_json(json!({"data": rows, "paging": {}}))
        }
    }

    #[tokio::test]
    async fn test_twenty_day_window_fills_limit_from_first_two_chunks() {
        let mock_server = MockServer::start().await;
        mount_token(&mock_server).await;

        Mock::given(method("POST"))
            .and(path(SEARCH_PATH))
            .respond_with(ThreeThousandPerChunk)
            .mount(&mock_server)
            .await;

        let request = ComplianceSearch::builder()
            .start_time("2024-01-01T00:00:00Z")
            .end_time("2024-01-21T00:00:00Z")
            .limit(5000)
            .build();
        let body = client_for(&mock_server)
            .search_compliance(&request)
            .await
            .unwrap();

        let rows = body["data"].as_array().unwrap();
        assert_eq!(rows.len(), 5000);

        // First two chunks only, in chronological order: 3000 rows from the
        // first, 2000 from the second after truncation.
        for row in &rows[..3000] {
            assert_eq!(row["chunk"], "2024-01-01T00:00:00Z");
        }
        for row in &rows[3000..] {
            assert_eq!(row["chunk"], "2024-01-08T00:00:00Z");
        }

        let bodies = search_bodies(&mock_server).await;
        assert_eq!(bodies.len(), 2);
        assert_eq!(bodies[0]["paging"]["limit"], 5000);
        // Second chunk's budget shrinks to what the limit still allows.
        assert_eq!(bodies[1]["paging"]["limit"], 2000);
    }

    /// Three pages within one chunk, linked by varying cursor field names.
    struct PagedChunk;

    impl Respond for PagedChunk {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            let body = request_body(request);
            let page = match body["paging"]["cursor"].as_str() {
                None => 1,
                Some("page-2") => 2,
                Some("page-3") => 3,
                Some(other) => panic!("unexpected cursor {other}"),
            };
            let rows: Vec<Value> = (0..2000).map(|i| json!({"page": page, "row": i})).collect();
            let paging = match page {
                1 => json!({"nextToken": "page-2"}),
                2 => json!({"cursor": "page-3"}),
                _ => json!({}),
            };
            ResponseTemplate::new(200).set_body_json(json!({"data": rows, "paging": paging}))
        }
    }

    #[tokio::test]
    async fn test_cursor_following_accumulates_pages_within_a_chunk() {
        let mock_server = MockServer::start().await;
        mount_token(&mock_server).await;

        Mock::given(method("POST"))
            .and(path(SEARCH_PATH))
            .respond_with(PagedChunk)
            .mount(&mock_server)
            .await;

        let request = ComplianceSearch::builder()
            .start_time("2024-05-01T00:00:00Z")
            .end_time("2024-05-02T00:00:00Z")
            .limit(9000)
            .build();
        let body = client_for(&mock_server)
            .search_compliance(&request)
            .await
            .unwrap();

        let rows = body["data"].as_array().unwrap();
        assert_eq!(rows.len(), 6000);
        assert_eq!(rows[0]["page"], 1);
        assert_eq!(rows[2000]["page"], 2);
        assert_eq!(rows[4000]["page"], 3);

        let bodies = search_bodies(&mock_server).await;
        assert_eq!(bodies.len(), 3);
        // Page budgets shrink as rows accumulate toward the chunk budget.
        assert_eq!(bodies[0]["paging"], json!({"limit": 5000}));
        assert_eq!(bodies[1]["paging"], json!({"cursor": "page-2", "limit": 3000}));
        assert_eq!(bodies[2]["paging"], json!({"cursor": "page-3", "limit": 1000}));
    }

    /// Always hands back another cursor; pagination must stop on budget.
    struct EndlessCursor;

    impl Respond for EndlessCursor {
        fn respond(&self, _request: &Request) -> ResponseTemplate {
            let rows: Vec<Value> = (0..2500).map(|i| json!({"row": i})).collect();
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": rows, "paging": {"nextPage": "again"}}))
        }
    }

    #[tokio::test]
    async fn test_pagination_stops_when_budget_is_spent() {
        let mock_server = MockServer::start().await;
        mount_token(&mock_server).await;

        Mock::given(method("POST"))
            .and(path(SEARCH_PATH))
            .respond_with(EndlessCursor)
            .mount(&mock_server)
            .await;

        let request = ComplianceSearch::builder()
            .start_time("2024-05-01T00:00:00Z")
            .end_time("2024-05-02T00:00:00Z")
            .limit(5000)
            .build();
        let body = client_for(&mock_server)
            .search_compliance(&request)
            .await
            .unwrap();

        assert_eq!(body["data"].as_array().unwrap().len(), 5000);
        assert_eq!(search_bodies(&mock_server).await.len(), 2);
    }

    /// First chunk succeeds, every later one fails.
    struct SecondChunkFails;

    impl Respond for SecondChunkFails {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            let body = request_body(request);
            if body["timeFilter"]["startTime"] == "2024-01-01T00:00:00Z" {
                let rows: Vec<Value> = (0..100).map(|i| json!({"row": i})).collect();
                ResponseTemplate::new(200).set_body_json(json!({"data": rows, "paging": {}}))
            } else {
                ResponseTemplate::new(500).set_body_string("search backend unavailable")
            }
        }
    }

    #[tokio::test]
    async fn test_mid_search_error_discards_partial_results() {
        let mock_server = MockServer::start().await;
        mount_token(&mock_server).await;

        Mock::given(method("POST"))
            .and(path(SEARCH_PATH))
            .respond_with(SecondChunkFails)
            .mount(&mock_server)
            .await;

        let request = ComplianceSearch::builder()
            .start_time("2024-01-01T00:00:00Z")
            .end_time("2024-01-21T00:00:00Z")
            .build();
        let err = client_for(&mock_server)
            .search_compliance(&request)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "HTTP 500");
        assert_eq!(err.details(), Some("search backend unavailable"));
    }

    #[tokio::test]
    async fn test_custom_returns_and_small_limit() {
        let mock_server = MockServer::start().await;
        mount_token(&mock_server).await;

        Mock::given(method("POST"))
            .and(path(SEARCH_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": 1}, {"id": 2}, {"id": 3}],
                "paging": {}
            })))
            .mount(&mock_server)
            .await;

        let request = ComplianceSearch::builder()
            .start_time("2024-05-01T00:00:00Z")
            .end_time("2024-05-02T00:00:00Z")
            .returns(vec!["id".to_owned()])
            .limit(2)
            .build();
        let body = client_for(&mock_server)
            .search_compliance(&request)
            .await
            .unwrap();

        // Over-delivering pages still truncate to the exact limit.
        assert_eq!(body["data"], json!([{"id": 1}, {"id": 2}]));

        let bodies = search_bodies(&mock_server).await;
        assert_eq!(bodies[0]["returns"], json!(["id"]));
        assert_eq!(bodies[0]["paging"]["limit"], 2);
    }

    #[tokio::test]
    async fn test_token_failure_aborts_before_any_search_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/access/tokens"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&mock_server)
            .await;

        let request = ComplianceSearch::builder()
            .start_time("2024-05-01T00:00:00Z")
            .end_time("2024-05-02T00:00:00Z")
            .build();
        let err = client_for(&mock_server)
            .search_compliance(&request)
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Auth(_)));
        assert!(search_bodies(&mock_server).await.is_empty());
    }
}
