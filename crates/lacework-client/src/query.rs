//! Saved LQL query execution.

use serde::Serialize;
use serde_json::Value;
use typed_builder::TypedBuilder;

use lacework_common::{QueryArgument, normalize_utc_timestamp};

use crate::client::{LaceworkClient, SEARCH_TIMEOUT};
use crate::error::ClientError;

/// Argument names the time bounds are injected under.
const START_ARGUMENT: &str = "StartTimeRange";
const END_ARGUMENT: &str = "EndTimeRange";

/// A saved-query invocation.
///
/// `start_time`/`end_time` accept the full UTC instant form or a bare
/// calendar date, which is coerced to midnight UTC before injection.
/// `args` entries lacking a `name` or `value` are dropped, not rejected.
#[derive(Debug, Clone, TypedBuilder)]
pub struct QueryRequest {
    /// Saved query identifier. Must not be empty.
    #[builder(setter(into))]
    pub query_id: String,
    /// Optional window start, injected as `StartTimeRange`.
    #[builder(default, setter(strip_option, into))]
    pub start_time: Option<String>,
    /// Optional window end, injected as `EndTimeRange`.
    #[builder(default, setter(strip_option, into))]
    pub end_time: Option<String>,
    /// Extra arguments as caller-supplied `{name, value}` objects.
    #[builder(default)]
    pub args: Vec<Value>,
}

#[derive(Serialize)]
struct ExecuteBody<'a> {
    arguments: &'a [QueryArgument],
}

impl LaceworkClient {
    /// Executes a saved query by id.
    ///
    /// Returns the raw response body verbatim. Time bounds, when supplied,
    /// overwrite any same-named entry in `args` (last write wins).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] for an empty `query_id` before
    /// any network call; otherwise token and HTTP errors propagate.
    pub async fn run_query(&self, request: &QueryRequest) -> Result<Value, ClientError> {
        if request.query_id.is_empty() {
            return Err(ClientError::Validation("query_id is required".to_owned()));
        }

        let mut arguments = QueryArgument::collect_lenient(&request.args);
        if let Some(start) = &request.start_time {
            QueryArgument::replace_named(
                &mut arguments,
                START_ARGUMENT,
                normalize_utc_timestamp(start),
            );
        }
        if let Some(end) = &request.end_time {
            QueryArgument::replace_named(
                &mut arguments,
                END_ARGUMENT,
                normalize_utc_timestamp(end),
            );
        }

        let token = self.fetch_token().await?;
        let path = format!("/Queries/{}/execute", request.query_id);
        self.post_json(
            &token,
            &path,
            &ExecuteBody {
                arguments: &arguments,
            },
            SEARCH_TIMEOUT,
        )
        .await
    }
}
