use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use reqwest::{
    Client, StatusCode,
    header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    config::DEFAULT_RECENCY_WINDOW_SECS,
    error::{StatusError, truncate_body},
    model::{StatusUpdateRequest, StatusUpdateResult},
    shutdown::Shutdown,
};

use super::{StatusPublisher, ensure_recent};

pub const CHANGE_USER_STATUS: &str = r#"
mutation ($status: ChangeUserStatusInput!) {
  changeUserStatus(input: $status) {
    status {
      id
      updatedAt
      expiresAt
    }
  }
}
"#;

const AGENT: &str = concat!("weather-status/", env!("CARGO_PKG_VERSION"));

/// Client for GitHub's GraphQL `changeUserStatus` mutation.
#[derive(Debug, Clone)]
pub struct GithubStatusClient {
    api_url: String,
    token: String,
    http: Client,
    recency_window: Option<TimeDelta>,
    log_protocol: bool,
}

#[derive(Debug, Serialize)]
struct GraphqlRequest<'a, V> {
    query: &'a str,
    variables: V,
}

#[derive(Debug, Serialize)]
struct ChangeUserStatusVars<'a> {
    status: &'a StatusUpdateRequest,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlErrorMessage>,
}

#[derive(Debug, Deserialize)]
struct GraphqlErrorMessage {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangeUserStatusData {
    change_user_status: Option<ChangeUserStatusPayload>,
}

#[derive(Debug, Deserialize)]
struct ChangeUserStatusPayload {
    status: Option<StatusUpdateResult>,
}

impl GithubStatusClient {
    pub fn new(http: Client, api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            token: token.into(),
            http,
            recency_window: Some(TimeDelta::seconds(DEFAULT_RECENCY_WINDOW_SECS as i64)),
            log_protocol: false,
        }
    }

    /// `None` trusts every acknowledgement regardless of its age.
    pub fn with_recency_window(mut self, window: Option<TimeDelta>) -> Self {
        self.recency_window = window;
        self
    }

    /// Log raw request and response bodies on the `protocol` target.
    pub fn with_protocol_log(mut self, enabled: bool) -> Self {
        self.log_protocol = enabled;
        self
    }

    async fn send(&self, input: &StatusUpdateRequest) -> Result<StatusUpdateResult, StatusError> {
        let payload = serde_json::to_vec(&GraphqlRequest {
            query: CHANGE_USER_STATUS,
            variables: ChangeUserStatusVars { status: input },
        })
        .map_err(StatusError::Encode)?;

        if self.log_protocol {
            debug!(target: "protocol", ">> POST {} {}", self.api_url, String::from_utf8_lossy(&payload));
        }

        let mut req = self
            .http
            .post(&self.api_url)
            .header(USER_AGENT, AGENT)
            .header(CONTENT_TYPE, "application/json")
            .body(payload);
        if !self.token.is_empty() {
            req = req.header(AUTHORIZATION, format!("bearer {}", self.token));
        }

        let res = req.send().await.map_err(StatusError::Transport)?;
        let status = res.status();
        let body = res.text().await.map_err(StatusError::Transport)?;

        if self.log_protocol {
            debug!(target: "protocol", "<< {status} {body}");
        }

        check_response(status, &body, Utc::now(), self.recency_window)
    }
}

/// Turn a raw mutation response into the acknowledged status: HTTP status
/// first, then the GraphQL envelope, then the recency window at `now`.
pub fn check_response(
    status: StatusCode,
    body: &str,
    now: DateTime<Utc>,
    recency_window: Option<TimeDelta>,
) -> Result<StatusUpdateResult, StatusError> {
    if !status.is_success() {
        return Err(StatusError::Http {
            status,
            body: truncate_body(body),
        });
    }

    let result = parse_change_user_status(body)?;
    ensure_recent(&result, now, recency_window)?;

    Ok(result)
}

/// Unwrap `data.changeUserStatus.status` from a GraphQL response body.
pub fn parse_change_user_status(body: &str) -> Result<StatusUpdateResult, StatusError> {
    let parsed: GraphqlResponse<ChangeUserStatusData> =
        serde_json::from_str(body).map_err(StatusError::Decode)?;

    if !parsed.errors.is_empty() {
        return Err(StatusError::Graphql(
            parsed.errors.into_iter().map(|e| e.message).collect(),
        ));
    }

    parsed
        .data
        .and_then(|data| data.change_user_status)
        .and_then(|payload| payload.status)
        .ok_or(StatusError::Empty)
}

#[async_trait]
impl StatusPublisher for GithubStatusClient {
    #[instrument(skip_all, fields(emoji = %request.emoji, message = %request.message))]
    async fn update_status(
        &self,
        request: &StatusUpdateRequest,
        shutdown: &Shutdown,
    ) -> Result<StatusUpdateResult, StatusError> {
        shutdown.guard(self.send(request), StatusError::Cancelled).await
    }
}
