use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, warn};

use harvest_common::{HarvestError, PageRequest, ScrapeRequest};

use crate::AppState;

// --- Request bodies ---

/// `POST /api/scrape` body. Older clients send the aliased field names.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeBody {
    #[serde(default, alias = "fbUrls")]
    urls: Option<UrlList>,
    #[serde(default, alias = "facebookUrl")]
    fb_url: Option<String>,
    #[serde(default, alias = "limitComments", alias = "maxComments")]
    limit: Option<Value>,
    #[serde(default, alias = "apiToken", alias = "token", alias = "credential")]
    apify_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UrlList {
    One(String),
    Many(Vec<String>),
}

impl ScrapeBody {
    fn into_request(self) -> Result<ScrapeRequest, HarvestError> {
        let mut urls = match self.urls {
            Some(UrlList::One(url)) => vec![url],
            Some(UrlList::Many(urls)) => urls,
            None => Vec::new(),
        };
        urls.extend(self.fb_url);

        Ok(ScrapeRequest {
            urls,
            limit: parse_limit(self.limit.as_ref())?,
            credential: self.apify_token,
        })
    }
}

/// Accept integers, integral floats and numeric strings. Blank means unset.
fn parse_limit(value: Option<&Value>) -> Result<Option<i64>, HarvestError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let parsed = match value {
        Value::Null => return Ok(None),
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        _ => None,
    };
    parsed.map(Some).ok_or_else(|| {
        HarvestError::Configuration(format!("limit must be an integer, got {value}"))
    })
}

#[derive(Debug, Deserialize)]
pub struct CommentsQuery {
    limit: Option<String>,
    page: Option<String>,
}

impl CommentsQuery {
    /// Unparseable values fall back to the defaults, like missing ones.
    fn page_request(&self) -> PageRequest {
        let parse = |v: &Option<String>| v.as_deref().and_then(|s| s.trim().parse::<i64>().ok());
        PageRequest::new(parse(&self.page), parse(&self.limit))
    }
}

// --- Errors ---

/// HarvestError as an HTTP response: `{ok: false, error, kind, upstreamStatus?}`.
pub struct ApiError(pub HarvestError);

impl From<HarvestError> for ApiError {
    fn from(err: HarvestError) -> Self {
        Self(err)
    }
}

pub fn status_for(err: &HarvestError) -> StatusCode {
    match err {
        HarvestError::Configuration(_) => StatusCode::BAD_REQUEST,
        HarvestError::UpstreamSubmission { .. }
        | HarvestError::UpstreamPoll { .. }
        | HarvestError::UpstreamRunFailed { .. }
        | HarvestError::UpstreamFetch { .. } => StatusCode::BAD_GATEWAY,
        HarvestError::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        HarvestError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = status_for(&err);
        if status.is_server_error() {
            error!(kind = err.kind(), error = %err, "Request failed");
        } else {
            warn!(kind = err.kind(), error = %err, "Request rejected");
        }

        let mut body = json!({
            "ok": false,
            "error": err.to_string(),
            "kind": err.kind(),
        });
        if let Some(upstream) = err.upstream_status() {
            body["upstreamStatus"] = json!(upstream);
        }
        (status, Json(body)).into_response()
    }
}

// --- Handlers ---

pub async fn api_scrape(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ScrapeBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body.map_err(|rejection| {
        HarvestError::Configuration(format!("invalid request body: {}", rejection.body_text()))
    })?;
    let summary = state.orchestrator.run_scrape(body.into_request()?).await?;

    Ok(Json(json!({
        "ok": true,
        "runId": summary.run_id,
        "datasetId": summary.dataset_id,
        "imported": summary.imported,
    })))
}

pub async fn api_comments(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CommentsQuery>,
) -> Result<Json<Value>, ApiError> {
    let items = state.reader.list_comments(params.page_request()).await?;
    Ok(Json(json!({ "ok": true, "items": items })))
}

pub async fn api_run_comments(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let items = state.reader.comments_for_run(&run_id).await?;
    Ok(Json(json!({ "ok": true, "items": items })))
}
