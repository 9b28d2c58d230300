//! HTTP routes for the banlist API
//!
//! Requests are classified by path prefix and method into an [`Endpoint`],
//! so `/api/block?x=1` and `/api/blocked` both reach the block handler.

use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header, HeaderValue, Method, Uri},
    response::{IntoResponse, Json, Response},
    Router,
};
use serde::Serialize;
use serde_json::{json, Number, Value};
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use banwatch_core::now_iso8601;

use crate::error::ApiError;
use crate::metrics;
use crate::state::AppState;

type ApiResult<T> = std::result::Result<T, ApiError>;

/// Health check response
#[derive(Serialize)]
pub struct StatusResponse {
    pub ok: bool,
    pub now: String,
    #[serde(rename = "remoteConfigured")]
    pub remote_configured: bool,
}

/// Current banlist
#[derive(Serialize)]
pub struct BanlistResponse {
    pub banlist: Vec<String>,
}

/// Result of a block or unblock
#[derive(Serialize)]
pub struct MutationResponse {
    pub ok: bool,
    pub banlist: Vec<String>,
}

/// Result of a membership check
#[derive(Serialize)]
pub struct CheckResponse {
    pub blocked: bool,
}

/// Plain acknowledgement
#[derive(Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

const GET_ROUTES: &[(&str, Endpoint)] = &[
    ("/api/status", Endpoint::Status),
    ("/api/stats", Endpoint::Stats),
    ("/api/banlist", Endpoint::Banlist),
];

const POST_ROUTES: &[(&str, Endpoint)] = &[
    ("/api/block", Endpoint::Block),
    ("/api/unblock", Endpoint::Unblock),
    ("/api/check", Endpoint::Check),
    ("/api/log", Endpoint::Log),
];

/// Dispatch target for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Preflight,
    Status,
    Stats,
    Banlist,
    Block,
    Unblock,
    Check,
    Log,
    Save,
    Unknown,
}

impl Endpoint {
    /// Classify a request by method and path prefix
    pub fn classify(method: &Method, path: &str) -> Self {
        if method == Method::OPTIONS {
            return Endpoint::Preflight;
        }
        // Save answers every method itself so it can return 405
        if path.starts_with("/api/save") {
            return Endpoint::Save;
        }

        let routes: &[(&str, Endpoint)] = if method == Method::GET {
            GET_ROUTES
        } else if method == Method::POST {
            POST_ROUTES
        } else {
            &[]
        };

        routes
            .iter()
            .find(|(prefix, _)| path.starts_with(prefix))
            .map(|(_, endpoint)| *endpoint)
            .unwrap_or(Endpoint::Unknown)
    }

    /// Metrics label
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Preflight => "preflight",
            Endpoint::Status => "status",
            Endpoint::Stats => "stats",
            Endpoint::Banlist => "banlist",
            Endpoint::Block => "block",
            Endpoint::Unblock => "unblock",
            Endpoint::Check => "check",
            Endpoint::Log => "log",
            Endpoint::Save => "save",
            Endpoint::Unknown => "unknown",
        }
    }
}

/// Log request body: a text field when one is present, otherwise the raw JSON
#[derive(Debug, Clone, PartialEq)]
pub enum LogBody {
    Text(String),
    Opaque(Value),
}

impl LogBody {
    pub fn from_value(value: Value) -> Self {
        let text = ["txt", "text"]
            .iter()
            .find_map(|field| value.get(field).and_then(scalar_text));

        match text {
            Some(text) => LogBody::Text(text),
            None => LogBody::Opaque(value),
        }
    }

    /// Text stored in the log; opaque bodies become compact JSON
    pub fn into_text(self) -> String {
        match self {
            LogBody::Text(text) => text,
            LogBody::Opaque(value) => value.to_string(),
        }
    }
}

/// Stringify a truthy scalar. Empty strings, zero, false, null and
/// containers yield `None`.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(number_text(n)),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

/// Integral floats print without a fraction, so `1e2` and `100.0` read `100`
fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{:.0}", f),
        _ => n.to_string(),
    }
}

/// Parse a request body as JSON; an empty body is `{}`
fn parse_body(body: &[u8]) -> ApiResult<Value> {
    if body.is_empty() {
        return Ok(json!({}));
    }
    Ok(serde_json::from_slice(body)?)
}

fn require_ip(body: &Value) -> ApiResult<String> {
    body.get("ip")
        .and_then(scalar_text)
        .ok_or(ApiError::MissingField("ip"))
}

/// Interpret a remote insert body: JSON if it parses, else raw text
fn remote_result(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

async fn status(state: &AppState) -> ApiResult<Response> {
    Ok(Json(StatusResponse {
        ok: true,
        now: now_iso8601(),
        remote_configured: state.remote_configured(),
    })
    .into_response())
}

async fn stats(state: &AppState) -> ApiResult<Response> {
    let snapshot = state.store.read().await.snapshot();
    Ok(Json(snapshot).into_response())
}

async fn banlist(state: &AppState) -> ApiResult<Response> {
    let banlist = state.store.read().await.banlist().to_vec();
    Ok(Json(BanlistResponse { banlist }).into_response())
}

async fn block(state: &AppState, body: &[u8]) -> ApiResult<Response> {
    let body = parse_body(body)?;
    let ip = require_ip(&body)?;

    let (added, banlist) = {
        let mut store = state.store.write().await;
        let added = store.add_to_banlist(&ip);
        if added {
            store.append_log(format!("blocked {}", ip));
        }
        metrics::set_banlist_size(store.banlist().len());
        (added, store.banlist().to_vec())
    };
    tracing::info!(%ip, added, "Block request");

    // Detached; failures land in the log buffer
    if state.spawn_ban_mirror(&ip).is_some() {
        tracing::debug!(%ip, "Ban mirror scheduled");
    }

    Ok(Json(MutationResponse { ok: true, banlist }).into_response())
}

async fn unblock(state: &AppState, body: &[u8]) -> ApiResult<Response> {
    let body = parse_body(body)?;
    let ip = require_ip(&body)?;

    let (removed, banlist) = {
        let mut store = state.store.write().await;
        let removed = store.remove_from_banlist(&ip);
        store.append_log(format!("unblocked {}", ip));
        metrics::set_banlist_size(store.banlist().len());
        (removed, store.banlist().to_vec())
    };
    tracing::info!(%ip, removed, "Unblock request");

    Ok(Json(MutationResponse { ok: true, banlist }).into_response())
}

async fn check(state: &AppState, body: &[u8]) -> ApiResult<Response> {
    let body = parse_body(body)?;
    let ip = require_ip(&body)?;

    let blocked = state.store.write().await.check(&ip);
    metrics::record_check(blocked);
    tracing::debug!(%ip, blocked, "Check request");

    Ok(Json(CheckResponse { blocked }).into_response())
}

async fn log(state: &AppState, body: &[u8]) -> ApiResult<Response> {
    let text = LogBody::from_value(parse_body(body)?).into_text();
    state.store.write().await.append_log(text);
    Ok(Json(OkResponse { ok: true }).into_response())
}

async fn save(state: &AppState, method: &Method, body: &[u8]) -> ApiResult<Response> {
    if method != Method::POST {
        return Err(ApiError::MethodNotAllowed);
    }
    let payload = parse_body(body).map_err(|e| ApiError::SaveFailed(e.to_string()))?;

    let Some(mirror) = &state.mirror else {
        return Ok(Json(json!({
            "message": "no remote configured",
            "payload": payload,
        }))
        .into_response());
    };

    let result = mirror.insert(&state.snapshot_collection, &payload).await;
    let outcome = if result.is_ok() {
        metrics::OUTCOME_OK
    } else {
        metrics::OUTCOME_REMOTE_ERROR
    };
    metrics::record_mirror(metrics::KIND_SNAPSHOT, outcome);

    let body = result.map_err(|e| {
        tracing::warn!(error = %e, "Snapshot save failed");
        ApiError::from(e)
    })?;

    Ok(Json(json!({
        "message": "saved",
        "result": remote_result(&body),
    }))
    .into_response())
}

/// Single entry point: classify, run, record
async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let start = Instant::now();
    let endpoint = Endpoint::classify(&method, uri.path());

    let result = match body {
        Err(rejection) => Err(ApiError::BodyRead(rejection.body_text())),
        Ok(body) => match endpoint {
            Endpoint::Preflight => Ok(Json(OkResponse { ok: true }).into_response()),
            Endpoint::Status => status(&state).await,
            Endpoint::Stats => stats(&state).await,
            Endpoint::Banlist => banlist(&state).await,
            Endpoint::Block => block(&state, &body).await,
            Endpoint::Unblock => unblock(&state, &body).await,
            Endpoint::Check => check(&state, &body).await,
            Endpoint::Log => log(&state, &body).await,
            Endpoint::Save => save(&state, &method, &body).await,
            Endpoint::Unknown => Err(ApiError::UnknownEndpoint),
        },
    };

    let response = match result {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!(endpoint = endpoint.name(), %method, path = uri.path(), error = %e, "Request failed");
            e.into_response()
        }
    };

    metrics::record_request(
        endpoint.name(),
        metrics::outcome_for(response.status().as_u16()),
        start.elapsed(),
    );
    response
}

/// Create the router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .fallback(dispatch)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_prefix_and_method() {
        assert_eq!(Endpoint::classify(&Method::GET, "/api/status"), Endpoint::Status);
        assert_eq!(Endpoint::classify(&Method::GET, "/api/stats"), Endpoint::Stats);
        assert_eq!(Endpoint::classify(&Method::GET, "/api/banlist"), Endpoint::Banlist);
        assert_eq!(Endpoint::classify(&Method::POST, "/api/block"), Endpoint::Block);
        assert_eq!(Endpoint::classify(&Method::POST, "/api/unblock"), Endpoint::Unblock);
        assert_eq!(Endpoint::classify(&Method::POST, "/api/check"), Endpoint::Check);
        assert_eq!(Endpoint::classify(&Method::POST, "/api/log"), Endpoint::Log);
        assert_eq!(Endpoint::classify(&Method::POST, "/api/blockers"), Endpoint::Block);
        assert_eq!(Endpoint::classify(&Method::GET, "/api/stats/extra"), Endpoint::Stats);
    }

    #[test]
    fn test_classify_wrong_method_is_unknown() {
        assert_eq!(Endpoint::classify(&Method::GET, "/api/block"), Endpoint::Unknown);
        assert_eq!(Endpoint::classify(&Method::POST, "/api/status"), Endpoint::Unknown);
        assert_eq!(Endpoint::classify(&Method::GET, "/api/nonexistent"), Endpoint::Unknown);
        assert_eq!(Endpoint::classify(&Method::GET, "/"), Endpoint::Unknown);
    }

    #[test]
    fn test_classify_options_and_save() {
        assert_eq!(Endpoint::classify(&Method::OPTIONS, "/anything"), Endpoint::Preflight);
        assert_eq!(Endpoint::classify(&Method::OPTIONS, "/api/save"), Endpoint::Preflight);
        assert_eq!(Endpoint::classify(&Method::GET, "/api/save"), Endpoint::Save);
        assert_eq!(Endpoint::classify(&Method::POST, "/api/save"), Endpoint::Save);
    }

    #[test]
    fn test_log_body_text_field() {
        let body = LogBody::from_value(json!({"txt": "hello", "extra": 1}));
        assert_eq!(body, LogBody::Text("hello".into()));

        let body = LogBody::from_value(json!({"text": "world"}));
        assert_eq!(body.into_text(), "world");
    }

    #[test]
    fn test_log_body_falls_back_to_json() {
        let body = LogBody::from_value(json!({"event": "visit", "n": 2}));
        assert!(matches!(body, LogBody::Opaque(_)));
        assert_eq!(body.into_text(), r#"{"event":"visit","n":2}"#);

        let empty = LogBody::from_value(json!({"txt": ""}));
        assert_eq!(empty.into_text(), r#"{"txt":""}"#);

        assert_eq!(LogBody::from_value(json!([1, 2])).into_text(), "[1,2]");
    }

    #[test]
    fn test_require_ip() {
        assert_eq!(require_ip(&json!({"ip": "1.2.3.4"})).unwrap(), "1.2.3.4");
        assert_eq!(require_ip(&json!({"ip": 42})).unwrap(), "42");
        assert!(require_ip(&json!({})).is_err());
        assert!(require_ip(&json!({"ip": ""})).is_err());
        assert!(require_ip(&json!({"ip": null})).is_err());
        assert!(require_ip(&json!({"ip": ["1.2.3.4"]})).is_err());
        assert!(require_ip(&json!("1.2.3.4")).is_err());
    }

    #[test]
    fn test_integral_floats_print_as_integers() {
        assert_eq!(require_ip(&json!({"ip": 1e2})).unwrap(), "100");
        assert_eq!(require_ip(&json!({"ip": 100.0})).unwrap(), "100");
        assert_eq!(require_ip(&json!({"ip": -3.0})).unwrap(), "-3");
        assert_eq!(require_ip(&json!({"ip": 1.5})).unwrap(), "1.5");
        assert_eq!(LogBody::from_value(json!({"txt": 2.0})).into_text(), "2");
        assert!(require_ip(&json!({"ip": 0.0})).is_err());
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(b"").unwrap(), json!({}));
        assert_eq!(parse_body(br#"{"ip":"1.1.1.1"}"#).unwrap()["ip"], "1.1.1.1");
        assert!(matches!(parse_body(b"{not json"), Err(ApiError::InvalidBody(_))));
    }

    #[test]
    fn test_remote_result() {
        assert_eq!(remote_result(""), Value::Null);
        assert_eq!(remote_result(r#"[{"id":1}]"#), json!([{"id": 1}]));
        assert_eq!(remote_result("created"), json!("created"));
    }
}
