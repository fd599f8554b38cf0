//! Request/response access logging.
//!
//! Both bodies are buffered so they can be logged: the request body is handed on
//! to the handler unchanged, the response body is passed back to the client
//! unchanged. Only the first `logging.max_body_bytes` of each reach the log line.
//! A request body over `server.max_body_bytes` answers 413, one that fails to
//! arrive answers 400, and a response body that breaks mid-stream becomes a 500.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, MatchedPath, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use http_body_util::LengthLimitError;

use crate::error::{AppError, HandlerError};
use crate::logger::{module_from_route, sanitize, sanitize_bytes, Level};
use crate::middleware::ip::client_ip;
use crate::state::AppState;

/// One finished request, ready to be rendered as a log message.
#[derive(Debug, Clone)]
pub struct AccessRecord {
    pub status: u16,
    pub method: String,
    pub route: String,
    pub ip: String,
    pub latency: std::time::Duration,
    pub error: Option<String>,
    pub request_body: String,
    pub response_body: String,
}

impl AccessRecord {
    pub fn level(&self) -> Level {
        Level::from_status(self.status)
    }

    pub fn module(&self) -> &str {
        module_from_route(&self.route)
    }

    /// `status=… method=… route=… ip=… latency=… [err=…] req=… res=…`.
    /// `err=` is present for warn and error levels only.
    pub fn message(&self) -> String {
        let mut msg = format!(
            "status={} method={} route={} ip={} latency={:?}",
            self.status, self.method, self.route, self.ip, self.latency
        );
        if self.level() != Level::Info {
            msg.push_str(" err=");
            msg.push_str(self.error.as_deref().unwrap_or(""));
        }
        msg.push_str(" req=");
        msg.push_str(&self.request_body);
        msg.push_str(" res=");
        msg.push_str(&self.response_body);
        msg
    }
}

pub async fn access_log_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let start = Instant::now();
    let limit = state.config.logging.max_body_bytes;

    let method = req.method().to_string();
    // Templates like `/books/{id}` keep path parameters from fragmenting the log.
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let peer = req.extensions().get::<ConnectInfo<SocketAddr>>().map(|ConnectInfo(addr)| addr.ip());
    let ip = client_ip(req.headers(), peer, state.config.logging.trust_forwarded_headers);

    let (parts, body) = req.into_parts();
    let max_request = state.config.server.max_body_bytes;
    let (request_body, response) = match axum::body::to_bytes(body, max_request).await {
        Ok(bytes) => {
            let captured = sanitize_bytes(&bytes, limit);
            let response = next.run(Request::from_parts(parts, Body::from(bytes))).await;
            (captured, response)
        }
        Err(e) if exceeds_limit(&e) => {
            tracing::warn!(error = %e, route = %route, "Rejected oversized request body");
            let response = AppError::PayloadTooLarge(format!(
                "Request body exceeds maximum size of {} bytes",
                max_request
            ))
            .into_response();
            (String::new(), response)
        }
        Err(e) => {
            tracing::warn!(error = %e, route = %route, "Failed to read request body");
            let response = AppError::BadRequest(format!("failed to read request body: {}", e)).into_response();
            (String::new(), response)
        }
    };

    let (response, res_bytes) = buffer_response(response, &route).await;
    let status = response.status().as_u16();
    let error = response.extensions().get::<HandlerError>().map(|HandlerError(text)| sanitize(text, limit));

    let record = AccessRecord {
        status,
        method,
        route,
        ip: ip.to_string(),
        latency: start.elapsed(),
        error,
        request_body,
        response_body: sanitize_bytes(&res_bytes, limit),
    };
    state.metrics.record_response(status);
    state.logger.log(record.level(), record.module(), &record.message());

    response
}

/// Whether a `to_bytes` failure came from the length limit rather than the body stream.
fn exceeds_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

/// Collects the response body so it can be logged and re-sent. A body that fails
/// mid-stream is replaced by a 500; the client never sees a silently empty 2xx.
async fn buffer_response(response: Response, route: &str) -> (Response, Bytes) {
    let (parts, body) = response.into_parts();
    match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => (Response::from_parts(parts, Body::from(bytes.clone())), bytes),
        Err(e) => {
            tracing::error!(error = %e, route = %route, "Failed to buffer response body");
            let (parts, body) = AppError::Internal(anyhow::anyhow!("response body failed: {}", e))
                .into_response()
                .into_parts();
            // Error bodies are built in memory and cannot fail.
            let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
            (Response::from_parts(parts, Body::from(bytes.clone())), bytes)
        }
    }
}
