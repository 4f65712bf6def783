use std::time::Instant;

use axum::body::{to_bytes, Body};
use axum::extract::{Query, Request};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use percent_encoding::percent_decode_str;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use super::client::client_identifier;
use super::patterns::{scan_json, scan_text, SecurityThreat};

/// Request bodies larger than this are refused outright.
pub const MAX_SCANNED_BODY_BYTES: usize = 1024 * 1024;

/// Access log line per request.
pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let client = client_identifier(&request);
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let latency_ms = started.elapsed().as_millis() as u64;
    if response.status().is_server_error() {
        error!(%method, %path, %client, status, latency_ms, "request failed");
    } else if response.status().is_client_error() {
        warn!(%method, %path, %client, status, latency_ms, "request rejected");
    } else {
        info!(%method, %path, %client, status, latency_ms, "request handled");
    }

    response
}

fn is_json(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<mime::Mime>().ok())
        .map(|mime| {
            mime.subtype() == mime::JSON || mime.suffix().map_or(false, |suffix| suffix == mime::JSON)
        })
        .unwrap_or(false)
}

fn threat_response(threat: SecurityThreat) -> Response {
    let body = json!({
        "success": false,
        "error": "Request contains potentially malicious content",
        "message": threat.label(),
    });
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

fn malformed_query_response() -> Response {
    let body = json!({
        "success": false,
        "error": "Malformed query string",
    });
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

/// Reject paths, query strings and JSON bodies matching known injection patterns.
///
/// Runs independently of field validation and fails closed: a query that cannot be decoded,
/// or an unreadable or oversized body, is refused as well.
pub async fn security_guard_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let client = client_identifier(&request);

    // Form decoding is lossy, so invalid UTF-8 escapes are caught on the raw query first.
    let raw_query = request.uri().query().unwrap_or_default();
    if let Err(err) = percent_decode_str(raw_query).decode_utf8() {
        warn!(%method, %path, %client, error = %err, "security event: malformed query");
        return malformed_query_response();
    }
    // Pairs rather than a map so repeated keys are all scanned.
    let params = match Query::<Vec<(String, String)>>::try_from_uri(request.uri()) {
        Ok(Query(params)) => params,
        Err(err) => {
            warn!(%method, %path, %client, error = %err, "security event: malformed query");
            return malformed_query_response();
        }
    };
    let decoded_path = percent_decode_str(&path).decode_utf8_lossy();
    let query_threat = params
        .iter()
        .find_map(|(key, value)| scan_text(key).or_else(|| scan_text(value)))
        .or_else(|| scan_text(&decoded_path));
    if let Some(threat) = query_threat {
        warn!(%method, %path, %client, threat = threat.label(), "security event: malicious query");
        return threat_response(threat);
    }

    if !is_json(&request) {
        return next.run(request).await;
    }

    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, MAX_SCANNED_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(%method, %path, %client, error = %err, "security event: unreadable body");
            let body = json!({ "success": false, "error": "Request body too large or unreadable" });
            return (StatusCode::PAYLOAD_TOO_LARGE, Json(body)).into_response();
        }
    };

    let threat = match serde_json::from_slice::<Value>(&bytes) {
        Ok(value) => scan_json(&value),
        Err(_) => scan_text(&String::from_utf8_lossy(&bytes)),
    };
    if let Some(threat) = threat {
        warn!(%method, %path, %client, threat = threat.label(), "security event: malicious body");
        return threat_response(threat);
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::post;
    use axum::Router;
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/echo", post(|body: String| async move { body }))
            .route("/echo/*rest", post(|body: String| async move { body }))
            .layer(axum::middleware::from_fn(security_guard_middleware))
            .layer(axum::middleware::from_fn(request_logging_middleware))
    }

    fn json_request(uri: &str, body: Value) -> axum::http::Request<Body> {
        axum::http::Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    #[tokio::test]
    async fn clean_bodies_reach_the_handler_intact() {
        let response = app()
            .oneshot(json_request("/echo", json!({ "notes": "rotate tires" })))
            .await
            .expect("responds");
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        let echoed: Value = serde_json::from_slice(&bytes).expect("json echoed");
        assert_eq!(echoed["notes"], "rotate tires");
    }

    #[tokio::test]
    async fn malicious_bodies_are_rejected() {
        let response = app()
            .oneshot(json_request(
                "/echo",
                json!({ "notes": "<script>steal()</script>" }),
            ))
            .await
            .expect("responds");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malicious_query_strings_are_rejected() {
        let response = app()
            .oneshot(json_request(
                "/echo?search=%27%20or%201%3D1",
                json!({}),
            ))
            .await
            .expect("responds");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn encoded_traversal_in_path_or_query_is_rejected() {
        for uri in [
            "/echo/%2e%2e%2fetc%2fpasswd",
            "/echo?file=%2e%2e%2fetc%2fpasswd",
            "/echo?file=report.pdf&file=%3Cscript%3E",
        ] {
            let response = app()
                .oneshot(json_request(uri, json!({})))
                .await
                .expect("responds");
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
            let bytes = to_bytes(response.into_body(), usize::MAX)
                .await
                .expect("body readable");
            let body: Value = serde_json::from_slice(&bytes).expect("json body");
            assert_eq!(body["error"], "Request contains potentially malicious content");
        }
    }

    #[tokio::test]
    async fn undecodable_query_strings_fail_closed() {
        let response = app()
            .oneshot(json_request("/echo?name=%ff%fe", json!({})))
            .await
            .expect("responds");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        let body: Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(body["error"], "Malformed query string");
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn non_json_bodies_pass_through() {
        let response = app()
            .oneshot(
                axum::http::Request::post("/echo")
                    .header(header::CONTENT_TYPE, "text/plain")
                    .body(Body::from("plain notes"))
                    .expect("request builds"),
            )
            .await
            .expect("responds");
        assert_eq!(response.status(), StatusCode::OK);
    }
}
