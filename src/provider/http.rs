//! Shared HTTP client construction and status mapping.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};

use crate::error::SleuthError;

/// Build a reqwest client with the given request timeout.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, SleuthError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| SleuthError::Configuration(format!("failed to build HTTP client: {e}")))
}

/// Build default headers for a Bearer-token API.
pub fn bearer_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(val) = HeaderValue::from_str(&format!("Bearer {api_key}")) {
        headers.insert(AUTHORIZATION, val);
    }
    headers
}

/// Map a non-success HTTP status to an error.
///
/// 5xx statuses stay retryable through [`SleuthError::category`]; 503 gets its
/// own variant so callers can tell an overloaded service from a crash.
pub fn status_to_error(status: u16, headers: &HeaderMap, body: &str) -> SleuthError {
    match status {
        401 | 403 => SleuthError::Authentication(error_message(body)),
        429 => SleuthError::RateLimited {
            retry_after_ms: retry_after_header(headers).or_else(|| retry_after_body(body)),
        },
        503 => SleuthError::ServiceUnavailable(error_message(body)),
        _ => SleuthError::api(status, error_message(body)),
    }
}

/// Map a transport failure, surfacing request timeouts as [`SleuthError::Timeout`].
pub fn transport_error(err: reqwest::Error, timeout: Duration) -> SleuthError {
    if err.is_timeout() {
        SleuthError::Timeout(timeout.as_millis() as u64)
    } else {
        SleuthError::Network(err)
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

fn retry_after_header(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<f64>()
        .ok()
        .map(|secs| (secs * 1000.0) as u64)
}

fn retry_after_body(body: &str) -> Option<u64> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("retry_after"))
                .and_then(|r| r.as_f64())
                .map(|s| (s * 1000.0) as u64)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_unavailable_is_its_own_variant() {
        let err = status_to_error(503, &HeaderMap::new(), "overloaded");
        assert!(matches!(err, SleuthError::ServiceUnavailable(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn other_server_errors_are_retryable_api_errors() {
        let err = status_to_error(502, &HeaderMap::new(), "bad gateway");
        assert!(matches!(err, SleuthError::Api { status: 502, .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn client_errors_are_final() {
        let body = r#"{"error":{"message":"model not found"}}"#;
        let err = status_to_error(404, &HeaderMap::new(), body);
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("model not found"));
        assert!(!status_to_error(401, &HeaderMap::new(), "").is_retryable());
    }

    #[test]
    fn retry_after_header_wins_over_body() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("2"));
        let body = r#"{"error":{"retry_after":9}}"#;

        match status_to_error(429, &headers, body) {
            SleuthError::RateLimited { retry_after_ms } => assert_eq!(retry_after_ms, Some(2000)),
            other => panic!("unexpected {other:?}"),
        }
        match status_to_error(429, &HeaderMap::new(), body) {
            SleuthError::RateLimited { retry_after_ms } => assert_eq!(retry_after_ms, Some(9000)),
            other => panic!("unexpected {other:?}"),
        }
    }
}
