use crate::config::HttpSettings;
use crate::utils::error::{PredictionError, Result};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

const MAX_ERROR_BODY: usize = 500;

pub fn build_client(settings: &HttpSettings) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(settings.timeout_seconds))
        .build()?)
}

pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push('…');
    }
    body
}

async fn send_once<T: DeserializeOwned>(service: &str, request: RequestBuilder) -> Result<T> {
    let response = request.send().await?;
    let status = response.status();
    tracing::debug!("{} responded with {}", service, status);

    let body = response.text().await?;
    if !status.is_success() {
        return Err(PredictionError::ApiStatusError {
            service: service.to_string(),
            status: status.as_u16(),
            body: truncate(body),
        });
    }

    serde_json::from_str(&body).map_err(|e| PredictionError::ResponseFormatError {
        service: service.to_string(),
        message: e.to_string(),
    })
}

/// Sends the request built by `make_request`, retrying transport failures,
/// 429 and 5xx answers until `retry_attempts` tries have been made.
pub async fn send_json<T, F>(service: &str, settings: &HttpSettings, make_request: F) -> Result<T>
where
    T: DeserializeOwned,
    F: Fn() -> RequestBuilder,
{
    let attempts = settings.retry_attempts.max(1);
    let mut attempt = 1;
    loop {
        match send_once(service, make_request()).await {
            Err(e) if attempt < attempts && e.is_retryable() => {
                tracing::warn!(
                    "🔁 {} attempt {}/{} failed: {}; retrying in {}s",
                    service,
                    attempt,
                    attempts,
                    e,
                    settings.retry_delay_seconds
                );
                tokio::time::sleep(Duration::from_secs(settings.retry_delay_seconds)).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn settings(retry_attempts: u32) -> HttpSettings {
        HttpSettings {
            timeout_seconds: 5,
            retry_attempts,
            retry_delay_seconds: 0,
        }
    }

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("http://x/v1/", "/chat"), "http://x/v1/chat");
        assert_eq!(join_url("http://x", "a/b"), "http://x/a/b");
    }

    #[test]
    fn test_truncate_long_body() {
        let body = "é".repeat(400);
        let cut = truncate(body);
        assert!(cut.len() <= MAX_ERROR_BODY + '…'.len_utf8());
        assert!(cut.ends_with('…'));
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/fail");
            then.status(401).body("invalid key");
        });

        let http = settings(3);
        let client = build_client(&http).unwrap();
        let url = server.url("/fail");
        let result: Result<serde_json::Value> =
            send_json("Test", &http, || client.get(&url)).await;

        mock.assert_hits(1);
        match result {
            Err(PredictionError::ApiStatusError { status, body, .. }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid key");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/flaky");
            then.status(503);
        });

        let http = settings(3);
        let client = build_client(&http).unwrap();
        let url = server.url("/flaky");
        let result: Result<serde_json::Value> =
            send_json("Test", &http, || client.get(&url)).await;

        mock.assert_hits(3);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_invalid_json_is_format_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/html");
            then.status(200).body("<html></html>");
        });

        let http = settings(1);
        let client = build_client(&http).unwrap();
        let url = server.url("/html");
        let result: Result<serde_json::Value> =
            send_json("Test", &http, || client.get(&url)).await;

        assert!(matches!(
            result,
            Err(PredictionError::ResponseFormatError { .. })
        ));
    }
}
