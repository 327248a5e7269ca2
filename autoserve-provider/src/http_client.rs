//! Generic HTTP client tools
//!
//! Shared request/response handling for registrar clients. Each client builds
//! its own `RequestBuilder` (URL, auth headers, body); this module sends it,
//! logs it and classifies transport-level failures.
//!
//! Nothing here retries. A 429 surfaces as [`ProviderError::RateLimited`]
//! carrying the `Retry-After` hint so the caller can decide.

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

use crate::error::ProviderError;
use crate::utils::log_sanitizer::truncate_for_log;

/// HTTP tool function set
pub struct HttpUtils;

impl HttpUtils {
    /// Performs an HTTP request and returns status code and response text.
    ///
    /// # Errors
    /// * `ProviderError::Timeout` - the request timed out
    /// * `ProviderError::NetworkError` - connection failure, or any HTTP 5xx except 501
    /// * `ProviderError::RateLimited` - HTTP 429, with `retry_after` from the header
    pub async fn execute_request(
        request_builder: RequestBuilder,
        provider_name: &str,
        method_name: &str,
        url_or_action: &str,
    ) -> Result<(u16, String), ProviderError> {
        log::debug!("[{provider_name}] {method_name} {url_or_action}");

        let response = request_builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout {
                    provider: provider_name.to_string(),
                    detail: e.to_string(),
                }
            } else {
                ProviderError::NetworkError {
                    provider: provider_name.to_string(),
                    detail: e.to_string(),
                }
            }
        })?;

        let status_code = response.status().as_u16();
        log::debug!("[{provider_name}] Response Status: {status_code}");

        // Extract Retry-After header (before consuming response body)
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());

        if status_code == 429 {
            let body = response.text().await.unwrap_or_default();
            log::warn!("[{provider_name}] Rate limited (HTTP 429), retry_after={retry_after:?}");
            return Err(ProviderError::RateLimited {
                provider: provider_name.to_string(),
                retry_after,
                raw_message: Some(body),
            });
        }

        // 501 是确定性的“不支持”，不算瞬时故障
        if (500..=599).contains(&status_code) && status_code != 501 {
            let body = response.text().await.unwrap_or_default();
            log::warn!("[{provider_name}] Server error (HTTP {status_code})");
            return Err(ProviderError::NetworkError {
                provider: provider_name.to_string(),
                detail: format!("HTTP {status_code}: {}", truncate_for_log(&body)),
            });
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| ProviderError::NetworkError {
                provider: provider_name.to_string(),
                detail: format!("Failed to read response body: {e}"),
            })?;

        log::debug!(
            "[{provider_name}] Response Body: {}",
            truncate_for_log(&response_text)
        );

        Ok((status_code, response_text))
    }

    /// Parse a JSON response body into `T`.
    pub fn parse_json<T>(response_text: &str, provider_name: &str) -> Result<T, ProviderError>
    where
        T: DeserializeOwned,
    {
        serde_json::from_str(response_text).map_err(|e| {
            log::error!("[{provider_name}] JSON parse failed: {e}");
            log::error!(
                "[{provider_name}] Raw response: {}",
                truncate_for_log(response_text)
            );
            ProviderError::ParseError {
                provider: provider_name.to_string(),
                detail: e.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn rate_limit_carries_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/limited"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "7")
                    .set_body_string("slow down"),
            )
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/limited", server.uri());
        let result = HttpUtils::execute_request(client.get(&url), "test", "GET", &url).await;

        assert!(
            matches!(
                &result,
                Err(ProviderError::RateLimited { retry_after: Some(7), raw_message: Some(body), .. })
                    if body == "slow down"
            ),
            "unexpected result: {result:?}"
        );
    }

    #[tokio::test]
    async fn gateway_errors_are_network_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = server.uri();
        let result = HttpUtils::execute_request(client.get(&url), "test", "GET", &url).await;
        assert!(matches!(result, Err(ProviderError::NetworkError { .. })));
    }

    #[tokio::test]
    async fn plain_internal_error_is_transient_but_not_implemented_is_not() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/boom"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/unsupported"))
            .respond_with(ResponseTemplate::new(501).set_body_string("{}"))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/boom", server.uri());
        let result = HttpUtils::execute_request(client.get(&url), "test", "GET", &url).await;
        assert!(
            matches!(&result, Err(ProviderError::NetworkError { detail, .. }) if detail.contains("HTTP 500")),
            "unexpected result: {result:?}"
        );
        assert!(result.is_err_and(|e| e.is_retryable()));

        let url = format!("{}/unsupported", server.uri());
        let result = HttpUtils::execute_request(client.get(&url), "test", "GET", &url).await;
        assert!(matches!(result, Ok((501, _))));
    }

    #[tokio::test]
    async fn other_statuses_pass_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("{}"))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = server.uri();
        let result = HttpUtils::execute_request(client.get(&url), "test", "GET", &url).await;
        assert!(matches!(result, Ok((404, ref body)) if body == "{}"));
    }

    #[tokio::test]
    async fn connection_refused_is_network_error() {
        let client = reqwest::Client::new();
        let url = "http://127.0.0.1:9/unreachable";
        let result = HttpUtils::execute_request(client.get(url), "test", "GET", url).await;
        assert!(matches!(
            result,
            Err(ProviderError::NetworkError { .. } | ProviderError::Timeout { .. })
        ));
    }

    #[test]
    fn parse_json_invalid() {
        #[derive(serde::Deserialize, Debug)]
        #[allow(dead_code)]
        struct Foo {
            x: i32,
        }
        let result: Result<Foo, ProviderError> = HttpUtils::parse_json("not json", "test");
        assert!(matches!(result, Err(ProviderError::ParseError { .. })));
    }
}
