//! HTTP client for the metrics API.

use std::time::Duration;

use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::data::{
    DependencyGraph, ServiceDependencies, ServiceHealth, ServiceMetricsDetail, TimeRange,
    TraceDetail, TraceInfo,
};
use crate::error::ApiError;

/// Header carrying the caller's access token to the API.
pub const ACCESS_TOKEN_HEADER: &str = "X-Forwarded-Access-Token";

/// Connection timeout, independent of the per-request timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Typed access to every endpoint the dashboard consumes.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    access_token: Option<String>,
}

impl ApiClient {
    /// Create a client for the API rooted at `base_url`.
    pub fn new(
        base_url: &str,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            access_token,
        })
    }

    /// Returns the base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `GET /api/services/list?time_range=`
    pub async fn services(&self, time_range: TimeRange) -> Result<Vec<ServiceHealth>, ApiError> {
        let url = self.endpoint(&["api", "services", "list"])?;
        self.get_json(url, Some(time_range)).await
    }

    /// `GET /api/services/{name}/metrics?time_range=`
    pub async fn service_metrics(
        &self,
        service: &str,
        time_range: TimeRange,
    ) -> Result<ServiceMetricsDetail, ApiError> {
        let url = self.endpoint(&["api", "services", service, "metrics"])?;
        self.get_json(url, Some(time_range)).await
    }

    /// `GET /api/services/{name}/dependencies`
    pub async fn service_dependencies(
        &self,
        service: &str,
    ) -> Result<ServiceDependencies, ApiError> {
        let url = self.endpoint(&["api", "services", service, "dependencies"])?;
        self.get_json(url, None).await
    }

    /// `GET /api/services/{name}/traces?time_range=`
    pub async fn service_traces(
        &self,
        service: &str,
        time_range: TimeRange,
    ) -> Result<Vec<TraceInfo>, ApiError> {
        let url = self.endpoint(&["api", "services", service, "traces"])?;
        self.get_json(url, Some(time_range)).await
    }

    /// `GET /api/services/traces/{traceId}`
    pub async fn trace_detail(&self, trace_id: &str) -> Result<TraceDetail, ApiError> {
        let url = self.endpoint(&["api", "services", "traces", trace_id])?;
        self.get_json(url, None).await
    }

    /// `GET /api/dependencies/graph?time_range=`
    pub async fn dependency_graph(
        &self,
        time_range: TimeRange,
    ) -> Result<DependencyGraph, ApiError> {
        let url = self.endpoint(&["api", "dependencies", "graph"])?;
        self.get_json(url, Some(time_range)).await
    }

    /// `GET /api/traces?time_range=`
    pub async fn traces(&self, time_range: TimeRange) -> Result<Vec<TraceInfo>, ApiError> {
        let url = self.endpoint(&["api", "traces"])?;
        self.get_json(url, Some(time_range)).await
    }

    /// Append path segments (percent-encoded) to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    #[instrument(skip_all, fields(url = %url))]
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        time_range: Option<TimeRange>,
    ) -> Result<T, ApiError> {
        let mut request = self.http.get(url);
        if let Some(range) = time_range {
            request = request.query(&[("time_range", range.as_str())]);
        }
        if let Some(ref token) = self.access_token {
            request = request.header(ACCESS_TOKEN_HEADER, token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "API request failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        debug!(bytes = bytes.len(), "API response received");
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::HealthStatus;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ApiClient {
        ApiClient::new(&server.uri(), None, Duration::from_secs(5)).unwrap()
    }

    fn service_json(name: &str, health: &str) -> serde_json::Value {
        serde_json::json!({
            "service_name": name,
            "health_status": health,
            "current_latency_p50": 10.0,
            "current_latency_p95": 40.0,
            "current_latency_p99": 80.0,
            "avg_duration_ms": 12.0,
            "max_duration_ms": 150.0,
            "error_count": 1,
            "error_rate": 0.01,
            "request_count": 100,
            "requests_per_second": 0.03
        })
    }

    #[tokio::test]
    async fn test_services_sends_time_range() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/services/list"))
            .and(query_param("time_range", "24h"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                service_json("checkout", "healthy"),
                service_json("payments", "critical"),
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let services = client(&server).services(TimeRange::TwentyFourHours).await.unwrap();
        assert_eq!(services.len(), 2);
        assert_eq!(services[1].health_status, HealthStatus::Critical);
    }

    #[tokio::test]
    async fn test_non_success_status_carries_code_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/dependencies/graph"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Query failed: timeout"))
            .mount(&server)
            .await;

        let err = client(&server).dependency_graph(TimeRange::OneHour).await.unwrap_err();
        assert_eq!(
            err,
            ApiError::Status {
                status: 500,
                body: "Query failed: timeout".to_string()
            }
        );
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("Query failed: timeout"));
    }

    #[tokio::test]
    async fn test_invalid_json_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/traces"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client(&server).traces(TimeRange::FifteenMinutes).await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_dependencies_has_no_time_range_and_forwards_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/services/checkout/dependencies"))
            .and(header(ACCESS_TOKEN_HEADER, "secret-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "service_name": "checkout",
                "inbound": [{"service_name": "frontend", "call_count": 12, "health_status": "healthy"}],
                "outbound": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(
            &server.uri(),
            Some("secret-token".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();
        let deps = client.service_dependencies("checkout").await.unwrap();
        assert_eq!(deps.inbound.len(), 1);
        assert!(deps.outbound.is_empty());

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests[0].url.query(), None);
    }

    #[tokio::test]
    async fn test_path_segments_are_encoded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/services/traces/abc%2F123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "trace_id": "abc/123",
                "trace_start": "2024-05-01T10:00:00Z",
                "spans": [{"service_name": "checkout", "total_duration_ms": 12.5}]
            })))
            .mount(&server)
            .await;

        let detail = client(&server).trace_detail("abc/123").await.unwrap();
        assert_eq!(detail.trace_id, "abc/123");
        assert_eq!(detail.spans.len(), 1);
    }

    #[tokio::test]
    async fn test_base_url_with_prefix() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/observability/api/services/checkout/metrics"))
            .and(query_param("time_range", "1h"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such service"))
            .expect(1)
            .mount(&server)
            .await;

        let base = format!("{}/observability/", server.uri());
        let client = ApiClient::new(&base, None, Duration::from_secs(5)).unwrap();
        let err = client.service_metrics("checkout", TimeRange::OneHour).await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 404, .. }));
    }

    #[test]
    fn test_rejects_unusable_base_url() {
        assert!(ApiClient::new("not a url", None, Duration::from_secs(1)).is_err());
        assert!(ApiClient::new("mailto:ops@example.com", None, Duration::from_secs(1)).is_err());
    }
}
