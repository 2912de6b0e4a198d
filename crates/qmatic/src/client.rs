use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::{debug, warn};

use slotrace_core::booking::{AvailabilitySource, SlotDirectory, UpstreamError};
use slotrace_core::config::UpstreamConfig;

use crate::retry::RetryPolicy;
use crate::wire;

/// Client for the upstream scheduling API.
///
/// The host runs an outdated TLS stack behind a certificate chain that does
/// not always validate, and the value of a request decays to zero within
/// seconds of a slot release. Both constraints shape the client: optionally
/// relaxed certificate validation, aggressively short timeouts, one pooled
/// connection set shared by the whole process, and a warmup request that
/// pays the DNS/TLS handshake cost before the race starts.
pub struct QmaticClient {
    http: reqwest::Client,
    base_url: String,
    branch_id: String,
    service_id: String,
    slot_length: u32,
    request_timeout_ms: u64,
    retry: RetryPolicy,
}

impl QmaticClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("es-ES,es;q=0.9"));
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_static("Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36"),
        );
        if let Ok(referer) = HeaderValue::from_str(&config.base_url) {
            headers.insert(header::REFERER, referer);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|error| UpstreamError::Transport(format!("client build failed: {error}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            branch_id: config.branch_id.clone(),
            service_id: config.service_id.clone(),
            slot_length: config.slot_length,
            request_timeout_ms: config.request_timeout_ms,
            retry: RetryPolicy::from(&config.retry),
        })
    }

    /// Pay the DNS lookup and TLS handshake before any slot appears. The
    /// response content is irrelevant; failure only costs the head start.
    pub async fn warmup(&self) {
        let url = format!("{}/branches/{}/services", self.base_url, self.branch_id);
        match self.http.get(&url).send().await {
            Ok(_) => debug!(event_name = "upstream.warmup.done", "connection warmed up"),
            Err(error) => warn!(
                event_name = "upstream.warmup.failed",
                error = %error,
                "connection warmup failed"
            ),
        }
    }

    pub async fn create_appointment(&self, body: &Value) -> Result<String, UpstreamError> {
        let url = format!("{}/appointments", self.base_url);

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|error| self.map_send_error(error))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|error| UpstreamError::Decode(error.to_string()))?;

        wire::decode_confirmation(&payload).ok_or_else(|| {
            UpstreamError::Decode("confirmation response carries no publicId".to_string())
        })
    }

    fn dates_url(&self) -> String {
        format!(
            "{}/branches/{}/dates;servicePublicId={};customSlotLength={}",
            self.base_url, self.branch_id, self.service_id, self.slot_length
        )
    }

    fn times_url(&self, date: NaiveDate) -> String {
        format!(
            "{}/branches/{}/dates/{};servicePublicId={};customSlotLength={}",
            self.base_url,
            self.branch_id,
            date.format("%Y-%m-%d"),
            self.service_id,
            self.slot_length
        )
    }

    async fn get_json(&self, url: &str) -> Result<Value, UpstreamError> {
        let response =
            self.http.get(url).send().await.map_err(|error| self.map_send_error(error))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        response.json().await.map_err(|error| UpstreamError::Decode(error.to_string()))
    }

    async fn get_json_with_retry(&self, url: &str) -> Result<Value, UpstreamError> {
        let mut attempt = 1;
        loop {
            match self.get_json(url).await {
                Ok(payload) => return Ok(payload),
                Err(error) => {
                    if attempt >= self.retry.max_attempts || !self.retry.is_retryable(&error) {
                        return Err(error);
                    }
                    let delay = self.retry.backoff(attempt);
                    debug!(
                        event_name = "upstream.read.retry",
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "retrying upstream read"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    fn map_send_error(&self, error: reqwest::Error) -> UpstreamError {
        if error.is_timeout() {
            UpstreamError::Timeout(self.request_timeout_ms)
        } else {
            UpstreamError::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl AvailabilitySource for QmaticClient {
    async fn open_dates(&self) -> Result<Vec<NaiveDate>, UpstreamError> {
        let payload = self.get_json_with_retry(&self.dates_url()).await?;
        Ok(wire::decode_dates(&payload))
    }
}

#[async_trait]
impl SlotDirectory for QmaticClient {
    async fn open_times(&self, date: NaiveDate) -> Result<Vec<NaiveTime>, UpstreamError> {
        let payload = self.get_json_with_retry(&self.times_url(date)).await?;
        Ok(wire::decode_times(&payload))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use httpmock::prelude::*;
    use serde_json::json;

    use slotrace_core::booking::{AvailabilitySource, SlotDirectory, UpstreamError};
    use slotrace_core::config::{RetryConfig, UpstreamConfig};

    use super::QmaticClient;

    fn config(base_url: String) -> UpstreamConfig {
        UpstreamConfig {
            base_url,
            branch_id: "branch-1".to_string(),
            service_id: "svc-1".to_string(),
            slot_length: 10,
            connect_timeout_ms: 1_000,
            request_timeout_ms: 3_000,
            accept_invalid_certs: false,
            retry: RetryConfig { max_attempts: 3, base_delay_ms: 1, max_delay_ms: 4 },
        }
    }

    fn client(server: &MockServer) -> QmaticClient {
        QmaticClient::new(&config(server.base_url())).expect("client builds")
    }

    #[tokio::test]
    async fn open_dates_uses_matrix_parameters_and_decodes() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/branches/branch-1/dates;servicePublicId=svc-1;customSlotLength=10");
                then.status(200)
                    .json_body(json!(["2025-12-18", { "date": "2025-12-19T00:00:00" }]));
            })
            .await;

        let dates = client(&server).open_dates().await.expect("open dates");

        mock.assert_async().await;
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2025, 12, 18).expect("valid"),
                NaiveDate::from_ymd_opt(2025, 12, 19).expect("valid"),
            ]
        );
    }

    #[tokio::test]
    async fn open_times_preserves_upstream_order() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(
                    "/branches/branch-1/dates/2025-12-18;servicePublicId=svc-1;customSlotLength=10",
                );
                then.status(200).json_body(json!([{ "time": "09:45" }, { "time": "08:30" }]));
            })
            .await;

        let date = NaiveDate::from_ymd_opt(2025, 12, 18).expect("valid");
        let times = client(&server).open_times(date).await.expect("open times");

        assert_eq!(times.len(), 2);
        assert_eq!(times[0].format("%H:%M").to_string(), "09:45");
    }

    #[tokio::test]
    async fn reads_retry_on_server_errors_until_attempts_are_exhausted() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/branches/branch-1/dates;servicePublicId=svc-1;customSlotLength=10");
                then.status(503);
            })
            .await;

        let result = client(&server).open_dates().await;

        assert!(matches!(result, Err(UpstreamError::Status(503))));
        mock.assert_hits_async(3).await;
    }

    #[tokio::test]
    async fn reads_do_not_retry_client_errors() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/branches/branch-1/dates;servicePublicId=svc-1;customSlotLength=10");
                then.status(404);
            })
            .await;

        let result = client(&server).open_dates().await;

        assert!(matches!(result, Err(UpstreamError::Status(404))));
        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn create_appointment_extracts_the_confirmation_id() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/appointments")
                    .json_body_partial(r#"{ "start": "2025-12-18T09:45" }"#);
                then.status(200).json_body(json!({ "publicId": "CONF123" }));
            })
            .await;

        let body = json!({
            "services": [{ "publicId": "svc-1" }],
            "branch": { "publicId": "branch-1" },
            "start": "2025-12-18T09:45",
        });
        let confirmation =
            client(&server).create_appointment(&body).await.expect("confirmation");

        assert_eq!(confirmation, "CONF123");
    }

    #[tokio::test]
    async fn create_appointment_is_never_retried() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/appointments");
                then.status(503);
            })
            .await;

        let result = client(&server).create_appointment(&json!({})).await;

        assert!(matches!(result, Err(UpstreamError::Status(503))));
        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn confirmation_without_public_id_is_a_decode_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/appointments");
                then.status(200).json_body(json!({ "status": "queued" }));
            })
            .await;

        let result = client(&server).create_appointment(&json!({})).await;
        assert!(matches!(result, Err(UpstreamError::Decode(_))));
    }
}
