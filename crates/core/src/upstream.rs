//! Client for the upstream AI workflow runner.
//!
//! Wraps the runner's HTTP run endpoint: the patient payload is placed into
//! the runner's request envelope, sent with a bounded client-side deadline,
//! and the loosely-structured response is normalised into a single result
//! text by [`crate::normalize`].
//!
//! Exactly one outbound call is made per invocation. Retries are deliberately
//! not implemented: the runner's idempotency is unconfirmed, so a failed call
//! surfaces to the caller instead of being repeated.

use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONNECTION, USER_AGENT};
use serde::Serialize;

use crate::config::RelayConfig;
use crate::normalize::normalise;
use crate::{RelayError, RelayResult};

/// Request envelope expected by the workflow runner's run endpoint.
///
/// When an input-tweak key is configured the payload is addressed through
/// `tweaks` (an upstream component-addressing quirk); otherwise it is sent
/// as top-level `input_value`.
#[derive(Debug, Serialize)]
struct RunRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    input_value: Option<&'a str>,
    input_type: &'static str,
    output_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tweaks: Option<BTreeMap<&'a str, TweakInput<'a>>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct TweakInput<'a> {
    input_value: &'a str,
}

/// Client for the upstream workflow runner.
///
/// Holds a pooled `reqwest::Client` with the configured deadline baked in;
/// cloning is cheap and each invocation is independent, so concurrent
/// requests never affect each other's cancellation.
#[derive(Clone, Debug)]
pub struct WorkflowClient {
    client: reqwest::Client,
    cfg: Arc<RelayConfig>,
}

impl WorkflowClient {
    /// Create a new `WorkflowClient` from resolved configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Internal`] if the underlying HTTP client cannot
    /// be constructed (for example when TLS initialisation fails).
    pub fn new(cfg: Arc<RelayConfig>) -> RelayResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        // The runner's reverse proxy has dropped idle keep-alive connections
        // mid-flight before; closing per request avoids that failure mode.
        headers.insert(CONNECTION, HeaderValue::from_static("close"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!(
                "clinical-trial-screener/",
                env!("CARGO_PKG_VERSION")
            )),
        );

        let client = reqwest::Client::builder()
            .timeout(cfg.client_deadline())
            .default_headers(headers)
            .build()
            .map_err(|e| RelayError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, cfg })
    }

    /// Send one patient payload to the workflow runner and return the
    /// normalised result text.
    ///
    /// Performs exactly one outbound `POST`; the call is cancelled when the
    /// configured client deadline expires.
    ///
    /// # Errors
    ///
    /// - [`RelayError::Timeout`] when the deadline expires,
    /// - [`RelayError::Unavailable`] when the runner is unreachable or the
    ///   connection is closed mid-response,
    /// - [`RelayError::Upstream`] for non-2xx responses,
    /// - [`RelayError::BadUpstreamFormat`] when the body is HTML or not
    ///   parseable JSON.
    pub async fn invoke(&self, payload: &str) -> RelayResult<String> {
        let request = self.build_envelope(payload);

        tracing::debug!(url = %self.cfg.upstream_url(), "sending payload to workflow runner");

        let mut builder = self.client.post(self.cfg.upstream_url()).json(&request);
        if let Some(key) = self.cfg.api_key() {
            builder = builder.header("x-api-key", key);
        }

        let response = builder.send().await.map_err(|e| self.classify(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.classify(e))?;

        tracing::debug!(status = %status, body_len = body.len(), "workflow runner responded");

        if looks_like_html(&body) {
            return Err(RelayError::BadUpstreamFormat(
                "workflow runner returned HTML instead of JSON; check the endpoint or flow \
                 configuration"
                    .into(),
            ));
        }

        if !status.is_success() {
            return Err(RelayError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            RelayError::BadUpstreamFormat(format!("invalid JSON from workflow runner: {e}"))
        })?;

        Ok(normalise(&parsed))
    }

    fn build_envelope<'a>(&'a self, payload: &'a str) -> RunRequest<'a> {
        match self.cfg.tweak_key() {
            Some(key) => {
                let mut tweaks = BTreeMap::new();
                tweaks.insert(key, TweakInput { input_value: payload });
                RunRequest {
                    input_value: None,
                    input_type: "text",
                    output_type: "text",
                    tweaks: Some(tweaks),
                    stream: false,
                }
            }
            None => RunRequest {
                input_value: Some(payload),
                input_type: "text",
                output_type: "text",
                tweaks: None,
                stream: false,
            },
        }
    }

    /// Map transport-level reqwest failures onto the relay taxonomy.
    fn classify(&self, err: reqwest::Error) -> RelayError {
        if err.is_timeout() {
            return RelayError::Timeout(self.cfg.client_deadline().as_secs());
        }
        if err.is_connect() {
            return RelayError::Unavailable(format!("connection failed: {err}"));
        }
        if err.is_body() || err.is_decode() {
            return RelayError::Unavailable(format!("connection closed by remote: {err}"));
        }
        RelayError::Internal(format!("unexpected HTTP client error: {err}"))
    }
}

/// Sniff for HTML bodies (error pages, proxy interstitials).
fn looks_like_html(body: &str) -> bool {
    let prefix = body.trim_start().get(..64).unwrap_or(body.trim_start());
    let lower = prefix.to_ascii_lowercase();
    lower.starts_with("<!doctype html") || lower.starts_with("<html")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::post;
    use axum::Router;
    use std::time::Duration;

    fn test_config(url: String, client_ms: u64) -> Arc<RelayConfig> {
        Arc::new(
            RelayConfig::new(
                url,
                Some("sk-test".into()),
                Some("TextInput-node".into()),
                Duration::from_millis(client_ms),
                Duration::from_millis(client_ms * 2),
            )
            .unwrap(),
        )
    }

    async fn spawn_upstream(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/run")
    }

    #[test]
    fn envelope_uses_tweaks_when_key_configured() {
        let cfg = test_config("http://localhost:1/run".into(), 1000);
        let client = WorkflowClient::new(cfg).unwrap();
        let envelope = client.build_envelope("{\"age\":58}");
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(
            json.pointer("/tweaks/TextInput-node/input_value")
                .and_then(|v| v.as_str()),
            Some("{\"age\":58}")
        );
        assert!(json.get("input_value").is_none());
        assert_eq!(json["stream"], false);
        assert_eq!(json["input_type"], "text");
        assert_eq!(json["output_type"], "text");
    }

    #[test]
    fn envelope_uses_top_level_input_without_tweak_key() {
        let cfg = Arc::new(
            RelayConfig::new(
                "http://localhost:1/run".into(),
                None,
                None,
                Duration::from_secs(1),
                Duration::from_secs(2),
            )
            .unwrap(),
        );
        let client = WorkflowClient::new(cfg).unwrap();
        let json = serde_json::to_value(client.build_envelope("p")).unwrap();

        assert_eq!(json["input_value"], "p");
        assert!(json.get("tweaks").is_none());
    }

    #[test]
    fn html_sniffing_is_case_insensitive() {
        assert!(looks_like_html("<!DOCTYPE HTML><html>"));
        assert!(looks_like_html("  <html lang=\"en\">"));
        assert!(!looks_like_html("{\"result\":\"<html> in a string\"}"));
    }

    #[tokio::test]
    async fn invoke_extracts_nested_result_text() {
        let router = Router::new().route(
            "/run",
            post(|| async {
                axum::Json(serde_json::json!({
                    "outputs": [ { "outputs": [ {
                        "results": { "text": { "text": "Eligible for NCT00000001" } }
                    } ] } ]
                }))
            }),
        );
        let url = spawn_upstream(router).await;
        let client = WorkflowClient::new(test_config(url, 5000)).unwrap();

        let result = client.invoke("{\"age\":58}").await.unwrap();
        assert_eq!(result, "Eligible for NCT00000001");
    }

    #[tokio::test]
    async fn invoke_maps_non_success_status() {
        let router = Router::new().route(
            "/run",
            post(|| async {
                (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "{\"detail\":\"flow crashed\"}",
                )
            }),
        );
        let url = spawn_upstream(router).await;
        let client = WorkflowClient::new(test_config(url, 5000)).unwrap();

        let err = client.invoke("{}").await.unwrap_err();
        match err {
            RelayError::Upstream { status, body } => {
                assert_eq!(status, 500);
                assert!(body.contains("flow crashed"));
            }
            other => panic!("expected Upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn invoke_rejects_html_bodies() {
        let router = Router::new().route(
            "/run",
            post(|| async { "<!doctype html><html><body>login</body></html>" }),
        );
        let url = spawn_upstream(router).await;
        let client = WorkflowClient::new(test_config(url, 5000)).unwrap();

        let err = client.invoke("{}").await.unwrap_err();
        assert!(matches!(err, RelayError::BadUpstreamFormat(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn invoke_rejects_unparseable_bodies() {
        let router = Router::new().route("/run", post(|| async { "not json at all" }));
        let url = spawn_upstream(router).await;
        let client = WorkflowClient::new(test_config(url, 5000)).unwrap();

        let err = client.invoke("{}").await.unwrap_err();
        assert!(matches!(err, RelayError::BadUpstreamFormat(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn invoke_times_out_at_client_deadline() {
        let router = Router::new().route(
            "/run",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "{\"result\":\"too late\"}"
            }),
        );
        let url = spawn_upstream(router).await;
        let client = WorkflowClient::new(test_config(url, 100)).unwrap();

        let err = client.invoke("{}").await.unwrap_err();
        assert!(matches!(err, RelayError::Timeout(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn invoke_reports_unreachable_upstream() {
        // Nothing listens on this port.
        let client =
            WorkflowClient::new(test_config("http://127.0.0.1:9/run".into(), 2000)).unwrap();

        let err = client.invoke("{}").await.unwrap_err();
        assert!(
            matches!(err, RelayError::Unavailable(_) | RelayError::Timeout(_)),
            "got {err:?}"
        );
    }
}
