use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};

use crate::{
    error::Result,
    normalize::{TransportFailure, body_failure, classify, send_failure},
};

/// Build an HTTP client for one backend
///
/// `timeout` bounds each whole request; `None` leaves requests unbounded.
pub(crate) fn http_client(timeout: Option<Duration>) -> anyhow::Result<Client> {
    let mut builder = Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .pool_idle_timeout(Some(Duration::from_secs(5)))
        .tcp_nodelay(true)
        .tcp_keepalive(Some(Duration::from_secs(60)));

    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }

    builder
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build HTTP client: {e}"))
}

/// Send a request and classify any failure
///
/// A non-success status is read to completion so the error body can be
/// classified.
pub(crate) async fn execute(request: RequestBuilder, backend: &str) -> Result<Response> {
    let response = request.send().await.map_err(|e| {
        tracing::error!(backend, error = %e, "request to generation backend failed");
        classify(send_failure(&e))
    })?;

    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let body = response.bytes().await.unwrap_or_default();

    tracing::warn!(backend, status = %status, "generation backend returned an error status");

    Err(classify(TransportFailure::Status {
        status: status.as_u16(),
        body: &body,
    }))
}

/// Read a successful response body
pub(crate) async fn read_body(response: Response, backend: &str) -> Result<Vec<u8>> {
    let bytes = response.bytes().await.map_err(|e| {
        tracing::error!(backend, error = %e, "failed to read generation backend response");
        classify(body_failure(&e))
    })?;

    Ok(bytes.to_vec())
}

/// Read and deserialize a successful JSON response body
pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(response: Response, backend: &str) -> Result<T> {
    let body = read_body(response, backend).await?;

    serde_json::from_slice(&body).map_err(|e| {
        tracing::error!(backend, error = %e, "failed to parse generation backend response");
        classify(TransportFailure::Unexpected)
    })
}
