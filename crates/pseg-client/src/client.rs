//! Reqwest-backed segment client.

use crate::error::{ClientError, ClientResult};
use pseg_core::{SegmentRequest, Segmentation, segment_url};
use std::time::Duration;

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How much of an error response body is kept in the error value.
const MAX_ERROR_BODY: usize = 2048;

/// Client for one segmenter server.
///
/// Construct once and reuse; the underlying `reqwest::Client` pools
/// connections.
pub struct SegmenterClient {
    url: String,
    http: reqwest::Client,
}

impl SegmenterClient {
    /// Client for the server at `host:port` with the default timeout.
    pub fn new(host: &str, port: u16) -> Self {
        Self::with_timeout(host, port, DEFAULT_TIMEOUT)
    }

    /// Client with an explicit per-request timeout. The timeout covers the
    /// whole request, connect through body read.
    pub fn with_timeout(host: &str, port: u16, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to create HTTP client");

        Self {
            url: segment_url(host, port),
            http,
        }
    }

    /// Endpoint URL this client posts to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Segments the request's texts, returning one [`Segmentation`] per
    /// input text, in input order.
    ///
    /// # Errors
    ///
    /// [`ClientError::Transport`] if the server could not be reached or the
    /// request timed out, [`ClientError::UnexpectedStatus`] on a non-2xx
    /// answer, [`ClientError::Payload`] if a 2xx body does not parse.
    pub async fn segment(&self, request: &SegmentRequest) -> ClientResult<Vec<Segmentation>> {
        let response = self.http.post(&self.url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::UnexpectedStatus {
                status: status.as_u16(),
                body: truncate_body(body),
            });
        }

        // Read the body as text first so a decode failure is reported as a
        // payload problem, not a transport one.
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

fn truncate_body(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        // Byte budget, backed off to the nearest char boundary.
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
    body
}
