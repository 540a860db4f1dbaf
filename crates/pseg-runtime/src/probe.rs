//! Readiness probing of the segment endpoint.

use crate::config::ShuttleConfig;
use anyhow::{Result, bail};
use pseg_core::SegmentRequest;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Bounded retry probe that decides when the launched server is serving.
///
/// Probes with a real segmentation request rather than a bare connect: the
/// server only counts as up once it answers the same endpoint clients use.
/// Any 2xx answer counts; the response body is not inspected.
pub struct ReadinessProbe {
    url: String,
    timeout: Duration,
    max_attempts: u32,
    delay_between_attempts: Duration,
}

impl ReadinessProbe {
    /// Probe aimed at `url`, with the budget and timings from `config`.
    pub fn new(url: impl Into<String>, config: &ShuttleConfig) -> Self {
        Self {
            url: url.into(),
            timeout: config.test_timeout,
            max_attempts: config.test_max_attempts,
            delay_between_attempts: config.test_delay_between_attempts,
        }
    }

    /// Post probe requests until one succeeds, returning the 1-based number
    /// of the attempt that got through.
    ///
    /// # Errors
    ///
    /// When the attempt budget runs out without a single successful answer.
    pub async fn wait_until_ready(&self) -> Result<u32> {
        let client = reqwest::Client::builder().timeout(self.timeout).build()?;
        let body = SegmentRequest::new("en", vec!["Hello".to_string()]);

        for attempt in 1..=self.max_attempts {
            match client.post(&self.url).json(&body).send().await {
                Ok(response) if response.status().is_success() => {
                    return Ok(attempt);
                }
                Ok(response) => {
                    debug!(attempt, status = %response.status(), "readiness probe rejected");
                }
                Err(e) => {
                    debug!(attempt, error = %e, "readiness probe failed");
                }
            }

            // No pause after the last attempt; the caller hears about the
            // failure as soon as the budget is spent.
            if attempt < self.max_attempts {
                sleep(self.delay_between_attempts).await;
            }
        }

        bail!(
            "segmenter server at {} did not become ready within {} attempts",
            self.url,
            self.max_attempts
        )
    }
}
