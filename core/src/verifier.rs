//! Decoder-backed confirmation that a responsive endpoint actually streams.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, warn};

use camsweep_common::error::VerificationFailure;
use camsweep_common::models::{Candidate, VerifiedStream};

use crate::decoder::{FrameCapture, FrameDecoder};

/// Slack on top of the decoder's own limit before the verifier gives up on it.
const KILL_GRACE: Duration = Duration::from_secs(2);

pub struct StreamVerifier<D> {
    decoder: Arc<D>,
    timeout: Duration,
}

impl<D: FrameDecoder> StreamVerifier<D> {
    pub fn new(decoder: Arc<D>, timeout: Duration) -> Self {
        Self { decoder, timeout }
    }

    /// One bounded decoder run against a bare URL.
    pub async fn check_url(&self, url: &str) -> Result<FrameCapture, VerificationFailure> {
        match timeout(self.timeout + KILL_GRACE, self.decoder.capture_frame(url, self.timeout)).await {
            Ok(outcome) => outcome,
            Err(_elapsed) => {
                warn!("decoder overran its limit on {url}");
                Err(VerificationFailure::Timeout(self.timeout))
            }
        }
    }

    /// Runs the decoder once against `candidate`. Never fails: any decoder
    /// trouble is folded into a negative [`VerifiedStream`].
    pub async fn verify(&self, candidate: Candidate) -> VerifiedStream {
        let outcome = self.check_url(&candidate.url).await;

        match outcome {
            Ok(capture) => {
                debug!("{candidate} produced a {} byte frame", capture.bytes);
                VerifiedStream {
                    candidate,
                    frame_captured: true,
                    detail: format!("frame captured ({} bytes)", capture.bytes),
                }
            }
            Err(failure) => {
                debug!("{candidate} did not verify: {failure}");
                VerifiedStream {
                    candidate,
                    frame_captured: false,
                    detail: failure.to_string(),
                }
            }
        }
    }
}
