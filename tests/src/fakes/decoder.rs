use std::collections::HashSet;
use std::io;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use camsweep_common::error::{ScanError, VerificationFailure};
use camsweep_core::decoder::{FrameCapture, FrameDecoder};

use crate::fakes::Gauge;

const FRAME_BYTES: u64 = 2048;

/// A decoder whose verdict per URL is fixed up front.
#[derive(Debug)]
pub struct ScriptedDecoder {
    available: bool,
    working: HashSet<String>,
    hang: bool,
    delay: Duration,
    calls: Mutex<Vec<String>>,
    gauge: Arc<Gauge>,
}

impl ScriptedDecoder {
    /// Produces a frame for exactly these URLs and fails everything else.
    pub fn working<'a>(urls: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            available: true,
            working: urls.into_iter().map(str::to_string).collect(),
            hang: false,
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            gauge: Gauge::new(),
        }
    }

    pub fn always_failing() -> Self {
        Self::working([])
    }

    /// Fails the availability check, as a missing binary would.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::always_failing()
        }
    }

    /// Never returns from a capture.
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::always_failing()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_gauge(mut self, gauge: Arc<Gauge>) -> Self {
        self.gauge = gauge;
        self
    }

    /// URLs handed to the decoder, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub fn gauge(&self) -> &Arc<Gauge> {
        &self.gauge
    }
}

#[async_trait]
impl FrameDecoder for ScriptedDecoder {
    async fn ensure_available(&self) -> Result<(), ScanError> {
        if self.available {
            Ok(())
        } else {
            Err(ScanError::DecoderUnavailable {
                program: "ffmpeg".into(),
                source: io::Error::from(io::ErrorKind::NotFound),
            })
        }
    }

    async fn capture_frame(&self, url: &str, limit: Duration) -> Result<FrameCapture, VerificationFailure> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(url.to_string());
        }
        let _live = self.gauge.enter();

        if self.hang {
            std::future::pending::<()>().await;
        }
        if !self.delay.is_zero() {
            if self.delay >= limit {
                tokio::time::sleep(limit).await;
                return Err(VerificationFailure::Timeout(limit));
            }
            tokio::time::sleep(self.delay).await;
        }

        if self.working.contains(url) {
            Ok(FrameCapture { bytes: FRAME_BYTES })
        } else {
            Err(VerificationFailure::Exit {
                code: Some(1),
                stderr: format!("{url}: Invalid data found when processing input"),
            })
        }
    }
}
