//! Lightweight RTSP check: does anything answer `DESCRIBE` on this URL with
//! this credential?
//!
//! A probe sends `DESCRIBE` without credentials first. When the server
//! challenges with `401` and the candidate has a credential, the challenge
//! is answered once on the same connection. Any failure is retried with the
//! same parameters up to the configured count, which absorbs the transient
//! resets cheap camera firmware is known for.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::{debug, trace};

use camsweep_common::error::ConnectionFailure;
use camsweep_common::models::{Candidate, ProbeResult};
use camsweep_protocols::response::header_end;
use camsweep_protocols::{Challenge, RtspRequest, RtspResponse};

use crate::network::transport::{self, Transport};

const MAX_HEAD_LEN: usize = 16 * 1024;
const MAX_BODY_SKIP: usize = 64 * 1024;
const STATUS_UNAUTHORIZED: u16 = 401;

pub struct EndpointProber<T> {
    transport: Arc<T>,
    timeout: Duration,
    retries: u32,
}

impl<T: Transport> EndpointProber<T> {
    pub fn new(transport: Arc<T>, timeout: Duration, retries: u32) -> Self {
        Self {
            transport,
            timeout,
            retries,
        }
    }

    /// Classifies `candidate`, making at most `1 + retries` attempts.
    pub async fn probe(&self, candidate: Candidate) -> ProbeResult {
        let mut attempts: u32 = 0;
        let mut last_failure = ConnectionFailure::Timeout(self.timeout);

        while attempts <= self.retries {
            attempts += 1;

            let outcome = match timeout(self.timeout, self.describe(&candidate)).await {
                Ok(outcome) => outcome,
                Err(_elapsed) => Err(ConnectionFailure::Timeout(self.timeout)),
            };

            match outcome {
                Ok(response) => {
                    debug!("{candidate} answered {} after {attempts} attempt(s)", response.status_code);
                    return ProbeResult {
                        status_detail: format!("{} {}", response.status_code, response.reason),
                        candidate,
                        responsive: true,
                        attempts,
                    };
                }
                Err(failure) => {
                    trace!("{candidate} attempt {attempts}: {failure}");
                    last_failure = failure;
                }
            }
        }

        ProbeResult {
            candidate,
            responsive: false,
            status_detail: last_failure.to_string(),
            attempts,
        }
    }

    async fn describe(&self, candidate: &Candidate) -> Result<RtspResponse, ConnectionFailure> {
        let mut stream = transport::connect_within(self.transport.as_ref(), candidate.target.socket_addr(), self.timeout).await?;
        let uri = candidate.request_uri();

        let mut response = exchange(&mut stream, &RtspRequest::describe(&uri, 1)).await?;

        if response.status_code == STATUS_UNAUTHORIZED && !candidate.credential.is_anonymous() {
            let challenge = Challenge::select(response.headers_named("WWW-Authenticate"));
            if let Some(challenge) = challenge {
                let credential = &candidate.credential;
                let authorization = challenge.authorization(
                    &credential.username,
                    credential.password.as_deref().unwrap_or_default(),
                    "DESCRIBE",
                    &uri,
                );
                let request = RtspRequest::describe(&uri, 2).with_header("Authorization", &authorization);
                response = exchange(&mut stream, &request).await?;
            }
        }

        if response.is_success() {
            Ok(response)
        } else {
            Err(ConnectionFailure::Rejected {
                status: response.status_code,
            })
        }
    }
}

async fn exchange<S>(stream: &mut S, request: &RtspRequest) -> Result<RtspResponse, ConnectionFailure>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(request.serialize().as_bytes()).await?;
    stream.flush().await?;
    read_response(stream).await
}

/// Reads one response head and discards its body, leaving the stream
/// positioned at the next response.
async fn read_response<S>(stream: &mut S) -> Result<RtspResponse, ConnectionFailure>
where
    S: AsyncRead + Unpin,
{
    let mut buf: Vec<u8> = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    let head_len = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(ConnectionFailure::Protocol("connection closed before response".into()));
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some(end) = header_end(&buf) {
            break end;
        }
        if buf.len() > MAX_HEAD_LEN {
            return Err(ConnectionFailure::Protocol("response head too large".into()));
        }
    };

    let response = RtspResponse::parse(&buf).map_err(|e| ConnectionFailure::Protocol(e.to_string()))?;

    let body_len = response
        .header("Content-Length")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut remaining = body_len.min(MAX_BODY_SKIP).saturating_sub(buf.len() - head_len);
    while remaining > 0 {
        let n = stream.read(&mut chunk[..remaining.min(1024)]).await?;
        if n == 0 {
            break;
        }
        remaining -= n;
    }

    Ok(response)
}
