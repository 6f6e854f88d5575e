//! A network made of in-process RTSP servers.
//!
//! Every connect hands out one half of a `tokio::io::duplex` pipe; the other
//! half is served by a task that answers `DESCRIBE` the way a camera would.

use std::collections::{HashMap, HashSet};
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, DuplexStream, ReadBuf};

use camsweep_core::network::Transport;
use camsweep_protocols::auth::basic_authorization;

use crate::fakes::{Gauge, GaugeGuard};

const PIPE_CAPACITY: usize = 16 * 1024;
const SDP_BODY: &str = "v=0\r\no=- 0 0 IN IP4 0.0.0.0\r\ns=fake\r\n";

/// An RTSP server serving a fixed set of paths.
#[derive(Debug)]
pub struct FakeCamera {
    paths: HashSet<String>,
    authorization: Option<String>,
    drop_first: usize,
    stall: bool,
    delay: Duration,
    requests: AtomicUsize,
}

impl FakeCamera {
    pub fn new<'a>(paths: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            paths: paths.into_iter().map(str::to_string).collect(),
            authorization: None,
            drop_first: 0,
            stall: false,
            delay: Duration::ZERO,
            requests: AtomicUsize::new(0),
        }
    }

    /// Challenges with Basic auth until the right credential is presented.
    pub fn with_basic_auth(mut self, username: &str, password: &str) -> Self {
        self.authorization = Some(basic_authorization(username, password));
        self
    }

    /// Hangs up without answering the first `count` requests.
    pub fn dropping_first(mut self, count: usize) -> Self {
        self.drop_first = count;
        self
    }

    /// Reads requests but never answers them.
    pub fn stalled(mut self) -> Self {
        self.stall = true;
        self
    }

    /// Waits this long before every answer.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// `DESCRIBE` requests received so far, including unanswered ones.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    async fn serve(self: Arc<Self>, stream: DuplexStream) {
        let mut reader = BufReader::new(stream);

        loop {
            let mut head: Vec<String> = Vec::new();
            loop {
                let mut line = String::new();
                match reader.read_line(&mut line).await {
                    Ok(0) | Err(_) => return,
                    Ok(_) => {}
                }
                if line == "\r\n" {
                    break;
                }
                head.push(line.trim_end().to_string());
            }

            let seen = self.requests.fetch_add(1, Ordering::SeqCst);
            if seen < self.drop_first {
                return;
            }
            if self.stall {
                std::future::pending::<()>().await;
            }
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let response = self.respond(&head);
            if reader.get_mut().write_all(response.as_bytes()).await.is_err() {
                return;
            }
        }
    }

    fn respond(&self, head: &[String]) -> String {
        let cseq = header(head, "CSeq").unwrap_or("0");
        let path = head.first().and_then(|line| request_path(line)).unwrap_or_default();

        if let Some(expected) = &self.authorization {
            if header(head, "Authorization") != Some(expected.as_str()) {
                return format!(
                    "RTSP/1.0 401 Unauthorized\r\nCSeq: {cseq}\r\nWWW-Authenticate: Basic realm=\"fake\"\r\n\r\n"
                );
            }
        }

        if !self.paths.contains(path) {
            return format!("RTSP/1.0 404 Not Found\r\nCSeq: {cseq}\r\n\r\n");
        }

        format!(
            "RTSP/1.0 200 OK\r\nCSeq: {cseq}\r\nContent-Type: application/sdp\r\nContent-Length: {}\r\n\r\n{SDP_BODY}",
            SDP_BODY.len()
        )
    }
}

fn header<'a>(head: &'a [String], name: &str) -> Option<&'a str> {
    head.iter().skip(1).find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim().eq_ignore_ascii_case(name).then(|| value.trim())
    })
}

/// `DESCRIBE rtsp://host:port/path RTSP/1.0` → `/path`
fn request_path(request_line: &str) -> Option<&str> {
    let uri = request_line.split_whitespace().nth(1)?;
    let rest = uri.strip_prefix("rtsp://")?;
    rest.find('/').map(|idx| &rest[idx..])
}

#[derive(Debug, Clone)]
enum Endpoint {
    Camera(Arc<FakeCamera>),
    /// Accepts, writes a banner and hangs up.
    Banner(&'static str),
    /// Connect never completes.
    Blackhole,
}

/// What a connect to an unknown address does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unknown {
    Refuse,
    Blackhole,
}

#[derive(Debug)]
pub struct FakeNetwork {
    endpoints: HashMap<SocketAddr, Endpoint>,
    unknown: Unknown,
    connects: AtomicUsize,
    gauge: Arc<Gauge>,
}

impl Default for FakeNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeNetwork {
    pub fn new() -> Self {
        Self {
            endpoints: HashMap::new(),
            unknown: Unknown::Refuse,
            connects: AtomicUsize::new(0),
            gauge: Gauge::new(),
        }
    }

    pub fn with_camera(mut self, addr: &str, camera: FakeCamera) -> Self {
        self.endpoints.insert(socket(addr), Endpoint::Camera(Arc::new(camera)));
        self
    }

    pub fn with_banner(mut self, addr: &str, banner: &'static str) -> Self {
        self.endpoints.insert(socket(addr), Endpoint::Banner(banner));
        self
    }

    pub fn with_unknown(mut self, unknown: Unknown) -> Self {
        self.unknown = unknown;
        self
    }

    /// Shares the live-connection gauge with other fakes.
    pub fn with_gauge(mut self, gauge: Arc<Gauge>) -> Self {
        self.gauge = gauge;
        self
    }

    pub fn camera(&self, addr: &str) -> Option<Arc<FakeCamera>> {
        match self.endpoints.get(&socket(addr)) {
            Some(Endpoint::Camera(camera)) => Some(camera.clone()),
            _ => None,
        }
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn gauge(&self) -> &Arc<Gauge> {
        &self.gauge
    }
}

#[async_trait]
impl Transport for FakeNetwork {
    type Stream = FakeStream;

    async fn connect(&self, addr: SocketAddr) -> io::Result<FakeStream> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let guard = self.gauge.enter();

        let endpoint = match self.endpoints.get(&addr) {
            Some(endpoint) => endpoint.clone(),
            None if self.unknown == Unknown::Blackhole => Endpoint::Blackhole,
            None => return Err(io::Error::from(io::ErrorKind::ConnectionRefused)),
        };

        let (client, server) = tokio::io::duplex(PIPE_CAPACITY);
        match endpoint {
            Endpoint::Camera(camera) => {
                tokio::spawn(camera.serve(server));
            }
            Endpoint::Banner(banner) => {
                tokio::spawn(async move {
                    let mut server = server;
                    let _ = server.write_all(banner.as_bytes()).await;
                });
            }
            Endpoint::Blackhole => std::future::pending::<()>().await,
        }

        Ok(FakeStream {
            inner: client,
            _guard: guard,
        })
    }
}

/// Client half of a fake connection. Counts as live until dropped.
#[derive(Debug)]
pub struct FakeStream {
    inner: DuplexStream,
    _guard: GaugeGuard,
}

impl AsyncRead for FakeStream {
    fn poll_read(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for FakeStream {
    fn poll_write(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

fn socket(addr: &str) -> SocketAddr {
    addr.parse().expect("fake endpoint address must be ip:port")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_path_strips_scheme_and_authority() {
        assert_eq!(request_path("DESCRIBE rtsp://10.0.0.5:554/live RTSP/1.0"), Some("/live"));
        assert_eq!(
            request_path("DESCRIBE rtsp://[fe80::1]:554/cam/realmonitor?channel=1 RTSP/1.0"),
            Some("/cam/realmonitor?channel=1")
        );
        assert_eq!(request_path("garbage"), None);
    }

    #[test]
    fn camera_answers_by_path_and_credential() {
        let camera = FakeCamera::new(["/live"]).with_basic_auth("admin", "admin");
        let request = |auth: Option<&str>, path: &str| {
            let mut head = vec![format!("DESCRIBE rtsp://10.0.0.5:554{path} RTSP/1.0"), "CSeq: 3".to_string()];
            if let Some(auth) = auth {
                head.push(format!("Authorization: {auth}"));
            }
            camera.respond(&head)
        };

        assert!(request(None, "/live").starts_with("RTSP/1.0 401"));
        assert!(request(Some("Basic YWRtaW46YWRtaW4="), "/live").starts_with("RTSP/1.0 200 OK\r\nCSeq: 3\r\n"));
        assert!(request(Some("Basic YWRtaW46YWRtaW4="), "/other").starts_with("RTSP/1.0 404"));
    }
}
