use thiserror::Error;

use crate::RTSP_VERSION;

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RtspError {
    #[error("response headers are incomplete")]
    Incomplete,
    #[error("status line is missing")]
    MissingStatusLine,
    #[error("unexpected protocol version '{0}'")]
    BadVersion(String),
    #[error("unparseable status code '{0}'")]
    BadStatus(String),
}

/// Status line and headers of an RTSP response. Any body is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtspResponse {
    pub status_code: u16,
    pub reason: String,
    pub headers: Vec<(String, String)>,
}

impl RtspResponse {
    /// Parses the head of a response.
    ///
    /// `buf` must hold at least the full header block; bytes after the blank
    /// line are not looked at.
    pub fn parse(buf: &[u8]) -> Result<Self, RtspError> {
        let end = header_end(buf).ok_or(RtspError::Incomplete)?;
        let head = String::from_utf8_lossy(&buf[..end]);
        let mut lines = head.split("\r\n");

        let status_line = lines
            .next()
            .filter(|l| !l.is_empty())
            .ok_or(RtspError::MissingStatusLine)?;

        let mut parts = status_line.splitn(3, ' ');
        let version = parts.next().unwrap_or_default();
        if !version.starts_with("RTSP/") {
            return Err(RtspError::BadVersion(version.to_string()));
        }
        if version != RTSP_VERSION {
            tracing::trace!("server answered with {version}");
        }

        let code = parts.next().unwrap_or_default();
        let status_code = code
            .parse::<u16>()
            .ok()
            .filter(|c| (100..1000).contains(c))
            .ok_or_else(|| RtspError::BadStatus(code.to_string()))?;
        let reason = parts.next().unwrap_or_default().trim().to_string();

        let headers = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
            .collect();

        Ok(Self {
            status_code,
            reason,
            headers,
        })
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// First header with the given name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Offset just past the blank line ending the header block, if present.
pub fn header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(HEADER_TERMINATOR.len())
        .position(|w| w == HEADER_TERMINATOR)
        .map(|pos| pos + HEADER_TERMINATOR.len())
}
