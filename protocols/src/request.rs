use crate::{RTSP_VERSION, USER_AGENT};

/// An outgoing RTSP request. Bodies are never sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtspRequest {
    pub method: &'static str,
    pub uri: String,
    pub cseq: u32,
    pub headers: Vec<(String, String)>,
}

impl RtspRequest {
    pub fn new(method: &'static str, uri: &str, cseq: u32) -> Self {
        Self {
            method,
            uri: uri.to_string(),
            cseq,
            headers: vec![("User-Agent".to_string(), USER_AGENT.to_string())],
        }
    }

    /// `DESCRIBE` asking for an SDP session description.
    pub fn describe(uri: &str, cseq: u32) -> Self {
        Self::new("DESCRIBE", uri, cseq).with_header("Accept", "application/sdp")
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn serialize(&self) -> String {
        let mut request = format!("{} {} {}\r\nCSeq: {}\r\n", self.method, self.uri, RTSP_VERSION, self.cseq);
        for (name, value) in &self.headers {
            request.push_str(&format!("{name}: {value}\r\n"));
        }
        request.push_str("\r\n");
        request
    }
}
