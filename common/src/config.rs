use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ScanError;
use crate::models::{Credential, PathTemplate};

pub const DEFAULT_ADDRESS: &str = "192.168.1.0/24";
pub const DEFAULT_PORTS: &str = "554,8554";
pub const DEFAULT_DECODER: &str = "ffmpeg";

/// Stream paths commonly served by IP cameras and NVRs.
pub const DEFAULT_PATHS: &str = "/onvif/profile1/media.smp,/,/1,/Streaming/Channels/1,\
/profile5/media.smp,/onvif/profile5/media.smp,/onvif/profile2/media.smp,/profile2/media.smp,\
/cam/h264,/live/ch00_0,/live/h264/ch1,/cam/realmonitor?channel=1&subtype=1,\
/cam/realmonitor?channel=1&subtype=00,/0/main,/mpeg4unicast,/MediaInput/h264,/profile1/media.smp,\
/mpeg4/1/media.amp,/h264_pcm.sdp,/onvif/profile4/media.smp,/profile4/media.smp,\
/onvif/profile6/media.smp,/mjpeg/media.smp,/MJPEG/media.smp,/H264/media.smp,/profile1/media.smp,\
/Streaming/Channels/101,/live,/live2,/h264Preview_01_main,/h264Preview_01_sub,/cam/realmonitor";

/// Everything a run needs, already parsed.
#[derive(Debug, Clone)]
pub struct ScanSettings {
    /// Address, CIDR block, range or a comma separated list of those.
    pub address: String,
    pub ports: Vec<u16>,
    /// Empty means a single anonymous attempt per target and path.
    pub credentials: Vec<Credential>,
    pub paths: Vec<PathTemplate>,
    /// Bound on a single TCP connect during the sweep.
    pub connect_timeout: Duration,
    /// Bound on one DESCRIBE attempt.
    pub probe_timeout: Duration,
    /// Bound on one decoder run.
    pub verify_timeout: Duration,
    /// Extra DESCRIBE attempts after the first failure.
    pub retries: u32,
    /// Run-wide ceiling on concurrent connections and decoder processes.
    pub workers: usize,
    pub decoder: PathBuf,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            ports: vec![554, 8554],
            credentials: Vec::new(),
            paths: PathTemplate::parse_list(DEFAULT_PATHS),
            connect_timeout: Duration::from_secs(1),
            probe_timeout: Duration::from_secs(10),
            verify_timeout: Duration::from_secs(10),
            retries: 1,
            workers: 50,
            decoder: PathBuf::from(DEFAULT_DECODER),
        }
    }
}

impl ScanSettings {
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.workers == 0 {
            return Err(ScanError::InvalidConfig("worker count must be at least 1".into()));
        }
        if self.ports.is_empty() {
            return Err(ScanError::InvalidConfig("no ports to scan".into()));
        }
        if self.paths.is_empty() {
            return Err(ScanError::InvalidConfig("no stream paths to try".into()));
        }
        if self.connect_timeout.is_zero() || self.probe_timeout.is_zero() || self.verify_timeout.is_zero() {
            return Err(ScanError::InvalidConfig("timeouts must be non-zero".into()));
        }
        Ok(())
    }
}

/// Parses `554,8554,8000-8010`, dropping repeats and keeping first-seen order.
pub fn parse_ports(s: &str) -> Result<Vec<u16>, ScanError> {
    let mut seen = HashSet::new();
    let mut ports = Vec::new();

    for token in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let (start, end) = match token.split_once('-') {
            Some((start, end)) => (parse_port(start)?, parse_port(end)?),
            None => {
                let port = parse_port(token)?;
                (port, port)
            }
        };

        if start > end {
            return Err(ScanError::InvalidConfig(format!("port range '{token}' is reversed")));
        }

        for port in start..=end {
            if seen.insert(port) {
                ports.push(port);
            }
        }
    }

    if ports.is_empty() {
        return Err(ScanError::InvalidConfig("no ports to scan".into()));
    }
    Ok(ports)
}

fn parse_port(s: &str) -> Result<u16, ScanError> {
    match s.trim().parse::<u16>() {
        Ok(0) | Err(_) => Err(ScanError::InvalidConfig(format!("'{s}' is not a valid port"))),
        Ok(port) => Ok(port),
    }
}
