use chrono::{DateTime, Local};
use serde::Serialize;

use crate::models::{Candidate, Target};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenPortResult {
    #[serde(flatten)]
    pub target: Target,
}

/// Outcome of the DESCRIBE exchange against one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub candidate: Candidate,
    pub responsive: bool,
    pub status_detail: String,
    pub attempts: u32,
}

/// Outcome of a decode attempt. Only captured frames reach the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifiedStream {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub frame_captured: bool,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Completed,
    Cancelled,
}

/// Attempt counters, filled in by the aggregator as findings arrive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub hosts: usize,
    pub port_attempts: usize,
    pub candidates: usize,
    pub probe_attempts: usize,
    pub responsive: usize,
    pub verification_attempts: usize,
}

/// Final, write-once result of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
    pub scan_time: DateTime<Local>,
    pub address_range: String,
    pub ports_scanned: Vec<u16>,
    pub status: RunStatus,
    pub open_ports: Vec<OpenPortResult>,
    /// Endpoints that accepted DESCRIBE, whether or not a frame followed.
    pub responsive_endpoints: Vec<String>,
    pub working_streams: Vec<VerifiedStream>,
    pub stats: ScanStats,
}

impl ScanReport {
    pub fn is_cancelled(&self) -> bool {
        self.status == RunStatus::Cancelled
    }

    pub fn working_urls(&self) -> impl Iterator<Item = &str> {
        self.working_streams.iter().map(|s| s.candidate.url.as_str())
    }
}
