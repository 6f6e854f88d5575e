//! Single owner of everything a run has found so far.
//!
//! Findings may arrive in any completion order; [`ResultAggregator::finish`]
//! sorts them by host and generation ordinal so the same network always
//! yields the same report.

use chrono::Local;

use camsweep_common::models::{
    Candidate, OpenPortResult, ProbeResult, RunStatus, ScanReport, ScanStats, Target, VerifiedStream,
};

/// What the report says about the run itself rather than its findings.
#[derive(Debug, Clone, Default)]
pub struct RunMeta {
    pub address_range: String,
    pub ports_scanned: Vec<u16>,
}

#[derive(Debug, Default)]
pub struct ResultAggregator {
    open_ports: Vec<Target>,
    responsive: Vec<Candidate>,
    streams: Vec<VerifiedStream>,
    stats: ScanStats,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hosts(&mut self, hosts: usize) {
        self.stats.hosts = hosts;
    }

    pub fn record_port_attempts(&mut self, attempts: usize) {
        self.stats.port_attempts += attempts;
    }

    pub fn record_open_port(&mut self, target: Target) {
        if !self.open_ports.contains(&target) {
            self.open_ports.push(target);
        }
    }

    pub fn record_candidates(&mut self, total: usize) {
        self.stats.candidates += total;
    }

    pub fn record_probe(&mut self, result: ProbeResult) {
        self.stats.probe_attempts += result.attempts as usize;
        if result.responsive {
            self.stats.responsive += 1;
            self.responsive.push(result.candidate);
        }
    }

    pub fn record_verification(&mut self, stream: VerifiedStream) {
        self.stats.verification_attempts += 1;
        if stream.frame_captured {
            self.streams.push(stream);
        }
    }

    pub fn open_ports(&self) -> &[Target] {
        &self.open_ports
    }

    /// Responsive candidates in report order, ready for verification.
    pub fn responsive_candidates(&self) -> Vec<Candidate> {
        let mut candidates = self.responsive.clone();
        candidates.sort_by_key(|c| (c.target.host, c.ordinal));
        candidates
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    pub fn finish(mut self, meta: RunMeta, status: RunStatus) -> ScanReport {
        // Stable: ports of one host keep their configured order.
        self.open_ports.sort_by_key(|t| t.host);
        self.responsive.sort_by_key(|c| (c.target.host, c.ordinal));
        self.streams.sort_by_key(|s| (s.candidate.target.host, s.candidate.ordinal));

        ScanReport {
            scan_time: Local::now(),
            address_range: meta.address_range,
            ports_scanned: meta.ports_scanned,
            status,
            open_ports: self.open_ports.into_iter().map(|target| OpenPortResult { target }).collect(),
            responsive_endpoints: self.responsive.into_iter().map(|c| c.url).collect(),
            working_streams: self.streams,
            stats: self.stats,
        }
    }
}
