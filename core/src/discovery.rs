//! # Camera Discovery
//!
//! Runs the whole pipeline for one [`ScanSettings`]:
//! expand → sweep → probe → verify → report.
//!
//! Stages are separated by barriers. Probing only starts once the sweep has
//! committed every open port, and verification only once probing has
//! committed every responsive candidate. All stages share one
//! [`WorkerPool`], so the worker ceiling holds for the run as a whole.

use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use camsweep_common::config::ScanSettings;
use camsweep_common::error::ScanError;
use camsweep_common::models::{CandidateGenerator, RunStatus, ScanReport, Target};
use camsweep_common::network::address;
use camsweep_common::success;

use crate::aggregator::{ResultAggregator, RunMeta};
use crate::decoder::{FfmpegDecoder, FrameDecoder};
use crate::network::{TcpTransport, Transport};
use crate::pool::WorkerPool;
use crate::prober::EndpointProber;
use crate::progress::{Progress, Stage};
use crate::scanner::PortScanner;
use crate::verifier::StreamVerifier;

/// Lifecycle of a single run. Only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunState {
    Idle,
    Expanding,
    Scanning,
    Probing,
    Verifying,
    Aggregated,
    Cancelled,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("run cannot move from {from:?} to {to:?}")]
pub struct TransitionError {
    pub from: RunState,
    pub to: RunState,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Aggregated | RunState::Cancelled)
    }

    /// Moves to the next stage. Skipping ahead is allowed, going back is not.
    pub fn advance(&mut self, next: RunState) -> Result<(), TransitionError> {
        if self.is_terminal() || next <= *self || next == RunState::Cancelled {
            return Err(TransitionError { from: *self, to: next });
        }
        *self = next;
        Ok(())
    }

    /// Any state that has not finished may be cancelled.
    pub fn cancel(&mut self) -> Result<(), TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError {
                from: *self,
                to: RunState::Cancelled,
            });
        }
        *self = RunState::Cancelled;
        Ok(())
    }
}

pub struct Discovery<T, D> {
    transport: Arc<T>,
    decoder: Arc<D>,
    settings: ScanSettings,
    progress: Progress,
    cancel: CancellationToken,
}

impl Discovery<TcpTransport, FfmpegDecoder> {
    /// Real sockets and the configured decoder binary.
    pub fn from_settings(settings: ScanSettings) -> Self {
        let decoder = FfmpegDecoder::new(settings.decoder.clone());
        Self::new(Arc::new(TcpTransport), Arc::new(decoder), settings)
    }
}

impl<T: Transport, D: FrameDecoder> Discovery<T, D> {
    pub fn new(transport: Arc<T>, decoder: Arc<D>, settings: ScanSettings) -> Self {
        Self {
            transport,
            decoder,
            settings,
            progress: Progress::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Cancelling this token stops the run and yields a partial report.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    /// Executes the run.
    ///
    /// Fails only on invalid input or a missing decoder, both detected
    /// before the first connection attempt. Everything after that ends in a
    /// report, `cancelled` if the token fired.
    pub async fn run(&self) -> Result<ScanReport, ScanError> {
        let settings = &self.settings;
        settings.validate()?;

        let mut state = RunState::Idle;
        let mut aggregator = ResultAggregator::new();
        let meta = RunMeta {
            address_range: settings.address.clone(),
            ports_scanned: settings.ports.clone(),
        };

        self.enter(&mut state, RunState::Expanding);
        let hosts = address::expand(&settings.address)?;
        aggregator.record_hosts(hosts.len());
        self.decoder.ensure_available().await?;

        if self.cancel.is_cancelled() {
            return Ok(self.abort(state, aggregator, meta));
        }

        // Port sweep
        self.enter(&mut state, RunState::Scanning);
        let pool = WorkerPool::new(settings.workers);
        let targets = Target::cross(&hosts, &settings.ports);
        info!(
            "Sweeping {} ports on {} hosts with {} workers",
            settings.ports.len(),
            hosts.len(),
            pool.size()
        );

        let sweep = PortScanner::new(self.transport.clone(), settings.connect_timeout)
            .sweep(targets, &pool, &self.cancel, &self.progress)
            .await;
        aggregator.record_port_attempts(sweep.attempts);
        for target in sweep.open {
            success!("Open port {target}");
            aggregator.record_open_port(target);
        }
        info!(
            "Sweep done: {} open, {} closed, {} filtered",
            aggregator.open_ports().len(),
            sweep.closed,
            sweep.filtered
        );
        if !sweep.finished {
            return Ok(self.abort(state, aggregator, meta));
        }

        // DESCRIBE probes
        self.enter(&mut state, RunState::Probing);
        let candidates = CandidateGenerator::new(
            aggregator.open_ports().to_vec(),
            settings.credentials.clone(),
            settings.paths.clone(),
        );
        let total = candidates.total();
        aggregator.record_candidates(total);
        info!("Probing {total} candidate endpoints");

        let prober = Arc::new(EndpointProber::new(
            self.transport.clone(),
            settings.probe_timeout,
            settings.retries,
        ));
        let mut completed = 0;
        let finished = pool
            .run(
                &self.cancel,
                candidates,
                |candidate| {
                    let prober = prober.clone();
                    async move { prober.probe(candidate).await }
                },
                |result| {
                    completed += 1;
                    self.progress.report(Stage::Probing, completed, total);
                    if result.responsive {
                        success!("{} answered {}", result.candidate, result.status_detail);
                    }
                    aggregator.record_probe(result);
                },
            )
            .await;
        if !finished {
            return Ok(self.abort(state, aggregator, meta));
        }

        // Frame grabs
        self.enter(&mut state, RunState::Verifying);
        let responsive = aggregator.responsive_candidates();
        let total = responsive.len();
        info!("Verifying {total} responsive endpoints");

        let verifier = Arc::new(StreamVerifier::new(self.decoder.clone(), settings.verify_timeout));
        let mut completed = 0;
        let finished = pool
            .run(
                &self.cancel,
                responsive,
                |candidate| {
                    let verifier = verifier.clone();
                    async move { verifier.verify(candidate).await }
                },
                |stream| {
                    completed += 1;
                    self.progress.report(Stage::Verifying, completed, total);
                    if stream.frame_captured {
                        success!("Working stream {}", stream.candidate);
                    }
                    aggregator.record_verification(stream);
                },
            )
            .await;
        if !finished {
            return Ok(self.abort(state, aggregator, meta));
        }

        self.enter(&mut state, RunState::Aggregated);
        Ok(aggregator.finish(meta, RunStatus::Completed))
    }

    fn enter(&self, state: &mut RunState, next: RunState) {
        match state.advance(next) {
            Ok(()) => debug!("run entered {next:?}"),
            Err(e) => debug!("{e}"),
        }
    }

    fn abort(&self, mut state: RunState, aggregator: ResultAggregator, meta: RunMeta) -> ScanReport {
        info!("Run cancelled during {state:?}, keeping partial results");
        let _ = state.cancel();
        aggregator.finish(meta, RunStatus::Cancelled)
    }
}
