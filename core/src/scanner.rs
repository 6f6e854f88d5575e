//! Bounded-concurrency TCP connect sweep.
//!
//! Every (host, port) pair gets exactly one connection attempt. Results are
//! committed in sweep order (host-major, then configured port order) no
//! matter which attempt finished first.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use camsweep_common::models::Target;

use crate::network::transport::{self, PortState, Transport};
use crate::pool::WorkerPool;
use crate::progress::{Progress, Stage};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Open targets in sweep order.
    pub open: Vec<Target>,
    pub attempts: usize,
    pub closed: usize,
    pub filtered: usize,
    /// `false` when cancellation cut the sweep short.
    pub finished: bool,
}

pub struct PortScanner<T> {
    transport: Arc<T>,
    connect_timeout: Duration,
}

impl<T: Transport> PortScanner<T> {
    pub fn new(transport: Arc<T>, connect_timeout: Duration) -> Self {
        Self {
            transport,
            connect_timeout,
        }
    }

    pub async fn sweep(
        &self,
        targets: Vec<Target>,
        pool: &WorkerPool,
        cancel: &CancellationToken,
        progress: &Progress,
    ) -> SweepOutcome {
        let total = targets.len();
        let mut states: Vec<(usize, Target, PortState)> = Vec::with_capacity(total);

        let finished = pool
            .run(
                cancel,
                targets.into_iter().enumerate(),
                |(ordinal, target)| {
                    let transport = self.transport.clone();
                    let limit = self.connect_timeout;
                    async move {
                        let state = transport::check_port(transport.as_ref(), target.socket_addr(), limit).await;
                        (ordinal, target, state)
                    }
                },
                |(ordinal, target, state)| {
                    debug!("{target} is {state:?}");
                    states.push((ordinal, target, state));
                    progress.report(Stage::Scanning, states.len(), total);
                },
            )
            .await;

        states.sort_unstable_by_key(|(ordinal, _, _)| *ordinal);

        let mut outcome = SweepOutcome {
            attempts: states.len(),
            finished,
            ..SweepOutcome::default()
        };
        for (_, target, state) in states {
            match state {
                PortState::Open => outcome.open.push(target),
                PortState::Closed => outcome.closed += 1,
                PortState::Filtered => outcome.filtered += 1,
            }
        }
        outcome
    }
}
