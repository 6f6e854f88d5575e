//! The seam between the pipeline and the network.
//!
//! Everything above this module talks to a [`Transport`], which lets the
//! sweep and the prober run against an in-memory network in tests.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::timeout;

use camsweep_common::error::ConnectionFailure;

#[async_trait]
pub trait Transport: Send + Sync + 'static {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Opens a stream to `addr`. Callers bound this with their own timeout.
    async fn connect(&self, addr: SocketAddr) -> io::Result<Self::Stream>;
}

/// Classification of a single connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortState {
    Open,
    /// Actively refused.
    Closed,
    /// No answer within the timeout, or an error other than a refusal.
    Filtered,
}

/// Connects once and throws the stream away.
pub async fn check_port<T: Transport + ?Sized>(transport: &T, addr: SocketAddr, limit: Duration) -> PortState {
    match connect_within(transport, addr, limit).await {
        Ok(_) => PortState::Open,
        Err(ConnectionFailure::Refused) => PortState::Closed,
        Err(_) => PortState::Filtered,
    }
}

pub async fn connect_within<T: Transport + ?Sized>(
    transport: &T,
    addr: SocketAddr,
    limit: Duration,
) -> Result<T::Stream, ConnectionFailure> {
    match timeout(limit, transport.connect(addr)).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(e)) => Err(ConnectionFailure::from_connect(e)),
        Err(_elapsed) => Err(ConnectionFailure::Timeout(limit)),
    }
}
