pub mod aggregator;
pub mod decoder;
pub mod discovery;
pub mod network;
pub mod pool;
pub mod progress;
pub mod prober;
pub mod scanner;
pub mod verifier;

pub use discovery::{Discovery, RunState};
pub use tokio_util::sync::CancellationToken;
