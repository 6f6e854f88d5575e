pub mod config;
pub mod error;
pub mod models;
pub mod network;

/// Logs an event that the terminal renders with the success marker.
#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {
        ::tracing::info!(target: "camsweep::success", $($arg)*)
    };
}
