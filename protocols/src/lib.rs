//! Just enough RTSP/1.0 to ask a camera whether a URL exists: request
//! encoding, status-line and header parsing, and the two authorization
//! schemes cameras challenge with.

pub mod auth;
pub mod request;
pub mod response;

pub use auth::Challenge;
pub use request::RtspRequest;
pub use response::{RtspError, RtspResponse};

pub const RTSP_VERSION: &str = "RTSP/1.0";
pub const USER_AGENT: &str = concat!("camsweep/", env!("CARGO_PKG_VERSION"));
