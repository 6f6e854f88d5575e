pub mod tcp;
pub mod transport;

pub use tcp::TcpTransport;
pub use transport::{PortState, Transport};
