use std::fmt;
use std::net::{IpAddr, SocketAddr};

use serde::Serialize;

/// One (host, port) pair of the sweep.
///
/// Ordering is by host, then port, which is also the order reports group by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Target {
    #[serde(rename = "ip")]
    pub host: IpAddr,
    pub port: u16,
}

impl Target {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self { host, port }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Every host paired with every port, host-major.
    pub fn cross(hosts: &[IpAddr], ports: &[u16]) -> Vec<Target> {
        hosts
            .iter()
            .flat_map(|host| ports.iter().map(move |port| Target::new(*host, *port)))
            .collect()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.socket_addr())
    }
}

impl From<SocketAddr> for Target {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip(), addr.port())
    }
}
