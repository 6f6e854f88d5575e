use std::net::{IpAddr, Ipv4Addr};

use pnet::ipnetwork::Ipv4Network;

/// An inclusive span of IPv4 addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Range {
    pub start_addr: Ipv4Addr,
    pub end_addr: Ipv4Addr,
}

impl Ipv4Range {
    pub fn new(start_addr: Ipv4Addr, end_addr: Ipv4Addr) -> Self {
        Self {
            start_addr,
            end_addr,
        }
    }

    pub fn len(&self) -> usize {
        let start: u32 = self.start_addr.into();
        let end: u32 = self.end_addr.into();
        end.checked_sub(start).map_or(0, |span| span as usize + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_iter(&self) -> impl Iterator<Item = IpAddr> {
        let start: u32 = self.start_addr.into();
        let end: u32 = self.end_addr.into();
        (start..=end).map(|ip| IpAddr::V4(Ipv4Addr::from(ip)))
    }
}

/// Usable hosts of a CIDR block.
///
/// Network and broadcast addresses are stripped for every prefix shorter than
/// `/31`. A `/31` is a point-to-point link and keeps both addresses, a `/32`
/// is the host itself. Host bits in `ip` are ignored.
pub fn cidr_hosts(ip: Ipv4Addr, prefix: u8) -> Result<Ipv4Range, String> {
    let network = Ipv4Network::new(ip, prefix).map_err(|e| e.to_string())?;

    match network.prefix() {
        32 => Ok(Ipv4Range::new(ip, ip)),
        31 => Ok(Ipv4Range::new(network.network(), network.broadcast())),
        _ => {
            let start = u32::from(network.network()) + 1;
            let end = u32::from(network.broadcast()) - 1;
            Ok(Ipv4Range::new(Ipv4Addr::from(start), Ipv4Addr::from(end)))
        }
    }
}
