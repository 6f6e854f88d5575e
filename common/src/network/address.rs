//! # Address Input
//!
//! Parses what the operator typed into something that can be expanded into
//! hosts. Accepted forms:
//! * A single IPv4/IPv6 address (`192.168.1.5`).
//! * A CIDR block (`192.168.1.0/24`, host bits are ignored).
//! * An IPv4 range (`192.168.1.1-50`, `192.168.1.1-192.168.2.10`).
//! * A comma separated list of the above.

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use crate::error::ScanError;
use crate::network::range::{self, Ipv4Range};

/// Largest number of hosts a single run may expand to (a `/12`).
pub const MAX_HOSTS: usize = 1 << 20;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AddressSpec {
    /// Exactly one host.
    Host { addr: IpAddr },
    /// A contiguous block of IPv4 hosts, already reduced to usable addresses.
    Block { range: Ipv4Range },
    /// Several specs, expanded in the order given.
    Multi { specs: Vec<AddressSpec> },
}

impl FromStr for AddressSpec {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ScanError::invalid_address(s, "empty input"));
        }

        if s.contains(',') {
            return parse_commas(s);
        }

        if let Ok(addr) = s.parse::<IpAddr>() {
            return Ok(AddressSpec::Host { addr });
        }

        if let Some(spec) = parse_cidr(s)? {
            return Ok(spec);
        }

        if let Some(spec) = parse_ip_range(s)? {
            return Ok(spec);
        }

        Err(ScanError::invalid_address(s, "not an address, CIDR block or range"))
    }
}

impl AddressSpec {
    /// Hosts before deduplication. Never allocates.
    pub fn host_count(&self) -> usize {
        match self {
            AddressSpec::Host { .. } => 1,
            AddressSpec::Block { range } => range.len(),
            AddressSpec::Multi { specs } => specs.iter().map(AddressSpec::host_count).sum(),
        }
    }

    /// Concrete hosts to scan, deduplicated with the first occurrence kept.
    pub fn expand(&self) -> Vec<IpAddr> {
        if let AddressSpec::Block { range } = self {
            return range.to_iter().collect();
        }

        let mut seen: HashSet<IpAddr> = HashSet::new();
        let mut hosts: Vec<IpAddr> = Vec::new();
        self.collect_into(&mut seen, &mut hosts);
        hosts
    }

    fn collect_into(&self, seen: &mut HashSet<IpAddr>, hosts: &mut Vec<IpAddr>) {
        match self {
            AddressSpec::Host { addr } => {
                if seen.insert(*addr) {
                    hosts.push(*addr);
                }
            }
            AddressSpec::Block { range } => {
                for addr in range.to_iter() {
                    if seen.insert(addr) {
                        hosts.push(addr);
                    }
                }
            }
            AddressSpec::Multi { specs } => {
                for spec in specs {
                    spec.collect_into(seen, hosts);
                }
            }
        }
    }
}

/// Parses and expands in one go. Inputs above [`MAX_HOSTS`] are refused
/// before anything is allocated.
pub fn expand(input: &str) -> Result<Vec<IpAddr>, ScanError> {
    let spec = input.parse::<AddressSpec>()?;
    let count = spec.host_count();
    if count > MAX_HOSTS {
        return Err(ScanError::InvalidConfig(format!(
            "'{input}' covers {count} hosts, the limit is {MAX_HOSTS}"
        )));
    }

    let hosts = spec.expand();
    tracing::debug!("'{input}' expands to {} hosts", hosts.len());
    Ok(hosts)
}

fn parse_commas(s: &str) -> Result<AddressSpec, ScanError> {
    let specs = s
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(AddressSpec::from_str)
        .collect::<Result<Vec<_>, _>>()?;

    if specs.is_empty() {
        return Err(ScanError::invalid_address(s, "empty list"));
    }

    Ok(AddressSpec::Multi { specs })
}

fn parse_cidr(s: &str) -> Result<Option<AddressSpec>, ScanError> {
    let Some((ip_str, prefix_str)) = s.split_once('/') else {
        return Ok(None);
    };

    let prefix = prefix_str
        .parse::<u8>()
        .map_err(|e| ScanError::invalid_address(s, format!("bad prefix '{prefix_str}': {e}")))?;

    match ip_str.parse::<IpAddr>() {
        Ok(IpAddr::V4(ipv4_addr)) => {
            let range = range::cidr_hosts(ipv4_addr, prefix)
                .map_err(|e| ScanError::invalid_address(s, e))?;
            Ok(Some(AddressSpec::Block { range }))
        }
        Ok(addr @ IpAddr::V6(_)) if prefix == 128 => Ok(Some(AddressSpec::Host { addr })),
        Ok(IpAddr::V6(_)) => Err(ScanError::invalid_address(s, "IPv6 blocks are not supported")),
        Err(e) => Err(ScanError::invalid_address(s, format!("bad address '{ip_str}': {e}"))),
    }
}

/// Parses `1.1.1.1-2.2.2.2` or the abbreviated `1.1.1.1-50`.
fn parse_ip_range(s: &str) -> Result<Option<AddressSpec>, ScanError> {
    let Some((start_str, end_str)) = s.split_once('-') else {
        return Ok(None);
    };

    let start_addr = start_str
        .trim()
        .parse::<Ipv4Addr>()
        .map_err(|e| ScanError::invalid_address(s, format!("bad range start '{start_str}': {e}")))?;

    let end_addr = parse_range_end_addr(end_str.trim(), &start_addr)
        .map_err(|reason| ScanError::invalid_address(s, reason))?;

    if u32::from(end_addr) < u32::from(start_addr) {
        return Err(ScanError::invalid_address(s, "range end is before range start"));
    }

    Ok(Some(AddressSpec::Block {
        range: Ipv4Range::new(start_addr, end_addr),
    }))
}

/// The end of a range may omit leading octets, which are then taken from
/// the start address (`192.168.1.1-2.66` ends at `192.168.2.66`).
fn parse_range_end_addr(end_str: &str, start_addr: &Ipv4Addr) -> Result<Ipv4Addr, String> {
    if let Ok(full_addr) = end_str.parse::<Ipv4Addr>() {
        return Ok(full_addr);
    }

    if end_str.is_empty() {
        return Err("range end cannot be empty".to_string());
    }

    let partial_octets: Vec<u8> = end_str
        .split('.')
        .map(|octet| octet.parse::<u8>())
        .collect::<Result<Vec<u8>, _>>()
        .map_err(|e| format!("bad range end '{end_str}': {e}"))?;

    if partial_octets.len() > 4 {
        return Err(format!("range end has too many octets: {end_str}"));
    }

    let mut end_octets = start_addr.octets();
    let start_index = 4 - partial_octets.len();
    end_octets[start_index..].copy_from_slice(&partial_octets);

    Ok(Ipv4Addr::from(end_octets))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
