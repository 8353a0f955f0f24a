// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Validation of the endpoints a validator advertises in its metadata.
//!
//! Addresses are kept as multiaddr strings in the ledger. The network address
//! must resolve to a TCP endpoint, the p2p and primary addresses to UDP ones.

use multiaddr::{Multiaddr, Protocol};
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transport {
    Tcp,
    Udp,
}

/// Parses `addr` and checks it is `/{ip4,ip6,dns}/<host>/{tcp,udp}/<port>[/...]`.
pub fn parse_host_port(addr: &str, transport: Transport) -> Option<Multiaddr> {
    let multiaddr = Multiaddr::from_str(addr).ok()?;
    let mut iter = multiaddr.iter();

    match iter.next()? {
        Protocol::Ip4(_) | Protocol::Ip6(_) => {}
        Protocol::Dns(name) | Protocol::Dns4(name) | Protocol::Dns6(name) => {
            if name.is_empty() {
                return None;
            }
        }
        _ => return None,
    }

    let port = match (iter.next()?, transport) {
        (Protocol::Tcp(port), Transport::Tcp) => port,
        (Protocol::Udp(port), Transport::Udp) => port,
        _ => return None,
    };
    if port == 0 {
        return None;
    }

    Some(multiaddr)
}

pub fn is_valid_network_address(addr: &str) -> bool {
    parse_host_port(addr, Transport::Tcp).is_some()
}

pub fn is_valid_p2p_address(addr: &str) -> bool {
    parse_host_port(addr, Transport::Udp).is_some()
}

pub fn is_valid_primary_address(addr: &str) -> bool {
    parse_host_port(addr, Transport::Udp).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_address_requires_tcp() {
        assert!(is_valid_network_address("/ip4/127.0.0.1/tcp/8080/http"));
        assert!(is_valid_network_address("/dns/validator.example.com/tcp/443/https"));
        assert!(!is_valid_network_address("/ip4/127.0.0.1/udp/8080"));
        assert!(!is_valid_network_address("/ip4/127.0.0.1/tcp/0"));
        assert!(!is_valid_network_address("not a multiaddr"));
    }

    #[test]
    fn p2p_and_primary_require_udp() {
        assert!(is_valid_p2p_address("/ip4/10.0.0.1/udp/8084"));
        assert!(is_valid_primary_address("/ip6/::1/udp/8081"));
        assert!(!is_valid_p2p_address("/ip4/10.0.0.1/tcp/8084"));
        assert!(!is_valid_primary_address("/udp/8081"));
    }
}
