use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use serde::{Deserialize, Serialize};

/// Possible errors from address family selection
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No address matched the requested family
    #[error("No address matches the {0:?} stack")]
    NoMatchingAddress(IpStack),
}

/// Address family used for probe sockets
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IpStack {
    /// Only IPv4 addresses are used
    IPv4,
    /// Only IPv6 addresses are used
    IPv6,
    /// Both families are accepted, IPv6 listeners are dual-stack
    #[default]
    IPv4v6,
}

impl IpStack {
    /// Unspecified address a listener of this stack binds to
    pub fn unspecified(&self) -> IpAddr {
        match self {
            IpStack::IPv4 => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            IpStack::IPv6 | IpStack::IPv4v6 => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        }
    }

    /// Check if address belongs to this stack
    pub fn accepts(&self, addr: &IpAddr) -> bool {
        match self {
            IpStack::IPv4 => addr.is_ipv4(),
            IpStack::IPv6 => addr.is_ipv6(),
            IpStack::IPv4v6 => true,
        }
    }

    /// Picks the first address that belongs to this stack
    pub fn select<I>(&self, addrs: I) -> Result<IpAddr, Error>
    where
        I: IntoIterator<Item = IpAddr>,
    {
        addrs
            .into_iter()
            .find(|addr| self.accepts(addr))
            .ok_or(Error::NoMatchingAddress(*self))
    }
}
