// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Type to represent IP-version neutral network prefixes.

use ipnet::{Ipv4Net, Ipv6Net};
use serde::ser::SerializeStructVariant;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
pub use std::net::IpAddr;
pub use std::net::{Ipv4Addr, Ipv6Addr};

/// Type to represent both IPv4 and IPv6 prefixes under a single, IP
/// version-independent API. Host bits beyond the mask are always truncated:
/// a `Prefix` is always in canonical (network) form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prefix {
    IPV4(Ipv4Net),
    IPV6(Ipv6Net),
}

impl PartialOrd for Prefix {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Prefix {
    /// Total order: IPv4 sorts before IPv6; within a family, by network
    /// address then by prefix length. Used for deterministic snapshot
    /// iteration and as a `BTreeMap` key for interface route configuration.
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match (self, other) {
            (Prefix::IPV4(a), Prefix::IPV4(b)) => (a.network(), a.prefix_len())
                .cmp(&(b.network(), b.prefix_len())),
            (Prefix::IPV6(a), Prefix::IPV6(b)) => (a.network(), a.prefix_len())
                .cmp(&(b.network(), b.prefix_len())),
            (Prefix::IPV4(_), Prefix::IPV6(_)) => std::cmp::Ordering::Less,
            (Prefix::IPV6(_), Prefix::IPV4(_)) => std::cmp::Ordering::Greater,
        }
    }
}

impl Prefix {
    /// Build 0.0.0.0/0. "Default" is a very overloaded term, hence `root_v4`.
    pub fn root_v4() -> Prefix {
        Prefix::IPV4(Ipv4Net::new(Ipv4Addr::UNSPECIFIED, 0).unwrap())
    }
    /// Build ::/0.
    pub fn root_v6() -> Prefix {
        Prefix::IPV6(Ipv6Net::new(Ipv6Addr::UNSPECIFIED, 0).unwrap())
    }
    /// Tell if a prefix is the root (default, /0) prefix of its family.
    pub fn is_root(&self) -> bool {
        self.length() == 0
    }
    /// Get the inner [`Ipv4Net`] from a [`Prefix`].
    pub fn get_v4(&self) -> &Ipv4Net {
        match self {
            Prefix::IPV4(p) => p,
            Prefix::IPV6(_) => panic!("Not an IPv4 prefix!"),
        }
    }
    /// Get the inner [`Ipv6Net`] from a [`Prefix`].
    pub fn get_v6(&self) -> &Ipv6Net {
        match self {
            Prefix::IPV4(_) => panic!("Not an IPv6 prefix!"),
            Prefix::IPV6(p) => p,
        }
    }
    /// Check whether the prefix is IPv4.
    pub fn is_ipv4(&self) -> bool {
        matches!(self, Prefix::IPV4(_))
    }
    /// Check whether the prefix is IPv6.
    pub fn is_ipv6(&self) -> bool {
        matches!(self, Prefix::IPV6(_))
    }
    /// Build an [`IpAddr`] from a prefix's network address.
    pub fn as_address(&self) -> IpAddr {
        match *self {
            Prefix::IPV4(p) => p.network().into(),
            Prefix::IPV6(p) => p.network().into(),
        }
    }
    /// Get prefix length.
    pub fn length(&self) -> u8 {
        match *self {
            Prefix::IPV4(p) => p.prefix_len(),
            Prefix::IPV6(p) => p.prefix_len(),
        }
    }
    /// Get number of covered IP addresses.
    pub fn size(&self) -> u128 {
        match *self {
            Prefix::IPV4(p) => 2u128.pow(32 - u32::from(p.prefix_len())),
            Prefix::IPV6(p) => 2u128.pow(128 - u32::from(p.prefix_len())),
        }
    }
    /// Tell whether this prefix's range covers `addr` (same family, `addr` within the masked range).
    pub fn covers(&self, addr: IpAddr) -> bool {
        match (self, addr) {
            (Prefix::IPV4(p), IpAddr::V4(a)) => p.contains(&a),
            (Prefix::IPV6(p), IpAddr::V6(a)) => p.contains(&a),
            _ => false,
        }
    }
    /// Build the host (maximum-length) prefix for `addr`: `/32` for v4, `/128` for v6.
    pub fn host(addr: IpAddr) -> Prefix {
        match addr {
            IpAddr::V4(a) => Prefix::IPV4(Ipv4Net::new(a, 32).expect("/32 is always valid")),
            IpAddr::V6(a) => Prefix::IPV6(Ipv6Net::new(a, 128).expect("/128 is always valid")),
        }
    }
}

impl From<(IpAddr, u8)> for Prefix {
    /// Host bits are truncated: `(10.0.0.5, 24)` yields `10.0.0.0/24`.
    fn from(tuple: (IpAddr, u8)) -> Self {
        match tuple.0 {
            IpAddr::V4(a) => Prefix::IPV4(Ipv4Net::new(a, tuple.1).unwrap().trunc()),
            IpAddr::V6(a) => Prefix::IPV6(Ipv6Net::new(a, tuple.1).unwrap().trunc()),
        }
    }
}
impl From<Ipv4Net> for Prefix {
    fn from(value: Ipv4Net) -> Self {
        Prefix::IPV4(value.trunc())
    }
}
impl From<Ipv6Net> for Prefix {
    fn from(value: Ipv6Net) -> Self {
        Prefix::IPV6(value.trunc())
    }
}
#[cfg(any(test, feature = "testing"))]
impl From<(&str, u8)> for Prefix {
    fn from(tuple: (&str, u8)) -> Self {
        let addr: IpAddr = tuple.0.parse().expect("bad test address");
        Prefix::from((addr, tuple.1))
    }
}

impl Display for Prefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Prefix::IPV4(p) => write!(f, "{p}"),
            Prefix::IPV6(p) => write!(f, "{p}"),
        }
    }
}

impl Serialize for Prefix {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Prefix::IPV4(p) => {
                let mut sv = serializer.serialize_struct_variant("Prefix", 0, "IPV4", 2)?;
                sv.serialize_field("address", &p.network())?;
                sv.serialize_field("length", &p.prefix_len())?;
                sv.end()
            }
            Prefix::IPV6(p) => {
                let mut sv = serializer.serialize_struct_variant("Prefix", 1, "IPV6", 2)?;
                sv.serialize_field("address", &p.network())?;
                sv.serialize_field("length", &p.prefix_len())?;
                sv.end()
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(rename = "Prefix")]
enum PrefixShadow {
    IPV4 { address: Ipv4Addr, length: u8 },
    IPV6 { address: Ipv6Addr, length: u8 },
}

impl<'de> Deserialize<'de> for Prefix {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match PrefixShadow::deserialize(deserializer)? {
            PrefixShadow::IPV4 { address, length } => Ipv4Net::new(address, length)
                .map(Prefix::from)
                .map_err(serde::de::Error::custom),
            PrefixShadow::IPV6 { address, length } => Ipv6Net::new(address, length)
                .map(Prefix::from)
                .map_err(serde::de::Error::custom),
        }
    }
}
