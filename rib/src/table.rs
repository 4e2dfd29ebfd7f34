// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! [`RouteTable`]: the pair of longest-prefix-match trees (one per address
//! family) that back a single VRF (§3, §4.1).

use crate::route::Route;
use ipnet::{Ipv4Net, Ipv6Net};
use rib_lpm::trie::IpPrefixTrie;
use rib_lpm::Prefix;
use std::net::IpAddr;

/// A VRF identifier (`RouterID` in the design notes).
pub type VrfId = u32;

pub const DEFAULT_VRF: VrfId = 0;

/// Per-VRF pair of longest-prefix-match trees.
#[derive(Debug, Default, Clone)]
pub struct RouteTable {
    pub v4: IpPrefixTrie<Ipv4Net, Route>,
    pub v6: IpPrefixTrie<Ipv6Net, Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_or_get(&mut self, prefix: Prefix) -> &mut Route {
        match prefix {
            Prefix::IPV4(p) => self.v4.insert_or_get(p),
            Prefix::IPV6(p) => self.v6.insert_or_get(p),
        }
    }

    pub fn exact_match(&self, prefix: &Prefix) -> Option<&Route> {
        match prefix {
            Prefix::IPV4(p) => self.v4.exact_match(p),
            Prefix::IPV6(p) => self.v6.exact_match(p),
        }
    }

    pub fn exact_match_mut(&mut self, prefix: &Prefix) -> Option<&mut Route> {
        match prefix {
            Prefix::IPV4(p) => self.v4.exact_match_mut(p),
            Prefix::IPV6(p) => self.v6.exact_match_mut(p),
        }
    }

    pub fn remove(&mut self, prefix: &Prefix) -> Option<Route> {
        match prefix {
            Prefix::IPV4(p) => self.v4.remove(p),
            Prefix::IPV6(p) => self.v6.remove(p),
        }
    }

    /// Longest-prefix-match lookup by address (§4.1).
    pub fn longest_match(&self, address: IpAddr) -> Option<(Prefix, &Route)> {
        match address {
            IpAddr::V4(a) => self
                .v4
                .longest_match(a)
                .map(|(p, r)| (Prefix::from(p), r)),
            IpAddr::V6(a) => self
                .v6
                .longest_match(a)
                .map(|(p, r)| (Prefix::from(p), r)),
        }
    }

    pub fn len_v4(&self) -> usize {
        self.v4.len()
    }

    pub fn len_v6(&self) -> usize {
        self.v6.len()
    }

    pub fn iter_v4(&self) -> impl Iterator<Item = (&Ipv4Net, &Route)> {
        self.v4.iter()
    }

    pub fn iter_v6(&self) -> impl Iterator<Item = (&Ipv6Net, &Route)> {
        self.v6.iter()
    }
}
