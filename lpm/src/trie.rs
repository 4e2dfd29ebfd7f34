// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Longest-prefix-match container, one per (VRF, address-family).
//!
//! Backed by [`prefix_trie::PrefixMap`], a PATRICIA trie keyed on the
//! network's own `Prefix` trait. `O(W)` lookup and `O(N)` iteration are the
//! trie's native complexity, where `W` is the address width.

use ipnet::{Ipv4Net, Ipv6Net};
use prefix_trie::{Prefix as TriePrefix, PrefixMap};
use std::net::{Ipv4Addr, Ipv6Addr};

/// Bridges a concrete `ipnet` network type to the host-route construction
/// the trie needs for address lookups (`longest_match`).
pub trait NetPrefix: TriePrefix + Copy + PartialEq {
    type Addr: Copy;
    fn host(addr: Self::Addr) -> Self;
    fn covers(&self, addr: Self::Addr) -> bool;
}

impl NetPrefix for Ipv4Net {
    type Addr = Ipv4Addr;
    fn host(addr: Ipv4Addr) -> Self {
        Ipv4Net::new(addr, 32).expect("/32 is always a valid IPv4 prefix")
    }
    fn covers(&self, addr: Ipv4Addr) -> bool {
        self.contains(&addr)
    }
}

impl NetPrefix for Ipv6Net {
    type Addr = Ipv6Addr;
    fn host(addr: Ipv6Addr) -> Self {
        Ipv6Net::new(addr, 128).expect("/128 is always a valid IPv6 prefix")
    }
    fn covers(&self, addr: Ipv6Addr) -> bool {
        self.contains(&addr)
    }
}

/// A longest-prefix-match tree over values of type `V`, keyed by prefixes of
/// type `P` (either [`Ipv4Net`] or [`Ipv6Net`]).
#[derive(Debug, Clone)]
pub struct IpPrefixTrie<P: NetPrefix, V> {
    inner: PrefixMap<P, V>,
}

impl<P: NetPrefix, V> Default for IpPrefixTrie<P, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: NetPrefix, V> IpPrefixTrie<P, V> {
    pub fn new() -> Self {
        Self {
            inner: PrefixMap::new(),
        }
    }

    /// Idempotent get-or-insert on `prefix`.
    pub fn insert_or_get(&mut self, prefix: P) -> &mut V
    where
        V: Default,
    {
        if !self.inner.contains_key(&prefix) {
            self.inner.insert(prefix, V::default());
        }
        self.inner
            .get_mut(&prefix)
            .expect("just inserted or already present")
    }

    /// Insert a value at `prefix`, returning the previous value if any.
    pub fn insert(&mut self, prefix: P, value: V) -> Option<V> {
        self.inner.insert(prefix, value)
    }

    pub fn exact_match(&self, prefix: &P) -> Option<&V> {
        self.inner.get(prefix)
    }

    pub fn exact_match_mut(&mut self, prefix: &P) -> Option<&mut V> {
        self.inner.get_mut(prefix)
    }

    /// Longest-prefix-match lookup for `addr`, returning the matching prefix
    /// and its value.
    pub fn longest_match(&self, addr: P::Addr) -> Option<(P, &V)> {
        let host = P::host(addr);
        self.inner.get_lpm(&host).map(|(p, v)| (*p, v))
    }

    /// Longest-prefix-match lookup that ignores any prefix present in `skip`
    /// (used by recursive resolution to prevent self-cover and cycles: the
    /// route being resolved, and every route already on the resolution
    /// stack, are excluded from matching).
    pub fn longest_match_excluding(&self, addr: P::Addr, skip: &[P]) -> Option<(P, &V)> {
        self.inner
            .iter()
            .filter(|(p, _)| p.covers(addr) && !skip.contains(p))
            .max_by_key(|(p, _)| p.prefix_len())
            .map(|(p, v)| (*p, v))
    }

    pub fn remove(&mut self, prefix: &P) -> Option<V> {
        self.inner.remove(prefix)
    }

    pub fn len(&self) -> usize {
        self.inner.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ordered iteration (for serialization and diff).
    pub fn iter(&self) -> impl Iterator<Item = (&P, &V)> {
        self.inner.iter()
    }
}
