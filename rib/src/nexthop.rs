// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Next-hop and next-hop-entry types (C1). A [`NextHop`] is either
//! unresolved (a gateway address a client contributed) or resolved (an
//! egress interface reached after recursive resolution, §4.3). A
//! [`NextHopEntry`] is one client's contribution to a [`crate::route::Route`]:
//! an action plus, for `NEXTHOPS`, the set of next-hops.

use crate::client::AdminDistance;
use crate::errors::RibError;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// A label-stack operation carried by a next-hop, for routes that cross the
/// IP/MPLS boundary. The label FIB itself is out of scope; this is only the
/// instruction a resolved next-hop carries forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LabelOp {
    Push(u32),
    Pop,
    Swap(u32),
}

/// A single next-hop, either as a client declared it (unresolved) or as
/// recursive resolution (§4.3) settled it (resolved, to a concrete egress
/// interface). Equality and ordering are fully structural.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NextHop {
    Unresolved {
        address: IpAddr,
        /// An explicit interface pins resolution: if present, this next-hop
        /// resolves directly to that interface without an LPM lookup
        /// (§4.3 step 1, "explicit interface" branch).
        ifindex: Option<u32>,
        labels: Vec<LabelOp>,
        weight: u32,
    },
    Resolved {
        ifindex: u32,
        address: IpAddr,
        labels: Vec<LabelOp>,
        weight: u32,
    },
}

impl NextHop {
    pub fn unresolved(address: IpAddr, ifindex: Option<u32>, weight: u32) -> Self {
        NextHop::Unresolved {
            address,
            ifindex,
            labels: Vec::new(),
            weight,
        }
    }

    pub fn address(&self) -> IpAddr {
        match self {
            NextHop::Unresolved { address, .. } | NextHop::Resolved { address, .. } => *address,
        }
    }

    pub fn weight(&self) -> u32 {
        match self {
            NextHop::Unresolved { weight, .. } | NextHop::Resolved { weight, .. } => *weight,
        }
    }

    pub fn labels(&self) -> &[LabelOp] {
        match self {
            NextHop::Unresolved { labels, .. } | NextHop::Resolved { labels, .. } => labels,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, NextHop::Resolved { .. })
    }

    pub(crate) fn set_weight(&mut self, weight: u32) {
        match self {
            NextHop::Unresolved { weight: w, .. } | NextHop::Resolved { weight: w, .. } => {
                *w = weight;
            }
        }
    }

    /// Overwrite the gateway address: used when a recursive match lands
    /// directly on a connected/interface route, whose own next-hop carries
    /// the subnet's network address rather than a usable gateway (§4.3 step
    /// 2: "N resolves to (M.interface, N.address)").
    pub(crate) fn set_address(&mut self, address: IpAddr) {
        match self {
            NextHop::Unresolved { address: a, .. } | NextHop::Resolved { address: a, .. } => {
                *a = address;
            }
        }
    }

    /// Prepend `prefix` to this next-hop's label stack: used when a route
    /// resolves recursively through another route (§4.3: "M's labels pushed
    /// first, then N's").
    pub(crate) fn prepend_labels(&mut self, prefix: &[LabelOp]) {
        if prefix.is_empty() {
            return;
        }
        let labels = match self {
            NextHop::Unresolved { labels, .. } | NextHop::Resolved { labels, .. } => labels,
        };
        let mut new_labels = prefix.to_vec();
        new_labels.append(labels);
        *labels = new_labels;
    }

    /// Canonical sort key: address, then interface, then label stack. Used
    /// to normalize a next-hop set to a deterministic order for equality,
    /// hashing, and dedup (§3).
    fn sort_key(&self) -> (IpAddr, Option<u32>, Vec<LabelOp>) {
        match self {
            NextHop::Unresolved {
                address,
                ifindex,
                labels,
                ..
            } => (*address, *ifindex, labels.clone()),
            NextHop::Resolved {
                address,
                ifindex,
                labels,
                ..
            } => (*address, Some(*ifindex), labels.clone()),
        }
    }

    /// Two next-hops are "the same path, different weight" iff their sort
    /// keys match.
    fn dedup_key(&self) -> (IpAddr, Option<u32>, Vec<LabelOp>) {
        self.sort_key()
    }
}

/// Sort a next-hop set into canonical order and merge duplicates, summing
/// weights (§3, §4.3 step 3).
pub fn canonicalize(nexthops: &mut Vec<NextHop>) {
    nexthops.sort_by_key(NextHop::sort_key);
    let mut merged: Vec<NextHop> = Vec::with_capacity(nexthops.len());
    for nh in nexthops.drain(..) {
        if let Some(last) = merged.last_mut() {
            if last.dedup_key() == nh.dedup_key() {
                last.set_weight(last.weight() + nh.weight());
                continue;
            }
        }
        merged.push(nh);
    }
    *nexthops = merged;
}

/// The terminal action of a resolved or contributed route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NextHopAction {
    Drop,
    ToCpu,
    NextHops,
}

/// One client's contribution to a [`crate::route::Route`]: an action, plus
/// (for `NEXTHOPS`) the set of next-hops, an admin distance, and optional
/// counter/class tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextHopEntry {
    pub action: NextHopAction,
    /// Empty iff `action != NextHopAction::NextHops`.
    pub nexthops: Vec<NextHop>,
    pub admin_distance: AdminDistance,
    pub counter_id: Option<u32>,
    pub class_id: Option<u32>,
}

impl NextHopEntry {
    pub fn drop(admin_distance: AdminDistance) -> Self {
        Self {
            action: NextHopAction::Drop,
            nexthops: Vec::new(),
            admin_distance,
            counter_id: None,
            class_id: None,
        }
    }

    pub fn to_cpu(admin_distance: AdminDistance) -> Self {
        Self {
            action: NextHopAction::ToCpu,
            nexthops: Vec::new(),
            admin_distance,
            counter_id: None,
            class_id: None,
        }
    }

    /// Build a `NEXTHOPS` entry. Rejects an empty next-hop set (§8 boundary
    /// behavior: "Adding a route with an empty next-hop set and
    /// action=NEXTHOPS is rejected as InvalidInput").
    pub fn nexthops(
        mut nexthops: Vec<NextHop>,
        admin_distance: AdminDistance,
    ) -> Result<Self, RibError> {
        if nexthops.is_empty() {
            return Err(RibError::EmptyNextHopSet);
        }
        canonicalize(&mut nexthops);
        Ok(Self {
            action: NextHopAction::NextHops,
            nexthops,
            admin_distance,
            counter_id: None,
            class_id: None,
        })
    }

    pub fn with_counter_id(mut self, counter_id: u32) -> Self {
        self.counter_id = Some(counter_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_nexthops_rejects_empty_set() {
        let err = NextHopEntry::nexthops(Vec::new(), 1).unwrap_err();
        assert!(matches!(err, RibError::EmptyNextHopSet));
    }

    #[test]
    fn test_canonicalize_sorts_and_dedups() {
        let mut nhs = vec![
            NextHop::unresolved(addr("10.0.0.2"), None, 1),
            NextHop::unresolved(addr("10.0.0.1"), None, 1),
            NextHop::unresolved(addr("10.0.0.1"), None, 3),
        ];
        canonicalize(&mut nhs);
        assert_eq!(nhs.len(), 2);
        assert_eq!(nhs[0].address(), addr("10.0.0.1"));
        assert_eq!(nhs[0].weight(), 4);
        assert_eq!(nhs[1].address(), addr("10.0.0.2"));
    }

    #[test]
    fn test_prepend_labels() {
        let mut nh = NextHop::Resolved {
            ifindex: 1,
            address: addr("10.0.0.1"),
            labels: vec![LabelOp::Push(200)],
            weight: 1,
        };
        nh.prepend_labels(&[LabelOp::Push(100)]);
        assert_eq!(nh.labels(), &[LabelOp::Push(100), LabelOp::Push(200)]);
    }
}
