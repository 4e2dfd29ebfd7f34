// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! [`Route`]: per-prefix, per-VRF, per-AF state -- the set of client
//! contributions, the admin-distance winner among them, and the resolved
//! forwarding result (§3, §4.2).

use crate::client::{ClientId, ClientPriority};
use crate::nexthop::{NextHop, NextHopAction, NextHopEntry};
use bitflags::bitflags;
use rib_lpm::Prefix;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct RouteFlags: u8 {
        /// A directly connected (interface) route.
        const CONNECTED     = 0b0000_0001;
        /// `forwarding` reflects the current `best_entry`.
        const RESOLVED      = 0b0000_0010;
        /// Resolution ran and could not produce a non-empty next-hop set.
        const UNRESOLVABLE  = 0b0000_0100;
        /// A writer task currently has this route on its resolution stack.
        const PROCESSING    = 0b0000_1000;
        /// `best_entry` changed since `forwarding` was last computed.
        const NEEDS_RESOLVE = 0b0001_0000;
    }
}

/// Resolved forwarding result for a route (§3).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Forwarding {
    #[default]
    Unresolved,
    Drop,
    ToCpu,
    NextHops(Vec<NextHop>),
    /// Resolution ran but produced no usable next-hop; the route is omitted
    /// from the published FIB (§3 invariant 3).
    Unresolvable,
}

impl Forwarding {
    pub fn is_resolvable(&self) -> bool {
        !matches!(self, Forwarding::Unresolvable | Forwarding::Unresolved)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub prefix: Prefix,
    pub client_entries: BTreeMap<ClientId, NextHopEntry>,
    pub best_entry: Option<NextHopEntry>,
    pub forwarding: Forwarding,
    pub flags: RouteFlags,
    pub class_id: Option<u32>,
}

impl Route {
    pub fn new(prefix: Prefix) -> Self {
        Self {
            prefix,
            client_entries: BTreeMap::new(),
            best_entry: None,
            forwarding: Forwarding::Unresolved,
            flags: RouteFlags::empty(),
            class_id: None,
        }
    }

    /// Insert or replace `client`'s contribution and recompute `best_entry`
    /// (§4.2 step 1-2). Returns whether `best_entry` changed.
    pub fn add_contribution(
        &mut self,
        client: ClientId,
        entry: NextHopEntry,
        priority: &ClientPriority,
    ) -> bool {
        self.client_entries.insert(client, entry);
        self.flags.set(
            RouteFlags::CONNECTED,
            self.client_entries.contains_key(&ClientId::INTERFACE),
        );
        self.recompute_best(priority)
    }

    /// Remove `client`'s contribution and recompute `best_entry`. Returns
    /// `None` if no contributions remain (caller must delete the route,
    /// §3 invariant 1); otherwise `Some(changed)`.
    pub fn remove_contribution(
        &mut self,
        client: &ClientId,
        priority: &ClientPriority,
    ) -> Option<bool> {
        if self.client_entries.remove(client).is_none() {
            // no-op delete of a nonexistent contribution (§8 boundary behavior)
            return Some(false);
        }
        self.flags.set(
            RouteFlags::CONNECTED,
            self.client_entries.contains_key(&ClientId::INTERFACE),
        );
        if self.client_entries.is_empty() {
            None
        } else {
            Some(self.recompute_best(priority))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.client_entries.is_empty()
    }

    /// §4.2 step 2: lowest admin distance wins; ties broken by `priority`.
    fn recompute_best(&mut self, priority: &ClientPriority) -> bool {
        let winner = self
            .client_entries
            .iter()
            .min_by(|(c1, e1), (c2, e2)| {
                e1.admin_distance
                    .cmp(&e2.admin_distance)
                    .then_with(|| priority.compare(**c1, **c2))
            })
            .map(|(_, e)| e.clone());

        let changed = winner != self.best_entry;
        self.best_entry = winner;
        if changed {
            self.flags.insert(RouteFlags::NEEDS_RESOLVE);
            debug!(prefix = %self.prefix, "best_entry changed, marking NEEDS_RESOLVE");
        }
        changed
    }

    /// Idempotent tag mutation (§9 supplement: class_id never participates
    /// in merge or triggers resolution, but the route still needs
    /// republishing since the tag can be hardware-visible).
    pub fn set_class_id(&mut self, class_id: Option<u32>) {
        self.class_id = class_id;
    }
}
