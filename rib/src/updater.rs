// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! [`RouteUpdater`] (C3): a batch of adds/deletes staged against one
//! [`RouteTable`], plus `finalize()`, which recomputes resolution for every
//! route the batch touched (transitively) and records the inverse delta
//! needed to roll the whole batch back (§4.5).

use crate::client::{ClientId, ClientPriority};
use crate::errors::RibError;
use crate::nexthop::NextHopEntry;
use crate::resolve::resolve_route;
use crate::route::{Route, RouteFlags};
use crate::table::RouteTable;
use rib_lpm::Prefix;
use std::collections::HashSet;
use tracing::debug;

/// A single recorded mutation, kept so the coordinator can build the
/// inverse delta on hardware failure (§4.5, §9 "rollback fidelity": storing
/// the prior `NextHopEntry` per (prefix, client) is sufficient, since
/// resolution is a pure function of the contributions).
#[derive(Debug, Clone)]
enum Change {
    Added {
        prefix: Prefix,
        client: ClientId,
        prior: Option<NextHopEntry>,
    },
    Removed {
        prefix: Prefix,
        client: ClientId,
        prior: NextHopEntry,
    },
}

/// Per-call statistics returned by `RibCoordinator::update` (§6 observability).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateStats {
    pub v4_added: u32,
    pub v4_deleted: u32,
    pub v6_added: u32,
    pub v6_deleted: u32,
}

pub struct RouteUpdater<'t> {
    table: &'t mut RouteTable,
    priority: ClientPriority,
    touched: HashSet<Prefix>,
    changes: Vec<Change>,
    stats: UpdateStats,
}

impl<'t> RouteUpdater<'t> {
    pub fn new(table: &'t mut RouteTable, priority: ClientPriority) -> Self {
        Self {
            table,
            priority,
            touched: HashSet::new(),
            changes: Vec::new(),
            stats: UpdateStats::default(),
        }
    }

    /// Stage one client's contribution at `prefix` (§4.2 step 1).
    pub fn add(
        &mut self,
        prefix: Prefix,
        client: ClientId,
        entry: NextHopEntry,
    ) -> Result<(), RibError> {
        let prior = self
            .table
            .exact_match(&prefix)
            .and_then(|r| r.client_entries.get(&client).cloned());

        let route = self.table.insert_or_get(prefix);
        route.add_contribution(client, entry, &self.priority);

        self.touched.insert(prefix);
        self.changes.push(Change::Added {
            prefix,
            client,
            prior,
        });
        match prefix {
            Prefix::IPV4(_) => self.stats.v4_added += 1,
            Prefix::IPV6(_) => self.stats.v6_added += 1,
        }
        Ok(())
    }

    /// Stage withdrawal of `client`'s contribution at `prefix`. A no-op if
    /// the (prefix, client) pair does not exist (§8 boundary behavior).
    pub fn delete(&mut self, prefix: Prefix, client: ClientId) {
        let Some(route) = self.table.exact_match_mut(&prefix) else {
            return;
        };
        let Some(prior) = route.client_entries.get(&client).cloned() else {
            return;
        };

        if route.remove_contribution(&client, &self.priority).is_none() {
            self.table.remove(&prefix);
        }
        self.touched.insert(prefix);
        self.changes.push(Change::Removed {
            prefix,
            client,
            prior,
        });
        match prefix {
            Prefix::IPV4(_) => self.stats.v4_deleted += 1,
            Prefix::IPV6(_) => self.stats.v6_deleted += 1,
        }
    }

    /// §9 supplement: replace `client`'s entire contribution set for this
    /// table with `keep` -- any prefix the client currently owns that is
    /// not in `keep` is synthesized as a delete before the normal adds run.
    pub fn reset_client(&mut self, client: ClientId, keep: &[Prefix]) {
        let keep: HashSet<Prefix> = keep.iter().copied().collect();
        let stale: Vec<Prefix> = self
            .table
            .iter_v4()
            .map(|(p, r)| (Prefix::from(*p), r))
            .chain(self.table.iter_v6().map(|(p, r)| (Prefix::from(*p), r)))
            .filter(|(p, r)| r.client_entries.contains_key(&client) && !keep.contains(p))
            .map(|(p, _)| p)
            .collect();
        for prefix in stale {
            self.delete(prefix, client);
        }
    }

    /// §4.3: recompute resolution for every route marked `NEEDS_RESOLVE`,
    /// transitively (a route whose resolution depends on one that changed
    /// is itself re-resolved, even if its own `client_entries`/`best_entry`
    /// never changed). There is no reverse-dependency index from a matched
    /// prefix to the routes that recurse through it, so transitivity is
    /// achieved by re-resolving the whole table whenever anything changed,
    /// rather than only the routes whose own `best_entry` changed this
    /// batch -- `resolve_route` recurses fresh from each route's current
    /// `best_entry` regardless, so this is never wasted work in the sense of
    /// recomputing from stale input.
    pub fn finalize(mut self) -> (UpdateStats, Vec<Prefix>) {
        let any_changed = self
            .table
            .iter_v4()
            .any(|(_, r)| r.flags.contains(RouteFlags::NEEDS_RESOLVE))
            || self
                .table
                .iter_v6()
                .any(|(_, r)| r.flags.contains(RouteFlags::NEEDS_RESOLVE));

        let mut pending: Vec<Prefix> = if any_changed {
            self.table
                .iter_v4()
                .map(|(p, _)| Prefix::from(*p))
                .chain(self.table.iter_v6().map(|(p, _)| Prefix::from(*p)))
                .collect()
        } else {
            Vec::new()
        };
        pending.sort_by_key(Prefix::length);

        let mut republished = Vec::new();
        for prefix in pending.drain(..) {
            match prefix {
                Prefix::IPV4(p) => resolve_one(&mut self.table.v4, p),
                Prefix::IPV6(p) => resolve_one(&mut self.table.v6, p),
            }
            debug!(%prefix, "route resolved");
            republished.push(prefix);
        }

        (self.stats, republished)
    }

    /// Build the compensating changes that, if replayed, undo this batch
    /// (§4.5 step 4: "apply the inverse-delta").
    pub(crate) fn inverse(&self) -> Vec<InverseOp> {
        self.changes
            .iter()
            .rev()
            .map(|change| match change {
                Change::Added {
                    prefix,
                    client,
                    prior,
                } => match prior {
                    Some(entry) => InverseOp::Restore {
                        prefix: *prefix,
                        client: *client,
                        entry: entry.clone(),
                    },
                    None => InverseOp::Withdraw {
                        prefix: *prefix,
                        client: *client,
                    },
                },
                Change::Removed {
                    prefix,
                    client,
                    prior,
                } => InverseOp::Restore {
                    prefix: *prefix,
                    client: *client,
                    entry: prior.clone(),
                },
            })
            .collect()
    }
}

/// One compensating operation in an inverse delta.
#[derive(Debug, Clone)]
pub(crate) enum InverseOp {
    Restore {
        prefix: Prefix,
        client: ClientId,
        entry: NextHopEntry,
    },
    Withdraw {
        prefix: Prefix,
        client: ClientId,
    },
}

/// Apply a previously captured inverse delta to `table` and re-finalize.
pub(crate) fn apply_inverse(
    table: &mut RouteTable,
    priority: ClientPriority,
    ops: Vec<InverseOp>,
) {
    let mut updater = RouteUpdater::new(table, priority);
    for op in ops {
        match op {
            InverseOp::Restore {
                prefix,
                client,
                entry,
            } => {
                let _ = updater.add(prefix, client, entry);
            }
            InverseOp::Withdraw { prefix, client } => {
                updater.delete(prefix, client);
            }
        }
    }
    let _ = updater.finalize();
}

fn resolve_one<P: rib_lpm::NetPrefix>(tree: &mut rib_lpm::IpPrefixTrie<P, Route>, prefix: P) {
    // `exact_match` immutably to compute the new forwarding, then write it
    // back; the trie only hands out one mutable borrow at a time so the
    // read and the write cannot overlap.
    let (_best, new_forwarding) = {
        let Some(route) = tree.exact_match(&prefix) else {
            return;
        };
        let Some(best) = route.best_entry.clone() else {
            return;
        };
        let mut stack = Vec::new();
        let fwd = resolve_route(tree, prefix, &best, &mut stack);
        (best, fwd)
    };
    if let Some(route) = tree.exact_match_mut(&prefix) {
        route.forwarding = new_forwarding;
        route.flags.remove(RouteFlags::NEEDS_RESOLVE);
        route.flags.insert(RouteFlags::RESOLVED);
        if !route.forwarding.is_resolvable() {
            route.flags.insert(RouteFlags::UNRESOLVABLE);
        } else {
            route.flags.remove(RouteFlags::UNRESOLVABLE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientId;
    use crate::nexthop::NextHop;
    use crate::route::Forwarding;
    use std::net::IpAddr;

    fn addr(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    /// C (4.4.4.4/32) resolves recursively via B (3.3.3.3/32). When B's own
    /// resolution changes from NEXTHOPS to DROP without touching B's
    /// `client_entries` directly -- by deleting the route B itself was
    /// chasing through -- C must be re-resolved too, even though C's own
    /// `best_entry` never changed (§4.3 transitivity).
    #[test]
    fn test_finalize_transitively_reresolves_dependents() {
        let mut table = RouteTable::new();
        let priority = ClientPriority::default();

        {
            let mut updater = RouteUpdater::new(&mut table, priority.clone());
            // A (2.2.2.2/32): the interface-reachable gateway B resolves through.
            updater
                .add(
                    Prefix::from(("2.2.2.2", 32)),
                    ClientId::BGP,
                    NextHopEntry::nexthops(
                        vec![NextHop::unresolved(addr("9.9.9.9"), Some(1), 1)],
                        20,
                    )
                    .unwrap(),
                )
                .unwrap();
            // B (3.3.3.3/32) via A.
            updater
                .add(
                    Prefix::from(("3.3.3.3", 32)),
                    ClientId::BGP,
                    NextHopEntry::nexthops(vec![NextHop::unresolved(addr("2.2.2.2"), None, 1)], 20)
                        .unwrap(),
                )
                .unwrap();
            // C (4.4.4.4/32) via B.
            updater
                .add(
                    Prefix::from(("4.4.4.4", 32)),
                    ClientId::BGP,
                    NextHopEntry::nexthops(vec![NextHop::unresolved(addr("3.3.3.3"), None, 1)], 20)
                        .unwrap(),
                )
                .unwrap();
            updater.finalize();
        }

        let c = table.exact_match(&Prefix::from(("4.4.4.4", 32))).unwrap();
        assert!(matches!(c.forwarding, Forwarding::NextHops(_)));

        // B's own contributions never change: its dependency A is withdrawn
        // and replaced with a DROP, which only touches A directly.
        {
            let mut updater = RouteUpdater::new(&mut table, priority.clone());
            updater.delete(Prefix::from(("2.2.2.2", 32)), ClientId::BGP);
            updater
                .add(
                    Prefix::from(("2.2.2.2", 32)),
                    ClientId::STATIC,
                    NextHopEntry::drop(1),
                )
                .unwrap();
            updater.finalize();
        }

        let b = table.exact_match(&Prefix::from(("3.3.3.3", 32))).unwrap();
        assert_eq!(b.forwarding, Forwarding::Drop);

        let c = table.exact_match(&Prefix::from(("4.4.4.4", 32))).unwrap();
        assert_eq!(
            c.forwarding,
            Forwarding::Drop,
            "C depends on B, which now resolves to DROP, even though C's own \
             client_entries never changed"
        );
    }
}
