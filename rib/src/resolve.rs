// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Recursive longest-prefix-match resolution (§4.3): turns a route's
//! `best_entry` into a `Forwarding` result by chasing each next-hop's
//! gateway address through the same VRF's tree until it terminates at an
//! interface, DROP, or TO_CPU.
//!
//! This module is pure: it reads a tree and a route, and returns a
//! `Forwarding` value. It never mutates the tree. The caller
//! ([`crate::updater::RouteUpdater::finalize`]) is responsible for writing
//! the result back and clearing `NEEDS_RESOLVE`.

use crate::nexthop::{canonicalize, NextHop, NextHopAction, NextHopEntry};
use crate::route::{Forwarding, Route, RouteFlags};
use rib_lpm::trie::{IpPrefixTrie, NetPrefix};

enum ResolvedNextHop {
    Drop,
    ToCpu,
    /// One or more fully resolved next-hops produced by this single input
    /// next-hop (more than one only when it resolved recursively through a
    /// route that itself had multiple next-hops, i.e. recursive ECMP).
    Chain(Vec<NextHop>),
    Unresolved,
}

/// Resolve a single route's `best_entry` into a `Forwarding` value (§4.3).
/// `self_prefix` is excluded from matching (no self-cover); `stack` holds
/// the prefixes currently being resolved higher up the call chain (cycle
/// prevention) and is restored to its input state on return.
pub fn resolve_route<P: NetPrefix>(
    table: &IpPrefixTrie<P, Route>,
    self_prefix: P,
    best: &NextHopEntry,
    stack: &mut Vec<P>,
) -> Forwarding {
    match best.action {
        NextHopAction::Drop => Forwarding::Drop,
        NextHopAction::ToCpu => Forwarding::ToCpu,
        NextHopAction::NextHops => {
            let mut resolved = Vec::new();
            let mut any_drop = false;
            let mut any_cpu = false;

            for nh in &best.nexthops {
                match resolve_nexthop(table, self_prefix, nh, stack) {
                    ResolvedNextHop::Chain(mut nhs) => resolved.append(&mut nhs),
                    ResolvedNextHop::Drop => any_drop = true,
                    ResolvedNextHop::ToCpu => any_cpu = true,
                    ResolvedNextHop::Unresolved => {}
                }
            }

            if !resolved.is_empty() {
                canonicalize(&mut resolved);
                Forwarding::NextHops(resolved)
            } else if any_drop {
                Forwarding::Drop
            } else if any_cpu {
                Forwarding::ToCpu
            } else {
                Forwarding::Unresolvable
            }
        }
    }
}

fn resolve_nexthop<P: NetPrefix>(
    table: &IpPrefixTrie<P, Route>,
    self_prefix: P,
    nh: &NextHop,
    stack: &mut Vec<P>,
) -> ResolvedNextHop {
    match nh {
        NextHop::Resolved {
            ifindex,
            address,
            labels,
            weight,
        } => ResolvedNextHop::Chain(vec![NextHop::Resolved {
            ifindex: *ifindex,
            address: *address,
            labels: labels.clone(),
            weight: *weight,
        }]),
        NextHop::Unresolved {
            address,
            ifindex: Some(ifindex),
            labels,
            weight,
        } => ResolvedNextHop::Chain(vec![NextHop::Resolved {
            ifindex: *ifindex,
            address: *address,
            labels: labels.clone(),
            weight: *weight,
        }]),
        NextHop::Unresolved {
            address,
            ifindex: None,
            labels,
            weight,
        } => {
            // skip self and every prefix already on the resolution stack
            let mut skip = stack.clone();
            skip.push(self_prefix);

            let Some((matched_prefix, matched_route)) =
                table.longest_match_excluding(*address, &skip)
            else {
                return ResolvedNextHop::Unresolved;
            };

            let Some(matched_best) = matched_route.best_entry.as_ref() else {
                return ResolvedNextHop::Unresolved;
            };

            let connected = matched_route.flags.contains(RouteFlags::CONNECTED);
            stack.push(matched_prefix);
            let inner = resolve_route(table, matched_prefix, matched_best, stack);
            stack.pop();

            match inner {
                Forwarding::Drop => ResolvedNextHop::Drop,
                Forwarding::ToCpu => ResolvedNextHop::ToCpu,
                Forwarding::NextHops(mut matched_nhs) => {
                    for m in matched_nhs.iter_mut() {
                        // M is the connected/interface terminal: publish
                        // N's own gateway address, not M's (which is only
                        // ever the subnet's network address, never a usable
                        // next-hop -- see config.rs's interface install).
                        if connected {
                            m.set_address(*address);
                        }
                        m.prepend_labels(labels);
                        m.set_weight(*weight);
                    }
                    ResolvedNextHop::Chain(matched_nhs)
                }
                Forwarding::Unresolved | Forwarding::Unresolvable => ResolvedNextHop::Unresolved,
            }
        }
    }
}
