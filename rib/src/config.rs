// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! [`ConfigApplier`] (C4): reconciles a [`crate::table::RouteTable`] against
//! a declarative [`RibConfig`] snapshot of interface subnets and static
//! routes (§4.4, §6).

use crate::client::ClientId;
use crate::errors::RibError;
use crate::nexthop::{NextHop, NextHopEntry};
use crate::table::{RouteTable, VrfId};
use crate::updater::RouteUpdater;
use rib_lpm::Prefix;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;

/// An opaque local interface identifier. The RIB only consumes interface
/// *subnets*; link state, ARP/ND, and port/VLAN membership are out of scope
/// (§1).
pub type InterfaceId = u32;

/// A static next-hop as given by configuration: a gateway address and an
/// optional pinning interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticNextHop {
    pub address: IpAddr,
    pub ifindex: Option<InterfaceId>,
    pub weight: u32,
}

/// The full declarative configuration consumed by `RibCoordinator::reconfigure`
/// (§6 "Configuration input").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RibConfig {
    /// RouterID (VRF) -> Prefix -> InterfaceID.
    pub vrf_interface_routes: BTreeMap<VrfId, BTreeMap<Prefix, InterfaceId>>,
    pub static_routes_with_nexthops: Vec<(VrfId, Prefix, Vec<StaticNextHop>)>,
    pub static_routes_to_null: Vec<(VrfId, Prefix)>,
    pub static_routes_to_cpu: Vec<(VrfId, Prefix)>,
    // MPLS label FIB is out of scope (§1); static MPLS routes are accepted
    // as config input per §6 but intentionally not applied to any RouteTable.
    pub static_mpls_routes_with_nexthops: Vec<(u32, Vec<StaticNextHop>)>,
}

/// Validate a single static next-hop (§4.4: "a next-hop whose address is
/// IPv6 link-local MUST specify an interface").
fn validate_nexthop(nh: &StaticNextHop) -> Result<(), RibError> {
    if let IpAddr::V6(a) = nh.address {
        if a.is_unicast_link_local() && nh.ifindex.is_none() {
            return Err(RibError::InvalidLinkLocalNextHop(nh.address));
        }
    }
    Ok(())
}

/// Validate `config` in its entirety, before any VRF's table is touched
/// (§4.5/§7: "rejected before mutation; no state change"). The only
/// rejectable condition right now is an IPv6 link-local static next-hop
/// without a pinning interface; this is the single gate `reconfigure` goes
/// through before appending a mutating op, so a rejected config never
/// partially applies.
pub fn validate_config(config: &RibConfig) -> Result<(), RibError> {
    for (vrf, prefix, nexthops) in &config.static_routes_with_nexthops {
        for nh in nexthops {
            validate_nexthop(nh).map_err(|e| {
                RibError::InvalidConfig(format!(
                    "vrf {vrf} prefix {prefix}: {e}"
                ))
            })?;
        }
    }
    Ok(())
}

/// Reconcile `table` (for a single VRF) against `config`'s view of that VRF.
/// Interface and static contributions are each replaced wholesale so the
/// table ends up with exactly the configured set (§4.4 step 1-2).
pub fn apply_vrf_config(
    table: &mut RouteTable,
    vrf: VrfId,
    config: &RibConfig,
    priority: crate::client::ClientPriority,
) -> Result<Vec<Prefix>, RibError> {
    let mut updater = RouteUpdater::new(table, priority);

    let interfaces = config.vrf_interface_routes.get(&vrf).cloned().unwrap_or_default();
    let interface_prefixes: Vec<Prefix> = interfaces.keys().copied().collect();
    updater.reset_client(ClientId::INTERFACE, &interface_prefixes);
    for (prefix, ifindex) in &interfaces {
        let nh = NextHop::Unresolved {
            address: prefix.as_address(),
            ifindex: Some(*ifindex),
            labels: Vec::new(),
            weight: 1,
        };
        let entry = NextHopEntry::nexthops(
            vec![nh],
            crate::client::default_admin_distance(ClientId::INTERFACE),
        )?;
        updater.add(*prefix, ClientId::INTERFACE, entry)?;
    }

    let null_prefixes: Vec<Prefix> = config
        .static_routes_to_null
        .iter()
        .filter(|(v, _)| *v == vrf)
        .map(|(_, p)| *p)
        .collect();
    updater.reset_client(ClientId::STATIC_NULL, &null_prefixes);
    for prefix in &null_prefixes {
        let entry = NextHopEntry::drop(crate::client::default_admin_distance(
            ClientId::STATIC_NULL,
        ));
        updater.add(*prefix, ClientId::STATIC_NULL, entry)?;
    }

    let cpu_prefixes: Vec<Prefix> = config
        .static_routes_to_cpu
        .iter()
        .filter(|(v, _)| *v == vrf)
        .map(|(_, p)| *p)
        .collect();
    updater.reset_client(ClientId::STATIC_CPU, &cpu_prefixes);
    for prefix in &cpu_prefixes {
        let entry = NextHopEntry::to_cpu(crate::client::default_admin_distance(
            ClientId::STATIC_CPU,
        ));
        updater.add(*prefix, ClientId::STATIC_CPU, entry)?;
    }

    let static_prefixes: Vec<Prefix> = config
        .static_routes_with_nexthops
        .iter()
        .filter(|(v, _, _)| *v == vrf)
        .map(|(_, p, _)| *p)
        .collect();
    updater.reset_client(ClientId::STATIC, &static_prefixes);
    for (_, prefix, nexthops) in config
        .static_routes_with_nexthops
        .iter()
        .filter(|(v, _, _)| *v == vrf)
    {
        for nh in nexthops {
            validate_nexthop(nh)?;
        }
        let nhs: Vec<NextHop> = nexthops
            .iter()
            .map(|n| NextHop::Unresolved {
                address: n.address,
                ifindex: n.ifindex,
                labels: Vec::new(),
                weight: n.weight,
            })
            .collect();
        let entry = NextHopEntry::nexthops(
            nhs,
            crate::client::default_admin_distance(ClientId::STATIC),
        )?;
        updater.add(*prefix, ClientId::STATIC, entry)?;
    }

    let (_, touched) = updater.finalize();
    Ok(touched)
}
