// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Snapshot codec (C6, §4.6): serializes the full RIB to a self-describing
//! document and rebuilds it from one. `forwarding` and `best_entry` are
//! never trusted from the wire; both are rederived by replaying each
//! route's client contributions and running resolution, so a snapshot
//! produced under one `ClientPriority` loads correctly under another.

use crate::client::{ClientId, ClientPriority};
use crate::errors::RibError;
use crate::nexthop::NextHopEntry;
use crate::route::Route;
use crate::table::{RouteTable, VrfId};
use crate::updater::RouteUpdater;
use rib_lpm::Prefix;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotDoc {
    vrfs: BTreeMap<VrfId, VrfSnapshot>,
}

#[derive(Debug, Serialize, Deserialize)]
struct VrfSnapshot {
    v4: Vec<RouteSnapshot>,
    v6: Vec<RouteSnapshot>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RouteSnapshot {
    prefix: Prefix,
    client_entries: Vec<ClientEntrySnapshot>,
    /// Kept for inspectability; never read back on load (see module docs).
    best_entry: Option<NextHopEntry>,
    class_id: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ClientEntrySnapshot {
    client_id: ClientId,
    entry: NextHopEntry,
}

fn route_snapshot(prefix: Prefix, route: &Route) -> RouteSnapshot {
    RouteSnapshot {
        prefix,
        client_entries: route
            .client_entries
            .iter()
            .map(|(client_id, entry)| ClientEntrySnapshot {
                client_id: *client_id,
                entry: entry.clone(),
            })
            .collect(),
        best_entry: route.best_entry.clone(),
        class_id: route.class_id,
    }
}

/// Serialize every VRF's routes to JSON bytes (§4.6).
pub(crate) fn to_snapshot(vrfs: &BTreeMap<VrfId, RouteTable>) -> Vec<u8> {
    let doc = SnapshotDoc {
        vrfs: vrfs
            .iter()
            .map(|(id, table)| {
                let v4 = table
                    .iter_v4()
                    .map(|(p, r)| route_snapshot(Prefix::from(*p), r))
                    .collect();
                let v6 = table
                    .iter_v6()
                    .map(|(p, r)| route_snapshot(Prefix::from(*p), r))
                    .collect();
                (*id, VrfSnapshot { v4, v6 })
            })
            .collect(),
    };
    // serde_json::to_vec on a well-formed document of owned, non-cyclic
    // data cannot fail.
    serde_json::to_vec(&doc).expect("snapshot document is always serializable")
}

/// Rebuild a full VRF map from previously serialized bytes (§4.6). A parse
/// or structural failure leaves the caller's existing state untouched
/// (§7: "A load failure ... leaves the RIB in its pre-load state"), since
/// this function only ever returns a fresh map on success.
pub(crate) fn from_snapshot(
    bytes: &[u8],
    priority: &ClientPriority,
) -> Result<BTreeMap<VrfId, RouteTable>, RibError> {
    let doc: SnapshotDoc =
        serde_json::from_slice(bytes).map_err(|e| RibError::CorruptSnapshot(e.to_string()))?;

    let mut vrfs = BTreeMap::new();
    for (vrf_id, vrf_snapshot) in doc.vrfs {
        let mut table = RouteTable::new();
        let class_ids: Vec<(Prefix, Option<u32>)> = vrf_snapshot
            .v4
            .iter()
            .chain(vrf_snapshot.v6.iter())
            .map(|r| (r.prefix, r.class_id))
            .collect();
        {
            let mut updater = RouteUpdater::new(&mut table, priority.clone());
            for route in vrf_snapshot.v4.into_iter().chain(vrf_snapshot.v6) {
                for client_entry in route.client_entries {
                    updater
                        .add(route.prefix, client_entry.client_id, client_entry.entry)
                        .map_err(|e| RibError::CorruptSnapshot(e.to_string()))?;
                }
            }
            updater.finalize();
        }
        for (prefix, class_id) in class_ids {
            if let Some(route) = table.exact_match_mut(&prefix) {
                route.set_class_id(class_id);
            }
        }
        vrfs.insert(vrf_id, table);
    }
    Ok(vrfs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nexthop::NextHop;
    use crate::table::DEFAULT_VRF;
    use std::net::IpAddr;

    fn addr(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_snapshot_roundtrip_preserves_contributions() {
        let mut table = RouteTable::new();
        let priority = ClientPriority::default();
        {
            let mut updater = RouteUpdater::new(&mut table, priority.clone());
            updater
                .add(
                    Prefix::from(("10.0.0.0", 24)),
                    ClientId::BGP,
                    NextHopEntry::nexthops(vec![NextHop::unresolved(addr("10.0.0.1"), Some(1), 1)], 20)
                        .unwrap(),
                )
                .unwrap();
            updater.finalize();
        }

        let mut vrfs = BTreeMap::new();
        vrfs.insert(DEFAULT_VRF, table);
        let bytes = to_snapshot(&vrfs);
        let restored = from_snapshot(&bytes, &priority).unwrap();

        let restored_table = restored.get(&DEFAULT_VRF).unwrap();
        let route = restored_table
            .exact_match(&Prefix::from(("10.0.0.0", 24)))
            .unwrap();
        assert_eq!(route.client_entries.len(), 1);
        assert!(route.client_entries.contains_key(&ClientId::BGP));
        assert!(matches!(
            route.forwarding,
            crate::route::Forwarding::NextHops(_)
        ));
    }

    #[test]
    fn test_corrupt_snapshot_is_rejected() {
        let priority = ClientPriority::default();
        let err = from_snapshot(b"not json", &priority).unwrap_err();
        assert!(matches!(err, RibError::CorruptSnapshot(_)));
    }
}
