// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! End-to-end scenarios exercised only through [`RibCoordinator`]'s public
//! API, plus the boundary behaviors named alongside them.

use ipnet::{Ipv4Net, Ipv6Net};
use rib_core::{ClientId, HwUpdateError, Prefix, RibConfig, RibCoordinator, RibError, Route, RouteAdd, StaticNextHop};
use rib_lpm::IpPrefixTrie;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn addr(s: &str) -> IpAddr {
    s.parse().unwrap()
}

fn prefix(s: &str) -> Prefix {
    match s.parse::<ipnet::IpNet>().unwrap() {
        ipnet::IpNet::V4(v4) => Prefix::from(v4),
        ipnet::IpNet::V6(v6) => Prefix::from(v6),
    }
}

fn accepting(
) -> impl FnMut(u32, &IpPrefixTrie<Ipv4Net, Route>, &IpPrefixTrie<Ipv6Net, Route>) -> Result<(), HwUpdateError> {
    move |_vrf, _v4, _v6| Ok(())
}

#[test]
fn test_drop_via_static() {
    let rib = RibCoordinator::new();
    let stats = rib
        .update(
            0,
            ClientId::STATIC,
            1,
            vec![(prefix("10.0.0.0/24"), RouteAdd::Drop)],
            vec![],
            false,
            accepting(),
        )
        .unwrap();
    assert_eq!(stats.v4_added, 1);

    let table = rib.get_routes(0).unwrap();
    let route = table
        .exact_match(&prefix("10.0.0.0/24"))
        .unwrap();
    assert_eq!(route.forwarding, rib_core::Forwarding::Drop);
}

#[test]
fn test_recursive_to_cpu() {
    let rib = RibCoordinator::new();
    rib.update(
        0,
        ClientId::STATIC,
        1,
        vec![(prefix("2.2.2.2/32"), RouteAdd::ToCpu)],
        vec![],
        false,
        accepting(),
    )
    .unwrap();

    let via = rib_core::NextHop::unresolved(addr("2.2.2.2"), None, 1);
    rib.update(
        0,
        ClientId::BGP,
        20,
        vec![(prefix("4.4.4.4/32"), RouteAdd::NextHops(vec![via]))],
        vec![],
        false,
        accepting(),
    )
    .unwrap();

    let table = rib.get_routes(0).unwrap();
    let route = table.exact_match(&prefix("4.4.4.4/32")).unwrap();
    assert_eq!(route.forwarding, rib_core::Forwarding::ToCpu);
}

#[test]
fn test_recursive_via_connected_interface_keeps_gateway_address() {
    let rib = RibCoordinator::new();
    let mut config = RibConfig::default();
    config
        .vrf_interface_routes
        .entry(0)
        .or_default()
        .insert(prefix("10.0.1.0/24"), 3);
    rib.reconfigure(config, accepting()).unwrap();

    let via = rib_core::NextHop::unresolved(addr("10.0.1.5"), None, 1);
    rib.update(
        0,
        ClientId::BGP,
        20,
        vec![(prefix("10.0.0.0/24"), RouteAdd::NextHops(vec![via]))],
        vec![],
        false,
        accepting(),
    )
    .unwrap();

    let table = rib.get_routes(0).unwrap();
    let route = table.exact_match(&prefix("10.0.0.0/24")).unwrap();
    match &route.forwarding {
        rib_core::Forwarding::NextHops(nhs) => {
            assert_eq!(nhs.len(), 1);
            // the published gateway is the BGP next-hop's own address
            // (10.0.1.5), never the interface route's subnet address
            // (10.0.1.0).
            assert_eq!(nhs[0].address(), addr("10.0.1.5"));
        }
        other => panic!("expected NextHops, got {other:?}"),
    }
}

#[test]
fn test_ecmp_merge_via_reset_client() {
    let rib = RibCoordinator::new();
    let nh1 = rib_core::NextHop::unresolved(addr("10.0.0.1"), Some(1), 1);
    let nh2 = rib_core::NextHop::unresolved(addr("10.0.0.2"), Some(2), 1);
    rib.update(
        0,
        ClientId::BGP,
        20,
        vec![(
            prefix("192.0.2.0/24"),
            RouteAdd::NextHops(vec![nh1, nh2]),
        )],
        vec![],
        false,
        accepting(),
    )
    .unwrap();

    let table = rib.get_routes(0).unwrap();
    let route = table
        .exact_match(&prefix("192.0.2.0/24"))
        .unwrap();
    match &route.forwarding {
        rib_core::Forwarding::NextHops(nhs) => assert_eq!(nhs.len(), 2),
        other => panic!("expected ECMP next-hops, got {other:?}"),
    }

    // reset_client with a fresh, disjoint next-hop set replaces the prior
    // contribution wholesale rather than merging with it.
    let nh3 = rib_core::NextHop::unresolved(addr("10.0.0.3"), Some(3), 1);
    rib.update(
        0,
        ClientId::BGP,
        20,
        vec![(
            prefix("192.0.2.0/24"),
            RouteAdd::NextHops(vec![nh3]),
        )],
        vec![],
        true,
        accepting(),
    )
    .unwrap();
    let table = rib.get_routes(0).unwrap();
    let route = table
        .exact_match(&prefix("192.0.2.0/24"))
        .unwrap();
    match &route.forwarding {
        rib_core::Forwarding::NextHops(nhs) => assert_eq!(nhs.len(), 1),
        other => panic!("expected single next-hop after reset, got {other:?}"),
    }
}

#[test]
fn test_admin_distance_tiebreak() {
    let rib = RibCoordinator::new();
    rib.update(
        0,
        ClientId::BGP,
        20,
        vec![(prefix("198.51.100.0/24"), RouteAdd::ToCpu)],
        vec![],
        false,
        accepting(),
    )
    .unwrap();
    rib.update(
        0,
        ClientId::STATIC,
        1,
        vec![(prefix("198.51.100.0/24"), RouteAdd::Drop)],
        vec![],
        false,
        accepting(),
    )
    .unwrap();

    let table = rib.get_routes(0).unwrap();
    let route = table
        .exact_match(&prefix("198.51.100.0/24"))
        .unwrap();
    // lower admin distance (STATIC=1) wins over BGP=20 regardless of
    // arrival order.
    assert_eq!(route.forwarding, rib_core::Forwarding::Drop);
}

#[test]
fn test_rollback_on_hw_rejection_preserves_prior_state() {
    let rib = RibCoordinator::new();
    rib.update(
        0,
        ClientId::STATIC,
        1,
        vec![(prefix("203.0.113.0/24"), RouteAdd::Drop)],
        vec![],
        false,
        accepting(),
    )
    .unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();
    let rejecting = move |_vrf: u32,
                           _v4: &IpPrefixTrie<Ipv4Net, Route>,
                           _v6: &IpPrefixTrie<Ipv6Net, Route>| {
        let n = calls_clone.fetch_add(1, Ordering::SeqCst);
        if n == 0 {
            Err(HwUpdateError::new("synthetic hardware rejection"))
        } else {
            Ok(())
        }
    };

    let err = rib
        .update(
            0,
            ClientId::BGP,
            20,
            vec![(prefix("203.0.113.0/24"), RouteAdd::ToCpu)],
            vec![],
            false,
            rejecting,
        )
        .unwrap_err();
    assert!(matches!(err, RibError::HwUpdateError { .. }));
    // once for the attempted update, once to republish the rolled-back state
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let table = rib.get_routes(0).unwrap();
    let route = table
        .exact_match(&prefix("203.0.113.0/24"))
        .unwrap();
    // BGP's rejected contribution never took effect; STATIC's DROP still wins.
    assert_eq!(route.forwarding, rib_core::Forwarding::Drop);
    assert_eq!(route.client_entries.len(), 1);
}

#[test]
fn test_reconfigure_removes_stale_vrf() {
    let rib = RibCoordinator::new();
    let mut config = RibConfig::default();
    config
        .static_routes_to_null
        .push((7, prefix("10.10.0.0/16")));
    rib.reconfigure(config, accepting()).unwrap();
    assert!(rib.list_vrfs().unwrap().contains(&7));

    // reconfiguring with no content for VRF 7 drops it entirely.
    rib.reconfigure(RibConfig::default(), accepting()).unwrap();
    assert!(!rib.list_vrfs().unwrap().contains(&7));
}

#[test]
fn test_host_bits_are_normalized_on_insert() {
    let rib = RibCoordinator::new();
    rib.update(
        0,
        ClientId::STATIC,
        1,
        vec![(prefix("10.0.0.5/24"), RouteAdd::Drop)],
        vec![],
        false,
        accepting(),
    )
    .unwrap();
    let table = rib.get_routes(0).unwrap();
    assert!(table
        .exact_match(&prefix("10.0.0.0/24"))
        .is_some());
}

#[test]
fn test_delete_nonexistent_pair_is_noop() {
    let rib = RibCoordinator::new();
    let stats = rib
        .update(
            0,
            ClientId::BGP,
            20,
            vec![],
            vec![prefix("10.0.0.0/24")],
            false,
            accepting(),
        )
        .unwrap();
    assert_eq!(stats.v4_deleted, 0);
}

#[test]
fn test_empty_nexthop_set_rejected_before_mutation() {
    let rib = RibCoordinator::new();
    let err = rib
        .update(
            0,
            ClientId::BGP,
            20,
            vec![(prefix("10.0.0.0/24"), RouteAdd::NextHops(vec![]))],
            vec![],
            false,
            accepting(),
        )
        .unwrap_err();
    assert!(matches!(err, RibError::EmptyNextHopSet));
}

#[test]
fn test_update_on_unknown_vrf_rejected() {
    let rib = RibCoordinator::new();
    let err = rib
        .update(
            99,
            ClientId::STATIC,
            1,
            vec![(prefix("10.0.0.0/24"), RouteAdd::Drop)],
            vec![],
            false,
            accepting(),
        )
        .unwrap_err();
    assert!(matches!(err, RibError::UnknownVrf(99)));
}

#[test]
fn test_snapshot_roundtrip_through_coordinator() {
    let rib = RibCoordinator::new();
    rib.update(
        0,
        ClientId::STATIC,
        1,
        vec![(prefix("10.0.0.0/24"), RouteAdd::Drop)],
        vec![],
        false,
        accepting(),
    )
    .unwrap();
    let bytes = rib.to_snapshot().unwrap();

    let restored = RibCoordinator::new();
    restored.from_snapshot(&bytes).unwrap();
    let table = restored.get_routes(0).unwrap();
    assert!(table
        .exact_match(&prefix("10.0.0.0/24"))
        .is_some());
}

#[test]
fn test_reconfigure_rejects_link_local_nexthop_without_interface() {
    let rib = RibCoordinator::new();
    let mut config = RibConfig::default();
    config.static_routes_with_nexthops.push((
        0,
        prefix("2001:db8::/64"),
        vec![StaticNextHop {
            address: addr("fe80::1"),
            ifindex: None,
            weight: 1,
        }],
    ));
    let err = rib.reconfigure(config, accepting()).unwrap_err();
    assert!(matches!(err, RibError::InvalidConfig(_)));

    // the config was rejected before any mutation; no stray VRF was created.
    assert!(!rib.list_vrfs().unwrap().contains(&0));
}

#[test]
fn test_static_nexthop_config_applies() {
    let rib = RibCoordinator::new();
    let mut config = RibConfig::default();
    config.static_routes_with_nexthops.push((
        0,
        prefix("172.16.0.0/16"),
        vec![StaticNextHop {
            address: addr("172.16.0.1"),
            ifindex: Some(1),
            weight: 1,
        }],
    ));
    rib.reconfigure(config, accepting()).unwrap();
    let table = rib.get_routes(0).unwrap();
    let route = table
        .exact_match(&prefix("172.16.0.0/16"))
        .unwrap();
    assert!(matches!(
        route.forwarding,
        rib_core::Forwarding::NextHops(_)
    ));
}
