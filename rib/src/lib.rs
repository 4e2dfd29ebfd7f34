// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The routing information base (RIB) for a network switch control plane:
//! multi-client route merging under administrative distance, recursive
//! longest-prefix-match resolution, and a transactional FIB publish
//! protocol with rollback on hardware rejection.
//!
//! The RIB knows nothing about how routes are computed (BGP session state,
//! link-layer/ARP/ND, VLAN membership) or how the hardware/ASIC programmer
//! turns a resolved next-hop set into silicon state: both are out of scope,
//! reduced respectively to client input and the [`fib::FibUpdateFn`] hook.

#![deny(clippy::all)]

pub mod client;
pub mod config;
pub mod coordinator;
pub mod display;
pub mod errors;
pub mod fib;
pub mod nexthop;
pub mod resolve;
pub mod route;
mod snapshot;
pub mod table;
pub mod updater;

pub use client::{AdminDistance, ClientId, ClientPriority};
pub use config::{InterfaceId, RibConfig, StaticNextHop};
pub use coordinator::{RibCoordinator, RouteAdd};
pub use errors::RibError;
pub use fib::{FibUpdateFn, HwUpdateError};
pub use nexthop::{LabelOp, NextHop, NextHopAction, NextHopEntry};
pub use route::{Forwarding, Route, RouteFlags};
pub use table::{RouteTable, VrfId, DEFAULT_VRF};
pub use updater::UpdateStats;

pub use rib_lpm::Prefix;
