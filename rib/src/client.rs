// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Route clients: the sources that contribute routes to a [`crate::route::Route`]
//! (BGP, static config, interface routes, OpenR, ...) and the policy used to
//! pick a winner among their contributions.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Identifies a route source. Small integer, not an enum, so embedding
/// callers can register clients we don't know about at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClientId(pub u16);

impl ClientId {
    pub const STATIC: ClientId = ClientId(0);
    pub const STATIC_NULL: ClientId = ClientId(1);
    pub const STATIC_CPU: ClientId = ClientId(2);
    pub const INTERFACE: ClientId = ClientId(3);
    pub const BGP: ClientId = ClientId(4);
    pub const OPENR: ClientId = ClientId(5);
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match *self {
            ClientId::STATIC => "STATIC",
            ClientId::STATIC_NULL => "STATIC_NULL",
            ClientId::STATIC_CPU => "STATIC_CPU",
            ClientId::INTERFACE => "INTERFACE",
            ClientId::BGP => "BGP",
            ClientId::OPENR => "OPENR",
            _ => return write!(f, "CLIENT({})", self.0),
        };
        write!(f, "{name}")
    }
}

/// Lower wins. Each client has a default; a per-route override is allowed
/// at the call site (see `RibCoordinator::update`).
pub type AdminDistance = u8;

pub fn default_admin_distance(client: ClientId) -> AdminDistance {
    match client {
        ClientId::INTERFACE => 0,
        ClientId::STATIC | ClientId::STATIC_NULL | ClientId::STATIC_CPU => 1,
        ClientId::OPENR => 10,
        ClientId::BGP => 20,
        _ => 200,
    }
}

/// Deterministic total order over [`ClientId`]s used to break ties between
/// contributions of equal admin distance. The spec leaves the exact order
/// unspecified beyond "deterministic"; this type makes it an explicit,
/// documented, overridable construction parameter of the coordinator rather
/// than a hardcoded comparison.
#[derive(Debug, Clone)]
pub struct ClientPriority {
    order: Vec<ClientId>,
}

impl ClientPriority {
    pub fn new(order: Vec<ClientId>) -> Self {
        Self { order }
    }

    /// Rank used for comparison: position in the configured order, or
    /// `(order.len(), client_id)` for clients outside it (these still sort
    /// deterministically, among themselves, by `ClientId`).
    fn rank(&self, client: ClientId) -> (usize, ClientId) {
        match self.order.iter().position(|c| *c == client) {
            Some(pos) => (pos, client),
            None => (self.order.len(), client),
        }
    }

    /// Orders `a` before `b` when `a` has strictly higher priority.
    pub fn compare(&self, a: ClientId, b: ClientId) -> Ordering {
        self.rank(a).cmp(&self.rank(b))
    }
}

impl Default for ClientPriority {
    /// STATIC > INTERFACE > BGP > OPENR, the default named in the design notes.
    fn default() -> Self {
        Self::new(vec![
            ClientId::STATIC,
            ClientId::STATIC_NULL,
            ClientId::STATIC_CPU,
            ClientId::INTERFACE,
            ClientId::BGP,
            ClientId::OPENR,
        ])
    }
}
