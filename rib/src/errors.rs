// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Error taxonomy (§7): `InvalidInput`, `HwUpdateError`, `FatalInconsistency`,
//! `CorruptSnapshot`. Kinds, not a type hierarchy -- a single flat enum with
//! `is_fatal()` standing in for the taxonomy's propagation rule.

use crate::table::VrfId;
use std::net::IpAddr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RibError {
    // -- InvalidInput --
    #[error("unknown VRF {0}")]
    UnknownVrf(VrfId),
    #[error("next-hop set is empty for action NEXTHOPS")]
    EmptyNextHopSet,
    #[error("next-hop {0} is link-local and must specify an explicit interface")]
    InvalidLinkLocalNextHop(IpAddr),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -- HwUpdateError --
    #[error("FIB programmer rejected the update for vrf {vrf}: {reason}")]
    HwUpdateError { vrf: VrfId, reason: String },

    // -- FatalInconsistency --
    #[error("rollback republish failed for vrf {vrf}: {reason}")]
    RollbackPublishFailed { vrf: VrfId, reason: String },
    #[error("post-commit invariant violated: {0}")]
    InvariantViolation(String),
    #[error("RIB coordinator is poisoned by a prior fatal inconsistency")]
    Poisoned,

    // -- CorruptSnapshot --
    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(String),
}

impl RibError {
    /// `FatalInconsistency`-kind errors: not recoverable, the coordinator is
    /// poisoned after one is returned (§7).
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RibError::RollbackPublishFailed { .. }
                | RibError::InvariantViolation(_)
                | RibError::Poisoned
        )
    }

    pub fn is_hw_update_error(&self) -> bool {
        matches!(self, RibError::HwUpdateError { .. })
    }
}
