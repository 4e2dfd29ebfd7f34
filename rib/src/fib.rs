// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The FIB update callback contract (§6): the only interface between the
//! RIB and the hardware/ASIC programmer, which is otherwise an opaque
//! external collaborator (§1).

use crate::route::Route;
use crate::table::{RouteTable, VrfId};
use ipnet::{Ipv4Net, Ipv6Net};
use rib_lpm::IpPrefixTrie;

/// Error returned by a [`FibUpdateFn`] when the downstream programmer
/// rejects a resolved snapshot. Carries a human-readable reason only: the
/// RIB does not interpret *why* hardware rejected an update, only that it
/// did (§7 `HwUpdateError`).
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct HwUpdateError(pub String);

impl HwUpdateError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Called synchronously from the writer, after resolution, exactly once per
/// committed update per VRF (§6). Receives an immutable view into the
/// resolved trees; it MUST NOT call back into the coordinator synchronously
/// (§5 reentrancy contract -- enforced by convention, not by the type
/// system).
pub trait FibUpdateFn {
    fn publish(
        &mut self,
        vrf: VrfId,
        v4: &IpPrefixTrie<Ipv4Net, Route>,
        v6: &IpPrefixTrie<Ipv6Net, Route>,
    ) -> Result<(), HwUpdateError>;
}

impl<F> FibUpdateFn for F
where
    F: FnMut(VrfId, &IpPrefixTrie<Ipv4Net, Route>, &IpPrefixTrie<Ipv6Net, Route>) -> Result<(), HwUpdateError>,
{
    fn publish(
        &mut self,
        vrf: VrfId,
        v4: &IpPrefixTrie<Ipv4Net, Route>,
        v6: &IpPrefixTrie<Ipv6Net, Route>,
    ) -> Result<(), HwUpdateError> {
        self(vrf, v4, v6)
    }
}

pub(crate) fn invoke(
    cb: &mut dyn FibUpdateFn,
    vrf: VrfId,
    table: &RouteTable,
) -> Result<(), HwUpdateError> {
    cb.publish(vrf, &table.v4, &table.v6)
}

/// A [`FibUpdateFn`] for tests: records every publish call and can be told
/// to fail the next N calls, used to drive the rollback scenario (§8
/// scenario 5).
#[cfg(any(test, feature = "testing"))]
pub struct RecordingFib {
    pub calls: Vec<VrfId>,
    pub fail_next: usize,
}

#[cfg(any(test, feature = "testing"))]
impl RecordingFib {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            fail_next: 0,
        }
    }

    pub fn failing(times: usize) -> Self {
        Self {
            calls: Vec::new(),
            fail_next: times,
        }
    }
}

#[cfg(any(test, feature = "testing"))]
impl Default for RecordingFib {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "testing"))]
impl FibUpdateFn for RecordingFib {
    fn publish(
        &mut self,
        vrf: VrfId,
        _v4: &IpPrefixTrie<Ipv4Net, Route>,
        _v6: &IpPrefixTrie<Ipv6Net, Route>,
    ) -> Result<(), HwUpdateError> {
        self.calls.push(vrf);
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(HwUpdateError::new("synthetic hardware rejection"));
        }
        Ok(())
    }
}
