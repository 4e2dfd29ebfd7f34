// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! [`RibCoordinator`] (C5): owns the VRF map and the single writer thread,
//! dispatches every mutating call onto it in FIFO order, and implements the
//! transactional publish/rollback protocol (§4.5, §5).
//!
//! State lives in a [`left_right::WriteHandle`]/[`left_right::ReadHandle`]
//! pair: readers ([`RibCoordinator::get_routes`], [`RibCoordinator::list_vrfs`])
//! go through the `ReadHandle` and never block on the writer. Every mutation
//! is expressed as a [`RibOp`] so both the writer's own copy and the copy
//! readers are currently looking at converge to the same state once
//! published (`left_right`'s absorb-twice contract).
//!
//! The transactional step (§4.5 steps 3-5) does not fit `Absorb` directly:
//! `append()` has no return value, and we need to decide whether to publish
//! based on what the FIB callback says about the *result* of the mutation.
//! We resolve this by giving `update`/`reconfigure`/`set_class_id` ownership
//! of the FIB callback (`F: Send + 'static`) and running the whole
//! mutate-then-maybe-rollback sequence as one opaque task on the writer
//! thread: the callback never has to cross back out to the caller's thread,
//! and the writer thread never blocks on anything but the callback itself.

use crate::client::{AdminDistance, ClientId, ClientPriority};
use crate::config::RibConfig;
use crate::errors::RibError;
use crate::fib::{FibUpdateFn, HwUpdateError};
use crate::nexthop::{NextHop, NextHopEntry};
use crate::snapshot;
use crate::table::{RouteTable, VrfId, DEFAULT_VRF};
use crate::updater::{apply_inverse, RouteUpdater};
use left_right::{Absorb, ReadHandle, WriteHandle};
use rib_lpm::Prefix;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{error, info, warn};

/// What a contributed route resolves to before recursive resolution runs;
/// the raw shape `update()` accepts for one `(prefix, client)` addition.
#[derive(Debug, Clone)]
pub enum RouteAdd {
    Drop,
    ToCpu,
    NextHops(Vec<NextHop>),
}

impl RouteAdd {
    fn into_entry(self, admin_distance: AdminDistance) -> Result<NextHopEntry, RibError> {
        match self {
            RouteAdd::Drop => Ok(NextHopEntry::drop(admin_distance)),
            RouteAdd::ToCpu => Ok(NextHopEntry::to_cpu(admin_distance)),
            RouteAdd::NextHops(nhs) => NextHopEntry::nexthops(nhs, admin_distance),
        }
    }
}

/// The mutation the writer replays against its own copy, and later against
/// the other copy at the next `publish()` (§4.2, §4.4, §9).
#[derive(Clone)]
enum RibOp {
    EnsureVrf(VrfId),
    SetPriority(ClientPriority),
    ApplyConfig(Box<RibConfig>),
    ReplaceAll(BTreeMap<VrfId, RouteTable>),
}

#[derive(Clone)]
struct RibState {
    vrfs: BTreeMap<VrfId, RouteTable>,
    priority: ClientPriority,
}

impl Default for RibState {
    fn default() -> Self {
        let mut vrfs = BTreeMap::new();
        vrfs.insert(DEFAULT_VRF, RouteTable::new());
        Self {
            vrfs,
            priority: ClientPriority::default(),
        }
    }
}

/// Read access to the writer's own (not-yet-published) copy of the state.
/// `WriteHandle` only derefs to the `ReadHandle`, which reflects the last
/// *published* copy, so the in-progress writer copy must be reached via
/// `raw_write_handle` instead.
fn writer_state(write_handle: &mut WriteHandle<RibState, RibOp>) -> &RibState {
    // SAFETY: the writer thread is the sole owner of `write_handle` and
    // never aliases this reference with a mutable one while it's live.
    unsafe { write_handle.raw_write_handle().as_ref() }
}

impl RibState {
    fn apply(&mut self, op: &RibOp) {
        match op {
            RibOp::EnsureVrf(vrf) => {
                self.vrfs.entry(*vrf).or_insert_with(RouteTable::new);
            }
            RibOp::SetPriority(priority) => {
                self.priority = priority.clone();
            }
            RibOp::ApplyConfig(config) => {
                let configured_vrfs: std::collections::BTreeSet<VrfId> = config
                    .vrf_interface_routes
                    .keys()
                    .chain(config.static_routes_with_nexthops.iter().map(|(v, _, _)| v))
                    .chain(config.static_routes_to_null.iter().map(|(v, _)| v))
                    .chain(config.static_routes_to_cpu.iter().map(|(v, _)| v))
                    .copied()
                    .collect();
                // §8 scenario 6: a VRF with no remaining configuration is
                // dropped entirely, not just emptied.
                self.vrfs.retain(|id, _| *id == DEFAULT_VRF || configured_vrfs.contains(id));
                for vrf in &configured_vrfs {
                    let table = self.vrfs.entry(*vrf).or_insert_with(RouteTable::new);
                    crate::config::apply_vrf_config(table, *vrf, config, self.priority.clone())
                        .expect(
                            "RibCoordinator::reconfigure validates the config before \
                             appending this op; apply_vrf_config cannot fail here",
                        );
                }
            }
            RibOp::ReplaceAll(vrfs) => {
                self.vrfs = vrfs.clone();
            }
        }
    }
}

impl Absorb<RibOp> for RibState {
    fn absorb_first(&mut self, operation: &mut RibOp, _other: &Self) {
        self.apply(operation);
    }

    fn absorb_second(&mut self, operation: RibOp, _other: &Self) {
        self.apply(&operation);
    }

    fn sync_with(&mut self, first: &Self) {
        *self = first.clone();
    }
}

type Task = Box<dyn FnOnce(&mut WriteHandle<RibState, RibOp>) + Send>;

/// The RIB's public coordinator (C5): one per switch control plane process.
/// Construct once, share `&RibCoordinator` across client-facing call sites;
/// every method is safe to call concurrently (§5).
pub struct RibCoordinator {
    read_handle: ReadHandle<RibState>,
    tx: Sender<Task>,
    join: Option<JoinHandle<()>>,
    poisoned: Arc<AtomicBool>,
}

impl RibCoordinator {
    pub fn new() -> Self {
        Self::with_priority(ClientPriority::default())
    }

    pub fn with_priority(priority: ClientPriority) -> Self {
        let (mut write_handle, read_handle) = left_right::new::<RibState, RibOp>();
        write_handle.append(RibOp::SetPriority(priority));
        write_handle.publish();

        let (tx, rx) = mpsc::channel::<Task>();
        let join = std::thread::Builder::new()
            .name("rib-writer".to_string())
            .spawn(move || {
                let mut write_handle = write_handle;
                for task in rx {
                    task(&mut write_handle);
                }
            })
            .expect("failed to spawn RIB writer thread");

        Self {
            read_handle,
            tx,
            join: Some(join),
            poisoned: Arc::new(AtomicBool::new(false)),
        }
    }

    fn check_poisoned(&self) -> Result<(), RibError> {
        if self.poisoned.load(AtomicOrdering::Acquire) {
            return Err(RibError::Poisoned);
        }
        Ok(())
    }

    /// Run `f` on the writer thread and block for its result. `f` may mutate
    /// `write_handle` (append/publish) before returning.
    fn submit<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut WriteHandle<RibState, RibOp>) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = mpsc::channel();
        let task: Task = Box::new(move |write_handle| {
            let result = f(write_handle);
            let _ = reply_tx.send(result);
        });
        self.tx
            .send(task)
            .expect("RIB writer thread terminated unexpectedly");
        reply_rx
            .recv()
            .expect("RIB writer thread dropped without responding")
    }

    /// Enqueue `f` on the writer thread without waiting for it to run (§5
    /// "operations submitted may be ... asynchronous (fire-and-forget)").
    /// Still strictly FIFO with every other submission; the caller only
    /// gives up the ability to observe the result or its timing.
    fn submit_fire_and_forget<F>(&self, f: F)
    where
        F: FnOnce(&mut WriteHandle<RibState, RibOp>) + Send + 'static,
    {
        let task: Task = Box::new(f);
        self.tx
            .send(task)
            .expect("RIB writer thread terminated unexpectedly");
    }

    /// Create a VRF if it does not already exist. Idempotent (§4.5 op table).
    pub fn ensure_vrf(&self, vrf: VrfId) -> Result<(), RibError> {
        self.check_poisoned()?;
        self.submit(move |wh| {
            wh.append(RibOp::EnsureVrf(vrf));
            wh.publish();
        });
        Ok(())
    }

    /// List currently configured VRF ids, in ascending order.
    pub fn list_vrfs(&self) -> Result<Vec<VrfId>, RibError> {
        self.check_poisoned()?;
        let guard = self
            .read_handle
            .enter()
            .ok_or(RibError::Poisoned)?;
        Ok(guard.vrfs.keys().copied().collect())
    }

    /// A consistent, read-only snapshot of one VRF's route table (§5
    /// "readers always observe either the old or the new published state,
    /// never a partial one").
    pub fn get_routes(&self, vrf: VrfId) -> Result<RouteTable, RibError> {
        self.check_poisoned()?;
        let guard = self
            .read_handle
            .enter()
            .ok_or(RibError::Poisoned)?;
        guard
            .vrfs
            .get(&vrf)
            .cloned()
            .ok_or(RibError::UnknownVrf(vrf))
    }

    /// Submit one client's adds/deletes (and, optionally, a full reset of
    /// that client's contributions to exactly the adds given) for `vrf`,
    /// resolve, and publish only if `fib_cb` accepts the result (§4.5).
    ///
    /// `fib_cb` runs once on success. On `HwUpdateError` the mutation is
    /// rolled back via the inverse delta and `fib_cb` is invoked a second
    /// time with the restored (pre-call) state to keep hardware consistent;
    /// if that second call also fails the coordinator is poisoned and every
    /// subsequent call returns [`RibError::Poisoned`] (§7 `FatalInconsistency`).
    pub fn update<F>(
        &self,
        vrf: VrfId,
        client: ClientId,
        admin_distance: AdminDistance,
        adds: Vec<(Prefix, RouteAdd)>,
        deletes: Vec<Prefix>,
        reset_to_adds_only: bool,
        fib_cb: F,
    ) -> Result<crate::updater::UpdateStats, RibError>
    where
        F: FibUpdateFn + Send + 'static,
    {
        self.check_poisoned()?;

        let mut built_adds = Vec::with_capacity(adds.len());
        for (prefix, add) in adds {
            built_adds.push((prefix, client, add.into_entry(admin_distance)?));
        }
        let deletes: Vec<(Prefix, ClientId)> = deletes.into_iter().map(|p| (p, client)).collect();
        let reset = reset_to_adds_only.then(|| {
            (
                client,
                built_adds.iter().map(|(p, _, _)| *p).collect::<Vec<_>>(),
            )
        });

        let poisoned = self.poisoned.clone();
        self.submit(move |write_handle| {
            run_transaction(write_handle, &poisoned, vrf, fib_cb, move |table, priority| {
                let mut updater = RouteUpdater::new(table, priority.clone());
                if let Some((client, keep)) = reset.clone() {
                    updater.reset_client(client, &keep);
                }
                for (prefix, client) in &deletes {
                    updater.delete(*prefix, *client);
                }
                for (prefix, client, entry) in &built_adds {
                    let _ = updater.add(*prefix, *client, entry.clone());
                }
                let inverse = updater.inverse();
                let (stats, _touched) = updater.finalize();
                let undo: Box<dyn FnOnce(&mut RouteTable)> =
                    Box::new(move |t| apply_inverse(t, priority, inverse));
                (stats, undo)
            })
        })
    }

    /// Idempotently set (or clear, with `class_id = None`) a hardware-visible
    /// tag on each of `prefixes` within `vrf` (§9 supplement). Does not
    /// trigger resolution; still goes through the same publish/rollback
    /// protocol since the tag is hardware-visible.
    ///
    /// `synchronous = false` submits fire-and-forget (§4.5 op table,
    /// `async?`): the call returns as soon as the task is enqueued, without
    /// waiting for it to run or reporting how it resolved. A rejection or
    /// rollback failure in that mode is only observable via logging and,
    /// for a rollback failure, the coordinator being left poisoned.
    pub fn set_class_id<F>(
        &self,
        vrf: VrfId,
        prefixes: Vec<Prefix>,
        class_id: Option<u32>,
        fib_cb: F,
        synchronous: bool,
    ) -> Result<(), RibError>
    where
        F: FibUpdateFn + Send + 'static,
    {
        self.check_poisoned()?;
        let poisoned = self.poisoned.clone();
        let run = move |write_handle: &mut WriteHandle<RibState, RibOp>| {
            run_transaction(write_handle, &poisoned, vrf, fib_cb, move |table, _priority| {
                let prior: Vec<(Prefix, Option<u32>)> = prefixes
                    .iter()
                    .filter_map(|p| table.exact_match(p).map(|r| (*p, r.class_id)))
                    .collect();
                for prefix in &prefixes {
                    if let Some(route) = table.exact_match_mut(prefix) {
                        route.set_class_id(class_id);
                    }
                }
                let undo: Box<dyn FnOnce(&mut RouteTable)> = Box::new(move |t| {
                    for (prefix, prior_class_id) in prior {
                        if let Some(route) = t.exact_match_mut(&prefix) {
                            route.set_class_id(prior_class_id);
                        }
                    }
                });
                ((), undo)
            })
        };

        if synchronous {
            self.submit(run)
        } else {
            self.submit_fire_and_forget(move |write_handle| {
                if let Err(e) = run(write_handle) {
                    warn!(%vrf, error = %e, "fire-and-forget set_class_id failed");
                }
            });
            Ok(())
        }
    }

    /// Reconcile every configured VRF against `config` (§4.4): interface
    /// and static contributions are each replaced wholesale, and any VRF
    /// with no remaining configured content is dropped (§8 scenario 6).
    ///
    /// Validated in full before anything is submitted to the writer: an
    /// invalid config (§4.5 `InvalidConfig`, e.g. an IPv6 link-local static
    /// next-hop with no pinning interface) is rejected with no state change
    /// at all, rather than partially applied (§7).
    pub fn reconfigure<F>(&self, config: RibConfig, fib_cb: F) -> Result<(), RibError>
    where
        F: FibUpdateFn + Send + 'static,
    {
        self.check_poisoned()?;
        crate::config::validate_config(&config)?;
        let poisoned = self.poisoned.clone();
        self.submit(move |write_handle| {
            let mut fib_cb = fib_cb;
            let before = writer_state(write_handle).vrfs.clone();
            write_handle.append(RibOp::ApplyConfig(Box::new(config)));
            let after = writer_state(write_handle).vrfs.clone();

            let affected: std::collections::BTreeSet<VrfId> =
                before.keys().chain(after.keys()).copied().collect();

            let mut failed: Option<(VrfId, HwUpdateError)> = None;
            for vrf in &affected {
                let empty = RouteTable::new();
                let table = after.get(vrf).unwrap_or(&empty);
                if let Err(e) = crate::fib::invoke(&mut fib_cb, *vrf, table) {
                    failed = Some((*vrf, e));
                    break;
                }
            }

            match failed {
                None => {
                    write_handle.publish();
                    Ok(())
                }
                Some((vrf, e)) => {
                    // discard: the op was appended to the writer's local
                    // copy only, never published, so readers never saw it.
                    // Restore the writer's own copy to its pre-attempt state
                    // by replacing it outright (§4.5 rollback).
                    write_handle.append(RibOp::ReplaceAll(before.clone()));
                    let restored = writer_state(write_handle).vrfs.clone();
                    let mut rollback_failed = false;
                    for v in &affected {
                        let empty = RouteTable::new();
                        let table = restored.get(v).unwrap_or(&empty);
                        if crate::fib::invoke(&mut fib_cb, *v, table).is_err() {
                            rollback_failed = true;
                        }
                    }
                    if rollback_failed {
                        poisoned.store(true, AtomicOrdering::Release);
                        error!(%vrf, "rollback republish failed during reconfigure; RIB poisoned");
                        return Err(RibError::RollbackPublishFailed {
                            vrf,
                            reason: e.0,
                        });
                    }
                    write_handle.publish();
                    warn!(%vrf, reason = %e.0, "reconfigure rejected by FIB programmer, rolled back");
                    Err(RibError::HwUpdateError { vrf, reason: e.0 })
                }
            }
        })
    }

    /// Serialize the entire RIB (§4.6). Pure read, never touches the writer
    /// thread.
    pub fn to_snapshot(&self) -> Result<Vec<u8>, RibError> {
        self.check_poisoned()?;
        let guard = self.read_handle.enter().ok_or(RibError::Poisoned)?;
        Ok(snapshot::to_snapshot(&guard.vrfs))
    }

    /// Replace the entire RIB from previously serialized bytes (§4.6). A
    /// parse failure leaves the current state untouched (§7).
    pub fn from_snapshot(&self, bytes: &[u8]) -> Result<(), RibError> {
        self.check_poisoned()?;
        let priority = {
            let guard = self.read_handle.enter().ok_or(RibError::Poisoned)?;
            guard.priority.clone()
        };
        let vrfs = snapshot::from_snapshot(bytes, &priority)?;
        self.submit(move |write_handle| {
            write_handle.append(RibOp::ReplaceAll(vrfs));
            write_handle.publish();
        });
        info!("RIB state replaced from snapshot");
        Ok(())
    }
}

impl Default for RibCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RibCoordinator {
    fn drop(&mut self) {
        // dropping `tx` closes the channel, ending the writer thread's loop
        drop(self.join.take().map(|j| j.join()));
    }
}

/// Shared shape of the `update`/`set_class_id` transactional protocol
/// (§4.5 steps 3-5): run `mutate` against the writer's own copy, ask
/// `fib_cb` to accept the result, and on rejection replay the inverse delta
/// `mutate` handed back before re-invoking `fib_cb` with the restored state.
fn run_transaction<F, M, R>(
    write_handle: &mut WriteHandle<RibState, RibOp>,
    poisoned: &Arc<AtomicBool>,
    vrf: VrfId,
    mut fib_cb: F,
    mutate: M,
) -> Result<R, RibError>
where
    F: FibUpdateFn,
    M: FnOnce(&mut RouteTable, ClientPriority) -> (R, Box<dyn FnOnce(&mut RouteTable)>),
{
    if !writer_state(write_handle).vrfs.contains_key(&vrf) {
        return Err(RibError::UnknownVrf(vrf));
    }
    let priority = writer_state(write_handle).priority.clone();

    // Mutate a disposable copy first: `Absorb` ops must be pure replays of
    // already-decided content, and the FIB callback's verdict is exactly
    // what decides whether this mutation happened at all.
    let mut table = writer_state(write_handle).vrfs.get(&vrf).cloned().unwrap_or_default();
    let (result, undo) = mutate(&mut table, priority);

    match crate::fib::invoke(&mut fib_cb, vrf, &table) {
        Ok(()) => {
            commit(write_handle, vrf, table);
            Ok(result)
        }
        Err(e) => {
            warn!(%vrf, reason = %e.0, "FIB programmer rejected update, rolling back");
            let mut rolled_back = table;
            undo(&mut rolled_back);
            match crate::fib::invoke(&mut fib_cb, vrf, &rolled_back) {
                Ok(()) => {
                    // state was never committed to the writer's real copy,
                    // so there is nothing further to publish here
                    Err(RibError::HwUpdateError { vrf, reason: e.0 })
                }
                Err(rollback_err) => {
                    poisoned.store(true, AtomicOrdering::Release);
                    error!(%vrf, "rollback republish failed; RIB poisoned");
                    Err(RibError::RollbackPublishFailed {
                        vrf,
                        reason: rollback_err.0,
                    })
                }
            }
        }
    }
}

fn commit(write_handle: &mut WriteHandle<RibState, RibOp>, vrf: VrfId, table: RouteTable) {
    // The winning table was computed on a disposable clone; commit it to
    // the real state as a single wholesale-replace op so both left_right
    // copies converge to the exact bytes the FIB already accepted, rather
    // than replaying the higher-level mutation a second time.
    let mut vrfs = writer_state(write_handle).vrfs.clone();
    vrfs.insert(vrf, table);
    write_handle.append(RibOp::ReplaceAll(vrfs));
    write_handle.publish();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fib::RecordingFib;
    use rib_lpm::Prefix;
    use tracing_test::traced_test;

    #[test]
    fn test_ensure_vrf_is_idempotent() {
        let rib = RibCoordinator::new();
        rib.ensure_vrf(3).unwrap();
        rib.ensure_vrf(3).unwrap();
        assert_eq!(rib.list_vrfs().unwrap(), vec![DEFAULT_VRF, 3]);
    }

    #[test]
    fn test_get_routes_on_unknown_vrf_is_unknown_vrf_error() {
        let rib = RibCoordinator::new();
        let err = rib.get_routes(42).unwrap_err();
        assert!(matches!(err, RibError::UnknownVrf(42)));
    }

    #[traced_test]
    #[test]
    fn test_rollback_on_rejection_leaves_coordinator_usable() {
        let rib = RibCoordinator::new();
        let fib = RecordingFib::failing(1);
        let err = rib
            .update(
                DEFAULT_VRF,
                ClientId::BGP,
                20,
                vec![(Prefix::from(("10.0.0.0", 24)), RouteAdd::Drop)],
                vec![],
                false,
                fib,
            )
            .unwrap_err();
        assert!(matches!(err, RibError::HwUpdateError { .. }));
        assert!(rib
            .get_routes(DEFAULT_VRF)
            .unwrap()
            .exact_match(&Prefix::from(("10.0.0.0", 24)))
            .is_none());

        // a second, identical add with a cooperating callback succeeds: the
        // rejection left the coordinator in a usable, unpoisoned state.
        rib.update(
            DEFAULT_VRF,
            ClientId::BGP,
            20,
            vec![(Prefix::from(("10.0.0.0", 24)), RouteAdd::Drop)],
            vec![],
            false,
            RecordingFib::new(),
        )
        .unwrap();
        assert!(rib
            .get_routes(DEFAULT_VRF)
            .unwrap()
            .exact_match(&Prefix::from(("10.0.0.0", 24)))
            .is_some());
    }

    #[test]
    fn test_double_rollback_failure_poisons_coordinator() {
        let rib = RibCoordinator::new();
        // RecordingFib fails its next 2 calls: the original attempt and the
        // rollback republish both get rejected.
        let fib = RecordingFib::failing(2);
        let err = rib
            .update(
                DEFAULT_VRF,
                ClientId::BGP,
                20,
                vec![(Prefix::from(("10.0.0.0", 24)), RouteAdd::Drop)],
                vec![],
                false,
                fib,
            )
            .unwrap_err();
        assert!(matches!(err, RibError::RollbackPublishFailed { .. }));

        let err = rib.list_vrfs().unwrap_err();
        assert!(matches!(err, RibError::Poisoned));
    }

    #[test]
    fn test_reconfigure_drops_vrf_with_no_remaining_config() {
        let rib = RibCoordinator::new();
        let mut config = RibConfig::default();
        config
            .static_routes_to_null
            .push((5, Prefix::from(("10.0.0.0", 24))));
        rib.reconfigure(config, RecordingFib::new()).unwrap();
        assert!(rib.list_vrfs().unwrap().contains(&5));

        rib.reconfigure(RibConfig::default(), RecordingFib::new())
            .unwrap();
        assert!(!rib.list_vrfs().unwrap().contains(&5));
        // VRF 0 always survives even with nothing configured for it.
        assert!(rib.list_vrfs().unwrap().contains(&DEFAULT_VRF));
    }

    #[test]
    fn test_set_class_id_synchronous_is_visible_on_return() {
        let rib = RibCoordinator::new();
        let prefix = Prefix::from(("10.0.0.0", 24));
        rib.update(
            DEFAULT_VRF,
            ClientId::STATIC,
            1,
            vec![(prefix, RouteAdd::Drop)],
            vec![],
            false,
            RecordingFib::new(),
        )
        .unwrap();

        rib.set_class_id(
            DEFAULT_VRF,
            vec![prefix],
            Some(42),
            RecordingFib::new(),
            true,
        )
        .unwrap();

        let route = rib.get_routes(DEFAULT_VRF).unwrap();
        assert_eq!(route.exact_match(&prefix).unwrap().class_id, Some(42));
    }

    #[test]
    fn test_set_class_id_fire_and_forget_eventually_applies() {
        let rib = RibCoordinator::new();
        let prefix = Prefix::from(("10.0.0.0", 24));
        rib.update(
            DEFAULT_VRF,
            ClientId::STATIC,
            1,
            vec![(prefix, RouteAdd::Drop)],
            vec![],
            false,
            RecordingFib::new(),
        )
        .unwrap();

        // returns immediately with Ok(()), before the task necessarily ran
        rib.set_class_id(
            DEFAULT_VRF,
            vec![prefix],
            Some(7),
            RecordingFib::new(),
            false,
        )
        .unwrap();

        // the writer thread is strictly FIFO, so a synchronous call submitted
        // right after observes the fire-and-forget task's effect once it
        // returns.
        rib.ensure_vrf(DEFAULT_VRF).unwrap();
        let route = rib.get_routes(DEFAULT_VRF).unwrap();
        assert_eq!(route.exact_match(&prefix).unwrap().class_id, Some(7));
    }
}
