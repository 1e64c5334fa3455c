// DragonSim: BGP Network Simulator with DRAGON route aggregation written in Rust
// Copyright (C) 2022-2023 Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Module defining a BGP router with the DRAGON extension.

use crate::{
    aggregate::AggregateTree,
    bgp::{Path, Relationship, SessionType, Update},
    event::{seeded_rng, Event},
    mrai::{mrai_interval, random_wait, MraiMode, MraiTimers},
    network::World,
    route_map::RouteMap,
    types::{secs, AsId, Ipv4Prefix, PrefixMap, RouteClass, RouterId, Time},
};

use itertools::Itertools;
use log::*;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet, HashMap},
};

/// Set of neighbors over which a router forwards traffic towards a prefix. `None` means that the
/// router itself originates the prefix.
pub type FwdNeighbors = BTreeSet<Option<RouterId>>;

/// Entry of the Loc-RIB.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RibEntry {
    /// Route class of the best path.
    pub class: RouteClass,
    /// The selected path.
    pub best: Path,
    /// Sources of all candidate paths with the same route class as the best path.
    pub fwd_neighbors: FwdNeighbors,
}

impl RibEntry {
    fn new(best: &Path, candidates: &[Path]) -> Self {
        let class = best.class();
        Self {
            class,
            best: best.clone(),
            fwd_neighbors: candidates
                .iter()
                .filter(|p| p.class() == class)
                .map(|p| p.source)
                .collect(),
        }
    }
}

/// Direction in which the best path changed during the decision process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trend {
    /// A path is now available, or a better one was selected.
    Better,
    /// The prefix is no longer reachable, or a worse path was selected.
    Worse,
    /// The best path did not change in its preference.
    Same,
}

impl From<Ordering> for Trend {
    fn from(o: Ordering) -> Self {
        // `o` compares the old with the new path. `Greater` means the new path is preferred.
        match o {
            Ordering::Less => Self::Worse,
            Ordering::Equal => Self::Same,
            Ordering::Greater => Self::Better,
        }
    }
}

/// Result of the decision process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Selection {
    /// The advertised best path changed.
    pub change: bool,
    pub trend: Trend,
    /// A customer route replaced a synthetic aggregate.
    pub replaced_aggregate: bool,
}

/// A BGP session as seen from one side.
#[derive(Debug, Clone)]
pub struct Peer {
    pub(crate) id: RouterId,
    pub(crate) name: String,
    pub(crate) remote_as: AsId,
    pub(crate) session: SessionType,
    pub(crate) relationship: Option<Relationship>,
    pub(crate) rr_client: bool,
    /// Sorted by their order.
    pub(crate) maps_in: Vec<RouteMap>,
    /// Sorted by their order.
    pub(crate) maps_out: Vec<RouteMap>,
    pub(crate) mrai_base: f64,
    pub(crate) rng: StdRng,
    pub(crate) remote_is_stub: bool,
    pub(crate) rib_in: HashMap<Ipv4Prefix, Vec<Path>>,
    pub(crate) rib_out: HashMap<Ipv4Prefix, Vec<Path>>,
    pub(crate) out_queue: Vec<Ipv4Prefix>,
}

impl Peer {
    /// Create a new session towards `id`. The random number generator of the MRAI timer is seeded
    /// with the name of the peer and the randomization key.
    pub(crate) fn new(
        id: RouterId,
        name: impl Into<String>,
        remote_as: AsId,
        session: SessionType,
        key: &str,
    ) -> Self {
        let name = name.into();
        Self {
            id,
            rng: seeded_rng(&name, key),
            name,
            remote_as,
            session,
            relationship: None,
            rr_client: false,
            maps_in: Vec::new(),
            maps_out: Vec::new(),
            mrai_base: 0.0,
            remote_is_stub: false,
            rib_in: HashMap::new(),
            rib_out: HashMap::new(),
            out_queue: Vec::new(),
        }
    }

    /// Set the route maps of the session. Both lists are sorted by the order of the route maps.
    /// Maps with the same order keep their configured sequence.
    pub(crate) fn set_route_maps(&mut self, mut maps_in: Vec<RouteMap>, mut maps_out: Vec<RouteMap>) {
        maps_in.sort_by_key(|m| m.order);
        maps_out.sort_by_key(|m| m.order);
        self.maps_in = maps_in;
        self.maps_out = maps_out;
    }

    /// Put the prefix at the end of the send queue, removing an earlier entry for it.
    pub(crate) fn enqueue(&mut self, prefix: Ipv4Prefix) {
        self.dequeue(&prefix);
        self.out_queue.push(prefix);
    }

    /// Remove the prefix from the send queue. Returns `true` if it was enqueued.
    pub(crate) fn dequeue(&mut self, prefix: &Ipv4Prefix) -> bool {
        let len = self.out_queue.len();
        self.out_queue.retain(|p| p != prefix);
        self.out_queue.len() != len
    }

    /// Clear all state of the session.
    pub(crate) fn clear(&mut self) {
        self.rib_in.clear();
        self.rib_out.clear();
        self.out_queue.clear();
    }

    /// Router id of the remote router.
    pub fn id(&self) -> RouterId {
        self.id
    }

    /// Name of the remote router.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// AS number of the remote router.
    pub fn remote_as(&self) -> AsId {
        self.remote_as
    }

    /// Type of the session.
    pub fn session(&self) -> SessionType {
        self.session
    }

    /// Business relationship of the remote router (from the perspective of the local router).
    pub fn relationship(&self) -> Option<Relationship> {
        self.relationship
    }

    /// Returns `true` if the remote router is a route-reflector client.
    pub fn is_rr_client(&self) -> bool {
        self.rr_client
    }

    /// Base value of the MRAI timer in seconds.
    pub fn mrai_base(&self) -> f64 {
        self.mrai_base
    }

    /// Paths received from the peer for the prefix.
    pub fn rib_in(&self, prefix: &Ipv4Prefix) -> &[Path] {
        self.rib_in.get(prefix).map(Vec::as_slice).unwrap_or_default()
    }

    /// Paths last advertised to the peer for the prefix.
    pub fn rib_out(&self, prefix: &Ipv4Prefix) -> &[Path] {
        self.rib_out.get(prefix).map(Vec::as_slice).unwrap_or_default()
    }

    /// Prefixes waiting to be sent to the peer.
    pub fn out_queue(&self) -> &[Ipv4Prefix] {
        &self.out_queue
    }
}

/// Bgp Router
#[derive(Debug, Clone)]
pub struct Router {
    pub(crate) name: String,
    pub(crate) router_id: RouterId,
    pub(crate) as_id: AsId,
    pub(crate) route_reflector: bool,
    /// The router has no customers.
    pub(crate) is_stub: bool,
    pub(crate) peers: BTreeMap<RouterId, Peer>,
    pub(crate) loc_rib: PrefixMap<RibEntry>,
    /// Locally originated prefixes
    pub(crate) origin: BTreeMap<Ipv4Prefix, Path>,
    /// Prefixes that are selected but not advertised.
    pub(crate) filtered: BTreeSet<Ipv4Prefix>,
    /// Synthetic aggregates that are currently originated.
    pub(crate) aggregated: BTreeSet<Ipv4Prefix>,
    /// Announcements for each own allocated prefix.
    pub(crate) announced: BTreeMap<Ipv4Prefix, BTreeSet<Ipv4Prefix>>,
    pub(crate) aggregate_tree: AggregateTree,
    pub(crate) mrai: MraiTimers,
    pub(crate) next_idle: Time,
    pub(crate) rng: StdRng,
    pub(crate) num_updates: BTreeMap<RouterId, usize>,
}

impl Router {
    pub(crate) fn new(
        name: impl Into<String>,
        router_id: RouterId,
        as_id: AsId,
        mrai_mode: MraiMode,
        key: &str,
    ) -> Self {
        let name = name.into();
        Self {
            rng: seeded_rng(&name, key),
            name,
            router_id,
            as_id,
            route_reflector: false,
            is_stub: false,
            peers: BTreeMap::new(),
            loc_rib: PrefixMap::new(),
            origin: BTreeMap::new(),
            filtered: BTreeSet::new(),
            aggregated: BTreeSet::new(),
            announced: BTreeMap::new(),
            aggregate_tree: AggregateTree::new(),
            mrai: MraiTimers::new(mrai_mode),
            next_idle: Time::default(),
            num_updates: BTreeMap::new(),
        }
    }

    /// Return the name of the router
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the ID of the router
    pub fn router_id(&self) -> RouterId {
        self.router_id
    }

    /// Return the AS ID of the router
    pub fn as_id(&self) -> AsId {
        self.as_id
    }

    /// Returns `true` if the router is a route reflector.
    pub fn is_route_reflector(&self) -> bool {
        self.route_reflector
    }

    /// Returns `true` if the router has no customer.
    pub fn has_no_customers(&self) -> bool {
        self.is_stub
    }

    /// Get the Loc-RIB entry of the prefix.
    pub fn rib(&self, prefix: &Ipv4Prefix) -> Option<&RibEntry> {
        self.loc_rib.get(prefix)
    }

    /// Iterate over all entries of the Loc-RIB.
    pub fn rib_entries(&self) -> impl Iterator<Item = (&Ipv4Prefix, &RibEntry)> {
        self.loc_rib.iter()
    }

    /// Number of entries in the Loc-RIB.
    pub fn rib_len(&self) -> usize {
        self.loc_rib.iter().count()
    }

    /// Prefixes that are selected but not advertised to any peer.
    pub fn filtered(&self) -> &BTreeSet<Ipv4Prefix> {
        &self.filtered
    }

    /// Returns `true` if the prefix is filtered.
    pub fn is_filtered(&self, prefix: &Ipv4Prefix) -> bool {
        self.filtered.contains(prefix)
    }

    /// Synthetic aggregates currently originated by the router.
    pub fn aggregated(&self) -> &BTreeSet<Ipv4Prefix> {
        &self.aggregated
    }

    /// Prefixes currently originated by the router.
    pub fn originated(&self) -> impl Iterator<Item = &Ipv4Prefix> {
        self.origin.keys()
    }

    /// Get the session towards `peer`.
    pub fn peer(&self, peer: RouterId) -> Option<&Peer> {
        self.peers.get(&peer)
    }

    /// Iterate over all sessions.
    pub fn peers(&self) -> impl Iterator<Item = &Peer> {
        self.peers.values()
    }

    /// Number of updates sent to each peer.
    pub fn num_updates(&self) -> &BTreeMap<RouterId, usize> {
        &self.num_updates
    }

    /// The aggregation trie of the router.
    pub fn aggregate_tree(&self) -> &AggregateTree {
        &self.aggregate_tree
    }

    pub(crate) fn reset_counters(&mut self) {
        self.num_updates.values_mut().for_each(|c| *c = 0);
    }

    /// Returns `true` if the router is a stub and stub optimizations are enabled.
    pub(crate) fn is_stub(&self, w: &World) -> bool {
        w.params.dragon.stub_optimizations && self.is_stub
    }

    /// Closest prefix in the Loc-RIB that strictly covers `prefix`.
    pub(crate) fn rib_parent(&self, prefix: Ipv4Prefix) -> Option<Ipv4Prefix> {
        prefix
            .supernet()
            .and_then(|s| self.loc_rib.get_lpm(&s))
            .map(|(p, _)| *p)
    }

    /// Prefixes in the Loc-RIB whose closest covering prefix is `prefix`.
    pub(crate) fn rib_children(&self, prefix: Ipv4Prefix) -> Vec<Ipv4Prefix> {
        self.loc_rib
            .children(&prefix)
            .map(|(p, _)| *p)
            .filter(|p| *p != prefix && self.rib_parent(*p) == Some(prefix))
            .collect()
    }

    /// Compute the next time at which the router is idle, and reserve the processing time for
    /// one event.
    pub(crate) fn idle_time(&mut self, w: &World) -> Time {
        let delay = w.params.default_process_delay.sample(&mut self.rng);
        self.next_idle = self.next_idle.max(w.time) + secs(delay);
        self.next_idle
    }

    /// Handle an update from `from`. The paths are filtered and transformed by the import policy,
    /// and replace the adjacency-in entry. The decision process is scheduled once the router is
    /// idle.
    pub(crate) fn receive(&mut self, from: RouterId, update: Update, w: &mut World) {
        if !w.link_is_up(from, self.router_id) {
            debug!(
                "{} drops update for {} from {}: link is down",
                self.name,
                update.prefix,
                w.router_name(from)
            );
            return;
        }
        if !self.peers.contains_key(&from) {
            warn!(
                "{} drops update for {}: no session with {}",
                self.name,
                update.prefix,
                w.router_name(from)
            );
            return;
        }
        let prefix = update.prefix;
        log!(
            w.receive_level(),
            "{} receives {} from {} ({} paths)",
            self.name,
            prefix,
            w.router_name(from),
            update.paths.len()
        );
        let paths: Vec<Path> = update
            .paths
            .into_iter()
            .filter(|p| self.import_filter(from, &prefix, p))
            .map(|p| self.import_action(from, &prefix, p, w))
            .collect();
        if let Some(peer) = self.peers.get_mut(&from) {
            if paths.is_empty() {
                peer.rib_in.remove(&prefix);
            } else {
                peer.rib_in.insert(prefix, paths);
            }
        }
        let t = self.idle_time(w);
        w.schedule(
            t,
            Event::DecisionProcess {
                router: self.router_id,
                prefix,
            },
        );
    }

    /// Candidate paths of the decision process, sorted from the most preferred to the least.
    fn candidates(&self, prefix: Ipv4Prefix, w: &World) -> Vec<Path> {
        let mut paths = Vec::new();
        if let Some(origin) = self.origin.get(&prefix) {
            if !(w.params.dragon.enabled && self.aggregated.contains(&prefix)) {
                return vec![origin.clone()];
            }
            paths.push(origin.clone());
        }
        paths.extend(
            self.peers
                .values()
                .filter_map(|peer| peer.rib_in.get(&prefix))
                .flatten()
                .cloned(),
        );
        let acm = w.params.always_compare_med;
        paths.sort_by(|a, b| a.selection_order(b, acm));
        paths
    }

    /// Run the BGP decision process for the prefix and update the Loc-RIB.
    pub(crate) fn select_best_path(&mut self, prefix: Ipv4Prefix, w: &World) -> Selection {
        let candidates = self.candidates(prefix, w);
        let acm = w.params.always_compare_med;
        let mut selection = Selection {
            change: false,
            trend: Trend::Same,
            replaced_aggregate: false,
        };

        let old = self.loc_rib.get(&prefix).map(|e| e.best.clone());
        match (old, candidates.first()) {
            (None, None) => {}
            (None, Some(best)) => {
                self.loc_rib.insert(prefix, RibEntry::new(best, &candidates));
                selection.change = true;
                selection.trend = Trend::Better;
            }
            (Some(_), None) => {
                self.loc_rib.remove(&prefix);
                selection.change = true;
                selection.trend = Trend::Worse;
            }
            (Some(_), Some(best))
                if w.params.dragon.enabled && self.aggregated.contains(&prefix) =>
            {
                match candidates.get(1) {
                    Some(second) if second.class() == RouteClass::Customer => {
                        log!(
                            w.dragon_level(),
                            "{} DRAGON. Learned a customer route for the aggregate {}",
                            self.name,
                            prefix
                        );
                        self.loc_rib
                            .insert(prefix, RibEntry::new(second, &candidates));
                        self.aggregated.remove(&prefix);
                        self.origin.remove(&prefix);
                        selection.replaced_aggregate = true;
                    }
                    _ => {
                        self.loc_rib.insert(prefix, RibEntry::new(best, &candidates));
                    }
                }
                selection.change = true;
                selection.trend = Trend::Better;
            }
            (Some(old), Some(best)) => {
                selection.trend = old.selection_order(best, acm).into();
                selection.change = !old.advertisement_equivalence(best, acm);
                self.loc_rib.insert(prefix, RibEntry::new(best, &candidates));
            }
        }
        selection
    }

    /// Run the decision process for the prefix, update the DRAGON state, and propagate the
    /// outcome to all peers.
    pub(crate) fn update(&mut self, prefix: Ipv4Prefix, w: &mut World) {
        let old = self.loc_rib.get(&prefix).cloned();
        let old_children = if old.is_some() {
            self.rib_children(prefix)
        } else {
            Vec::new()
        };

        let selection = self.select_best_path(prefix, w);
        let new = self.loc_rib.get(&prefix).cloned();

        let originated = self.origin.contains_key(&prefix);
        let dragon = w.params.dragon.enabled && !originated;
        let covered_by_own = w.registry.is_covered_by_own(self.router_id, &prefix);
        let track_aggregates = !self.is_stub(w) && !covered_by_own;

        if w.params.dragon.enabled {
            log!(
                w.dragon_level(),
                "{} decision process for {}: change: {}, trend: {:?}, old: {:?}, new: {:?}",
                self.name,
                prefix,
                selection.change,
                selection.trend,
                old.as_ref().map(|e| (e.class, &e.fwd_neighbors)),
                new.as_ref().map(|e| (e.class, &e.fwd_neighbors)),
            );
            match (&old, &new) {
                (old, Some(new))
                    if old.as_ref().map_or(true, |o| {
                        o.class != new.class || o.fwd_neighbors != new.fwd_neighbors
                    }) =>
                {
                    if dragon {
                        if track_aggregates {
                            self.aggregate_tree.insert(prefix, new.class);
                        }
                        if self.should_filter(prefix, w) {
                            self.start_filtering(prefix, w);
                        } else {
                            self.stop_filtering(prefix, w);
                        }
                    } else {
                        self.stop_filtering(prefix, w);
                    }
                    // the decision of every descendant depends on its closest covering prefix
                    let children = self.rib_children(prefix);
                    self.reevaluate_descendants(children, w);
                }
                (Some(_), None) => {
                    if dragon && track_aggregates {
                        self.aggregate_tree.insert(prefix, RouteClass::Unreachable);
                    }
                    self.stop_filtering(prefix, w);
                    self.reevaluate_descendants(old_children, w);
                }
                _ => log!(
                    w.dragon_level(),
                    "{} DRAGON. Nothing to do for {}",
                    self.name,
                    prefix
                ),
            }
        }

        if w.params.debug.update_ribs {
            info!("{}", self.fmt_rib(prefix, w));
        }

        if !selection.change {
            return;
        }

        if self.filtered.contains(&prefix) {
            log!(
                w.dragon_level(),
                "{} DRAGON. Not propagating {} as it is filtered",
                self.name,
                prefix
            );
        } else {
            for pid in self.peers.keys().copied().collect_vec() {
                self.presend(pid, prefix, w);
            }
        }

        if dragon {
            self.update_local(prefix, w);
            if track_aggregates && !selection.replaced_aggregate {
                self.compute_local_aggregates(w);
            }
        }
    }

    /// Enqueue the prefix for `pid`, and send it right away if the MRAI timer allows it.
    pub(crate) fn presend(&mut self, pid: RouterId, prefix: Ipv4Prefix, w: &mut World) {
        if !w.link_is_up(self.router_id, pid) {
            return;
        }
        let Some(peer) = self.peers.get_mut(&pid) else {
            return;
        };
        peer.enqueue(prefix);

        let key = self.mrai.key(pid, prefix);
        let mut expiry = self.mrai.expiry(key, w.time);
        if expiry.is_none() && w.params.always_mrai {
            let wait = random_wait(peer.mrai_base, &mut peer.rng);
            if let Some(t) = self.mrai.arm(key, wait, w.time) {
                w.schedule(
                    t,
                    Event::MraiExpire {
                        router: self.router_id,
                        peer: pid,
                        prefix: key.1,
                    },
                );
                expiry = Some(t);
            }
        }

        match expiry {
            None => {
                trace!("{} sends {} to {} immediately", self.name, prefix, peer.name);
                self.send_to(pid, Some(prefix), w);
            }
            Some(t) => trace!(
                "{} waits until {} to send {} to {}",
                self.name,
                t,
                prefix,
                peer.name
            ),
        }
    }

    /// Send the queued prefixes to `pid`. Without a prefix, the whole queue is flushed. If
    /// anything was sent, the MRAI timer is started.
    pub(crate) fn send_to(&mut self, pid: RouterId, prefix: Option<Ipv4Prefix>, w: &mut World) {
        let Some(peer) = self.peers.get_mut(&pid) else {
            return;
        };
        let todo = match prefix {
            None => std::mem::take(&mut peer.out_queue),
            Some(p) if peer.dequeue(&p) => vec![p],
            Some(_) => Vec::new(),
        };

        let mut sent = false;
        let mut only_withdrawals = true;
        for p in todo {
            sent |= self.send_to_peer(pid, p, w);
            only_withdrawals &= self.is_withdrawal(pid, p, w);
        }

        if !sent || (only_withdrawals && !w.params.withdrawal_rate_limiting) {
            return;
        }

        let key = match self.mrai.mode() {
            MraiMode::PerPeer => (pid, None),
            MraiMode::PerPrefix => (pid, prefix),
        };
        let Some(peer) = self.peers.get_mut(&pid) else {
            return;
        };
        let interval = mrai_interval(peer.mrai_base, w.params.mrai_jitter, &mut peer.rng);
        if let Some(t) = self.mrai.arm(key, interval, w.time) {
            trace!("{} starts the MRAI timer towards {} until {}", self.name, peer.name, t);
            w.schedule(
                t,
                Event::MraiExpire {
                    router: self.router_id,
                    peer: pid,
                    prefix: key.1,
                },
            );
        }
    }

    /// Handle the expiry of an MRAI timer. Stale expiry events are ignored.
    pub(crate) fn mrai_expire(
        &mut self,
        pid: RouterId,
        prefix: Option<Ipv4Prefix>,
        w: &mut World,
    ) {
        if self.mrai.expire((pid, prefix), w.time) {
            self.send_to(pid, prefix, w);
        } else {
            trace!("{} ignores a stale MRAI expiry", self.name);
        }
    }

    /// Returns `true` if the router would send a withdrawal for the prefix to `pid`.
    pub(crate) fn is_withdrawal(&self, pid: RouterId, prefix: Ipv4Prefix, w: &World) -> bool {
        match self.loc_rib.get(&prefix) {
            Some(e) => !self.export_filter(pid, &prefix, &e.best, w),
            None => true,
        }
    }

    /// Build the update for `pid` from the Loc-RIB and deliver it. Returns `true` if it was sent.
    pub(crate) fn send_to_peer(&mut self, pid: RouterId, prefix: Ipv4Prefix, w: &mut World) -> bool {
        let paths = match self.loc_rib.get(&prefix) {
            Some(e) if self.export_filter(pid, &prefix, &e.best, w) => {
                vec![self.export_action(pid, &prefix, e.best.clone())]
            }
            _ => Vec::new(),
        };
        self.deliver(pid, Update { prefix, paths }, w)
    }

    /// Send the update to `pid` if it differs from what was sent before. Returns `true` if it was
    /// sent.
    pub(crate) fn deliver(&mut self, pid: RouterId, update: Update, w: &mut World) -> bool {
        let Some(peer) = self.peers.get_mut(&pid) else {
            return false;
        };
        let acm = w.params.always_compare_med;
        let prefix = update.prefix;
        let change = match (
            peer.rib_out.get(&prefix).and_then(|x| x.first()),
            update.paths.first(),
        ) {
            (Some(old), Some(new)) => !new.advertisement_equivalence(old, acm),
            (Some(_), None) | (None, Some(_)) => true,
            (None, None) => false,
        };
        if !change {
            return false;
        }

        if update.is_withdrawal() {
            peer.rib_out.remove(&prefix);
        } else {
            peer.rib_out.insert(prefix, update.paths.clone());
        }
        *self.num_updates.entry(pid).or_default() += 1;

        log!(
            w.send_level(),
            "{} sends {} to {}{}",
            self.name,
            prefix,
            peer.name,
            if update.is_withdrawal() { " (W)" } else { "" }
        );

        if w.params.dragon.stub_optimizations && peer.remote_is_stub {
            debug!("{} does not deliver {} to the stub {}", self.name, prefix, peer.name);
        } else {
            w.send(self.router_id, pid, update);
        }
        true
    }

    /// Clear the session with `pid`, and rerun the decision process for all prefixes learned
    /// from it.
    pub(crate) fn peer_down(&mut self, pid: RouterId, w: &mut World) {
        let Some(peer) = self.peers.get_mut(&pid) else {
            return;
        };
        debug!("{} lost the session with {}", self.name, peer.name);
        let prefixes = peer.rib_in.keys().copied().sorted().collect_vec();
        peer.clear();
        for prefix in prefixes {
            self.update(prefix, w);
        }
    }

    /// Send the whole Loc-RIB (except filtered prefixes) to `pid`.
    pub(crate) fn peer_up(&mut self, pid: RouterId, w: &mut World) {
        let dragon = w.params.dragon.enabled;
        let prefixes = self
            .loc_rib
            .keys()
            .filter(|p| !dragon || !self.filtered.contains(p))
            .copied()
            .collect_vec();
        let Some(peer) = self.peers.get_mut(&pid) else {
            return;
        };
        debug!("{} established the session with {}", self.name, peer.name);
        match self.mrai.mode() {
            MraiMode::PerPeer => {
                prefixes.iter().for_each(|p| peer.enqueue(*p));
                if self.mrai.expiry((pid, None), w.time).is_none() {
                    self.send_to(pid, None, w);
                }
            }
            MraiMode::PerPrefix => {
                for p in prefixes {
                    if let Some(peer) = self.peers.get_mut(&pid) {
                        peer.enqueue(p);
                    }
                    if self.mrai.expiry((pid, Some(p)), w.time).is_none() {
                        self.send_to(pid, Some(p), w);
                    }
                }
            }
        }
    }

    /// Originate the prefix and rerun the decision process.
    pub(crate) fn announce_prefix(&mut self, prefix: Ipv4Prefix, w: &mut World) {
        log!(w.announce_level(), "{} announces {}", self.name, prefix);
        self.origin.insert(
            prefix,
            Path::originated(
                self.router_id,
                w.params.default_weight,
                w.params.default_local_pref,
            ),
        );
        self.update(prefix, w);
    }

    /// Stop originating the prefix and rerun the decision process.
    pub(crate) fn withdraw_prefix(&mut self, prefix: Ipv4Prefix, w: &mut World) {
        if self.origin.remove(&prefix).is_some() {
            log!(w.announce_level(), "{} withdraws {}", self.name, prefix);
            self.update(prefix, w);
        }
    }
}
