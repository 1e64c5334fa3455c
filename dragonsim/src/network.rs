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

//! # Top-level Network module
//!
//! This module represents the network topology, applies the configuration, and simulates the
//! network. The [`Network`] owns all routers and the [`World`], which contains everything a
//! router may touch while handling an event: the clock, the event queue, the links, the
//! parameters, and the prefix registry.
//!
//! ```rust
//! use dragonsim::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config: SimConfig = "
//!         router bgp 1
//!          bgp router-id 1.1
//!          neighbor 2.1 remote-as 2 cust
//!         router bgp 2
//!          bgp router-id 2.1
//!          neighbor 1.1 remote-as 1 prov
//!         event announce-prefix 2.1 10.0.0.0/8 1
//!     "
//!     .parse()?;
//!
//!     let mut net = Network::from_config(&config)?;
//!     net.run();
//!
//!     let prefix: Ipv4Prefix = "10.0.0.0/8".parse()?;
//!     let r1 = net.router_by_name("1.1").unwrap();
//!     assert!(r1.rib(&prefix).is_some());
//!     Ok(())
//! }
//! ```

use crate::{
    bgp::{Relationship, SessionType, Update},
    config::{EventConfig, EventKind, SimConfig, SimParams},
    dragon::PrefixRegistry,
    event::{seeded_rng, Delay, Event, EventQueue},
    formatter::{NetworkFormatter, RibSnapshot},
    route_map::RouteMap,
    router::{Peer, Router},
    types::{secs, ConfigError, IndexType, NetworkError, RouterId, Time},
};

use log::*;
use petgraph::stable_graph::StableGraph;
use petgraph::Undirected;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use serde_with::{As, Same};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Graph of all links. Nodes are routers, indexed by their [`RouterId`].
pub type LinkGraph = StableGraph<(), Link, Undirected, IndexType>;

/// A link between two routers. A message of `size` bytes takes a sampled propagation delay plus
/// `8 * size / bandwidth` seconds of transmission delay, as the bandwidth is in bit per second.
#[derive(Debug, Clone)]
pub struct Link {
    pub(crate) cost: u32,
    pub(crate) bandwidth: f64,
    pub(crate) delay: Option<Delay>,
    pub(crate) up: bool,
    /// Time at which the last message in each direction is delivered. Index 0 is the direction
    /// from the first endpoint of the edge to the second.
    next_delivery: [Time; 2],
    rng: StdRng,
}

impl Link {
    fn new(name: &str, params: &SimParams) -> Self {
        Self {
            cost: 0,
            bandwidth: params.default_bandwidth,
            delay: None,
            up: true,
            next_delivery: [Time::default(); 2],
            rng: seeded_rng(name, &params.randomize_key),
        }
    }

    /// IGP cost of the link
    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Bandwidth of the link in bit per second
    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// Delay distribution of the link, if it differs from the default one.
    pub fn delay(&self) -> Option<Delay> {
        self.delay
    }

    /// Returns `true` if the link is up.
    pub fn is_up(&self) -> bool {
        self.up
    }
}

/// Shared state of the simulation that routers can access while processing events.
#[derive(Debug)]
pub struct World {
    pub(crate) time: Time,
    pub(crate) queue: EventQueue,
    pub(crate) links: LinkGraph,
    pub(crate) names: Vec<String>,
    pub(crate) params: SimParams,
    pub(crate) registry: PrefixRegistry,
}

impl World {
    /// Current simulation time
    pub fn time(&self) -> Time {
        self.time
    }

    /// Simulation parameters
    pub fn params(&self) -> &SimParams {
        &self.params
    }

    /// Registry of all allocated prefixes
    pub fn registry(&self) -> &PrefixRegistry {
        &self.registry
    }

    /// The event queue
    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    /// Get the name of a router, or `"?"` if the router does not exist.
    pub fn router_name(&self, router: RouterId) -> &str {
        self.names
            .get(router.index())
            .map(String::as_str)
            .unwrap_or("?")
    }

    /// Get the link between two routers.
    pub fn link(&self, a: RouterId, b: RouterId) -> Option<&Link> {
        self.links
            .find_edge(a, b)
            .and_then(|e| self.links.edge_weight(e))
    }

    pub(crate) fn schedule(&mut self, time: Time, event: Event) {
        self.queue.schedule(time, event)
    }

    pub(crate) fn link_is_up(&self, a: RouterId, b: RouterId) -> bool {
        self.link(a, b).map(|l| l.up).unwrap_or(false)
    }

    pub(crate) fn link_cost(&self, a: RouterId, b: RouterId) -> u32 {
        self.link(a, b).map(|l| l.cost).unwrap_or_default()
    }

    /// Compute the time at which a message of `size` bytes sent now from `from` arrives at `to`.
    /// Messages in the same direction are never reordered.
    pub(crate) fn next_delivery_time(
        &mut self,
        from: RouterId,
        to: RouterId,
        size: usize,
    ) -> Option<Time> {
        let edge = self.links.find_edge(from, to)?;
        let (first, _) = self.links.edge_endpoints(edge)?;
        let dir = usize::from(first != from);
        let default_delay = self.params.default_link_delay;
        let now = self.time;
        let link = self.links.edge_weight_mut(edge)?;
        let delay = link.delay.unwrap_or(default_delay).sample(&mut link.rng)
            + (8 * size) as f64 / link.bandwidth;
        let next = link.next_delivery[dir].max(now) + secs(delay);
        link.next_delivery[dir] = next;
        Some(next)
    }

    /// Send an update over the link. It is received after the link delay.
    pub(crate) fn send(&mut self, from: RouterId, to: RouterId, update: Update) {
        match self.next_delivery_time(from, to, update.size()) {
            Some(t) => self.schedule(t, Event::Receive { from, to, update }),
            None => warn!(
                "Cannot send {} from {} to {}: no link",
                update.prefix,
                self.router_name(from),
                self.router_name(to)
            ),
        }
    }

    fn level(enabled: bool) -> Level {
        if enabled {
            Level::Info
        } else {
            Level::Debug
        }
    }

    pub(crate) fn dragon_level(&self) -> Level {
        Self::level(self.params.debug.dragon)
    }

    pub(crate) fn send_level(&self) -> Level {
        Self::level(self.params.debug.send_events)
    }

    pub(crate) fn receive_level(&self) -> Level {
        Self::level(self.params.debug.receive_events)
    }

    pub(crate) fn link_level(&self) -> Level {
        Self::level(self.params.debug.link_events)
    }

    pub(crate) fn announce_level(&self) -> Level {
        Self::level(self.params.debug.announce_events)
    }
}

/// Convergence time measured between a `StartTrackTime` and a `StopTrackTime` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceRecord {
    /// Label of the measurement
    pub label: String,
    /// Time of the `StartTrackTime` event
    pub start: f64,
    /// Time between the start and the last protocol event before the `StopTrackTime` event.
    pub duration: f64,
}

/// Snapshot of the update counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSnapshot {
    /// Time of the snapshot
    pub time: Time,
    /// Number of updates sent from each router (first) to each peer (second).
    #[serde(with = "As::<Vec<(Same, Same)>>")]
    pub counters: BTreeMap<(String, String), usize>,
}

/// Summary of a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimReport {
    /// Time of the last processed event
    pub time: Time,
    /// Number of processed events
    pub events: usize,
    /// Final RIB of every router
    pub ribs: Vec<RibSnapshot>,
    /// Number of updates sent from each router (first) to each peer (second).
    #[serde(with = "As::<Vec<(Same, Same)>>")]
    pub updates: BTreeMap<(String, String), usize>,
    /// Convergence time measurements
    pub convergence: Vec<ConvergenceRecord>,
    /// Snapshots of the update counters
    pub snapshots: Vec<UpdateSnapshot>,
}

/// # Network struct
/// The struct contains all routers and the [`World`], and handles all events between them.
#[derive(Debug)]
pub struct Network {
    routers: BTreeMap<RouterId, Router>,
    ids: HashMap<String, RouterId>,
    world: World,
    stop_after: Option<usize>,
    processed: usize,
    track_start: Option<Time>,
    last_event: Time,
    convergence: Vec<ConvergenceRecord>,
    snapshots: Vec<UpdateSnapshot>,
}

impl Network {
    /// Build the network from its configuration, and schedule all configured events. Routers
    /// get their ids in the lexicographic order of their names.
    pub fn from_config(config: &SimConfig) -> Result<Self, NetworkError> {
        let params = &config.params;
        params
            .default_link_delay
            .validate()
            .and(params.default_process_delay.validate())?;

        let mut names = config.routers.iter().map(|r| r.name.clone()).collect::<Vec<_>>();
        names.sort();
        if let Some(w) = names.windows(2).find(|w| w[0] == w[1]) {
            return Err(NetworkError::DuplicateRouter(w[0].clone()));
        }

        let mut links = LinkGraph::default();
        let ids: HashMap<String, RouterId> = names
            .iter()
            .map(|n| (n.clone(), links.add_node(())))
            .collect();
        let lookup = |name: &str| {
            ids.get(name)
                .copied()
                .ok_or_else(|| NetworkError::DeviceNameNotFound(name.to_string()))
        };
        let route_maps = |list: &[String]| -> Result<Vec<RouteMap>, ConfigError> {
            list.iter()
                .map(|name| {
                    config
                        .route_maps
                        .get(name)
                        .cloned()
                        .ok_or_else(|| ConfigError::UnknownRouteMap(name.clone()))
                })
                .collect()
        };

        let mut routers = BTreeMap::new();
        for rc in config.routers.iter() {
            let id = lookup(&rc.name)?;
            let mut router =
                Router::new(&rc.name, id, rc.asn, rc.mrai_mode, &params.randomize_key);
            router.route_reflector = rc.route_reflector;
            for nc in rc.neighbors.iter() {
                let pid = lookup(&nc.name)?;
                if pid == id {
                    return Err(NetworkError::SelfSession(rc.name.clone()));
                }
                let remote = config
                    .router(&nc.name)
                    .ok_or_else(|| NetworkError::DeviceNameNotFound(nc.name.clone()))?;
                let remote_as = nc.remote_as.unwrap_or(remote.asn);
                if remote_as != remote.asn {
                    warn!(
                        "{} expects {} in {}, but it is in {}",
                        rc.name, nc.name, remote_as, remote.asn
                    );
                }
                if !remote.neighbors.iter().any(|n| n.name == rc.name) {
                    warn!(
                        "Session {} -> {} is not configured on {}",
                        rc.name, nc.name, nc.name
                    );
                }
                let session = if remote_as == rc.asn {
                    SessionType::IBgp
                } else {
                    SessionType::EBgp
                };
                let mut peer = Peer::new(pid, &nc.name, remote_as, session, &params.randomize_key);
                peer.relationship = nc.relationship;
                peer.rr_client = nc.rr_client;
                peer.mrai_base = nc.mrai;
                peer.set_route_maps(route_maps(&nc.maps_in)?, route_maps(&nc.maps_out)?);
                router.peers.insert(pid, peer);

                if links.find_edge(id, pid).is_none() {
                    let (a, b) = if rc.name < nc.name {
                        (&rc.name, &nc.name)
                    } else {
                        (&nc.name, &rc.name)
                    };
                    links.add_edge(id, pid, Link::new(&format!("{a}-{b}"), params));
                }
            }
            router.is_stub = !router
                .peers
                .values()
                .any(|p| p.relationship == Some(Relationship::Customer));
            routers.insert(id, router);
        }

        let stubs: HashSet<RouterId> = routers
            .values()
            .filter(|r| r.is_stub)
            .map(|r| r.router_id)
            .collect();
        for peer in routers.values_mut().flat_map(|r| r.peers.values_mut()) {
            peer.remote_is_stub = stubs.contains(&peer.id);
        }

        for lc in config.links.iter() {
            let (a, b) = (lookup(&lc.a)?, lookup(&lc.b)?);
            if a == b {
                return Err(NetworkError::SelfSession(lc.a.clone()));
            }
            let edge = match links.find_edge(a, b) {
                Some(e) => e,
                None => {
                    let (x, y) = if lc.a < lc.b { (&lc.a, &lc.b) } else { (&lc.b, &lc.a) };
                    links.add_edge(a, b, Link::new(&format!("{x}-{y}"), params))
                }
            };
            let link = links
                .edge_weight_mut(edge)
                .ok_or(NetworkError::LinkNotFound(a, b))?;
            if let Some(cost) = lc.cost {
                link.cost = cost;
            }
            if let Some(bw) = lc.bandwidth {
                if !(bw.is_finite() && bw > 0.0) {
                    return Err(ConfigError::InvalidNumber(bw.to_string()).into());
                }
                link.bandwidth = bw;
            }
            if let Some(delay) = lc.delay {
                delay.validate()?;
                link.delay = Some(delay);
            }
        }

        let mut net = Self {
            routers,
            ids,
            world: World {
                time: Time::default(),
                queue: EventQueue::new(),
                links,
                names,
                params: params.clone(),
                registry: PrefixRegistry::default(),
            },
            stop_after: None,
            processed: 0,
            track_start: None,
            last_event: Time::default(),
            convergence: Vec::new(),
            snapshots: Vec::new(),
        };

        for event in config.events.iter() {
            net.schedule_config(event)?;
        }

        Ok(net)
    }

    /// Get the id of the router with the given name.
    pub fn router_id(&self, name: impl AsRef<str>) -> Result<RouterId, NetworkError> {
        self.ids
            .get(name.as_ref())
            .copied()
            .ok_or_else(|| NetworkError::DeviceNameNotFound(name.as_ref().to_string()))
    }

    /// Get the name of the router.
    pub fn router_name(&self, router: RouterId) -> Result<&str, NetworkError> {
        self.routers
            .get(&router)
            .map(|r| r.name())
            .ok_or(NetworkError::DeviceNotFound(router))
    }

    /// Get a router.
    pub fn router(&self, router: RouterId) -> Option<&Router> {
        self.routers.get(&router)
    }

    /// Get a router by its name.
    pub fn router_by_name(&self, name: impl AsRef<str>) -> Option<&Router> {
        self.router_id(name)
            .ok()
            .and_then(|id| self.routers.get(&id))
    }

    /// Iterate over all routers, sorted by their id.
    pub fn routers(&self) -> impl Iterator<Item = &Router> {
        self.routers.values()
    }

    /// Get the number of routers.
    pub fn num_routers(&self) -> usize {
        self.routers.len()
    }

    /// Get the link between two routers.
    pub fn link(&self, a: RouterId, b: RouterId) -> Option<&Link> {
        self.world.link(a, b)
    }

    /// Shared simulation state
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Current simulation time
    pub fn time(&self) -> Time {
        self.world.time
    }

    /// Simulation parameters
    pub fn params(&self) -> &SimParams {
        &self.world.params
    }

    /// Modify the simulation parameters.
    pub fn params_mut(&mut self) -> &mut SimParams {
        &mut self.world.params
    }

    /// Stop [`Network::run`] after processing the given number of events. The remaining events
    /// stay in the queue.
    pub fn set_msg_limit(&mut self, stop_after: Option<usize>) {
        self.stop_after = stop_after;
    }

    /// Schedule an event with routers referenced by their name.
    pub fn schedule_config(&mut self, event: &EventConfig) -> Result<(), NetworkError> {
        let e = match &event.kind {
            EventKind::AnnouncePrefix { router, prefix } => Event::Announce {
                router: self.router_id(router)?,
                prefix: *prefix,
            },
            EventKind::WithdrawPrefix { router, prefix } => Event::Withdraw {
                router: self.router_id(router)?,
                prefix: *prefix,
            },
            EventKind::LinkDown { a, b } => Event::LinkDown(self.router_id(a)?, self.router_id(b)?),
            EventKind::LinkUp { a, b } => Event::LinkUp(self.router_id(a)?, self.router_id(b)?),
            EventKind::Terminate => Event::Terminate,
            EventKind::ShowAllRibs => Event::ShowAllRibs,
            EventKind::ResetCounters => Event::ResetCounters,
            EventKind::ActivateDeaggregates => Event::ActivateDeaggregates,
            EventKind::OutputUpdates => Event::SnapshotUpdates,
            EventKind::ActivateDebug => Event::ActivateDebug,
            EventKind::StartTrackTime => Event::StartTrackTime,
            EventKind::StopTrackTime { label } => Event::StopTrackTime(label.clone()),
        };
        self.schedule(event.at, e)
    }

    /// Schedule an event at the given time (in seconds). Announcements register the prefix as
    /// allocated to the router if DRAGON is enabled.
    pub fn schedule(&mut self, at: f64, event: Event) -> Result<(), NetworkError> {
        match &event {
            Event::LinkDown(a, b) | Event::LinkUp(a, b) => {
                if self.world.links.find_edge(*a, *b).is_none() {
                    return Err(NetworkError::LinkNotFound(*a, *b));
                }
            }
            Event::Receive { from, to, .. } => {
                if self.world.links.find_edge(*from, *to).is_none() {
                    return Err(NetworkError::LinkNotFound(*from, *to));
                }
            }
            e => {
                if let Some(r) = e.router().filter(|r| !self.routers.contains_key(r)) {
                    return Err(NetworkError::DeviceNotFound(r));
                }
            }
        }
        if let Event::Announce { router, prefix } = &event {
            if self.world.params.dragon.enabled {
                self.world.registry.register(*router, *prefix);
            }
        }
        self.world.schedule(secs(at), event);
        Ok(())
    }

    /// Process events until the queue is empty, or a [`Event::Terminate`] is processed. Returns
    /// the number of processed events.
    pub fn run(&mut self) -> usize {
        self.world.registry.finalize();
        let mut processed = 0;
        loop {
            if self.stop_after.map(|x| processed >= x).unwrap_or(false) {
                warn!(
                    "Stop after {} events with {} events remaining",
                    processed,
                    self.world.queue.len()
                );
                break;
            }
            let Some((time, event)) = self.world.queue.pop() else {
                break;
            };
            self.world.time = time;
            if !matches!(event, Event::StartTrackTime | Event::StopTrackTime(_)) {
                self.last_event = time;
            }
            processed += 1;
            trace!("{} {}", time, event.fmt(&self.world));
            if !self.process(event) {
                info!("{} simulation terminates", time);
                self.world.queue.clear();
                break;
            }
        }
        self.processed += processed;

        if self.world.params.debug.final_ribs {
            info!("{}", self.fmt_all_ribs());
        }
        processed
    }

    fn router_mut(&mut self, router: RouterId) -> Option<(&mut Router, &mut World)> {
        let world = &mut self.world;
        match self.routers.get_mut(&router) {
            Some(r) => Some((r, world)),
            None => {
                warn!("Event for an unknown router {:?} is ignored", router);
                None
            }
        }
    }

    /// Process a single event. Returns `false` if the simulation must terminate.
    fn process(&mut self, event: Event) -> bool {
        match event {
            Event::Terminate => return false,
            Event::MraiExpire {
                router,
                peer,
                prefix,
            } => {
                if let Some((r, w)) = self.router_mut(router) {
                    r.mrai_expire(peer, prefix, w);
                }
            }
            Event::DecisionProcess { router, prefix } => {
                if let Some((r, w)) = self.router_mut(router) {
                    r.update(prefix, w);
                }
            }
            Event::Receive { from, to, update } => {
                if let Some((r, w)) = self.router_mut(to) {
                    r.receive(from, update, w);
                }
            }
            Event::LinkDown(a, b) => self.set_link_status(a, b, false),
            Event::LinkUp(a, b) => self.set_link_status(a, b, true),
            Event::Announce { router, prefix } => {
                let dragon = self.world.params.dragon.enabled;
                if let Some((r, w)) = self.router_mut(router) {
                    if dragon {
                        r.compute_local_announcements(prefix, w);
                    } else {
                        r.announce_prefix(prefix, w);
                    }
                }
            }
            Event::Withdraw { router, prefix } => {
                if let Some((r, w)) = self.router_mut(router) {
                    r.withdraw_prefix(prefix, w);
                }
            }
            Event::ShowAllRibs => info!("{}", self.fmt_all_ribs()),
            Event::ResetCounters => {
                debug!("Resetting all update counters");
                self.routers.values_mut().for_each(Router::reset_counters);
            }
            Event::ActivateDeaggregates => {
                debug!("Activating de-aggregated announcements");
                self.world.params.dragon.disable_deaggregates = false;
            }
            Event::SnapshotUpdates => {
                let snapshot = UpdateSnapshot {
                    time: self.world.time,
                    counters: self.update_counters(),
                };
                self.snapshots.push(snapshot);
            }
            Event::ActivateDebug => {
                info!("Activating debug output");
                self.world.params.debug.activate();
            }
            Event::StartTrackTime => {
                self.track_start = Some(self.world.time);
                self.last_event = self.world.time;
            }
            Event::StopTrackTime(label) => {
                let start = self.track_start.unwrap_or_default();
                let record = ConvergenceRecord {
                    label,
                    start: start.into_inner(),
                    duration: (self.last_event - start).into_inner(),
                };
                info!(
                    "Convergence time of {}: {:.2}s",
                    record.label, record.duration
                );
                self.convergence.push(record);
            }
        }
        true
    }

    fn set_link_status(&mut self, a: RouterId, b: RouterId, up: bool) {
        let Some(link) = self
            .world
            .links
            .find_edge(a, b)
            .and_then(|e| self.world.links.edge_weight_mut(e))
        else {
            warn!("Link {:?} -- {:?} does not exist", a, b);
            return;
        };
        link.up = up;
        log!(
            self.world.link_level(),
            "link {} - {} {}",
            self.world.router_name(a),
            self.world.router_name(b),
            if up { "up" } else { "down" }
        );
        for (x, y) in [(a, b), (b, a)] {
            if let Some((r, w)) = self.router_mut(x) {
                if up {
                    r.peer_up(y, w);
                } else {
                    r.peer_down(y, w);
                }
            }
        }
    }

    /// Number of updates sent from each router (first) to each peer (second).
    pub fn update_counters(&self) -> BTreeMap<(String, String), usize> {
        self.routers
            .values()
            .flat_map(|r| {
                r.num_updates().iter().map(move |(peer, n)| {
                    (
                        (r.name().to_string(), self.world.router_name(*peer).to_string()),
                        *n,
                    )
                })
            })
            .collect()
    }

    /// Total number of updates sent by all routers.
    pub fn total_updates(&self) -> usize {
        self.routers
            .values()
            .flat_map(|r| r.num_updates().values())
            .sum()
    }

    /// Snapshot of the RIB of the router.
    pub fn rib_snapshot(&self, router: RouterId) -> Option<RibSnapshot> {
        self.routers
            .get(&router)
            .map(|r| RibSnapshot::new(r, &self.world))
    }

    /// All convergence time measurements.
    pub fn convergence_records(&self) -> &[ConvergenceRecord] {
        &self.convergence
    }

    /// All snapshots of the update counters.
    pub fn update_snapshots(&self) -> &[UpdateSnapshot] {
        &self.snapshots
    }

    /// Summary of the simulation.
    pub fn report(&self) -> SimReport {
        SimReport {
            time: self.world.time,
            events: self.processed,
            ribs: self
                .routers
                .values()
                .map(|r| RibSnapshot::new(r, &self.world))
                .collect(),
            updates: self.update_counters(),
            convergence: self.convergence.clone(),
            snapshots: self.snapshots.clone(),
        }
    }
}
