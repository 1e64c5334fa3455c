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

//! Module for generating the configuration of AS-level topologies with business relationships.
//!
//! Every AS `N` is represented by a single router `N.1`. The sessions use the standard route maps
//! that tag routes with their [`RouteClass`](crate::types::RouteClass) on import, and implement
//! the valley-free export rules.
//!
//! ```
//! use dragonsim::prelude::*;
//! use dragonsim::builder::{AsTopology, ConfigBuilder};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut topo = AsTopology::new();
//! topo.add_peering(1, 2);
//! topo.add_customer(1, 3);
//! topo.add_customer(2, 3);
//!
//! let mut config = SimConfig::default();
//! config.build_relationships(&topo, 30.0);
//! assert_eq!(config.routers.len(), 3);
//! assert_eq!(config.route_maps.len(), 5);
//! # Ok(())
//! # }
//! ```

use std::{
    collections::{BTreeMap, BTreeSet},
    net::Ipv4Addr,
    str::FromStr,
};

use rand::Rng;

use crate::{
    bgp::Relationship,
    config::{EventKind, RouterConfig, SimConfig},
    event::Delay,
    route_map::{RouteMap, RouteMapBuilder},
    types::{AsId, ConfigError, Ipv4Prefix, RouteClass},
};

/// MRAI base value used by the standard configuration.
pub const DEFAULT_MRAI: f64 = 30.0;

/// Name of the route map applied to routes learned from customers.
pub const FROM_CUSTOMER: &str = "from-cust";
/// Name of the route map applied to routes learned from peers.
pub const FROM_PEER: &str = "from-peer";
/// Name of the route map applied to routes learned from providers.
pub const FROM_PROVIDER: &str = "from-provider";
/// Name of the route map that stops peer and provider routes from being exported.
pub const NO_PROVIDER_PEER_REDISTRIBUTION: &str = "no-provider-peer-redistrib";
/// Name of the route map that removes all communities on export.
pub const COMMUNITY_STRIP: &str = "community-strip";

/// AS-level topology, where each pair of neighboring ASes has a business relationship.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AsTopology {
    /// `adj[a][b]` is what `b` is to `a`.
    adj: BTreeMap<AsId, BTreeMap<AsId, Relationship>>,
}

impl AsTopology {
    /// Create an empty topology.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an AS without any neighbors.
    pub fn add_as(&mut self, asn: impl Into<AsId>) {
        self.adj.entry(asn.into()).or_default();
    }

    /// Add (or replace) the relationship `b` has towards `a`, and the reverse one.
    pub fn add_relationship(
        &mut self,
        a: impl Into<AsId>,
        b: impl Into<AsId>,
        rel: Relationship,
    ) {
        let (a, b) = (a.into(), b.into());
        self.adj.entry(a).or_default().insert(b, rel);
        self.adj.entry(b).or_default().insert(a, rel.reverse());
    }

    /// `customer` buys transit from `provider`.
    pub fn add_customer(&mut self, provider: impl Into<AsId>, customer: impl Into<AsId>) {
        self.add_relationship(provider, customer, Relationship::Customer)
    }

    /// `a` and `b` are settlement-free peers.
    pub fn add_peering(&mut self, a: impl Into<AsId>, b: impl Into<AsId>) {
        self.add_relationship(a, b, Relationship::Peer)
    }

    /// Iterate over all ASes in increasing order.
    pub fn ases(&self) -> impl Iterator<Item = AsId> + '_ {
        self.adj.keys().copied()
    }

    /// Number of ASes
    pub fn len(&self) -> usize {
        self.adj.len()
    }

    /// Returns `true` if the topology has no AS.
    pub fn is_empty(&self) -> bool {
        self.adj.is_empty()
    }

    /// What `b` is to `a`, if they are neighbors.
    pub fn relationship(&self, a: AsId, b: AsId) -> Option<Relationship> {
        self.adj.get(&a).and_then(|n| n.get(&b)).copied()
    }

    /// Iterate over all neighbors of `a`, with their relationship towards `a`.
    pub fn neighbors(&self, a: AsId) -> impl Iterator<Item = (AsId, Relationship)> + '_ {
        self.adj
            .get(&a)
            .into_iter()
            .flat_map(|n| n.iter().map(|(b, rel)| (*b, *rel)))
    }

    /// Iterate over the customers of `a`.
    pub fn customers(&self, a: AsId) -> impl Iterator<Item = AsId> + '_ {
        self.neighbors(a)
            .filter(|(_, rel)| *rel == Relationship::Customer)
            .map(|(b, _)| b)
    }

    /// Returns `true` if the AS has no customers.
    pub fn is_stub(&self, a: AsId) -> bool {
        self.customers(a).next().is_none()
    }

    /// All ASes without customers.
    pub fn stubs(&self) -> BTreeSet<AsId> {
        self.ases().filter(|a| self.is_stub(*a)).collect()
    }

    /// Group the ASes into levels. Level 0 contains all stubs, and an AS belongs to level `k` if
    /// all its customers are in a level below `k`. ASes on a customer cycle are never assigned.
    pub fn levels(&self) -> Vec<BTreeSet<AsId>> {
        let mut levels = vec![self.stubs()];
        let mut assigned: BTreeSet<AsId> = levels[0].clone();
        while assigned.len() < self.len() {
            let next: BTreeSet<AsId> = self
                .ases()
                .filter(|a| !assigned.contains(a))
                .filter(|a| self.customers(*a).all(|c| assigned.contains(&c)))
                .collect();
            if next.is_empty() {
                break;
            }
            assigned.extend(next.iter().copied());
            levels.push(next);
        }
        levels
    }

    /// Name of the router that represents the AS.
    pub fn router_name(asn: AsId) -> String {
        format!("{}.1", asn.0)
    }
}

/// Parse a topology where each line contains `<a> <b> <type>`. Type `0` means that `a` and `b`
/// are peers, and type `1` means that `a` is a customer of `b`. Lines that do not have exactly
/// three fields are ignored.
impl FromStr for AsTopology {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut topo = Self::new();
        for (i, line) in s.lines().enumerate() {
            let fields = line.split_whitespace().collect::<Vec<_>>();
            let [a, b, kind] = fields.as_slice() else {
                continue;
            };
            let parse = |x: &str| {
                x.parse::<u32>()
                    .map_err(|_| ConfigError::InvalidNumber(x.to_string()).at_line(i + 1))
            };
            let (a, b) = (parse(a)?, parse(b)?);
            match *kind {
                "0" => topo.add_peering(a, b),
                "1" => topo.add_customer(b, a),
                x => return Err(ConfigError::UnknownOption(x.to_string()).at_line(i + 1)),
            }
        }
        Ok(topo)
    }
}

/// Trait to add the standard relationship configuration to a [`SimConfig`].
pub trait ConfigBuilder {
    /// Add the standard route maps. Routes learned from customers, peers and providers get the
    /// community of their [`RouteClass`] and a local preference of 100, 75 and 50. Routes tagged
    /// as peer or provider routes are not exported to peers and providers, and all communities are
    /// removed on export.
    fn build_standard_route_maps(&mut self);

    /// Add one router per AS of the topology, and a session for each pair of neighboring ASes,
    /// using the standard route maps and the given MRAI base value. Routers and sessions that
    /// already exist keep their other settings.
    fn build_relationships(&mut self, topo: &AsTopology, mrai: f64);

    /// Set the delay distribution of every link, as computed by `link_delay` from the names of
    /// both endpoints, the configuration and the argument `a`.
    fn build_link_delays<F, A>(&mut self, link_delay: F, a: A)
    where
        A: Clone,
        F: FnMut(&str, &str, &SimConfig, A) -> Option<Delay>;

    /// Announce every prefix at time `at` from the router of the AS it is assigned to.
    fn build_announcements<I>(&mut self, assignments: I, at: f64)
    where
        I: IntoIterator<Item = (AsId, Ipv4Prefix)>;
}

impl ConfigBuilder for SimConfig {
    fn build_standard_route_maps(&mut self) {
        for map in standard_route_maps() {
            self.route_maps.insert(map.name.clone(), map);
        }
    }

    fn build_relationships(&mut self, topo: &AsTopology, mrai: f64) {
        self.build_standard_route_maps();
        for asn in topo.ases() {
            let name = AsTopology::router_name(asn);
            let pos = match self.routers.iter().position(|r| r.name == name) {
                Some(pos) => pos,
                None => {
                    self.routers.push(RouterConfig::new(name.clone(), asn));
                    self.routers.len() - 1
                }
            };
            let router = &mut self.routers[pos];
            for (neighbor, rel) in topo.neighbors(asn) {
                let n = router.neighbor_mut(&AsTopology::router_name(neighbor));
                n.remote_as = Some(neighbor);
                n.relationship = Some(rel);
                n.mrai = mrai;
                let (maps_in, maps_out) = session_route_maps(rel);
                n.maps_in = maps_in.iter().map(|x| x.to_string()).collect();
                n.maps_out = maps_out.iter().map(|x| x.to_string()).collect();
            }
        }
    }

    fn build_link_delays<F, A>(&mut self, mut link_delay: F, a: A)
    where
        A: Clone,
        F: FnMut(&str, &str, &SimConfig, A) -> Option<Delay>,
    {
        let pairs: BTreeSet<(String, String)> = self
            .routers
            .iter()
            .flat_map(|r| {
                r.neighbors.iter().map(move |n| {
                    if r.name < n.name {
                        (r.name.clone(), n.name.clone())
                    } else {
                        (n.name.clone(), r.name.clone())
                    }
                })
            })
            .collect();
        for (x, y) in pairs {
            let delay = link_delay(&x, &y, self, a.clone());
            self.link_mut(&x, &y).delay = delay;
        }
    }

    fn build_announcements<I>(&mut self, assignments: I, at: f64)
    where
        I: IntoIterator<Item = (AsId, Ipv4Prefix)>,
    {
        for (asn, prefix) in assignments {
            self.add_event(
                at,
                EventKind::AnnouncePrefix {
                    router: AsTopology::router_name(asn),
                    prefix,
                },
            );
        }
    }
}

/// Names of the incoming and outgoing route maps of a session towards a neighbor with the given
/// relationship.
pub fn session_route_maps(rel: Relationship) -> (&'static [&'static str], &'static [&'static str]) {
    match rel {
        Relationship::Customer => (&[FROM_CUSTOMER], &[COMMUNITY_STRIP]),
        Relationship::Peer => (
            &[FROM_PEER],
            &[NO_PROVIDER_PEER_REDISTRIBUTION, COMMUNITY_STRIP],
        ),
        Relationship::Provider => (
            &[FROM_PROVIDER],
            &[NO_PROVIDER_PEER_REDISTRIBUTION, COMMUNITY_STRIP],
        ),
    }
}

/// The standard route maps for customer, peer and provider sessions.
pub fn standard_route_maps() -> Vec<RouteMap> {
    let tag = |name: &str, class: RouteClass, local_pref: u32| {
        RouteMapBuilder::new(name)
            .allow()
            .set_community(class.community())
            .set_local_pref(local_pref)
            .build()
    };
    vec![
        tag(FROM_CUSTOMER, RouteClass::Customer, 100),
        tag(FROM_PEER, RouteClass::Peer, 75),
        tag(FROM_PROVIDER, RouteClass::Provider, 50),
        RouteMapBuilder::new(NO_PROVIDER_PEER_REDISTRIBUTION)
            .deny()
            .match_any_community([RouteClass::Peer.community(), RouteClass::Provider.community()])
            .build(),
        RouteMapBuilder::new(COMMUNITY_STRIP)
            .allow()
            .clear_communities()
            .build(),
    ]
}

/// Constant delay for every link.
pub fn constant_link_delay(_: &str, _: &str, _: &SimConfig, delay: f64) -> Option<Delay> {
    Some(Delay::Deterministic { value: delay })
}

/// Generate a chain of `n` nested prefixes. The first one is a random subnet of `10.0.0.0/<len>`
/// that is `incr` bits longer, and each following prefix is a random subnet of the previous one
/// that is again `incr` bits longer. Generation stops early once the prefix length would exceed
/// 32.
pub fn nested_prefixes<R: Rng>(n: usize, len: u8, incr: u8, rng: &mut R) -> Vec<Ipv4Prefix> {
    let mut prefixes = Vec::with_capacity(n);
    let mut block = Ipv4Prefix::new(Ipv4Addr::new(10, 0, 0, 0), len.min(32));
    while prefixes.len() < n {
        let Some(parent) = block else {
            break;
        };
        let Some(new_len) = parent.prefix_len().checked_add(incr).filter(|l| *l <= 32) else {
            break;
        };
        if incr == 0 {
            break;
        }
        let idx: u64 = rng.gen_range(0..(1u64 << incr));
        let addr = u32::from(parent.addr()) | (idx << (32 - new_len)) as u32;
        block = Ipv4Prefix::new(Ipv4Addr::from(addr), new_len);
        if let Some(p) = block {
            prefixes.push(p);
        }
    }
    prefixes
}
