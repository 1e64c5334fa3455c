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

use crate::{
    bgp::{Alternative, Path},
    builder::{AsTopology, ConfigBuilder, DEFAULT_MRAI},
    config::{EventKind, SimConfig},
    network::Network,
    types::{AsId, Ipv4Prefix, RouterId},
};

/// Parse a prefix, panicking if it is malformed.
pub(crate) fn p(s: &str) -> Ipv4Prefix {
    s.parse().unwrap()
}

/// A path learned from `source` with the given AS path and communities.
pub(crate) fn path(source: u32, as_path: &[u32], communities: &[u32]) -> Path {
    Path {
        weight: 1000,
        local_pref: Some(100),
        med: 0,
        igp_cost: Some(0),
        next_hop: RouterId::new(source as usize),
        as_path: as_path.iter().map(|x| AsId(*x)).collect(),
        communities: communities.to_vec(),
        alternative: Alternative::None,
        source: Some(RouterId::new(source as usize)),
    }
}

/// Standard relationship configuration of the topology, with de-aggregation enabled.
pub(crate) fn standard_config(topo: &AsTopology) -> SimConfig {
    let mut config = SimConfig::default();
    config.params.dragon.disable_deaggregates = false;
    config.build_relationships(topo, DEFAULT_MRAI);
    config
}

/// Schedule an announcement of `prefix` at the router of `asn`.
pub(crate) fn announce(config: &mut SimConfig, at: f64, asn: u32, prefix: &str) {
    config.add_event(
        at,
        EventKind::AnnouncePrefix {
            router: AsTopology::router_name(AsId(asn)),
            prefix: p(prefix),
        },
    );
}

/// Schedule a failure of the link between the routers of both ASes.
pub(crate) fn link_down(config: &mut SimConfig, at: f64, a: u32, b: u32) {
    config.add_event(
        at,
        EventKind::LinkDown {
            a: AsTopology::router_name(AsId(a)),
            b: AsTopology::router_name(AsId(b)),
        },
    );
}

/// Build the network and run it until the queue is empty.
pub(crate) fn run(config: &SimConfig) -> Network {
    let mut net = Network::from_config(config).unwrap();
    net.run();
    net
}

/// AS path of the best route of `router` towards `prefix`.
pub(crate) fn as_path(net: &Network, router: &str, prefix: &str) -> Option<Vec<u32>> {
    net.router_by_name(router)
        .unwrap()
        .rib(&p(prefix))
        .map(|e| e.best.as_path.iter().map(|x| x.0).collect())
}

mod test_aggregate;
mod test_builder;
mod test_config;
mod test_mrai;
mod test_network;
