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


use crate::bgp::Relationship;
use crate::builder::*;
use crate::config::{EventKind, SimConfig};
use crate::event::{seeded_rng, Delay};
use crate::route_map::RouteMapState;
use crate::types::{AsId, ConfigError};
use maplit::btreeset;
use pretty_assertions::assert_eq;

fn diamond() -> AsTopology {
    // 1 and 2 peer, 3 is customer of 1 and 2, 4 is customer of 3
    "1 2 0\n3 1 1\n3 2 1\n4 3 1\n".parse().unwrap()
}

#[test]
fn parse_topology() {
    let topo = diamond();
    assert_eq!(topo.len(), 4);
    assert_eq!(topo.relationship(AsId(1), AsId(2)), Some(Relationship::Peer));
    assert_eq!(topo.relationship(AsId(2), AsId(1)), Some(Relationship::Peer));
    assert_eq!(
        topo.relationship(AsId(1), AsId(3)),
        Some(Relationship::Customer)
    );
    assert_eq!(
        topo.relationship(AsId(3), AsId(1)),
        Some(Relationship::Provider)
    );
    assert_eq!(topo.relationship(AsId(1), AsId(4)), None);
    assert_eq!(topo.customers(AsId(3)).collect::<Vec<_>>(), vec![AsId(4)]);
    assert_eq!(topo.stubs(), btreeset! {AsId(4)});
}

#[test]
fn parse_topology_ignores_other_lines() {
    let topo: AsTopology = "# header\n1 2 0\n\n3 1 1 extra\n".parse().unwrap();
    assert_eq!(topo.len(), 2);
}

#[test]
fn parse_topology_errors() {
    assert_eq!(
        "1 2 0\n1 x 1".parse::<AsTopology>(),
        Err(ConfigError::InvalidNumber("x".to_string()).at_line(2))
    );
    assert_eq!(
        "1 2 2".parse::<AsTopology>(),
        Err(ConfigError::UnknownOption("2".to_string()).at_line(1))
    );
}

#[test]
fn levels() {
    assert_eq!(
        diamond().levels(),
        vec![
            btreeset! {AsId(4)},
            btreeset! {AsId(3)},
            btreeset! {AsId(1), AsId(2)},
        ]
    );
}

#[test]
fn levels_stop_at_cycles() {
    let mut topo = AsTopology::new();
    topo.add_customer(1, 2);
    topo.add_customer(2, 3);
    topo.add_customer(3, 4);
    topo.add_customer(4, 2);
    topo.add_as(5);
    assert_eq!(topo.levels(), vec![btreeset! {AsId(5)}]);
}

#[test]
fn standard_maps() {
    let maps = standard_route_maps();
    assert_eq!(maps.len(), 5);
    let deny = maps
        .iter()
        .find(|m| m.name == NO_PROVIDER_PEER_REDISTRIBUTION)
        .unwrap();
    assert_eq!(deny.state, RouteMapState::Deny);
    assert!(deny.is_filter());
    assert!(maps
        .iter()
        .filter(|m| m.name != NO_PROVIDER_PEER_REDISTRIBUTION)
        .all(|m| !m.is_filter()));
}

#[test]
fn relationship_sessions() {
    let mut config = SimConfig::default();
    config.build_relationships(&diamond(), DEFAULT_MRAI);
    assert_eq!(config.routers.len(), 4);
    assert_eq!(config.route_maps.len(), 5);

    let r3 = config.router("3.1").unwrap();
    assert_eq!(r3.asn, AsId(3));
    assert_eq!(r3.neighbors.len(), 3);
    for n in r3.neighbors.iter() {
        assert_eq!(n.mrai, DEFAULT_MRAI);
        let (maps_in, maps_out) = session_route_maps(n.relationship.unwrap());
        assert_eq!(n.maps_in, maps_in);
        assert_eq!(n.maps_out, maps_out);
    }
    let to_4 = r3.neighbors.iter().find(|n| n.name == "4.1").unwrap();
    assert_eq!(to_4.relationship, Some(Relationship::Customer));
    assert_eq!(to_4.maps_in, vec![FROM_CUSTOMER.to_string()]);
    assert_eq!(to_4.maps_out, vec![COMMUNITY_STRIP.to_string()]);
    let to_1 = r3.neighbors.iter().find(|n| n.name == "1.1").unwrap();
    assert_eq!(to_1.remote_as, Some(AsId(1)));
    assert_eq!(to_1.maps_in, vec![FROM_PROVIDER.to_string()]);
    assert_eq!(
        to_1.maps_out,
        vec![
            NO_PROVIDER_PEER_REDISTRIBUTION.to_string(),
            COMMUNITY_STRIP.to_string()
        ]
    );

    // building twice does not duplicate anything
    config.build_relationships(&diamond(), 10.0);
    assert_eq!(config.routers.len(), 4);
    assert_eq!(config.router("3.1").unwrap().neighbors.len(), 3);
    assert_eq!(config.router("3.1").unwrap().neighbors[0].mrai, 10.0);
}

#[test]
fn link_delays_and_announcements() {
    let mut config = SimConfig::default();
    config.build_relationships(&diamond(), DEFAULT_MRAI);
    config.build_link_delays(constant_link_delay, 0.05);
    assert_eq!(config.links.len(), 4);
    assert!(config
        .links
        .iter()
        .all(|l| l.delay == Some(Delay::Deterministic { value: 0.05 })));

    config.build_announcements(
        vec![(AsId(4), "10.0.0.0/8".parse().unwrap())],
        1.0,
    );
    assert_eq!(config.events.len(), 1);
    assert_eq!(
        config.events[0].kind,
        EventKind::AnnouncePrefix {
            router: "4.1".to_string(),
            prefix: "10.0.0.0/8".parse().unwrap()
        }
    );
}

#[test]
fn nested() {
    let mut rng = seeded_rng("nested", "");
    let prefixes = nested_prefixes(4, 8, 4, &mut rng);
    assert_eq!(prefixes.len(), 4);
    assert_eq!(prefixes[0].prefix_len(), 12);
    for w in prefixes.windows(2) {
        assert!(w[0].strictly_covers(&w[1]));
        assert_eq!(w[1].prefix_len(), w[0].prefix_len() + 4);
    }
    assert!("10.0.0.0/8".parse::<crate::types::Ipv4Prefix>().unwrap().covers(&prefixes[0]));

    // stops at /32
    assert_eq!(nested_prefixes(10, 24, 4, &mut rng).len(), 2);
    assert!(nested_prefixes(3, 8, 0, &mut rng).is_empty());
}
