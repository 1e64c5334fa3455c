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


use super::p;
use crate::bgp::Relationship;
use crate::config::*;
use crate::dragon::ConsistencyMode;
use crate::event::Delay;
use crate::mrai::MraiMode;
use crate::route_map::*;
use crate::types::{AsId, ConfigError};
use pretty_assertions::assert_eq;

const CONFIG: &str = r"
! two ASes, 2 is a customer of 1
router bgp 1
 bgp router-id 1.1
 bgp prefix-based-timer
 neighbor 2.1 remote-as 2 cust
 neighbor 2.1 advertisement-interval 30
 neighbor 2.1 route-map from-cust in
 neighbor 2.1 route-map community-strip out

router bgp 2
 bgp router-id 2.1
 neighbor 1.1 remote-as 1 provider
 neighbor 1.1 route-map from-provider in
 neighbor 1.1 route-map no-provider-peer-redistrib out

route-map from-cust permit 10
 set community 1
 set local-preference 100

route-map from-provider permit 10
 set community 3
 set local-preference 50

route-map no-provider-peer-redistrib deny 5
 match community-list 2:3 any

route-map community-strip permit 20
 set community none

link 1.1 2.1 delay uniform 0.2 0.3
link 1.1 2.1 bandwidth 10M
config always-compare-med
config mrai-jitter false
config default-process-delay deterministic 0.005
debug show-final-ribs
dragon mode forwarding
event announce-prefix 2.1 10.0.0.0/8 1
event link-down 1.1 2.1 100
event stop-track-time after failure 200
event terminate 1000
";

#[test]
fn parse_routers() {
    let config: SimConfig = CONFIG.parse().unwrap();
    assert_eq!(config.routers.len(), 2);

    let r1 = config.router("1.1").unwrap();
    assert_eq!(r1.asn, AsId(1));
    assert_eq!(r1.mrai_mode, MraiMode::PerPrefix);
    assert!(!r1.route_reflector);
    assert_eq!(r1.neighbors.len(), 1);
    let n = &r1.neighbors[0];
    assert_eq!(n.name, "2.1");
    assert_eq!(n.remote_as, Some(AsId(2)));
    assert_eq!(n.relationship, Some(Relationship::Customer));
    assert_eq!(n.mrai, 30.0);
    assert_eq!(n.maps_in, vec!["from-cust".to_string()]);
    assert_eq!(n.maps_out, vec!["community-strip".to_string()]);

    let r2 = config.router("2.1").unwrap();
    assert_eq!(r2.mrai_mode, MraiMode::PerPeer);
    assert_eq!(r2.neighbors[0].relationship, Some(Relationship::Provider));
    assert_eq!(r2.neighbors[0].mrai, 0.0);
}

#[test]
fn parse_route_maps() {
    let config: SimConfig = CONFIG.parse().unwrap();
    assert_eq!(config.route_maps.len(), 4);
    assert_eq!(
        config.route_maps["from-cust"],
        RouteMapBuilder::new("from-cust")
            .order(10)
            .set_community(1)
            .set_local_pref(100)
            .build()
    );
    assert_eq!(
        config.route_maps["no-provider-peer-redistrib"],
        RouteMapBuilder::new("no-provider-peer-redistrib")
            .order(5)
            .deny()
            .match_any_community([2, 3])
            .build()
    );
    assert_eq!(
        config.route_maps["community-strip"],
        RouteMapBuilder::new("community-strip")
            .order(20)
            .clear_communities()
            .build()
    );
}

#[test]
fn parse_links_params_events() {
    let config: SimConfig = CONFIG.parse().unwrap();
    assert_eq!(config.links.len(), 1);
    let link = &config.links[0];
    assert!(link.connects("2.1", "1.1"));
    assert_eq!(link.cost, None);
    assert_eq!(link.bandwidth, Some(1e7));
    assert_eq!(link.delay, Some(Delay::Uniform { low: 0.2, high: 0.3 }));

    let params = &config.params;
    assert!(params.always_compare_med);
    assert!(!params.mrai_jitter);
    assert!(params.always_mrai);
    assert_eq!(
        params.default_process_delay,
        Delay::Deterministic { value: 0.005 }
    );
    assert_eq!(params.default_link_delay, Delay::DEFAULT_LINK);
    assert!(params.debug.final_ribs);
    assert!(!params.debug.dragon);
    assert!(params.dragon.enabled);
    assert_eq!(params.dragon.mode, ConsistencyMode::Forwarding);

    assert_eq!(
        config.events,
        vec![
            EventConfig {
                at: 1.0,
                kind: EventKind::AnnouncePrefix {
                    router: "2.1".to_string(),
                    prefix: p("10.0.0.0/8"),
                },
            },
            EventConfig {
                at: 100.0,
                kind: EventKind::LinkDown {
                    a: "1.1".to_string(),
                    b: "2.1".to_string(),
                },
            },
            EventConfig {
                at: 200.0,
                kind: EventKind::StopTrackTime {
                    label: "after failure".to_string(),
                },
            },
            EventConfig {
                at: 1000.0,
                kind: EventKind::Terminate,
            },
        ]
    );
}

#[test]
fn defaults() {
    let params = SimParams::default();
    assert!(params.dragon.enabled);
    assert_eq!(params.dragon.mode, ConsistencyMode::Route);
    assert!(params.dragon.restrict_to_parentless);
    assert!(params.dragon.disable_deaggregates);
    assert!(!params.dragon.stub_optimizations);
    assert!(params.always_mrai);
    assert!(params.mrai_jitter);
    assert_eq!(params.default_weight, 1000);
    assert_eq!(params.default_local_pref, 100);
    assert_eq!(params.default_bandwidth, 1e8);
}

#[test]
fn dragon_options() {
    let config: SimConfig = "dragon disable\ndragon deaggregates\ndragon stub-optimizations on"
        .parse()
        .unwrap();
    let dragon = &config.params.dragon;
    assert!(!dragon.enabled);
    assert!(!dragon.disable_deaggregates);
    assert!(dragon.stub_optimizations);
}

fn line_error(s: &str) -> (usize, ConfigError) {
    match s.parse::<SimConfig>() {
        Err(ConfigError::AtLine { line, source }) => (line, *source),
        x => panic!("expected an error with line number, got {x:?}"),
    }
}

#[test]
fn errors_carry_line() {
    assert_eq!(
        line_error("router bgp 1\n bgp router-id 1.1\n\n frobnicate"),
        (4, ConfigError::UnknownCommand("frobnicate".to_string()))
    );
    assert_eq!(
        line_error("! comment\nneighbor 2.1 remote-as 2"),
        (2, ConfigError::NoRouterContext)
    );
    assert_eq!(
        line_error("set local-preference 10"),
        (1, ConfigError::NoRouteMapContext)
    );
    assert_eq!(
        line_error("router bgp x"),
        (1, ConfigError::InvalidNumber("x".to_string()))
    );
    assert_eq!(
        line_error("event announce-prefix 1.1 10.0.0.0/33 1"),
        (1, ConfigError::InvalidPrefix("10.0.0.0/33".to_string()))
    );
    assert_eq!(
        line_error("event explode 1.1 1"),
        (1, ConfigError::UnknownCommand("event explode".to_string()))
    );
    assert_eq!(
        line_error("config default-link-delay gamma 1"),
        (1, ConfigError::UnsupportedDistribution("gamma".to_string()))
    );
    assert_eq!(
        line_error("route-map x permit 10\n match community-list 1:2"),
        (
            2,
            ConfigError::MalformedRouteMap("match community-list 1:2".to_string())
        )
    );
    assert_eq!(
        line_error("router bgp 1\n bgp router-id 1.1\n neighbor 2.1 remote-as 2 sibling"),
        (3, ConfigError::UnknownOption("sibling".to_string()))
    );
}

#[test]
fn match_and_set_clauses() {
    assert_eq!(
        parse_match(&["community-list", "4"]),
        Ok(RouteMapMatch::Community(CommunityMatch::Contains(4)))
    );
    assert_eq!(
        parse_match(&["community-list", "1:2", "exact"]),
        Ok(RouteMapMatch::Community(CommunityMatch::Exact(vec![1, 2])))
    );
    assert_eq!(
        parse_match(&["metric", "7"]),
        Ok(RouteMapMatch::Metric(7))
    );
    assert_eq!(
        parse_match(&["ip", "address", "10.0.0.0/8"]),
        Ok(RouteMapMatch::Prefix(p("10.0.0.0/8")))
    );
    assert!(parse_match(&["as-path", "^1_"]).is_ok());
    assert_eq!(
        parse_set(&["community", "1:2", "additive"]),
        Ok(RouteMapSet::Community(CommunityAction::Additive(vec![1, 2])))
    );
    assert_eq!(
        parse_set(&["as-path", "prepend", "3", "3"]),
        Ok(RouteMapSet::PrependAsPath(vec![AsId(3), AsId(3)]))
    );
    assert!(parse_set(&["as-path", "prepend"]).is_err());
    assert_eq!(parse_set(&["metric", "9"]), Ok(RouteMapSet::Med(9)));
}

#[test]
fn json_roundtrip() {
    let config: SimConfig = CONFIG.parse().unwrap();
    let json = config.to_json().unwrap();
    let back = SimConfig::from_json(&json).unwrap();
    assert_eq!(back, config);
}

#[test]
fn json_defaults() {
    let config = SimConfig::from_json(
        r#"{
            "routers": [
                {"name": "1.1", "asn": 1, "neighbors": [{"name": "2.1"}]},
                {"name": "2.1", "asn": 2}
            ],
            "events": [{"at": 1.0, "kind": "announce-prefix", "router": "1.1", "prefix": "10.0.0.0/8"}]
        }"#,
    )
    .unwrap();
    assert_eq!(config.params, SimParams::default());
    assert_eq!(config.routers[0].neighbors[0], NeighborConfig::new("2.1"));
    assert!(config.routers[1].neighbors.is_empty());
    assert_eq!(config.events[0].at, 1.0);

    assert!(matches!(
        SimConfig::from_json("{\"routers\": 3}"),
        Err(ConfigError::Json(_))
    ));
}

#[test]
fn link_mut_finds_both_directions() {
    let mut config = SimConfig::default();
    config.link_mut("1.1", "2.1").cost = Some(5);
    config.link_mut("2.1", "1.1").bandwidth = Some(1e3);
    assert_eq!(config.links.len(), 1);
    assert_eq!(config.links[0].cost, Some(5));
    assert_eq!(config.links[0].bandwidth, Some(1e3));
}
