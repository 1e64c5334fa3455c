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


use super::{announce, link_down, p, run, standard_config};
use crate::bgp::{Relationship, SessionType};
use crate::builder::{AsTopology, DEFAULT_MRAI};
use crate::config::{EventKind, NeighborConfig, RouterConfig, SimConfig};
use crate::event::Event;
use crate::network::Network;
use crate::types::{AsId, ConfigError, NetworkError, RouterId};
use pretty_assertions::assert_eq;

fn triangle() -> SimConfig {
    let mut topo = AsTopology::new();
    topo.add_peering(1, 2);
    topo.add_customer(1, 3);
    topo.add_customer(2, 3);
    let mut config = standard_config(&topo);
    announce(&mut config, 1.0, 2, "1.0.0.0/22");
    announce(&mut config, 2.0, 3, "1.0.0.0/24");
    config
}

#[test]
fn build_from_config() {
    let net = Network::from_config(&triangle()).unwrap();
    assert_eq!(net.num_routers(), 3);
    let (r1, r2, r3) = (RouterId::new(0), RouterId::new(1), RouterId::new(2));
    assert_eq!(net.router_id("1.1"), Ok(r1));
    assert_eq!(net.router_id("3.1"), Ok(r3));
    assert_eq!(net.router_name(r2), Ok("2.1"));
    assert_eq!(
        net.router_id("4.1"),
        Err(NetworkError::DeviceNameNotFound("4.1".to_string()))
    );
    assert!(net.link(r1, r2).unwrap().is_up());
    assert!(net.link(r3, r1).is_some());
    assert_eq!(net.link(r1, r2).unwrap().bandwidth(), 1e8);

    let router = net.router(r3).unwrap();
    assert_eq!(router.as_id(), AsId(3));
    assert!(router.has_no_customers());
    assert!(!net.router(r1).unwrap().has_no_customers());
    let peer = router.peer(r1).unwrap();
    assert_eq!(peer.name(), "1.1");
    assert_eq!(peer.remote_as(), AsId(1));
    assert_eq!(peer.relationship(), Some(Relationship::Provider));
    assert_eq!(peer.session(), SessionType::EBgp);
    assert_eq!(peer.mrai_base(), DEFAULT_MRAI);
    assert_eq!(router.peers().count(), 2);

    // the two announcements are scheduled
    assert_eq!(net.world().queue().len(), 2);
}

#[test]
fn ibgp_session() {
    let mut config = SimConfig::default();
    let mut a = RouterConfig::new("1.1", 1u32);
    a.neighbor_mut("1.2");
    let mut b = RouterConfig::new("1.2", 1u32);
    b.neighbor_mut("1.1");
    config.routers = vec![a, b];
    let net = Network::from_config(&config).unwrap();
    let r = net.router_by_name("1.1").unwrap();
    let peer = r.peer(net.router_id("1.2").unwrap()).unwrap();
    assert_eq!(peer.session(), SessionType::IBgp);
    assert_eq!(peer.remote_as(), AsId(1));
}

#[test]
fn config_errors() {
    let mut config = triangle();
    config.routers.push(RouterConfig::new("1.1", 1u32));
    assert_eq!(
        Network::from_config(&config).err(),
        Some(NetworkError::DuplicateRouter("1.1".to_string()))
    );

    let mut config = triangle();
    config.routers[0].neighbors.push(NeighborConfig::new("1.1"));
    assert_eq!(
        Network::from_config(&config).err(),
        Some(NetworkError::SelfSession("1.1".to_string()))
    );

    let mut config = triangle();
    config.routers[0].neighbors.push(NeighborConfig::new("7.1"));
    assert_eq!(
        Network::from_config(&config).err(),
        Some(NetworkError::DeviceNameNotFound("7.1".to_string()))
    );

    let mut config = triangle();
    config.routers[0].neighbors[0]
        .maps_in
        .push("unknown".to_string());
    assert_eq!(
        Network::from_config(&config).err(),
        Some(NetworkError::ConfigError(ConfigError::UnknownRouteMap(
            "unknown".to_string()
        )))
    );

    let mut config = triangle();
    config.params.default_link_delay = crate::event::Delay::Uniform {
        low: 1.0,
        high: 0.0,
    };
    assert!(Network::from_config(&config).is_err());

    let mut config = triangle();
    config.link_mut("1.1", "2.1").bandwidth = Some(0.0);
    assert!(Network::from_config(&config).is_err());

    let mut config = triangle();
    config.add_event(
        5.0,
        EventKind::WithdrawPrefix {
            router: "9.1".to_string(),
            prefix: p("1.0.0.0/24"),
        },
    );
    assert_eq!(
        Network::from_config(&config).err(),
        Some(NetworkError::DeviceNameNotFound("9.1".to_string()))
    );
}

#[test]
fn schedule_errors() {
    let mut topo = AsTopology::new();
    topo.add_customer(1, 2);
    topo.add_as(3);
    let mut net = Network::from_config(&standard_config(&topo)).unwrap();
    let (r1, r3) = (RouterId::new(0), RouterId::new(2));
    assert_eq!(
        net.schedule(1.0, Event::LinkDown(r1, r3)),
        Err(NetworkError::LinkNotFound(r1, r3))
    );
    let unknown = RouterId::new(9);
    assert_eq!(
        net.schedule(
            1.0,
            Event::Announce {
                router: unknown,
                prefix: p("1.0.0.0/8")
            }
        ),
        Err(NetworkError::DeviceNotFound(unknown))
    );
    assert!(net.world().queue().is_empty());
}

#[test_log::test]
fn terminate_discards_events() {
    let mut config = triangle();
    config.add_event(1.5, EventKind::Terminate);
    let mut net = Network::from_config(&config).unwrap();
    net.run();
    assert_eq!(net.time().into_inner(), 1.5);
    assert!(net.world().queue().is_empty());
    assert!(net.router_by_name("3.1").unwrap().rib(&p("1.0.0.0/24")).is_none());
}

#[test]
fn message_limit() {
    let mut net = Network::from_config(&triangle()).unwrap();
    net.set_msg_limit(Some(3));
    assert_eq!(net.run(), 3);
    assert!(!net.world().queue().is_empty());
    net.set_msg_limit(None);
    assert!(net.run() > 0);
    assert!(net.world().queue().is_empty());
}

#[test]
fn deterministic_delays() {
    let config: SimConfig = "
        router bgp 1
         bgp router-id 1.1
         neighbor 2.1 remote-as 2 cust
        router bgp 2
         bgp router-id 2.1
         neighbor 1.1 remote-as 1 prov
        link 1.1 2.1 delay deterministic 1
        config always-mrai false
        config default-process-delay deterministic 0
        event announce-prefix 2.1 10.0.0.0/8 1
    "
    .parse()
    .unwrap();
    let net = run(&config);
    let r1 = net.router_by_name("1.1").unwrap();
    assert!(r1.rib(&p("10.0.0.0/8")).is_some());
    let t = net.time().into_inner();
    assert!((2.0..4.0).contains(&t), "last event at {t}");
}

#[test]
fn transmission_delay_uses_bits() {
    // 8 bit per second: every byte of the update takes one second on the wire.
    let config: SimConfig = "
        router bgp 1
         bgp router-id 1.1
         neighbor 2.1 remote-as 2 cust
        router bgp 2
         bgp router-id 2.1
         neighbor 1.1 remote-as 1 prov
        link 1.1 2.1 delay deterministic 0
        link 1.1 2.1 bandwidth 8
        config always-mrai false
        config default-process-delay deterministic 0
        event announce-prefix 2.1 10.0.0.0/8 1
    "
    .parse()
    .unwrap();
    let net = run(&config);
    let r1 = net.router_by_name("1.1").unwrap();
    assert!(r1.rib(&p("10.0.0.0/8")).is_some());
    // an update carries at least 20 bytes
    let t = net.time().into_inner();
    assert!(t >= 21.0, "last event at {t}");
    assert!(t < 100.0, "last event at {t}");
}

#[test_log::test]
fn update_counters_and_snapshots() {
    let mut config = triangle();
    config.add_event(400.0, EventKind::OutputUpdates);
    config.add_event(450.0, EventKind::ResetCounters);
    let net = run(&config);

    let snapshots = net.update_snapshots();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].time.into_inner(), 400.0);
    let sent: usize = snapshots[0].counters.values().sum();
    assert!(sent > 0);
    assert!(snapshots[0].counters[&("3.1".to_string(), "1.1".to_string())] > 0);

    assert_eq!(net.total_updates(), 0);
    assert!(net.update_counters().values().all(|x| *x == 0));
}

#[test_log::test]
fn convergence_tracking() {
    let mut config = triangle();
    config.add_event(400.0, EventKind::StartTrackTime);
    link_down(&mut config, 500.0, 2, 3);
    config.add_event(
        900.0,
        EventKind::StopTrackTime {
            label: "failure".to_string(),
        },
    );
    let net = run(&config);
    let records = net.convergence_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].label, "failure");
    assert_eq!(records[0].start, 400.0);
    assert!(records[0].duration >= 100.0);
    assert!(records[0].duration <= 500.0);
}

#[test]
fn report() {
    let net = run(&triangle());
    let report = net.report();
    assert_eq!(report.ribs.len(), 3);
    assert_eq!(report.time, net.time());
    assert!(report.events > 0);
    assert_eq!(report.updates, net.update_counters());

    let r3 = report.ribs.iter().find(|r| r.router == "3.1").unwrap();
    assert_eq!(r3.asn, AsId(3));
    let child = r3.get(&p("1.0.0.0/24")).unwrap();
    assert_eq!(child.fwd_neighbors, vec![None]);
    assert!(child.as_path.is_empty());
    assert!(!child.filtered);
    let parent = r3.get(&p("1.0.0.0/22")).unwrap();
    assert_eq!(parent.as_path.len(), 1);

    let snapshot = net.rib_snapshot(RouterId::new(2)).unwrap();
    assert_eq!(&snapshot, r3);

    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"3.1\""));
}

#[test]
fn format_ribs() {
    let net = run(&triangle());
    let s = net.fmt_all_ribs();
    assert!(s.starts_with("Router: 1.1. Prefixes length: 2"));
    assert!(s.contains("RIB: 1.1*1.0.0.0/24{*>1.0.0.0/24 type: CUST #fwd_neighbors: 1"));
    assert!(s.contains("RIB: 3.1*1.0.0.0/24{*>1.0.0.0/24 type: LOCAL #fwd_neighbors: 1 neighbors: {self}"));
}

#[test]
fn mrai_limits_flapping_prefix() {
    let mut topo = AsTopology::new();
    topo.add_customer(1, 2);
    let mut config = standard_config(&topo);
    config.params.dragon.enabled = false;
    for i in 0..5 {
        let t = 1.0 + 2.0 * i as f64;
        announce(&mut config, t, 2, "1.0.0.0/24");
        config.add_event(
            t + 1.0,
            EventKind::WithdrawPrefix {
                router: "2.1".to_string(),
                prefix: p("1.0.0.0/24"),
            },
        );
    }
    config.add_event(11.0, EventKind::OutputUpdates);
    let net = run(&config);

    let key = ("2.1".to_string(), "1.1".to_string());
    let early = net.update_snapshots()[0]
        .counters
        .get(&key)
        .copied()
        .unwrap_or_default();
    assert!(early <= 1, "{early} updates within the first MRAI interval");
    assert!(net.update_counters().get(&key).copied().unwrap_or_default() <= 3);
    assert!(net.router_by_name("1.1").unwrap().rib(&p("1.0.0.0/24")).is_none());
}
