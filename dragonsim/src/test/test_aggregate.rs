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
use crate::aggregate::{compute_covering_aggregate, exclude, AggregateTree};
use crate::types::{Ipv4Prefix, RouteClass::*};
use pretty_assertions::assert_eq;

fn prefixes(list: &[&str]) -> Vec<Ipv4Prefix> {
    let mut v: Vec<Ipv4Prefix> = list.iter().map(|x| p(x)).collect();
    v.sort();
    v
}

#[test]
fn tree_creates_ancestors() {
    let mut tree = AggregateTree::new();
    assert!(tree.is_empty());
    tree.insert(p("10.0.0.0/8"), Customer);
    assert_eq!(tree.len(), 9);
    assert_eq!(tree.get(&p("10.0.0.0/8")).unwrap().route_class, Customer);
    assert_eq!(tree.get(&p("8.0.0.0/6")).unwrap().route_class, Unreachable);
    assert_eq!(
        tree.get(&p("8.0.0.0/6")).unwrap().parent,
        Some(p("8.0.0.0/5"))
    );
    assert!(tree.get(&p("11.0.0.0/8")).is_none());
}

#[test]
fn sibling_customers_form_aggregate() {
    let mut tree = AggregateTree::new();
    tree.insert(p("10.0.0.0/24"), Customer);
    tree.insert(p("10.0.1.0/24"), Customer);
    assert_eq!(tree.aggregates(), vec![(p("10.0.0.0/23"), Customer)]);
    assert_eq!(tree.customer_aggregates(), vec![p("10.0.0.0/23")]);
}

#[test]
fn known_aggregate_is_not_reported() {
    let mut tree = AggregateTree::new();
    tree.insert(p("10.0.0.0/24"), Customer);
    tree.insert(p("10.0.1.0/24"), Customer);
    tree.insert(p("10.0.0.0/23"), Customer);
    assert!(tree.aggregates().is_empty());
}

#[test]
fn aggregate_takes_worst_class() {
    let mut tree = AggregateTree::new();
    tree.insert(p("10.0.0.0/24"), Customer);
    tree.insert(p("10.0.1.0/24"), Peer);
    assert_eq!(tree.aggregates(), vec![(p("10.0.0.0/23"), Peer)]);
    assert!(tree.customer_aggregates().is_empty());
}

#[test]
fn lost_prefix_breaks_aggregate() {
    let mut tree = AggregateTree::new();
    tree.insert(p("10.0.0.0/24"), Customer);
    tree.insert(p("10.0.1.0/24"), Customer);
    assert_eq!(tree.customer_aggregates(), vec![p("10.0.0.0/23")]);
    tree.insert(p("10.0.1.0/24"), Unreachable);
    assert!(tree.aggregates().is_empty());
    assert!(tree.get(&p("10.0.1.0/24")).is_some());
}

#[test]
fn covering_all_customers() {
    let agg = compute_covering_aggregate(
        p("10.0.0.0/20"),
        &[(p("10.0.0.0/24"), Customer), (p("10.0.1.0/24"), Customer)],
    );
    assert_eq!(agg.to_customers, prefixes(&["10.0.0.0/20"]));
    assert_eq!(agg.to_peers_providers, prefixes(&["10.0.0.0/20"]));
}

#[test]
fn covering_all_peers() {
    let agg = compute_covering_aggregate(
        p("10.0.0.0/20"),
        &[(p("10.0.0.0/24"), Peer), (p("10.0.1.0/24"), Peer)],
    );
    assert_eq!(agg.to_customers, prefixes(&["10.0.0.0/20"]));
    assert_eq!(
        agg.to_peers_providers,
        prefixes(&["10.0.8.0/21", "10.0.4.0/22", "10.0.2.0/23"])
    );
}

#[test]
fn covering_mixed_classes() {
    for other in [Peer, Provider] {
        let agg = compute_covering_aggregate(
            p("10.0.0.0/20"),
            &[(p("10.0.0.0/24"), Customer), (p("10.0.1.0/24"), other)],
        );
        assert_eq!(agg.to_customers, prefixes(&["10.0.0.0/20"]));
        assert_eq!(
            agg.to_peers_providers,
            prefixes(&["10.0.0.0/24", "10.0.8.0/21", "10.0.4.0/22", "10.0.2.0/23"])
        );
    }
}

#[test]
fn covering_with_unreachable() {
    let agg = compute_covering_aggregate(
        p("10.0.0.0/20"),
        &[(p("10.0.0.0/24"), Peer), (p("10.0.1.0/24"), Unreachable)],
    );
    assert_eq!(
        agg.to_customers,
        prefixes(&["10.0.0.0/24", "10.0.8.0/21", "10.0.4.0/22", "10.0.2.0/23"])
    );
    assert_eq!(
        agg.to_peers_providers,
        prefixes(&["10.0.8.0/21", "10.0.4.0/22", "10.0.2.0/23"])
    );

    let agg = compute_covering_aggregate(
        p("10.0.0.0/20"),
        &[(p("10.0.0.0/24"), Unreachable), (p("10.0.1.0/24"), Unreachable)],
    );
    let expected = prefixes(&["10.0.8.0/21", "10.0.4.0/22", "10.0.2.0/23"]);
    assert_eq!(agg.to_customers, expected);
    assert_eq!(agg.to_peers_providers, expected);
}

#[test]
fn covering_ignores_outside_children() {
    let agg = compute_covering_aggregate(
        p("10.0.0.0/20"),
        &[(p("10.1.0.0/24"), Unreachable), (p("10.0.0.0/20"), Peer)],
    );
    assert_eq!(agg.to_customers, prefixes(&["10.0.0.0/20"]));
    assert_eq!(agg.to_peers_providers, prefixes(&["10.0.0.0/20"]));
}

#[test]
fn exclude_partitions_block() {
    let block = p("10.0.0.0/16");
    let holes = prefixes(&["10.0.3.0/24", "10.0.128.0/17", "10.0.64.0/26"]);
    let rest = exclude(block, &holes);

    // rest and holes are disjoint and together cover the whole block
    let mut size: u64 = 0;
    for r in rest.iter() {
        assert!(block.covers(r));
        assert!(holes.iter().all(|h| !h.overlaps(r)));
        size += 1 << (32 - r.prefix_len());
    }
    for h in holes.iter() {
        size += 1 << (32 - h.prefix_len());
    }
    assert_eq!(size, 1 << 16);

    // no two remaining prefixes can be merged
    assert_eq!(Ipv4Prefix::collapse(&rest), rest);
}

#[test]
fn exclude_whole_block() {
    assert!(exclude(p("10.0.0.0/16"), &[p("10.0.0.0/8")]).is_empty());
    assert_eq!(exclude(p("10.0.0.0/16"), &[]), vec![p("10.0.0.0/16")]);
}
