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

//! # Aggregation Engine
//!
//! This module contains the binary prefix tree that every router uses to find aggregates for
//! the prefixes it has learned, and the computation of the covering announcements of a parent
//! prefix whose children are only partially reachable.

use crate::types::{Ipv4Prefix, RouteClass};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Minimal number of prefixes that an aggregate must cover.
const MIN_COVERED_PREFIXES: usize = 2;

/// A single node of the [`AggregateTree`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateNode {
    /// Parent node (one bit shorter). `None` only for the root `0.0.0.0/0`.
    pub parent: Option<Ipv4Prefix>,
    /// The two halves of this prefix, if they exist in the tree.
    pub children: [Option<Ipv4Prefix>; 2],
    /// Class of the route towards this prefix.
    pub route_class: RouteClass,
    /// Worst class of all prefixes covered by this node.
    pub phi: RouteClass,
    /// Number of prefixes covered by this node.
    pub covered: usize,
}

impl AggregateNode {
    fn new(parent: Option<Ipv4Prefix>) -> Self {
        Self {
            parent,
            children: [None, None],
            route_class: RouteClass::Unreachable,
            phi: RouteClass::Unreachable,
            covered: 1,
        }
    }
}

/// Binary tree of prefixes, stored in an arena indexed by the prefix. Every node that exists in
/// the tree has all its ancestors up to `0.0.0.0/0` in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateTree {
    nodes: HashMap<Ipv4Prefix, AggregateNode>,
}

impl Default for AggregateTree {
    fn default() -> Self {
        Self::new()
    }
}

impl AggregateTree {
    /// Create a new tree, only containing the root.
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(Ipv4Prefix::default(), AggregateNode::new(None));
        Self { nodes }
    }

    /// Get the node of a prefix.
    pub fn get(&self, prefix: &Ipv4Prefix) -> Option<&AggregateNode> {
        self.nodes.get(prefix)
    }

    /// Number of nodes in the tree, including the intermediate ones.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the tree only contains the root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Set the route class of a prefix, creating the node and all missing ancestors. Inserting a
    /// prefix as [`RouteClass::Unreachable`] marks it as lost without removing it.
    pub fn insert(&mut self, prefix: Ipv4Prefix, class: RouteClass) {
        let mut current = Ipv4Prefix::default();
        for idx in 0..prefix.prefix_len() {
            let bit = prefix.bit(idx) as usize;
            let next = self.nodes.get(&current).and_then(|n| n.children[bit]);
            let next = match next {
                Some(next) => next,
                None => {
                    let Some((left, right)) = current.halves() else {
                        break;
                    };
                    let next = if bit == 0 { left } else { right };
                    self.nodes.insert(next, AggregateNode::new(Some(current)));
                    if let Some(node) = self.nodes.get_mut(&current) {
                        node.children[bit] = Some(next);
                    }
                    next
                }
            };
            current = next;
        }
        if let Some(node) = self.nodes.get_mut(&prefix) {
            node.route_class = class;
            node.phi = class;
        }
    }

    /// Nodes of the tree in post-order (children before their parents).
    fn postorder(&self) -> Vec<Ipv4Prefix> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![Ipv4Prefix::default()];
        while let Some(p) = stack.pop() {
            order.push(p);
            if let Some(node) = self.nodes.get(&p) {
                stack.extend(node.children.iter().flatten().copied());
            }
        }
        order.reverse();
        order
    }

    /// Compute all aggregates, together with the class of the aggregate. A node with both
    /// children gets the worst class of its children, and the number of prefixes covered by both.
    /// A node is reported as an aggregate if its aggregated class is better than its own route
    /// class and better than the aggregated class of its parent, and if it covers at least two
    /// prefixes.
    pub fn aggregates(&mut self) -> Vec<(Ipv4Prefix, RouteClass)> {
        let order = self.postorder();

        for p in order.iter() {
            let children = self.nodes.get(p).map(|n| n.children);
            let Some([Some(a), Some(b)]) = children else {
                continue;
            };
            let (Some(a), Some(b)) = (self.nodes.get(&a), self.nodes.get(&b)) else {
                continue;
            };
            let phi = a.phi.max(b.phi);
            let covered = a.covered + b.covered;
            if let Some(node) = self.nodes.get_mut(p) {
                node.phi = phi;
                node.covered = covered;
            }
        }

        order
            .into_iter()
            .filter_map(|p| {
                let node = self.nodes.get(&p)?;
                let below_parent = match node.parent.and_then(|x| self.nodes.get(&x)) {
                    Some(parent) => node.phi < parent.phi,
                    None => true,
                };
                (below_parent
                    && node.phi < node.route_class
                    && node.covered >= MIN_COVERED_PREFIXES)
                    .then_some((p, node.phi))
            })
            .collect()
    }

    /// Compute all aggregates that only cover customer routes.
    pub fn customer_aggregates(&mut self) -> Vec<Ipv4Prefix> {
        let mut result: Vec<Ipv4Prefix> = self
            .aggregates()
            .into_iter()
            .filter(|(_, class)| *class == RouteClass::Customer)
            .map(|(p, _)| p)
            .collect();
        result.sort();
        result
    }
}

/// Prefixes that a router announces for an allocated parent prefix, depending on who receives
/// the announcement.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CoveringAggregate {
    /// Covering set for customers: the parent without all unreachable children.
    pub to_customers: Vec<Ipv4Prefix>,
    /// Covering set for peers and providers: the parent without all children whose class is
    /// neither local nor customer.
    pub to_peers_providers: Vec<Ipv4Prefix>,
}

/// Compute the minimal sets of prefixes that cover `parent` except for the excluded children.
/// Children outside of `parent` are ignored.
pub fn compute_covering_aggregate(
    parent: Ipv4Prefix,
    children: &[(Ipv4Prefix, RouteClass)],
) -> CoveringAggregate {
    let children: Vec<(Ipv4Prefix, RouteClass)> = children
        .iter()
        .copied()
        .filter(|(c, _)| parent.strictly_covers(c))
        .collect();

    let unreachable: Vec<Ipv4Prefix> = children
        .iter()
        .filter(|(_, class)| *class == RouteClass::Unreachable)
        .map(|(p, _)| *p)
        .collect();
    let not_exportable: Vec<Ipv4Prefix> = children
        .iter()
        .filter(|(_, class)| !class.is_customer_or_local())
        .map(|(p, _)| *p)
        .collect();

    CoveringAggregate {
        to_customers: exclude(parent, &unreachable),
        to_peers_providers: exclude(parent, &not_exportable),
    }
}

/// Compute the minimal set of prefixes that covers `block` without any address of `holes`.
/// Every block is bisected until each half either is disjoint from all holes (kept), or contained
/// in one of them (dropped).
pub fn exclude(block: Ipv4Prefix, holes: &[Ipv4Prefix]) -> Vec<Ipv4Prefix> {
    let mut result = Vec::new();
    let mut stack = vec![block];
    while let Some(b) = stack.pop() {
        if holes.iter().any(|h| h.covers(&b)) {
            continue;
        }
        if !holes.iter().any(|h| b.covers(h)) {
            result.push(b);
            continue;
        }
        if let Some((left, right)) = b.halves() {
            stack.push(right);
            stack.push(left);
        }
    }
    Ipv4Prefix::collapse(&result)
}
