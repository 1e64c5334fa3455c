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

//! # DRAGON
//!
//! This module contains the DRAGON consistency filter. A router may stop advertising a prefix
//! (the child) if it advertises a covering prefix (the parent) that is at least as good. In
//! route-consistency mode, the child is filtered if its route class is not better than the one
//! of the parent. In forwarding-consistency mode, the child is only filtered if, in addition, all
//! forwarding neighbors of the child are also forwarding neighbors of the parent.
//!
//! The module also contains the logic of the originating routers: computing the announcements for
//! their own allocated prefixes (de-aggregating them if parts become unreachable), and computing
//! synthetic aggregates for prefixes learned from customers.

use crate::{
    aggregate::compute_covering_aggregate,
    bgp::Update,
    network::World,
    router::{FwdNeighbors, Router},
    types::{Ipv4Prefix, RouteClass, RouterId},
};

use itertools::Itertools;
use log::*;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeSet, HashMap, HashSet, VecDeque},
    str::FromStr,
};

/// Which consistency property DRAGON preserves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConsistencyMode {
    /// Route consistency (CR)
    #[default]
    Route,
    /// Forwarding consistency (CF)
    Forwarding,
}

impl FromStr for ConsistencyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "route" | "cr" => Ok(Self::Route),
            "forwarding" | "cf" => Ok(Self::Forwarding),
            x => Err(x.to_string()),
        }
    }
}

impl std::fmt::Display for ConsistencyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Route => "route",
            Self::Forwarding => "forwarding",
        })
    }
}

/// Outcome of comparing a child prefix with its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDecision {
    /// The child must not be advertised.
    Filter,
    /// The child must be advertised.
    Keep,
    /// The child must be advertised, and its forwarding neighbors must be extended by the given
    /// set (forwarding consistency only).
    KeepWithNeighbors(FwdNeighbors),
}

impl FilterDecision {
    /// Returns `true` if the child must not be advertised.
    pub fn is_filter(&self) -> bool {
        matches!(self, Self::Filter)
    }
}

/// Compare the route class and the forwarding neighbors of a child with those of its parent.
/// Lower classes are better.
pub fn check_consistency(
    mode: ConsistencyMode,
    child: (RouteClass, &FwdNeighbors),
    parent: (RouteClass, &FwdNeighbors),
) -> FilterDecision {
    let (child_class, child_fwd) = child;
    let (parent_class, parent_fwd) = parent;
    match mode {
        ConsistencyMode::Route if child_class >= parent_class => FilterDecision::Filter,
        ConsistencyMode::Route => FilterDecision::Keep,
        ConsistencyMode::Forwarding if child_class > parent_class => FilterDecision::Filter,
        ConsistencyMode::Forwarding if child_class == parent_class => {
            if child_fwd.is_subset(parent_fwd) {
                FilterDecision::Filter
            } else {
                FilterDecision::KeepWithNeighbors(child_fwd.union(parent_fwd).copied().collect())
            }
        }
        ConsistencyMode::Forwarding => FilterDecision::Keep,
    }
}

/// Global registry of all prefixes that are allocated to (announced by) some router.
#[derive(Debug, Clone, Default)]
pub struct PrefixRegistry {
    allocated: BTreeSet<Ipv4Prefix>,
    owners: HashMap<RouterId, BTreeSet<Ipv4Prefix>>,
    descendants: HashMap<Ipv4Prefix, Vec<Ipv4Prefix>>,
    parentless: HashSet<Ipv4Prefix>,
}

impl PrefixRegistry {
    /// Register that `router` is the owner of `prefix`. Call [`PrefixRegistry::finalize`] once all
    /// prefixes are registered.
    pub fn register(&mut self, router: RouterId, prefix: Ipv4Prefix) {
        self.allocated.insert(prefix);
        self.owners.entry(router).or_default().insert(prefix);
    }

    /// Compute the descendants and the parentless prefixes.
    pub fn finalize(&mut self) {
        self.descendants = self
            .allocated
            .iter()
            .map(|p| {
                let children = self
                    .allocated
                    .iter()
                    .filter(|c| p.strictly_covers(c))
                    .copied()
                    .collect();
                (*p, children)
            })
            .collect();
        self.parentless = self
            .allocated
            .iter()
            .filter(|p| !self.allocated.iter().any(|x| x.strictly_covers(p)))
            .copied()
            .collect();
    }

    /// All allocated prefixes, sorted.
    pub fn allocated(&self) -> impl Iterator<Item = &Ipv4Prefix> {
        self.allocated.iter()
    }

    /// Prefixes owned by the router, sorted.
    pub fn own_prefixes(&self, router: RouterId) -> Vec<Ipv4Prefix> {
        self.owners
            .get(&router)
            .map(|x| x.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Returns `true` if `prefix` is equal to or covered by any prefix owned by `router`.
    pub fn is_covered_by_own(&self, router: RouterId, prefix: &Ipv4Prefix) -> bool {
        self.owners
            .get(&router)
            .map(|x| x.iter().any(|p| p.covers(prefix)))
            .unwrap_or(false)
    }

    /// All allocated prefixes strictly covered by `prefix`.
    pub fn descendants(&self, prefix: &Ipv4Prefix) -> &[Ipv4Prefix] {
        self.descendants
            .get(prefix)
            .map(|x| x.as_slice())
            .unwrap_or_default()
    }

    /// Returns `true` if `prefix` is allocated, and no other allocated prefix covers it.
    pub fn is_parentless(&self, prefix: &Ipv4Prefix) -> bool {
        self.parentless.contains(prefix)
    }
}

impl Router {
    /// Decide whether the prefix must be filtered, by comparing it with the closest covering
    /// prefix in the RIB. The prefix is never filtered if there is no covering prefix, or if the
    /// router originates that covering prefix itself. In forwarding-consistency mode, this may
    /// extend the forwarding neighbors of the prefix.
    pub(crate) fn should_filter(&mut self, prefix: Ipv4Prefix, w: &World) -> bool {
        let Some(parent) = self.rib_parent(prefix) else {
            return false;
        };
        let (Some(child), Some(parent_entry)) = (self.loc_rib.get(&prefix), self.loc_rib.get(&parent))
        else {
            return false;
        };
        log!(
            w.dragon_level(),
            "{} DRAGON. Comparing ({} {} {:?}) with ({} {} {:?})",
            self.name,
            prefix,
            child.class,
            child.fwd_neighbors,
            parent,
            parent_entry.class,
            parent_entry.fwd_neighbors
        );
        if self.origin.contains_key(&parent) {
            log!(
                w.dragon_level(),
                "{} DRAGON. Cannot filter {} as it originates {}",
                self.name,
                prefix,
                parent
            );
            return false;
        }
        match check_consistency(
            w.params.dragon.mode,
            (child.class, &child.fwd_neighbors),
            (parent_entry.class, &parent_entry.fwd_neighbors),
        ) {
            FilterDecision::Filter => true,
            FilterDecision::Keep => false,
            FilterDecision::KeepWithNeighbors(fwd) => {
                if let Some(child) = self.loc_rib.get_mut(&prefix) {
                    child.fwd_neighbors = fwd;
                }
                false
            }
        }
    }

    /// Stop advertising the prefix. All peers that have received the prefix get a withdrawal, and
    /// pending announcements are dropped. The RIB is left untouched.
    pub(crate) fn start_filtering(&mut self, prefix: Ipv4Prefix, w: &mut World) {
        if !self.filtered.insert(prefix) {
            log!(
                w.dragon_level(),
                "{} DRAGON. {} is already filtered",
                self.name,
                prefix
            );
            return;
        }
        log!(
            w.dragon_level(),
            "{} DRAGON. Start filtering {}",
            self.name,
            prefix
        );
        let router = self.router_id;
        for (pid, peer) in self.peers.iter_mut() {
            peer.dequeue(&prefix);
            if peer
                .rib_out
                .remove(&prefix)
                .map(|paths| !paths.is_empty())
                .unwrap_or(false)
            {
                w.send(router, *pid, Update::withdraw(prefix));
            }
        }
    }

    /// Resume advertising a filtered prefix to all peers.
    pub(crate) fn stop_filtering(&mut self, prefix: Ipv4Prefix, w: &mut World) {
        if self.filtered.remove(&prefix) {
            log!(
                w.dragon_level(),
                "{} DRAGON. Stop filtering {}",
                self.name,
                prefix
            );
            for pid in self.peers.keys().copied().collect_vec() {
                self.presend(pid, prefix, w);
            }
        }
    }

    /// Filter or unfilter the given prefixes depending on their current parent, and continue with
    /// all their descendants in the RIB.
    pub(crate) fn reevaluate_descendants(&mut self, start: Vec<Ipv4Prefix>, w: &mut World) {
        let mut todo: VecDeque<Ipv4Prefix> = start.into();
        while let Some(prefix) = todo.pop_front() {
            if !self.loc_rib.contains_key(&prefix) {
                continue;
            }
            if self.should_filter(prefix, w) {
                self.start_filtering(prefix, w);
            } else {
                self.stop_filtering(prefix, w);
            }
            todo.extend(self.rib_children(prefix));
        }
    }

    /// Announce an allocated prefix. A prefix nested in another prefix of the same router is
    /// announced as is. Otherwise, the router announces the part of the prefix that is reachable
    /// through itself or its customers, and withdraws what was announced before but is no longer
    /// part of it. Allocated children owned by other routers are never announced by this router.
    pub(crate) fn compute_local_announcements(&mut self, prefix: Ipv4Prefix, w: &mut World) {
        let own = w.registry.own_prefixes(self.router_id);
        if own.iter().any(|p| p.strictly_covers(&prefix)) {
            self.announce_prefix(prefix, w);
            return;
        }

        let mut delegated: HashSet<Ipv4Prefix> = HashSet::new();
        let children: Vec<(Ipv4Prefix, RouteClass)> = w
            .registry
            .descendants(&prefix)
            .iter()
            .map(|child| {
                let class = if own.contains(child) {
                    RouteClass::Local
                } else if w.params.dragon.disable_deaggregates {
                    delegated.insert(*child);
                    RouteClass::Customer
                } else {
                    let class = self
                        .loc_rib
                        .get(child)
                        .map(|e| e.class)
                        .unwrap_or(RouteClass::Unreachable);
                    if class != RouteClass::Local {
                        delegated.insert(*child);
                    }
                    class
                };
                (*child, class)
            })
            .collect();

        let new: BTreeSet<Ipv4Prefix> = compute_covering_aggregate(prefix, &children)
            .to_peers_providers
            .into_iter()
            .collect();
        let old = self.announced.insert(prefix, new.clone()).unwrap_or_default();

        log!(
            w.dragon_level(),
            "{} DRAGON. Local announcements for {}: {:?} -> {:?}",
            self.name,
            prefix,
            old,
            new
        );

        for p in old.difference(&new) {
            if !delegated.contains(p) {
                self.withdraw_prefix(*p, w);
            }
        }
        for p in new.difference(&old) {
            if !delegated.contains(p) {
                self.announce_prefix(*p, w);
            }
        }
    }

    /// Recompute the local announcements of all own prefixes that cover `prefix`.
    pub(crate) fn update_local(&mut self, prefix: Ipv4Prefix, w: &mut World) {
        for parent in w.registry.own_prefixes(self.router_id) {
            if parent.covers(&prefix) {
                log!(
                    w.dragon_level(),
                    "{} DRAGON. Recompute local announcements of {} due to {}",
                    self.name,
                    parent,
                    prefix
                );
                self.compute_local_announcements(parent, w);
            }
        }
    }

    /// Recompute the synthetic aggregates of prefixes learned from customers, and announce or
    /// withdraw them accordingly.
    pub(crate) fn compute_local_aggregates(&mut self, w: &mut World) {
        let mut new: BTreeSet<Ipv4Prefix> =
            self.aggregate_tree.customer_aggregates().into_iter().collect();
        if w.params.dragon.restrict_to_parentless {
            new.retain(|p| w.registry.is_parentless(p));
        }
        let old = std::mem::replace(&mut self.aggregated, new.clone());
        if old == new {
            return;
        }
        log!(
            w.dragon_level(),
            "{} DRAGON. Aggregates: {:?} -> {:?}",
            self.name,
            old,
            new
        );
        for p in old.difference(&new) {
            self.withdraw_prefix(*p, w);
        }
        for p in new.difference(&old) {
            self.announce_prefix(*p, w);
        }
    }
}
