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

//! Module containing helper functions to get formatted strings and print information about the
//! simulation. Router ids are only meaningful together with the [`World`], which knows their
//! names.

use std::fmt::Write;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    bgp::{Path, Update},
    event::Event,
    network::{Network, World},
    route_map::{CommunityAction, CommunityMatch, RouteMap, RouteMapMatch, RouteMapSet},
    router::{FwdNeighbors, RibEntry, Router},
    types::{AsId, Ipv4Prefix, RouteClass, RouterId},
};

/// Trait to format a type that contains router ids.
pub trait NetworkFormatter<'a, 'n> {
    /// Type that is returned, which implements `std::fmt::Display`.
    type Formatter;

    /// Return a struct that can be formatted and displayed. Unknown router ids are written as
    /// `?`.
    fn fmt(&'a self, w: &'n World) -> Self::Formatter;
}

impl<'a, 'n> NetworkFormatter<'a, 'n> for RouterId {
    type Formatter = &'n str;

    fn fmt(&'a self, w: &'n World) -> Self::Formatter {
        w.router_name(*self)
    }
}

impl<'a, 'n> NetworkFormatter<'a, 'n> for Option<RouterId> {
    type Formatter = &'n str;

    fn fmt(&'a self, w: &'n World) -> Self::Formatter {
        match self {
            Some(r) => w.router_name(*r),
            None => "self",
        }
    }
}

impl<'a, 'n> NetworkFormatter<'a, 'n> for FwdNeighbors {
    type Formatter = String;

    fn fmt(&'a self, w: &'n World) -> Self::Formatter {
        format!("{{{}}}", self.iter().map(|r| r.fmt(w)).join(", "))
    }
}

impl<'a, 'n> NetworkFormatter<'a, 'n> for Path {
    type Formatter = String;

    fn fmt(&'a self, w: &'n World) -> Self::Formatter {
        let mut s = format!(
            "path: [{}], next hop: {}",
            self.as_path.iter().map(|a| a.0).join(" "),
            self.next_hop.fmt(w)
        );
        if let Some(lp) = self.local_pref {
            let _ = write!(s, ", local pref: {lp}");
        }
        if self.med != 0 {
            let _ = write!(s, ", MED: {}", self.med);
        }
        if let Some(cost) = self.igp_cost {
            let _ = write!(s, ", cost: {cost}");
        }
        if !self.communities.is_empty() {
            let _ = write!(s, ", communities: {{{}}}", self.communities.iter().join(", "));
        }
        format!("{{ {s} }}")
    }
}

impl<'a, 'n> NetworkFormatter<'a, 'n> for RibEntry {
    type Formatter = String;

    fn fmt(&'a self, w: &'n World) -> Self::Formatter {
        format!(
            "type: {} #fwd_neighbors: {} neighbors: {} best: {}",
            self.class,
            self.fwd_neighbors.len(),
            self.fwd_neighbors.fmt(w),
            self.best.fmt(w)
        )
    }
}

impl<'a, 'n> NetworkFormatter<'a, 'n> for Update {
    type Formatter = String;

    fn fmt(&'a self, w: &'n World) -> Self::Formatter {
        if self.is_withdrawal() {
            format!("WITHDRAW {}", self.prefix)
        } else {
            format!(
                "UPDATE {} {}",
                self.prefix,
                self.paths.iter().map(|p| p.fmt(w)).join(", ")
            )
        }
    }
}

impl<'a, 'n> NetworkFormatter<'a, 'n> for Event {
    type Formatter = String;

    fn fmt(&'a self, w: &'n World) -> Self::Formatter {
        match self {
            Event::Terminate => "Terminate".to_string(),
            Event::MraiExpire {
                router,
                peer,
                prefix,
            } => match prefix {
                Some(p) => format!("MRAI {} -> {} ({p}) expired", router.fmt(w), peer.fmt(w)),
                None => format!("MRAI {} -> {} expired", router.fmt(w), peer.fmt(w)),
            },
            Event::DecisionProcess { router, prefix } => {
                format!("Decision process of {} for {prefix}", router.fmt(w))
            }
            Event::Receive { from, to, update } => {
                format!("{} -> {}: {}", from.fmt(w), to.fmt(w), update.fmt(w))
            }
            Event::LinkDown(a, b) => format!("Link {} -- {} down", a.fmt(w), b.fmt(w)),
            Event::LinkUp(a, b) => format!("Link {} -- {} up", a.fmt(w), b.fmt(w)),
            Event::Announce { router, prefix } => {
                format!("{} announces {prefix}", router.fmt(w))
            }
            Event::Withdraw { router, prefix } => format!("{} withdraws {prefix}", router.fmt(w)),
            Event::ShowAllRibs => "Show all RIBs".to_string(),
            Event::ResetCounters => "Reset update counters".to_string(),
            Event::ActivateDeaggregates => "Activate de-aggregates".to_string(),
            Event::SnapshotUpdates => "Snapshot update counters".to_string(),
            Event::ActivateDebug => "Activate debug output".to_string(),
            Event::StartTrackTime => "Start tracking time".to_string(),
            Event::StopTrackTime(label) => format!("Stop tracking time ({label})"),
        }
    }
}

fn fmt_communities(list: &[u32]) -> String {
    list.iter().join(":")
}

impl std::fmt::Display for RouteMapMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Community(CommunityMatch::Contains(c)) => write!(f, "match community-list {c}"),
            Self::Community(CommunityMatch::Any(l)) => {
                write!(f, "match community-list {} any", fmt_communities(l))
            }
            Self::Community(CommunityMatch::Exact(l)) => {
                write!(f, "match community-list {} exact", fmt_communities(l))
            }
            Self::AsPath(regex) => write!(f, "match as-path {}", regex.pattern()),
            Self::Prefix(p) => write!(f, "match ip address {p}"),
            Self::Metric(m) => write!(f, "match metric {m}"),
        }
    }
}

impl std::fmt::Display for RouteMapSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LocalPref(lp) => write!(f, "set local-preference {lp}"),
            Self::Community(CommunityAction::None) => write!(f, "set community none"),
            Self::Community(CommunityAction::Additive(l)) => {
                write!(f, "set community {} additive", fmt_communities(l))
            }
            Self::Community(CommunityAction::Replace(l)) => {
                write!(f, "set community {}", fmt_communities(l))
            }
            Self::PrependAsPath(ases) => {
                write!(f, "set as-path prepend {}", ases.iter().map(|a| a.0).join(" "))
            }
            Self::Med(m) => write!(f, "set metric {m}"),
        }
    }
}

impl std::fmt::Display for RouteMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "route-map {} {} {}",
            self.name,
            if self.state.is_allow() { "permit" } else { "deny" },
            self.order
        )?;
        for cond in self.conds.iter() {
            write!(f, "\n {cond}")?;
        }
        for set in self.set.iter() {
            write!(f, "\n {set}")?;
        }
        Ok(())
    }
}

impl Router {
    /// Format the Loc-RIB entry of a prefix, marking filtered prefixes.
    pub fn fmt_rib(&self, prefix: Ipv4Prefix, w: &World) -> String {
        let mut s = format!("{} RIB: {}*{}", w.time(), self.name(), prefix);
        if let Some(entry) = self.rib(&prefix) {
            let filtered = if self.is_filtered(&prefix) {
                "[FILTERED]"
            } else {
                ""
            };
            let _ = write!(s, "{{*>{prefix}{filtered} {}}}", entry.fmt(w));
        }
        s
    }

    /// Format the entire Loc-RIB of the router.
    pub fn fmt_all_ribs(&self, w: &World) -> String {
        let mut s = format!("Router: {}. Prefixes length: {}", self.name(), self.rib_len());
        for (prefix, _) in self.rib_entries() {
            let _ = write!(s, "\n{}", self.fmt_rib(*prefix, w));
        }
        s
    }
}

impl Network {
    /// Format the Loc-RIB of all routers, sorted by their AS number and name.
    pub fn fmt_all_ribs(&self) -> String {
        self.routers()
            .sorted_by(|a, b| (a.as_id(), a.name()).cmp(&(b.as_id(), b.name())))
            .map(|r| r.fmt_all_ribs(self.world()))
            .join("\n")
    }
}

/// Serializable entry of a [`RibSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RibSnapshotEntry {
    /// The prefix
    pub prefix: Ipv4Prefix,
    /// Route class of the best path
    pub class: RouteClass,
    /// AS path of the best path
    pub as_path: Vec<AsId>,
    /// Names of the forwarding neighbors. `None` stands for the router itself.
    pub fwd_neighbors: Vec<Option<String>>,
    /// The prefix is not propagated to any peer.
    pub filtered: bool,
}

/// Serializable view of the Loc-RIB of a router, with router ids replaced by their names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RibSnapshot {
    /// Name of the router
    pub router: String,
    /// AS of the router
    pub asn: AsId,
    /// All Loc-RIB entries, sorted by prefix.
    pub entries: Vec<RibSnapshotEntry>,
}

impl RibSnapshot {
    /// Take a snapshot of the Loc-RIB of the router.
    pub fn new(router: &Router, w: &World) -> Self {
        let entries = router
            .rib_entries()
            .map(|(prefix, entry)| RibSnapshotEntry {
                prefix: *prefix,
                class: entry.class,
                as_path: entry.best.as_path.clone(),
                fwd_neighbors: entry
                    .fwd_neighbors
                    .iter()
                    .map(|n| n.map(|r| w.router_name(r).to_string()))
                    .collect(),
                filtered: router.is_filtered(prefix),
            })
            .sorted_by_key(|e| e.prefix)
            .collect();
        Self {
            router: router.name().to_string(),
            asn: router.as_id(),
            entries,
        }
    }

    /// Get the entry of a prefix.
    pub fn get(&self, prefix: &Ipv4Prefix) -> Option<&RibSnapshotEntry> {
        self.entries.iter().find(|e| &e.prefix == prefix)
    }
}
