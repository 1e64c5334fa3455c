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

//! Module containing definitions for BGP paths, updates and sessions, including the best-path
//! selection order.

use crate::types::{AsId, Ipv4Prefix, RouteClass, RouterId};

use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, str::FromStr};

/// Alternative flag of a path. Backup paths are only selected if no other path is available.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Alternative {
    /// Regular path
    #[default]
    None,
    /// An alternative exists for this path.
    Exist,
    /// This path is a backup path.
    Backup,
}

/// Route attributes of a single path towards a prefix.
/// The following attributes are omitted
/// - ORIGIN: assumed to be always set to IGP
/// - ATOMIC_AGGREGATE and AGGREGATOR: not used
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Path {
    /// Local weight, the most preferred attribute. Never exported.
    pub weight: u32,
    /// LOCAL-PREF. `None` on paths exchanged over eBGP sessions.
    pub local_pref: Option<u32>,
    /// MED (Multi-Exit Discriminator)
    pub med: u32,
    /// IGP cost towards the next-hop. `None` on paths exchanged over eBGP sessions.
    pub igp_cost: Option<u32>,
    /// NEXT-HOP
    pub next_hop: RouterId,
    /// AS-PATH, where the origin of the route is last, and the ID of a new AS is prepended.
    pub as_path: Vec<AsId>,
    /// Communities. The first community encodes the [`RouteClass`].
    pub communities: Vec<u32>,
    /// Alternative flag
    pub alternative: Alternative,
    /// Peer from which the path was learned. `None` for locally originated paths.
    pub source: Option<RouterId>,
}

impl Path {
    /// Create the path of a locally originated prefix.
    pub fn originated(router: RouterId, weight: u32, local_pref: u32) -> Self {
        Self {
            weight,
            local_pref: Some(local_pref),
            med: 0,
            igp_cost: None,
            next_hop: router,
            as_path: Vec::new(),
            communities: vec![RouteClass::Local.community()],
            alternative: Alternative::None,
            source: None,
        }
    }

    /// Get the route class encoded in the first community. A path without any community is
    /// treated as [`RouteClass::Provider`].
    pub fn class(&self) -> RouteClass {
        self.communities
            .first()
            .map(|c| RouteClass::from_community(*c))
            .unwrap_or_default()
    }

    /// Size of the path in bytes, as used for computing the transmission delay.
    pub fn size(&self) -> usize {
        16 + 4 * self.communities.len() + 2 * self.as_path.len()
    }

    /// BGP best-path selection. Returns `Ordering::Less` if `self` is preferred over `other`. The
    /// following rules are applied in order:
    ///
    /// 1. If either path is a backup, the non-backup path wins.
    /// 2. Higher weight
    /// 3. Higher LOCAL-PREF (unset is worse than any value)
    /// 4. Shorter AS-PATH
    /// 5. Lower MED, if both AS paths start with the same AS (or `always_compare_med` is set)
    /// 6. Lower IGP cost (unset is worse than any value)
    /// 7. Lower next-hop
    ///
    /// Any remaining tie between distinct paths is broken by comparing the AS path, MED,
    /// communities, source and alternative flag, which makes the order total.
    pub fn selection_order(&self, other: &Self, always_compare_med: bool) -> Ordering {
        if (self.alternative == Alternative::Backup || other.alternative == Alternative::Backup)
            && self.alternative != other.alternative
        {
            return self.alternative.cmp(&other.alternative);
        }

        match other.weight.cmp(&self.weight) {
            Ordering::Equal => {}
            o => return o,
        }

        match other.local_pref.cmp(&self.local_pref) {
            Ordering::Equal => {}
            o => return o,
        }

        match self.as_path.len().cmp(&other.as_path.len()) {
            Ordering::Equal => {}
            o => return o,
        }

        if let (Some(a), Some(b)) = (self.as_path.first(), other.as_path.first()) {
            if always_compare_med || a == b {
                match self.med.cmp(&other.med) {
                    Ordering::Equal => {}
                    o => return o,
                }
            }
        }

        match (self.igp_cost, other.igp_cost) {
            (Some(a), Some(b)) if a != b => return a.cmp(&b),
            (Some(_), None) => return Ordering::Less,
            (None, Some(_)) => return Ordering::Greater,
            _ => {}
        }

        match self.next_hop.cmp(&other.next_hop) {
            Ordering::Equal => {}
            o => return o,
        }

        self.as_path
            .cmp(&other.as_path)
            .then(self.med.cmp(&other.med))
            .then_with(|| self.communities.cmp(&other.communities))
            .then(self.source.cmp(&other.source))
            .then(self.alternative.cmp(&other.alternative))
    }

    /// Returns `true` if advertising `other` instead of `self` would not change anything for the
    /// receiver. Two paths are equivalent if they are equal in the [`Path::selection_order`], and
    /// if they have the same alternative flag.
    pub fn advertisement_equivalence(&self, other: &Self, always_compare_med: bool) -> bool {
        self.selection_order(other, always_compare_med) == Ordering::Equal
            && self.alternative == other.alternative
    }
}

/// BGP update message, carrying either a withdrawal (no paths), or a set of paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Update {
    /// The prefix
    pub prefix: Ipv4Prefix,
    /// Paths towards the prefix. Empty for a withdrawal.
    pub paths: Vec<Path>,
}

impl Update {
    /// Create a withdrawal for the given prefix.
    pub fn withdraw(prefix: Ipv4Prefix) -> Self {
        Self {
            prefix,
            paths: Vec::new(),
        }
    }

    /// Returns `true` if the update withdraws the prefix.
    pub fn is_withdrawal(&self) -> bool {
        self.paths.is_empty()
    }

    /// Size of the update in bytes.
    pub fn size(&self) -> usize {
        4 + self.paths.iter().map(Path::size).sum::<usize>()
    }
}

/// Type of a BGP session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionType {
    /// iBGP session, both routers are in the same AS.
    IBgp,
    /// eBGP session
    EBgp,
}

impl SessionType {
    /// returns true if the session type is EBgp
    pub fn is_ebgp(&self) -> bool {
        matches!(self, Self::EBgp)
    }

    /// returns true if the session type is IBgp
    pub fn is_ibgp(&self) -> bool {
        !self.is_ebgp()
    }
}

impl std::fmt::Display for SessionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionType::IBgp => write!(f, "iBGP"),
            SessionType::EBgp => write!(f, "eBGP"),
        }
    }
}

/// Business relationship with an eBGP neighbor, seen from the local router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relationship {
    /// The neighbor is a customer.
    Customer,
    /// The neighbor is a settlement-free peer.
    Peer,
    /// The neighbor is a provider.
    Provider,
}

impl Relationship {
    /// Route class of the paths learned over a session with this relationship.
    pub fn class(&self) -> RouteClass {
        match self {
            Self::Customer => RouteClass::Customer,
            Self::Peer => RouteClass::Peer,
            Self::Provider => RouteClass::Provider,
        }
    }

    /// The relationship as seen from the neighbor.
    pub fn reverse(&self) -> Self {
        match self {
            Self::Customer => Self::Provider,
            Self::Peer => Self::Peer,
            Self::Provider => Self::Customer,
        }
    }
}

impl FromStr for Relationship {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cust" | "customer" => Ok(Self::Customer),
            "peer" => Ok(Self::Peer),
            "prov" | "provider" => Ok(Self::Provider),
            x => Err(x.to_string()),
        }
    }
}

impl std::fmt::Display for Relationship {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Customer => "cust",
            Self::Peer => "peer",
            Self::Provider => "prov",
        })
    }
}
