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

//! # Route-Maps
//!
//! This module contains the route maps that can be attached to a BGP session in either direction.
//! A route map without any set action acts as a filter: a `deny` map rejects all matching paths,
//! and a `permit` map rejects all paths that do not match. A `permit` route map with set actions
//! never rejects a path; it only transforms the paths it matches. Use the [`RouteMapBuilder`] to
//! conveniently build a route map:
//!
//! ```
//! # use dragonsim::route_map::*;
//! let map = RouteMapBuilder::new("from-cust")
//!     .allow()
//!     .set_community(1)
//!     .set_local_pref(100)
//!     .build();
//! ```

use crate::{
    bgp::Path,
    types::{AsId, ConfigError, Ipv4Prefix},
};

use itertools::Itertools;
use regex::Regex;
use serde::{de::Error, Deserialize, Serialize};

/// Default priority of a route map.
pub const DEFAULT_PRIORITY: i16 = 10;

/// # Main RouteMap structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteMap {
    /// Name of the route map, as referenced by the neighbor configuration.
    pub name: String,
    /// In which order should the route maps be checked. Lower values mean that they are checked
    /// earlier.
    pub order: i16,
    /// Either Allow or Deny.
    pub state: RouteMapState,
    /// Match statements of the RouteMap, connected in an and
    pub conds: Vec<RouteMapMatch>,
    /// Set actions of the RouteMap
    pub set: Vec<RouteMapSet>,
}

impl RouteMap {
    /// Generate a new route map
    pub fn new(
        name: impl Into<String>,
        order: i16,
        state: RouteMapState,
        conds: Vec<RouteMapMatch>,
        set: Vec<RouteMapSet>,
    ) -> Self {
        Self {
            name: name.into(),
            order,
            state,
            conds,
            set,
        }
    }

    /// Returns wether the Route Map matches the given path
    pub fn matches(&self, prefix: &Ipv4Prefix, path: &Path) -> bool {
        self.conds.iter().all(|c| c.matches(prefix, path))
    }

    /// Returns `true` if the route map has no set actions, and thus acts as a filter.
    pub fn is_filter(&self) -> bool {
        self.set.is_empty()
    }

    /// Returns `true` if the route map is a filter that rejects the path.
    pub fn rejects(&self, prefix: &Ipv4Prefix, path: &Path) -> bool {
        self.is_filter()
            && match self.state {
                RouteMapState::Allow => !self.matches(prefix, path),
                RouteMapState::Deny => self.matches(prefix, path),
            }
    }

    /// Apply the set actions on the path, if the route map allows and matches the path.
    pub fn transform(&self, prefix: &Ipv4Prefix, path: &mut Path) {
        if self.state.is_allow() && !self.is_filter() && self.matches(prefix, path) {
            self.set.iter().for_each(|s| s.apply(path));
        }
    }
}

/// Trait that exposes functions to apply a sorted list of route-maps on a path.
pub trait RouteMapList {
    /// Returns `true` if any filtering route map of the sequence rejects the path.
    fn rejects(self, prefix: &Ipv4Prefix, path: &Path) -> bool;

    /// Apply all transforming route maps of the sequence, in order. The sequence **must be
    /// sorted** by the route-map order.
    fn transform(self, prefix: &Ipv4Prefix, path: Path) -> Path;
}

impl<'a, I> RouteMapList for I
where
    I: IntoIterator<Item = &'a RouteMap>,
{
    fn rejects(self, prefix: &Ipv4Prefix, path: &Path) -> bool {
        self.into_iter().any(|map| map.rejects(prefix, path))
    }

    fn transform(self, prefix: &Ipv4Prefix, mut path: Path) -> Path {
        for map in self {
            map.transform(prefix, &mut path);
        }
        path
    }
}

/// # Route Map Builder
///
/// Convenience type to build a route map. If neither [`Self::allow`] nor [`Self::deny`] is
/// called, the route map permits. If no order is given, [`DEFAULT_PRIORITY`] is used.
#[derive(Debug)]
pub struct RouteMapBuilder {
    name: String,
    order: i16,
    state: RouteMapState,
    conds: Vec<RouteMapMatch>,
    set: Vec<RouteMapSet>,
}

impl RouteMapBuilder {
    /// Create an empty RouteMapBuilder
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            order: DEFAULT_PRIORITY,
            state: RouteMapState::Allow,
            conds: Vec::new(),
            set: Vec::new(),
        }
    }

    /// Set the order of the Route-Map.
    pub fn order(&mut self, order: i16) -> &mut Self {
        self.order = order;
        self
    }

    /// Set the state of the Route-Map to allow.
    pub fn allow(&mut self) -> &mut Self {
        self.state = RouteMapState::Allow;
        self
    }

    /// Set the state of the Route-Map to deny.
    pub fn deny(&mut self) -> &mut Self {
        self.state = RouteMapState::Deny;
        self
    }

    /// Add a match condition to the Route-Map.
    pub fn cond(&mut self, cond: RouteMapMatch) -> &mut Self {
        self.conds.push(cond);
        self
    }

    /// Match all paths that carry the given community.
    pub fn match_community(&mut self, community: u32) -> &mut Self {
        self.cond(RouteMapMatch::Community(CommunityMatch::Contains(community)))
    }

    /// Match all paths that carry any of the given communities.
    pub fn match_any_community(&mut self, communities: impl IntoIterator<Item = u32>) -> &mut Self {
        self.cond(RouteMapMatch::Community(CommunityMatch::Any(
            communities.into_iter().collect(),
        )))
    }

    /// Match on the prefix with exact value.
    pub fn match_prefix(&mut self, prefix: Ipv4Prefix) -> &mut Self {
        self.cond(RouteMapMatch::Prefix(prefix))
    }

    /// Match on the AS path using a regular expression.
    pub fn match_as_path(&mut self, regex: &str) -> Result<&mut Self, ConfigError> {
        let regex = AsPathRegex::new(regex)?;
        Ok(self.cond(RouteMapMatch::AsPath(regex)))
    }

    /// Add a set expression to the Route-Map.
    pub fn add_set(&mut self, set: RouteMapSet) -> &mut Self {
        self.set.push(set);
        self
    }

    /// Add a set expression, overwriting the Local-Pref
    pub fn set_local_pref(&mut self, local_pref: u32) -> &mut Self {
        self.add_set(RouteMapSet::LocalPref(local_pref))
    }

    /// Add a set expression, overwriting the MED
    pub fn set_med(&mut self, med: u32) -> &mut Self {
        self.add_set(RouteMapSet::Med(med))
    }

    /// Add a set expression, replacing all communities with a single one.
    pub fn set_community(&mut self, community: u32) -> &mut Self {
        self.add_set(RouteMapSet::Community(CommunityAction::Replace(vec![
            community,
        ])))
    }

    /// Add a set expression, removing all communities.
    pub fn clear_communities(&mut self) -> &mut Self {
        self.add_set(RouteMapSet::Community(CommunityAction::None))
    }

    /// Add a set expression, prepending the given AS numbers to the AS path.
    pub fn prepend_as_path(&mut self, path: impl IntoIterator<Item = AsId>) -> &mut Self {
        self.add_set(RouteMapSet::PrependAsPath(path.into_iter().collect()))
    }

    /// Build the route-map.
    pub fn build(&self) -> RouteMap {
        RouteMap::new(
            self.name.clone(),
            self.order,
            self.state,
            self.conds.clone(),
            self.set.clone(),
        )
    }
}

/// State of a route map, which can either be allow or deny
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteMapState {
    /// Set the state to allow
    Allow,
    /// Set the state to deny
    Deny,
}

impl RouteMapState {
    /// Returns `true` if the state is set to `Allow`.
    pub fn is_allow(&self) -> bool {
        self == &Self::Allow
    }

    /// Returns `true` if the state is set to `Deny`.
    pub fn is_deny(&self) -> bool {
        self == &Self::Deny
    }
}

/// Match statement of the route map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteMapMatch {
    /// Matches on the communities of the path.
    Community(CommunityMatch),
    /// Matches the AS path, written as AS numbers joined with `_`, against a regular expression.
    AsPath(AsPathRegex),
    /// Matches on the prefix (exact value)
    Prefix(Ipv4Prefix),
    /// Matches on the MED (exact value)
    Metric(u32),
}

impl RouteMapMatch {
    /// Returns true if the path matches the expression
    pub fn matches(&self, prefix: &Ipv4Prefix, path: &Path) -> bool {
        match self {
            Self::Community(c) => c.matches(&path.communities),
            Self::AsPath(regex) => regex.matches(&path.as_path),
            Self::Prefix(p) => p == prefix,
            Self::Metric(med) => path.med == *med,
        }
    }
}

/// How to match a community list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommunityMatch {
    /// The path carries the community.
    Contains(u32),
    /// The path carries at least one of the communities.
    Any(Vec<u32>),
    /// The sorted communities of the path are exactly the sorted list.
    Exact(Vec<u32>),
}

impl CommunityMatch {
    /// Returns `true` if the communities match.
    pub fn matches(&self, communities: &[u32]) -> bool {
        match self {
            Self::Contains(c) => communities.contains(c),
            Self::Any(list) => list.iter().any(|c| communities.contains(c)),
            Self::Exact(list) => {
                list.iter().sorted().eq(communities.iter().sorted())
            }
        }
    }
}

/// Regular expression on the AS path. The AS path is written as AS numbers joined with `_`, and
/// the expression must match at the start of that string.
#[derive(Debug, Clone)]
pub struct AsPathRegex {
    pattern: String,
    regex: Regex,
}

impl AsPathRegex {
    /// Compile a new regular expression.
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        let regex = Regex::new(&format!("^(?:{pattern})"))
            .map_err(|_| ConfigError::InvalidRegex(pattern.to_string()))?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// Get the pattern as written in the configuration.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns `true` if the AS path matches the expression.
    pub fn matches(&self, as_path: &[AsId]) -> bool {
        self.regex
            .is_match(&as_path.iter().map(|x| x.0).join("_"))
    }
}

impl PartialEq for AsPathRegex {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Eq for AsPathRegex {}

impl Serialize for AsPathRegex {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.pattern)
    }
}

impl<'de> Deserialize<'de> for AsPathRegex {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(&s).map_err(D::Error::custom)
    }
}

/// Set action, if a route map matches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteMapSet {
    /// Overwrite the local preference
    LocalPref(u32),
    /// Modify the communities
    Community(CommunityAction),
    /// Prepend the AS numbers (in order) to the AS path
    PrependAsPath(Vec<AsId>),
    /// Overwrite the MED
    Med(u32),
}

impl RouteMapSet {
    /// Apply the set action on the path.
    pub fn apply(&self, path: &mut Path) {
        match self {
            Self::LocalPref(lp) => path.local_pref = Some(*lp),
            Self::Community(CommunityAction::None) => path.communities.clear(),
            Self::Community(CommunityAction::Additive(list)) => {
                path.communities.extend(list.iter().copied());
                path.communities.sort_unstable();
            }
            Self::Community(CommunityAction::Replace(list)) => {
                path.communities = list.clone();
                path.communities.sort_unstable();
            }
            Self::PrependAsPath(ases) => {
                path.as_path.splice(0..0, ases.iter().copied());
            }
            Self::Med(med) => path.med = *med,
        }
    }
}

/// How to modify the communities of a path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommunityAction {
    /// Remove all communities.
    None,
    /// Add the communities to the existing ones.
    Additive(Vec<u32>),
    /// Replace the communities.
    Replace(Vec<u32>),
}
