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

//! Module containing the IPv4 prefix type used as key in all routing tables.

use std::{fmt::Display, net::Ipv4Addr, str::FromStr};

use ipnet::{AddrParseError, Ipv4Net};
use prefix_trie::{Prefix as PPrefix, PrefixMap as PMap};
use serde::{de::Error, Deserialize, Serialize};

/// Map from prefixes to values, supporting longest-prefix-match and children queries.
pub type PrefixMap<T> = PMap<Ipv4Prefix, T>;

/// Canonical IPv4 prefix. All host bits are cleared when the prefix is created, such that two
/// prefixes describing the same block always compare equal.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy, Default)]
pub struct Ipv4Prefix(Ipv4Net);

impl Ipv4Prefix {
    /// Create a new prefix from an address and a prefix length. Returns `None` if the length is
    /// larger than 32.
    pub fn new(addr: Ipv4Addr, len: u8) -> Option<Self> {
        Ipv4Net::new(addr, len).ok().map(Self::from)
    }

    /// Get the network address of the prefix.
    pub fn addr(&self) -> Ipv4Addr {
        self.0.network()
    }

    /// Get the prefix length.
    pub fn prefix_len(&self) -> u8 {
        self.0.prefix_len()
    }

    /// Returns `true` if `other` is equal to or more specific than `self`.
    pub fn covers(&self, other: &Self) -> bool {
        self.0.contains(&other.0)
    }

    /// Returns `true` if `other` is strictly more specific than `self`.
    pub fn strictly_covers(&self, other: &Self) -> bool {
        self != other && self.covers(other)
    }

    /// Returns `true` if the two blocks share at least one address.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.covers(other) || other.covers(self)
    }

    /// The prefix one bit shorter, or `None` for `0.0.0.0/0`.
    pub fn supernet(&self) -> Option<Self> {
        self.0.supernet().map(Self::from)
    }

    /// Split the prefix into its two halves, or `None` for a `/32`.
    pub fn halves(&self) -> Option<(Self, Self)> {
        let mut subnets = self.0.subnets(self.0.prefix_len().checked_add(1)?).ok()?;
        Some((subnets.next()?.into(), subnets.next()?.into()))
    }

    /// Value of the bit at position `idx` (0 being the most significant bit) of the network
    /// address.
    pub fn bit(&self, idx: u8) -> bool {
        idx < 32 && (u32::from(self.addr()) >> (31 - idx)) & 1 == 1
    }

    /// Merge a list of prefixes into the minimal set of prefixes covering exactly the same
    /// addresses. The result is sorted.
    pub fn collapse(prefixes: &[Ipv4Prefix]) -> Vec<Ipv4Prefix> {
        let nets: Vec<Ipv4Net> = prefixes.iter().map(|p| p.0).collect();
        let mut result: Vec<Ipv4Prefix> = Ipv4Net::aggregate(&nets)
            .into_iter()
            .map(Self::from)
            .collect();
        result.sort();
        result
    }
}

impl PPrefix for Ipv4Prefix {
    type R = u32;

    fn repr(&self) -> u32 {
        self.0.addr().into()
    }

    fn prefix_len(&self) -> u8 {
        self.0.prefix_len()
    }

    fn from_repr_len(repr: u32, len: u8) -> Self {
        Ipv4Net::new(repr.into(), len)
            .map(Self::from)
            .unwrap_or_default()
    }

    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }

    fn mask(&self) -> u32 {
        self.0.network().into()
    }

    fn zero() -> Self {
        Self(Default::default())
    }

    fn contains(&self, other: &Self) -> bool {
        self.0.contains(&other.0)
    }
}

impl Serialize for Ipv4Prefix {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Ipv4Prefix {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ipv4Net::from_str(&s)
            .map_err(|s| D::Error::custom(format!("Expected IP Network, found {s}")))
            .map(Self::from)
    }
}

impl FromStr for Ipv4Prefix {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ipv4Net::from_str(s).map(Self::from)
    }
}

impl Display for Ipv4Prefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl From<Ipv4Net> for Ipv4Prefix {
    fn from(value: Ipv4Net) -> Self {
        Self(value.trunc())
    }
}

impl From<Ipv4Prefix> for Ipv4Net {
    fn from(value: Ipv4Prefix) -> Self {
        value.0
    }
}
