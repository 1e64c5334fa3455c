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

//! Module containing all type definitions

use ordered_float::NotNan;
use petgraph::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod prefix;
pub use prefix::{Ipv4Prefix, PrefixMap};

pub(crate) type IndexType = u32;
/// Router Identification (and index into the graph)
pub type RouterId = NodeIndex<IndexType>;

/// Simulation time in seconds.
pub type Time = NotNan<f64>;

/// Convert seconds into a [`Time`]. `NaN` is mapped to zero.
pub(crate) fn secs(x: f64) -> Time {
    NotNan::new(x).unwrap_or_default()
}

/// AS Number
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AsId(pub u32);

impl std::fmt::Display for AsId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AS{}", self.0)
    }
}

impl From<u32> for AsId {
    fn from(x: u32) -> Self {
        Self(x)
    }
}

impl From<usize> for AsId {
    fn from(x: usize) -> Self {
        Self(x as u32)
    }
}

impl From<i32> for AsId {
    fn from(x: i32) -> Self {
        Self(x as u32)
    }
}

impl<T> From<&T> for AsId
where
    T: Into<AsId> + Copy,
{
    fn from(x: &T) -> Self {
        (*x).into()
    }
}

/// Coarse classification of a route by where it was learned from. The order of the variants is
/// the order of preference: a lower class is more preferred. The class is carried as the first
/// community of a path.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum RouteClass {
    /// Originated by the router itself.
    Local,
    /// Learned from a customer.
    Customer,
    /// Learned from a settlement-free peer.
    Peer,
    /// Learned from a provider.
    #[default]
    Provider,
    /// No route is known.
    Unreachable,
}

impl RouteClass {
    /// Decode the class from a community value. Unknown values are treated as
    /// [`RouteClass::Provider`], the least preferred reachable class.
    pub fn from_community(community: u32) -> Self {
        match community {
            0 => Self::Local,
            1 => Self::Customer,
            2 => Self::Peer,
            4 => Self::Unreachable,
            _ => Self::Provider,
        }
    }

    /// Encode the class as a community value.
    pub fn community(&self) -> u32 {
        match self {
            Self::Local => 0,
            Self::Customer => 1,
            Self::Peer => 2,
            Self::Provider => 3,
            Self::Unreachable => 4,
        }
    }

    /// Returns `true` for classes that may be exported to peers and providers.
    pub fn is_customer_or_local(&self) -> bool {
        matches!(self, Self::Local | Self::Customer)
    }
}

impl std::fmt::Display for RouteClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Local => "LOCAL",
            Self::Customer => "CUST",
            Self::Peer => "PEER",
            Self::Provider => "PROV",
            Self::Unreachable => "UNREACH",
        })
    }
}

/// Configuration Error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The command is not known.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
    /// The option of a `config`, `debug` or `dragon` command is not known.
    #[error("Unknown option: {0}")]
    UnknownOption(String),
    /// A required argument is missing.
    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),
    /// A number could not be parsed.
    #[error("Invalid number: {0}")]
    InvalidNumber(String),
    /// A prefix could not be parsed.
    #[error("Invalid prefix: {0}")]
    InvalidPrefix(String),
    /// A regular expression could not be compiled.
    #[error("Invalid regular expression: {0}")]
    InvalidRegex(String),
    /// The delay distribution is not supported.
    #[error("Unsupported delay distribution: {0}")]
    UnsupportedDistribution(String),
    /// The parameters of a delay distribution are not valid.
    #[error("Invalid parameters for distribution {0}")]
    InvalidDistribution(String),
    /// A route-map match clause or set action is malformed.
    #[error("Malformed route-map clause: {0}")]
    MalformedRouteMap(String),
    /// A route map is referenced but never defined.
    #[error("Route map is not defined: {0}")]
    UnknownRouteMap(String),
    /// A router-specific command appears before `bgp router-id`.
    #[error("Command requires a router context")]
    NoRouterContext,
    /// A `match` or `set` command appears outside of a route map.
    #[error("Command requires a route-map context")]
    NoRouteMapContext,
    /// The JSON representation could not be parsed.
    #[error("Invalid JSON configuration: {0}")]
    Json(String),
    /// An error occurred on a specific line of a text configuration.
    #[error("Line {line}: {source}")]
    AtLine {
        /// Line number (starting at 1)
        line: usize,
        /// The actual error
        source: Box<ConfigError>,
    },
}

impl ConfigError {
    /// Attach a line number to the error.
    pub(crate) fn at_line(self, line: usize) -> Self {
        Self::AtLine {
            line,
            source: Box::new(self),
        }
    }
}

/// Network Errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// Configuration error
    #[error("Configuration Error: {0}")]
    ConfigError(#[from] ConfigError),
    /// Device is not present in the topology.
    #[error("Network device was not found in topology: {0:?}")]
    DeviceNotFound(RouterId),
    /// Device name is not present in the topology.
    #[error("Network device name was not found in topology: {0}")]
    DeviceNameNotFound(String),
    /// Two routers share the same name.
    #[error("Router name is used twice: {0}")]
    DuplicateRouter(String),
    /// Link does not exist
    #[error("Link does not exist: {0:?} -- {1:?}")]
    LinkNotFound(RouterId, RouterId),
    /// A router is configured as its own neighbor.
    #[error("Router {0} cannot be its own neighbor")]
    SelfSession(String),
}
